// src/lib.rs

//! Flash feed library.
//!
//! A newest-first article feed split into a mutable Hot window served by
//! page number and immutable Cold segments addressed by stable ids, cached
//! permanently at the edge and invalidated by tag-based purges.

pub mod cache;
pub mod config;
pub mod error;
#[cfg(feature = "server")]
pub mod http;
pub mod models;
pub mod services;
pub mod source;
pub mod utils;
