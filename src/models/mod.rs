// src/models/mod.rs

//! Domain models for the flash feed.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod article;
mod config;
mod feed;
mod header;

// Re-export all public types
pub use article::{Article, Author, Category, Engagement, Image, Tag};
pub use config::{
    CdnConfig, Config, FeedConfig, LoggingConfig, ServerConfig, SourceConfig, SourceKind,
};
pub use feed::{
    ArticleDetail, CategoryList, ColdSegment, FlashList, HotTransition, Pagination, UpdateCheck,
};
pub use header::{Logo, NavChild, NavItem, SiteHeader, TopBar};
