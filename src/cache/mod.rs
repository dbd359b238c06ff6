//! Edge cache integration.
//!
//! - `tags`: which tags a response is stored under and which a change purges
//! - `purge`: clients for the CDN's purge-by-tag API

pub mod purge;
pub mod tags;

pub use purge::{CachePurger, CloudflarePurger, NoopPurger, PurgeReport};
pub use tags::{
    CacheTags, CacheType, ContentChange, Freshness, PurgeEvent, SegmentReach, WebhookPayload,
};
