//! Service layer for the flash feed.
//!
//! This module contains the business logic for:
//! - Partition arithmetic (`partition`)
//! - Hot page / Cold segment listing (`FlashService`)
//! - Update detection (`UpdateDetector`)

pub mod partition;
mod pagination;
mod updates;

pub use pagination::{FlashService, HeaderLookup};
pub use partition::{Partition, PartitionLayout, SegmentRange};
pub use updates::UpdateDetector;
