//! Partition arithmetic for the Hot/Cold feed split.
//!
//! The global article sequence is ordered by identifier, newest first. The
//! newest `H * L` articles form the Hot window, served as `H` pages of `L`.
//! Everything older is Cold and served in fixed segments of `S` identifiers:
//!
//! ```text
//! ids:      1 ........ 25 | 26 ....... 50 | 51 ................. 300
//!           segment 1     | segment 2     | hot pages 10 .. 1
//!                         ^ cold boundary C = 300 - H*L = 50
//! ```
//!
//! The cold boundary is derived from the newest identifier `N` alone:
//! `C = N - H*L`. Hot holds every id above `C`, Cold every id at or below it.
//! Deleting an article therefore never moves an article between partitions;
//! the Hot window just serves fewer than `H*L` articles. Only publishing (or
//! deleting the newest article) moves `C`.
//!
//! Segment `k` always covers identifiers `[(k-1)*S + 1, k*S]`, so a segment
//! id and its range never change as the corpus grows; only the count of
//! segments does. The newest segment is clamped to the cold boundary and may
//! be partial until enough articles age out of the Hot window; a publish
//! purges it (see [`PartitionLayout::moving_segments`]).
//!
//! With ids contiguous from 1, `N` is the article count, which is how the
//! CLI plans layouts without a corpus.

use crate::error::{AppError, Result};
use crate::models::FeedConfig;

/// Total number of articles in the Hot window.
pub fn hot_window_size(hot_pages_limit: u32, page_size: u32) -> u64 {
    u64::from(hot_pages_limit) * u64::from(page_size)
}

/// Whether `page` is the final Hot page, the point where the UI switches to
/// the Cold path.
pub fn is_last_hot_page(page: u32, total_pages: u32, hot_pages_limit: u32) -> bool {
    page == total_pages.min(hot_pages_limit)
}

/// Highest identifier that belongs to the Cold partition, given the newest
/// identifier.
pub fn cold_boundary(latest_id: u64, hot_window: u64) -> u64 {
    latest_id.saturating_sub(hot_window)
}

/// Number of Cold segments once `latest_id` has been published.
pub fn total_segments(latest_id: u64, hot_window: u64, segment_size: u32) -> u32 {
    let cold = cold_boundary(latest_id, hot_window);
    let segments = cold.div_ceil(u64::from(segment_size.max(1)));
    u32::try_from(segments).unwrap_or(u32::MAX)
}

/// Newest Cold segment, the first one "load more" fetches after the Hot
/// pages are exhausted. `None` when nothing has aged out of the Hot window.
pub fn first_cold_segment_id(latest_id: u64, hot_window: u64, segment_size: u32) -> Option<u32> {
    match total_segments(latest_id, hot_window, segment_size) {
        0 => None,
        n => Some(n),
    }
}

/// Inclusive identifier range of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRange {
    pub start: u64,
    pub end: u64,
}

impl SegmentRange {
    /// Number of identifiers in the range.
    pub fn count(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn contains(&self, id: u64) -> bool {
        (self.start..=self.end).contains(&id)
    }
}

/// Number of segments below a cold boundary identifier.
pub fn segments_below(cold_boundary: u64, segment_size: u32) -> u32 {
    total_segments(cold_boundary, 0, segment_size)
}

/// Identifier range served for `segment_id`, clamped to the cold boundary.
///
/// `segment_id == 0` is a validation error; a segment past the newest one is
/// not found.
pub fn segment_id_range(segment_id: u32, cold_boundary: u64, segment_size: u32) -> Result<SegmentRange> {
    if segment_id == 0 {
        return Err(AppError::validation("Invalid segment ID. Must be a positive integer"));
    }
    let size = u64::from(segment_size.max(1));
    let total = segments_below(cold_boundary, segment_size);
    if segment_id > total {
        return Err(AppError::not_found(format!(
            "Segment {segment_id} not found ({total} segments available)"
        )));
    }

    let start = (u64::from(segment_id) - 1) * size + 1;
    let end = (u64::from(segment_id) * size).min(cold_boundary);
    Ok(SegmentRange { start, end })
}

/// Where an article currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Hot { page: u32 },
    Cold { segment_id: u32 },
}

/// Feed partition sizing, bound to one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionLayout {
    pub hot_pages_limit: u32,
    pub page_size: u32,
    pub segment_size: u32,
}

impl PartitionLayout {
    pub fn new(hot_pages_limit: u32, page_size: u32, segment_size: u32) -> Self {
        Self {
            hot_pages_limit,
            page_size,
            segment_size,
        }
    }

    pub fn from_config(feed: &FeedConfig) -> Self {
        Self::new(feed.hot_pages_limit, feed.items_per_page, feed.segment_size)
    }

    pub fn hot_window(&self) -> u64 {
        hot_window_size(self.hot_pages_limit, self.page_size)
    }

    pub fn cold_boundary(&self, latest_id: u64) -> u64 {
        cold_boundary(latest_id, self.hot_window())
    }

    pub fn total_segments(&self, latest_id: u64) -> u32 {
        total_segments(latest_id, self.hot_window(), self.segment_size)
    }

    pub fn first_cold_segment_id(&self, latest_id: u64) -> Option<u32> {
        first_cold_segment_id(latest_id, self.hot_window(), self.segment_size)
    }

    /// Range served for `segment_id` once `latest_id` has been published.
    pub fn segment_range(&self, segment_id: u32, latest_id: u64) -> Result<SegmentRange> {
        segment_id_range(segment_id, self.cold_boundary(latest_id), self.segment_size)
    }

    /// Number of Hot pages of `limit` articles needed to cover the window.
    ///
    /// Equals `hot_pages_limit` for the configured page size.
    pub fn hot_pages_for(&self, limit: u32) -> u32 {
        let pages = self.hot_window().div_ceil(u64::from(limit.max(1)));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    /// Segments whose served range a publish can extend: the newest one,
    /// and the one before it in case the boundary crossed a segment edge
    /// since the last purge.
    pub fn moving_segments(&self, cold_boundary: u64) -> Vec<u32> {
        let newest = self.segments_below(cold_boundary);
        (newest.saturating_sub(1).max(1)..=newest).rev().collect()
    }

    /// Segment count for a cold boundary identifier.
    pub fn segments_below(&self, cold_boundary: u64) -> u32 {
        segments_below(cold_boundary, self.segment_size)
    }

    /// Range served for `segment_id` below a cold boundary identifier.
    pub fn segment_range_below(&self, segment_id: u32, cold_boundary: u64) -> Result<SegmentRange> {
        segment_id_range(segment_id, cold_boundary, self.segment_size)
    }

    /// Nominal range of a segment regardless of the current corpus size.
    pub fn nominal_segment_range(&self, segment_id: u32) -> Result<SegmentRange> {
        if segment_id == 0 {
            return Err(AppError::validation("Invalid segment ID. Must be a positive integer"));
        }
        let size = u64::from(self.segment_size.max(1));
        Ok(SegmentRange {
            start: (u64::from(segment_id) - 1) * size + 1,
            end: u64::from(segment_id) * size,
        })
    }

    /// Reject Hot page requests outside `[1, hot_pages_for(limit)]`.
    pub fn check_hot_page(&self, page: u32, limit: u32) -> Result<()> {
        let last = self.hot_pages_for(limit);
        if page < 1 || page > last {
            return Err(AppError::validation(format!(
                "Invalid page number. Must be between 1 and {last}"
            )));
        }
        Ok(())
    }

    /// Partition an article identifier falls in, given the cold boundary.
    ///
    /// Hot pages are estimated from the distance to the top of the window,
    /// which is exact when the Hot window has no holes.
    pub fn locate(&self, article_id: u64, cold_boundary: u64) -> Partition {
        if article_id > cold_boundary || article_id == 0 {
            let top = cold_boundary + self.hot_window();
            let position = top.saturating_sub(article_id);
            let page = position / u64::from(self.page_size.max(1)) + 1;
            let page = u32::try_from(page)
                .unwrap_or(u32::MAX)
                .min(self.hot_pages_limit);
            Partition::Hot { page }
        } else {
            let segment = (article_id - 1) / u64::from(self.segment_size.max(1)) + 1;
            Partition::Cold {
                segment_id: u32::try_from(segment).unwrap_or(u32::MAX),
            }
        }
    }
}

impl Default for PartitionLayout {
    fn default() -> Self {
        Self::from_config(&FeedConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> PartitionLayout {
        PartitionLayout::new(10, 25, 25)
    }

    #[test]
    fn test_hot_window_size() {
        assert_eq!(hot_window_size(10, 25), 250);
        assert_eq!(layout().hot_window(), 250);
    }

    #[test]
    fn test_is_last_hot_page() {
        assert!(is_last_hot_page(10, 12, 10));
        assert!(is_last_hot_page(3, 3, 10));
        assert!(!is_last_hot_page(9, 12, 10));
        assert!(!is_last_hot_page(1, 0, 10));
    }

    #[test]
    fn test_worked_corpus_of_300() {
        let layout = layout();
        assert_eq!(layout.cold_boundary(300), 50);
        assert_eq!(layout.total_segments(300), 2);
        assert_eq!(layout.first_cold_segment_id(300), Some(2));

        assert_eq!(
            layout.segment_range(2, 300).unwrap(),
            SegmentRange { start: 26, end: 50 }
        );
        assert_eq!(
            layout.segment_range(1, 300).unwrap(),
            SegmentRange { start: 1, end: 25 }
        );
    }

    #[test]
    fn test_partial_newest_segment_is_clamped() {
        let layout = layout();
        // 310 articles: cold boundary 60, segment 3 holds 51..=60 for now.
        assert_eq!(layout.total_segments(310), 3);
        assert_eq!(
            layout.segment_range(3, 310).unwrap(),
            SegmentRange { start: 51, end: 60 }
        );
        // Once the corpus grows the same segment keeps its id and start.
        assert_eq!(
            layout.segment_range(3, 400).unwrap(),
            SegmentRange { start: 51, end: 75 }
        );
    }

    #[test]
    fn test_segment_ids_are_stable_as_corpus_grows() {
        let layout = layout();
        let before = layout.segment_range(1, 300).unwrap();
        let after = layout.segment_range(1, 10_000).unwrap();
        assert_eq!(before, after);
        assert_eq!(layout.total_segments(10_000), 390);
    }

    #[test]
    fn test_segment_zero_is_validation_error() {
        let err = layout().segment_range(0, 300).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_segment_past_newest_is_not_found() {
        let err = layout().segment_range(3, 300).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_corpus_within_hot_window_has_no_segments() {
        let layout = layout();
        assert_eq!(layout.total_segments(120), 0);
        assert_eq!(layout.first_cold_segment_id(120), None);
        assert!(matches!(
            layout.segment_range(1, 120).unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn test_first_segment_is_adjacent_to_hot_boundary() {
        let layout = layout();
        for total in 251..=1_000u64 {
            let first = layout.first_cold_segment_id(total).unwrap();
            let range = layout.segment_range(first, total).unwrap();
            assert_eq!(range.end, total - 250, "total={total}");
        }
    }

    #[test]
    fn test_segments_tile_the_cold_partition() {
        let layout = PartitionLayout::new(3, 10, 7);
        for total in 0..=200u64 {
            let boundary = layout.cold_boundary(total);
            let mut expected_start = 1;
            for id in 1..=layout.total_segments(total) {
                let range = layout.segment_range(id, total).unwrap();
                assert_eq!(range.start, expected_start);
                assert!(range.count() <= 7);
                expected_start = range.end + 1;
            }
            assert_eq!(expected_start, boundary + 1, "total={total}");
        }
    }

    #[test]
    fn test_check_hot_page_bounds() {
        let layout = layout();
        assert!(layout.check_hot_page(1, 25).is_ok());
        assert!(layout.check_hot_page(10, 25).is_ok());
        assert!(layout.check_hot_page(0, 25).is_err());
        assert!(matches!(
            layout.check_hot_page(11, 25).unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[test]
    fn test_hot_pages_follow_the_window_not_the_limit() {
        let layout = layout();
        assert_eq!(layout.hot_pages_for(25), 10);
        assert_eq!(layout.hot_pages_for(10), 25);
        assert_eq!(layout.hot_pages_for(50), 5);
        assert_eq!(layout.hot_pages_for(100), 3);
        assert!(layout.check_hot_page(25, 10).is_ok());
        assert_eq!(
            layout.check_hot_page(6, 50).unwrap_err().to_string(),
            "Invalid page number. Must be between 1 and 5"
        );
    }

    #[test]
    fn test_moving_segments() {
        let layout = layout();
        assert_eq!(layout.moving_segments(60), vec![3, 2]);
        assert_eq!(layout.moving_segments(76), vec![4, 3]);
        assert_eq!(layout.moving_segments(10), vec![1]);
        assert!(layout.moving_segments(0).is_empty());
    }

    #[test]
    fn test_locate() {
        let layout = layout();
        // 300 articles: cold boundary 50.
        assert_eq!(layout.locate(300, 50), Partition::Hot { page: 1 });
        assert_eq!(layout.locate(276, 50), Partition::Hot { page: 1 });
        assert_eq!(layout.locate(275, 50), Partition::Hot { page: 2 });
        assert_eq!(layout.locate(51, 50), Partition::Hot { page: 10 });
        assert_eq!(layout.locate(50, 50), Partition::Cold { segment_id: 2 });
        assert_eq!(layout.locate(26, 50), Partition::Cold { segment_id: 2 });
        assert_eq!(layout.locate(25, 50), Partition::Cold { segment_id: 1 });
        // Published after the boundary was read.
        assert_eq!(layout.locate(305, 50), Partition::Hot { page: 1 });
    }

    #[test]
    fn test_boundary_helpers() {
        let layout = layout();
        assert_eq!(layout.cold_boundary(300), 50);
        assert_eq!(layout.cold_boundary(120), 0);
        assert_eq!(layout.segments_below(50), 2);
        assert_eq!(layout.segments_below(0), 0);
        assert_eq!(
            layout.segment_range_below(2, 50).unwrap(),
            layout.segment_range(2, 300).unwrap()
        );
    }

    #[test]
    fn test_nominal_range_ignores_corpus_size() {
        assert_eq!(
            layout().nominal_segment_range(3).unwrap(),
            SegmentRange { start: 51, end: 75 }
        );
    }
}
