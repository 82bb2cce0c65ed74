//! Page-number pagination for post listings.

use std::num::NonZeroU32;

/// Requested page plus the sizing knobs that shape the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: NonZeroU32,
    pub window_size: NonZeroU32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: NonZeroU32, window_size: NonZeroU32) -> Self {
        Self {
            page,
            page_size,
            window_size,
        }
    }
}

/// Resolved pagination metadata for one listing.
///
/// `current_page` is always within `[1, total_pages]`, except for an empty
/// listing where `total_pages` is zero and `current_page` stays at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub total_items: u64,
    pub page_size: u32,
    pub total_pages: u32,
    pub current_page: u32,
    pub window: Vec<u32>,
}

impl Pagination {
    pub fn compute(total_items: u64, request: PageRequest) -> Self {
        let page_size = request.page_size.get();
        let total_pages = u32::try_from(total_items.div_ceil(u64::from(page_size)))
            .unwrap_or(u32::MAX);
        let current_page = request.page.clamp(1, total_pages.max(1));
        let window = page_window(current_page, total_pages, request.window_size.get());

        Self {
            total_items,
            page_size,
            total_pages,
            current_page,
            window,
        }
    }

    /// Index of the first item on the current page.
    pub fn offset(&self) -> usize {
        (self.current_page as usize - 1) * self.page_size as usize
    }

    pub fn previous_page(&self) -> Option<u32> {
        (self.current_page > 1).then(|| self.current_page - 1)
    }

    pub fn next_page(&self) -> Option<u32> {
        (self.current_page < self.total_pages).then(|| self.current_page + 1)
    }

    /// Take the current page out of the full, already ordered result set.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset())
            .take(self.page_size as usize)
            .collect()
    }
}

fn page_window(current: u32, total_pages: u32, width: u32) -> Vec<u32> {
    if total_pages == 0 {
        return Vec::new();
    }

    let width = width.min(total_pages);
    let mut start = current.saturating_sub(width / 2).max(1);
    let mut end = start.saturating_add(width - 1);
    if end > total_pages {
        end = total_pages;
        start = end.saturating_sub(width - 1).max(1);
    }

    (start..=end).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(page: u32, page_size: u32, window_size: u32) -> PageRequest {
        PageRequest::new(
            page,
            NonZeroU32::new(page_size).expect("non-zero"),
            NonZeroU32::new(window_size).expect("non-zero"),
        )
    }

    #[test]
    fn last_page_holds_the_remainder() {
        let pagination = Pagination::compute(23, request(3, 10, 5));

        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.current_page, 3);
        let items: Vec<u32> = (1..=23).collect();
        assert_eq!(pagination.slice(items), vec![21, 22, 23]);
    }

    #[test]
    fn out_of_range_page_clamps_to_last() {
        let pagination = Pagination::compute(23, request(5, 10, 5));

        assert_eq!(pagination.current_page, 3);
        assert_eq!(pagination.offset(), 20);
        assert_eq!(pagination.next_page(), None);
        assert_eq!(pagination.previous_page(), Some(2));
    }

    #[test]
    fn page_zero_clamps_to_first() {
        let pagination = Pagination::compute(23, request(0, 10, 5));

        assert_eq!(pagination.current_page, 1);
        assert_eq!(pagination.previous_page(), None);
        assert_eq!(pagination.next_page(), Some(2));
    }

    #[test]
    fn empty_listing_has_no_pages() {
        let pagination = Pagination::compute(0, request(4, 10, 5));

        assert_eq!(pagination.total_pages, 0);
        assert_eq!(pagination.current_page, 1);
        assert!(pagination.window.is_empty());
        assert!(pagination.slice(Vec::<u32>::new()).is_empty());
    }

    #[test]
    fn exact_multiple_does_not_add_a_page() {
        let pagination = Pagination::compute(20, request(1, 10, 5));
        assert_eq!(pagination.total_pages, 2);
    }

    #[test]
    fn window_is_centered_on_the_current_page() {
        let pagination = Pagination::compute(200, request(10, 10, 5));
        assert_eq!(pagination.window, vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn window_shifts_at_the_edges() {
        let first = Pagination::compute(200, request(1, 10, 5));
        assert_eq!(first.window, vec![1, 2, 3, 4, 5]);

        let last = Pagination::compute(200, request(20, 10, 5));
        assert_eq!(last.window, vec![16, 17, 18, 19, 20]);
    }

    #[test]
    fn window_never_exceeds_total_pages() {
        let pagination = Pagination::compute(23, request(2, 10, 5));
        assert_eq!(pagination.window, vec![1, 2, 3]);
    }

    #[test]
    fn even_window_shows_more_pages_before_current() {
        let pagination = Pagination::compute(100, request(5, 10, 4));
        assert_eq!(pagination.window, vec![3, 4, 5, 6]);
    }
}
