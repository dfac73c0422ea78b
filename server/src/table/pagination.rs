//! Pagination engine

/// Row window `[offset, offset + limit)` of a paged query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Number of rows the window holds out of `total`
    pub fn len_within(&self, total: u64) -> u64 {
        total.saturating_sub(self.offset).min(self.limit)
    }
}

/// Clamped page and its row window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i32,
    pub total_pages: u64,
    pub window: PageWindow,
}

/// Compute the window for `page`, clamped to `[0, total_pages]`.
///
/// The upper bound is one past the last page index, so a request beyond the
/// end lands on an empty page.
pub fn paginate(total: u64, page: i32, page_size: u8) -> Page {
    let size = u64::from(page_size.max(1));
    let total_pages = total.div_ceil(size);
    let upper = i32::try_from(total_pages).unwrap_or(i32::MAX);
    let page = page.clamp(0, upper);

    Page {
        page,
        total_pages,
        window: PageWindow {
            offset: page as u64 * size,
            limit: size,
        },
    }
}
