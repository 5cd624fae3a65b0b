//! Page arithmetic.

use std::ops::Range;

/// `ceil(count / size)`; zero items means zero pages.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// Requested page clamped to the last page.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.min(total_pages.saturating_sub(1))
}

/// Index range of one page inside the full list.
pub fn page_slice(count: usize, page: usize, page_size: usize) -> Range<usize> {
    let start = page.saturating_mul(page_size).min(count);
    let end = start.saturating_add(page_size).min(count);
    start..end
}

/// Sliding window of at most `width` page indices around `current`.
pub fn page_window(current: usize, total_pages: usize, width: usize) -> Vec<usize> {
    if width == 0 || total_pages == 0 {
        return Vec::new();
    }
    let left = (width - 1) / 2;
    let right = width - 1 - left;
    let first = current.saturating_sub(left);
    let last = current.saturating_add(right).min(total_pages - 1);
    (first..=last).collect()
}

/// `"120 ₽"`, or a dash when there is no price.
pub fn price_label(price: Option<f64>) -> String {
    match price {
        Some(value) => format!("{value:.0} ₽"),
        None => "—".to_string(),
    }
}
