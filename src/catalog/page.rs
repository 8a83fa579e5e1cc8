/// A window over a sorted sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page_index: usize,
    page_size: usize,
}

impl PageWindow {
    /// `page_size` is raised to 1 when zero.
    #[must_use]
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self {
            page_index,
            page_size: page_size.max(1),
        }
    }

    /// First page of the given size.
    #[must_use]
    pub fn first(page_size: usize) -> Self {
        Self::new(0, page_size)
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// The items of this window; empty when it lies past the end.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.page_index.saturating_mul(self.page_size);
        if start >= items.len() {
            return &[];
        }
        let end = start.saturating_add(self.page_size).min(items.len());
        &items[start..end]
    }

    /// Number of pages needed for `total` items.
    #[must_use]
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size)
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::first(10)
    }
}
