use crate::types::Page;

/// The displayed sequence of items. Pages are applied as-is: no reordering
/// and no deduplication, so overlapping pages show up twice.
#[derive(Debug, Clone)]
pub struct ListAccumulator<T> {
    items: Vec<T>,
}

impl<T> Default for ListAccumulator<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> ListAccumulator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with the items of `page`.
    pub fn reset(&mut self, page: Page<T>) {
        self.items = page.items;
    }

    /// Add the items of `page` after the existing ones.
    pub fn append(&mut self, page: Page<T>) {
        self.items.extend(page.items);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }
}
