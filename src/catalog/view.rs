use super::debounce::{DebounceInput, Debouncer};
use super::filter::{self, FilterCriteria};
use super::model::Product;
use super::page::PageWindow;
use super::sort::SortSpec;
use crate::config::ClientConfig;

/// One page of the catalog and the size of the whole filtered set.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage<'a> {
    pub items: Vec<&'a Product>,
    pub total: usize,
}

/// Filter, sort and page `products`.
///
/// Pure and synchronous: the input is never reordered, and without a sort the
/// filtered items keep their input order.
#[must_use]
pub fn view<'a>(
    products: &'a [Product],
    filters: &FilterCriteria,
    sort: &SortSpec,
    page: PageWindow,
) -> CatalogPage<'a> {
    let mut selected = filter::apply(products, filters);
    sort.apply(&mut selected);
    CatalogPage {
        total: selected.len(),
        items: page.slice(&selected).to_vec(),
    }
}

/// Holds the fetched catalog and the table parameters the user has chosen.
///
/// The filtered and sorted order is recomputed on every parameter change; paging
/// only moves the window over it.
#[derive(Debug, Clone)]
pub struct CatalogController {
    products: Vec<Product>,
    filters: FilterCriteria,
    sort: SortSpec,
    page: PageWindow,
    debounce: std::time::Duration,
    // Indices into `products`, filtered and sorted.
    ordered: Vec<usize>,
}

impl CatalogController {
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            products: Vec::new(),
            filters: FilterCriteria::default(),
            sort: SortSpec::default(),
            page: PageWindow::first(config.page_size()),
            debounce: config.filter_debounce(),
            ordered: Vec::new(),
        }
    }

    /// Replace the whole collection, as after a reload.
    pub fn set_products(&mut self, products: Vec<Product>) {
        self.products = products;
        self.recompute();
    }

    /// Apply new filters and go back to the first page.
    pub fn set_filters(&mut self, filters: FilterCriteria) {
        self.filters = filters;
        self.page.page_index = 0;
        self.recompute();
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
        self.recompute();
    }

    pub fn set_page(&mut self, page: PageWindow) {
        self.page = page;
    }

    #[must_use]
    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    #[must_use]
    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    #[must_use]
    pub fn page(&self) -> PageWindow {
        self.page
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Size of the filtered set.
    #[must_use]
    pub fn total(&self) -> usize {
        self.ordered.len()
    }

    /// The current page.
    #[must_use]
    pub fn current(&self) -> CatalogPage<'_> {
        CatalogPage {
            items: self
                .page
                .slice(&self.ordered)
                .iter()
                .map(|&i| &self.products[i])
                .collect(),
            total: self.ordered.len(),
        }
    }

    /// A debounced channel for filter input, using the configured quiescence window.
    #[must_use]
    pub fn filter_input(&self) -> (DebounceInput<FilterCriteria>, Debouncer<FilterCriteria>) {
        Debouncer::channel(self.debounce)
    }

    /// Wait for the next settled filter value and apply it.
    ///
    /// Returns `false` once the input side is closed.
    pub async fn apply_settled(&mut self, debouncer: &mut Debouncer<FilterCriteria>) -> bool {
        match debouncer.settled().await {
            Some(filters) => {
                self.set_filters(filters);
                true
            }
            None => false,
        }
    }

    fn recompute(&mut self) {
        let products = &self.products;
        let mut ordered: Vec<usize> = (0..products.len())
            .filter(|&i| self.filters.matches(&products[i]))
            .collect();
        self.sort.apply_by(&mut ordered, |&i| &products[i]);
        self.ordered = ordered;
        tracing::debug!(total = self.ordered.len(), "Catalog view recomputed");
    }
}
