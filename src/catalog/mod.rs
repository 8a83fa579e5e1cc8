//! The product catalog: data model, the filter → sort → page pipeline that feeds the
//! products table, the dashboard summary and the product endpoints.

#[cfg(feature = "http")]
mod api;
mod contract;
mod debounce;
mod filter;
mod model;
mod page;
mod sort;
mod summary;
mod view;

#[cfg(feature = "http")]
pub use api::ProductsApi;
pub use contract::{ProductDraft, add_months, product_number};
pub use debounce::{DebounceInput, Debouncer};
pub use filter::{FilterCriteria, apply as filter_products};
pub use model::{Movement, MovementKind, NewProduct, Product, ProductKind, ProductStatus};
pub use page::PageWindow;
pub use sort::{SortColumn, SortDirection, SortSpec};
pub use summary::{FinancialSummary, KindShare, summarize};
pub use view::{CatalogController, CatalogPage, view};
