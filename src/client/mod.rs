//! Request guard: the HTTP boundary every API call goes through.

mod api;
pub mod endpoints;
mod report;

pub use api::ApiClient;
pub use report::describe;
