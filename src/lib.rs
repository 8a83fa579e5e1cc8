#![doc = include_str!("../README.md")]

pub mod catalog;
#[cfg(feature = "http")]
pub mod client;
pub mod config;
pub mod error;
#[cfg(feature = "http")]
pub mod gateway;
pub mod guards;
pub mod navigation;
#[cfg(feature = "http")]
pub mod portal;
pub mod session;
pub mod storage;
pub mod token;
pub mod types;
pub mod validation;

// Re-exports for convenient access
#[cfg(feature = "http")]
pub use catalog::ProductsApi;
pub use catalog::{
    CatalogController, CatalogPage, FilterCriteria, Movement, NewProduct, PageWindow, Product,
    ProductKind, ProductStatus, SortColumn, SortDirection, SortSpec, view,
};
#[cfg(feature = "http")]
pub use client::ApiClient;
pub use config::{ClientConfig, StorageKeys};
pub use error::Error;
#[cfg(feature = "http")]
pub use gateway::AuthGateway;
pub use guards::{Access, RouteGuard};
pub use navigation::{HistoryNavigator, Navigator};
#[cfg(feature = "http")]
pub use portal::{Portal, Storages};
pub use session::{SessionEpoch, SessionState, SessionStore};
pub use storage::{AuthStorage, JsonFileStorage, MemoryStorage, Storage};
pub use token::{TokenPayload, decode_payload, is_token_valid};
pub use types::{
    AuthResponse, ChangePassword, LoginCredentials, PasswordReset, ProductId, RegisterData,
    Role, User, UserId,
};
pub use validation::{Failure, Validation};
