use time::OffsetDateTime;

use super::contract::ProductDraft;
use super::model::{Movement, NewProduct, Product};
use super::summary::{FinancialSummary, summarize};
use crate::client::{ApiClient, endpoints};
use crate::error::Error;
use crate::types::ProductId;

/// Product and movement endpoints, called through the request guard.
#[derive(Debug, Clone)]
pub struct ProductsApi {
    api: ApiClient,
}

impl ProductsApi {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Every product of the user, most recently contracted first.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn list_products(&self) -> Result<Vec<Product>, Error> {
        let mut products: Vec<Product> = self
            .api
            .get_json("list products", endpoints::PRODUCTS, &[])
            .await?;
        products.sort_by(|a, b| b.contracted_at.cmp(&a.contracted_at));
        tracing::debug!(count = products.len(), "Products loaded");
        Ok(products)
    }

    /// # Errors
    ///
    /// Returns [`Error::Api`] with status 404 for an unknown id.
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, Error> {
        self.api
            .get_json("get product", &endpoints::product(&id.0), &[])
            .await
    }

    /// Contract a new product and return it as stored by the server.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn create_product(&self, request: &NewProduct) -> Result<Product, Error> {
        let draft = ProductDraft::from_request(request, OffsetDateTime::now_utc());
        let product: Product = self
            .api
            .post_json("create product", endpoints::PRODUCTS, &draft)
            .await?;
        tracing::info!(product_id = %product.id, kind = %product.kind, "Product contracted");
        Ok(product)
    }

    /// Movements of one product, most recent first.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn list_movements(&self, product_id: &ProductId) -> Result<Vec<Movement>, Error> {
        let mut movements: Vec<Movement> = self
            .api
            .get_json(
                "list movements",
                endpoints::MOVEMENTS,
                &[("productoId", product_id.0.as_str())],
            )
            .await?;
        movements.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(movements)
    }

    /// Movements of every product, in server order.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    pub async fn list_all_movements(&self) -> Result<Vec<Movement>, Error> {
        self.api
            .get_json("list movements", endpoints::MOVEMENTS, &[])
            .await
    }

    /// Fetch products and movements together and summarize them.
    ///
    /// # Errors
    ///
    /// Returns the first request error.
    pub async fn summary(&self) -> Result<FinancialSummary, Error> {
        let (products, movements) =
            tokio::try_join!(self.list_products(), self.list_all_movements())?;
        Ok(summarize(&products, &movements, OffsetDateTime::now_utc()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::catalog::model::{ProductKind, ProductStatus};
    use crate::config::ClientConfig;
    use crate::navigation::HistoryNavigator;
    use crate::session::SessionStore;
    use crate::storage::AuthStorage;

    fn products_api(server: &MockServer) -> ProductsApi {
        let config = Arc::new(ClientConfig::new(server.base_url().parse().unwrap()));
        let store = SessionStore::new(
            AuthStorage::in_memory(config.storage_keys().clone()),
            config.refresh_lead(),
        );
        let api = ApiClient::new(config, store, Arc::new(HistoryNavigator::new()));
        ProductsApi::new(api)
    }

    fn product_json(id: &str, contracted: &str) -> serde_json::Value {
        json!({
            "id": id,
            "tipo": "CUENTA",
            "nombre": format!("Cuenta {id}"),
            "numeroProducto": format!("ES79 2100 0418 00000{id} 0001"),
            "estado": "ACTIVO",
            "saldo": 100,
            "fechaContratacion": contracted,
            "moneda": "EUR"
        })
    }

    fn movement_json(id: &str, at: &str) -> serde_json::Value {
        json!({
            "id": id,
            "productoId": "1",
            "fecha": at,
            "concepto": "Compra",
            "monto": 12.5,
            "tipo": "EGRESO",
            "saldoResultante": 87.5
        })
    }

    #[tokio::test]
    async fn products_newest_first() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/productos");
            then.status(200).json_body(json!([
                product_json("1", "2023-01-01T00:00:00Z"),
                product_json("2", "2024-01-01T00:00:00Z"),
                product_json("3", "2023-06-01T00:00:00Z"),
            ]));
        });

        let products = products_api(&server).list_products().await.unwrap();
        let ids: Vec<_> = products.iter().map(|p| p.id.to_string()).collect();
        assert_eq!(ids, ["2", "3", "1"]);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/productos/nope");
            then.status(404).json_body(json!({}));
        });

        let err = products_api(&server)
            .get_product(&ProductId::from("nope"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn movements_filtered_by_product_newest_first() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/movimientos")
                .query_param("productoId", "1");
            then.status(200).json_body(json!([
                movement_json("a", "2024-01-01T10:00:00Z"),
                movement_json("b", "2024-03-01T10:00:00Z"),
            ]));
        });

        let movements = products_api(&server)
            .list_movements(&ProductId::from("1"))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(movements[0].id, "b");
        assert_eq!(movements[1].id, "a");
    }

    #[tokio::test]
    async fn create_posts_an_active_draft() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/productos")
                .json_body_partial(r#"{ "tipo": "PRESTAMO", "estado": "ACTIVO", "saldo": 15000.0 }"#);
            then.status(201).json_body(json!({
                "id": "99",
                "tipo": "PRESTAMO",
                "nombre": "Préstamo coche",
                "numeroProducto": "PR-2024-123456",
                "estado": "ACTIVO",
                "saldo": 15000,
                "fechaContratacion": "2024-06-01T00:00:00Z",
                "fechaVencimiento": "2029-06-01T00:00:00Z",
                "tasaInteres": 6.5,
                "moneda": "EUR"
            }));
        });

        let request = NewProduct::new(ProductKind::Loan, "Préstamo coche", "EUR")
            .with_initial_balance(15_000.0)
            .with_interest_rate(6.5)
            .with_term_months(60);
        let product = products_api(&server).create_product(&request).await.unwrap();

        mock.assert();
        assert_eq!(product.id, ProductId::from("99"));
        assert_eq!(product.status, ProductStatus::Active);
    }

    #[tokio::test]
    async fn summary_combines_both_collections() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/productos");
            then.status(200).json_body(json!([
                product_json("1", "2023-01-01T00:00:00Z"),
                product_json("2", "2024-01-01T00:00:00Z"),
            ]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/movimientos");
            then.status(200).json_body(json!([
                movement_json("a", "2024-01-01T10:00:00Z"),
                movement_json("b", "2024-03-01T10:00:00Z"),
            ]));
        });

        let summary = products_api(&server).summary().await.unwrap();

        assert_eq!(summary.active_products, 2);
        assert!((summary.total_balance - 200.0).abs() < f64::EPSILON);
        assert_eq!(summary.latest_movements[0].id, "b");
    }
}
