use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::ProductId;

/// Kind of financial product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProductKind {
    #[serde(rename = "CUENTA")]
    Account,
    #[serde(rename = "DEPOSITO")]
    Deposit,
    #[serde(rename = "PRESTAMO")]
    Loan,
    #[serde(rename = "TARJETA")]
    Card,
}

impl ProductKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 4] = [Self::Account, Self::Deposit, Self::Loan, Self::Card];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Account => "CUENTA",
            Self::Deposit => "DEPOSITO",
            Self::Loan => "PRESTAMO",
            Self::Card => "TARJETA",
        }
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProductStatus {
    #[serde(rename = "ACTIVO")]
    Active,
    #[serde(rename = "INACTIVO")]
    Inactive,
    #[serde(rename = "PENDIENTE")]
    Pending,
    #[serde(rename = "CANCELADO")]
    Cancelled,
}

impl ProductStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVO",
            Self::Inactive => "INACTIVO",
            Self::Pending => "PENDIENTE",
            Self::Cancelled => "CANCELADO",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product held by the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "tipo")]
    pub kind: ProductKind,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "numeroProducto")]
    pub number: String,
    #[serde(rename = "estado")]
    pub status: ProductStatus,
    #[serde(rename = "saldo")]
    pub balance: f64,
    #[serde(rename = "fechaContratacion", with = "time::serde::rfc3339")]
    pub contracted_at: OffsetDateTime,
    #[serde(
        rename = "fechaVencimiento",
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<OffsetDateTime>,
    #[serde(rename = "tasaInteres", default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
    #[serde(rename = "limiteCredito", default, skip_serializing_if = "Option::is_none")]
    pub credit_limit: Option<f64>,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "moneda")]
    pub currency: String,
}

impl Product {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    #[serde(rename = "INGRESO")]
    Credit,
    #[serde(rename = "EGRESO")]
    Debit,
}

/// One entry in a product's statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: String,
    #[serde(rename = "productoId")]
    pub product_id: ProductId,
    #[serde(rename = "fecha", with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(rename = "concepto")]
    pub concept: String,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "tipo")]
    pub kind: MovementKind,
    #[serde(rename = "saldoResultante")]
    pub resulting_balance: f64,
    #[serde(rename = "referencia", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Contracting request, as filled in by the wizard.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub kind: ProductKind,
    pub name: String,
    pub currency: String,
    pub initial_balance: Option<f64>,
    pub credit_limit: Option<f64>,
    /// Annual rate, in percent.
    pub interest_rate: Option<f64>,
    pub term_months: Option<u32>,
}

impl NewProduct {
    #[must_use]
    pub fn new(kind: ProductKind, name: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            currency: currency.into(),
            initial_balance: None,
            credit_limit: None,
            interest_rate: None,
            term_months: None,
        }
    }

    #[must_use]
    pub fn with_initial_balance(mut self, amount: f64) -> Self {
        self.initial_balance = Some(amount);
        self
    }

    #[must_use]
    pub fn with_credit_limit(mut self, limit: f64) -> Self {
        self.credit_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_interest_rate(mut self, rate: f64) -> Self {
        self.interest_rate = Some(rate);
        self
    }

    #[must_use]
    pub fn with_term_months(mut self, months: u32) -> Self {
        self.term_months = Some(months);
        self
    }
}
