use serde::Serialize;
use time::{Date, Month, OffsetDateTime};

use super::model::{NewProduct, ProductKind, ProductStatus};

/// Product number for a newly contracted product.
///
/// Accounts get an IBAN-like number; every other kind gets `<prefix>-<year>-<n>`.
/// `<n>` is the last six digits of the millisecond timestamp.
#[must_use]
pub fn product_number(kind: ProductKind, now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    let tail = millis.rem_euclid(1_000_000);
    match kind {
        ProductKind::Account => format!("ES79 2100 0418 {tail:06} 0001"),
        ProductKind::Deposit => format!("DP-{}-{tail:06}", now.year()),
        ProductKind::Loan => format!("PR-{}-{tail:06}", now.year()),
        ProductKind::Card => format!("4532-{}-{tail:06}", now.year()),
    }
}

/// `at` moved forward by whole calendar months, keeping the time of day.
///
/// The day is clamped to the length of the target month (31 Jan + 1 month is 29 Feb
/// in a leap year). `None` if the result leaves the supported calendar range.
#[must_use]
pub fn add_months(at: OffsetDateTime, months: u32) -> Option<OffsetDateTime> {
    let date = at.date();
    let index = i64::from(date.year()) * 12
        + i64::from(u8::from(date.month()) - 1)
        + i64::from(months);
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(index.rem_euclid(12) + 1).ok()?).ok()?;
    let day = date.day().min(month.length(year));
    let date = Date::from_calendar_date(year, month, day).ok()?;
    Some(at.replace_date(date))
}

/// Body sent to create a product. The server assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDraft {
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
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<OffsetDateTime>,
    #[serde(rename = "tasaInteres", skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
    #[serde(rename = "limiteCredito", skip_serializing_if = "Option::is_none")]
    pub credit_limit: Option<f64>,
    #[serde(rename = "moneda")]
    pub currency: String,
}

impl ProductDraft {
    /// An active product starting at `now`, expiring after the requested term.
    #[must_use]
    pub fn from_request(request: &NewProduct, now: OffsetDateTime) -> Self {
        let expires_at = request
            .term_months
            .filter(|&m| m > 0)
            .and_then(|m| add_months(now, m));

        Self {
            kind: request.kind,
            name: request.name.clone(),
            number: product_number(request.kind, now),
            status: ProductStatus::Active,
            balance: request.initial_balance.unwrap_or(0.0),
            contracted_at: now,
            expires_at,
            interest_rate: request.interest_rate,
            credit_limit: request.credit_limit,
            currency: request.currency.clone(),
        }
    }
}
