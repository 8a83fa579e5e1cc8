//! Form validation predicates.
//!
//! Each check returns a [`Validation`] listing every failed rule rather than stopping
//! at the first one, so a form can flag all offending fields at once.

use std::collections::BTreeSet;

use crate::catalog::{NewProduct, ProductKind};
use crate::types::RegisterData;

/// A rule that did not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Failure {
    Required(&'static str),
    MinLength { field: &'static str, min: usize },
    MaxLength { field: &'static str, max: usize },
    /// Numeric field outside the range allowed for the product type.
    OutOfRange(&'static str),
    InvalidEmail,
    InvalidPhone,
    /// Password lacks a digit, an upper-case or a lower-case letter.
    PasswordStrength,
    PasswordMismatch,
    TermsNotAccepted,
}

/// Outcome of a validation: valid when no rule failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    failures: BTreeSet<Failure>,
}

impl Validation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn failures(&self) -> &BTreeSet<Failure> {
        &self.failures
    }

    #[must_use]
    pub fn has(&self, failure: Failure) -> bool {
        self.failures.contains(&failure)
    }

    /// Record `failure` unless `ok` holds.
    pub fn check(&mut self, ok: bool, failure: Failure) -> &mut Self {
        if !ok {
            self.failures.insert(failure);
        }
        self
    }

    pub fn merge(&mut self, other: Validation) -> &mut Self {
        self.failures.extend(other.failures);
        self
    }
}

const PASSWORD_MIN: usize = 8;
const NAME_MIN: usize = 2;
const PRODUCT_NAME_MIN: usize = 3;
const PRODUCT_NAME_MAX: usize = 100;

/// At least eight characters with a digit, an upper-case and a lower-case letter.
#[must_use]
pub fn password_strength(password: &str) -> Validation {
    let mut v = Validation::new();
    if password.is_empty() {
        v.check(false, Failure::Required("password"));
        return v;
    }
    let strong = password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(char::is_uppercase)
        && password.chars().any(char::is_lowercase);
    v.check(
        password.chars().count() >= PASSWORD_MIN,
        Failure::MinLength {
            field: "password",
            min: PASSWORD_MIN,
        },
    )
    .check(strong, Failure::PasswordStrength);
    v
}

#[must_use]
pub fn passwords_match(password: &str, confirmation: &str) -> Validation {
    let mut v = Validation::new();
    v.check(password == confirmation, Failure::PasswordMismatch);
    v
}

/// Loose e-mail shape: one `@`, non-empty local part, dotted domain, no whitespace.
#[must_use]
pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

/// Nine to fifteen ASCII digits.
#[must_use]
pub fn is_phone(value: &str) -> bool {
    (9..=15).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit())
}

fn min_chars(v: &mut Validation, field: &'static str, value: &str, min: usize) {
    if value.trim().is_empty() {
        v.check(false, Failure::Required(field));
    } else {
        v.check(value.chars().count() >= min, Failure::MinLength { field, min });
    }
}

/// Every rule of the registration form.
#[must_use]
pub fn registration(data: &RegisterData) -> Validation {
    let mut v = Validation::new();

    if data.email.trim().is_empty() {
        v.check(false, Failure::Required("email"));
    } else {
        v.check(is_email(&data.email), Failure::InvalidEmail);
    }
    min_chars(&mut v, "nombre", &data.first_name, NAME_MIN);
    min_chars(&mut v, "apellido", &data.last_name, NAME_MIN);
    if let Some(phone) = data.phone.as_deref().filter(|p| !p.is_empty()) {
        v.check(is_phone(phone), Failure::InvalidPhone);
    }
    v.merge(password_strength(&data.password));
    if data.confirm_password.is_empty() {
        v.check(false, Failure::Required("confirmPassword"));
    }
    v.merge(passwords_match(&data.password, &data.confirm_password));
    v.check(data.accepts_terms, Failure::TermsNotAccepted);
    v
}

fn in_range(value: Option<f64>, min: f64, max: f64) -> bool {
    value.is_some_and(|x| x >= min && x <= max)
}

/// Every rule of the contracting wizard, with numeric ranges that depend on the
/// product type.
#[must_use]
pub fn contract_request(product: &NewProduct, accepts_terms: bool) -> Validation {
    let mut v = Validation::new();

    let name = product.name.trim();
    if name.is_empty() {
        v.check(false, Failure::Required("nombre"));
    } else {
        let len = name.chars().count();
        v.check(
            len >= PRODUCT_NAME_MIN,
            Failure::MinLength {
                field: "nombre",
                min: PRODUCT_NAME_MIN,
            },
        )
        .check(
            len <= PRODUCT_NAME_MAX,
            Failure::MaxLength {
                field: "nombre",
                max: PRODUCT_NAME_MAX,
            },
        );
    }
    v.check(!product.currency.trim().is_empty(), Failure::Required("moneda"));

    let term = product.term_months.map(f64::from);
    match product.kind {
        ProductKind::Account => {
            v.check(
                in_range(product.initial_balance, 0.0, f64::MAX),
                Failure::OutOfRange("saldoInicial"),
            );
        }
        ProductKind::Deposit => {
            v.check(
                in_range(product.initial_balance, 1000.0, f64::MAX),
                Failure::OutOfRange("saldoInicial"),
            )
            .check(
                in_range(product.interest_rate, 0.1, 10.0),
                Failure::OutOfRange("tasaInteres"),
            )
            .check(in_range(term, 3.0, 60.0), Failure::OutOfRange("plazoMeses"));
        }
        ProductKind::Loan => {
            v.check(
                in_range(product.initial_balance, 1000.0, f64::MAX),
                Failure::OutOfRange("saldoInicial"),
            )
            .check(
                in_range(product.interest_rate, 1.0, 25.0),
                Failure::OutOfRange("tasaInteres"),
            )
            .check(in_range(term, 12.0, 360.0), Failure::OutOfRange("plazoMeses"));
        }
        ProductKind::Card => {
            v.check(
                in_range(product.credit_limit, 500.0, 50_000.0),
                Failure::OutOfRange("limiteCredito"),
            )
            .check(
                in_range(product.interest_rate, 5.0, 30.0),
                Failure::OutOfRange("tasaInteres"),
            );
        }
    }

    v.check(accepts_terms, Failure::TermsNotAccepted);
    v
}
