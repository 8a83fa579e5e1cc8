use time::OffsetDateTime;

use super::model::{Product, ProductKind, ProductStatus};

/// Catalog filters. An absent field places no constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub kind: Option<ProductKind>,
    pub status: Option<ProductStatus>,
    /// Inclusive lower bound on the contracting date.
    pub date_from: Option<OffsetDateTime>,
    /// Inclusive upper bound on the contracting date.
    pub date_to: Option<OffsetDateTime>,
    /// Case-insensitive substring of name, product number or description.
    pub search_text: Option<String>,
}

impl FilterCriteria {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn kind(mut self, kind: ProductKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn status(mut self, status: ProductStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn contracted_between(
        mut self,
        from: Option<OffsetDateTime>,
        to: Option<OffsetDateTime>,
    ) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    #[must_use]
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// Whether no field constrains anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.status.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.needle().is_none()
    }

    /// Whether `product` satisfies every present field.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if self.kind.is_some_and(|k| k != product.kind) {
            return false;
        }
        if self.status.is_some_and(|s| s != product.status) {
            return false;
        }
        if self.date_from.is_some_and(|from| product.contracted_at < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| product.contracted_at > to) {
            return false;
        }
        match self.needle() {
            Some(needle) => {
                contains_folded(&product.name, &needle)
                    || contains_folded(&product.number, &needle)
                    || product
                        .description
                        .as_deref()
                        .is_some_and(|d| contains_folded(d, &needle))
            }
            None => true,
        }
    }

    /// Lower-cased search text; empty text counts as absent.
    fn needle(&self) -> Option<String> {
        self.search_text
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Products satisfying `criteria`, in input order.
#[must_use]
pub fn apply<'a>(products: &'a [Product], criteria: &FilterCriteria) -> Vec<&'a Product> {
    products.iter().filter(|p| criteria.matches(p)).collect()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::catalog::test_support::product;

    fn names(items: &[&Product]) -> Vec<String> {
        items.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn by_kind() {
        let products = [
            product("Cuenta", ProductKind::Account, 10.0),
            product("Depósito A", ProductKind::Deposit, 20.0),
            product("Depósito B", ProductKind::Deposit, 30.0),
        ];
        let filtered = apply(&products, &FilterCriteria::new().kind(ProductKind::Deposit));
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|p| p.kind == ProductKind::Deposit));
    }

    #[test]
    fn conjunctive() {
        let mut inactive = product("Depósito viejo", ProductKind::Deposit, 1.0);
        inactive.status = ProductStatus::Inactive;
        let products = [
            inactive,
            product("Depósito nuevo", ProductKind::Deposit, 2.0),
            product("Cuenta", ProductKind::Account, 3.0),
        ];
        let criteria = FilterCriteria::new()
            .kind(ProductKind::Deposit)
            .status(ProductStatus::Active);
        assert_eq!(names(&apply(&products, &criteria)), ["Depósito nuevo"]);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let mut early = product("Early", ProductKind::Account, 0.0);
        early.contracted_at = datetime!(2024-01-01 0:00 UTC);
        let mut mid = product("Mid", ProductKind::Account, 0.0);
        mid.contracted_at = datetime!(2024-06-01 0:00 UTC);
        let mut late = product("Late", ProductKind::Account, 0.0);
        late.contracted_at = datetime!(2024-12-31 0:00 UTC);
        let products = [early, mid, late];

        let criteria = FilterCriteria::new().contracted_between(
            Some(datetime!(2024-01-01 0:00 UTC)),
            Some(datetime!(2024-06-01 0:00 UTC)),
        );
        assert_eq!(names(&apply(&products, &criteria)), ["Early", "Mid"]);

        let open_start =
            FilterCriteria::new().contracted_between(None, Some(datetime!(2023-12-31 0:00 UTC)));
        assert!(apply(&products, &open_start).is_empty());
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let mut described = product("Tarjeta", ProductKind::Card, 0.0);
        described.description = Some("Sin comisiones de VIAJE".into());
        let mut numbered = product("Préstamo", ProductKind::Loan, 0.0);
        numbered.number = "PR-2024-000777".into();
        let products = [
            described,
            numbered,
            product("Cuenta Viaje", ProductKind::Account, 0.0),
        ];

        assert_eq!(
            names(&apply(&products, &FilterCriteria::new().search("viaje"))),
            ["Tarjeta", "Cuenta Viaje"]
        );
        assert_eq!(
            names(&apply(&products, &FilterCriteria::new().search("pr-2024"))),
            ["Préstamo"]
        );
    }

    #[test]
    fn empty_search_is_no_constraint() {
        let products = [product("A", ProductKind::Account, 0.0)];
        let criteria = FilterCriteria::new().search("");
        assert!(criteria.is_empty());
        assert_eq!(apply(&products, &criteria).len(), 1);
    }

    #[test]
    fn filtering_is_idempotent() {
        let products = [
            product("Cuenta ahorro", ProductKind::Account, 1.0),
            product("Depósito ahorro", ProductKind::Deposit, 2.0),
            product("Tarjeta", ProductKind::Card, 3.0),
        ];
        let criteria = FilterCriteria::new().search("ahorro");
        let once: Vec<Product> = apply(&products, &criteria).into_iter().cloned().collect();
        let twice = apply(&once, &criteria);
        assert_eq!(names(&twice), names(&once.iter().collect::<Vec<_>>()));
    }
}
