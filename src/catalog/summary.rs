use time::{Duration, OffsetDateTime};

use super::model::{Movement, Product, ProductKind};

const EXPIRY_HORIZON: Duration = Duration::days(30);
const LATEST_MOVEMENTS: usize = 10;

/// Count and balance of the active products of one kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindShare {
    pub kind: ProductKind,
    pub count: usize,
    pub balance: f64,
}

/// Dashboard overview of the user's position.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialSummary {
    /// Sum of the balances of active products.
    pub total_balance: f64,
    pub active_products: usize,
    /// Active products expiring between now and thirty days from now.
    pub upcoming_expiries: Vec<Product>,
    /// Most recent movements first.
    pub latest_movements: Vec<Movement>,
    /// One entry per product kind, in declaration order, empty kinds included.
    pub by_kind: Vec<KindShare>,
}

#[must_use]
pub fn summarize(
    products: &[Product],
    movements: &[Movement],
    now: OffsetDateTime,
) -> FinancialSummary {
    let active: Vec<&Product> = products.iter().filter(|p| p.is_active()).collect();
    let horizon = now + EXPIRY_HORIZON;

    let upcoming_expiries = active
        .iter()
        .filter(|p| p.expires_at.is_some_and(|at| at >= now && at <= horizon))
        .map(|&p| p.clone())
        .collect();

    let mut latest_movements = movements.to_vec();
    latest_movements.sort_by(|a, b| b.date.cmp(&a.date));
    latest_movements.truncate(LATEST_MOVEMENTS);

    let by_kind = ProductKind::ALL
        .iter()
        .map(|&kind| {
            let of_kind = active.iter().filter(|p| p.kind == kind);
            KindShare {
                kind,
                count: of_kind.clone().count(),
                balance: of_kind.map(|p| p.balance).sum(),
            }
        })
        .collect();

    FinancialSummary {
        total_balance: active.iter().map(|p| p.balance).sum(),
        active_products: active.len(),
        upcoming_expiries,
        latest_movements,
        by_kind,
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::catalog::model::{MovementKind, ProductStatus};
    use crate::catalog::test_support::product;
    use crate::types::ProductId;

    const NOW: OffsetDateTime = datetime!(2024-06-01 12:00 UTC);

    fn movement(id: u32, at: OffsetDateTime) -> Movement {
        Movement {
            id: id.to_string(),
            product_id: ProductId::from("p"),
            date: at,
            concept: format!("Movimiento {id}"),
            amount: 10.0,
            kind: MovementKind::Debit,
            resulting_balance: 0.0,
            reference: None,
        }
    }

    #[test]
    fn totals_count_active_products_only() {
        let mut cancelled = product("Vieja", ProductKind::Account, 999.0);
        cancelled.status = ProductStatus::Cancelled;
        let products = [
            product("Cuenta", ProductKind::Account, 1000.0),
            product("Depósito", ProductKind::Deposit, 5000.0),
            product("Tarjeta", ProductKind::Card, -250.0),
            cancelled,
        ];

        let summary = summarize(&products, &[], NOW);

        assert!((summary.total_balance - 5750.0).abs() < f64::EPSILON);
        assert_eq!(summary.active_products, 3);
        let shares: Vec<_> = summary
            .by_kind
            .iter()
            .map(|s| (s.kind, s.count))
            .collect();
        assert_eq!(
            shares,
            [
                (ProductKind::Account, 1),
                (ProductKind::Deposit, 1),
                (ProductKind::Loan, 0),
                (ProductKind::Card, 1),
            ]
        );
        assert!((summary.by_kind[0].balance - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn upcoming_expiries_within_thirty_days() {
        let mut soon = product("Pronto", ProductKind::Deposit, 1.0);
        soon.expires_at = Some(NOW + Duration::days(10));
        let mut edge = product("Límite", ProductKind::Deposit, 1.0);
        edge.expires_at = Some(NOW + Duration::days(30));
        let mut later = product("Tarde", ProductKind::Deposit, 1.0);
        later.expires_at = Some(NOW + Duration::days(31));
        let mut past = product("Pasado", ProductKind::Deposit, 1.0);
        past.expires_at = Some(NOW - Duration::days(1));
        let mut inactive = product("Inactivo", ProductKind::Deposit, 1.0);
        inactive.expires_at = Some(NOW + Duration::days(5));
        inactive.status = ProductStatus::Inactive;

        let summary = summarize(&[soon, edge, later, past, inactive], &[], NOW);
        let names: Vec<_> = summary
            .upcoming_expiries
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["Pronto", "Límite"]);
    }

    #[test]
    fn ten_latest_movements_newest_first() {
        let movements: Vec<_> = (0..15)
            .map(|i| movement(i, NOW - Duration::hours(i64::from(i))))
            .rev()
            .collect();

        let summary = summarize(&[], &movements, NOW);

        assert_eq!(summary.latest_movements.len(), 10);
        assert_eq!(summary.latest_movements[0].id, "0");
        assert_eq!(summary.latest_movements[9].id, "9");
    }
}
