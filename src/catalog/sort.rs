use std::cmp::Ordering;

use super::model::Product;

/// Sortable catalog column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortColumn {
    Name,
    Kind,
    Status,
    Balance,
    ContractedAt,
    /// A column the catalog does not know how to order. Sorting by it keeps the input
    /// order.
    Other(String),
}

impl SortColumn {
    /// Parse a column key as sent by a table header, accepting the server field names.
    #[must_use]
    pub fn parse(key: &str) -> Self {
        match key {
            "name" | "nombre" => Self::Name,
            "kind" | "type" | "tipo" => Self::Kind,
            "status" | "estado" => Self::Status,
            "balance" | "saldo" => Self::Balance,
            "contractedAt" | "contracted_at" | "fechaContratacion" => Self::ContractedAt,
            other => Self::Other(other.to_owned()),
        }
    }

    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Name => a.name.cmp(&b.name),
            Self::Kind => a.kind.as_str().cmp(b.kind.as_str()),
            Self::Status => a.status.as_str().cmp(b.status.as_str()),
            Self::Balance => a.balance.total_cmp(&b.balance),
            Self::ContractedAt => a.contracted_at.cmp(&b.contracted_at),
            Self::Other(_) => Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
    #[default]
    None,
}

/// Requested ordering. Without a column or a direction the input order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub column: Option<SortColumn>,
    pub direction: SortDirection,
}

impl SortSpec {
    #[must_use]
    pub fn unsorted() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn asc(column: SortColumn) -> Self {
        Self {
            column: Some(column),
            direction: SortDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(column: SortColumn) -> Self {
        Self {
            column: Some(column),
            direction: SortDirection::Desc,
        }
    }

    /// Order `items` in place.
    ///
    /// Ascending is a stable sort; descending is exactly the reverse of ascending,
    /// so equal keys appear in reverse input order.
    pub fn apply(&self, items: &mut [&Product]) {
        self.apply_by(items, |p| *p);
    }

    /// Order `items` in place by the product each one refers to.
    pub fn apply_by<'p, T>(&self, items: &mut [T], product: impl Fn(&T) -> &'p Product) {
        let Some(column) = &self.column else { return };
        if matches!(column, SortColumn::Other(_)) {
            return;
        }
        match self.direction {
            SortDirection::None => {}
            SortDirection::Asc => items.sort_by(|a, b| column.compare(product(a), product(b))),
            SortDirection::Desc => {
                items.sort_by(|a, b| column.compare(product(a), product(b)));
                items.reverse();
            }
        }
    }
}
