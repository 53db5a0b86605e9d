//! Sort keys and result windows

use crate::catalog::ColumnCatalog;
use crate::provider::MoorError;
use std::fmt;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub(crate) fn order(self) -> sea_query::Order {
        match self {
            Direction::Asc => sea_query::Order::Asc,
            Direction::Desc => sea_query::Order::Desc,
        }
    }
}

/// A resolved `ORDER BY` term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// SQL column name
    pub column: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }

    /// Parse an order clause such as `"name DESC, id"`
    ///
    /// Each term is a column or member name optionally followed by `ASC` or
    /// `DESC` (case-insensitive). Names resolve through `catalog`.
    ///
    /// # Errors
    ///
    /// `UnknownColumn` for a name the catalog does not know, `QueryError` for
    /// a malformed term.
    pub fn parse_clause(catalog: &ColumnCatalog, clause: &str) -> Result<Vec<OrderBy>, MoorError> {
        let mut terms = Vec::new();
        for term in clause.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let mut parts = term.split_whitespace();
            let (Some(name), direction, None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(MoorError::QueryError(format!("malformed order term `{term}`")));
            };
            let direction = match direction {
                None => Direction::Asc,
                Some(d) if d.eq_ignore_ascii_case("asc") => Direction::Asc,
                Some(d) if d.eq_ignore_ascii_case("desc") => Direction::Desc,
                Some(d) => {
                    return Err(MoorError::QueryError(format!(
                        "unknown sort direction `{d}` in `{term}`"
                    )));
                }
            };
            let column = catalog.resolve(name)?.name;
            terms.push(OrderBy {
                column: column.to_string(),
                direction,
            });
        }
        Ok(terms)
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Asc => write!(f, "{} ASC", self.column),
            Direction::Desc => write!(f, "{} DESC", self.column),
        }
    }
}

/// 1-based result window: `offset` is the position of the first row returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    offset: u64,
    count: u64,
}

impl Range {
    /// Validate a window
    ///
    /// # Errors
    ///
    /// `InvalidRange` when `offset < 1` or `count < 0`.
    pub fn new(offset: i64, count: i64) -> Result<Self, MoorError> {
        match (u64::try_from(offset), u64::try_from(count)) {
            (Ok(o), Ok(c)) if o >= 1 => Ok(Self { offset: o, count: c }),
            _ => Err(MoorError::InvalidRange { offset, count }),
        }
    }

    /// The first row only
    pub fn first() -> Self {
        Self { offset: 1, count: 1 }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Rows to skip (`OFFSET`)
    pub fn skip(&self) -> u64 {
        self.offset - 1
    }

    /// The same window shrunk to at most one row
    pub(crate) fn single(self) -> Self {
        Self {
            offset: self.offset,
            count: self.count.min(1),
        }
    }
}
