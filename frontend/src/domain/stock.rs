//! Stock records served by the backend.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Listed stock as returned by `GET /stocks` and `GET /stocks/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    /// Backend identifier.
    pub id: i32,
    /// Ticker symbol.
    pub abbreviation: String,
    /// Company name.
    pub company: String,
    /// Listing date.
    pub since: NaiveDate,
    /// Latest price.
    pub price: f64,
    /// Percentage change since the previous update.
    pub delta: f64,
    /// Date of the latest price update.
    pub last_update: NaiveDate,
    /// Date the record was created.
    pub created_at: NaiveDate,
}

/// Rejected stock identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("stock id must be a positive integer, got {0}")]
pub struct StockIdError(pub i64);

/// Positive stock identifier used to build `/stocks/{id}`.
///
/// # Examples
/// ```
/// use frontend::domain::StockId;
///
/// assert!(StockId::new(7).is_ok());
/// assert!(StockId::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StockId(i32);

impl StockId {
    /// Validate an identifier.
    ///
    /// # Errors
    /// Returns [`StockIdError`] for values below 1 or above `i32::MAX`.
    pub fn new(value: i64) -> Result<Self, StockIdError> {
        match i32::try_from(value) {
            Ok(id) if id >= 1 => Ok(Self(id)),
            _ => Err(StockIdError(value)),
        }
    }

    /// Raw identifier.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Detail path for this stock.
    #[must_use]
    pub fn path(self) -> String {
        format!("/stocks/{}", self.0)
    }
}

impl fmt::Display for StockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for StockId {
    type Err = StockIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map_err(|_| StockIdError(0))
            .and_then(Self::new)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(1, true)]
    #[case(42, true)]
    #[case(i64::from(i32::MAX), true)]
    #[case(0, false)]
    #[case(-3, false)]
    #[case(i64::from(i32::MAX) + 1, false)]
    fn ids_must_be_positive(#[case] raw: i64, #[case] valid: bool) {
        assert_eq!(StockId::new(raw).is_ok(), valid);
    }

    #[rstest]
    #[case("7", Ok(7))]
    #[case(" 12 ", Ok(12))]
    #[case("0", Err(StockIdError(0)))]
    #[case("abc", Err(StockIdError(0)))]
    fn ids_parse_from_route_segments(#[case] raw: &str, #[case] expected: Result<i32, StockIdError>) {
        assert_eq!(raw.parse::<StockId>().map(StockId::get), expected);
    }

    #[test]
    fn detail_path_uses_the_identifier() {
        let id = StockId::new(9).expect("valid id");
        assert_eq!(id.path(), "/stocks/9");
    }

    #[test]
    fn stock_decodes_backend_record() {
        let stock: Stock = serde_json::from_value(json!({
            "id": 1,
            "abbreviation": "ACME",
            "company": "Acme Corp",
            "since": "2001-02-03",
            "price": 12.5,
            "delta": -0.25,
            "last_update": "2024-05-06",
            "created_at": "2024-01-01"
        }))
        .expect("stock decodes");
        assert_eq!(stock.abbreviation, "ACME");
        assert_eq!(
            stock.since,
            NaiveDate::from_ymd_opt(2001, 2, 3).expect("valid date")
        );
    }
}
