//! Catalog sort keys.
//!
//! "Unset" (server default ordering) is modelled as `Option::<SortKey>::None`
//! rather than a variant, so the query string simply omits `sort`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown sort key.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid sort key: {0} (expected price_asc, price_desc, title_asc or title_desc)")]
pub struct SortKeyError(pub String);

/// Ordering applied to product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Cheapest first.
    PriceAsc,
    /// Most expensive first.
    PriceDesc,
    /// Title A-Z.
    TitleAsc,
    /// Title Z-A.
    TitleDesc,
}

impl SortKey {
    /// All sort keys, in menu order.
    pub const ALL: [Self; 4] = [Self::PriceAsc, Self::PriceDesc, Self::TitleAsc, Self::TitleDesc];

    /// Value sent in the `sort` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::TitleAsc => "title_asc",
            Self::TitleDesc => "title_desc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = SortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| SortKeyError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values_round_trip_through_from_str() {
        for key in SortKey::ALL {
            assert_eq!(key.as_str().parse::<SortKey>().unwrap(), key);
        }
    }

    #[test]
    fn test_unknown_key() {
        let err = "newest".parse::<SortKey>().unwrap_err();
        assert_eq!(err, SortKeyError("newest".to_string()));
    }

    #[test]
    fn test_serde_matches_query_value() {
        assert_eq!(
            serde_json::to_string(&SortKey::TitleDesc).unwrap(),
            "\"title_desc\""
        );
    }
}
