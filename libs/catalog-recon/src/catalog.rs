//! Catalog identity
//!
//! A catalog names one pair of source/target tables that are reconciled
//! together. The run guard and the HTTP routes are keyed by it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Products,
    Shops,
}

impl CatalogKind {
    /// All known catalogs, in reconciliation order
    pub const ALL: [CatalogKind; 2] = [CatalogKind::Products, CatalogKind::Shops];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Shops => "shops",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogKind {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "products" | "product" => Ok(Self::Products),
            "shops" | "shop" => Ok(Self::Shops),
            other => Err(ReconError::UnknownCatalog(other.to_string())),
        }
    }
}
