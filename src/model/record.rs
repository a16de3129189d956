use crate::model::CityRef;
use serde::{Deserialize, Serialize};

/// Separator between store names in the `Stores` column
pub const STORE_SEPARATOR: &str = ", ";

/// Stores found on one city page
///
/// Serializes with the `State`, `City`, `Stores` column names used by both
/// output files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreRecord {
    #[serde(rename = "State")]
    pub state: String,

    #[serde(rename = "City")]
    pub city: String,

    #[serde(rename = "Stores")]
    pub stores: String,
}

impl StoreRecord {
    /// Builds a record for `city`, carrying over its city and state names
    pub fn for_city(city: &CityRef, stores: String) -> Self {
        Self {
            state: city.state.clone(),
            city: city.name.clone(),
            stores,
        }
    }

    /// True when no store names were found for the city
    pub fn is_empty(&self) -> bool {
        self.stores.trim().is_empty()
    }
}

/// Joins store names into the single delimited `Stores` string
pub fn join_store_names<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|n| n.as_ref())
        .collect::<Vec<_>>()
        .join(STORE_SEPARATOR)
}
