//! Directory entities
//!
//! Data flows strictly top-down through these types:
//!
//! - `StateRef`: one link from the root directory page
//! - `CityRef`: one link from a state page, tagged with its state
//! - `StoreRecord`: the stores found on one city page, tagged with city and state

mod record;
mod refs;

pub use record::{join_store_names, StoreRecord, STORE_SEPARATOR};
pub use refs::{CityRef, StateRef};
