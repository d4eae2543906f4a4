//! User needs: service usage profile and market price table

mod data;
pub mod loader;

pub use data::{PriceTable, UsageProfile, UserNeeds};
pub use loader::{
    load_user_needs, load_user_needs_from_reader, validate_user_needs, ConfigError,
    DEFAULT_USER_NEEDS_PATH,
};
