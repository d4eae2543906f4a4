//! Load and validate user needs configuration
//!
//! Configuration problems are fatal: nothing useful can be computed without
//! a valid usage profile and price table, so validation happens here, before
//! any plan calculation starts.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::data::UserNeeds;

/// Default location of the user needs configuration
pub const DEFAULT_USER_NEEDS_PATH: &str = "data/user_needs.json";

/// Fatal configuration errors surfaced before any calculation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("user needs file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid user needs JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("usage_profile cannot be empty")]
    EmptyUsageProfile,

    #[error("standard_costs cannot be empty")]
    EmptyStandardCosts,

    #[error("negative value for '{key}' in {section}: {value}")]
    NegativeValue {
        section: &'static str,
        key: String,
        value: f64,
    },
}

/// Load user needs from a JSON file, failing fast on invalid configuration
pub fn load_user_needs<P: AsRef<Path>>(path: P) -> Result<UserNeeds, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    load_user_needs_from_reader(BufReader::new(file))
}

/// Load user needs from any reader (e.g., string buffer, request body)
pub fn load_user_needs_from_reader<R: Read>(reader: R) -> Result<UserNeeds, ConfigError> {
    let needs: UserNeeds = serde_json::from_reader(reader)?;
    validate_user_needs(&needs)?;
    Ok(needs)
}

/// Validate an already-deserialized configuration.
///
/// Non-numeric values are rejected earlier by deserialization; this checks
/// the constraints serde cannot express: non-empty maps and non-negative
/// quantities and prices.
pub fn validate_user_needs(needs: &UserNeeds) -> Result<(), ConfigError> {
    if needs.usage_profile.is_empty() {
        return Err(ConfigError::EmptyUsageProfile);
    }
    if needs.standard_costs.is_empty() {
        return Err(ConfigError::EmptyStandardCosts);
    }

    for (key, &quantity) in &needs.usage_profile {
        if quantity < 0.0 {
            return Err(ConfigError::NegativeValue {
                section: "usage_profile",
                key: key.clone(),
                value: quantity,
            });
        }
    }

    for (key, &price) in &needs.standard_costs {
        if price < 0.0 {
            return Err(ConfigError::NegativeValue {
                section: "standard_costs",
                key: key.clone(),
                value: price,
            });
        }
    }

    Ok(())
}
