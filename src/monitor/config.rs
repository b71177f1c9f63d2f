use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hash_map::{DEFAULT_MAX_LOAD_FACTOR, check_load_factor};

/// Tuning for a [`Monitor`](super::Monitor).
///
/// Every field has a default, so a partial document deserializes.
///
/// # Examples
///
/// ```
/// use wabi_monitor::MonitorConfig;
///
/// let config: MonitorConfig = serde_json::from_str(r#"{ "id_capacity": 1000 }"#).unwrap();
/// assert_eq!(config.id_capacity, 1000);
/// assert_eq!(config.max_load_factor, 0.9);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Number of records the id index is sized for up front.
    pub id_capacity: usize,
    /// Load factor past which every hash index of the monitor grows.
    pub max_load_factor: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            id_capacity: 0,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}

impl MonitorConfig {
    /// Checks that the configuration can be used.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`](crate::Error::InvalidConfig) if `max_load_factor` is not a
    /// finite number of at least
    /// [`MIN_MAX_LOAD_FACTOR`](crate::hash_map::MIN_MAX_LOAD_FACTOR).
    pub fn validate(&self) -> Result<()> {
        check_load_factor(self.max_load_factor)
    }
}
