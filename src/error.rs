use thiserror::Error;

/// Errors reported by this crate.
///
/// Absent keys and empty containers are not errors; lookups report them with `None` or
/// `false`. This type covers handles that no longer refer to a live node and configuration
/// that cannot be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The node behind a handle was removed, or the handle came from another container.
    #[error("stale node handle (slot {slot}, generation {generation})")]
    StaleHandle {
        /// Arena slot the handle pointed at.
        slot: usize,
        /// Generation recorded in the handle.
        generation: u32,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Shorthand for results carrying [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub(crate) fn stale(key: crate::raw::Key) -> Self {
        Error::StaleHandle {
            slot: key.handle.to_index(),
            generation: key.generation,
        }
    }
}
