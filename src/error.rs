// error.rs - Error kinds shared by every layer of the overlay core.
//
// Only ProcessNotFound / ModuleNotFound / AccessDenied are meant to reach the
// user. Everything else is absorbed by the smallest unit that can turn it
// into "no value" (a rejected entity, an unprojectable point, a team lookup
// that is retried next cycle).

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the core can produce.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No running process with this executable name.
    #[error("process not found: {0}")]
    ProcessNotFound(String),

    /// The process runs but the module holding the layout is not loaded.
    #[error("module not found: {0}")]
    ModuleNotFound(String),

    /// The process exists but cannot be opened for reading.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A single read against the target failed (unmapped or process gone).
    #[error("memory read failed at 0x{address:X} (size: {size})")]
    ReadFault {
        /// Absolute address in the target.
        address: usize,
        /// Number of bytes requested.
        size: usize,
    },

    /// The projected point sits behind or on the camera plane.
    #[error("degenerate projection (w = {w})")]
    DegenerateProjection {
        /// Homogeneous coordinate that failed the threshold.
        w: f32,
    },

    /// The controlling viewer has no assigned entity yet.
    #[error("local team not resolved yet")]
    UnresolvedTeam,

    /// Invalid configuration file.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl Error {
    /// Faults that end the session: nothing to attach to.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ProcessNotFound(_) | Error::ModuleNotFound(_) | Error::AccessDenied(_)
        )
    }
}
