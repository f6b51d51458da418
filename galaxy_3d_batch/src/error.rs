//! Error types for the Galaxy3D batch crate
//!
//! Every fallible batch operation returns `Result<T>`. Errors are created
//! through the `engine_err!` family of macros so that each one is logged
//! at the point it is raised, with its source component and location.

use std::fmt;

/// Result type for Galaxy3D batch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D batch errors
#[derive(Debug, Clone)]
pub enum Error {
    /// A fixed capacity was exceeded (instances, vertices, indices, LOD
    /// reserve, bones per instance)
    CapacityExceeded(String),

    /// Invalid resource reference or descriptor (unknown geometry, bad
    /// LOD distance, mismatched bone arrays, etc.)
    InvalidResource(String),

    /// A subsystem was used before being initialized
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CapacityExceeded(msg) => write!(f, "Capacity exceeded: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an error and build an `Error::InvalidResource` from it
///
/// # Example
///
/// ```ignore
/// let info = self.geometries.get(id as usize)
///     .ok_or_else(|| engine_err!("galaxy3d::Registry", "Unknown geometry id {}", id))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::InvalidResource(message)
    }};
}

/// Log an error and return `Err(Error::InvalidResource)` from the current function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Log an error and build an `Error::CapacityExceeded` from it
#[macro_export]
macro_rules! engine_capacity_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::CapacityExceeded(message)
    }};
}

/// Log an error and build an `Error::InitializationFailed` from it
#[macro_export]
macro_rules! engine_init_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::InitializationFailed(message)
    }};
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
