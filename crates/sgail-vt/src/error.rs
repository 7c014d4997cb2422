//! Error types for sgail-vt.

/// Error type for wire-level parsing operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VtError {
    /// A color specification could not be parsed. One kind covers every
    /// malformed input: bad prefix, bad digit, out-of-range component,
    /// unknown color name.
    #[error("invalid color format")]
    InvalidFormat,
}

/// Result type alias for sgail-vt operations.
pub type Result<T> = std::result::Result<T, VtError>;
