//! The common error taxonomy for all strata crates.
//!
//! Low-level lookups return `Option`; passes and algorithms convert misses
//! into the typed errors below. A pass either completes its write-back or
//! leaves the database exactly as it found it - partial mutation is never
//! reported as success.

/// Result alias used across the workspace.
pub type StrataResult<T> = Result<T, StrataError>;

/// Location information attached to importer failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}, column {col}: {message}")]
pub struct ParseError {
    /// 1-based source line.
    pub line: u32,
    /// 1-based source column.
    pub col: u32,
    /// What went wrong.
    pub message: String,
}

impl ParseError {
    /// Creates a parse error at the given location.
    pub fn new(line: u32, col: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            col,
            message: message.into(),
        }
    }
}

/// Every failure kind the engine core surfaces.
#[derive(Debug, thiserror::Error)]
pub enum StrataError {
    /// An object looked up by name or key does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Entity kind ("cell", "net", ...).
        kind: &'static str,
        /// The name or key that missed.
        name: String,
    },

    /// An object with the same name is already present.
    #[error("{kind} '{name}' already exists")]
    DuplicateName {
        /// Entity kind ("cell", "net", ...).
        kind: &'static str,
        /// The offending name.
        name: String,
    },

    /// Preconditions for a pass are not met.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Total cell area exceeds the available region area.
    #[error(
        "region area smaller than cell area: {cell_area_um2} um^2 of cells \
         in {region_area_um2} um^2 of core"
    )]
    OverUtilization {
        /// Summed cell area in square micrometers.
        cell_area_um2: f64,
        /// Region area in square micrometers.
        region_area_um2: f64,
    },

    /// Location-bearing failure from an importer.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Solver breakdown or non-convergence.
    #[error("numeric failure: {0}")]
    NumericFailure(String),

    /// The legalizer could not fit an instance into any row.
    #[error("legalization failed for instance '{instance}'")]
    LegalizationFailed {
        /// Name of the instance that did not fit.
        instance: String,
    },

    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StrataError {
    /// Shorthand for an [`StrataError::InvalidState`].
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        StrataError::InvalidState(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = StrataError::NotFound {
            kind: "cell",
            name: "INV_X1".into(),
        };
        assert_eq!(format!("{e}"), "cell 'INV_X1' not found");

        let e = StrataError::OverUtilization {
            cell_area_um2: 2.0,
            region_area_um2: 1.0,
        };
        assert!(format!("{e}").contains("region area smaller than cell area"));
    }

    #[test]
    fn parse_error_carries_location() {
        let p = ParseError::new(12, 3, "unexpected token");
        let e: StrataError = p.into();
        assert_eq!(format!("{e}"), "parse error: line 12, column 3: unexpected token");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: StrataError = io.into();
        assert!(matches!(e, StrataError::Io(_)));
    }
}
