//! Result type alias for AST operations

use crate::error::Error;

/// Standard Result type for AST operations
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for Result to provide additional convenience methods
pub trait ResultExt<T> {
    /// Turn a skippable error into `Ok(None)`, logging it
    fn skip_unsupported(self) -> Result<Option<T>>;

    /// Log any error and continue with `None`
    fn log_and_continue(self) -> Option<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn skip_unsupported(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_skippable() => {
                tracing::warn!("Skipping unit: {}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn log_and_continue(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                if err.is_skippable() {
                    tracing::warn!("Continuing after error: {}", err);
                } else {
                    tracing::error!("Unit failed: {}", err);
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConstructionError, UnsupportedShapeError};
    use ktast_syntax::TextRange;

    #[test]
    fn test_skip_unsupported() {
        let ok: Result<u8> = Ok(1);
        assert_eq!(ok.skip_unsupported().unwrap(), Some(1));

        let skipped: Result<u8> =
            Err(UnsupportedShapeError::new("dynamic type", TextRange::default()).into());
        assert_eq!(skipped.skip_unsupported().unwrap(), None);

        let fatal: Result<u8> =
            Err(ConstructionError::unmapped("ERROR", TextRange::default()).into());
        assert!(fatal.skip_unsupported().is_err());
    }

    #[test]
    fn test_log_and_continue() {
        let fatal: Result<u8> =
            Err(ConstructionError::unmapped("ERROR", TextRange::default()).into());
        assert_eq!(fatal.log_and_continue(), None);
    }
}
