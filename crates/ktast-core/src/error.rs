//! Error types for AST construction and configuration

use std::ops::Range;
use std::path::PathBuf;

use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};
use ktast_syntax::{SyntaxError, TextRange};
use thiserror::Error;

/// Construction of a source unit failed; the unit produces no AST
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// A parse-tree production (or error token) has no node mapping
    #[error("Unmapped production {production} at {range:?}")]
    UnmappedProduction { production: String, range: TextRange },

    /// A mapped production lacks a child the node requires
    #[error("{production} at {range:?} is missing its {child}")]
    MissingChild {
        production: String,
        child: &'static str,
        range: TextRange,
    },

    /// Strict construction refused a tree with syntax errors
    #[error("Source has {} syntax error(s)", markers.len())]
    ErrorMarkers { markers: Vec<SyntaxError> },
}

impl ConstructionError {
    /// Create an unmapped production error
    pub fn unmapped(production: impl Into<String>, range: TextRange) -> Self {
        Self::UnmappedProduction {
            production: production.into(),
            range,
        }
    }

    /// Create a missing child error
    pub fn missing_child(
        production: impl Into<String>,
        child: &'static str,
        range: TextRange,
    ) -> Self {
        Self::MissingChild {
            production: production.into(),
            child,
            range,
        }
    }

    /// Labeled source ranges for rendering
    fn labels(&self) -> Vec<(Range<usize>, String)> {
        match self {
            Self::UnmappedProduction { production, range } => {
                vec![(to_range(*range), format!("no node for {production}"))]
            }
            Self::MissingChild { child, range, .. } => {
                vec![(to_range(*range), format!("expected {child} here"))]
            }
            Self::ErrorMarkers { markers } => markers
                .iter()
                .map(|marker| (to_range(marker.range), marker.message.clone()))
                .collect(),
        }
    }

    /// Render a human-readable report against the unit's source text
    pub fn render(&self, source: &str) -> String {
        let labels = self.labels();
        let primary = labels.first().map_or(0..0, |(range, _)| range.clone());

        let mut report = Report::build(ReportKind::Error, primary)
            .with_config(
                Config::default()
                    .with_color(false)
                    .with_index_type(IndexType::Byte),
            )
            .with_message(self.to_string());
        for (range, message) in labels {
            report = report.with_label(Label::new(range).with_message(message));
        }

        let mut out = Vec::new();
        if report.finish().write(Source::from(source), &mut out).is_err() {
            return self.to_string();
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}

/// A recognized shape the AST deliberately does not model
///
/// Callers may skip the unit instead of failing a whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported {shape} at {range:?}")]
pub struct UnsupportedShapeError {
    pub shape: String,
    pub range: TextRange,
}

impl UnsupportedShapeError {
    pub fn new(shape: impl Into<String>, range: TextRange) -> Self {
        Self {
            shape: shape.into(),
            range,
        }
    }
}

/// Main error type of the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    UnsupportedShape(#[from] UnsupportedShapeError),

    /// Configuration parsing or validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Construction,
    UnsupportedShape,
    Config,
    Io,
}

impl Error {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Construction(_) => ErrorKind::Construction,
            Error::UnsupportedShape(_) => ErrorKind::UnsupportedShape,
            Error::Config { .. } => ErrorKind::Config,
            Error::Io { .. } => ErrorKind::Io,
        }
    }

    /// Only unsupported shapes may be skipped; everything else is terminal
    /// for the unit
    pub fn is_skippable(&self) -> bool {
        self.kind() == ErrorKind::UnsupportedShape
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::config_error(err.to_string())
    }
}

fn to_range(range: TextRange) -> Range<usize> {
    usize::from(range.start())..usize::from(range.end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ktast_syntax::TextSize;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(TextSize::from(start), TextSize::from(end))
    }

    #[test]
    fn test_kind_and_skippable() {
        let unsupported: Error = UnsupportedShapeError::new("dynamic type", range(0, 7)).into();
        assert_eq!(unsupported.kind(), ErrorKind::UnsupportedShape);
        assert!(unsupported.is_skippable());

        let unmapped: Error = ConstructionError::unmapped("ERROR", range(0, 1)).into();
        assert_eq!(unmapped.kind(), ErrorKind::Construction);
        assert!(!unmapped.is_skippable());

        assert!(!Error::config_error("bad").is_skippable());
    }

    #[test]
    fn test_messages() {
        let err = ConstructionError::missing_child("IF_EXPR", "condition", range(3, 9));
        assert_eq!(err.to_string(), "IF_EXPR at 3..9 is missing its condition");

        let err = ConstructionError::ErrorMarkers {
            markers: vec![
                SyntaxError::new("expected `)`", range(1, 2)),
                SyntaxError::new("expected an expression", range(4, 4)),
            ],
        };
        assert_eq!(err.to_string(), "Source has 2 syntax error(s)");

        let err = UnsupportedShapeError::new("dynamic type", range(7, 14));
        assert_eq!(err.to_string(), "Unsupported dynamic type at 7..14");
    }

    #[test]
    fn test_render_mentions_label() {
        let source = "val x = @\n";
        let err = ConstructionError::unmapped("ERROR", range(8, 9));
        let rendered = err.render(source);
        assert!(rendered.contains("Unmapped production ERROR"));
        assert!(rendered.contains("no node for ERROR"));
    }
}
