//! Lossless typed AST for a Kotlin subset
//!
//! A source unit is parsed by `ktast-syntax` and turned into an arena of
//! typed [`Node`]s plus a [`TriviaStore`] holding every whitespace, comment,
//! `;` and trailing comma next to the node it belongs to. The tree can be
//! walked, rewritten copy-on-write, and written back either byte for byte
//! (with its store) or in a canonical layout (without one).
//!
//! ```
//! use ktast_core::{ConstructOptions, Constructed};
//!
//! let source = "val x = \"\" // x is empty\n";
//! let unit = Constructed::from_source(source, &ConstructOptions::default()).unwrap();
//! assert_eq!(unit.write(), source);
//! ```

pub mod batch;
pub mod config;
pub mod construct;
pub mod dump;
pub mod error;
pub mod node;
pub mod result;
pub mod rewrite;
pub mod trivia;
pub mod walk;
pub mod writer;

// Re-export commonly used types
pub use batch::{construct_all, round_trip_all};
pub use config::{ConfigLoader, ConstructOptions, KtastConfig, WriterOptions};
pub use construct::{Constructed, construct};
pub use dump::dump;
pub use error::{ConstructionError, Error, ErrorKind, UnsupportedShapeError};
pub use node::{Ast, ConstantKind, Keyword, ListKind, ModifierKeyword, Node, NodeId};
pub use result::{Result, ResultExt};
pub use rewrite::{Rewriter, rewrite};
pub use trivia::{Trivia, TriviaKind, TriviaPosition, TriviaStore};
pub use walk::{Visitor, walk};
pub use writer::{Writer, needs_backticks, write};

/// Initialize the tracing subscriber for logging
///
/// The filter comes from `RUST_LOG` and defaults to `ktast=info`.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ktast=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
