//! Molecular signatures: canonical string descriptions of every atom's
//! bounded environment, and the molecule-level multiset built from them.

mod element;
pub use element::*;

mod molecule;
pub use molecule::*;

mod error;
pub use error::*;

mod parse;
pub use parse::*;

mod kekulize;
pub use kekulize::*;

mod environment;
pub use environment::*;

mod canon;
pub use canon::*;

mod write;
pub use write::*;

mod fingerprint;
pub use fingerprint::*;

mod flatten;
pub use flatten::*;

mod signature;
pub use signature::*;

mod alphabet;
pub use alphabet::*;

/// Installs a formatting subscriber at `level` (`error` to `trace`).
///
/// Later calls are no-ops, so tests can call this freely.
pub fn init_logging(level: &str) {
    let level = level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
