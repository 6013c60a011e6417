/*
[INPUT]:  Public API exports for the surv CLI crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod context;
pub mod notify;

// Re-export main types for convenience
pub use config::{LemmaSettings, SurvConfig};
pub use context::AppContext;
pub use notify::ConsoleNotifier;
