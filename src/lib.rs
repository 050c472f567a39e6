// Bookmark Organizer Library Entry Point
// This file exposes all modules so they can be used by main.rs
// and tested independently.

// Core modules
pub mod error;
pub mod organizer;
pub mod settings;

// Shared data model
pub mod state;

// Pure logic and persistence modules
pub mod modules;

pub use error::{OrganizerError, Result};
pub use organizer::Organizer;

/// Installs the log subscriber. `RUST_LOG` overrides `default_level`.
/// Records emitted through the `log` facade are forwarded as well.
pub fn init_logging(default_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
