//! Shared defaults and observability helpers for the Pronounce workspace.
//!
//! Every other crate depends on this one, so it stays small: the process
//! defaults that the configuration loader, the server and the fetcher agree
//! on, plus the [`observability`] module that wires `tracing`.
//!
//! ```rust
//! use pronounce_common::{DEFAULT_LANGUAGE, DEFAULT_PORT};
//!
//! assert_eq!(DEFAULT_LANGUAGE, "zh");
//! assert_eq!(DEFAULT_PORT, 8771);
//! ```

pub mod observability;

/// Logical application name, used for log file names and config paths.
pub const APP_NAME: &str = "pronounce";

/// Interface the server binds to unless configured otherwise.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port the flashcard client expects the audio source on.
pub const DEFAULT_PORT: u16 = 8771;

/// Dictionary subdomain used when a request carries no `language`.
pub const DEFAULT_LANGUAGE: &str = "zh";
