//! # about-core - Core Domain Types
//!
//! Foundation crate for the Soldat About panel. Provides the update lifecycle
//! vocabulary, error handling, logging setup, and release notes URLs.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, toml, tracing).
//!
//! ## Public API
//!
//! ### Update Lifecycle (`phase`, `events`)
//! - [`UpdatePhase`] - Authoritative update status (Idle, Checking, UpdateAvailable, etc.)
//! - [`UpdaterEvent`] - Lifecycle events reported by the host updater
//!
//! ### Release Notes (`release_notes`)
//! - [`release_notes_url_for_version()`] - Per-version release notes URL
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use about_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod phase;
pub mod prelude;
pub mod release_notes;

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use events::UpdaterEvent;
pub use phase::UpdatePhase;
pub use release_notes::{release_notes_url_for_version, RELEASES_INDEX_URL, RELEASE_TAG_URL_BASE};
