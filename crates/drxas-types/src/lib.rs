//! Type definitions for the Dr.XAS analysis backend contract
//!
//! This crate holds the payloads exchanged between the session core and the
//! analysis backend (`POST /chat`, the spectrum catalog) together with the error
//! taxonomy both sides report failures in. Keeping them in one leaf crate lets
//! the HTTP client and the session core agree on the wire shape without
//! depending on each other.
//!
//! ## Example
//!
//! ```rust
//! use drxas_types::{ArtifactKind, ResultEnvelope};
//!
//! let envelope = ResultEnvelope::from_value(serde_json::json!({
//!     "messages": "fit converged",
//!     "xas_url": "viz/Ni_foil_all.jpg"
//! }))
//! .unwrap();
//!
//! assert_eq!(envelope.artifact(ArtifactKind::Spectrum), Some("viz/Ni_foil_all.jpg"));
//! assert_eq!(envelope.artifact(ArtifactKind::Structure), None);
//! ```

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
