//! Session core of the Dr.XAS analysis assistant.
//!
//! This crate holds the conversation state, resolves catalog materials into
//! spectrum and structure attachments, submits analysis requests under
//! cancellation and timeout control, and turns result envelopes into report
//! panels. A host terminal feeds user intents in as [`Event`]s and draws the
//! widgets in [`application::ui`] from the [`AppState`] it is handed.

pub mod application;
pub mod configuration;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod test_support;

pub use application::runtime::start_loop;
pub use application::runtime::Session;
pub use configuration::Config;
pub use configuration::ConfigKey;
pub use domain::models::Action;
pub use domain::models::Event;
pub use domain::models::PanelKind;
pub use domain::models::SessionState;
pub use domain::services::AppState;
pub use domain::services::AppStateProps;
pub use infrastructure::clients::ClientManager;
