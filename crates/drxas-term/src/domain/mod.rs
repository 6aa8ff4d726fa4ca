//! Session domain: the data model and the services that drive it.
//!
//! Models are plain values. Services own the control-loop state
//! (`AppState`), run network work on worker tasks (`ActionsService`) and feed
//! their results back as events (`EventsService`).

pub mod models;
pub mod services;
