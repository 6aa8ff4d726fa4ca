//! Infrastructure layer wiring the backend and storage clients.

pub mod clients;
