//! Application layer: logging setup, the control loop and the panel widgets.

pub mod logging;
pub mod runtime;
pub mod ui;
