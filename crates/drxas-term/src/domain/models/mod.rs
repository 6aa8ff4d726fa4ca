mod action;
mod artifact;
mod attached_file;
mod event;
mod material;
mod message;
mod role;
mod session;
mod spectrum;
mod structure;
mod submission;

pub use action::*;
pub use artifact::*;
pub use attached_file::*;
pub use event::*;
pub use material::*;
pub use message::*;
pub use role::*;
pub use session::*;
pub use spectrum::*;
pub use structure::*;
pub use submission::*;
