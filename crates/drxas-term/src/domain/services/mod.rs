mod actions;
mod app_state;
mod events;
pub mod report;
pub mod resolver;
mod session_store;
pub mod submission;

pub use actions::*;
pub use app_state::*;
pub use events::*;
pub use report::ReportPipeline;
pub use report::Report;
pub use report::TableBody;
pub use resolver::MaterialResolver;
pub use session_store::*;
pub use submission::SubmissionController;
pub use submission::SubmitOutcome;
