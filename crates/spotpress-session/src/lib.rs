//! spotpress-session: orchestration for an editing session.
//!
//! The pipeline crate is pure; this crate owns the stateful parts of
//! editing: the parameter state and its bounded undo history, render
//! coalescing for hosts that run the pipeline off-thread, the
//! configuration store, and the multi-step generative-fill workflow.

pub mod fill;
pub mod history;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod store;

pub use fill::{FillError, generative_fill};
pub use history::History;
pub use scheduler::{FillTracker, RenderScheduler, RenderTicket};
pub use session::EditorSession;
pub use state::EditorState;
pub use store::{ConfigStore, MockupCategory, Texture};
