// Board session and views

pub mod render;
pub mod session;

pub use render::render_board;
pub use session::{BoardSession, SubtaskOutcome, TransitionOutcome};
