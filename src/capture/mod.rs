// Side-data capture
//
// A collector suspends a transition until the user supplies the data the transition
// requires, or cancels.

pub mod collector;
pub mod prompt;
pub mod session;

pub use collector::{ensure_matches, CaptureRequest, ChannelCollector, Collected, SideDataCollector};
#[cfg(any(test, feature = "testing"))]
pub use collector::MockSideDataCollector;
pub use prompt::{parse_line, PromptCollector};
pub use session::{due_date_for, CaptureEvent, CaptureSession};
