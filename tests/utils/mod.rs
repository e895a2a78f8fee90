pub mod builders;
pub mod mocks;

// Re-export main utilities for use by test files
pub use builders::DiceRollBuilder;
#[allow(unused_imports)]
pub use mocks::{FailingHandler, MockTransport, PanickingHandler, RecordingHandler};
