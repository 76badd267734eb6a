//! OSC link to the lighting console

mod address;
mod transport;
mod types;

pub use address::{exec_address, parse_exec_address, EXEC_ADDRESS_PREFIX, FEEDBACK_ADDRESS};
pub use transport::OscTransport;
pub use types::{osc_to_value, value_to_osc};

use showbridge_core::ExecutorNumber;

/// An executor value reported by the console
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutorFeedback {
    /// Logical executor number
    pub number: ExecutorNumber,
    /// Reported value
    pub value: f32,
}
