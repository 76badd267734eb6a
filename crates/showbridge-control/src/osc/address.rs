//! Console OSC address space
//!
//! The console only exposes executors on page 1 over OSC:
//! `/exec/1/{physical}` carries one float in `[0, 1]`, and
//! `/feedback/exec` asks the console to resend every executor value.

use crate::{error::ControlError, Result};

/// Maximum length of an OSC address string
const MAX_OSC_ADDRESS_LENGTH: usize = 1024;

/// Prefix of executor control addresses on page 1
pub const EXEC_ADDRESS_PREFIX: &str = "/exec/1/";

/// Address that requests a full executor feedback dump
pub const FEEDBACK_ADDRESS: &str = "/feedback/exec";

/// Parse an executor address and return its physical slot index.
///
/// Only `/exec/1/{digits}` is accepted.
pub fn parse_exec_address(address: &str) -> Result<u32> {
    if address.len() > MAX_OSC_ADDRESS_LENGTH {
        return Err(ControlError::InvalidMessage(format!(
            "OSC address too long (max {} chars)",
            MAX_OSC_ADDRESS_LENGTH
        )));
    }

    let index = address.strip_prefix(EXEC_ADDRESS_PREFIX).ok_or_else(|| {
        ControlError::InvalidMessage(format!("Not an executor address: {}", address))
    })?;

    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ControlError::InvalidMessage(format!(
            "Invalid executor index in address: {}",
            address
        )));
    }

    index
        .parse()
        .map_err(|_| ControlError::InvalidMessage(format!("Executor index out of range: {}", index)))
}

/// Build the executor address for a physical slot index
pub fn exec_address(physical: u64) -> String {
    format!("{}{}", EXEC_ADDRESS_PREFIX, physical)
}
