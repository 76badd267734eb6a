//! Executor records and the show snapshot scraped from the console

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::FADER_THRESHOLD;

/// Logical executor number as used by the hub and by clients.
pub type ExecutorNumber = u32;

/// How an executor reacts to commands.
///
/// Governs how hardware input is turned into values, not how it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorType {
    /// Latching on/off button
    Toggle,
    /// Momentary button, on while held
    Flash,
    /// Continuous fader
    Fader,
    /// Anything the console reports that we do not model
    #[default]
    Other,
}

impl ExecutorType {
    /// Map the console's type code (`T`, `F`, `V`) to a type.
    ///
    /// Matching is case-insensitive; console firmware versions disagree on
    /// the case. Unknown codes map to [`ExecutorType::Other`].
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "t" => ExecutorType::Toggle,
            "f" => ExecutorType::Flash,
            "v" => ExecutorType::Fader,
            _ => ExecutorType::Other,
        }
    }

    /// Type assumed for an executor we have never seen in a snapshot.
    pub fn default_for(number: ExecutorNumber) -> Self {
        if number > FADER_THRESHOLD {
            ExecutorType::Fader
        } else {
            ExecutorType::Toggle
        }
    }

    /// Type enforced on an executor after a snapshot reload.
    ///
    /// Numbers above [`FADER_THRESHOLD`] are always faders on this console
    /// layout, whatever the page reports.
    pub fn coerce(self, number: ExecutorNumber) -> Self {
        if number > FADER_THRESHOLD {
            ExecutorType::Fader
        } else {
            self
        }
    }
}

/// One controllable element on the console
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Executor {
    /// Logical executor number
    pub number: ExecutorNumber,
    /// Display label; absent for empty slots
    pub name: Option<String>,
    /// Command semantics
    #[serde(rename = "type")]
    pub kind: ExecutorType,
    /// Button color hint (hex)
    pub color: Option<String>,
    /// Indicator dot color hint (hex), absent when the console reports none
    pub dot_color: Option<String>,
}

impl Executor {
    /// Create an empty record for an executor number
    pub fn new(number: ExecutorNumber) -> Self {
        Self {
            number,
            name: None,
            kind: ExecutorType::Other,
            color: None,
            dot_color: None,
        }
    }
}

/// Result of one scrape of the console's web pages.
///
/// Always replaced wholesale on reload, never merged into a previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowSnapshot {
    /// Name of the loaded show, if the console reported one
    pub show_name: Option<String>,
    /// Executor table keyed by logical number
    pub executors: BTreeMap<ExecutorNumber, Executor>,
}

impl ShowSnapshot {
    /// Create a snapshot from its parts
    pub fn new(show_name: Option<String>, executors: BTreeMap<ExecutorNumber, Executor>) -> Self {
        Self {
            show_name,
            executors,
        }
    }
}
