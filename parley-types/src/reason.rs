//! Signaling-layer reason codes surfaced to peers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome returned to the signaling layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Request accepted
    None,
    /// Callee refused (unknown participant joining a room)
    Declined,
    /// Encryption mismatch or chat room protocol violation
    NotAcceptable,
}

impl Reason {
    /// SIP final response status for a rejection, if any
    pub fn sip_status(&self) -> Option<u16> {
        match self {
            Reason::None => None,
            Reason::Declined => Some(603),
            Reason::NotAcceptable => Some(488),
        }
    }

    pub fn is_rejection(&self) -> bool {
        !matches!(self, Reason::None)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phrase = match self {
            Reason::None => "None",
            Reason::Declined => "Declined",
            Reason::NotAcceptable => "Not Acceptable Here",
        };
        f.write_str(phrase)
    }
}
