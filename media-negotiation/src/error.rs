//! Error types for media negotiation
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use parley_types::Reason;
use thiserror::Error;

/// Result type for negotiation helpers
pub type NegotiationResult<T> = Result<T, NegotiationError>;

/// Errors raised while reading suites, algorithms or SDP attributes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    /// SRTP suite token could not be parsed
    #[error("Invalid SRTP crypto suite: {0}")]
    InvalidSuite(String),

    /// ZRTP algorithm token not recognized for its category
    #[error("Unknown ZRTP {category} algorithm: {token}")]
    UnknownAlgorithm { category: &'static str, token: String },

    /// Malformed SDP security attribute
    #[error("Invalid SDP attribute: {0}")]
    InvalidSdp(String),
}

/// Why a negotiation round was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No mutually acceptable encryption while one side requires it
    #[error("No mutually acceptable media encryption")]
    EncryptionMismatch,
}

impl RejectReason {
    /// Signaling reason sent back to the peer
    pub fn reason(&self) -> Reason {
        match self {
            RejectReason::EncryptionMismatch => Reason::NotAcceptable,
        }
    }
}
