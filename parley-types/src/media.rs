//! Media encryption modes shared by configuration and negotiation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParleyError;

/// Media encryption mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaEncryption {
    /// Plain RTP
    #[default]
    None,
    /// SRTP keyed through SDP `a=crypto` lines
    Srtp,
    /// SRTP keyed by a ZRTP exchange on the media path
    Zrtp,
    /// SRTP keyed by a DTLS handshake on the media path
    Dtls,
}

impl MediaEncryption {
    pub fn is_encrypted(&self) -> bool {
        !matches!(self, MediaEncryption::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaEncryption::None => "none",
            MediaEncryption::Srtp => "srtp",
            MediaEncryption::Zrtp => "zrtp",
            MediaEncryption::Dtls => "dtls",
        }
    }
}

impl fmt::Display for MediaEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaEncryption {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(MediaEncryption::None),
            "srtp" => Ok(MediaEncryption::Srtp),
            "zrtp" => Ok(MediaEncryption::Zrtp),
            "dtls" | "dtls-srtp" => Ok(MediaEncryption::Dtls),
            other => Err(ParleyError::Validation(format!("unknown media encryption: {}", other))),
        }
    }
}
