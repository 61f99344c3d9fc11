//! Encryption policy, peer capabilities and negotiation outcome
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


use crate::crypto_suite::{CryptoSuiteCatalog, SrtpSuite};
use crate::zrtp::{ZrtpAlgorithms, ZrtpPreferences};
use parley_config::MediaConfig;
use parley_types::MediaEncryption;

/// Local encryption policy, read-only during a negotiation round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionPolicy {
    /// Preferred mode
    pub mode: MediaEncryption,
    /// Reject the session rather than fall back to plain RTP
    pub mandatory: bool,
    /// Accept any encrypted mode the peer offers, not only `mode`
    pub accept_any_encryption: bool,
    /// Suites and algorithms this endpoint supports
    pub catalog: CryptoSuiteCatalog,
}

impl EncryptionPolicy {
    pub fn new(mode: MediaEncryption, mandatory: bool) -> Self {
        Self {
            mode,
            mandatory,
            accept_any_encryption: false,
            catalog: CryptoSuiteCatalog::default(),
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self {
            mode: config.encryption,
            mandatory: config.encryption_mandatory,
            accept_any_encryption: config.accept_any_encryption,
            catalog: CryptoSuiteCatalog::from_config(config),
        }
    }

    pub fn with_catalog(mut self, catalog: CryptoSuiteCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_accept_any_encryption(mut self, accept: bool) -> Self {
        self.accept_any_encryption = accept;
        self
    }

    pub fn allowed_srtp_suites(&self) -> &[SrtpSuite] {
        self.catalog.srtp_suites()
    }

    pub fn zrtp_preferences(&self) -> &ZrtpPreferences {
        self.catalog.zrtp()
    }

    /// What this endpoint advertises when it sends the offer
    pub fn advertised(&self) -> PeerCapabilities {
        let mut caps = PeerCapabilities::none();
        match self.mode {
            MediaEncryption::None => {}
            MediaEncryption::Srtp => caps.srtp_suites = self.catalog.srtp_suites().to_vec(),
            MediaEncryption::Zrtp => caps.zrtp = Some(self.catalog.zrtp().clone()),
            MediaEncryption::Dtls => caps.dtls = self.catalog.supports_dtls(),
        }
        caps.mandatory = self.mandatory && self.mode.is_encrypted();
        caps
    }
}

/// What the peer advertised over signaling
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerCapabilities {
    /// Offered SRTP suites, in the peer's preference order
    pub srtp_suites: Vec<SrtpSuite>,
    /// ZRTP support and the peer's algorithm preferences
    pub zrtp: Option<ZrtpPreferences>,
    /// DTLS-SRTP fingerprint present
    pub dtls: bool,
    /// Peer offered only a secure profile, plain RTP is not acceptable to it
    pub mandatory: bool,
}

impl PeerCapabilities {
    /// Nothing offered
    pub fn none() -> Self {
        Self::default()
    }

    pub fn srtp(suites: Vec<SrtpSuite>) -> Self {
        Self {
            srtp_suites: suites,
            ..Self::default()
        }
    }

    pub fn zrtp(preferences: ZrtpPreferences) -> Self {
        Self {
            zrtp: Some(preferences),
            ..Self::default()
        }
    }

    pub fn dtls() -> Self {
        Self {
            dtls: true,
            ..Self::default()
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn offers(&self, mode: MediaEncryption) -> bool {
        match mode {
            MediaEncryption::None => !self.mandatory,
            MediaEncryption::Srtp => !self.srtp_suites.is_empty(),
            MediaEncryption::Zrtp => self.zrtp.is_some(),
            MediaEncryption::Dtls => self.dtls,
        }
    }

    /// No encryption offered at all
    pub fn is_empty(&self) -> bool {
        self.srtp_suites.is_empty() && self.zrtp.is_none() && !self.dtls
    }
}

/// Concrete suite chosen for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectedSuite {
    Srtp(SrtpSuite),
    Zrtp(ZrtpAlgorithms),
}

/// Result of a negotiation round, immutable once committed to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedEncryption {
    pub mode: MediaEncryption,
    pub selected_suite: Option<SelectedSuite>,
    pub is_post_quantum: bool,
}

impl NegotiatedEncryption {
    /// Plain RTP
    pub fn none() -> Self {
        Self {
            mode: MediaEncryption::None,
            selected_suite: None,
            is_post_quantum: false,
        }
    }

    pub fn srtp(suite: SrtpSuite) -> Self {
        Self {
            mode: MediaEncryption::Srtp,
            selected_suite: Some(SelectedSuite::Srtp(suite)),
            is_post_quantum: false,
        }
    }

    pub fn zrtp(algorithms: ZrtpAlgorithms) -> Self {
        Self {
            mode: MediaEncryption::Zrtp,
            selected_suite: Some(SelectedSuite::Zrtp(algorithms)),
            is_post_quantum: algorithms.is_post_quantum(),
        }
    }

    pub fn dtls() -> Self {
        Self {
            mode: MediaEncryption::Dtls,
            selected_suite: None,
            is_post_quantum: false,
        }
    }

    pub fn srtp_suite(&self) -> Option<SrtpSuite> {
        match self.selected_suite {
            Some(SelectedSuite::Srtp(suite)) => Some(suite),
            _ => None,
        }
    }

    pub fn zrtp_algorithms(&self) -> Option<ZrtpAlgorithms> {
        match self.selected_suite {
            Some(SelectedSuite::Zrtp(algorithms)) => Some(algorithms),
            _ => None,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.mode.is_encrypted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto_suite::SrtpCipher;

    #[test]
    fn test_advertised_follows_mode() {
        let srtp = EncryptionPolicy::new(MediaEncryption::Srtp, true).advertised();
        assert_eq!(srtp.srtp_suites.len(), 4);
        assert!(srtp.mandatory);
        assert!(srtp.zrtp.is_none());

        let plain = EncryptionPolicy::new(MediaEncryption::None, true).advertised();
        assert!(plain.is_empty());
        assert!(!plain.mandatory);

        let dtls = EncryptionPolicy::new(MediaEncryption::Dtls, false).advertised();
        assert!(dtls.offers(MediaEncryption::Dtls));
        assert!(dtls.offers(MediaEncryption::None));
    }

    #[test]
    fn test_policy_from_config() {
        let config = MediaConfig {
            encryption: MediaEncryption::Zrtp,
            encryption_mandatory: true,
            accept_any_encryption: true,
            ..MediaConfig::default()
        };
        let policy = EncryptionPolicy::from_config(&config);
        assert_eq!(policy.mode, MediaEncryption::Zrtp);
        assert!(policy.mandatory);
        assert!(policy.accept_any_encryption);
        assert_eq!(policy.allowed_srtp_suites()[0], SrtpSuite::new(SrtpCipher::AesCm128HmacSha1_80));
    }

    #[test]
    fn test_negotiated_accessors() {
        let suite = SrtpSuite::new(SrtpCipher::AeadAes256Gcm);
        let negotiated = NegotiatedEncryption::srtp(suite);
        assert_eq!(negotiated.srtp_suite(), Some(suite));
        assert!(negotiated.zrtp_algorithms().is_none());
        assert!(negotiated.is_encrypted());
        assert!(!NegotiatedEncryption::none().is_encrypted());
    }
}
