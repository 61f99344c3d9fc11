//! SRTP crypto suites and the local suite catalog
//!
//! Suites are written `BASE_ALGORITHM [UNENCRYPTED_SRTP] [UNENCRYPTED_SRTCP]`,
//! lists are comma separated and ordered by preference. Two suites match only
//! when the base cipher and the whole modifier set are equal.
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


use crate::error::{NegotiationError, NegotiationResult};
use crate::zrtp::ZrtpPreferences;
use parley_config::MediaConfig;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

const UNENCRYPTED_SRTP: &str = "UNENCRYPTED_SRTP";
const UNENCRYPTED_SRTCP: &str = "UNENCRYPTED_SRTCP";

/// SRTP base cipher and authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SrtpCipher {
    /// AES-128 counter mode, 80-bit HMAC-SHA1 tag
    AesCm128HmacSha1_80,
    /// AES-128 counter mode, 32-bit HMAC-SHA1 tag
    AesCm128HmacSha1_32,
    /// AES-256 counter mode, 80-bit HMAC-SHA1 tag
    Aes256CmHmacSha1_80,
    /// AES-256 counter mode, 32-bit HMAC-SHA1 tag
    Aes256CmHmacSha1_32,
    /// AES-128 GCM (RFC 7714)
    AeadAes128Gcm,
    /// AES-256 GCM (RFC 7714)
    AeadAes256Gcm,
}

impl SrtpCipher {
    pub const ALL: [SrtpCipher; 6] = [
        SrtpCipher::AesCm128HmacSha1_80,
        SrtpCipher::AesCm128HmacSha1_32,
        SrtpCipher::Aes256CmHmacSha1_80,
        SrtpCipher::Aes256CmHmacSha1_32,
        SrtpCipher::AeadAes128Gcm,
        SrtpCipher::AeadAes256Gcm,
    ];

    /// Name as written in SDP and configuration
    pub fn name(&self) -> &'static str {
        match self {
            SrtpCipher::AesCm128HmacSha1_80 => "AES_CM_128_HMAC_SHA1_80",
            SrtpCipher::AesCm128HmacSha1_32 => "AES_CM_128_HMAC_SHA1_32",
            SrtpCipher::Aes256CmHmacSha1_80 => "AES_256_CM_HMAC_SHA1_80",
            SrtpCipher::Aes256CmHmacSha1_32 => "AES_256_CM_HMAC_SHA1_32",
            SrtpCipher::AeadAes128Gcm => "AEAD_AES_128_GCM",
            SrtpCipher::AeadAes256Gcm => "AEAD_AES_256_GCM",
        }
    }

    /// Master key length in bytes
    pub fn master_key_len(&self) -> usize {
        match self {
            SrtpCipher::AesCm128HmacSha1_80
            | SrtpCipher::AesCm128HmacSha1_32
            | SrtpCipher::AeadAes128Gcm => 16,
            SrtpCipher::Aes256CmHmacSha1_80
            | SrtpCipher::Aes256CmHmacSha1_32
            | SrtpCipher::AeadAes256Gcm => 32,
        }
    }

    /// Master salt length in bytes
    pub fn master_salt_len(&self) -> usize {
        if self.is_aead() {
            12
        } else {
            14
        }
    }

    /// Authentication tag length in bits
    pub fn auth_tag_bits(&self) -> u32 {
        match self {
            SrtpCipher::AesCm128HmacSha1_80 | SrtpCipher::Aes256CmHmacSha1_80 => 80,
            SrtpCipher::AesCm128HmacSha1_32 | SrtpCipher::Aes256CmHmacSha1_32 => 32,
            SrtpCipher::AeadAes128Gcm | SrtpCipher::AeadAes256Gcm => 128,
        }
    }

    pub fn is_aead(&self) -> bool {
        matches!(self, SrtpCipher::AeadAes128Gcm | SrtpCipher::AeadAes256Gcm)
    }
}

impl fmt::Display for SrtpCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SrtpCipher {
    type Err = NegotiationError;

    fn from_str(s: &str) -> NegotiationResult<Self> {
        let s = s.trim();
        SrtpCipher::ALL
            .iter()
            .copied()
            .find(|cipher| cipher.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| NegotiationError::InvalidSuite(s.to_string()))
    }
}

/// An SRTP suite: base cipher plus the unencrypted-stream modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SrtpSuite {
    pub cipher: SrtpCipher,
    /// RTP payloads are authenticated but not encrypted
    pub unencrypted_srtp: bool,
    /// RTCP packets are authenticated but not encrypted
    pub unencrypted_srtcp: bool,
}

impl SrtpSuite {
    /// Fully encrypted suite
    pub fn new(cipher: SrtpCipher) -> Self {
        Self {
            cipher,
            unencrypted_srtp: false,
            unencrypted_srtcp: false,
        }
    }

    pub fn with_unencrypted_srtp(mut self) -> Self {
        self.unencrypted_srtp = true;
        self
    }

    pub fn with_unencrypted_srtcp(mut self) -> Self {
        self.unencrypted_srtcp = true;
        self
    }

    pub fn is_fully_encrypted(&self) -> bool {
        !self.unencrypted_srtp && !self.unencrypted_srtcp
    }

    /// Apply one modifier token, returning false if the token is not a modifier
    pub(crate) fn apply_modifier(&mut self, token: &str) -> bool {
        if token.eq_ignore_ascii_case(UNENCRYPTED_SRTP) {
            self.unencrypted_srtp = true;
            true
        } else if token.eq_ignore_ascii_case(UNENCRYPTED_SRTCP) {
            self.unencrypted_srtcp = true;
            true
        } else {
            false
        }
    }

    /// Modifier tokens in canonical order
    pub fn modifiers(&self) -> Vec<&'static str> {
        let mut modifiers = Vec::new();
        if self.unencrypted_srtp {
            modifiers.push(UNENCRYPTED_SRTP);
        }
        if self.unencrypted_srtcp {
            modifiers.push(UNENCRYPTED_SRTCP);
        }
        modifiers
    }
}

impl fmt::Display for SrtpSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cipher.name())?;
        for modifier in self.modifiers() {
            write!(f, " {}", modifier)?;
        }
        Ok(())
    }
}

impl FromStr for SrtpSuite {
    type Err = NegotiationError;

    fn from_str(s: &str) -> NegotiationResult<Self> {
        let mut tokens = s.split_whitespace();
        let base = tokens
            .next()
            .ok_or_else(|| NegotiationError::InvalidSuite(s.to_string()))?;
        let mut suite = SrtpSuite::new(base.parse()?);

        for token in tokens {
            if !suite.apply_modifier(token) {
                return Err(NegotiationError::InvalidSuite(format!(
                    "unknown modifier {} in {}",
                    token,
                    s.trim()
                )));
            }
        }
        Ok(suite)
    }
}

/// Suites offered when nothing is configured
pub fn default_srtp_suites() -> Vec<SrtpSuite> {
    vec![
        SrtpSuite::new(SrtpCipher::AesCm128HmacSha1_80),
        SrtpSuite::new(SrtpCipher::AesCm128HmacSha1_32),
        SrtpSuite::new(SrtpCipher::Aes256CmHmacSha1_80),
        SrtpSuite::new(SrtpCipher::Aes256CmHmacSha1_32),
    ]
}

/// Parse a comma separated suite list, skipping tokens that do not parse.
///
/// Duplicates keep their first position. An empty result falls back to
/// [`default_srtp_suites`].
pub fn parse_suite_list(list: &str) -> Vec<SrtpSuite> {
    let mut suites: Vec<SrtpSuite> = Vec::new();
    for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.parse::<SrtpSuite>() {
            Ok(suite) if !suites.contains(&suite) => suites.push(suite),
            Ok(_) => debug!(suite = token, "Duplicate SRTP crypto suite ignored"),
            Err(e) => warn!(suite = token, error = %e, "Unsupported SRTP crypto suite ignored"),
        }
    }

    if suites.is_empty() {
        default_srtp_suites()
    } else {
        suites
    }
}

/// Parse a comma separated suite list, failing on the first bad token
pub fn parse_suite_list_strict(list: &str) -> NegotiationResult<Vec<SrtpSuite>> {
    let mut suites: Vec<SrtpSuite> = Vec::new();
    for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let suite = token.parse::<SrtpSuite>()?;
        if !suites.contains(&suite) {
            suites.push(suite);
        }
    }
    Ok(suites)
}

/// Render suites back to the configuration format
pub fn format_suite_list(suites: &[SrtpSuite]) -> String {
    suites
        .iter()
        .map(|suite| suite.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Everything this endpoint can negotiate, in preference order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoSuiteCatalog {
    srtp_suites: Vec<SrtpSuite>,
    zrtp: ZrtpPreferences,
    supports_dtls: bool,
}

impl CryptoSuiteCatalog {
    pub fn new(srtp_suites: Vec<SrtpSuite>, zrtp: ZrtpPreferences) -> Self {
        Self {
            srtp_suites,
            zrtp,
            supports_dtls: true,
        }
    }

    /// Build the catalog from the media section of the configuration
    pub fn from_config(config: &MediaConfig) -> Self {
        let srtp_suites = config
            .srtp_crypto_suites
            .as_deref()
            .map(parse_suite_list)
            .unwrap_or_else(default_srtp_suites);

        let zrtp = ZrtpPreferences::from_config(config);

        debug!(
            srtp = %format_suite_list(&srtp_suites),
            zrtp_key_agreements = ?zrtp.key_agreements(),
            "Crypto suite catalog loaded"
        );

        Self::new(srtp_suites, zrtp)
    }

    pub fn srtp_suites(&self) -> &[SrtpSuite] {
        &self.srtp_suites
    }

    pub fn zrtp(&self) -> &ZrtpPreferences {
        &self.zrtp
    }

    pub fn supports_dtls(&self) -> bool {
        self.supports_dtls
    }

    pub fn supports_srtp_suite(&self, suite: &SrtpSuite) -> bool {
        self.srtp_suites.contains(suite)
    }
}

impl Default for CryptoSuiteCatalog {
    fn default() -> Self {
        Self::new(default_srtp_suites(), ZrtpPreferences::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suite_with_modifiers() {
        let suite: SrtpSuite = "AES_CM_128_HMAC_SHA1_80 UNENCRYPTED_SRTCP UNENCRYPTED_SRTP"
            .parse()
            .unwrap();
        assert_eq!(suite.cipher, SrtpCipher::AesCm128HmacSha1_80);
        assert!(suite.unencrypted_srtp);
        assert!(suite.unencrypted_srtcp);
        assert_eq!(
            suite.to_string(),
            "AES_CM_128_HMAC_SHA1_80 UNENCRYPTED_SRTP UNENCRYPTED_SRTCP"
        );
    }

    #[test]
    fn test_modifier_set_must_match_exactly() {
        let plain: SrtpSuite = "AES_CM_128_HMAC_SHA1_80".parse().unwrap();
        let srtcp: SrtpSuite = "AES_CM_128_HMAC_SHA1_80 UNENCRYPTED_SRTCP".parse().unwrap();
        let both: SrtpSuite = "AES_CM_128_HMAC_SHA1_80 UNENCRYPTED_SRTP UNENCRYPTED_SRTCP"
            .parse()
            .unwrap();
        assert_ne!(plain, srtcp);
        assert_ne!(srtcp, both);
        assert_eq!(plain.cipher, both.cipher);
    }

    #[test]
    fn test_parse_rejects_unknown_tokens() {
        assert!("AES_CM_512_HMAC_SHA1_80".parse::<SrtpSuite>().is_err());
        assert!("AES_CM_128_HMAC_SHA1_80 UNENCRYPTED_EVERYTHING".parse::<SrtpSuite>().is_err());
        assert!("".parse::<SrtpSuite>().is_err());
    }

    #[test]
    fn test_parse_list_keeps_order_and_skips_bad_tokens() {
        let suites = parse_suite_list(
            "AES_256_CM_HMAC_SHA1_32, BOGUS_SUITE,AEAD_AES_128_GCM UNENCRYPTED_SRTP , AES_256_CM_HMAC_SHA1_32",
        );
        assert_eq!(
            suites,
            vec![
                SrtpSuite::new(SrtpCipher::Aes256CmHmacSha1_32),
                SrtpSuite::new(SrtpCipher::AeadAes128Gcm).with_unencrypted_srtp(),
            ]
        );
        assert!(parse_suite_list_strict("AES_256_CM_HMAC_SHA1_32, BOGUS_SUITE").is_err());
    }

    #[test]
    fn test_empty_list_falls_back_to_defaults() {
        assert_eq!(parse_suite_list(" , "), default_srtp_suites());
        assert_eq!(
            format_suite_list(&default_srtp_suites()),
            "AES_CM_128_HMAC_SHA1_80, AES_CM_128_HMAC_SHA1_32, AES_256_CM_HMAC_SHA1_80, AES_256_CM_HMAC_SHA1_32"
        );
    }

    #[test]
    fn test_cipher_properties() {
        assert_eq!(SrtpCipher::Aes256CmHmacSha1_32.master_key_len(), 32);
        assert_eq!(SrtpCipher::AesCm128HmacSha1_32.auth_tag_bits(), 32);
        assert_eq!(SrtpCipher::AeadAes256Gcm.master_salt_len(), 12);
        assert!(!SrtpCipher::AesCm128HmacSha1_80.is_aead());
    }

    #[test]
    fn test_catalog_from_config() {
        let config = MediaConfig {
            srtp_crypto_suites: Some("AEAD_AES_256_GCM, AES_CM_128_HMAC_SHA1_80 UNENCRYPTED_SRTCP".to_string()),
            ..MediaConfig::default()
        };
        let catalog = CryptoSuiteCatalog::from_config(&config);
        assert_eq!(catalog.srtp_suites().len(), 2);
        assert!(catalog.supports_srtp_suite(
            &SrtpSuite::new(SrtpCipher::AesCm128HmacSha1_80).with_unencrypted_srtcp()
        ));
        assert!(!catalog.supports_srtp_suite(&SrtpSuite::new(SrtpCipher::AesCm128HmacSha1_80)));
        assert!(catalog.supports_dtls());

        let defaults = CryptoSuiteCatalog::from_config(&MediaConfig::default());
        assert_eq!(defaults.srtp_suites(), default_srtp_suites().as_slice());
    }
}
