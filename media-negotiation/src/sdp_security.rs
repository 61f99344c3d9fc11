//! Security attributes of an SDP media section
//!
//! Extracts what a peer advertised (`a=crypto`, `a=zrtp-hash`,
//! `a=fingerprint` and the transport profile) into [`PeerCapabilities`], and
//! renders the `a=crypto` lines of a local offer.
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


use crate::crypto_suite::SrtpSuite;
use crate::encryption::PeerCapabilities;
use crate::error::{NegotiationError, NegotiationResult};
use crate::zrtp::ZrtpPreferences;
use parley_types::MediaEncryption;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Transport profile of an `m=` line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaProto {
    /// RTP/AVP
    RtpAvp,
    /// RTP/AVPF
    RtpAvpf,
    /// RTP/SAVP
    RtpSavp,
    /// RTP/SAVPF
    RtpSavpf,
    /// UDP/TLS/RTP/SAVP
    UdpTlsRtpSavp,
    /// UDP/TLS/RTP/SAVPF
    UdpTlsRtpSavpf,
}

impl MediaProto {
    /// Profile used for a given encryption and feedback mode
    pub fn for_encryption(encryption: MediaEncryption, avpf: bool) -> Self {
        match (encryption, avpf) {
            (MediaEncryption::Srtp, true) => MediaProto::RtpSavpf,
            (MediaEncryption::Srtp, false) => MediaProto::RtpSavp,
            (MediaEncryption::Dtls, true) => MediaProto::UdpTlsRtpSavpf,
            (MediaEncryption::Dtls, false) => MediaProto::UdpTlsRtpSavp,
            (_, true) => MediaProto::RtpAvpf,
            (_, false) => MediaProto::RtpAvp,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaProto::RtpAvp => "RTP/AVP",
            MediaProto::RtpAvpf => "RTP/AVPF",
            MediaProto::RtpSavp => "RTP/SAVP",
            MediaProto::RtpSavpf => "RTP/SAVPF",
            MediaProto::UdpTlsRtpSavp => "UDP/TLS/RTP/SAVP",
            MediaProto::UdpTlsRtpSavpf => "UDP/TLS/RTP/SAVPF",
        }
    }

    /// Secure profiles leave no room for plain RTP
    pub fn is_secure(&self) -> bool {
        !matches!(self, MediaProto::RtpAvp | MediaProto::RtpAvpf)
    }

    pub fn is_dtls(&self) -> bool {
        matches!(self, MediaProto::UdpTlsRtpSavp | MediaProto::UdpTlsRtpSavpf)
    }

    pub fn has_avpf(&self) -> bool {
        matches!(
            self,
            MediaProto::RtpAvpf | MediaProto::RtpSavpf | MediaProto::UdpTlsRtpSavpf
        )
    }
}

impl fmt::Display for MediaProto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaProto {
    type Err = NegotiationError;

    fn from_str(s: &str) -> NegotiationResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RTP/AVP" => Ok(MediaProto::RtpAvp),
            "RTP/AVPF" => Ok(MediaProto::RtpAvpf),
            "RTP/SAVP" => Ok(MediaProto::RtpSavp),
            "RTP/SAVPF" => Ok(MediaProto::RtpSavpf),
            "UDP/TLS/RTP/SAVP" => Ok(MediaProto::UdpTlsRtpSavp),
            "UDP/TLS/RTP/SAVPF" => Ok(MediaProto::UdpTlsRtpSavpf),
            other => Err(NegotiationError::InvalidSdp(format!("unknown media protocol {}", other))),
        }
    }
}

/// One `a=crypto` attribute (RFC 4568)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoAttribute {
    pub tag: u32,
    pub suite: SrtpSuite,
    /// Key parameters, e.g. `inline:<base64>|2^31`
    pub key_params: String,
}

impl CryptoAttribute {
    /// Parse the value part: `<tag> <suite> <key-params> [<session-params>]`
    pub fn parse(value: &str) -> NegotiationResult<Self> {
        let mut fields = value.split_whitespace();
        let tag = fields
            .next()
            .and_then(|t| t.parse::<u32>().ok())
            .ok_or_else(|| NegotiationError::InvalidSdp(format!("missing crypto tag in {}", value)))?;
        let suite_name = fields
            .next()
            .ok_or_else(|| NegotiationError::InvalidSdp(format!("missing crypto suite in {}", value)))?;
        let key_params = fields
            .next()
            .ok_or_else(|| NegotiationError::InvalidSdp(format!("missing key params in {}", value)))?;

        let mut suite = SrtpSuite::new(suite_name.parse()?);
        for session_param in fields {
            // Unknown session parameters are not ours to interpret
            suite.apply_modifier(session_param);
        }

        Ok(Self {
            tag,
            suite,
            key_params: key_params.to_string(),
        })
    }

    /// Full attribute line
    pub fn to_line(&self) -> String {
        format!("a=crypto:{} {}", self.tag, self.value())
    }

    fn value(&self) -> String {
        let mut value = format!("{} {}", self.suite.cipher, self.key_params);
        for modifier in self.suite.modifiers() {
            value.push(' ');
            value.push_str(modifier);
        }
        value
    }
}

/// Split `a=name:value` (or `name:value`) into its parts
fn split_attribute(line: &str) -> (&str, Option<&str>) {
    let line = line.trim();
    let line = line.strip_prefix("a=").unwrap_or(line);
    match line.split_once(':') {
        Some((name, value)) => (name.trim(), Some(value.trim())),
        None => (line, None),
    }
}

/// Build the peer capabilities of one media section
///
/// Invalid `a=crypto` lines are skipped: a peer offering one suite we cannot
/// read may still offer another we can.
pub fn peer_capabilities<'a>(
    protocol: &str,
    attributes: impl IntoIterator<Item = &'a str>,
) -> NegotiationResult<PeerCapabilities> {
    let proto: MediaProto = protocol.parse()?;
    let mut caps = PeerCapabilities::none();

    for line in attributes {
        match split_attribute(line) {
            ("crypto", Some(value)) => match CryptoAttribute::parse(value) {
                Ok(attribute) if !caps.srtp_suites.contains(&attribute.suite) => {
                    caps.srtp_suites.push(attribute.suite)
                }
                Ok(_) => {}
                Err(e) => warn!(attribute = line, error = %e, "Ignoring crypto attribute"),
            },
            ("zrtp-hash", _) => {
                // Algorithm lists travel in the ZRTP Hello; assume the mandatory set until then
                caps.zrtp.get_or_insert_with(ZrtpPreferences::default);
            }
            ("fingerprint", Some(_)) => caps.dtls = true,
            _ => {}
        }
    }

    caps.mandatory = proto.is_secure();
    Ok(caps)
}

/// Render `a=crypto` lines for the offered suites, tags starting at 1
pub fn crypto_attribute_lines(
    suites: &[SrtpSuite],
    mut key_params: impl FnMut(&SrtpSuite) -> String,
) -> Vec<String> {
    suites
        .iter()
        .zip(1u32..)
        .map(|(suite, tag)| {
            CryptoAttribute {
                tag,
                suite: *suite,
                key_params: key_params(suite),
            }
            .to_line()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto_suite::SrtpCipher;

    #[test]
    fn test_media_proto() {
        assert_eq!(
            MediaProto::for_encryption(MediaEncryption::Srtp, true).as_str(),
            "RTP/SAVPF"
        );
        assert_eq!(
            MediaProto::for_encryption(MediaEncryption::Dtls, false).as_str(),
            "UDP/TLS/RTP/SAVP"
        );
        assert_eq!(MediaProto::for_encryption(MediaEncryption::Zrtp, false), MediaProto::RtpAvp);
        assert!("udp/tls/rtp/savpf".parse::<MediaProto>().unwrap().is_dtls());
        assert!(!MediaProto::RtpAvpf.is_secure());
        assert!("RTP/XYZ".parse::<MediaProto>().is_err());
    }

    #[test]
    fn test_parse_crypto_attribute() {
        let attr = CryptoAttribute::parse(
            "2 AES_CM_128_HMAC_SHA1_32 inline:NzB4d1BINUAvLEw6UzF3WSJ+PSdFcGdUJShpX1Zj|2^31 UNENCRYPTED_SRTCP",
        )
        .unwrap();
        assert_eq!(attr.tag, 2);
        assert_eq!(
            attr.suite,
            SrtpSuite::new(SrtpCipher::AesCm128HmacSha1_32).with_unencrypted_srtcp()
        );
        assert!(attr.key_params.starts_with("inline:"));
        assert!(CryptoAttribute::parse("x AES_CM_128_HMAC_SHA1_32 inline:abc").is_err());
        assert!(CryptoAttribute::parse("1 AES_CM_128_HMAC_SHA1_32").is_err());
    }

    #[test]
    fn test_peer_capabilities_from_attributes() {
        let caps = peer_capabilities(
            "RTP/SAVP",
            [
                "a=rtpmap:0 PCMU/8000",
                "a=crypto:1 AEAD_AES_256_GCM inline:abc",
                "a=crypto:2 NOT_A_SUITE inline:abc",
                "a=crypto:3 AES_CM_128_HMAC_SHA1_80 inline:def UNENCRYPTED_SRTP",
                "a=zrtp-hash:1.10 fe30efd0",
            ],
        )
        .unwrap();
        assert_eq!(
            caps.srtp_suites,
            vec![
                SrtpSuite::new(SrtpCipher::AeadAes256Gcm),
                SrtpSuite::new(SrtpCipher::AesCm128HmacSha1_80).with_unencrypted_srtp(),
            ]
        );
        assert!(caps.zrtp.is_some());
        assert!(!caps.dtls);
        assert!(caps.mandatory);

        let dtls = peer_capabilities("UDP/TLS/RTP/SAVPF", ["fingerprint:sha-256 AB:CD"]).unwrap();
        assert!(dtls.dtls);

        let plain = peer_capabilities("RTP/AVP", Vec::<&str>::new()).unwrap();
        assert!(plain.is_empty());
        assert!(!plain.mandatory);
    }

    #[test]
    fn test_render_crypto_lines() {
        let suites = vec![
            SrtpSuite::new(SrtpCipher::AesCm128HmacSha1_80),
            SrtpSuite::new(SrtpCipher::Aes256CmHmacSha1_32).with_unencrypted_srtp(),
        ];
        let lines = crypto_attribute_lines(&suites, |suite| format!("inline:KEY{}", suite.cipher.master_key_len()));
        assert_eq!(
            lines,
            vec![
                "a=crypto:1 AES_CM_128_HMAC_SHA1_80 inline:KEY16".to_string(),
                "a=crypto:2 AES_256_CM_HMAC_SHA1_32 inline:KEY32 UNENCRYPTED_SRTP".to_string(),
            ]
        );

        // Rendered lines read back to the same suites
        let caps = peer_capabilities("RTP/AVP", lines.iter().map(String::as_str)).unwrap();
        assert_eq!(caps.srtp_suites, suites);
    }
}
