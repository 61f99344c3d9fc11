//! ZRTP algorithm preferences and selection
//!
//! Each category (cipher, hash, auth tag, key agreement, SAS) is an ordered
//! preference list. Configuration tokens use the `MS_ZRTP_<CATEGORY>_<NAME>`
//! form; the bare name is accepted too.
//!
//! Both peers always carry the mandatory algorithms (AES1, S256, HS32, HS80,
//! DH3K, B32), so two ZRTP endpoints share at least one candidate per
//! category. Post-quantum and 448-bit key agreements lift the hash and
//! cipher to the strongest ones both sides hold.
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
use parley_config::MediaConfig;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

macro_rules! zrtp_algorithm {
    (
        $(#[$meta:meta])*
        $name:ident, $category:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $token:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every algorithm of the category, in declaration order
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Category part of the configuration token
            pub const CATEGORY: &'static str = $category;

            /// Short name, e.g. `AES3`
            pub fn token(&self) -> &'static str {
                match self {
                    $( $name::$variant => $token ),+
                }
            }

            /// Full configuration name, e.g. `MS_ZRTP_CIPHER_AES3`
            pub fn config_name(&self) -> String {
                format!("MS_ZRTP_{}_{}", Self::CATEGORY, self.token())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.token())
            }
        }

        impl FromStr for $name {
            type Err = NegotiationError;

            fn from_str(s: &str) -> NegotiationResult<Self> {
                let s = s.trim();
                let prefix = concat!("MS_ZRTP_", $category, "_");
                let bare = match s.get(..prefix.len()) {
                    Some(head) if s.len() > prefix.len() && head.eq_ignore_ascii_case(prefix) => {
                        &s[prefix.len()..]
                    }
                    _ => s,
                };
                Self::ALL
                    .iter()
                    .copied()
                    .find(|algo| algo.token().eq_ignore_ascii_case(bare))
                    .ok_or_else(|| NegotiationError::UnknownAlgorithm {
                        category: $category,
                        token: s.to_string(),
                    })
            }
        }
    };
}

zrtp_algorithm! {
    /// Symmetric cipher
    ZrtpCipher, "CIPHER" {
        /// AES-128
        Aes1 => "AES1",
        /// AES-192
        Aes2 => "AES2",
        /// AES-256
        Aes3 => "AES3",
        Twofish1 => "2FS1",
        Twofish2 => "2FS2",
        Twofish3 => "2FS3",
    }
}

zrtp_algorithm! {
    /// Hash function
    ZrtpHash, "HASH" {
        S256 => "S256",
        S384 => "S384",
        S512 => "S512",
        /// Skein-256
        N256 => "N256",
        /// Skein-384
        N384 => "N384",
    }
}

zrtp_algorithm! {
    /// SRTP authentication tag
    ZrtpAuthTag, "AUTHTAG" {
        Hs32 => "HS32",
        Hs80 => "HS80",
        Sk32 => "SK32",
        Sk64 => "SK64",
        Gcm => "GCM",
    }
}

zrtp_algorithm! {
    /// Key agreement, classic, post-quantum KEM, or hybrid
    ZrtpKeyAgreement, "KEY_AGREEMENT" {
        Dh2k => "DH2K",
        Dh3k => "DH3K",
        Ec25 => "EC25",
        Ec38 => "EC38",
        Ec52 => "EC52",
        X255 => "X255",
        X448 => "X448",
        K255 => "K255",
        K448 => "K448",
        Kyb1 => "KYB1",
        Kyb2 => "KYB2",
        Kyb3 => "KYB3",
        Hqc1 => "HQC1",
        Hqc2 => "HQC2",
        Hqc3 => "HQC3",
        K255Kyb512 => "K255_KYB512",
        K255Hqc128 => "K255_HQC128",
        K448Kyb1024 => "K448_KYB1024",
        K448Hqc256 => "K448_HQC256",
        K255Kyb512Hqc128 => "K255_KYB512_HQC128",
        K448Kyb1024Hqc256 => "K448_KYB1024_HQC256",
    }
}

zrtp_algorithm! {
    /// Short authentication string rendering
    ZrtpSas, "SAS" {
        /// Base32, four characters
        B32 => "B32",
        /// PGP word list
        B256 => "B256",
    }
}

impl ZrtpKeyAgreement {
    /// Post-quantum KEM, alone or hybridised with an elliptic curve
    pub fn is_post_quantum(&self) -> bool {
        matches!(
            self,
            ZrtpKeyAgreement::Kyb1
                | ZrtpKeyAgreement::Kyb2
                | ZrtpKeyAgreement::Kyb3
                | ZrtpKeyAgreement::Hqc1
                | ZrtpKeyAgreement::Hqc2
                | ZrtpKeyAgreement::Hqc3
                | ZrtpKeyAgreement::K255Kyb512
                | ZrtpKeyAgreement::K255Hqc128
                | ZrtpKeyAgreement::K448Kyb1024
                | ZrtpKeyAgreement::K448Hqc256
                | ZrtpKeyAgreement::K255Kyb512Hqc128
                | ZrtpKeyAgreement::K448Kyb1024Hqc256
        )
    }

    /// Key agreements whose strength calls for the strongest shared hash and cipher
    pub fn requires_strong_primitives(&self) -> bool {
        self.is_post_quantum()
            || matches!(
                self,
                ZrtpKeyAgreement::X448 | ZrtpKeyAgreement::K448 | ZrtpKeyAgreement::Ec52
            )
    }
}

/// Strongest first
const HASH_STRENGTH: [ZrtpHash; 3] = [ZrtpHash::S512, ZrtpHash::S384, ZrtpHash::S256];
const CIPHER_STRENGTH: [ZrtpCipher; 3] = [ZrtpCipher::Aes3, ZrtpCipher::Aes2, ZrtpCipher::Aes1];

/// Per-category ordered ZRTP algorithm preferences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZrtpPreferences {
    ciphers: Vec<ZrtpCipher>,
    hashes: Vec<ZrtpHash>,
    auth_tags: Vec<ZrtpAuthTag>,
    key_agreements: Vec<ZrtpKeyAgreement>,
    sas_types: Vec<ZrtpSas>,
}

impl ZrtpPreferences {
    /// Build preferences; empty categories take their defaults and the
    /// mandatory algorithms are appended where missing.
    pub fn new(
        ciphers: Vec<ZrtpCipher>,
        hashes: Vec<ZrtpHash>,
        auth_tags: Vec<ZrtpAuthTag>,
        key_agreements: Vec<ZrtpKeyAgreement>,
        sas_types: Vec<ZrtpSas>,
    ) -> Self {
        let mut prefs = Self {
            ciphers: or_default(ciphers, &[ZrtpCipher::Aes1]),
            hashes: or_default(hashes, &[ZrtpHash::S256]),
            auth_tags: or_default(auth_tags, &[ZrtpAuthTag::Hs80, ZrtpAuthTag::Hs32]),
            key_agreements: or_default(key_agreements, &[ZrtpKeyAgreement::Dh3k]),
            sas_types: or_default(sas_types, &[ZrtpSas::B32]),
        };
        prefs.add_mandatory();
        prefs
    }

    /// Read the `zrtp_*_suites` entries of the media configuration.
    ///
    /// Unknown tokens are skipped with a warning.
    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(
            parse_algorithms(config.zrtp_cipher_suites.as_deref()),
            parse_algorithms(config.zrtp_hash_suites.as_deref()),
            parse_algorithms(config.zrtp_auth_suites.as_deref()),
            parse_algorithms(config.zrtp_key_agreement_suites.as_deref()),
            parse_algorithms(config.zrtp_sas_suites.as_deref()),
        )
    }

    /// Same as [`ZrtpPreferences::new`] with only the key agreements chosen
    pub fn with_key_agreements(key_agreements: Vec<ZrtpKeyAgreement>) -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new(), key_agreements, Vec::new())
    }

    fn add_mandatory(&mut self) {
        push_missing(&mut self.ciphers, ZrtpCipher::Aes1);
        push_missing(&mut self.hashes, ZrtpHash::S256);
        push_missing(&mut self.auth_tags, ZrtpAuthTag::Hs32);
        push_missing(&mut self.auth_tags, ZrtpAuthTag::Hs80);
        push_missing(&mut self.key_agreements, ZrtpKeyAgreement::Dh3k);
        push_missing(&mut self.sas_types, ZrtpSas::B32);

        // Post-quantum key agreements are never paired with weaker primitives
        if self.key_agreements.iter().any(ZrtpKeyAgreement::is_post_quantum) {
            push_missing(&mut self.hashes, ZrtpHash::S512);
            push_missing(&mut self.ciphers, ZrtpCipher::Aes3);
        }
    }

    pub fn ciphers(&self) -> &[ZrtpCipher] {
        &self.ciphers
    }

    pub fn hashes(&self) -> &[ZrtpHash] {
        &self.hashes
    }

    pub fn auth_tags(&self) -> &[ZrtpAuthTag] {
        &self.auth_tags
    }

    pub fn key_agreements(&self) -> &[ZrtpKeyAgreement] {
        &self.key_agreements
    }

    pub fn sas_types(&self) -> &[ZrtpSas] {
        &self.sas_types
    }
}

impl Default for ZrtpPreferences {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new())
    }
}

/// Algorithms agreed for one ZRTP session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZrtpAlgorithms {
    pub cipher: ZrtpCipher,
    pub hash: ZrtpHash,
    pub auth_tag: ZrtpAuthTag,
    pub key_agreement: ZrtpKeyAgreement,
    pub sas: ZrtpSas,
}

impl ZrtpAlgorithms {
    pub fn is_post_quantum(&self) -> bool {
        self.key_agreement.is_post_quantum()
    }
}

/// Select one algorithm per category.
///
/// The offerer's order wins; for key agreements that require it, hash and
/// cipher are lifted to the strongest pair both sides hold.
pub fn select_algorithms(offerer: &ZrtpPreferences, answerer: &ZrtpPreferences) -> Option<ZrtpAlgorithms> {
    let key_agreement = first_common(&offerer.key_agreements, &answerer.key_agreements)?;
    let mut cipher = first_common(&offerer.ciphers, &answerer.ciphers)?;
    let mut hash = first_common(&offerer.hashes, &answerer.hashes)?;
    let auth_tag = first_common(&offerer.auth_tags, &answerer.auth_tags)?;
    let sas = first_common(&offerer.sas_types, &answerer.sas_types)?;

    if key_agreement.requires_strong_primitives() {
        if let Some(strong) = strongest_common(&HASH_STRENGTH, &offerer.hashes, &answerer.hashes) {
            hash = strong;
        }
        if let Some(strong) = strongest_common(&CIPHER_STRENGTH, &offerer.ciphers, &answerer.ciphers) {
            cipher = strong;
        }
        debug!(
            key_agreement = %key_agreement,
            hash = %hash,
            cipher = %cipher,
            "ZRTP primitives lifted for key agreement"
        );
    }

    Some(ZrtpAlgorithms {
        cipher,
        hash,
        auth_tag,
        key_agreement,
        sas,
    })
}

fn first_common<T: Copy + PartialEq>(offerer: &[T], answerer: &[T]) -> Option<T> {
    offerer.iter().copied().find(|algo| answerer.contains(algo))
}

fn strongest_common<T: Copy + PartialEq>(ranking: &[T], a: &[T], b: &[T]) -> Option<T> {
    ranking
        .iter()
        .copied()
        .find(|algo| a.contains(algo) && b.contains(algo))
}

fn or_default<T: Copy + PartialEq>(mut list: Vec<T>, defaults: &[T]) -> Vec<T> {
    let mut seen = Vec::with_capacity(list.len());
    list.retain(|algo| {
        if seen.contains(algo) {
            false
        } else {
            seen.push(*algo);
            true
        }
    });

    if list.is_empty() {
        defaults.to_vec()
    } else {
        list
    }
}

fn push_missing<T: PartialEq>(list: &mut Vec<T>, algo: T) {
    if !list.contains(&algo) {
        list.push(algo);
    }
}

/// Parse a comma separated token list, skipping unknown tokens
pub fn parse_algorithms<T>(list: Option<&str>) -> Vec<T>
where
    T: FromStr<Err = NegotiationError>,
{
    let Some(list) = list else {
        return Vec::new();
    };

    list.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match token.parse::<T>() {
            Ok(algo) => Some(algo),
            Err(e) => {
                warn!(token, error = %e, "Unsupported ZRTP algorithm ignored");
                None
            }
        })
        .collect()
}
