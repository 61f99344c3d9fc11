//! Secure media negotiation for Parley
//!
//! This crate decides how the media of a session is protected and carries
//! the per-attempt media settings, including:
//! - SRTP crypto suites and ZRTP algorithm preferences
//! - Encryption mode and suite negotiation between two peers
//! - SDP security attributes (`a=crypto`, `a=zrtp-hash`, `a=fingerprint`)
//! - Media session parameters and network-aware degradation
//! - Shared audio device handles
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


pub mod error;
pub mod crypto_suite;
pub mod zrtp;
pub mod encryption;
pub mod negotiator;
pub mod sdp_security;
pub mod audio_device;
pub mod network_adaptation;
pub mod session_params;

// Re-export main types
pub use error::{NegotiationError, NegotiationResult, RejectReason};
pub use crypto_suite::{
    default_srtp_suites, format_suite_list, parse_suite_list, parse_suite_list_strict,
    CryptoSuiteCatalog, SrtpCipher, SrtpSuite,
};
pub use zrtp::{
    select_algorithms, ZrtpAlgorithms, ZrtpAuthTag, ZrtpCipher, ZrtpHash, ZrtpKeyAgreement,
    ZrtpPreferences, ZrtpSas,
};
pub use encryption::{EncryptionPolicy, NegotiatedEncryption, PeerCapabilities, SelectedSuite};
pub use negotiator::{MediaEncryptionNegotiator, Offerer};
pub use sdp_security::{crypto_attribute_lines, peer_capabilities, CryptoAttribute, MediaProto};
pub use audio_device::{AudioDevice, AudioDeviceCapability, AudioDeviceType};
pub use network_adaptation::{determine_profile, LowBandwidthProfile, NetworkProfile};
pub use session_params::{
    CallDirection, CustomSdpAttributes, MediaDirection, MediaSessionParams, PayloadType,
    RecordingState, SessionDefaults, StreamType, VideoDefinition,
};
