//! Media encryption negotiation
//!
//! Resolves the encryption mode and concrete suite for one session
//! establishment attempt from the local policy and what the peer advertised.
//! The side that sent the SDP offer dictates tie-breaks: its preference order
//! is walked first and the first entry the other side accepts wins.
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
use crate::encryption::{EncryptionPolicy, NegotiatedEncryption, PeerCapabilities};
use crate::error::RejectReason;
use crate::zrtp::select_algorithms;
use parley_types::MediaEncryption;
use tracing::{debug, info, warn};

/// Order in which alternative encrypted modes are tried
const FALLBACK_ORDER: [MediaEncryption; 3] = [
    MediaEncryption::Dtls,
    MediaEncryption::Zrtp,
    MediaEncryption::Srtp,
];

/// Which side sent the SDP offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offerer {
    Local,
    Remote,
}

/// Stateless negotiator
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaEncryptionNegotiator;

impl MediaEncryptionNegotiator {
    pub fn new() -> Self {
        Self
    }

    /// Answer a remote offer: the peer's order breaks ties
    pub fn negotiate(
        &self,
        local: &EncryptionPolicy,
        remote_offer: &PeerCapabilities,
    ) -> Result<NegotiatedEncryption, RejectReason> {
        self.resolve(local, remote_offer, Offerer::Remote)
    }

    /// Process the answer to a local offer: the local order breaks ties
    pub fn negotiate_answer(
        &self,
        local_offer: &EncryptionPolicy,
        remote_answer: &PeerCapabilities,
    ) -> Result<NegotiatedEncryption, RejectReason> {
        self.resolve(local_offer, remote_answer, Offerer::Local)
    }

    /// Core resolution, pure over its inputs
    pub fn resolve(
        &self,
        local: &EncryptionPolicy,
        peer: &PeerCapabilities,
        offerer: Offerer,
    ) -> Result<NegotiatedEncryption, RejectReason> {
        for mode in candidate_modes(local, peer) {
            if let Some(negotiated) = try_mode(mode, local, peer, offerer) {
                info!(
                    mode = %negotiated.mode,
                    suite = ?negotiated.selected_suite,
                    post_quantum = negotiated.is_post_quantum,
                    "Media encryption negotiated"
                );
                return Ok(negotiated);
            }
            debug!(mode = %mode, "No common parameters for encryption mode");
        }

        if local.mandatory || peer.mandatory {
            warn!(
                local_mode = %local.mode,
                local_mandatory = local.mandatory,
                peer_mandatory = peer.mandatory,
                "Media encryption mismatch"
            );
            return Err(RejectReason::EncryptionMismatch);
        }

        if local.mode.is_encrypted() && !peer.is_empty() {
            debug!(local_mode = %local.mode, "Peer encryption not usable, falling back to plain RTP");
        }
        Ok(NegotiatedEncryption::none())
    }
}

/// Encrypted modes to try, in order
fn candidate_modes(local: &EncryptionPolicy, peer: &PeerCapabilities) -> Vec<MediaEncryption> {
    let mut modes = Vec::new();
    if local.mode.is_encrypted() {
        modes.push(local.mode);
    }

    // A non-mandatory side goes along with whatever a mandatory peer requires
    let follow_peer = local.accept_any_encryption || (peer.mandatory && !local.mandatory);
    if follow_peer {
        for mode in FALLBACK_ORDER {
            if !modes.contains(&mode) && peer.offers(mode) {
                modes.push(mode);
            }
        }
    }
    modes
}

fn try_mode(
    mode: MediaEncryption,
    local: &EncryptionPolicy,
    peer: &PeerCapabilities,
    offerer: Offerer,
) -> Option<NegotiatedEncryption> {
    match mode {
        MediaEncryption::None => None,
        MediaEncryption::Srtp => {
            select_srtp_suite(local.allowed_srtp_suites(), &peer.srtp_suites, offerer)
                .map(NegotiatedEncryption::srtp)
        }
        MediaEncryption::Zrtp => {
            let remote = peer.zrtp.as_ref()?;
            let local_prefs = local.zrtp_preferences();
            let algorithms = match offerer {
                Offerer::Local => select_algorithms(local_prefs, remote),
                Offerer::Remote => select_algorithms(remote, local_prefs),
            }?;
            Some(NegotiatedEncryption::zrtp(algorithms))
        }
        MediaEncryption::Dtls => {
            (peer.dtls && local.catalog.supports_dtls()).then(NegotiatedEncryption::dtls)
        }
    }
}

/// First suite of the offerer's list that the other side accepts, exact match
fn select_srtp_suite(local: &[SrtpSuite], remote: &[SrtpSuite], offerer: Offerer) -> Option<SrtpSuite> {
    let (ordered, other) = match offerer {
        Offerer::Local => (local, remote),
        Offerer::Remote => (remote, local),
    };
    ordered.iter().copied().find(|suite| other.contains(suite))
}
