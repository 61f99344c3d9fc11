//! Integration Tests for Secure Media Negotiation
//!
//! Drives the negotiator the way a call would: policy from configuration,
//! peer capabilities from the remote SDP, outcome committed to the media
//! session parameters.

use media_negotiation::{
    parse_suite_list, peer_capabilities, CallDirection, CryptoSuiteCatalog, EncryptionPolicy,
    MediaEncryptionNegotiator, MediaSessionParams, NegotiatedEncryption, PeerCapabilities,
    RecordingState, RejectReason, SessionDefaults, SrtpCipher, SrtpSuite, ZrtpCipher, ZrtpHash,
    ZrtpKeyAgreement, ZrtpPreferences,
};
use parley_config::{AppConfig, EdgeConfig, MediaConfig};
use parley_types::{MediaEncryption, Reason};

fn srtp_policy(suites: &str, mandatory: bool) -> EncryptionPolicy {
    EncryptionPolicy::new(MediaEncryption::Srtp, mandatory).with_catalog(CryptoSuiteCatalog::new(
        parse_suite_list(suites),
        ZrtpPreferences::default(),
    ))
}

fn zrtp_policy(preferences: ZrtpPreferences) -> EncryptionPolicy {
    EncryptionPolicy::new(MediaEncryption::Zrtp, false)
        .with_catalog(CryptoSuiteCatalog::new(Vec::new(), preferences))
}

#[test]
fn test_mandatory_srtp_against_plain_offer_is_rejected() {
    let negotiator = MediaEncryptionNegotiator::new();
    let local = srtp_policy("AES_CM_128_HMAC_SHA1_80", true);

    let rejected = negotiator.negotiate(&local, &PeerCapabilities::none());
    assert_eq!(rejected, Err(RejectReason::EncryptionMismatch));
    assert_eq!(RejectReason::EncryptionMismatch.reason(), Reason::NotAcceptable);
    assert_eq!(Reason::NotAcceptable.sip_status(), Some(488));
}

#[test]
fn test_caller_retries_with_zrtp_after_mismatch() {
    let negotiator = MediaEncryptionNegotiator::new();
    let peer = PeerCapabilities::zrtp(ZrtpPreferences::default());

    let first = negotiator.negotiate(&srtp_policy("AES_CM_128_HMAC_SHA1_80", true), &peer);
    assert_eq!(first, Err(RejectReason::EncryptionMismatch));

    // New attempt with different parameters, chosen by the caller
    let retry = negotiator
        .negotiate(&zrtp_policy(ZrtpPreferences::default()), &peer)
        .unwrap();
    assert_eq!(retry.mode, MediaEncryption::Zrtp);
    assert!(retry.zrtp_algorithms().is_some());
}

#[test]
fn test_single_common_suite_is_selected() {
    let negotiator = MediaEncryptionNegotiator::new();
    let local = srtp_policy("AES_CM_128_HMAC_SHA1_80", false);
    let offer = PeerCapabilities::srtp(parse_suite_list(
        "AES_256_CM_HMAC_SHA1_80, AEAD_AES_128_GCM, AES_CM_128_HMAC_SHA1_80",
    ));

    let result = negotiator.negotiate(&local, &offer).unwrap();
    assert_eq!(result, NegotiatedEncryption::srtp(SrtpSuite::new(SrtpCipher::AesCm128HmacSha1_80)));
}

#[test]
fn test_overlapping_lists_pick_from_intersection_in_offerer_order() {
    let negotiator = MediaEncryptionNegotiator::new();
    let local_list = "AES_CM_128_HMAC_SHA1_80, AES_256_CM_HMAC_SHA1_80, AEAD_AES_256_GCM";
    let remote_list = "AEAD_AES_128_GCM, AEAD_AES_256_GCM, AES_256_CM_HMAC_SHA1_80";
    let local = srtp_policy(local_list, false);
    let remote = PeerCapabilities::srtp(parse_suite_list(remote_list));

    // Remote offered: its first common suite wins
    let answer = negotiator.negotiate(&local, &remote).unwrap();
    assert_eq!(answer.srtp_suite(), Some(SrtpSuite::new(SrtpCipher::AeadAes256Gcm)));

    // Local offered: ours does
    let offer = negotiator.negotiate_answer(&local, &remote).unwrap();
    assert_eq!(offer.srtp_suite(), Some(SrtpSuite::new(SrtpCipher::Aes256CmHmacSha1_80)));

    let local_suites = parse_suite_list(local_list);
    let remote_suites = parse_suite_list(remote_list);
    for suite in [answer.srtp_suite(), offer.srtp_suite()].into_iter().flatten() {
        assert!(local_suites.contains(&suite) && remote_suites.contains(&suite));
    }
}

#[test]
fn test_unencrypted_modifiers_must_match_exactly() {
    let negotiator = MediaEncryptionNegotiator::new();
    let local = srtp_policy("AES_CM_128_HMAC_SHA1_80 UNENCRYPTED_SRTCP", true);

    let plain_suite = PeerCapabilities::srtp(parse_suite_list("AES_CM_128_HMAC_SHA1_80"));
    assert_eq!(
        negotiator.negotiate(&local, &plain_suite),
        Err(RejectReason::EncryptionMismatch)
    );

    let same_modifiers = PeerCapabilities::srtp(parse_suite_list("AES_CM_128_HMAC_SHA1_80 UNENCRYPTED_SRTCP"));
    let result = negotiator.negotiate(&local, &same_modifiers).unwrap();
    assert_eq!(
        result.srtp_suite(),
        Some(SrtpSuite::new(SrtpCipher::AesCm128HmacSha1_80).with_unencrypted_srtcp())
    );
}

#[test]
fn test_zrtp_disjoint_ciphers_stay_within_offered_set() {
    let negotiator = MediaEncryptionNegotiator::new();
    let marie = ZrtpPreferences::new(vec![ZrtpCipher::Aes1], Vec::new(), Vec::new(), Vec::new(), Vec::new());
    let pauline = ZrtpPreferences::new(vec![ZrtpCipher::Aes3], Vec::new(), Vec::new(), Vec::new(), Vec::new());

    for (local, remote) in [(&marie, &pauline), (&pauline, &marie)] {
        let result = negotiator
            .negotiate(&zrtp_policy(local.clone()), &PeerCapabilities::zrtp(remote.clone()))
            .unwrap();
        let cipher = result.zrtp_algorithms().unwrap().cipher;
        assert!(
            matches!(cipher, ZrtpCipher::Aes1 | ZrtpCipher::Aes3),
            "unexpected cipher {:?}",
            cipher
        );
    }
}

#[test]
fn test_post_quantum_key_agreement_lifts_hash_and_cipher() {
    let negotiator = MediaEncryptionNegotiator::new();
    let local = ZrtpPreferences::with_key_agreements(vec![ZrtpKeyAgreement::K255Kyb512]);
    let remote = ZrtpPreferences::with_key_agreements(vec![ZrtpKeyAgreement::K255Kyb512, ZrtpKeyAgreement::Dh3k]);

    let result = negotiator
        .negotiate(&zrtp_policy(local), &PeerCapabilities::zrtp(remote))
        .unwrap();
    let algorithms = result.zrtp_algorithms().unwrap();
    assert_eq!(algorithms.key_agreement, ZrtpKeyAgreement::K255Kyb512);
    assert_eq!(algorithms.hash, ZrtpHash::S512);
    assert_eq!(algorithms.cipher, ZrtpCipher::Aes3);
    assert!(result.is_post_quantum);
}

#[test]
fn test_plain_endpoint_follows_mandatory_sdp_offer() {
    let negotiator = MediaEncryptionNegotiator::new();
    let offer = peer_capabilities(
        "RTP/SAVP",
        [
            "a=rtpmap:0 PCMU/8000",
            "a=crypto:1 AES_CM_128_HMAC_SHA1_80 inline:WVNfX19zZW1jdGwgKCkgewkyMjA7fQp9CnVubGVz|2^20",
        ],
    )
    .unwrap();
    assert!(offer.mandatory);

    let local = EncryptionPolicy::new(MediaEncryption::None, false);
    let result = negotiator.negotiate(&local, &offer).unwrap();
    assert_eq!(result.mode, MediaEncryption::Srtp);

    let strict = EncryptionPolicy::new(MediaEncryption::Zrtp, true);
    assert_eq!(negotiator.negotiate(&strict, &offer), Err(RejectReason::EncryptionMismatch));
}

#[test]
fn test_accept_any_encryption_from_config() {
    let config = AppConfig::from_toml_str(
        r#"
        [media]
        encryption = "srtp"
        encryption_mandatory = true
        accept_any_encryption = true
        "#,
    )
    .unwrap();
    let local = EncryptionPolicy::from_config(&config.media);
    assert!(local.accept_any_encryption);

    let result = MediaEncryptionNegotiator::new()
        .negotiate(&local, &PeerCapabilities::zrtp(ZrtpPreferences::default()))
        .unwrap();
    assert_eq!(result.mode, MediaEncryption::Zrtp);
}

#[test]
fn test_negotiated_encryption_committed_to_session() {
    let defaults = SessionDefaults {
        media: MediaConfig {
            encryption: MediaEncryption::Srtp,
            avpf_enabled: true,
            ..MediaConfig::default()
        },
        ..SessionDefaults::default()
    };
    let mut params = MediaSessionParams::new_default(&defaults, CallDirection::Outgoing);
    let local = EncryptionPolicy::from_config(&defaults.media);
    let offer = local.advertised();

    let result = MediaEncryptionNegotiator::new().negotiate(&local, &offer).unwrap();
    params.commit_encryption(&result);
    assert_eq!(params.media_encryption(), MediaEncryption::Srtp);
    assert_eq!(params.rtp_profile(), "RTP/SAVPF");

    let copy = params.clone();
    assert_eq!(copy.clone(), params);
}

#[test]
fn test_session_defaults_and_edge_adaptation() {
    let defaults = SessionDefaults {
        media: MediaConfig {
            record_aware: true,
            video_enabled: true,
            video_automatically_accept: true,
            ..MediaConfig::default()
        },
        ..SessionDefaults::default()
    };
    let mut params = MediaSessionParams::new_default(&defaults, CallDirection::Incoming);
    assert_eq!(params.recording_state(), RecordingState::Off);
    assert!(params.video_enabled());

    let edge = EdgeConfig {
        activate_edge_workarounds: true,
        ..EdgeConfig::default()
    };
    params.adapt_to_network(edge.edge_ping_time_ms as i32 + 1, &edge);
    assert!(params.low_bandwidth_enabled());
    assert!(!params.video_enabled());
    assert_eq!(params.up_bandwidth(), edge.edge_bandwidth_kbps);
    assert_eq!(params.down_ptime(), edge.edge_ptime_ms);
}
