//! Configuration management for Parley services
//!
//! Values come from `PARLEY_*` environment variables (optionally seeded
//! from a `.env` file) or from TOML text. Nested keys use a double
//! underscore: `PARLEY_MEDIA__ENCRYPTION=srtp`,
//! `PARLEY_MEDIA__EDGE__EDGE_PING_TIME_MS=700`.

use config::{Config, Environment, File, FileFormat};
use parley_types::MediaEncryption;
use serde::Deserialize;

/// Degraded-network ("edge") profile applied when the round trip is slow
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub activate_edge_workarounds: bool,
    /// Round trip above which the edge profile kicks in
    pub edge_ping_time_ms: u32,
    pub edge_bandwidth_kbps: u32,
    pub edge_ptime_ms: u32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            activate_edge_workarounds: false,
            edge_ping_time_ms: 500,
            edge_bandwidth_kbps: 20,
            edge_ptime_ms: 100,
        }
    }
}

/// Media session defaults and encryption policy
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub encryption: MediaEncryption,
    pub encryption_mandatory: bool,
    /// Accept any encryption the peer offers instead of only `encryption`
    pub accept_any_encryption: bool,
    /// Comma separated SRTP suites, e.g. `AES_CM_128_HMAC_SHA1_80 UNENCRYPTED_SRTCP, AES_256_CM_HMAC_SHA1_80`
    pub srtp_crypto_suites: Option<String>,
    pub zrtp_cipher_suites: Option<String>,
    pub zrtp_hash_suites: Option<String>,
    pub zrtp_auth_suites: Option<String>,
    pub zrtp_key_agreement_suites: Option<String>,
    pub zrtp_sas_suites: Option<String>,
    pub video_enabled: bool,
    pub video_automatically_initiate: bool,
    pub video_automatically_accept: bool,
    pub realtime_text_enabled: bool,
    pub realtime_text_keepalive_interval_ms: u32,
    pub avpf_enabled: bool,
    pub avpf_rr_interval_secs: u16,
    pub implicit_rtcp_fb: bool,
    pub real_early_media: bool,
    pub audio_multicast: bool,
    pub video_multicast: bool,
    pub update_call_when_ice_completed: bool,
    pub update_call_when_ice_completed_with_dtls: bool,
    pub rtp_bundle: bool,
    pub record_aware: bool,
    pub mic_enabled: bool,
    pub edge: EdgeConfig,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            encryption: MediaEncryption::None,
            encryption_mandatory: false,
            accept_any_encryption: false,
            srtp_crypto_suites: None,
            zrtp_cipher_suites: None,
            zrtp_hash_suites: None,
            zrtp_auth_suites: None,
            zrtp_key_agreement_suites: None,
            zrtp_sas_suites: None,
            video_enabled: true,
            video_automatically_initiate: false,
            video_automatically_accept: false,
            realtime_text_enabled: false,
            realtime_text_keepalive_interval_ms: 25_000,
            avpf_enabled: false,
            avpf_rr_interval_secs: 5,
            implicit_rtcp_fb: true,
            real_early_media: false,
            audio_multicast: false,
            video_multicast: false,
            update_call_when_ice_completed: true,
            update_call_when_ice_completed_with_dtls: false,
            rtp_bundle: false,
            record_aware: false,
            mic_enabled: true,
            edge: EdgeConfig::default(),
        }
    }
}

/// Server group chat configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// URI the creation INVITEs are addressed to
    pub conference_factory_uri: String,
    /// Attempts at generating an unused conference address before giving up
    pub address_max_attempts: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            conference_factory_uri: "sip:conference-factory@localhost".to_string(),
            address_max_attempts: 100,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub media: MediaConfig,
    pub chat: ChatConfig,
    pub log_level: Option<String>,
    /// `json` or `console`
    pub log_format: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        Config::builder()
            .add_source(
                Environment::with_prefix("PARLEY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load configuration from TOML text, environment variables ignored
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Get log level, defaulting to "info"
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Get log format, defaulting to "json"
    pub fn log_format(&self) -> &str {
        self.log_format.as_deref().unwrap_or("json")
    }
}
