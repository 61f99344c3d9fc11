//! Per-attempt media session parameters
//!
//! A value object holding direction, bandwidth, codec and encryption settings
//! for one offer/answer round. It is built per call direction from the
//! configured defaults, cloned when a new round starts, and dropped with the
//! session. Cloning shares the reference-counted members (video definitions,
//! audio devices) and duplicates the owned ones (custom SDP attributes).
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


use crate::audio_device::AudioDevice;
use crate::encryption::NegotiatedEncryption;
use crate::error::{NegotiationError, NegotiationResult};
use crate::network_adaptation::{determine_profile, LowBandwidthProfile, NetworkProfile};
use crate::sdp_security::MediaProto;
use parley_config::{EdgeConfig, MediaConfig};
use parley_types::MediaEncryption;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Direction of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallDirection {
    Incoming,
    Outgoing,
}

/// Media stream direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaDirection {
    Inactive,
    SendOnly,
    RecvOnly,
    #[default]
    SendRecv,
}

impl MediaDirection {
    /// SDP direction attribute
    pub fn as_sdp(&self) -> &'static str {
        match self {
            MediaDirection::Inactive => "inactive",
            MediaDirection::SendOnly => "sendonly",
            MediaDirection::RecvOnly => "recvonly",
            MediaDirection::SendRecv => "sendrecv",
        }
    }

    pub fn from_sdp(attribute: &str) -> NegotiationResult<Self> {
        match attribute.trim().trim_start_matches("a=") {
            "inactive" => Ok(MediaDirection::Inactive),
            "sendonly" => Ok(MediaDirection::SendOnly),
            "recvonly" => Ok(MediaDirection::RecvOnly),
            "sendrecv" => Ok(MediaDirection::SendRecv),
            other => Err(NegotiationError::InvalidSdp(format!("unknown direction {}", other))),
        }
    }
}

/// Recording state advertised in SDP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    /// Not advertised
    #[default]
    None,
    Off,
    On,
}

/// Stream types carrying their own custom SDP attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    Audio,
    Video,
    Text,
}

/// Codec in use on a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadType {
    pub number: u8,
    pub mime_type: String,
    pub clock_rate: u32,
    pub channels: u8,
}

impl PayloadType {
    pub fn new(number: u8, mime_type: impl Into<String>, clock_rate: u32, channels: u8) -> Self {
        Self {
            number,
            mime_type: mime_type.into(),
            clock_rate,
            channels,
        }
    }
}

/// Video resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDefinition {
    pub width: u32,
    pub height: u32,
    pub name: String,
}

impl VideoDefinition {
    pub fn new(width: u32, height: u32, name: impl Into<String>) -> Self {
        Self {
            width,
            height,
            name: name.into(),
        }
    }
}

/// Ordered custom SDP attributes; lookups return the first match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomSdpAttributes {
    entries: Vec<(String, Option<String>)>,
}

impl CustomSdpAttributes {
    pub fn add(&mut self, name: impl Into<String>, value: Option<&str>) {
        self.entries.push((name.into(), value.map(str::to_string)));
    }

    /// `Some(None)` for a flag attribute
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_deref())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_deref()))
    }
}

/// Core-level defaults a session starts from
#[derive(Debug, Clone, Default)]
pub struct SessionDefaults {
    pub media: MediaConfig,
    /// Video setting of the conference the core is in, if any
    pub conference_video: Option<bool>,
    pub default_input_device: Option<AudioDevice>,
    pub default_output_device: Option<AudioDevice>,
}

/// Media session parameters
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSessionParams {
    audio_enabled: bool,
    audio_direction: MediaDirection,
    audio_multicast_enabled: bool,
    /// kbit/s, 0 for unlimited
    audio_bandwidth_limit: u32,
    used_audio_codec: Option<PayloadType>,

    video_enabled: bool,
    video_direction: MediaDirection,
    video_multicast_enabled: bool,
    used_video_codec: Option<PayloadType>,
    received_fps: f32,
    sent_fps: f32,
    received_video_definition: Option<Arc<VideoDefinition>>,
    sent_video_definition: Option<Arc<VideoDefinition>>,
    video_download_bandwidth: u32,

    fec_enabled: bool,
    used_fec_codec: Option<PayloadType>,

    realtime_text_enabled: bool,
    realtime_text_keepalive_interval_ms: u32,
    used_realtime_text_codec: Option<PayloadType>,

    avpf_enabled: bool,
    has_avpf_been_set: bool,
    avpf_rr_interval_ms: u32,
    implicit_rtcp_fb: bool,

    low_bandwidth_enabled: bool,
    up_bandwidth: u32,
    down_bandwidth: u32,
    up_ptime: u32,
    down_ptime: u32,

    record_file_path: Option<PathBuf>,
    record_aware: bool,
    recording_state: RecordingState,
    early_media_sending: bool,

    encryption: MediaEncryption,
    mandatory_encryption: bool,

    update_call_when_ice_completed: bool,
    update_call_when_ice_completed_with_dtls: bool,
    rtp_bundle: bool,
    mic_enabled: bool,

    custom_sdp_attributes: CustomSdpAttributes,
    custom_sdp_media_attributes: HashMap<StreamType, CustomSdpAttributes>,

    input_audio_device: Option<AudioDevice>,
    output_audio_device: Option<AudioDevice>,
}

impl MediaSessionParams {
    /// Blank parameters: audio only, send-receive, nothing negotiated
    pub fn new() -> Self {
        Self {
            audio_enabled: true,
            audio_direction: MediaDirection::SendRecv,
            audio_multicast_enabled: false,
            audio_bandwidth_limit: 0,
            used_audio_codec: None,
            video_enabled: false,
            video_direction: MediaDirection::SendRecv,
            video_multicast_enabled: false,
            used_video_codec: None,
            received_fps: 0.0,
            sent_fps: 0.0,
            received_video_definition: None,
            sent_video_definition: None,
            video_download_bandwidth: 0,
            fec_enabled: false,
            used_fec_codec: None,
            realtime_text_enabled: false,
            realtime_text_keepalive_interval_ms: 0,
            used_realtime_text_codec: None,
            avpf_enabled: false,
            has_avpf_been_set: false,
            avpf_rr_interval_ms: 0,
            implicit_rtcp_fb: false,
            low_bandwidth_enabled: false,
            up_bandwidth: 0,
            down_bandwidth: 0,
            up_ptime: 0,
            down_ptime: 0,
            record_file_path: None,
            record_aware: false,
            recording_state: RecordingState::None,
            early_media_sending: false,
            encryption: MediaEncryption::None,
            mandatory_encryption: false,
            update_call_when_ice_completed: false,
            update_call_when_ice_completed_with_dtls: false,
            rtp_bundle: false,
            mic_enabled: true,
            custom_sdp_attributes: CustomSdpAttributes::default(),
            custom_sdp_media_attributes: HashMap::new(),
            input_audio_device: None,
            output_audio_device: None,
        }
    }

    /// Parameters for a new call in the given direction
    pub fn new_default(defaults: &SessionDefaults, direction: CallDirection) -> Self {
        let media = &defaults.media;
        let mut params = Self::new();

        params.video_enabled = match defaults.conference_video {
            Some(video) => video,
            None => match direction {
                CallDirection::Outgoing => media.video_automatically_initiate,
                CallDirection::Incoming => media.video_automatically_accept,
            },
        };
        if params.video_enabled && !media.video_enabled {
            warn!("Video policy asks for video but video is disabled, starting without video");
            params.video_enabled = false;
        }

        params.realtime_text_enabled = media.realtime_text_enabled;
        params.realtime_text_keepalive_interval_ms = media.realtime_text_keepalive_interval_ms;
        params.encryption = media.encryption;
        params.mandatory_encryption = media.encryption_mandatory;
        params.avpf_enabled = media.avpf_enabled;
        params.has_avpf_been_set = false;
        params.implicit_rtcp_fb = media.implicit_rtcp_fb;
        params.avpf_rr_interval_ms = u32::from(media.avpf_rr_interval_secs) * 1000;
        params.early_media_sending = media.real_early_media;
        params.audio_multicast_enabled = media.audio_multicast;
        params.video_multicast_enabled = media.video_multicast;
        params.update_call_when_ice_completed = media.update_call_when_ice_completed;
        params.update_call_when_ice_completed_with_dtls = media.update_call_when_ice_completed_with_dtls;
        params.rtp_bundle = media.rtp_bundle;
        params.enable_record_aware(media.record_aware);
        params.mic_enabled = media.mic_enabled;
        params.set_input_audio_device(defaults.default_input_device.clone());
        params.set_output_audio_device(defaults.default_output_device.clone());

        debug!(
            direction = ?direction,
            video = params.video_enabled,
            encryption = %params.encryption,
            "Media session parameters initialized"
        );
        params
    }

    /// Degrade to the low bandwidth profile on a slow network.
    ///
    /// Never re-enables anything: once low bandwidth is on it stays on for
    /// this attempt.
    pub fn adapt_to_network(&mut self, ping_time_ms: i32, edge: &EdgeConfig) {
        if determine_profile(ping_time_ms, edge) == NetworkProfile::Edge {
            info!(ping_time_ms, threshold_ms = edge.edge_ping_time_ms, "Slow network, enabling low bandwidth mode");
            self.low_bandwidth_enabled = true;
        }

        if self.low_bandwidth_enabled {
            let profile = LowBandwidthProfile::from(edge);
            self.up_bandwidth = profile.bandwidth_kbps;
            self.down_bandwidth = profile.bandwidth_kbps;
            self.up_ptime = profile.ptime_ms;
            self.down_ptime = profile.ptime_ms;
            self.video_enabled = false;
        }
    }

    /// Store the outcome of encryption negotiation
    pub fn commit_encryption(&mut self, negotiated: &NegotiatedEncryption) {
        self.encryption = negotiated.mode;
    }

    /// Transport profile for the `m=` lines
    pub fn media_proto(&self) -> MediaProto {
        MediaProto::for_encryption(self.encryption, self.avpf_enabled)
    }

    pub fn rtp_profile(&self) -> &'static str {
        self.media_proto().as_str()
    }

    /// Whether to re-INVITE once ICE completes; DTLS has its own setting
    pub fn update_call_when_ice_completed(&self) -> bool {
        if self.encryption == MediaEncryption::Dtls {
            debug!(
                reinvite = self.update_call_when_ice_completed_with_dtls,
                "DTLS in use, ICE completion re-INVITE setting"
            );
            return self.update_call_when_ice_completed_with_dtls;
        }
        self.update_call_when_ice_completed
    }

    pub fn set_update_call_when_ice_completed(&mut self, value: bool) {
        self.update_call_when_ice_completed = value;
    }

    pub fn set_update_call_when_ice_completed_with_dtls(&mut self, value: bool) {
        self.update_call_when_ice_completed_with_dtls = value;
    }

    // Audio

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn enable_audio(&mut self, value: bool) {
        self.audio_enabled = value;
    }

    pub fn audio_direction(&self) -> MediaDirection {
        self.audio_direction
    }

    pub fn set_audio_direction(&mut self, direction: MediaDirection) {
        self.audio_direction = direction;
    }

    pub fn audio_multicast_enabled(&self) -> bool {
        self.audio_multicast_enabled
    }

    pub fn enable_audio_multicast(&mut self, value: bool) {
        self.audio_multicast_enabled = value;
    }

    pub fn audio_bandwidth_limit(&self) -> u32 {
        self.audio_bandwidth_limit
    }

    pub fn set_audio_bandwidth_limit(&mut self, kbps: u32) {
        self.audio_bandwidth_limit = kbps;
    }

    pub fn used_audio_codec(&self) -> Option<&PayloadType> {
        self.used_audio_codec.as_ref()
    }

    pub fn set_used_audio_codec(&mut self, codec: Option<PayloadType>) {
        self.used_audio_codec = codec;
    }

    // Video

    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    pub fn enable_video(&mut self, value: bool) {
        self.video_enabled = value;
    }

    pub fn video_direction(&self) -> MediaDirection {
        self.video_direction
    }

    pub fn set_video_direction(&mut self, direction: MediaDirection) {
        self.video_direction = direction;
    }

    pub fn video_multicast_enabled(&self) -> bool {
        self.video_multicast_enabled
    }

    pub fn enable_video_multicast(&mut self, value: bool) {
        self.video_multicast_enabled = value;
    }

    pub fn used_video_codec(&self) -> Option<&PayloadType> {
        self.used_video_codec.as_ref()
    }

    pub fn set_used_video_codec(&mut self, codec: Option<PayloadType>) {
        self.used_video_codec = codec;
    }

    pub fn received_fps(&self) -> f32 {
        self.received_fps
    }

    pub fn set_received_fps(&mut self, fps: f32) {
        self.received_fps = fps;
    }

    pub fn sent_fps(&self) -> f32 {
        self.sent_fps
    }

    pub fn set_sent_fps(&mut self, fps: f32) {
        self.sent_fps = fps;
    }

    pub fn received_video_definition(&self) -> Option<&Arc<VideoDefinition>> {
        self.received_video_definition.as_ref()
    }

    pub fn set_received_video_definition(&mut self, definition: Option<Arc<VideoDefinition>>) {
        self.received_video_definition = definition;
    }

    pub fn sent_video_definition(&self) -> Option<&Arc<VideoDefinition>> {
        self.sent_video_definition.as_ref()
    }

    pub fn set_sent_video_definition(&mut self, definition: Option<Arc<VideoDefinition>>) {
        self.sent_video_definition = definition;
    }

    pub fn video_download_bandwidth(&self) -> u32 {
        self.video_download_bandwidth
    }

    pub fn set_video_download_bandwidth(&mut self, kbps: u32) {
        self.video_download_bandwidth = kbps;
    }

    // FEC and real-time text

    pub fn fec_enabled(&self) -> bool {
        self.fec_enabled
    }

    pub fn enable_fec(&mut self, value: bool) {
        self.fec_enabled = value;
    }

    pub fn used_fec_codec(&self) -> Option<&PayloadType> {
        self.used_fec_codec.as_ref()
    }

    pub fn set_used_fec_codec(&mut self, codec: Option<PayloadType>) {
        self.used_fec_codec = codec;
    }

    pub fn realtime_text_enabled(&self) -> bool {
        self.realtime_text_enabled
    }

    pub fn enable_realtime_text(&mut self, value: bool) {
        self.realtime_text_enabled = value;
    }

    pub fn realtime_text_keepalive_interval_ms(&self) -> u32 {
        self.realtime_text_keepalive_interval_ms
    }

    pub fn set_realtime_text_keepalive_interval_ms(&mut self, interval: u32) {
        self.realtime_text_keepalive_interval_ms = interval;
    }

    pub fn used_realtime_text_codec(&self) -> Option<&PayloadType> {
        self.used_realtime_text_codec.as_ref()
    }

    pub fn set_used_realtime_text_codec(&mut self, codec: Option<PayloadType>) {
        self.used_realtime_text_codec = codec;
    }

    // RTCP feedback

    pub fn avpf_enabled(&self) -> bool {
        self.avpf_enabled
    }

    /// Explicitly set AVPF; remembered so defaults do not override it
    pub fn enable_avpf(&mut self, value: bool) {
        self.has_avpf_been_set = true;
        self.avpf_enabled = value;
    }

    pub fn has_avpf_been_set(&self) -> bool {
        self.has_avpf_been_set
    }

    pub fn avpf_rr_interval_ms(&self) -> u32 {
        self.avpf_rr_interval_ms
    }

    pub fn set_avpf_rr_interval_ms(&mut self, interval: u32) {
        self.avpf_rr_interval_ms = interval;
    }

    pub fn implicit_rtcp_fb_enabled(&self) -> bool {
        self.implicit_rtcp_fb
    }

    pub fn enable_implicit_rtcp_fb(&mut self, value: bool) {
        self.implicit_rtcp_fb = value;
    }

    // Bandwidth

    pub fn low_bandwidth_enabled(&self) -> bool {
        self.low_bandwidth_enabled
    }

    pub fn enable_low_bandwidth(&mut self, value: bool) {
        self.low_bandwidth_enabled = value;
    }

    pub fn up_bandwidth(&self) -> u32 {
        self.up_bandwidth
    }

    pub fn set_up_bandwidth(&mut self, kbps: u32) {
        self.up_bandwidth = kbps;
    }

    pub fn down_bandwidth(&self) -> u32 {
        self.down_bandwidth
    }

    pub fn set_down_bandwidth(&mut self, kbps: u32) {
        self.down_bandwidth = kbps;
    }

    pub fn up_ptime(&self) -> u32 {
        self.up_ptime
    }

    pub fn set_up_ptime(&mut self, ms: u32) {
        self.up_ptime = ms;
    }

    pub fn down_ptime(&self) -> u32 {
        self.down_ptime
    }

    pub fn set_down_ptime(&mut self, ms: u32) {
        self.down_ptime = ms;
    }

    // Recording

    pub fn record_file_path(&self) -> Option<&PathBuf> {
        self.record_file_path.as_ref()
    }

    pub fn set_record_file_path(&mut self, path: Option<PathBuf>) {
        self.record_file_path = path;
    }

    /// Advertise recording state; forces it from `None` to `Off` so it is offered
    pub fn enable_record_aware(&mut self, value: bool) {
        self.record_aware = value;
        if self.record_aware && self.recording_state == RecordingState::None {
            self.recording_state = RecordingState::Off;
        }
    }

    pub fn record_aware_enabled(&self) -> bool {
        self.record_aware
    }

    pub fn recording_state(&self) -> RecordingState {
        self.recording_state
    }

    pub fn set_recording_state(&mut self, state: RecordingState) {
        self.recording_state = state;
    }

    pub fn is_recording(&self) -> bool {
        self.recording_state == RecordingState::On
    }

    pub fn early_media_sending_enabled(&self) -> bool {
        self.early_media_sending
    }

    pub fn enable_early_media_sending(&mut self, value: bool) {
        self.early_media_sending = value;
    }

    // Encryption

    pub fn media_encryption(&self) -> MediaEncryption {
        self.encryption
    }

    pub fn set_media_encryption(&mut self, encryption: MediaEncryption) {
        self.encryption = encryption;
    }

    pub fn mandatory_media_encryption_enabled(&self) -> bool {
        self.mandatory_encryption
    }

    pub fn enable_mandatory_media_encryption(&mut self, value: bool) {
        self.mandatory_encryption = value;
    }

    // Transport

    pub fn rtp_bundle_enabled(&self) -> bool {
        self.rtp_bundle
    }

    pub fn enable_rtp_bundle(&mut self, value: bool) {
        self.rtp_bundle = value;
    }

    pub fn mic_enabled(&self) -> bool {
        self.mic_enabled
    }

    pub fn enable_mic(&mut self, value: bool) {
        self.mic_enabled = value;
    }

    // Custom SDP attributes

    pub fn add_custom_sdp_attribute(&mut self, name: impl Into<String>, value: Option<&str>) {
        self.custom_sdp_attributes.add(name, value);
    }

    pub fn custom_sdp_attribute(&self, name: &str) -> Option<Option<&str>> {
        self.custom_sdp_attributes.get(name)
    }

    pub fn custom_sdp_attributes(&self) -> &CustomSdpAttributes {
        &self.custom_sdp_attributes
    }

    pub fn clear_custom_sdp_attributes(&mut self) {
        self.custom_sdp_attributes.clear();
    }

    pub fn add_custom_sdp_media_attribute(
        &mut self,
        stream: StreamType,
        name: impl Into<String>,
        value: Option<&str>,
    ) {
        self.custom_sdp_media_attributes
            .entry(stream)
            .or_default()
            .add(name, value);
    }

    pub fn custom_sdp_media_attribute(&self, stream: StreamType, name: &str) -> Option<Option<&str>> {
        self.custom_sdp_media_attributes
            .get(&stream)
            .and_then(|attributes| attributes.get(name))
    }

    pub fn custom_sdp_media_attributes(&self, stream: StreamType) -> Option<&CustomSdpAttributes> {
        self.custom_sdp_media_attributes.get(&stream)
    }

    pub fn clear_custom_sdp_media_attributes(&mut self, stream: StreamType) {
        self.custom_sdp_media_attributes.remove(&stream);
    }

    // Audio devices

    pub fn input_audio_device(&self) -> Option<&AudioDevice> {
        self.input_audio_device.as_ref()
    }

    /// Acquire the new device, releasing the previous one
    pub fn set_input_audio_device(&mut self, device: Option<AudioDevice>) {
        self.input_audio_device = device;
    }

    pub fn output_audio_device(&self) -> Option<&AudioDevice> {
        self.output_audio_device.as_ref()
    }

    /// Acquire the new device, releasing the previous one
    pub fn set_output_audio_device(&mut self, device: Option<AudioDevice>) {
        self.output_audio_device = device;
    }
}

impl Default for MediaSessionParams {
    fn default() -> Self {
        Self::new()
    }
}
