//! Network-aware media degradation
//!
//! Classifies the path from the STUN round trip measured before a call and
//! yields the reduced media profile used on slow ("edge") networks.
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


use parley_config::EdgeConfig;
use tracing::info;

/// Network profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkProfile {
    /// Use configured media settings
    Normal,
    /// Probably a 2G network: low bandwidth profile
    Edge,
}

/// Media limits applied under the edge profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowBandwidthProfile {
    /// Up and down bandwidth (kbit/s)
    pub bandwidth_kbps: u32,
    /// Up and down packet time (ms)
    pub ptime_ms: u32,
}

impl From<&EdgeConfig> for LowBandwidthProfile {
    fn from(config: &EdgeConfig) -> Self {
        Self {
            bandwidth_kbps: config.edge_bandwidth_kbps,
            ptime_ms: config.edge_ptime_ms,
        }
    }
}

/// Determine network profile from a ping time.
///
/// Non-positive pings mean "not measured" and never degrade.
pub fn determine_profile(ping_time_ms: i32, config: &EdgeConfig) -> NetworkProfile {
    if ping_time_ms <= 0 || !config.activate_edge_workarounds {
        return NetworkProfile::Normal;
    }

    info!(ping_time_ms, "STUN server ping time measured");
    if ping_time_ms as u32 > config.edge_ping_time_ms {
        NetworkProfile::Edge
    } else {
        NetworkProfile::Normal
    }
}
