//! Shared audio device handles
//!
//! Handles are reference counted: cloning acquires, dropping releases, and
//! the last release frees the device.
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


use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// What the device can do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioDeviceCapability {
    Record,
    Play,
    RecordAndPlay,
}

/// Kind of device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioDeviceType {
    Microphone,
    Earpiece,
    Speaker,
    Bluetooth,
    Headset,
    Unknown,
}

#[derive(Debug)]
struct AudioDeviceInner {
    id: Uuid,
    name: String,
    driver: String,
    device_type: AudioDeviceType,
    capability: AudioDeviceCapability,
}

impl Drop for AudioDeviceInner {
    fn drop(&mut self) {
        debug!(device_id = %self.id, name = %self.name, "Audio device released");
    }
}

/// Reference-counted audio device handle
#[derive(Debug, Clone)]
pub struct AudioDevice {
    inner: Arc<AudioDeviceInner>,
}

impl AudioDevice {
    pub fn new(
        name: impl Into<String>,
        driver: impl Into<String>,
        device_type: AudioDeviceType,
        capability: AudioDeviceCapability,
    ) -> Self {
        Self {
            inner: Arc::new(AudioDeviceInner {
                id: Uuid::new_v4(),
                name: name.into(),
                driver: driver.into(),
                device_type,
                capability,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn driver(&self) -> &str {
        &self.inner.driver
    }

    pub fn device_type(&self) -> AudioDeviceType {
        self.inner.device_type
    }

    pub fn capability(&self) -> AudioDeviceCapability {
        self.inner.capability
    }

    pub fn can_record(&self) -> bool {
        matches!(
            self.inner.capability,
            AudioDeviceCapability::Record | AudioDeviceCapability::RecordAndPlay
        )
    }

    pub fn can_play(&self) -> bool {
        matches!(
            self.inner.capability,
            AudioDeviceCapability::Play | AudioDeviceCapability::RecordAndPlay
        )
    }

    /// Number of live handles on this device
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Both handles designate the same device
    pub fn same_device(&self, other: &AudioDevice) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for AudioDevice {
    fn eq(&self, other: &Self) -> bool {
        self.same_device(other)
    }
}

impl Eq for AudioDevice {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_counting() {
        let mic = AudioDevice::new("Built-in mic", "ALSA", AudioDeviceType::Microphone, AudioDeviceCapability::Record);
        assert_eq!(mic.ref_count(), 1);
        {
            let acquired = mic.clone();
            assert_eq!(mic.ref_count(), 2);
            assert_eq!(acquired, mic);
        }
        assert_eq!(mic.ref_count(), 1);
        assert!(mic.can_record());
        assert!(!mic.can_play());
    }

    #[test]
    fn test_distinct_devices_differ() {
        let a = AudioDevice::new("Speaker", "ALSA", AudioDeviceType::Speaker, AudioDeviceCapability::Play);
        let b = AudioDevice::new("Speaker", "ALSA", AudioDeviceType::Speaker, AudioDeviceCapability::Play);
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }
}
