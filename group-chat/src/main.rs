//! Group Chat Server
//!
//! Hosts server group chat rooms. Every room event is logged as a JSON line
//! so downstream tooling can follow room lifecycles.
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


use anyhow::Result;
use group_chat::{
    ChatRoomContext, ChatRoomListener, ChatRoomRegistry, ChatRoomService, TracingSignalingChannel,
    DEFAULT_CHANNEL_CAPACITY,
};
use parley_config::AppConfig;
use parley_logging::{init_with_format, LogFormat};
use parley_types::Event;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Logs every room event
struct EventLogger;

impl ChatRoomListener for EventLogger {
    fn on_event(&self, event: &Event) {
        match event.to_json() {
            Ok(json) => info!(event_type = ?event.event_type(), event = %json, "Chat room event"),
            Err(e) => warn!(error = %e, "Failed to serialize chat room event"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    let format = config.log_format().parse().unwrap_or(LogFormat::Json);
    init_with_format("group-chat-server", config.log_level(), format);

    info!(
        conference_factory = %config.chat.conference_factory_uri,
        "Starting Group Chat Server"
    );

    let ctx = ChatRoomContext::new(Arc::new(TracingSignalingChannel), config.chat.clone());
    ctx.notifier.register(Arc::new(EventLogger));

    let registry = ChatRoomRegistry::new(ctx)
        .map_err(|e| anyhow::anyhow!("Failed to create chat room registry: {}", e))?;

    // The SIP transport holds the sender; keep it alive until shutdown
    let (service, events) = ChatRoomService::new(registry, DEFAULT_CHANNEL_CAPACITY);

    info!("Starting event processing");
    let service_handle = tokio::spawn(async move {
        match service.run().await {
            Ok(registry) => info!(rooms = registry.room_count(), "Chat room service finished"),
            Err(e) => error!(error = %e, "Chat room service error"),
        }
    });

    // Wait for shutdown signal
    info!("Group Chat Server running. Press Ctrl+C to stop.");
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(err) => {
            error!(error = %err, "Unable to listen for shutdown signal");
        }
    }

    // Closing the channel lets the service drain what is queued and return
    drop(events);
    if let Err(e) = service_handle.await {
        error!(error = %e, "Chat room service task failed");
    }
    info!("Group Chat Server stopped");

    Ok(())
}
