//! Parley Types
//!
//! Shared type definitions used across the Parley crates: SIP addresses,
//! media encryption modes, signaling reason codes and chat room
//! notification events.

pub mod address;
pub mod events;
pub mod media;
pub mod reason;
pub mod error;

pub use address::*;
pub use events::*;
pub use media::*;
pub use reason::*;
pub use error::*;
