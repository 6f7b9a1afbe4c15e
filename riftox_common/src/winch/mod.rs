//! Winch domain types shared between the control loops and their clients.
//!
//! - [`state`] - Motion states and direction
//! - [`command`] - Inbound command names and payloads
//! - [`status`] - Outbound status snapshot
//! - [`telemetry`] - CTD depth/altitude samples and directives
//! - [`bus`] - Line-oriented message envelope

pub mod bus;
pub mod command;
pub mod state;
pub mod status;
pub mod telemetry;
