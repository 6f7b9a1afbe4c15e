//! RIFT-OX Common Library
//!
//! Shared types and configuration loading for the winch control workspace.
//!
//! # Module Structure
//!
//! - [`config`] - TOML configuration structs, loader and validation
//! - [`consts`] - Physical constants and per-signal pin polarity
//! - [`pins`] - Logical pin names and `{group, pin}` assignments
//! - [`winch`] - Motion states, commands, status and telemetry records
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use riftox_common::prelude::*;
//!
//! let state = MotionState::default();
//! assert_eq!(state, MotionState::Parked);
//! ```

pub mod config;
pub mod consts;
pub mod pins;
pub mod prelude;
pub mod winch;
