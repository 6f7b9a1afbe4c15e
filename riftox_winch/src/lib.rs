//! # RIFT-OX Winch Control Unit
//!
//! Drives an unattended profiling winch through its cast cycle: unpark,
//! stage, downcast, turn around at the bottom, pause at sampling depths on
//! the way up, and home against the surface latch.
//!
//! ## Threads
//!
//! 1. **wincmd**: owns the [`Winch`](winch::Winch); publishes status, then applies one command per tick
//! 2. **winmon**: [`SafetyMonitor`](monitor::SafetyMonitor); depth/altitude limits and the pause-depth schedule
//! 3. **pausemon**: [`PauseCoordinator`](pause::PauseCoordinator); resumes the cast after each pause
//!
//! They share nothing but bounded queues and the DIO link.

pub mod bus;
pub mod dispatcher;
pub mod monitor;
pub mod parking;
pub mod pause;
pub mod payout_log;
pub mod position;
pub mod runtime;
pub mod schedule;
pub mod state;
pub mod winch;
