//! RIFT-OX DIO controller access.
//!
//! The winch is driven through a digital I/O controller reached over a serial
//! line. Every request is a blocking write followed by a framed reply, and
//! only one request may be outstanding at a time.
//!
//! # Module Structure
//!
//! - [`error`] - `DioError`
//! - [`wire`] - `PinCommand` encoding and reply extraction
//! - [`port`] - `DioPort` trait implemented by every driver
//! - [`link`] - `DioLink`, the lock around the single physical link
//! - [`commander`] - `DioCommander`, composite actuator sequences
//! - [`drivers`] - Serial, simulated and scripted ports
//!
//! # Architecture
//!
//! ```text
//!   DioCommander ──► DioLink (ReentrantMutex) ──► Box<dyn DioPort>
//!                                                   ├─ SerialDio
//!                                                   ├─ SimulatedDio
//!                                                   └─ ScriptedPort
//! ```

pub mod commander;
pub mod drivers;
pub mod error;
pub mod link;
pub mod port;
pub mod wire;

pub use crate::commander::DioCommander;
pub use crate::error::DioError;
pub use crate::link::DioLink;
pub use crate::port::DioPort;
pub use crate::wire::PinCommand;
