//! The `DioPort` driver trait.

use crate::error::DioError;
use crate::wire::PinCommand;

/// A request/response channel to a DIO controller.
///
/// Implementations perform exactly one exchange per call and return the
/// reply line with the echo removed. Access is serialized by
/// [`DioLink`](crate::link::DioLink); a port never sees two requests at once.
pub trait DioPort: Send {
    /// Driver identifier (e.g. "serial", "simulation").
    fn name(&self) -> &'static str;

    /// Perform one exchange.
    fn send(&mut self, command: &PinCommand) -> Result<String, DioError>;
}
