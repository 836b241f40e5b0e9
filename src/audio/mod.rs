pub mod engine;
pub mod host;
pub mod parameters;

pub use engine::ReverbEngine;
pub use host::{AudioStreams, DeviceKind, HostError};
pub use parameters::{Param, ReverbParameters};
