pub mod clock;
pub mod handler;
pub mod message;

pub use handler::{GateMapping, MidiHandler};
