pub mod events;
pub mod meters;
pub mod sync;

pub use events::ControlEvent;
pub use meters::MeterSnapshot;
pub use sync::FairingSync;
