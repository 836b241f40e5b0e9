//! The reverb itself: diffusion ("thrust"), modulation ("chaos") and the
//! comb-bank core that ties them together.

pub mod core;
pub mod diffusion;
pub mod modulation;

pub use self::core::ReverbCore;
pub use diffusion::DiffusionNetwork;
pub use modulation::ModulationEngine;
