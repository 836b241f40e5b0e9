//! Dense algorithmic stereo reverb with a tempo-synced transition effect.

pub mod audio;
pub mod config;
pub mod dsp;
pub mod midi;
pub mod presets;
pub mod reverb;
pub mod transition;
pub mod types;
pub mod ui;
