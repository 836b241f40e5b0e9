use std::sync::Arc;

use crate::audio::parameters::{Param, ReverbParameters};
use crate::presets::{self, PRESETS, Preset};
use crate::types::{FairingSync, MeterSnapshot};

/// Device names shown in the header
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    pub audio_in: String,
    pub audio_out: String,
    pub midi_in: Option<String>,
    pub sample_rate: f32,
}

/// UI application state
/// Tracks the selected parameter, preset and meter readings
pub struct App {
    /// Reference to shared parameters
    pub parameters: Arc<ReverbParameters>,
    pub devices: DeviceInfo,
    /// Index into `Param::ALL`
    pub selected: usize,
    /// Index into `PRESETS`
    pub preset_index: usize,
    /// Latest readings from the audio thread
    pub meters: MeterSnapshot,
    /// Loudest output since the last meter reset
    pub held_peak: [f32; 2],
    /// Whether to quit the application
    pub should_quit: bool,
}

impl App {
    pub fn new(parameters: Arc<ReverbParameters>, devices: DeviceInfo) -> Self {
        Self {
            parameters,
            devices,
            selected: 0,
            preset_index: 0,
            meters: MeterSnapshot::default(),
            held_peak: [0.0; 2],
            should_quit: false,
        }
    }

    /// Start on the preset named in the config, if any
    pub fn with_preset(mut self, name: Option<&str>) -> Self {
        if let Some((index, _)) = name.and_then(presets::find) {
            self.preset_index = index;
        }
        self
    }

    pub fn selected_param(&self) -> Param {
        Param::ALL[self.selected]
    }

    pub fn preset(&self) -> &'static Preset {
        presets::get(self.preset_index)
    }

    pub fn next_parameter(&mut self) {
        self.selected = (self.selected + 1) % Param::ALL.len();
    }

    pub fn prev_parameter(&mut self) {
        self.selected = (self.selected + Param::ALL.len() - 1) % Param::ALL.len();
    }

    pub fn increase_value(&mut self) {
        self.adjust(1.0);
    }

    pub fn decrease_value(&mut self) {
        self.adjust(-1.0);
    }

    fn adjust(&mut self, direction: f32) {
        let param = self.selected_param();
        let value = self.parameters.get(param) + direction * param.step();
        self.parameters.set(param, value);

        // Editing a preset parameter leaves the preset behind
        if presets::covers(param) {
            self.preset_index = 0;
        }
    }

    /// Cycle to the next preset and apply it
    pub fn next_preset(&mut self) {
        self.preset_index = (self.preset_index + 1) % PRESETS.len();
        let preset = self.preset();
        preset.apply(&self.parameters);
        log::info!("Preset: {}", preset.name);
    }

    /// Open or close the fairing gate
    pub fn toggle_fairing(&mut self) {
        let enabled = !self.parameters.fairing_enabled();
        self.parameters.set_fairing_enabled(enabled);
    }

    pub fn next_sync(&mut self) {
        let sync = self.parameters.fairing_sync().next();
        self.parameters.set_fairing_sync(sync);
    }

    pub fn fairing_sync(&self) -> FairingSync {
        self.parameters.fairing_sync()
    }

    pub fn update_meters(&mut self, snapshot: MeterSnapshot) {
        self.meters = snapshot;
        for (held, peak) in self.held_peak.iter_mut().zip(snapshot.output_peak) {
            *held = held.max(peak);
        }
    }

    pub fn reset_meters(&mut self) {
        self.meters = MeterSnapshot::default();
        self.held_peak = [0.0; 2];
    }

    /// Mark app for quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
