use anyhow::{Context, Result, anyhow};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::parameters::{Param, ReverbParameters};
use crate::presets;
use crate::types::FairingSync;

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReverbConfig {
    pub devices: DeviceConfig,

    /// Preset applied at startup, before any `reverb` overrides
    #[serde(default)]
    pub preset: Option<String>,

    #[serde(default)]
    pub reverb: ReverbSection,

    #[serde(default)]
    pub fairing: FairingConfig,

    /// Tempo used by the transition effect when no MIDI clock is running
    #[serde(default = "default_tempo")]
    pub tempo: f32,

    /// Frames per processing block
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    #[serde(default)]
    pub log: LogConfig,
}

impl ReverbConfig {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ReverbConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.preset {
            if presets::find(name).is_none() {
                return Err(anyhow!("Unknown preset: {}", name));
            }
        }

        self.reverb.validate().context("Invalid reverb section")?;
        self.fairing.validate().context("Invalid fairing section")?;

        let (min_tempo, max_tempo) = Param::Tempo.range();
        if !(min_tempo..=max_tempo).contains(&self.tempo) {
            return Err(anyhow!(
                "Tempo must be between {} and {} BPM",
                min_tempo,
                max_tempo
            ));
        }

        if !(16..=8192).contains(&self.block_size) {
            return Err(anyhow!("Block size must be between 16 and 8192 frames"));
        }

        self.log.level().context("Invalid log section")?;

        Ok(())
    }

    /// Write the configured startup state into the parameter store
    pub fn apply(&self, parameters: &ReverbParameters) -> Result<()> {
        if let Some(name) = &self.preset {
            let (_, preset) =
                presets::find(name).ok_or_else(|| anyhow!("Unknown preset: {}", name))?;
            preset.apply(parameters);
        }

        for (param, value) in self.reverb.overrides() {
            parameters.set(param, value);
        }

        parameters.set(Param::Tempo, self.tempo);
        parameters.set_fairing_sync(self.fairing.sync()?);
        Ok(())
    }
}

/// Device configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    pub audioin: String,
    pub audioout: String,
    /// MIDI input is optional; without it the gate is keyboard-only
    #[serde(default)]
    pub midiin: Option<String>,
}

/// Parameter overrides, in the units shown in the UI
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReverbSection {
    #[serde(default)]
    pub decay: Option<f32>,
    #[serde(default, rename = "predelay")]
    pub pre_delay: Option<f32>,
    #[serde(default, rename = "highcut")]
    pub high_cut: Option<f32>,
    #[serde(default, rename = "lowcut")]
    pub low_cut: Option<f32>,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub thrust: Option<f32>,
    #[serde(default)]
    pub chaos: Option<f32>,
    #[serde(default)]
    pub mix: Option<f32>,
    #[serde(default, rename = "input")]
    pub input_gain: Option<f32>,
    #[serde(default, rename = "output")]
    pub output_gain: Option<f32>,
}

impl ReverbSection {
    /// Every value that was set, paired with its parameter
    pub fn overrides(&self) -> Vec<(Param, f32)> {
        [
            (Param::Decay, self.decay),
            (Param::PreDelay, self.pre_delay),
            (Param::HighCut, self.high_cut),
            (Param::LowCut, self.low_cut),
            (Param::Width, self.width),
            (Param::Thrust, self.thrust),
            (Param::Chaos, self.chaos),
            (Param::Mix, self.mix),
            (Param::InputGain, self.input_gain),
            (Param::OutputGain, self.output_gain),
        ]
        .into_iter()
        .filter_map(|(param, value)| value.map(|v| (param, v)))
        .collect()
    }

    pub fn validate(&self) -> Result<()> {
        for (param, value) in self.overrides() {
            let (min, max) = param.range();
            if !(min..=max).contains(&value) {
                return Err(anyhow!(
                    "{} must be between {} and {} {}",
                    param.label(),
                    min,
                    max,
                    param.unit()
                ));
            }
        }
        Ok(())
    }
}

/// Transition effect settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FairingConfig {
    /// "1/4", "1/2", "1bar" or "2bars"
    #[serde(default = "default_sync")]
    pub sync: String,

    /// Note that opens the gate, like "c3" or "60"
    #[serde(default)]
    pub note: Option<String>,

    /// Controller that opens the gate at values >= 64
    #[serde(default)]
    pub cc: Option<u8>,

    #[serde(default = "default_midich")]
    pub midich: MidiChannelSpec,
}

impl Default for FairingConfig {
    fn default() -> Self {
        Self {
            sync: default_sync(),
            note: None,
            cc: None,
            midich: default_midich(),
        }
    }
}

impl FairingConfig {
    pub fn validate(&self) -> Result<()> {
        self.sync()?;
        self.trigger_note()?;

        if let Some(cc) = self.cc {
            if cc > 127 {
                return Err(anyhow!("Trigger CC must be between 0 and 127"));
            }
        }

        // Validate MIDI channel (1-16)
        match &self.midich {
            MidiChannelSpec::Channel(ch) => {
                if *ch < 1 || *ch > 16 {
                    return Err(anyhow!("MIDI channel must be between 1 and 16"));
                }
            }
            MidiChannelSpec::Omni(name) => {
                let name = name.to_lowercase();
                if name != "omni" && name != "all" {
                    return Err(anyhow!("MIDI channel must be 1-16, \"omni\" or \"all\""));
                }
            }
        }

        Ok(())
    }

    pub fn sync(&self) -> Result<FairingSync> {
        FairingSync::parse(&self.sync).ok_or_else(|| {
            anyhow!(
                "Invalid fairing sync '{}' (expected 1/4, 1/2, 1bar or 2bars)",
                self.sync
            )
        })
    }

    pub fn trigger_note(&self) -> Result<Option<u8>> {
        self.note.as_deref().map(parse_note).transpose()
    }

    /// 0-indexed MIDI channel, or `None` for omni
    pub fn midi_channel_filter(&self) -> Option<u8> {
        match &self.midich {
            MidiChannelSpec::Channel(ch) => Some(ch.saturating_sub(1)), // Convert 1-16 to 0-15
            MidiChannelSpec::Omni(_) => None,
        }
    }
}

/// Log file settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// off, error, warn, info, debug or trace
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

impl LogConfig {
    pub fn level(&self) -> Result<LevelFilter> {
        self.level
            .parse()
            .map_err(|_| anyhow!("Invalid log level: {}", self.level))
    }
}

/// MIDI channel specification - either a specific channel (1-16) or omni
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MidiChannelSpec {
    Channel(u8),
    Omni(String), // "omni" or "all"
}

/// Parse a note name to a MIDI note number
/// Examples: "c1" -> 24, "d1" -> 26, "gb1" -> 30; plain numbers pass through
pub fn parse_note(note: &str) -> Result<u8> {
    let note_str = note.trim().to_lowercase();

    if let Ok(number) = note_str.parse::<u8>() {
        if number > 127 {
            return Err(anyhow!("Note out of range: {}", number));
        }
        return Ok(number);
    }

    let mut chars = note_str.chars();
    let note_char = chars.next().ok_or_else(|| anyhow!("Empty note string"))?;

    let base_note = match note_char {
        'c' => 0,
        'd' => 2,
        'e' => 4,
        'f' => 5,
        'g' => 7,
        'a' => 9,
        'b' => 11,
        _ => return Err(anyhow!("Invalid note name: {}", note_char)),
    };

    // Check for sharp/flat
    let mut offset = 0;
    let mut octave_str = String::new();
    for ch in chars {
        match ch {
            '#' | 's' => offset = 1,
            'b' => offset = -1,
            '0'..='9' | '-' => octave_str.push(ch),
            _ => return Err(anyhow!("Invalid character in note: {}", ch)),
        }
    }

    let octave: i32 = octave_str
        .parse()
        .map_err(|_| anyhow!("Invalid octave: {}", octave_str))?;

    // C-1 = 0, C0 = 12, C1 = 24, etc.
    let midi_note = (octave + 1) * 12 + base_note + offset;

    if !(0..=127).contains(&midi_note) {
        return Err(anyhow!("Note out of range: {}", midi_note));
    }

    Ok(midi_note as u8)
}

// Default value functions for serde
fn default_tempo() -> f32 {
    120.0
}

fn default_block_size() -> usize {
    512
}

fn default_sync() -> String {
    "1bar".to_string()
}

fn default_midich() -> MidiChannelSpec {
    MidiChannelSpec::Omni("omni".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("cosmos-verb.log")
}
