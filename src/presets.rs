//! Named reverb characters, each a full set of the tone-shaping parameters.

use crate::audio::parameters::{Param, ReverbParameters};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    /// Seconds
    pub decay: f32,
    /// Percent
    pub thrust: f32,
    /// Percent
    pub chaos: f32,
    /// Hz
    pub high_cut: f32,
    /// Hz
    pub low_cut: f32,
    /// Percent
    pub width: f32,
    /// Milliseconds
    pub pre_delay: f32,
}

/// Index 0 is "Manual", which carries the defaults but is never applied
pub static PRESETS: [Preset; 12] = [
    Preset {
        name: "Manual",
        description: "Custom settings, adjust parameters freely",
        decay: 5.0,
        thrust: 50.0,
        chaos: 30.0,
        high_cut: 12000.0,
        low_cut: 80.0,
        width: 100.0,
        pre_delay: 20.0,
    },
    Preset {
        name: "Pillars of Creation",
        description: "Massive, slow-building reverb with deep low-end presence",
        decay: 15.0,
        thrust: 75.0,
        chaos: 25.0,
        high_cut: 8000.0,
        low_cut: 40.0,
        width: 140.0,
        pre_delay: 80.0,
    },
    Preset {
        name: "Crab Nebula",
        description: "Energetic, chaotic modulation with bright harmonics",
        decay: 8.0,
        thrust: 60.0,
        chaos: 85.0,
        high_cut: 16000.0,
        low_cut: 100.0,
        width: 160.0,
        pre_delay: 15.0,
    },
    Preset {
        name: "Orion Nebula",
        description: "Warm, enveloping decay with gentle modulation",
        decay: 12.0,
        thrust: 80.0,
        chaos: 40.0,
        high_cut: 10000.0,
        low_cut: 60.0,
        width: 180.0,
        pre_delay: 40.0,
    },
    Preset {
        name: "Helix Nebula",
        description: "Circular, focused reverb with precise stereo imaging",
        decay: 6.0,
        thrust: 55.0,
        chaos: 20.0,
        high_cut: 14000.0,
        low_cut: 120.0,
        width: 90.0,
        pre_delay: 25.0,
    },
    Preset {
        name: "Horsehead Nebula",
        description: "Deep, mysterious decay with subdued highs",
        decay: 18.0,
        thrust: 70.0,
        chaos: 35.0,
        high_cut: 6000.0,
        low_cut: 50.0,
        width: 120.0,
        pre_delay: 100.0,
    },
    Preset {
        name: "Ring Nebula",
        description: "Balanced, symmetrical reverb with medium decay",
        decay: 7.0,
        thrust: 65.0,
        chaos: 30.0,
        high_cut: 11000.0,
        low_cut: 90.0,
        width: 100.0,
        pre_delay: 30.0,
    },
    Preset {
        name: "Carina Nebula",
        description: "Expansive, dramatic reverb with intense dynamics",
        decay: 20.0,
        thrust: 90.0,
        chaos: 55.0,
        high_cut: 9000.0,
        low_cut: 45.0,
        width: 200.0,
        pre_delay: 60.0,
    },
    Preset {
        name: "Lagoon Nebula",
        description: "Smooth, liquid decay with subtle movement",
        decay: 10.0,
        thrust: 75.0,
        chaos: 45.0,
        high_cut: 13000.0,
        low_cut: 70.0,
        width: 150.0,
        pre_delay: 35.0,
    },
    Preset {
        name: "Veil Nebula",
        description: "Ethereal, wispy decay with high diffusion",
        decay: 14.0,
        thrust: 95.0,
        chaos: 50.0,
        high_cut: 15000.0,
        low_cut: 100.0,
        width: 170.0,
        pre_delay: 50.0,
    },
    Preset {
        name: "Cat's Eye Nebula",
        description: "Intricate, detailed reverb with a focused center",
        decay: 5.0,
        thrust: 45.0,
        chaos: 60.0,
        high_cut: 18000.0,
        low_cut: 150.0,
        width: 80.0,
        pre_delay: 10.0,
    },
    Preset {
        name: "Tarantula Nebula",
        description: "Extremely bright, aggressive reverb with maximum spread",
        decay: 25.0,
        thrust: 85.0,
        chaos: 75.0,
        high_cut: 7000.0,
        low_cut: 35.0,
        width: 200.0,
        pre_delay: 120.0,
    },
];

impl Preset {
    pub fn is_manual(&self) -> bool {
        self.name == PRESETS[0].name
    }

    pub fn values(&self) -> [(Param, f32); 7] {
        [
            (Param::Decay, self.decay),
            (Param::Thrust, self.thrust),
            (Param::Chaos, self.chaos),
            (Param::HighCut, self.high_cut),
            (Param::LowCut, self.low_cut),
            (Param::Width, self.width),
            (Param::PreDelay, self.pre_delay),
        ]
    }

    /// Write this preset into the store. "Manual" leaves everything as is.
    pub fn apply(&self, parameters: &ReverbParameters) {
        if self.is_manual() {
            return;
        }
        for (param, value) in self.values() {
            parameters.set(param, value);
        }
    }
}

/// Whether presets set `param`
pub fn covers(param: Param) -> bool {
    PRESETS[0].values().iter().any(|(p, _)| *p == param)
}

/// Look up a preset by case-insensitive name
pub fn find(name: &str) -> Option<(usize, &'static Preset)> {
    let wanted = name.trim().to_lowercase();
    PRESETS
        .iter()
        .enumerate()
        .find(|(_, preset)| preset.name.to_lowercase() == wanted)
}

/// Preset at `index`, clamped to the table
pub fn get(index: usize) -> &'static Preset {
    &PRESETS[index.min(PRESETS.len() - 1)]
}
