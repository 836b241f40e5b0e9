/// Length of one transition cycle, as a musical division
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FairingSync {
    Quarter,
    Half,
    #[default]
    Bar,
    TwoBars,
}

impl FairingSync {
    pub const ALL: [FairingSync; 4] = [
        FairingSync::Quarter,
        FairingSync::Half,
        FairingSync::Bar,
        FairingSync::TwoBars,
    ];

    /// Cycle length in beats
    pub fn beats(self) -> f32 {
        match self {
            FairingSync::Quarter => 1.0,
            FairingSync::Half => 2.0,
            FairingSync::Bar => 4.0,
            FairingSync::TwoBars => 8.0,
        }
    }

    /// Convert to u8 for atomic storage
    pub fn to_u8(self) -> u8 {
        match self {
            FairingSync::Quarter => 0,
            FairingSync::Half => 1,
            FairingSync::Bar => 2,
            FairingSync::TwoBars => 3,
        }
    }

    /// Convert from u8 from atomic storage
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => FairingSync::Quarter,
            1 => FairingSync::Half,
            3 => FairingSync::TwoBars,
            _ => FairingSync::Bar, // Default to one bar for invalid values
        }
    }

    /// Parse the config spelling ("1/4", "1/2", "1bar", "2bars")
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace(' ', "").as_str() {
            "1/4" => Some(FairingSync::Quarter),
            "1/2" => Some(FairingSync::Half),
            "1bar" => Some(FairingSync::Bar),
            "2bars" => Some(FairingSync::TwoBars),
            _ => None,
        }
    }

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            FairingSync::Quarter => "1/4",
            FairingSync::Half => "1/2",
            FairingSync::Bar => "1 Bar",
            FairingSync::TwoBars => "2 Bars",
        }
    }

    /// Next division, wrapping around
    pub fn next(self) -> Self {
        Self::from_u8((self.to_u8() + 1) % Self::ALL.len() as u8)
    }
}
