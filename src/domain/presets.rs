//! Named parameter presets.

use crate::domain::threshold::DipRule;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_AMOUNT: f64 = 10_000.0;
pub const DEFAULT_DAY_OF_MONTH: u32 = 1;
pub const DEFAULT_ANNUAL_INCREASE_PCT: f64 = 10.0;
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// Tiered rules used when a threshold strategy configures none.
pub fn default_dip_rules() -> Vec<DipRule> {
    vec![
        DipRule::new(5.0, 5_000.0),
        DipRule::new(10.0, 10_000.0),
        DipRule::new(20.0, 20_000.0),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodicPreset {
    Conservative,
    Moderate,
    Aggressive,
    Premium,
}

impl PeriodicPreset {
    pub const ALL: [PeriodicPreset; 4] = [
        PeriodicPreset::Conservative,
        PeriodicPreset::Moderate,
        PeriodicPreset::Aggressive,
        PeriodicPreset::Premium,
    ];

    pub fn amount(self) -> f64 {
        match self {
            PeriodicPreset::Conservative => 5_000.0,
            PeriodicPreset::Moderate => 10_000.0,
            PeriodicPreset::Aggressive => 25_000.0,
            PeriodicPreset::Premium => 50_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepUpPreset {
    Conservative,
    Moderate,
    Aggressive,
    Premium,
}

impl StepUpPreset {
    pub const ALL: [StepUpPreset; 4] = [
        StepUpPreset::Conservative,
        StepUpPreset::Moderate,
        StepUpPreset::Aggressive,
        StepUpPreset::Premium,
    ];

    /// `(initial_amount, annual_increase_pct)`
    pub fn parameters(self) -> (f64, f64) {
        match self {
            StepUpPreset::Conservative => (5_000.0, 5.0),
            StepUpPreset::Moderate => (10_000.0, 10.0),
            StepUpPreset::Aggressive => (15_000.0, 15.0),
            StepUpPreset::Premium => (25_000.0, 20.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DipPreset {
    Conservative,
    Moderate,
    Aggressive,
    Opportunistic,
}

impl DipPreset {
    pub const ALL: [DipPreset; 4] = [
        DipPreset::Conservative,
        DipPreset::Moderate,
        DipPreset::Aggressive,
        DipPreset::Opportunistic,
    ];

    pub fn rules(self) -> Vec<DipRule> {
        let tiers: &[(f64, f64)] = match self {
            DipPreset::Conservative => &[(5.0, 5_000.0), (10.0, 10_000.0)],
            DipPreset::Moderate => &[(5.0, 5_000.0), (10.0, 10_000.0), (15.0, 15_000.0)],
            DipPreset::Aggressive => &[
                (3.0, 3_000.0),
                (7.0, 7_000.0),
                (12.0, 12_000.0),
                (20.0, 25_000.0),
            ],
            DipPreset::Opportunistic => &[
                (2.0, 2_000.0),
                (5.0, 5_000.0),
                (8.0, 8_000.0),
                (12.0, 15_000.0),
                (20.0, 30_000.0),
            ],
        };
        tiers.iter().map(|&(pct, amount)| DipRule::new(pct, amount)).collect()
    }
}

macro_rules! preset_names {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn name(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    other => Err(format!("unknown preset '{other}'")),
                }
            }
        }
    };
}

preset_names!(PeriodicPreset {
    Conservative => "conservative",
    Moderate => "moderate",
    Aggressive => "aggressive",
    Premium => "premium",
});

preset_names!(StepUpPreset {
    Conservative => "conservative",
    Moderate => "moderate",
    Aggressive => "aggressive",
    Premium => "premium",
});

preset_names!(DipPreset {
    Conservative => "conservative",
    Moderate => "moderate",
    Aggressive => "aggressive",
    Opportunistic => "opportunistic",
});
