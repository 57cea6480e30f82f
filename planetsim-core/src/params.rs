use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::world::GlobalParameterKind;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlanetPreset {
    Earth,
    Mars,
    Venus,
    Barren,
}

/// Starting conditions a preset supplies before any overrides.
#[derive(Clone, Debug, PartialEq)]
pub struct PresetDefaults {
    pub star_distance: f64,
    /// Total pressure as a fraction of the size-scaled Earth pressure.
    pub pressure_ratio: f64,
    pub inert_fraction: f64,
    pub oxygen_fraction: f64,
    pub ghg_fraction: f64,
    pub toxic_fraction: f64,
    pub gravity: f64,
    pub radiation: f64,
    pub magnetic_field: f64,
    pub water_target: f64,
    pub soil: bool,
    pub vegetation: bool,
}

impl PlanetPreset {
    pub const ALL: [PlanetPreset; 4] = [
        PlanetPreset::Earth,
        PlanetPreset::Mars,
        PlanetPreset::Venus,
        PlanetPreset::Barren,
    ];

    pub fn defaults(self) -> PresetDefaults {
        match self {
            Self::Earth => PresetDefaults {
                star_distance: 1.0,
                pressure_ratio: 1.0,
                inert_fraction: 0.7896,
                oxygen_fraction: 0.21,
                ghg_fraction: 0.0004,
                toxic_fraction: 0.0,
                gravity: 1.0,
                radiation: 1.0,
                magnetic_field: 1.0,
                water_target: 2.0,
                soil: true,
                vegetation: true,
            },
            Self::Mars => PresetDefaults {
                star_distance: 1.52,
                pressure_ratio: 0.006,
                inert_fraction: 0.05,
                oxygen_fraction: 0.0,
                ghg_fraction: 0.95,
                toxic_fraction: 0.0,
                gravity: 0.38,
                radiation: 4.0,
                magnetic_field: 0.0,
                water_target: 0.6,
                soil: false,
                vegetation: false,
            },
            Self::Venus => PresetDefaults {
                star_distance: 0.72,
                pressure_ratio: 92.0,
                inert_fraction: 0.0335,
                oxygen_fraction: 0.0,
                ghg_fraction: 0.965,
                toxic_fraction: 0.0015,
                gravity: 0.9,
                radiation: 1.0,
                magnetic_field: 0.0,
                water_target: 0.05,
                soil: false,
                vegetation: false,
            },
            Self::Barren => PresetDefaults {
                star_distance: 1.0,
                pressure_ratio: 0.0,
                inert_fraction: 0.0,
                oxygen_fraction: 0.0,
                ghg_fraction: 0.0,
                toxic_fraction: 0.0,
                gravity: 0.17,
                radiation: 3.0,
                magnetic_field: 0.0,
                water_target: 0.3,
                soil: false,
                vegetation: false,
            },
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "earth" => Some(Self::Earth),
            "mars" => Some(Self::Mars),
            "venus" => Some(Self::Venus),
            "barren" => Some(Self::Barren),
            _ => None,
        }
    }
}

/// Player-facing overrides applied on top of a preset.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Customization {
    /// Start altitude at 2 instead of 0 so worms can carve basins.
    pub raised_altitude_baseline: bool,
    pub smooth_altitude: bool,
    /// Keep placing water until the realized average matches this exactly.
    pub water_target: Option<f64>,
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            raised_altitude_baseline: true,
            smooth_altitude: true,
            water_target: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationParams {
    pub seed: u64,
    pub dimensions: usize,
    /// `None` takes the preset's distance.
    pub star_distance: Option<f64>,
    /// Day length in hours. Carried through snapshots and exports for
    /// callers; the climate model does not read it.
    pub rotation: f64,
    pub preset: PlanetPreset,
    pub customization: Option<Customization>,
    /// Raw amounts that replace the preset's starting global parameters.
    pub global_parameters: BTreeMap<GlobalParameterKind, f64>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            seed: 42,
            dimensions: 15,
            star_distance: None,
            rotation: 24.0,
            preset: PlanetPreset::Earth,
            customization: None,
            global_parameters: BTreeMap::new(),
        }
    }
}

impl GenerationParams {
    pub fn star_distance(&self) -> f64 {
        self.star_distance
            .unwrap_or_else(|| self.preset.defaults().star_distance)
    }

    pub fn smooth_altitude(&self) -> bool {
        self.customization
            .as_ref()
            .map_or(true, |c| c.smooth_altitude)
    }

    pub fn altitude_baseline(&self) -> i32 {
        match &self.customization {
            Some(c) if c.raised_altitude_baseline => 2,
            _ => 0,
        }
    }

    pub fn water_target(&self) -> f64 {
        self.customization
            .as_ref()
            .and_then(|c| c.water_target)
            .unwrap_or_else(|| self.preset.defaults().water_target)
    }

    pub fn exact_water_target(&self) -> Option<f64> {
        self.customization.as_ref().and_then(|c| c.water_target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_fractions_sum_to_at_most_one() {
        for preset in PlanetPreset::ALL {
            let d = preset.defaults();
            let sum = d.inert_fraction + d.oxygen_fraction + d.ghg_fraction + d.toxic_fraction;
            assert!(sum <= 1.0 + 1e-9, "{preset:?} sums to {sum}");
        }
    }

    #[test]
    fn customization_raises_baseline() {
        let mut p = GenerationParams::default();
        assert_eq!(p.altitude_baseline(), 0);
        p.customization = Some(Customization::default());
        assert_eq!(p.altitude_baseline(), 2);
    }

    #[test]
    fn water_target_prefers_customization() {
        let mut p = GenerationParams::default();
        assert!((p.water_target() - 2.0).abs() < 1e-9);
        p.customization = Some(Customization {
            water_target: Some(1.5),
            ..Customization::default()
        });
        assert!((p.water_target() - 1.5).abs() < 1e-9);
        assert_eq!(p.exact_water_target(), Some(1.5));
    }

    #[test]
    fn presets_parse_by_name() {
        assert_eq!(PlanetPreset::parse("Venus"), Some(PlanetPreset::Venus));
        assert_eq!(PlanetPreset::parse("pluto"), None);
    }
}
