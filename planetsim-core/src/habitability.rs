use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::grid::Coord;
use crate::location::ParameterKind;
use crate::tuning::{HabitabilityBounds, Tuning};
use crate::world::{AbstractKind, GlobalParameterKind, World, WorldKind};

/// Ordered worst to best, so `min` picks the binding constraint.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Habitability {
    Deadly,
    Hostile,
    Harsh,
    Tolerable,
    Perfect,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HabitabilityKey {
    Local(ParameterKind),
    Global(GlobalParameterKind),
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnitCapabilities {
    /// Environment suit or sealed vehicle.
    pub sealed: bool,
}

fn tier_from_fraction(fraction: f64) -> Habitability {
    if fraction < 1.0 / 3.0 {
        Habitability::Tolerable
    } else if fraction < 2.0 / 3.0 {
        Habitability::Harsh
    } else {
        Habitability::Hostile
    }
}

/// Integer temperature to tier: perfect inside the tuned band, one tier worse
/// per step outside it.
pub fn temperature_habitability(temperature: i32, tuning: &Tuning) -> Habitability {
    let lower = tuning.temperature_perfect_lower;
    let upper = tuning.temperature_perfect_upper;
    let distance = if temperature < lower {
        lower - temperature
    } else if temperature > upper {
        temperature - upper
    } else {
        0
    };
    match distance {
        0 => Habitability::Perfect,
        1 => Habitability::Tolerable,
        2 => Habitability::Harsh,
        3 => Habitability::Hostile,
        _ => Habitability::Deadly,
    }
}

/// Classifies a value already expressed as a ratio of its ideal.
pub fn evaluate_ratio(ratio: f64, bounds: &HabitabilityBounds) -> Habitability {
    if bounds.deadly_lower.is_some_and(|dl| ratio <= dl)
        || bounds.deadly_upper.is_some_and(|du| ratio >= du)
    {
        return Habitability::Deadly;
    }

    if let Some(pl) = bounds.perfect_lower {
        if ratio < pl {
            let floor = bounds.deadly_lower.unwrap_or(0.0);
            let span = (pl - floor).max(f64::EPSILON);
            return tier_from_fraction((pl - ratio) / span);
        }
    }
    if let Some(pu) = bounds.perfect_upper {
        if ratio > pu {
            let fraction = match bounds.deadly_upper {
                Some(du) => (ratio - pu) / (du - pu).max(f64::EPSILON),
                None => (ratio - pu) / pu.max(f64::EPSILON),
            };
            return tier_from_fraction(fraction);
        }
    }
    Habitability::Perfect
}

impl World {
    /// Value of a global parameter as compared against its bounds table.
    fn habitability_ratio(&self, kind: GlobalParameterKind) -> f64 {
        match kind {
            GlobalParameterKind::Pressure => self.pressure_ratio(None),
            GlobalParameterKind::Oxygen => {
                let earth = self.tuning().earth_oxygen_fraction;
                if earth > 0.0 {
                    self.pressure_ratio(Some(kind)) / earth
                } else {
                    0.0
                }
            }
            GlobalParameterKind::Ghg => {
                let earth = self.tuning().earth_ghg_fraction;
                if earth > 0.0 {
                    self.pressure_ratio(Some(kind)) / earth
                } else {
                    0.0
                }
            }
            GlobalParameterKind::ToxicGases => self.pressure_ratio(Some(kind)),
            GlobalParameterKind::Radiation => self.net_radiation(),
            GlobalParameterKind::Gravity => {
                let earth = self.tuning().earth_gravity;
                if earth > 0.0 {
                    self.get_parameter(kind) / earth
                } else {
                    self.get_parameter(kind)
                }
            }
            GlobalParameterKind::MagneticField | GlobalParameterKind::InertGases => 1.0,
        }
    }

    pub fn get_habitability(&self, kind: GlobalParameterKind) -> Habitability {
        match self.tuning().habitability_bounds.get(&kind) {
            Some(bounds) => evaluate_ratio(self.habitability_ratio(kind), bounds),
            None => Habitability::Perfect,
        }
    }

    pub fn global_habitability_dict(&self, omit_perfect: bool) -> BTreeMap<HabitabilityKey, Habitability> {
        GlobalParameterKind::ALL
            .into_iter()
            .map(|kind| (HabitabilityKey::Global(kind), self.get_habitability(kind)))
            .filter(|(_, tier)| !omit_perfect || *tier != Habitability::Perfect)
            .collect()
    }

    /// Local tiers of a cell merged with the planet-wide tiers.
    pub fn habitability_dict(
        &self,
        coord: Coord,
        omit_perfect: bool,
    ) -> Result<BTreeMap<HabitabilityKey, Habitability>, WorldError> {
        let location = self.location(coord)?;
        let mut dict = self.global_habitability_dict(omit_perfect);
        for kind in ParameterKind::ALL {
            let tier = location.parameter_habitability(kind, self.tuning());
            if !omit_perfect || tier != Habitability::Perfect {
                dict.insert(HabitabilityKey::Local(kind), tier);
            }
        }
        Ok(dict)
    }

    /// Worst tier a unit standing on `coord` is exposed to.
    pub fn unit_habitability(
        &self,
        coord: Coord,
        capabilities: UnitCapabilities,
    ) -> Result<Habitability, WorldError> {
        unit_habitability_for(self, self.kind(), coord, capabilities)
    }
}

pub(crate) fn unit_habitability_for(
    world: &World,
    kind: WorldKind,
    coord: Coord,
    capabilities: UnitCapabilities,
) -> Result<Habitability, WorldError> {
    let dict = world.habitability_dict(coord, true)?;
    if matches!(
        kind,
        WorldKind::Orbital | WorldKind::Abstract(AbstractKind::Orbital)
    ) {
        return Ok(Habitability::Deadly);
    }
    if capabilities.sealed {
        return Ok(Habitability::Perfect);
    }
    Ok(dict.values().copied().min().unwrap_or(Habitability::Perfect))
}
