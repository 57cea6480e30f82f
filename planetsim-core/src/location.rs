use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::collaborators::TerrainLabel;
use crate::grid::Coord;
use crate::habitability::{temperature_habitability, Habitability};
use crate::tuning::Tuning;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParameterKind {
    Knowledge,
    Altitude,
    Temperature,
    Roughness,
    Vegetation,
    Soil,
    Water,
}

impl ParameterKind {
    pub const ALL: [ParameterKind; 7] = [
        ParameterKind::Knowledge,
        ParameterKind::Altitude,
        ParameterKind::Temperature,
        ParameterKind::Roughness,
        ParameterKind::Vegetation,
        ParameterKind::Soil,
        ParameterKind::Water,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::Knowledge => 0,
            Self::Altitude => 1,
            Self::Temperature => 2,
            Self::Roughness => 3,
            Self::Vegetation => 4,
            Self::Soil => 5,
            Self::Water => 6,
        }
    }

    /// Inclusive `(min, max)` every stored value is clamped into.
    #[inline]
    pub fn bounds(self) -> (i32, i32) {
        match self {
            Self::Temperature => (-6, 11),
            _ => (0, 5),
        }
    }

    #[inline]
    pub fn clamp(self, value: i32) -> i32 {
        let (min, max) = self.bounds();
        value.clamp(min, max)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Knowledge => "knowledge",
            Self::Altitude => "altitude",
            Self::Temperature => "temperature",
            Self::Roughness => "roughness",
            Self::Vegetation => "vegetation",
            Self::Soil => "soil",
            Self::Water => "water",
        }
    }
}

/// One value per [`ParameterKind`], always inside the kind's bounds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ParameterSet {
    values: [i32; 7],
}

impl Default for ParameterSet {
    fn default() -> Self {
        let mut values = [0; 7];
        for kind in ParameterKind::ALL {
            values[kind.index()] = kind.clamp(0);
        }
        Self { values }
    }
}

impl ParameterSet {
    #[inline]
    pub fn get(&self, kind: ParameterKind) -> i32 {
        self.values[kind.index()]
    }

    /// Stores the clamped value and returns `(old, new)`.
    #[inline]
    pub fn set(&mut self, kind: ParameterKind, value: i32) -> (i32, i32) {
        let old = self.values[kind.index()];
        let new = kind.clamp(value);
        self.values[kind.index()] = new;
        (old, new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParameterKind, i32)> + '_ {
        ParameterKind::ALL.into_iter().map(|k| (k, self.get(k)))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureKey {
    NorthPole,
    SouthPole,
    Equator,
    NorthernTropic,
    SouthernTropic,
    Custom(String),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PoleWeights {
    pub pole_distance: f64,
    pub north_pole_distance: f64,
    pub south_pole_distance: f64,
    pub inverse_pole_distance: f64,
}

impl Default for PoleWeights {
    fn default() -> Self {
        Self {
            pole_distance: 1.0,
            north_pole_distance: 1.0,
            south_pole_distance: 1.0,
            inverse_pole_distance: 0.1,
        }
    }
}

/// A grid cell's terrain record. Owned by the world; neighbours are stored as
/// coordinates.
#[derive(Clone, Debug)]
pub struct Location {
    pub(crate) coord: Coord,
    pub(crate) parameters: ParameterSet,
    pub(crate) pole_weights: PoleWeights,
    pub(crate) local_weather_offset: f64,
    pub(crate) expected_temperature_offset: f64,
    pub(crate) terrain_features: BTreeSet<FeatureKey>,
    pub(crate) adjacency: [Coord; 4],
    pub(crate) terrain: TerrainLabel,
}

impl Location {
    pub(crate) fn new(coord: Coord, adjacency: [Coord; 4], local_weather_offset: f64) -> Self {
        Self {
            coord,
            parameters: ParameterSet::default(),
            pole_weights: PoleWeights::default(),
            local_weather_offset,
            expected_temperature_offset: 0.0,
            terrain_features: BTreeSet::new(),
            adjacency,
            terrain: TerrainLabel::default(),
        }
    }

    #[inline]
    pub fn coord(&self) -> Coord {
        self.coord
    }

    #[inline]
    pub fn get(&self, kind: ParameterKind) -> i32 {
        self.parameters.get(kind)
    }

    #[inline]
    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    #[inline]
    pub fn adjacency(&self) -> [Coord; 4] {
        self.adjacency
    }

    #[inline]
    pub fn pole_weights(&self) -> PoleWeights {
        self.pole_weights
    }

    #[inline]
    pub fn local_weather_offset(&self) -> f64 {
        self.local_weather_offset
    }

    #[inline]
    pub fn expected_temperature_offset(&self) -> f64 {
        self.expected_temperature_offset
    }

    #[inline]
    pub fn terrain(&self) -> TerrainLabel {
        self.terrain
    }

    pub fn terrain_features(&self) -> &BTreeSet<FeatureKey> {
        &self.terrain_features
    }

    pub fn has_feature(&self, key: &FeatureKey) -> bool {
        self.terrain_features.contains(key)
    }

    /// Temperature this cell should sit at given the world's averages: warmer
    /// away from the poles, cooler above the average altitude.
    pub fn expected_temperature(&self, average_temperature: f64, average_altitude: f64) -> f64 {
        average_temperature - 3.5
            + 5.0 * self.pole_weights.pole_distance
            + 0.5 * (average_altitude - f64::from(self.get(ParameterKind::Altitude)))
    }

    pub(crate) fn refresh_expected_offset(&mut self, average_temperature: f64, average_altitude: f64) {
        self.expected_temperature_offset = f64::from(self.get(ParameterKind::Temperature))
            - self.expected_temperature(average_temperature, average_altitude);
    }

    /// Tie-broken deviation used to pick warm/cool outliers.
    #[inline]
    pub(crate) fn outlier_key(&self) -> f64 {
        self.expected_temperature_offset + self.local_weather_offset
    }

    /// Tier for one local parameter. Only temperature and water carry local
    /// risk; everything else is judged on the global scale.
    pub fn parameter_habitability(&self, kind: ParameterKind, tuning: &Tuning) -> Habitability {
        match kind {
            ParameterKind::Temperature => {
                temperature_habitability(self.get(ParameterKind::Temperature), tuning)
            }
            ParameterKind::Water => {
                let deep = self.get(ParameterKind::Water) >= tuning.deadly_water_level;
                let liquid = f64::from(self.get(ParameterKind::Temperature)) > tuning.freezing_point;
                if deep && liquid {
                    Habitability::Deadly
                } else {
                    Habitability::Perfect
                }
            }
            _ => Habitability::Perfect,
        }
    }

    pub fn is_frozen(&self, tuning: &Tuning) -> bool {
        f64::from(self.get(ParameterKind::Temperature)) < tuning.freezing_point
    }
}
