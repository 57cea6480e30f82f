//! Services the engine calls out to but does not own: terrain classification,
//! surface brightness for albedo, and change notification.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::grid::Coord;
use crate::location::{Location, ParameterKind, ParameterSet};
use crate::tuning::Tuning;
use crate::world::GlobalParameterKind;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TerrainLabel {
    #[default]
    Barren,
    Ocean,
    Shallows,
    IceSheet,
    Tundra,
    Desert,
    Grassland,
    Forest,
    Hills,
    Mountains,
    Steam,
}

impl TerrainLabel {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Barren => 0,
            Self::Ocean => 1,
            Self::Shallows => 2,
            Self::IceSheet => 3,
            Self::Tundra => 4,
            Self::Desert => 5,
            Self::Grassland => 6,
            Self::Forest => 7,
            Self::Hills => 8,
            Self::Mountains => 9,
            Self::Steam => 10,
        }
    }
}

pub trait TerrainClassifier: Send + Sync {
    fn classify(&self, parameters: &ParameterSet) -> TerrainLabel;
}

pub trait BrightnessSampler: Send + Sync {
    /// Surface reflectivity in `[0, 1]`.
    fn brightness(&self, location: &Location, tuning: &Tuning) -> f64;
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub enum ChangeScope {
    Location(Coord, ParameterKind),
    Global(GlobalParameterKind),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParameterChange {
    pub scope: ChangeScope,
    pub old: f64,
    pub new: f64,
}

/// Fire-and-forget sink for parameter mutations.
pub trait ChangeNotifier: Send + Sync {
    fn parameter_changed(&self, change: &ParameterChange);
}

/// Threshold classifier over the raw parameter tuple.
#[derive(Clone, Debug)]
pub struct ThresholdClassifier {
    freezing_point: f64,
    boiling_point: f64,
}

impl ThresholdClassifier {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            freezing_point: tuning.freezing_point,
            boiling_point: tuning.boiling_point,
        }
    }
}

impl TerrainClassifier for ThresholdClassifier {
    fn classify(&self, parameters: &ParameterSet) -> TerrainLabel {
        let temperature = f64::from(parameters.get(ParameterKind::Temperature));
        let water = parameters.get(ParameterKind::Water);
        let altitude = parameters.get(ParameterKind::Altitude);
        let vegetation = parameters.get(ParameterKind::Vegetation);
        let roughness = parameters.get(ParameterKind::Roughness);

        if water > 0 && temperature >= self.boiling_point {
            return TerrainLabel::Steam;
        }
        if water > 0 && temperature < self.freezing_point {
            return if water >= 2 {
                TerrainLabel::IceSheet
            } else {
                TerrainLabel::Tundra
            };
        }
        if water >= 4 {
            return TerrainLabel::Ocean;
        }
        if water == 3 {
            return TerrainLabel::Shallows;
        }
        if altitude >= 4 || (altitude >= 3 && roughness >= 4) {
            return TerrainLabel::Mountains;
        }
        if vegetation >= 3 {
            return TerrainLabel::Forest;
        }
        if vegetation >= 1 {
            return TerrainLabel::Grassland;
        }
        if altitude >= 3 || roughness >= 4 {
            return TerrainLabel::Hills;
        }
        if temperature >= self.freezing_point && water == 0 {
            return TerrainLabel::Desert;
        }
        TerrainLabel::Barren
    }
}

/// Brightness derived from what covers the surface.
#[derive(Clone, Copy, Debug, Default)]
pub struct SurfaceBrightness;

impl BrightnessSampler for SurfaceBrightness {
    fn brightness(&self, location: &Location, tuning: &Tuning) -> f64 {
        let water = location.get(ParameterKind::Water);
        let vegetation = location.get(ParameterKind::Vegetation);
        let soil = location.get(ParameterKind::Soil);
        if water > 0 && location.is_frozen(tuning) {
            return 0.6 + 0.05 * f64::from(water.min(4));
        }
        if water >= 3 {
            return 0.07;
        }
        if vegetation > 0 {
            return 0.22 - 0.02 * f64::from(vegetation);
        }
        if soil > 0 {
            return 0.25;
        }
        0.32
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullNotifier;

impl ChangeNotifier for NullNotifier {
    fn parameter_changed(&self, _change: &ParameterChange) {}
}

/// The external services a world calls into.
#[derive(Clone)]
pub struct Collaborators {
    pub classifier: Arc<dyn TerrainClassifier>,
    pub brightness: Arc<dyn BrightnessSampler>,
    pub notifier: Arc<dyn ChangeNotifier>,
}

impl Collaborators {
    pub fn builtin(tuning: &Tuning) -> Self {
        Self {
            classifier: Arc::new(ThresholdClassifier::new(tuning)),
            brightness: Arc::new(SurfaceBrightness),
            notifier: Arc::new(NullNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
