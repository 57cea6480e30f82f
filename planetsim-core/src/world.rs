use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::collaborators::{ChangeScope, Collaborators, ParameterChange};
use crate::error::WorldError;
use crate::geometry::PoleTopology;
use crate::grid::{Coord, Grid2D};
use crate::location::{Location, ParameterKind};
use crate::params::{GenerationParams, PlanetPreset};
use crate::rng::WorldRng;
use crate::scheduler::Step;
use crate::snapshot::Diagnostics;
use crate::tuning::Tuning;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GlobalParameterKind {
    Gravity,
    Radiation,
    MagneticField,
    InertGases,
    Oxygen,
    Ghg,
    ToxicGases,
    /// Sum of the four atmosphere components; never set directly.
    Pressure,
}

impl GlobalParameterKind {
    pub const ALL: [GlobalParameterKind; 8] = [
        GlobalParameterKind::Gravity,
        GlobalParameterKind::Radiation,
        GlobalParameterKind::MagneticField,
        GlobalParameterKind::InertGases,
        GlobalParameterKind::Oxygen,
        GlobalParameterKind::Ghg,
        GlobalParameterKind::ToxicGases,
        GlobalParameterKind::Pressure,
    ];

    pub const ATMOSPHERE: [GlobalParameterKind; 4] = [
        GlobalParameterKind::InertGases,
        GlobalParameterKind::Oxygen,
        GlobalParameterKind::Ghg,
        GlobalParameterKind::ToxicGases,
    ];

    pub fn is_atmosphere(self) -> bool {
        Self::ATMOSPHERE.contains(&self)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AbstractKind {
    Earth,
    Orbital,
    Other,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WorldKind {
    Full,
    Orbital,
    Abstract(AbstractKind),
}

/// Planet-wide aggregates and energy-balance state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClimateState {
    pub average_temperature: f64,
    pub average_temperature_target: f64,
    pub average_water: f64,
    pub average_water_target: f64,
    pub average_altitude: f64,
    pub ghg_multiplier: f64,
    pub water_vapor_multiplier: f64,
    pub albedo_multiplier: f64,
    pub cloud_frequency: f64,
    pub toxic_cloud_frequency: f64,
    pub atmosphere_haze_alpha: f64,
    pub star_distance: f64,
    pub initial_atmosphere_offset: f64,
    pub current_atmosphere_offset: f64,
    pub sky_color: [u8; 3],
}

impl ClimateState {
    fn new(star_distance: f64, water_target: f64, sky_color: [u8; 3]) -> Self {
        Self {
            average_temperature: 0.0,
            average_temperature_target: 0.0,
            average_water: 0.0,
            average_water_target: water_target,
            average_altitude: 0.0,
            ghg_multiplier: 1.0,
            water_vapor_multiplier: 1.0,
            albedo_multiplier: 1.0,
            cloud_frequency: 0.0,
            toxic_cloud_frequency: 0.0,
            atmosphere_haze_alpha: 0.0,
            star_distance,
            initial_atmosphere_offset: 0.0,
            current_atmosphere_offset: 0.0,
            sky_color,
        }
    }
}

#[derive(Clone, Debug)]
pub struct World {
    pub(crate) kind: WorldKind,
    pub(crate) params: GenerationParams,
    pub(crate) tuning: Tuning,
    pub(crate) collaborators: Collaborators,
    pub(crate) rng: WorldRng,
    pub(crate) locations: Grid2D<Location>,
    pub(crate) topology: PoleTopology,
    pub(crate) global_parameters: BTreeMap<GlobalParameterKind, f64>,
    totals: [i64; 7],
    pub(crate) climate: ClimateState,
    pub(crate) turn: u64,
    pub(crate) setup_in_progress: bool,
    pub(crate) current_step: Option<Step>,
    pub(crate) step_timings_ms: BTreeMap<Step, f64>,
    pub(crate) diagnostics: Diagnostics,
}

impl World {
    pub fn new(params: GenerationParams, tuning: Tuning) -> Result<Self, WorldError> {
        let collaborators = Collaborators::builtin(&tuning);
        Self::with_collaborators(params, tuning, collaborators)
    }

    /// Builds an ungenerated world: flat grid, topology, starting atmosphere.
    pub fn with_collaborators(
        params: GenerationParams,
        tuning: Tuning,
        collaborators: Collaborators,
    ) -> Result<Self, WorldError> {
        let kind = if params.dimensions == 1 {
            match params.preset {
                PlanetPreset::Earth => WorldKind::Abstract(AbstractKind::Earth),
                _ => WorldKind::Abstract(AbstractKind::Other),
            }
        } else {
            WorldKind::Full
        };
        Self::build(kind, params, tuning, collaborators)
    }

    /// Single-cell stand-in, e.g. an orbit or Earth seen as a point.
    pub fn new_abstract(
        abstract_kind: AbstractKind,
        mut params: GenerationParams,
        tuning: Tuning,
    ) -> Result<Self, WorldError> {
        params.dimensions = 1;
        let collaborators = Collaborators::builtin(&tuning);
        Self::build(WorldKind::Abstract(abstract_kind), params, tuning, collaborators)
    }

    pub(crate) fn build(
        kind: WorldKind,
        params: GenerationParams,
        tuning: Tuning,
        collaborators: Collaborators,
    ) -> Result<Self, WorldError> {
        let n = params.dimensions;
        if n == 0 {
            return Err(WorldError::InvalidDimensions(n));
        }
        let star_distance = params.star_distance();
        if !(star_distance.is_finite() && star_distance > 0.0) {
            return Err(WorldError::InvalidStarDistance(star_distance));
        }

        let mut rng = WorldRng::new(params.seed);
        let topology = PoleTopology::build(n);
        let shape = Grid2D::new(n, n, ());
        let mut cells = Vec::with_capacity(n * n);
        for c in shape.iter_coords() {
            let jitter = rng.uniform_f64(-0.2, 0.2);
            let mut location = Location::new(c, shape.neighbors(c), jitter);
            location.pole_weights = topology.pole_weights(c);
            location.terrain = collaborators.classifier.classify(&location.parameters);
            cells.push(location);
        }
        let locations = Grid2D::from_vec(n, n, cells)
            .ok_or(WorldError::InvalidDimensions(n))?;

        let climate = ClimateState::new(
            star_distance,
            params.water_target(),
            tuning.default_sky_color,
        );
        let global_parameters = starting_global_parameters(&params, &tuning);

        let mut world = Self {
            kind,
            params,
            tuning,
            collaborators,
            rng,
            locations,
            topology,
            global_parameters,
            totals: [0; 7],
            climate,
            turn: 0,
            setup_in_progress: false,
            current_step: None,
            step_timings_ms: BTreeMap::new(),
            diagnostics: Diagnostics::default(),
        };
        world.recount_totals();
        world.recompute_pressure();
        world.refresh_averages();
        world.climate.initial_atmosphere_offset = world.atmosphere_offset();
        world.climate.current_atmosphere_offset = world.climate.initial_atmosphere_offset;
        world.climate.sky_color = world.sky_color();
        Ok(world)
    }

    #[inline]
    pub fn kind(&self) -> WorldKind {
        self.kind
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, WorldKind::Abstract(_))
    }

    /// Earth-preset worlds use the Earth water-vapour constant directly.
    pub fn is_earth(&self) -> bool {
        self.params.preset == PlanetPreset::Earth
            || self.kind == WorldKind::Abstract(AbstractKind::Earth)
    }

    #[inline]
    pub fn dimensions(&self) -> usize {
        self.locations.width()
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.locations.len()
    }

    #[inline]
    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    #[inline]
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    #[inline]
    pub fn topology(&self) -> &PoleTopology {
        &self.topology
    }

    #[inline]
    pub fn climate(&self) -> &ClimateState {
        &self.climate
    }

    #[inline]
    pub fn locations(&self) -> &Grid2D<Location> {
        &self.locations
    }

    #[inline]
    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn current_step(&self) -> Option<Step> {
        self.current_step
    }

    pub fn step_timings_ms(&self) -> &BTreeMap<Step, f64> {
        &self.step_timings_ms
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn index_of(&self, coord: Coord) -> Result<usize, WorldError> {
        let n = self.dimensions();
        if coord.x >= n || coord.y >= n {
            return Err(WorldError::CoordinateOutOfBounds {
                x: coord.x,
                y: coord.y,
                dimensions: n,
            });
        }
        Ok(self.locations.idx(coord.x, coord.y))
    }

    pub fn location(&self, coord: Coord) -> Result<&Location, WorldError> {
        let idx = self.index_of(coord)?;
        Ok(&self.locations.as_slice()[idx])
    }

    #[inline]
    pub(crate) fn loc(&self, idx: usize) -> &Location {
        &self.locations.as_slice()[idx]
    }

    #[inline]
    pub(crate) fn value_at(&self, idx: usize, kind: ParameterKind) -> i32 {
        self.loc(idx).get(kind)
    }

    #[inline]
    pub(crate) fn neighbor_indices(&self, idx: usize) -> [usize; 4] {
        let adjacency = self.loc(idx).adjacency;
        adjacency.map(|c| self.locations.idx(c.x, c.y))
    }

    pub(crate) fn random_index(&mut self) -> usize {
        let area = self.area();
        self.rng.index(area)
    }

    /// Sum of one parameter over every cell.
    #[inline]
    pub fn parameter_total(&self, kind: ParameterKind) -> i64 {
        self.totals[kind.index()]
    }

    pub fn average_parameter(&self, kind: ParameterKind) -> f64 {
        self.totals[kind.index()] as f64 / self.area().max(1) as f64
    }

    #[inline]
    pub fn average_temperature(&self) -> f64 {
        self.climate.average_temperature
    }

    #[inline]
    pub fn average_water(&self) -> f64 {
        self.climate.average_water
    }

    #[inline]
    pub fn average_altitude(&self) -> f64 {
        self.climate.average_altitude
    }

    pub(crate) fn recount_totals(&mut self) {
        let mut totals = [0i64; 7];
        for location in self.locations.as_slice() {
            for (kind, value) in location.parameters.iter() {
                totals[kind.index()] += i64::from(value);
            }
        }
        self.totals = totals;
    }

    pub(crate) fn refresh_averages(&mut self) {
        self.climate.average_temperature = self.average_parameter(ParameterKind::Temperature);
        self.climate.average_water = self.average_parameter(ParameterKind::Water);
        if !self.is_abstract() {
            self.climate.average_altitude = self.average_parameter(ParameterKind::Altitude);
        }
    }

    // ---- location parameters ----

    pub fn set_location_parameter(
        &mut self,
        coord: Coord,
        kind: ParameterKind,
        value: i32,
        notify: bool,
    ) -> Result<(), WorldError> {
        let idx = self.index_of(coord)?;
        self.set_at(idx, kind, value, notify);
        Ok(())
    }

    pub fn change_location_parameter(
        &mut self,
        coord: Coord,
        kind: ParameterKind,
        delta: i32,
        notify: bool,
    ) -> Result<(), WorldError> {
        let idx = self.index_of(coord)?;
        self.change_at(idx, kind, delta, notify);
        Ok(())
    }

    #[inline]
    pub(crate) fn change_at(&mut self, idx: usize, kind: ParameterKind, delta: i32, notify: bool) {
        let value = self.value_at(idx, kind).saturating_add(delta);
        self.set_at(idx, kind, value, notify);
    }

    /// Clamped store plus every side effect: averages, water displacement on
    /// temperature change, reclassification, notification.
    pub(crate) fn set_at(&mut self, idx: usize, kind: ParameterKind, value: i32, notify: bool) {
        let (old, new) = self.locations.as_mut_slice()[idx].parameters.set(kind, value);
        self.totals[kind.index()] += i64::from(new - old);

        match kind {
            ParameterKind::Altitude => {
                if !self.is_abstract() {
                    self.climate.average_altitude = self.average_parameter(ParameterKind::Altitude);
                }
            }
            ParameterKind::Temperature => {
                self.climate.average_temperature =
                    self.average_parameter(ParameterKind::Temperature);
            }
            ParameterKind::Water => {
                self.climate.average_water = self.average_parameter(ParameterKind::Water);
            }
            _ => {}
        }

        let average_temperature = self.climate.average_temperature;
        let average_altitude = self.climate.average_altitude;
        let location = &mut self.locations.as_mut_slice()[idx];
        location.terrain = self.collaborators.classifier.classify(&location.parameters);
        if matches!(kind, ParameterKind::Temperature | ParameterKind::Altitude) {
            location.refresh_expected_offset(average_temperature, average_altitude);
        }
        let coord = location.coord;

        if notify && old != new {
            self.collaborators.notifier.parameter_changed(&ParameterChange {
                scope: ChangeScope::Location(coord, kind),
                old: f64::from(old),
                new: f64::from(new),
            });
        }

        if kind == ParameterKind::Temperature && old != new {
            self.displace_water(idx, notify);
        }
    }

    /// Melting/freezing feedback: a random share of the cell's water is
    /// lifted and placed again elsewhere.
    fn displace_water(&mut self, idx: usize, notify: bool) {
        let water = self.value_at(idx, ParameterKind::Water);
        if water <= 0 {
            return;
        }
        let displaced = self.rng.uniform_int(0, water);
        if displaced == 0 {
            return;
        }
        self.set_at(idx, ParameterKind::Water, water - displaced, notify);
        for _ in 0..displaced {
            if self.place_water().is_none() {
                // Nowhere to put it: return the unit so water is not lost.
                self.change_at(idx, ParameterKind::Water, 1, notify);
            }
        }
    }

    pub(crate) fn refresh_expected_offsets(&mut self) {
        let average_temperature = self.climate.average_temperature;
        let average_altitude = self.climate.average_altitude;
        for location in self.locations.as_mut_slice() {
            location.refresh_expected_offset(average_temperature, average_altitude);
        }
    }

    // ---- global parameters ----

    pub fn get_parameter(&self, kind: GlobalParameterKind) -> f64 {
        self.global_parameters.get(&kind).copied().unwrap_or(0.0)
    }

    /// Stores a global amount (never negative). Atmosphere components
    /// re-derive pressure.
    pub fn set_parameter(&mut self, kind: GlobalParameterKind, value: f64) -> Result<(), WorldError> {
        if kind == GlobalParameterKind::Pressure {
            return Err(WorldError::DerivedParameter(kind));
        }
        let old = self.get_parameter(kind);
        let new = if value.is_finite() { value.max(0.0) } else { old };
        self.global_parameters.insert(kind, new);
        if kind.is_atmosphere() {
            self.recompute_pressure();
            self.climate.current_atmosphere_offset = self.atmosphere_offset();
        }
        if (old - new).abs() > f64::EPSILON {
            self.collaborators.notifier.parameter_changed(&ParameterChange {
                scope: ChangeScope::Global(kind),
                old,
                new,
            });
        }
        Ok(())
    }

    pub fn change_parameter(&mut self, kind: GlobalParameterKind, delta: f64) -> Result<(), WorldError> {
        let value = self.get_parameter(kind) + delta;
        self.set_parameter(kind, value)
    }

    pub(crate) fn recompute_pressure(&mut self) {
        let sum: f64 = GlobalParameterKind::ATMOSPHERE
            .iter()
            .map(|k| self.get_parameter(*k))
            .sum();
        let pressure = (sum * 10.0).round() / 10.0;
        self.global_parameters
            .insert(GlobalParameterKind::Pressure, pressure);
    }
}

fn starting_global_parameters(
    params: &GenerationParams,
    tuning: &Tuning,
) -> BTreeMap<GlobalParameterKind, f64> {
    let preset = params.preset.defaults();
    let total = preset.pressure_ratio * tuning.ideal_pressure(params.dimensions);

    let mut globals = BTreeMap::new();
    globals.insert(GlobalParameterKind::Gravity, preset.gravity);
    globals.insert(GlobalParameterKind::Radiation, preset.radiation);
    globals.insert(GlobalParameterKind::MagneticField, preset.magnetic_field);
    globals.insert(GlobalParameterKind::InertGases, total * preset.inert_fraction);
    globals.insert(GlobalParameterKind::Oxygen, total * preset.oxygen_fraction);
    globals.insert(GlobalParameterKind::Ghg, total * preset.ghg_fraction);
    globals.insert(GlobalParameterKind::ToxicGases, total * preset.toxic_fraction);
    for (kind, value) in &params.global_parameters {
        if *kind != GlobalParameterKind::Pressure {
            globals.insert(*kind, value.max(0.0));
        }
    }
    globals
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::collaborators::ChangeNotifier;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ParameterChange>>);

    impl ChangeNotifier for Recorder {
        fn parameter_changed(&self, change: &ParameterChange) {
            if let Ok(mut log) = self.0.lock() {
                log.push(*change);
            }
        }
    }

    fn world() -> World {
        World::new(GenerationParams::default(), Tuning::default()).expect("world")
    }

    #[test]
    fn set_clamps_and_get_returns_clamped() {
        let mut w = world();
        let c = Coord::new(3, 4);
        w.set_location_parameter(c, ParameterKind::Altitude, 99, false)
            .expect("in bounds");
        assert_eq!(w.location(c).expect("loc").get(ParameterKind::Altitude), 5);
        w.set_location_parameter(c, ParameterKind::Temperature, -40, false)
            .expect("in bounds");
        assert_eq!(w.location(c).expect("loc").get(ParameterKind::Temperature), -6);
    }

    #[test]
    fn out_of_grid_coordinate_is_an_error() {
        let mut w = world();
        let err = w
            .set_location_parameter(Coord::new(15, 0), ParameterKind::Water, 1, false)
            .expect_err("outside grid");
        assert!(matches!(err, WorldError::CoordinateOutOfBounds { .. }));
    }

    #[test]
    fn altitude_average_tracks_sets() {
        let mut w = world();
        w.set_location_parameter(Coord::new(0, 0), ParameterKind::Altitude, 5, false)
            .expect("set");
        assert!((w.average_altitude() - 5.0 / 225.0).abs() < 1e-12);
    }

    #[test]
    fn abstract_world_keeps_altitude_average() {
        let mut w = World::new_abstract(
            AbstractKind::Other,
            GenerationParams::default(),
            Tuning::default(),
        )
        .expect("abstract");
        w.set_location_parameter(Coord::new(0, 0), ParameterKind::Altitude, 4, false)
            .expect("set");
        assert_eq!(w.average_altitude(), 0.0);
    }

    #[test]
    fn pressure_is_rounded_sum_of_components() {
        let mut w = world();
        w.set_parameter(GlobalParameterKind::InertGases, 12.34).expect("set");
        w.set_parameter(GlobalParameterKind::Oxygen, 0.06).expect("set");
        w.set_parameter(GlobalParameterKind::Ghg, 0.0).expect("set");
        w.set_parameter(GlobalParameterKind::ToxicGases, 1.0).expect("set");
        assert!((w.get_parameter(GlobalParameterKind::Pressure) - 13.4).abs() < 1e-9);
        w.change_parameter(GlobalParameterKind::ToxicGases, 0.25).expect("change");
        assert!((w.get_parameter(GlobalParameterKind::Pressure) - 13.7).abs() < 1e-9);
    }

    #[test]
    fn pressure_cannot_be_set() {
        let mut w = world();
        assert!(matches!(
            w.set_parameter(GlobalParameterKind::Pressure, 1.0),
            Err(WorldError::DerivedParameter(GlobalParameterKind::Pressure))
        ));
    }

    #[test]
    fn notify_flag_controls_notifications() {
        let recorder = Arc::new(Recorder::default());
        let tuning = Tuning::default();
        let collaborators = Collaborators::builtin(&tuning).with_notifier(recorder.clone());
        let mut w = World::with_collaborators(GenerationParams::default(), tuning, collaborators)
            .expect("world");
        let c = Coord::new(1, 1);
        w.set_location_parameter(c, ParameterKind::Soil, 2, false).expect("set");
        w.set_location_parameter(c, ParameterKind::Soil, 3, true).expect("set");
        let log = recorder.0.lock().expect("lock");
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].scope, ChangeScope::Location(c, ParameterKind::Soil));
        assert_eq!(log[0].new, 3.0);
    }

    #[test]
    fn temperature_change_conserves_water() {
        let mut w = world();
        for y in 0..15 {
            for x in 0..15 {
                w.set_location_parameter(Coord::new(x, y), ParameterKind::Temperature, 4, false)
                    .expect("set");
            }
        }
        let c = Coord::new(5, 5);
        w.set_location_parameter(c, ParameterKind::Water, 3, false).expect("set");
        let before = w.parameter_total(ParameterKind::Water);
        w.set_location_parameter(c, ParameterKind::Temperature, 6, false)
            .expect("set");
        assert_eq!(w.parameter_total(ParameterKind::Water), before);
    }

    #[test]
    fn dimensions_zero_is_rejected() {
        let params = GenerationParams {
            dimensions: 0,
            ..GenerationParams::default()
        };
        assert!(matches!(
            World::new(params, Tuning::default()),
            Err(WorldError::InvalidDimensions(0))
        ));
    }

    #[test]
    fn preset_overrides_seed_global_parameters() {
        let mut params = GenerationParams::default();
        params.global_parameters.insert(GlobalParameterKind::Gravity, 2.5);
        let w = World::new(params, Tuning::default()).expect("world");
        assert_eq!(w.get_parameter(GlobalParameterKind::Gravity), 2.5);
        assert!((w.get_parameter(GlobalParameterKind::Pressure) - 1000.0).abs() < 0.1);
    }
}
