//! Read/query surface shared by full worlds and the orbital view that
//! forwards to one.

use crate::error::WorldError;
use crate::grid::Coord;
use crate::habitability::{unit_habitability_for, Habitability, UnitCapabilities};
use crate::world::{GlobalParameterKind, World, WorldKind};

pub trait PlanetQuery {
    fn kind(&self) -> WorldKind;
    fn get_parameter(&self, kind: GlobalParameterKind) -> f64;
    fn get_habitability(&self, kind: GlobalParameterKind) -> Habitability;
    fn average_temperature(&self) -> f64;
    fn average_water(&self) -> f64;
    fn average_altitude(&self) -> f64;
    fn pressure_ratio(&self, component: Option<GlobalParameterKind>) -> f64;
    fn unit_habitability(
        &self,
        coord: Coord,
        capabilities: UnitCapabilities,
    ) -> Result<Habitability, WorldError>;
}

impl PlanetQuery for World {
    fn kind(&self) -> WorldKind {
        World::kind(self)
    }

    fn get_parameter(&self, kind: GlobalParameterKind) -> f64 {
        World::get_parameter(self, kind)
    }

    fn get_habitability(&self, kind: GlobalParameterKind) -> Habitability {
        World::get_habitability(self, kind)
    }

    fn average_temperature(&self) -> f64 {
        World::average_temperature(self)
    }

    fn average_water(&self) -> f64 {
        World::average_water(self)
    }

    fn average_altitude(&self) -> f64 {
        World::average_altitude(self)
    }

    fn pressure_ratio(&self, component: Option<GlobalParameterKind>) -> f64 {
        World::pressure_ratio(self, component)
    }

    fn unit_habitability(
        &self,
        coord: Coord,
        capabilities: UnitCapabilities,
    ) -> Result<Habitability, WorldError> {
        World::unit_habitability(self, coord, capabilities)
    }
}

/// A planet seen from orbit. Holds no state of its own: reads and
/// global-parameter writes go straight to the full world underneath.
#[derive(Debug)]
pub struct OrbitalWorldView<'w> {
    full: &'w mut World,
}

impl<'w> OrbitalWorldView<'w> {
    pub fn new(full: &'w mut World) -> Self {
        Self { full }
    }

    pub fn full(&self) -> &World {
        self.full
    }

    pub fn set_parameter(&mut self, kind: GlobalParameterKind, value: f64) -> Result<(), WorldError> {
        self.full.set_parameter(kind, value)
    }

    pub fn change_parameter(&mut self, kind: GlobalParameterKind, delta: f64) -> Result<(), WorldError> {
        self.full.change_parameter(kind, delta)
    }
}

impl PlanetQuery for OrbitalWorldView<'_> {
    fn kind(&self) -> WorldKind {
        WorldKind::Orbital
    }

    fn get_parameter(&self, kind: GlobalParameterKind) -> f64 {
        self.full.get_parameter(kind)
    }

    fn get_habitability(&self, kind: GlobalParameterKind) -> Habitability {
        self.full.get_habitability(kind)
    }

    fn average_temperature(&self) -> f64 {
        self.full.average_temperature()
    }

    fn average_water(&self) -> f64 {
        self.full.average_water()
    }

    fn average_altitude(&self) -> f64 {
        self.full.average_altitude()
    }

    fn pressure_ratio(&self, component: Option<GlobalParameterKind>) -> f64 {
        self.full.pressure_ratio(component)
    }

    fn unit_habitability(
        &self,
        coord: Coord,
        capabilities: UnitCapabilities,
    ) -> Result<Habitability, WorldError> {
        unit_habitability_for(self.full, WorldKind::Orbital, coord, capabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GenerationParams;
    use crate::tuning::Tuning;

    fn summary(planet: &dyn PlanetQuery) -> (f64, f64) {
        (
            planet.get_parameter(GlobalParameterKind::Gravity),
            planet.pressure_ratio(None),
        )
    }

    #[test]
    fn view_reads_through_to_full_world() {
        let mut full = World::new(GenerationParams::default(), Tuning::default()).expect("world");
        let direct = summary(&full);
        let view = OrbitalWorldView::new(&mut full);
        assert_eq!(summary(&view), direct);
        assert_eq!(view.kind(), WorldKind::Orbital);
    }

    #[test]
    fn view_writes_reach_full_world() {
        let mut full = World::new(GenerationParams::default(), Tuning::default()).expect("world");
        {
            let mut view = OrbitalWorldView::new(&mut full);
            view.change_parameter(GlobalParameterKind::Oxygen, 100.0).expect("change");
            assert!(view.set_parameter(GlobalParameterKind::Pressure, 1.0).is_err());
        }
        assert!((full.get_parameter(GlobalParameterKind::Pressure) - 1100.0).abs() < 0.1);
    }

    #[test]
    fn orbit_is_deadly_even_with_a_suit() {
        let mut full = World::new(GenerationParams::default(), Tuning::default()).expect("world");
        let sealed = UnitCapabilities { sealed: true };
        assert_eq!(
            full.unit_habitability(Coord::new(0, 0), sealed).expect("tier"),
            Habitability::Perfect
        );
        let view = OrbitalWorldView::new(&mut full);
        assert_eq!(
            view.unit_habitability(Coord::new(0, 0), sealed).expect("tier"),
            Habitability::Deadly
        );
    }
}
