use crate::grid::Coord;
use crate::location::{FeatureKey, Location, ParameterKind};
use crate::tuning::Tuning;
use crate::world::World;

/// Decides which cells carry a non-geometric feature.
pub trait FeaturePlacer {
    fn key(&self) -> FeatureKey;

    fn admits(&self, location: &Location, tuning: &Tuning) -> bool;

    /// Chance an admitted cell actually receives the feature.
    fn frequency(&self) -> f64 {
        1.0
    }
}

/// Marks cells whose parameter falls in an inclusive range.
#[derive(Clone, Debug)]
pub struct ParameterFeature {
    pub key: FeatureKey,
    pub parameter: ParameterKind,
    pub min: i32,
    pub max: i32,
    pub frequency: f64,
}

impl FeaturePlacer for ParameterFeature {
    fn key(&self) -> FeatureKey {
        self.key.clone()
    }

    fn admits(&self, location: &Location, _tuning: &Tuning) -> bool {
        (self.min..=self.max).contains(&location.get(self.parameter))
    }

    fn frequency(&self) -> f64 {
        self.frequency
    }
}

/// Pole, equator and tropic markers from the precomputed topology.
pub fn run(world: &mut World) {
    let topology = world.topology().clone();
    let mut marks: Vec<(Coord, FeatureKey)> = vec![
        (topology.north_pole, FeatureKey::NorthPole),
        (topology.south_pole, FeatureKey::SouthPole),
    ];
    marks.extend(topology.equator.iter().map(|c| (*c, FeatureKey::Equator)));
    marks.extend(
        topology
            .northern_tropic
            .iter()
            .map(|c| (*c, FeatureKey::NorthernTropic)),
    );
    marks.extend(
        topology
            .southern_tropic
            .iter()
            .map(|c| (*c, FeatureKey::SouthernTropic)),
    );

    let mut marked = 0usize;
    for (coord, key) in marks {
        if world.locations.at_mut(coord).terrain_features.insert(key) {
            marked += 1;
        }
    }
    tracing::debug!(target: "planetsim::worldgen", marked, "worldgen.features.geometric");
}

impl World {
    /// Attaches `placer`'s feature to every admitted cell that passes its
    /// frequency roll. Returns the number of cells newly marked.
    pub fn place_features(&mut self, placer: &dyn FeaturePlacer) -> usize {
        let key = placer.key();
        let frequency = placer.frequency().clamp(0.0, 1.0);
        let mut placed = 0usize;
        for idx in 0..self.area() {
            if !placer.admits(self.loc(idx), &self.tuning) {
                continue;
            }
            if frequency < 1.0 && !self.rng.chance(frequency) {
                continue;
            }
            if self.locations.as_mut_slice()[idx]
                .terrain_features
                .insert(key.clone())
            {
                placed += 1;
            }
        }
        placed
    }

    pub fn cells_with_feature(&self, key: &FeatureKey) -> Vec<Coord> {
        self.locations
            .as_slice()
            .iter()
            .filter(|l| l.has_feature(key))
            .map(Location::coord)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GenerationParams;

    fn world() -> World {
        World::new(GenerationParams::default(), Tuning::default()).expect("world")
    }

    #[test]
    fn poles_and_equator_are_marked() {
        let mut w = world();
        run(&mut w);
        assert_eq!(w.cells_with_feature(&FeatureKey::NorthPole), vec![Coord::new(0, 0)]);
        assert_eq!(w.cells_with_feature(&FeatureKey::SouthPole).len(), 1);
        assert_eq!(
            w.cells_with_feature(&FeatureKey::Equator).len(),
            w.topology().equator.len()
        );
    }

    #[test]
    fn parameter_feature_respects_range() {
        let mut w = world();
        w.set_location_parameter(Coord::new(3, 3), ParameterKind::Altitude, 5, false)
            .expect("set");
        let peaks = ParameterFeature {
            key: FeatureKey::Custom("peak".into()),
            parameter: ParameterKind::Altitude,
            min: 5,
            max: 5,
            frequency: 1.0,
        };
        assert_eq!(w.place_features(&peaks), 1);
        assert_eq!(w.place_features(&peaks), 0);
        assert_eq!(
            w.cells_with_feature(&FeatureKey::Custom("peak".into())),
            vec![Coord::new(3, 3)]
        );
    }

    #[test]
    fn zero_frequency_places_nothing() {
        let mut w = world();
        let everywhere = ParameterFeature {
            key: FeatureKey::Custom("dust".into()),
            parameter: ParameterKind::Soil,
            min: 0,
            max: 5,
            frequency: 0.0,
        };
        assert_eq!(w.place_features(&everywhere), 0);
    }
}
