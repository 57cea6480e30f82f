pub mod atmosphere;
pub mod climate;
pub mod collaborators;
pub mod error;
pub mod export;
pub mod geometry;
pub mod grid;
pub mod habitability;
pub mod location;
pub mod orbital;
pub mod params;
pub mod rng;
pub mod scheduler;
pub mod snapshot;
pub mod systems;
pub mod tuning;
pub mod world;

pub use climate::EquilibriumReport;
pub use collaborators::{Collaborators, TerrainLabel};
pub use error::{SnapshotError, TuningError, WorldError};
pub use grid::Coord;
pub use habitability::{Habitability, HabitabilityKey, UnitCapabilities};
pub use location::{FeatureKey, Location, ParameterKind};
pub use orbital::{OrbitalWorldView, PlanetQuery};
pub use params::{Customization, GenerationParams, PlanetPreset};
pub use scheduler::{new_world, run_all_steps, run_next_step, run_step, Step};
pub use snapshot::{Diagnostics, WorldSnapshot};
pub use tuning::Tuning;
pub use world::{AbstractKind, GlobalParameterKind, World, WorldKind};

#[cfg(test)]
mod tests {
    use crate::{new_world, GenerationParams, PlanetPreset, Tuning};

    #[test]
    fn deterministic_same_seed_same_checksum() {
        let p = GenerationParams {
            seed: 123_456_789,
            ..GenerationParams::default()
        };

        let a = new_world(p.clone(), Tuning::default()).expect("run a");
        let hash_a = a.diagnostics().checksum.clone();

        let b = new_world(p, Tuning::default()).expect("run b");
        let hash_b = b.diagnostics().checksum.clone();
        assert_eq!(hash_a, hash_b);
    }

    #[test]
    fn deterministic_different_seed_different_checksum() {
        let p1 = GenerationParams {
            seed: 111,
            ..GenerationParams::default()
        };
        let a = new_world(p1.clone(), Tuning::default()).expect("run a");

        let mut p2 = p1;
        p2.seed = 222;
        let b = new_world(p2, Tuning::default()).expect("run b");

        assert_ne!(a.diagnostics().checksum, b.diagnostics().checksum);
    }

    #[test]
    fn every_preset_generates() {
        for preset in PlanetPreset::ALL {
            let p = GenerationParams {
                preset,
                dimensions: 10,
                ..GenerationParams::default()
            };
            let w = new_world(p, Tuning::default()).expect("generate");
            let (min, max) = crate::ParameterKind::Temperature.bounds();
            assert!(w.average_temperature() >= f64::from(min));
            assert!(w.average_temperature() <= f64::from(max));
        }
    }
}
