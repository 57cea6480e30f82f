use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use blake3::Hasher;
use serde::{Deserialize, Serialize};

use crate::collaborators::Collaborators;
use crate::error::SnapshotError;
use crate::grid::Coord;
use crate::location::{FeatureKey, ParameterKind};
use crate::params::GenerationParams;
use crate::rng::WorldRng;
use crate::scheduler::Step;
use crate::tuning::Tuning;
use crate::world::{ClimateState, GlobalParameterKind, World, WorldKind};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostics {
    pub layer_hashes: BTreeMap<String, String>,
    pub checksum: String,
}

/// Everything needed to rebuild a world without regenerating it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub version: u32,
    pub kind: WorldKind,
    pub params: GenerationParams,
    pub turn: u64,
    pub current_step: Option<Step>,
    pub global_parameters: BTreeMap<GlobalParameterKind, f64>,
    pub climate: ClimateState,
    /// Row-major values per parameter.
    pub layers: BTreeMap<ParameterKind, Vec<i32>>,
    pub local_weather_offsets: Vec<f64>,
    /// Only cells that carry at least one feature.
    pub features: Vec<(Coord, Vec<FeatureKey>)>,
    pub checksum: String,
}

impl WorldSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(SnapshotError::Serialize)
    }

    pub fn from_json(data: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(data).map_err(SnapshotError::Parse)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| SnapshotError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(target: "planetsim::snapshot", path = %path.display(), "snapshot.written");
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }
}

fn check_len(layer: &str, found: usize, expected: usize) -> Result<(), SnapshotError> {
    if found == expected {
        Ok(())
    } else {
        Err(SnapshotError::DimensionMismatch {
            layer: layer.to_string(),
            expected,
            found,
        })
    }
}

impl World {
    pub fn snapshot(&self) -> WorldSnapshot {
        let cells = self.locations.as_slice();
        let layers: BTreeMap<ParameterKind, Vec<i32>> = ParameterKind::ALL
            .into_iter()
            .map(|kind| (kind, cells.iter().map(|l| l.get(kind)).collect()))
            .collect();
        let features: Vec<(Coord, Vec<FeatureKey>)> = cells
            .iter()
            .filter(|l| !l.terrain_features.is_empty())
            .map(|l| (l.coord(), l.terrain_features.iter().cloned().collect()))
            .collect();

        WorldSnapshot {
            version: SNAPSHOT_VERSION,
            kind: self.kind,
            params: self.params.clone(),
            turn: self.turn,
            current_step: self.current_step,
            global_parameters: self.global_parameters.clone(),
            climate: self.climate.clone(),
            layers,
            local_weather_offsets: cells.iter().map(|l| l.local_weather_offset).collect(),
            features,
            checksum: self.diagnostics.checksum.clone(),
        }
    }

    pub fn from_snapshot(snapshot: WorldSnapshot, tuning: Tuning) -> Result<Self, SnapshotError> {
        let collaborators = Collaborators::builtin(&tuning);
        Self::from_snapshot_with(snapshot, tuning, collaborators)
    }

    /// Restores a world exactly as saved. The random stream is re-derived
    /// from the seed and turn so later turns stay reproducible.
    pub fn from_snapshot_with(
        snapshot: WorldSnapshot,
        tuning: Tuning,
        collaborators: Collaborators,
    ) -> Result<Self, SnapshotError> {
        let mut world = World::build(snapshot.kind, snapshot.params, tuning, collaborators)?;
        let area = world.area();

        for kind in ParameterKind::ALL {
            let values = snapshot.layers.get(&kind).map_or(&[][..], Vec::as_slice);
            check_len(kind.name(), values.len(), area)?;
            for (location, value) in world.locations.as_mut_slice().iter_mut().zip(values) {
                location.parameters.set(kind, *value);
            }
        }
        check_len("local_weather_offsets", snapshot.local_weather_offsets.len(), area)?;
        for (location, offset) in world
            .locations
            .as_mut_slice()
            .iter_mut()
            .zip(&snapshot.local_weather_offsets)
        {
            location.local_weather_offset = *offset;
        }
        for (coord, keys) in snapshot.features {
            let idx = world.index_of(coord)?;
            world.locations.as_mut_slice()[idx]
                .terrain_features
                .extend(keys);
        }

        world.recount_totals();
        let classifier = world.collaborators.classifier.clone();
        for location in world.locations.as_mut_slice() {
            location.terrain = classifier.classify(&location.parameters);
        }

        world.global_parameters = snapshot.global_parameters;
        world.recompute_pressure();
        world.climate = snapshot.climate;
        world.refresh_averages();
        world.refresh_expected_offsets();
        world.turn = snapshot.turn;
        world.current_step = snapshot.current_step;
        world.rng = WorldRng::derived(world.params.seed, world.turn);
        world.update_diagnostics();

        if !snapshot.checksum.is_empty() && snapshot.checksum != world.diagnostics.checksum {
            tracing::warn!(
                target: "planetsim::snapshot",
                stored = %snapshot.checksum,
                restored = %world.diagnostics.checksum,
                "snapshot.checksum_mismatch"
            );
        }
        Ok(world)
    }

    pub fn update_diagnostics(&mut self) {
        let cells = self.locations.as_slice();
        let mut hashes = BTreeMap::new();
        for kind in ParameterKind::ALL {
            let mut h = Hasher::new();
            for location in cells {
                h.update(&location.get(kind).to_le_bytes());
            }
            hashes.insert(kind.name().to_string(), h.finalize().to_hex().to_string());
        }

        let mut globals = Hasher::new();
        for (kind, value) in &self.global_parameters {
            // Fixed precision so a JSON round trip hashes the same.
            let fixed = (value * 1e6).round() as i64;
            globals.update(format!("{kind:?}").as_bytes());
            globals.update(&fixed.to_le_bytes());
        }
        hashes.insert("global_parameters".to_string(), globals.finalize().to_hex().to_string());

        let mut features = Hasher::new();
        for location in cells {
            for key in &location.terrain_features {
                features.update(&(location.coord.x as u64).to_le_bytes());
                features.update(&(location.coord.y as u64).to_le_bytes());
                features.update(format!("{key:?}").as_bytes());
            }
        }
        hashes.insert("features".to_string(), features.finalize().to_hex().to_string());

        let mut combined = Hasher::new();
        for (name, hash) in &hashes {
            combined.update(name.as_bytes());
            combined.update(hash.as_bytes());
        }
        self.diagnostics.layer_hashes = hashes;
        self.diagnostics.checksum = combined.finalize().to_hex().to_string();
    }
}
