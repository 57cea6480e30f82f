use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::location::ParameterKind;
use crate::scheduler::Step;
use crate::world::World;

#[derive(Serialize)]
struct ExportMeta<'a> {
    seed: u64,
    dimensions: usize,
    rotation_hours: f64,
    turn: u64,
    step_state: Option<Step>,
    timings_ms: &'a BTreeMap<Step, f64>,
    average_temperature_f: f64,
    temperature_target_f: f64,
    average_water: f64,
    pressure_ratio: f64,
    sky_color: [u8; 3],
    checksum: &'a str,
    layer_hashes: &'a BTreeMap<String, String>,
    timestamp_unix_s: u64,
}

/// Writes `snapshot.json`, `meta.json`, one text grid per parameter layer and
/// a terrain-label grid into `dir`.
pub fn export_world(world: &World, dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("creating export dir {}", dir.display()))?;

    world
        .snapshot()
        .write_to(dir.join("snapshot.json"))
        .context("writing snapshot.json")?;

    for kind in ParameterKind::ALL {
        let path = dir.join(format!("{}.txt", kind.name()));
        fs::write(&path, layer_text(world, kind))
            .with_context(|| format!("writing {}", path.display()))?;
    }

    let terrain = dir.join("terrain.txt");
    fs::write(&terrain, terrain_text(world))
        .with_context(|| format!("writing {}", terrain.display()))?;

    let tuning = world.tuning();
    let meta = ExportMeta {
        seed: world.params().seed,
        dimensions: world.dimensions(),
        rotation_hours: world.params().rotation,
        turn: world.turn(),
        step_state: world.current_step(),
        timings_ms: world.step_timings_ms(),
        average_temperature_f: tuning.to_fahrenheit(world.average_temperature()),
        temperature_target_f: tuning.to_fahrenheit(world.climate().average_temperature_target),
        average_water: world.average_water(),
        pressure_ratio: world.pressure_ratio(None),
        sky_color: world.climate().sky_color,
        checksum: &world.diagnostics().checksum,
        layer_hashes: &world.diagnostics().layer_hashes,
        timestamp_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs()),
    };
    let meta_json = serde_json::to_string_pretty(&meta)?;
    fs::write(dir.join("meta.json"), meta_json).context("writing meta.json")?;
    tracing::info!(target: "planetsim::snapshot", dir = %dir.display(), "export.written");
    Ok(())
}

/// One row per line, values right-aligned so columns line up.
fn layer_text(world: &World, kind: ParameterKind) -> String {
    let n = world.dimensions();
    let mut out = String::with_capacity(n * n * 4);
    for y in 0..n {
        for x in 0..n {
            let value = world.value_at(y * n + x, kind);
            let _ = write!(out, "{value:>3}");
        }
        out.push('\n');
    }
    out
}

fn terrain_text(world: &World) -> String {
    let n = world.dimensions();
    let mut out = String::with_capacity(n * n * 4);
    for (i, location) in world.locations().as_slice().iter().enumerate() {
        let _ = write!(out, "{:>3}", location.terrain().as_u8());
        if (i + 1) % n == 0 {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Coord;
    use crate::params::GenerationParams;
    use crate::tuning::Tuning;

    #[test]
    fn layer_text_is_row_major() {
        let mut w = World::new(
            GenerationParams {
                dimensions: 3,
                ..GenerationParams::default()
            },
            Tuning::default(),
        )
        .expect("world");
        w.set_location_parameter(Coord::new(2, 0), ParameterKind::Altitude, 5, false)
            .expect("set");
        w.set_location_parameter(Coord::new(0, 1), ParameterKind::Altitude, 3, false)
            .expect("set");
        let text = layer_text(&w, ParameterKind::Altitude);
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], "  0  0  5");
        assert_eq!(rows[1], "  3  0  0");
    }

    #[test]
    fn export_writes_every_file() {
        let w = World::new(GenerationParams::default(), Tuning::default()).expect("world");
        let dir = std::env::temp_dir().join(format!("planetsim-export-{}", std::process::id()));
        export_world(&w, &dir).expect("export");
        assert!(dir.join("snapshot.json").exists());
        assert!(dir.join("meta.json").exists());
        assert!(dir.join("terrain.txt").exists());
        let meta: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.join("meta.json")).expect("read meta"),
        )
        .expect("parse meta");
        assert_eq!(meta["rotation_hours"], serde_json::json!(24.0));
        for kind in ParameterKind::ALL {
            assert!(dir.join(format!("{}.txt", kind.name())).exists());
        }
        let _ = fs::remove_dir_all(&dir);
    }
}
