use anyhow::Result;
use planetsim_core::export::export_world;
use planetsim_core::{new_world, GenerationParams, PlanetPreset, Tuning};

fn main() -> Result<()> {
    let mut params = GenerationParams {
        seed: 42,
        ..GenerationParams::default()
    };
    for arg in std::env::args().skip(1) {
        if let Some(name) = arg.strip_prefix("--preset=") {
            if let Some(preset) = PlanetPreset::parse(name) {
                params.preset = preset;
            }
        } else if let Some(n) = arg.strip_prefix("--dimensions=") {
            if let Ok(n) = n.parse() {
                params.dimensions = n;
            }
        }
    }

    let world = new_world(params.clone(), Tuning::builtin())?;

    let out_dir = format!(
        "exports/finished_seed{}_{:?}_{}x{}",
        params.seed, params.preset, params.dimensions, params.dimensions
    );
    export_world(&world, &out_dir)?;

    println!("exported: {out_dir}");
    println!("checksum: {}", world.diagnostics().checksum);
    Ok(())
}
