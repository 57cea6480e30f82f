use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use planetsim_core::export::export_world;
use planetsim_core::{
    new_world, GenerationParams, GlobalParameterKind, Habitability, PlanetPreset, Tuning, World,
    WorldSnapshot,
};
use serde::Serialize;

/// Generate a planet, settle its climate and print a summary.
#[derive(Parser, Debug)]
#[command(name = "planetsim")]
struct Args {
    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Grid side length in cells
    #[arg(long, default_value_t = 15)]
    dimensions: usize,

    /// earth, mars, venus or barren
    #[arg(long, default_value = "earth", value_parser = parse_preset)]
    preset: PlanetPreset,

    /// Star distance in AU; defaults to the preset's
    #[arg(long)]
    star_distance: Option<f64>,

    /// Day length in hours
    #[arg(long, default_value_t = 24.0)]
    rotation: f64,

    /// Tuning JSON overriding the built-in constants
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Load this snapshot instead of generating
    #[arg(long, conflicts_with_all = ["seed", "dimensions", "preset", "star_distance", "rotation"])]
    load: Option<PathBuf>,

    /// Turns to advance after generation
    #[arg(long, default_value_t = 0)]
    turns: u64,

    /// Write a snapshot JSON here
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Write snapshot, metadata and layer grids into this directory
    #[arg(long)]
    export: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

fn parse_preset(name: &str) -> Result<PlanetPreset, String> {
    PlanetPreset::parse(name).ok_or_else(|| format!("unknown preset `{name}`"))
}

#[derive(Serialize)]
struct Summary {
    seed: u64,
    preset: PlanetPreset,
    dimensions: usize,
    turn: u64,
    average_temperature_f: f64,
    temperature_target_f: f64,
    average_water: f64,
    average_altitude: f64,
    pressure_ratio: f64,
    cloud_cover: f64,
    sky_color: [u8; 3],
    terraforming_progress: f64,
    habitability: BTreeMap<String, Habitability>,
    checksum: String,
}

impl Summary {
    fn of(world: &World) -> Self {
        let tuning = world.tuning();
        let habitability = world
            .global_habitability_dict(true)
            .into_iter()
            .map(|(key, tier)| (format!("{key:?}"), tier))
            .collect();
        Self {
            seed: world.params().seed,
            preset: world.params().preset,
            dimensions: world.dimensions(),
            turn: world.turn(),
            average_temperature_f: tuning.to_fahrenheit(world.average_temperature()),
            temperature_target_f: tuning
                .to_fahrenheit(world.climate().average_temperature_target),
            average_water: world.average_water(),
            average_altitude: world.average_altitude(),
            pressure_ratio: world.pressure_ratio(None),
            cloud_cover: world.cloud_cover(),
            sky_color: world.climate().sky_color,
            terraforming_progress: world.terraforming_progress(),
            habitability,
            checksum: world.diagnostics().checksum.clone(),
        }
    }

    fn print_text(&self) {
        println!("planet:      {:?} seed {} ({}x{})", self.preset, self.seed, self.dimensions, self.dimensions);
        println!("turn:        {}", self.turn);
        println!(
            "temperature: {:.1}F (target {:.1}F)",
            self.average_temperature_f, self.temperature_target_f
        );
        println!("water:       {:.2}", self.average_water);
        println!("altitude:    {:.2}", self.average_altitude);
        println!("pressure:    {:.3} x ideal", self.pressure_ratio);
        println!("clouds:      {:.2}", self.cloud_cover);
        let [r, g, b] = self.sky_color;
        println!("sky:         #{r:02x}{g:02x}{b:02x}");
        println!("terraformed: {:.0}%", self.terraforming_progress * 100.0);
        if self.habitability.is_empty() {
            println!("habitability: perfect");
        } else {
            for (key, tier) in &self.habitability {
                println!("  {key}: {tier:?}");
            }
        }
        println!("checksum:    {}", self.checksum);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let tuning = match &args.tuning {
        Some(path) => Tuning::from_path(path)
            .with_context(|| format!("loading tuning from {}", path.display()))?,
        None => Tuning::builtin(),
    };

    let mut world = match &args.load {
        Some(path) => {
            let snapshot = WorldSnapshot::read_from(path)
                .with_context(|| format!("loading snapshot {}", path.display()))?;
            World::from_snapshot(snapshot, tuning).context("restoring world")?
        }
        None => {
            let params = GenerationParams {
                seed: args.seed,
                dimensions: args.dimensions,
                star_distance: args.star_distance,
                rotation: args.rotation,
                preset: args.preset,
                ..GenerationParams::default()
            };
            new_world(params, tuning)?
        }
    };

    for _ in 0..args.turns {
        let report = world.advance_turn();
        tracing::debug!(
            target: "planetsim::climate",
            turn = world.turn(),
            iterations = report.iterations,
            converged = report.converged,
            "climate.turn"
        );
    }
    tracing::info!(
        target: "planetsim::climate",
        pressure = world.get_parameter(GlobalParameterKind::Pressure),
        "climate.summary"
    );

    if let Some(path) = &args.snapshot {
        world
            .snapshot()
            .write_to(path)
            .with_context(|| format!("writing snapshot {}", path.display()))?;
    }
    if let Some(dir) = &args.export {
        export_world(&world, dir)?;
    }

    let summary = Summary::of(&world);
    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        "text" => summary.print_text(),
        other => return Err(anyhow!("unknown output format `{other}`")),
    }
    Ok(())
}
