use planetsim_core::systems::post_process::radiation_loss;
use planetsim_core::{
    new_world, Coord, GenerationParams, GlobalParameterKind, OrbitalWorldView, ParameterKind,
    PlanetPreset, PlanetQuery, Tuning, World,
};

fn preset_world(preset: PlanetPreset) -> World {
    let params = GenerationParams {
        preset,
        ..GenerationParams::default()
    };
    World::new(params, Tuning::default()).expect("world")
}

fn fill(world: &mut World, temperature: i32, water: i32) {
    let n = world.dimensions();
    for y in 0..n {
        for x in 0..n {
            let c = Coord::new(x, y);
            world
                .set_location_parameter(c, ParameterKind::Temperature, temperature, false)
                .expect("temperature");
            world
                .set_location_parameter(c, ParameterKind::Water, water, false)
                .expect("water");
        }
    }
}

#[test]
fn earth_settles_on_its_target() {
    let mut w = new_world(GenerationParams::default(), Tuning::default()).expect("generate");
    let report = w.update_sky();
    assert!(report.converged, "{report:?}");
    assert!(report.iterations < w.tuning().equilibrium_max_iterations);
    let gap = (w.average_temperature() - report.target).abs();
    assert!(gap <= w.tuning().temperature_tolerance, "{report:?} gap {gap}");
}

#[test]
fn vacuum_leaves_the_default_sky() {
    let mut w = preset_world(PlanetPreset::Barren);
    assert_eq!(w.get_parameter(GlobalParameterKind::Pressure), 0.0);
    w.update_sky();
    assert_eq!(w.climate().sky_color, w.tuning().default_sky_color);
    assert_eq!(w.composition(GlobalParameterKind::Oxygen), 0.0);
    assert_eq!(w.cloud_cover(), 0.0);
}

#[test]
fn thick_air_hazes_over() {
    let mut w = preset_world(PlanetPreset::Venus);
    w.update_sky();
    assert!(w.climate().atmosphere_haze_alpha > 0.0);
    assert!(w.cloud_cover() > 0.0);
}

#[test]
fn cold_water_survives_radiation() {
    let mut w = preset_world(PlanetPreset::Earth);
    fill(&mut w, -6, 5);
    w.set_parameter(GlobalParameterKind::Radiation, 4.0).expect("radiation");
    w.set_parameter(GlobalParameterKind::MagneticField, 0.0).expect("field");

    assert_eq!(radiation_loss(&mut w), 0);
    assert_eq!(w.parameter_total(ParameterKind::Water), 5 * w.area() as i64);
}

#[test]
fn boiling_water_is_stripped() {
    let mut w = preset_world(PlanetPreset::Earth);
    fill(&mut w, 11, 5);
    w.set_parameter(GlobalParameterKind::Radiation, 4.0).expect("radiation");
    w.set_parameter(GlobalParameterKind::MagneticField, 0.0).expect("field");

    let units = 5 * w.area() as i64;
    let lost = radiation_loss(&mut w);
    let kept = w.parameter_total(ParameterKind::Water);
    assert_eq!(kept + lost, units);
    // About one unit in twelve survives.
    assert!((50..=140).contains(&kept), "kept {kept} of {units}");
}

#[test]
fn shielded_worlds_keep_their_water() {
    let mut w = preset_world(PlanetPreset::Earth);
    fill(&mut w, 11, 5);
    w.set_parameter(GlobalParameterKind::Radiation, 4.0).expect("radiation");
    w.set_parameter(GlobalParameterKind::MagneticField, 4.0).expect("field");
    assert_eq!(radiation_loss(&mut w), 0);
}

#[test]
fn adding_oxygen_to_mars_counts_as_terraforming() {
    let mut w = preset_world(PlanetPreset::Mars);
    assert_eq!(w.terraforming_progress(), 0.0);
    let boost = 0.1 * w.ideal_pressure();
    w.change_parameter(GlobalParameterKind::Oxygen, boost).expect("oxygen");
    w.advance_turn();
    assert!(w.terraforming_progress() > 0.0);
    assert!(w.terraforming_progress() <= 1.0);
}

#[test]
fn orbit_forwards_parameter_changes() {
    let mut w = preset_world(PlanetPreset::Earth);
    let before = w.get_parameter(GlobalParameterKind::Pressure);
    let mut orbit = OrbitalWorldView::new(&mut w);
    orbit
        .change_parameter(GlobalParameterKind::Ghg, 10.0)
        .expect("ghg");
    let seen = orbit.get_parameter(GlobalParameterKind::Pressure);
    assert!((seen - before - 10.0).abs() < 0.1);
    assert!((w.get_parameter(GlobalParameterKind::Pressure) - seen).abs() < 1e-9);
}
