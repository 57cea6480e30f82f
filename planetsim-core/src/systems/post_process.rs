use crate::location::ParameterKind;
use crate::world::World;

pub fn run(world: &mut World) {
    let evaporated = low_pressure_loss(world);
    let stripped = radiation_loss(world);
    tracing::info!(
        target: "planetsim::worldgen",
        evaporated,
        stripped,
        "worldgen.post_process.water_lost"
    );
}

/// Below the pressure floor every unfrozen cell dries out. Returns units lost.
pub fn low_pressure_loss(world: &mut World) -> i64 {
    if world.pressure_ratio(None) >= world.tuning().low_pressure_water_loss_ratio {
        return 0;
    }
    let freezing = world.tuning().freezing_point;
    let mut lost = 0i64;
    for idx in 0..world.area() {
        let water = world.value_at(idx, ParameterKind::Water);
        let temperature = f64::from(world.value_at(idx, ParameterKind::Temperature));
        if water > 0 && temperature >= freezing {
            world.set_at(idx, ParameterKind::Water, 0, false);
            lost += i64::from(water);
        }
    }
    lost
}

/// Chance one unit of water survives a radiation pass. `effect` is
/// radiation minus magnetic field.
pub fn retention_probability(effect: f64, temperature: f64, freezing: f64, boiling: f64) -> f64 {
    if effect <= 0.0 || temperature < freezing - 1.0 {
        1.0
    } else if temperature >= boiling {
        if effect >= 3.0 {
            1.0 / 12.0
        } else if effect >= 2.0 {
            1.0 / 3.0
        } else {
            2.0 / 3.0
        }
    } else if temperature < freezing {
        if effect >= 3.0 {
            2.0 / 3.0
        } else {
            1.0
        }
    } else if effect >= 3.0 {
        1.0 / 3.0
    } else if effect >= 2.0 {
        2.0 / 3.0
    } else {
        1.0
    }
}

/// Each unit is kept independently with [`retention_probability`].
/// Returns units lost.
pub fn radiation_loss(world: &mut World) -> i64 {
    let effect = world.net_radiation();
    if effect <= 0.0 {
        return 0;
    }
    let freezing = world.tuning().freezing_point;
    let boiling = world.tuning().boiling_point;
    let mut lost = 0i64;
    for idx in 0..world.area() {
        let water = world.value_at(idx, ParameterKind::Water);
        if water == 0 {
            continue;
        }
        let temperature = f64::from(world.value_at(idx, ParameterKind::Temperature));
        let keep = retention_probability(effect, temperature, freezing, boiling);
        if keep >= 1.0 {
            continue;
        }
        let mut retained = 0;
        for _ in 0..water {
            if world.rng.chance(keep) {
                retained += 1;
            }
        }
        if retained != water {
            world.set_at(idx, ParameterKind::Water, retained, false);
            lost += i64::from(water - retained);
        }
    }
    lost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{GenerationParams, PlanetPreset};
    use crate::tuning::Tuning;

    #[test]
    fn retention_tiers() {
        let (f, b) = (2.0, 10.0);
        assert_eq!(retention_probability(0.0, 11.0, f, b), 1.0);
        assert_eq!(retention_probability(4.0, -6.0, f, b), 1.0);
        assert_eq!(retention_probability(3.0, 10.0, f, b), 1.0 / 12.0);
        assert_eq!(retention_probability(2.0, 11.0, f, b), 1.0 / 3.0);
        assert_eq!(retention_probability(1.0, 11.0, f, b), 2.0 / 3.0);
        assert_eq!(retention_probability(3.0, 1.0, f, b), 2.0 / 3.0);
        assert_eq!(retention_probability(2.0, 1.0, f, b), 1.0);
        assert_eq!(retention_probability(3.0, 5.0, f, b), 1.0 / 3.0);
        assert_eq!(retention_probability(2.5, 5.0, f, b), 2.0 / 3.0);
        assert_eq!(retention_probability(1.0, 5.0, f, b), 1.0);
    }

    #[test]
    fn thin_air_boils_off_liquid_but_keeps_ice() {
        let params = GenerationParams {
            preset: PlanetPreset::Barren,
            ..GenerationParams::default()
        };
        let mut w = World::new(params, Tuning::default()).expect("world");
        w.set_at(0, ParameterKind::Temperature, 4, false);
        w.set_at(0, ParameterKind::Water, 3, false);
        w.set_at(1, ParameterKind::Temperature, -2, false);
        w.set_at(1, ParameterKind::Water, 3, false);
        assert_eq!(low_pressure_loss(&mut w), 3);
        assert_eq!(w.value_at(0, ParameterKind::Water), 0);
        assert_eq!(w.value_at(1, ParameterKind::Water), 3);
    }

    #[test]
    fn earth_pressure_keeps_water() {
        let mut w = World::new(GenerationParams::default(), Tuning::default()).expect("world");
        w.set_at(0, ParameterKind::Temperature, 4, false);
        w.set_at(0, ParameterKind::Water, 3, false);
        assert_eq!(low_pressure_loss(&mut w), 0);
    }
}
