use crate::location::ParameterKind;
use crate::systems::worm::{run_worm, scaled_length, Worm};
use crate::world::World;

/// Soil only forms on presets that carry it: a thin base layer on thawed,
/// shallow ground, thickened by worms.
pub fn run_soil(world: &mut World) {
    if !world.params().preset.defaults().soil {
        return;
    }
    let tuning = world.tuning().clone();
    for idx in 0..world.area() {
        let location = world.loc(idx);
        let thawed = !location.is_frozen(&tuning);
        let shallow = location.get(ParameterKind::Water) < tuning.deadly_water_level;
        if thawed && shallow {
            world.set_at(idx, ParameterKind::Soil, 1, false);
        }
    }

    let min_length = scaled_length(world, tuning.soil_worm_min_length);
    let max_length = scaled_length(world, tuning.soil_worm_max_length);
    for _ in 0..tuning.soil_worm_count {
        let worm = Worm::additive(ParameterKind::Soil, 1, tuning.soil_worm_bound)
            .with_length(min_length, max_length);
        run_worm(world, &worm);
    }
}

/// Plants grow where water is liquid and neither absent nor deep; high
/// ground loses a step.
pub fn vegetation_for(soil: i32, water: i32, altitude: i32, liquid: bool) -> i32 {
    if !liquid || !(1..=3).contains(&water) {
        return 0;
    }
    ((soil + water) / 2 - i32::from(altitude >= 4)).clamp(0, 5)
}

pub fn run_vegetation(world: &mut World) {
    if !world.params().preset.defaults().vegetation {
        return;
    }
    let freezing = world.tuning().freezing_point;
    let boiling = world.tuning().boiling_point;
    for idx in 0..world.area() {
        let location = world.loc(idx);
        let temperature = f64::from(location.get(ParameterKind::Temperature));
        let value = vegetation_for(
            location.get(ParameterKind::Soil),
            location.get(ParameterKind::Water),
            location.get(ParameterKind::Altitude),
            temperature >= freezing && temperature < boiling,
        );
        world.set_at(idx, ParameterKind::Vegetation, value, false);
    }
}
