pub mod altitude;
pub mod features;
pub mod post_process;
pub mod smoothing;
pub mod soil_vegetation;
pub mod temperature;
pub mod water;
pub mod worm;
