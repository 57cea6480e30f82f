use crate::climate::{pressure_effect, EquilibriumReport};
use crate::world::{GlobalParameterKind, World};

impl World {
    /// Earth's pressure scaled to this world's surface area.
    pub fn ideal_pressure(&self) -> f64 {
        self.tuning.ideal_pressure(self.dimensions())
    }

    /// Total pressure (`None`) or one component's amount over the ideal.
    pub fn pressure_ratio(&self, component: Option<GlobalParameterKind>) -> f64 {
        let ideal = self.ideal_pressure();
        if ideal <= 0.0 {
            return 0.0;
        }
        let kind = component.unwrap_or(GlobalParameterKind::Pressure);
        self.get_parameter(kind) / ideal
    }

    /// Share of the total pressure held by `component`; zero in a vacuum.
    pub fn composition(&self, component: GlobalParameterKind) -> f64 {
        let pressure = self.get_parameter(GlobalParameterKind::Pressure);
        if pressure <= 0.0 {
            return 0.0;
        }
        self.get_parameter(component) / pressure
    }

    pub fn net_radiation(&self) -> f64 {
        self.get_parameter(GlobalParameterKind::Radiation)
            - self.get_parameter(GlobalParameterKind::MagneticField)
    }

    /// Summed distance of every component's pressure ratio from Earth's.
    pub(crate) fn atmosphere_offset(&self) -> f64 {
        GlobalParameterKind::ATMOSPHERE
            .iter()
            .map(|k| (self.pressure_ratio(Some(*k)) - self.tuning.earth_fraction(*k)).abs())
            .sum()
    }

    pub fn terraforming_progress(&self) -> f64 {
        let initial = self.climate.initial_atmosphere_offset;
        if initial < 1e-9 {
            return 1.0;
        }
        (1.0 - self.climate.current_atmosphere_offset / initial).clamp(0.0, 1.0)
    }

    pub(crate) fn refresh_clouds(&mut self, water_vapor: f64) {
        let tuning = &self.tuning;
        let pressure_ratio = self.pressure_ratio(None);

        let vapor_share = if tuning.earth_water_vapor > 0.0 {
            water_vapor / tuning.earth_water_vapor
        } else {
            0.0
        };
        self.climate.cloud_frequency = (tuning.earth_cloud_frequency
            * vapor_share
            * pressure_effect(pressure_ratio).min(1.0))
        .clamp(0.0, 1.0);

        let toxic = self.pressure_ratio(Some(GlobalParameterKind::ToxicGases));
        self.climate.toxic_cloud_frequency = if toxic > 0.0 {
            toxic / (toxic + tuning.toxic_cloud_scale)
        } else {
            0.0
        };

        self.climate.atmosphere_haze_alpha = ((pressure_ratio - 1.0)
            / tuning.haze_pressure_span)
            .clamp(0.0, tuning.max_haze_alpha);
    }

    /// Fraction of the sky blocked by clouds, toxic clouds and haze.
    pub fn cloud_cover(&self) -> f64 {
        (self.climate.cloud_frequency
            + self.climate.toxic_cloud_frequency
            + self.climate.atmosphere_haze_alpha)
            .min(1.0)
    }

    pub fn sky_color(&self) -> [u8; 3] {
        let tuning = &self.tuning;
        let base = tuning.default_sky_color;
        let alpha = self.pressure_ratio(None).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return base;
        }

        let palette = [
            (GlobalParameterKind::InertGases, tuning.inert_gas_color),
            (GlobalParameterKind::Oxygen, tuning.oxygen_color),
            (GlobalParameterKind::Ghg, tuning.ghg_color),
            (GlobalParameterKind::ToxicGases, tuning.toxic_gas_color),
        ];
        let mut mix = [0.0f64; 3];
        for (kind, color) in palette {
            let share = self.composition(kind);
            for (channel, value) in mix.iter_mut().zip(color) {
                *channel += share * f64::from(value);
            }
        }

        let mut out = base;
        for ((o, b), m) in out.iter_mut().zip(base).zip(mix) {
            let blended = f64::from(b) * (1.0 - alpha) + m * alpha;
            *o = blended.round().clamp(0.0, 255.0) as u8;
        }
        out
    }

    /// Per-turn recompute: equilibrium, then clouds and the sky colour.
    pub fn update_sky(&mut self) -> EquilibriumReport {
        let report = self.simulate_climate_equilibrium();
        let vapor = self.water_vapor();
        self.refresh_clouds(vapor);
        self.climate.current_atmosphere_offset = self.atmosphere_offset();
        self.climate.sky_color = self.sky_color();
        report
    }

    pub fn advance_turn(&mut self) -> EquilibriumReport {
        self.turn += 1;
        let report = self.update_sky();
        self.update_diagnostics();
        tracing::info!(
            target: "planetsim::climate",
            turn = self.turn,
            average = self.climate.average_temperature,
            target = report.target,
            converged = report.converged,
            "climate.turn"
        );
        report
    }
}
