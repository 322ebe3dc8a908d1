use crate::core::attributes::ScoringWeights;
use crate::core::events::{EventPars, WeatherCondition};
use crate::core::tireset::TyreModel;
use crate::error::{RaceSimError, Result};
use serde::{Deserialize, Serialize};

/// Tunable constants of the simulation. Every field has a default, so a constants file only has
/// to list the values it changes.
///
/// * `pace_spread` - Lap time spread between a 0- and a 100-rated package (fraction of base lap)
/// * `lap_noise_scale` - (s) Noise standard deviation of a driver with consistency 0
/// * `damp_pace_factor` / `wet_pace_factor` - Lap time multipliers per condition
/// * `wrong_tyre_penalty` - (s) Lap time loss on a compound not suited to the condition
/// * `sc_pace_factor` - Lap time floor under safety car relative to the base lap time
/// * `sc_tyre_wear_factor` - Wear multiplier under safety car
/// * `sc_pit_window` - Fraction of a wear threshold above which a stop is brought forward under SC
/// * `wet_wear_threshold` - Wear at which worn intermediates/wets are replaced
/// * `emergency_min_laps_left` - Remaining laps required for a puncture-avoidance stop
/// * `puncture_time_cost` - (s) Expected cost of a puncture used in the preset projection
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SimConstants {
    pub pace_spread: f64,
    pub lap_noise_scale: f64,
    pub damp_pace_factor: f64,
    pub wet_pace_factor: f64,
    pub wrong_tyre_penalty: f64,
    pub sc_pace_factor: f64,
    pub sc_tyre_wear_factor: f64,
    pub sc_pit_window: f64,
    pub wet_wear_threshold: f64,
    pub emergency_min_laps_left: u32,
    pub puncture_time_cost: f64,
    pub tyre_model: TyreModel,
    pub scoring: ScoringWeights,
    pub events: EventPars,
}

impl Default for SimConstants {
    fn default() -> Self {
        SimConstants {
            pace_spread: 0.05,
            lap_noise_scale: 1.5,
            damp_pace_factor: 1.07,
            wet_pace_factor: 1.15,
            wrong_tyre_penalty: 12.0,
            sc_pace_factor: 1.4,
            sc_tyre_wear_factor: 0.5,
            sc_pit_window: 0.75,
            wet_wear_threshold: 0.7,
            emergency_min_laps_left: 3,
            puncture_time_cost: 60.0,
            tyre_model: TyreModel::default(),
            scoring: ScoringWeights::default(),
            events: EventPars::default(),
        }
    }
}

impl SimConstants {
    pub fn weather_pace_factor(&self, weather: WeatherCondition) -> f64 {
        match weather {
            WeatherCondition::Dry => 1.0,
            WeatherCondition::Damp => self.damp_pace_factor,
            WeatherCondition::Wet => self.wet_pace_factor,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("pace_spread", self.pace_spread),
            ("lap_noise_scale", self.lap_noise_scale),
            ("wrong_tyre_penalty", self.wrong_tyre_penalty),
            ("sc_tyre_wear_factor", self.sc_tyre_wear_factor),
            ("puncture_time_cost", self.puncture_time_cost),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(RaceSimError::InvalidConstants(format!("{} must not be negative", field)));
            }
        }
        for (field, value) in [
            ("damp_pace_factor", self.damp_pace_factor),
            ("wet_pace_factor", self.wet_pace_factor),
            ("sc_pace_factor", self.sc_pace_factor),
        ] {
            if !(value.is_finite() && value >= 1.0) {
                return Err(RaceSimError::InvalidConstants(format!("{} must be at least 1.0", field)));
            }
        }
        for (field, value) in [
            ("sc_pit_window", self.sc_pit_window),
            ("wet_wear_threshold", self.wet_wear_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(RaceSimError::InvalidConstants(format!("{} must lie in (0, 1]", field)));
            }
        }

        self.tyre_model.validate().map_err(RaceSimError::InvalidConstants)?;
        self.scoring.validate().map_err(RaceSimError::InvalidConstants)?;
        self.events.validate().map_err(RaceSimError::InvalidConstants)?;
        Ok(())
    }
}
