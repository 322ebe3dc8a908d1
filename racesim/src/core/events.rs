//! Stochastic layer of the simulator.
//!
//! Every concern draws from its own ChaCha stream derived from the race seed, so that e.g. a
//! manual pit stop (which changes lap-time noise draws) never shifts the retirement or weather
//! sequence of the same seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fmt;

const STREAM_RETIREMENTS: u64 = 0;
const STREAM_SAFETY_CAR: u64 = 1;
const STREAM_WEATHER: u64 = 2;
const STREAM_PACE: u64 = 3;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Dry,
    Damp,
    Wet,
}

impl WeatherCondition {
    pub const ALL: [WeatherCondition; 3] = [
        WeatherCondition::Dry,
        WeatherCondition::Damp,
        WeatherCondition::Wet,
    ];

    pub fn index(self) -> usize {
        match self {
            WeatherCondition::Dry => 0,
            WeatherCondition::Damp => 1,
            WeatherCondition::Wet => 2,
        }
    }
}

impl Default for WeatherCondition {
    fn default() -> Self {
        WeatherCondition::Dry
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            WeatherCondition::Dry => "dry",
            WeatherCondition::Damp => "damp",
            WeatherCondition::Wet => "wet",
        };
        f.write_str(name)
    }
}

/// Per-circuit Markov weather model. `transitions[from][to]` is the per-lap probability of moving
/// from one condition to another, rows ordered dry, damp, wet.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WeatherProfile {
    #[serde(default)]
    pub initial: WeatherCondition,
    pub transitions: [[f64; 3]; 3],
}

impl Default for WeatherProfile {
    fn default() -> Self {
        WeatherProfile {
            initial: WeatherCondition::Dry,
            transitions: [
                [0.997, 0.003, 0.0],
                [0.08, 0.88, 0.04],
                [0.0, 0.06, 0.94],
            ],
        }
    }
}

impl WeatherProfile {
    pub(crate) fn validate(&self) -> Result<(), String> {
        for (i, row) in self.transitions.iter().enumerate() {
            if row.iter().any(|p| !(0.0..=1.0).contains(p)) {
                return Err(format!("weather transition row {} has a probability outside [0, 1]", i));
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > 1e-6 {
                return Err(format!("weather transition row {} sums to {:.4} instead of 1", i, sum));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RetirementReason {
    EngineFailure,
    GearboxFailure,
    HydraulicsFailure,
    SuspensionFailure,
    Crash,
    Puncture,
}

const MECHANICAL_REASONS: [RetirementReason; 4] = [
    RetirementReason::EngineFailure,
    RetirementReason::GearboxFailure,
    RetirementReason::HydraulicsFailure,
    RetirementReason::SuspensionFailure,
];

impl fmt::Display for RetirementReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            RetirementReason::EngineFailure => "Engine failure",
            RetirementReason::GearboxFailure => "Gearbox failure",
            RetirementReason::HydraulicsFailure => "Hydraulics failure",
            RetirementReason::SuspensionFailure => "Suspension failure",
            RetirementReason::Crash => "Crash",
            RetirementReason::Puncture => "Puncture",
        };
        f.write_str(text)
    }
}

/// Tuning of the incident model. Race probabilities are spread evenly over the laps of a race.
///
/// * `mechanical_base` - Per-race probability of a mechanical failure for a perfectly reliable car
/// * `mechanical_unreliability` - Additional per-race probability at reliability 0
/// * `crash_base` - Per-race crash probability of a perfect driver at an average circuit
/// * `crash_skill_scale` - Relative crash increase at skill 0
/// * `damp_crash_factor` / `wet_crash_factor` - Crash multipliers per condition
/// * `sc_base_probability` - Per-lap safety car probability without a trigger
/// * `sc_after_retirement_probability` - Safety car probability on a lap with a retirement
/// * `sc_high_incident_probability` - Safety car probability on circuit high-incident laps
/// * `sc_min_laps` / `sc_max_laps` - Safety car duration range (laps)
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EventPars {
    pub mechanical_base: f64,
    pub mechanical_unreliability: f64,
    pub crash_base: f64,
    pub crash_skill_scale: f64,
    pub damp_crash_factor: f64,
    pub wet_crash_factor: f64,
    pub sc_base_probability: f64,
    pub sc_after_retirement_probability: f64,
    pub sc_high_incident_probability: f64,
    pub sc_min_laps: u32,
    pub sc_max_laps: u32,
}

impl Default for EventPars {
    fn default() -> Self {
        EventPars {
            mechanical_base: 0.035,
            mechanical_unreliability: 0.6,
            crash_base: 0.03,
            crash_skill_scale: 1.0,
            damp_crash_factor: 1.6,
            wet_crash_factor: 2.2,
            sc_base_probability: 0.004,
            sc_after_retirement_probability: 0.45,
            sc_high_incident_probability: 0.12,
            sc_min_laps: 2,
            sc_max_laps: 5,
        }
    }
}

/// per_lap_probability converts a per-race probability into the constant per-lap probability
/// that yields the same chance of at least one occurrence over `laps` laps.
pub fn per_lap_probability(p_race: f64, laps: u32) -> f64 {
    let p_race = p_race.clamp(0.0, 1.0);
    if laps == 0 || p_race >= 1.0 {
        return p_race;
    }
    1.0 - (1.0 - p_race).powf(1.0 / laps as f64)
}

/// Per-lap retirement probabilities of one driver, by cause.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LapHazard {
    pub puncture: f64,
    pub mechanical: f64,
    pub crash: f64,
}

impl LapHazard {
    pub fn total(&self) -> f64 {
        (self.puncture + self.mechanical + self.crash).min(1.0)
    }
}

impl EventPars {
    /// lap_hazard maps reliability (0-100), skill (0-100), the circuit incident factor, the
    /// current weather and the tyre puncture probability onto per-lap retirement probabilities.
    /// Every component is non-increasing in reliability and skill.
    pub fn lap_hazard(
        &self,
        reliability: f64,
        skill: f64,
        incident_factor: f64,
        weather: WeatherCondition,
        tot_no_laps: u32,
        puncture: f64,
    ) -> LapHazard {
        let unreliability = 1.0 - (reliability / 100.0).clamp(0.0, 1.0);
        let mechanical_race = self.mechanical_base + self.mechanical_unreliability * unreliability;

        let weather_factor = match weather {
            WeatherCondition::Dry => 1.0,
            WeatherCondition::Damp => self.damp_crash_factor,
            WeatherCondition::Wet => self.wet_crash_factor,
        };
        let skill_gap = 1.0 - (skill / 100.0).clamp(0.0, 1.0);
        let crash_race = self.crash_base
            * incident_factor.max(0.0)
            * (1.0 + self.crash_skill_scale * skill_gap)
            * weather_factor;

        LapHazard {
            puncture: puncture.clamp(0.0, 1.0),
            mechanical: per_lap_probability(mechanical_race, tot_no_laps),
            crash: per_lap_probability(crash_race, tot_no_laps),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        let probs = [
            self.mechanical_base,
            self.crash_base,
            self.sc_base_probability,
            self.sc_after_retirement_probability,
            self.sc_high_incident_probability,
        ];
        if probs.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err("event probabilities must lie in [0, 1]".to_owned());
        }
        if self.mechanical_unreliability < 0.0 || self.crash_skill_scale < 0.0 {
            return Err("hazard scales must not be negative".to_owned());
        }
        if self.damp_crash_factor < 0.0 || self.wet_crash_factor < 0.0 {
            return Err("weather crash factors must not be negative".to_owned());
        }
        if self.sc_min_laps == 0 || self.sc_max_laps < self.sc_min_laps {
            return Err("safety car duration range is invalid".to_owned());
        }
        Ok(())
    }
}

/// Seeded source of all random outcomes of one race.
#[derive(Debug, Clone)]
pub struct EventGenerator {
    retirement_rng: ChaCha8Rng,
    safety_car_rng: ChaCha8Rng,
    weather_rng: ChaCha8Rng,
    pace_rng: ChaCha8Rng,
}

fn stream(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

impl EventGenerator {
    pub fn new(seed: u64) -> EventGenerator {
        EventGenerator {
            retirement_rng: stream(seed, STREAM_RETIREMENTS),
            safety_car_rng: stream(seed, STREAM_SAFETY_CAR),
            weather_rng: stream(seed, STREAM_WEATHER),
            pace_rng: stream(seed, STREAM_PACE),
        }
    }

    /// roll_retirement consumes exactly one draw. The unit interval is split into a puncture,
    /// a mechanical and a crash bucket; the position inside the mechanical bucket picks the
    /// failing component.
    pub fn roll_retirement(&mut self, hazard: &LapHazard) -> Option<RetirementReason> {
        let u: f64 = self.retirement_rng.gen();

        if u < hazard.puncture {
            return Some(RetirementReason::Puncture);
        }
        let mech_end = hazard.puncture + hazard.mechanical;
        if u < mech_end {
            let frac = (u - hazard.puncture) / hazard.mechanical;
            let idx = ((frac * MECHANICAL_REASONS.len() as f64) as usize).min(MECHANICAL_REASONS.len() - 1);
            return Some(MECHANICAL_REASONS[idx]);
        }
        if u < mech_end + hazard.crash {
            return Some(RetirementReason::Crash);
        }
        None
    }

    /// roll_safety_car returns the deployment length in laps, if a safety car is called.
    pub fn roll_safety_car(&mut self, probability: f64, pars: &EventPars) -> Option<u32> {
        let u: f64 = self.safety_car_rng.gen();
        if u < probability {
            Some(self.safety_car_rng.gen_range(pars.sc_min_laps..=pars.sc_max_laps))
        } else {
            None
        }
    }

    /// roll_weather performs one Markov step from `current`.
    pub fn roll_weather(&mut self, current: WeatherCondition, profile: &WeatherProfile) -> WeatherCondition {
        let u: f64 = self.weather_rng.gen();
        let row = &profile.transitions[current.index()];

        let mut acc = 0.0;
        for (i, p) in row.iter().enumerate() {
            acc += p;
            if u < acc {
                return WeatherCondition::ALL[i];
            }
        }
        current
    }

    /// lap_noise returns a normally distributed lap time deviation (s).
    pub fn lap_noise(&mut self, std_dev: f64) -> f64 {
        if std_dev > 0.0 {
            match Normal::new(0.0, std_dev) {
                Ok(normal) => normal.sample(&mut self.pace_rng),
                Err(_) => 0.0,
            }
        } else {
            0.0
        }
    }
}
