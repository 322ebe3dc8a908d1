use crate::core::events::WeatherCondition;
use helpers::general::{is_non_decreasing, lin_interp};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Compound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
}

impl Compound {
    pub const ALL: [Compound; 5] = [
        Compound::Soft,
        Compound::Medium,
        Compound::Hard,
        Compound::Intermediate,
        Compound::Wet,
    ];

    /// Intermediates and full wets form the wet class, everything else is a slick.
    pub fn is_wet_class(self) -> bool {
        matches!(self, Compound::Intermediate | Compound::Wet)
    }

    /// Compounds permitted per condition: slicks in the dry, intermediates when damp,
    /// intermediates or full wets when wet.
    pub fn is_legal_for(self, weather: WeatherCondition) -> bool {
        match weather {
            WeatherCondition::Dry => !self.is_wet_class(),
            WeatherCondition::Damp => self == Compound::Intermediate,
            WeatherCondition::Wet => self.is_wet_class(),
        }
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Compound::Soft => "soft",
            Compound::Medium => "medium",
            Compound::Hard => "hard",
            Compound::Intermediate => "intermediate",
            Compound::Wet => "wet",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Compound {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "soft" | "s" => Ok(Compound::Soft),
            "medium" | "m" => Ok(Compound::Medium),
            "hard" | "h" => Ok(Compound::Hard),
            "intermediate" | "inter" | "i" => Ok(Compound::Intermediate),
            "wet" | "w" => Ok(Compound::Wet),
            other => Err(format!("unknown compound '{}'", other)),
        }
    }
}

/// Tyre state of a single driver.
///
/// * `compound` - Fitted compound
/// * `wear` - Accumulated wear fraction in [0.0, 1.0], only reset by a pit stop
/// * `laps_on_tyre` - Laps driven on the current set
/// * `crossover_pending` - Set after a dry/wet class change, consumed by the first lap on the new set
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TyreState {
    pub compound: Compound,
    pub wear: f64,
    pub laps_on_tyre: u32,
    pub crossover_pending: bool,
}

impl TyreState {
    pub fn new(compound: Compound) -> TyreState {
        TyreState {
            compound,
            wear: 0.0,
            laps_on_tyre: 0,
            crossover_pending: false,
        }
    }

    /// pit returns the state after fitting a fresh set of `new_compound`. The pit-lane time loss
    /// is booked by the race loop, which owns the cumulative race time.
    pub fn pit(&self, new_compound: Compound) -> TyreState {
        TyreState {
            compound: new_compound,
            wear: 0.0,
            laps_on_tyre: 0,
            crossover_pending: self.compound.is_wet_class() != new_compound.is_wet_class(),
        }
    }
}

/// * `base_wear_per_lap` - Wear fraction added per lap at a pace factor of 1.0
/// * `warmup_laps` - Number of laps on a new set that carry the warm-up penalty
/// * `warmup_penalty` - (s) Lap time loss while the set is warming up
/// * `pace_offset` - (s) Constant pace delta of the compound (negative for faster compounds)
/// * `degradation_curve` - [wear, penalty (s)] points, interpolated linearly
/// * `puncture_risk_wear` - Wear above which punctures become possible
/// * `puncture_onset_probability` - Per-lap puncture probability right at the risk threshold
/// * `puncture_max_probability` - Per-lap puncture probability at a fully worn set
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TyreCompoundConfig {
    pub base_wear_per_lap: f64,
    pub warmup_laps: u32,
    pub warmup_penalty: f64,
    pub pace_offset: f64,
    pub degradation_curve: Vec<[f64; 2]>,
    pub puncture_risk_wear: f64,
    pub puncture_onset_probability: f64,
    pub puncture_max_probability: f64,
}

fn default_curve(scale: f64) -> Vec<[f64; 2]> {
    [
        [0.0, 0.0],
        [0.3, 0.25],
        [0.55, 0.8],
        [0.75, 1.8],
        [0.9, 3.5],
        [1.0, 6.0],
    ]
    .iter()
    .map(|p| [p[0], p[1] * scale])
    .collect()
}

fn default_crossover_penalty() -> f64 {
    1.5
}

/// Compound catalogue plus the dry/wet crossover transient.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TyreModel {
    pub soft: TyreCompoundConfig,
    pub medium: TyreCompoundConfig,
    pub hard: TyreCompoundConfig,
    pub intermediate: TyreCompoundConfig,
    pub wet: TyreCompoundConfig,
    #[serde(default = "default_crossover_penalty")]
    pub crossover_penalty: f64,
}

impl Default for TyreModel {
    fn default() -> Self {
        TyreModel {
            soft: TyreCompoundConfig {
                base_wear_per_lap: 0.045,
                warmup_laps: 1,
                warmup_penalty: 0.5,
                pace_offset: -0.8,
                degradation_curve: default_curve(1.2),
                puncture_risk_wear: 0.8,
                puncture_onset_probability: 0.01,
                puncture_max_probability: 0.12,
            },
            medium: TyreCompoundConfig {
                base_wear_per_lap: 0.03,
                warmup_laps: 1,
                warmup_penalty: 0.7,
                pace_offset: 0.0,
                degradation_curve: default_curve(1.0),
                puncture_risk_wear: 0.85,
                puncture_onset_probability: 0.01,
                puncture_max_probability: 0.1,
            },
            hard: TyreCompoundConfig {
                base_wear_per_lap: 0.02,
                warmup_laps: 2,
                warmup_penalty: 0.6,
                pace_offset: 0.5,
                degradation_curve: default_curve(0.9),
                puncture_risk_wear: 0.9,
                puncture_onset_probability: 0.01,
                puncture_max_probability: 0.08,
            },
            intermediate: TyreCompoundConfig {
                base_wear_per_lap: 0.035,
                warmup_laps: 1,
                warmup_penalty: 0.5,
                pace_offset: 0.0,
                degradation_curve: default_curve(1.0),
                puncture_risk_wear: 0.85,
                puncture_onset_probability: 0.01,
                puncture_max_probability: 0.1,
            },
            wet: TyreCompoundConfig {
                base_wear_per_lap: 0.025,
                warmup_laps: 1,
                warmup_penalty: 0.5,
                pace_offset: 0.0,
                degradation_curve: default_curve(0.9),
                puncture_risk_wear: 0.9,
                puncture_onset_probability: 0.01,
                puncture_max_probability: 0.08,
            },
            crossover_penalty: default_crossover_penalty(),
        }
    }
}

impl TyreModel {
    pub fn for_compound(&self, compound: Compound) -> &TyreCompoundConfig {
        match compound {
            Compound::Soft => &self.soft,
            Compound::Medium => &self.medium,
            Compound::Hard => &self.hard,
            Compound::Intermediate => &self.intermediate,
            Compound::Wet => &self.wet,
        }
    }

    /// The wear added by one lap on `compound` at the given pace factor.
    pub fn wear_per_lap(&self, compound: Compound, pace_factor: f64) -> f64 {
        (self.for_compound(compound).base_wear_per_lap * pace_factor).max(0.0)
    }

    /// advance_lap applies one lap of wear and returns `(lap_time_penalty, puncture_probability)`
    /// for that lap. `pace_factor` scales the wear rate (circuit stress, safety car).
    pub fn advance_lap(&self, tyre: &mut TyreState, pace_factor: f64) -> (f64, f64) {
        tyre.wear = (tyre.wear + self.wear_per_lap(tyre.compound, pace_factor)).min(1.0);
        tyre.laps_on_tyre += 1;

        let mut penalty = self.lap_penalty(tyre.compound, tyre.wear, tyre.laps_on_tyre);
        if tyre.crossover_pending {
            penalty += self.crossover_penalty;
            tyre.crossover_pending = false;
        }

        (penalty, self.puncture_probability(tyre.compound, tyre.wear))
    }

    /// lap_penalty returns the time loss of a lap driven at the given wear on the given lap of the
    /// stint: compound offset + interpolated degradation + warm-up.
    pub fn lap_penalty(&self, compound: Compound, wear: f64, laps_on_tyre: u32) -> f64 {
        let cfg = self.for_compound(compound);
        let (xp, fp): (Vec<f64>, Vec<f64>) = cfg.degradation_curve.iter().map(|p| (p[0], p[1])).unzip();

        let warmup = if laps_on_tyre <= cfg.warmup_laps {
            cfg.warmup_penalty
        } else {
            0.0
        };

        cfg.pace_offset + lin_interp(wear, &xp, &fp) + warmup
    }

    /// puncture_probability is zero below the risk threshold and rises linearly from the onset
    /// to the maximum probability between the threshold and a fully worn set.
    pub fn puncture_probability(&self, compound: Compound, wear: f64) -> f64 {
        let cfg = self.for_compound(compound);
        if wear < cfg.puncture_risk_wear {
            return 0.0;
        }
        let span = (1.0 - cfg.puncture_risk_wear).max(f64::EPSILON);
        let x = ((wear - cfg.puncture_risk_wear) / span).clamp(0.0, 1.0);
        cfg.puncture_onset_probability
            + (cfg.puncture_max_probability - cfg.puncture_onset_probability) * x
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        for compound in Compound::ALL.iter() {
            let cfg = self.for_compound(*compound);
            if !(cfg.base_wear_per_lap > 0.0 && cfg.base_wear_per_lap.is_finite()) {
                return Err(format!("{}: base_wear_per_lap must be positive", compound));
            }
            if cfg.degradation_curve.is_empty() {
                return Err(format!("{}: degradation curve is empty", compound));
            }
            let wears: Vec<f64> = cfg.degradation_curve.iter().map(|p| p[0]).collect();
            let penalties: Vec<f64> = cfg.degradation_curve.iter().map(|p| p[1]).collect();
            if !is_non_decreasing(&wears) || !is_non_decreasing(&penalties) {
                return Err(format!("{}: degradation curve must be non-decreasing", compound));
            }
            if !(0.0..=1.0).contains(&cfg.puncture_risk_wear) {
                return Err(format!("{}: puncture_risk_wear outside [0, 1]", compound));
            }
            let probs = [cfg.puncture_onset_probability, cfg.puncture_max_probability];
            if probs.iter().any(|p| !(0.0..=1.0).contains(p)) || probs[1] < probs[0] {
                return Err(format!("{}: invalid puncture probabilities", compound));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn soft_wears_faster_than_hard() {
        let model = TyreModel::default();
        let mut soft = TyreState::new(Compound::Soft);
        let mut hard = TyreState::new(Compound::Hard);
        for _ in 0..10 {
            model.advance_lap(&mut soft, 1.0);
            model.advance_lap(&mut hard, 1.0);
        }
        assert!(soft.wear > hard.wear);
        assert_eq!(soft.laps_on_tyre, 10);
    }

    #[test]
    fn wear_is_clamped_at_one() {
        let model = TyreModel::default();
        let mut tyre = TyreState::new(Compound::Soft);
        for _ in 0..100 {
            model.advance_lap(&mut tyre, 1.5);
        }
        assert_relative_eq!(tyre.wear, 1.0);
    }

    #[test]
    fn penalty_increases_with_wear() {
        let model = TyreModel::default();
        let mut prev = f64::NEG_INFINITY;
        for step in 0..=20 {
            let wear = step as f64 / 20.0;
            let penalty = model.lap_penalty(Compound::Medium, wear, 10);
            assert!(penalty >= prev);
            prev = penalty;
        }
    }

    #[test]
    fn puncture_risk_only_above_threshold() {
        let model = TyreModel::default();
        let thr = model.medium.puncture_risk_wear;
        assert_eq!(model.puncture_probability(Compound::Medium, thr - 0.01), 0.0);
        let at = model.puncture_probability(Compound::Medium, thr);
        let worn = model.puncture_probability(Compound::Medium, 1.0);
        assert!(at > 0.0);
        assert_relative_eq!(worn, model.medium.puncture_max_probability);
    }

    #[test]
    fn pit_resets_wear_and_flags_crossover() {
        let model = TyreModel::default();
        let mut tyre = TyreState::new(Compound::Medium);
        for _ in 0..5 {
            model.advance_lap(&mut tyre, 1.0);
        }
        let same_class = tyre.pit(Compound::Hard);
        assert_eq!(same_class.wear, 0.0);
        assert_eq!(same_class.laps_on_tyre, 0);
        assert!(!same_class.crossover_pending);

        let mut inters = tyre.pit(Compound::Intermediate);
        assert!(inters.crossover_pending);

        let mut reference = TyreState::new(Compound::Intermediate);
        let (with_crossover, _) = model.advance_lap(&mut inters, 1.0);
        let (without, _) = model.advance_lap(&mut reference, 1.0);
        assert_relative_eq!(with_crossover - without, model.crossover_penalty);
        assert!(!inters.crossover_pending);
    }

    #[test]
    fn legality_table() {
        assert!(Compound::Soft.is_legal_for(WeatherCondition::Dry));
        assert!(!Compound::Soft.is_legal_for(WeatherCondition::Damp));
        assert!(Compound::Intermediate.is_legal_for(WeatherCondition::Damp));
        assert!(!Compound::Wet.is_legal_for(WeatherCondition::Damp));
        assert!(Compound::Wet.is_legal_for(WeatherCondition::Wet));
        assert!(!Compound::Hard.is_legal_for(WeatherCondition::Wet));
    }

    #[test]
    fn default_model_is_valid() {
        assert!(TyreModel::default().validate().is_ok());
        let mut broken = TyreModel::default();
        broken.soft.degradation_curve = vec![[0.0, 1.0], [0.5, 0.5]];
        assert!(broken.validate().is_err());
    }

    #[test]
    fn compound_parses_from_short_names() {
        assert_eq!("M".parse::<Compound>(), Ok(Compound::Medium));
        assert_eq!("inter".parse::<Compound>(), Ok(Compound::Intermediate));
        assert!("slick".parse::<Compound>().is_err());
    }
}
