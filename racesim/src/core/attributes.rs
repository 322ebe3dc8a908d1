//! Composite performance scoring.
//!
//! Driver skill and car ratings share a 0-100 scale. The circuit decides how much each of them
//! matters through a [`WeightProfile`]; the profile is looked up by circuit kind in the
//! [`ScoringWeights`] table unless the circuit brings its own.

use crate::core::car::Car;
use crate::core::circuit::CircuitKind;
use serde::{Deserialize, Serialize};

/// Non-negative weights of the rating components. Skill is weighted by `track_position`: the
/// more a circuit rewards track position, the more the driver matters.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct WeightProfile {
    pub track_position: f64,
    pub power: f64,
    pub aero: f64,
    pub reliability: f64,
}

impl WeightProfile {
    pub fn sum(&self) -> f64 {
        self.track_position + self.power + self.aero + self.reliability
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        let ws = [self.track_position, self.power, self.aero, self.reliability];
        if ws.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("weights must be finite and non-negative".to_owned());
        }
        if self.sum() <= 0.0 {
            return Err("at least one weight must be positive".to_owned());
        }
        Ok(())
    }
}

/// Weight table per circuit kind.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ScoringWeights {
    pub street: WeightProfile,
    pub high_speed: WeightProfile,
    pub high_downforce: WeightProfile,
    pub balanced: WeightProfile,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights {
            street: WeightProfile {
                track_position: 0.55,
                power: 0.15,
                aero: 0.25,
                reliability: 0.05,
            },
            high_speed: WeightProfile {
                track_position: 0.25,
                power: 0.5,
                aero: 0.2,
                reliability: 0.05,
            },
            high_downforce: WeightProfile {
                track_position: 0.25,
                power: 0.2,
                aero: 0.5,
                reliability: 0.05,
            },
            balanced: WeightProfile {
                track_position: 0.35,
                power: 0.3,
                aero: 0.3,
                reliability: 0.05,
            },
        }
    }
}

impl ScoringWeights {
    pub fn for_kind(&self, kind: CircuitKind) -> &WeightProfile {
        match kind {
            CircuitKind::Street => &self.street,
            CircuitKind::HighSpeed => &self.high_speed,
            CircuitKind::HighDownforce => &self.high_downforce,
            CircuitKind::Balanced => &self.balanced,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        for (name, profile) in [
            ("street", &self.street),
            ("high_speed", &self.high_speed),
            ("high_downforce", &self.high_downforce),
            ("balanced", &self.balanced),
        ] {
            profile.validate().map_err(|e| format!("{} weights: {}", name, e))?;
        }
        Ok(())
    }
}

/// composite_score returns the weighted mean of skill and car ratings (0-100 scale).
pub fn composite_score(skill: f64, car: &Car, weights: &WeightProfile) -> f64 {
    let weighted = weights.track_position * skill
        + weights.power * car.power
        + weights.aero * car.aero
        + weights.reliability * car.reliability;
    weighted / weights.sum()
}

/// base_lap_time converts a composite score into the undisturbed lap time: a 100-rated package
/// laps at `ref_lap_time`, every point below adds `pace_spread` percent.
pub fn base_lap_time(score: f64, ref_lap_time: f64, pace_spread: f64) -> f64 {
    ref_lap_time * (1.0 + pace_spread * (100.0 - score) / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn car(power: f64, aero: f64, reliability: f64) -> Car {
        Car {
            team: "Test".to_owned(),
            power,
            aero,
            reliability,
        }
    }

    #[test]
    fn circuit_kind_changes_ranking() {
        let weights = ScoringWeights::default();
        let power_car = car(95.0, 75.0, 90.0);
        let aero_car = car(75.0, 95.0, 90.0);

        let monza = weights.for_kind(CircuitKind::HighSpeed);
        let suzuka = weights.for_kind(CircuitKind::HighDownforce);
        assert!(composite_score(80.0, &power_car, monza) > composite_score(80.0, &aero_car, monza));
        assert!(composite_score(80.0, &aero_car, suzuka) > composite_score(80.0, &power_car, suzuka));
    }

    #[test]
    fn street_circuits_favour_the_driver() {
        let weights = ScoringWeights::default();
        let street = weights.for_kind(CircuitKind::Street);
        let fast = weights.for_kind(CircuitKind::HighSpeed);
        let c = car(80.0, 80.0, 80.0);
        let gain_street = composite_score(95.0, &c, street) - composite_score(75.0, &c, street);
        let gain_fast = composite_score(95.0, &c, fast) - composite_score(75.0, &c, fast);
        assert!(gain_street > gain_fast);
    }

    #[test]
    fn uniform_ratings_give_same_score() {
        let weights = ScoringWeights::default();
        let c = car(70.0, 70.0, 70.0);
        for kind in [
            CircuitKind::Street,
            CircuitKind::HighSpeed,
            CircuitKind::HighDownforce,
            CircuitKind::Balanced,
        ] {
            assert_relative_eq!(composite_score(70.0, &c, weights.for_kind(kind)), 70.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn better_score_means_faster_lap() {
        assert_relative_eq!(base_lap_time(100.0, 80.0, 0.05), 80.0);
        assert!(base_lap_time(90.0, 80.0, 0.05) < base_lap_time(80.0, 80.0, 0.05));
    }

    #[test]
    fn default_weights_are_valid() {
        assert!(ScoringWeights::default().validate().is_ok());
        let mut w = ScoringWeights::default();
        w.street.power = -0.1;
        assert!(w.validate().is_err());
    }

    proptest! {
        #[test]
        fn composite_score_is_monotonic(
            skill in 0.0f64..100.0,
            power in 0.0f64..100.0,
            aero in 0.0f64..100.0,
            reliability in 0.0f64..100.0,
            bump in 0.0f64..20.0,
            component in 0usize..4,
        ) {
            let weights = ScoringWeights::default();
            let profile = weights.for_kind(CircuitKind::Balanced);
            let before = composite_score(skill, &car(power, aero, reliability), profile);

            let mut r = [skill, power, aero, reliability];
            r[component] += bump;
            let after = composite_score(r[0], &car(r[1], r[2], r[3]), profile);

            prop_assert!(after >= before - 1e-12);
        }
    }
}
