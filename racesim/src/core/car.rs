use crate::error::{RaceSimError, Result};
use serde::{Deserialize, Serialize};

/// Team/car record as supplied by the game layer. Ratings are optional at the serde level so that
/// incomplete save data is reported as an invalid roster instead of a parse failure.
/// * `team` - Team name, referenced by the drivers
/// * `power` - Power unit rating (0-100)
/// * `aero` - Aerodynamic efficiency rating (0-100)
/// * `reliability` - Reliability rating (0-100)
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CarPars {
    pub team: String,
    pub power: Option<f64>,
    pub aero: Option<f64>,
    pub reliability: Option<f64>,
}

/// Validated car ratings, read-only for the duration of a race.
#[derive(Debug, Clone, PartialEq)]
pub struct Car {
    pub team: String,
    pub power: f64,
    pub aero: f64,
    pub reliability: f64,
}

/// check_rating ensures that a rating is present, finite and on the 0-100 scale. `owner` is the
/// id reported in the error.
pub(crate) fn check_rating(value: Option<f64>, field: &str, owner: &str) -> Result<f64> {
    let value = value.ok_or_else(|| {
        RaceSimError::roster(owner, format!("missing required rating '{}'", field))
    })?;
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(RaceSimError::roster(
            owner,
            format!("rating '{}' = {} is outside [0, 100]", field, value),
        ));
    }
    Ok(value)
}

impl Car {
    pub fn new(car_pars: &CarPars) -> Result<Car> {
        let owner = format!("team {}", car_pars.team);
        Ok(Car {
            team: car_pars.team.to_owned(),
            power: check_rating(car_pars.power, "power", &owner)?,
            aero: check_rating(car_pars.aero, "aero", &owner)?,
            reliability: check_rating(car_pars.reliability, "reliability", &owner)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pars() -> CarPars {
        CarPars {
            team: "Williams".to_owned(),
            power: Some(84.0),
            aero: Some(78.0),
            reliability: Some(86.0),
        }
    }

    #[test]
    fn complete_pars_build_a_car() {
        let car = Car::new(&pars()).unwrap();
        assert_eq!(car.team, "Williams");
        assert_eq!(car.aero, 78.0);
    }

    #[test]
    fn missing_rating_is_rejected() {
        let mut p = pars();
        p.reliability = None;
        let err = Car::new(&p).unwrap_err();
        assert!(matches!(err, RaceSimError::InvalidDriverRoster { .. }));
        assert!(err.to_string().contains("reliability"));
    }

    #[test]
    fn out_of_range_rating_is_rejected() {
        let mut p = pars();
        p.power = Some(120.0);
        assert!(Car::new(&p).is_err());
        p.power = Some(f64::NAN);
        assert!(Car::new(&p).is_err());
    }
}
