use crate::core::attributes::{base_lap_time, composite_score};
use crate::core::car::{check_rating, Car};
use crate::core::circuit::Circuit;
use crate::core::events::RetirementReason;
use crate::core::tireset::{Compound, TyreState};
use crate::error::{RaceSimError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// * `id` - Driver id, e.g. VER
/// * `name` - Driver name, e.g. Max Verstappen
/// * `team` - Team name, must match a car record
/// * `skill` - Driver skill rating (0-100)
/// * `consistency` - Lap-to-lap consistency (0-1), 1 means no lap time scatter
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DriverPars {
    pub id: String,
    pub name: String,
    pub team: String,
    pub skill: Option<f64>,
    #[serde(default = "default_consistency")]
    pub consistency: f64,
}

fn default_consistency() -> f64 {
    0.85
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Running,
    Pitted,
    Retired,
    Finished,
}

impl DriverStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, DriverStatus::Retired | DriverStatus::Finished)
    }

    /// running <-> pitted, and both may end in retired or finished.
    pub fn can_transition_to(self, next: DriverStatus) -> bool {
        use DriverStatus::*;
        matches!(
            (self, next),
            (Running, Pitted) | (Pitted, Running) | (Running | Pitted, Retired) | (Running | Pitted, Finished)
        )
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DriverStatus::Running => "running",
            DriverStatus::Pitted => "pitted",
            DriverStatus::Retired => "retired",
            DriverStatus::Finished => "finished",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Retirement {
    pub reason: RetirementReason,
    pub lap: u32,
}

/// Strategy bookkeeping: the chosen circuit preset and the preset stint currently driven.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActiveStrategy {
    pub preset: usize,
    pub stint: usize,
}

/// Per-race driver record, mutated every lap by the race loop until it reaches a terminal status.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Driver {
    pub id: String,
    pub name: String,
    pub team: String,
    pub skill: f64,
    pub consistency: f64,
    pub reliability: f64,
    pub score: f64,
    pub t_lap_base: f64,
    pub grid_position: u32,
    pub tyre: TyreState,
    pub total_time: f64,
    pub status: DriverStatus,
    pub retirement: Option<Retirement>,
    pub laps_completed: u32,
    pub laptimes: Vec<f64>,
    pub fastest_lap: Option<f64>,
    pub pit_stops: u32,
    pub strategy: ActiveStrategy,
}

impl Driver {
    /// new validates the driver ratings and derives the composite score and base lap time for
    /// the given circuit. Grid slot, tyres and strategy are assigned by the race afterwards.
    pub fn new(driver_pars: &DriverPars, car: &Car, circuit: &Circuit, pace_spread: f64) -> Result<Driver> {
        let skill = check_rating(driver_pars.skill, "skill", &driver_pars.id)?;
        if !(0.0..=1.0).contains(&driver_pars.consistency) {
            return Err(RaceSimError::roster(
                &driver_pars.id,
                format!("consistency {} is outside [0, 1]", driver_pars.consistency),
            ));
        }

        let score = composite_score(skill, car, &circuit.weights);

        Ok(Driver {
            id: driver_pars.id.to_owned(),
            name: driver_pars.name.to_owned(),
            team: driver_pars.team.to_owned(),
            skill,
            consistency: driver_pars.consistency,
            reliability: car.reliability,
            score,
            t_lap_base: base_lap_time(score, circuit.t_lap_base, pace_spread),
            grid_position: 0,
            tyre: TyreState::new(Compound::Medium),
            total_time: 0.0,
            status: DriverStatus::Running,
            retirement: None,
            laps_completed: 0,
            laptimes: Vec::with_capacity(circuit.tot_no_laps as usize),
            fastest_lap: None,
            pit_stops: 0,
            strategy: ActiveStrategy::default(),
        })
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    fn set_status(&mut self, next: DriverStatus) {
        debug_assert!(
            self.status.can_transition_to(next),
            "illegal status transition {} -> {}",
            self.status,
            next
        );
        if self.status.can_transition_to(next) {
            self.status = next;
        }
    }

    /// Returns a driver that pitted on the previous lap to the track.
    pub fn rejoin(&mut self) {
        if self.status == DriverStatus::Pitted {
            self.set_status(DriverStatus::Running);
        }
    }

    /// pit fits a fresh set. The pit-lane loss is part of the lap time booked by complete_lap.
    /// Only a slick-to-slick stop ends a preset stint, crossover stops keep the plan where it is.
    pub fn pit(&mut self, compound: Compound) {
        if !self.tyre.compound.is_wet_class() && !compound.is_wet_class() {
            self.strategy.stint += 1;
        }
        self.tyre = self.tyre.pit(compound);
        self.pit_stops += 1;
        self.set_status(DriverStatus::Pitted);
    }

    pub fn complete_lap(&mut self, laptime: f64) {
        self.total_time += laptime;
        self.laps_completed += 1;
        self.laptimes.push(laptime);
        self.fastest_lap = Some(match self.fastest_lap {
            Some(best) if best <= laptime => best,
            _ => laptime,
        });
    }

    pub fn retire(&mut self, reason: RetirementReason, lap: u32) {
        self.retirement = Some(Retirement { reason, lap });
        self.set_status(DriverStatus::Retired);
    }

    pub fn finish(&mut self) {
        self.set_status(DriverStatus::Finished);
    }
}
