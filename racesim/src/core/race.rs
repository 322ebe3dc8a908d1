use crate::core::car::{Car, CarPars};
use crate::core::circuit::{Circuit, CircuitPars};
use crate::core::driver::{Driver, DriverPars, DriverStatus};
use crate::core::events::{EventGenerator, RetirementReason, WeatherCondition};
use crate::core::sim_constants::SimConstants;
use crate::core::strategy::{
    select_preset, DecisionContext, DefaultPolicy, ManualOverrides, PitDecider, StrategyDecision,
    StrategyOverride,
};
use crate::core::tireset::{Compound, TyreState};
use crate::error::{OverrideRejection, RaceSimError, Result};
use crate::post::race_result::RaceResult;
use helpers::general::{argsort, SortOrder};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, info, warn};

/// * `seed` - Seed of all random outcomes of the race
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct RacePars {
    pub seed: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RaceEventKind {
    Retirement {
        driver_id: String,
        reason: RetirementReason,
    },
    SafetyCarDeployed {
        laps: u32,
    },
    SafetyCarIn,
    WeatherChange {
        from: WeatherCondition,
        to: WeatherCondition,
    },
    PitStop {
        driver_id: String,
        compound: Compound,
        time_loss: f64,
    },
    OverrideRejected {
        driver_id: String,
        reason: String,
    },
}

/// Entry of the race event log. `lap` is the lap during which the event happened.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RaceEvent {
    pub lap: u32,
    pub event: RaceEventKind,
}

impl fmt::Display for RaceEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Lap {:3}: ", self.lap)?;
        match &self.event {
            RaceEventKind::Retirement { driver_id, reason } => {
                write!(f, "{} retired ({})", driver_id, reason)
            }
            RaceEventKind::SafetyCarDeployed { laps } => {
                write!(f, "Safety car deployed for {} laps", laps)
            }
            RaceEventKind::SafetyCarIn => write!(f, "Safety car in"),
            RaceEventKind::WeatherChange { from, to } => {
                write!(f, "Weather changed from {} to {}", from, to)
            }
            RaceEventKind::PitStop {
                driver_id,
                compound,
                time_loss,
            } => write!(f, "{} pitted for {} tyres ({:.1}s)", driver_id, compound, time_loss),
            RaceEventKind::OverrideRejected { driver_id, reason } => {
                write!(f, "Override for {} rejected: {}", driver_id, reason)
            }
        }
    }
}

/// Complete mutable state of a race.
///
/// * `cur_lap` - Number of laps simulated so far
/// * `weather` - Condition of the next lap to be simulated
/// * `weather_history` - Condition that was in force during each simulated lap
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RaceState {
    pub circuit_id: String,
    pub cur_lap: u32,
    pub tot_no_laps: u32,
    pub sc_active: bool,
    pub sc_laps_remaining: u32,
    pub weather: WeatherCondition,
    pub weather_history: Vec<WeatherCondition>,
    pub drivers: BTreeMap<String, Driver>,
    pub events: Vec<RaceEvent>,
}

impl RaceState {
    pub fn is_finished(&self) -> bool {
        self.cur_lap >= self.tot_no_laps
    }

    /// classification returns the drivers in race order. Drivers still in the race are sorted by
    /// laps completed and cumulative time (ties: grid position, id), retired drivers follow by
    /// laps completed, later retirement first, cumulative time and id. After the final lap this
    /// is the official result.
    pub fn classification(&self) -> Vec<&Driver> {
        let mut order: Vec<&Driver> = self.drivers.values().collect();
        order.sort_by(|a, b| {
            let a_out = a.status == DriverStatus::Retired;
            let b_out = b.status == DriverStatus::Retired;

            a_out
                .cmp(&b_out)
                .then_with(|| b.laps_completed.cmp(&a.laps_completed))
                .then_with(|| match (a.retirement, b.retirement) {
                    (Some(ra), Some(rb)) => rb.lap.cmp(&ra.lap),
                    _ => Ordering::Equal,
                })
                .then_with(|| a.total_time.total_cmp(&b.total_time))
                .then_with(|| {
                    if a_out {
                        Ordering::Equal
                    } else {
                        a.grid_position.cmp(&b.grid_position)
                    }
                })
                .then_with(|| a.id.cmp(&b.id))
        });
        order
    }

    pub fn no_retirements(&self) -> usize {
        self.drivers
            .values()
            .filter(|d| d.status == DriverStatus::Retired)
            .count()
    }
}

/// Lap-based race simulation. Owns the state, the random streams and the pit decider of one race.
#[derive(Debug)]
pub struct Race {
    seed: u64,
    circuit: Circuit,
    consts: SimConstants,
    event_gen: EventGenerator,
    decider: Box<dyn PitDecider>,
    state: RaceState,
}

impl Race {
    /// new validates all inputs and sets up the starting grid. Nothing is simulated yet.
    pub fn new(
        circuit_pars: &CircuitPars,
        driver_pars_all: &[DriverPars],
        car_pars_all: &[CarPars],
        consts: &SimConstants,
        seed: u64,
    ) -> Result<Race> {
        consts.validate()?;
        let circuit = Circuit::new(circuit_pars, &consts.scoring)?;

        if driver_pars_all.is_empty() {
            return Err(RaceSimError::roster("-", "the roster is empty"));
        }

        // create cars
        let mut cars: HashMap<&str, Car> = HashMap::with_capacity(car_pars_all.len());
        for car_pars in car_pars_all.iter() {
            let car = Car::new(car_pars)?;
            if cars.insert(car_pars.team.as_str(), car).is_some() {
                return Err(RaceSimError::roster(
                    &format!("team {}", car_pars.team),
                    "team is listed more than once",
                ));
            }
        }

        // create drivers
        let mut drivers = BTreeMap::new();
        for driver_pars in driver_pars_all.iter() {
            let car = cars.get(driver_pars.team.as_str()).ok_or_else(|| {
                RaceSimError::roster(
                    &driver_pars.id,
                    format!("unknown team '{}'", driver_pars.team),
                )
            })?;
            let driver = Driver::new(driver_pars, car, &circuit, consts.pace_spread)?;
            if drivers.insert(driver_pars.id.to_owned(), driver).is_some() {
                return Err(RaceSimError::roster(&driver_pars.id, "duplicate driver id"));
            }
        }

        // strategy and starting tyres
        let preset_idx = select_preset(&circuit, consts);
        let initial_weather = circuit.weather.initial;
        let start_compound = {
            let planned = circuit.preset(preset_idx).compound(0);
            if planned.is_legal_for(initial_weather) {
                planned
            } else if initial_weather == WeatherCondition::Damp {
                Compound::Intermediate
            } else {
                Compound::Wet
            }
        };

        // grid by composite score, equal scores keep id order
        let scores: Vec<f64> = drivers.values().map(|d: &Driver| d.score).collect();
        let grid_order = argsort(&scores, SortOrder::Descending);
        let mut grid_positions = vec![0u32; scores.len()];
        for (pos, idx) in grid_order.iter().enumerate() {
            grid_positions[*idx] = pos as u32 + 1;
        }

        for (driver, grid_position) in drivers.values_mut().zip(grid_positions) {
            driver.grid_position = grid_position;
            driver.tyre = TyreState::new(start_compound);
            driver.strategy.preset = preset_idx;
            driver.strategy.stint = 0;
        }

        info!(
            circuit = %circuit.id,
            seed,
            drivers = drivers.len(),
            preset = %circuit.preset(preset_idx).name,
            "race initialised"
        );

        let state = RaceState {
            circuit_id: circuit.id.to_owned(),
            cur_lap: 0,
            tot_no_laps: circuit.tot_no_laps,
            sc_active: false,
            sc_laps_remaining: 0,
            weather: initial_weather,
            weather_history: Vec::with_capacity(circuit.tot_no_laps as usize),
            drivers,
            events: vec![],
        };

        Ok(Race {
            seed,
            circuit,
            consts: consts.to_owned(),
            event_gen: EventGenerator::new(seed),
            decider: Box::new(ManualOverrides::new(DefaultPolicy)),
            state,
        })
    }

    /// with_decider replaces the pit decider. The default decider accepts manual overrides on top
    /// of the default policy.
    pub fn with_decider(mut self, decider: Box<dyn PitDecider>) -> Race {
        self.decider = decider;
        self
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// simulate_lap simulates the next lap, optionally applying a manual override first. A rejected
    /// override is logged and recorded, the lap is then simulated without it. Calling it after the
    /// final lap changes nothing.
    pub fn simulate_lap(&mut self, ovr: Option<StrategyOverride>) -> &RaceState {
        if self.state.is_finished() {
            return &self.state;
        }

        if let Some(ovr) = ovr {
            if let Err(err) = self.submit_override(&ovr) {
                warn!("{}", err);
                self.state.events.push(RaceEvent {
                    lap: self.state.cur_lap + 1,
                    event: RaceEventKind::OverrideRejected {
                        driver_id: ovr.driver_id().to_owned(),
                        reason: match err {
                            RaceSimError::IllegalStrategyOverride { reason, .. } => reason.to_string(),
                            other => other.to_string(),
                        },
                    },
                });
            }
        }

        self.state.cur_lap += 1;
        let lap = self.state.cur_lap;

        for driver in self.state.drivers.values_mut() {
            driver.rejoin();
        }

        let retired_this_lap = self.simulate_driver_laps(lap);
        self.handle_safety_car(lap, retired_this_lap);
        self.handle_weather(lap);

        if self.state.is_finished() {
            for driver in self.state.drivers.values_mut().filter(|d| d.is_active()) {
                driver.finish();
            }
            info!(circuit = %self.circuit.id, laps = lap, "race finished");
        }

        &self.state
    }

    /// submit_override validates an override against the current state and hands it to the
    /// decider. It takes effect on the next simulated lap.
    pub fn submit_override(&mut self, ovr: &StrategyOverride) -> Result<()> {
        let reject = |reason: OverrideRejection| RaceSimError::IllegalStrategyOverride {
            driver_id: ovr.driver_id().to_owned(),
            reason,
        };

        let driver = self
            .state
            .drivers
            .get(ovr.driver_id())
            .ok_or_else(|| reject(OverrideRejection::UnknownDriver))?;
        if driver.status.is_terminal() {
            return Err(reject(OverrideRejection::DriverNotRunning(driver.status)));
        }
        if let Some(compound) = ovr.compound() {
            if !compound.is_legal_for(self.state.weather) {
                return Err(reject(OverrideRejection::CompoundNotAllowed {
                    compound,
                    weather: self.state.weather,
                }));
            }
        }
        if !self.decider.accept_override(ovr, self.state.cur_lap + 1) {
            return Err(reject(OverrideRejection::NotAccepted));
        }

        info!(lap = self.state.cur_lap + 1, "override accepted: {:?}", ovr);
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------
    // RACE SIMULATOR PARTS ------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// simulate_driver_laps drives one lap for every driver still in the race and returns whether
    /// anyone retired.
    fn simulate_driver_laps(&mut self, lap: u32) -> bool {
        let circuit = &self.circuit;
        let consts = &self.consts;
        let event_gen = &mut self.event_gen;
        let decider = &mut self.decider;
        let weather = self.state.weather;
        let sc_active = self.state.sc_active;
        let tot_no_laps = self.state.tot_no_laps;

        let wear_factor = circuit.tyre_stress.multiplier()
            * if sc_active {
                consts.sc_tyre_wear_factor
            } else {
                1.0
            };

        let mut new_events = vec![];

        for driver in self.state.drivers.values_mut().filter(|d| d.is_active()) {
            // tyres
            let (tyre_penalty, puncture) = consts.tyre_model.advance_lap(&mut driver.tyre, wear_factor);

            // lap time
            let mut laptime = driver.t_lap_base * consts.weather_pace_factor(weather) + tyre_penalty;
            if !driver.tyre.compound.is_legal_for(weather) {
                laptime += consts.wrong_tyre_penalty;
            }
            laptime += event_gen.lap_noise((1.0 - driver.consistency) * consts.lap_noise_scale);
            if lap == 1 {
                laptime += circuit.t_loss_firstlap
                    + circuit.t_grid_gap * driver.grid_position.saturating_sub(1) as f64;
            }
            if sc_active {
                laptime = laptime.max(circuit.t_lap_base * consts.sc_pace_factor);
            }

            // strategy
            let (decision, planned) = {
                let ctx = DecisionContext {
                    lap,
                    tot_no_laps,
                    weather,
                    sc_active,
                    driver: &*driver,
                    circuit,
                    consts,
                };
                (decider.decide(&ctx), ctx.planned_compound())
            };

            if let StrategyDecision::PitNow(requested) = decision {
                let compound = if requested.is_legal_for(weather) {
                    requested
                } else {
                    warn!(
                        driver = %driver.id,
                        lap,
                        "decider asked for {} tyres in {} conditions, fitting {}",
                        requested,
                        weather,
                        planned
                    );
                    planned
                };
                // the full pit-lane loss applies under safety car as well
                let time_loss = circuit.t_pit_loss;

                laptime += time_loss;
                driver.pit(compound);

                info!(driver = %driver.id, lap, %compound, "pit stop");
                new_events.push(RaceEvent {
                    lap,
                    event: RaceEventKind::PitStop {
                        driver_id: driver.id.to_owned(),
                        compound,
                        time_loss,
                    },
                });
            }

            // incidents
            let hazard = consts.events.lap_hazard(
                driver.reliability,
                driver.skill,
                circuit.incident_factor,
                weather,
                tot_no_laps,
                puncture,
            );
            if let Some(reason) = event_gen.roll_retirement(&hazard) {
                driver.retire(reason, lap);

                info!(driver = %driver.id, lap, %reason, "retirement");
                new_events.push(RaceEvent {
                    lap,
                    event: RaceEventKind::Retirement {
                        driver_id: driver.id.to_owned(),
                        reason,
                    },
                });
                continue;
            }

            driver.complete_lap(laptime);
            debug!(
                driver = %driver.id,
                lap,
                laptime,
                wear = driver.tyre.wear,
                "lap completed"
            );
        }

        let retired = new_events
            .iter()
            .any(|e| matches!(e.event, RaceEventKind::Retirement { .. }));
        self.state.events.extend(new_events);
        retired
    }

    /// handle_safety_car counts an active safety car down, otherwise rolls for a deployment.
    fn handle_safety_car(&mut self, lap: u32, retired_this_lap: bool) {
        if self.state.sc_active {
            self.state.sc_laps_remaining = self.state.sc_laps_remaining.saturating_sub(1);
            if self.state.sc_laps_remaining == 0 {
                self.state.sc_active = false;
                info!(lap, "safety car in");
                self.state.events.push(RaceEvent {
                    lap,
                    event: RaceEventKind::SafetyCarIn,
                });
            }
            return;
        }
        if lap >= self.state.tot_no_laps {
            return;
        }

        let pars = &self.consts.events;
        let mut probability = pars.sc_base_probability;
        if retired_this_lap {
            probability = probability.max(pars.sc_after_retirement_probability);
        }
        if self.circuit.is_high_incident_lap(lap) {
            probability = probability.max(pars.sc_high_incident_probability);
        }

        if let Some(laps) = self.event_gen.roll_safety_car(probability, pars) {
            self.state.sc_active = true;
            self.state.sc_laps_remaining = laps;
            info!(lap, laps, "safety car deployed");
            self.state.events.push(RaceEvent {
                lap,
                event: RaceEventKind::SafetyCarDeployed { laps },
            });
        }
    }

    /// handle_weather records the condition of the lap just simulated and rolls the next one.
    fn handle_weather(&mut self, lap: u32) {
        let current = self.state.weather;
        self.state.weather_history.push(current);
        if lap >= self.state.tot_no_laps {
            return;
        }

        let next = self.event_gen.roll_weather(current, &self.circuit.weather);
        if next != current {
            info!(lap, from = %current, to = %next, "weather change");
            self.state.events.push(RaceEvent {
                lap,
                event: RaceEventKind::WeatherChange {
                    from: current,
                    to: next,
                },
            });
            self.state.weather = next;
        }
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn state(&self) -> &RaceState {
        &self.state
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// race_result returns the final result, or RaceIncomplete if laps are still to be simulated.
    pub fn race_result(&self) -> Result<RaceResult> {
        if !self.state.is_finished() {
            return Err(RaceSimError::RaceIncomplete {
                completed_laps: self.state.cur_lap,
                total_laps: self.state.tot_no_laps,
            });
        }
        Ok(RaceResult::from_state(&self.state, self.seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::circuit::{CircuitKind, StrategyPreset, TyreStress};
    use crate::core::events::WeatherProfile;

    fn circuit_pars() -> CircuitPars {
        CircuitPars {
            id: "test_ring".to_owned(),
            name: "Test Ring".to_owned(),
            location: String::new(),
            kind: CircuitKind::Balanced,
            tot_no_laps: 12,
            t_lap_base: 80.0,
            weights: None,
            t_pit_loss: 20.0,
            t_loss_firstlap: 3.0,
            t_grid_gap: 0.25,
            tyre_stress: TyreStress::Medium,
            incident_factor: 1.0,
            high_incident_laps: vec![],
            weather: WeatherProfile {
                initial: WeatherCondition::Dry,
                transitions: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            },
            strategy_presets: vec![StrategyPreset {
                name: "one_stop".to_owned(),
                compounds: vec![Compound::Medium, Compound::Hard],
                wear_thresholds: vec![0.2],
            }],
        }
    }

    fn roster() -> (Vec<DriverPars>, Vec<CarPars>) {
        let drivers = vec![
            DriverPars {
                id: "AAA".to_owned(),
                name: "Driver A".to_owned(),
                team: "Alpha".to_owned(),
                skill: Some(80.0),
                consistency: 0.9,
            },
            DriverPars {
                id: "BBB".to_owned(),
                name: "Driver B".to_owned(),
                team: "Beta".to_owned(),
                skill: Some(90.0),
                consistency: 0.9,
            },
            DriverPars {
                id: "CCC".to_owned(),
                name: "Driver C".to_owned(),
                team: "Alpha".to_owned(),
                skill: Some(80.0),
                consistency: 0.9,
            },
        ];
        let cars = vec![
            CarPars {
                team: "Alpha".to_owned(),
                power: Some(85.0),
                aero: Some(85.0),
                reliability: Some(90.0),
            },
            CarPars {
                team: "Beta".to_owned(),
                power: Some(85.0),
                aero: Some(85.0),
                reliability: Some(90.0),
            },
        ];
        (drivers, cars)
    }

    /// Constants without any random incident, so that only lap time noise remains.
    fn calm_consts() -> SimConstants {
        let mut consts = SimConstants::default();
        consts.events.mechanical_base = 0.0;
        consts.events.mechanical_unreliability = 0.0;
        consts.events.crash_base = 0.0;
        consts.events.sc_base_probability = 0.0;
        consts.events.sc_after_retirement_probability = 0.0;
        consts.events.sc_high_incident_probability = 0.0;
        for compound in Compound::ALL.iter() {
            let cfg = match compound {
                Compound::Soft => &mut consts.tyre_model.soft,
                Compound::Medium => &mut consts.tyre_model.medium,
                Compound::Hard => &mut consts.tyre_model.hard,
                Compound::Intermediate => &mut consts.tyre_model.intermediate,
                Compound::Wet => &mut consts.tyre_model.wet,
            };
            cfg.puncture_onset_probability = 0.0;
            cfg.puncture_max_probability = 0.0;
        }
        consts
    }

    #[test]
    fn grid_follows_score_with_id_tiebreak() {
        let (drivers, cars) = roster();
        let race = Race::new(&circuit_pars(), &drivers, &cars, &calm_consts(), 1).unwrap();
        let d = &race.state().drivers;
        assert_eq!(d["BBB"].grid_position, 1);
        assert_eq!(d["AAA"].grid_position, 2);
        assert_eq!(d["CCC"].grid_position, 3);
    }

    #[test]
    fn unknown_team_and_duplicates_are_rejected() {
        let (mut drivers, cars) = roster();
        drivers[0].team = "Gamma".to_owned();
        let err = Race::new(&circuit_pars(), &drivers, &cars, &calm_consts(), 1).unwrap_err();
        assert!(matches!(err, RaceSimError::InvalidDriverRoster { ref driver_id, .. } if driver_id == "AAA"));

        let (mut drivers, cars) = roster();
        drivers[2].id = "AAA".to_owned();
        assert!(Race::new(&circuit_pars(), &drivers, &cars, &calm_consts(), 1).is_err());

        let (_, cars) = roster();
        assert!(Race::new(&circuit_pars(), &[], &cars, &calm_consts(), 1).is_err());
    }

    #[test]
    fn results_only_after_final_lap() {
        let (drivers, cars) = roster();
        let mut race = Race::new(&circuit_pars(), &drivers, &cars, &calm_consts(), 3).unwrap();
        race.simulate_lap(None);
        assert!(matches!(
            race.race_result(),
            Err(RaceSimError::RaceIncomplete {
                completed_laps: 1,
                total_laps: 12
            })
        ));

        while !race.is_finished() {
            race.simulate_lap(None);
        }
        let before = race.state().clone();
        race.simulate_lap(None);
        assert_eq!(race.state(), &before);
        assert!(race.race_result().is_ok());
        assert!(race
            .state()
            .drivers
            .values()
            .all(|d| d.status == DriverStatus::Finished && d.laps_completed == 12));
    }

    #[test]
    fn first_lap_carries_start_loss() {
        let (drivers, cars) = roster();
        let mut race = Race::new(&circuit_pars(), &drivers, &cars, &calm_consts(), 5).unwrap();
        let state = race.simulate_lap(None);
        for driver in state.drivers.values() {
            let start_loss = 3.0 + 0.25 * (driver.grid_position - 1) as f64;
            assert!(driver.laptimes[0] > driver.t_lap_base + start_loss - 2.0);
        }
    }

    #[test]
    fn planned_stop_is_made() {
        let (drivers, cars) = roster();
        let mut race = Race::new(&circuit_pars(), &drivers, &cars, &calm_consts(), 11).unwrap();
        while !race.is_finished() {
            race.simulate_lap(None);
        }
        for driver in race.state().drivers.values() {
            assert_eq!(driver.pit_stops, 1, "{}", driver.id);
            assert_eq!(driver.tyre.compound, Compound::Hard);
        }
    }

    #[test]
    fn rejected_override_is_recorded() {
        let (drivers, cars) = roster();
        let mut race = Race::new(&circuit_pars(), &drivers, &cars, &calm_consts(), 2).unwrap();

        let err = race
            .submit_override(&StrategyOverride::ForcePit {
                driver_id: "XXX".to_owned(),
                compound: None,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            RaceSimError::IllegalStrategyOverride {
                reason: OverrideRejection::UnknownDriver,
                ..
            }
        ));

        let state = race.simulate_lap(Some(StrategyOverride::ForcePit {
            driver_id: "AAA".to_owned(),
            compound: Some(Compound::Wet),
        }));
        assert!(matches!(
            state.events.last(),
            Some(RaceEvent {
                lap: 1,
                event: RaceEventKind::OverrideRejected { .. }
            })
        ));
        assert_eq!(state.drivers["AAA"].pit_stops, 0);
    }

    #[derive(Debug)]
    struct NeverPit;

    impl PitDecider for NeverPit {
        fn decide(&mut self, _ctx: &DecisionContext<'_>) -> StrategyDecision {
            StrategyDecision::StayOut
        }
    }

    #[test]
    fn custom_decider_without_overrides() {
        let (drivers, cars) = roster();
        let mut race = Race::new(&circuit_pars(), &drivers, &cars, &calm_consts(), 2)
            .unwrap()
            .with_decider(Box::new(NeverPit));

        let err = race
            .submit_override(&StrategyOverride::DelayPit {
                driver_id: "AAA".to_owned(),
                laps: 2,
            })
            .unwrap_err();
        assert!(err.to_string().contains("does not accept"));

        while !race.is_finished() {
            race.simulate_lap(None);
        }
        assert!(race.state().drivers.values().all(|d| d.pit_stops == 0));
    }
}
