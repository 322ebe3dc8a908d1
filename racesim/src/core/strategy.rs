//! Pit strategy.
//!
//! The race asks a [`PitDecider`] once per lap and running driver whether to stop at the end of
//! the lap. [`DefaultPolicy`] follows the circuit presets and reacts to weather, safety cars and
//! worn tyres; [`ManualOverrides`] layers player commands on top of any other decider.

use crate::core::circuit::{Circuit, StrategyPreset};
use crate::core::driver::Driver;
use crate::core::events::WeatherCondition;
use crate::core::sim_constants::SimConstants;
use crate::core::tireset::{Compound, TyreState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::{debug, warn};

/// Projected race times closer than this are treated as equal during preset selection.
const PROJECTION_TIE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyDecision {
    StayOut,
    PitNow(Compound),
}

/// Manual command of the player for a single driver.
///
/// * `ForcePit` - Pit at the end of the current lap, optionally on a given compound
/// * `DelayPit` - Move the next scheduled stop `laps` laps later
/// * `SetNextCompound` - Compound to fit at the next stop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyOverride {
    ForcePit {
        driver_id: String,
        compound: Option<Compound>,
    },
    DelayPit {
        driver_id: String,
        laps: u32,
    },
    SetNextCompound {
        driver_id: String,
        compound: Compound,
    },
}

impl StrategyOverride {
    pub fn driver_id(&self) -> &str {
        match self {
            StrategyOverride::ForcePit { driver_id, .. }
            | StrategyOverride::DelayPit { driver_id, .. }
            | StrategyOverride::SetNextCompound { driver_id, .. } => driver_id,
        }
    }

    /// Compound explicitly requested by the override, if any.
    pub fn compound(&self) -> Option<Compound> {
        match self {
            StrategyOverride::ForcePit { compound, .. } => *compound,
            StrategyOverride::SetNextCompound { compound, .. } => Some(*compound),
            StrategyOverride::DelayPit { .. } => None,
        }
    }
}

/// Everything a decider may look at for one driver on one lap. The driver's tyre state already
/// contains the wear of the lap just driven.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    pub lap: u32,
    pub tot_no_laps: u32,
    pub weather: WeatherCondition,
    pub sc_active: bool,
    pub driver: &'a Driver,
    pub circuit: &'a Circuit,
    pub consts: &'a SimConstants,
}

impl<'a> DecisionContext<'a> {
    pub fn laps_left(&self) -> u32 {
        self.tot_no_laps.saturating_sub(self.lap)
    }

    pub fn preset(&self) -> &'a StrategyPreset {
        self.circuit.preset(self.driver.strategy.preset)
    }

    pub fn tyre_is_legal(&self) -> bool {
        self.driver.tyre.compound.is_legal_for(self.weather)
    }

    /// planned_compound returns the compound the plan calls for if the driver stops at the end of
    /// this lap: intermediates when damp, full wets when wet, otherwise the preset compound of the
    /// next stint (or of the current stint when coming back from wet tyres).
    pub fn planned_compound(&self) -> Compound {
        match self.weather {
            WeatherCondition::Damp => Compound::Intermediate,
            WeatherCondition::Wet => Compound::Wet,
            WeatherCondition::Dry => {
                let stint = self.driver.strategy.stint;
                if self.driver.tyre.compound.is_wet_class() {
                    self.preset().compound(stint)
                } else {
                    self.preset().compound(stint + 1)
                }
            }
        }
    }
}

/// Pit decision seam of the race loop.
pub trait PitDecider: Debug + Send {
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> StrategyDecision;

    /// accept_override registers an already validated override submitted on `lap`. Deciders
    /// without a notion of manual control return false.
    fn accept_override(&mut self, _ovr: &StrategyOverride, _lap: u32) -> bool {
        false
    }
}

/// Rule based policy used for every driver without player control.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl PitDecider for DefaultPolicy {
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> StrategyDecision {
        let tyre = &ctx.driver.tyre;

        // tyres not allowed in the current conditions
        if !ctx.tyre_is_legal() {
            return StrategyDecision::PitNow(ctx.planned_compound());
        }

        if ctx.laps_left() == 0 {
            return StrategyDecision::StayOut;
        }

        match ctx.weather {
            WeatherCondition::Dry => {
                if let Some(threshold) = ctx.preset().threshold(ctx.driver.strategy.stint) {
                    let trigger = if ctx.sc_active {
                        threshold * ctx.consts.sc_pit_window
                    } else {
                        threshold
                    };
                    if tyre.wear >= trigger {
                        return StrategyDecision::PitNow(ctx.planned_compound());
                    }
                }
            }
            WeatherCondition::Damp | WeatherCondition::Wet => {
                if tyre.wear >= ctx.consts.wet_wear_threshold {
                    return StrategyDecision::PitNow(tyre.compound);
                }
            }
        }

        let risk_wear = ctx.consts.tyre_model.for_compound(tyre.compound).puncture_risk_wear;
        if tyre.wear >= risk_wear && ctx.laps_left() > ctx.consts.emergency_min_laps_left {
            let compound = match ctx.weather {
                WeatherCondition::Dry => ctx.planned_compound(),
                _ => tyre.compound,
            };
            return StrategyDecision::PitNow(compound);
        }

        StrategyDecision::StayOut
    }
}

#[derive(Debug, Clone, Copy)]
struct PitDelay {
    laps: u32,
    until: Option<u32>,
}

/// Decider layer applying player overrides on top of `P`. Forced stops hold for the lap they were
/// submitted on, delays and compound choices until the next stop. All pending overrides of a
/// driver are cleared by the driver's next stop.
#[derive(Debug, Clone, Default)]
pub struct ManualOverrides<P> {
    policy: P,
    forced: BTreeMap<String, (u32, Option<Compound>)>,
    delays: BTreeMap<String, PitDelay>,
    next_compounds: BTreeMap<String, Compound>,
}

impl<P: PitDecider> ManualOverrides<P> {
    pub fn new(policy: P) -> Self {
        ManualOverrides {
            policy,
            forced: BTreeMap::new(),
            delays: BTreeMap::new(),
            next_compounds: BTreeMap::new(),
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn has_pending(&self, driver_id: &str) -> bool {
        self.forced.contains_key(driver_id)
            || self.delays.contains_key(driver_id)
            || self.next_compounds.contains_key(driver_id)
    }

    fn pick_compound(&self, ctx: &DecisionContext<'_>, fallback: Compound) -> Compound {
        match self.next_compounds.get(&ctx.driver.id) {
            Some(c) if c.is_legal_for(ctx.weather) => *c,
            Some(c) => {
                warn!(
                    driver = %ctx.driver.id,
                    lap = ctx.lap,
                    "preselected {} tyres not allowed in {} conditions, fitting {}",
                    c,
                    ctx.weather,
                    fallback
                );
                fallback
            }
            None => fallback,
        }
    }

    fn clear(&mut self, driver_id: &str) {
        self.forced.remove(driver_id);
        self.delays.remove(driver_id);
        self.next_compounds.remove(driver_id);
    }
}

impl<P: PitDecider> PitDecider for ManualOverrides<P> {
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> StrategyDecision {
        let id = ctx.driver.id.as_str();

        // the policy sees every lap, also when its proposal is overruled
        let proposal = self.policy.decide(ctx);

        let decision = match self.forced.remove(id) {
            Some((lap, compound)) if lap == ctx.lap => {
                let fallback = match proposal {
                    StrategyDecision::PitNow(c) => c,
                    StrategyDecision::StayOut => ctx.planned_compound(),
                };
                let compound = compound
                    .filter(|c| c.is_legal_for(ctx.weather))
                    .unwrap_or_else(|| self.pick_compound(ctx, fallback));
                StrategyDecision::PitNow(compound)
            }
            _ => match proposal {
                StrategyDecision::StayOut => StrategyDecision::StayOut,
                // weather stops cannot be delayed
                StrategyDecision::PitNow(c) if !ctx.tyre_is_legal() => {
                    StrategyDecision::PitNow(self.pick_compound(ctx, c))
                }
                StrategyDecision::PitNow(c) => {
                    let hold_until = self
                        .delays
                        .get_mut(id)
                        .map(|delay| *delay.until.get_or_insert(ctx.lap + delay.laps));
                    match hold_until {
                        Some(until) if ctx.lap < until => {
                            debug!(driver = id, lap = ctx.lap, until, "pit stop delayed");
                            StrategyDecision::StayOut
                        }
                        _ => StrategyDecision::PitNow(self.pick_compound(ctx, c)),
                    }
                }
            },
        };

        if let StrategyDecision::PitNow(_) = decision {
            self.clear(id);
        }
        decision
    }

    fn accept_override(&mut self, ovr: &StrategyOverride, lap: u32) -> bool {
        match ovr {
            StrategyOverride::ForcePit { driver_id, compound } => {
                self.forced.insert(driver_id.to_owned(), (lap, *compound));
            }
            StrategyOverride::DelayPit { driver_id, laps } => {
                self.delays.insert(
                    driver_id.to_owned(),
                    PitDelay {
                        laps: *laps,
                        until: None,
                    },
                );
            }
            StrategyOverride::SetNextCompound { driver_id, compound } => {
                self.next_compounds.insert(driver_id.to_owned(), *compound);
            }
        }
        true
    }
}

/// Outcome of running a preset over a full dry race.
/// * `time_loss` - (s) Summed tyre penalties, expected puncture cost and pit-lane losses
/// * `first_pit_lap` - Lap of the first stop, `None` for a no-stop plan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetProjection {
    pub time_loss: f64,
    pub first_pit_lap: Option<u32>,
}

/// project_preset drives the preset lap by lap with the tyre model of `consts` at the wear rate
/// of the circuit and sums everything that separates it from an ideal race.
pub fn project_preset(preset: &StrategyPreset, circuit: &Circuit, consts: &SimConstants) -> PresetProjection {
    let model = &consts.tyre_model;
    let pace_factor = circuit.tyre_stress.multiplier();

    let mut tyre = TyreState::new(preset.compound(0));
    let mut stint = 0;
    let mut time_loss = 0.0;
    let mut first_pit_lap = None;

    for lap in 1..=circuit.tot_no_laps {
        let (penalty, puncture) = model.advance_lap(&mut tyre, pace_factor);
        time_loss += penalty + puncture * consts.puncture_time_cost;

        if lap == circuit.tot_no_laps {
            break;
        }
        if let Some(threshold) = preset.threshold(stint) {
            if tyre.wear >= threshold {
                time_loss += circuit.t_pit_loss;
                stint += 1;
                tyre = tyre.pit(preset.compound(stint));
                first_pit_lap.get_or_insert(lap);
            }
        }
    }

    PresetProjection {
        time_loss,
        first_pit_lap,
    }
}

/// select_preset returns the index of the preset with the lowest projected time loss. Equal
/// projections go to the preset stopping first, then to the earlier list entry.
pub fn select_preset(circuit: &Circuit, consts: &SimConstants) -> usize {
    let projections: Vec<PresetProjection> = circuit
        .strategy_presets
        .iter()
        .map(|preset| project_preset(preset, circuit, consts))
        .collect();

    let mut best = 0;
    for (idx, proj) in projections.iter().enumerate().skip(1) {
        let cur = &projections[best];
        let delta = proj.time_loss - cur.time_loss;
        let better = if delta.abs() <= PROJECTION_TIE_TOLERANCE {
            proj.first_pit_lap.unwrap_or(u32::MAX) < cur.first_pit_lap.unwrap_or(u32::MAX)
        } else {
            delta < 0.0
        };
        if better {
            best = idx;
        }
    }

    debug!(
        circuit = %circuit.id,
        preset = %circuit.strategy_presets[best].name,
        time_loss = projections[best].time_loss,
        "strategy preset selected"
    );
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attributes::ScoringWeights;
    use crate::core::car::Car;
    use crate::core::circuit::{CircuitKind, CircuitPars, TyreStress};
    use crate::core::driver::DriverPars;
    use crate::core::events::WeatherProfile;

    fn circuit(presets: Vec<StrategyPreset>) -> Circuit {
        let pars = CircuitPars {
            id: "test_ring".to_owned(),
            name: "Test Ring".to_owned(),
            location: String::new(),
            kind: CircuitKind::Balanced,
            tot_no_laps: 20,
            t_lap_base: 80.0,
            weights: None,
            t_pit_loss: 20.0,
            t_loss_firstlap: 3.0,
            t_grid_gap: 0.25,
            tyre_stress: TyreStress::Medium,
            incident_factor: 1.0,
            high_incident_laps: vec![],
            weather: WeatherProfile::default(),
            strategy_presets: presets,
        };
        Circuit::new(&pars, &ScoringWeights::default()).unwrap()
    }

    fn one_stop() -> StrategyPreset {
        StrategyPreset {
            name: "one_stop".to_owned(),
            compounds: vec![Compound::Medium, Compound::Hard],
            wear_thresholds: vec![0.5],
        }
    }

    fn driver(circuit: &Circuit) -> Driver {
        let pars = DriverPars {
            id: "NOR".to_owned(),
            name: "Lando Norris".to_owned(),
            team: "McLaren".to_owned(),
            skill: Some(90.0),
            consistency: 0.9,
        };
        let car = Car {
            team: "McLaren".to_owned(),
            power: 92.0,
            aero: 94.0,
            reliability: 90.0,
        };
        Driver::new(&pars, &car, circuit, 0.05).unwrap()
    }

    fn ctx<'a>(
        lap: u32,
        weather: WeatherCondition,
        sc_active: bool,
        driver: &'a Driver,
        circuit: &'a Circuit,
        consts: &'a SimConstants,
    ) -> DecisionContext<'a> {
        DecisionContext {
            lap,
            tot_no_laps: circuit.tot_no_laps,
            weather,
            sc_active,
            driver,
            circuit,
            consts,
        }
    }

    #[test]
    fn policy_follows_wear_threshold() {
        let circuit = circuit(vec![one_stop()]);
        let consts = SimConstants::default();
        let mut d = driver(&circuit);
        let mut policy = DefaultPolicy;

        d.tyre.wear = 0.3;
        let c = ctx(8, WeatherCondition::Dry, false, &d, &circuit, &consts);
        assert_eq!(policy.decide(&c), StrategyDecision::StayOut);

        d.tyre.wear = 0.55;
        let c = ctx(9, WeatherCondition::Dry, false, &d, &circuit, &consts);
        assert_eq!(policy.decide(&c), StrategyDecision::PitNow(Compound::Hard));
    }

    #[test]
    fn safety_car_brings_stop_forward() {
        let circuit = circuit(vec![one_stop()]);
        let consts = SimConstants::default();
        let mut d = driver(&circuit);
        d.tyre.wear = 0.4;
        let mut policy = DefaultPolicy;

        let green = ctx(7, WeatherCondition::Dry, false, &d, &circuit, &consts);
        assert_eq!(policy.decide(&green), StrategyDecision::StayOut);
        let sc = ctx(7, WeatherCondition::Dry, true, &d, &circuit, &consts);
        assert_eq!(policy.decide(&sc), StrategyDecision::PitNow(Compound::Hard));
    }

    #[test]
    fn weather_forces_legal_compound() {
        let circuit = circuit(vec![one_stop()]);
        let consts = SimConstants::default();
        let mut d = driver(&circuit);
        let mut policy = DefaultPolicy;

        let c = ctx(3, WeatherCondition::Damp, false, &d, &circuit, &consts);
        assert_eq!(policy.decide(&c), StrategyDecision::PitNow(Compound::Intermediate));
        let c = ctx(3, WeatherCondition::Wet, false, &d, &circuit, &consts);
        assert_eq!(policy.decide(&c), StrategyDecision::PitNow(Compound::Wet));

        // back to slicks of the current stint once it dries up
        d.tyre = TyreState::new(Compound::Intermediate);
        let c = ctx(20, WeatherCondition::Dry, false, &d, &circuit, &consts);
        assert_eq!(policy.decide(&c), StrategyDecision::PitNow(Compound::Medium));
    }

    #[test]
    fn no_planned_stop_on_final_lap() {
        let circuit = circuit(vec![one_stop()]);
        let consts = SimConstants::default();
        let mut d = driver(&circuit);
        d.tyre.wear = 0.95;
        let mut policy = DefaultPolicy;
        let c = ctx(20, WeatherCondition::Dry, false, &d, &circuit, &consts);
        assert_eq!(policy.decide(&c), StrategyDecision::StayOut);
    }

    #[test]
    fn worn_wet_tyres_are_replaced() {
        let circuit = circuit(vec![one_stop()]);
        let consts = SimConstants::default();
        let mut d = driver(&circuit);
        d.tyre = TyreState::new(Compound::Intermediate);
        d.tyre.wear = 0.72;
        let mut policy = DefaultPolicy;
        let c = ctx(10, WeatherCondition::Wet, false, &d, &circuit, &consts);
        assert_eq!(policy.decide(&c), StrategyDecision::PitNow(Compound::Intermediate));
    }

    #[test]
    fn puncture_risk_stop_only_with_laps_to_go() {
        let circuit = circuit(vec![one_stop()]);
        let consts = SimConstants::default();
        let mut d = driver(&circuit);
        d.strategy.stint = 1;
        d.tyre = TyreState::new(Compound::Hard);
        d.tyre.wear = 0.92;
        let mut policy = DefaultPolicy;

        let c = ctx(12, WeatherCondition::Dry, false, &d, &circuit, &consts);
        assert_eq!(policy.decide(&c), StrategyDecision::PitNow(Compound::Hard));
        let c = ctx(18, WeatherCondition::Dry, false, &d, &circuit, &consts);
        assert_eq!(policy.decide(&c), StrategyDecision::StayOut);
    }

    #[test]
    fn forced_stop_holds_for_one_lap() {
        let circuit = circuit(vec![one_stop()]);
        let consts = SimConstants::default();
        let d = driver(&circuit);
        let mut decider = ManualOverrides::new(DefaultPolicy);

        let force = StrategyOverride::ForcePit {
            driver_id: "NOR".to_owned(),
            compound: Some(Compound::Soft),
        };
        assert!(decider.accept_override(&force, 3));
        let c = ctx(3, WeatherCondition::Dry, false, &d, &circuit, &consts);
        assert_eq!(decider.decide(&c), StrategyDecision::PitNow(Compound::Soft));
        let c = ctx(4, WeatherCondition::Dry, false, &d, &circuit, &consts);
        assert_eq!(decider.decide(&c), StrategyDecision::StayOut);

        // a force that was not consumed on its lap expires
        decider.accept_override(&force, 5);
        let c = ctx(6, WeatherCondition::Dry, false, &d, &circuit, &consts);
        assert_eq!(decider.decide(&c), StrategyDecision::StayOut);
        assert!(!decider.has_pending("NOR"));
    }

    #[test]
    fn delay_moves_scheduled_stop() {
        let circuit = circuit(vec![one_stop()]);
        let consts = SimConstants::default();
        let mut d = driver(&circuit);
        d.tyre.wear = 0.55;
        let mut decider = ManualOverrides::new(DefaultPolicy);
        decider.accept_override(
            &StrategyOverride::DelayPit {
                driver_id: "NOR".to_owned(),
                laps: 3,
            },
            2,
        );

        for lap in 5..8 {
            let c = ctx(lap, WeatherCondition::Dry, false, &d, &circuit, &consts);
            assert_eq!(decider.decide(&c), StrategyDecision::StayOut, "lap {}", lap);
        }
        let c = ctx(8, WeatherCondition::Dry, false, &d, &circuit, &consts);
        assert_eq!(decider.decide(&c), StrategyDecision::PitNow(Compound::Hard));
        assert!(!decider.has_pending("NOR"));
    }

    #[test]
    fn weather_stop_ignores_delay() {
        let circuit = circuit(vec![one_stop()]);
        let consts = SimConstants::default();
        let d = driver(&circuit);
        let mut decider = ManualOverrides::new(DefaultPolicy);
        decider.accept_override(
            &StrategyOverride::DelayPit {
                driver_id: "NOR".to_owned(),
                laps: 10,
            },
            2,
        );
        let c = ctx(3, WeatherCondition::Damp, false, &d, &circuit, &consts);
        assert_eq!(decider.decide(&c), StrategyDecision::PitNow(Compound::Intermediate));
    }

    #[test]
    fn preselected_compound_falls_back_when_illegal() {
        let circuit = circuit(vec![one_stop()]);
        let consts = SimConstants::default();
        let mut d = driver(&circuit);
        let set_soft = StrategyOverride::SetNextCompound {
            driver_id: "NOR".to_owned(),
            compound: Compound::Soft,
        };

        let mut decider = ManualOverrides::new(DefaultPolicy);
        decider.accept_override(&set_soft, 4);
        d.tyre.wear = 0.6;
        let c = ctx(10, WeatherCondition::Dry, false, &d, &circuit, &consts);
        assert_eq!(decider.decide(&c), StrategyDecision::PitNow(Compound::Soft));

        let mut decider = ManualOverrides::new(DefaultPolicy);
        decider.accept_override(&set_soft, 4);
        let c = ctx(10, WeatherCondition::Damp, false, &d, &circuit, &consts);
        assert_eq!(decider.decide(&c), StrategyDecision::PitNow(Compound::Intermediate));
    }

    #[test]
    fn default_policy_refuses_overrides() {
        let ovr = StrategyOverride::DelayPit {
            driver_id: "NOR".to_owned(),
            laps: 1,
        };
        assert!(!DefaultPolicy.accept_override(&ovr, 1));
        assert_eq!(ovr.driver_id(), "NOR");
        assert_eq!(ovr.compound(), None);
    }

    #[test]
    fn cheaper_preset_is_selected() {
        let no_stop = StrategyPreset {
            name: "no_stop".to_owned(),
            compounds: vec![Compound::Hard],
            wear_thresholds: vec![],
        };
        let circuit = circuit(vec![no_stop, one_stop()]);
        let consts = SimConstants::default();

        let projections: Vec<PresetProjection> = circuit
            .strategy_presets
            .iter()
            .map(|p| project_preset(p, &circuit, &consts))
            .collect();
        assert_eq!(projections[0].first_pit_lap, None);
        assert!(projections[1].first_pit_lap.is_some());

        let expected = if projections[1].time_loss < projections[0].time_loss { 1 } else { 0 };
        assert_eq!(select_preset(&circuit, &consts), expected);
    }

    #[test]
    fn equal_projection_prefers_earlier_stop() {
        // flat tyres: every one-stop plan costs exactly one pit loss
        let mut consts = SimConstants::default();
        consts.tyre_model.medium.degradation_curve = vec![[0.0, 0.0], [1.0, 0.0]];
        consts.tyre_model.medium.warmup_penalty = 0.0;
        consts.tyre_model.medium.puncture_risk_wear = 1.0;

        let late = StrategyPreset {
            name: "late".to_owned(),
            compounds: vec![Compound::Medium, Compound::Medium],
            wear_thresholds: vec![0.45],
        };
        let early = StrategyPreset {
            name: "early".to_owned(),
            compounds: vec![Compound::Medium, Compound::Medium],
            wear_thresholds: vec![0.2],
        };
        let circuit = circuit(vec![late.clone(), early]);
        assert_eq!(select_preset(&circuit, &consts), 1);

        // identical plans keep list order
        let circuit = self::circuit(vec![late.clone(), late]);
        assert_eq!(select_preset(&circuit, &consts), 0);
    }
}
