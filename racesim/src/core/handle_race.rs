use crate::core::race::Race;
use crate::core::sim_constants::SimConstants;
use crate::error::Result;
use crate::interfaces::ui_interface::LapUpdate;
use crate::post::race_result::RaceResult;
use crate::pre::catalogue;
use crate::pre::read_sim_pars::SimPars;
use anyhow::Context;
use flume::Sender;
use tracing::info;

/// simulate_race_auto simulates a full race on a built-in circuit with the default grid, default
/// constants and the default pit policy.
pub fn simulate_race_auto(circuit_id: &str, seed: u64) -> Result<RaceResult> {
    let sim_pars = catalogue::sim_pars(circuit_id, seed)?;
    simulate_race(&sim_pars, &SimConstants::default())
}

/// simulate_race simulates a full race without manual input.
pub fn simulate_race(sim_pars: &SimPars, sim_consts: &SimConstants) -> Result<RaceResult> {
    let mut race = create_race(sim_pars, sim_consts)?;
    while !race.is_finished() {
        race.simulate_lap(None);
    }
    race.race_result()
}

pub fn create_race(sim_pars: &SimPars, sim_consts: &SimConstants) -> Result<Race> {
    Race::new(
        &sim_pars.circuit_pars,
        &sim_pars.driver_pars_all,
        &sim_pars.car_pars_all,
        sim_consts,
        sim_pars.race_pars.seed,
    )
}

/// handle_race creates and simulates a race on the basis of the inserted parameters, and returns
/// the results for post-processing. If a sender is inserted, a lap update is sent after every lap
/// and the final result is attached to the last one.
pub fn handle_race(
    sim_pars: &SimPars,
    sim_consts: &SimConstants,
    print_debug: bool,
    tx: Option<&Sender<LapUpdate>>,
) -> anyhow::Result<RaceResult> {
    let mut race = create_race(sim_pars, sim_consts)?;
    let mut events_seen = 0;

    while !race.is_finished() {
        let state = race.simulate_lap(None);

        if print_debug {
            let order = state.classification();
            info!(
                "Simulating... lap {}/{} completed, leader {}, {} retirements",
                state.cur_lap,
                state.tot_no_laps,
                order.first().map(|d| d.id.as_str()).unwrap_or("-"),
                state.no_retirements()
            );
        }

        if let Some(tx) = tx {
            let update = LapUpdate::from_state(state, events_seen);
            events_seen = state.events.len();

            // the last update carries the final result
            let update = if race.is_finished() {
                LapUpdate {
                    final_result: Some(race.race_result()?),
                    ..update
                }
            } else {
                update
            };
            tx.send(update)
                .context("Failed to send lap update to the display thread!")?;
        }
    }

    Ok(race.race_result()?)
}
