use crate::core::driver::DriverStatus;
use crate::core::events::WeatherCondition;
use crate::core::race::{RaceEvent, RaceState};
use crate::core::tireset::Compound;
use crate::post::race_result::RaceResult;

/// Running order entry shown by a display layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverPosition {
    pub position: u32,
    pub driver_id: String,
    pub gap_to_leader: Option<f64>,
    pub compound: Compound,
    pub tyre_wear: f64,
    pub pit_stops: u32,
    pub status: DriverStatus,
}

/// LapUpdate is sent to the display layer after every simulated lap.
#[derive(Debug, Clone, PartialEq)]
pub struct LapUpdate {
    pub lap: u32,
    pub tot_no_laps: u32,
    pub sc_active: bool,
    pub weather: WeatherCondition,
    pub running_order: Vec<DriverPosition>,

    // events of the lap just simulated
    pub new_events: Vec<RaceEvent>,

    // final results payload (sent once when race finishes)
    pub final_result: Option<RaceResult>,
}

impl LapUpdate {
    /// from_state builds the update of the last simulated lap. `events_seen` is the number of log
    /// entries already sent with earlier updates.
    pub fn from_state(state: &RaceState, events_seen: usize) -> LapUpdate {
        let order = state.classification();
        let leader_time = order
            .first()
            .filter(|d| d.status != DriverStatus::Retired)
            .map(|d| d.total_time);

        let running_order = order
            .iter()
            .enumerate()
            .map(|(idx, d)| DriverPosition {
                position: idx as u32 + 1,
                driver_id: d.id.to_owned(),
                gap_to_leader: match (d.status, leader_time) {
                    (DriverStatus::Retired, _) => None,
                    (_, Some(t)) => Some(d.total_time - t),
                    _ => None,
                },
                compound: d.tyre.compound,
                tyre_wear: d.tyre.wear,
                pit_stops: d.pit_stops,
                status: d.status,
            })
            .collect();

        LapUpdate {
            lap: state.cur_lap,
            tot_no_laps: state.tot_no_laps,
            sc_active: state.sc_active,
            weather: state.weather_history.last().copied().unwrap_or(state.weather),
            running_order,
            new_events: state.events.iter().skip(events_seen).cloned().collect(),
            final_result: None,
        }
    }
}
