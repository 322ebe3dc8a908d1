use crate::core::driver::DriverStatus;
use crate::core::events::{RetirementReason, WeatherCondition};
use crate::core::race::{RaceEvent, RaceState};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

/// Final classification entry of one driver.
///
/// * `gap_to_leader` - (s) Gap to the winner, `None` for retired drivers
/// * `fastest_lap` - (s) Fastest completed lap, `None` if no lap was completed
/// * `dnf_reason` / `retirement_lap` - Only set for retired drivers
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DriverResult {
    pub position: u32,
    pub name: String,
    pub team: String,
    pub total_time: f64,
    pub gap_to_leader: Option<f64>,
    pub fastest_lap: Option<f64>,
    pub laps_completed: u32,
    pub grid_position: u32,
    pub pit_stops: u32,
    pub dnf: bool,
    pub dnf_reason: Option<RetirementReason>,
    pub retirement_lap: Option<u32>,
}

/// RaceResult contains all race information that is persisted by the save layer and shown by the
/// UI. Maps are keyed by driver id, so the serialized form is stable for a given race.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RaceResult {
    pub circuit_id: String,
    pub seed: u64,
    pub tot_no_laps: u32,
    pub entries: BTreeMap<String, DriverResult>,
    pub laptimes: BTreeMap<String, Vec<f64>>,
    pub weather_history: Vec<WeatherCondition>,
    pub events: Vec<RaceEvent>,
}

impl RaceResult {
    pub fn from_state(state: &RaceState, seed: u64) -> RaceResult {
        let order = state.classification();
        let leader_time = order
            .first()
            .filter(|d| d.status != DriverStatus::Retired)
            .map(|d| d.total_time);

        let mut entries = BTreeMap::new();
        let mut laptimes = BTreeMap::new();

        for (idx, driver) in order.iter().enumerate() {
            let dnf = driver.status == DriverStatus::Retired;
            entries.insert(
                driver.id.to_owned(),
                DriverResult {
                    position: idx as u32 + 1,
                    name: driver.name.to_owned(),
                    team: driver.team.to_owned(),
                    total_time: driver.total_time,
                    gap_to_leader: if dnf {
                        None
                    } else {
                        leader_time.map(|t| driver.total_time - t)
                    },
                    fastest_lap: driver.fastest_lap,
                    laps_completed: driver.laps_completed,
                    grid_position: driver.grid_position,
                    pit_stops: driver.pit_stops,
                    dnf,
                    dnf_reason: driver.retirement.map(|r| r.reason),
                    retirement_lap: driver.retirement.map(|r| r.lap),
                },
            );
            laptimes.insert(driver.id.to_owned(), driver.laptimes.to_owned());
        }

        RaceResult {
            circuit_id: state.circuit_id.to_owned(),
            seed,
            tot_no_laps: state.tot_no_laps,
            entries,
            laptimes,
            weather_history: state.weather_history.to_owned(),
            events: state.events.to_owned(),
        }
    }

    /// classification returns `(driver id, entry)` pairs ordered by position.
    pub fn classification(&self) -> Vec<(&str, &DriverResult)> {
        let mut order: Vec<(&str, &DriverResult)> =
            self.entries.iter().map(|(id, e)| (id.as_str(), e)).collect();
        order.sort_by_key(|(_, e)| e.position);
        order
    }

    pub fn winner(&self) -> Option<&str> {
        self.classification()
            .first()
            .filter(|(_, e)| !e.dnf)
            .map(|(id, _)| *id)
    }

    pub fn no_dnfs(&self) -> usize {
        self.entries.values().filter(|e| e.dnf).count()
    }

    /// racetimes returns the cumulative race time after every completed lap of a driver.
    pub fn racetimes(&self, driver_id: &str) -> Vec<f64> {
        self.laptimes
            .get(driver_id)
            .map(|laps| {
                laps.iter()
                    .scan(0.0, |acc, t| {
                        *acc += t;
                        Some(*acc)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// print_classification prints the final classification to the console output.
    pub fn print_classification(&self) {
        println!("RESULT: Classification ({}, seed {})", self.circuit_id, self.seed);
        println!(
            "{:>3}  {:<4} {:<22} {:<16} {:>12}  {:>4}  {:>4}  {:>5}  {:>9}",
            "pos", "id", "driver", "team", "time/gap", "laps", "grid", "stops", "fastest"
        );

        for (id, e) in self.classification() {
            let time = match (e.dnf, e.gap_to_leader) {
                (true, _) => format!(
                    "DNF {}",
                    e.dnf_reason.map(|r| r.to_string()).unwrap_or_default()
                ),
                (false, Some(gap)) if gap > 0.0 => format!("+{:.3}s", gap),
                _ => format!("{:.3}s", e.total_time),
            };
            let fastest = e
                .fastest_lap
                .map(|t| format!("{:.3}s", t))
                .unwrap_or_else(|| "-".to_owned());

            println!(
                "{:>3}  {:<4} {:<22} {:<16} {:>12}  {:>4}  {:>4}  {:>5}  {:>9}",
                e.position, id, e.name, e.team, time, e.laps_completed, e.grid_position, e.pit_stops, fastest
            );
        }
    }

    /// print_lap_and_race_times prints the resulting lap and race times to the console output.
    /// Laps a driver did not complete stay empty.
    pub fn print_lap_and_race_times(&self) {
        let order = self.classification();

        let mut header = String::from("lap");
        for (id, _) in order.iter() {
            header.push_str(&format!(", {:>9}", id));
        }

        let racetimes: Vec<Vec<f64>> = order.iter().map(|(id, _)| self.racetimes(id)).collect();
        let mut tmp_string_laptime = String::new();
        let mut tmp_string_racetime = String::new();

        for lap in 0..self.tot_no_laps as usize {
            let _ = write!(&mut tmp_string_laptime, "{:3}", lap + 1);
            let _ = write!(&mut tmp_string_racetime, "{:3}", lap + 1);

            for (i, (id, _)) in order.iter().enumerate() {
                match self.laptimes.get(*id).and_then(|laps| laps.get(lap)) {
                    Some(t) => {
                        let _ = write!(&mut tmp_string_laptime, ", {:8.3}s", t);
                        let _ = write!(&mut tmp_string_racetime, ", {:8.3}s", racetimes[i][lap]);
                    }
                    None => {
                        tmp_string_laptime.push_str(",          ");
                        tmp_string_racetime.push_str(",          ");
                    }
                }
            }
            tmp_string_laptime.push('\n');
            tmp_string_racetime.push('\n');
        }

        println!("RESULT: Lap times");
        println!("{}", header);
        println!("{}", tmp_string_laptime);

        println!("RESULT: Race times");
        println!("{}", header);
        println!("{}", tmp_string_racetime);
    }

    /// write_lap_times_csv writes one row per lap and one column per driver (classification
    /// order). Laps a driver did not complete are left empty.
    pub fn write_lap_times_csv(&self, path: &Path) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_path(path)
            .context(format!("Failed to create lap time file {}!", path.display()))?;

        let order = self.classification();
        let mut header = vec!["lap".to_owned()];
        header.extend(order.iter().map(|(id, _)| id.to_string()));
        wtr.write_record(&header)?;

        for lap in 0..self.tot_no_laps as usize {
            let mut record = vec![(lap + 1).to_string()];
            for (id, _) in order.iter() {
                record.push(
                    self.laptimes
                        .get(*id)
                        .and_then(|laps| laps.get(lap))
                        .map(|t| format!("{:.3}", t))
                        .unwrap_or_default(),
                );
            }
            wtr.write_record(&record)?;
        }

        wtr.flush()
            .context(format!("Failed to write lap time file {}!", path.display()))?;
        Ok(())
    }

    /// to_json returns the persisted form of the result.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = self.to_json().context("Failed to serialize race result!")?;
        std::fs::write(path, json)
            .context(format!("Failed to write race result file {}!", path.display()))?;
        Ok(())
    }
}
