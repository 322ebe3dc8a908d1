//! Built-in circuits and the default grid, embedded from `input/`.

use crate::core::car::CarPars;
use crate::core::circuit::CircuitPars;
use crate::core::driver::DriverPars;
use crate::core::race::RacePars;
use crate::error::{RaceSimError, Result};
use crate::pre::read_sim_pars::SimPars;
use serde::{Deserialize, Serialize};

const CIRCUITS_JSON: &str = include_str!("../../../input/circuits.json");
const GRID_JSON: &str = include_str!("../../../input/grid.json");

/// Teams and drivers of a field.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Grid {
    pub car_pars_all: Vec<CarPars>,
    pub driver_pars_all: Vec<DriverPars>,
}

fn parse<'a, T: Deserialize<'a>>(source_name: &str, json: &'a str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| RaceSimError::DataParse {
        source_name: source_name.to_owned(),
        message: e.to_string(),
    })
}

pub fn circuits() -> Result<Vec<CircuitPars>> {
    parse("circuits.json", CIRCUITS_JSON)
}

pub fn circuit_ids() -> Result<Vec<String>> {
    Ok(circuits()?.into_iter().map(|c| c.id).collect())
}

/// circuit_pars returns the catalogue entry of `circuit_id`.
pub fn circuit_pars(circuit_id: &str) -> Result<CircuitPars> {
    circuits()?
        .into_iter()
        .find(|c| c.id == circuit_id)
        .ok_or_else(|| RaceSimError::circuit(circuit_id, "unknown circuit id"))
}

pub fn default_grid() -> Result<Grid> {
    parse("grid.json", GRID_JSON)
}

/// sim_pars combines a catalogue circuit with the default grid.
pub fn sim_pars(circuit_id: &str, seed: u64) -> Result<SimPars> {
    let circuit_pars = circuit_pars(circuit_id)?;
    let grid = default_grid()?;
    Ok(SimPars {
        race_pars: RacePars { seed },
        circuit_pars,
        driver_pars_all: grid.driver_pars_all,
        car_pars_all: grid.car_pars_all,
    })
}
