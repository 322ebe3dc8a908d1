use crate::core::car::CarPars;
use crate::core::circuit::CircuitPars;
use crate::core::driver::DriverPars;
use crate::core::race::RacePars;
use crate::core::sim_constants::SimConstants;
use crate::pre::catalogue;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

/// SimPars is used to store all other parameter structs.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SimPars {
    pub race_pars: RacePars,
    pub circuit_pars: CircuitPars,
    pub driver_pars_all: Vec<DriverPars>,
    pub car_pars_all: Vec<CarPars>,
}

/// Scenario file referring to a catalogue circuit. Without a roster the default grid is used.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RaceScenarioFile {
    pub race_pars: RacePars,
    pub circuit_id: String,
    #[serde(default)]
    pub driver_pars_all: Option<Vec<DriverPars>>,
    #[serde(default)]
    pub car_pars_all: Option<Vec<CarPars>>,
}

fn read_json<T: DeserializeOwned>(filepath: &Path, what: &str) -> anyhow::Result<T> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!("Failed to open {} {}!", what, filepath.display()))?;
    let pars = serde_json::from_reader(&fh)
        .context(format!("Failed to parse {} {}!", what, filepath.display()))?;
    Ok(pars)
}

/// read_sim_pars reads the JSON file and decodes the JSON string into the simulation parameters
/// struct.
pub fn read_sim_pars(filepath: &Path) -> anyhow::Result<SimPars> {
    read_json(filepath, "parameter file")
}

/// Read simulation constants from a JSON file. Missing entries keep their defaults.
pub fn read_sim_constants(filepath: &Path) -> anyhow::Result<SimConstants> {
    let consts: SimConstants = read_json(filepath, "simulation constants file")?;
    consts
        .validate()
        .context(format!("Invalid simulation constants in {}!", filepath.display()))?;
    Ok(consts)
}

pub fn read_race_scenario(filepath: &Path) -> anyhow::Result<RaceScenarioFile> {
    read_json(filepath, "race scenario file")
}

/// Flexible reader: tries full SimPars first; if it fails, reads a scenario file and completes it
/// from the built-in catalogue.
pub fn read_sim_pars_flexible(filepath: &Path) -> anyhow::Result<SimPars> {
    match read_sim_pars(filepath) {
        Ok(p) => Ok(p),
        Err(_) => {
            let scen = read_race_scenario(filepath)?;
            let circuit_pars = catalogue::circuit_pars(&scen.circuit_id)?;
            let (driver_pars_all, car_pars_all) = match (scen.driver_pars_all, scen.car_pars_all) {
                (Some(drivers), Some(cars)) => (drivers, cars),
                (None, None) => {
                    let grid = catalogue::default_grid()?;
                    (grid.driver_pars_all, grid.car_pars_all)
                }
                _ => anyhow::bail!(
                    "Scenario {} must provide both driver_pars_all and car_pars_all or neither!",
                    filepath.display()
                ),
            };
            Ok(SimPars {
                race_pars: scen.race_pars,
                circuit_pars,
                driver_pars_all,
                car_pars_all,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("racesim_{}_{}.json", name, std::process::id()));
        let mut fh = std::fs::File::create(&path).unwrap();
        fh.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn scenario_is_completed_from_catalogue() {
        let path = temp_file("scenario", r#"{"race_pars": {"seed": 4}, "circuit_id": "monza"}"#);
        let sim_pars = read_sim_pars_flexible(&path).unwrap();
        assert_eq!(sim_pars.race_pars.seed, 4);
        assert_eq!(sim_pars.circuit_pars.id, "monza");
        assert_eq!(sim_pars.driver_pars_all.len(), 20);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn unknown_circuit_in_scenario_fails() {
        let path = temp_file("bad_scenario", r#"{"race_pars": {"seed": 4}, "circuit_id": "nowhere"}"#);
        assert!(read_sim_pars_flexible(&path).is_err());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn partial_constants_file() {
        let path = temp_file("consts", r#"{"lap_noise_scale": 0.5}"#);
        let consts = read_sim_constants(&path).unwrap();
        assert_eq!(consts.lap_noise_scale, 0.5);
        std::fs::remove_file(path).ok();

        let path = temp_file("bad_consts", r#"{"sc_pace_factor": 0.5}"#);
        assert!(read_sim_constants(&path).is_err());
        std::fs::remove_file(path).ok();
    }
}
