use clap::Parser;
use racesim::core::handle_race::{create_race, handle_race, simulate_race};
use racesim::core::sim_constants::SimConstants;
use racesim::core::strategy::StrategyOverride;
use racesim::core::tireset::Compound;
use racesim::interfaces::ui_interface::LapUpdate;
use racesim::post::race_result::RaceResult;
use racesim::pre::catalogue;
use racesim::pre::read_sim_pars::{read_sim_constants, read_sim_pars_flexible, SimPars};
use racesim::pre::sim_opts::SimOpts;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::thread;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Number of positions shown by the lap ticker.
const TICKER_POSITIONS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
enum Command {
    NextLap,
    Auto,
    Quit,
    Override(StrategyOverride),
}

fn parse_command(line: &str) -> Result<Command, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let compound = |c: &str| c.parse::<Compound>();

    match parts.as_slice() {
        [] => Ok(Command::NextLap),
        ["auto"] => Ok(Command::Auto),
        ["quit"] | ["q"] => Ok(Command::Quit),
        ["force", id] => Ok(Command::Override(StrategyOverride::ForcePit {
            driver_id: id.to_uppercase(),
            compound: None,
        })),
        ["force", id, c] => Ok(Command::Override(StrategyOverride::ForcePit {
            driver_id: id.to_uppercase(),
            compound: Some(compound(c)?),
        })),
        ["delay", id, laps] => Ok(Command::Override(StrategyOverride::DelayPit {
            driver_id: id.to_uppercase(),
            laps: laps
                .parse()
                .map_err(|_| format!("invalid number of laps '{}'", laps))?,
        })),
        ["compound", id, c] => Ok(Command::Override(StrategyOverride::SetNextCompound {
            driver_id: id.to_uppercase(),
            compound: compound(c)?,
        })),
        _ => Err(format!("unknown command '{}'", line.trim())),
    }
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_ticker(update: &LapUpdate) {
    println!(
        "--- Lap {}/{} | {}{} ---",
        update.lap,
        update.tot_no_laps,
        update.weather,
        if update.sc_active { " | SAFETY CAR" } else { "" }
    );
    for pos in update.running_order.iter().take(TICKER_POSITIONS) {
        let gap = match pos.gap_to_leader {
            Some(gap) if gap > 0.0 => format!("+{:.3}s", gap),
            Some(_) => "leader".to_owned(),
            None => pos.status.to_string(),
        };
        println!(
            "P{:<2} {:<4} {:>10}  {:<12} {:>3.0}%  stops {}",
            pos.position,
            pos.driver_id,
            gap,
            pos.compound,
            pos.tyre_wear * 100.0,
            pos.pit_stops
        );
    }
    for event in update.new_events.iter() {
        println!("  {}", event);
    }
}

/// run_interactive simulates the race lap by lap and applies strategy commands read from stdin.
/// Returns `None` if the race was aborted.
fn run_interactive(sim_pars: &SimPars, sim_consts: &SimConstants) -> anyhow::Result<Option<RaceResult>> {
    let mut race = create_race(sim_pars, sim_consts)?;
    println!("INFO: Commands: <enter> next lap | force <id> [compound] | delay <id> <laps> | compound <id> <compound> | auto | quit");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut auto = false;
    let mut events_seen = 0;

    while !race.is_finished() {
        let mut ovr = None;

        if !auto {
            print!("lap {}/{} > ", race.state().cur_lap + 1, race.state().tot_no_laps);
            std::io::stdout().flush()?;

            match lines.next() {
                // end of input runs the race to the end
                None => auto = true,
                Some(line) => match parse_command(&line?) {
                    Ok(Command::NextLap) => {}
                    Ok(Command::Auto) => auto = true,
                    Ok(Command::Quit) => {
                        println!("INFO: Race aborted after {} laps", race.state().cur_lap);
                        return Ok(None);
                    }
                    Ok(Command::Override(o)) => ovr = Some(o),
                    Err(msg) => {
                        warn!("{}", msg);
                        continue;
                    }
                },
            }
        }

        let state = race.simulate_lap(ovr);
        if !auto || state.cur_lap == state.tot_no_laps {
            print_ticker(&LapUpdate::from_state(state, events_seen));
        }
        events_seen = state.events.len();
    }

    Ok(Some(race.race_result()?))
}

fn run_live(sim_pars: &SimPars, sim_consts: &SimConstants, debug: bool) -> anyhow::Result<RaceResult> {
    let (tx, rx) = flume::unbounded();

    let sim_pars_thread = sim_pars.clone();
    let sim_consts_thread = sim_consts.clone();
    let sim_thread = thread::spawn(move || {
        handle_race(&sim_pars_thread, &sim_consts_thread, debug, Some(&tx))
    });

    for update in rx.iter() {
        print_ticker(&update);
    }

    sim_thread
        .join()
        .map_err(|_| anyhow::anyhow!("Simulation thread panicked!"))?
}

/// run_batch simulates `no_sim_runs` races in parallel and prints per-driver statistics.
fn run_batch(sim_pars: &SimPars, sim_consts: &SimConstants, no_sim_runs: u32) -> anyhow::Result<()> {
    let seed_start = sim_pars.race_pars.seed;
    info!(races = no_sim_runs, seed = seed_start, "batch simulation started");

    let results = (0..no_sim_runs)
        .into_par_iter()
        .map(|i| {
            let mut pars = sim_pars.clone();
            pars.race_pars.seed = seed_start.wrapping_add(i as u64);
            simulate_race(&pars, sim_consts)
        })
        .collect::<racesim::Result<Vec<RaceResult>>>()?;

    #[derive(Default)]
    struct DriverStats {
        wins: u32,
        podiums: u32,
        dnfs: u32,
        position_sum: u32,
    }

    let mut stats: BTreeMap<&str, DriverStats> = BTreeMap::new();
    for result in results.iter() {
        for (id, entry) in result.entries.iter() {
            let s = stats.entry(id.as_str()).or_default();
            s.position_sum += entry.position;
            if entry.dnf {
                s.dnfs += 1;
            } else if entry.position == 1 {
                s.wins += 1;
            }
            if !entry.dnf && entry.position <= 3 {
                s.podiums += 1;
            }
        }
    }

    let mut rows: Vec<(&str, DriverStats)> = stats.into_iter().collect();
    rows.sort_by(|a, b| a.1.position_sum.cmp(&b.1.position_sum).then_with(|| a.0.cmp(b.0)));

    let n = no_sim_runs as f64;
    println!("RESULT: {} races from seed {}", no_sim_runs, seed_start);
    println!("{:<4} {:>8} {:>5} {:>8} {:>5}", "id", "avg pos", "wins", "podiums", "dnfs");
    for (id, s) in rows.iter() {
        println!(
            "{:<4} {:>8.2} {:>5} {:>8} {:>5}",
            id,
            s.position_sum as f64 / n,
            s.wins,
            s.podiums,
            s.dnfs
        );
    }
    let total_dnfs: usize = results.iter().map(|r| r.no_dnfs()).sum();
    println!("RESULT: Average retirements per race: {:.2}", total_dnfs as f64 / n);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();
    init_tracing(sim_opts.debug);

    let sim_consts = match &sim_opts.constants_path {
        Some(path) => {
            println!("INFO: Reading simulation constants from {:?}", path);
            read_sim_constants(path)?
        }
        None => SimConstants::default(),
    };

    // get simulation parameters
    let mut sim_pars = if let Some(parfile_path) = &sim_opts.parfile_path {
        println!("INFO: Reading simulation parameters from {:?}", parfile_path);
        read_sim_pars_flexible(parfile_path)?
    } else {
        catalogue::sim_pars(&sim_opts.circuit, 0)?
    };
    if let Some(seed) = sim_opts.seed {
        sim_pars.race_pars.seed = seed;
    }

    // print race details
    println!(
        "INFO: Simulating {} ({} laps) with seed {}",
        sim_pars.circuit_pars.name, sim_pars.circuit_pars.tot_no_laps, sim_pars.race_pars.seed
    );

    // EXECUTION -----------------------------------------------------------------------------------
    let t_start = Instant::now();

    if sim_opts.no_sim_runs > 1 {
        run_batch(&sim_pars, &sim_consts, sim_opts.no_sim_runs)?;
        println!("INFO: Execution time: {}ms", t_start.elapsed().as_millis());
        return Ok(());
    }

    let race_result = if sim_opts.interactive {
        match run_interactive(&sim_pars, &sim_consts)? {
            Some(result) => result,
            None => return Ok(()),
        }
    } else if sim_opts.live {
        run_live(&sim_pars, &sim_consts, sim_opts.debug)?
    } else {
        handle_race(&sim_pars, &sim_consts, sim_opts.debug, None)?
    };
    println!("INFO: Execution time: {}ms", t_start.elapsed().as_millis());

    // POST-PROCESSING -----------------------------------------------------------------------------
    race_result.print_classification();
    if sim_opts.debug {
        race_result.print_lap_and_race_times();
    }
    if let Some(path) = &sim_opts.json_out {
        race_result.write_json(path)?;
        println!("INFO: Race result written to {:?}", path);
    }
    if let Some(path) = &sim_opts.csv_out {
        race_result.write_lap_times_csv(path)?;
        println!("INFO: Lap times written to {:?}", path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command(""), Ok(Command::NextLap));
        assert_eq!(parse_command("  auto "), Ok(Command::Auto));
        assert_eq!(
            parse_command("force ver s"),
            Ok(Command::Override(StrategyOverride::ForcePit {
                driver_id: "VER".to_owned(),
                compound: Some(Compound::Soft),
            }))
        );
        assert_eq!(
            parse_command("delay LEC 3"),
            Ok(Command::Override(StrategyOverride::DelayPit {
                driver_id: "LEC".to_owned(),
                laps: 3,
            }))
        );
        assert_eq!(
            parse_command("compound nor inter"),
            Ok(Command::Override(StrategyOverride::SetNextCompound {
                driver_id: "NOR".to_owned(),
                compound: Compound::Intermediate,
            }))
        );
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(parse_command("delay LEC soon").is_err());
        assert!(parse_command("force VER slick").is_err());
        assert!(parse_command("box box").is_err());
    }
}
