use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    author = "Alexander Heilmeier <alexander.heilmeier@tum.de>",
    name = "RS-LB",
    about = "A lap-based, seeded F1 race simulator written in Rust"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug output (per-lap log lines and lap time tables)
    #[clap(short, long)]
    pub debug: bool,

    /// Run the race lap by lap and read strategy commands from stdin
    #[clap(short, long)]
    pub interactive: bool,

    /// Print a running order ticker after every lap
    #[clap(short, long)]
    pub live: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Built-in circuit to race on (ignored if a parameter file is set)
    #[clap(short, long, default_value = "bahrain")]
    pub circuit: String,

    /// Race seed, overrides the seed of a parameter file
    #[clap(short, long)]
    pub seed: Option<u64>,

    /// Set number of simulation runs, runs > 1 are simulated in parallel with seeds seed, seed+1, ...
    #[clap(short, long, default_value = "1")]
    pub no_sim_runs: u32,

    /// Set path to the simulation parameter file (full parameters or a scenario referring to a
    /// built-in circuit)
    #[clap(short, long)]
    pub parfile_path: Option<PathBuf>,

    /// Set path to a simulation constants file
    #[clap(long)]
    pub constants_path: Option<PathBuf>,

    /// Write the race result as JSON to this path
    #[clap(long)]
    pub json_out: Option<PathBuf>,

    /// Write the lap times as CSV to this path
    #[clap(long)]
    pub csv_out: Option<PathBuf>,
}
