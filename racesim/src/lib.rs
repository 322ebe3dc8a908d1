pub mod core {
    pub mod attributes;
    pub mod car;
    pub mod circuit;
    pub mod driver;
    pub mod events;
    pub mod handle_race;
    pub mod race;
    pub mod sim_constants;
    pub mod strategy;
    pub mod tireset;
}
pub mod error;
pub mod interfaces {
    pub mod ui_interface;
}
pub mod post {
    pub mod race_result;
}
pub mod pre {
    pub mod catalogue;
    pub mod read_sim_pars;
    pub mod sim_opts;
}

pub use crate::core::handle_race::{simulate_race, simulate_race_auto};
pub use crate::error::{RaceSimError, Result};
