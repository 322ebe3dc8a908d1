use crate::core::attributes::{ScoringWeights, WeightProfile};
use crate::core::events::WeatherProfile;
use crate::core::tireset::Compound;
use crate::error::{RaceSimError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CircuitKind {
    Street,
    HighSpeed,
    HighDownforce,
    Balanced,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TyreStress {
    Low,
    Medium,
    High,
}

impl Default for TyreStress {
    fn default() -> Self {
        TyreStress::Medium
    }
}

impl TyreStress {
    /// Wear rate multiplier of the circuit surface.
    pub fn multiplier(self) -> f64 {
        match self {
            TyreStress::Low => 0.75,
            TyreStress::Medium => 1.0,
            TyreStress::High => 1.2,
        }
    }
}

/// Strategy template of a circuit.
/// * `name` - Preset name, e.g. one_stop
/// * `compounds` - Compound of every stint, the first one is fitted on the grid
/// * `wear_thresholds` - Wear at which stint i ends, one entry per planned stop
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StrategyPreset {
    pub name: String,
    pub compounds: Vec<Compound>,
    pub wear_thresholds: Vec<f64>,
}

impl StrategyPreset {
    pub fn no_stops(&self) -> usize {
        self.wear_thresholds.len()
    }

    /// Compound of stint `stint`; stints past the plan reuse the last compound.
    pub fn compound(&self, stint: usize) -> Compound {
        let idx = stint.min(self.compounds.len().saturating_sub(1));
        self.compounds.get(idx).copied().unwrap_or(Compound::Medium)
    }

    /// Wear threshold that ends stint `stint`, `None` for the final stint.
    pub fn threshold(&self, stint: usize) -> Option<f64> {
        self.wear_thresholds.get(stint).copied()
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.compounds.is_empty() {
            return Err(format!("preset '{}' has no compounds", self.name));
        }
        if self.compounds.len() != self.wear_thresholds.len() + 1 {
            return Err(format!(
                "preset '{}' needs exactly one wear threshold per stop",
                self.name
            ));
        }
        if self.compounds.iter().any(|c| c.is_wet_class()) {
            return Err(format!("preset '{}' must only use dry compounds", self.name));
        }
        if self.wear_thresholds.iter().any(|t| !(*t > 0.0 && *t <= 1.0)) {
            return Err(format!("preset '{}' has a wear threshold outside (0, 1]", self.name));
        }
        Ok(())
    }
}

/// * `id` - Circuit id used by the game layer, e.g. monaco
/// * `name` - Circuit name
/// * `location` - City/country
/// * `kind` - Circuit character, selects the rating weight profile
/// * `tot_no_laps` - Race distance in laps
/// * `t_lap_base` - (s) Lap time of a 100-rated package on fresh mediums in the dry
/// * `weights` - Optional explicit rating weights replacing the profile of `kind`
/// * `t_pit_loss` - (s) Time lost by a pit stop compared to staying out
/// * `t_loss_firstlap` - (s) Lap time loss due to the start from standstill
/// * `t_grid_gap` - (s) Additional first lap loss per grid slot
/// * `tyre_stress` - Tyre wear severity of the surface
/// * `incident_factor` - Crash hazard multiplier (street circuits > 1)
/// * `high_incident_laps` - Laps after which a safety car is more likely, e.g. lap 1
/// * `weather` - Weather Markov profile
/// * `strategy_presets` - Strategy templates, the first is the default, the second the alternate
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CircuitPars {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub kind: CircuitKind,
    pub tot_no_laps: u32,
    pub t_lap_base: f64,
    #[serde(default)]
    pub weights: Option<WeightProfile>,
    pub t_pit_loss: f64,
    #[serde(default = "default_t_loss_firstlap")]
    pub t_loss_firstlap: f64,
    #[serde(default = "default_t_grid_gap")]
    pub t_grid_gap: f64,
    #[serde(default)]
    pub tyre_stress: TyreStress,
    #[serde(default = "default_incident_factor")]
    pub incident_factor: f64,
    #[serde(default)]
    pub high_incident_laps: Vec<u32>,
    #[serde(default)]
    pub weather: WeatherProfile,
    pub strategy_presets: Vec<StrategyPreset>,
}

fn default_t_loss_firstlap() -> f64 {
    3.0
}

fn default_t_grid_gap() -> f64 {
    0.25
}

fn default_incident_factor() -> f64 {
    1.0
}

/// Validated circuit, immutable for the duration of a race.
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    pub id: String,
    pub name: String,
    pub location: String,
    pub kind: CircuitKind,
    pub tot_no_laps: u32,
    pub t_lap_base: f64,
    pub weights: WeightProfile,
    pub t_pit_loss: f64,
    pub t_loss_firstlap: f64,
    pub t_grid_gap: f64,
    pub tyre_stress: TyreStress,
    pub incident_factor: f64,
    pub high_incident_laps: Vec<u32>,
    pub weather: WeatherProfile,
    pub strategy_presets: Vec<StrategyPreset>,
}

impl Circuit {
    /// new validates the circuit parameters and resolves the rating weights from the scoring
    /// table unless the circuit defines its own.
    pub fn new(circuit_pars: &CircuitPars, scoring: &ScoringWeights) -> Result<Circuit> {
        let id = circuit_pars.id.as_str();
        let invalid = |reason: String| RaceSimError::circuit(id, reason);

        if circuit_pars.tot_no_laps == 0 {
            return Err(invalid("race distance must be at least one lap".to_owned()));
        }
        for (field, value) in [
            ("t_lap_base", circuit_pars.t_lap_base),
            ("t_pit_loss", circuit_pars.t_pit_loss),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("{} must be positive", field)));
            }
        }
        for (field, value) in [
            ("t_loss_firstlap", circuit_pars.t_loss_firstlap),
            ("t_grid_gap", circuit_pars.t_grid_gap),
            ("incident_factor", circuit_pars.incident_factor),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(format!("{} must not be negative", field)));
            }
        }
        if circuit_pars.strategy_presets.is_empty() {
            return Err(invalid("at least one strategy preset is required".to_owned()));
        }
        for preset in circuit_pars.strategy_presets.iter() {
            preset.validate().map_err(invalid)?;
        }
        circuit_pars.weather.validate().map_err(invalid)?;

        let weights = match circuit_pars.weights {
            Some(w) => {
                w.validate().map_err(invalid)?;
                w
            }
            None => *scoring.for_kind(circuit_pars.kind),
        };

        Ok(Circuit {
            id: circuit_pars.id.to_owned(),
            name: circuit_pars.name.to_owned(),
            location: circuit_pars.location.to_owned(),
            kind: circuit_pars.kind,
            tot_no_laps: circuit_pars.tot_no_laps,
            t_lap_base: circuit_pars.t_lap_base,
            weights,
            t_pit_loss: circuit_pars.t_pit_loss,
            t_loss_firstlap: circuit_pars.t_loss_firstlap,
            t_grid_gap: circuit_pars.t_grid_gap,
            tyre_stress: circuit_pars.tyre_stress,
            incident_factor: circuit_pars.incident_factor,
            high_incident_laps: circuit_pars.high_incident_laps.to_owned(),
            weather: circuit_pars.weather.to_owned(),
            strategy_presets: circuit_pars.strategy_presets.to_owned(),
        })
    }

    pub fn is_high_incident_lap(&self, lap: u32) -> bool {
        self.high_incident_laps.contains(&lap)
    }

    pub fn preset(&self, idx: usize) -> &StrategyPreset {
        &self.strategy_presets[idx.min(self.strategy_presets.len() - 1)]
    }
}
