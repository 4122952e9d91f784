//! Search and training configuration.
//!
//! Configuration is passed explicitly into the search, self-play driver and
//! trainer at construction, so several configurations can coexist in one
//! process. Values can be loaded from a TOML file; missing keys fall back
//! to the reference defaults.

use alphazero_core::{ContractError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Parameters of a single MCTS search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// PUCT exploration coefficient.
    /// Higher values favor unvisited/high-prior actions over high mean values.
    pub c_puct: f32,

    /// Number of simulations per search.
    pub simulations: u32,

    /// Temperature for turning visit counts into a move distribution.
    /// - 0.0: always pick the most visited action (greedy)
    /// - 1.0: sample proportional to visit counts
    pub temperature: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            c_puct: 1.5,
            simulations: 100,
            temperature: 1.0,
        }
    }
}

impl SearchConfig {
    /// A small, fast config for tests.
    pub fn for_testing() -> Self {
        Self {
            simulations: 25,
            ..Default::default()
        }
    }

    /// Builder pattern: set number of simulations.
    pub fn with_simulations(mut self, n: u32) -> Self {
        self.simulations = n;
        self
    }

    /// Builder pattern: set c_puct exploration constant.
    pub fn with_c_puct(mut self, c: f32) -> Self {
        self.c_puct = c;
        self
    }

    /// Builder pattern: set temperature.
    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.c_puct.is_finite() || self.c_puct < 0.0 {
            return Err(ContractError::InvalidConfig(format!(
                "c_puct must be a non-negative number, got {}",
                self.c_puct
            )));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(ContractError::InvalidConfig(format!(
                "temperature must be a non-negative number, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Parameters of the outer training loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Number of {evaluate, self-play, update} rounds.
    pub rounds: u32,

    /// Self-play games generated per round.
    pub games_per_round: u32,

    /// Games played against the random baseline per evaluation.
    pub eval_games: u32,

    /// Base seed; every game derives its own seed from it.
    pub seed: u64,

    pub search: SearchConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            rounds: 25,
            games_per_round: 10,
            eval_games: 10,
            seed: 42,
            search: SearchConfig::default(),
        }
    }
}

impl TrainConfig {
    /// A small, fast config for tests.
    pub fn for_testing() -> Self {
        Self {
            rounds: 2,
            games_per_round: 3,
            eval_games: 4,
            seed: 7,
            search: SearchConfig::for_testing(),
        }
    }

    /// Builder pattern: set number of rounds.
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    /// Builder pattern: set the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder pattern: replace the search parameters.
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.eval_games == 0 {
            return Err(ContractError::InvalidConfig(
                "eval_games must be at least 1".to_string(),
            ));
        }
        self.search.validate()
    }

    /// Parse a config from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ContractError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ContractError::InvalidConfig(format!("failed to read {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loaded training config");
        Self::from_toml_str(&text)
    }
}
