//! AlphaZero-style Monte Carlo Tree Search and self-play training.
//!
//! This crate provides a generic search and training loop that works with
//! any game implementing `alphazero_core::Game` and any estimator
//! implementing [`Estimator`].
//!
//! # Features
//!
//! - **PUCT Selection**: illegal actions are excluded outright, never
//!   merely down-weighted
//! - **Per-player values**: value and outcome vectors are indexed by
//!   player id, so games with any number of players search correctly
//! - **Tree Reuse**: self-play carries the chosen subtree into the next move
//! - **Temperature Sampling**: visit counts become move distributions
//! - **Reference games and estimators** for testing the loop end to end
//!
//! # Example
//!
//! ```
//! use alphazero_core::Game;
//! use alphazero_mcts::{games::Mnop, Mcts, SearchConfig, SearchNode, UniformEstimator};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let game = Mnop::tictactoe();
//! let (state, player) = game.start(&mut ChaCha8Rng::seed_from_u64(42)).unwrap();
//!
//! let config = SearchConfig::default().with_simulations(100);
//! let mcts = Mcts::new(&game, &UniformEstimator, &config);
//!
//! let mut root = SearchNode::new();
//! let visits = mcts.search(&state, player, &mut root).unwrap();
//! assert_eq!(visits.iter().sum::<u32>(), 100);
//! ```

pub mod arena;
pub mod config;
pub mod estimator;
pub mod games;
mod node;
pub mod search;
pub mod selfplay;
pub mod trainer;

pub use arena::Arena;
pub use config::{SearchConfig, TrainConfig};
pub use estimator::{random_legal_action, Estimator, Evaluation, RolloutEstimator, UniformEstimator};
pub use node::{Expanded, SearchNode};
pub use search::Mcts;
pub use selfplay::{sample_action, temperature_policy, SelfPlay, Trajectory, TrajectoryStep};
pub use trainer::{RoundReport, Trainer};
