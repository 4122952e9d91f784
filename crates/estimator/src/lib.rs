//! Learned estimators for AlphaZero self-play.
//!
//! This crate provides an estimator implementing the
//! `alphazero_mcts::Estimator` trait whose parameters are trained from the
//! trajectories the self-play loop produces.

mod linear;

pub use linear::{LinearConfig, LinearEstimator};
