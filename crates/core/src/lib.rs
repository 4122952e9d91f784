//! AlphaZero Core - Game contract and common types
//!
//! This crate provides the [`Game`] trait that every game must implement to
//! be searched and trained on by the AlphaZero loop, together with the
//! checked wrappers that validate whatever a game hands back.
//!
//! # Types
//!
//! - [`Game`] - Trait for game implementations
//! - [`Step`] - Result of a transition: ongoing or finished
//! - [`Outcome`] - Terminal payoff, one entry per player
//! - [`Policy`] - Probability distribution over actions (sums to 1.0)

mod error;
mod game;
mod types;

pub use error::{ContractError, Result};
pub use game::{Game, Player, Step};
pub use types::{Outcome, Policy};
