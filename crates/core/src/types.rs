//! Domain types with enforced invariants.
//!
//! - Policy: probability distribution summing to 1.0
//! - Outcome: terminal payoff, one entry per player

use crate::{ContractError, Result};

/// Tolerance for policy sum validation.
const POLICY_SUM_TOLERANCE: f32 = 1e-5;

/// A probability distribution over action indices.
///
/// Invariant: All values are non-negative and sum to 1.0 (±1e-5).
///
/// # Example
/// ```
/// use alphazero_core::Policy;
///
/// let policy = Policy::from_unnormalized(vec![3.0, 1.0, 0.0]).unwrap();
/// assert!((policy[0] - 0.75).abs() < 1e-6);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Policy(Vec<f32>);

impl Policy {
    /// Create a new policy from a probability distribution.
    ///
    /// # Errors
    /// Returns `ContractError::InvalidPolicy` if the vector is empty, has a
    /// negative or non-finite entry, or does not sum to 1.0.
    pub fn new(probs: Vec<f32>) -> Result<Self> {
        check_entries(&probs)?;

        let sum: f32 = probs.iter().sum();
        if (sum - 1.0).abs() > POLICY_SUM_TOLERANCE {
            return Err(ContractError::InvalidPolicy(format!(
                "policy sum {} is not 1.0 (tolerance {})",
                sum, POLICY_SUM_TOLERANCE
            )));
        }

        Ok(Self(probs))
    }

    /// Create a policy from non-negative weights, normalizing them to sum to 1.0.
    ///
    /// # Errors
    /// Returns error if any weight is negative or all weights are zero.
    pub fn from_unnormalized(weights: Vec<f32>) -> Result<Self> {
        check_entries(&weights)?;

        let sum: f32 = weights.iter().sum();
        if sum <= 0.0 {
            return Err(ContractError::InvalidPolicy(
                "cannot normalize: all values are zero".to_string(),
            ));
        }

        Ok(Self(weights.into_iter().map(|w| w / sum).collect()))
    }

    /// Uniform policy over the actions marked `true` in `mask`.
    ///
    /// # Errors
    /// Returns error if no action is marked.
    pub fn uniform_over(mask: &[bool]) -> Result<Self> {
        Self::from_unnormalized(mask.iter().map(|&m| if m { 1.0 } else { 0.0 }).collect())
    }

    /// Index of the first maximum probability.
    pub fn argmax(&self) -> usize {
        let mut best = 0;
        for (i, &p) in self.0.iter().enumerate() {
            if p > self.0[best] {
                best = i;
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &f32> {
        self.0.iter()
    }
}

fn check_entries(values: &[f32]) -> Result<()> {
    if values.is_empty() {
        return Err(ContractError::InvalidPolicy(
            "policy cannot be empty".to_string(),
        ));
    }
    if values.iter().any(|&p| p < 0.0 || !p.is_finite()) {
        return Err(ContractError::InvalidPolicy(
            "policy contains negative or non-finite values".to_string(),
        ));
    }
    Ok(())
}

impl std::ops::Index<usize> for Policy {
    type Output = f32;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Terminal payoff of a game, indexed by absolute player id.
///
/// The sign convention is up to the game; the reference games use `+k` for
/// a win, `-1` for a loss and `0` for a draw.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome(Vec<f32>);

impl Outcome {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Outcome where `winner` receives `players - 1` and everyone else `-1`.
    pub fn winner(winner: usize, players: usize) -> Self {
        let mut values = vec![-1.0; players];
        values[winner] = (players as f32 - 1.0).max(1.0);
        Self(values)
    }

    /// Outcome where every player receives 0.
    pub fn draw(players: usize) -> Self {
        Self(vec![0.0; players])
    }

    /// Payoff of `player`.
    pub fn get(&self, player: usize) -> f32 {
        self.0[player]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &f32> {
        self.0.iter()
    }
}

impl From<Vec<f32>> for Outcome {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}
