//! Estimator abstraction for MCTS.
//!
//! The `Estimator` trait is the seam between search and the function
//! approximator:
//! - `UniformEstimator` and `RolloutEstimator` need no training
//! - learned estimators (see the `alphazero-estimator` crate) improve
//!   themselves from finished self-play trajectories

use crate::selfplay::Trajectory;
use alphazero_core::{ContractError, Game, Player, Result, Step};
use rand::seq::SliceRandom;
use rand::Rng;
use std::cell::RefCell;

/// Evaluation result: prior policy + value estimate.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// Prior probability for each action index.
    /// Length must equal `game.num_actions()`. Need not be masked.
    pub policy: Vec<f32>,

    /// Value estimate for every player, indexed by absolute player id.
    /// Length must equal `game.num_players()`.
    pub value: Vec<f32>,
}

impl Evaluation {
    /// Check the evaluation's shape against the game.
    pub fn check<G: Game>(&self, game: &G) -> Result<()> {
        if self.policy.len() != game.num_actions() {
            return Err(ContractError::PolicySize {
                expected: game.num_actions(),
                actual: self.policy.len(),
            });
        }
        if self.value.len() != game.num_players() {
            return Err(ContractError::ValueSize {
                expected: game.num_players(),
                actual: self.value.len(),
            });
        }
        if self.policy.iter().chain(&self.value).any(|v| !v.is_finite()) {
            return Err(ContractError::InvalidPolicy(
                "evaluation contains non-finite values".to_string(),
            ));
        }
        Ok(())
    }
}

/// A policy/value function approximator.
///
/// `evaluate` is called once per expanded search node; `update` receives
/// every batch of self-play games produced by the trainer.
pub trait Estimator<G: Game> {
    /// Evaluate a position, returning a prior policy and a value vector.
    fn evaluate(&self, game: &G, state: &G::State, player: Player) -> Result<Evaluation>;

    /// Improve the estimator from finished self-play games.
    fn update(&mut self, game: &G, games: &[Trajectory<G::State>]) -> Result<()>;
}

/// Estimator with a uniform prior and a neutral value.
///
/// The prior is uniform over all actions; masking is left to the search.
#[derive(Clone, Debug, Default)]
pub struct UniformEstimator;

impl UniformEstimator {
    pub fn new() -> Self {
        Self
    }
}

impl<G: Game> Estimator<G> for UniformEstimator {
    fn evaluate(&self, game: &G, _state: &G::State, _player: Player) -> Result<Evaluation> {
        let n = game.num_actions();
        Ok(Evaluation {
            policy: vec![1.0 / n as f32; n],
            value: vec![0.0; game.num_players()],
        })
    }

    fn update(&mut self, _game: &G, _games: &[Trajectory<G::State>]) -> Result<()> {
        Ok(())
    }
}

/// Estimator using a uniform legal prior and random playouts.
///
/// - Policy: uniform distribution over legal actions
/// - Value: outcome of a uniform-random playout from the position
pub struct RolloutEstimator<R: Rng> {
    /// Random number generator (wrapped in RefCell for interior mutability).
    rng: RefCell<R>,

    /// Maximum moves in a playout; longer games count as a draw.
    max_depth: usize,
}

impl<R: Rng> RolloutEstimator<R> {
    pub fn new(rng: R, max_depth: usize) -> Self {
        Self {
            rng: RefCell::new(rng),
            max_depth,
        }
    }

    /// Play uniformly random legal moves until the game ends.
    fn rollout<G: Game>(&self, game: &G, state: &G::State, player: Player) -> Result<Vec<f32>> {
        let mut rng = self.rng.borrow_mut();
        let mut state = state.clone();
        let mut player = player;

        for _ in 0..self.max_depth {
            let action = random_legal_action(game, &state, player, &mut *rng)?;
            match game.step(&state, player, action)? {
                Step::Finished(outcome) => return Ok(outcome.into_vec()),
                Step::Ongoing {
                    state: next,
                    player: next_player,
                } => {
                    state = next;
                    player = next_player;
                }
            }
        }

        Ok(vec![0.0; game.num_players()])
    }
}

impl<G: Game, R: Rng> Estimator<G> for RolloutEstimator<R> {
    fn evaluate(&self, game: &G, state: &G::State, player: Player) -> Result<Evaluation> {
        let mask = game.valid(state, player)?;
        let legal = mask.iter().filter(|&&m| m).count() as f32;
        let policy = mask
            .iter()
            .map(|&m| if m { 1.0 / legal } else { 0.0 })
            .collect();

        let value = self.rollout(game, state, player)?;

        Ok(Evaluation { policy, value })
    }

    fn update(&mut self, _game: &G, _games: &[Trajectory<G::State>]) -> Result<()> {
        Ok(())
    }
}

/// Pick a legal action uniformly at random.
pub fn random_legal_action<G: Game, R: Rng + ?Sized>(
    game: &G,
    state: &G::State,
    player: Player,
    rng: &mut R,
) -> Result<usize> {
    let mask = game.valid(state, player)?;
    let legal: Vec<usize> = (0..mask.len()).filter(|&a| mask[a]).collect();
    legal
        .choose(rng)
        .copied()
        .ok_or(ContractError::NoLegalActions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{Binary, Mnop, Narrow};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_uniform_estimator_shape() {
        let game = Mnop::tictactoe();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let (state, player) = game.start(&mut rng).unwrap();

        let eval = UniformEstimator::new().evaluate(&game, &state, player).unwrap();
        assert!(eval.check(&game).is_ok());
        for p in &eval.policy {
            assert!((p - 1.0 / 9.0).abs() < 1e-6);
        }
        assert_eq!(eval.value, vec![0.0, 0.0]);
    }

    #[test]
    fn test_rollout_estimator_masks_policy() {
        let game = Narrow;
        let estimator = RolloutEstimator::new(ChaCha8Rng::seed_from_u64(42), 10);

        let eval = estimator.evaluate(&game, &[2], 0).unwrap();
        assert!((eval.policy[0] - 0.5).abs() < 1e-6);
        assert!((eval.policy[1] - 0.5).abs() < 1e-6);
        assert_eq!(eval.policy[2], 0.0);
        assert_eq!(eval.value.len(), 1);
    }

    #[test]
    fn test_rollout_value_is_an_outcome() {
        let game = Binary;
        let estimator = RolloutEstimator::new(ChaCha8Rng::seed_from_u64(3), 10);

        for _ in 0..20 {
            let eval = estimator.evaluate(&game, &[], 0).unwrap();
            assert!(eval.value == vec![1.0] || eval.value == vec![-1.0]);
        }
    }

    #[test]
    fn test_evaluation_check_rejects_bad_shapes() {
        let game = Binary;
        let short = Evaluation {
            policy: vec![1.0],
            value: vec![0.0],
        };
        assert!(matches!(
            short.check(&game),
            Err(ContractError::PolicySize { expected: 2, actual: 1 })
        ));

        let wide = Evaluation {
            policy: vec![0.5, 0.5],
            value: vec![0.0, 0.0],
        };
        assert!(matches!(
            wide.check(&game),
            Err(ContractError::ValueSize { expected: 1, actual: 2 })
        ));
    }

    #[test]
    fn test_random_legal_action_respects_mask() {
        let game = Narrow;
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..50 {
            let action = random_legal_action(&game, &[1], 0, &mut rng).unwrap();
            assert_eq!(action, 0);
        }
    }
}
