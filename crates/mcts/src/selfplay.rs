//! Self-play driver.
//!
//! Plays one complete game with the search choosing every move, records
//! the search distribution of each position, and reuses the subtree of
//! the chosen action as the next root.

use crate::config::SearchConfig;
use crate::estimator::Estimator;
use crate::node::SearchNode;
use crate::search::Mcts;
use alphazero_core::{ContractError, Game, Outcome, Player, Policy, Result, Step};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use tracing::debug;

/// One recorded position of a self-play game.
#[derive(Clone, Debug, PartialEq)]
pub struct TrajectoryStep<S> {
    pub state: S,
    /// Player to move in `state`.
    pub player: Player,
    /// Search distribution the move was drawn from.
    pub policy: Vec<f32>,
}

/// A finished self-play game.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory<S> {
    pub steps: Vec<TrajectoryStep<S>>,
    pub outcome: Outcome,
}

impl<S> Trajectory<S> {
    /// Number of moves played.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Turn visit counts into a move distribution.
///
/// `pi[a] ∝ N(a)^(1/tau)` over legal actions. `tau <= 0` is greedy: a one-hot
/// on the first most-visited legal action. When no legal action has been
/// visited at all the distribution is uniform over legal actions.
///
/// # Errors
/// Returns `MaskSize` if `valid` and `visits` differ in length and
/// `NoLegalActions` if nothing is legal.
pub fn temperature_policy(visits: &[u32], valid: &[bool], tau: f32) -> Result<Policy> {
    if visits.len() != valid.len() {
        return Err(ContractError::MaskSize {
            expected: visits.len(),
            actual: valid.len(),
        });
    }
    if !valid.iter().any(|&v| v) {
        return Err(ContractError::NoLegalActions);
    }

    let legal_visits = visits.iter().zip(valid).filter(|&(_, &v)| v).map(|(&n, _)| n);
    let most = legal_visits.max().unwrap_or(0);
    if most == 0 {
        return Policy::uniform_over(valid);
    }

    if tau <= 0.0 {
        let mut best: Option<usize> = None;
        for a in 0..visits.len() {
            if valid[a] && best.map_or(true, |b| visits[a] > visits[b]) {
                best = Some(a);
            }
        }
        let mut one_hot = vec![0.0; visits.len()];
        if let Some(best) = best {
            one_hot[best] = 1.0;
        }
        return Policy::new(one_hot);
    }

    // Counts are scaled by the largest one so every weight stays in [0, 1].
    let exponent = 1.0 / f64::from(tau);
    let most = f64::from(most);
    let weights: Vec<f32> = visits
        .iter()
        .zip(valid)
        .map(|(&n, &v)| if v { (f64::from(n) / most).powf(exponent) as f32 } else { 0.0 })
        .collect();
    Policy::from_unnormalized(weights)
}

/// Draw an action from `policy`.
///
/// # Panics
/// Panics if the drawn action is not legal, which means the policy put
/// mass on an illegal action.
pub fn sample_action<R: Rng + ?Sized>(policy: &Policy, valid: &[bool], rng: &mut R) -> Result<usize> {
    let dist = WeightedIndex::new(policy.as_slice())
        .map_err(|e| ContractError::InvalidPolicy(e.to_string()))?;
    let action = dist.sample(rng);
    assert!(valid[action], "BUG: sampled illegal action {}", action);
    Ok(action)
}

/// Plays complete games of `G` against itself.
pub struct SelfPlay<'a, G: Game, E: Estimator<G>> {
    game: &'a G,
    mcts: Mcts<'a, G, E>,
}

impl<'a, G: Game, E: Estimator<G>> SelfPlay<'a, G, E> {
    pub fn new(game: &'a G, estimator: &'a E, config: &'a SearchConfig) -> Self {
        Self {
            game,
            mcts: Mcts::new(game, estimator, config),
        }
    }

    /// Play one game from the start and return its trajectory.
    pub fn play<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Trajectory<G::State>> {
        let (mut state, mut player) = self.game.start(rng)?;
        let mut root = SearchNode::new();
        let mut steps = Vec::new();
        let tau = self.mcts.config().temperature;

        loop {
            let visits = self.mcts.search(&state, player, &mut root)?;
            let valid = self.game.valid(&state, player)?;
            let policy = temperature_policy(&visits, &valid, tau)?;
            let action = sample_action(&policy, &valid, rng)?;
            debug!(move_number = steps.len(), player, action, "Self-play move");

            let next = self.game.step(&state, player, action)?;
            steps.push(TrajectoryStep {
                state,
                player,
                policy: policy.into_inner(),
            });

            match next {
                Step::Finished(outcome) => {
                    debug!(moves = steps.len(), outcome = ?outcome.as_slice(), "Self-play game finished");
                    return Ok(Trajectory { steps, outcome });
                }
                Step::Ongoing {
                    state: next_state,
                    player: next_player,
                } => {
                    root = root.into_child(action);
                    state = next_state;
                    player = next_player;
                }
            }
        }
    }
}
