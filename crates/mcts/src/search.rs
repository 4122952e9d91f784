//! Monte Carlo Tree Search with PUCT selection.
//!
//! Each simulation walks down the tree from the root, picking actions with
//! [`SearchNode::select`] and advancing the game through its checked
//! `step`, until it either reaches a leaf (which is evaluated and expanded)
//! or finishes the game. The resulting value vector is backed up on every
//! node of the path, innermost first.
//!
//! Values are vectors indexed by absolute player id. A node backs up the
//! component of the player to move at that node, so no negation is needed
//! when players alternate and games with more than two players need no
//! special handling.

use crate::config::SearchConfig;
use crate::estimator::{Estimator, Evaluation};
use crate::node::SearchNode;
use alphazero_core::{Game, Player, Result, Step};
use tracing::{debug, trace};

/// Search driver. Borrows the game, the estimator and the configuration;
/// the tree itself is passed to every call so it can be reused.
pub struct Mcts<'a, G: Game, E: Estimator<G>> {
    game: &'a G,
    estimator: &'a E,
    config: &'a SearchConfig,
}

impl<'a, G: Game, E: Estimator<G>> Mcts<'a, G, E> {
    pub fn new(game: &'a G, estimator: &'a E, config: &'a SearchConfig) -> Self {
        Self {
            game,
            estimator,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        self.config
    }

    /// Run `config.simulations` simulations from `root` and return its
    /// per-action visit counts.
    ///
    /// `root` may already carry statistics from an earlier search; they
    /// keep accumulating. An unexpanded root is expanded first, which does
    /// not count as a simulation, so a search from a fresh root ends with
    /// exactly `config.simulations` root visits.
    pub fn search(&self, state: &G::State, player: Player, root: &mut SearchNode) -> Result<Vec<u32>> {
        if !root.is_expanded() {
            self.expand(state, player, root)?;
        }

        for simulation in 0..self.config.simulations {
            let value = self.simulate(state, player, root)?;
            trace!(simulation, ?value, "Simulation finished");
        }

        let visits = root.visit_counts(self.game.num_actions());
        debug!(
            player,
            simulations = self.config.simulations,
            ?visits,
            "Search complete"
        );
        Ok(visits)
    }

    /// Run one simulation from `node` and return the value vector it
    /// produced.
    ///
    /// A leaf is evaluated and expanded, and the estimator's value is
    /// returned without advancing the game. An expanded node selects an
    /// action, steps the game, and either takes the terminal outcome or
    /// recurses into the child. No child is created for a finished game.
    pub fn simulate(&self, state: &G::State, player: Player, node: &mut SearchNode) -> Result<Vec<f32>> {
        if !node.is_expanded() {
            return self.expand(state, player, node);
        }

        let action = node.select(self.config.c_puct);
        let value = match self.game.step(state, player, action)? {
            Step::Finished(outcome) => outcome.into_vec(),
            Step::Ongoing {
                state: next,
                player: next_player,
            } => self.simulate(&next, next_player, node.child(action))?,
        };

        node.backup(action, value[player]);
        Ok(value)
    }

    /// Evaluate a leaf, expand it and return the estimator's value vector.
    fn expand(&self, state: &G::State, player: Player, node: &mut SearchNode) -> Result<Vec<f32>> {
        let evaluation = self.estimator.evaluate(self.game, state, player)?;
        evaluation.check(self.game)?;
        let valid = self.game.valid(state, player)?;

        let Evaluation { policy, value } = evaluation;
        node.expand(policy, value.clone(), valid);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{RolloutEstimator, UniformEstimator};
    use crate::games::{Binary, Mnop, Modulo, Narrow};
    use crate::selfplay::Trajectory;
    use alphazero_core::ContractError;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Estimator that returns a policy of the wrong length.
    struct Truncated;

    impl<G: Game> Estimator<G> for Truncated {
        fn evaluate(&self, game: &G, _state: &G::State, _player: Player) -> Result<Evaluation> {
            Ok(Evaluation {
                policy: vec![1.0],
                value: vec![0.0; game.num_players()],
            })
        }

        fn update(&mut self, _game: &G, _games: &[Trajectory<G::State>]) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_fresh_root_gets_one_visit_per_simulation() {
        let game = Mnop::tictactoe();
        let config = SearchConfig::default().with_simulations(64);
        let mcts = Mcts::new(&game, &UniformEstimator, &config);

        let mut root = SearchNode::new();
        let visits = mcts.search(&vec![-1; 9], 0, &mut root).unwrap();

        assert_eq!(visits.iter().sum::<u32>(), 64);
        assert_eq!(root.stats().unwrap().total_visits(), 64);
    }

    #[test]
    fn test_one_ply_game_prefers_winning_action() {
        let game = Binary;
        let config = SearchConfig::default().with_simulations(50);
        let mcts = Mcts::new(&game, &UniformEstimator, &config);

        let mut root = SearchNode::new();
        let visits = mcts.search(&[], 0, &mut root).unwrap();
        let stats = root.stats().unwrap();

        assert!(stats.mean_value()[1] > stats.mean_value()[0]);
        assert!(visits[1] > visits[0]);
        // Terminal transitions never allocate a child.
        assert_eq!(stats.num_children(), 0);
    }

    #[test]
    fn test_reused_root_keeps_accumulating() {
        let game = Mnop::tictactoe();
        let config = SearchConfig::default().with_simulations(30);
        let mcts = Mcts::new(&game, &UniformEstimator, &config);

        let mut root = SearchNode::new();
        let state = vec![-1; 9];
        mcts.search(&state, 0, &mut root).unwrap();
        let visits = mcts.search(&state, 0, &mut root).unwrap();

        assert_eq!(visits.iter().sum::<u32>(), 60);
    }

    #[test]
    fn test_takes_immediate_win() {
        // 0 0 .
        // 1 1 .
        // . . .
        let game = Mnop::tictactoe();
        let state = vec![0, 0, -1, 1, 1, -1, -1, -1, -1];
        let config = SearchConfig::default().with_simulations(200);
        let mcts = Mcts::new(&game, &UniformEstimator, &config);

        let mut root = SearchNode::new();
        let visits = mcts.search(&state, 0, &mut root).unwrap();
        let best = (0..9).max_by_key(|&a| (visits[a], std::cmp::Reverse(a))).unwrap();
        assert_eq!(best, 2);
    }

    #[test]
    fn test_three_players_score_their_own_component() {
        let game = Modulo;
        let config = SearchConfig::default().with_simulations(300);
        let mcts = Mcts::new(&game, &UniformEstimator, &config);

        // Player 2 moves last with the total at 1: adding 1 makes 2 win.
        let mut root = SearchNode::new();
        let visits = mcts.search(&[1, 2], 2, &mut root).unwrap();
        assert!(visits[1] > visits[0] && visits[1] > visits[2]);
        assert!((root.stats().unwrap().mean_value()[1] - 1.0).abs() < 1e-6);

        // One level up, player 2's node under player 1's move still
        // favors player 2's win rather than player 1's.
        let mut root = SearchNode::new();
        mcts.search(&[0, 1], 1, &mut root).unwrap();
        let reply = root.stats().unwrap().child(0).unwrap().stats().unwrap();
        let visits = reply.visits();
        assert!(visits[2] > visits[0] && visits[2] > visits[1]);
        assert!(root.stats().unwrap().mean_value()[0] < 0.0);
    }

    #[test]
    fn test_search_never_steps_illegal_actions() {
        let game = Narrow;
        let config = SearchConfig::default().with_simulations(100).with_c_puct(10.0);
        let estimator = RolloutEstimator::new(ChaCha8Rng::seed_from_u64(1), 10);
        let mcts = Mcts::new(&game, &estimator, &config);

        let mut root = SearchNode::new();
        let visits = mcts.search(&[2], 0, &mut root).unwrap();
        assert_eq!(visits[2], 0);
        assert_eq!(visits[0] + visits[1], 100);
    }

    #[test]
    fn test_malformed_estimator_aborts_search() {
        let game = Binary;
        let config = SearchConfig::for_testing();
        let mcts = Mcts::new(&game, &Truncated, &config);

        let mut root = SearchNode::new();
        assert_eq!(
            mcts.search(&[], 0, &mut root),
            Err(ContractError::PolicySize {
                expected: 2,
                actual: 1
            })
        );
        assert!(!root.is_expanded());
    }

    #[test]
    fn test_search_is_deterministic_for_a_seed() {
        let game = Mnop::tictactoe();
        let config = SearchConfig::default().with_simulations(50);

        let run = |seed: u64| {
            let estimator = RolloutEstimator::new(ChaCha8Rng::seed_from_u64(seed), 20);
            let mcts = Mcts::new(&game, &estimator, &config);
            mcts.search(&vec![-1; 9], 0, &mut SearchNode::new()).unwrap()
        };

        assert_eq!(run(12345), run(12345));
    }
}
