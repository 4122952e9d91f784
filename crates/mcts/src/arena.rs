//! Progress check: search against a uniform-random opponent.
//!
//! The win rate is a training signal only; nothing gates on it.

use crate::config::SearchConfig;
use crate::estimator::{random_legal_action, Estimator};
use crate::node::SearchNode;
use crate::search::Mcts;
use crate::selfplay::temperature_policy;
use alphazero_core::{Game, Outcome, Player, Result, Step};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Plays search-driven seats against random seats.
pub struct Arena<'a, G: Game, E: Estimator<G>> {
    game: &'a G,
    mcts: Mcts<'a, G, E>,
}

impl<'a, G: Game, E: Estimator<G>> Arena<'a, G, E> {
    pub fn new(game: &'a G, estimator: &'a E, config: &'a SearchConfig) -> Self {
        Self {
            game,
            mcts: Mcts::new(game, estimator, config),
        }
    }

    /// Play `games` games and return the search seat's score in `[0, 1]`.
    ///
    /// Game `i` gives the search seat `i % num_players`, so seats rotate.
    /// A win scores 1, a draw 0.5 and a loss 0. Game `i` is seeded with
    /// `seed + i * 1000`.
    pub fn win_rate(&self, games: u32, seed: u64) -> Result<f32> {
        if games == 0 {
            return Ok(0.0);
        }

        let mut score = 0.0;
        for i in 0..games {
            let seat = i as usize % self.game.num_players();
            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(u64::from(i) * 1000));
            let outcome = self.play(seat, &mut rng)?;
            let result = signed_score(outcome.get(seat));
            debug!(game = i, seat, result, "Evaluation game finished");
            score += result;
        }

        let win_rate = score / games as f32;
        info!(games, win_rate, "Evaluation complete");
        Ok(win_rate)
    }

    /// Play one game with `seat` searching and every other seat random.
    ///
    /// The search seat starts a fresh tree every move and plays its most
    /// visited action.
    pub fn play<R: Rng + ?Sized>(&self, seat: Player, rng: &mut R) -> Result<Outcome> {
        let (mut state, mut player) = self.game.start(rng)?;

        loop {
            let action = if player == seat {
                let mut root = SearchNode::new();
                let visits = self.mcts.search(&state, player, &mut root)?;
                let valid = self.game.valid(&state, player)?;
                temperature_policy(&visits, &valid, 0.0)?.argmax()
            } else {
                random_legal_action(self.game, &state, player, rng)?
            };

            match self.game.step(&state, player, action)? {
                Step::Finished(outcome) => return Ok(outcome),
                Step::Ongoing {
                    state: next,
                    player: next_player,
                } => {
                    state = next;
                    player = next_player;
                }
            }
        }
    }
}

/// Map a payoff to 1 (win), 0.5 (draw) or 0 (loss) by its sign.
fn signed_score(payoff: f32) -> f32 {
    if payoff > 0.0 {
        1.0
    } else if payoff < 0.0 {
        0.0
    } else {
        0.5
    }
}
