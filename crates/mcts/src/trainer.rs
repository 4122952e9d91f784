//! Outer training loop: evaluate, self-play, update.

use crate::arena::Arena;
use crate::config::TrainConfig;
use crate::estimator::Estimator;
use crate::selfplay::{SelfPlay, Trajectory};
use alphazero_core::{Game, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

/// Summary of one training round.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoundReport {
    pub round: u32,
    /// Score against the random baseline before this round's update.
    pub win_rate: f32,
    /// Self-play games generated.
    pub games: usize,
    /// Total moves across those games.
    pub moves: usize,
}

/// Trains an estimator by self-play for a fixed number of rounds.
pub struct Trainer<G: Game, E: Estimator<G>> {
    game: G,
    estimator: E,
    config: TrainConfig,
}

impl<G: Game, E: Estimator<G>> Trainer<G, E> {
    pub fn new(game: G, estimator: E, config: TrainConfig) -> Self {
        Self {
            game,
            estimator,
            config,
        }
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Consume the trainer, returning the trained estimator.
    pub fn into_estimator(self) -> E {
        self.estimator
    }

    /// Run every round and return one report per round.
    ///
    /// There is no early stopping; the first contract violation aborts
    /// the run.
    pub fn train(&mut self) -> Result<Vec<RoundReport>> {
        self.config.validate()?;

        let mut reports = Vec::with_capacity(self.config.rounds as usize);
        for round in 0..self.config.rounds {
            let report = self.round(round)?;
            info!(
                round = report.round,
                win_rate = report.win_rate,
                games = report.games,
                moves = report.moves,
                "Round complete"
            );
            reports.push(report);
        }
        Ok(reports)
    }

    fn round(&mut self, round: u32) -> Result<RoundReport> {
        let config = &self.config;
        let eval_seed = config.seed.wrapping_add(u64::from(round) << 32).wrapping_add(1 << 31);
        let win_rate = Arena::new(&self.game, &self.estimator, &config.search)
            .win_rate(config.eval_games, eval_seed)?;

        let games = self.generate(round)?;
        let moves: usize = games.iter().map(Trajectory::len).sum();

        self.estimator.update(&self.game, &games)?;

        Ok(RoundReport {
            round,
            win_rate,
            games: games.len(),
            moves,
        })
    }

    /// Self-play `games_per_round` games, each with its own derived seed.
    fn generate(&self, round: u32) -> Result<Vec<Trajectory<G::State>>> {
        let config = &self.config;
        let selfplay = SelfPlay::new(&self.game, &self.estimator, &config.search);

        (0..config.games_per_round)
            .map(|i| {
                let index = u64::from(round) * u64::from(config.games_per_round) + u64::from(i);
                let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(index * 1000));
                selfplay.play(&mut rng)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::estimator::{Evaluation, UniformEstimator};
    use crate::games::{Binary, Mnop};
    use alphazero_core::{ContractError, Player};

    /// Records the size of every batch it is trained on.
    #[derive(Default)]
    struct Recorder {
        batches: Vec<usize>,
    }

    impl<G: Game> Estimator<G> for Recorder {
        fn evaluate(&self, game: &G, state: &G::State, player: Player) -> Result<Evaluation> {
            UniformEstimator.evaluate(game, state, player)
        }

        fn update(&mut self, _game: &G, games: &[Trajectory<G::State>]) -> Result<()> {
            self.batches.push(games.len());
            Ok(())
        }
    }

    #[test]
    fn test_train_runs_every_round() {
        let config = TrainConfig::for_testing();
        let mut trainer = Trainer::new(Mnop::tictactoe(), Recorder::default(), config);

        let reports = trainer.train().unwrap();
        assert_eq!(reports.len(), 2);
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.round, i as u32);
            assert_eq!(report.games, 3);
            assert!(report.moves >= 3 * 5);
            assert!((0.0..=1.0).contains(&report.win_rate));
        }
        assert_eq!(trainer.estimator().batches, vec![3, 3]);
    }

    #[test]
    fn test_one_ply_game_always_wins() {
        let config = TrainConfig::for_testing()
            .with_search(SearchConfig::default().with_simulations(10));
        let mut trainer = Trainer::new(Binary, UniformEstimator, config);

        for report in trainer.train().unwrap() {
            assert_eq!(report.win_rate, 1.0);
            assert_eq!(report.moves, report.games);
        }
    }

    #[test]
    fn test_training_is_reproducible() {
        let run = || {
            let config = TrainConfig::for_testing();
            Trainer::new(Mnop::tictactoe(), UniformEstimator, config)
                .train()
                .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = TrainConfig::for_testing();
        config.eval_games = 0;
        let mut trainer = Trainer::new(Binary, UniformEstimator, config);
        assert!(matches!(trainer.train(), Err(ContractError::InvalidConfig(_))));
    }
}
