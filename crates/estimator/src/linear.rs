//! Affine policy/value estimator.
//!
//! One affine layer maps a position's view to `num_actions` policy logits
//! followed by `num_players` values:
//!
//! ```text
//! [logits | values] = view · W + b
//! policy = softmax(logits)
//! ```
//!
//! Training minimizes `c * CE(policy, pi) + (1 - c) * ||values - z||²` over
//! every recorded position, where `pi` is the search distribution and `z`
//! the game's outcome vector.

use alphazero_core::{ContractError, Game, Player, Result};
use alphazero_mcts::{Estimator, Evaluation, Trajectory};
use ndarray::{s, Array1, Array2, ArrayView1, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Training hyperparameters.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearConfig {
    /// Gradient step size.
    pub learning_rate: f32,

    /// Full passes over each batch of games.
    pub epochs: usize,

    /// Weight `c` of the policy loss; the value loss gets `1 - c`.
    pub policy_weight: f32,

    /// Weights start uniform in `[-init_scale, init_scale]`.
    pub init_scale: f32,

    pub seed: u64,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 10,
            policy_weight: 0.5,
            init_scale: 0.01,
            seed: 0,
        }
    }
}

impl LinearConfig {
    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Training batch: one row per recorded position.
struct Batch {
    views: Array2<f32>,
    policies: Array2<f32>,
    outcomes: Array2<f32>,
}

/// Single affine layer with a softmax policy head and a linear value head.
#[derive(Clone, Debug)]
pub struct LinearEstimator {
    /// Shape `(view_size, num_actions + num_players)`.
    weights: Array2<f32>,
    bias: Array1<f32>,
    num_actions: usize,
    num_players: usize,
    config: LinearConfig,
}

impl LinearEstimator {
    /// Create an estimator shaped for `game` with small random weights.
    pub fn new<G: Game>(game: &G, config: LinearConfig) -> Self {
        let inputs = game.view_size();
        let outputs = game.num_actions() + game.num_players();
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let scale = config.init_scale;
        let weights = if scale > 0.0 {
            Array2::from_shape_fn((inputs, outputs), |_| rng.gen_range(-scale..=scale))
        } else {
            Array2::zeros((inputs, outputs))
        };

        Self {
            weights,
            bias: Array1::zeros(outputs),
            num_actions: game.num_actions(),
            num_players: game.num_players(),
            config,
        }
    }

    pub fn config(&self) -> &LinearConfig {
        &self.config
    }

    fn inputs(&self) -> usize {
        self.weights.nrows()
    }

    /// Check that `game` has the shape this estimator was built for.
    fn check_shape<G: Game>(&self, game: &G) -> Result<()> {
        if game.view_size() != self.inputs() {
            return Err(ContractError::ViewSize {
                expected: self.inputs(),
                actual: game.view_size(),
            });
        }
        if game.num_actions() != self.num_actions {
            return Err(ContractError::PolicySize {
                expected: self.num_actions,
                actual: game.num_actions(),
            });
        }
        if game.num_players() != self.num_players {
            return Err(ContractError::ValueSize {
                expected: self.num_players,
                actual: game.num_players(),
            });
        }
        Ok(())
    }

    /// Raw outputs for a batch of views.
    fn forward(&self, views: &Array2<f32>) -> Array2<f32> {
        let mut out = views.dot(&self.weights);
        out += &self.bias;
        out
    }

    /// Stack every recorded position of `games` into training matrices.
    fn batch<G: Game>(&self, game: &G, games: &[Trajectory<G::State>]) -> Result<Batch> {
        let rows: usize = games.iter().map(Trajectory::len).sum();
        let mut views = Array2::zeros((rows, self.inputs()));
        let mut policies = Array2::zeros((rows, self.num_actions));
        let mut outcomes = Array2::zeros((rows, self.num_players));

        let mut row = 0;
        for trajectory in games {
            game.check_outcome(&trajectory.outcome)?;
            for step in &trajectory.steps {
                if step.policy.len() != self.num_actions {
                    return Err(ContractError::PolicySize {
                        expected: self.num_actions,
                        actual: step.policy.len(),
                    });
                }
                let view = game.view(&step.state, step.player)?;
                views.row_mut(row).assign(&ArrayView1::from(view.as_slice()));
                policies.row_mut(row).assign(&ArrayView1::from(step.policy.as_slice()));
                outcomes.row_mut(row).assign(&ArrayView1::from(trajectory.outcome.as_slice()));
                row += 1;
            }
        }

        Ok(Batch {
            views,
            policies,
            outcomes,
        })
    }

    /// Mean loss over every position in `games`.
    pub fn loss<G: Game>(&self, game: &G, games: &[Trajectory<G::State>]) -> Result<f32> {
        self.check_shape(game)?;
        let batch = self.batch(game, games)?;
        Ok(self.batch_loss(&batch))
    }

    fn batch_loss(&self, batch: &Batch) -> f32 {
        let rows = batch.views.nrows();
        if rows == 0 {
            return 0.0;
        }

        let c = self.config.policy_weight;
        let out = self.forward(&batch.views);
        let mut total = 0.0;
        for i in 0..rows {
            let policy = softmax(out.slice(s![i, ..self.num_actions]));
            let target = batch.policies.row(i);
            let xent: f32 = -policy
                .iter()
                .zip(target.iter())
                .map(|(&p, &q)| q * p.max(1e-12).ln())
                .sum::<f32>();

            let values = out.slice(s![i, self.num_actions..]);
            let mse: f32 = (&values - &batch.outcomes.row(i)).mapv(|d| d * d).sum();

            total += c * xent + (1.0 - c) * mse;
        }
        total / rows as f32
    }

    /// One full-batch gradient step.
    fn descend(&mut self, batch: &Batch) {
        let rows = batch.views.nrows();
        let c = self.config.policy_weight;
        let out = self.forward(&batch.views);

        let mut grad = Array2::<f32>::zeros(out.raw_dim());
        for i in 0..rows {
            let policy = softmax(out.slice(s![i, ..self.num_actions]));
            let dlogits = (&policy - &batch.policies.row(i)) * c;
            grad.slice_mut(s![i, ..self.num_actions]).assign(&dlogits);

            let values = out.slice(s![i, self.num_actions..]);
            let dvalues = (&values - &batch.outcomes.row(i)) * (2.0 * (1.0 - c));
            grad.slice_mut(s![i, self.num_actions..]).assign(&dvalues);
        }
        grad /= rows as f32;

        let lr = self.config.learning_rate;
        let dweights = batch.views.t().dot(&grad);
        self.weights.scaled_add(-lr, &dweights);
        self.bias.scaled_add(-lr, &grad.sum_axis(Axis(0)));
    }
}

/// Numerically stable softmax.
fn softmax(logits: ArrayView1<f32>) -> Array1<f32> {
    let max = logits.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
    let exp = logits.mapv(|x| (x - max).exp());
    let sum = exp.sum();
    exp / sum
}

impl<G: Game> Estimator<G> for LinearEstimator {
    fn evaluate(&self, game: &G, state: &G::State, player: Player) -> Result<Evaluation> {
        self.check_shape(game)?;
        let view = game.view(state, player)?;

        let mut out = ArrayView1::from(view.as_slice()).dot(&self.weights);
        out += &self.bias;

        let policy = softmax(out.slice(s![..self.num_actions])).to_vec();
        let value = out.slice(s![self.num_actions..]).to_vec();
        Ok(Evaluation { policy, value })
    }

    fn update(&mut self, game: &G, games: &[Trajectory<G::State>]) -> Result<()> {
        self.check_shape(game)?;
        let batch = self.batch(game, games)?;
        if batch.views.nrows() == 0 {
            return Ok(());
        }

        let before = self.batch_loss(&batch);
        for _ in 0..self.config.epochs {
            self.descend(&batch);
        }
        let after = self.batch_loss(&batch);

        debug!(
            positions = batch.views.nrows(),
            epochs = self.config.epochs,
            loss_before = before,
            loss_after = after,
            "Estimator updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphazero_core::Outcome;
    use alphazero_mcts::games::{Binary, Flip, Mnop};
    use alphazero_mcts::{SearchConfig, SelfPlay, TrainConfig, Trainer, TrajectoryStep, UniformEstimator};

    fn binary_games(count: usize) -> Vec<Trajectory<[i8; 0]>> {
        (0..count)
            .map(|_| Trajectory {
                steps: vec![TrajectoryStep {
                    state: [],
                    player: 0,
                    policy: vec![0.0, 1.0],
                }],
                outcome: Outcome::new(vec![1.0]),
            })
            .collect()
    }

    #[test]
    fn test_evaluation_shape() {
        let game = Mnop::tictactoe();
        let estimator = LinearEstimator::new(&game, LinearConfig::default());
        let eval = estimator.evaluate(&game, &vec![-1; 9], 0).unwrap();

        assert!(eval.check(&game).is_ok());
        assert!((eval.policy.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(eval.policy.iter().all(|&p| p > 0.0));
    }

    #[test]
    fn test_zero_weights_are_uniform() {
        let game = Mnop::tictactoe();
        let config = LinearConfig {
            init_scale: 0.0,
            ..Default::default()
        };
        let estimator = LinearEstimator::new(&game, config);
        let eval = estimator.evaluate(&game, &vec![-1; 9], 0).unwrap();

        for &p in &eval.policy {
            assert!((p - 1.0 / 9.0).abs() < 1e-6);
        }
        assert_eq!(eval.value, vec![0.0, 0.0]);
    }

    #[test]
    fn test_game_shape_mismatch_is_rejected() {
        let estimator = LinearEstimator::new(&Mnop::tictactoe(), LinearConfig::default());
        let bigger = Mnop::new(4, 4, 3, 2).unwrap();
        assert!(matches!(
            estimator.evaluate(&bigger, &vec![-1; 16], 0),
            Err(ContractError::ViewSize { expected: 18, actual: 32 })
        ));
    }

    #[test]
    fn test_update_reduces_loss() {
        let game = Binary;
        let games = binary_games(4);
        let mut estimator = LinearEstimator::new(&game, LinearConfig::default());

        let before = estimator.loss(&game, &games).unwrap();
        estimator.update(&game, &games).unwrap();
        let after = estimator.loss(&game, &games).unwrap();
        assert!(after < before, "loss went from {} to {}", before, after);
    }

    #[test]
    fn test_learns_one_ply_game() {
        let game = Binary;
        let games = binary_games(8);
        let config = LinearConfig::default().with_learning_rate(0.5).with_epochs(50);
        let mut estimator = LinearEstimator::new(&game, config);
        estimator.update(&game, &games).unwrap();

        let eval = estimator.evaluate(&game, &[], 0).unwrap();
        assert!(eval.policy[1] > 0.9, "policy {:?}", eval.policy);
        assert!(eval.value[0] > 0.9, "value {:?}", eval.value);
    }

    #[test]
    fn test_empty_view_game_trains_bias() {
        let game = Flip;
        let config = SearchConfig::for_testing();
        let selfplay = SelfPlay::new(&game, &UniformEstimator, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let games: Vec<_> = (0..5).map(|_| selfplay.play(&mut rng).unwrap()).collect();

        let mut estimator = LinearEstimator::new(&game, LinearConfig::default());
        estimator.update(&game, &games).unwrap();
        let eval = estimator.evaluate(&game, &[0], 0).unwrap();
        assert!((eval.policy.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_malformed_trajectory_is_rejected() {
        let game = Binary;
        let mut games = binary_games(1);
        games[0].steps[0].policy = vec![1.0];
        let mut estimator = LinearEstimator::new(&game, LinearConfig::default());
        assert!(matches!(
            estimator.update(&game, &games),
            Err(ContractError::PolicySize { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_trains_inside_the_loop() {
        let game = Mnop::tictactoe();
        let estimator = LinearEstimator::new(&game, LinearConfig::default());
        let mut trainer = Trainer::new(game, estimator, TrainConfig::for_testing());

        let reports = trainer.train().unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.games == 3));
    }
}
