//! Self-play training driver for AlphaZero.
//!
//! Picks a reference game and an estimator, loads the training config and
//! runs the evaluate / self-play / update loop, optionally writing the
//! per-round reports as JSON.

use alphazero_core::Game;
use alphazero_estimator::{LinearConfig, LinearEstimator};
use alphazero_mcts::games::{
    Binary, Count, Flip, Matching, MetaMnop, Mnop, Modulo, Narrow, Roshambo,
};
use alphazero_mcts::{Arena, Estimator, RolloutEstimator, RoundReport, TrainConfig, Trainer, UniformEstimator};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use tracing::info;

/// AlphaZero self-play trainer.
#[derive(Parser)]
#[command(name = "azero")]
#[command(about = "Train and evaluate AlphaZero estimators on small games")]
struct Cli {
    /// Log level (overridden by RUST_LOG).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full training loop.
    Train {
        #[command(flatten)]
        setup: Setup,

        /// Write the round reports to this file as JSON.
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Score the (untrained) estimator's search against random play.
    Evaluate {
        #[command(flatten)]
        setup: Setup,

        /// Number of games to play (defaults to the config's eval_games).
        #[arg(short, long)]
        games: Option<u32>,
    },
}

/// Options shared by every command.
#[derive(Args, Clone)]
struct Setup {
    /// Game to play.
    #[arg(long, value_enum, default_value = "tictactoe")]
    game: GameKind,

    /// Board shape for `--game mnop`: width, height, line, players.
    #[arg(long, value_delimiter = ',', default_values_t = [3, 3, 3, 2])]
    board: Vec<usize>,

    /// Estimator guiding the search.
    #[arg(long, value_enum, default_value = "linear")]
    estimator: EstimatorKind,

    /// TOML training config (falls back to AZERO_CONFIG, then defaults).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of training rounds.
    #[arg(long)]
    rounds: Option<u32>,

    /// MCTS simulations per move.
    #[arg(short, long)]
    simulations: Option<u32>,

    /// Base random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum playout length for the rollout estimator.
    #[arg(long, default_value = "100")]
    rollout_depth: usize,

    /// Learning rate for the linear estimator.
    #[arg(long, default_value = "0.1")]
    learning_rate: f32,

    /// Gradient passes per batch for the linear estimator.
    #[arg(long, default_value = "10")]
    epochs: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
enum GameKind {
    Binary,
    Flip,
    Count,
    Narrow,
    Matching,
    Roshambo,
    Modulo,
    Tictactoe,
    Mnop,
    Ultimate,
}

#[derive(Clone, Copy, Debug, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
enum EstimatorKind {
    Uniform,
    Rollout,
    Linear,
}

/// Everything written by `--report`.
#[derive(Serialize)]
struct Report<'a> {
    game: GameKind,
    estimator: EstimatorKind,
    config: &'a TrainConfig,
    rounds: &'a [RoundReport],
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Parse `key` from the environment, if set.
fn env_override<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid value for {}: {:?}", key, value)),
        Err(_) => Ok(None),
    }
}

/// Resolve the training config: file, then environment, then flags.
fn load_config(setup: &Setup) -> Result<TrainConfig> {
    let path = match &setup.config {
        Some(path) => Some(path.clone()),
        None => env_override::<PathBuf>("AZERO_CONFIG")?,
    };

    let mut config = match &path {
        Some(path) => TrainConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => TrainConfig::default(),
    };

    if let Some(rounds) = env_override("AZERO_ROUNDS")? {
        config.rounds = rounds;
    }
    if let Some(simulations) = env_override("AZERO_SIMULATIONS")? {
        config.search.simulations = simulations;
    }
    if let Some(seed) = env_override("AZERO_SEED")? {
        config.seed = seed;
    }

    if let Some(rounds) = setup.rounds {
        config.rounds = rounds;
    }
    if let Some(simulations) = setup.simulations {
        config.search.simulations = simulations;
    }
    if let Some(seed) = setup.seed {
        config.seed = seed;
    }

    config.validate().context("Invalid training config")?;
    Ok(config)
}

/// Call `$body` with `$game` bound to the selected game.
macro_rules! with_game {
    ($setup:expr, |$game:ident| $body:expr) => {
        match $setup.game {
            GameKind::Binary => { let $game = Binary; $body }
            GameKind::Flip => { let $game = Flip; $body }
            GameKind::Count => { let $game = Count; $body }
            GameKind::Narrow => { let $game = Narrow; $body }
            GameKind::Matching => { let $game = Matching; $body }
            GameKind::Roshambo => { let $game = Roshambo; $body }
            GameKind::Modulo => { let $game = Modulo; $body }
            GameKind::Tictactoe => { let $game = Mnop::tictactoe(); $body }
            GameKind::Mnop => {
                let [width, height, line, players] = board_shape(&$setup.board)?;
                let $game = Mnop::new(width, height, line, players)
                    .context("Invalid board shape")?;
                $body
            }
            GameKind::Ultimate => { let $game = MetaMnop::ultimate(); $body }
        }
    };
}

fn board_shape(board: &[usize]) -> Result<[usize; 4]> {
    board
        .try_into()
        .map_err(|_| anyhow::anyhow!("--board takes exactly 4 values, got {}", board.len()))
}

/// Call `$body` with `$estimator` bound to the selected estimator for `$game`.
macro_rules! with_estimator {
    ($setup:expr, $seed:expr, &$game:ident, |$estimator:ident| $body:expr) => {
        match $setup.estimator {
            EstimatorKind::Uniform => { let $estimator = UniformEstimator; $body }
            EstimatorKind::Rollout => {
                let rng = ChaCha8Rng::seed_from_u64($seed);
                let $estimator = RolloutEstimator::new(rng, $setup.rollout_depth);
                $body
            }
            EstimatorKind::Linear => {
                let config = LinearConfig::default()
                    .with_seed($seed)
                    .with_learning_rate($setup.learning_rate)
                    .with_epochs($setup.epochs);
                let $estimator = LinearEstimator::new(&$game, config);
                $body
            }
        }
    };
}

fn train<G: Game, E: Estimator<G>>(game: G, estimator: E, config: TrainConfig) -> Result<Vec<RoundReport>> {
    let mut trainer = Trainer::new(game, estimator, config);
    trainer.train().context("Training aborted")
}

fn evaluate<G: Game, E: Estimator<G>>(game: &G, estimator: &E, config: &TrainConfig, games: u32) -> Result<f32> {
    Arena::new(game, estimator, &config.search)
        .win_rate(games, config.seed)
        .context("Evaluation aborted")
}

fn write_report(path: &Path, report: &Report) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    info!(path = %path.display(), "Report written");
    Ok(())
}

fn cmd_train(setup: &Setup, report: Option<&Path>) -> Result<()> {
    let config = load_config(setup)?;
    info!(
        game = ?setup.game,
        estimator = ?setup.estimator,
        rounds = config.rounds,
        games_per_round = config.games_per_round,
        simulations = config.search.simulations,
        seed = config.seed,
        "Starting training"
    );

    let start = Instant::now();
    let seed = config.seed;
    let rounds = with_game!(setup, |game| {
        with_estimator!(setup, seed, &game, |estimator| {
            train(game, estimator, config.clone())?
        })
    });
    let elapsed = start.elapsed();

    println!("\nCompleted in {:.2}s", elapsed.as_secs_f64());
    println!("Round  Win rate  Games  Moves");
    for r in &rounds {
        println!("{:>5}  {:>8.2}  {:>5}  {:>5}", r.round, r.win_rate, r.games, r.moves);
    }
    let total_moves: usize = rounds.iter().map(|r| r.moves).sum();
    println!("Total self-play moves: {}", total_moves);

    if let Some(path) = report {
        write_report(
            path,
            &Report {
                game: setup.game,
                estimator: setup.estimator,
                config: &config,
                rounds: &rounds,
            },
        )?;
    }

    Ok(())
}

fn cmd_evaluate(setup: &Setup, games: Option<u32>) -> Result<()> {
    let config = load_config(setup)?;
    let games = games.unwrap_or(config.eval_games);
    let seed = config.seed;

    let win_rate = with_game!(setup, |game| {
        with_estimator!(setup, seed, &game, |estimator| {
            evaluate(&game, &estimator, &config, games)?
        })
    });

    println!("Win rate over {} games: {:.1}%", games, win_rate * 100.0);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match &cli.command {
        Commands::Train { setup, report } => cmd_train(setup, report.as_deref()),
        Commands::Evaluate { setup, games } => cmd_evaluate(setup, *games),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(args: &[&str]) -> Setup {
        let mut argv = vec!["azero", "train"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Train { setup, .. } => setup,
            Commands::Evaluate { .. } => unreachable!(),
        }
    }

    #[test]
    fn test_defaults() {
        let setup = setup(&[]);
        assert!(matches!(setup.game, GameKind::Tictactoe));
        assert!(matches!(setup.estimator, EstimatorKind::Linear));
        assert_eq!(setup.board, vec![3, 3, 3, 2]);
    }

    #[test]
    fn test_flags_override_config() {
        let setup = setup(&["--rounds", "3", "--simulations", "12", "--seed", "5"]);
        let config = load_config(&setup).unwrap();
        assert_eq!(config.rounds, 3);
        assert_eq!(config.search.simulations, 12);
        assert_eq!(config.seed, 5);
    }

    #[test]
    fn test_board_shape() {
        let setup = setup(&["--game", "mnop", "--board", "4,4,3,3"]);
        assert_eq!(board_shape(&setup.board).unwrap(), [4, 4, 3, 3]);
        assert!(board_shape(&[3, 3]).is_err());
    }

    #[test]
    fn test_train_small_run() {
        let config = TrainConfig::for_testing();
        let estimator = LinearEstimator::new(&Count, LinearConfig::default());
        let rounds = train(Count, estimator, config).unwrap();
        assert_eq!(rounds.len(), 2);
    }

    #[test]
    fn test_report_serializes() {
        let config = TrainConfig::for_testing();
        let rounds = vec![RoundReport {
            round: 0,
            win_rate: 0.5,
            games: 3,
            moves: 12,
        }];
        let report = Report {
            game: GameKind::Tictactoe,
            estimator: EstimatorKind::Uniform,
            config: &config,
            rounds: &rounds,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["game"], "tictactoe");
        assert_eq!(json["rounds"][0]["moves"], 12);
        assert_eq!(json["config"]["search"]["simulations"], 25);
    }
}
