//! Multi-player games with a hidden first move.
//!
//! Each is a simultaneous-move game played in turns: earlier players'
//! choices are stored in the state but kept out of every view, so later
//! players cannot react to them.

use alphazero_core::{Game, Outcome, Player, Step};
use rand::Rng;

/// Check `[choice, current]` states shared by the hidden-move games.
fn check_hidden(state: &[i8; 2], player: Player, choices: i8) -> Result<(), String> {
    let [choice, current] = *state;
    if !(0..choices).contains(&choice) {
        return Err(format!("hidden choice {} out of range", choice));
    }
    if current as usize != player {
        return Err(format!("state says player {} moves, not {}", current, player));
    }
    Ok(())
}

/// Matching pennies: player 1 wins by matching player 0's coin.
#[derive(Clone, Copy, Debug, Default)]
pub struct Matching;

impl Game for Matching {
    type State = [i8; 2];

    fn num_actions(&self) -> usize {
        2
    }

    fn state_size(&self) -> usize {
        2
    }

    fn num_players(&self) -> usize {
        2
    }

    fn view_size(&self) -> usize {
        0
    }

    fn initial<R: Rng + ?Sized>(&self, _rng: &mut R) -> (Self::State, Player) {
        ([0, 0], 0)
    }

    fn transition(&self, state: &Self::State, player: Player, action: usize) -> Step<Self::State> {
        if player == 0 {
            return Step::Ongoing {
                state: [action as i8, 1],
                player: 1,
            };
        }
        let winner = if action as i8 == state[0] { 1 } else { 0 };
        Step::Finished(Outcome::winner(winner, 2))
    }

    fn legal(&self, _state: &Self::State, _player: Player) -> Vec<bool> {
        vec![true; 2]
    }

    fn observe(&self, _state: &Self::State, _player: Player) -> Vec<f32> {
        Vec::new()
    }

    fn validate(&self, state: &Self::State, player: Player) -> Result<(), String> {
        check_hidden(state, player, 2)
    }
}

/// Rock paper scissors. A tie is a loss for both players.
#[derive(Clone, Copy, Debug, Default)]
pub struct Roshambo;

impl Game for Roshambo {
    type State = [i8; 2];

    fn num_actions(&self) -> usize {
        3
    }

    fn state_size(&self) -> usize {
        2
    }

    fn num_players(&self) -> usize {
        2
    }

    fn view_size(&self) -> usize {
        0
    }

    fn initial<R: Rng + ?Sized>(&self, _rng: &mut R) -> (Self::State, Player) {
        ([0, 0], 0)
    }

    fn transition(&self, state: &Self::State, player: Player, action: usize) -> Step<Self::State> {
        if player == 0 {
            return Step::Ongoing {
                state: [action as i8, 1],
                player: 1,
            };
        }
        let first = state[0] as i32;
        let second = action as i32;
        let score = |won: bool| if won { 1.0 } else { -1.0 };
        Step::Finished(Outcome::new(vec![
            score((second - 1).rem_euclid(3) == first),
            score((second + 1).rem_euclid(3) == first),
        ]))
    }

    fn legal(&self, _state: &Self::State, _player: Player) -> Vec<bool> {
        vec![true; 3]
    }

    fn observe(&self, _state: &Self::State, _player: Player) -> Vec<f32> {
        Vec::new()
    }

    fn validate(&self, state: &Self::State, player: Player) -> Result<(), String> {
        check_hidden(state, player, 3)
    }
}

/// Three players each add 0, 1 or 2 to a running total. Player
/// `total % 3` wins.
#[derive(Clone, Copy, Debug, Default)]
pub struct Modulo;

impl Game for Modulo {
    type State = [i8; 2];

    fn num_actions(&self) -> usize {
        3
    }

    fn state_size(&self) -> usize {
        2
    }

    fn num_players(&self) -> usize {
        3
    }

    fn view_size(&self) -> usize {
        0
    }

    fn initial<R: Rng + ?Sized>(&self, _rng: &mut R) -> (Self::State, Player) {
        ([0, 0], 0)
    }

    fn transition(&self, state: &Self::State, player: Player, action: usize) -> Step<Self::State> {
        let total = state[0] + action as i8;
        if player < 2 {
            return Step::Ongoing {
                state: [total, player as i8 + 1],
                player: player + 1,
            };
        }
        let winner = (total % 3) as usize;
        Step::Finished(Outcome::new(
            (0..3).map(|i| if i == winner { 1.0 } else { -1.0 }).collect(),
        ))
    }

    fn legal(&self, _state: &Self::State, _player: Player) -> Vec<bool> {
        vec![true; 3]
    }

    fn observe(&self, _state: &Self::State, _player: Player) -> Vec<f32> {
        Vec::new()
    }

    fn validate(&self, state: &Self::State, player: Player) -> Result<(), String> {
        check_hidden(state, player, 6)
    }
}
