//! Single-player puzzles.

use alphazero_core::{Game, Outcome, Player, Step};
use rand::Rng;

fn finish(score: f32) -> Step<[i8; 1]> {
    Step::Finished(Outcome::new(vec![score]))
}

/// Single move game: action 0 loses, action 1 wins.
#[derive(Clone, Copy, Debug, Default)]
pub struct Binary;

impl Game for Binary {
    type State = [i8; 0];

    fn num_actions(&self) -> usize {
        2
    }

    fn state_size(&self) -> usize {
        0
    }

    fn initial<R: Rng + ?Sized>(&self, _rng: &mut R) -> (Self::State, Player) {
        ([], 0)
    }

    fn transition(&self, _state: &Self::State, _player: Player, action: usize) -> Step<Self::State> {
        let score = if action == 1 { 1.0 } else { -1.0 };
        Step::Finished(Outcome::new(vec![score]))
    }

    fn legal(&self, _state: &Self::State, _player: Player) -> Vec<bool> {
        vec![true, true]
    }
}

/// Guess a hidden coin flip. The coin is part of the state but not the view.
#[derive(Clone, Copy, Debug, Default)]
pub struct Flip;

impl Game for Flip {
    type State = [i8; 1];

    fn num_actions(&self) -> usize {
        2
    }

    fn state_size(&self) -> usize {
        1
    }

    fn view_size(&self) -> usize {
        0
    }

    fn initial<R: Rng + ?Sized>(&self, rng: &mut R) -> (Self::State, Player) {
        ([rng.gen_range(0..2)], 0)
    }

    fn transition(&self, state: &Self::State, _player: Player, action: usize) -> Step<Self::State> {
        finish(if action as i8 == state[0] { 1.0 } else { -1.0 })
    }

    fn legal(&self, _state: &Self::State, _player: Player) -> Vec<bool> {
        vec![true, true]
    }

    fn observe(&self, _state: &Self::State, _player: Player) -> Vec<f32> {
        Vec::new()
    }

    fn validate(&self, state: &Self::State, _player: Player) -> Result<(), String> {
        if !(0..2).contains(&state[0]) {
            return Err(format!("coin {} is not 0 or 1", state[0]));
        }
        Ok(())
    }
}

/// Count to three: say 0, then 1, then 2. Any other number loses.
#[derive(Clone, Copy, Debug, Default)]
pub struct Count;

impl Game for Count {
    type State = [i8; 1];

    fn num_actions(&self) -> usize {
        3
    }

    fn state_size(&self) -> usize {
        1
    }

    fn initial<R: Rng + ?Sized>(&self, _rng: &mut R) -> (Self::State, Player) {
        ([0], 0)
    }

    fn transition(&self, state: &Self::State, player: Player, action: usize) -> Step<Self::State> {
        let count = state[0] as usize;
        if action != count {
            return finish(-1.0);
        }
        if count == 2 {
            return finish(1.0);
        }
        Step::Ongoing {
            state: [state[0] + 1],
            player,
        }
    }

    fn legal(&self, _state: &Self::State, _player: Player) -> Vec<bool> {
        vec![true; 3]
    }

    fn validate(&self, state: &Self::State, _player: Player) -> Result<(), String> {
        if !(0..3).contains(&state[0]) {
            return Err(format!("count {} out of range", state[0]));
        }
        Ok(())
    }
}

/// Fewer choices every step: from `k`, actions `0..k` are legal. Action 0
/// ends the game with a loss, any other action `a` moves to `a`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Narrow;

impl Game for Narrow {
    type State = [i8; 1];

    fn num_actions(&self) -> usize {
        3
    }

    fn state_size(&self) -> usize {
        1
    }

    fn initial<R: Rng + ?Sized>(&self, _rng: &mut R) -> (Self::State, Player) {
        ([3], 0)
    }

    fn transition(&self, _state: &Self::State, player: Player, action: usize) -> Step<Self::State> {
        if action == 0 {
            return finish(-1.0);
        }
        Step::Ongoing {
            state: [action as i8],
            player,
        }
    }

    fn legal(&self, state: &Self::State, _player: Player) -> Vec<bool> {
        (0..3).map(|a| (a as i8) < state[0]).collect()
    }

    fn validate(&self, state: &Self::State, _player: Player) -> Result<(), String> {
        if !(1..=3).contains(&state[0]) {
            return Err(format!("width {} out of range", state[0]));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphazero_core::ContractError;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_binary_payoffs() {
        let game = Binary;
        assert_eq!(game.step(&[], 0, 0).unwrap().outcome().unwrap().as_slice(), &[-1.0]);
        assert_eq!(game.step(&[], 0, 1).unwrap().outcome().unwrap().as_slice(), &[1.0]);
    }

    #[test]
    fn test_flip_hides_coin() {
        let game = Flip;
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let (state, player) = game.start(&mut rng).unwrap();
        assert!(game.view(&state, player).unwrap().is_empty());

        let right = state[0] as usize;
        let outcome = game.step(&state, player, right).unwrap();
        assert_eq!(outcome.outcome().unwrap().as_slice(), &[1.0]);
        let wrong = game.step(&state, player, 1 - right).unwrap();
        assert_eq!(wrong.outcome().unwrap().as_slice(), &[-1.0]);
    }

    #[test]
    fn test_count_to_three() {
        let game = Count;
        let mut state = [0];
        for action in 0..2 {
            match game.step(&state, 0, action).unwrap() {
                Step::Ongoing { state: next, .. } => state = next,
                Step::Finished(_) => panic!("game ended early"),
            }
        }
        assert_eq!(game.step(&state, 0, 2).unwrap().outcome().unwrap().get(0), 1.0);
        assert_eq!(game.step(&[1], 0, 0).unwrap().outcome().unwrap().get(0), -1.0);
    }

    #[test]
    fn test_narrow_masks_shrink() {
        let game = Narrow;
        assert_eq!(game.valid(&[3], 0).unwrap(), vec![true, true, true]);
        assert_eq!(game.valid(&[1], 0).unwrap(), vec![true, false, false]);
        assert_eq!(game.step(&[1], 0, 2), Err(ContractError::IllegalAction(2)));
        assert!(game.check(&[0], 0).is_err());
    }
}
