use crate::{ContractError, Outcome, Result};
use rand::Rng;
use std::fmt::Debug;

/// Index of a player, `0..game.num_players()`.
pub type Player = usize;

/// Result of applying an action.
///
/// A transition either continues the game with a new state and the next
/// player to act, or finishes it with an outcome vector. Never both.
#[derive(Clone, Debug, PartialEq)]
pub enum Step<S> {
    Ongoing { state: S, player: Player },
    Finished(Outcome),
}

impl<S> Step<S> {
    /// Returns true if the game ended with this transition.
    pub fn is_finished(&self) -> bool {
        matches!(self, Step::Finished(_))
    }

    /// The terminal outcome, if the game ended.
    pub fn outcome(&self) -> Option<&Outcome> {
        match self {
            Step::Finished(outcome) => Some(outcome),
            Step::Ongoing { .. } => None,
        }
    }
}

/// A finite, turn-based, perfect-information game for AlphaZero training.
///
/// Implementors provide the raw rules (`initial`, `transition`, `legal`
/// and optionally `observe`/`validate`). The search core only ever calls
/// the checked wrappers (`start`, `step`, `valid`, `view`), which verify
/// every state/player/outcome triple a game hands back and turn violations
/// into [`ContractError`]s.
///
/// States are small vectors of integers: `state.as_ref().len()` must always
/// equal `state_size()`.
pub trait Game {
    /// The game state (e.g. a board)
    type State: Clone + Debug + AsRef<[i8]>;

    /// Total number of action indices (size of the policy vector)
    fn num_actions(&self) -> usize;

    /// Number of entries in a state
    fn state_size(&self) -> usize;

    /// Number of players; outcomes carry one entry per player
    fn num_players(&self) -> usize {
        1
    }

    /// Number of entries in the observation returned by `view`
    fn view_size(&self) -> usize {
        self.state_size()
    }

    /// Returns the initial state and the first player to act.
    fn initial<R: Rng + ?Sized>(&self, rng: &mut R) -> (Self::State, Player);

    /// Applies `action` for `player`. Only called with legal actions.
    fn transition(&self, state: &Self::State, player: Player, action: usize) -> Step<Self::State>;

    /// Legality mask over all `num_actions()` action indices.
    fn legal(&self, state: &Self::State, player: Player) -> Vec<bool>;

    /// The part of the state visible to `player`. Defaults to the full state.
    fn observe(&self, state: &Self::State, _player: Player) -> Vec<f32> {
        state.as_ref().iter().map(|&x| f32::from(x)).collect()
    }

    /// Game-specific consistency checks on a state.
    fn validate(&self, _state: &Self::State, _player: Player) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Checks that `state` and `player` form a valid position.
    fn check(&self, state: &Self::State, player: Player) -> Result<()> {
        let players = self.num_players();
        if player >= players {
            return Err(ContractError::InvalidPlayer { player, players });
        }
        let actual = state.as_ref().len();
        if actual != self.state_size() {
            return Err(ContractError::StateSize {
                expected: self.state_size(),
                actual,
            });
        }
        self.validate(state, player)
            .map_err(|reason| ContractError::InvalidState { player, reason })
    }

    /// Checks that an outcome has one finite entry per player.
    fn check_outcome(&self, outcome: &Outcome) -> Result<()> {
        if outcome.len() != self.num_players() {
            return Err(ContractError::OutcomeSize {
                expected: self.num_players(),
                actual: outcome.len(),
            });
        }
        if outcome.iter().any(|v| !v.is_finite()) {
            return Err(ContractError::NonFiniteOutcome);
        }
        Ok(())
    }

    /// Starts a new game. A game never starts finished.
    fn start<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(Self::State, Player)> {
        let (state, player) = self.initial(rng);
        self.check(&state, player)?;
        Ok((state, player))
    }

    /// Advances the game by one turn, validating input and output.
    fn step(&self, state: &Self::State, player: Player, action: usize) -> Result<Step<Self::State>> {
        let mask = self.valid(state, player)?;
        if action >= self.num_actions() {
            return Err(ContractError::ActionOutOfRange {
                action,
                num_actions: self.num_actions(),
            });
        }
        if !mask[action] {
            return Err(ContractError::IllegalAction(action));
        }

        let next = self.transition(state, player, action);
        match &next {
            Step::Ongoing { state, player } => self.check(state, *player)?,
            Step::Finished(outcome) => self.check_outcome(outcome)?,
        }
        Ok(next)
    }

    /// Legality mask for a position. An ongoing game always has a legal action.
    fn valid(&self, state: &Self::State, player: Player) -> Result<Vec<bool>> {
        self.check(state, player)?;
        let mask = self.legal(state, player);
        if mask.len() != self.num_actions() {
            return Err(ContractError::MaskSize {
                expected: self.num_actions(),
                actual: mask.len(),
            });
        }
        if !mask.iter().any(|&legal| legal) {
            return Err(ContractError::NoLegalActions);
        }
        Ok(mask)
    }

    /// Observation of the position from `player`'s point of view.
    fn view(&self, state: &Self::State, player: Player) -> Result<Vec<f32>> {
        self.check(state, player)?;
        let view = self.observe(state, player);
        if view.len() != self.view_size() {
            return Err(ContractError::ViewSize {
                expected: self.view_size(),
                actual: view.len(),
            });
        }
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    // Two players take turns removing 1 or 2 from a pile of 4; taking the
    // last item wins. `broken` makes the rules misbehave in configurable ways.
    #[derive(Default)]
    struct Pile {
        broken_mask: bool,
        broken_outcome: bool,
    }

    impl Game for Pile {
        type State = [i8; 1];

        fn num_actions(&self) -> usize {
            2
        }

        fn state_size(&self) -> usize {
            1
        }

        fn num_players(&self) -> usize {
            2
        }

        fn initial<R: Rng + ?Sized>(&self, _rng: &mut R) -> (Self::State, Player) {
            ([4], 0)
        }

        fn transition(&self, state: &Self::State, player: Player, action: usize) -> Step<Self::State> {
            let left = state[0] - (action as i8 + 1);
            if left == 0 {
                let mut outcome = vec![-1.0; 2];
                outcome[player] = 1.0;
                if self.broken_outcome {
                    outcome.push(0.0);
                }
                return Step::Finished(Outcome::new(outcome));
            }
            Step::Ongoing {
                state: [left],
                player: 1 - player,
            }
        }

        fn legal(&self, state: &Self::State, _player: Player) -> Vec<bool> {
            if self.broken_mask {
                return vec![true];
            }
            vec![true, state[0] >= 2]
        }

        fn validate(&self, state: &Self::State, _player: Player) -> std::result::Result<(), String> {
            if !(1..=4).contains(&state[0]) {
                return Err(format!("pile size {} out of range", state[0]));
            }
            Ok(())
        }
    }

    #[test]
    fn test_start_is_checked() {
        let game = Pile::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let (state, player) = game.start(&mut rng).unwrap();
        assert_eq!(state, [4]);
        assert_eq!(player, 0);
    }

    #[test]
    fn test_step_ongoing_and_finished() {
        let game = Pile::default();
        let next = game.step(&[4], 0, 1).unwrap();
        assert_eq!(
            next,
            Step::Ongoing {
                state: [2],
                player: 1
            }
        );
        assert!(!next.is_finished());

        let last = game.step(&[2], 1, 1).unwrap();
        assert!(last.is_finished());
        assert_eq!(last.outcome().unwrap().as_slice(), &[-1.0, 1.0]);
    }

    #[test]
    fn test_step_rejects_illegal_action() {
        let game = Pile::default();
        assert_eq!(game.step(&[1], 0, 1), Err(ContractError::IllegalAction(1)));
        assert!(matches!(
            game.step(&[3], 0, 7),
            Err(ContractError::ActionOutOfRange { action: 7, .. })
        ));
    }

    #[test]
    fn test_check_rejects_bad_player_and_state() {
        let game = Pile::default();
        assert!(matches!(
            game.check(&[3], 2),
            Err(ContractError::InvalidPlayer { player: 2, players: 2 })
        ));
        assert!(matches!(
            game.check(&[9], 0),
            Err(ContractError::InvalidState { player: 0, .. })
        ));
    }

    #[test]
    fn test_malformed_mask_is_reported() {
        let game = Pile {
            broken_mask: true,
            ..Default::default()
        };
        assert_eq!(
            game.valid(&[4], 0),
            Err(ContractError::MaskSize {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_malformed_outcome_is_reported() {
        let game = Pile {
            broken_outcome: true,
            ..Default::default()
        };
        assert_eq!(
            game.step(&[1], 0, 0),
            Err(ContractError::OutcomeSize {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn test_default_view_is_full_state() {
        let game = Pile::default();
        assert_eq!(game.view(&[3], 1).unwrap(), vec![3.0]);
    }
}
