//! Generalized tic-tac-toe: `p` players on an `m`-wide, `n`-high board,
//! racing to place `o` pieces in a row.
//!
//! Standard tic-tac-toe (3, 3, 3, 2) is a solved draw, which makes it a
//! good yardstick for search quality:
//! - MCTS should take an immediate win when one is available
//! - MCTS should block an immediate loss
//! - MCTS should beat a random opponent most of the time

use alphazero_core::{ContractError, Game, Outcome, Player, Result, Step};
use rand::Rng;

/// Marker for an empty cell.
pub const EMPTY: i8 = -1;

/// (row, col) steps for the four line directions.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Generalized tic-tac-toe rules.
///
/// The state is the board in row-major order (`width * height` cells), each
/// cell holding the id of the player who claimed it or [`EMPTY`]. Action
/// `i` claims cell `i`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mnop {
    width: usize,
    height: usize,
    line: usize,
    players: usize,
}

impl Mnop {
    /// Create a board of `width x height`, won by `line` in a row, for
    /// `players` players.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if a line of `line` pieces cannot fit on the
    /// board or there are no players.
    pub fn new(width: usize, height: usize, line: usize, players: usize) -> Result<Self> {
        if line == 0 || width < line || height < line {
            return Err(ContractError::InvalidConfig(format!(
                "a line of {} cannot fit on a {}x{} board",
                line, width, height
            )));
        }
        if players == 0 || players > i8::MAX as usize {
            return Err(ContractError::InvalidConfig(format!(
                "unsupported player count {}",
                players
            )));
        }
        Ok(Self {
            width,
            height,
            line,
            players,
        })
    }

    /// Classic 3x3 tic-tac-toe for two players.
    pub fn tictactoe() -> Self {
        Self {
            width: 3,
            height: 3,
            line: 3,
            players: 2,
        }
    }

    pub(super) fn cells(&self) -> usize {
        self.width * self.height
    }

    /// Number of pieces of `player` in a row through `cell` along
    /// `(dr, dc)`, counting both directions.
    fn run_length(&self, board: &[i8], cell: usize, (dr, dc): (isize, isize), player: i8) -> usize {
        let (row, col) = ((cell / self.width) as isize, (cell % self.width) as isize);
        let mut count = 1;
        for sign in [1, -1] {
            let (mut r, mut c) = (row + sign * dr, col + sign * dc);
            while r >= 0
                && c >= 0
                && (r as usize) < self.height
                && (c as usize) < self.width
                && board[r as usize * self.width + c as usize] == player
            {
                count += 1;
                r += sign * dr;
                c += sign * dc;
            }
        }
        count
    }

    /// Whether the piece just placed on `cell` completes a line.
    pub(super) fn wins(&self, board: &[i8], cell: usize) -> bool {
        let player = board[cell];
        DIRECTIONS
            .iter()
            .any(|&dir| self.run_length(board, cell, dir, player) >= self.line)
    }
}

impl Default for Mnop {
    fn default() -> Self {
        Self::tictactoe()
    }
}

impl Game for Mnop {
    type State = Vec<i8>;

    fn num_actions(&self) -> usize {
        self.cells()
    }

    fn state_size(&self) -> usize {
        self.cells()
    }

    fn num_players(&self) -> usize {
        self.players
    }

    /// One plane of `width * height` cells per player.
    fn view_size(&self) -> usize {
        self.cells() * self.players
    }

    fn initial<R: Rng + ?Sized>(&self, _rng: &mut R) -> (Self::State, Player) {
        (vec![EMPTY; self.cells()], 0)
    }

    fn transition(&self, state: &Self::State, player: Player, action: usize) -> Step<Self::State> {
        let mut board = state.clone();
        board[action] = player as i8;

        if self.wins(&board, action) {
            return Step::Finished(Outcome::winner(player, self.players));
        }
        if !board.contains(&EMPTY) {
            return Step::Finished(Outcome::draw(self.players));
        }
        Step::Ongoing {
            state: board,
            player: (player + 1) % self.players,
        }
    }

    fn legal(&self, state: &Self::State, _player: Player) -> Vec<bool> {
        state.iter().map(|&cell| cell == EMPTY).collect()
    }

    fn observe(&self, state: &Self::State, _player: Player) -> Vec<f32> {
        let cells = self.cells();
        let mut planes = vec![0.0; cells * self.players];
        for (i, &cell) in state.iter().enumerate() {
            if cell != EMPTY {
                planes[cell as usize * cells + i] = 1.0;
            }
        }
        planes
    }

    fn validate(&self, state: &Self::State, player: Player) -> std::result::Result<(), String> {
        if let Some(&bad) = state
            .iter()
            .find(|&&cell| cell != EMPTY && (cell < 0 || cell as usize >= self.players))
        {
            return Err(format!("cell holds unknown player {}", bad));
        }
        let filled = state.iter().filter(|&&cell| cell != EMPTY).count();
        if player != filled % self.players {
            return Err(format!(
                "player {} to move after {} pieces were placed",
                player, filled
            ));
        }
        Ok(())
    }
}
