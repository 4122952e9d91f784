//! Ultimate tic-tac-toe: a grid of [`Mnop`] boards whose winners play a
//! game of [`Mnop`] on the outer grid.
//!
//! A turn is one or two moves. When the previous cell points at a board
//! that is still open, the player must play there. Otherwise the player
//! first picks any open board, keeping the turn, and then a cell in it.

use super::mnop::{Mnop, EMPTY};
use alphazero_core::{Game, Outcome, Player, Result, Step};
use rand::Rng;

/// Ultimate tic-tac-toe rules.
///
/// With `c = width * height` the state has three sections:
/// - `c * c` cells, board `b` occupying `[b * c, (b + 1) * c)`
/// - `c` active flags, 1 where the player may move
/// - `c` board winners
///
/// Cells and winners hold a player id or [`EMPTY`]. While several boards
/// are active, action `b` picks board `b`; once one is active, action `i`
/// claims cell `i` of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetaMnop {
    board: Mnop,
}

impl MetaMnop {
    /// Boards of `width x height` won by `line` in a row, nested once.
    ///
    /// # Errors
    /// Returns `InvalidConfig` under the same conditions as [`Mnop::new`].
    pub fn new(width: usize, height: usize, line: usize, players: usize) -> Result<Self> {
        Ok(Self {
            board: Mnop::new(width, height, line, players)?,
        })
    }

    /// Classic ultimate tic-tac-toe for two players.
    pub fn ultimate() -> Self {
        Self {
            board: Mnop::tictactoe(),
        }
    }

    fn cells(&self) -> usize {
        self.board.cells()
    }

    /// Split a state into cells, active flags and board winners.
    fn sections<'s>(&self, state: &'s [i8]) -> (&'s [i8], &'s [i8], &'s [i8]) {
        let c = self.cells();
        let (cells, rest) = state.split_at(c * c);
        let (active, winners) = rest.split_at(c);
        (cells, active, winners)
    }

    fn sub_board<'s>(&self, cells: &'s [i8], b: usize) -> &'s [i8] {
        let c = self.cells();
        &cells[b * c..(b + 1) * c]
    }

    /// Whether board `b` can still be played on.
    fn open(&self, cells: &[i8], winners: &[i8], b: usize) -> bool {
        winners[b] == EMPTY && self.sub_board(cells, b).contains(&EMPTY)
    }

    /// The board being played on, once the choice is made.
    fn chosen(active: &[i8]) -> Option<usize> {
        let mut boards = active
            .iter()
            .enumerate()
            .filter(|&(_, &flag)| flag == 1)
            .map(|(b, _)| b);
        match (boards.next(), boards.next()) {
            (Some(b), None) => Some(b),
            _ => None,
        }
    }
}

impl Default for MetaMnop {
    fn default() -> Self {
        Self::ultimate()
    }
}

impl Game for MetaMnop {
    type State = Vec<i8>;

    fn num_actions(&self) -> usize {
        self.cells()
    }

    fn state_size(&self) -> usize {
        let c = self.cells();
        c * c + 2 * c
    }

    fn num_players(&self) -> usize {
        self.board.num_players()
    }

    /// One plane of all cells per player, then the active flags.
    fn view_size(&self) -> usize {
        let c = self.cells();
        c * c * self.num_players() + c
    }

    fn initial<R: Rng + ?Sized>(&self, _rng: &mut R) -> (Self::State, Player) {
        let c = self.cells();
        let mut state = vec![EMPTY; c * c];
        state.extend(std::iter::repeat(1).take(c));
        state.extend(std::iter::repeat(EMPTY).take(c));
        (state, 0)
    }

    fn transition(&self, state: &Self::State, player: Player, action: usize) -> Step<Self::State> {
        let c = self.cells();
        let players = self.num_players();
        let (flags, winners_at) = (c * c..c * c + c, c * c + c);
        let mut next = state.clone();

        let Some(b) = Self::chosen(&state[flags.clone()]) else {
            for (i, flag) in next[flags].iter_mut().enumerate() {
                *flag = i8::from(i == action);
            }
            return Step::Ongoing { state: next, player };
        };

        next[b * c + action] = player as i8;
        if self.board.wins(&next[b * c..(b + 1) * c], action) {
            next[winners_at + b] = player as i8;
            if self.board.wins(&next[winners_at..], b) {
                return Step::Finished(Outcome::winner(player, players));
            }
        }

        let (cells, _, winners) = self.sections(&next);
        let open: Vec<bool> = (0..c).map(|x| self.open(cells, winners, x)).collect();
        if !open.contains(&true) {
            return Step::Finished(Outcome::draw(players));
        }

        for (x, flag) in next[flags].iter_mut().enumerate() {
            *flag = i8::from(if open[action] { x == action } else { open[x] });
        }
        Step::Ongoing {
            state: next,
            player: (player + 1) % players,
        }
    }

    fn legal(&self, state: &Self::State, _player: Player) -> Vec<bool> {
        let (cells, active, _) = self.sections(state);
        match Self::chosen(active) {
            Some(b) => self.sub_board(cells, b).iter().map(|&cell| cell == EMPTY).collect(),
            None => active.iter().map(|&flag| flag == 1).collect(),
        }
    }

    fn observe(&self, state: &Self::State, _player: Player) -> Vec<f32> {
        let (cells, active, _) = self.sections(state);
        let mut view = vec![0.0; cells.len() * self.num_players()];
        for (i, &cell) in cells.iter().enumerate() {
            if cell != EMPTY {
                view[cell as usize * cells.len() + i] = 1.0;
            }
        }
        view.extend(active.iter().map(|&flag| f32::from(flag)));
        view
    }

    fn validate(&self, state: &Self::State, player: Player) -> std::result::Result<(), String> {
        let players = self.num_players();
        let (cells, active, winners) = self.sections(state);

        if let Some(&bad) = cells
            .iter()
            .chain(winners)
            .find(|&&x| x != EMPTY && (x < 0 || x as usize >= players))
        {
            return Err(format!("unknown player {}", bad));
        }
        if active.iter().any(|&flag| flag != 0 && flag != 1) {
            return Err("active flags must be 0 or 1".to_string());
        }
        if !active.contains(&1) {
            return Err("no board is active".to_string());
        }
        if let Some(b) = (0..self.cells()).find(|&b| active[b] == 1 && !self.open(cells, winners, b)) {
            return Err(format!("board {} is active but closed", b));
        }

        let filled = cells.iter().filter(|&&cell| cell != EMPTY).count();
        if player != filled % players {
            return Err(format!(
                "player {} to move after {} pieces were placed",
                player, filled
            ));
        }
        Ok(())
    }
}
