//! Reference games for exercising the search and training loop.
//!
//! These are deliberately tiny so that the correct play is obvious:
//! single-player puzzles, simultaneous-move games played in turns with a
//! hidden first move, a three-player game, generalized tic-tac-toe and
//! its nested form.

pub mod meta_mnop;
pub mod mnop;
pub mod multiplayer;
pub mod puzzles;

pub use meta_mnop::MetaMnop;
pub use mnop::Mnop;
pub use multiplayer::{Matching, Modulo, Roshambo};
pub use puzzles::{Binary, Count, Flip, Narrow};
