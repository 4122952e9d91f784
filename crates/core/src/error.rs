use thiserror::Error;

/// Violations of the contracts between the search core and its collaborators.
///
/// None of these are recoverable: a violation means a `Game` or `Estimator`
/// implementation (or a configuration) is wrong, and the current run stops.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractError {
    #[error("player {player} out of range (game has {players} players)")]
    InvalidPlayer { player: usize, players: usize },

    #[error("state has {actual} entries, expected {expected}")]
    StateSize { expected: usize, actual: usize },

    #[error("invalid state for player {player}: {reason}")]
    InvalidState { player: usize, reason: String },

    #[error("action {action} out of range ({num_actions} actions)")]
    ActionOutOfRange { action: usize, num_actions: usize },

    #[error("action {0} is not legal in this state")]
    IllegalAction(usize),

    #[error("legal mask has {actual} entries, expected {expected}")]
    MaskSize { expected: usize, actual: usize },

    #[error("no legal actions in a non-terminal state")]
    NoLegalActions,

    #[error("outcome has {actual} entries, expected one per player ({expected})")]
    OutcomeSize { expected: usize, actual: usize },

    #[error("outcome contains a non-finite entry")]
    NonFiniteOutcome,

    #[error("view has {actual} entries, expected {expected}")]
    ViewSize { expected: usize, actual: usize },

    #[error("estimator policy has {actual} entries, expected {expected}")]
    PolicySize { expected: usize, actual: usize },

    #[error("estimator value has {actual} entries, expected {expected}")]
    ValueSize { expected: usize, actual: usize },

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience Result type for contract-checked operations
pub type Result<T> = std::result::Result<T, ContractError>;
