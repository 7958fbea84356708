//! Error types for the rule engines.

/// A rejected action.
///
/// The display strings are the short reasons shown to players; [`tag`]
/// gives the stable machine code sent alongside them. A rejection never
/// changes the session's state.
///
/// [`tag`]: LogicError::tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogicError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Game already over")]
    GameOver,

    #[error("Not a player")]
    NotAPlayer,

    #[error("Invalid cell")]
    InvalidCell,

    #[error("Cell already taken")]
    CellTaken,

    #[error("Invalid column")]
    InvalidColumn,

    #[error("Column full")]
    ColumnFull,

    #[error("Match already over")]
    MatchOver,

    #[error("Round already revealed")]
    RoundRevealed,

    #[error("Already picked")]
    AlreadyPicked,

    #[error("Invalid choice")]
    InvalidChoice,

    #[error("Not choosing phase")]
    NotChoosingPhase,

    #[error("Not the drawer")]
    NotDrawer,

    #[error("Invalid word index")]
    InvalidWordIndex,

    #[error("Not drawing phase")]
    NotDrawingPhase,

    #[error("Drawer cannot guess")]
    DrawerCannotGuess,

    #[error("Already guessed")]
    AlreadyGuessed,

    #[error("Round not active")]
    RoundNotActive,

    #[error("Round already won")]
    RoundAlreadyWon,

    #[error("Wrong answer")]
    WrongAnswer,

    #[error("Not accepting answers")]
    NotAcceptingAnswers,

    #[error("Already answered")]
    AlreadyAnswered,

    #[error("Invalid option")]
    InvalidOption,

    /// The action verb is unknown for this game or its payload has the
    /// wrong shape.
    #[error("malformed action: {0}")]
    MalformedAction(String),
}

impl LogicError {
    /// Stable machine-readable code for this rejection.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::NotYourTurn => "NotYourTurn",
            Self::GameOver => "GameOver",
            Self::NotAPlayer => "NotAPlayer",
            Self::InvalidCell => "InvalidCell",
            Self::CellTaken => "CellTaken",
            Self::InvalidColumn => "InvalidColumn",
            Self::ColumnFull => "ColumnFull",
            Self::MatchOver => "MatchOver",
            Self::RoundRevealed => "RoundRevealed",
            Self::AlreadyPicked => "AlreadyPicked",
            Self::InvalidChoice => "InvalidChoice",
            Self::NotChoosingPhase => "NotChoosingPhase",
            Self::NotDrawer => "NotDrawer",
            Self::InvalidWordIndex => "InvalidWordIndex",
            Self::NotDrawingPhase => "NotDrawingPhase",
            Self::DrawerCannotGuess => "DrawerCannotGuess",
            Self::AlreadyGuessed => "AlreadyGuessed",
            Self::RoundNotActive => "RoundNotActive",
            Self::RoundAlreadyWon => "RoundAlreadyWon",
            Self::WrongAnswer => "WrongAnswer",
            Self::NotAcceptingAnswers => "NotAcceptingAnswers",
            Self::AlreadyAnswered => "AlreadyAnswered",
            Self::InvalidOption => "InvalidOption",
            Self::MalformedAction(_) => "MalformedAction",
        }
    }
}
