/// Programming-level failures. In-game failures (falling, illegal moves) are
/// step outcomes, not errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DashError {
    #[error("invalid map: {0}")]
    InvalidMap(String),
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} map")]
    OutOfBounds { row: usize, col: usize, rows: usize, cols: usize },
    #[error("invalid action code {0} (expected 0..=7)")]
    InvalidAction(i64),
    #[error("unknown preset map '{0}'")]
    UnknownMap(String),
}
