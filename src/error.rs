use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("a settings aggregate keeps at least one flow")]
    LastFlow,
    #[error("flow index {0} is out of bounds")]
    OutOfBounds(usize),
    #[error("settings contain no flows")]
    Empty,
}
