use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid bracket for {what}: [{lower}, {upper}]")]
    InvalidBracket {
        what: &'static str,
        lower: f64,
        upper: f64,
    },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
