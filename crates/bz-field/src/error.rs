use thiserror::Error;

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("planner configuration error: {0}")]
    Config(String),
}

pub type FieldResult<T> = Result<T, FieldError>;
