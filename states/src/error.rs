use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("State not found: {type_name}")]
    StateNotFound { type_name: &'static str },
}

impl Error {
    pub fn state_not_found(type_name: &'static str) -> Self {
        Self::StateNotFound { type_name }
    }
}
