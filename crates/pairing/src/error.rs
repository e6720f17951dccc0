use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] courier_store::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
