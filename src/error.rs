use thiserror::Error;

use crate::config::ConfigError;
use crate::grammar::GrammarError;
use crate::node::NodeError;
use crate::tree::TreeError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Grammar error: {0}")]
    Grammar(#[from] GrammarError),
    #[error("Node error: {0}")]
    Node(#[from] NodeError),
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type GeResult<T> = Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}
