use dimblock_geom::Location;
use dimblock_tile::TileError;
use thiserror::Error;

use crate::BlockKey;

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("block {0} is already registered")]
    DuplicateKey(BlockKey),

    #[error("registering {key} failed: {reason}")]
    Registration { key: BlockKey, reason: String },

    #[error("location {0} is not addressable")]
    InvalidLocation(Location),

    #[error("illegal state transition on {key}: {reason}")]
    IllegalStateTransition { key: BlockKey, reason: String },

    #[error("block {0} is not registered")]
    Unregistered(BlockKey),

    #[error("invalid block key `{0}`")]
    InvalidKey(String),

    #[error("invalid state `{name}`: {reason}")]
    InvalidDescriptor { name: String, reason: String },

    /// Failure reported by a block's own hook code.
    #[error("{0}")]
    Hook(String),

    #[error(transparent)]
    Tile(#[from] TileError),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BlockError {
    pub fn hook(msg: impl Into<String>) -> Self {
        BlockError::Hook(msg.into())
    }

    pub(crate) fn transition(key: &BlockKey, reason: impl Into<String>) -> Self {
        BlockError::IllegalStateTransition {
            key: key.clone(),
            reason: reason.into(),
        }
    }
}

/// Result type returned by block hooks.
pub type HookResult<T = ()> = Result<T, BlockError>;
