//! Tile entity state, persisted compounds, and the bridge identity map.
#![forbid(unsafe_code)]

pub mod bridge;
pub mod compound;
pub mod store;

pub use bridge::{BridgeMap, TileEntityBridge, put_location};
pub use compound::{Compound, Tag};
pub use store::{TileEntityState, TileHandle, TileStore};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TileError {
    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("field `{field}` holds {found}, expected {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("compound codec: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("tile entity {0:?} is no longer live")]
    Released(TileHandle),
}
