//! Block keys, state schemas, block data, and the block definition contract.
#![forbid(unsafe_code)]

pub mod config;
pub mod data;
pub mod definition;
pub mod error;
pub mod info;
pub mod key;
pub mod schema;
pub mod state;

pub use config::{BlockInfoCatalog, BlockInfoDef, BlocksConfig};
pub use data::BlockData;
pub use definition::{
    BlockDefinition, BlockWorld, EntityRef, Hand, HitResult, InteractionResult, ItemRef, Redstone,
};
pub use error::{BlockError, HookResult};
pub use info::{BlockInfo, ClientBlock, PistonReaction, Rgb};
pub use key::BlockKey;
pub use schema::{StateField, StateSchema};
pub use state::{StateDescriptor, StateDomain, StateValue};
