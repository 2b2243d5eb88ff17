use dimblock_blocks::{BlockData, BlockError, BlockKey, ClientBlock};
use dimblock_geom::Location;
use dimblock_tile::Compound;

/// What the engine stores for a managed block: the owning key, the packed state id and
/// the block the client is shown.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NativeBlock {
    pub key: BlockKey,
    pub state: u32,
    pub client: ClientBlock,
}

/// Boundary to one concrete engine revision.
pub trait EngineAdapter {
    /// Engine revision this adapter speaks to.
    fn version(&self) -> &str;

    fn is_valid_location(&self, location: Location) -> bool;

    fn native_shape_for(&self, data: &BlockData, client: ClientBlock) -> NativeBlock {
        NativeBlock {
            key: data.key().clone(),
            state: data.state_id(),
            client,
        }
    }

    /// Writes or clears (`None`) the native block at `location`.
    fn set_native_block_at(&mut self, location: Location, block: Option<NativeBlock>);

    fn native_block_at(&self, location: Location) -> Option<&NativeBlock>;

    fn occupant_key(&self, location: Location) -> Option<BlockKey> {
        self.native_block_at(location).map(|b| b.key.clone())
    }

    /// Native block entity type id for tile entities of `key`.
    fn tile_entity_type(&self, key: &BlockKey) -> String {
        key.to_string()
    }

    fn serialize_compound(&self, tag: &Compound) -> Result<Vec<u8>, BlockError>;

    fn deserialize_compound(&self, bytes: &[u8]) -> Result<Compound, BlockError>;
}
