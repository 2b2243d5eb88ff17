use std::any::Any;

use dimblock_geom::{Location, WorldId};
use dimblock_tile::{BridgeMap, Compound, Tag, TileEntityState, TileError, TileStore};

#[derive(Debug, Default, PartialEq)]
struct Furnace {
    burn_ticks: i32,
    label: String,
    items: Vec<i16>,
}

impl TileEntityState for Furnace {
    fn load(&mut self, tag: &Compound) -> Result<(), TileError> {
        self.burn_ticks = tag.get_int("burn").unwrap_or(0);
        self.label = tag.get_string("label").unwrap_or_default().to_string();
        self.items = tag
            .get_list("items")
            .unwrap_or(&[])
            .iter()
            .filter_map(|t| match t {
                Tag::Short(s) => Some(*s),
                _ => None,
            })
            .collect();
        Ok(())
    }
    fn save(&self, tag: &mut Compound) {
        tag.put_int("burn", self.burn_ticks);
        tag.put_string("label", self.label.clone());
        tag.put("items", Tag::List(self.items.iter().map(|s| Tag::Short(*s)).collect()));
    }
    fn tick(&mut self) {
        if self.burn_ticks > 0 {
            self.burn_ticks -= 1;
        }
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn at(x: i32, y: i32, z: i32) -> Location {
    Location::new(WorldId(0), x, y, z)
}

#[test]
fn save_then_load_on_fresh_bridge_reproduces_state() {
    let mut store = TileStore::new();
    let mut bridges = BridgeMap::new();
    let original = Furnace {
        burn_ticks: 37,
        label: "smeltery".into(),
        items: vec![4, 0, 12],
    };
    let h = store.insert(at(1, 64, 1), Box::new(original));
    let saved = {
        let (bridge, _) = bridges.bind(h, "dimblock:furnace", at(1, 64, 1));
        bridge.save(&store, Compound::new())
    };
    assert_eq!(saved.get_string("id"), Some("dimblock:furnace"));
    assert_eq!(saved.get_int("y"), Some(64));

    // Fresh state and bridge somewhere else, fed the saved form.
    let bytes = saved.to_json_bytes().unwrap();
    let mut store2 = TileStore::new();
    let mut bridges2 = BridgeMap::new();
    let h2 = store2.insert(at(1, 64, 1), Box::new(Furnace::default()));
    let (bridge2, _) = bridges2.bind(h2, "placeholder", at(0, 0, 0));
    bridge2
        .load(&mut store2, &Compound::from_json_bytes(&bytes).unwrap())
        .unwrap();
    assert_eq!(bridge2.native_id(), "dimblock:furnace");
    assert_eq!(bridge2.location(), at(1, 64, 1));

    let restored = store2.get(h2).and_then(|s| s.downcast_ref::<Furnace>()).unwrap();
    let first = store.get(h).and_then(|s| s.downcast_ref::<Furnace>()).unwrap();
    assert_eq!(restored, first);
}

#[test]
fn lookup_is_absent_after_detach_and_for_unbridged_states() {
    let mut store = TileStore::new();
    let mut bridges = BridgeMap::new();
    let bridged = store.insert(at(0, 0, 0), Box::new(Furnace::default()));
    let never = store.insert(at(0, 1, 0), Box::new(Furnace::default()));
    bridges.bind(bridged, "dimblock:furnace", at(0, 0, 0));

    assert!(bridges.lookup(never, &store).is_none());
    assert!(bridges.lookup(bridged, &store).is_some());
    assert!(bridges.detach(bridged).is_some());
    assert!(bridges.lookup(bridged, &store).is_none());
    // State itself survives the bridge going away.
    assert!(store.contains(bridged));
}

#[test]
fn released_state_prunes_its_bridge() {
    let mut store = TileStore::new();
    let mut bridges = BridgeMap::new();
    let a = store.insert(at(0, 0, 0), Box::new(Furnace::default()));
    let b = store.insert(at(2, 0, 0), Box::new(Furnace::default()));
    bridges.bind(a, "x:a", at(0, 0, 0));
    bridges.bind(b, "x:b", at(2, 0, 0));

    store.remove(a);
    assert!(bridges.lookup(a, &store).is_none());
    assert_eq!(bridges.len(), 1);

    store.remove(b);
    assert_eq!(bridges.reclaim(&store), 1);
    assert!(bridges.is_empty());
}

#[test]
fn rebinding_detaches_the_previous_bridge() {
    let mut store = TileStore::new();
    let mut bridges = BridgeMap::new();
    let h = store.insert(at(3, 3, 3), Box::new(Furnace::default()));
    bridges.bind(h, "v1:furnace", at(3, 3, 3));
    let (current, previous) = bridges.bind(h, "v2:furnace", at(3, 3, 3));
    assert_eq!(current.native_id(), "v2:furnace");
    assert_eq!(previous.map(|b| b.native_id().to_string()), Some("v1:furnace".into()));
    assert_eq!(bridges.len(), 1);
}

#[test]
fn snapshot_is_kept_apart_from_later_changes() {
    let mut store = TileStore::new();
    let mut bridges = BridgeMap::new();
    let h = store.insert(
        at(0, 5, 0),
        Box::new(Furnace {
            burn_ticks: 2,
            ..Furnace::default()
        }),
    );
    bridges.bind(h, "dimblock:furnace", at(0, 5, 0));
    let bridge = bridges.lookup(h, &store).unwrap();
    assert!(bridge.last_snapshot().is_none());
    bridge.capture_snapshot(&store);

    let bridge = bridges.lookup(h, &store).unwrap();
    bridge.tick(&mut store);
    let snap = bridges.lookup(h, &store).unwrap().last_snapshot().cloned().unwrap();
    assert_eq!(snap.get_compound("state").and_then(|s| s.get_int("burn")), Some(2));
    let live = store.get(h).and_then(|s| s.downcast_ref::<Furnace>()).unwrap();
    assert_eq!(live.burn_ticks, 1);
}

#[test]
fn load_against_released_state_fails() {
    let mut store = TileStore::new();
    let mut bridges = BridgeMap::new();
    let h = store.insert(at(0, 0, 0), Box::new(Furnace::default()));
    bridges.bind(h, "x:y", at(0, 0, 0));
    let mut bridge = bridges.detach(h).unwrap();
    store.remove(h);
    assert!(matches!(
        bridge.load(&mut store, &Compound::new()),
        Err(TileError::Released(_))
    ));
}

#[test]
fn world_ids_outside_the_unsigned_range_are_rejected() {
    let mut store = TileStore::new();
    let mut bridges = BridgeMap::new();
    let far = Location::new(WorldId(u32::MAX), 0, 0, 0);
    let h = store.insert(far, Box::new(Furnace::default()));
    let (bridge, _) = bridges.bind(h, "x:y", far);
    let saved = bridge.save(&store, Compound::new());
    assert_eq!(saved.get_long("world"), Some(i64::from(u32::MAX)));
    bridge.load(&mut store, &saved).unwrap();
    assert_eq!(bridge.location(), far);

    let mut negative = saved.clone();
    negative.put_int("world", -1);
    assert!(matches!(
        bridge.load(&mut store, &negative),
        Err(TileError::WrongType { .. })
    ));
    assert_eq!(bridge.location(), far);
}
