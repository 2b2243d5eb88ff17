use dimblock_blocks::BlockKey;
use dimblock_geom::{Location, WorldId};
use dimblock_runtime::DeferredTickScheduler;
use proptest::prelude::*;

proptest! {
    #[test]
    fn fires_by_due_tick_then_submission(delays in prop::collection::vec(0u64..8, 1..40)) {
        let key: BlockKey = "demo:lamp".parse().unwrap();
        let mut s = DeferredTickScheduler::new();
        let mut expected: Vec<(u64, u64)> = Vec::new();
        for (i, d) in delays.iter().enumerate() {
            let id = s.schedule(Location::new(WorldId(0), i as i32, 0, 0), key.clone(), *d);
            expected.push(((*d).max(1), id));
        }
        expected.sort();

        let mut fired: Vec<(u64, u64)> = Vec::new();
        for _ in 0..10 {
            s.advance_tick();
            while let Some(req) = s.pop_due() {
                prop_assert_eq!(req.due, s.now());
                fired.push((req.due, req.id));
            }
        }
        prop_assert_eq!(fired, expected);
        prop_assert_eq!(s.pending(), 0);
    }
}
