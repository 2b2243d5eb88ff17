use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use dimblock_blocks::{BlockError, BlockKey, HookResult};
use dimblock_geom::Location;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Runs one hook, turning a panic into a [`BlockError::Hook`]. Failures are logged.
pub(crate) fn call<T>(
    key: &BlockKey,
    location: Option<Location>,
    hook: &'static str,
    f: impl FnOnce() -> HookResult<T>,
) -> HookResult<T> {
    let res = match catch_unwind(AssertUnwindSafe(f)) {
        Ok(res) => res,
        Err(payload) => Err(BlockError::hook(format!(
            "panicked: {}",
            panic_message(payload.as_ref())
        ))),
    };
    if let Err(e) = &res {
        match location {
            Some(at) => log::error!(target: "hooks", "{} `{}` at {} failed: {}", key, hook, at, e),
            None => log::error!(target: "hooks", "{} `{}` failed: {}", key, hook, e),
        }
    }
    res
}

/// Like [`call`], but a failed hook yields `fallback`.
pub(crate) fn or<T>(
    key: &BlockKey,
    location: Location,
    hook: &'static str,
    fallback: T,
    f: impl FnOnce() -> HookResult<T>,
) -> T {
    call(key, Some(location), hook, f).unwrap_or(fallback)
}

/// Guard for hooks that cannot report errors themselves.
pub(crate) fn value<T>(
    key: &BlockKey,
    location: Location,
    hook: &'static str,
    fallback: T,
    f: impl FnOnce() -> T,
) -> T {
    or(key, location, hook, fallback, || Ok(f()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dimblock_geom::WorldId;

    #[test]
    fn panics_become_hook_errors() {
        let key: BlockKey = "demo:bad".parse().unwrap();
        let at = Location::new(WorldId(0), 0, 0, 0);
        let res: HookResult<u8> = call(&key, Some(at), "tick", || panic!("boom"));
        match res {
            Err(BlockError::Hook(msg)) => assert!(msg.contains("boom")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(value(&key, at, "power_level", 0u8, || panic!("boom")), 0);
        assert_eq!(or(&key, at, "tick", 1u8, || Err(BlockError::hook("no"))), 1);
        assert_eq!(or(&key, at, "tick", 1u8, || Ok(7)), 7);
    }
}
