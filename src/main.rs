mod config;
mod demo;

use std::path::PathBuf;

use clap::Parser;
use dimblock_blocks::{BlockError, BlockKey, EntityRef, Hand, HitResult};
use dimblock_geom::{BlockFace, Location, WorldId};
use dimblock_runtime::{EngineAdapter, MemoryEngine, Registry};

use crate::config::HostConfig;
use crate::demo::{Kiln, KilnState, Lamp};

#[derive(Parser, Debug)]
#[command(
    name = "dimblock",
    about = "Drives the sample custom blocks against the in-memory engine"
)]
struct Args {
    #[arg(long, default_value = "assets/host.toml")]
    config: PathBuf,
    #[arg(long, default_value_t = 20)]
    ticks: u64,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log: String,
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log.as_str())).init();
    if let Err(e) = run(&args) {
        log::error!(target: "host", "{}", e);
        std::process::exit(1);
    }
}

fn place(registry: &mut Registry<MemoryEngine>, key: &str, at: Location) -> Result<(), BlockError> {
    let key: BlockKey = key.parse()?;
    let definition = registry
        .definition_for(&key)
        .ok_or_else(|| BlockError::Unregistered(key.clone()))?;
    let data = registry
        .default_block_data_for(&*definition)
        .ok_or(BlockError::Unregistered(key))?;
    registry.set_block_data(&data, at, true)
}

fn kiln_fired(registry: &Registry<MemoryEngine>, at: Location) -> i32 {
    registry
        .tile_state_at(at)
        .and_then(|s| s.downcast_ref::<KilnState>())
        .map_or(0, |k| k.fired)
}

fn run(args: &Args) -> Result<(), BlockError> {
    let cfg = if args.config.exists() {
        HostConfig::from_path(&args.config)?
    } else {
        log::warn!(target: "host", "{} not found; using defaults", args.config.display());
        HostConfig::default()
    };
    let catalog = cfg.catalog()?;
    log::info!(target: "host", "{} block infos loaded", catalog.len());

    let engine = MemoryEngine::new(cfg.engine.clone());
    let mut registry = Registry::new(engine, cfg.registry.clone());
    demo::register_all(&mut registry, &catalog)?;

    let lamp_at = Location::new(WorldId(0), 0, 64, 0);
    let kiln_at = lamp_at.relative(BlockFace::East);
    place(&mut registry, Lamp::KEY, lamp_at)?;
    place(&mut registry, Kiln::KEY, kiln_at)?;

    let player = EntityRef::new(1, "minecraft:player");
    let hit = HitResult {
        location: lamp_at,
        face: BlockFace::Up,
    };
    let result = registry.interact(lamp_at, &player, Hand::Main, hit);
    log::info!(
        target: "host",
        "interact -> {:?}; lamp power {}",
        result,
        registry.power_level(lamp_at, BlockFace::Up)
    );

    let before = registry.engine().stamp();
    for _ in 0..args.ticks {
        let report = registry.run_tick();
        if report.fired + report.dropped > 0 {
            log::info!(
                target: "host",
                "[tick {}] fired {} dropped {} tiles {}",
                report.tick,
                report.fired,
                report.dropped,
                report.tiles_ticked
            );
        }
    }
    log::info!(target: "host", "kiln fired {} after {} ticks", kiln_fired(&registry, kiln_at), registry.now());
    log::info!(
        target: "host",
        "{} chunks changed while ticking; lamp chunk holds {} blocks at rev {}",
        registry.engine().changed_since(before).len(),
        registry.engine().snapshot_for_chunk(lamp_at).len(),
        registry.engine().chunk_rev(lamp_at)
    );

    if let Some(bytes) = registry.unload_tile_entity(kiln_at)? {
        log::info!(target: "host", "kiln unloaded to {} bytes", bytes.len());
        let loaded = registry.load_tile_entity(kiln_at, &bytes)?;
        log::info!(target: "host", "kiln reloaded: {} (fired {})", loaded, kiln_fired(&registry, kiln_at));
    }

    let next = registry.engine().clone().relabeled("memory-2");
    let (old, restored) = registry.reload_engine(next);
    log::info!(
        target: "host",
        "engine {} -> {}: {} tile entities restored, {} chunks touched",
        old.version(),
        registry.engine().version(),
        restored,
        registry.engine().stats().chunk_entries
    );

    registry.remove_block(kiln_at, true)?;
    registry.shutdown();
    Ok(())
}
