//! Block registry, deferred tick scheduling, and engine adapter plumbing.
#![forbid(unsafe_code)]

mod config;
mod engine;
mod events;
mod guard;
mod memory;
mod registry;
mod scheduler;

pub use config::RegistryConfig;
pub use engine::{EngineAdapter, NativeBlock};
pub use memory::{MemoryEngine, MemoryEngineConfig, MemoryEngineStats};
pub use registry::{Registry, TickReport};
pub use scheduler::{DeferredTickScheduler, TickRequest};
