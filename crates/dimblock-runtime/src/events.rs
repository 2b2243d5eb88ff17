//! Entry points an engine adapter calls when it intercepts a native block event.
//!
//! Each resolves the managed block at the location and runs the matching hook through
//! the guard. Unmanaged locations get the engine-neutral answer.

use dimblock_blocks::{EntityRef, Hand, HitResult, InteractionResult, ItemRef, PistonReaction, Rgb};
use dimblock_geom::{BlockFace, Location};

use crate::guard;
use crate::{EngineAdapter, Registry};

impl<E: EngineAdapter> Registry<E> {
    pub fn on_contact(&mut self, location: Location, entity: &EntityRef) {
        let Some((def, data)) = self.occupant(location) else {
            return;
        };
        guard::or(def.key(), location, "on_contact", (), || {
            def.on_contact(self, &data, location, entity)
        });
    }

    pub fn drop_naturally(&mut self, location: Location, item: Option<&ItemRef>) {
        let Some((def, data)) = self.occupant(location) else {
            return;
        };
        guard::or(def.key(), location, "drop_naturally", (), || {
            def.drop_naturally(self, &data, location, item)
        });
    }

    pub fn attack_block(&mut self, location: Location, entity: &EntityRef) {
        let Some((def, data)) = self.occupant(location) else {
            return;
        };
        guard::or(def.key(), location, "attack_block", (), || {
            def.attack_block(self, &data, location, entity)
        });
    }

    pub fn step_on(&mut self, location: Location, entity: &EntityRef) {
        let Some((def, _)) = self.occupant(location) else {
            return;
        };
        guard::or(def.key(), location, "step_on", (), || def.step_on(self, location, entity));
    }

    pub fn on_projectile_hit(&mut self, projectile: &EntityRef, hit: HitResult) {
        let Some((def, data)) = self.occupant(hit.location) else {
            return;
        };
        guard::or(def.key(), hit.location, "on_projectile_hit", (), || {
            def.on_projectile_hit(self, &data, projectile, hit)
        });
    }

    /// [`InteractionResult::Pass`] unless the block handled the interaction.
    pub fn interact(
        &mut self,
        location: Location,
        entity: &EntityRef,
        hand: Hand,
        hit: HitResult,
    ) -> InteractionResult {
        let Some((def, data)) = self.occupant(location) else {
            return InteractionResult::Pass;
        };
        guard::or(def.key(), location, "interact", InteractionResult::Pass, || {
            def.interact(self, &data, location, entity, hand, hit)
        })
    }

    pub fn handle_rain(&mut self, location: Location) {
        let Some((def, _)) = self.occupant(location) else {
            return;
        };
        guard::or(def.key(), location, "handle_rain", (), || def.handle_rain(self, location));
    }

    pub fn can_entity_spawn_on(&self, location: Location, kind: &str) -> bool {
        match self.occupant(location) {
            Some((def, data)) => guard::value(def.key(), location, "can_entity_spawn_on", true, || {
                def.can_entity_spawn_on(&data, location, kind)
            }),
            None => true,
        }
    }

    pub fn is_occluding(&self, location: Location) -> Option<bool> {
        let (def, data) = self.occupant(location)?;
        let fallback = def.info().occluding;
        Some(guard::value(def.key(), location, "is_occluding", fallback, || {
            def.is_occluding(&data, location)
        }))
    }

    pub fn explosion_resistance(&self, location: Location) -> Option<f32> {
        let (def, data) = self.occupant(location)?;
        let fallback = def.info().explosion_resistance;
        Some(guard::value(def.key(), location, "explosion_resistance", fallback, || {
            def.explosion_resistance(&data)
        }))
    }

    pub fn map_color(&self, location: Location) -> Option<Rgb> {
        let (def, data) = self.occupant(location)?;
        let fallback = def.info().map_color;
        Some(guard::value(def.key(), location, "map_color", fallback, || {
            def.map_color(&data, location)
        }))
    }

    pub fn piston_reaction(&self, location: Location) -> Option<PistonReaction> {
        let (def, data) = self.occupant(location)?;
        let fallback = def.info().piston_reaction;
        Some(guard::value(def.key(), location, "piston_reaction", fallback, || {
            def.piston_reaction(&data)
        }))
    }

    pub fn destroyed_by_fluid(&self, location: Location, fluid: &str) -> Option<bool> {
        let (def, data) = self.occupant(location)?;
        let fallback = def.info().destroyable_by_fluid;
        Some(guard::value(def.key(), location, "destroyed_by_fluid", fallback, || {
            def.destroyed_by_fluid(&data, fluid)
        }))
    }

    pub fn causes_suffocation(&self, location: Location) -> Option<bool> {
        let (def, data) = self.occupant(location)?;
        let fallback = def.info().causes_suffocation;
        Some(guard::value(def.key(), location, "causes_suffocation", fallback, || {
            def.causes_suffocation(&data, location)
        }))
    }

    /// Comparator reading; 0 unless the block is complex redstone.
    pub fn comparator_level(&self, location: Location) -> u8 {
        let Some((def, data)) = self.occupant(location) else {
            return 0;
        };
        guard::value(def.key(), location, "comparator_level", 0, || {
            def.redstone()
                .filter(|r| r.is_complex_redstone(&data))
                .map_or(0, |r| r.comparator_level(&data, location).min(15))
        })
    }

    /// Power emitted towards `face`; 0 unless the block is a power source.
    pub fn power_level(&self, location: Location, face: BlockFace) -> u8 {
        let Some((def, data)) = self.occupant(location) else {
            return 0;
        };
        guard::value(def.key(), location, "power_level", 0, || {
            def.redstone()
                .filter(|r| r.is_power_source(&data))
                .map_or(0, |r| r.power_level(&data, location, face).min(15))
        })
    }
}
