use tracing::debug;

use super::dispatch::{ActionDispatcher, ActionHandler};
use super::payload::Action;
use crate::error::{ConfigError, HandlerError};
use crate::turn::TurnContext;
use crate::world::{Identifier, WorldObject};

pub const ATTACK_ACTION: &str = "attack";
const TARGET_FIELD: &str = "target";

/// Puts the submitting player into a standing attack intent on `target`, an
/// object id in the player's own zone. Stale or malformed requests are
/// ignored so clients lagging behind the world do not produce errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttackAction;

impl AttackAction {
    pub fn register(dispatcher: &mut ActionDispatcher) -> Result<(), ConfigError> {
        dispatcher.register(ATTACK_ACTION, AttackAction)
    }
}

impl ActionHandler for AttackAction {
    fn on_action(
        &mut self,
        ctx: &mut TurnContext<'_>,
        player: &Identifier,
        action: &Action,
    ) -> Result<(), HandlerError> {
        let Some(target) = action.object_id(TARGET_FIELD) else {
            debug!(turn = %ctx.turn, player = %player, "attack_ignored_missing_target");
            return Ok(());
        };
        if target == player.object {
            debug!(turn = %ctx.turn, player = %player, "attack_ignored_self_target");
            return Ok(());
        }
        let Ok(zone) = ctx.world.zone_of_mut(player) else {
            debug!(turn = %ctx.turn, player = %player, "attack_ignored_unknown_zone");
            return Ok(());
        };
        if !zone.get(target).is_some_and(WorldObject::is_attackable) {
            debug!(
                turn = %ctx.turn,
                player = %player,
                target = %target,
                "attack_ignored_invalid_target"
            );
            return Ok(());
        }
        let Some(attacker) = zone.get_mut(player.object).and_then(WorldObject::entity_mut) else {
            debug!(turn = %ctx.turn, player = %player, "attack_ignored_missing_attacker");
            return Ok(());
        };

        attacker.start_attack(target);
        debug!(turn = %ctx.turn, player = %player, target = %target, "attack_started");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::{Turn, TurnNotifier};
    use crate::world::{Bounds, Entity, ObjectId, Position, World, Zone, ZoneId};

    struct Fixture {
        world: World,
        notifier: TurnNotifier,
        player: Identifier,
        rat: Identifier,
        crate_item: Identifier,
    }

    fn fixture() -> Fixture {
        let mut zone = Zone::new("cellar", Bounds::new(8, 8).expect("bounds"));
        let player = zone
            .add(WorldObject::player("hero", Entity::new(Position::new(1, 1))))
            .expect("player");
        let rat = zone
            .add(WorldObject::npc("rat", Entity::new(Position::new(2, 1)).with_hp(3)))
            .expect("rat");
        let crate_item = zone.add(WorldObject::item("crate")).expect("crate");
        let mut world = World::new();
        world.register_zone(zone).expect("register");
        Fixture {
            world,
            notifier: TurnNotifier::new(),
            player,
            rat,
            crate_item,
        }
    }

    fn attack(fixture: &mut Fixture, action: &Action) -> Option<ObjectId> {
        let mut dispatcher = ActionDispatcher::new();
        AttackAction::register(&mut dispatcher).expect("register");
        let mut ctx = TurnContext {
            turn: Turn(1),
            world: &mut fixture.world,
            notifier: &mut fixture.notifier,
        };
        let player = fixture.player.clone();
        assert_eq!(
            dispatcher.dispatch(&mut ctx, &player, action),
            crate::action::DispatchOutcome::Handled
        );
        fixture
            .world
            .object(&fixture.player)
            .expect("player")
            .entity()
            .and_then(Entity::attack_target)
    }

    fn target(id: ObjectId) -> Action {
        Action::new(ATTACK_ACTION).with("target", i64::from(id.0))
    }

    #[test]
    fn valid_target_starts_attack_intent() {
        let mut fixture = fixture();
        let rat = fixture.rat.object;
        assert_eq!(attack(&mut fixture, &target(rat)), Some(rat));
    }

    #[test]
    fn missing_or_unresolvable_target_changes_nothing() {
        let mut fixture = fixture();
        assert_eq!(attack(&mut fixture, &Action::new(ATTACK_ACTION)), None);
        assert_eq!(attack(&mut fixture, &target(ObjectId(7))), None);
        assert_eq!(
            attack(
                &mut fixture,
                &Action::new(ATTACK_ACTION).with("target", "rat")
            ),
            None
        );
        assert_eq!(
            fixture
                .world
                .zone(&ZoneId::from("cellar"))
                .expect("zone")
                .len(),
            3
        );
    }

    #[test]
    fn non_attackable_targets_are_ignored() {
        let mut fixture = fixture();
        let item = fixture.crate_item.object;
        assert_eq!(attack(&mut fixture, &target(item)), None);

        let rat = fixture.rat.clone();
        fixture
            .world
            .object_mut(&rat)
            .expect("rat")
            .entity_mut()
            .expect("entity")
            .damage(3);
        assert_eq!(attack(&mut fixture, &target(rat.object)), None);
    }

    #[test]
    fn players_may_not_target_themselves_even_though_attackable() {
        let mut fixture = fixture();
        let player = fixture.player.object;
        assert!(fixture
            .world
            .object(&fixture.player)
            .expect("player")
            .is_attackable());

        assert_eq!(attack(&mut fixture, &target(player)), None);
    }

    #[test]
    fn target_is_resolved_in_the_players_zone_only() {
        let mut fixture = fixture();
        let mut other = Zone::new("attic", Bounds::new(8, 8).expect("bounds"));
        for _ in 0..8 {
            other
                .add(WorldObject::npc("bat", Entity::new(Position::new(0, 0))))
                .expect("bat");
        }
        fixture.world.register_zone(other).expect("attic");

        assert_eq!(attack(&mut fixture, &target(ObjectId(5))), None);
    }
}
