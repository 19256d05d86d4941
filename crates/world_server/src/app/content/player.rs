use tracing::{debug, info};
use zone_engine::{
    Action, Entity, HandlerError, Identifier, Position, TurnContext, WorldObject, ZoneError,
};

pub(crate) const JOIN_ACTION: &str = "join";
pub(crate) const TALK_ACTION: &str = "talk";

const PLAYER_BASE_HP: u32 = 100;

/// Places a player object under the submitted identifier. Fields: `name`,
/// optional `x`/`y` spawn point (default 1,1). Rejoining with a live id is
/// ignored.
pub(crate) fn handle_join(
    ctx: &mut TurnContext<'_>,
    player: &Identifier,
    action: &Action,
) -> Result<(), HandlerError> {
    let name = action.text("name").unwrap_or("adventurer");
    let spawn = Position::new(coordinate(action, "x"), coordinate(action, "y"));
    let Ok(zone) = ctx.world.zone_of_mut(player) else {
        debug!(turn = %ctx.turn, player = %player, "join_ignored_unknown_zone");
        return Ok(());
    };

    let object = WorldObject::player(name, Entity::new(spawn).with_hp(PLAYER_BASE_HP))
        .with_identifier(player.clone());
    match zone.add(object) {
        Ok(identifier) => {
            info!(turn = %ctx.turn, player = %identifier, name, "player_joined");
            Ok(())
        }
        Err(ZoneError::AlreadyPresent { identifier }) => {
            debug!(turn = %ctx.turn, player = %identifier, "player_already_present");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Runs the interaction hook of `target` in the player's zone.
pub(crate) fn handle_talk(
    ctx: &mut TurnContext<'_>,
    player: &Identifier,
    action: &Action,
) -> Result<(), HandlerError> {
    let Some(target) = action.object_id("target") else {
        return Ok(());
    };
    let Ok(zone) = ctx.world.zone_of_mut(player) else {
        return Ok(());
    };
    if !zone.has(player.object) {
        return Ok(());
    }
    if !zone.interact(target, player, ctx.turn) {
        debug!(turn = %ctx.turn, player = %player, target = %target, "talk_ignored");
    }
    Ok(())
}

fn coordinate(action: &Action, field: &str) -> i32 {
    action
        .int(field)
        .and_then(|value| i32::try_from(value).ok())
        .unwrap_or(1)
}
