use tracing::info;
use zone_engine::{
    Attributes, Behavior, BehaviorContext, ConfigError, Entity, FixedPath, HandlerError,
    Identifier, Position, WorldObject, Zone,
};

pub(crate) const TAVERN_MAID: &str = "tavern_maid";
pub(crate) const CASTLE_SCIENTIST: &str = "castle_scientist";

const NPC_BASE_HP: i64 = 100;
pub(crate) const LAST_SPOKEN_TO: &str = "last_spoken_to";

const MAID_PATROL: [(i32, i32); 9] = [
    (28, 15),
    (10, 15),
    (10, 27),
    (19, 27),
    (19, 28),
    (20, 28),
    (21, 28),
    (21, 27),
    (28, 27),
];

/// Answers an interaction with a fixed line and remembers who asked.
#[derive(Debug, Clone)]
pub(crate) struct Greeter {
    line: &'static str,
}

impl Behavior for Greeter {
    fn on_interact(
        &mut self,
        ctx: &mut BehaviorContext<'_>,
        actor: &Identifier,
    ) -> Result<(), HandlerError> {
        ctx.object
            .attributes_mut()
            .set(LAST_SPOKEN_TO, actor.to_string());
        info!(
            zone = %ctx.zone,
            npc = ctx.object.name(),
            actor = %actor,
            turn = %ctx.turn,
            line = self.line,
            "npc_spoke"
        );
        Ok(())
    }
}

pub(crate) fn configure_tavern_maid(
    zone: &mut Zone,
    attributes: &Attributes,
) -> Result<(), ConfigError> {
    let hp = hp_attribute(zone, attributes, "maid_hp")?;
    let patrol = MAID_PATROL
        .iter()
        .map(|&(x, y)| Position::new(x, y))
        .collect::<Vec<_>>();
    let maid = Entity::new(Position::new(10, 16))
        .with_hp(hp)
        .with_path(FixedPath::new(patrol, true))
        .with_behavior(Greeter {
            line: "I am the bar maid for this fair tavern. We sell imported beers and fine food.",
        });
    zone.add(WorldObject::npc("Old Mother Helena", maid))?;
    Ok(())
}

/// Stands still. `scientist_x` and `scientist_y` move him, and must be given
/// together.
pub(crate) fn configure_castle_scientist(
    zone: &mut Zone,
    attributes: &Attributes,
) -> Result<(), ConfigError> {
    let position = match (attributes.int("scientist_x"), attributes.int("scientist_y")) {
        (None, None) => Position::new(18, 84),
        (Some(x), Some(y)) => Position::new(
            coordinate(zone, "scientist_x", x)?,
            coordinate(zone, "scientist_y", y)?,
        ),
        (Some(_), None) => return Err(missing(zone, "scientist_y")),
        (None, Some(_)) => return Err(missing(zone, "scientist_x")),
    };
    let hp = hp_attribute(zone, attributes, "scientist_hp")?;
    let scientist = Entity::new(position)
        .with_hp(hp)
        .with_behavior(Greeter { line: "Ha ha ha ha!" });
    zone.add(WorldObject::npc("Vincento Price", scientist))?;
    Ok(())
}

fn hp_attribute(zone: &Zone, attributes: &Attributes, key: &str) -> Result<u32, ConfigError> {
    let raw = attributes.int(key).unwrap_or(NPC_BASE_HP);
    match u32::try_from(raw) {
        Ok(hp) if hp > 0 => Ok(hp),
        _ => Err(ConfigError::InvalidAttribute {
            zone: zone.id().clone(),
            attribute: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn coordinate(zone: &Zone, key: &str, raw: i64) -> Result<i32, ConfigError> {
    i32::try_from(raw).map_err(|_| ConfigError::InvalidAttribute {
        zone: zone.id().clone(),
        attribute: key.to_string(),
        value: raw.to_string(),
    })
}

fn missing(zone: &Zone, key: &str) -> ConfigError {
    ConfigError::MissingAttribute {
        zone: zone.id().clone(),
        attribute: key.to_string(),
    }
}
