mod market;
mod npcs;
mod player;

use zone_engine::{
    ActionDispatcher, AttackAction, Attributes, ConfigError, ConfiguratorRegistry, WorldConfig,
    ZoneConfig, ZoneId,
};

use market::{OFFER_ACTION, WITHDRAW_OFFER_ACTION};
use npcs::{CASTLE_SCIENTIST, TAVERN_MAID};
use player::{JOIN_ACTION, TALK_ACTION};

pub(crate) fn configurators() -> Result<ConfiguratorRegistry, ConfigError> {
    let mut registry = ConfiguratorRegistry::new();
    registry.register(TAVERN_MAID, npcs::configure_tavern_maid)?;
    registry.register(CASTLE_SCIENTIST, npcs::configure_castle_scientist)?;
    Ok(registry)
}

pub(crate) fn register_actions(dispatcher: &mut ActionDispatcher) -> Result<(), ConfigError> {
    AttackAction::register(dispatcher)?;
    dispatcher.register(JOIN_ACTION, player::handle_join)?;
    dispatcher.register(TALK_ACTION, player::handle_talk)?;
    dispatcher.register(OFFER_ACTION, market::handle_offer)?;
    dispatcher.register(WITHDRAW_OFFER_ACTION, market::handle_withdraw_offer)?;
    Ok(())
}

/// Two-zone world used when no layout file is configured.
pub(crate) fn demo_world_config() -> WorldConfig {
    WorldConfig {
        turn_ms: None,
        zones: vec![
            ZoneConfig {
                id: ZoneId::from("tavern"),
                width: 40,
                height: 40,
                configurators: vec![TAVERN_MAID.to_string()],
                attributes: Attributes::new(),
            },
            ZoneConfig {
                id: ZoneId::from("castle"),
                width: 128,
                height: 128,
                configurators: vec![CASTLE_SCIENTIST.to_string()],
                attributes: Attributes::new(),
            },
        ],
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use zone_engine::{build_world, ActionDispatcher, TurnLoopConfig, TurnServer};

    use super::*;

    pub(crate) fn demo_server() -> TurnServer {
        let world = build_world(&demo_world_config(), &configurators().expect("configurators"))
            .expect("world");
        let mut dispatcher = ActionDispatcher::new();
        register_actions(&mut dispatcher).expect("actions");
        TurnServer::new(TurnLoopConfig::default(), world, dispatcher)
    }
}
