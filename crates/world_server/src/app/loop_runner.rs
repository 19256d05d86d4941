use std::io;
use std::process::ExitCode;

use thiserror::Error;
use tracing::{error, info};
use zone_engine::{
    build_world, load_world_config, ActionDispatcher, ConfigError, ShutdownHandle, TurnLoopConfig,
    TurnServer,
};

use super::bootstrap::AppWiring;
use super::{content, feed};

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to start action feed: {0}")]
    Feed(#[source] io::Error),
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match start(app) {
        Ok(mut server) => {
            let shutdown = ShutdownHandle::default();
            if let Err(err) = feed::spawn_stdin_feed(server.action_sender(), shutdown.clone()) {
                error!(error = %StartupError::Feed(err), "startup_failed");
                return ExitCode::FAILURE;
            }
            let last_turn = server.run(&shutdown);
            let totals = server.metrics_handle().totals();
            info!(
                turn = %last_turn,
                turns = totals.turns,
                actions_dispatched = totals.actions_dispatched,
                unknown_actions = totals.unknown_actions,
                listeners_fired = totals.listeners_fired,
                faults = totals.faults,
                "session_summary"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}

/// Loads the world layout, runs zone configurators and registers action
/// handlers. Only configuration errors can fail here.
pub(crate) fn start(app: AppWiring) -> Result<TurnServer, StartupError> {
    let world_config = match &app.config_path {
        Some(path) => {
            info!(path = %path.display(), "world_config_loading");
            load_world_config(path)?
        }
        None => {
            info!("world_config_builtin");
            content::demo_world_config()
        }
    };

    let configurators = content::configurators()?;
    let world = build_world(&world_config, &configurators)?;

    let mut dispatcher = ActionDispatcher::new();
    content::register_actions(&mut dispatcher)?;
    info!(
        action_types = ?dispatcher.action_types().collect::<Vec<_>>(),
        "actions_registered"
    );

    let loop_config = TurnLoopConfig {
        max_turns: app.max_turns,
        ..world_config.turn_loop_config(TurnLoopConfig::default())
    }
    .with_env_overrides();

    Ok(TurnServer::new(loop_config, world, dispatcher))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use zone_engine::ZoneId;

    use super::*;

    #[test]
    fn builtin_world_starts_with_both_zones_and_actions() {
        let server = start(AppWiring {
            config_path: None,
            max_turns: Some(3),
        })
        .expect("start");

        assert!(server.world().has_zone(&ZoneId::from("tavern")));
        assert!(server.world().has_zone(&ZoneId::from("castle")));
        assert!(server.dispatcher().is_registered("attack"));
        assert!(server.dispatcher().is_registered("offer"));
        assert_eq!(server.config().max_turns, Some(3));
    }

    #[test]
    fn missing_config_file_fails_startup() {
        let err = start(AppWiring {
            config_path: Some(PathBuf::from("/nonexistent/zoneturn/world.json")),
            max_turns: None,
        })
        .err()
        .expect("missing file");

        assert!(matches!(
            err,
            StartupError::Config(ConfigError::ReadFile { .. })
        ));
    }
}
