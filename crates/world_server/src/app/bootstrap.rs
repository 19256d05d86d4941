use std::env;
use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV_VAR: &str = "ZONETURN_CONFIG";
const MAX_TURNS_ENV_VAR: &str = "ZONETURN_MAX_TURNS";

pub(crate) struct AppWiring {
    /// World layout file. The built-in demo world is used when unset.
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) max_turns: Option<u64>,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Zone Turn Server Startup ===");

    AppWiring {
        config_path: env::var_os(CONFIG_ENV_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from),
        max_turns: parse_max_turns(env::var(MAX_TURNS_ENV_VAR).ok()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_max_turns(raw: Option<String>) -> Option<u64> {
    let raw = raw?;
    match raw.trim().parse::<u64>() {
        Ok(0) => None,
        Ok(turns) => Some(turns),
        Err(_) => {
            warn!(
                env_var = MAX_TURNS_ENV_VAR,
                value = raw.as_str(),
                "invalid max turns env var value; running until shutdown"
            );
            None
        }
    }
}
