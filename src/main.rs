//! Board Frontend Entry Point

mod app;
mod commands;
mod components;
mod config;
mod controller;
mod conveniences;
mod dom;
mod error;
mod logging;
mod models;
mod shortcuts;
mod store;
mod time;
mod timers;

#[cfg(test)]
mod testing;

use config::BoardConfig;
use tracing::warn;

fn main() {
    console_error_panic_hook::set_once();

    // Logging needs the level from config, so config errors are reported after
    let (config, config_error) = match BoardConfig::load() {
        Ok(config) => (config, None),
        Err(err) => (BoardConfig::default(), Some(err)),
    };
    logging::init(&config.log_level);
    if let Some(err) = config_error {
        warn!(%err, "invalid board config, using defaults");
    }

    app::start(config);
}
