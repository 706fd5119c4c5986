use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::runtime::config;

pub fn init() {
    let filter = EnvFilter::builder()
        .with_default_directive(config::config().log_level.into())
        .from_env_lossy();

    if tracing_subscriber::registry()
        .with(fmt::layer().compact())
        .with(filter)
        .try_init()
        .is_err()
    {
        debug!("logger already initialized");
    }
}
