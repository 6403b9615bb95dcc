//! HTTP server command

use crate::app::ServeArgs;
use crate::server::run_server;
use anyhow::Result;
use askroute_core::Config;

pub async fn run(args: ServeArgs, mut config: Config) -> Result<()> {
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    run_server(&config).await
}
