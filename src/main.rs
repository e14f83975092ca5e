mod aof;
mod cmd;
mod config;
mod connection;
mod db;
mod dispatcher;
mod error;
mod macros;
mod pubsub;
mod resp;
mod server;
mod value;

use flexi_logger::{Duplicate, FileSpec, Logger};
use std::error::Error;

const DEFAULT_CONFIG_FILE: &str = "redis.conf";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config_file = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_owned());
    let config = config::parse(&config_file).await?;

    let mut logger = Logger::try_with_str(config.loglevel.to_string().to_lowercase())?;
    if let Some(logfile) = &config.logfile {
        logger = logger
            .log_to_file(FileSpec::try_from(logfile)?)
            .duplicate_to_stdout(Duplicate::All);
    }
    logger.start()?;

    server::serve(config).await?;

    Ok(())
}
