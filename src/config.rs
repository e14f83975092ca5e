//! # Redis config parsing
//!
//! This module loads and parses the config, compatible with Redis format, to run the service
use crate::error::Error;
use redis_config_parser::de::from_slice;
use serde::Deserialize;
use serde_enum_str::Deserialize_enum_str;
use strum_macros::Display;

/// Config
///
/// Holds the parsed configuration to start the service
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// Run the server as a deamon
    #[serde(default)]
    pub daemonize: bool,
    /// Port to listen
    #[serde(default = "default_port")]
    pub port: u32,
    /// List of addresses to bind
    #[serde(default = "default_bind")]
    pub bind: Vec<String>,
    /// Log level
    #[serde(default, rename = "loglevel")]
    pub loglevel: LogLevel,
    /// File where to store the log
    #[serde(default, rename = "logfile")]
    pub logfile: Option<String>,
    /// Number of databases
    #[serde(default = "default_databases")]
    pub databases: u8,
    /// Unix socket
    #[serde(default)]
    pub unixsocket: Option<String>,
    /// Whether the append-only file is enabled
    #[serde(default, rename = "appendonly")]
    pub append_only: bool,
    /// Append-only file name, relative to the working directory
    #[serde(default = "default_append_filename", rename = "appendfilename")]
    pub append_filename: String,
    /// Soft cap on concurrent clients, informational only
    #[serde(default)]
    pub maxclients: u32,
    /// Shared password required to authenticate, empty disables auth
    #[serde(default)]
    pub requirepass: String,
    /// Peer addresses, accepted for compatibility with clustered deployments
    #[serde(default)]
    pub peers: Vec<String>,
    /// This node's own address, accepted for compatibility
    #[serde(default, rename = "self")]
    pub self_addr: String,
}

fn default_port() -> u32 {
    63791
}

fn default_bind() -> Vec<String> {
    vec!["0.0.0.0".to_owned()]
}

fn default_databases() -> u8 {
    16
}

fn default_append_filename() -> String {
    "appendonly.aof".to_owned()
}

impl Config {
    /// Returns all addresses to bind
    pub fn get_tcp_hostnames(&self) -> Vec<String> {
        self.bind
            .iter()
            .map(|host| format!("{}:{}", host, self.port))
            .collect::<Vec<String>>()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemonize: false,
            port: default_port(),
            bind: default_bind(),
            loglevel: LogLevel::default(),
            logfile: None,
            databases: default_databases(),
            unixsocket: None,
            append_only: false,
            append_filename: default_append_filename(),
            maxclients: 0,
            requirepass: String::new(),
            peers: vec![],
            self_addr: String::new(),
        }
    }
}

/// Log levels
#[derive(Deserialize_enum_str, Debug, PartialEq, Clone, Display)]
pub enum LogLevel {
    /// Trace
    #[serde(rename = "trace")]
    Trace,
    /// Debug
    #[serde(rename = "debug")]
    Debug,
    /// Verbose
    #[serde(rename = "verbose")]
    Verbose,
    /// Notice
    #[serde(rename = "notice")]
    Notice,
    /// Warning
    #[serde(rename = "warning")]
    Warning,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Notice
    }
}

/// Loads and parses the config from a file path. If the file does not exist,
/// the default configuration is returned.
pub async fn parse(path: &str) -> Result<Config, Error> {
    match tokio::fs::read(path).await {
        Ok(content) => Ok(from_slice(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}
