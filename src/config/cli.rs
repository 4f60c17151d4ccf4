//! Command line interface.
//!
//! Flags override values read from `--config`; anything left unset keeps the
//! file (or built-in) default.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::{AuthConfig, OfferConfig, ReceiveDestination};
use crate::config::validation::validate_config;

#[derive(Parser, Debug)]
#[command(name = "offer", version, about = "Offer a file (or stdin) over HTTP for a limited number of requests")]
pub struct Cli {
    /// File to offer; `-` or nothing reads standard input
    pub file: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Server address:port
    #[arg(short = 'a', long = "address")]
    pub address: Option<String>,

    /// Buffer size in bytes
    #[arg(short = 'b', long = "buffer-size")]
    pub buffer_size: Option<usize>,

    /// Don't remove the stored stdin file on exit
    #[arg(short = 'k', long = "keep")]
    pub keep: bool,

    /// Number of requests to serve before exiting (-1 for unlimited)
    #[arg(short = 'n', long = "count", allow_negative_numbers = true)]
    pub count: Option<i64>,

    /// Shut down after this many seconds (0 never)
    #[arg(short = 't', long = "timeout")]
    pub timeout: Option<u64>,

    /// Filename for the Content-Disposition header
    #[arg(short = 'f', long = "filename")]
    pub filename: Option<String>,

    /// Stream stdin without buffering (allows a single request)
    #[arg(short = 's', long = "stream")]
    pub stream: bool,

    /// Receive files instead of offering one
    #[arg(short = 'r', long = "receive")]
    pub receive: bool,

    /// Receive into this file instead of using the uploaded filenames
    #[arg(short = 'o', long = "output", requires = "receive")]
    pub output: Option<PathBuf>,

    /// Directory for received files
    #[arg(short = 'd', long = "dir", requires = "receive", conflicts_with = "output")]
    pub dir: Option<PathBuf>,

    /// Basic auth credentials as user:password
    #[arg(short = 'u', long = "user")]
    pub user: Option<String>,

    /// Temporary directory for storing stdin in a file
    #[arg(long = "tempdir")]
    pub temp_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long = "log")]
    pub log: bool,
}

impl Cli {
    /// Build the effective configuration: file first, then flags, then validation.
    pub fn into_config(self) -> Result<OfferConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => OfferConfig::default(),
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    fn apply(self, config: &mut OfferConfig) {
        if let Some(file) = self.file {
            config.payload.source = Some(file);
        }
        if let Some(address) = self.address {
            // `:8080` binds every interface.
            config.listener.bind_address = match address.strip_prefix(':') {
                Some(port) => format!("0.0.0.0:{port}"),
                None => address,
            };
        }
        if let Some(size) = self.buffer_size {
            config.payload.buffer_size = size;
        }
        if let Some(dir) = self.temp_dir {
            config.payload.temp_dir = dir;
        }
        if let Some(count) = self.count {
            config.limits.max_requests = count;
        }
        if let Some(timeout) = self.timeout {
            config.limits.timeout_secs = timeout;
        }
        if self.filename.is_some() {
            config.payload.disposition = self.filename;
        }
        config.payload.keep_temp |= self.keep;
        config.payload.stream |= self.stream;
        config.observability.verbose |= self.log;

        if self.receive {
            config.receive.enabled = true;
            if self.output.as_deref().map(|p| p.as_os_str() == "-").unwrap_or(false) {
                config.receive.destination = ReceiveDestination::Stdout;
            } else if let Some(output) = self.output {
                config.receive.destination = ReceiveDestination::File(output);
            } else if let Some(dir) = self.dir {
                config.receive.destination = ReceiveDestination::Directory(dir);
            }
        }

        if let Some(user) = self.user {
            let (username, password) = user.split_once(':').unwrap_or((user.as_str(), ""));
            config.auth = Some(AuthConfig {
                username: username.to_string(),
                password: password.to_string(),
            });
        }
    }
}
