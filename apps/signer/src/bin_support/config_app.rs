//! Process configuration loaded from environment variables.
//!
//! The site file itself is parsed by [`crate::config::SiteConfig`]; this only
//! covers where to listen and where to find that file.

use std::env;
use std::path::PathBuf;

use crate::error::AppError;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_SITE_FILE: &str = "Signerfile";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub site_path: PathBuf,
}

impl Config {
    /// Read `SIGNER_HOST`, `SIGNER_PORT` and `SIGNER_CONFIG`, falling back to
    /// the defaults when unset.
    pub fn from_env() -> Result<Self, AppError> {
        let host = env::var("SIGNER_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let port = match env::var("SIGNER_PORT") {
            Ok(port_str) => port_str.parse::<u16>().map_err(|_| {
                AppError::config(format!(
                    "SIGNER_PORT must be a valid port number, got '{port_str}'"
                ))
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let site_path = env::var("SIGNER_CONFIG")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SITE_FILE.to_string());

        Ok(Config {
            host,
            port,
            site_path: PathBuf::from(site_path),
        })
    }
}
