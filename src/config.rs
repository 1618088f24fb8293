//! Command-line/environment configuration and config-file locations.
//!
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use crate::api::DEFAULT_API_URL;
use crate::app::{DEFAULT_PAGE_SIZE, PAGE_SIZES};

const APP_DIR: &str = "usuarios-admin";

/// TUI to list, search and manage usuario records of a REST API.
#[derive(Parser, Debug, Clone)]
#[command(name = "usuarios-admin", version, about)]
pub struct Cli {
    /// Base URL of the usuarios collection.
    #[arg(long, env = "USUARIOS_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Directory holding theme.conf and keybinds.conf.
    #[arg(long, env = "USUARIOS_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Log file (the terminal is taken by the UI). Defaults to usuarios-admin.log in the config dir.
    #[arg(long, env = "USUARIOS_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Initial rows per page.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = parse_page_size)]
    pub page_size: usize,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

fn parse_page_size(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|e| format!("{e}"))?;
    if PAGE_SIZES.contains(&n) {
        Ok(n)
    } else {
        Err(format!("page size must be one of {:?}", PAGE_SIZES))
    }
}

/// Resolved settings the binary runs with.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub config_dir: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
    pub page_size: usize,
    pub timeout: Duration,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Self {
        let config_dir = cli.config_dir.unwrap_or_else(default_config_dir);
        let log_file = cli
            .log_file
            .unwrap_or_else(|| config_dir.join("usuarios-admin.log"));
        Self {
            api_url: cli.api_url,
            config_dir,
            log_file,
            log_level: cli.log_level,
            page_size: cli.page_size,
            timeout: Duration::from_secs(cli.timeout_secs),
        }
    }

    pub fn theme_path(&self) -> String {
        self.file("theme.conf")
    }

    pub fn keybinds_path(&self) -> String {
        self.file("keybinds.conf")
    }

    fn file(&self, name: &str) -> String {
        self.config_dir.join(name).to_string_lossy().into_owned()
    }
}

/// `$XDG_CONFIG_HOME/usuarios-admin`, else `$HOME/.config/usuarios-admin`, else the current dir.
pub fn default_config_dir() -> PathBuf {
    config_dir_from(
        std::env::var_os("XDG_CONFIG_HOME").as_deref().map(Path::new),
        std::env::var_os("HOME").as_deref().map(Path::new),
    )
}

fn config_dir_from(xdg: Option<&Path>, home: Option<&Path>) -> PathBuf {
    match (xdg, home) {
        (Some(x), _) if !x.as_os_str().is_empty() => x.join(APP_DIR),
        (_, Some(h)) if !h.as_os_str().is_empty() => h.join(".config").join(APP_DIR),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_api() {
        let cli = Cli::parse_from(["usuarios-admin", "--config-dir", "/tmp/ua"]);
        let cfg = AppConfig::from_cli(cli);
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.page_size, 10);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.log_file, PathBuf::from("/tmp/ua/usuarios-admin.log"));
        assert_eq!(cfg.theme_path(), "/tmp/ua/theme.conf");
        assert_eq!(cfg.keybinds_path(), "/tmp/ua/keybinds.conf");
    }

    #[test]
    fn page_size_must_be_offered() {
        assert!(Cli::try_parse_from(["usuarios-admin", "--page-size", "25"]).is_ok());
        assert!(Cli::try_parse_from(["usuarios-admin", "--page-size", "7"]).is_err());
        assert!(Cli::try_parse_from(["usuarios-admin", "--page-size", "x"]).is_err());
    }

    #[test]
    fn config_dir_prefers_xdg_then_home() {
        assert_eq!(
            config_dir_from(Some(Path::new("/x")), Some(Path::new("/h"))),
            PathBuf::from("/x/usuarios-admin")
        );
        assert_eq!(
            config_dir_from(Some(Path::new("")), Some(Path::new("/h"))),
            PathBuf::from("/h/.config/usuarios-admin")
        );
        assert_eq!(config_dir_from(None, None), PathBuf::from("."));
    }
}
