use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Command-line and environment configuration for the gateway process.
/// Every field is also settable through its `MT_*` environment variable;
/// `clap`'s `env` feature wires the fallback.
#[derive(Debug, Parser)]
#[command(name = "mtran-gateway", about = "Pivot-translation gateway")]
pub struct CliArgs {
    #[arg(long, env = "MT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "MT_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    #[arg(long, env = "MT_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    #[arg(long, env = "MT_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "MT_PORT", default_value_t = 8989)]
    pub port: u16,

    #[arg(long, env = "MT_OFFLINE", default_value_t = false)]
    pub offline: bool,

    #[arg(long, env = "MT_WORKER_IDLE_TIMEOUT", default_value_t = 300)]
    pub worker_idle_timeout_secs: u64,

    #[arg(long, env = "API_TOKEN")]
    pub api_token: Option<String>,

    #[arg(long, env = "CORE_API_TOKEN")]
    pub core_api_token: Option<String>,
}

/// Resolved configuration, with platform defaults for unset paths applied.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub log_level: String,
    pub config_dir: PathBuf,
    pub model_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub offline: bool,
    pub worker_idle_timeout: Duration,
    pub auth_token: Option<String>,
}

impl GatewayConfig {
    pub fn from_args(args: CliArgs) -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let mtran_root = home.join(".config").join("mtran");

        let config_dir = args
            .config_dir
            .unwrap_or_else(|| mtran_root.join("server"));
        let model_dir = args.model_dir.unwrap_or_else(|| mtran_root.join("models"));

        // `API_TOKEN` wins over `CORE_API_TOKEN` when both are set; absence
        // of either disables the bearer-token check entirely (spec §6).
        let auth_token = args
            .api_token
            .filter(|token| !token.trim().is_empty())
            .or(args.core_api_token.filter(|token| !token.trim().is_empty()));

        Self {
            log_level: args.log_level,
            config_dir,
            model_dir,
            host: args.host,
            port: args.port,
            offline: args.offline,
            worker_idle_timeout: Duration::from_secs(args.worker_idle_timeout_secs),
            auth_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::parse_from(argv)
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let args = parse(&["mtran-gateway"]);
        let config = GatewayConfig::from_args(args);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8989);
        assert!(!config.offline);
        assert_eq!(config.worker_idle_timeout, Duration::from_secs(300));
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn api_token_takes_priority_over_core_api_token() {
        let args = parse(&[
            "mtran-gateway",
            "--api-token",
            "primary",
            "--core-api-token",
            "fallback",
        ]);
        let config = GatewayConfig::from_args(args);
        assert_eq!(config.auth_token.as_deref(), Some("primary"));
    }

    #[test]
    fn core_api_token_is_used_when_api_token_is_absent() {
        let args = parse(&["mtran-gateway", "--core-api-token", "fallback"]);
        let config = GatewayConfig::from_args(args);
        assert_eq!(config.auth_token.as_deref(), Some("fallback"));
    }

    #[test]
    fn config_and_model_dirs_nest_under_the_mtran_config_root() {
        let args = parse(&["mtran-gateway"]);
        let config = GatewayConfig::from_args(args);
        assert!(config.config_dir.ends_with("mtran/server"));
        assert!(config.model_dir.ends_with("mtran/models"));
    }
}
