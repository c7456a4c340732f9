//! Command-line flags and layered settings.
//!
//! Settings are resolved from, lowest priority first:
//!
//! 1. built-in defaults
//! 2. an optional config file (`--config`, any format the `config` crate reads)
//! 3. `KEYLIGHT_*` environment variables (e.g. `KEYLIGHT_IPADDRESS`)
//! 4. flags given on the command line
//!
//! Keys use the flag names: `timeout`, `ipaddress`, `port`, `metricport`,
//! `interval`, `pollurl`, `metricurl`, `datastore`, `file`, `log_level`.
//!
//! ```toml
//! ipaddress = "10.0.0.42"
//! interval = "30s"
//! datastore = "/var/lib/keylight"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use keylight_poller::PollerConfig;
use keylight_sdk::prometheus::PrometheusConfig;
use keylight_sdk::DEFAULT_NAMESPACE;
use serde::Deserialize;

use crate::duration::parse_duration;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "KEYLIGHT";

#[derive(Parser, Debug, Default)]
#[command(name = "elgato-keylight-exporter")]
#[command(about = "Prometheus exporter for Elgato Key Light status")]
#[command(version)]
pub struct Args {
    /// Timeout for polling the light, e.g. "1s", "500ms" or "1s500ms" [default: 1s]
    #[arg(long)]
    pub timeout: Option<String>,

    /// IP address of the light [default: 192.168.1.209]
    #[arg(long)]
    pub ipaddress: Option<String>,

    /// Port of the light [default: 9123]
    #[arg(long)]
    pub port: Option<u16>,

    /// Port for serving metrics [default: 9091]
    #[arg(long)]
    pub metricport: Option<u16>,

    /// Polling interval, e.g. "10s", "1m" or "1m30s" [default: 10s]
    #[arg(long)]
    pub interval: Option<String>,

    /// Path to poll on the light [default: elgato/lights]
    #[arg(long)]
    pub pollurl: Option<String>,

    /// Path to serve metrics on [default: /metrics]
    #[arg(long)]
    pub metricurl: Option<String>,

    /// Directory to archive every polled body in (unset or empty disables)
    #[arg(long)]
    pub datastore: Option<String>,

    /// Parse this file, print the resulting metrics and exit (empty disables)
    #[arg(long)]
    pub file: Option<String>,

    /// Config file with any of the settings above
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Default log filter when RUST_LOG is unset [default: info]
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Settings as they appear in files and the environment.
#[derive(Debug, Deserialize)]
struct RawSettings {
    timeout: String,
    ipaddress: String,
    port: u16,
    metricport: u16,
    interval: String,
    pollurl: String,
    metricurl: String,
    #[serde(default)]
    datastore: Option<String>,
    #[serde(default)]
    file: Option<String>,
    log_level: String,
}

/// Validated settings for one run of the exporter.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub poller: PollerConfig,
    pub metric_port: u16,
    pub metrics_path: String,
    pub file: Option<PathBuf>,
    pub log_level: String,
}

impl Settings {
    /// Resolve settings from defaults, config file, environment and flags.
    pub fn load(args: &Args) -> Result<Self> {
        Self::load_with_env(args, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(args: &Args, env: Environment) -> Result<Self> {
        let defaults = PollerConfig::default();

        let mut builder = Config::builder()
            .set_default("timeout", "1s")?
            .set_default("ipaddress", defaults.address)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("metricport", 9091_i64)?
            .set_default("interval", "10s")?
            .set_default("pollurl", defaults.poll_path)?
            .set_default("metricurl", "/metrics")?
            .set_default("log_level", "info")?;

        if let Some(path) = &args.config {
            builder = builder.add_source(File::from(path.as_path()));
        }

        let raw: RawSettings = builder
            .add_source(env)
            .set_override_option("timeout", args.timeout.clone())?
            .set_override_option("ipaddress", args.ipaddress.clone())?
            .set_override_option("port", args.port.map(i64::from))?
            .set_override_option("metricport", args.metricport.map(i64::from))?
            .set_override_option("interval", args.interval.clone())?
            .set_override_option("pollurl", args.pollurl.clone())?
            .set_override_option("metricurl", args.metricurl.clone())?
            .set_override_option("datastore", args.datastore.clone())?
            .set_override_option("file", args.file.clone())?
            .set_override_option("log_level", args.log_level.clone())?
            .build()
            .context("failed to load configuration")?
            .try_deserialize()
            .context("invalid configuration")?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self> {
        let timeout = parse_duration(&raw.timeout)
            .with_context(|| format!("invalid timeout {:?}", raw.timeout))?;
        let interval = parse_duration(&raw.interval)
            .with_context(|| format!("invalid interval {:?}", raw.interval))?;

        if timeout == Duration::ZERO {
            bail!("timeout must be greater than zero");
        }
        if interval == Duration::ZERO {
            bail!("interval must be greater than zero");
        }
        if raw.ipaddress.trim().is_empty() {
            bail!("ipaddress must not be empty");
        }
        if raw.pollurl.trim_start_matches('/').is_empty() {
            bail!("pollurl must not be empty");
        }

        Ok(Self {
            poller: PollerConfig {
                address: raw.ipaddress,
                port: raw.port,
                poll_path: raw.pollurl,
                interval,
                timeout,
                archive_dir: non_empty(raw.datastore).map(PathBuf::from),
            },
            metric_port: raw.metricport,
            metrics_path: raw.metricurl,
            file: non_empty(raw.file).map(PathBuf::from),
            log_level: raw.log_level,
        })
    }

    /// Scrape endpoint configuration: all interfaces on the metrics port.
    pub fn prometheus_config(&self) -> PrometheusConfig {
        PrometheusConfig::builder()
            .listen_addr(format!("0.0.0.0:{}", self.metric_port))
            .metrics_path(self.metrics_path.clone())
            .namespace(DEFAULT_NAMESPACE)
            .build()
    }
}

// An empty string means "disabled".
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env() -> Environment {
        Environment::with_prefix(ENV_PREFIX).source(Some(config::Map::new()))
    }

    fn env(vars: &[(&str, &str)]) -> Environment {
        let mut map = config::Map::new();
        for (key, value) in vars {
            map.insert(key.to_string(), value.to_string());
        }
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_match_flag_defaults() {
        let settings = Settings::load_with_env(&Args::default(), no_env()).unwrap();

        assert_eq!(settings.poller, PollerConfig::default());
        assert_eq!(settings.metric_port, 9091);
        assert_eq!(settings.metrics_path, "/metrics");
        assert_eq!(settings.file, None);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "elgato-keylight-exporter",
            "--ipaddress",
            "10.0.0.42",
            "--port",
            "9999",
            "--timeout",
            "250ms",
            "--interval",
            "1m",
            "--pollurl",
            "custom/path",
            "--metricport",
            "9200",
            "--metricurl",
            "/prom",
            "--datastore",
            "/tmp/keylight",
        ]);
        let settings = Settings::load_with_env(&args, no_env()).unwrap();

        assert_eq!(settings.poller.address, "10.0.0.42");
        assert_eq!(settings.poller.port, 9999);
        assert_eq!(settings.poller.timeout, Duration::from_millis(250));
        assert_eq!(settings.poller.interval, Duration::from_secs(60));
        assert_eq!(settings.poller.url(), "http://10.0.0.42:9999/custom/path");
        assert_eq!(
            settings.poller.archive_dir,
            Some(PathBuf::from("/tmp/keylight"))
        );
        assert_eq!(settings.metric_port, 9200);
        assert_eq!(settings.metrics_path, "/prom");
    }

    #[test]
    fn config_file_is_layered_under_flags() {
        let file = config_file(
            r#"
ipaddress = "10.1.1.1"
port = 9000
interval = "30s"
log_level = "debug"
"#,
        );
        let args = Args {
            config: Some(file.path().to_path_buf()),
            port: Some(9124),
            ..Default::default()
        };
        let settings = Settings::load_with_env(&args, no_env()).unwrap();

        assert_eq!(settings.poller.address, "10.1.1.1");
        assert_eq!(settings.poller.port, 9124);
        assert_eq!(settings.poller.interval, Duration::from_secs(30));
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn environment_sits_between_file_and_flags() {
        let file = config_file("ipaddress = \"10.1.1.1\"\nmetricport = 9000\n");
        let args = Args {
            config: Some(file.path().to_path_buf()),
            metricport: Some(9300),
            ..Default::default()
        };
        let settings = Settings::load_with_env(
            &args,
            env(&[("KEYLIGHT_IPADDRESS", "10.2.2.2"), ("KEYLIGHT_METRICPORT", "9100")]),
        )
        .unwrap();

        assert_eq!(settings.poller.address, "10.2.2.2");
        assert_eq!(settings.metric_port, 9300);
    }

    #[test]
    fn empty_datastore_disables_archive() {
        let args =
            Args::try_parse_from(["elgato-keylight-exporter", "--datastore", "", "--file", ""])
                .unwrap();
        let settings = Settings::load_with_env(&args, no_env()).unwrap();

        assert_eq!(settings.poller.archive_dir, None);
        assert_eq!(settings.file, None);
    }

    #[test]
    fn compound_durations_are_accepted() {
        let args = Args::try_parse_from([
            "elgato-keylight-exporter",
            "--interval",
            "1m30s",
            "--timeout",
            "1s500ms",
        ])
        .unwrap();
        let settings = Settings::load_with_env(&args, no_env()).unwrap();

        assert_eq!(settings.poller.interval, Duration::from_secs(90));
        assert_eq!(settings.poller.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn file_flag_selects_single_file_mode() {
        let args = Args {
            file: Some("sample.json".to_string()),
            ..Default::default()
        };
        let settings = Settings::load_with_env(&args, no_env()).unwrap();

        assert_eq!(settings.file, Some(PathBuf::from("sample.json")));
    }

    #[test]
    fn invalid_durations_are_rejected() {
        for (timeout, interval) in [("soon", "10s"), ("1s", "often"), ("0s", "10s"), ("1s", "0ms")] {
            let args = Args {
                timeout: Some(timeout.to_string()),
                interval: Some(interval.to_string()),
                ..Default::default()
            };
            assert!(
                Settings::load_with_env(&args, no_env()).is_err(),
                "{} / {}",
                timeout,
                interval
            );
        }
    }

    #[test]
    fn empty_address_is_rejected() {
        let args = Args {
            ipaddress: Some(String::new()),
            ..Default::default()
        };
        assert!(Settings::load_with_env(&args, no_env()).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let args = Args {
            config: Some(PathBuf::from("/definitely/not/here.toml")),
            ..Default::default()
        };
        assert!(Settings::load_with_env(&args, no_env()).is_err());
    }

    #[test]
    fn prometheus_config_listens_on_metric_port() {
        let settings = Settings::load_with_env(&Args::default(), no_env()).unwrap();
        let config = settings.prometheus_config();

        assert_eq!(config.listen_addr, "0.0.0.0:9091");
        assert_eq!(config.metrics_path, "/metrics");
        assert_eq!(config.namespace.as_deref(), Some("elgato_keylight"));
    }
}
