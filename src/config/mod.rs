//! The `config` module loads benchmark settings and validates them.
//!
//! Sources, lowest priority first: built-in defaults, an optional
//! `config/default.{toml,yaml,json}` file, `POPBENCH_*` environment variables
//! (sections separated by `__`, e.g. `POPBENCH_BENCH__CLIENTS=4`), and finally
//! CLI overrides. Validation is the only place where a run can fail fast.

mod settings;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use config::{Config, Environment, File};
use tracing::warn;

use crate::client::message::{PayloadSpec, Qos};
use crate::report::OutputFormat;
use crate::transport::mqtt::{BrokerEndpoint, Credentials};
use crate::transport::tls::TlsOptions;
use crate::utils::error::ConfigError;

pub use settings::{
    BenchSettings, BrokerSettings, PartialBenchSettings, PartialBrokerSettings, PartialSettings,
    PartialTlsSettings, Settings, TlsSettings,
};

/// Loads settings from the default file and environment variables, merged
/// over the built-in defaults.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix("POPBENCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(Settings::default().merged(partial))
}

/// Validated, ready-to-run benchmark configuration.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub broker: BrokerEndpoint,
    pub credentials: Option<Credentials>,
    pub client_prefix: String,
    pub wait: Duration,
    pub topic: Arc<str>,
    pub qos: Qos,
    pub payload: PayloadSpec,
    /// Messages per client.
    pub count: usize,
    pub clients: usize,
    pub format: OutputFormat,
    pub quiet: bool,
    pub output: Option<PathBuf>,
    /// Present only for TLS brokers.
    pub tls: Option<TlsOptions>,
}

impl BenchConfig {
    /// Client id sent to the broker for virtual client `id`.
    pub fn client_id(&self, id: usize) -> String {
        format!("{}-{}", self.client_prefix, id)
    }
}

impl Settings {
    /// Checks every value and resolves it into a `BenchConfig`.
    pub fn validate(&self) -> Result<BenchConfig, ConfigError> {
        let bench = &self.bench;

        if bench.clients < 1 {
            return Err(ConfigError::InvalidClients(bench.clients));
        }
        if bench.count < 1 {
            return Err(ConfigError::InvalidCount(bench.count));
        }
        if bench.size < 0 {
            return Err(ConfigError::InvalidSize(bench.size));
        }
        if self.broker.wait_ms < 1 {
            return Err(ConfigError::InvalidWait(self.broker.wait_ms));
        }

        let qos = u8::try_from(bench.qos)
            .ok()
            .and_then(|q| Qos::try_from(q).ok())
            .ok_or(ConfigError::InvalidQos(bench.qos))?;

        let tls = &self.tls;
        match (tls.client_cert.is_empty(), tls.client_key.is_empty()) {
            (false, true) => return Err(ConfigError::MissingClientKey),
            (true, false) => return Err(ConfigError::MissingClientCert),
            _ => {}
        }

        let broker = BrokerEndpoint::parse(&self.broker.url)?;
        let format: OutputFormat = bench.format.parse()?;

        let tls_options = if broker.secure {
            Some(TlsOptions {
                client_cert: non_empty_path(&tls.client_cert),
                client_key: non_empty_path(&tls.client_key),
                ca_cert: non_empty_path(&tls.ca_cert),
                insecure_skip_verify: tls.insecure_skip_verify,
            })
        } else {
            if !tls.client_cert.is_empty() {
                warn!(
                    broker = %self.broker.url,
                    "client certificate configured for a non-TLS broker url; it will not be used"
                );
            }
            None
        };

        let credentials = (!self.broker.username.is_empty() && !self.broker.password.is_empty())
            .then(|| Credentials {
                username: self.broker.username.clone(),
                password: self.broker.password.clone(),
            });

        let payload = if bench.payload.is_empty() {
            PayloadSpec::Generated(bench.size as usize)
        } else {
            PayloadSpec::literal(bench.payload.clone())
        };

        Ok(BenchConfig {
            broker,
            credentials,
            client_prefix: self.broker.client_prefix.clone(),
            wait: Duration::from_millis(self.broker.wait_ms as u64),
            topic: Arc::from(bench.topic.as_str()),
            qos,
            payload,
            count: bench.count as usize,
            clients: bench.clients as usize,
            format,
            quiet: bench.quiet,
            output: non_empty_path(&bench.output),
            tls: tls_options,
        })
    }
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    (!value.is_empty()).then(|| PathBuf::from(value))
}
