//! Command line flags
//!
//! Every flag is optional; a flag that is given overrides the value loaded
//! from the config file and environment.

use clap::Parser;

use crate::config::Settings;

#[derive(Parser, Debug, Default)]
#[command(name = "popbench")]
#[command(about = "Publish benchmark for MQTT brokers")]
pub struct Cli {
    /// MQTT broker endpoint as scheme://host:port
    #[arg(long)]
    pub broker: Option<String>,

    /// MQTT topic for outgoing messages
    #[arg(long)]
    pub topic: Option<String>,

    /// MQTT message payload. If empty, a payload of `--size` bytes is generated
    #[arg(long)]
    pub payload: Option<String>,

    /// MQTT client username (empty if auth disabled)
    #[arg(long)]
    pub username: Option<String>,

    /// MQTT client password (empty if auth disabled)
    #[arg(long, env = "POPBENCH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// QoS for published messages
    #[arg(long, allow_hyphen_values = true)]
    pub qos: Option<i64>,

    /// Publish acknowledgement timeout in milliseconds
    #[arg(long, allow_hyphen_values = true)]
    pub wait: Option<i64>,

    /// Size of the generated payload (bytes)
    #[arg(long, allow_hyphen_values = true)]
    pub size: Option<i64>,

    /// Number of messages to send per client
    #[arg(long, allow_hyphen_values = true)]
    pub count: Option<i64>,

    /// Number of clients to start
    #[arg(long, allow_hyphen_values = true)]
    pub clients: Option<i64>,

    /// Output format: text|json|csv
    #[arg(long)]
    pub format: Option<String>,

    /// Write the report to this file instead of stdout
    #[arg(long)]
    pub output: Option<String>,

    /// Suppress progress logs while running
    #[arg(long)]
    pub quiet: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// MQTT client id prefix (suffixed with '-<client-num>')
    #[arg(long)]
    pub client_prefix: Option<String>,

    /// Path to client certificate in PEM format
    #[arg(long)]
    pub client_cert: Option<String>,

    /// Path to private client key in PEM format
    #[arg(long)]
    pub client_key: Option<String>,

    /// Path to a CA certificate used to verify the broker
    #[arg(long)]
    pub ca_cert: Option<String>,

    /// Accept any broker certificate. Only for self-signed test brokers
    #[arg(long)]
    pub insecure_skip_verify: bool,
}

impl Cli {
    /// Applies the flags that were given on top of `settings`.
    pub fn apply(&self, mut settings: Settings) -> Settings {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }

        set(&mut settings.broker.url, &self.broker);
        set(&mut settings.broker.username, &self.username);
        set(&mut settings.broker.password, &self.password);
        set(&mut settings.broker.client_prefix, &self.client_prefix);
        set(&mut settings.broker.wait_ms, &self.wait);

        set(&mut settings.bench.topic, &self.topic);
        set(&mut settings.bench.payload, &self.payload);
        set(&mut settings.bench.qos, &self.qos);
        set(&mut settings.bench.size, &self.size);
        set(&mut settings.bench.count, &self.count);
        set(&mut settings.bench.clients, &self.clients);
        set(&mut settings.bench.format, &self.format);
        set(&mut settings.bench.output, &self.output);
        if self.quiet {
            settings.bench.quiet = true;
        }

        set(&mut settings.tls.client_cert, &self.client_cert);
        set(&mut settings.tls.client_key, &self.client_key);
        set(&mut settings.tls.ca_cert, &self.ca_cert);
        if self.insecure_skip_verify {
            settings.tls.insecure_skip_verify = true;
        }

        settings
    }

    /// Effective log level: quiet runs only show warnings and errors.
    pub fn effective_log_level(&self, settings: &Settings) -> &str {
        if settings.bench.quiet {
            "warn"
        } else {
            &self.log_level
        }
    }
}
