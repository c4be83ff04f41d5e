use serde::Deserialize;

/// Top-level benchmark settings, as loaded from files, environment and CLI.
///
/// Values here are raw: numbers are signed so that out-of-range input can be
/// reported instead of silently wrapping. `validate` turns them into a
/// `BenchConfig`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub bench: BenchSettings,
    pub tls: TlsSettings,
}

/// Where to connect and as whom.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BrokerSettings {
    /// Broker endpoint as scheme://host:port.
    pub url: String,
    pub username: String,
    pub password: String,
    /// Client id prefix, suffixed with `-<client-num>`.
    pub client_prefix: String,
    /// Per-publish acknowledgement timeout in milliseconds.
    pub wait_ms: i64,
}

/// What each virtual client publishes, and how the report is produced.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BenchSettings {
    pub topic: String,
    pub qos: i64,
    /// Literal payload. When empty, a zeroed payload of `size` bytes is generated.
    pub payload: String,
    pub size: i64,
    pub count: i64,
    pub clients: i64,
    pub format: String,
    pub quiet: bool,
    /// Report destination. Empty means stdout.
    pub output: String,
}

/// Client certificate material for TLS brokers.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct TlsSettings {
    pub client_cert: String,
    pub client_key: String,
    pub ca_cert: String,
    /// Skip server certificate verification. Off unless asked for.
    pub insecure_skip_verify: bool,
}

/// Partial settings loaded from files or environment.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub broker: Option<PartialBrokerSettings>,
    pub bench: Option<PartialBenchSettings>,
    pub tls: Option<PartialTlsSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialBrokerSettings {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_prefix: Option<String>,
    pub wait_ms: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialBenchSettings {
    pub topic: Option<String>,
    pub qos: Option<i64>,
    pub payload: Option<String>,
    pub size: Option<i64>,
    pub count: Option<i64>,
    pub clients: Option<i64>,
    pub format: Option<String>,
    pub quiet: Option<bool>,
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialTlsSettings {
    pub client_cert: Option<String>,
    pub client_key: Option<String>,
    pub ca_cert: Option<String>,
    pub insecure_skip_verify: Option<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            broker: BrokerSettings {
                url: "tcp://localhost:1883".to_string(),
                username: String::new(),
                password: String::new(),
                client_prefix: "mqtt-benchmark".to_string(),
                wait_ms: 60_000,
            },
            bench: BenchSettings {
                topic: "/test".to_string(),
                qos: 1,
                payload: String::new(),
                size: 100,
                count: 100,
                clients: 10,
                format: "text".to_string(),
                quiet: false,
                output: String::new(),
            },
            tls: TlsSettings::default(),
        }
    }
}

impl Settings {
    /// Fills every value missing from `partial` with the corresponding value of `self`.
    pub fn merged(self, partial: PartialSettings) -> Self {
        let broker = partial.broker.unwrap_or_default();
        let bench = partial.bench.unwrap_or_default();
        let tls = partial.tls.unwrap_or_default();

        Self {
            broker: BrokerSettings {
                url: broker.url.unwrap_or(self.broker.url),
                username: broker.username.unwrap_or(self.broker.username),
                password: broker.password.unwrap_or(self.broker.password),
                client_prefix: broker.client_prefix.unwrap_or(self.broker.client_prefix),
                wait_ms: broker.wait_ms.unwrap_or(self.broker.wait_ms),
            },
            bench: BenchSettings {
                topic: bench.topic.unwrap_or(self.bench.topic),
                qos: bench.qos.unwrap_or(self.bench.qos),
                payload: bench.payload.unwrap_or(self.bench.payload),
                size: bench.size.unwrap_or(self.bench.size),
                count: bench.count.unwrap_or(self.bench.count),
                clients: bench.clients.unwrap_or(self.bench.clients),
                format: bench.format.unwrap_or(self.bench.format),
                quiet: bench.quiet.unwrap_or(self.bench.quiet),
                output: bench.output.unwrap_or(self.bench.output),
            },
            tls: TlsSettings {
                client_cert: tls.client_cert.unwrap_or(self.tls.client_cert),
                client_key: tls.client_key.unwrap_or(self.tls.client_key),
                ca_cert: tls.ca_cert.unwrap_or(self.tls.ca_cert),
                insecure_skip_verify: tls
                    .insecure_skip_verify
                    .unwrap_or(self.tls.insecure_skip_verify),
            },
        }
    }
}
