//! Executable services built on top of the libraries

use structopt::StructOpt;

pub mod consumer;

/// Options shared by all services
#[derive(Debug, StructOpt, Clone)]
pub struct SharedOptions {
    /// Redis database server used for stream consumption and publishing
    #[structopt(short, long, global = true, env = "REDIS", default_value = "redis://wsrelay-redis/")]
    pub redis: String,

    /// Log level
    #[structopt(short, long, global = true, env = "RUST_LOG", default_value = "info")]
    pub log: String,

    /// Endpoint of an OpenTelemetry collector, tracing is disabled when unset
    #[structopt(long, global = true, env = "TRACE_ENDPOINT")]
    pub trace_endpoint: Option<String>,
}
