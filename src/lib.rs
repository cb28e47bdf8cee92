//! A statsd client for rust.
//!
//! Encodes counter, gauge, timer and set samples into the statsd text
//! protocol, batches them under a datagram payload budget and ships them
//! over UDP, fire-and-forget. Metric emission never blocks on the network
//! and transport failures never reach the instrumented code.
//!
//! ```ignore
//! use statsd::client::Client;
//!
//! let client = Client::new("127.0.0.1:8125", "myapp")?;
//! client.incr("requests")?;
//! client.timer("request.duration", 12)?;
//! client.flush();
//! ```

mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod metric;
pub mod sampler;
pub mod sink;

pub use crate::client::{Client, ClientBuilder, ErrorHandler};
pub use crate::config::{StatsdOptions, DEFAULT_PORT};
pub use crate::error::StatsdError;
pub use crate::sampler::{RandomSampler, Sampler};
pub use crate::sink::{MetricSink, NopMetricSink, UdpMetricSink};
