use std::net::ToSocketAddrs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time;

use log::warn;

use crate::batch::Batch;
use crate::config::StatsdOptions;
use crate::error::StatsdError;
use crate::metric::{check_token, encode, validate, MetricValue, Sample};
use crate::sampler::{RandomSampler, Sampler};
use crate::sink::{MetricSink, UdpMetricSink};

/// Receives every transport error when installed, replacing the default
/// throttled log line. Lets tests observe the failure path deterministically.
pub type ErrorHandler = Box<dyn Fn(&StatsdError) + Send + Sync>;

// The one shared mutable resource. Everything that decides what goes on the
// wire happens under this lock; transmission never does.
struct Inner {
    batch: Batch,
    sampler: Box<dyn Sampler>,
}

/// Client socket for statsd servers.
///
/// Metric calls are encoded, batched under the payload budget and sent as
/// UDP datagrams. A full batch is transmitted as a side effect of the call
/// that overflowed it; anything still buffered goes out on [`Client::flush`]
/// or when the client is dropped.
///
/// # Example
///
/// ```ignore
/// use statsd::client::Client;
///
/// let client = Client::new("127.0.0.1:8125", "myapp")?;
/// client.incr("some.metric.completed")?;
/// client.flush();
/// ```
pub struct Client {
    prefix: String,
    default_rate: f64,
    sink: Box<dyn MetricSink + Send + Sync>,
    inner: Mutex<Inner>,
    on_error: Option<ErrorHandler>,
    created: time::Instant,
    last_error_report: AtomicU64,
}

/// Assembles a [`Client`], with injection points for everything the plain
/// constructors default: the sink, the sampler and the error channel.
///
/// ```ignore
/// let client = ClientBuilder::new()
///     .host("stats.internal")
///     .prefix("myapp")
///     .on_error(|e| eprintln!("statsd: {}", e))
///     .build()?;
/// ```
pub struct ClientBuilder {
    options: StatsdOptions,
    sink: Option<Box<dyn MetricSink + Send + Sync>>,
    sampler: Option<Box<dyn Sampler>>,
    on_error: Option<ErrorHandler>,
}

impl ClientBuilder {
    pub fn new() -> ClientBuilder {
        ClientBuilder {
            options: StatsdOptions::default(),
            sink: None,
            sampler: None,
            on_error: None,
        }
    }

    pub fn host(mut self, host: &str) -> Self {
        self.options.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.options.port = port;
        self
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.options.prefix = prefix.to_string();
        self
    }

    pub fn max_payload_bytes(mut self, max_payload_bytes: usize) -> Self {
        self.options.max_payload_bytes = max_payload_bytes;
        self
    }

    /// Sample rate applied by operations that do not take an explicit one.
    pub fn default_rate(mut self, rate: f64) -> Self {
        self.options.default_rate = rate;
        self
    }

    /// Send payloads somewhere other than a UDP socket.
    pub fn sink<S>(mut self, sink: S) -> Self
    where
        S: MetricSink + Send + Sync + 'static,
    {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Replace the random source behind sample-rate filtering.
    pub fn sampler<S>(mut self, sampler: S) -> Self
    where
        S: Sampler + 'static,
    {
        self.sampler = Some(Box::new(sampler));
        self
    }

    /// Install a callback for transport errors.
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&StatsdError) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(handler));
        self
    }

    pub fn build(self) -> Result<Client, StatsdError> {
        check_token("prefix", &self.options.prefix)?;
        let rate = self.options.default_rate;
        if !rate.is_finite() || rate <= 0.0 || rate > 1.0 {
            return Err(StatsdError::InvalidSample(format!(
                "default rate {} is outside (0, 1]",
                rate
            )));
        }
        let sink: Box<dyn MetricSink + Send + Sync> = match self.sink {
            Some(sink) => sink,
            None => Box::new(UdpMetricSink::new((
                self.options.host.as_str(),
                self.options.port,
            ))?),
        };
        let sampler = self
            .sampler
            .unwrap_or_else(|| Box::new(RandomSampler::new()));
        Ok(Client {
            prefix: self.options.prefix,
            default_rate: rate,
            sink,
            inner: Mutex::new(Inner {
                batch: Batch::new(self.options.max_payload_bytes),
                sampler,
            }),
            on_error: self.on_error,
            created: time::Instant::now(),
            last_error_report: AtomicU64::new(u64::MAX),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl Client {
    /// Construct a new statsd client given a host/port & prefix.
    pub fn new<T: ToSocketAddrs>(host: T, prefix: &str) -> Result<Client, StatsdError> {
        let sink = UdpMetricSink::new(host)?;
        ClientBuilder::new().prefix(prefix).sink(sink).build()
    }

    /// Construct a client from a full set of options.
    pub fn from_options(options: &StatsdOptions) -> Result<Client, StatsdError> {
        ClientBuilder {
            options: options.clone(),
            sink: None,
            sampler: None,
            on_error: None,
        }
        .build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Increment a metric by 1
    ///
    /// ```ignore
    /// # Increment a given metric by 1.
    /// client.incr("metric.completed")?;
    /// ```
    ///
    /// This modifies a counter with the client's default sampling rate.
    pub fn incr(&self, metric: &str) -> Result<(), StatsdError> {
        self.count(metric, 1)
    }

    /// Decrement a metric by -1
    ///
    /// ```ignore
    /// # Decrement a given metric by 1
    /// client.decr("metric.completed")?;
    /// ```
    pub fn decr(&self, metric: &str) -> Result<(), StatsdError> {
        self.count(metric, -1)
    }

    /// Modify a counter by `value`.
    ///
    /// ```ignore
    /// // Increment by 12
    /// client.count("metric.completed", 12)?;
    /// ```
    pub fn count(&self, metric: &str, value: i64) -> Result<(), StatsdError> {
        self.emit(metric, MetricValue::Count(value), self.default_rate)
    }

    /// Modify a counter by `value` only x% of the time.
    ///
    /// ```ignore
    /// // Increment by 4 50% of the time.
    /// client.sampled_count("metric.completed", 4, 0.5)?;
    /// ```
    pub fn sampled_count(&self, metric: &str, value: i64, rate: f64) -> Result<(), StatsdError> {
        self.emit(metric, MetricValue::Count(value), rate)
    }

    /// Set a gauge value.
    ///
    /// Each call produces an independent line; the server replaces its gauge
    /// state with the new value rather than accumulating.
    ///
    /// ```ignore
    /// // set a gauge to 9001
    /// client.gauge("power_level.observed", 9001.0)?;
    /// ```
    pub fn gauge(&self, metric: &str, value: f64) -> Result<(), StatsdError> {
        self.emit(metric, MetricValue::Gauge(value), self.default_rate)
    }

    pub fn sampled_gauge(&self, metric: &str, value: f64, rate: f64) -> Result<(), StatsdError> {
        self.emit(metric, MetricValue::Gauge(value), rate)
    }

    /// Send a timer value in whole milliseconds.
    ///
    /// ```ignore
    /// client.timer("response.duration", 10)?;
    /// ```
    pub fn timer(&self, metric: &str, value: u64) -> Result<(), StatsdError> {
        self.emit(metric, MetricValue::Timer(value), self.default_rate)
    }

    pub fn sampled_timer(&self, metric: &str, value: u64, rate: f64) -> Result<(), StatsdError> {
        self.emit(metric, MetricValue::Timer(value), rate)
    }

    /// Time a block of code.
    ///
    /// The passed closure will be timed and executed. The block's
    /// duration will be sent as a metric.
    ///
    /// ```ignore
    /// let sum = client.time("response.duration", || {
    ///     // Your code here.
    ///     2 + 2
    /// })?;
    /// ```
    pub fn time<F, R>(&self, metric: &str, callable: F) -> Result<R, StatsdError>
    where
        F: FnOnce() -> R,
    {
        let start = time::Instant::now();
        let return_val = callable();
        let used = start.elapsed();
        self.timer(metric, used.as_millis() as u64)?;
        Ok(return_val)
    }

    /// Record a member of a set.
    ///
    /// The server counts distinct members per flush interval, so repeated
    /// calls with the same value count once.
    ///
    /// ```ignore
    /// client.set("users.seen", "user-42")?;
    /// ```
    pub fn set(&self, metric: &str, value: &str) -> Result<(), StatsdError> {
        self.emit(metric, MetricValue::Set(value), self.default_rate)
    }

    pub fn sampled_set(&self, metric: &str, value: &str, rate: f64) -> Result<(), StatsdError> {
        self.emit(metric, MetricValue::Set(value), rate)
    }

    /// Force transmission of whatever is buffered.
    ///
    /// The buffer is cleared whether or not transmission succeeds; delivery
    /// is best-effort throughout.
    pub fn flush(&self) {
        let due = self.lock_inner().batch.take();
        if let Some(payload) = due {
            self.transmit(&payload);
        }
    }

    fn emit(&self, metric: &str, value: MetricValue, rate: f64) -> Result<(), StatsdError> {
        let name = self.prepare(metric);
        let sample = Sample::new(&name, value, rate);
        // Validate before the sampling draw so that a bad name fails every
        // call, not just the surviving fraction.
        validate(&sample)?;

        let due = {
            let mut inner = self.lock_inner();
            if !inner.sampler.keep(rate) {
                return Ok(());
            }
            let line = encode(&sample)?;
            inner.batch.push(&line)
        };
        for payload in due {
            self.transmit(&payload);
        }
        Ok(())
    }

    fn prepare(&self, metric: &str) -> String {
        if self.prefix.is_empty() {
            metric.to_string()
        } else {
            format!("{}.{}", self.prefix, metric)
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        // a caller thread that panicked mid-emit must not wedge metrics for
        // every other thread
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Send a finished payload, routing failures to the error channel.
    fn transmit(&self, payload: &[u8]) {
        if let Err(e) = self.sink.emit(payload) {
            self.report_transport_error(StatsdError::Io(e));
        }
    }

    fn report_transport_error(&self, err: StatsdError) {
        if let Some(handler) = &self.on_error {
            handler(&err);
            return;
        }
        // at most one log line per 64s window; a dead server must not flood
        // the host application's logs
        let time_slice = self.created.elapsed().as_secs() >> 6;
        if self.last_error_report.swap(time_slice, Ordering::Relaxed) != time_slice {
            warn!("statsd send failed: {}", err);
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.flush();
    }
}
