use crate::error::StatsdError;

/// The four statsd metric types and their wire tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
    Timer,
    Set,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "c",
            MetricType::Gauge => "g",
            MetricType::Timer => "ms",
            MetricType::Set => "s",
        }
    }
}

/// A metric value together with its type.
///
/// Counters are signed, timers are whole milliseconds, gauges are floats.
/// Set members are raw tokens; statsd servers track them for uniqueness
/// without ever parsing them as numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue<'a> {
    Count(i64),
    Gauge(f64),
    Timer(u64),
    Set(&'a str),
}

impl MetricValue<'_> {
    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricValue::Count(_) => MetricType::Counter,
            MetricValue::Gauge(_) => MetricType::Gauge,
            MetricValue::Timer(_) => MetricType::Timer,
            MetricValue::Set(_) => MetricType::Set,
        }
    }
}

/// A single metric observation, immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<'a> {
    pub name: &'a str,
    pub value: MetricValue<'a>,
    pub rate: f64,
}

impl<'a> Sample<'a> {
    pub fn new(name: &'a str, value: MetricValue<'a>, rate: f64) -> Sample<'a> {
        Sample { name, value, rate }
    }
}

// `:` and `|` delimit fields, `\n` delimits lines within a datagram. A name
// carrying any of them would be parsed as a different record by the server.
pub(crate) fn check_token(what: &str, token: &str) -> Result<(), StatsdError> {
    if token.contains(|c| c == ':' || c == '|' || c == '\n') {
        return Err(StatsdError::InvalidSample(format!(
            "{} contains a reserved delimiter: {:?}",
            what, token
        )));
    }
    Ok(())
}

/// Check that a sample can be encoded without producing an ambiguous line.
pub fn validate(sample: &Sample) -> Result<(), StatsdError> {
    if sample.name.is_empty() {
        return Err(StatsdError::InvalidSample(
            "metric name is empty".to_string(),
        ));
    }
    check_token("metric name", sample.name)?;
    match sample.value {
        MetricValue::Gauge(v) if !v.is_finite() => {
            return Err(StatsdError::InvalidSample(format!(
                "gauge value is not finite: {}",
                v
            )));
        }
        MetricValue::Set(member) => check_token("set value", member)?,
        _ => {}
    }
    if !sample.rate.is_finite() || sample.rate <= 0.0 || sample.rate > 1.0 {
        return Err(StatsdError::InvalidSample(format!(
            "sample rate {} is outside (0, 1]",
            sample.rate
        )));
    }
    Ok(())
}

/// Encode a sample into its wire line.
///
/// Produces `name:value|type`, with `|@rate` appended for sampled metrics
/// so the server can reinflate counts. Encoding is deterministic: the same
/// sample always yields the same line.
///
/// ```
/// use statsd::metric::{encode, MetricValue, Sample};
///
/// let line = encode(&Sample::new("app.hits", MetricValue::Count(1), 1.0)).unwrap();
/// assert_eq!(line, "app.hits:1|c");
/// ```
pub fn encode(sample: &Sample) -> Result<String, StatsdError> {
    validate(sample)?;
    let value = match sample.value {
        MetricValue::Count(v) => v.to_string(),
        MetricValue::Gauge(v) => v.to_string(),
        MetricValue::Timer(v) => v.to_string(),
        MetricValue::Set(v) => v.to_string(),
    };
    let type_tag = sample.value.metric_type().as_str();
    let line = if sample.rate < 1.0 {
        format!("{}:{}|{}|@{}", sample.name, value, type_tag, sample.rate)
    } else {
        format!("{}:{}|{}", sample.name, value, type_tag)
    };
    Ok(line)
}

#[cfg(test)]
mod test {
    use super::*;

    fn encoded(sample: &Sample) -> String {
        encode(sample).unwrap()
    }

    #[test]
    fn test_encode_counter() {
        assert_eq!(
            encoded(&Sample::new("counter", MetricValue::Count(1), 1.0)),
            "counter:1|c"
        );
        assert_eq!(
            encoded(&Sample::new("counter", MetricValue::Count(-4), 1.0)),
            "counter:-4|c"
        );
    }

    #[test]
    fn test_encode_gauge() {
        assert_eq!(
            encoded(&Sample::new("g", MetricValue::Gauge(3.5), 1.0)),
            "g:3.5|g"
        );
        assert_eq!(
            encoded(&Sample::new("g", MetricValue::Gauge(-1.0), 1.0)),
            "g:-1|g"
        );
    }

    #[test]
    fn test_encode_timer() {
        assert_eq!(
            encoded(&Sample::new("timer", MetricValue::Timer(3), 1.0)),
            "timer:3|ms"
        );
    }

    #[test]
    fn test_encode_set() {
        assert_eq!(
            encoded(&Sample::new("uniques", MetricValue::Set("user-9"), 1.0)),
            "uniques:user-9|s"
        );
    }

    #[test]
    fn test_encode_rate_suffix() {
        assert_eq!(
            encoded(&Sample::new("counter", MetricValue::Count(1), 0.5)),
            "counter:1|c|@0.5"
        );
        // rate 1 is the unsampled default and stays off the wire
        assert_eq!(
            encoded(&Sample::new("counter", MetricValue::Count(1), 1.0)),
            "counter:1|c"
        );
    }

    #[test]
    fn test_encode_is_deterministic() {
        let sample = Sample::new("app.latency", MetricValue::Timer(42), 0.25);
        assert_eq!(encoded(&sample), encoded(&sample));
    }

    #[test]
    fn test_rejects_empty_name() {
        let err = encode(&Sample::new("", MetricValue::Count(1), 1.0));
        assert!(matches!(err, Err(StatsdError::InvalidSample(_))));
    }

    #[test]
    fn test_rejects_reserved_delimiters_in_name() {
        for name in &["a:b", "a|b", "a\nb"] {
            let err = encode(&Sample::new(name, MetricValue::Count(1), 1.0));
            assert!(matches!(err, Err(StatsdError::InvalidSample(_))));
        }
    }

    #[test]
    fn test_rejects_reserved_delimiters_in_set_value() {
        let err = encode(&Sample::new("uniques", MetricValue::Set("a|b"), 1.0));
        assert!(matches!(err, Err(StatsdError::InvalidSample(_))));
    }

    #[test]
    fn test_rejects_non_finite_gauge() {
        for value in &[f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = encode(&Sample::new("g", MetricValue::Gauge(*value), 1.0));
            assert!(matches!(err, Err(StatsdError::InvalidSample(_))));
        }
    }

    #[test]
    fn test_rejects_out_of_range_rate() {
        for rate in &[0.0, -0.5, 1.5, f64::NAN] {
            let err = encode(&Sample::new("counter", MetricValue::Count(1), *rate));
            assert!(matches!(err, Err(StatsdError::InvalidSample(_))));
        }
    }
}
