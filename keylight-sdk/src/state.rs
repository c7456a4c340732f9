//! Concurrent metric state and its Prometheus text rendering.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use keylight_types::PollOutcome;
use parking_lot::RwLock;

/// Namespace prefixed to every exported series.
pub const DEFAULT_NAMESPACE: &str = "elgato_keylight";

/// A monotonically increasing floating point counter.
///
/// The value is stored as `f64` bits so fractional seconds can be
/// accumulated without a lock.
#[derive(Debug, Default)]
pub struct Counter {
    bits: AtomicU64,
}

impl Counter {
    pub fn inc(&self) {
        self.add(1.0);
    }

    /// Add `delta` to the counter.
    ///
    /// Negative and NaN deltas are dropped so the counter never decreases.
    pub fn add(&self, delta: f64) {
        if !(delta >= 0.0) {
            return;
        }

        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self
                .bits
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// A value that is overwritten on every set.
#[derive(Debug, Default)]
pub struct Gauge {
    bits: AtomicU64,
}

impl Gauge {
    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// A family of counters keyed by the value of a single label.
#[derive(Debug)]
pub struct CounterVec {
    label: &'static str,
    counters: RwLock<BTreeMap<String, Arc<Counter>>>,
}

impl CounterVec {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            counters: RwLock::new(BTreeMap::new()),
        }
    }

    /// Get or create the counter for a label value.
    pub fn with_label(&self, value: &str) -> Arc<Counter> {
        // Fast path: check if it exists
        {
            let counters = self.counters.read();
            if let Some(counter) = counters.get(value) {
                return counter.clone();
            }
        }

        // Slow path: create it
        let mut counters = self.counters.write();
        counters
            .entry(value.to_string())
            .or_insert_with(|| Arc::new(Counter::default()))
            .clone()
    }

    /// Current value for a label, `None` if it was never incremented.
    pub fn get(&self, value: &str) -> Option<f64> {
        self.counters.read().get(value).map(|c| c.get())
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    fn samples(&self) -> Vec<(String, f64)> {
        self.counters
            .read()
            .iter()
            .map(|(value, counter)| (value.clone(), counter.get()))
            .collect()
    }
}

/// Every series the exporter publishes.
///
/// One instance is created at startup and shared between the poll loop,
/// which writes it, and the scrape server, which renders it.
#[derive(Debug)]
pub struct KeylightMetrics {
    pub polls: CounterVec,
    pub status_codes: CounterVec,
    pub last_good_poll_seconds: Gauge,
    pub last_poll_seconds: Gauge,
    pub poll_duration: Counter,
    pub parse_duration: Counter,
    pub last_error_time_seconds: Gauge,
    pub on_off: Gauge,
    pub brightness: Gauge,
    pub temperature: Gauge,
}

impl Default for KeylightMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl KeylightMetrics {
    pub fn new() -> Self {
        Self {
            polls: CounterVec::new("state"),
            status_codes: CounterVec::new("statusCode"),
            last_good_poll_seconds: Gauge::default(),
            last_poll_seconds: Gauge::default(),
            poll_duration: Counter::default(),
            parse_duration: Counter::default(),
            last_error_time_seconds: Gauge::default(),
            on_off: Gauge::default(),
            brightness: Gauge::default(),
            temperature: Gauge::default(),
        }
    }

    /// Number of polls that ended with `outcome`.
    pub fn polls(&self, outcome: PollOutcome) -> f64 {
        self.polls.get(outcome.as_str()).unwrap_or(0.0)
    }

    /// Number of responses seen with the given HTTP status.
    pub fn status_codes(&self, code: u16) -> f64 {
        self.status_codes.get(&code.to_string()).unwrap_or(0.0)
    }

    /// Render all series in the Prometheus text exposition format.
    ///
    /// Series names are prefixed with `namespace_` when a namespace is given.
    pub fn render(&self, namespace: Option<&str>) -> String {
        let prefix = namespace.map(|n| format!("{}_", n)).unwrap_or_default();
        let mut output = String::new();

        render_counter_vec(
            &mut output,
            &prefix,
            "polls",
            "Number of polls we have attempted",
            &self.polls,
        );
        render_counter_vec(
            &mut output,
            &prefix,
            "status_code_count",
            "A count of each status code encountered",
            &self.status_codes,
        );
        render_single(
            &mut output,
            &prefix,
            "last_good_poll_seconds",
            "The UNIX timestamp in seconds of the last good poll",
            "gauge",
            self.last_good_poll_seconds.get(),
        );
        render_single(
            &mut output,
            &prefix,
            "last_poll_seconds",
            "The UNIX timestamp in seconds of the last poll",
            "gauge",
            self.last_poll_seconds.get(),
        );
        render_single(
            &mut output,
            &prefix,
            "poll_duration",
            "The total duration of polling",
            "counter",
            self.poll_duration.get(),
        );
        render_single(
            &mut output,
            &prefix,
            "parse_duration",
            "The total duration of parsing",
            "counter",
            self.parse_duration.get(),
        );
        render_single(
            &mut output,
            &prefix,
            "last_error_time_seconds",
            "The UNIX timestamp in seconds of the last error",
            "gauge",
            self.last_error_time_seconds.get(),
        );
        render_single(
            &mut output,
            &prefix,
            "onoff",
            "Whether the keylight is on or off",
            "gauge",
            self.on_off.get(),
        );
        render_single(
            &mut output,
            &prefix,
            "brightness",
            "The brightness of the keylight",
            "gauge",
            self.brightness.get(),
        );
        render_single(
            &mut output,
            &prefix,
            "temperature",
            "The temperature of the keylight",
            "gauge",
            self.temperature.get(),
        );

        output
    }
}

fn render_header(output: &mut String, prefix: &str, name: &str, help: &str, kind: &str) {
    output.push_str(&format!("# HELP {}{} {}\n", prefix, name, help));
    output.push_str(&format!("# TYPE {}{} {}\n", prefix, name, kind));
}

fn render_single(output: &mut String, prefix: &str, name: &str, help: &str, kind: &str, value: f64) {
    render_header(output, prefix, name, help, kind);
    output.push_str(&format!("{}{} {}\n", prefix, name, value));
}

fn render_counter_vec(output: &mut String, prefix: &str, name: &str, help: &str, vec: &CounterVec) {
    render_header(output, prefix, name, help, "counter");
    for (value, count) in vec.samples() {
        output.push_str(&format!(
            "{}{}{{{}=\"{}\"}} {}\n",
            prefix,
            name,
            vec.label(),
            escape_label_value(&value),
            count
        ));
    }
}

/// Escape a label value for Prometheus format.
/// Backslash, double-quote, and newline must be escaped.
fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
