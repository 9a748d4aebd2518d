//! Prometheus-style metrics registry.
//!
//! A [`MetricsRegistry`] owns every counter, gauge and histogram of a
//! service. Metrics are addressed by their full series key, the metric name
//! followed by its label set (`http_requests_total{method="GET",path="/"}`),
//! built with [`series`]. Lookups create the metric on first use; concurrent
//! first lookups of one key all receive the same `Arc`.
//!
//! There is no global registry. Construct one at startup and share it.
//!
//! # Example
//!
//! ```
//! use rolodex_telemetry::metrics::{exponential_buckets, series, MetricsRegistry};
//!
//! let registry = MetricsRegistry::new();
//! let key = series("http_request_duration_seconds", &[("method", "GET"), ("path", "/")]);
//! let histogram = registry.get_or_create_histogram(&key, &exponential_buckets(0.001, 5.0, 6));
//! histogram.observe(0.418);
//!
//! let text = registry.render();
//! assert!(text.contains(r#"http_request_duration_seconds_bucket{method="GET",path="/",le="0.125"} 0"#));
//! assert!(text.contains(r#"http_request_duration_seconds_bucket{method="GET",path="/",le="0.625"} 1"#));
//! ```

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Request duration buckets: `exponential_buckets(0.001, 5.0, 6)`.
pub const DEFAULT_DURATION_BUCKETS: [f64; 6] = [0.001, 0.005, 0.025, 0.125, 0.625, 3.125];

/// Returns `count` bucket bounds, starting at `start` and multiplying by
/// `factor` each step.
///
/// # Panics
///
/// Panics if `start` is not positive, `factor` is not greater than 1 or
/// `count` is zero.
#[must_use]
pub fn exponential_buckets(start: f64, factor: f64, count: usize) -> Vec<f64> {
    assert!(start > 0.0, "exponential_buckets needs a positive start");
    assert!(factor > 1.0, "exponential_buckets needs a factor greater than 1");
    assert!(count > 0, "exponential_buckets needs a positive count");

    let mut bounds = Vec::with_capacity(count);
    let mut bound = start;
    for _ in 0..count {
        bounds.push(bound);
        bound *= factor;
    }
    bounds
}

/// Builds a series key: `name{k1="v1",k2="v2"}`, or `name` without labels.
///
/// Label values are escaped for the Prometheus text format.
#[must_use]
pub fn series(name: &str, labels: &[(&str, &str)]) -> String {
    if labels.is_empty() {
        return name.to_string();
    }

    let mut key = String::with_capacity(name.len() + labels.len() * 16);
    key.push_str(name);
    key.push('{');
    for (i, (label, value)) in labels.iter().enumerate() {
        if i > 0 {
            key.push(',');
        }
        key.push_str(label);
        key.push_str("=\"");
        escape_label_value(&mut key, value);
        key.push('"');
    }
    key.push('}');
    key
}

fn escape_label_value(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
}

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// Increments the counter by one.
    pub fn inc(&self) {
        self.inc_by(1);
    }

    /// Increments the counter by `n`.
    pub fn inc_by(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Returns the current value.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// A value that can go up and down.
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicI64,
}

impl Gauge {
    /// Increments the gauge by one.
    pub fn inc(&self) {
        self.add(1);
    }

    /// Decrements the gauge by one.
    pub fn dec(&self) {
        self.add(-1);
    }

    /// Adds `delta` to the gauge.
    pub fn add(&self, delta: i64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    /// Sets the gauge.
    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Returns the current value.
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Increments the gauge and returns a guard that decrements it on drop.
    ///
    /// The decrement also happens when the holder unwinds or is cancelled.
    #[must_use = "the gauge is decremented as soon as the guard is dropped"]
    pub fn track(self: &Arc<Self>) -> GaugeGuard {
        self.inc();
        GaugeGuard {
            gauge: Arc::clone(self),
        }
    }
}

/// Guard returned by [`Gauge::track`].
#[derive(Debug)]
pub struct GaugeGuard {
    gauge: Arc<Gauge>,
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

/// A fixed-bucket histogram.
///
/// Bucket counts are stored per bucket and made cumulative when read, so
/// an observation touches exactly one bucket counter.
#[derive(Debug)]
pub struct Histogram {
    bounds: Vec<f64>,
    // one slot per bound plus the overflow slot
    counts: Vec<AtomicU64>,
    sum_bits: AtomicU64,
}

impl Histogram {
    /// Creates a histogram with the given upper bounds.
    ///
    /// Bounds are sorted and deduplicated; `+Inf` is implicit.
    #[must_use]
    pub fn new(bounds: &[f64]) -> Self {
        let mut bounds: Vec<f64> = bounds.iter().copied().filter(|b| b.is_finite()).collect();
        bounds.sort_by(f64::total_cmp);
        bounds.dedup();

        let counts = (0..=bounds.len()).map(|_| AtomicU64::new(0)).collect();
        Self {
            bounds,
            counts,
            sum_bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    /// Records one observation.
    pub fn observe(&self, value: f64) {
        let slot = self
            .bounds
            .iter()
            .position(|bound| value <= *bound)
            .unwrap_or(self.bounds.len());
        self.counts[slot].fetch_add(1, Ordering::Relaxed);

        let _ = self
            .sum_bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + value).to_bits())
            });
    }

    /// Records the seconds elapsed since `start`.
    pub fn observe_since(&self, start: Instant) {
        self.observe(start.elapsed().as_secs_f64());
    }

    /// Returns the finite upper bounds.
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Returns a point-in-time view of the histogram.
    pub fn snapshot(&self) -> HistogramSnapshot {
        let mut cumulative = Vec::with_capacity(self.counts.len());
        let mut running = 0u64;
        for count in &self.counts {
            running += count.load(Ordering::Relaxed);
            cumulative.push(running);
        }

        HistogramSnapshot {
            bounds: self.bounds.clone(),
            cumulative,
            sum: f64::from_bits(self.sum_bits.load(Ordering::Relaxed)),
        }
    }
}

/// Point-in-time view of a [`Histogram`].
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// Finite upper bounds.
    pub bounds: Vec<f64>,
    /// Cumulative counts, one per bound followed by the `+Inf` count.
    pub cumulative: Vec<u64>,
    /// Sum of all observations.
    pub sum: f64,
}

impl HistogramSnapshot {
    /// Total number of observations.
    pub fn count(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    /// Cumulative count of observations less than or equal to `bound`.
    pub fn bucket(&self, bound: f64) -> Option<u64> {
        self.bounds
            .iter()
            .position(|b| (*b - bound).abs() < f64::EPSILON * b.abs().max(1.0))
            .map(|i| self.cumulative[i])
    }
}

#[derive(Debug, Clone)]
enum Metric {
    Counter(Arc<Counter>),
    Gauge(Arc<Gauge>),
    Histogram(Arc<Histogram>),
}

impl Metric {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Counter(_) => "counter",
            Self::Gauge(_) => "gauge",
            Self::Histogram(_) => "histogram",
        }
    }
}

/// Registry of all metrics of a service.
///
/// # Panics
///
/// Looking up a key as a different kind than it was created with panics.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    metrics: DashMap<String, Metric>,
}

impl MetricsRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the counter for `key`, creating it on first use.
    pub fn get_or_create_counter(&self, key: &str) -> Arc<Counter> {
        match self.get_or_insert(key, || Metric::Counter(Arc::default())) {
            Metric::Counter(counter) => counter,
            other => kind_mismatch(key, "counter", &other),
        }
    }

    /// Returns the gauge for `key`, creating it on first use.
    pub fn get_or_create_gauge(&self, key: &str) -> Arc<Gauge> {
        match self.get_or_insert(key, || Metric::Gauge(Arc::default())) {
            Metric::Gauge(gauge) => gauge,
            other => kind_mismatch(key, "gauge", &other),
        }
    }

    /// Returns the histogram for `key`, creating it with `buckets` on
    /// first use. Later lookups keep the original buckets.
    pub fn get_or_create_histogram(&self, key: &str, buckets: &[f64]) -> Arc<Histogram> {
        match self.get_or_insert(key, || Metric::Histogram(Arc::new(Histogram::new(buckets)))) {
            Metric::Histogram(histogram) => histogram,
            other => kind_mismatch(key, "histogram", &other),
        }
    }

    fn get_or_insert(&self, key: &str, create: impl FnOnce() -> Metric) -> Metric {
        if let Some(existing) = self.metrics.get(key) {
            return existing.value().clone();
        }
        self.metrics
            .entry(key.to_string())
            .or_insert_with(create)
            .value()
            .clone()
    }

    /// Returns the number of series.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Returns `true` if no series were created yet.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Renders every series in Prometheus text exposition format.
    ///
    /// Families are sorted by name and series by label set, so two renders
    /// with no recording in between are identical.
    pub fn render(&self) -> String {
        let mut families: BTreeMap<String, BTreeMap<String, Metric>> = BTreeMap::new();
        for entry in &self.metrics {
            let (family, labels) = split_key(entry.key());
            families
                .entry(family.to_string())
                .or_default()
                .insert(labels.to_string(), entry.value().clone());
        }

        let mut out = String::new();
        for (family, series) in &families {
            let Some(kind) = series.values().next().map(Metric::kind) else {
                continue;
            };
            let _ = writeln!(out, "# TYPE {family} {kind}");

            for (labels, metric) in series {
                match metric {
                    Metric::Counter(counter) => {
                        let _ = writeln!(out, "{family}{} {}", braced(labels), counter.get());
                    }
                    Metric::Gauge(gauge) => {
                        let _ = writeln!(out, "{family}{} {}", braced(labels), gauge.get());
                    }
                    Metric::Histogram(histogram) => {
                        render_histogram(&mut out, family, labels, &histogram.snapshot());
                    }
                }
            }
        }
        out
    }
}

fn kind_mismatch(key: &str, wanted: &str, found: &Metric) -> ! {
    panic!(
        "metric {key} is registered as a {}, not a {wanted}",
        found.kind()
    )
}

/// Splits `name{labels}` into `("name", "labels")`.
fn split_key(key: &str) -> (&str, &str) {
    match key.split_once('{') {
        Some((name, rest)) => (name, rest.strip_suffix('}').unwrap_or(rest)),
        None => (key, ""),
    }
}

fn braced(labels: &str) -> String {
    if labels.is_empty() {
        String::new()
    } else {
        format!("{{{labels}}}")
    }
}

fn with_le(labels: &str, le: &str) -> String {
    if labels.is_empty() {
        format!("{{le=\"{le}\"}}")
    } else {
        format!("{{{labels},le=\"{le}\"}}")
    }
}

fn render_histogram(out: &mut String, family: &str, labels: &str, snapshot: &HistogramSnapshot) {
    for (bound, count) in snapshot.bounds.iter().zip(&snapshot.cumulative) {
        let _ = writeln!(
            out,
            "{family}_bucket{} {count}",
            with_le(labels, &format_bound(*bound))
        );
    }
    let _ = writeln!(
        out,
        "{family}_bucket{} {}",
        with_le(labels, "+Inf"),
        snapshot.count()
    );
    let _ = writeln!(out, "{family}_sum{} {}", braced(labels), snapshot.sum);
    let _ = writeln!(out, "{family}_count{} {}", braced(labels), snapshot.count());
}

/// Shortest decimal form of a bucket bound, absorbing float noise from
/// repeated multiplication (`0.025000000000000001` prints as `0.025`).
fn format_bound(bound: f64) -> String {
    let fixed = format!("{bound:.12}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_buckets() {
        let rendered: Vec<String> = exponential_buckets(0.001, 5.0, 6)
            .iter()
            .map(|b| format_bound(*b))
            .collect();
        assert_eq!(rendered, ["0.001", "0.005", "0.025", "0.125", "0.625", "3.125"]);

        for (computed, fixed) in exponential_buckets(0.001, 5.0, 6)
            .iter()
            .zip(DEFAULT_DURATION_BUCKETS)
        {
            assert!((computed - fixed).abs() < 1e-12);
        }
    }

    #[test]
    #[should_panic(expected = "factor")]
    fn test_exponential_buckets_rejects_factor() {
        let _ = exponential_buckets(1.0, 1.0, 3);
    }

    #[test]
    fn test_format_bound() {
        assert_eq!(format_bound(1.0), "1");
        assert_eq!(format_bound(0.5), "0.5");
        assert_eq!(format_bound(10.0), "10");
        assert_eq!(format_bound(0.0), "0");
    }

    #[test]
    fn test_series_key() {
        assert_eq!(series("up", &[]), "up");
        assert_eq!(
            series("http_requests_total", &[("method", "GET"), ("status", "200")]),
            r#"http_requests_total{method="GET",status="200"}"#
        );
    }

    #[test]
    fn test_series_escapes_values() {
        assert_eq!(
            series("m", &[("path", "a\"b\\c\nd")]),
            r#"m{path="a\"b\\c\nd"}"#
        );
    }

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("up"), ("up", ""));
        assert_eq!(split_key(r#"m{a="1"}"#), ("m", r#"a="1""#));
    }

    #[test]
    fn test_counter() {
        let counter = Counter::default();
        counter.inc();
        counter.inc_by(4);
        assert_eq!(counter.get(), 5);
    }

    #[test]
    fn test_gauge_guard() {
        let gauge = Arc::new(Gauge::default());
        {
            let _a = gauge.track();
            let _b = gauge.track();
            assert_eq!(gauge.get(), 2);
        }
        assert_eq!(gauge.get(), 0);
    }

    #[test]
    fn test_gauge_guard_on_unwind() {
        let gauge = Arc::new(Gauge::default());
        let tracked = gauge.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = tracked.track();
            panic!("boom");
        });
        assert!(result.is_err());
        assert_eq!(gauge.get(), 0);
    }

    #[test]
    fn test_histogram_418ms() {
        let histogram = Histogram::new(&DEFAULT_DURATION_BUCKETS);
        histogram.observe(0.418);

        let snapshot = histogram.snapshot();
        assert_eq!(snapshot.cumulative, vec![0, 0, 0, 0, 1, 1, 1]);
        assert_eq!(snapshot.count(), 1);
        assert!((snapshot.sum - 0.418).abs() < 1e-12);
        assert_eq!(snapshot.bucket(0.625), Some(1));
        assert_eq!(snapshot.bucket(0.125), Some(0));
    }

    #[test]
    fn test_histogram_bound_is_inclusive() {
        let histogram = Histogram::new(&[1.0, 2.0]);
        histogram.observe(1.0);
        histogram.observe(5.0);
        assert_eq!(histogram.snapshot().cumulative, vec![1, 1, 2]);
    }

    #[test]
    fn test_registry_returns_same_metric() {
        let registry = MetricsRegistry::new();
        let a = registry.get_or_create_counter("c");
        let b = registry.get_or_create_counter("c");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    #[should_panic(expected = "registered as a counter")]
    fn test_kind_mismatch_panics() {
        let registry = MetricsRegistry::new();
        let _ = registry.get_or_create_counter("m");
        let _ = registry.get_or_create_gauge("m");
    }

    #[test]
    fn test_render_counter_and_gauge() {
        let registry = MetricsRegistry::new();
        registry
            .get_or_create_counter(&series("b_total", &[("x", "2")]))
            .inc_by(3);
        registry
            .get_or_create_counter(&series("b_total", &[("x", "1")]))
            .inc();
        registry.get_or_create_gauge("a_gauge").set(-2);

        assert_eq!(
            registry.render(),
            "# TYPE a_gauge gauge\n\
             a_gauge -2\n\
             # TYPE b_total counter\n\
             b_total{x=\"1\"} 1\n\
             b_total{x=\"2\"} 3\n"
        );
    }

    #[test]
    fn test_render_histogram_without_labels() {
        let registry = MetricsRegistry::new();
        registry.get_or_create_histogram("h", &[0.5]).observe(0.25);

        assert_eq!(
            registry.render(),
            "# TYPE h histogram\n\
             h_bucket{le=\"0.5\"} 1\n\
             h_bucket{le=\"+Inf\"} 1\n\
             h_sum 0.25\n\
             h_count 1\n"
        );
    }

    #[test]
    fn test_render_is_stable() {
        let registry = MetricsRegistry::new();
        for i in 0..20 {
            registry
                .get_or_create_counter(&series("c", &[("i", &i.to_string())]))
                .inc();
        }
        assert_eq!(registry.render(), registry.render());
    }

    proptest! {
        #[test]
        fn histogram_count_matches_observations(values in prop::collection::vec(0.0f64..10.0, 0..200)) {
            let histogram = Histogram::new(&DEFAULT_DURATION_BUCKETS);
            for v in &values {
                histogram.observe(*v);
            }
            let snapshot = histogram.snapshot();
            prop_assert_eq!(snapshot.count(), values.len() as u64);
            prop_assert!(snapshot.cumulative.windows(2).all(|w| w[0] <= w[1]));

            let expected: f64 = values.iter().sum();
            prop_assert!((snapshot.sum - expected).abs() < 1e-6);
        }

        #[test]
        fn histogram_buckets_are_cumulative_thresholds(value in 0.0f64..5.0) {
            let histogram = Histogram::new(&DEFAULT_DURATION_BUCKETS);
            histogram.observe(value);
            let snapshot = histogram.snapshot();
            for (bound, count) in snapshot.bounds.iter().zip(&snapshot.cumulative) {
                prop_assert_eq!(*count, u64::from(value <= *bound));
            }
        }
    }
}
