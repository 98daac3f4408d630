//! Metric definitions and the four metric kinds.
//!
//! A [`MetricDefinition`] owns a metric's identity (name, docstring), its
//! declared label schema, any preset label values, and the handle to the
//! value store backing it. It is immutable once constructed and safe to
//! share across threads without locking; all mutation happens inside the
//! store.
//!
//! The kinds form a closed set: [`Counter`], [`Gauge`], [`Histogram`], and
//! [`Summary`] each wrap a definition and add only their write operation and
//! reserved label names. The [`Metric`] enum tags the four for storage in a
//! registry.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::error::{LabelError, MetricError};
use crate::labels::{is_metric_name, LabelSet, LabelSetValidator};
use crate::store::{StoreFactory, StoreSettings, StoreValue, ValueStore};

/// The kind of a metric, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Monotonically increasing count
    Counter,
    /// Value that can move in both directions
    Gauge,
    /// Bucketed distribution of observed amounts
    Histogram,
    /// Sum and count of observed amounts
    Summary,
}

impl MetricKind {
    /// Lowercase kind name, as used in error messages and store selection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
            Self::Summary => "summary",
        }
    }

    /// Label names this kind reserves for its own exposition.
    pub(crate) fn reserved_labels(&self) -> &'static [&'static str] {
        match self {
            Self::Counter | Self::Gauge => &[],
            Self::Histogram => &["le"],
            Self::Summary => &["quantile"],
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity, label schema, preset labels, and store handle for one metric.
pub struct MetricDefinition {
    name: String,
    docstring: String,
    kind: MetricKind,
    validator: LabelSetValidator,
    preset: LabelSet,
    fully_preset: bool,
    settings: StoreSettings,
    store: Arc<dyn ValueStore>,
    factory: Arc<dyn StoreFactory>,
}

impl fmt::Debug for MetricDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricDefinition")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("labels", &self.validator.expected())
            .field("preset", &self.preset)
            .finish_non_exhaustive()
    }
}

impl MetricDefinition {
    /// Construct a definition, validating everything eagerly.
    ///
    /// Fails if the name or docstring is malformed, any declared or preset
    /// label name is not a valid token or is reserved by `kind`, or a preset
    /// key is not among the declared labels. The store is acquired from
    /// `factory` under `(name, kind, settings)`.
    pub fn new(
        kind: MetricKind,
        name: &str,
        docstring: &str,
        labels: &[&str],
        preset_labels: LabelSet,
        settings: StoreSettings,
        factory: Arc<dyn StoreFactory>,
    ) -> Result<Self, MetricError> {
        if !is_metric_name(name) {
            return Err(MetricError::InvalidName(name.to_string()));
        }
        if docstring.trim().is_empty() {
            return Err(MetricError::InvalidDocstring);
        }

        let declared: Vec<String> = labels.iter().map(|label| label.to_string()).collect();
        let validator = LabelSetValidator::new(&declared, kind.reserved_labels())?;
        validator.validate_names(preset_labels.keys().map(String::as_str))?;
        for key in preset_labels.keys() {
            if !validator.expected().iter().any(|label| label == key) {
                return Err(LabelError::Mismatch {
                    expected: validator.expected().to_vec(),
                    got: preset_labels.keys().cloned().collect(),
                }
                .into());
            }
        }

        // A fully-preset definition validates its label set once, here, and
        // reuses it verbatim on every read and write.
        let fully_preset = preset_labels.len() == validator.expected().len();
        if fully_preset {
            validator.validate_labelset(&preset_labels)?;
        }

        let store = factory.for_metric(name, kind, &settings);
        Ok(Self {
            name: name.to_string(),
            docstring: docstring.to_string(),
            kind,
            validator,
            preset: preset_labels,
            fully_preset,
            settings,
            store,
            factory,
        })
    }

    /// The metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The metric's help text.
    pub fn docstring(&self) -> &str {
        &self.docstring
    }

    /// The metric kind.
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Declared label names, sorted.
    pub fn labels(&self) -> &[String] {
        self.validator.expected()
    }

    /// Label values fixed at construction.
    pub fn preset_labels(&self) -> &LabelSet {
        &self.preset
    }

    /// Merge preset and call-site labels into a full, validated label set.
    ///
    /// A name present in both is a [`LabelError::Duplicate`], never a silent
    /// override. When the definition is fully preset and no call-site labels
    /// are given, the stored preset set is reused without re-validation.
    pub(crate) fn resolve<'a>(&'a self, labels: &LabelSet) -> Result<Cow<'a, LabelSet>, MetricError> {
        if self.fully_preset && labels.is_empty() {
            return Ok(Cow::Borrowed(&self.preset));
        }

        let mut resolved = self.preset.clone();
        for (name, value) in labels {
            if resolved.insert(name.clone(), value.clone()).is_some() {
                return Err(LabelError::Duplicate(name.clone()).into());
            }
        }
        self.validator.validate_labelset(&resolved)?;
        Ok(Cow::Owned(resolved))
    }

    /// Current value for the resolved label set.
    ///
    /// A label set no observation has touched reads as the kind's zero value.
    pub fn get(&self, labels: &LabelSet) -> Result<StoreValue, MetricError> {
        let resolved = self.resolve(labels)?;
        Ok(self
            .store
            .get(&resolved)
            .unwrap_or_else(|| StoreValue::zero(self.kind, &self.settings)))
    }

    /// Resolve labels, then run `write` against the store.
    fn write(
        &self,
        labels: &LabelSet,
        write: impl FnOnce(&dyn ValueStore, &LabelSet),
    ) -> Result<(), MetricError> {
        let resolved = self.resolve(labels)?;
        write(self.store.as_ref(), &resolved);
        Ok(())
    }

    /// Derive a new definition with `extra` merged into the preset labels.
    ///
    /// This is a construction-time merge: `extra` wins on key collision,
    /// unlike the per-call resolution which rejects duplicates. Identity,
    /// schema, and store settings are shared; the store is re-acquired from
    /// the same factory, which keys on the metric name.
    pub fn with_labels(&self, extra: LabelSet) -> Result<Self, MetricError> {
        let mut preset = self.preset.clone();
        preset.extend(extra);
        let labels: Vec<&str> = self.validator.expected().iter().map(String::as_str).collect();
        Self::new(
            self.kind,
            &self.name,
            &self.docstring,
            &labels,
            preset,
            self.settings.clone(),
            self.factory.clone(),
        )
    }

    /// Snapshot of all (label set, value) pairs currently in the store.
    pub fn values(&self) -> Vec<(LabelSet, StoreValue)> {
        self.store.all_values()
    }
}

/// Monotonically increasing counter.
#[derive(Debug)]
pub struct Counter {
    def: MetricDefinition,
}

impl Counter {
    /// Create a counter with no preset labels.
    pub fn new(
        name: &str,
        docstring: &str,
        labels: &[&str],
        factory: Arc<dyn StoreFactory>,
    ) -> Result<Self, MetricError> {
        Self::with_preset(name, docstring, labels, LabelSet::new(), factory)
    }

    /// Create a counter with preset label values.
    pub fn with_preset(
        name: &str,
        docstring: &str,
        labels: &[&str],
        preset_labels: LabelSet,
        factory: Arc<dyn StoreFactory>,
    ) -> Result<Self, MetricError> {
        MetricDefinition::new(
            MetricKind::Counter,
            name,
            docstring,
            labels,
            preset_labels,
            StoreSettings::scalar(),
            factory,
        )
        .map(|def| Self { def })
    }

    /// Add `by` to the counter for the resolved label set.
    ///
    /// Counters are monotonic; a negative `by` is rejected.
    pub fn increment(&self, labels: &LabelSet, by: f64) -> Result<(), MetricError> {
        if by < 0.0 {
            return Err(MetricError::InvalidIncrement(by));
        }
        self.def.write(labels, |store, resolved| store.increment(resolved, by))
    }

    /// Current count for the resolved label set.
    pub fn get(&self, labels: &LabelSet) -> Result<StoreValue, MetricError> {
        self.def.get(labels)
    }

    /// Snapshot of all (label set, value) pairs.
    pub fn values(&self) -> Vec<(LabelSet, StoreValue)> {
        self.def.values()
    }

    /// Derive a counter with extra preset labels.
    pub fn with_labels(&self, extra: LabelSet) -> Result<Self, MetricError> {
        self.def.with_labels(extra).map(|def| Self { def })
    }

    /// The underlying definition.
    pub fn definition(&self) -> &MetricDefinition {
        &self.def
    }
}

/// Gauge: a value that can move in both directions.
#[derive(Debug)]
pub struct Gauge {
    def: MetricDefinition,
}

impl Gauge {
    /// Create a gauge with no preset labels.
    pub fn new(
        name: &str,
        docstring: &str,
        labels: &[&str],
        factory: Arc<dyn StoreFactory>,
    ) -> Result<Self, MetricError> {
        Self::with_preset(name, docstring, labels, LabelSet::new(), factory)
    }

    /// Create a gauge with preset label values.
    pub fn with_preset(
        name: &str,
        docstring: &str,
        labels: &[&str],
        preset_labels: LabelSet,
        factory: Arc<dyn StoreFactory>,
    ) -> Result<Self, MetricError> {
        MetricDefinition::new(
            MetricKind::Gauge,
            name,
            docstring,
            labels,
            preset_labels,
            StoreSettings::scalar(),
            factory,
        )
        .map(|def| Self { def })
    }

    /// Set the gauge to `value` for the resolved label set.
    pub fn set(&self, labels: &LabelSet, value: f64) -> Result<(), MetricError> {
        self.def.write(labels, |store, resolved| store.set(resolved, value))
    }

    /// Add `by` (which may be negative) to the gauge.
    pub fn increment(&self, labels: &LabelSet, by: f64) -> Result<(), MetricError> {
        self.def.write(labels, |store, resolved| store.increment(resolved, by))
    }

    /// Subtract `by` from the gauge.
    pub fn decrement(&self, labels: &LabelSet, by: f64) -> Result<(), MetricError> {
        self.increment(labels, -by)
    }

    /// Current value for the resolved label set.
    pub fn get(&self, labels: &LabelSet) -> Result<StoreValue, MetricError> {
        self.def.get(labels)
    }

    /// Snapshot of all (label set, value) pairs.
    pub fn values(&self) -> Vec<(LabelSet, StoreValue)> {
        self.def.values()
    }

    /// Derive a gauge with extra preset labels.
    pub fn with_labels(&self, extra: LabelSet) -> Result<Self, MetricError> {
        self.def.with_labels(extra).map(|def| Self { def })
    }

    /// The underlying definition.
    pub fn definition(&self) -> &MetricDefinition {
        &self.def
    }
}

/// Histogram: bucketed distribution of observed amounts.
///
/// Reserves the `le` label for its bucket bounds.
#[derive(Debug)]
pub struct Histogram {
    def: MetricDefinition,
}

impl Histogram {
    /// Create a histogram with the given bucket bounds and no preset labels.
    pub fn new(
        name: &str,
        docstring: &str,
        labels: &[&str],
        buckets: &[f64],
        factory: Arc<dyn StoreFactory>,
    ) -> Result<Self, MetricError> {
        Self::with_preset(name, docstring, labels, buckets, LabelSet::new(), factory)
    }

    /// Create a histogram with preset label values.
    pub fn with_preset(
        name: &str,
        docstring: &str,
        labels: &[&str],
        buckets: &[f64],
        preset_labels: LabelSet,
        factory: Arc<dyn StoreFactory>,
    ) -> Result<Self, MetricError> {
        MetricDefinition::new(
            MetricKind::Histogram,
            name,
            docstring,
            labels,
            preset_labels,
            StoreSettings::with_buckets(buckets)?,
            factory,
        )
        .map(|def| Self { def })
    }

    /// Record one observed amount for the resolved label set.
    pub fn observe(&self, labels: &LabelSet, amount: f64) -> Result<(), MetricError> {
        self.def.write(labels, |store, resolved| store.observe(resolved, amount))
    }

    /// Current distribution for the resolved label set.
    pub fn get(&self, labels: &LabelSet) -> Result<StoreValue, MetricError> {
        self.def.get(labels)
    }

    /// Snapshot of all (label set, value) pairs.
    pub fn values(&self) -> Vec<(LabelSet, StoreValue)> {
        self.def.values()
    }

    /// Derive a histogram with extra preset labels.
    pub fn with_labels(&self, extra: LabelSet) -> Result<Self, MetricError> {
        self.def.with_labels(extra).map(|def| Self { def })
    }

    /// The underlying definition.
    pub fn definition(&self) -> &MetricDefinition {
        &self.def
    }
}

/// Summary: running sum and count of observed amounts.
///
/// Reserves the `quantile` label.
#[derive(Debug)]
pub struct Summary {
    def: MetricDefinition,
}

impl Summary {
    /// Create a summary with no preset labels.
    pub fn new(
        name: &str,
        docstring: &str,
        labels: &[&str],
        factory: Arc<dyn StoreFactory>,
    ) -> Result<Self, MetricError> {
        MetricDefinition::new(
            MetricKind::Summary,
            name,
            docstring,
            labels,
            LabelSet::new(),
            StoreSettings::scalar(),
            factory,
        )
        .map(|def| Self { def })
    }

    /// Record one observed amount for the resolved label set.
    pub fn observe(&self, labels: &LabelSet, amount: f64) -> Result<(), MetricError> {
        self.def.write(labels, |store, resolved| store.observe(resolved, amount))
    }

    /// Current sum/count aggregate for the resolved label set.
    pub fn get(&self, labels: &LabelSet) -> Result<StoreValue, MetricError> {
        self.def.get(labels)
    }

    /// Snapshot of all (label set, value) pairs.
    pub fn values(&self) -> Vec<(LabelSet, StoreValue)> {
        self.def.values()
    }

    /// The underlying definition.
    pub fn definition(&self) -> &MetricDefinition {
        &self.def
    }
}

/// A metric of any kind, as held by a registry.
#[derive(Debug)]
pub enum Metric {
    /// A [`Counter`]
    Counter(Counter),
    /// A [`Gauge`]
    Gauge(Gauge),
    /// A [`Histogram`]
    Histogram(Histogram),
    /// A [`Summary`]
    Summary(Summary),
}

impl Metric {
    /// The metric's kind tag.
    pub fn kind(&self) -> MetricKind {
        self.definition().kind()
    }

    /// The underlying definition, independent of kind.
    pub fn definition(&self) -> &MetricDefinition {
        match self {
            Self::Counter(c) => c.definition(),
            Self::Gauge(g) => g.definition(),
            Self::Histogram(h) => h.definition(),
            Self::Summary(s) => s.definition(),
        }
    }

    /// Current value for the resolved label set.
    pub fn get(&self, labels: &LabelSet) -> Result<StoreValue, MetricError> {
        self.definition().get(labels)
    }

    /// Snapshot of all (label set, value) pairs.
    pub fn values(&self) -> Vec<(LabelSet, StoreValue)> {
        self.definition().values()
    }

    /// Increment, for counters and gauges.
    pub fn increment(&self, labels: &LabelSet, by: f64) -> Result<(), MetricError> {
        match self {
            Self::Counter(c) => c.increment(labels, by),
            Self::Gauge(g) => g.increment(labels, by),
            other => Err(MetricError::KindMismatch {
                op: "increment",
                kind: other.kind().as_str(),
            }),
        }
    }

    /// Observe, for histograms and summaries.
    pub fn observe(&self, labels: &LabelSet, amount: f64) -> Result<(), MetricError> {
        match self {
            Self::Histogram(h) => h.observe(labels, amount),
            Self::Summary(s) => s.observe(labels, amount),
            other => Err(MetricError::KindMismatch {
                op: "observe",
                kind: other.kind().as_str(),
            }),
        }
    }

    /// Set, for gauges.
    pub fn set(&self, labels: &LabelSet, value: f64) -> Result<(), MetricError> {
        match self {
            Self::Gauge(g) => g.set(labels, value),
            other => Err(MetricError::KindMismatch {
                op: "set",
                kind: other.kind().as_str(),
            }),
        }
    }

    /// Borrow as a counter, if that is this metric's kind.
    pub fn as_counter(&self) -> Option<&Counter> {
        match self {
            Self::Counter(c) => Some(c),
            _ => None,
        }
    }

    /// Borrow as a gauge, if that is this metric's kind.
    pub fn as_gauge(&self) -> Option<&Gauge> {
        match self {
            Self::Gauge(g) => Some(g),
            _ => None,
        }
    }

    /// Borrow as a histogram, if that is this metric's kind.
    pub fn as_histogram(&self) -> Option<&Histogram> {
        match self {
            Self::Histogram(h) => Some(h),
            _ => None,
        }
    }

    /// Borrow as a summary, if that is this metric's kind.
    pub fn as_summary(&self) -> Option<&Summary> {
        match self {
            Self::Summary(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels;
    use crate::store::SynchronizedStoreFactory;

    fn factory() -> Arc<dyn StoreFactory> {
        Arc::new(SynchronizedStoreFactory::new())
    }

    #[test]
    fn test_valid_names_construct() {
        for name in ["requests_total", "http:requests", "_hidden", "A9_ok"] {
            assert!(
                Counter::new(name, "A docstring.", &[], factory()).is_ok(),
                "{name} should construct"
            );
        }
    }

    #[test]
    fn test_invalid_names_rejected() {
        for name in ["", "9leading", "has-dash", "has space"] {
            assert_eq!(
                Counter::new(name, "A docstring.", &[], factory()).unwrap_err(),
                MetricError::InvalidName(name.to_string())
            );
        }
    }

    #[test]
    fn test_empty_docstring_rejected() {
        assert_eq!(
            Counter::new("requests_total", "", &[], factory()).unwrap_err(),
            MetricError::InvalidDocstring
        );
        assert_eq!(
            Counter::new("requests_total", "   ", &[], factory()).unwrap_err(),
            MetricError::InvalidDocstring
        );
    }

    #[test]
    fn test_reserved_label_rejected_per_kind() {
        // `le` is fine on a counter but reserved on a histogram.
        assert!(Counter::new("c_total", "Doc.", &["le"], factory()).is_ok());
        assert_eq!(
            Histogram::new("h_seconds", "Doc.", &["le"], &[1.0], factory()).unwrap_err(),
            MetricError::Label(LabelError::Reserved("le".to_string()))
        );
        assert!(matches!(
            Summary::new("s_seconds", "Doc.", &["quantile"], factory()).unwrap_err(),
            MetricError::Label(LabelError::Reserved(_))
        ));
    }

    #[test]
    fn test_preset_must_be_subset_of_declared() {
        let err = Counter::with_preset(
            "c_total",
            "Doc.",
            &["method"],
            labels! { "host" => "a" },
            factory(),
        )
        .unwrap_err();
        assert!(matches!(err, MetricError::Label(LabelError::Mismatch { .. })));
    }

    #[test]
    fn test_get_requires_exact_coverage() {
        let counter = Counter::with_preset(
            "c_total",
            "Doc.",
            &["method", "path"],
            labels! { "method" => "get" },
            factory(),
        )
        .unwrap();

        // Preset ∪ call-site == declared, disjoint: ok.
        assert!(counter.get(&labels! { "path" => "/" }).is_ok());
        // Missing coverage: error.
        assert!(counter.get(&labels! {}).is_err());
        // Overlap with preset: duplicate, not a silent override.
        assert_eq!(
            counter
                .get(&labels! { "method" => "post", "path" => "/" })
                .unwrap_err(),
            MetricError::Label(LabelError::Duplicate("method".to_string()))
        );
    }

    #[test]
    fn test_fully_preset_fast_path() {
        let counter = Counter::with_preset(
            "c_total",
            "Doc.",
            &["method"],
            labels! { "method" => "get" },
            factory(),
        )
        .unwrap();

        counter.increment(&labels! {}, 1.0).unwrap();
        assert_eq!(
            counter.get(&labels! {}).unwrap(),
            StoreValue::Scalar(1.0)
        );
        // Any call-site label on a fully preset metric is a duplicate or an
        // extra; both fail.
        assert!(counter.get(&labels! { "method" => "get" }).is_err());
        assert!(counter.get(&labels! { "other" => "x" }).is_err());
    }

    #[test]
    fn test_counter_rejects_negative_increment() {
        let counter = Counter::new("c_total", "Doc.", &[], factory()).unwrap();
        assert_eq!(
            counter.increment(&labels! {}, -1.0).unwrap_err(),
            MetricError::InvalidIncrement(-1.0)
        );
    }

    #[test]
    fn test_gauge_set_and_decrement() {
        let gauge = Gauge::new("depth", "Doc.", &["queue"], factory()).unwrap();
        gauge.set(&labels! { "queue" => "jobs" }, 5.0).unwrap();
        gauge.decrement(&labels! { "queue" => "jobs" }, 2.0).unwrap();
        assert_eq!(
            gauge.get(&labels! { "queue" => "jobs" }).unwrap(),
            StoreValue::Scalar(3.0)
        );
    }

    #[test]
    fn test_histogram_observe_and_zero_read() {
        let hist =
            Histogram::new("d_seconds", "Doc.", &["method"], &[0.1, 1.0], factory()).unwrap();
        hist.observe(&labels! { "method" => "get" }, 0.05).unwrap();
        hist.observe(&labels! { "method" => "get" }, 0.5).unwrap();

        match hist.get(&labels! { "method" => "get" }).unwrap() {
            StoreValue::Distribution {
                bucket_counts,
                sum,
                count,
            } => {
                assert_eq!(bucket_counts, vec![1, 2]);
                assert!((sum - 0.55).abs() < 1e-9);
                assert_eq!(count, 2);
            }
            other => panic!("expected distribution, got {other:?}"),
        }

        // An untouched label set reads as the zero distribution.
        assert_eq!(
            hist.get(&labels! { "method" => "post" }).unwrap(),
            StoreValue::Distribution {
                bucket_counts: vec![0, 0],
                sum: 0.0,
                count: 0
            }
        );
    }

    #[test]
    fn test_summary_aggregates_sum_and_count() {
        let summary = Summary::new("s_seconds", "Doc.", &[], factory()).unwrap();
        summary.observe(&labels! {}, 1.5).unwrap();
        summary.observe(&labels! {}, 2.5).unwrap();
        let value = summary.get(&labels! {}).unwrap();
        assert!((value.sum() - 4.0).abs() < 1e-9);
        assert_eq!(value.count(), Some(2));
    }

    #[test]
    fn test_round_trip_through_values() {
        let counter = Counter::new("c_total", "Doc.", &["code"], factory()).unwrap();
        counter.increment(&labels! { "code" => 200 }, 1.0).unwrap();

        let values = counter.values();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].0, labels! { "code" => 200 });
        assert_eq!(values[0].1, StoreValue::Scalar(1.0));
        assert_eq!(
            counter.get(&labels! { "code" => 200 }).unwrap(),
            StoreValue::Scalar(1.0)
        );
    }

    #[test]
    fn test_with_labels_merges_and_shares_store() {
        let shared = factory();
        let counter =
            Counter::new("c_total", "Doc.", &["tenant", "code"], shared.clone()).unwrap();
        let tenant = counter.with_labels(labels! { "tenant" => "acme" }).unwrap();

        tenant.increment(&labels! { "code" => 200 }, 1.0).unwrap();
        // The parent sees the value: both views resolve to the name-keyed store.
        assert_eq!(
            counter
                .get(&labels! { "tenant" => "acme", "code" => 200 })
                .unwrap(),
            StoreValue::Scalar(1.0)
        );
    }

    #[test]
    fn test_with_labels_associative() {
        let steps = Counter::new("c_total", "Doc.", &["a", "b", "c"], factory())
            .unwrap()
            .with_labels(labels! { "a" => "1" })
            .unwrap()
            .with_labels(labels! { "b" => "2" })
            .unwrap();
        let once = Counter::new("c_total", "Doc.", &["a", "b", "c"], factory())
            .unwrap()
            .with_labels(labels! { "a" => "1", "b" => "2" })
            .unwrap();
        assert_eq!(
            steps.definition().preset_labels(),
            once.definition().preset_labels()
        );
    }

    #[test]
    fn test_with_labels_override_at_derivation_only() {
        // At derivation time the extra value wins; at call time the same key
        // would be a duplicate error.
        let counter = Counter::with_preset(
            "c_total",
            "Doc.",
            &["tenant"],
            labels! { "tenant" => "old" },
            factory(),
        )
        .unwrap();
        let derived = counter.with_labels(labels! { "tenant" => "new" }).unwrap();
        assert_eq!(derived.definition().preset_labels()["tenant"], "new");
    }

    #[test]
    fn test_metric_enum_dispatch() {
        let metric = Metric::Counter(Counter::new("c_total", "Doc.", &[], factory()).unwrap());
        metric.increment(&labels! {}, 1.0).unwrap();
        assert_eq!(metric.get(&labels! {}).unwrap(), StoreValue::Scalar(1.0));
        assert_eq!(
            metric.observe(&labels! {}, 1.0).unwrap_err(),
            MetricError::KindMismatch {
                op: "observe",
                kind: "counter"
            }
        );
        assert!(metric.as_counter().is_some());
        assert!(metric.as_histogram().is_none());
    }
}
