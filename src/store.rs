//! Pluggable concurrent value stores.
//!
//! A value store holds the actual numeric aggregates per resolved label set.
//! Metric definitions only ever talk to the [`ValueStore`] trait; the store
//! behind it is chosen by an explicit [`StoreFactory`] injected at
//! construction time, never through process-global lookup.
//!
//! The default [`SynchronizedStore`] keeps one lock per label-set key so
//! unrelated label combinations never serialize against each other.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::MetricError;
use crate::labels::LabelSet;
use crate::metric::MetricKind;

/// Histogram buckets for HTTP request durations, in seconds.
pub const HTTP_DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// The aggregate a store holds for one resolved label set.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    /// A single number (counters, gauges)
    Scalar(f64),
    /// A distribution aggregate (histograms, summaries)
    Distribution {
        /// Cumulative count per bucket bound; empty for summaries
        bucket_counts: Vec<u64>,
        /// Sum of all observed amounts
        sum: f64,
        /// Total number of observations
        count: u64,
    },
}

impl StoreValue {
    /// The scalar value, if this is a scalar aggregate.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Distribution { .. } => None,
        }
    }

    /// Sum of observations for distributions, the value itself for scalars.
    pub fn sum(&self) -> f64 {
        match self {
            Self::Scalar(v) => *v,
            Self::Distribution { sum, .. } => *sum,
        }
    }

    /// Number of observations, if this is a distribution aggregate.
    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Scalar(_) => None,
            Self::Distribution { count, .. } => Some(*count),
        }
    }

    pub(crate) fn zero(kind: MetricKind, settings: &StoreSettings) -> Self {
        match kind {
            MetricKind::Counter | MetricKind::Gauge => Self::Scalar(0.0),
            MetricKind::Histogram => Self::Distribution {
                bucket_counts: vec![0; settings.buckets().len()],
                sum: 0.0,
                count: 0,
            },
            MetricKind::Summary => Self::Distribution {
                bucket_counts: Vec::new(),
                sum: 0.0,
                count: 0,
            },
        }
    }
}

/// Per-metric store configuration.
///
/// Scalar metrics carry no settings; histograms carry their bucket bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSettings {
    buckets: Vec<f64>,
}

impl StoreSettings {
    /// Settings for a scalar-valued metric (counter, gauge, summary).
    pub fn scalar() -> Self {
        Self::default()
    }

    /// Settings carrying histogram bucket bounds.
    ///
    /// Bounds must be non-empty and sorted strictly ascending.
    pub fn with_buckets(buckets: &[f64]) -> Result<Self, MetricError> {
        if buckets.is_empty() || buckets.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(MetricError::InvalidBuckets);
        }
        Ok(Self {
            buckets: buckets.to_vec(),
        })
    }

    /// Bucket bounds, empty for scalar metrics.
    pub fn buckets(&self) -> &[f64] {
        &self.buckets
    }
}

/// A concurrent mapping from resolved label set to aggregate value.
///
/// Implementations must serialize concurrent updates to the same key and
/// hold at most one logical value per distinct label set. `all_values` is a
/// point-in-time snapshot with no cross-key consistency guarantee.
pub trait ValueStore: Send + Sync {
    /// Current value for the given label set, if any observation touched it.
    fn get(&self, labels: &LabelSet) -> Option<StoreValue>;

    /// Replace the scalar value for the given label set (gauges).
    fn set(&self, labels: &LabelSet, value: f64);

    /// Add `by` to the scalar value for the given label set.
    fn increment(&self, labels: &LabelSet, by: f64);

    /// Fold `amount` into the distribution aggregate for the given label set.
    fn observe(&self, labels: &LabelSet, amount: f64);

    /// Snapshot of every known (label set, value) pair, unordered.
    fn all_values(&self) -> Vec<(LabelSet, StoreValue)>;
}

/// Produces the store instance backing a metric.
///
/// Passed explicitly into metric/registry constructors; a factory is free to
/// cache by metric name so derived views of one metric share storage.
pub trait StoreFactory: Send + Sync {
    /// Resolve the store for `(name, kind, settings)`.
    fn for_metric(
        &self,
        name: &str,
        kind: MetricKind,
        settings: &StoreSettings,
    ) -> Arc<dyn ValueStore>;
}

/// Default in-process store: a hash map of per-key locked aggregates.
///
/// Reads take the map's read lock; updates additionally take the one mutex
/// guarding the touched key, so writers to distinct label sets proceed in
/// parallel. The map's write lock is only held to insert a first-seen key.
pub struct SynchronizedStore {
    kind: MetricKind,
    settings: StoreSettings,
    values: RwLock<HashMap<LabelSet, Mutex<StoreValue>>>,
}

impl SynchronizedStore {
    /// Create an empty store for a metric of the given kind.
    pub fn new(kind: MetricKind, settings: StoreSettings) -> Self {
        Self {
            kind,
            settings,
            values: RwLock::new(HashMap::new()),
        }
    }

    fn update(&self, labels: &LabelSet, apply: impl FnOnce(&mut StoreValue)) {
        // Fast path: the key has been touched before.
        {
            let values = self.values.read();
            if let Some(cell) = values.get(labels) {
                apply(&mut cell.lock());
                return;
            }
        }

        // Slow path: insert under the write lock, re-checking for a racing
        // insert of the same key.
        let mut values = self.values.write();
        let cell = values
            .entry(labels.clone())
            .or_insert_with(|| Mutex::new(StoreValue::zero(self.kind, &self.settings)));
        apply(cell.get_mut());
    }
}

impl ValueStore for SynchronizedStore {
    fn get(&self, labels: &LabelSet) -> Option<StoreValue> {
        let values = self.values.read();
        values.get(labels).map(|cell| cell.lock().clone())
    }

    fn set(&self, labels: &LabelSet, value: f64) {
        self.update(labels, |current| {
            if let StoreValue::Scalar(slot) = current {
                *slot = value;
            }
        });
    }

    fn increment(&self, labels: &LabelSet, by: f64) {
        self.update(labels, |current| {
            if let StoreValue::Scalar(slot) = current {
                *slot += by;
            }
        });
    }

    fn observe(&self, labels: &LabelSet, amount: f64) {
        let bounds = self.settings.buckets.clone();
        self.update(labels, |current| {
            if let StoreValue::Distribution {
                bucket_counts,
                sum,
                count,
            } = current
            {
                // Buckets are cumulative: every bound >= amount is bumped.
                for (slot, bound) in bucket_counts.iter_mut().zip(bounds.iter()) {
                    if amount <= *bound {
                        *slot += 1;
                    }
                }
                *sum += amount;
                *count += 1;
            }
        });
    }

    fn all_values(&self) -> Vec<(LabelSet, StoreValue)> {
        let values = self.values.read();
        values
            .iter()
            .map(|(labels, cell)| (labels.clone(), cell.lock().clone()))
            .collect()
    }
}

/// Store factory producing [`SynchronizedStore`]s, cached by metric name.
///
/// Name-keyed caching makes `with_labels` derivations and racing registry
/// constructions resolve to the same underlying storage.
#[derive(Default)]
pub struct SynchronizedStoreFactory {
    stores: RwLock<HashMap<String, Arc<SynchronizedStore>>>,
}

impl SynchronizedStoreFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreFactory for SynchronizedStoreFactory {
    fn for_metric(
        &self,
        name: &str,
        kind: MetricKind,
        settings: &StoreSettings,
    ) -> Arc<dyn ValueStore> {
        {
            let stores = self.stores.read();
            if let Some(store) = stores.get(name) {
                return store.clone();
            }
        }

        let mut stores = self.stores.write();
        stores
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(SynchronizedStore::new(kind, settings.clone())))
            .clone()
    }
}
