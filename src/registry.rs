//! Name-to-metric registry with atomic get-or-create registration.
//!
//! A registry is shared by every instrumented component in a process. The
//! kind-specific accessors (`counter`, `gauge`, `histogram`, `summary`) are
//! get-or-create: a racing pair of callers asking for the same name both
//! receive the same metric, never a duplicate-registration failure.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::RegistryError;
use crate::metric::{Counter, Gauge, Histogram, Metric, MetricKind, Summary};
use crate::store::{StoreFactory, SynchronizedStoreFactory};

/// Holds every metric registered in a process, keyed by name.
pub struct Registry {
    factory: Arc<dyn StoreFactory>,
    metrics: RwLock<HashMap<String, Arc<Metric>>>,
}

impl Default for Registry {
    /// A registry backed by the default synchronized in-process store.
    fn default() -> Self {
        Self::new(Arc::new(SynchronizedStoreFactory::new()))
    }
}

impl Registry {
    /// Create a registry whose metrics draw their stores from `factory`.
    pub fn new(factory: Arc<dyn StoreFactory>) -> Self {
        Self {
            factory,
            metrics: RwLock::new(HashMap::new()),
        }
    }

    /// The metric registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<Arc<Metric>> {
        let metrics = self.metrics.read();
        metrics.get(name).cloned()
    }

    /// Register an externally constructed metric.
    ///
    /// Unlike the kind accessors this is not get-or-create: a name collision
    /// is an error.
    pub fn register(&self, metric: Metric) -> Result<Arc<Metric>, RegistryError> {
        let name = metric.definition().name().to_string();
        let mut metrics = self.metrics.write();
        if metrics.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        let metric = Arc::new(metric);
        metrics.insert(name, metric.clone());
        Ok(metric)
    }

    /// Get or create a counter.
    pub fn counter(
        &self,
        name: &str,
        docstring: &str,
        labels: &[&str],
    ) -> Result<Arc<Metric>, RegistryError> {
        self.get_or_create(name, MetricKind::Counter, || {
            Ok(Metric::Counter(Counter::new(
                name,
                docstring,
                labels,
                self.factory.clone(),
            )?))
        })
    }

    /// Get or create a gauge.
    pub fn gauge(
        &self,
        name: &str,
        docstring: &str,
        labels: &[&str],
    ) -> Result<Arc<Metric>, RegistryError> {
        self.get_or_create(name, MetricKind::Gauge, || {
            Ok(Metric::Gauge(Gauge::new(
                name,
                docstring,
                labels,
                self.factory.clone(),
            )?))
        })
    }

    /// Get or create a histogram with the given bucket bounds.
    pub fn histogram(
        &self,
        name: &str,
        docstring: &str,
        labels: &[&str],
        buckets: &[f64],
    ) -> Result<Arc<Metric>, RegistryError> {
        self.get_or_create(name, MetricKind::Histogram, || {
            Ok(Metric::Histogram(Histogram::new(
                name,
                docstring,
                labels,
                buckets,
                self.factory.clone(),
            )?))
        })
    }

    /// Get or create a summary.
    pub fn summary(
        &self,
        name: &str,
        docstring: &str,
        labels: &[&str],
    ) -> Result<Arc<Metric>, RegistryError> {
        self.get_or_create(name, MetricKind::Summary, || {
            Ok(Metric::Summary(Summary::new(
                name,
                docstring,
                labels,
                self.factory.clone(),
            )?))
        })
    }

    /// Snapshot of every registered metric.
    pub fn metrics(&self) -> Vec<Arc<Metric>> {
        let metrics = self.metrics.read();
        metrics.values().cloned().collect()
    }

    /// The store factory metrics in this registry draw from.
    pub fn store_factory(&self) -> &Arc<dyn StoreFactory> {
        &self.factory
    }

    fn get_or_create(
        &self,
        name: &str,
        kind: MetricKind,
        create: impl FnOnce() -> Result<Metric, RegistryError>,
    ) -> Result<Arc<Metric>, RegistryError> {
        // Fast path: already registered.
        {
            let metrics = self.metrics.read();
            if let Some(existing) = metrics.get(name) {
                return Self::checked(existing, name, kind);
            }
        }

        // Insert under the write lock, re-checking for a racing registration
        // of the same name.
        let mut metrics = self.metrics.write();
        if let Some(existing) = metrics.get(name) {
            tracing::debug!(metric = %name, "reusing already-registered metric");
            return Self::checked(existing, name, kind);
        }
        let metric = Arc::new(create()?);
        metrics.insert(name.to_string(), metric.clone());
        Ok(metric)
    }

    fn checked(
        existing: &Arc<Metric>,
        name: &str,
        requested: MetricKind,
    ) -> Result<Arc<Metric>, RegistryError> {
        if existing.kind() != requested {
            return Err(RegistryError::KindMismatch {
                name: name.to_string(),
                existing: existing.kind().as_str(),
                requested: requested.as_str(),
            });
        }
        Ok(existing.clone())
    }
}
