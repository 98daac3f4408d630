//! # Turnstile
//!
//! Client-side metrics instrumentation: declare named, labeled measurements
//! (counters, gauges, histograms, summaries), record observations against
//! them from any thread, and read them back — all on top of a pluggable
//! concurrent value store.
//!
//! ## Features
//!
//! - **Metric definitions**: eager name/docstring validation, declared label
//!   schemas, preset label values, derived per-dimension views
//! - **Label-set validation**: exact schema matching on every observation,
//!   reserved-name protection per metric kind, bounded cardinality
//! - **Pluggable value stores**: a `ValueStore` trait with a default
//!   synchronized in-process store (one lock per label-set key)
//! - **Registry**: atomic get-or-create registration shared process-wide
//! - **Collector middleware**: request counting, duration histograms, and
//!   exception counting around any request handler, with path normalization
//!
//! ## Quick Start
//!
//! ```
//! use turnstile::{labels, Collector, HandlerError, Registry, Request, Response};
//!
//! let registry = Registry::default();
//!
//! // Instrument a handler.
//! let collector = Collector::new(
//!     |_req: &Request| -> Result<Response, HandlerError> { Ok(Response::new(200)) },
//!     &registry,
//! ).unwrap();
//! collector.call(&Request::new("GET", "/orders/42")).unwrap();
//!
//! // Record custom metrics.
//! let jobs = registry.counter("jobs_total", "Jobs processed.", &["status"]).unwrap();
//! jobs.increment(&labels! { "status" => "done" }, 1.0).unwrap();
//! ```
//!
//! Exposition formats, HTTP listeners, and configuration loading are out of
//! scope; this crate ends at the value store and the recording path.

pub mod error;
pub mod labels;
pub mod metric;
pub mod middleware;
pub mod registry;
pub mod store;

// Re-exports
pub use error::{LabelError, MetricError, RegistryError};
pub use labels::{LabelSet, LabelSetValidator};
pub use metric::{Counter, Gauge, Histogram, Metric, MetricDefinition, MetricKind, Summary};
pub use middleware::{
    normalize_path, Collector, Handler, HandlerError, Request, Response, DEFAULT_PREFIX,
};
pub use registry::Registry;
pub use store::{
    StoreFactory, StoreSettings, StoreValue, SynchronizedStore, SynchronizedStoreFactory,
    ValueStore, HTTP_DURATION_BUCKETS,
};
