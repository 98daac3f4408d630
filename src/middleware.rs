//! Request-tracing collector middleware.
//!
//! Wraps a single "handle one request" entry point and records three metrics
//! around it: a request counter labeled `{code, method, path}`, a duration
//! histogram labeled `{method, path}`, and an exceptions counter labeled
//! `{exception}`. The wrapped handler's outcome passes through untouched —
//! the collector never swallows a handler error, and a failure in its own
//! recording step is logged and discarded so instrumentation can never break
//! the request path.

use std::error::Error;
use std::fmt;
use std::sync::OnceLock;
use std::time::Instant;

use regex::Regex;

use crate::error::RegistryError;
use crate::labels;
use crate::metric::Metric;
use crate::registry::Registry;
use crate::store::HTTP_DURATION_BUCKETS;
use std::sync::Arc;

/// Default metric name prefix for the collector's three metrics.
pub const DEFAULT_PREFIX: &str = "http_server";

/// The slice of an inbound request the collector needs.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method, any case
    pub method: String,
    /// Request path, `/`-delimited
    pub path: String,
}

impl Request {
    /// Build a request representation from method and path.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }
}

/// A response as handed back by the wrapped handler.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code; stringified for the `code` label
    pub status: u16,
    /// Response headers
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Vec<u8>,
}

impl Response {
    /// An empty response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Attach a body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// An error escaping the wrapped handler.
///
/// Captures the unqualified type name of the wrapped error at construction;
/// the collector uses it as the `exception` label and then returns this very
/// value to its caller, identity intact.
#[derive(Debug)]
pub struct HandlerError {
    kind: &'static str,
    source: Box<dyn Error + Send + Sync>,
}

impl HandlerError {
    /// Wrap a handler error, recording its type name as the error kind.
    pub fn new<E>(source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        let kind = std::any::type_name::<E>()
            .rsplit("::")
            .next()
            .unwrap_or("Error");
        Self {
            kind,
            source: Box::new(source),
        }
    }

    /// The unqualified type name of the wrapped error.
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.source)
    }
}

impl Error for HandlerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// The wrapped "handle one request" entry point.
///
/// Invoked synchronously, potentially from many threads sharing one
/// collector; the collector adds no serialization around it.
pub trait Handler {
    /// Handle one inbound request.
    fn call(&self, request: &Request) -> Result<Response, HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&Request) -> Result<Response, HandlerError>,
{
    fn call(&self, request: &Request) -> Result<Response, HandlerError> {
        self(request)
    }
}

/// Middleware that times and counts requests through a wrapped handler.
pub struct Collector<H> {
    handler: H,
    requests: Arc<Metric>,
    durations: Arc<Metric>,
    exceptions: Arc<Metric>,
}

impl<H: Handler> Collector<H> {
    /// Wrap `handler`, obtaining metrics under the default `http_server`
    /// prefix.
    pub fn new(handler: H, registry: &Registry) -> Result<Self, RegistryError> {
        Self::with_prefix(handler, registry, DEFAULT_PREFIX)
    }

    /// Wrap `handler`, obtaining metrics under a custom name prefix.
    ///
    /// Metrics are obtained get-or-create, so constructing several collectors
    /// against one registry is safe and they all observe into the same
    /// metrics.
    pub fn with_prefix(
        handler: H,
        registry: &Registry,
        prefix: &str,
    ) -> Result<Self, RegistryError> {
        let requests = registry.counter(
            &format!("{prefix}_requests_total"),
            "The total number of HTTP requests handled by the application.",
            &["code", "method", "path"],
        )?;
        let durations = registry.histogram(
            &format!("{prefix}_request_duration_seconds"),
            "The HTTP response duration of the application.",
            &["method", "path"],
            HTTP_DURATION_BUCKETS,
        )?;
        let exceptions = registry.counter(
            &format!("{prefix}_exceptions_total"),
            "The total number of exceptions raised by the application.",
            &["exception"],
        )?;
        Ok(Self {
            handler,
            requests,
            durations,
            exceptions,
        })
    }

    /// Handle one request through the wrapped handler, recording metrics.
    ///
    /// The handler's result is returned unchanged. Recording failures never
    /// escape: they are logged at `warn` and discarded.
    pub fn call(&self, request: &Request) -> Result<Response, HandlerError> {
        let start = Instant::now();
        let result = self.handler.call(request);
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(response) => self.record(request, response.status, elapsed),
            Err(error) => self.record_exception(error),
        }
        result
    }

    fn record(&self, request: &Request, status: u16, elapsed: f64) {
        let method = request.method.to_lowercase();
        let path = normalize_path(&request.path);

        if let Err(error) = self.requests.increment(
            &labels! { "code" => status, "method" => method, "path" => path },
            1.0,
        ) {
            tracing::warn!(
                metric = %self.requests.definition().name(),
                %error,
                "failed to record request count"
            );
        }
        if let Err(error) = self
            .durations
            .observe(&labels! { "method" => method, "path" => path }, elapsed)
        {
            tracing::warn!(
                metric = %self.durations.definition().name(),
                %error,
                "failed to record request duration"
            );
        }
    }

    fn record_exception(&self, error: &HandlerError) {
        if let Err(record_error) = self
            .exceptions
            .increment(&labels! { "exception" => error.kind() }, 1.0)
        {
            tracing::warn!(
                metric = %self.exceptions.definition().name(),
                error = %record_error,
                "failed to record handler exception"
            );
        }
    }

    /// The wrapped handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }
}

fn uuid_segment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new("^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .expect("uuid segment pattern")
    })
}

fn numeric_segment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^[0-9]+$").expect("numeric segment pattern"))
}

/// Normalize a request path for use as a label value.
///
/// Each `/`-delimited segment is rewritten independently, left to right:
/// UUID-shaped segments (8-4-4-4-12 hex) become `:uuid`, purely numeric
/// segments become `:id`, everything else is untouched. This keeps path
/// cardinality bounded for templated routes with embedded identifiers. The
/// rewrite is idempotent.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if uuid_segment().is_match(segment) {
                ":uuid"
            } else if numeric_segment().is_match(segment) {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
