//! Prometheus metrics for the ceremony coordinator.
//!
//! All metrics follow the naming convention: `ceremony_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., contributions_verified_total)
//! - **Gauge**: Value that can go up or down (e.g., queue_length)
//! - **Histogram**: Distribution of values (e.g., verification_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramVec,
    Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SCHEDULER METRICS
    // =========================================================================

    /// Participants admitted to a circuit's waiting queue
    pub static ref QUEUE_ADMISSIONS: Counter = Counter::new(
        "ceremony_scheduler_admissions_total",
        "Total participants admitted to a circuit waiting queue"
    ).expect("metric creation failed");

    /// Current length of each circuit's waiting queue
    pub static ref QUEUE_LENGTH: GaugeVec = GaugeVec::new(
        Opts::new("ceremony_scheduler_queue_length", "Current waiting queue length"),
        &["circuit_id"]
    ).expect("metric creation failed");

    /// Baton hand-offs performed by the scheduler
    pub static ref BATON_HANDOFFS: CounterVec = CounterVec::new(
        Opts::new("ceremony_scheduler_baton_handoffs_total", "Baton hand-offs by outcome"),
        &["outcome"]  // outcome: valid/invalid/timeout
    ).expect("metric creation failed");

    /// Timeouts fired by the scheduler
    pub static ref TIMEOUTS_FIRED: CounterVec = CounterVec::new(
        Opts::new("ceremony_scheduler_timeouts_fired_total", "Timeouts fired by mechanism"),
        &["mechanism"]  // mechanism: fixed/dynamic
    ).expect("metric creation failed");

    // =========================================================================
    // UPLOAD METRICS
    // =========================================================================

    /// Multi-part uploads opened
    pub static ref UPLOADS_OPENED: Counter = Counter::new(
        "ceremony_upload_opened_total",
        "Total multi-part uploads opened"
    ).expect("metric creation failed");

    /// Multi-part uploads completed
    pub static ref UPLOADS_COMPLETED: Counter = Counter::new(
        "ceremony_upload_completed_total",
        "Total multi-part uploads completed"
    ).expect("metric creation failed");

    /// Chunks reported to the coordinator
    pub static ref CHUNKS_STORED: Counter = Counter::new(
        "ceremony_upload_chunks_stored_total",
        "Total uploaded-part records stored"
    ).expect("metric creation failed");

    /// BlobStore dispatch failures requiring retry
    pub static ref UPLOAD_RETRIES: Counter = Counter::new(
        "ceremony_upload_retries_total",
        "Total upload store retries after a transient upstream failure"
    ).expect("metric creation failed");

    // =========================================================================
    // VERIFICATION METRICS
    // =========================================================================

    /// Contributions verified, by validity
    pub static ref CONTRIBUTIONS_VERIFIED: CounterVec = CounterVec::new(
        Opts::new("ceremony_verifier_contributions_verified_total", "Contributions verified by result"),
        &["valid"]  // valid: true/false
    ).expect("metric creation failed");

    /// Verification duration histogram
    pub static ref VERIFICATION_DURATION: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "ceremony_verifier_duration_seconds",
            "Time spent verifying a contribution"
        ).buckets(exponential_buckets(1.0, 2.0, 14).expect("valid bucket parameters")),
        &["mechanism"]  // mechanism: cf/vm
    ).expect("metric creation failed");

    /// Verification dispatch failures requiring retry
    pub static ref VERIFICATION_RETRIES: Counter = Counter::new(
        "ceremony_verifier_retries_total",
        "Total verification dispatch retries after a transient upstream failure"
    ).expect("metric creation failed");

    // =========================================================================
    // FINALIZATION METRICS
    // =========================================================================

    /// Circuits finalized
    pub static ref CIRCUITS_FINALIZED: Counter = Counter::new(
        "ceremony_finalizer_circuits_finalized_total",
        "Total circuits that produced a valid final zkey"
    ).expect("metric creation failed");

    /// Ceremonies finalized
    pub static ref CEREMONIES_FINALIZED: Counter = Counter::new(
        "ceremony_finalizer_ceremonies_finalized_total",
        "Total ceremonies that reached the FINALIZED state"
    ).expect("metric creation failed");

    /// Finalization upstream call failures requiring retry
    pub static ref FINALIZATION_RETRIES: Counter = Counter::new(
        "ceremony_finalizer_retries_total",
        "Total finalization upstream retries after a transient failure"
    ).expect("metric creation failed");

    // =========================================================================
    // EVENT BUS METRICS
    // =========================================================================

    /// Messages published on the event bus
    pub static ref EVENT_BUS_MESSAGES_PUBLISHED: CounterVec = CounterVec::new(
        Opts::new("ceremony_eventbus_messages_published_total", "Events published by topic"),
        &["topic"]
    ).expect("metric creation failed");

    /// Event bus delivery latency
    pub static ref EVENT_BUS_LATENCY: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "ceremony_eventbus_delivery_latency_seconds",
            "Time for event delivery via the in-process bus"
        ).buckets(exponential_buckets(0.0001, 2.0, 12).expect("valid bucket parameters"))
    ).expect("metric creation failed");

    // =========================================================================
    // RPC / ERROR METRICS
    // =========================================================================

    /// RPC calls handled by the gateway
    pub static ref RPC_CALLS: CounterVec = CounterVec::new(
        Opts::new("ceremony_gateway_rpc_calls_total", "RPC calls by method and outcome"),
        &["method", "outcome"]
    ).expect("metric creation failed");

    /// Core errors by taxonomy identifier
    pub static ref CORE_ERRORS: CounterVec = CounterVec::new(
        Opts::new("ceremony_core_errors_total", "Errors by component and taxonomy identifier"),
        &["component", "error_kind"]
    ).expect("metric creation failed");
}

/// Handle for the metrics server
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Scheduler
        Box::new(QUEUE_ADMISSIONS.clone()),
        Box::new(QUEUE_LENGTH.clone()),
        Box::new(BATON_HANDOFFS.clone()),
        Box::new(TIMEOUTS_FIRED.clone()),
        // Upload
        Box::new(UPLOADS_OPENED.clone()),
        Box::new(UPLOADS_COMPLETED.clone()),
        Box::new(CHUNKS_STORED.clone()),
        Box::new(UPLOAD_RETRIES.clone()),
        // Verification
        Box::new(CONTRIBUTIONS_VERIFIED.clone()),
        Box::new(VERIFICATION_DURATION.clone()),
        Box::new(VERIFICATION_RETRIES.clone()),
        // Finalization
        Box::new(CIRCUITS_FINALIZED.clone()),
        Box::new(CEREMONIES_FINALIZED.clone()),
        Box::new(FINALIZATION_RETRIES.clone()),
        // Event bus
        Box::new(EVENT_BUS_MESSAGES_PUBLISHED.clone()),
        Box::new(EVENT_BUS_LATENCY.clone()),
        // RPC / errors
        Box::new(RPC_CALLS.clone()),
        Box::new(CORE_ERRORS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
