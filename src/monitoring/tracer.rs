/*!
 * Collection Tracing
 * Structured tracing for heap collection passes using the tracing crate
 *
 * Features:
 * - Monotonic collection IDs for correlating sweep and compaction events
 * - JSON-formatted logs for structured parsing
 * - `log` records from the allocator forwarded into the same subscriber
 * - Pass duration and live/free figures embedded in spans
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

/// Passes slower than this are reported at warn level
const SLOW_PASS_MS: u128 = 10;

static NEXT_COLLECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - HEAP_TRACE_JSON: Enable JSON output (default: false)
///
/// Fails if a global subscriber or `log` logger is already installed.
pub fn init_tracing() -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("HEAP_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()?;
        info!("Structured tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
        info!("Structured tracing initialized");
    }
    Ok(())
}

/// Span covering one collection pass (sweep or compaction)
pub struct CollectionSpan {
    span: tracing::Span,
    start: Instant,
    phase: &'static str,
    collection_id: u64,
}

impl CollectionSpan {
    pub fn new(phase: &'static str, region_size: usize) -> Self {
        let collection_id = NEXT_COLLECTION_ID.fetch_add(1, Ordering::Relaxed);

        let span = span!(
            Level::DEBUG,
            "collection",
            collection_id = collection_id,
            phase = phase,
            region_size = region_size,
            live_blocks = tracing::field::Empty,
            live_bytes = tracing::field::Empty,
            free_space = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );

        {
            let _entered = span.enter();
            debug!(phase = phase, region_size = region_size, "collection pass started");
        }

        Self {
            span,
            start: Instant::now(),
            phase,
            collection_id,
        }
    }

    pub fn collection_id(&self) -> u64 {
        self.collection_id
    }

    pub fn phase(&self) -> &'static str {
        self.phase
    }

    /// Record what survived the pass
    pub fn record_outcome(&self, live_blocks: usize, live_bytes: usize, free_space: usize) {
        self.span.record("live_blocks", live_blocks);
        self.span.record("live_bytes", live_bytes);
        self.span.record("free_space", free_space);
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for CollectionSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("duration_us", duration.as_micros() as u64);
        let _entered = self.span.enter();

        if duration.as_millis() > SLOW_PASS_MS {
            warn!(
                collection_id = self.collection_id,
                phase = self.phase,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow collection pass"
            );
        } else {
            debug!(
                collection_id = self.collection_id,
                phase = self.phase,
                duration_us = duration.as_micros() as u64,
                "collection pass completed"
            );
        }
    }
}

/// Open a span for a collection pass
pub fn span_collection(phase: &'static str, region_size: usize) -> CollectionSpan {
    CollectionSpan::new(phase, region_size)
}
