/*!
 * Monitoring
 * Tracing setup and collection-pass spans
 */

pub mod tracer;

pub use tracer::{init_tracing, span_collection, CollectionSpan};
