//! Read-side views over the registry
//!
//! Every figure is recomputed from a fresh storage snapshot; nothing is
//! cached between calls.

pub mod aggregator;

pub use aggregator::{
    recent_activity, referrer_breakdown, summarize, top_by_clicks, AnalyticsAggregator,
};
