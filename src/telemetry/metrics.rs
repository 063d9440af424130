//! Prometheus metrics

use crate::signal::SignalKind;
use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Comparator decision for one level
    Decision,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Instruments in the current consensus
    ConsensusSize,
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::Decision => "trader_decision_latency_ms",
    };
    metrics::histogram!(metric_name).record(duration.as_secs_f64() * 1000.0);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::ConsensusSize => "trader_consensus_size",
    };
    metrics::gauge!(metric_name).set(value);
}

/// Count one handled tick
pub fn record_tick() {
    metrics::counter!("trader_ticks_total").increment(1);
}

/// Count one dispatched signal
pub fn record_signal(kind: SignalKind) {
    metrics::counter!("trader_signals_total", "kind" => kind.as_str()).increment(1);
}
