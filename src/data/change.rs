//! Baseline-relative change indicators for the service detail panel.

use super::model::MetricsSnapshot;

/// Changes smaller than this (in percent, absolute) are shown as neutral.
pub const NEUTRAL_THRESHOLD_PERCENT: f64 = 1.0;

/// Which way a metric moves when things get better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricDirection {
    /// An increase is a regression (latency, errors).
    HigherIsWorse,
    /// An increase is an improvement.
    HigherIsBetter,
}

/// How a change should be colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTone {
    Neutral,
    Good,
    Bad,
}

/// A formatted change versus baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeIndicator {
    /// Percentage change, `None` when the baseline is zero.
    pub percent: Option<f64>,
    pub text: String,
    pub tone: ChangeTone,
}

/// Compute `(current - baseline) / baseline * 100` and classify it.
pub fn change_indicator(current: f64, baseline: f64, direction: MetricDirection) -> ChangeIndicator {
    let change = (current - baseline) / baseline * 100.0;
    if baseline == 0.0 || !change.is_finite() {
        return ChangeIndicator {
            percent: None,
            text: "n/a".to_string(),
            tone: ChangeTone::Neutral,
        };
    }

    if change.abs() < NEUTRAL_THRESHOLD_PERCENT {
        return ChangeIndicator {
            percent: Some(change),
            text: "~".to_string(),
            tone: ChangeTone::Neutral,
        };
    }

    let increased = change > 0.0;
    let tone = match (direction, increased) {
        (MetricDirection::HigherIsWorse, true) | (MetricDirection::HigherIsBetter, false) => {
            ChangeTone::Bad
        }
        _ => ChangeTone::Good,
    };
    let text = if increased {
        format!("+{:.1}%", change)
    } else {
        format!("{:.1}%", change)
    };

    ChangeIndicator {
        percent: Some(change),
        text,
        tone,
    }
}

/// The metrics shown as cards in the service detail panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailMetric {
    LatencyP50,
    LatencyP95,
    LatencyP99,
    ErrorRate,
    AvgDuration,
    RequestsPerSecond,
}

impl DetailMetric {
    pub const ALL: [DetailMetric; 6] = [
        DetailMetric::LatencyP50,
        DetailMetric::LatencyP95,
        DetailMetric::LatencyP99,
        DetailMetric::ErrorRate,
        DetailMetric::AvgDuration,
        DetailMetric::RequestsPerSecond,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DetailMetric::LatencyP50 => "P50 Latency",
            DetailMetric::LatencyP95 => "P95 Latency",
            DetailMetric::LatencyP99 => "P99 Latency",
            DetailMetric::ErrorRate => "Error Rate",
            DetailMetric::AvgDuration => "Avg Duration",
            DetailMetric::RequestsPerSecond => "Requests/sec",
        }
    }

    /// Direction used to color the change of this metric.
    ///
    /// Every metric currently shown treats an increase as a regression,
    /// request throughput included.
    pub fn direction(&self) -> MetricDirection {
        match self {
            DetailMetric::LatencyP50
            | DetailMetric::LatencyP95
            | DetailMetric::LatencyP99
            | DetailMetric::ErrorRate
            | DetailMetric::AvgDuration
            | DetailMetric::RequestsPerSecond => MetricDirection::HigherIsWorse,
        }
    }

    pub fn value(&self, snapshot: &MetricsSnapshot) -> f64 {
        match self {
            DetailMetric::LatencyP50 => snapshot.latency_p50,
            DetailMetric::LatencyP95 => snapshot.latency_p95,
            DetailMetric::LatencyP99 => snapshot.latency_p99,
            DetailMetric::ErrorRate => snapshot.error_rate,
            DetailMetric::AvgDuration => snapshot.avg_duration_ms,
            DetailMetric::RequestsPerSecond => snapshot.requests_per_second,
        }
    }

    /// Format the current value of this metric.
    pub fn format(&self, value: f64) -> String {
        match self {
            DetailMetric::ErrorRate => super::format::format_rate(value),
            DetailMetric::RequestsPerSecond => format!("{:.2}", value),
            _ => super::format::format_ms(value),
        }
    }

    /// Change of this metric between two snapshots.
    pub fn change(&self, current: &MetricsSnapshot, baseline: &MetricsSnapshot) -> ChangeIndicator {
        change_indicator(self.value(current), self.value(baseline), self.direction())
    }
}
