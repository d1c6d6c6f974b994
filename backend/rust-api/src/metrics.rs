use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Encoder, Histogram,
    HistogramVec, IntCounterVec, TextEncoder,
};

use crate::models::grading::{GradeSource, MatchMethod};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Grading Metrics
    pub static ref ANSWERS_GRADED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "answers_graded_total",
        "Total number of graded answers by how the grade was reached",
        &["outcome", "correct"]
    )
    .unwrap();

    pub static ref MATCH_METHOD_TOTAL: IntCounterVec = register_int_counter_vec!(
        "match_method_total",
        "Local matcher results by method",
        &["method"]
    )
    .unwrap();

    // AI grader Metrics
    pub static ref AI_GRADING_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "ai_grading_requests_total",
        "Total number of calls to the AI grading service",
        &["status"]
    )
    .unwrap();

    pub static ref AI_GRADING_DURATION_SECONDS: Histogram = register_histogram!(
        "ai_grading_duration_seconds",
        "AI grading call duration in seconds, retries included",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

pub fn record_match(method: MatchMethod) {
    MATCH_METHOD_TOTAL
        .with_label_values(&[method.as_str()])
        .inc();
}

pub fn record_grade(source: GradeSource, correct: bool) {
    let correct_label = if correct { "true" } else { "false" };
    ANSWERS_GRADED_TOTAL
        .with_label_values(&[source.as_str(), correct_label])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        let _ = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/health", "200"])
            .get();
        let _ = AI_GRADING_DURATION_SECONDS.get_sample_count();
    }

    #[test]
    fn test_record_grade_counts_by_outcome() {
        let before = ANSWERS_GRADED_TOTAL
            .with_label_values(&["fallback", "false"])
            .get();
        record_grade(GradeSource::LocalFallback, false);
        let after = ANSWERS_GRADED_TOTAL
            .with_label_values(&["fallback", "false"])
            .get();
        assert!(after > before);
    }

    #[test]
    fn test_render_metrics() {
        record_match(MatchMethod::Fuzzy);

        let output = render_metrics().unwrap();
        assert!(output.contains("match_method_total"));
        assert!(output.contains("method=\"fuzzy\""));
    }
}
