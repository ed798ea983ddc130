use std::sync::LazyLock;

use prometheus::*;

use crate::cluster::DedupReport;

static METRIC_DEDUP_IMAGE_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "dedup_image_count",
        "count of processed images by outcome",
        &["outcome"]
    )
    .unwrap()
});

static METRIC_DEDUP_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "dedup_run_duration",
        "duration of a dedup run in seconds",
        exponential_buckets(0.1, 2., 12).unwrap()
    )
    .unwrap()
});

/// 记录一次去重运行的结果指标
pub fn observe_run(report: &DedupReport, duration: f32) {
    let duplicates = report.duplicates.values().map(|v| v.len()).sum::<usize>();

    METRIC_DEDUP_IMAGE_COUNT
        .with_label_values(&["canonical"])
        .inc_by(report.canonical.len() as u64);
    METRIC_DEDUP_IMAGE_COUNT.with_label_values(&["duplicate"]).inc_by(duplicates as u64);
    METRIC_DEDUP_IMAGE_COUNT.with_label_values(&["excluded"]).inc_by(report.excluded as u64);
    METRIC_DEDUP_DURATION.observe(duration as f64);
}
