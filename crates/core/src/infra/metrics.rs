use serde::Serialize;
use std::sync::Mutex;

/// ローカルメトリクス収集器
pub struct Metrics {
    counters: Mutex<MetricsCounters>,
    latencies: Mutex<Vec<LatencyRecord>>,
}

#[derive(Debug, Default)]
struct MetricsCounters {
    batches_planned: u64,
    jobs_succeeded: u64,
    jobs_failed: u64,
    clips_generated: u64,
    videos_generated: u64,
    errors_planning: u64,
    errors_synthesis: u64,
    errors_credential: u64,
    errors_poll_timeout: u64,
    errors_retrieval: u64,
    errors_internal: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencyRecord {
    pub phase: String,
    pub duration_ms: u64,
    pub timestamp: String,
}

/// メトリクスサマリー（UIに返す用）
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub batches_planned: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub clips_generated: u64,
    pub videos_generated: u64,
    pub error_counts: ErrorCounts,
    pub avg_latency_ms: AvgLatency,
    pub recent_latencies: Vec<LatencyRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorCounts {
    pub planning: u64,
    pub synthesis: u64,
    pub credential: u64,
    pub poll_timeout: u64,
    pub retrieval: u64,
    pub internal: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvgLatency {
    pub plan: Option<f64>,
    pub synthesize: Option<f64>,
    pub speech: Option<f64>,
    pub video: Option<f64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(MetricsCounters::default()),
            latencies: Mutex::new(Vec::new()),
        }
    }

    pub fn inc_batches_planned(&self) {
        self.counters.lock().unwrap().batches_planned += 1;
    }

    pub fn add_job_outcomes(&self, succeeded: u64, failed: u64) {
        let mut c = self.counters.lock().unwrap();
        c.jobs_succeeded += succeeded;
        c.jobs_failed += failed;
    }

    pub fn inc_clips_generated(&self) {
        self.counters.lock().unwrap().clips_generated += 1;
    }

    pub fn inc_videos_generated(&self) {
        self.counters.lock().unwrap().videos_generated += 1;
    }

    pub fn inc_error(&self, code: &str) {
        let mut c = self.counters.lock().unwrap();
        match code {
            "E_PLANNING" => c.errors_planning += 1,
            "E_SYNTHESIS" | "E_SAFETY_BLOCKED" | "E_NO_CONTENT" => c.errors_synthesis += 1,
            "E_CREDENTIAL" => c.errors_credential += 1,
            "E_POLL_TIMEOUT" => c.errors_poll_timeout += 1,
            "E_RETRIEVAL" => c.errors_retrieval += 1,
            _ => c.errors_internal += 1,
        }
    }

    pub fn record_latency(&self, phase: &str, duration_ms: u64) {
        let record = LatencyRecord {
            phase: phase.to_string(),
            duration_ms,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let mut latencies = self.latencies.lock().unwrap();
        latencies.push(record);
        // 最新1000件のみ保持
        if latencies.len() > 1000 {
            let excess = latencies.len() - 1000;
            latencies.drain(0..excess);
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let c = self.counters.lock().unwrap();
        let latencies = self.latencies.lock().unwrap();

        let avg = |phase: &str| -> Option<f64> {
            let vals: Vec<f64> = latencies
                .iter()
                .filter(|r| r.phase == phase)
                .map(|r| r.duration_ms as f64)
                .collect();
            if vals.is_empty() {
                None
            } else {
                Some(vals.iter().sum::<f64>() / vals.len() as f64)
            }
        };

        let recent: Vec<LatencyRecord> = latencies.iter().rev().take(20).cloned().collect();

        MetricsSummary {
            batches_planned: c.batches_planned,
            jobs_succeeded: c.jobs_succeeded,
            jobs_failed: c.jobs_failed,
            clips_generated: c.clips_generated,
            videos_generated: c.videos_generated,
            error_counts: ErrorCounts {
                planning: c.errors_planning,
                synthesis: c.errors_synthesis,
                credential: c.errors_credential,
                poll_timeout: c.errors_poll_timeout,
                retrieval: c.errors_retrieval,
                internal: c.errors_internal,
            },
            avg_latency_ms: AvgLatency {
                plan: avg("plan"),
                synthesize: avg("synthesize"),
                speech: avg("speech"),
                video: avg("video"),
            },
            recent_latencies: recent,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let m = Metrics::new();
        m.inc_batches_planned();
        m.add_job_outcomes(5, 1);
        m.inc_error("E_SYNTHESIS");
        m.inc_error("E_CREDENTIAL");
        m.inc_error("E_POLL_TIMEOUT");

        let s = m.summary();
        assert_eq!(s.batches_planned, 1);
        assert_eq!(s.jobs_succeeded, 5);
        assert_eq!(s.jobs_failed, 1);
        assert_eq!(s.error_counts.synthesis, 1);
        assert_eq!(s.error_counts.credential, 1);
        assert_eq!(s.error_counts.poll_timeout, 1);
    }

    #[test]
    fn test_latency_recording() {
        let m = Metrics::new();
        m.record_latency("plan", 120);
        m.record_latency("plan", 80);
        m.record_latency("video", 200);

        let s = m.summary();
        assert!((s.avg_latency_ms.plan.unwrap() - 100.0).abs() < f64::EPSILON);
        assert!((s.avg_latency_ms.video.unwrap() - 200.0).abs() < f64::EPSILON);
        assert!(s.avg_latency_ms.speech.is_none());
        assert_eq!(s.recent_latencies.len(), 3);
    }

    #[test]
    fn test_latency_cap() {
        let m = Metrics::new();
        for i in 0..1100 {
            m.record_latency("synthesize", i);
        }
        let latencies = m.latencies.lock().unwrap();
        assert_eq!(latencies.len(), 1000);
    }
}
