use prometheus::{IntGauge, IntGaugeVec, Registry, TextEncoder, opts};

use crate::report::AnalysisReport;

pub struct PromMetrics {
    pub requests_total: IntGauge,
    pub skipped_rows: IntGauge,
    pub status_requests: IntGaugeVec,
    pub page_hits: IntGaugeVec,
    pub agent_hits: IntGaugeVec,
    pub suspicious_failures: IntGaugeVec,
    pub bucket_hits: IntGaugeVec,
    pub registry: Registry,
}

impl PromMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntGauge::with_opts(opts!(
            "requests_total",
            "Well-formed access log records analyzed"
        ))?;
        let skipped_rows = IntGauge::with_opts(opts!(
            "skipped_rows",
            "Malformed input rows dropped at ingest"
        ))?;
        let status_requests = IntGaugeVec::new(
            opts!("status_requests", "Requests per HTTP status code"),
            &["status"],
        )?;
        let page_hits = IntGaugeVec::new(opts!("page_hits", "Hits per top page"), &["url"])?;
        let agent_hits =
            IntGaugeVec::new(opts!("agent_hits", "Hits per user agent"), &["user_agent"])?;
        let suspicious_failures = IntGaugeVec::new(
            opts!("suspicious_failures", "Failed requests per suspicious client"),
            &["ip"],
        )?;
        let bucket_hits = IntGaugeVec::new(
            opts!("bucket_hits", "Requests per traffic trend bucket"),
            &["bucket"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(skipped_rows.clone()))?;
        registry.register(Box::new(status_requests.clone()))?;
        registry.register(Box::new(page_hits.clone()))?;
        registry.register(Box::new(agent_hits.clone()))?;
        registry.register(Box::new(suspicious_failures.clone()))?;
        registry.register(Box::new(bucket_hits.clone()))?;

        Ok(Self {
            requests_total,
            skipped_rows,
            status_requests,
            page_hits,
            agent_hits,
            suspicious_failures,
            bucket_hits,
            registry,
        })
    }

    pub fn export(&self, report: &AnalysisReport) {
        self.skipped_rows.set(report.ingest.skipped as i64);
        if let Some(total) = report.total_requests {
            self.requests_total.set(total as i64);
        }
        for (status, count) in report.status_codes.iter().flatten() {
            self.status_requests
                .with_label_values(&[&status.to_string()])
                .set(*count as i64);
        }
        for (url, count) in report.top_pages.iter().flatten() {
            self.page_hits
                .with_label_values(&[url.as_str()])
                .set(*count as i64);
        }
        for (agent, count) in report.traffic_sources.iter().flatten() {
            self.agent_hits
                .with_label_values(&[agent.as_str()])
                .set(*count as i64);
        }
        for (ip, count) in report.suspicious_ips.iter().flatten() {
            self.suspicious_failures
                .with_label_values(&[ip.as_str()])
                .set(*count as i64);
        }
        for (bucket, count) in report.traffic_trend.iter().flatten() {
            self.bucket_hits
                .with_label_values(&[&bucket.to_string()])
                .set(*count as i64);
        }
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = String::new();
        TextEncoder::new().encode_utf8(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}
