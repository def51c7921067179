use std::{fmt::Display, io::Write};

use clap::ValueEnum;
use serde::Serialize;

use crate::{
    error::Result,
    ingest::IngestStats,
    invariants::{ClientAddr, Endpoint, TimeBucket, UserAgent},
    models::LogRecord,
    partition::{PartitionIndex, partition_name},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Section {
    Total,
    Status,
    Pages,
    Agents,
    Suspicious,
    Trend,
}

impl Section {
    pub fn label(self) -> &'static str {
        match self {
            Self::Total => "Total Requests:",
            Self::Status => "Status Code Analysis:",
            Self::Pages => "Most Visited Pages:",
            Self::Agents => "Traffic Source Analysis:",
            Self::Suspicious => "Suspicious IPs:",
            Self::Trend => "Traffic Trend:",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Prometheus,
}

/// One pipeline run. Sections that were not requested stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub ingest: IngestStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_requests: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_codes: Option<Vec<(i32, usize)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_pages: Option<Vec<(Endpoint, usize)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_sources: Option<Vec<(UserAgent, usize)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspicious_ips: Option<Vec<(ClientAddr, usize)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_trend: Option<Vec<(TimeBucket, usize)>>,
}

fn write_rows<W, K>(out: &mut W, section: Section, rows: &[(K, usize)]) -> std::io::Result<()>
where
    W: Write,
    K: Display,
{
    for (key, count) in rows {
        writeln!(out, "{},{key},{count}", section.label())?;
    }
    Ok(())
}

impl AnalysisReport {
    /// Label-prefixed comma rows, one per result, in section order.
    pub fn write_text<W: Write>(&self, out: &mut W) -> Result<()> {
        if let Some(total) = self.total_requests {
            writeln!(out, "{},{total}", Section::Total.label())?;
        }
        if let Some(rows) = &self.status_codes {
            write_rows(out, Section::Status, rows)?;
        }
        if let Some(rows) = &self.top_pages {
            write_rows(out, Section::Pages, rows)?;
        }
        if let Some(rows) = &self.traffic_sources {
            write_rows(out, Section::Agents, rows)?;
        }
        if let Some(rows) = &self.suspicious_ips {
            write_rows(out, Section::Suspicious, rows)?;
        }
        if let Some(rows) = &self.traffic_trend {
            write_rows(out, Section::Trend, rows)?;
        }
        Ok(())
    }

    pub fn write_json<W: Write>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)?;
        Ok(())
    }
}

/// `SHOW PARTITIONS` style listing: `status=<code>,<records>`.
pub fn write_partition_list<W: Write>(index: &PartitionIndex<'_>, out: &mut W) -> Result<()> {
    for (status, records) in index.iter() {
        writeln!(out, "{},{}", partition_name(status), records.len())?;
    }
    Ok(())
}

pub fn write_records<W: Write>(records: &[&LogRecord], out: &mut W) -> Result<()> {
    for record in records {
        writeln!(out, "{record}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analytics::AnalysisOptions, analytics::LogAnalyticsPipeline, ingest::parse_record};
    use asserting::prelude::*;

    fn sample() -> Vec<LogRecord> {
        [
            "192.168.1.1,2024-10-01 10:15:32,/home,200,Mozilla/5.0",
            "192.168.1.2,2024-10-01 10:16:01,/about,404,Mozilla/5.0",
            "192.168.1.3,2024-10-01 10:17:20,/contact,500,Chrome/90.0",
        ]
        .iter()
        .map(|l| parse_record(l).unwrap())
        .collect()
    }

    fn text(report: &AnalysisReport) -> String {
        let mut buf = Vec::new();
        report.write_text(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn text_rows_carry_section_labels() {
        let logs = sample();
        let report = LogAnalyticsPipeline::new(&logs)
            .report(&AnalysisOptions::default(), &[Section::Total, Section::Status]);
        assert_that!(text(&report)).is_equal_to(
            "Total Requests:,3\n\
             Status Code Analysis:,200,1\n\
             Status Code Analysis:,404,1\n\
             Status Code Analysis:,500,1\n"
                .to_string(),
        );
    }

    #[test]
    fn trend_rows_use_minute_labels() {
        let logs = sample();
        let report =
            LogAnalyticsPipeline::new(&logs).report(&AnalysisOptions::default(), &[Section::Trend]);
        let out = text(&report);
        assert_that!(out.lines().next())
            .is_equal_to(Some("Traffic Trend:,2024-10-01 10:15,1"));
    }

    #[test]
    fn json_omits_unrequested_sections() {
        let logs = sample();
        let report =
            LogAnalyticsPipeline::new(&logs).report(&AnalysisOptions::default(), &[Section::Pages]);
        let mut buf = Vec::new();
        report.write_json(&mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_that!(value.get("status_codes").is_none()).is_true();
        assert_that!(value["top_pages"][0][0].as_str()).is_equal_to(Some("/about"));
        assert_that!(value["ingest"]["accepted"].as_u64()).is_equal_to(Some(3));
    }
}
