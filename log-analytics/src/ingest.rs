use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use num_format::{Locale, ToFormattedString};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    error::{IngestError, MalformedReason},
    models::LogRecord,
};

pub const HEADER: &str = "ip,timestamp,url,status,user_agent";
const FIELDS: [&str; 5] = ["ip", "timestamp", "url", "status", "user_agent"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Drop the row and count it.
    #[default]
    Skip,
    /// Abort ingest on the first bad row.
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub accepted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ingested {
    pub records: Vec<LogRecord>,
    pub stats: IngestStats,
}

/// Reads records from `path`, or from stdin when `path` is `-`.
pub fn read_path(path: &Path, policy: MalformedPolicy) -> Result<Ingested, IngestError> {
    if path == Path::new("-") {
        return read_records(io::stdin().lock(), path, policy);
    }
    let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
    read_records(BufReader::new(file), path, policy)
}

/// `source` only labels errors and log lines.
pub fn read_records<R: BufRead>(
    reader: R,
    source: &Path,
    policy: MalformedPolicy,
) -> Result<Ingested, IngestError> {
    let mut ingested = Ingested::default();
    let mut seen_content = false;
    for (idx, raw) in reader.split(b'\n').enumerate() {
        let raw = raw.map_err(|e| IngestError::io(source, e))?;
        let parsed = std::str::from_utf8(&raw)
            .map_err(MalformedReason::from)
            .and_then(|line| {
                let line = line.trim_end_matches('\r');
                if line.trim().is_empty() {
                    return Ok(None);
                }
                let first = !seen_content;
                seen_content = true;
                let line = if first {
                    line.strip_prefix('\u{feff}').unwrap_or(line)
                } else {
                    line
                };
                if first && is_header(line) {
                    return Ok(None);
                }
                parse_record(line).map(Some)
            });
        match parsed {
            Ok(Some(record)) => ingested.records.push(record),
            Ok(None) => {}
            Err(reason) => match policy {
                MalformedPolicy::Skip => {
                    debug!(line = idx + 1, %reason, "skipping malformed record");
                    ingested.stats.skipped += 1;
                }
                MalformedPolicy::Reject => {
                    return Err(IngestError::MalformedRecord {
                        line: idx + 1,
                        reason,
                    });
                }
            },
        }
    }
    ingested.stats.accepted = ingested.records.len();
    if ingested.records.is_empty() {
        warn!(source = %source.display(), "no well-formed records in input");
    }
    info!(
        source = %source.display(),
        accepted = %ingested.stats.accepted.to_formatted_string(&Locale::en),
        skipped = %ingested.stats.skipped.to_formatted_string(&Locale::en),
        "ingest finished"
    );
    Ok(ingested)
}

fn is_header(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(HEADER)
}

/// Fields are taken verbatim; only a zero-length field counts as empty.
pub fn parse_record(line: &str) -> Result<LogRecord, MalformedReason> {
    let parts: Vec<&str> = line.split(',').collect();
    let [ip, timestamp, url, status, user_agent] = parts.as_slice() else {
        return Err(MalformedReason::FieldCount(parts.len()));
    };
    for (name, value) in FIELDS.iter().zip(&parts) {
        if value.is_empty() {
            return Err(MalformedReason::EmptyField(*name));
        }
    }
    let status = status
        .parse::<i32>()
        .map_err(|_| MalformedReason::Status(status.to_string()))?;
    Ok(LogRecord {
        ip: ip.parse().map_err(|_| MalformedReason::EmptyField("ip"))?,
        timestamp: timestamp.parse()?,
        url: url.parse().map_err(|_| MalformedReason::EmptyField("url"))?,
        status,
        user_agent: user_agent
            .parse()
            .map_err(|_| MalformedReason::EmptyField("user_agent"))?,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use asserting::prelude::*;

    const SAMPLE: &str = "\
ip,timestamp,url,status,user_agent
192.168.1.1,2024-10-01 10:15:32,/home,200,Mozilla/5.0
192.168.1.2,2024-10-01 10:16:01,/about,404,Mozilla/5.0

192.168.1.3,not-a-time,/contact,500,Chrome/90.0
192.168.1.4,2024-10-01 10:17:00,/home,OK,Safari/14.0
192.168.1.5,2024-10-01 10:17:00,,200,Safari/14.0
192.168.1.6,2024-10-01 10:18:00,/home,200
";

    fn ingest(input: &str, policy: MalformedPolicy) -> Result<Ingested, IngestError> {
        read_records(input.as_bytes(), Path::new("sample.csv"), policy)
    }

    #[test]
    fn parse_record_valid() {
        let record = parse_record("10.0.0.7,2024-10-01 10:15:32,/home,200,curl/8.0").unwrap();
        assert_that!(record.ip.as_str()).is_equal_to("10.0.0.7");
        assert_that!(record.url.as_str()).is_equal_to("/home");
        assert_that!(record.status).is_equal_to(200);
        assert_that!(record.to_string())
            .is_equal_to("10.0.0.7,2024-10-01 10:15:32,/home,200,curl/8.0".to_string());
    }

    #[test]
    fn parse_record_reports_reason() {
        assert_that!(parse_record("a,b,c"))
            .is_equal_to(Err(MalformedReason::FieldCount(3)));
        assert_that!(parse_record("1.1.1.1,2024-10-01 10:15:32,/x,,ua"))
            .is_equal_to(Err(MalformedReason::EmptyField("status")));
        assert_that!(parse_record("1.1.1.1,2024-10-01 10:15:32,/x,2OO,ua"))
            .is_equal_to(Err(MalformedReason::Status("2OO".into())));
        assert_that!(parse_record("1.1.1.1,2024-10-01 10:15:32,/x, 200,ua"))
            .is_equal_to(Err(MalformedReason::Status(" 200".into())));
    }

    #[test]
    fn any_integer_status_is_accepted() {
        let input = "ip,timestamp,url,status,user_agent\n\
                     1.1.1.1,2024-10-01 10:15:32,/x,70000,ua\n\
                     1.1.1.2,2024-10-01 10:15:33,/x,-1,ua\n";
        let ingested = ingest(input, MalformedPolicy::Reject).unwrap();
        let statuses: Vec<i32> = ingested.records.iter().map(|r| r.status).collect();
        assert_that!(statuses).is_equal_to(vec![70000, -1]);
    }

    #[test]
    fn text_fields_keep_surrounding_whitespace() {
        let input = "1.1.1.1,2024-10-01 10:15:32, /home,200,ua\n\
                     1.1.1.1,2024-10-01 10:15:33,/home,200, \n";
        let ingested = ingest(input, MalformedPolicy::Reject).unwrap();
        let urls: Vec<&str> = ingested.records.iter().map(|r| r.url.as_str()).collect();
        assert_that!(urls).is_equal_to(vec![" /home", "/home"]);
        assert_that!(ingested.records[1].user_agent.as_str()).is_equal_to(" ");
    }

    #[test]
    fn invalid_utf8_row_is_skipped_not_fatal() {
        let mut input = b"ip,timestamp,url,status,user_agent\n\
                          1.1.1.1,2024-10-01 10:15:32,/home,200,ua\n"
            .to_vec();
        input.extend_from_slice(b"1.1.1.2,2024-10-01 10:15:33,/home,200,Caf\xe9Agent\n");
        input.extend_from_slice(b"1.1.1.3,2024-10-01 10:15:34,/about,404,ua\n");

        let ingested =
            read_records(input.as_slice(), Path::new("latin1.csv"), MalformedPolicy::Skip).unwrap();
        assert_that!(ingested.stats).is_equal_to(IngestStats {
            accepted: 2,
            skipped: 1,
        });

        let err = read_records(input.as_slice(), Path::new("latin1.csv"), MalformedPolicy::Reject)
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::MalformedRecord {
                line: 3,
                reason: MalformedReason::Encoding(_),
            }
        ));
    }

    #[test]
    fn byte_order_mark_before_header_is_ignored() {
        let input = "\u{feff}ip,timestamp,url,status,user_agent\n\
                     1.1.1.1,2024-10-01 10:15:32,/home,200,ua\n";
        let ingested = ingest(input, MalformedPolicy::Reject).unwrap();
        assert_that!(ingested.stats).is_equal_to(IngestStats {
            accepted: 1,
            skipped: 0,
        });
    }

    #[test]
    fn skip_policy_counts_bad_rows() {
        let ingested = ingest(SAMPLE, MalformedPolicy::Skip).unwrap();
        assert_that!(ingested.stats).is_equal_to(IngestStats {
            accepted: 2,
            skipped: 4,
        });
    }

    #[test]
    fn reject_policy_names_the_line() {
        let err = ingest(SAMPLE, MalformedPolicy::Reject).unwrap_err();
        assert!(matches!(err, IngestError::MalformedRecord { line: 5, .. }));
    }

    #[test]
    fn header_only_counts_when_first() {
        let input = "192.168.1.1,2024-10-01 10:15:32,/home,200,Mozilla/5.0\n\
                     ip,timestamp,url,status,user_agent\n";
        let ingested = ingest(input, MalformedPolicy::Skip).unwrap();
        assert_that!(ingested.stats.accepted).is_equal_to(1);
        assert_that!(ingested.stats.skipped).is_equal_to(1);
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let ingested = ingest("", MalformedPolicy::Reject).unwrap();
        assert_that!(ingested.records).is_empty();
    }
}
