//! Plain-text rendering of query results and run summaries

use netinfo_core::ingest::FileStatus;
use netinfo_core::lookup::{BlockRecord, Stats};
use netinfo_core::RunSummary;
use serde::Serialize;
use std::fmt::Write;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Pretty JSON for `--json` output
pub fn json<T: Serialize + ?Sized>(value: &T) -> crate::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// One block per paragraph, WHOIS style
pub fn records(rows: &[BlockRecord]) -> String {
    if rows.is_empty() {
        return "No matching blocks.\n".to_string();
    }

    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        field(&mut out, "inetnum", Some(&row.inetnum));
        field(&mut out, "netname", row.netname.as_deref());
        if let Some(description) = &row.description {
            for line in description.lines() {
                field(&mut out, "descr", Some(line));
            }
        }
        field(&mut out, "country", row.country.as_deref());
        field(&mut out, "mnt-by", row.maintained_by.as_deref());
        field(&mut out, "status", row.status.as_deref());
        let created = row.created.map(|d| d.format(DATE_FORMAT).to_string());
        field(&mut out, "created", created.as_deref());
        let modified = row.last_modified.map(|d| d.format(DATE_FORMAT).to_string());
        field(&mut out, "last-modified", modified.as_deref());
        field(&mut out, "source", Some(&row.source.to_uppercase()));
    }
    out
}

fn field(out: &mut String, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        let _ = writeln!(out, "{:<15}{}", format!("{key}:"), value);
    }
}

pub fn stats(stats: &Stats) -> String {
    let mut out = String::new();
    for entry in &stats.by_source {
        let _ = writeln!(out, "{:<10}{:>12}", entry.source, entry.count);
    }
    let _ = writeln!(out, "{:<10}{:>12}", "total", stats.total);
    out
}

pub fn summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<24}{:<11}{:>10}{:>10}{:>10}{:>10}",
        "file", "status", "stanzas", "rows", "skipped", "ignored"
    );
    for report in &summary.files {
        let _ = writeln!(
            out,
            "{:<24}{:<11}{:>10}{:>10}{:>10}{:>10}",
            report.file,
            report.status.as_str(),
            report.stanzas,
            report.records_emitted,
            report.records_skipped,
            report.objects_ignored,
        );
    }
    for report in summary.failures() {
        if let FileStatus::Failed(reason) = &report.status {
            let _ = writeln!(out, "  {}: {}", report.file, reason);
        }
    }
    let _ = writeln!(
        out,
        "\n{} rows in {} batches, {:.1}s",
        summary.rows_written,
        summary.batches_committed,
        summary.duration.as_secs_f64()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use netinfo_core::ingest::FileReport;
    use netinfo_core::lookup::SourceCount;
    use netinfo_core::Source;
    use std::time::Duration;

    fn record() -> BlockRecord {
        BlockRecord {
            inetnum: "8.8.8.0/24".into(),
            netname: Some("LVLT-GOGL-8-8-8".into()),
            description: Some("Google LLC\nPublic DNS".into()),
            country: Some("US".into()),
            maintained_by: None,
            created: Some(Utc.with_ymd_and_hms(2014, 3, 14, 0, 0, 0).unwrap()),
            last_modified: None,
            source: "arin".into(),
            status: None,
        }
    }

    #[test]
    fn test_records_whois_layout() {
        let text = records(&[record()]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "inetnum:       8.8.8.0/24");
        assert_eq!(lines[2], "descr:         Google LLC");
        assert_eq!(lines[3], "descr:         Public DNS");
        assert!(text.contains("created:       2014-03-14\n"));
        assert!(text.ends_with("source:        ARIN\n"));
        assert!(!text.contains("mnt-by"));
    }

    #[test]
    fn test_records_empty() {
        assert_eq!(records(&[]), "No matching blocks.\n");
    }

    #[test]
    fn test_stats_ends_with_total() {
        let text = stats(&Stats {
            total: 3,
            by_source: vec![
                SourceCount { source: "ripe".into(), count: 2 },
                SourceCount { source: "arin".into(), count: 1 },
            ],
        });
        assert!(text.starts_with("ripe"));
        assert!(text.lines().last().unwrap().starts_with("total"));
    }

    #[test]
    fn test_summary_lists_failures() {
        let mut ok = FileReport::new("ripe.db.inetnum.gz", Source::Ripe);
        ok.records_emitted = 10;
        let run = RunSummary {
            started_at: Utc::now(),
            duration: Duration::from_millis(1500),
            files: vec![
                ok,
                FileReport::failed("lacnic.db.gz", Source::Lacnic, "invalid gzip header"),
            ],
            rows_written: 10,
            batches_committed: 1,
        };

        let text = summary(&run);
        assert!(text.contains("lacnic.db.gz: invalid gzip header"));
        assert!(text.contains("10 rows in 1 batches, 1.5s"));
    }

    #[test]
    fn test_json_output() {
        let text = json(&[record()]).unwrap();
        assert!(text.contains("\"inetnum\": \"8.8.8.0/24\""));
    }
}
