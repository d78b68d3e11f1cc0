//! Turns spreadsheet rows into [`Job`] records.
//!
//! Column 0 is the company, column 1 the title and column 2 the
//! application link. Missing cells fall back to placeholders and rows
//! without a company or title are dropped.

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::models::{Job, LINK_PLACEHOLDER, UNKNOWN_COMPANY, UNKNOWN_POSITION};

const DELIMITER: u8 = b',';

/// Parse CSV text (header row first) into jobs. Never fails: each line is
/// decoded on its own, so a malformed row is skipped without touching the
/// rows after it.
pub fn parse_jobs_csv(text: &str) -> Vec<Job> {
    let mut jobs = Vec::new();
    for (index, line) in text.trim().split('\n').enumerate().skip(1) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            continue;
        }

        let columns = match parse_line(line) {
            Ok(columns) => columns,
            Err(e) => {
                tracing::debug!(row = index, error = %e, "Skipping malformed CSV row");
                continue;
            }
        };

        if columns.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        if let Some(job) = job_from_columns(&columns) {
            jobs.push(job);
        }
    }

    jobs
}

fn parse_line(line: &str) -> csv::Result<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(line.as_bytes());

    let mut record = StringRecord::new();
    reader.read_record(&mut record)?;
    Ok(record.iter().map(str::to_string).collect())
}

/// Map positional cells onto a job. Returns `None` when the company or the
/// title reduces to its placeholder.
pub fn job_from_columns<S: AsRef<str>>(columns: &[S]) -> Option<Job> {
    let cell = |i: usize, placeholder: &str| -> String {
        let value = columns
            .get(i)
            .map(|c| strip_quotes(c.as_ref()))
            .unwrap_or_default();
        if value.is_empty() {
            placeholder.to_string()
        } else {
            value.to_string()
        }
    };

    let job = Job {
        company: cell(0, UNKNOWN_COMPANY),
        job_title: cell(1, UNKNOWN_POSITION),
        link: cell(2, LINK_PLACEHOLDER),
    };

    if job.company == UNKNOWN_COMPANY || job.job_title == UNKNOWN_POSITION {
        None
    } else {
        Some(job)
    }
}

fn strip_quotes(value: &str) -> &str {
    value.trim().trim_matches('"').trim()
}
