//! Status report for `up` and `dl`
//!
//! The four ChangeRecord fields are printed for every outcome, failures
//! included, so scripts can always parse the report before looking at the
//! exit code.

use serde::Serialize;

use s3sum_core::{ChangeRecord, ExitCodes, Status, TransferError};

use super::Formatter;

/// Serializable view of a finished transfer
#[derive(Debug, Serialize)]
pub struct StatusReport<'a> {
    pub status: Status,
    pub dry_run: bool,
    #[serde(flatten)]
    pub record: &'a ChangeRecord,
}

impl std::fmt::Display for StatusReport<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.record.fmt(f)
    }
}

/// Print the report and any error, and return the process exit code
pub fn report_outcome(
    formatter: &Formatter,
    outcome: &Result<ChangeRecord, TransferError>,
    dry_run: bool,
    codes: &ExitCodes,
) -> i32 {
    let status = Status::of(outcome);
    let record = match outcome {
        Ok(record) => record,
        Err(e) => &e.record,
    };

    let failure = outcome.as_ref().err().map(|e| {
        tracing::debug!(error = ?e.source, "transfer failed");
        e.to_string()
    });

    formatter.report(
        &StatusReport {
            status,
            dry_run,
            record,
        },
        failure.as_deref(),
    );

    codes.code(status)
}
