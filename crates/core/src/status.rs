//! Outcome status and its exit code mapping
//!
//! Every transfer ends in exactly one of three states. Operators may choose
//! the numeric code for each, but not merge them.

use serde::{Deserialize, Serialize};

use crate::detect::ChangeRecord;
use crate::error::{Error, Result};
use crate::transfer::TransferError;

/// Three-way outcome of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Both sides already held the same content
    Unchanged,
    /// Content differed (and was transferred unless dry-run)
    Changed,
    /// The check or transfer failed
    Failed,
}

impl Status {
    /// Classify a transfer outcome; failure wins over any recorded change
    pub fn of(outcome: &std::result::Result<ChangeRecord, TransferError>) -> Self {
        match outcome {
            Ok(record) if record.changed => Status::Changed,
            Ok(_) => Status::Unchanged,
            Err(_) => Status::Failed,
        }
    }
}

/// Exit codes for each status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitCodes {
    #[serde(default = "default_ok")]
    pub ok: i32,
    #[serde(default = "default_changed")]
    pub changed: i32,
    #[serde(default = "default_failed")]
    pub failed: i32,
}

fn default_ok() -> i32 {
    0
}

fn default_changed() -> i32 {
    254
}

fn default_failed() -> i32 {
    255
}

impl Default for ExitCodes {
    fn default() -> Self {
        Self {
            ok: default_ok(),
            changed: default_changed(),
            failed: default_failed(),
        }
    }
}

impl ExitCodes {
    /// Exit code for a status
    pub const fn code(&self, status: Status) -> i32 {
        match status {
            Status::Unchanged => self.ok,
            Status::Changed => self.changed,
            Status::Failed => self.failed,
        }
    }

    /// Reject mappings a shell cannot observe or that merge two statuses
    pub fn validate(&self) -> Result<()> {
        for code in [self.ok, self.changed, self.failed] {
            if !(0..=255).contains(&code) {
                return Err(Error::Config(format!(
                    "exit code {code} is outside 0..=255"
                )));
            }
        }

        if self.ok == self.changed || self.ok == self.failed || self.changed == self.failed {
            return Err(Error::Config(format!(
                "exit codes must be distinct (ok={}, changed={}, failed={})",
                self.ok, self.changed, self.failed
            )));
        }

        Ok(())
    }
}
