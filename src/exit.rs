//! Process exit outcome for a run.

use std::process::ExitCode;

use crate::harvest::HarvestReport;

/// How a run ended, as seen by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// Every link was downloaded or skipped as an expected outcome.
    Success,
    /// Some links failed, some were downloaded.
    Partial,
    /// The run aborted, or links failed and nothing was downloaded.
    Failure,
}

impl ProcessExit {
    /// Numeric exit code: 0, 2, or 1.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Partial => 2,
            Self::Failure => 1,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

/// Determines the exit outcome from downloaded and failed link counts.
#[must_use]
pub fn determine_exit_outcome(downloaded: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if downloaded > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

/// Determines the exit outcome of a completed run.
#[must_use]
pub fn exit_for_report(report: &HarvestReport) -> ProcessExit {
    determine_exit_outcome(report.downloaded(), report.failed())
}
