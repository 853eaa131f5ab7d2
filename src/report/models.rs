use ipp::model::{JobState, PrinterState};
use serde_derive::Serialize;

use crate::cups_client::models::{CupsJob, PrinterReason, PrinterStatus, QueueStatus, ReasonSeverity};
use crate::cups_client::printer::CupsPrinter;
use crate::cups_client::transport::SpoolerHandle;

// //////// //
// Printers //
// //////// //

#[derive(Debug, Serialize)]
pub struct PrinterReport {
    pub name: String,
    pub is_default: bool,
    pub info: String,
    pub location: String,
    pub make_and_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub shared: bool,
    pub color: bool,
    pub duplex: bool,
}

impl<H: SpoolerHandle> From<&CupsPrinter<H>> for PrinterReport {
    fn from(printer: &CupsPrinter<H>) -> Self {
        PrinterReport {
            name: printer.destination().full_name(),
            is_default: printer.is_default(),
            info: printer.info().to_string(),
            location: printer.location().to_string(),
            make_and_model: printer.make_and_model().to_string(),
            uri: printer.uri().map(str::to_string),
            shared: printer.is_shared(),
            color: printer.supports_color(),
            duplex: printer.supports_duplex(),
        }
    }
}

// ////// //
// Status //
// ////// //

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrinterStateReport {
    Idle,
    Processing,
    Stopped,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeverityReport {
    Report,
    Warning,
    Error,
}

#[derive(Debug, Serialize)]
pub struct ReasonReport {
    pub reason: String,
    pub severity: SeverityReport,
}

#[derive(Debug, Serialize)]
pub struct PrinterStatusReport {
    pub name: String,
    pub description: String,
    pub state: PrinterStateReport,
    pub message: String,
    pub reasons: Vec<ReasonReport>,
    pub accepting_jobs: bool,
    pub queued_job_count: i32,
}

impl From<&PrinterReason> for ReasonReport {
    fn from(reason: &PrinterReason) -> Self {
        ReasonReport {
            reason: reason.reason.clone(),
            severity: match reason.severity {
                ReasonSeverity::Report => SeverityReport::Report,
                ReasonSeverity::Warning => SeverityReport::Warning,
                ReasonSeverity::Error => SeverityReport::Error,
            },
        }
    }
}

impl From<&PrinterStatus> for PrinterStatusReport {
    fn from(status: &PrinterStatus) -> Self {
        PrinterStatusReport {
            name: status.printer_id.clone(),
            description: status.description.clone(),
            state: match status.state {
                PrinterState::Idle => PrinterStateReport::Idle,
                PrinterState::Processing => PrinterStateReport::Processing,
                PrinterState::Stopped => PrinterStateReport::Stopped,
            },
            message: status.message.clone(),
            reasons: status.reasons.iter().map(ReasonReport::from).collect(),
            accepting_jobs: status.accepting_jobs,
            queued_job_count: status.queued_job_count,
        }
    }
}

// //// //
// Jobs //
// //// //

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStateReport {
    Pending,
    Held,
    Processing,
    Stopped,
    Canceled,
    Aborted,
    Completed,
}

#[derive(Debug, Serialize)]
pub struct JobReport {
    pub id: i32,
    pub name: String,
    pub state: JobStateReport,
    pub reasons: Vec<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<i32>,
    pub created: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_started: Option<String>,
}

impl From<&CupsJob> for JobReport {
    fn from(job: &CupsJob) -> Self {
        JobReport {
            id: job.id,
            name: job.document_name.clone(),
            state: match job.state {
                JobState::Pending => JobStateReport::Pending,
                JobState::PendingHeld => JobStateReport::Held,
                JobState::Processing => JobStateReport::Processing,
                JobState::ProcessingStopped => JobStateReport::Stopped,
                JobState::Canceled => JobStateReport::Canceled,
                JobState::Aborted => JobStateReport::Aborted,
                JobState::Completed => JobStateReport::Completed,
            },
            reasons: job.state_reasons.clone(),
            message: job.state_message.clone(),
            pages: job.current_pages,
            created: job.created.to_rfc3339(),
            processing_started: job.processing_started.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueueStatusReport {
    pub printer: PrinterStatusReport,
    pub jobs: Vec<JobReport>,
}

impl From<&QueueStatus> for QueueStatusReport {
    fn from(queue: &QueueStatus) -> Self {
        QueueStatusReport {
            printer: PrinterStatusReport::from(&queue.printer_status),
            jobs: queue.jobs.iter().map(JobReport::from).collect(),
        }
    }
}
