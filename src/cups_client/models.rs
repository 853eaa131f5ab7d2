use std::collections::BTreeMap;
use std::ops::{BitAnd, BitOr};

use chrono::{DateTime, Utc};
use ipp::model::{JobState, PrinterState};

/// Printer type bits as reported in the CUPS `printer-type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PrinterType(u32);

impl PrinterType {
    pub const LOCAL: Self = Self(0x0000_0000);
    pub const COLOR: Self = Self(0x0000_0008);
    pub const DUPLEX: Self = Self(0x0000_0010);
    pub const FAX: Self = Self(0x0004_0000);
    pub const NOT_SHARED: Self = Self(0x0020_0000);
    pub const DISCOVERED: Self = Self(0x0100_0000);
    pub const SCANNER: Self = Self(0x0200_0000);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True when every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PrinterType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for PrinterType {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// A printer destination known to the print server.
///
/// Destinations are move-only. They go from the enumeration into the
/// [`CupsPrinter`](super::printer::CupsPrinter) that wraps them.
#[derive(Debug, PartialEq, Eq)]
pub struct Destination {
    pub name: String,
    pub instance: Option<String>,
    pub is_default: bool,
    pub printer_type: PrinterType,
    pub options: BTreeMap<String, String>,
}

impl Destination {
    pub fn new(name: impl Into<String>, printer_type: PrinterType) -> Self {
        Destination {
            name: name.into(),
            instance: None,
            is_default: false,
            printer_type,
            options: BTreeMap::new(),
        }
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// `name` or `name/instance`, the way CUPS prints destinations.
    pub fn full_name(&self) -> String {
        match &self.instance {
            Some(instance) => format!("{}/{}", self.name, instance),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonSeverity {
    Report,
    Warning,
    Error,
}

/// A single entry of `printer-state-reasons`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterReason {
    pub reason: String,
    pub severity: ReasonSeverity,
}

impl PrinterReason {
    /// Splits a keyword such as `media-empty-error` into reason and severity.
    /// Returns `None` for the `none` keyword.
    pub fn parse(keyword: &str) -> Option<Self> {
        let keyword = keyword.trim();
        if keyword.is_empty() || keyword == "none" {
            return None;
        }

        let (reason, severity) = if let Some(reason) = keyword.strip_suffix("-report") {
            (reason, ReasonSeverity::Report)
        } else if let Some(reason) = keyword.strip_suffix("-warning") {
            (reason, ReasonSeverity::Warning)
        } else if let Some(reason) = keyword.strip_suffix("-error") {
            (reason, ReasonSeverity::Error)
        } else {
            (keyword, ReasonSeverity::Error)
        };

        Some(PrinterReason { reason: reason.to_string(), severity })
    }
}

#[derive(Debug, Clone)]
pub struct PrinterStatus {
    pub printer_id: String,
    pub description: String,
    pub state: PrinterState,
    pub message: String,
    pub reasons: Vec<PrinterReason>,
    pub accepting_jobs: bool,
    pub queued_job_count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhichJobs {
    Completed,
    Processing,
}

impl WhichJobs {
    /// The `which-jobs` keyword sent to the server.
    pub fn keyword(self) -> &'static str {
        match self {
            WhichJobs::Completed => "completed",
            WhichJobs::Processing => "not-completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CupsJob {
    pub id: i32,
    pub printer_id: String,
    pub document_name: String,
    pub state: JobState,
    pub state_reasons: Vec<String>,
    pub state_message: String,
    pub current_pages: Option<i32>,
    pub created: DateTime<Utc>,
    pub processing_started: Option<DateTime<Utc>>,
}

/// Status of one printer together with its most recent jobs.
#[derive(Debug, Clone)]
pub struct QueueStatus {
    pub printer_status: PrinterStatus,
    pub jobs: Vec<CupsJob>,
}
