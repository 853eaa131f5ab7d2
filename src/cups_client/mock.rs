//! Scripted print server used by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Once;
use std::time::Duration;

use chrono::DateTime;
use ipp::model::{JobState, PrinterState};
use log::{Level, LevelFilter, Log, Metadata, Record};

use super::error::{CupsError, IPP_STATUS_NOT_FOUND, IPP_STATUS_SERVICE_UNAVAILABLE};
use super::models::{CupsJob, Destination, PrinterStatus, PrinterType, WhichJobs};
use super::transport::{Destinations, HttpEncryption, ServerTarget, SpoolerHandle, Transport};

pub type SharedServer = Rc<RefCell<MockServer>>;

pub struct MockServer {
    pub reachable: bool,
    pub enum_fails: bool,
    pub destinations: Vec<(String, PrinterType)>,
    /// Printer id to (completed, processing) job counts.
    pub printers: BTreeMap<String, (usize, usize)>,
    pub failing_jobs: Vec<(String, WhichJobs)>,
}

impl MockServer {
    pub fn new() -> Self {
        MockServer {
            reachable: true,
            enum_fails: false,
            destinations: Vec::new(),
            printers: BTreeMap::new(),
            failing_jobs: Vec::new(),
        }
    }

    pub fn with_destination(mut self, name: &str, printer_type: PrinterType) -> Self {
        self.destinations.push((name.to_string(), printer_type));
        self
    }

    pub fn with_printer(mut self, name: &str, completed: usize, processing: usize) -> Self {
        self.printers.insert(name.to_string(), (completed, processing));
        self
    }

    pub fn with_failing_jobs(mut self, name: &str, which: WhichJobs) -> Self {
        self.failing_jobs.push((name.to_string(), which));
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    pub fn failing_enumeration(mut self) -> Self {
        self.enum_fails = true;
        self
    }

    pub fn shared(self) -> SharedServer {
        Rc::new(RefCell::new(self))
    }
}

#[derive(Clone, Default)]
pub struct Calls {
    pub dial: Rc<Cell<usize>>,
    pub enum_dests: Rc<Cell<usize>>,
    pub named_dest: Rc<Cell<usize>>,
    pub printer_status: Rc<Cell<usize>>,
    pub jobs: Rc<Cell<usize>>,
    pub dialed: Rc<RefCell<Vec<ServerTarget>>>,
    pub job_limits: Rc<RefCell<Vec<(WhichJobs, usize)>>>,
}

fn bump(counter: &Rc<Cell<usize>>) {
    counter.set(counter.get() + 1);
}

fn unavailable() -> CupsError {
    CupsError::Connect {
        host: "mock".to_string(),
        port: 631,
        source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
    }
}

fn not_found(operation: &'static str) -> CupsError {
    CupsError::Status { operation, code: IPP_STATUS_NOT_FOUND, message: "ClientErrorNotFound".to_string() }
}

pub struct MockTransport {
    server: SharedServer,
    calls: Calls,
}

impl MockTransport {
    pub fn new(server: SharedServer) -> Self {
        MockTransport { server, calls: Calls::default() }
    }

    pub fn calls(&self) -> Calls {
        self.calls.clone()
    }
}

impl Transport for MockTransport {
    type Handle = MockHandle;

    fn dial(
        &self,
        target: &ServerTarget,
        _encryption: HttpEncryption,
        _blocking: bool,
        _timeout: Duration,
    ) -> Result<MockHandle, CupsError> {
        bump(&self.calls.dial);
        self.calls.dialed.borrow_mut().push(target.clone());
        if !self.server.borrow().reachable {
            return Err(unavailable());
        }
        Ok(MockHandle::new(self.server.clone(), self.calls.clone()))
    }
}

pub struct MockHandle {
    server: SharedServer,
    calls: Calls,
}

impl MockHandle {
    pub fn new(server: SharedServer, calls: Calls) -> Self {
        MockHandle { server, calls }
    }
}

impl SpoolerHandle for MockHandle {
    fn enum_dests(
        &self,
        _printer_type: PrinterType,
        _mask: PrinterType,
        _timeout: Duration,
    ) -> Result<Destinations<'_>, CupsError> {
        bump(&self.calls.enum_dests);
        let server = self.server.borrow();
        if !server.reachable {
            return Err(unavailable());
        }
        if server.enum_fails {
            return Err(CupsError::Status {
                operation: "CUPS-Get-Printers",
                code: IPP_STATUS_SERVICE_UNAVAILABLE,
                message: "ServerErrorServiceUnavailable".to_string(),
            });
        }
        let dests: Vec<Destination> = server
            .destinations
            .iter()
            .map(|(name, printer_type)| Destination::new(name.as_str(), *printer_type))
            .collect();
        Ok(Box::new(dests.into_iter()))
    }

    fn get_named_dest(&self, name: &str, instance: Option<&str>) -> Result<Option<Destination>, CupsError> {
        bump(&self.calls.named_dest);
        let server = self.server.borrow();
        if !server.reachable {
            return Err(unavailable());
        }
        Ok(server.destinations.iter().find(|(n, _)| n == name).map(|(n, printer_type)| {
            let mut dest = Destination::new(n.as_str(), *printer_type);
            dest.instance = instance.map(str::to_string);
            dest
        }))
    }

    fn printer_status(&self, printer_id: &str) -> Result<PrinterStatus, CupsError> {
        bump(&self.calls.printer_status);
        let server = self.server.borrow();
        if !server.reachable {
            return Err(unavailable());
        }
        if !server.printers.contains_key(printer_id) {
            return Err(not_found("Get-Printer-Attributes"));
        }
        Ok(PrinterStatus {
            printer_id: printer_id.to_string(),
            description: format!("{printer_id} description"),
            state: PrinterState::Idle,
            message: String::new(),
            reasons: Vec::new(),
            accepting_jobs: true,
            queued_job_count: 0,
        })
    }

    /// Ignores `limit` like a server that does not honour it would.
    fn jobs(&self, printer_id: &str, limit: usize, which: WhichJobs) -> Result<Vec<CupsJob>, CupsError> {
        bump(&self.calls.jobs);
        self.calls.job_limits.borrow_mut().push((which, limit));
        let server = self.server.borrow();
        if !server.reachable {
            return Err(unavailable());
        }
        if server.failing_jobs.iter().any(|(id, w)| id == printer_id && *w == which) {
            return Err(not_found("Get-Jobs"));
        }
        let (completed, processing) = server.printers.get(printer_id).copied().ok_or_else(|| not_found("Get-Jobs"))?;
        let (count, state, offset) = match which {
            WhichJobs::Completed => (completed, JobState::Completed, 0),
            WhichJobs::Processing => (processing, JobState::Processing, 1000),
        };

        Ok((0..count)
            .map(|i| {
                let id = (offset + i) as i32;
                CupsJob {
                    id,
                    printer_id: printer_id.to_string(),
                    document_name: format!("doc-{id}"),
                    state,
                    state_reasons: Vec::new(),
                    state_message: String::new(),
                    current_pages: None,
                    created: DateTime::from_timestamp(1_700_000_000 + i as i64, 0).unwrap_or_default(),
                    processing_started: None,
                }
            })
            .collect())
    }
}

// /////////////// //
// Captured output //
// /////////////// //

thread_local! {
    static CAPTURED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            CAPTURED.with(|captured| captured.borrow_mut().push(record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INIT: Once = Once::new();

/// Routes warnings and errors logged on the current thread into a buffer.
pub fn capture_warnings() {
    INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Warn);
        }
    });
    CAPTURED.with(|captured| captured.borrow_mut().clear());
}

pub fn captured_warnings() -> Vec<String> {
    CAPTURED.with(|captured| captured.borrow().clone())
}
