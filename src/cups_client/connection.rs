use std::rc::Rc;
use std::time::Duration;

use log::{debug, warn};
use url::Url;

use crate::ipp_client::transport::IppTransport;

use super::enumerator::DestinationEnumerator;
use super::error::{CupsError, IPP_STATUS_OK};
use super::models::{PrinterStatus, PrinterType, QueueStatus, WhichJobs};
use super::printer::CupsPrinter;
use super::transport::{HttpEncryption, ServerTarget, SpoolerHandle, Transport};

/// Timeout for connecting and for enumerating destinations.
pub const TIMEOUT: Duration = Duration::from_millis(3000);

/// The number of in-progress jobs retrieved for a queue. Jobs beyond this
/// number don't get updates until earlier ones finish.
pub const PROCESSING_JOBS_LIMIT: usize = 10;

/// The number of completed jobs retrieved for a queue. One update is enough
/// to see the final state of a job, the extra ones cover jobs that finished
/// between two polls.
pub const COMPLETED_JOBS_LIMIT: usize = 3;

/// Discovered-only destinations can't report capabilities until they are
/// added locally, so they are skipped together with fax and scanner devices.
const EXCLUDED_TYPES: PrinterType =
    PrinterType::from_bits(PrinterType::FAX.bits() | PrinterType::SCANNER.bits() | PrinterType::DISCOVERED.bits());

/// A lazily dialed connection to a print server.
///
/// The handle is opened by the first operation that needs it and reused
/// until the connection is dropped. A failed dial leaves the connection
/// unconnected, so the next operation dials again.
pub struct Connection<T: Transport = IppTransport> {
    print_server_url: Option<Url>,
    encryption: HttpEncryption,
    blocking: bool,
    transport: T,
    handle: Option<Rc<T::Handle>>,
    last_error: u16,
    last_error_message: String,
}

impl<T: Transport> Connection<T> {
    pub fn new(print_server_url: Option<Url>, encryption: HttpEncryption, blocking: bool, transport: T) -> Self {
        Connection {
            print_server_url,
            encryption,
            blocking,
            transport,
            handle: None,
            last_error: IPP_STATUS_OK,
            last_error_message: String::new(),
        }
    }

    /// Dials the print server unless a handle is already open.
    pub fn connect(&mut self) -> bool {
        self.connected_handle().is_some()
    }

    /// Lists the printers registered with the server. Connection and
    /// enumeration failures are logged and give an empty list.
    pub fn get_dests(&mut self) -> Vec<CupsPrinter<T::Handle>> {
        let Some(handle) = self.connected_handle() else {
            warn!("CUPS connection failed");
            return Vec::new();
        };

        let enumerator = DestinationEnumerator::new(PrinterType::LOCAL, EXCLUDED_TYPES);
        let dests = match handle.enum_dests(PrinterType::LOCAL, EXCLUDED_TYPES, TIMEOUT) {
            Ok(dests) => enumerator.enumerate(dests),
            Err(e) => {
                warn!("Enumerating printers failed: {e}");
                self.set_error(&e);
                return Vec::new();
            }
        };
        self.clear_error();

        debug!("Found {} printers", dests.len());
        dests.into_iter().map(|dest| CupsPrinter::new(handle.clone(), dest)).collect()
    }

    /// Looks up a printer by `name` or `name/instance` without listing all destinations.
    pub fn get_printer(&mut self, name: &str) -> Option<CupsPrinter<T::Handle>> {
        let handle = self.connected_handle()?;

        let (name, instance) = match name.split_once('/') {
            Some((name, instance)) => (name, Some(instance)),
            None => (name, None),
        };

        match self.record(handle.get_named_dest(name, instance)) {
            Ok(dest) => dest.map(|dest| CupsPrinter::new(handle, dest)),
            Err(e) => {
                warn!("Could not look up printer {name}: {e}");
                None
            }
        }
    }

    /// Retrieves the status and recent jobs of every printer in
    /// `printer_ids`, in order, and appends them to `queues`.
    ///
    /// Any failure returns `false` and leaves `queues` untouched, including
    /// entries already built for earlier ids.
    pub fn get_jobs<S: AsRef<str>>(&mut self, printer_ids: &[S], queues: &mut Vec<QueueStatus>) -> bool {
        let Some(handle) = self.connected_handle() else {
            warn!("Could not establish connection to CUPS");
            return false;
        };

        let mut temp_queues = Vec::with_capacity(printer_ids.len());
        for id in printer_ids {
            match self.queue_status(handle.as_ref(), id.as_ref()) {
                Some(queue_status) => temp_queues.push(queue_status),
                None => return false,
            }
        }

        queues.extend(temp_queues);
        true
    }

    pub fn get_printer_status(&mut self, printer_id: &str) -> Option<PrinterStatus> {
        let Some(handle) = self.connected_handle() else {
            warn!("Could not establish connection to CUPS to query {printer_id}");
            return None;
        };

        match self.record(handle.printer_status(printer_id)) {
            Ok(status) => Some(status),
            Err(e) => {
                warn!("Could not retrieve printer status for {printer_id}: {e}");
                None
            }
        }
    }

    pub fn server_name(&self) -> String {
        self.print_server_url
            .as_ref()
            .and_then(|url| url.host_str())
            .unwrap_or_default()
            .to_string()
    }

    /// IPP status code of the most recent operation, `0` when it succeeded.
    pub fn last_error(&self) -> u16 {
        self.last_error
    }

    pub fn last_error_message(&self) -> &str {
        &self.last_error_message
    }

    fn queue_status(&mut self, handle: &T::Handle, id: &str) -> Option<QueueStatus> {
        let printer_status = match self.record(handle.printer_status(id)) {
            Ok(status) => status,
            Err(e) => {
                warn!("Could not retrieve printer status for {id}: {e}");
                return None;
            }
        };

        let mut jobs = match self.record(handle.jobs(id, COMPLETED_JOBS_LIMIT, WhichJobs::Completed)) {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!("Could not get completed jobs for {id}: {e}");
                return None;
            }
        };
        jobs.truncate(COMPLETED_JOBS_LIMIT);

        let mut processing = match self.record(handle.jobs(id, PROCESSING_JOBS_LIMIT, WhichJobs::Processing)) {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!("Could not get in progress jobs for {id}: {e}");
                return None;
            }
        };
        processing.truncate(PROCESSING_JOBS_LIMIT);
        jobs.append(&mut processing);

        Some(QueueStatus { printer_status, jobs })
    }

    fn connected_handle(&mut self) -> Option<Rc<T::Handle>> {
        if let Some(handle) = &self.handle {
            return Some(handle.clone());
        }

        let target = match &self.print_server_url {
            Some(url) => match ServerTarget::from_url(url) {
                Ok(target) => target,
                Err(e) => {
                    warn!("{e}");
                    self.set_error(&e);
                    return None;
                }
            },
            None => ServerTarget::system_default(),
        };

        debug!("Connecting to print server {}:{}", target.host, target.port);
        match self.transport.dial(&target, self.encryption, self.blocking, TIMEOUT) {
            Ok(handle) => {
                let handle = Rc::new(handle);
                self.handle = Some(handle.clone());
                self.clear_error();
                Some(handle)
            }
            Err(e) => {
                warn!("{e}");
                self.set_error(&e);
                None
            }
        }
    }

    fn record<R>(&mut self, result: Result<R, CupsError>) -> Result<R, CupsError> {
        match &result {
            Ok(_) => self.clear_error(),
            Err(e) => self.set_error(e),
        }
        result
    }

    fn set_error(&mut self, error: &CupsError) {
        self.last_error = error.status_code();
        self.last_error_message = error.to_string();
    }

    fn clear_error(&mut self) {
        self.last_error = IPP_STATUS_OK;
        self.last_error_message = String::new();
    }
}
