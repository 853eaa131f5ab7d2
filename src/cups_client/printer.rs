use std::rc::Rc;

use super::error::CupsError;
use super::models::{Destination, PrinterStatus, PrinterType};
use super::transport::SpoolerHandle;

/// A destination bound to the print server handle it was read from.
pub struct CupsPrinter<H: SpoolerHandle> {
    destination: Destination,
    handle: Rc<H>,
}

impl<H: SpoolerHandle> CupsPrinter<H> {
    pub fn new(handle: Rc<H>, destination: Destination) -> Self {
        CupsPrinter { destination, handle }
    }

    pub fn name(&self) -> &str {
        &self.destination.name
    }

    pub fn is_default(&self) -> bool {
        self.destination.is_default
    }

    pub fn printer_type(&self) -> PrinterType {
        self.destination.printer_type
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.destination.option(key)
    }

    pub fn info(&self) -> &str {
        self.option("printer-info").unwrap_or_default()
    }

    pub fn location(&self) -> &str {
        self.option("printer-location").unwrap_or_default()
    }

    pub fn make_and_model(&self) -> &str {
        self.option("printer-make-and-model").unwrap_or_default()
    }

    pub fn uri(&self) -> Option<&str> {
        self.option("printer-uri-supported")
    }

    /// Shared unless the server says otherwise.
    pub fn is_shared(&self) -> bool {
        match self.option("printer-is-shared") {
            Some(value) => value.eq_ignore_ascii_case("true"),
            None => !self.printer_type().contains(PrinterType::NOT_SHARED),
        }
    }

    pub fn supports_color(&self) -> bool {
        self.printer_type().contains(PrinterType::COLOR)
    }

    pub fn supports_duplex(&self) -> bool {
        self.printer_type().contains(PrinterType::DUPLEX)
    }

    /// Queries the current status of this printer over the bound handle.
    pub fn status(&self) -> Result<PrinterStatus, CupsError> {
        self.handle.printer_status(self.name())
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }
}

impl<H: SpoolerHandle> std::fmt::Debug for CupsPrinter<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CupsPrinter").field("destination", &self.destination).finish()
    }
}
