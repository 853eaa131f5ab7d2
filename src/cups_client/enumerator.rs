use super::models::{Destination, PrinterType};

/// Collects destinations from an enumeration into an owned list.
///
/// A destination is kept when `(dest_type & mask) == printer_type`.
/// Discovery order is preserved.
pub struct DestinationEnumerator {
    printer_type: PrinterType,
    mask: PrinterType,
    dests: Vec<Destination>,
}

impl DestinationEnumerator {
    pub fn new(printer_type: PrinterType, mask: PrinterType) -> Self {
        DestinationEnumerator { printer_type, mask, dests: Vec::new() }
    }

    /// Drains `dests` completely and returns the accepted destinations.
    pub fn enumerate<I>(mut self, dests: I) -> Vec<Destination>
    where
        I: IntoIterator<Item = Destination>,
    {
        for dest in dests {
            self.store_dest(dest);
        }
        self.dests
    }

    fn store_dest(&mut self, dest: Destination) {
        if dest.printer_type & self.mask == self.printer_type {
            self.dests.push(dest);
        }
    }
}
