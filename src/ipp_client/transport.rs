use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use ipp::prelude::*;
use log::debug;
use snafu::ResultExt;
use url::Url;

use crate::cups_client::error::{ConnectSnafu, CupsError, IPP_STATUS_NOT_FOUND};
use crate::cups_client::models::{CupsJob, Destination, PrinterStatus, PrinterType, WhichJobs};
use crate::cups_client::transport::{Destinations, HttpEncryption, ServerTarget, SpoolerHandle, Transport};

use super::parse::{destination_from, job_from, printer_status_from, AttributeGroup, JOB_ATTRIBUTES, PRINTER_ATTRIBUTES};
use super::request::{add_operation_attribute, new_ipp_request, requested_attributes, send_ipp_request};

/// Dials CUPS servers over IPP.
#[derive(Debug, Clone, Default)]
pub struct IppTransport {
    ignore_tls_errors: bool,
    username: String,
    password: String,
}

impl IppTransport {
    pub fn new(ignore_tls_errors: bool, username: &str, password: &str) -> Self {
        IppTransport {
            ignore_tls_errors,
            username: username.to_owned(),
            password: password.to_owned(),
        }
    }

    fn requesting_user_name(&self) -> String {
        if !self.username.is_empty() {
            return self.username.clone();
        }
        std::env::var("USER")
            .or_else(|_| std::env::var("LOGNAME"))
            .unwrap_or_else(|_| "anonymous".to_string())
    }
}

impl Transport for IppTransport {
    type Handle = IppHandle;

    fn dial(
        &self,
        target: &ServerTarget,
        encryption: HttpEncryption,
        blocking: bool,
        timeout: Duration,
    ) -> Result<IppHandle, CupsError> {
        probe(target, timeout)?;
        debug!("Print server {}:{} is reachable", target.host, target.port);

        Ok(IppHandle {
            base_url: build_base_url(target, encryption, &self.username, &self.password)?,
            ignore_tls_errors: self.ignore_tls_errors,
            request_timeout: if blocking { None } else { Some(timeout) },
            user_name: self.requesting_user_name(),
        })
    }
}

/// Opens and closes a TCP connection to check that the server answers.
fn probe(target: &ServerTarget, timeout: Duration) -> Result<(), CupsError> {
    let host = target.host.trim_start_matches('[').trim_end_matches(']');
    let addrs = (host, target.port)
        .to_socket_addrs()
        .context(ConnectSnafu { host: &target.host, port: target.port })?;

    let mut last_error = io::Error::new(io::ErrorKind::NotFound, "host has no addresses");
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(_) => return Ok(()),
            Err(e) => last_error = e,
        }
    }
    Err(last_error).context(ConnectSnafu { host: &target.host, port: target.port })
}

pub fn build_base_url(
    target: &ServerTarget,
    encryption: HttpEncryption,
    username: &str,
    password: &str,
) -> Result<Url, CupsError> {
    let host = if target.host.contains(':') && !target.host.starts_with('[') {
        format!("[{}]", target.host)
    } else {
        target.host.clone()
    };
    let raw = format!("{}://{}:{}/", encryption.scheme(), host, target.port);
    let invalid = |message: &str| CupsError::InvalidUri { uri: raw.clone(), message: message.to_string() };

    let mut url = Url::parse(&raw).map_err(|e| invalid(&e.to_string()))?;
    if !username.is_empty() && !password.is_empty() {
        url.set_username(username).map_err(|_| invalid("cannot carry a username"))?;
        url.set_password(Some(password)).map_err(|_| invalid("cannot carry a password"))?;
    }
    Ok(url)
}

/// An open connection to a CUPS server.
pub struct IppHandle {
    base_url: Url,
    ignore_tls_errors: bool,
    request_timeout: Option<Duration>,
    user_name: String,
}

impl IppHandle {
    fn to_uri(url: &Url) -> Result<Uri, CupsError> {
        url.as_str().parse::<Uri>().map_err(|e| CupsError::InvalidUri {
            uri: url.to_string(),
            message: e.to_string(),
        })
    }

    fn server_uri(&self) -> Result<Uri, CupsError> {
        Self::to_uri(&self.base_url)
    }

    /// `printers/<id>` under the server URL, with the id kept as one path segment.
    pub fn printer_uri(&self, printer_id: &str) -> Result<Uri, CupsError> {
        let invalid = |message: String| CupsError::InvalidUri { uri: printer_id.to_string(), message };

        let mut url = self.base_url.join("printers/").map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("server URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(printer_id);
        Self::to_uri(&url)
    }

    fn get_printers_request(&self, uri: &Uri, printer_type: PrinterType, mask: PrinterType) -> IppRequestResponse {
        let mut req = new_ipp_request(Operation::CupsGetPrinters, uri, &self.user_name);
        add_operation_attribute(&mut req, "printer-type", IppValue::Enum(printer_type.bits() as i32));
        add_operation_attribute(&mut req, "printer-type-mask", IppValue::Enum(mask.bits() as i32));
        add_operation_attribute(&mut req, "requested-attributes", requested_attributes(PRINTER_ATTRIBUTES));
        req
    }

    fn printer_attributes_request(&self, uri: &Uri) -> IppRequestResponse {
        let mut req = new_ipp_request(Operation::GetPrinterAttributes, uri, &self.user_name);
        add_operation_attribute(&mut req, "requested-attributes", requested_attributes(PRINTER_ATTRIBUTES));
        req
    }

    fn get_jobs_request(&self, uri: &Uri, limit: usize, which: WhichJobs) -> IppRequestResponse {
        let mut req = new_ipp_request(Operation::GetJobs, uri, &self.user_name);
        add_operation_attribute(&mut req, "which-jobs", IppValue::Keyword(which.keyword().to_string()));
        add_operation_attribute(&mut req, "limit", IppValue::Integer(i32::try_from(limit).unwrap_or(i32::MAX)));
        add_operation_attribute(&mut req, "my-jobs", IppValue::Boolean(false));
        add_operation_attribute(&mut req, "requested-attributes", requested_attributes(JOB_ATTRIBUTES));
        req
    }

    fn send(
        &self,
        uri: &Uri,
        req: IppRequestResponse,
        timeout: Option<Duration>,
        operation: &'static str,
    ) -> Result<IppRequestResponse, CupsError> {
        debug!("Sending {operation} to {uri}");
        send_ipp_request(uri, req, self.ignore_tls_errors, timeout, operation)
    }

    fn default_printer_name(&self, timeout: Duration) -> Option<String> {
        let uri = self.server_uri().ok()?;
        let mut req = new_ipp_request(Operation::CupsGetDefault, &uri, &self.user_name);
        add_operation_attribute(&mut req, "requested-attributes", requested_attributes(&["printer-name"]));

        match self.send(&uri, req, Some(timeout), "CUPS-Get-Default") {
            Ok(resp) => resp
                .attributes()
                .groups_of(DelimiterTag::PrinterAttributes)
                .find_map(|group| group.attributes().get("printer-name").map(|attr| attr.value().to_string())),
            Err(e) => {
                debug!("No default printer: {e}");
                None
            }
        }
    }
}

/// A `client-error-not-found` status means there is nothing to return.
fn found<T>(result: Result<T, CupsError>) -> Result<Option<T>, CupsError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(CupsError::Status { code: IPP_STATUS_NOT_FOUND, .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

fn destinations_from<'a>(
    groups: impl IntoIterator<Item = &'a AttributeGroup>,
    default_name: Option<&str>,
) -> Result<Vec<Destination>, CupsError> {
    groups
        .into_iter()
        .map(|attrs| {
            let mut dest = destination_from(attrs)?;
            dest.is_default = default_name == Some(dest.name.as_str());
            Ok(dest)
        })
        .collect()
}

impl SpoolerHandle for IppHandle {
    fn enum_dests(
        &self,
        printer_type: PrinterType,
        mask: PrinterType,
        timeout: Duration,
    ) -> Result<Destinations<'_>, CupsError> {
        let uri = self.server_uri()?;
        let req = self.get_printers_request(&uri, printer_type, mask);

        let resp = self.send(&uri, req, Some(timeout), "CUPS-Get-Printers")?;
        let default_name = self.default_printer_name(timeout);

        let groups = resp.attributes().groups_of(DelimiterTag::PrinterAttributes).map(|group| group.attributes());
        let dests = destinations_from(groups, default_name.as_deref())?;
        Ok(Box::new(dests.into_iter()))
    }

    fn get_named_dest(&self, name: &str, instance: Option<&str>) -> Result<Option<Destination>, CupsError> {
        let uri = self.printer_uri(name)?;
        let req = self.printer_attributes_request(&uri);

        let Some(resp) = found(self.send(&uri, req, self.request_timeout, "Get-Printer-Attributes"))? else {
            return Ok(None);
        };
        let Some(group) = resp.attributes().groups_of(DelimiterTag::PrinterAttributes).next() else {
            return Ok(None);
        };
        let mut dest = destination_from(group.attributes())?;
        dest.instance = instance.map(str::to_string);
        Ok(Some(dest))
    }

    fn printer_status(&self, printer_id: &str) -> Result<PrinterStatus, CupsError> {
        let uri = self.printer_uri(printer_id)?;
        let req = self.printer_attributes_request(&uri);

        let resp = self.send(&uri, req, self.request_timeout, "Get-Printer-Attributes")?;
        let group = resp
            .attributes()
            .groups_of(DelimiterTag::PrinterAttributes)
            .next()
            .ok_or(CupsError::MissingAttribute { attribute: "printer-state" })?;
        printer_status_from(printer_id, group.attributes())
    }

    fn jobs(&self, printer_id: &str, limit: usize, which: WhichJobs) -> Result<Vec<CupsJob>, CupsError> {
        let uri = self.printer_uri(printer_id)?;
        let req = self.get_jobs_request(&uri, limit, which);

        let resp = self.send(&uri, req, self.request_timeout, "Get-Jobs")?;
        resp.attributes()
            .groups_of(DelimiterTag::JobAttributes)
            .take(limit)
            .map(|group| job_from(printer_id, group.attributes()))
            .collect()
    }
}
