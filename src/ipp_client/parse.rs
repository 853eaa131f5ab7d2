use std::collections::HashMap;

use chrono::DateTime;
use ipp::model::{JobState, PrinterState};
use ipp::prelude::*;

use crate::cups_client::error::CupsError;
use crate::cups_client::models::{CupsJob, Destination, PrinterReason, PrinterStatus, PrinterType};

pub type AttributeGroup = HashMap<String, IppAttribute>;

/// Attributes copied into [`Destination::options`].
pub const DESTINATION_OPTIONS: &[&str] = &[
    "printer-info",
    "printer-location",
    "printer-make-and-model",
    "printer-uri-supported",
    "device-uri",
    "printer-is-shared",
    "printer-state",
    "printer-state-reasons",
    "printer-is-accepting-jobs",
];

pub const PRINTER_ATTRIBUTES: &[&str] = &[
    "printer-name",
    "printer-type",
    "printer-info",
    "printer-location",
    "printer-make-and-model",
    "printer-uri-supported",
    "device-uri",
    "printer-is-shared",
    "printer-state",
    "printer-state-message",
    "printer-state-reasons",
    "printer-is-accepting-jobs",
    "queued-job-count",
];

pub const JOB_ATTRIBUTES: &[&str] = &[
    "job-id",
    "job-name",
    "job-state",
    "job-state-reasons",
    "job-state-message",
    "job-media-sheets-completed",
    "job-impressions-completed",
    "time-at-creation",
    "time-at-processing",
];

fn value_to_string(value: &IppValue) -> String {
    match value {
        IppValue::Array(values) => values.iter().map(value_to_string).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

fn text(attrs: &AttributeGroup, name: &str) -> Option<String> {
    value(attrs, name).map(value_to_string)
}

fn strings(attrs: &AttributeGroup, name: &str) -> Vec<String> {
    match value(attrs, name) {
        Some(IppValue::Array(values)) => values.iter().map(value_to_string).collect(),
        Some(single) => vec![value_to_string(single)],
        None => Vec::new(),
    }
}

fn value<'a>(attrs: &'a AttributeGroup, name: &str) -> Option<&'a IppValue> {
    attrs.get(name).map(IppAttribute::value)
}

/// Integer or enum attribute; CUPS sends `printer-type` as either.
fn integer(attrs: &AttributeGroup, name: &str) -> Option<i32> {
    value(attrs, name).and_then(|v| v.as_integer().or_else(|| v.as_enum())).copied()
}

fn boolean(attrs: &AttributeGroup, name: &str) -> Option<bool> {
    value(attrs, name).and_then(IppValue::as_boolean).copied()
}

pub fn destination_from(attrs: &AttributeGroup) -> Result<Destination, CupsError> {
    let name = text(attrs, "printer-name").ok_or(CupsError::MissingAttribute { attribute: "printer-name" })?;
    let printer_type = PrinterType::from_bits(integer(attrs, "printer-type").unwrap_or_default() as u32);

    let mut dest = Destination::new(name, printer_type);
    for option in DESTINATION_OPTIONS {
        if let Some(value) = text(attrs, option) {
            dest.options.insert(option.to_string(), value);
        }
    }
    Ok(dest)
}

pub fn printer_status_from(printer_id: &str, attrs: &AttributeGroup) -> Result<PrinterStatus, CupsError> {
    let state = value(attrs, "printer-state")
        .and_then(IppValue::as_enum)
        .and_then(|v| PrinterState::from_i32(*v))
        .ok_or(CupsError::MissingAttribute { attribute: "printer-state" })?;

    Ok(PrinterStatus {
        printer_id: printer_id.to_string(),
        description: text(attrs, "printer-info").unwrap_or_default(),
        state,
        message: text(attrs, "printer-state-message").unwrap_or_default(),
        reasons: strings(attrs, "printer-state-reasons")
            .iter()
            .filter_map(|keyword| PrinterReason::parse(keyword))
            .collect(),
        accepting_jobs: boolean(attrs, "printer-is-accepting-jobs").unwrap_or(true),
        queued_job_count: integer(attrs, "queued-job-count").unwrap_or_default(),
    })
}

pub fn job_from(printer_id: &str, attrs: &AttributeGroup) -> Result<CupsJob, CupsError> {
    let id = integer(attrs, "job-id").ok_or(CupsError::MissingAttribute { attribute: "job-id" })?;
    let state = value(attrs, "job-state")
        .and_then(IppValue::as_enum)
        .and_then(|v| JobState::from_i32(*v))
        .ok_or(CupsError::MissingAttribute { attribute: "job-state" })?;

    let created = integer(attrs, "time-at-creation")
        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
        .unwrap_or_default();
    let processing_started = integer(attrs, "time-at-processing")
        .filter(|secs| *secs > 0)
        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0));

    Ok(CupsJob {
        id,
        printer_id: printer_id.to_string(),
        // Not every job has a name.
        document_name: text(attrs, "job-name").unwrap_or_default(),
        state,
        state_reasons: strings(attrs, "job-state-reasons")
            .into_iter()
            .filter(|reason| reason != "none")
            .collect(),
        state_message: text(attrs, "job-state-message").unwrap_or_default(),
        current_pages: integer(attrs, "job-media-sheets-completed").or_else(|| integer(attrs, "job-impressions-completed")),
        created,
        processing_started,
    })
}
