use anyhow::{bail, Context, Result};
use backon::BlockingRetryable;
use backon::ExponentialBuilder;
use clap::Parser;
use log::{debug, error, info, warn};
use url::Url;

use crate::cli::{Cli, Commands};
use crate::config::models::{Cups, Settings};
use crate::cups_client::connection::Connection;
use crate::cups_client::models::QueueStatus;
use crate::ipp_client::transport::IppTransport;
use crate::report::models::{PrinterReport, PrinterStatusReport, QueueStatusReport};

mod cli;
mod config;
mod cups_client;
mod ipp_client;
mod report;

fn main() {
    colog::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command.unwrap_or(Commands::Watch)) {
        error!("{:?}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    let settings = crate::config::loading::load_config()?;
    let mut connection = open_connection(&settings.cups)?;

    match command {
        Commands::Printers => {
            let printers: Vec<PrinterReport> = connection.get_dests().iter().map(PrinterReport::from).collect();
            print_json(&printers)
        }
        Commands::Printer { name } => match connection.get_printer(&name) {
            Some(printer) => {
                let status = match printer.status() {
                    Ok(status) => Some(PrinterStatusReport::from(&status)),
                    Err(e) => {
                        warn!("Could not retrieve printer status for {}: {}", printer.name(), e);
                        None
                    }
                };
                print_json(&serde_json::json!({ "printer": PrinterReport::from(&printer), "status": status }))
            }
            None => bail!("Printer {} not found on {}", name, describe_server(&connection)),
        },
        Commands::Status { printer_id } => match connection.get_printer_status(&printer_id) {
            Some(status) => print_json(&PrinterStatusReport::from(&status)),
            None => bail!("Could not get status of {}: {}", printer_id, connection.last_error_message()),
        },
        Commands::Jobs { printer_ids } => {
            let printer_ids = if printer_ids.is_empty() { settings.cups.print_queues.clone() } else { printer_ids };
            let queues = get_queue_statuses(&mut connection, &printer_ids)?;
            print_json(&queues.iter().map(QueueStatusReport::from).collect::<Vec<_>>())
        }
        Commands::Watch => watch(&mut connection, &settings),
    }
}

fn open_connection(cups_settings: &Cups) -> Result<Connection> {
    let print_server_url = if cups_settings.uri.is_empty() {
        None
    } else {
        Some(Url::parse(&cups_settings.uri).with_context(|| format!("Invalid print server URL '{}'", cups_settings.uri))?)
    };
    let transport = IppTransport::new(cups_settings.ignore_tls_errors, &cups_settings.username, &cups_settings.password);

    Ok(Connection::new(print_server_url, cups_settings.encryption, cups_settings.blocking, transport))
}

fn describe_server(connection: &Connection) -> String {
    match connection.server_name() {
        name if name.is_empty() => "the default print server".to_string(),
        name => name,
    }
}

fn get_queue_statuses(connection: &mut Connection, printer_ids: &[String]) -> Result<Vec<QueueStatus>> {
    let mut queues = Vec::new();
    if !connection.get_jobs(printer_ids, &mut queues) {
        bail!(
            "Could not get print queue statuses from {}: {} (0x{:04x})",
            describe_server(connection),
            connection.last_error_message(),
            connection.last_error()
        );
    }
    Ok(queues)
}

fn watch(connection: &mut Connection, settings: &Settings) -> Result<()> {
    let printer_ids = &settings.cups.print_queues;
    if printer_ids.is_empty() {
        bail!("No print queues configured, set CUPSPOLL_CUPS_PRINTQUEUES");
    }
    info!("Polling {} print queues on {}", printer_ids.len(), describe_server(connection));
    if !connection.connect() {
        warn!("Print server is not reachable yet: {}", connection.last_error_message());
    }

    loop {
        let result = (|| poll_queues(connection, printer_ids))
            .retry(ExponentialBuilder::default().with_factor(4.0))
            .sleep(std::thread::sleep)
            .notify(|e, wait| warn!("Polling failed, retrying in {:?}: {}", wait, e))
            .call();

        match result {
            Ok(()) => {
                debug!("Successfully polled {} print queues.", printer_ids.len());
                std::thread::sleep(settings.poll.schedule.duration_until_next_poll()?);
            }
            Err(e) => {
                error!("Error polling print queues: {:?}", e);
                error!("Too many failures, waiting {:?} before retrying.", settings.poll.failure_wait);
                std::thread::sleep(settings.poll.failure_wait);
            }
        }
    }
}

fn poll_queues(connection: &mut Connection, printer_ids: &[String]) -> Result<()> {
    for queue in get_queue_statuses(connection, printer_ids)? {
        let payload = serde_json::to_string(&QueueStatusReport::from(&queue))?;
        println!("{}: {}", queue.printer_status.printer_id, payload);
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
