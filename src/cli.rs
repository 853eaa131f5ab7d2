use clap::{Parser, Subcommand};

// ///////////// //
// CLI interface //
// ///////////// //

/// cupspoll - Lists printers and polls print queue statuses from a CUPS server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Lists the printers registered with the print server.
    Printers,
    /// Looks up a single printer by `name` or `name/instance`.
    Printer { name: String },
    /// Prints the current status of a printer.
    Status { printer_id: String },
    /// Prints status and recent jobs for the given printers, or the configured queues.
    Jobs { printer_ids: Vec<String> },
    /// Polls the configured queues on the configured schedule (default).
    Watch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_watch() {
        let cli = Cli::try_parse_from(["cupspoll"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn jobs_takes_printer_ids() {
        let cli = Cli::try_parse_from(["cupspoll", "jobs", "office", "lab"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Jobs { printer_ids: vec!["office".to_string(), "lab".to_string()] })
        );
    }

    #[test]
    fn printer_requires_a_name() {
        assert!(Cli::try_parse_from(["cupspoll", "printer"]).is_err());
    }
}
