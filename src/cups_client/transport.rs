use std::path::PathBuf;
use std::time::Duration;

use serde_derive::Deserialize;
use url::Url;

use super::error::CupsError;
use super::models::{CupsJob, Destination, PrinterStatus, PrinterType, WhichJobs};

pub const DEFAULT_IPP_PORT: u16 = 631;
const DEFAULT_SERVER: &str = "localhost";

/// Encryption policy for the print server connection, same meaning as CUPS `http_encryption_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpEncryption {
    #[default]
    #[serde(alias = "if_requested", alias = "if-requested")]
    IfRequested,
    Never,
    Required,
    Always,
}

impl HttpEncryption {
    pub fn scheme(self) -> &'static str {
        match self {
            HttpEncryption::IfRequested | HttpEncryption::Never => "ipp",
            HttpEncryption::Required | HttpEncryption::Always => "ipps",
        }
    }
}

/// Host and port of the print server a connection dials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    pub host: String,
    pub port: u16,
}

impl ServerTarget {
    pub fn from_url(url: &Url) -> Result<Self, CupsError> {
        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| CupsError::InvalidUri {
                uri: url.to_string(),
                message: "missing host".to_string(),
            })?;

        Ok(ServerTarget {
            host: host.to_string(),
            port: url.port().unwrap_or(DEFAULT_IPP_PORT),
        })
    }

    /// Resolves the server the same way `cupsServer()` and `ippPort()` do:
    /// `CUPS_SERVER`, then `ServerName` from the user's and the system's
    /// `client.conf`, then localhost. The port comes from `IPP_PORT`.
    pub fn system_default() -> Self {
        let conf_server = client_conf_paths()
            .into_iter()
            .find_map(|path| std::fs::read_to_string(path).ok().and_then(|c| parse_client_conf(&c)));

        Self::resolve_default(|key| std::env::var(key).ok(), conf_server)
    }

    fn resolve_default(env: impl Fn(&str) -> Option<String>, conf_server: Option<String>) -> Self {
        let default_port = env("IPP_PORT")
            .and_then(|port| port.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_IPP_PORT);

        let server = env("CUPS_SERVER")
            .filter(|server| !server.trim().is_empty())
            .or(conf_server)
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());
        let server = server.trim();

        // Domain sockets are not reachable over IPP/HTTP.
        if server.starts_with('/') {
            return ServerTarget { host: DEFAULT_SERVER.to_string(), port: default_port };
        }

        match server.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') || host.starts_with('[') => match port.parse::<u16>() {
                Ok(port) => ServerTarget { host: host.to_string(), port },
                Err(_) => ServerTarget { host: server.to_string(), port: default_port },
            },
            _ => ServerTarget { host: server.to_string(), port: default_port },
        }
    }
}

fn client_conf_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(home) = std::env::var("HOME") {
        paths.push(PathBuf::from(home).join(".cups").join("client.conf"));
    }
    paths.push(PathBuf::from("/etc/cups/client.conf"));
    paths
}

/// Extracts the `ServerName` directive from a CUPS `client.conf`.
pub fn parse_client_conf(contents: &str) -> Option<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(key), Some(value)) if key.eq_ignore_ascii_case("ServerName") => Some(value.to_string()),
                _ => None,
            }
        })
}

pub type Destinations<'a> = Box<dyn Iterator<Item = Destination> + 'a>;

/// An established handle to a print server.
pub trait SpoolerHandle {
    /// Lists the destinations known to the server. `printer_type` and `mask`
    /// are passed on as a hint; callers still filter the result themselves.
    fn enum_dests(
        &self,
        printer_type: PrinterType,
        mask: PrinterType,
        timeout: Duration,
    ) -> Result<Destinations<'_>, CupsError>;

    /// Looks up a single destination without listing all of them.
    fn get_named_dest(&self, name: &str, instance: Option<&str>) -> Result<Option<Destination>, CupsError>;

    fn printer_status(&self, printer_id: &str) -> Result<PrinterStatus, CupsError>;

    /// Fetches at most `limit` jobs of the given category.
    fn jobs(&self, printer_id: &str, limit: usize, which: WhichJobs) -> Result<Vec<CupsJob>, CupsError>;
}

/// Opens handles to print servers.
pub trait Transport {
    type Handle: SpoolerHandle;

    fn dial(
        &self,
        target: &ServerTarget,
        encryption: HttpEncryption,
        blocking: bool,
        timeout: Duration,
    ) -> Result<Self::Handle, CupsError>;
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn target_from_url_uses_explicit_port() {
        let url = Url::parse("ipp://print.example.com:8631/").unwrap();
        let target = ServerTarget::from_url(&url).unwrap();
        assert_eq!(target, ServerTarget { host: "print.example.com".to_string(), port: 8631 });
    }

    #[test]
    fn target_from_url_defaults_to_ipp_port() {
        let url = Url::parse("ipps://print.example.com/").unwrap();
        assert_eq!(ServerTarget::from_url(&url).unwrap().port, DEFAULT_IPP_PORT);
    }

    #[test]
    fn target_from_url_without_host_is_rejected() {
        let url = Url::parse("file:///tmp/cups.sock").unwrap();
        assert!(matches!(ServerTarget::from_url(&url), Err(CupsError::InvalidUri { .. })));
    }

    #[test]
    fn default_target_prefers_environment() {
        let target = ServerTarget::resolve_default(
            env_of(&[("CUPS_SERVER", "cups.lan:1631")]),
            Some("ignored.lan".to_string()),
        );
        assert_eq!(target, ServerTarget { host: "cups.lan".to_string(), port: 1631 });
    }

    #[test]
    fn default_target_falls_back_to_client_conf_then_localhost() {
        let target = ServerTarget::resolve_default(env_of(&[("IPP_PORT", "632")]), Some("conf.lan".to_string()));
        assert_eq!(target, ServerTarget { host: "conf.lan".to_string(), port: 632 });

        let target = ServerTarget::resolve_default(env_of(&[]), None);
        assert_eq!(target, ServerTarget { host: "localhost".to_string(), port: 631 });
    }

    #[test]
    fn default_target_maps_domain_sockets_to_localhost() {
        let target = ServerTarget::resolve_default(env_of(&[("CUPS_SERVER", "/run/cups/cups.sock")]), None);
        assert_eq!(target.host, "localhost");
    }

    #[test]
    fn client_conf_server_name_is_parsed() {
        let conf = "# comment\nEncryption Never\nservername printhost:631\n";
        assert_eq!(parse_client_conf(conf), Some("printhost:631".to_string()));
        assert_eq!(parse_client_conf("# ServerName commented\n"), None);
    }

    #[test]
    fn encryption_selects_scheme() {
        assert_eq!(HttpEncryption::Never.scheme(), "ipp");
        assert_eq!(HttpEncryption::IfRequested.scheme(), "ipp");
        assert_eq!(HttpEncryption::Required.scheme(), "ipps");
        assert_eq!(HttpEncryption::Always.scheme(), "ipps");
    }
}
