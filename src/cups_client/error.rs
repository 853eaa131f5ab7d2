use ipp::error::IppError;
use snafu::Snafu;

/// IPP `successful-ok`.
pub const IPP_STATUS_OK: u16 = 0x0000;
/// IPP `client-error-not-found`.
pub const IPP_STATUS_NOT_FOUND: u16 = 0x0406;
/// IPP `server-error-internal-error`.
pub const IPP_STATUS_INTERNAL_ERROR: u16 = 0x0500;
/// IPP `server-error-service-unavailable`.
pub const IPP_STATUS_SERVICE_UNAVAILABLE: u16 = 0x0503;

// ////// //
// Errors //
// ////// //

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CupsError {
    #[snafu(display("Could not connect to print server {host}:{port}"))]
    Connect {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    #[snafu(display("Invalid print server URI '{uri}': {message}"))]
    InvalidUri { uri: String, message: String },

    #[snafu(display("{operation} request failed"))]
    Request {
        operation: &'static str,
        source: IppError,
    },

    #[snafu(display("{operation} returned {message} (0x{code:04x})"))]
    Status {
        operation: &'static str,
        code: u16,
        message: String,
    },

    #[snafu(display("Response is missing the '{attribute}' attribute"))]
    MissingAttribute { attribute: &'static str },
}

impl CupsError {
    /// IPP status code describing this error, in the way `cupsLastError()` reports it.
    pub fn status_code(&self) -> u16 {
        match self {
            CupsError::Connect { .. } | CupsError::Request { .. } | CupsError::InvalidUri { .. } => {
                IPP_STATUS_SERVICE_UNAVAILABLE
            }
            CupsError::Status { code, .. } => *code,
            CupsError::MissingAttribute { .. } => IPP_STATUS_INTERNAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_errors_report_service_unavailable() {
        let err = CupsError::Connect {
            host: "localhost".to_string(),
            port: 631,
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert_eq!(err.status_code(), IPP_STATUS_SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "Could not connect to print server localhost:631");
    }

    #[test]
    fn status_errors_keep_the_server_code() {
        let err = CupsError::Status {
            operation: "Get-Jobs",
            code: IPP_STATUS_NOT_FOUND,
            message: "ClientErrorNotFound".to_string(),
        };
        assert_eq!(err.status_code(), IPP_STATUS_NOT_FOUND);
        assert_eq!(err.to_string(), "Get-Jobs returned ClientErrorNotFound (0x0406)");
    }

    #[test]
    fn malformed_responses_are_internal_errors() {
        let err = CupsError::MissingAttribute { attribute: "job-id" };
        assert_eq!(err.status_code(), IPP_STATUS_INTERNAL_ERROR);
    }
}
