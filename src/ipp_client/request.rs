use std::time::Duration;

use ipp::prelude::*;
use snafu::ResultExt;

use crate::cups_client::error::{CupsError, RequestSnafu, StatusSnafu};

/// Create an IPP/1.1 request for `op` addressed to `uri`.
///
/// # Arguments
///
/// * `op`: Operation
/// * `uri`: Printer or server URI, sent as `printer-uri`
/// * `user_name`: Value of `requesting-user-name`
pub fn new_ipp_request(op: Operation, uri: &Uri, user_name: &str) -> IppRequestResponse {
    let mut req = IppRequestResponse::new(IppVersion::v1_1(), op, Some(uri.clone()));
    add_operation_attribute(
        &mut req,
        "requesting-user-name",
        IppValue::NameWithoutLanguage(user_name.to_string()),
    );
    req
}

pub fn add_operation_attribute(req: &mut IppRequestResponse, name: &str, value: IppValue) {
    req.attributes_mut()
        .add(DelimiterTag::OperationAttributes, IppAttribute::new(name, value));
}

/// `requested-attributes` value listing `names`.
pub fn requested_attributes(names: &[&str]) -> IppValue {
    IppValue::Array(names.iter().map(|name| IppValue::Keyword(name.to_string())).collect())
}

/// Send `req` to `uri` and get the response.
///
/// A response whose status is not successful is turned into
/// [`CupsError::Status`].
///
/// # Arguments
///
/// * `uri`: Printer or server URI
/// * `req`: Request built with [`new_ipp_request`]
/// * `ignore_tls_errors`: Accept any certificate on `ipps` connections
/// * `timeout`: Request timeout, `None` waits as long as the transport does
/// * `operation`: Operation name used in errors
pub fn send_ipp_request(
    uri: &Uri,
    req: IppRequestResponse,
    ignore_tls_errors: bool,
    timeout: Option<Duration>,
    operation: &'static str,
) -> Result<IppRequestResponse, CupsError> {
    let mut builder = IppClient::builder(uri.clone()).ignore_tls_errors(ignore_tls_errors);
    if let Some(timeout) = timeout {
        builder = builder.request_timeout(timeout);
    }
    let client = builder.build();

    let resp = client.send(req).context(RequestSnafu { operation })?;
    let status = resp.header().status_code();
    if !status.is_success() {
        return StatusSnafu {
            operation,
            code: resp.header().operation_or_status,
            message: format!("{status:?}"),
        }
        .fail();
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operation_attribute<'a>(req: &'a IppRequestResponse, name: &str) -> Option<&'a IppAttribute> {
        req.attributes()
            .groups_of(DelimiterTag::OperationAttributes)
            .find_map(|group| group.attributes().get(name))
    }

    #[test]
    fn request_carries_user_name() {
        let uri: Uri = "ipp://localhost:631/printers/office".parse().unwrap();
        let req = new_ipp_request(Operation::GetJobs, &uri, "alice");

        let user = operation_attribute(&req, "requesting-user-name").unwrap();
        assert_eq!(user.value().to_string(), "alice");
        assert!(operation_attribute(&req, "printer-uri").is_some());
    }

    #[test]
    fn extra_operation_attributes_are_added() {
        let uri: Uri = "ipp://localhost:631/".parse().unwrap();
        let mut req = new_ipp_request(Operation::GetJobs, &uri, "alice");
        add_operation_attribute(&mut req, "limit", IppValue::Integer(3));

        let limit = operation_attribute(&req, "limit").unwrap();
        assert!(matches!(limit.value(), IppValue::Integer(3)));
    }

    #[test]
    fn requested_attributes_is_a_keyword_array() {
        match requested_attributes(&["job-id", "job-state"]) {
            IppValue::Array(values) => assert_eq!(values.len(), 2),
            other => panic!("unexpected value {other:?}"),
        }
    }
}
