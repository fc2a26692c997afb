//! Runs one outbound call against a slot's record.

use tracing::{debug, warn};

use crate::http::{HttpMethod, Transport};
use crate::record::CallState;

/// Perform one call and capture its result into `state`.
///
/// The previous result is dropped before the request goes out, so a failed
/// or partial call never exposes an earlier body, headers or status. Custom
/// method and request headers are consumed whatever the outcome.
pub fn perform<T: Transport + ?Sized>(
    transport: &T,
    state: &mut CallState,
    method: HttpMethod,
    url: &str,
    body: Option<&[u8]>,
) {
    state.begin_call(method);

    let CallState {
        config, response, ..
    } = &mut *state;
    let request = config.outbound(method, url, body);
    debug!(
        method = request.wire_method(),
        url,
        headers = request.headers.len(),
        "performing fetch"
    );

    if let Err(e) = transport.perform(&request, response) {
        warn!(method = request.wire_method(), url, error = %e, "fetch failed");
        response.error = Some(e.to_string());
    }

    state.finish_call();
}
