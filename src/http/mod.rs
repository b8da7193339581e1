//! HTTP request building and dispatch

pub mod request;
pub mod transport;

pub use request::{PreparedRequest, RequestBody};
pub use transport::{HttpTransport, RawResponse, Transport};

use crate::common::Error;

/// Status reported for a request that never produced a response
pub const TRANSPORT_FAILURE_STATUS: u16 = 500;

/// What a stage sees of its request
#[derive(Debug)]
pub struct HttpOutcome {
    pub status: u16,
    pub body: String,
    /// Transport-level failure, recorded rather than propagated
    pub error: Option<Error>,
}

/// Send one request, folding transport failures into the outcome
///
/// A failed exchange reports status 500 and an empty body.
pub async fn dispatch(transport: &dyn Transport, request: &PreparedRequest) -> HttpOutcome {
    match transport.send(request).await {
        Ok(response) => HttpOutcome {
            status: response.status,
            body: response.body,
            error: None,
        },
        Err(error) => {
            tracing::debug!(url = %request.url, %error, "request failed");
            HttpOutcome {
                status: TRANSPORT_FAILURE_STATUS,
                body: String::new(),
                error: Some(error),
            }
        }
    }
}
