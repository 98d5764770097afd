use http::Request;

use crate::exchange::{Exchange, RequestBody};
use crate::writer::ResponseWriter;

/// Serves one exchange by reading the request and writing the response.
pub trait Handler: Send + Sync {
    /// Handles `exchange`.
    fn serve(&self, exchange: Exchange<'_>);
}

impl<F> Handler for F
where
    F: Fn(Exchange<'_>) + Send + Sync,
{
    fn serve(&self, exchange: Exchange<'_>) {
        self(exchange)
    }
}

/// Splits `request` and runs `handler` against `writer`.
///
/// Returns the request parts and whatever is left of the body once the handler
/// returns.
pub fn serve<H>(
    handler: &H,
    request: Request<RequestBody>,
    writer: &mut dyn ResponseWriter,
) -> Request<RequestBody>
where
    H: Handler + ?Sized,
{
    let (mut parts, mut body) = request.into_parts();
    handler.serve(Exchange::new(&mut parts, &mut body, writer));
    Request::from_parts(parts, body)
}
