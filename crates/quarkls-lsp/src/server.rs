//! Session loop over a framed byte stream.

use std::io::{self, BufRead, Write};

use tracing::{debug, info, warn};

use crate::jsonrpc::{INVALID_REQUEST, Message, PARSE_ERROR, Response, ResponseError};
use crate::session::{Session, SessionError};
use crate::transport::{FramedTransport, TransportError};

const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Serves `session` until the client exits or the stream ends.
///
/// After every inbound message the scheduler is drained and resolved deferred
/// results are written out.
///
/// # Errors
///
/// Returns [`SessionError`] when the transport fails or a response cannot be
/// serialised.
pub fn serve<R: BufRead, W: Write>(
    session: &mut Session,
    transport: &mut FramedTransport<R, W>,
) -> Result<(), SessionError> {
    loop {
        let payload = match transport.receive() {
            Ok(Some(payload)) => payload,
            Ok(None) => break,
            Err(error @ TransportError::MessageTooLarge { .. }) => {
                warn!(target: SERVER_TARGET, %error, "oversized message skipped");
                let response =
                    Response::failure(None, ResponseError::new(INVALID_REQUEST, error.to_string()));
                send_all(transport, &[response])?;
                continue;
            }
            Err(error) => return Err(error.into()),
        };
        let responses = match Message::parse(&payload) {
            Ok(message) => session.handle(message),
            Err(error) => {
                warn!(target: SERVER_TARGET, %error, "malformed message");
                vec![Response::failure(
                    None,
                    ResponseError::new(PARSE_ERROR, error.to_string()),
                )]
            }
        };
        send_all(transport, &responses)?;

        while session.has_pending_work() {
            let flushed = session.run_turn();
            send_all(transport, &flushed)?;
        }

        if session.is_finished() {
            info!(target: SERVER_TARGET, "session finished");
            return Ok(());
        }
    }
    debug!(target: SERVER_TARGET, "input stream closed");
    Ok(())
}

/// Serves `session` over the process's standard input and output.
///
/// # Errors
///
/// See [`serve`].
pub fn serve_stdio(session: &mut Session) -> Result<(), SessionError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut transport = FramedTransport::new(stdin.lock(), stdout.lock());
    serve(session, &mut transport)
}

fn send_all<R: BufRead, W: Write>(
    transport: &mut FramedTransport<R, W>,
    responses: &[Response],
) -> Result<(), SessionError> {
    for response in responses {
        let payload = serde_json::to_vec(response)?;
        transport.send(&payload)?;
    }
    Ok(())
}
