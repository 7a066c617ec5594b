//! The native host's transport loop: read a framed [`Request`] from the
//! guest, dispatch it against one [`NativeSession`], write back the framed
//! [`Reply`], repeat until `Exit`. One session per server instance, matching
//! one subprocess per guest driver object.

use std::io::{Read, Write};

use tracing::{error, info, warn};
use wineasio_proto::{read_framed, write_framed, Request, TransportOp};

use crate::backend::Backend;
use crate::handlers::dispatch;
use crate::session::NativeSession;

/// Runs the request/reply loop over `input`/`output` until the guest sends
/// `Exit` or the pipe closes. Returns normally in both cases; only a framing
/// or IO failure that isn't a clean close propagates as an error.
pub fn run<B: Backend, R: Read, W: Write>(
    mut input: R,
    mut output: W,
) -> Result<(), wineasio_proto::TransportError> {
    let mut session = NativeSession::<B>::new();
    info!("native session server started");

    loop {
        let request: Request = match read_framed(&mut input) {
            Ok(r) => r,
            Err(wineasio_proto::TransportError::Unavailable) => {
                warn!("guest pipe closed without Exit; shutting down");
                return Ok(());
            }
            Err(e) => {
                error!(error = %e, "transport read failed");
                return Err(e);
            }
        };

        let op = request.op();
        let is_exit = op == TransportOp::Exit;
        let reply = dispatch(&mut session, request);
        write_framed(&mut output, &reply)?;

        if is_exit {
            info!("native session server exiting");
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend_mock::MockBackend;
    use std::io::Cursor;
    use wineasio_proto::{Reply, SessionConfig};

    fn encode(requests: &[Request]) -> Vec<u8> {
        let mut buf = Vec::new();
        for r in requests {
            write_framed(&mut buf, r).unwrap();
        }
        buf
    }

    fn decode_all(bytes: &[u8]) -> Vec<Reply> {
        let mut cursor = Cursor::new(bytes);
        let mut replies = Vec::new();
        while let Ok(reply) = read_framed::<_, Reply>(&mut cursor) {
            replies.push(reply);
        }
        replies
    }

    #[test]
    fn loop_stops_cleanly_after_exit() {
        let input = encode(&[
            Request::Init { config: SessionConfig::default() },
            Request::GetChannels,
            Request::Exit,
        ]);
        let mut output = Vec::new();
        run::<MockBackend, _, _>(Cursor::new(input), &mut output).unwrap();

        let replies = decode_all(&output);
        assert_eq!(replies.len(), 3);
        assert!(matches!(replies[2], Reply::Exit { .. }));
    }

    #[test]
    fn a_closed_pipe_with_no_exit_stops_without_erroring() {
        let input = encode(&[Request::Init { config: SessionConfig::default() }]);
        let mut output = Vec::new();
        let result = run::<MockBackend, _, _>(Cursor::new(input), &mut output);
        assert!(result.is_ok());
        assert_eq!(decode_all(&output).len(), 1);
    }
}
