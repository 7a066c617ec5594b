//! Length-prefixed bincode framing shared by both ends of the pipe.
//!
//! Mirrors the teacher's `IpcTransport`: a 4-byte little-endian length prefix
//! followed by the bincode-encoded payload, so a `Read`/`Write` pair over any
//! byte stream (here, a child process's stdio) can carry whole [`Request`]/
//! [`Reply`] values without needing its own message boundaries.

use std::io::{self, Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn write_framed<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<(), crate::TransportError> {
    let payload = bincode::serialize(value)?;
    writer.write_all(&(payload.len() as u32).to_le_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

pub fn read_framed<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T, crate::TransportError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).map_err(io_to_transport)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(bincode::deserialize(&payload)?)
}

fn io_to_transport(err: io::Error) -> crate::TransportError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        crate::TransportError::Unavailable
    } else {
        crate::TransportError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Request, SessionConfig};
    use std::io::Cursor;

    #[test]
    fn round_trips_a_request_through_a_byte_buffer() {
        let mut buf = Vec::new();
        let req = Request::Init { config: SessionConfig::default() };
        write_framed(&mut buf, &req).unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded: Request = read_framed(&mut cursor).unwrap();
        match decoded {
            Request::Init { config } => assert_eq!(config, SessionConfig::default()),
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn reading_past_a_closed_stream_reports_unavailable() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let err = read_framed::<_, Request>(&mut cursor).unwrap_err();
        assert!(matches!(err, crate::TransportError::Unavailable));
    }
}
