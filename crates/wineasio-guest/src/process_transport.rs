//! Real [`Transport`]: spawns the native session host as a child process and
//! speaks the bincode-framed protocol over its stdin/stdout (§10.2). The
//! guest process never touches the backend directly — only the native
//! session host, running in its own process, does.

use std::io::{BufReader, BufWriter};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use tracing::warn;
use wineasio_proto::{read_framed, write_framed, Reply, Request, TransportError};

use crate::transport::Transport;

pub struct ProcessTransport {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl ProcessTransport {
    /// Spawns `program` (normally `wineasio-native-host` resolved from
    /// `PATH`) with piped stdio. Fails with [`TransportError::Unavailable`]
    /// if the process cannot be started at all — the same status the driver
    /// object surfaces from `Init` when the backend is unreachable.
    pub fn spawn(program: &str) -> Result<Self, TransportError> {
        let mut child = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|_| TransportError::Unavailable)?;

        let stdin = BufWriter::new(child.stdin.take().ok_or(TransportError::Unavailable)?);
        let stdout = BufReader::new(child.stdout.take().ok_or(TransportError::Unavailable)?);

        Ok(ProcessTransport { child, stdin, stdout })
    }
}

impl Transport for ProcessTransport {
    fn call(&mut self, request: Request) -> Result<Reply, TransportError> {
        let op = request.op();
        write_framed(&mut self.stdin, &request)?;
        let reply: Reply = read_framed(&mut self.stdout)?;
        if reply.op() != op {
            return Err(TransportError::UnexpectedReply);
        }
        Ok(reply)
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        if matches!(self.child.try_wait(), Ok(None)) {
            warn!("native session host still running at guest teardown; killing it");
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
