//! Event listener transport
//!
//! Supervisord delivers events to a listener over its stdin and expects
//! replies on its stdout:
//!
//! 1. listener writes `READY\n`
//! 2. supervisord writes a header line, then `len` payload bytes
//! 3. listener writes `RESULT 2\nOK`
//!
//! A new event is only sent after the previous one was acknowledged.

use std::io::{self, BufRead, Stdout, Write};

use ordered_startup_protocol::{
    result_frame, EventHeaders, Notification, ProtocolError, ACK_BODY, READY_FRAME,
};
use tracing::debug;

/// Source of lifecycle notifications.
pub trait EventSource {
    /// Block until the next notification. `None` once the channel is closed.
    fn next_event(&mut self) -> Result<Option<Notification>, ProtocolError>;

    /// Acknowledge the notification last returned by `next_event`.
    fn acknowledge(&mut self) -> Result<(), ProtocolError>;
}

/// Listener speaking the supervisord protocol over a reader/writer pair.
pub struct StdioListener<R, W> {
    reader: R,
    writer: W,
    pending: bool,
}

impl StdioListener<io::StdinLock<'static>, Stdout> {
    /// Bind to the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> StdioListener<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            pending: false,
        }
    }

    /// Consume the listener, returning the writer (for inspecting output in tests).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn write_frame(&mut self, frame: &str) -> Result<(), ProtocolError> {
        self.writer.write_all(frame.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> EventSource for StdioListener<R, W> {
    fn next_event(&mut self) -> Result<Option<Notification>, ProtocolError> {
        self.write_frame(READY_FRAME)?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            debug!("event channel closed");
            return Ok(None);
        }
        let headers = EventHeaders::parse(&line)?;

        let len = headers.payload_len()?;
        let mut payload = vec![0u8; len];
        self.reader.read_exact(&mut payload).map_err(|err| {
            if err.kind() == io::ErrorKind::UnexpectedEof {
                ProtocolError::UnexpectedEof("event payload")
            } else {
                ProtocolError::Io(err)
            }
        })?;

        self.pending = true;
        Ok(Some(Notification::new(headers, String::from_utf8(payload)?)))
    }

    fn acknowledge(&mut self) -> Result<(), ProtocolError> {
        if !self.pending {
            return Err(ProtocolError::NothingToAcknowledge);
        }
        self.write_frame(&result_frame(ACK_BODY))?;
        self.pending = false;
        Ok(())
    }
}
