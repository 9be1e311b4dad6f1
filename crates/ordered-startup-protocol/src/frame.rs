//! Listener frames written to supervisord on stdout.

/// Sent when the listener is ready for its next event.
pub const READY_FRAME: &str = "READY\n";

/// Result body acknowledging successful handling.
pub const ACK_BODY: &str = "OK";

/// Build a `RESULT <len>\n<body>` frame.
pub fn result_frame(body: &str) -> String {
    format!("RESULT {}\n{}", body.len(), body)
}
