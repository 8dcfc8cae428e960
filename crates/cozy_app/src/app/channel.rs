use std::io::Write;

use cozy_markers::{HostChannel, MethodReply, OutboundEvent};
use serde_json::{json, Value};
use tracing::error;

/// Writes everything meant for the host as one json object per line.
///
/// 1. outbound events: `{"invoke": "marker#onTap", "arguments": {...}}`
/// 2. method replies: `{"method": "markers#update", "reply": {"status": "success", ...}}`
/// 3. native event acks: `{"event": {...}, "result": true}`
pub struct JsonLinesChannel<W: Write> {
    out: W,
    lines: u64,
}

impl<W: Write> JsonLinesChannel<W> {
    pub fn new(out: W) -> Self {
        Self { out, lines: 0 }
    }

    pub fn reply(&mut self, method: &str, reply: &MethodReply) {
        self.write_line(&json!({ "method": method, "reply": reply }));
    }

    pub fn write_line(&mut self, value: &Value) {
        // the host does not answer, so a broken pipe can only be logged
        if let Err(e) = writeln!(self.out, "{value}").and_then(|_| self.out.flush()) {
            error!(?e, "failed to write to host");
            return;
        }
        self.lines += 1;
    }

    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> HostChannel for JsonLinesChannel<W> {
    fn invoke_method(&mut self, event: OutboundEvent) {
        self.write_line(&json!({ "invoke": event.method(), "arguments": event.arguments() }));
    }
}
