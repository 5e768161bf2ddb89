//! Terminal rendering of stream events and stored messages.

use std::io::Write;

use chatgraph::{CheckpointSource, Message, StreamEvent, ToolPayload};

/// Prints stream events as they arrive: `Thinking...` before the first chunk of each model
/// step, `[Calling tool: name]` when the model requests tools, chunks inline.
pub struct StreamPrinter<W: Write> {
    out: W,
    /// Chunks were printed for the model step in flight.
    step_streamed: bool,
    /// Chunks were printed for the last completed model step.
    last_step_streamed: bool,
    /// Some chunk text was printed since the last newline.
    mid_line: bool,
}

impl<W: Write> StreamPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            step_streamed: false,
            last_step_streamed: false,
            mid_line: false,
        }
    }

    pub fn handle(&mut self, event: &StreamEvent) -> std::io::Result<()> {
        match event {
            StreamEvent::Messages { chunk, .. } => {
                if !self.step_streamed {
                    writeln!(self.out, "Thinking...")?;
                    self.step_streamed = true;
                }
                write!(self.out, "{}", chunk.content)?;
                self.mid_line = !chunk.content.ends_with('\n');
            }
            StreamEvent::Updates {
                source, appended, ..
            } => {
                self.end_line()?;
                match source {
                    CheckpointSource::Model => {
                        self.last_step_streamed = self.step_streamed;
                        if let Some(last) = appended.last() {
                            for call in last.tool_calls() {
                                writeln!(self.out, "[Calling tool: {}]", call.name)?;
                            }
                        }
                    }
                    CheckpointSource::Tools => {
                        let failed = appended
                            .iter()
                            .filter(|m| matches!(m, Message::Tool(r) if r.payload.is_error()))
                            .count();
                        if failed == 0 {
                            writeln!(self.out, "[Tool result received]")?;
                        } else {
                            writeln!(self.out, "[Tool result received: {} failed]", failed)?;
                        }
                    }
                }
                self.step_streamed = false;
            }
            StreamEvent::Values { .. } => {}
            StreamEvent::Completed { outcome } => {
                self.end_line()?;
                // Nothing streamed for the final message (e.g. the tool-cap notice).
                let streamed = self.step_streamed || self.last_step_streamed;
                if !streamed && !outcome.reply().is_empty() {
                    writeln!(self.out, "{}", outcome.reply())?;
                }
            }
            StreamEvent::Failed { .. } => self.end_line()?,
        }
        self.out.flush()
    }

    fn end_line(&mut self) -> std::io::Result<()> {
        if self.mid_line {
            writeln!(self.out)?;
            self.mid_line = false;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// One line per message, as printed by `history` and `/history`.
pub fn format_message(message: &Message) -> String {
    match message {
        Message::User { content } => format!("[User] {}", content),
        Message::Assistant {
            content,
            tool_calls,
        } => {
            let mut line = format!("[Assistant] {}", content);
            for call in tool_calls {
                if !line.ends_with(' ') {
                    line.push(' ');
                }
                line.push_str(&format!("-> {}({})", call.name, call.arguments));
            }
            line
        }
        Message::Tool(result) => match &result.payload {
            ToolPayload::Success { result: value } => {
                format!("[Tool {}] {}", result.name, value)
            }
            ToolPayload::Error { kind, message } => {
                let kind = serde_json::to_value(kind)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default();
                format!("[Tool {}] error ({}): {}", result.name, kind, message)
            }
        },
    }
}

pub fn print_history<W: Write>(messages: &[Message], out: &mut W) -> std::io::Result<()> {
    if messages.is_empty() {
        writeln!(out, "(no messages)")?;
    }
    for m in messages {
        writeln!(out, "{}", format_message(m))?;
    }
    Ok(())
}
