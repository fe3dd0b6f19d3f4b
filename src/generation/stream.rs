//! Incremental assembly of line-delimited JSON generation streams.
//!
//! The generation service emits one JSON record per line, with the text
//! payload under a provider-dependent field name and a final record carrying
//! `"done": true`. [`ChunkAssembler`] turns arbitrary byte-chunk boundaries
//! back into complete records without ever blocking on a full body.

use serde_json::Value;
use tracing::debug;

/// Lifecycle of a [`ChunkAssembler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// Accepting chunks; a trailing partial line is held in the buffer.
    Buffering,
    /// Final flush of the remaining buffer is in progress.
    Draining,
    /// Terminal: a `done` record arrived or the stream was flushed.
    Done,
}

/// Reassembles complete JSON lines from a chunked byte stream and extracts
/// their text payloads.
#[derive(Debug)]
pub struct ChunkAssembler {
    buffer: String,
    state: AssemblerState,
}

impl ChunkAssembler {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            state: AssemblerState::Buffering,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == AssemblerState::Done
    }

    /// Append a chunk, split off every complete line, and return the text
    /// fragments extracted from the lines that parsed. Unparsable lines are
    /// skipped. A record with `"done": true` moves the assembler to
    /// [`AssemblerState::Done`]; chunks pushed after that are ignored.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        if self.state == AssemblerState::Done {
            return Vec::new();
        }
        self.buffer.push_str(chunk);

        let mut fragments = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(line) {
                Ok(record) => {
                    if let Some(text) = text_field(&record) {
                        if !text.is_empty() {
                            fragments.push(text);
                        }
                    }
                    if is_done_record(&record) {
                        self.state = AssemblerState::Done;
                        self.buffer.clear();
                        break;
                    }
                }
                Err(err) => debug!("skipping unparsable stream line: {err}"),
            }
        }
        fragments
    }

    /// Best-effort parse of whatever remains in the buffer, then move to
    /// [`AssemblerState::Done`]. An unparsable remainder is discarded.
    pub fn finish(&mut self) -> Option<String> {
        if self.state == AssemblerState::Done {
            return None;
        }
        self.state = AssemblerState::Draining;
        let rest = std::mem::take(&mut self.buffer);
        let flushed = match rest.trim() {
            "" => None,
            tail => serde_json::from_str::<Value>(tail)
                .ok()
                .and_then(|record| text_field(&record))
                .filter(|text| !text.is_empty()),
        };
        self.state = AssemblerState::Done;
        flushed
    }
}

impl Default for ChunkAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull the text payload out of a generation record, whichever of the
/// known field names the provider used.
pub(crate) fn text_field(record: &Value) -> Option<String> {
    record
        .get("response")
        .and_then(Value::as_str)
        .or_else(|| {
            record
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(Value::as_str)
        })
        .or_else(|| record.get("output").and_then(Value::as_str))
        .or_else(|| record.get("text").and_then(Value::as_str))
        .or_else(|| {
            record
                .get("delta")
                .and_then(|d| d.get("content"))
                .and_then(Value::as_str)
        })
        .map(str::to_string)
}

fn is_done_record(record: &Value) -> bool {
    record.get("done").and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reassembles_lines_split_across_chunks() {
        let mut assembler = ChunkAssembler::new();
        assert!(assembler.push(r#"{"response":"Hel"#).is_empty());
        let first = assembler.push("lo\"}\n{\"response\":\" wor");
        assert_eq!(first, vec!["Hello".to_string()]);
        let second = assembler.push("ld\"}\n");
        assert_eq!(second, vec![" world".to_string()]);
        assert_eq!(assembler.state, AssemblerState::Buffering);
    }

    #[test]
    fn test_accepts_every_known_text_field() {
        let mut assembler = ChunkAssembler::new();
        let lines = concat!(
            "{\"response\":\"a\"}\n",
            "{\"message\":{\"content\":\"b\"}}\n",
            "{\"output\":\"c\"}\n",
            "{\"text\":\"d\"}\n",
            "{\"delta\":{\"content\":\"e\"}}\n",
        );
        assert_eq!(assembler.push(lines), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_done_record_terminates_the_stream() {
        let mut assembler = ChunkAssembler::new();
        let fragments =
            assembler.push("{\"response\":\"final\",\"done\":true}\n{\"response\":\"late\"}\n");
        assert_eq!(fragments, vec!["final".to_string()]);
        assert!(assembler.is_done());
        assert!(assembler.push("{\"response\":\"more\"}\n").is_empty());
        assert!(assembler.finish().is_none());
    }

    #[test]
    fn test_garbage_lines_are_skipped() {
        let mut assembler = ChunkAssembler::new();
        let fragments = assembler.push("not json at all\n{\"response\":\"ok\"}\n");
        assert_eq!(fragments, vec!["ok".to_string()]);
    }

    #[test]
    fn test_finish_flushes_a_trailing_partial_line() {
        let mut assembler = ChunkAssembler::new();
        assert!(assembler.push(r#"{"response":"tail"}"#).is_empty());
        assert_eq!(assembler.finish(), Some("tail".to_string()));
        assert!(assembler.is_done());
    }

    #[test]
    fn test_finish_discards_an_unparsable_remainder() {
        let mut assembler = ChunkAssembler::new();
        assert!(assembler.push(r#"{"response":"trunc"#).is_empty());
        assert!(assembler.finish().is_none());
        assert!(assembler.is_done());
    }

    #[test]
    fn test_empty_text_payloads_are_not_emitted() {
        let mut assembler = ChunkAssembler::new();
        let fragments = assembler.push("{\"response\":\"\"}\n{\"response\":\"x\"}\n");
        assert_eq!(fragments, vec!["x".to_string()]);
    }
}
