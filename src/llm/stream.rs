//! Server-sent events iterator for streamed chat completions.

use anyhow::Result;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};

use super::types::{CompletionChunk, StreamEvent};

/// Iterator over `data:` lines of an SSE response.
///
/// Ends at `data: [DONE]` or EOF. Chunks whose delta carries no text are
/// skipped.
pub struct SseStream<R: Read> {
    reader: BufReader<R>,
    buffer: String,
    pending: VecDeque<StreamEvent>,
    done: bool,
}

impl<R: Read> SseStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buffer: String::new(),
            pending: VecDeque::new(),
            done: false,
        }
    }
}

impl<R: Read> Iterator for SseStream<R> {
    type Item = Result<StreamEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.done {
                return None;
            }

            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {
                    let line = self.buffer.trim();
                    let Some(data) = line.strip_prefix("data:") else {
                        // Comments, event names, blank separators
                        continue;
                    };
                    let data = data.trim();
                    if data == "[DONE]" {
                        self.done = true;
                        continue;
                    }

                    let chunk: CompletionChunk = match serde_json::from_str(data) {
                        Ok(chunk) => chunk,
                        Err(e) => {
                            return Some(Err(anyhow::anyhow!(
                                "Failed to parse stream chunk: {} (line: {})",
                                e,
                                data
                            )));
                        }
                    };

                    if let Some(choice) = chunk.choices.into_iter().next() {
                        if let Some(reasoning) = choice.delta.reasoning.filter(|s| !s.is_empty()) {
                            self.pending.push_back(StreamEvent::Reasoning(reasoning));
                        }
                        if let Some(content) = choice.delta.content.filter(|s| !s.is_empty()) {
                            self.pending.push_back(StreamEvent::Content(content));
                        }
                    }
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(anyhow::anyhow!("Failed to read from stream: {}", e)));
                }
            }
        }
    }
}
