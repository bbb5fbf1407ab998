//! Shared fakes for session integration tests

#![allow(dead_code)]

use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};

use llmterm::config::{ConfigFile, RunConfig, RunOverrides};
use llmterm::history::{EventSink, ShellEvent};
use llmterm::llm::{ChatClient, ChatRequest, ChatStream, SseStream};

/// Wraps `body` in an OSC 133 marker
pub fn osc(body: &str) -> Vec<u8> {
    let mut marker = b"\x1b]133;".to_vec();
    marker.extend_from_slice(body.as_bytes());
    marker.push(0x07);
    marker
}

/// Shell output for one full prompt/command/output lifecycle
pub fn lifecycle(command: &str, output: &str, exit_code: i32) -> Vec<u8> {
    let mut bytes = osc("A");
    bytes.extend_from_slice(b"user@host:~$ ");
    bytes.extend(osc("B"));
    bytes.extend_from_slice(command.as_bytes());
    bytes.extend(osc("C"));
    bytes.extend_from_slice(output.as_bytes());
    bytes.extend(osc(&format!("D;{}", exit_code)));
    bytes
}

/// Chat client that replays a canned SSE body and records requests
pub struct FakeChatClient {
    sse_body: String,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl FakeChatClient {
    pub fn answering(chunks: &[&str]) -> Self {
        let mut body = String::new();
        for chunk in chunks {
            let event = serde_json::json!({
                "choices": [{"delta": {"content": chunk}}]
            });
            body.push_str(&format!("data: {}\n\n", event));
        }
        body.push_str("data: [DONE]\n\n");
        Self {
            sse_body: body,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn last_user_message(&self) -> Option<String> {
        let requests = self.requests.lock().unwrap();
        requests
            .last()
            .and_then(|r| r.messages.iter().rev().find(|m| m.role == "user"))
            .map(|m| m.content.clone())
    }
}

impl ChatClient for FakeChatClient {
    fn stream_chat(&self, request: &ChatRequest) -> anyhow::Result<ChatStream> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(Box::new(SseStream::new(Cursor::new(
            self.sse_body.clone().into_bytes(),
        ))))
    }
}

/// Sink that keeps events in memory
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<ShellEvent>>,
}

impl EventSink for RecordingSink {
    fn record(&self, event: &ShellEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Writer whose contents stay readable after it is moved into a component
#[derive(Clone, Default)]
pub struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run config for `model` with no environment or config file
pub fn run_config(model: &str) -> RunConfig {
    let overrides = RunOverrides {
        model: Some(model.to_string()),
        ..Default::default()
    };
    RunConfig::resolve_with_env(&ConfigFile::default(), &overrides, |_| None)
        .expect("default config resolves")
}
