//! Tests for the input interceptor.

use super::*;
use crate::config::{ConfigFile, RunConfig, RunOverrides};
use crate::history::{EventSink, ShellEvent};
use crate::llm::{ChatClient, ChatRequest, ChatStream, StreamEvent};
use crate::session::history::CommandEvent;
use std::sync::Mutex;

#[derive(Default)]
struct FakeClient {
    requests: Mutex<Vec<ChatRequest>>,
}

impl ChatClient for FakeClient {
    fn stream_chat(&self, request: &ChatRequest) -> anyhow::Result<ChatStream> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(Box::new(
            vec![Ok(StreamEvent::Content("Use ls -a\nto list.".to_string()))].into_iter(),
        ))
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<ShellEvent>>,
}

impl EventSink for RecordingSink {
    fn record(&self, event: &ShellEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct Harness {
    interceptor: InputInterceptor<Vec<u8>, Vec<u8>>,
    client: Arc<FakeClient>,
    sink: Arc<RecordingSink>,
    history: Arc<SessionHistory>,
    ring: Arc<RingBuffer>,
}

fn harness() -> Harness {
    let client = Arc::new(FakeClient::default());
    let sink = Arc::new(RecordingSink::default());
    let history = Arc::new(SessionHistory::new());
    let ring = Arc::new(RingBuffer::new(256));

    let overrides = RunOverrides {
        model: Some("fake-model".to_string()),
        ..Default::default()
    };
    let run = RunConfig::resolve_with_env(&ConfigFile::default(), &overrides, |_| None).unwrap();
    let assistant = InlineAssistant::new(client.clone(), run).with_sink(sink.clone());

    let interceptor = InputInterceptor::new(
        Vec::new(),
        Vec::new(),
        history.clone(),
        ring.clone(),
        assistant,
    );

    Harness {
        interceptor,
        client,
        sink,
        history,
        ring,
    }
}

fn type_bytes(interceptor: &mut InputInterceptor<Vec<u8>, Vec<u8>>, bytes: &[u8]) {
    for &b in bytes {
        interceptor.handle_byte(b);
    }
}

#[test]
fn test_plain_command_is_forwarded() {
    let mut h = harness();
    type_bytes(&mut h.interceptor, b"ls -la\r");

    assert_eq!(h.interceptor.pty, b"ls -la\r");
    assert!(h.interceptor.terminal.is_empty());
    assert!(h.interceptor.current_line().is_empty());
    assert!(h.client.requests.lock().unwrap().is_empty());
}

#[test]
fn test_backspace_shrinks_line_and_is_forwarded() {
    let mut h = harness();
    type_bytes(&mut h.interceptor, b"lsx\x7f");

    assert_eq!(h.interceptor.current_line(), b"ls");
    assert_eq!(h.interceptor.pty, b"lsx\x7f");
}

#[test]
fn test_control_bytes_reset_line() {
    for control in [0x03u8, 0x04, 0x15] {
        let mut h = harness();
        type_bytes(&mut h.interceptor, b"?? half typed");
        h.interceptor.handle_byte(control);

        assert!(h.interceptor.current_line().is_empty());
        assert_eq!(*h.interceptor.pty.last().unwrap(), control);

        // The reset line no longer triggers
        h.interceptor.handle_byte(b'\r');
        assert!(h.client.requests.lock().unwrap().is_empty());
    }
}

#[test]
fn test_line_buffer_is_bounded() {
    let mut h = harness();
    let long = vec![b'a'; LINE_CAPACITY + 100];
    type_bytes(&mut h.interceptor, &long);

    assert_eq!(h.interceptor.current_line().len(), LINE_CAPACITY);
    assert_eq!(h.interceptor.pty.len(), LINE_CAPACITY + 100);
}

#[test]
fn test_trigger_uses_structured_history() {
    let mut h = harness();
    h.history
        .add_event(CommandEvent::new("cat missing.txt", "No such file", 1));
    h.ring.write(b"raw noise");

    type_bytes(&mut h.interceptor, b"  ?? why did it fail\r");

    // Line cancelled and prompt redrawn instead of submitting the query
    assert!(h.interceptor.pty.ends_with(&[KILL_LINE, b'\r']));
    assert!(!h.interceptor.pty.ends_with(b"fail\r"));

    let requests = h.client.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let user = &requests[0].messages[1].content;
    assert!(user.contains("Session History (Structured):"));
    assert!(user.contains("Command: cat missing.txt\nExit Code: 1\nOutput:\nNo such file\n---\n"));
    assert!(!user.contains("raw noise"));
    assert!(user.ends_with("User Question: why did it fail"));

    let output = String::from_utf8(h.interceptor.terminal.clone()).unwrap();
    assert!(output.contains("Use ls -a\r\nto list."));

    let events = h.sink.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, "session_interception");
    assert_eq!(events[0].query, "why did it fail");
}

#[test]
fn test_trigger_falls_back_to_ring_buffer() {
    let mut h = harness();
    h.ring.write(b"\x1b[32m$ make\x1b[0m\r\nerror: missing target\r\n");

    type_bytes(&mut h.interceptor, b"??explain\n");

    let requests = h.client.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let user = &requests[0].messages[1].content;
    assert!(user.contains("$ make\r\nerror: missing target"));
    assert!(!user.contains("\x1b[32m"));
}

#[test]
fn test_empty_query_prints_usage() {
    let mut h = harness();
    type_bytes(&mut h.interceptor, b"??   \r");

    assert!(h.client.requests.lock().unwrap().is_empty());
    assert!(h.sink.events.lock().unwrap().is_empty());
    let output = String::from_utf8(h.interceptor.terminal.clone()).unwrap();
    assert!(output.contains("Usage: ?? <question>"));
}

#[test]
fn test_custom_trigger() {
    let mut h = harness();
    h.interceptor = h.interceptor.with_trigger("@ai");

    type_bytes(&mut h.interceptor, b"?? not a trigger\r");
    assert!(h.client.requests.lock().unwrap().is_empty());

    type_bytes(&mut h.interceptor, b"@ai hello\r");
    assert_eq!(h.client.requests.lock().unwrap().len(), 1);
}

#[test]
fn test_run_stops_at_eof() {
    let h = harness();
    let client = h.client.clone();
    h.interceptor.run(&b"echo hi\r?? what\r"[..]);

    assert_eq!(client.requests.lock().unwrap().len(), 1);
}

#[test]
fn test_build_context_limits_events() {
    let history = SessionHistory::new();
    for i in 0..4 {
        history.add_event(CommandEvent::new(format!("cmd{}", i), "", 0));
    }
    let ring = RingBuffer::new(16);

    let context = build_context(&history, &ring, 2);
    assert!(!context.contains("cmd1"));
    let pos2 = context.find("cmd2").unwrap();
    let pos3 = context.find("cmd3").unwrap();
    assert!(pos2 < pos3);
}
