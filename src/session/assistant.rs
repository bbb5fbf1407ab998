//! Out-of-band LLM answers rendered into a raw-mode terminal.

use std::io::{self, Write};
use std::sync::Arc;

use crate::config::RunConfig;
use crate::history::{EventSink, ShellEvent};
use crate::llm::{ChatClient, ChatMessage, StreamEvent};

const SYSTEM_PROMPT: &str = "You are a helpful CLI assistant. The user is asking a question about their \
current terminal session. Use the provided terminal history context to answer. Be concise. \
Output markdown.";

/// Answers trigger queries by streaming a chat completion to the terminal.
pub struct InlineAssistant {
    client: Arc<dyn ChatClient>,
    run: RunConfig,
    sink: Option<Arc<dyn EventSink>>,
    debug: bool,
}

impl InlineAssistant {
    pub fn new(client: Arc<dyn ChatClient>, run: RunConfig) -> Self {
        Self {
            client,
            run,
            sink: None,
            debug: false,
        }
    }

    /// Record every answered query to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Print the model, system prompt and context before each call.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.run.model_name
    }

    /// Messages sent for `query` with `context` as terminal history.
    pub fn messages(query: &str, context: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "<terminal-history>\n{}\n</terminal-history>\n\nUser Question: {}",
                context, query
            )),
        ]
    }

    /// Stream the answer to `out`.
    ///
    /// Model and transport errors are printed inline; only failures to write
    /// to `out` are returned.
    pub fn answer<W: Write>(&self, query: &str, context: &str, out: &mut W) -> io::Result<()> {
        if self.debug {
            self.write_debug(context, out)?;
        }
        write!(out, "\r\x1b[1;34m🤖 {}:\x1b[0m\r\n", self.run.model_name)?;
        out.flush()?;

        let request = self.run.chat_request(Self::messages(query, context));
        match self.client.stream_chat(&request) {
            Ok(stream) => {
                for event in stream {
                    match event {
                        Ok(StreamEvent::Content(text)) => {
                            out.write_all(text.replace('\n', "\r\n").as_bytes())?;
                            out.flush()?;
                        }
                        Ok(StreamEvent::Reasoning(_)) => {}
                        Err(e) => {
                            write!(out, "\r\nError: {:#}\r\n", e)?;
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                tracing::debug!("Chat request failed: {:#}", e);
                write!(out, "\r\nError: {:#}\r\n", e)?;
            }
        }

        out.write_all(b"\r\n")?;
        out.flush()?;

        self.record(query, context);
        Ok(())
    }

    fn write_debug<W: Write>(&self, context: &str, out: &mut W) -> io::Result<()> {
        write!(
            out,
            "\r\n\x1b[1;30m[DEBUG] Model: {}\x1b[0m\r\n",
            self.run.model_name
        )?;
        write!(
            out,
            "\x1b[1;30m[DEBUG] System Prompt:\x1b[0m\r\n{}\r\n",
            SYSTEM_PROMPT.replace('\n', "\r\n")
        )?;
        write!(
            out,
            "\x1b[1;30m[DEBUG] Context:\x1b[0m\r\n{}\r\n",
            context.replace('\n', "\r\n")
        )
    }

    fn record(&self, query: &str, context: &str) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(e) = sink.record(&ShellEvent::session_interception(query, context)) {
            tracing::debug!("Failed to record interception: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, RunOverrides};
    use crate::llm::{ChatRequest, ChatStream};
    use anyhow::{Result, anyhow};
    use std::sync::Mutex;

    struct ScriptedClient {
        events: Vec<std::result::Result<StreamEvent, String>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ChatClient for ScriptedClient {
        fn stream_chat(&self, request: &ChatRequest) -> Result<ChatStream> {
            self.requests.lock().unwrap().push(request.clone());
            let events: Vec<Result<StreamEvent>> = self
                .events
                .iter()
                .map(|e| e.clone().map_err(|msg| anyhow!(msg)))
                .collect();
            Ok(Box::new(events.into_iter()))
        }
    }

    struct FailingClient;

    impl ChatClient for FailingClient {
        fn stream_chat(&self, _request: &ChatRequest) -> Result<ChatStream> {
            Err(anyhow!("API error (status 401): bad key"))
        }
    }

    fn run_config() -> RunConfig {
        let overrides = RunOverrides {
            model: Some("test-model".to_string()),
            ..Default::default()
        };
        RunConfig::resolve_with_env(&ConfigFile::default(), &overrides, |_| None).unwrap()
    }

    #[test]
    fn test_streams_content_with_crlf() {
        let client = Arc::new(ScriptedClient {
            events: vec![
                Ok(StreamEvent::Reasoning("thinking".to_string())),
                Ok(StreamEvent::Content("line one\nline".to_string())),
                Ok(StreamEvent::Content(" two".to_string())),
            ],
            requests: Mutex::new(Vec::new()),
        });
        let assistant = InlineAssistant::new(client.clone(), run_config());

        let mut out = Vec::new();
        assistant.answer("why?", "Command: ls", &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("test-model:"));
        assert!(text.contains("line one\r\nline two\r\n"));
        assert!(!text.contains("thinking"));

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "test-model");
        let user = &requests[0].messages[1].content;
        assert!(user.starts_with("<terminal-history>\nCommand: ls\n</terminal-history>"));
        assert!(user.ends_with("User Question: why?"));
    }

    #[test]
    fn test_client_error_printed_inline() {
        let assistant = InlineAssistant::new(Arc::new(FailingClient), run_config());

        let mut out = Vec::new();
        assistant.answer("q", "", &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\r\nError: API error (status 401): bad key\r\n"));
    }

    #[test]
    fn test_stream_error_stops_output() {
        let client = Arc::new(ScriptedClient {
            events: vec![
                Ok(StreamEvent::Content("partial".to_string())),
                Err("connection reset".to_string()),
                Ok(StreamEvent::Content("never".to_string())),
            ],
            requests: Mutex::new(Vec::new()),
        });
        let assistant = InlineAssistant::new(client, run_config());

        let mut out = Vec::new();
        assistant.answer("q", "", &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("partial\r\nError: connection reset"));
        assert!(!text.contains("never"));
    }

    #[test]
    fn test_debug_dumps_prompt_and_context() {
        let client = Arc::new(ScriptedClient {
            events: vec![Ok(StreamEvent::Content("ok".to_string()))],
            requests: Mutex::new(Vec::new()),
        });
        let assistant = InlineAssistant::new(client, run_config()).with_debug(true);

        let mut out = Vec::new();
        assistant
            .answer("q", "Command: ls\nExit Code: 0", &mut out)
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[DEBUG] Model: test-model"));
        assert!(text.contains("[DEBUG] System Prompt:\x1b[0m\r\nYou are a helpful CLI assistant."));
        assert!(text.contains("[DEBUG] Context:\x1b[0m\r\nCommand: ls\r\nExit Code: 0\r\n"));
        assert!(text.find("[DEBUG]").unwrap() < text.find("ok").unwrap());
    }

    #[test]
    fn test_no_debug_output_by_default() {
        let assistant = InlineAssistant::new(Arc::new(FailingClient), run_config());

        let mut out = Vec::new();
        assistant.answer("q", "ctx", &mut out).unwrap();
        assert!(!String::from_utf8(out).unwrap().contains("[DEBUG]"));
    }
}
