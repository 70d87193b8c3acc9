//! Voice input adapter: an optional second source of query text.
//!
//! A capture is a single utterance. The adapter is a two-state machine
//! (`Idle`, `Listening`); a capture ends on the first of `Result`, `Error`
//! or `End`, and anything the recognizer sends after that is dropped.

use crate::error::WorkflowError;
use core_types::CaptureState;
use core_types::config::VoiceSection;
use std::process::Stdio;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Environment variable carrying the capture language to external recognizers.
pub const LANGUAGE_ENV: &str = "VECTORVISTA_VOICE_LANGUAGE";
const LANGUAGE_PLACEHOLDER: &str = "{language}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Recognized transcript.
    Result(String),
    Error(String),
    /// Capture finished without speech.
    End,
}

/// Receiving half of one capture, held by the adapter.
#[derive(Debug)]
pub struct Capture {
    events: mpsc::Receiver<SpeechEvent>,
    cancel: Option<oneshot::Sender<()>>,
}

/// Sending half of one capture, held by the recognizer.
#[derive(Debug)]
pub struct CaptureFeed {
    pub events: mpsc::Sender<SpeechEvent>,
    /// Resolves when the adapter cancels or drops the capture.
    pub cancelled: oneshot::Receiver<()>,
}

impl Capture {
    pub fn channel() -> (CaptureFeed, Capture) {
        let (event_tx, event_rx) = mpsc::channel(4);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        (
            CaptureFeed {
                events: event_tx,
                cancelled: cancel_rx,
            },
            Capture {
                events: event_rx,
                cancel: Some(cancel_tx),
            },
        )
    }

    fn cancel(mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }
}

/// On-device speech-to-text capability.
pub trait SpeechRecognizer: Send {
    /// Begin a single, non-continuous capture in `language`.
    fn start(&mut self, language: &str) -> Result<Capture, WorkflowError>;
}

pub struct VoiceInput {
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    language: String,
    state: CaptureState,
    active: Option<Capture>,
}

impl std::fmt::Debug for VoiceInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceInput")
            .field("available", &self.is_available())
            .field("language", &self.language)
            .field("state", &self.state)
            .finish()
    }
}

impl VoiceInput {
    pub fn new(recognizer: Box<dyn SpeechRecognizer>, language: impl Into<String>) -> Self {
        Self {
            recognizer: Some(recognizer),
            language: language.into(),
            state: CaptureState::Idle,
            active: None,
        }
    }

    /// Adapter for hosts without speech capture; every call is a no-op.
    pub fn unsupported() -> Self {
        Self {
            recognizer: None,
            language: String::new(),
            state: CaptureState::Idle,
            active: None,
        }
    }

    /// Build from configuration: an empty command means no capability.
    pub fn from_config(cfg: &VoiceSection) -> Self {
        match CommandRecognizer::from_argv(&cfg.command) {
            Some(recognizer) => Self::new(Box::new(recognizer), cfg.language.clone()),
            None => Self::unsupported(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == CaptureState::Listening
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Begin a capture. No-op while already listening or when unsupported.
    pub fn start(&mut self) {
        if self.is_listening() {
            debug!("voice capture already active");
            return;
        }
        let Some(recognizer) = self.recognizer.as_mut() else {
            debug!("{}", WorkflowError::UnsupportedCapability);
            return;
        };
        match recognizer.start(&self.language) {
            Ok(capture) => {
                self.active = Some(capture);
                self.state = CaptureState::Listening;
            }
            Err(err) => warn!(error = %err, "failed to start speech recognition"),
        }
    }

    /// Cancel the current capture, leaving the query text alone.
    pub fn stop(&mut self) {
        if let Some(capture) = self.active.take() {
            capture.cancel();
        }
        self.state = CaptureState::Idle;
    }

    /// Start when idle, stop when listening.
    pub fn toggle(&mut self) {
        if self.is_listening() {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Wait for the active capture's next event. A recognizer that hangs up
    /// without a word is reported as [`SpeechEvent::End`].
    pub async fn next_event(&mut self) -> Option<SpeechEvent> {
        let capture = self.active.as_mut()?;
        Some(capture.events.recv().await.unwrap_or(SpeechEvent::End))
    }

    /// Apply an event to `query`. Returns whether the text changed.
    pub fn apply(&mut self, event: SpeechEvent, query: &mut String) -> bool {
        if !self.is_listening() {
            debug!(?event, "dropping speech event outside a capture");
            return false;
        }
        // the first event of a capture is its last
        self.active = None;
        self.state = CaptureState::Idle;

        match event {
            SpeechEvent::Result(transcript) => {
                append_transcript(query, &transcript);
                true
            }
            SpeechEvent::Error(reason) => {
                warn!("{}", WorkflowError::MediaCaptureFailure(reason));
                false
            }
            SpeechEvent::End => false,
        }
    }

    /// Wait for the current capture to finish and apply its outcome.
    pub async fn listen(&mut self, query: &mut String) -> bool {
        match self.next_event().await {
            Some(event) => self.apply(event, query),
            None => false,
        }
    }
}

fn append_transcript(query: &mut String, transcript: &str) {
    if !query.is_empty() {
        query.push(' ');
    }
    query.push_str(transcript);
}

/// Recognizer backed by an external speech-to-text program.
///
/// The program gets the language through [`LANGUAGE_ENV`] and in place of
/// any `{language}` argument. Its first non-empty stdout line is the
/// transcript; empty output means nothing was said.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn start(&mut self, language: &str) -> Result<Capture, WorkflowError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| WorkflowError::MediaCaptureFailure(e.to_string()))?;

        let child = tokio::process::Command::new(&self.program)
            .args(self.args.iter().map(|a| a.replace(LANGUAGE_PLACEHOLDER, language)))
            .env(LANGUAGE_ENV, language)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WorkflowError::MediaCaptureFailure(format!("{}: {e}", self.program)))?;

        let (feed, capture) = Capture::channel();
        runtime.spawn(drive_command(child, feed));
        Ok(capture)
    }
}

async fn drive_command(child: tokio::process::Child, feed: CaptureFeed) {
    let CaptureFeed { events, cancelled } = feed;
    tokio::select! {
        output = child.wait_with_output() => {
            let event = match output {
                Ok(out) if out.status.success() => transcript_event(&out.stdout),
                Ok(out) => SpeechEvent::Error(format!("recognizer exited with {}", out.status)),
                Err(err) => SpeechEvent::Error(err.to_string()),
            };
            let _ = events.send(event).await;
        }
        // dropping the output future kills the child
        _ = cancelled => debug!("speech capture cancelled"),
    }
}

fn transcript_event(stdout: &[u8]) -> SpeechEvent {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map_or(SpeechEvent::End, |line| SpeechEvent::Result(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRecognizer;

    fn adapter() -> (VoiceInput, FakeRecognizer) {
        let recognizer = FakeRecognizer::default();
        (VoiceInput::new(Box::new(recognizer.clone()), "en-US"), recognizer)
    }

    #[tokio::test]
    async fn result_appends_with_space_and_returns_to_idle() {
        let (mut voice, recognizer) = adapter();
        let mut query = String::from("show");
        voice.start();
        assert_eq!(voice.state(), CaptureState::Listening);

        let feed = recognizer.take_feed();
        feed.events
            .send(SpeechEvent::Result("pending orders".into()))
            .await
            .unwrap();
        assert!(voice.listen(&mut query).await);
        assert_eq!(query, "show pending orders");
        assert_eq!(voice.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn result_into_empty_query_has_no_leading_space() {
        let (mut voice, recognizer) = adapter();
        let mut query = String::new();
        voice.start();
        let feed = recognizer.take_feed();
        feed.events.send(SpeechEvent::Result("hello".into())).await.unwrap();
        voice.listen(&mut query).await;
        assert_eq!(query, "hello");
    }

    #[tokio::test]
    async fn error_and_end_leave_text_alone() {
        let (mut voice, recognizer) = adapter();
        let mut query = String::from("keep");

        voice.start();
        let feed = recognizer.take_feed();
        feed.events.send(SpeechEvent::Error("no-speech".into())).await.unwrap();
        assert!(!voice.listen(&mut query).await);
        assert_eq!(voice.state(), CaptureState::Idle);

        voice.start();
        let feed = recognizer.take_feed();
        drop(feed);
        assert!(!voice.listen(&mut query).await);
        assert_eq!(query, "keep");
        assert_eq!(voice.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn start_while_listening_does_not_spawn_second_capture() {
        let (mut voice, recognizer) = adapter();
        voice.start();
        voice.start();
        voice.toggle();
        voice.toggle();
        assert_eq!(voice.state(), CaptureState::Listening);
        // start, start (no-op), stop, start
        assert_eq!(recognizer.start_count(), 2);
    }

    #[tokio::test]
    async fn events_after_first_terminal_event_are_dropped() {
        let (mut voice, recognizer) = adapter();
        let mut query = String::new();
        voice.start();
        let feed = recognizer.take_feed();
        feed.events.send(SpeechEvent::Result("one".into())).await.unwrap();
        let _ = feed.events.send(SpeechEvent::Result("two".into())).await;

        voice.listen(&mut query).await;
        assert!(!voice.apply(SpeechEvent::Result("two".into()), &mut query));
        assert!(voice.next_event().await.is_none());
        assert_eq!(query, "one");
    }

    #[tokio::test]
    async fn stop_cancels_without_touching_text() {
        let (mut voice, recognizer) = adapter();
        let mut query = String::from("draft");
        voice.start();
        let feed = recognizer.take_feed();
        voice.stop();
        assert!(feed.cancelled.await.is_ok());
        assert_eq!(voice.state(), CaptureState::Idle);
        assert!(!voice.listen(&mut query).await);
        assert_eq!(query, "draft");
    }

    #[test]
    fn failed_start_stays_idle() {
        let recognizer = FakeRecognizer {
            fail_with: Some("microphone busy".into()),
            ..FakeRecognizer::default()
        };
        let mut voice = VoiceInput::new(Box::new(recognizer), "en-US");
        voice.start();
        assert_eq!(voice.state(), CaptureState::Idle);
    }

    #[tokio::test]
    async fn unsupported_adapter_is_a_permanent_no_op() {
        let mut voice = VoiceInput::from_config(&VoiceSection::default());
        assert!(!voice.is_available());
        voice.start();
        voice.toggle();
        assert_eq!(voice.state(), CaptureState::Idle);
        let mut query = String::from("q");
        assert!(!voice.listen(&mut query).await);
        assert_eq!(query, "q");
    }

    #[test]
    fn transcript_is_first_non_empty_line() {
        assert_eq!(
            transcript_event(b"\n  show orders \nignored\n"),
            SpeechEvent::Result("show orders".into())
        );
        assert_eq!(transcript_event(b"\n \n"), SpeechEvent::End);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_recognizer_reads_transcript_from_stdout() {
        let argv = vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo \"lang $VECTORVISTA_VOICE_LANGUAGE {language}\"".to_string(),
        ];
        let recognizer = CommandRecognizer::from_argv(&argv).unwrap();
        let mut voice = VoiceInput::new(Box::new(recognizer), "en-US");
        let mut query = String::new();
        voice.start();
        assert!(voice.listen(&mut query).await);
        assert_eq!(query, "lang en-US en-US");
    }
}
