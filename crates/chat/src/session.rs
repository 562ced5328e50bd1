//! Conversation state for the chat client.
//!
//! The session is a small state machine:
//! `NoFile -> Selected -> Processing -> Ready`, where `Processing` can fall
//! back to `Selected` on failure. Only file re-selection resets the
//! transcript; a failed query while `Ready` stays `Ready`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NoFile,
    Selected,
    Processing,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

#[derive(Debug)]
pub struct Session {
    phase: Phase,
    file: Option<String>,
    transcript: Vec<Turn>,
    last_error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: Phase::NoFile,
            file: None,
            transcript: Vec::new(),
            last_error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Selecting a file (or re-selecting one) discards any prior transcript
    /// and pending error; allowed from every phase.
    pub fn select_file(&mut self, filename: impl Into<String>) {
        self.file = Some(filename.into());
        self.transcript.clear();
        self.last_error = None;
        self.phase = Phase::Selected;
    }

    /// User confirmed processing. Valid only from `Selected`.
    pub fn begin_processing(&mut self) -> bool {
        if self.phase != Phase::Selected {
            return false;
        }
        self.phase = Phase::Processing;
        true
    }

    /// Outcome of the ingestion call: success unlocks chat, failure falls
    /// back to `Selected` with the error surfaced for retry.
    pub fn finish_processing(&mut self, outcome: Result<(), String>) {
        debug_assert_eq!(self.phase, Phase::Processing);
        match outcome {
            Ok(()) => {
                self.last_error = None;
                self.phase = Phase::Ready;
            }
            Err(message) => {
                self.last_error = Some(message);
                self.phase = Phase::Selected;
            }
        }
    }

    /// Record the user's question. Valid only while `Ready`.
    pub fn push_question(&mut self, question: impl Into<String>) -> bool {
        if self.phase != Phase::Ready {
            return false;
        }
        self.transcript.push(Turn {
            role: Role::User,
            text: question.into(),
        });
        true
    }

    /// Record the assistant's reply (answer or error text). A query failure
    /// never transitions away from `Ready`.
    pub fn push_reply(&mut self, text: impl Into<String>) {
        self.transcript.push(Turn {
            role: Role::Assistant,
            text: text.into(),
        });
    }
}
