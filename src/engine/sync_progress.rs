//! Utilities to track the progression of a sync

use std::fmt::{Display, Error, Formatter};
use std::sync::Arc;

use crate::task::TaskSource;

/// An event that happens during a sync
#[derive(Clone, Debug, PartialEq)]
pub enum SyncEvent {
    /// Sync has not started
    NotStarted,
    /// Sync has just started but no source is handled yet
    Started,
    /// Sync is in progress.
    InProgress{ source: TaskSource, details: String },
    /// Sync is finished
    Finished{ success: bool, task_count: usize },
}

impl Display for SyncEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            SyncEvent::NotStarted => write!(f, "Not started"),
            SyncEvent::Started => write!(f, "Sync has started..."),
            SyncEvent::InProgress{source, details} => write!(f, "[{}] {}...", source.display_name(), details),
            SyncEvent::Finished{success, task_count} => match success {
                true => write!(f, "Sync successfully finished ({} tasks)", task_count),
                false => write!(f, "Sync finished with errors ({} tasks)", task_count),
            }
        }
    }
}

impl Default for SyncEvent {
    fn default() -> Self {
        Self::NotStarted
    }
}



/// See [`feedback_channel`]
pub type FeedbackSender = tokio::sync::watch::Sender<SyncEvent>;
/// See [`feedback_channel`]
pub type FeedbackReceiver = tokio::sync::watch::Receiver<SyncEvent>;

/// Create a feeback channel, that can be used to retrieve the current progress of a sync operation
pub fn feedback_channel() -> (FeedbackSender, FeedbackReceiver) {
    tokio::sync::watch::channel(SyncEvent::default())
}




/// A structure that tracks the progression and the errors that happen during a sync
///
/// Every error or warning is logged, and kept so that it can be reported in the [`SyncResult`](crate::engine::SyncResult)
#[derive(Debug, Default)]
pub struct SyncProgress {
    errors: Vec<String>,
    feedback_channel: Option<Arc<FeedbackSender>>,
}

impl SyncProgress {
    pub fn new() -> Self {
        Self { errors: Vec::new(), feedback_channel: None }
    }
    pub fn new_with_feedback_channel(channel: FeedbackSender) -> Self {
        Self { errors: Vec::new(), feedback_channel: Some(Arc::new(channel)) }
    }

    /// A tracker with no error yet, that reports to the same feedback channel.
    ///
    /// This is used to track concurrent parts of a sync. See [`Self::absorb`]
    pub fn fork(&self) -> Self {
        Self { errors: Vec::new(), feedback_channel: self.feedback_channel.clone() }
    }

    /// Append the errors of a forked tracker (they have been logged already)
    pub fn absorb(&mut self, other: SyncProgress) {
        self.errors.extend(other.errors);
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    /// Log an error
    pub fn error(&mut self, text: &str) {
        log::error!("{}", text);
        self.errors.push(text.to_string());
    }
    /// Log a warning
    pub fn warn(&mut self, text: &str) {
        log::warn!("{}", text);
        self.errors.push(text.to_string());
    }
    /// Log an info
    pub fn info(&self, text: &str) {
        log::info!("{}", text);
    }
    /// Log a debug message
    pub fn debug(&self, text: &str) {
        log::debug!("{}", text);
    }
    /// Send an event as a feedback to the listener (if any).
    pub fn feedback(&self, event: SyncEvent) {
        if let Some(sender) = &self.feedback_channel {
            // Nobody listening is fine
            let _ = sender.send(event);
        }
    }
}
