//! The seam between the quiz state machine and the chat platform.

use core::{
    fmt::{self, Display},
    future::Future,
};
use twilight_model::id::{
    marker::{ChannelMarker, MessageMarker},
    Id,
};

pub type ChannelId = Id<ChannelMarker>;
pub type MessageId = Id<MessageMarker>;

/// A failed call to the chat platform. None of these are fatal to a quiz.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlatformError {
    /// The platform asked us to slow down.
    RateLimited,
    /// The message or channel no longer exists.
    Gone,
    /// We lost the permission to post or edit.
    Forbidden,
    /// Anything else: network failures, rejected payloads, server errors.
    Unavailable(Box<str>),
}

impl Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => f.write_str("rate limited"),
            Self::Gone => f.write_str("message or channel no longer exists"),
            Self::Forbidden => f.write_str("missing permissions"),
            Self::Unavailable(reason) => f.write_str(reason),
        }
    }
}

impl std::error::Error for PlatformError {}

/// Where a control was rendered: which session, and which of its questions.
/// Clicks on controls from an earlier question or an earlier session in the same
/// channel carry a different origin and can be told apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Origin {
    pub session: u32,
    pub question: usize,
}

impl Origin {
    /// The identifier of the control for `label`, as `{session:x}:{question}:{label}`.
    pub fn control_id(&self, label: &str) -> String {
        format!("{:x}:{}:{label}", self.session, self.question)
    }
}

/// The buttons rendered for a single question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlSet {
    origin: Origin,
    labels: Box<[Box<str>]>,
}

impl ControlSet {
    pub fn new(origin: Origin, labels: &[Box<str>]) -> Self {
        Self { origin, labels: labels.into() }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn question(&self) -> usize {
        self.origin.question
    }

    /// Yields the identifier and label of every control, in display order.
    pub fn controls(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        self.labels.iter().map(|label| (self.origin.control_id(label), &**label))
    }

    /// Splits a control identifier back into its origin and label.
    pub fn parse_id(id: &str) -> Option<(Origin, &str)> {
        let mut parts = id.splitn(3, ':');
        let session = u32::from_str_radix(parts.next()?, 16).ok()?;
        let question = parts.next()?.parse().ok()?;
        let label = parts.next()?;
        Some((Origin { session, question }, label))
    }
}

/// Everything the flow controller needs from the platform.
pub trait Messenger: Send + Sync + 'static {
    /// Posts a message to `channel`, optionally with interactive controls.
    fn send(
        &self,
        channel: ChannelId,
        content: &str,
        controls: Option<&ControlSet>,
    ) -> impl Future<Output = Result<MessageId, PlatformError>> + Send;

    /// Replaces the text of an existing message.
    fn edit(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: &str,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Re-renders the controls of an existing message in their disabled state.
    fn disable(
        &self,
        channel: ChannelId,
        message: MessageId,
        controls: &ControlSet,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;
}
