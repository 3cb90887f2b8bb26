use crate::{
    error::{Error, Result},
    messenger::ChannelId,
    session::QuizSession,
    throttle::Throttle,
};
use core::time::Duration;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A session as shared between concurrent handlers.
pub struct LiveQuiz {
    channel: ChannelId,
    /// Serializes transitions, including their platform calls. Never taken by votes.
    transition: Mutex<()>,
    /// Every read-modify-write of the session happens under this lock. It is
    /// never held across a platform call.
    state: Mutex<QuizSession>,
    /// Rate limiter for the vote counter message.
    throttle: Throttle,
}

impl LiveQuiz {
    pub fn new(channel: ChannelId, session: QuizSession, window: Duration) -> Self {
        Self { channel, transition: Mutex::new(()), state: Mutex::new(session), throttle: Throttle::new(window) }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn transition(&self) -> &Mutex<()> {
        &self.transition
    }

    pub fn state(&self) -> &Mutex<QuizSession> {
        &self.state
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }
}

/// At most one live quiz per channel.
#[derive(Default)]
pub struct Registry(DashMap<ChannelId, Arc<LiveQuiz>>);

impl Registry {
    /// Publishes `quiz` for `channel`. The first writer wins.
    pub fn create(&self, channel: ChannelId, quiz: Arc<LiveQuiz>) -> Result<()> {
        match self.0.entry(channel) {
            Entry::Vacant(entry) => {
                entry.insert(quiz);
                Ok(())
            }
            Entry::Occupied(_) => Err(Error::AlreadyRunning),
        }
    }

    pub fn get(&self, channel: ChannelId) -> Result<Arc<LiveQuiz>> {
        self.0.get(&channel).map(|entry| Arc::clone(entry.value())).ok_or(Error::NoActiveQuiz)
    }

    pub fn remove(&self, channel: ChannelId) -> Option<Arc<LiveQuiz>> {
        self.0.remove(&channel).map(|(_, quiz)| quiz)
    }

    /// Removes the entry only if it still refers to `quiz`, so that a finishing
    /// quiz never evicts a newer one started after a force quit.
    pub fn remove_exact(&self, quiz: &Arc<LiveQuiz>) -> bool {
        self.0.remove_if(&quiz.channel, |_, active| Arc::ptr_eq(active, quiz)).is_some()
    }

    pub fn contains(&self, channel: ChannelId) -> bool {
        self.0.contains_key(&channel)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
