pub mod error;
pub mod ledger;
pub mod messenger;
pub mod registry;
pub mod results;
pub mod session;
pub mod throttle;

use core::{
    fmt::{self, Display},
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};
use error::{Error, Result};
use ledger::{UserId, VoteOutcome};
use messenger::{ChannelId, ControlSet, Messenger, Origin, PlatformError};
use model::Quiz;
use registry::{LiveQuiz, Registry};
use session::{Prompt, QuizSession};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

pub use throttle::QUIESCENCE;

/// A platform call that failed without stopping the quiz.
#[derive(Debug)]
pub struct Warning {
    action: &'static str,
    error: PlatformError,
}

impl Warning {
    fn new(channel: ChannelId, action: &'static str, error: PlatformError) -> Self {
        log::warn!("channel {channel}: failed to {action}: {error}");
        Self { action, error }
    }

    pub fn error(&self) -> &PlatformError {
        &self.error
    }
}

impl Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to {} ({}).", self.action, self.error)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    /// Question `number` (one-based) of `total` is now open for votes.
    Question { number: usize, total: usize },
    /// The session is gone, either past its last question or force quit mid-transition.
    Finished,
}

/// Result of moving a session forward. Soft failures are collected rather than
/// aborting the transition.
#[derive(Debug)]
pub struct Transition {
    pub step: Step,
    pub warnings: Vec<Warning>,
}

/// What a transition has to tell the platform, captured under the session lock.
struct Handover {
    name: Box<str>,
    /// Prompt of the question being closed.
    closed: Option<Prompt>,
    /// Results of the question being closed, frozen at the moment of the transition.
    table: Option<String>,
    /// `None` once the quiz has run out of questions.
    opening: Option<Opening>,
    total: usize,
}

struct Opening {
    number: usize,
    content: String,
    controls: ControlSet,
}

impl Handover {
    /// Closes the open question and moves the cursor forward.
    fn take(state: &mut QuizSession) -> Self {
        let closed = state.take_prompt();
        let table = state.question_index().map(|_| results::table(state.ledger()));
        let quiz = Arc::clone(state.quiz());
        let session = state.id();
        let opening = state.begin_next().map(|index| {
            let question = &quiz.questions()[index];
            Opening {
                number: index + 1,
                content: results::prompt(index, question.prompt()),
                controls: ControlSet::new(Origin { session, question: index }, question.options()),
            }
        });
        Self { name: state.name().into(), closed, table, opening, total: quiz.len() }
    }
}

/// Owns every running quiz and drives them through their questions.
pub struct Lobby<M> {
    registry: Registry,
    messenger: Arc<M>,
    window: Duration,
    /// Source of session nonces.
    sessions: AtomicU32,
}

impl<M: Messenger> Lobby<M> {
    pub fn new(messenger: Arc<M>) -> Self {
        Self::with_window(messenger, QUIESCENCE)
    }

    /// Uses a custom quiescence window for the vote counter.
    pub fn with_window(messenger: Arc<M>, window: Duration) -> Self {
        // Only has to differ across restarts so that old buttons never match.
        let seed = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.as_millis() as u32);
        Self { registry: Registry::default(), messenger, window, sessions: AtomicU32::new(seed) }
    }

    pub fn messenger(&self) -> &Arc<M> {
        &self.messenger
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Starts `quiz` in `channel` and immediately shows its first question.
    /// Callers are expected to have authorized `starter` already.
    pub async fn start(
        &self,
        channel: ChannelId,
        starter: UserId,
        name: &str,
        quiz: Arc<Quiz>,
        multiple: bool,
    ) -> Result<Transition> {
        let id = self.sessions.fetch_add(1, Ordering::Relaxed);
        let session = QuizSession::new(id, name, quiz, starter, multiple);
        let live = Arc::new(LiveQuiz::new(channel, session, self.window));

        let _turn = live.transition().lock().await;
        let handover = {
            let mut state = live.state().lock().await;
            self.registry.create(channel, Arc::clone(&live))?;
            Handover::take(&mut state)
        };

        log::info!("channel {channel}: {starter} started quiz {name:?} (multiple answers: {multiple})");
        let transition = self.advance(&live, handover).await;
        Ok(transition)
    }

    /// Closes the current question, posts its results, and opens the next one.
    pub async fn next(&self, channel: ChannelId, invoker: UserId) -> Result<Transition> {
        let live = self.registry.get(channel)?;
        let _turn = live.transition().lock().await;
        let handover = {
            let mut state = live.state().lock().await;
            if state.is_finished() {
                return Err(Error::NoActiveQuiz);
            }

            if state.starter() != invoker {
                return Err(Error::NotStarter);
            }

            Handover::take(&mut state)
        };

        let transition = self.advance(&live, handover).await;
        Ok(transition)
    }

    /// Records a press of the control rendered at `origin` and schedules a counter refresh.
    pub async fn vote(&self, channel: ChannelId, voter: UserId, origin: Origin, label: &str) -> Result<VoteOutcome> {
        let live = self.registry.get(channel)?;
        let outcome = live.state().lock().await.record_vote(voter, origin, label)?;
        self.refresh_counter(live);
        Ok(outcome)
    }

    /// Ends the quiz in `channel` without posting results.
    pub async fn force_quit(&self, channel: ChannelId) -> Result<Vec<Warning>> {
        let live = self.registry.remove(channel).ok_or(Error::NoActiveQuiz)?;
        let (name, prompt) = {
            let mut state = live.state().lock().await;
            state.finish();
            (Box::<str>::from(state.name()), state.take_prompt())
        };

        let mut warnings = Vec::new();
        if let Some(Prompt { message, controls }) = prompt {
            if let Err(error) = self.messenger.disable(channel, message, &controls).await {
                warnings.push(Warning::new(channel, "disable the current question's buttons", error));
            }
        }

        log::info!("channel {channel}: quiz {name:?} was force quit");
        Ok(warnings)
    }

    /// The platform half of a transition. Must be called with the transition lock
    /// held and the session lock released.
    async fn advance(&self, live: &Arc<LiveQuiz>, handover: Handover) -> Transition {
        let Handover { name, closed, table, opening, total } = handover;
        let channel = live.channel();
        let mut warnings = Vec::new();

        if opening.is_none() {
            self.registry.remove_exact(live);
        }

        if let Some(Prompt { message, controls }) = closed {
            if let Err(error) = self.messenger.disable(channel, message, &controls).await {
                warnings.push(Warning::new(channel, "disable the previous question's buttons", error));
            }
        }

        if let Some(table) = table {
            if let Err(error) = self.messenger.send(channel, &table, None).await {
                warnings.push(Warning::new(channel, "post the results", error));
            }
        }

        let Some(Opening { number, content, controls }) = opening else {
            if let Err(error) = self.messenger.send(channel, "The quiz has ended!", None).await {
                warnings.push(Warning::new(channel, "announce the end of the quiz", error));
            }
            log::info!("channel {channel}: quiz {name:?} has ended");
            return Transition { step: Step::Finished, warnings };
        };

        let prompt = match self.messenger.send(channel, &content, Some(&controls)).await {
            Ok(message) => Some(Prompt { message, controls }),
            Err(error) => {
                warnings.push(Warning::new(channel, "post the next question", error));
                None
            }
        };

        let counter = match self.messenger.send(channel, &results::counter(0), None).await {
            Ok(counter) => Some(counter),
            Err(error) => {
                warnings.push(Warning::new(channel, "post the vote counter", error));
                None
            }
        };

        let (orphan, catch_up) = {
            let mut state = live.state().lock().await;
            if state.is_finished() {
                // Force quit while the question was being posted.
                (prompt, false)
            } else {
                if let Some(prompt) = prompt {
                    state.set_prompt(prompt);
                }
                state.set_counter(counter);
                (None, state.ledger().total() > 0)
            }
        };

        if let Some(Prompt { message, controls }) = orphan {
            if let Err(error) = self.messenger.disable(channel, message, &controls).await {
                warnings.push(Warning::new(channel, "disable the buttons of a quit quiz", error));
            }
            return Transition { step: Step::Finished, warnings };
        }

        // Votes that arrived before the counter existed still need to be shown.
        if catch_up {
            self.refresh_counter(Arc::clone(live));
        }

        log::info!("channel {channel}: quiz {name:?} opened question {number}");
        Transition { step: Step::Question { number, total }, warnings }
    }

    fn refresh_counter(&self, live: Arc<LiveQuiz>) {
        if !live.throttle().request() {
            return;
        }

        let messenger = Arc::clone(&self.messenger);
        tokio::spawn(async move {
            let messenger = &*messenger;
            let live = &*live;
            live.throttle().settle(move || publish_counter(messenger, live)).await;
        });
    }
}

/// Writes the current total into the counter message. Returns whether the edit went through.
async fn publish_counter<M: Messenger>(messenger: &M, live: &LiveQuiz) -> bool {
    let snapshot = {
        let state = live.state().lock().await;
        state.counter().filter(|_| !state.is_finished()).map(|counter| (counter, state.ledger().total()))
    };

    let Some((counter, total)) = snapshot else {
        return false;
    };

    match messenger.edit(live.channel(), counter, &results::counter(total)).await {
        Ok(()) => true,
        Err(error) => {
            log::debug!("channel {}: skipped a vote counter refresh: {error}", live.channel());
            false
        }
    }
}
