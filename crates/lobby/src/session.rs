use crate::{
    error::{Error, Result},
    ledger::{Ledger, Mode, UserId, VoteOutcome},
    messenger::{ControlSet, MessageId, Origin},
};
use model::{Question, Quiz};
use std::sync::Arc;

/// The message currently showing a question together with its buttons.
#[derive(Clone, Debug)]
pub struct Prompt {
    pub message: MessageId,
    pub controls: ControlSet,
}

/// One running quiz.
pub struct QuizSession {
    /// Nonce embedded in every control this session renders.
    id: u32,
    name: Box<str>,
    /// Snapshot of the catalog entry at start time.
    quiz: Arc<Quiz>,
    starter: UserId,
    /// `None` until the first question is shown. Reaching `quiz.len()` is terminal.
    index: Option<usize>,
    ledger: Ledger,
    prompt: Option<Prompt>,
    counter: Option<MessageId>,
    finished: bool,
}

impl QuizSession {
    pub fn new(id: u32, name: impl Into<Box<str>>, quiz: Arc<Quiz>, starter: UserId, multiple: bool) -> Self {
        let mode = if multiple { Mode::Multiple } else { Mode::Single };
        Self {
            id,
            name: name.into(),
            quiz,
            starter,
            index: None,
            ledger: Ledger::new(mode),
            prompt: None,
            counter: None,
            finished: false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quiz(&self) -> &Arc<Quiz> {
        &self.quiz
    }

    pub fn starter(&self) -> UserId {
        self.starter
    }

    pub fn allows_multiple(&self) -> bool {
        self.ledger.mode() == Mode::Multiple
    }

    pub fn question_index(&self) -> Option<usize> {
        self.index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.get(self.index?)
    }

    /// The origin of the controls for the open question, if any.
    pub fn origin(&self) -> Option<Origin> {
        if self.finished {
            return None;
        }
        Some(Origin { session: self.id, question: self.index? })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn counter(&self) -> Option<MessageId> {
        self.counter
    }

    pub fn set_counter(&mut self, counter: Option<MessageId>) {
        self.counter = counter;
    }

    pub fn set_prompt(&mut self, prompt: Prompt) {
        self.prompt = Some(prompt);
    }

    pub fn take_prompt(&mut self) -> Option<Prompt> {
        self.prompt.take()
    }

    /// Records a vote cast through a control rendered at `origin`.
    pub fn record_vote(&mut self, voter: UserId, origin: Origin, label: &str) -> Result<VoteOutcome> {
        if self.finished {
            return Err(Error::NoActiveQuiz);
        }

        if self.origin() != Some(origin) {
            return Err(Error::StaleQuestion);
        }

        self.ledger.record(voter, label)
    }

    /// Moves the cursor forward and clears the ledger for the new question.
    /// Returns `None` once the quiz has run out of questions, which also marks
    /// the session as finished.
    pub fn begin_next(&mut self) -> Option<usize> {
        debug_assert!(!self.finished, "advanced a finished quiz");
        let next = self.index.map_or(0, |index| index + 1).min(self.quiz.len());
        self.index = Some(next);
        self.counter = None;

        let Some(question) = self.quiz.get(next) else {
            self.ledger.reset(&[]);
            self.finished = true;
            return None;
        };

        self.ledger.reset(question.options());
        Some(next)
    }

    /// Ends the session early. Later votes report that no quiz is running.
    pub fn finish(&mut self) {
        self.finished = true;
        self.counter = None;
    }
}

#[cfg(test)]
mod tests {
    use super::QuizSession;
    use crate::{error::Error, ledger::UserId, messenger::Origin};
    use model::{Question, Quiz};
    use std::sync::Arc;

    const ID: u32 = 7;

    fn science() -> Arc<Quiz> {
        let first = Question::new("Is water wet?", ["Yes", "No"]).unwrap();
        let second = Question::new("Is fire hot?", ["Yes", "No"]).unwrap();
        Arc::new(Quiz::new(vec![first, second]).unwrap())
    }

    fn at(question: usize) -> Origin {
        Origin { session: ID, question }
    }

    #[test]
    fn cursor_walks_to_terminal() {
        let mut session = QuizSession::new(ID, "science", science(), UserId::new(1), false);
        assert_eq!(session.question_index(), None);
        assert!(session.current_question().is_none());
        assert_eq!(session.origin(), None);

        assert_eq!(session.begin_next(), Some(0));
        assert_eq!(session.current_question().unwrap().prompt(), "Is water wet?");
        assert_eq!(session.origin(), Some(at(0)));
        assert_eq!(session.begin_next(), Some(1));
        assert_eq!(session.begin_next(), None);
        assert_eq!(session.question_index(), Some(2));
        assert!(session.is_finished());
        assert_eq!(session.origin(), None);
    }

    #[test]
    fn votes_only_count_for_the_open_question() {
        let mut session = QuizSession::new(ID, "science", science(), UserId::new(1), false);
        let voter = UserId::new(7);
        assert_eq!(session.record_vote(voter, at(0), "Yes"), Err(Error::StaleQuestion));

        session.begin_next();
        session.record_vote(voter, at(0), "Yes").unwrap();
        assert_eq!(session.ledger().total(), 1);

        session.begin_next();
        assert_eq!(session.ledger().total(), 0);
        assert_eq!(session.record_vote(voter, at(0), "Yes"), Err(Error::StaleQuestion));
        session.record_vote(voter, at(1), "No").unwrap();

        session.finish();
        assert_eq!(session.record_vote(voter, at(1), "No"), Err(Error::NoActiveQuiz));
    }

    #[test]
    fn controls_of_another_session_are_stale() {
        let mut session = QuizSession::new(ID, "science", science(), UserId::new(1), false);
        session.begin_next();
        let other = Origin { session: ID + 1, question: 0 };
        assert_eq!(session.record_vote(UserId::new(7), other, "Yes"), Err(Error::StaleQuestion));
        assert_eq!(session.ledger().total(), 0);
    }
}
