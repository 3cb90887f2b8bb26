use core::fmt::{self, Display};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// The channel already hosts a quiz.
    AlreadyRunning,
    /// The channel has no quiz, or it has just ended.
    NoActiveQuiz,
    /// Someone other than the starter tried to advance.
    NotStarter,
    /// The label is not an option of the current question.
    UnknownOption,
    /// The button belongs to a question that has already closed.
    StaleQuestion,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AlreadyRunning => "A quiz is already running in this channel.",
            Self::NoActiveQuiz => {
                "No quiz is currently running in this channel. Use `/start_quiz` to start a quiz."
            }
            Self::NotStarter => "Only the quiz starter can move to the next question.",
            Self::UnknownOption => "That option is not part of the current question.",
            Self::StaleQuestion => "This question has already closed.",
        })
    }
}

impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
