use crate::fetch::FetchError;
use core::fmt::{self, Display};

#[derive(Debug)]
pub enum Error {
    UnsupportedInteraction,
    UnknownUser,
    UnknownChannel,
    UnknownCommandName,
    InvalidParams,
    Forbidden(&'static str),
    UnknownQuiz,
    MissingAttachment,
    NotJson,
    TooLarge,
    UntrustedSource,
    Download(FetchError),
    Catalog(db::error::Error),
    Lobby(lobby::error::Error),
    Fatal,
}

impl From<db::error::Error> for Error {
    fn from(err: db::error::Error) -> Self {
        Self::Catalog(err)
    }
}

impl From<lobby::error::Error> for Error {
    fn from(err: lobby::error::Error) -> Self {
        Self::Lobby(err)
    }
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::TooLarge => Self::TooLarge,
            other => Self::Download(other),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnsupportedInteraction => "This interaction is not supported.",
            Self::UnknownUser => "We could not identify who sent this interaction.",
            Self::UnknownChannel => "Quizzes can only be run inside a channel.",
            Self::UnknownCommandName => "Unknown command.",
            Self::InvalidParams => "Unacceptable command arguments.",
            Self::Forbidden(reason) => reason,
            Self::UnknownQuiz => "Quiz not found.",
            Self::MissingAttachment => "Please attach a JSON file with the quiz data.",
            Self::NotJson => "The file must be a JSON file.",
            Self::TooLarge => "The quiz file is too large.",
            Self::UntrustedSource => "The attachment must be hosted on the Discord CDN.",
            Self::Download(_) => "Failed to download the quiz file. Please try again.",
            Self::Catalog(db::error::Error::Io(_)) => "Failed to save the quiz data.",
            Self::Catalog(err) => return Display::fmt(err, f),
            Self::Lobby(err) => return Display::fmt(err, f),
            Self::Fatal => "Oops! We encountered a logic error on our end. This is a bug.",
        })
    }
}

pub type Result<T> = core::result::Result<T, Error>;
