use core::fmt::{self, Display};
use serde_json::error::Category;
use std::io;

#[derive(Debug)]
pub enum Error {
    /// The payload is not valid JSON.
    Syntax,
    /// The payload is JSON but does not describe valid quizzes.
    Data(Box<str>),
    /// The catalog file could not be read or written.
    Io(io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Data => Self::Data(err.to_string().into_boxed_str()),
            Category::Io => Self::Io(err.into()),
            Category::Syntax | Category::Eof => Self::Syntax,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => f.write_str("Invalid JSON file."),
            Self::Data(reason) => write!(f, "Invalid quiz data: {reason}."),
            Self::Io(err) => write!(f, "Failed to access the quiz data: {err}."),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
