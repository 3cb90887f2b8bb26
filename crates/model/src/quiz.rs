use alloc::{boxed::Box, collections::BTreeSet, string::String, vec::Vec};
use core::fmt::{self, Display};
use serde::{Deserialize, Serialize};

/// Fewest options a question may offer.
pub const MIN_OPTIONS: usize = 2;
/// Discord allows at most five action rows of five buttons each.
pub const MAX_OPTIONS: usize = 25;
/// Discord rejects button labels longer than this.
pub const MAX_LABEL_LENGTH: usize = 80;

#[derive(Debug, PartialEq, Eq)]
pub enum InvalidQuiz {
    NoQuestions,
    TooFewOptions,
    TooManyOptions,
    EmptyOption,
    OptionTooLong,
    DuplicateOption,
}

impl Display for InvalidQuiz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoQuestions => "a quiz needs at least one question",
            Self::TooFewOptions => "a question needs at least two options",
            Self::TooManyOptions => "a question may have at most 25 options",
            Self::EmptyOption => "options must not be empty",
            Self::OptionTooLong => "options must be at most 80 characters long",
            Self::DuplicateOption => "options must be unique within a question",
        })
    }
}

/// Wire schema of a single question.
#[derive(Deserialize, Serialize)]
struct RawQuestion {
    question: String,
    options: Vec<String>,
}

/// A validated question. The options are guaranteed to be unique, non-empty,
/// and between [`MIN_OPTIONS`] and [`MAX_OPTIONS`] in number.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "RawQuestion", into = "RawQuestion")]
pub struct Question {
    prompt: Box<str>,
    options: Box<[Box<str>]>,
}

impl Question {
    pub fn new<P, I, O>(prompt: P, options: I) -> Result<Self, InvalidQuiz>
    where
        P: Into<Box<str>>,
        I: IntoIterator<Item = O>,
        O: Into<Box<str>>,
    {
        let options: Box<[Box<str>]> = options.into_iter().map(Into::into).collect();
        if options.len() < MIN_OPTIONS {
            return Err(InvalidQuiz::TooFewOptions);
        }

        if options.len() > MAX_OPTIONS {
            return Err(InvalidQuiz::TooManyOptions);
        }

        let mut seen = BTreeSet::new();
        for option in options.iter() {
            if option.trim().is_empty() {
                return Err(InvalidQuiz::EmptyOption);
            }
            if option.chars().count() > MAX_LABEL_LENGTH {
                return Err(InvalidQuiz::OptionTooLong);
            }
            if !seen.insert(option.as_ref()) {
                return Err(InvalidQuiz::DuplicateOption);
            }
        }

        drop(seen);
        Ok(Self { prompt: prompt.into(), options })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[Box<str>] {
        &self.options
    }
}

impl TryFrom<RawQuestion> for Question {
    type Error = InvalidQuiz;
    fn try_from(RawQuestion { question, options }: RawQuestion) -> Result<Self, Self::Error> {
        Self::new(question, options)
    }
}

impl From<Question> for RawQuestion {
    fn from(Question { prompt, options }: Question) -> Self {
        Self { question: prompt.into(), options: options.into_vec().into_iter().map(String::from).collect() }
    }
}

#[derive(Deserialize, Serialize)]
struct RawQuiz {
    questions: Vec<Question>,
}

/// An ordered, non-empty sequence of questions.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "RawQuiz", into = "RawQuiz")]
pub struct Quiz {
    questions: Box<[Question]>,
}

impl Quiz {
    pub fn new(questions: Vec<Question>) -> Result<Self, InvalidQuiz> {
        if questions.is_empty() {
            return Err(InvalidQuiz::NoQuestions);
        }
        Ok(Self { questions: questions.into_boxed_slice() })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

impl TryFrom<RawQuiz> for Quiz {
    type Error = InvalidQuiz;
    fn try_from(RawQuiz { questions }: RawQuiz) -> Result<Self, Self::Error> {
        Self::new(questions)
    }
}

impl From<Quiz> for RawQuiz {
    fn from(Quiz { questions }: Quiz) -> Self {
        Self { questions: questions.into_vec() }
    }
}
