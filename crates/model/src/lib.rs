#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod quiz;

use alloc::{collections::BTreeMap, string::String};

pub use quiz::{InvalidQuiz, Question, Quiz};

/// The persisted document: every known quiz keyed by its name.
pub type Catalog = BTreeMap<String, Quiz>;
