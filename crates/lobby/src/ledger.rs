use crate::error::{Error, Result};
use std::collections::{BTreeSet, HashMap};
use twilight_model::id::{marker::UserMarker, Id};

pub type UserId = Id<UserMarker>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Each voter holds at most one option. Clicking it again retracts the vote.
    Single,
    /// Each voter toggles any subset of the options.
    Multiple,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The option was added to the voter's selection.
    Cast,
    /// Single-choice only: the voter's previous option was replaced.
    Switched,
    /// The option was removed from the voter's selection.
    Retracted,
}

impl VoteOutcome {
    pub const fn is_retraction(self) -> bool {
        matches!(self, Self::Retracted)
    }
}

/// Per-question vote bookkeeping.
///
/// Counts are kept in the order the options were defined. Selections are stored
/// as indices into that list, so a voter's choices and the per-option counts can
/// never disagree about which labels exist.
pub struct Ledger {
    mode: Mode,
    options: Box<[Box<str>]>,
    counts: Vec<u32>,
    choices: HashMap<UserId, BTreeSet<usize>>,
    total: u32,
}

impl Ledger {
    pub fn new(mode: Mode) -> Self {
        Self { mode, options: Box::default(), counts: Vec::new(), choices: HashMap::new(), total: 0 }
    }

    /// Clears every vote and starts counting for a new set of options.
    pub fn reset(&mut self, options: &[Box<str>]) {
        self.options = options.into();
        self.counts.clear();
        self.counts.resize(options.len(), 0);
        self.choices.clear();
        self.total = 0;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn options(&self) -> &[Box<str>] {
        &self.options
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn count(&self, label: &str) -> Option<u32> {
        let index = self.position(label)?;
        Some(self.counts[index])
    }

    /// Every option with its count, in definition order.
    pub fn tally(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.options.iter().map(|option| &**option).zip(self.counts.iter().copied())
    }

    /// The labels currently selected by `voter`.
    pub fn selection(&self, voter: UserId) -> impl Iterator<Item = &str> + '_ {
        self.choices.get(&voter).into_iter().flatten().map(|&index| &*self.options[index])
    }

    /// Number of voters with at least one option selected.
    pub fn voters(&self) -> usize {
        self.choices.len()
    }

    pub fn record(&mut self, voter: UserId, label: &str) -> Result<VoteOutcome> {
        let index = self.position(label).ok_or(Error::UnknownOption)?;
        let selection = self.choices.entry(voter).or_default();
        let (outcome, previous) = match self.mode {
            Mode::Multiple => {
                if selection.remove(&index) {
                    (VoteOutcome::Retracted, None)
                } else {
                    selection.insert(index);
                    (VoteOutcome::Cast, None)
                }
            }
            Mode::Single => match selection.pop_first() {
                Some(previous) if previous == index => (VoteOutcome::Retracted, None),
                Some(previous) => {
                    selection.insert(index);
                    (VoteOutcome::Switched, Some(previous))
                }
                None => {
                    selection.insert(index);
                    (VoteOutcome::Cast, None)
                }
            },
        };

        if selection.is_empty() {
            self.choices.remove(&voter);
        }

        if let Some(previous) = previous {
            self.decrement(previous);
        }

        match outcome {
            VoteOutcome::Cast | VoteOutcome::Switched => self.counts[index] += 1,
            VoteOutcome::Retracted => self.decrement(index),
        }

        self.recount();
        Ok(outcome)
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.options.iter().position(|option| option.as_ref() == label)
    }

    fn decrement(&mut self, index: usize) {
        let count = &mut self.counts[index];
        debug_assert!(*count > 0, "retracted a vote for {:?} that was never counted", self.options[index]);
        match count.checked_sub(1) {
            Some(next) => *count = next,
            None => log::warn!("ignored a retraction that would make {:?} negative", self.options[index]),
        }
    }

    fn recount(&mut self) {
        self.total = self.counts.iter().sum();
        debug_assert_eq!(
            self.total as usize,
            self.choices.values().map(BTreeSet::len).sum::<usize>(),
            "vote counts disagree with the recorded selections",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{Ledger, Mode, UserId, VoteOutcome};
    use crate::error::Error;

    fn options(labels: &[&str]) -> Box<[Box<str>]> {
        labels.iter().copied().map(Box::from).collect()
    }

    fn ledger(mode: Mode, labels: &[&str]) -> Ledger {
        let mut ledger = Ledger::new(mode);
        ledger.reset(&options(labels));
        ledger
    }

    fn user(id: u64) -> UserId {
        UserId::new(id)
    }

    #[test]
    fn single_choice_moves_and_retracts() {
        let mut ledger = ledger(Mode::Single, &["Yes", "No"]);
        assert_eq!(ledger.record(user(1), "Yes"), Ok(VoteOutcome::Cast));
        assert_eq!(ledger.record(user(1), "No"), Ok(VoteOutcome::Switched));
        assert_eq!(ledger.count("Yes"), Some(0));
        assert_eq!(ledger.count("No"), Some(1));
        assert_eq!(ledger.total(), 1);

        assert_eq!(ledger.record(user(1), "No"), Ok(VoteOutcome::Retracted));
        assert_eq!(ledger.total(), 0);
        assert_eq!(ledger.voters(), 0);
        assert_eq!(ledger.selection(user(1)).count(), 0);
    }

    #[test]
    fn multiple_choice_toggle_pair_restores_state() {
        let mut ledger = ledger(Mode::Multiple, &["Red", "Green", "Blue"]);
        ledger.record(user(1), "Red").unwrap();
        ledger.record(user(2), "Blue").unwrap();
        let before: Vec<_> = ledger.tally().map(|(label, count)| (label.to_owned(), count)).collect();

        assert_eq!(ledger.record(user(1), "Green"), Ok(VoteOutcome::Cast));
        assert_eq!(ledger.selection(user(1)).collect::<Vec<_>>(), ["Red", "Green"]);
        assert_eq!(ledger.record(user(1), "Green"), Ok(VoteOutcome::Retracted));

        let after: Vec<_> = ledger.tally().map(|(label, count)| (label.to_owned(), count)).collect();
        assert_eq!(before, after);
        assert_eq!(ledger.selection(user(1)).collect::<Vec<_>>(), ["Red"]);
        assert_eq!(ledger.total(), 2);
    }

    #[test]
    fn multiple_choice_counts_every_selection() {
        let mut ledger = ledger(Mode::Multiple, &["A", "B"]);
        ledger.record(user(1), "A").unwrap();
        ledger.record(user(1), "B").unwrap();
        ledger.record(user(2), "B").unwrap();
        assert_eq!(ledger.tally().collect::<Vec<_>>(), [("A", 1), ("B", 2)]);
        assert_eq!(ledger.total(), 3);
        assert_eq!(ledger.voters(), 2);
    }

    #[test]
    fn unknown_option_leaves_ledger_untouched() {
        let mut ledger = ledger(Mode::Single, &["Yes", "No"]);
        ledger.record(user(1), "Yes").unwrap();
        assert_eq!(ledger.record(user(1), "Maybe"), Err(Error::UnknownOption));
        assert_eq!(ledger.count("Yes"), Some(1));
        assert_eq!(ledger.selection(user(1)).collect::<Vec<_>>(), ["Yes"]);
    }

    #[test]
    fn reset_clears_votes() {
        let mut ledger = ledger(Mode::Single, &["Yes", "No"]);
        ledger.record(user(1), "Yes").unwrap();
        ledger.reset(&options(&["Up", "Down", "Strange"]));
        assert_eq!(ledger.total(), 0);
        assert_eq!(ledger.voters(), 0);
        assert_eq!(ledger.tally().collect::<Vec<_>>(), [("Up", 0), ("Down", 0), ("Strange", 0)]);
        assert_eq!(ledger.record(user(1), "Yes"), Err(Error::UnknownOption));
    }

    #[test]
    fn single_choice_total_tracks_voters() {
        let labels = ["A", "B", "C", "D"];
        let mut ledger = ledger(Mode::Single, &labels);

        // Deterministic pseudo-random vote sequence.
        let mut seed = 0x2545_f491_u64;
        for _ in 0..2_000 {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            let voter = user(seed % 13 + 1);
            let label = labels[(seed >> 33) as usize % labels.len()];
            ledger.record(voter, label).unwrap();

            let sum: u32 = ledger.tally().map(|(_, count)| count).sum();
            assert_eq!(sum, ledger.total());
            assert_eq!(ledger.total() as usize, ledger.voters());
            assert!(ledger.selection(voter).count() <= 1);
        }
    }
}
