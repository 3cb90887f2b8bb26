//! Text rendered into the channel by the flow controller.

use crate::ledger::Ledger;

/// Narrowest option column, matching the width of the `Option` header.
pub const MIN_OPTION_WIDTH: usize = 6;
/// Widest option column. Longer labels are truncated for display.
pub const MAX_OPTION_WIDTH: usize = 15;

const ELLIPSIS: &str = "...";

/// The heading of a freshly opened question.
pub fn prompt(index: usize, question: &str) -> String {
    let question = question.replace(['\r', '\t'], " ");
    format!("**Question {}: {question}**", index + 1)
}

pub fn counter(total: u32) -> String {
    format!("Votes: {total}")
}

/// Shortens `label` to fit the option column. Only the rendered text is affected.
fn clip(label: &str) -> String {
    if label.chars().count() <= MAX_OPTION_WIDTH {
        return label.to_owned();
    }

    let keep = MAX_OPTION_WIDTH - ELLIPSIS.len();
    let mut clipped: String = label.chars().take(keep).collect();
    clipped.push_str(ELLIPSIS);
    clipped
}

/// Formats the tally of a closed question as a fixed-width code block. Rows keep
/// the order in which the options were defined.
pub fn table(ledger: &Ledger) -> String {
    let width = ledger
        .options()
        .iter()
        .map(|option| option.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(MIN_OPTION_WIDTH, MAX_OPTION_WIDTH);

    let total = ledger.total();
    let mut table = String::from("```Results\nOption ");
    table.push_str(&" ".repeat(width - MIN_OPTION_WIDTH));
    table.push_str("| Count | %\n");
    table.push_str(&"-".repeat(16 + width));
    table.push('\n');

    for (label, count) in ledger.tally() {
        let percentage = if total == 0 { 0.0 } else { f64::from(count) / f64::from(total) * 100.0 };
        let label = clip(label);
        table.push_str(&format!("{label:<width$} | {count:<5} | {percentage:.2}%\n"));
    }

    table.push_str("```");
    table
}

#[cfg(test)]
mod tests {
    use super::{counter, prompt, table};
    use crate::ledger::{Ledger, Mode, UserId};

    fn ledger(labels: &[&str], votes: &[(u64, &str)]) -> Ledger {
        let options: Box<[Box<str>]> = labels.iter().copied().map(Box::from).collect();
        let mut ledger = Ledger::new(Mode::Single);
        ledger.reset(&options);
        for &(voter, label) in votes {
            ledger.record(UserId::new(voter), label).unwrap();
        }
        ledger
    }

    #[test]
    fn rows_follow_definition_order() {
        let ledger = ledger(&["A", "BB", "CCC"], &[(1, "BB"), (2, "A"), (3, "BB")]);
        assert_eq!(
            table(&ledger),
            "```Results\n\
             Option | Count | %\n\
             ----------------------\n\
             A      | 1     | 33.33%\n\
             BB     | 2     | 66.67%\n\
             CCC    | 0     | 0.00%\n\
             ```"
        );
    }

    #[test]
    fn empty_tally_shows_zero_percent() {
        let ledger = ledger(&["Yes", "No"], &[]);
        let table = table(&ledger);
        assert!(table.contains("Yes    | 0     | 0.00%\n"));
        assert!(table.contains("No     | 0     | 0.00%\n"));
    }

    #[test]
    fn long_labels_are_clipped_for_display_only() {
        let long = "Photosynthesis happens";
        let ledger = ledger(&[long, "Mitochondria"], &[(1, long)]);
        let table = table(&ledger);

        assert!(table.starts_with("```Results\nOption          | Count | %\n"));
        assert!(table.contains(&"-".repeat(31)));
        assert!(table.contains("Photosynthes... | 1     | 100.00%\n"));
        assert!(table.contains("Mitochondria    | 0     | 0.00%\n"));
        assert_eq!(ledger.count(long), Some(1));
    }

    #[test]
    fn column_grows_with_medium_labels() {
        let ledger = ledger(&["Jupiter!", "Mars"], &[]);
        let table = table(&ledger);
        assert!(table.starts_with("```Results\nOption   | Count | %\n"));
        assert!(table.contains("Mars     | 0     | 0.00%\n"));
    }

    #[test]
    fn prompt_flattens_control_characters() {
        assert_eq!(prompt(0, "Is\twater\rwet?"), "**Question 1: Is water wet?**");
        assert_eq!(prompt(4, "Line\nbreak"), "**Question 5: Line\nbreak**");
        assert_eq!(counter(3), "Votes: 3");
    }
}
