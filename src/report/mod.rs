//! Status categories, filtering, ordering and tabulation of test cases.

pub mod table;

use crate::junit::TestCase;

pub use table::Table;

/// Outcome bucket of a test case, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    Failed,
    Passed,
    Skipped,
    Unknown,
}

/// Sort priority per category, lowest first.
const PRIORITIES: [(StatusCategory, u8); 4] = [
    (StatusCategory::Failed, 0),
    (StatusCategory::Passed, 1),
    (StatusCategory::Skipped, 2),
    (StatusCategory::Unknown, 3),
];

impl StatusCategory {
    /// Categorise a test case. Skipped wins over failed, failed over passed.
    pub fn of(case: &TestCase) -> Self {
        if case.is_skipped() {
            StatusCategory::Skipped
        } else if case.is_failed() {
            StatusCategory::Failed
        } else if case.is_passed() {
            StatusCategory::Passed
        } else {
            StatusCategory::Unknown
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusCategory::Failed => "FAILED",
            StatusCategory::Passed => "PASSED",
            StatusCategory::Skipped => "SKIPPED",
            StatusCategory::Unknown => "UNKNOWN",
        }
    }

    pub fn priority(&self) -> u8 {
        PRIORITIES
            .iter()
            .find(|(category, _)| category == self)
            .map(|(_, priority)| *priority)
            .unwrap_or(u8::MAX)
    }
}

impl std::fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Keep the cases for which `predicate` holds, preserving their order.
pub fn filter_tests<P>(predicate: P, cases: &[TestCase]) -> Vec<TestCase>
where
    P: Fn(&TestCase) -> bool,
{
    cases.iter().filter(|case| predicate(case)).cloned().collect()
}

/// Order cases FAILED, PASSED, SKIPPED, UNKNOWN. Stable: cases with the same
/// status keep their relative order.
pub fn sort_by_status(cases: &mut [TestCase]) {
    cases.sort_by_key(|case| StatusCategory::of(case).priority());
}

/// Build the `STATUS` / `TEST` table for `cases`, in the given order.
pub fn results_table(cases: &[TestCase]) -> Table {
    let mut table = Table::new(["STATUS", "TEST"]);
    for case in cases {
        table.add_row([StatusCategory::of(case).label(), case.name.as_str()]);
    }
    table
}
