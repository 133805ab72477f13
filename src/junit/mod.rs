//! JUnit test report model and reader.
//!
//! A compliance run publishes its test outcomes as JUnit XML. The inflated
//! results payload is either a single XML report or a tar stream holding one
//! or more reports (for example `plugins/e2e/results/junit_01.xml`);
//! [`read_test_cases`] accepts both.

pub mod xml;

use std::io::{self, BufRead, BufReader, Read};
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum JunitError {
    #[error("failed to read test report: {0}")]
    Io(#[from] io::Error),

    #[error("malformed JUnit XML in {source_name}: {error}")]
    Xml {
        source_name: String,
        error: quick_xml::Error,
    },

    #[error("unknown test filter {0:?} (expected all, passed, failed or skipped)")]
    UnknownFilter(String),
}

/// A single `<testcase>` from a JUnit report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestCase {
    pub name: String,
    pub class_name: Option<String>,
    /// Duration in seconds.
    pub time: Option<f64>,
    /// Failure (or error) message. Present when the case failed.
    pub failure: Option<String>,
    /// Skip message. Present when the case was skipped.
    pub skipped: Option<String>,
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn is_passed(&self) -> bool {
        !self.is_skipped() && !self.is_failed()
    }
}

/// Which test cases [`read_test_cases`] should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestFilter {
    #[default]
    All,
    Passed,
    Failed,
    Skipped,
}

impl TestFilter {
    pub fn matches(&self, case: &TestCase) -> bool {
        match self {
            TestFilter::All => true,
            TestFilter::Passed => case.is_passed(),
            TestFilter::Failed => case.is_failed(),
            TestFilter::Skipped => case.is_skipped(),
        }
    }
}

impl FromStr for TestFilter {
    type Err = JunitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TestFilter::All),
            "passed" => Ok(TestFilter::Passed),
            "failed" => Ok(TestFilter::Failed),
            "skipped" => Ok(TestFilter::Skipped),
            other => Err(JunitError::UnknownFilter(other.to_string())),
        }
    }
}

/// Read every test case from `reader` that matches `filter`, in report order.
pub fn read_test_cases<R: Read>(
    reader: R,
    filter: TestFilter,
) -> Result<Vec<TestCase>, JunitError> {
    let mut reader = BufReader::new(reader);

    let cases = if starts_with_markup(&mut reader)? {
        xml::parse_report(reader, "report")?
    } else {
        read_tarred_reports(reader)?
    };

    Ok(cases.into_iter().filter(|case| filter.matches(case)).collect())
}

/// Peek past leading whitespace and report whether the payload looks like XML.
/// Only whitespace is consumed.
fn starts_with_markup<R: BufRead>(reader: &mut R) -> io::Result<bool> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(true);
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            // 0xEF starts a UTF-8 byte order mark.
            Some(pos) => return Ok(matches!(buf[pos], b'<' | 0xEF)),
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}

fn read_tarred_reports<R: Read>(reader: R) -> Result<Vec<TestCase>, JunitError> {
    let mut archive = tar::Archive::new(reader);
    let mut cases = Vec::new();

    for entry in archive.entries()? {
        let entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        if !path.ends_with(".xml") {
            continue;
        }

        let parsed = xml::parse_report(BufReader::new(entry), &path)?;
        debug!(%path, cases = parsed.len(), "parsed JUnit report");
        cases.extend(parsed);
    }

    Ok(cases)
}
