//! `compliance results`: tabulate the test outcomes of a finished run.

use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::archive::{self, PipeReader};
use crate::client::{ComplianceClient, RetrieveConfig, Retrieval};
use crate::junit::{self, TestCase, TestFilter};
use crate::report::{self, filter_tests, sort_by_status};

pub const NOT_READY_MESSAGE: &str =
    "Compliance results not ready. Run `compliance status` for status.";

/// Category filter passed to the report reader.
const RESULTS_FILTER: &str = "all";

/// Show the non-skipped test cases of the run in `namespace`, failures first.
///
/// Prints [`NOT_READY_MESSAGE`] and returns `Ok` without downloading
/// anything if the run has not completed.
pub async fn run<C, W>(client: &C, namespace: &str, out: &mut W) -> Result<()>
where
    C: ComplianceClient + ?Sized,
    W: Write,
{
    let status = client
        .status(namespace)
        .await
        .context("failed to retrieve the compliance status")?;

    if !status.is_complete() {
        info!(%namespace, status = %status.status, "compliance run not complete");
        writeln!(out, "{NOT_READY_MESSAGE}")?;
        return Ok(());
    }

    let config = RetrieveConfig {
        namespace: namespace.to_string(),
    };
    let Retrieval { reader, errors } = client.retrieve_results(&config);

    let retrieval = async {
        match errors.await {
            Ok(err) => Err(err),
            // Sender dropped without reporting: the download finished.
            Err(_) => Ok(()),
        }
    };
    let extraction = async {
        match tokio::task::spawn_blocking(move || collect_results(reader)).await {
            Ok(result) => result,
            Err(err) => Err(anyhow::Error::new(err).context("results extraction task failed")),
        }
    };

    let ((), cases) =
        tokio::try_join!(retrieval, extraction).context("failed to retrieve the results")?;

    report::results_table(&cases).render(out)?;
    Ok(())
}

/// Unwrap, inflate and parse the results archive, then drop skipped cases
/// and order the rest by status. Blocks the calling thread.
fn collect_results(reader: PipeReader) -> Result<Vec<TestCase>> {
    let (results, copy_errors) = archive::untar_results(reader)
        .context("could not extract the compliance results from archive")?;

    // Consumes `results`, so the copy thread is unblocked once this returns.
    let parsed = parse_results(results);

    if let Ok(err) = copy_errors.blocking_recv() {
        // A broken pipe only means the parser stopped reading early.
        if err.kind() != io::ErrorKind::BrokenPipe {
            return Err(anyhow::Error::new(err)
                .context("could not extract the compliance results from archive"));
        }
        debug!("parser finished before the nested archive was fully read");
    }

    let cases = parsed?;
    let mut cases = filter_tests(|case| !case.is_skipped(), &cases);
    sort_by_status(&mut cases);

    info!(cases = cases.len(), "collected compliance results");
    Ok(cases)
}

fn parse_results<R: Read>(results: R) -> Result<Vec<TestCase>> {
    let decoder = archive::gzip_reader(results)
        .context("could not create a gzip reader for compliance results")?;

    let filter: TestFilter = RESULTS_FILTER.parse()?;
    junit::read_test_cases(decoder, filter)
        .context("could not get the results of the compliance tests from the archive")
}
