//! Builders for synthetic compliance results archives.

#![allow(dead_code)]

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

/// JUnit report with one failed, one passed and one skipped case.
pub const THREE_CASE_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuite name="Kubernetes e2e suite" tests="3" failures="1">
  <testcase name="should-pass" classname="e2e" time="1.5"></testcase>
  <testcase name="should-skip" classname="e2e" time="0"><skipped></skipped></testcase>
  <testcase name="should-fail" classname="e2e" time="30.2"><failure type="Failure">timed out</failure></testcase>
</testsuite>
"#;

pub fn tar_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        builder.append_data(&mut header, path, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Outer tar holding `results.tar.gz`, whose content is the gzipped report.
pub fn results_archive(report: &str) -> Vec<u8> {
    tar_with(&[
        ("meta/run.log", b"started\n"),
        ("results.tar.gz", &gzip(report.as_bytes())),
    ])
}

/// Outer tar whose nested archive is a gzipped tar of reports, the layout a
/// real compliance run produces.
pub fn nested_tar_archive(report: &str) -> Vec<u8> {
    let inner = tar_with(&[
        ("plugins/e2e/results/global/e2e.log", b"log\n"),
        ("plugins/e2e/results/global/junit_01.xml", report.as_bytes()),
    ]);
    tar_with(&[("202401011200_sonobuoy_3f2a.tar.gz", &gzip(&inner))])
}

pub const EXPECTED_TABLE: &str = "STATUS  TEST\nFAILED  should-fail\nPASSED  should-pass\n";
