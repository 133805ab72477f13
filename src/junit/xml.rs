//! Streaming JUnit XML parser built on `quick-xml` events.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{JunitError, TestCase};

/// Which outcome element's text body is currently being collected.
#[derive(Debug, Clone, Copy)]
enum Marker {
    Failure,
    Skipped,
}

/// Parse every `<testcase>` in a JUnit report, in document order.
///
/// `source_name` only labels errors. Suites may be nested at any depth;
/// `<failure>` and `<error>` both mark a case as failed, `<skipped>` marks it
/// as skipped. The outcome message is the `message` attribute when present,
/// otherwise the element's text.
pub fn parse_report<R: BufRead>(
    reader: R,
    source_name: &str,
) -> Result<Vec<TestCase>, JunitError> {
    parse_events(reader).map_err(|error| JunitError::Xml {
        source_name: source_name.to_string(),
        error,
    })
}

fn parse_events<R: BufRead>(reader: R) -> Result<Vec<TestCase>, quick_xml::Error> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut cases = Vec::new();
    let mut current: Option<TestCase> = None;
    let mut marker: Option<Marker> = None;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"testcase" => current = Some(test_case(&e)?),
                b"failure" | b"error" => {
                    if let Some(case) = current.as_mut() {
                        case.failure = Some(message(&e)?);
                        marker = Some(Marker::Failure);
                    }
                }
                b"skipped" => {
                    if let Some(case) = current.as_mut() {
                        case.skipped = Some(message(&e)?);
                        marker = Some(Marker::Skipped);
                    }
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"testcase" => cases.push(test_case(&e)?),
                b"failure" | b"error" => {
                    if let Some(case) = current.as_mut() {
                        case.failure = Some(message(&e)?);
                    }
                }
                b"skipped" => {
                    if let Some(case) = current.as_mut() {
                        case.skipped = Some(message(&e)?);
                    }
                }
                _ => {}
            },
            Event::Text(text) => {
                if let (Some(marker), Some(case)) = (marker, current.as_mut()) {
                    append_body(case, marker, &text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let (Some(marker), Some(case)) = (marker, current.as_mut()) {
                    append_body(case, marker, &String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"testcase" => {
                    marker = None;
                    if let Some(case) = current.take() {
                        cases.push(case);
                    }
                }
                b"failure" | b"error" | b"skipped" => marker = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(cases)
}

fn test_case(e: &BytesStart<'_>) -> Result<TestCase, quick_xml::Error> {
    Ok(TestCase {
        name: attribute(e, b"name")?.unwrap_or_default(),
        class_name: attribute(e, b"classname")?,
        time: attribute(e, b"time")?.and_then(|t| t.trim().parse().ok()),
        failure: None,
        skipped: None,
    })
}

fn message(e: &BytesStart<'_>) -> Result<String, quick_xml::Error> {
    Ok(attribute(e, b"message")?.unwrap_or_default())
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, quick_xml::Error> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// The body only fills in a message the attribute left empty.
fn append_body(case: &mut TestCase, marker: Marker, body: &str) {
    let slot = match marker {
        Marker::Failure => &mut case.failure,
        Marker::Skipped => &mut case.skipped,
    };
    if let Some(message) = slot {
        if message.is_empty() {
            message.push_str(body);
        }
    }
}
