/*
 * parser.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Cannocchiale, a TAP/UWS client for astronomical archives.
 *
 * Cannocchiale is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Cannocchiale is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Cannocchiale.  If not, see <http://www.gnu.org/licenses/>.
 */

//! UWS v1.0 job document parser.
//!
//! Job fields are namespaced elements under the UWS namespace; each maps to
//! a `Job` field through a fixed case-insensitive lookup. Result links come
//! from `results/result` elements via the `xlink:href` attribute. Absent
//! elements become empty strings; a missing phase is the one hard error,
//! because the phase drives the job state machine.

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use crate::error::ParseError;
use crate::protocol::uws::model::{Job, JobPhase};

pub(crate) const UWS_NS: &[u8] = b"http://www.ivoa.net/xml/UWS/v1.0";
pub(crate) const XLINK_NS: &[u8] = b"http://www.w3.org/1999/xlink";

/// Job document fields, keyed by UWS element name (compared
/// case-insensitively; the `destruction` element fills `destruction_time`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobField {
    JobId,
    RunId,
    OwnerId,
    Phase,
    Quote,
    StartTime,
    EndTime,
    ExecutionDuration,
    Destruction,
    CreationTime,
    LocationId,
    Name,
}

impl JobField {
    fn from_element(local: &[u8]) -> Option<JobField> {
        let lower = local.to_ascii_lowercase();
        match lower.as_slice() {
            b"jobid" => Some(JobField::JobId),
            b"runid" => Some(JobField::RunId),
            b"ownerid" => Some(JobField::OwnerId),
            b"phase" => Some(JobField::Phase),
            b"quote" => Some(JobField::Quote),
            b"starttime" => Some(JobField::StartTime),
            b"endtime" => Some(JobField::EndTime),
            b"executionduration" => Some(JobField::ExecutionDuration),
            b"destruction" => Some(JobField::Destruction),
            b"creationtime" => Some(JobField::CreationTime),
            b"locationid" => Some(JobField::LocationId),
            b"name" => Some(JobField::Name),
            _ => None,
        }
    }

    fn apply(self, job: &mut Job, value: String) {
        match self {
            JobField::JobId => job.job_id = value,
            JobField::RunId => job.run_id = value,
            JobField::OwnerId => job.owner_id = value,
            JobField::Phase => job.phase = JobPhase::from_str(&value),
            JobField::Quote => job.quote = value,
            JobField::StartTime => job.start_time = value,
            JobField::EndTime => job.end_time = value,
            JobField::ExecutionDuration => job.execution_duration = value,
            JobField::Destruction => job.destruction_time = value,
            JobField::CreationTime => job.creation_time = value,
            JobField::LocationId => job.location_id = value,
            JobField::Name => job.name = value,
        }
    }
}

fn is_uws(ns: &ResolveResult) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(n)) if *n == UWS_NS)
}

/// Parse a UWS job document. Every absent field normalizes to an empty
/// string; a document without a non-empty `phase` element is rejected with
/// `ParseError::MissingRequiredField("phase")`.
pub fn parse_job(bytes: &[u8]) -> Result<Job, ParseError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ParseError::MalformedDocument(format!("not UTF-8: {}", e)))?;
    let mut reader = NsReader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut job = Job::empty();
    let mut current_field: Option<JobField> = None;
    let mut in_error_summary = false;
    let mut in_error_message = false;
    let mut seen_phase = false;
    let mut seen_root = false;

    loop {
        match reader.read_resolved_event() {
            Err(e) => return Err(ParseError::MalformedDocument(e.to_string())),
            Ok((_, Event::Eof)) => break,
            Ok((ns, Event::Start(e))) => {
                if !is_uws(&ns) {
                    continue;
                }
                seen_root = true;
                let local = e.local_name();
                let lower = local.as_ref().to_ascii_lowercase();
                if lower == b"errorsummary" {
                    in_error_summary = true;
                } else if in_error_summary && lower == b"message" {
                    in_error_message = true;
                } else if lower == b"result" {
                    collect_result_href(&reader, &e, &mut job)?;
                } else if let Some(field) = JobField::from_element(local.as_ref()) {
                    current_field = Some(field);
                }
            }
            Ok((ns, Event::Empty(e))) => {
                if is_uws(&ns) {
                    seen_root = true;
                    if e.local_name().as_ref().to_ascii_lowercase() == b"result" {
                        collect_result_href(&reader, &e, &mut job)?;
                    }
                }
            }
            Ok((_, Event::Text(t))) => {
                let value = t
                    .unescape()
                    .map_err(|e| ParseError::MalformedDocument(e.to_string()))?
                    .trim()
                    .to_string();
                if in_error_message {
                    job.error_message = value;
                } else if let Some(field) = current_field {
                    if field == JobField::Phase && !value.is_empty() {
                        seen_phase = true;
                    }
                    field.apply(&mut job, value);
                }
            }
            Ok((_, Event::End(e))) => {
                current_field = None;
                let lower = e.local_name().as_ref().to_ascii_lowercase();
                if lower == b"message" {
                    in_error_message = false;
                } else if lower == b"errorsummary" {
                    in_error_summary = false;
                }
            }
            Ok(_) => {}
        }
    }

    if !seen_root {
        return Err(ParseError::MissingRequiredField("job"));
    }
    if !seen_phase {
        return Err(ParseError::MissingRequiredField("phase"));
    }
    Ok(job)
}

/// Read the XLink href attribute off a `result` element.
fn collect_result_href(
    reader: &NsReader<&[u8]>,
    element: &quick_xml::events::BytesStart<'_>,
    job: &mut Job,
) -> Result<(), ParseError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| ParseError::MalformedDocument(e.to_string()))?;
        let (ns, local) = reader.resolve_attribute(attr.key);
        let is_xlink = matches!(ns, ResolveResult::Bound(Namespace(n)) if n == XLINK_NS);
        if is_xlink && local.as_ref() == b"href" {
            let value = attr
                .unescape_value()
                .map_err(|e| ParseError::MalformedDocument(e.to_string()))?;
            job.result_urls.push(value.trim().to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETED_JOB: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<uws:job xmlns:uws="http://www.ivoa.net/xml/UWS/v1.0"
         xmlns:xlink="http://www.w3.org/1999/xlink">
  <uws:jobId>1466006114628O</uws:jobId>
  <uws:runId>cannocchiale-0.1.0</uws:runId>
  <uws:ownerId>anonymous</uws:ownerId>
  <uws:phase>COMPLETED</uws:phase>
  <uws:quote>-1</uws:quote>
  <uws:startTime>2016-06-15T16:35:15.573Z</uws:startTime>
  <uws:endTime>2016-06-15T16:35:16.163Z</uws:endTime>
  <uws:executionDuration>0</uws:executionDuration>
  <uws:destruction>2016-06-18T16:35:15.573Z</uws:destruction>
  <uws:creationTime>2016-06-15T16:35:14.000Z</uws:creationTime>
  <uws:locationId>http://host/tap/async/1466006114628O</uws:locationId>
  <uws:name>top5</uws:name>
  <uws:results>
    <uws:result id="result" xlink:type="simple" xlink:href="a.xml"/>
    <uws:result id="result" xlink:type="simple" xlink:href="b.xml"/>
  </uws:results>
</uws:job>"#;

    #[test]
    fn parses_completed_job() {
        let job = parse_job(COMPLETED_JOB.as_bytes()).unwrap();
        assert_eq!(job.job_id, "1466006114628O");
        assert_eq!(job.run_id, "cannocchiale-0.1.0");
        assert_eq!(job.owner_id, "anonymous");
        assert_eq!(job.phase, JobPhase::Completed);
        assert_eq!(job.quote, "-1");
        assert_eq!(job.execution_duration, "0");
        assert_eq!(job.destruction_time, "2016-06-18T16:35:15.573Z");
        assert_eq!(job.location_id, "http://host/tap/async/1466006114628O");
        assert_eq!(job.name, "top5");
        assert_eq!(job.result_urls, vec!["a.xml", "b.xml"]);
        assert!(job.start_time_parsed().is_some());
    }

    #[test]
    fn absent_fields_default_to_empty_string() {
        let doc = r#"<uws:job xmlns:uws="http://www.ivoa.net/xml/UWS/v1.0">
            <uws:jobId>42</uws:jobId>
            <uws:phase>PENDING</uws:phase>
        </uws:job>"#;
        let job = parse_job(doc.as_bytes()).unwrap();
        assert_eq!(job.job_id, "42");
        assert_eq!(job.phase, JobPhase::Pending);
        assert_eq!(job.run_id, "");
        assert_eq!(job.owner_id, "");
        assert_eq!(job.start_time, "");
        assert_eq!(job.location_id, "");
        assert!(job.result_urls.is_empty());
    }

    #[test]
    fn element_name_lookup_is_case_insensitive() {
        let doc = r#"<uws:job xmlns:uws="http://www.ivoa.net/xml/UWS/v1.0">
            <uws:JOBID>42</uws:JOBID>
            <uws:Phase>QUEUED</uws:Phase>
        </uws:job>"#;
        let job = parse_job(doc.as_bytes()).unwrap();
        assert_eq!(job.job_id, "42");
        assert_eq!(job.phase, JobPhase::Queued);
    }

    #[test]
    fn missing_phase_is_required_field_error() {
        let doc = r#"<uws:job xmlns:uws="http://www.ivoa.net/xml/UWS/v1.0">
            <uws:jobId>42</uws:jobId>
        </uws:job>"#;
        let e = parse_job(doc.as_bytes()).unwrap_err();
        assert_eq!(e, ParseError::MissingRequiredField("phase"));
    }

    #[test]
    fn empty_phase_is_required_field_error() {
        let doc = r#"<uws:job xmlns:uws="http://www.ivoa.net/xml/UWS/v1.0">
            <uws:phase></uws:phase>
        </uws:job>"#;
        let e = parse_job(doc.as_bytes()).unwrap_err();
        assert_eq!(e, ParseError::MissingRequiredField("phase"));
    }

    #[test]
    fn unrecognized_phase_string_parses_as_unknown() {
        let doc = r#"<uws:job xmlns:uws="http://www.ivoa.net/xml/UWS/v1.0">
            <uws:phase>SUSPENDED</uws:phase>
        </uws:job>"#;
        let job = parse_job(doc.as_bytes()).unwrap();
        assert_eq!(job.phase, JobPhase::Unknown);
    }

    #[test]
    fn malformed_xml_is_malformed_document() {
        let doc = r#"<uws:job xmlns:uws="http://www.ivoa.net/xml/UWS/v1.0">
            <uws:phase>COMPLETED</uws:wrong>
        </uws:job>"#;
        let e = parse_job(doc.as_bytes()).unwrap_err();
        assert!(matches!(e, ParseError::MalformedDocument(_)));
    }

    #[test]
    fn non_uws_document_is_missing_root() {
        let e = parse_job(b"<html><body>oops</body></html>").unwrap_err();
        assert_eq!(e, ParseError::MissingRequiredField("job"));
    }

    #[test]
    fn error_summary_message_is_captured() {
        let doc = r#"<uws:job xmlns:uws="http://www.ivoa.net/xml/UWS/v1.0">
            <uws:phase>ERROR</uws:phase>
            <uws:errorSummary type="fatal" hasDetail="true">
                <uws:message>Syntax error near SELECT</uws:message>
            </uws:errorSummary>
        </uws:job>"#;
        let job = parse_job(doc.as_bytes()).unwrap();
        assert_eq!(job.phase, JobPhase::Error);
        assert_eq!(job.error_message, "Syntax error near SELECT");
    }

    #[test]
    fn whitespace_around_values_is_stripped() {
        let doc = r#"<uws:job xmlns:uws="http://www.ivoa.net/xml/UWS/v1.0">
            <uws:jobId>
                42
            </uws:jobId>
            <uws:phase>  EXECUTING  </uws:phase>
        </uws:job>"#;
        let job = parse_job(doc.as_bytes()).unwrap();
        assert_eq!(job.job_id, "42");
        assert_eq!(job.phase, JobPhase::Executing);
    }
}
