/*
 * model.rs
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

//! UWS job model: lifecycle phase and job document fields.

use std::fmt;

use chrono::{DateTime, FixedOffset};

/// UWS job lifecycle phase. Closed set; any phase string the server reports
/// outside it maps to `Unknown`, which the controller treats as non-terminal
/// up to a bounded retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Pending,
    Queued,
    Executing,
    Completed,
    Error,
    Aborted,
    Archived,
    Unknown,
}

impl JobPhase {
    /// Parse a phase string. The match is case-sensitive: UWS phase values
    /// are upper-case by definition, so "completed" is not `Completed`.
    pub fn from_str(s: &str) -> JobPhase {
        match s {
            "PENDING" => JobPhase::Pending,
            "QUEUED" => JobPhase::Queued,
            "EXECUTING" => JobPhase::Executing,
            "COMPLETED" => JobPhase::Completed,
            "ERROR" => JobPhase::Error,
            "ABORTED" => JobPhase::Aborted,
            "ARCHIVED" => JobPhase::Archived,
            _ => JobPhase::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Pending => "PENDING",
            JobPhase::Queued => "QUEUED",
            JobPhase::Executing => "EXECUTING",
            JobPhase::Completed => "COMPLETED",
            JobPhase::Error => "ERROR",
            JobPhase::Aborted => "ABORTED",
            JobPhase::Archived => "ARCHIVED",
            JobPhase::Unknown => "UNKNOWN",
        }
    }

    /// Terminal phases: the server will not advance the job further.
    /// `Archived` is terminal with expired results.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobPhase::Completed | JobPhase::Error | JobPhase::Aborted | JobPhase::Archived
        )
    }

    /// Position in the normal forward progression, for regression detection.
    /// Terminal phases share the top rank; `Unknown` has none.
    pub(crate) fn rank(&self) -> Option<u8> {
        match self {
            JobPhase::Pending => Some(0),
            JobPhase::Queued => Some(1),
            JobPhase::Executing => Some(2),
            JobPhase::Completed | JobPhase::Error | JobPhase::Aborted | JobPhase::Archived => {
                Some(3)
            }
            JobPhase::Unknown => None,
        }
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One UWS job as reported by the server. All string fields are normalized
/// to "" when the document omits them; only the parser mutates a Job.
/// Timestamps are carried verbatim (ISO 8601 strings) with parsed accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub job_id: String,
    pub run_id: String,
    pub owner_id: String,
    pub phase: JobPhase,
    pub quote: String,
    pub start_time: String,
    pub end_time: String,
    pub execution_duration: String,
    pub destruction_time: String,
    pub creation_time: String,
    /// URL to poll for status. Some servers omit it; the controller then
    /// derives `{async_endpoint}/{job_id}`.
    pub location_id: String,
    pub name: String,
    /// Result links in document order. Populated only once the phase reaches
    /// terminal success.
    pub result_urls: Vec<String>,
    /// Text of `errorSummary/message` when present.
    pub error_message: String,
}

impl Job {
    pub(crate) fn empty() -> Self {
        Self {
            job_id: String::new(),
            run_id: String::new(),
            owner_id: String::new(),
            phase: JobPhase::Unknown,
            quote: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            execution_duration: String::new(),
            destruction_time: String::new(),
            creation_time: String::new(),
            location_id: String::new(),
            name: String::new(),
            result_urls: Vec::new(),
            error_message: String::new(),
        }
    }

    pub fn start_time_parsed(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.start_time)
    }

    pub fn end_time_parsed(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.end_time)
    }

    pub fn creation_time_parsed(&self) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(&self.creation_time)
    }
}

/// UWS timestamps are ISO 8601; some servers emit them without a zone
/// designator, in which case UTC is assumed.
fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}
