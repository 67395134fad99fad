/*
 * error.rs
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

//! TAP client errors: transport, parse, protocol state, timeout, usage.

use std::fmt;
use std::time::Duration;

use crate::protocol::uws::JobPhase;

/// Parse failure for a UWS job document or a TAP tableset document.
///
/// The phase element is the only required field; every other absent value
/// degrades to an empty string instead of erroring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The bytes are not a well-formed XML document.
    MalformedDocument(String),
    /// The document is well-formed but lacks a required element.
    MissingRequiredField(&'static str),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MalformedDocument(detail) => {
                write!(f, "malformed document: {}", detail)
            }
            ParseError::MissingRequiredField(field) => {
                write!(f, "missing required field: {}", field)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors from Tap, TapPlus, or JobController operations.
#[derive(Debug)]
pub enum TapError {
    /// Underlying HTTP failure: connection error, or a non-2xx response
    /// (status is present in that case). Never retried by the core.
    Transport {
        status: Option<u16>,
        message: String,
    },
    /// Malformed XML or missing required field.
    Parse(ParseError),
    /// The job reached a terminal-failure phase, its results were archived,
    /// or the unknown-phase retry budget was exhausted. Carries the
    /// server-reported message when the job document had one.
    ProtocolState {
        phase: JobPhase,
        message: String,
    },
    /// The poll loop exceeded the configured maximum wait. The remote job is
    /// left running; the caller may resume polling with the stored location.
    Timeout {
        waited: Duration,
    },
    /// Caller error detected before any network I/O (upload resource without
    /// a table name, bad URL scheme, missing TapPlus contexts).
    Usage(String),
}

impl TapError {
    pub fn transport(msg: impl Into<String>) -> Self {
        TapError::Transport { status: None, message: msg.into() }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        TapError::Usage(msg.into())
    }
}

impl fmt::Display for TapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TapError::Transport { status: Some(code), message } => {
                write!(f, "transport error (HTTP {}): {}", code, message)
            }
            TapError::Transport { status: None, message } => {
                write!(f, "transport error: {}", message)
            }
            TapError::Parse(e) => write!(f, "parse error: {}", e),
            TapError::ProtocolState { phase, message } if message.is_empty() => {
                write!(f, "job ended in phase {}", phase)
            }
            TapError::ProtocolState { phase, message } => {
                write!(f, "job ended in phase {}: {}", phase, message)
            }
            TapError::Timeout { waited } => {
                write!(f, "job still running after {:?}; poll again later", waited)
            }
            TapError::Usage(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for TapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TapError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for TapError {
    fn from(e: ParseError) -> Self {
        TapError::Parse(e)
    }
}
