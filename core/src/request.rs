/*
 * request.rs
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

//! TAP request description: method, URL, parameters, file parts.
//!
//! A `TapRequest` is a pure value; building one never performs I/O. The
//! transport encodes it on the wire (form-encoded POST, query-string GET, or
//! multipart/form-data when file parts are present).

/// HTTP request method. TAP only uses GET and POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// One uploaded file in a multipart POST. The part is keyed by `field_name`
/// (for query uploads this is the upload table name, so the server can match
/// it against the `UPLOAD` parameter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field_name: String,
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Fully specified TAP request: method, URL, parameters, optional file parts.
///
/// Parameters are ordered; for GET they become the query string, for POST the
/// form body (or multipart text fields when `files` is non-empty). No
/// parameter supplied by the caller is ever dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl TapRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            params: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            params: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Append a parameter. Duplicate names are kept; the server sees them in
    /// the order they were added.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Attach a file part (switches the transport to multipart/form-data).
    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }

    /// Value of the first parameter with the given name, if any.
    pub fn param_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}
