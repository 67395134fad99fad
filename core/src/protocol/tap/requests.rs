/*
 * requests.rs
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

//! TAP request builders: sync/async queries, table upload/delete,
//! login/logout, tables listing, job polling. All builders return a
//! `TapRequest` value and never perform I/O; caller mistakes (an upload
//! resource without a table name) fail here, before any network call.

use std::path::Path;

use crate::error::TapError;
use crate::request::{FilePart, TapRequest};

/// Client-identifying tag sent as the `tapclient` parameter.
pub const TAP_CLIENT_ID: &str = concat!("cannocchiale-", env!("CARGO_PKG_VERSION"));

/// Row cap injected into queries that carry no explicit TOP clause.
pub const DEFAULT_TOP: u32 = 2000;

/// Result/upload payload encoding. Opaque to the core; the server interprets
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Votable,
    Csv,
    Ascii,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Votable => "votable",
            OutputFormat::Csv => "csv",
            OutputFormat::Ascii => "ascii",
        }
    }
}

/// A resource to upload: bytes already in memory (a table encoded as
/// VOTable, or a file loaded via `from_file`), or a URL the server fetches
/// itself. URL resources are only valid for the table-upload operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadResource {
    Inline { file_name: String, data: Vec<u8> },
    Url(String),
}

impl UploadResource {
    /// In-memory table-valued resource (VOTable bytes).
    pub fn votable(data: Vec<u8>) -> Self {
        UploadResource::Inline { file_name: "table.vot".to_string(), data }
    }

    /// Load a local file up front, so request building stays I/O-free.
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(UploadResource::Inline { file_name, data })
    }
}

/// One ADQL query with its submission options. Build with the fluent
/// methods, then hand to `Tap::query` / `Tap::query_async`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub adql: String,
    pub format: OutputFormat,
    pub name: Option<String>,
    /// When true (the default) the job is submitted with PHASE=RUN so the
    /// server starts it immediately.
    pub autorun: bool,
    pub upload_resource: Option<UploadResource>,
    pub upload_table_name: Option<String>,
    /// Extra parameters passed through verbatim, after the standard set.
    pub extra_params: Vec<(String, String)>,
}

impl QueryRequest {
    pub fn new(adql: impl Into<String>) -> Self {
        Self {
            adql: adql.into(),
            format: OutputFormat::default(),
            name: None,
            autorun: true,
            upload_resource: None,
            upload_table_name: None,
            extra_params: Vec::new(),
        }
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn autorun(mut self, autorun: bool) -> Self {
        self.autorun = autorun;
        self
    }

    pub fn upload(mut self, resource: UploadResource, table_name: impl Into<String>) -> Self {
        self.upload_resource = Some(resource);
        self.upload_table_name = Some(table_name.into());
        self
    }

    pub fn extra_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.push((name.into(), value.into()));
        self
    }
}

/// Build the POST for a query against `{endpoint}/sync` or
/// `{endpoint}/async`. Fails with UsageError when an upload resource is
/// present without a table name, or when the resource is a URL (query
/// uploads must be inline).
pub fn build_query_request(
    endpoint: &str,
    query: &QueryRequest,
    sync: bool,
) -> Result<TapRequest, TapError> {
    let url = format!("{}/{}", endpoint, if sync { "sync" } else { "async" });
    let mut req = TapRequest::post(url)
        .param("REQUEST", "doQuery")
        .param("LANG", "ADQL")
        .param("FORMAT", query.format.as_str())
        .param("tapclient", TAP_CLIENT_ID)
        .param("QUERY", set_top_in_query(&query.adql, DEFAULT_TOP));
    if query.autorun {
        req = req.param("PHASE", "RUN");
    }
    if let Some(name) = &query.name {
        req = req.param("jobname", name.clone());
    }

    if let Some(resource) = &query.upload_resource {
        let table_name = query.upload_table_name.as_deref().ok_or_else(|| {
            TapError::usage("table name is required when a resource is uploaded")
        })?;
        // UPLOAD is '<table_name>,param:<form_key>'; the form key is the
        // table name so the multipart part below matches it.
        req = req.param("UPLOAD", format!("{0},param:{0}", table_name));
        match resource {
            UploadResource::Inline { file_name, data } => {
                req = req.file(FilePart {
                    field_name: table_name.to_string(),
                    file_name: file_name.clone(),
                    data: data.clone(),
                });
            }
            UploadResource::Url(_) => {
                return Err(TapError::usage(
                    "query uploads require an inline resource, not a URL",
                ));
            }
        }
    }

    for (name, value) in &query.extra_params {
        req = req.param(name.clone(), value.clone());
    }
    Ok(req)
}

/// Build the POST that uploads a table to the user's private space.
/// TASKID=-1 is required by the server even though it is undocumented.
pub fn build_upload_table_request(
    base: &str,
    upload_context: &str,
    resource: &UploadResource,
    table_name: &str,
    table_description: &str,
    format: OutputFormat,
) -> TapRequest {
    let mut req = TapRequest::post(format!("{}/{}", base, upload_context))
        .param("TASKID", "-1")
        .param("TABLE_NAME", table_name)
        .param("TABLE_DESC", table_description)
        .param("FORMAT", format.as_str());
    match resource {
        UploadResource::Inline { file_name, data } => {
            req = req.file(FilePart {
                field_name: "FILE".to_string(),
                file_name: file_name.clone(),
                data: data.clone(),
            });
        }
        UploadResource::Url(url) => {
            req = req.param("URL", url.clone());
        }
    }
    req
}

/// Build the POST that removes a user table.
pub fn build_delete_table_request(
    base: &str,
    upload_context: &str,
    table_name: &str,
    force_removal: bool,
) -> TapRequest {
    TapRequest::post(format!("{}/{}", base, upload_context))
        .param("TABLE_NAME", table_name)
        .param("DELETE", "TRUE")
        .param("FORCE_REMOVAL", if force_removal { "TRUE" } else { "FALSE" })
}

pub fn build_login_request(
    secure_base: &str,
    server_context: &str,
    username: &str,
    password: &str,
) -> TapRequest {
    TapRequest::post(format!("{}/{}/login", secure_base, server_context))
        .param("username", username)
        .param("password", password)
}

pub fn build_logout_request(secure_base: &str, server_context: &str) -> TapRequest {
    TapRequest::post(format!("{}/{}/logout", secure_base, server_context))
}

/// GET for the tableset listing. `only_tables`/`share_accessible` are the
/// TAP+ filter knobs; `tables` restricts the listing to one qualified name.
pub fn build_tables_request(
    endpoint: &str,
    tables: Option<&str>,
    only_tables: Option<bool>,
    share_accessible: Option<bool>,
) -> TapRequest {
    let mut req = TapRequest::get(format!("{}/tables", endpoint));
    if let Some(name) = tables {
        req = req.param("tables", name);
    }
    if let Some(only) = only_tables {
        req = req.param("only_tables", if only { "true" } else { "false" });
    }
    if let Some(shared) = share_accessible {
        req = req.param("share_accessible", if shared { "true" } else { "false" });
    }
    req
}

/// GET for a job's status document at its location URL.
pub fn build_job_poll_request(location: &str) -> TapRequest {
    TapRequest::get(location)
}

/// Inject `TOP {top}` after the first SELECT when the query has no TOP
/// token; a query that already limits itself is returned unchanged.
pub fn set_top_in_query(query: &str, top: u32) -> String {
    // ASCII uppercasing keeps byte offsets aligned with the original text
    let upper = query.to_ascii_uppercase();
    let has_top = upper
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .any(|tok| tok == "TOP");
    if has_top {
        return query.to_string();
    }
    match find_word(&upper, "SELECT") {
        Some(i) => {
            let insert_at = i + "SELECT".len();
            format!("{} TOP {}{}", &query[..insert_at], top, &query[insert_at..])
        }
        None => query.to_string(),
    }
}

/// Byte offset of the first occurrence of `word` delimited by
/// non-identifier characters, in an upper-cased haystack.
fn find_word(upper: &str, word: &str) -> Option<usize> {
    let bytes = upper.as_bytes();
    let mut start = 0;
    while let Some(pos) = upper[start..].find(word) {
        let i = start + pos;
        let before_ok = i == 0 || !is_ident(bytes[i - 1]);
        let after = i + word.len();
        let after_ok = after == bytes.len() || !is_ident(bytes[after]);
        if before_ok && after_ok {
            return Some(i);
        }
        start = i + word.len();
    }
    None
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
