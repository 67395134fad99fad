/*
 * client.rs
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

//! TAP connection facades.
//!
//! `Tap` provides the standard capabilities (metadata listing, sync and
//! async queries). `TapPlus` adds the server/upload contexts of TAP+
//! archives: authenticated sessions, private-table upload and removal, and
//! filtered table listing. Neither retries anything; repetition lives
//! exclusively in the `JobController` poll loop.

use std::ops::Deref;

use crate::error::TapError;
use crate::protocol::tap::job::{JobController, PollPolicy, ResultPayload};
use crate::protocol::tap::metadata::TableMetadata;
use crate::protocol::tap::requests::{
    build_delete_table_request, build_login_request, build_logout_request, build_query_request,
    build_tables_request, build_upload_table_request, OutputFormat, QueryRequest, UploadResource,
};
use crate::protocol::tap::tableset::parse_tableset;
use crate::protocol::uws::Job;
use crate::transport::{HttpTransport, Transport};
use crate::uri::TapUrl;

/// Filter knobs for `TapPlus::load_tables`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableFilter {
    /// Load table names only (no column metadata).
    pub only_names: bool,
    /// Include tables other users shared with the session.
    pub include_shared: bool,
}

/// TAP service connection: endpoint selection + request building + parsing
/// over a shared transport.
pub struct Tap<T: Transport> {
    url: TapUrl,
    transport: T,
    poll_policy: PollPolicy,
}

impl Tap<HttpTransport> {
    /// Connect to a service described by host/path, e.g.
    /// `Tap::connect("gea.esac.esa.int", "/tap-server/tap")`.
    pub fn connect(host: &str, path: &str) -> Result<Self, TapError> {
        Ok(Self::with_transport(
            TapUrl::new("http", host, 80, path),
            HttpTransport::new()?,
        ))
    }

    /// Connect from a full URL `[http(s)://]host[:port][/path]`.
    pub fn from_url(url: &str) -> Result<Self, TapError> {
        Ok(Self::with_transport(TapUrl::from_url(url)?, HttpTransport::new()?))
    }
}

impl<T: Transport> Tap<T> {
    pub fn with_transport(url: TapUrl, transport: T) -> Self {
        log::debug!("TAP endpoint: {}", url.tap_endpoint());
        Self {
            url,
            transport,
            poll_policy: PollPolicy::default(),
        }
    }

    pub fn poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll_policy = policy;
        self
    }

    pub fn url(&self) -> &TapUrl {
        &self.url
    }

    /// The underlying transport, e.g. for inspecting a scripted one in tests.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn tap_endpoint(&self) -> String {
        self.url.tap_endpoint()
    }

    fn async_endpoint(&self) -> String {
        format!("{}/async", self.tap_endpoint())
    }

    /// Job controller bound to this connection's transport and poll policy.
    pub fn job_controller(&self) -> JobController<'_, T> {
        JobController::new(&self.transport, self.async_endpoint(), self.poll_policy.clone())
    }

    /// Load all public tables from the `/tables` endpoint.
    pub async fn load_tables(&self) -> Result<Vec<TableMetadata>, TapError> {
        let request = build_tables_request(&self.tap_endpoint(), None, None, None);
        let body = self.transport.execute(&request).await?.into_success_body()?;
        Ok(parse_tableset(&body)?)
    }

    /// Load one table by fully qualified name (schema.table).
    pub async fn load_table(&self, table: &str) -> Result<TableMetadata, TapError> {
        let request = build_tables_request(&self.tap_endpoint(), Some(table), None, None);
        let body = self.transport.execute(&request).await?.into_success_body()?;
        let tables = parse_tableset(&body)?;
        tables
            .into_iter()
            .find(|t| t.qualified_name() == table || t.name == table)
            .ok_or_else(|| TapError::usage(format!("table \"{}\" not found", table)))
    }

    /// Synchronous query: one POST to `/sync`, result payload in the
    /// response body.
    pub async fn query(&self, query: &QueryRequest) -> Result<ResultPayload, TapError> {
        let request = build_query_request(&self.tap_endpoint(), query, true)?;
        let url = request.url.clone();
        let data = self.transport.execute(&request).await?.into_success_body()?;
        Ok(ResultPayload {
            url,
            format: query.format,
            data,
        })
    }

    /// Submit an asynchronous query and return the pending job without
    /// waiting. Pair with `job_controller()` to poll and fetch later.
    pub async fn submit_async(&self, query: &QueryRequest) -> Result<Job, TapError> {
        let request = build_query_request(&self.tap_endpoint(), query, false)?;
        self.job_controller().submit(&request).await
    }

    /// Full asynchronous lifecycle: submit, poll until terminal, fetch all
    /// result payloads.
    pub async fn query_async(&self, query: &QueryRequest) -> Result<Vec<ResultPayload>, TapError> {
        let controller = self.job_controller();
        let request = build_query_request(&self.tap_endpoint(), query, false)?;
        let mut job = controller.submit(&request).await?;
        controller.wait_for_completion(&mut job).await?;
        controller.fetch_results(&job, query.format).await
    }
}

/// TAP+ connection: a `Tap` plus the server and upload contexts. Both
/// contexts are mandatory; without them use `Tap`.
pub struct TapPlus<T: Transport> {
    tap: Tap<T>,
    server_context: String,
    upload_context: String,
}

impl TapPlus<HttpTransport> {
    pub fn from_url(url: &str, server_context: &str, upload_context: &str) -> Result<Self, TapError> {
        Self::with_transport(
            TapUrl::from_url(url)?,
            HttpTransport::new()?,
            server_context,
            upload_context,
        )
    }
}

impl<T: Transport> TapPlus<T> {
    pub fn with_transport(
        url: TapUrl,
        transport: T,
        server_context: &str,
        upload_context: &str,
    ) -> Result<Self, TapError> {
        if server_context.is_empty() || upload_context.is_empty() {
            return Err(TapError::usage(
                "TapPlus requires both server and upload contexts; use Tap instead",
            ));
        }
        Ok(Self {
            tap: Tap::with_transport(url, transport),
            server_context: server_context.to_string(),
            upload_context: upload_context.to_string(),
        })
    }

    /// Base URL for context endpoints: `scheme://host[:port]/{server_context}`.
    fn base_url(&self) -> String {
        format!("{}/{}", self.tap.url.base(), self.server_context)
    }

    /// Log in; the session cookie lives in the shared transport, so all
    /// subsequent requests are authenticated. Always goes over https.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), TapError> {
        let request = build_login_request(
            &self.tap.url.secure_base(),
            &self.server_context,
            username,
            password,
        );
        self.tap.transport.execute(&request).await?.into_success_body()?;
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), TapError> {
        let request = build_logout_request(&self.tap.url.secure_base(), &self.server_context);
        self.tap.transport.execute(&request).await?.into_success_body()?;
        Ok(())
    }

    /// Load all accessible tables, honoring the TAP+ listing filters.
    pub async fn load_tables(&self, filter: &TableFilter) -> Result<Vec<TableMetadata>, TapError> {
        let request = build_tables_request(
            &self.tap.tap_endpoint(),
            None,
            Some(filter.only_names),
            Some(filter.include_shared),
        );
        let body = self.tap.transport.execute(&request).await?.into_success_body()?;
        Ok(parse_tableset(&body)?)
    }

    /// Upload a table to the user's private space.
    pub async fn upload_table(
        &self,
        resource: &UploadResource,
        table_name: &str,
        table_description: &str,
        format: OutputFormat,
    ) -> Result<(), TapError> {
        let request = build_upload_table_request(
            &self.base_url(),
            &self.upload_context,
            resource,
            table_name,
            table_description,
            format,
        );
        self.tap.transport.execute(&request).await?.into_success_body()?;
        Ok(())
    }

    /// Remove a user table.
    pub async fn delete_user_table(&self, table_name: &str, force_removal: bool) -> Result<(), TapError> {
        let request = build_delete_table_request(
            &self.base_url(),
            &self.upload_context,
            table_name,
            force_removal,
        );
        self.tap.transport.execute(&request).await?.into_success_body()?;
        Ok(())
    }
}

impl<T: Transport> Deref for TapPlus<T> {
    type Target = Tap<T>;

    fn deref(&self) -> &Tap<T> {
        &self.tap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tapplus_requires_both_contexts() {
        let url = TapUrl::from_url("https://host/tap-server/tap").unwrap();
        let e = TapPlus::with_transport(url, HttpTransport::new().unwrap(), "", "Upload")
            .err()
            .unwrap();
        assert!(matches!(e, TapError::Usage(_)));
    }
}
