/*
 * transport.rs
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

//! Transport trait: execute a `TapRequest` and return the raw response.
//!
//! The default implementation is `HttpTransport`, a thin wrapper over a
//! reqwest client with a cookie store (login state lives in the session
//! cookies). Tests substitute scripted transports.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;

use crate::error::TapError;
use crate::request::{Method, TapRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Raw HTTP response: status code and body bytes.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body of a 2xx response; any other status is a transport error
    /// carrying the status code and the body text.
    pub fn into_success_body(self) -> Result<Bytes, TapError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(TapError::Transport {
                status: Some(self.status),
                message: String::from_utf8_lossy(&self.body).into_owned(),
            })
        }
    }
}

/// Executes TAP requests. One transport is shared by all operations of a
/// `Tap`/`TapPlus`; it holds the session state (cookies), so callers must
/// serialize session-mutating calls (login/logout) themselves.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: &TapRequest,
    ) -> impl Future<Output = Result<HttpResponse, TapError>> + Send;
}

/// Default transport over reqwest: cookie store for login sessions,
/// form-encoded POST bodies, multipart/form-data when file parts are present.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TapError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TapError::transport(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn execute(&self, request: &TapRequest) -> Result<HttpResponse, TapError> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url).query(&request.params),
            Method::Post => {
                if request.files.is_empty() {
                    self.client.post(&request.url).form(&request.params)
                } else {
                    let mut form = reqwest::multipart::Form::new();
                    for (name, value) in &request.params {
                        form = form.text(name.clone(), value.clone());
                    }
                    for part in &request.files {
                        let p = reqwest::multipart::Part::bytes(part.data.clone())
                            .file_name(part.file_name.clone());
                        form = form.part(part.field_name.clone(), p);
                    }
                    self.client.post(&request.url).multipart(form)
                }
            }
        };
        let response = builder
            .send()
            .await
            .map_err(|e| TapError::transport(format!("{} {}: {}", request.method.as_str(), request.url, e)))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TapError::transport(format!("reading response body: {}", e)))?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_body_passes_through() {
        let r = HttpResponse::new(200, &b"payload"[..]);
        assert!(r.is_success());
        assert_eq!(r.into_success_body().unwrap().as_ref(), b"payload");
    }

    #[test]
    fn non_2xx_is_transport_error_with_status() {
        let r = HttpResponse::new(404, &b"not found"[..]);
        match r.into_success_body().unwrap_err() {
            TapError::Transport { status, message } => {
                assert_eq!(status, Some(404));
                assert_eq!(message, "not found");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
