/*
 * lib.rs
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

//! Cannocchiale core: a client library for the IVOA Table Access Protocol
//! and the Universal Worker Service job protocol.
//!
//! The layers, bottom up:
//! - [`uri`]: endpoint addressing (`TapUrl`).
//! - [`request`]/[`transport`]: protocol-neutral request description and
//!   the HTTP transport seam.
//! - [`protocol::uws`]: UWS job documents (model + namespace-aware parser).
//! - [`protocol::tap`]: TAP metadata, request builders, the async job
//!   controller, and the `Tap`/`TapPlus` connection facades.
//!
//! Everything network-facing is generic over [`transport::Transport`], so
//! tests script exchanges without sockets.

pub mod error;
pub mod protocol;
pub mod request;
pub mod transport;
pub mod uri;

pub use error::{ParseError, TapError};
pub use protocol::tap::{
    JobController, OutputFormat, PollPolicy, QueryRequest, ResultPayload, TableFilter, Tap,
    TapPlus, UploadResource,
};
pub use protocol::uws::{parse_job, Job, JobPhase};
pub use transport::{HttpTransport, Transport};
pub use uri::TapUrl;
