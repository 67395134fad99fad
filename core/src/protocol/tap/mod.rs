/*
 * mod.rs
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

//! IVOA Table Access Protocol client: metadata, request building, the
//! asynchronous job state machine, and the `Tap`/`TapPlus` facades.

mod client;
mod job;
mod metadata;
mod requests;
mod tableset;

pub use client::{Tap, TapPlus, TableFilter};
pub use job::{JobController, PollPolicy, ResultPayload};
pub use metadata::{ColumnMetadata, TableMetadata, RESERVED_SCHEMAS};
pub use requests::{
    build_delete_table_request, build_job_poll_request, build_login_request, build_logout_request,
    build_query_request, build_tables_request, build_upload_table_request, set_top_in_query,
    OutputFormat, QueryRequest, UploadResource, DEFAULT_TOP, TAP_CLIENT_ID,
};
pub use tableset::parse_tableset;
