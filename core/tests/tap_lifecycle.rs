/*
 * tap_lifecycle.rs
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

//! End-to-end client scenarios over a scripted transport: table listing,
//! sync and async queries, authenticated sessions, table upload and removal.
//! No sockets are opened; every exchange is replayed from a script and every
//! outgoing request is recorded for inspection.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use cannocchiale_core::protocol::tap::TableFilter;
use cannocchiale_core::request::{Method, TapRequest};
use cannocchiale_core::transport::{HttpResponse, Transport};
use cannocchiale_core::{
    JobPhase, OutputFormat, PollPolicy, QueryRequest, Tap, TapError, TapPlus, TapUrl,
    UploadResource,
};

struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<TapRequest>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<HttpResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<TapRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn execute(&self, request: &TapRequest) -> Result<HttpResponse, TapError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TapError::transport("no scripted response left"))
    }
}

fn tap(transport: ScriptedTransport) -> Tap<ScriptedTransport> {
    let url = TapUrl::from_url("http://archive.example/tap-server/tap").unwrap();
    Tap::with_transport(url, transport).poll_policy(PollPolicy {
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
        max_wait: Duration::from_secs(5),
        unknown_phase_budget: 3,
    })
}

fn tap_plus(transport: ScriptedTransport) -> TapPlus<ScriptedTransport> {
    let url = TapUrl::from_url("http://archive.example/tap-server/tap").unwrap();
    TapPlus::with_transport(url, transport, "tap-server", "Upload").unwrap()
}

const TABLESET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<vod:tableset xmlns:vod="http://www.ivoa.net/xml/VODataService/v1.1">
  <schema>
    <name>tap_schema</name>
    <table><name>columns</name></table>
  </schema>
  <schema>
    <name>public</name>
    <table>
      <name>hipparcos</name>
      <description>Hipparcos catalogue</description>
      <column>
        <name>hip</name>
        <dataType>int</dataType>
        <ucd>meta.id</ucd>
      </column>
    </table>
  </schema>
</vod:tableset>"#;

fn job_doc(phase: &str) -> HttpResponse {
    HttpResponse::new(
        200,
        format!(
            r#"<uws:job xmlns:uws="http://www.ivoa.net/xml/UWS/v1.0">
                <uws:jobId>lifecycle1</uws:jobId>
                <uws:phase>{}</uws:phase>
            </uws:job>"#,
            phase
        )
        .into_bytes(),
    )
}

#[tokio::test]
async fn load_tables_filters_reserved_schemas() {
    let connection = tap(ScriptedTransport::new(vec![HttpResponse::new(
        200,
        TABLESET.as_bytes().to_vec(),
    )]));
    let tables = connection.load_tables().await.unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].qualified_name(), "public.hipparcos");
    assert_eq!(tables[0].columns[0].ucd, "meta.id");

    let requests = connection_requests(&connection);
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].url, "http://archive.example/tap-server/tap/tables");
    assert!(requests[0].params.is_empty());
}

#[tokio::test]
async fn load_table_requests_one_qualified_name() {
    let connection = tap(ScriptedTransport::new(vec![HttpResponse::new(
        200,
        TABLESET.as_bytes().to_vec(),
    )]));
    let table = connection.load_table("public.hipparcos").await.unwrap();
    assert_eq!(table.name, "hipparcos");

    let requests = connection_requests(&connection);
    assert_eq!(requests[0].param_value("tables"), Some("public.hipparcos"));
}

#[tokio::test]
async fn sync_query_returns_body_as_payload() {
    let connection = tap(ScriptedTransport::new(vec![HttpResponse::new(
        200,
        &b"<VOTABLE>rows</VOTABLE>"[..],
    )]));
    let query = QueryRequest::new("SELECT TOP 3 hip FROM public.hipparcos");
    let payload = connection.query(&query).await.unwrap();
    assert_eq!(payload.data.as_ref(), b"<VOTABLE>rows</VOTABLE>");
    assert_eq!(payload.url, "http://archive.example/tap-server/tap/sync");

    let requests = connection_requests(&connection);
    assert_eq!(requests[0].param_value("REQUEST"), Some("doQuery"));
    assert_eq!(requests[0].param_value("PHASE"), Some("RUN"));
}

#[tokio::test]
async fn query_async_runs_the_whole_lifecycle() {
    let completed = HttpResponse::new(
        200,
        r#"<uws:job xmlns:uws="http://www.ivoa.net/xml/UWS/v1.0"
                    xmlns:xlink="http://www.w3.org/1999/xlink">
            <uws:jobId>lifecycle1</uws:jobId>
            <uws:phase>COMPLETED</uws:phase>
            <uws:results>
                <uws:result xlink:href="http://archive.example/result/1"/>
            </uws:results>
        </uws:job>"#
            .as_bytes()
            .to_vec(),
    );
    let connection = tap(ScriptedTransport::new(vec![
        job_doc("PENDING"), // submission response
        job_doc("QUEUED"),
        job_doc("EXECUTING"),
        completed,
        HttpResponse::new(200, &b"final votable"[..]),
    ]));
    let query = QueryRequest::new("SELECT hip FROM public.hipparcos").name("lifecycle");
    let results = connection.query_async(&query).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].data.as_ref(), b"final votable");
    assert_eq!(results[0].format, OutputFormat::Votable);

    let requests = connection_requests(&connection);
    assert_eq!(requests.len(), 5);
    assert_eq!(requests[0].url, "http://archive.example/tap-server/tap/async");
    assert_eq!(requests[0].param_value("PHASE"), Some("RUN"));
    assert_eq!(requests[0].param_value("jobname"), Some("lifecycle"));
    // polls go to the derived job location
    assert_eq!(
        requests[1].url,
        "http://archive.example/tap-server/tap/async/lifecycle1"
    );
    assert_eq!(requests[4].url, "http://archive.example/result/1");
}

#[tokio::test]
async fn submit_async_hands_back_a_pending_job() {
    let connection = tap(ScriptedTransport::new(vec![job_doc("PENDING")]));
    let query = QueryRequest::new("SELECT hip FROM public.hipparcos").autorun(false);
    let job = connection.submit_async(&query).await.unwrap();
    assert_eq!(job.phase, JobPhase::Pending);
    assert_eq!(
        job.location_id,
        "http://archive.example/tap-server/tap/async/lifecycle1"
    );

    let requests = connection_requests(&connection);
    assert_eq!(requests[0].param_value("PHASE"), None);
}

#[tokio::test]
async fn login_and_logout_use_secure_context_endpoints() {
    let connection = tap_plus(ScriptedTransport::new(vec![
        HttpResponse::new(200, &b"OK"[..]),
        HttpResponse::new(200, &b"OK"[..]),
    ]));
    connection.login("ada", "s3cret").await.unwrap();
    connection.logout().await.unwrap();

    let requests = plus_requests(&connection);
    assert_eq!(requests[0].url, "https://archive.example/tap-server/login");
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].param_value("username"), Some("ada"));
    assert_eq!(requests[0].param_value("password"), Some("s3cret"));
    assert_eq!(requests[1].url, "https://archive.example/tap-server/logout");
}

#[tokio::test]
async fn failed_login_is_a_transport_error() {
    let connection = tap_plus(ScriptedTransport::new(vec![HttpResponse::new(
        403,
        &b"bad credentials"[..],
    )]));
    let e = connection.login("ada", "wrong").await.unwrap_err();
    match e {
        TapError::Transport { status, message } => {
            assert_eq!(status, Some(403));
            assert_eq!(message, "bad credentials");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn filtered_listing_sends_tap_plus_knobs() {
    let connection = tap_plus(ScriptedTransport::new(vec![HttpResponse::new(
        200,
        TABLESET.as_bytes().to_vec(),
    )]));
    let filter = TableFilter { only_names: true, include_shared: true };
    let tables = connection.load_tables(&filter).await.unwrap();
    assert_eq!(tables.len(), 1);

    let requests = plus_requests(&connection);
    assert_eq!(requests[0].param_value("only_tables"), Some("true"));
    assert_eq!(requests[0].param_value("share_accessible"), Some("true"));
}

#[tokio::test]
async fn upload_then_delete_round_trip() {
    let connection = tap_plus(ScriptedTransport::new(vec![
        HttpResponse::new(200, &b"uploaded"[..]),
        HttpResponse::new(200, &b"deleted"[..]),
    ]));
    let resource = UploadResource::votable(b"<VOTABLE/>".to_vec());
    connection
        .upload_table(&resource, "my_stars", "test catalogue", OutputFormat::Votable)
        .await
        .unwrap();
    connection.delete_user_table("my_stars", false).await.unwrap();

    let requests = plus_requests(&connection);
    assert_eq!(requests[0].url, "http://archive.example/tap-server/Upload");
    assert_eq!(requests[0].param_value("TASKID"), Some("-1"));
    assert_eq!(requests[0].param_value("TABLE_NAME"), Some("my_stars"));
    assert_eq!(requests[0].files.len(), 1);
    assert_eq!(requests[0].files[0].field_name, "FILE");
    assert_eq!(requests[1].param_value("TABLE_NAME"), Some("my_stars"));
    assert_eq!(requests[1].param_value("DELETE"), Some("TRUE"));
    assert!(requests[1].files.is_empty());
}

#[tokio::test]
async fn query_upload_carries_inline_table() {
    let connection = tap(ScriptedTransport::new(vec![HttpResponse::new(
        200,
        &b"<VOTABLE/>"[..],
    )]));
    let query = QueryRequest::new("SELECT * FROM tap_upload.mini AS m")
        .upload(UploadResource::votable(b"<VOTABLE/>".to_vec()), "mini");
    connection.query(&query).await.unwrap();

    let requests = connection_requests(&connection);
    assert_eq!(requests[0].param_value("UPLOAD"), Some("mini,param:mini"));
    assert_eq!(requests[0].files[0].field_name, "mini");
}

fn connection_requests(connection: &Tap<ScriptedTransport>) -> Vec<TapRequest> {
    connection.transport().requests()
}

fn plus_requests(connection: &TapPlus<ScriptedTransport>) -> Vec<TapRequest> {
    connection.transport().requests()
}
