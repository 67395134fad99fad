/*
 * job.rs
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

//! Asynchronous job control: submit, poll with backoff until a terminal
//! phase, fetch results.
//!
//! The controller owns no job state; each call operates on a caller-owned
//! `Job`, so any number of controllers can drive independent jobs over one
//! shared transport. Polling is a plain wait-with-backoff on the caller's
//! task; a timeout abandons the wait but never cancels the remote job.

use std::time::Duration;

use bytes::Bytes;
use tokio::time::{sleep, Instant};

use crate::error::TapError;
use crate::protocol::tap::requests::{build_job_poll_request, OutputFormat};
use crate::protocol::uws::{parse_job, Job, JobPhase};
use crate::request::TapRequest;
use crate::transport::Transport;

/// Poll timing: delay doubles each poll from `initial_delay` up to
/// `max_delay`; the whole wait is bounded by `max_wait`. A job that stays in
/// an unrecognized phase for more than `unknown_phase_budget` consecutive
/// polls is reported as a protocol failure.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_wait: Duration,
    pub unknown_phase_budget: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_wait: Duration::from_secs(600),
            unknown_phase_budget: 3,
        }
    }
}

/// One fetched result: the URL it came from, the format tag the query asked
/// for, and the raw payload.
#[derive(Debug, Clone)]
pub struct ResultPayload {
    pub url: String,
    pub format: OutputFormat,
    pub data: Bytes,
}

/// Drives the UWS job lifecycle over a borrowed transport.
pub struct JobController<'t, T: Transport> {
    transport: &'t T,
    async_endpoint: String,
    policy: PollPolicy,
}

impl<'t, T: Transport> JobController<'t, T> {
    pub fn new(transport: &'t T, async_endpoint: impl Into<String>, policy: PollPolicy) -> Self {
        Self {
            transport,
            async_endpoint: async_endpoint.into(),
            policy,
        }
    }

    /// Submit a prebuilt async query request and parse the server's initial
    /// job document. When the document carries no location, the poll URL is
    /// derived as `{async_endpoint}/{job_id}`.
    pub async fn submit(&self, request: &TapRequest) -> Result<Job, TapError> {
        let body = self.transport.execute(request).await?.into_success_body()?;
        let mut job = parse_job(&body)?;
        if job.location_id.is_empty() && !job.job_id.is_empty() {
            job.location_id = format!("{}/{}", self.async_endpoint, job.job_id);
        }
        log::debug!("submitted job {} in phase {}", job.job_id, job.phase);
        Ok(job)
    }

    /// Re-fetch the job document from its location and replace the job's
    /// phase, timestamps, results, and error message with the server's
    /// latest report. A backward phase transition is a protocol anomaly: it
    /// is logged and the new report is trusted.
    pub async fn poll(&self, job: &mut Job) -> Result<JobPhase, TapError> {
        if job.location_id.is_empty() {
            return Err(TapError::usage("job has no location to poll"));
        }
        let request = build_job_poll_request(&job.location_id);
        let body = self.transport.execute(&request).await?.into_success_body()?;
        let mut refreshed = parse_job(&body)?;
        if let (Some(old), Some(new)) = (job.phase.rank(), refreshed.phase.rank()) {
            if new < old {
                log::warn!(
                    "job {}: phase regressed {} -> {}; trusting server",
                    job.job_id,
                    job.phase,
                    refreshed.phase
                );
            }
        }
        // Some servers omit identity fields from status documents.
        if refreshed.location_id.is_empty() {
            refreshed.location_id = std::mem::take(&mut job.location_id);
        }
        if refreshed.job_id.is_empty() {
            refreshed.job_id = std::mem::take(&mut job.job_id);
        }
        *job = refreshed;
        Ok(job.phase)
    }

    /// Poll with backoff until the job reaches a terminal phase.
    ///
    /// `Completed` returns Ok; `Error`/`Aborted`/`Archived` return a
    /// protocol-state error carrying the server's message; exceeding the
    /// policy's `max_wait` returns a timeout and leaves the remote job
    /// running (the caller keeps the location and may resume polling).
    pub async fn wait_for_completion(&self, job: &mut Job) -> Result<(), TapError> {
        let started = Instant::now();
        let mut delay = self.policy.initial_delay;
        let mut unknown_streak: u32 = 0;

        loop {
            if let Some(result) = self.check_terminal(job) {
                return result;
            }
            if job.phase == JobPhase::Unknown {
                unknown_streak += 1;
                if unknown_streak > self.policy.unknown_phase_budget {
                    return Err(TapError::ProtocolState {
                        phase: JobPhase::Unknown,
                        message: format!(
                            "job {} stayed in an unrecognized phase for {} polls",
                            job.job_id, unknown_streak
                        ),
                    });
                }
            } else {
                unknown_streak = 0;
            }
            let waited = started.elapsed();
            if waited >= self.policy.max_wait {
                return Err(TapError::Timeout { waited });
            }
            sleep(delay).await;
            delay = (delay * 2).min(self.policy.max_delay);
            let phase = self.poll(job).await?;
            log::debug!("job {} phase {}", job.job_id, phase);
        }
    }

    fn check_terminal(&self, job: &Job) -> Option<Result<(), TapError>> {
        match job.phase {
            JobPhase::Completed => Some(Ok(())),
            JobPhase::Error | JobPhase::Aborted => Some(Err(TapError::ProtocolState {
                phase: job.phase,
                message: job.error_message.clone(),
            })),
            JobPhase::Archived => Some(Err(TapError::ProtocolState {
                phase: JobPhase::Archived,
                message: "job results have been archived".to_string(),
            })),
            _ => None,
        }
    }

    /// Fetch every result link of a completed job, one GET per URL in
    /// document order. Jobs in any other phase have no results to fetch.
    pub async fn fetch_results(
        &self,
        job: &Job,
        format: OutputFormat,
    ) -> Result<Vec<ResultPayload>, TapError> {
        if job.phase != JobPhase::Completed {
            return Err(TapError::ProtocolState {
                phase: job.phase,
                message: format!("job {} has no results to fetch", job.job_id),
            });
        }
        let mut payloads = Vec::with_capacity(job.result_urls.len());
        for url in &job.result_urls {
            let request = TapRequest::get(url.clone());
            let data = self.transport.execute(&request).await?.into_success_body()?;
            payloads.push(ResultPayload {
                url: url.clone(),
                format,
                data,
            });
        }
        Ok(payloads)
    }
}
