//! Jira REST client.
//!
//! One blocking request per run. Issues are created through API v2 because
//! its `description` field takes wiki markup as a plain string.

use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::config::JiraConfig;
use crate::error::{Error, Result, TransportError};
use crate::payload::CreateIssuePayload;

const CREATE_ISSUE_ENDPOINT: &str = "/rest/api/2/issue";

pub const USER_AGENT: &str = concat!("jira-create/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct CreateIssueResponse {
    key: String,
}

pub struct JiraClient {
    client: Client,
    base_url: String,
    user_email: String,
    api_token: String,
}

impl JiraClient {
    pub fn new(config: &JiraConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(TransportError::from)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_email: config.user_email.clone(),
            api_token: config.api_token.clone(),
        })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Creates the issue and returns its key, e.g. `FOO-123`.
    ///
    /// On a transport failure the request body is logged before the error
    /// is returned.
    pub fn create_issue(&self, payload: &CreateIssuePayload) -> Result<String> {
        match self.post_issue(payload) {
            Err(err @ Error::Transport(_)) => {
                log_request_body(payload);
                Err(err)
            }
            result => result,
        }
    }

    fn post_issue(&self, payload: &CreateIssuePayload) -> Result<String> {
        let response = self.send_with_retry(payload)?;
        let status = response.status();
        let body = response.text().map_err(TransportError::from)?;
        debug!(%status, "Jira responded");

        if !status.is_success() {
            return Err(TransportError::Status { status, body }.into());
        }

        let created: CreateIssueResponse = serde_json::from_str(&body)
            .map_err(|e| Error::ResponseParse(format!("{e}: {body}")))?;
        Ok(created.key)
    }

    fn send_with_retry(&self, payload: &CreateIssuePayload) -> Result<Response> {
        let response = match self.send(payload) {
            // A timed-out request may already have created the issue.
            Err(e) if e.is_connect() => {
                warn!(error = %e, "Request to Jira failed, retrying once");
                self.send(payload)
            }
            response => response,
        };
        response.map_err(|e| Error::Transport(e.into()))
    }

    fn send(&self, payload: &CreateIssuePayload) -> reqwest::Result<Response> {
        self.client
            .post(self.api_url(CREATE_ISSUE_ENDPOINT))
            .basic_auth(&self.user_email, Some(&self.api_token))
            .json(payload)
            .send()
    }
}

fn log_request_body(payload: &CreateIssuePayload) {
    match serde_json::to_string_pretty(payload) {
        Ok(body) => error!("Request body:\n{}", body),
        Err(_) => error!("Request body: {:?}", payload),
    }
}
