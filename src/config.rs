//! Run configuration.
//!
//! Inputs arrive as CLI flags or, in CI, as environment variables. They are
//! read once by `structopt` into [`Opt`] and validated into a [`Config`]
//! that the rest of the program receives by reference.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use serde_json::{Map, Value};
use structopt::StructOpt;
use tracing::info;

use crate::error::{Error, Result};

#[derive(Debug, Default, StructOpt)]
#[structopt(
    name = "jira-create",
    about = "Create a Jira issue from CI inputs and report its key"
)]
pub struct Opt {
    /// Project key, e.g. FOO
    #[structopt(long, env = "INPUT_PROJECT")]
    pub project: Option<String>,

    /// Issue type name, e.g. Bug
    #[structopt(long, env = "INPUT_ISSUE_TYPE")]
    pub issue_type: Option<String>,

    #[structopt(long, env = "INPUT_SUMMARY")]
    pub summary: Option<String>,

    /// Markdown description
    #[structopt(long, env = "INPUT_DESCRIPTION")]
    pub description: Option<String>,

    /// File holding the markdown description, `-` for stdin
    #[structopt(long, env = "INPUT_DESCRIPTION_FILE", parse(from_os_str))]
    pub description_file: Option<PathBuf>,

    /// JSON object of additional issue fields
    #[structopt(long, env = "INPUT_EXTRA_FIELDS")]
    pub extra_fields: Option<String>,

    #[structopt(long, env = "JIRA_BASE_URL")]
    pub base_url: Option<String>,

    #[structopt(long, env = "JIRA_USER_EMAIL")]
    pub user_email: Option<String>,

    #[structopt(long, env = "JIRA_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// File the created issue key is appended to
    #[structopt(long, env = "GITHUB_OUTPUT", parse(from_os_str))]
    pub github_output: Option<PathBuf>,

    /// Request timeout in seconds
    #[structopt(long, default_value = "30")]
    pub timeout: u64,

    /// Print the request payload instead of sending it
    #[structopt(long)]
    pub dry_run: bool,

    #[structopt(long = "debug")]
    pub debug: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DescriptionSource {
    None,
    Inline(String),
    File(PathBuf),
}

impl DescriptionSource {
    /// Returns the raw markdown, reading the file if there is one.
    pub fn read(&self) -> Result<String> {
        match self {
            DescriptionSource::None => Ok(String::new()),
            DescriptionSource::Inline(text) => Ok(text.clone()),
            DescriptionSource::File(path) if path.as_os_str() == "-" => {
                info!("Reading description contents from stdin");
                let mut content = String::new();
                io::stdin()
                    .lock()
                    .read_to_string(&mut content)
                    .map_err(|e| {
                        Error::Configuration(format!("failed to read description from stdin: {e}"))
                    })?;
                Ok(content)
            }
            DescriptionSource::File(path) => {
                info!(path = %path.display(), "Reading description contents from file");
                fs::read_to_string(path).map_err(|e| {
                    Error::Configuration(format!(
                        "failed to read description file {}: {e}",
                        path.display()
                    ))
                })
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct JiraConfig {
    pub base_url: String,
    pub user_email: String,
    pub api_token: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Mode {
    DryRun,
    Send(JiraConfig),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub project: String,
    pub issue_type: String,
    pub summary: String,
    pub description: DescriptionSource,
    pub extra_fields: Map<String, Value>,
    pub github_output: Option<PathBuf>,
    pub mode: Mode,
}

// CI runners pass unset inputs as empty strings.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, what: &str, env: &str) -> Result<String> {
    non_empty(value)
        .ok_or_else(|| Error::Configuration(format!("no {what} provided (set {env})")))
}

pub fn parse_extra_fields(raw: Option<&str>) -> Result<Map<String, Value>> {
    let raw = match raw {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(Map::new()),
    };
    match serde_json::from_str(raw) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(Error::Configuration(format!(
            "extra fields must be a JSON object, got {other}"
        ))),
        Err(e) => Err(Error::Configuration(format!(
            "failed to deserialise extra fields: {e}"
        ))),
    }
}

impl Config {
    pub fn from_opt(opt: Opt) -> Result<Config> {
        let project = non_empty(opt.project)
            .ok_or_else(|| Error::Configuration("no project provided as input".to_string()))?;

        let description = match (
            non_empty(opt.description),
            opt.description_file.filter(|p| !p.as_os_str().is_empty()),
        ) {
            (Some(_), Some(_)) => {
                return Err(Error::Configuration(
                    "cannot provide both `description` and `description_file`".to_string(),
                ))
            }
            (Some(text), None) => DescriptionSource::Inline(text),
            (None, Some(path)) => DescriptionSource::File(path),
            (None, None) => DescriptionSource::None,
        };

        let extra_fields = parse_extra_fields(opt.extra_fields.as_deref())?;

        let mode = if opt.dry_run {
            Mode::DryRun
        } else {
            Mode::Send(JiraConfig {
                base_url: required(opt.base_url, "Jira base URL", "JIRA_BASE_URL")?,
                user_email: required(opt.user_email, "Jira user email", "JIRA_USER_EMAIL")?,
                api_token: required(opt.api_token, "Jira API token", "JIRA_API_TOKEN")?,
                timeout: Duration::from_secs(opt.timeout),
            })
        };

        Ok(Config {
            project,
            issue_type: opt.issue_type.unwrap_or_default(),
            summary: opt.summary.unwrap_or_default(),
            description,
            extra_fields,
            github_output: opt.github_output.filter(|p| !p.as_os_str().is_empty()),
            mode,
        })
    }
}
