pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod output;
pub mod parser;
pub mod payload;
pub mod translator;

use std::process;

use structopt::StructOpt;
use tracing::{debug, error, info, Level};
use tracing_subscriber::EnvFilter;

use crate::client::JiraClient;
use crate::config::{Config, Mode, Opt};
use crate::error::Result;

fn init_tracing(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn run(config: Config) -> Result<()> {
    let markdown = config.description.read()?;
    let description = translator::convert(&markdown);
    debug!(%description, "Converted description to Jira markup");

    let payload = payload::build_payload(
        &config.project,
        &config.issue_type,
        &config.summary,
        &description,
        config.extra_fields,
    );

    match config.mode {
        Mode::DryRun => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        Mode::Send(jira) => {
            info!(project = %config.project, "Creating Jira issue");
            let key = JiraClient::new(&jira)?.create_issue(&payload)?;
            output::report_key(&key, config.github_output.as_deref())
        }
    }
}

fn main() {
    let opt = Opt::from_args();
    init_tracing(opt.debug);

    if let Err(err) = Config::from_opt(opt).and_then(run) {
        error!("{}", err);
        process::exit(1);
    }
}

#[cfg(test)]
mod test_main {
    use crate::config::{Config, Opt};
    use crate::run;
    use std::io::Write;

    #[test]
    fn test_run_dry_run_with_description_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# Steps\n- run **it**").unwrap();
        let config = Config::from_opt(Opt {
            project: Some("FOO".to_string()),
            description_file: Some(file.path().to_path_buf()),
            dry_run: true,
            ..Opt::default()
        })
        .unwrap();
        assert!(run(config).is_ok());
    }

    #[test]
    fn test_run_missing_description_file() {
        let config = Config::from_opt(Opt {
            project: Some("FOO".to_string()),
            description_file: Some("/nonexistent/description.md".into()),
            dry_run: true,
            ..Opt::default()
        })
        .unwrap();
        assert!(run(config).is_err());
    }
}
