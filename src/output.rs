use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// Prints the created key and hands it to the CI pipeline as `key=<KEY>`.
///
/// Without an output file the legacy `::set-output` workflow command is
/// printed instead.
pub fn report_key(key: &str, github_output: Option<&Path>) -> Result<()> {
    println!("Created issue {}", key);
    match github_output {
        Some(path) => append_output(path, "key", key),
        None => {
            println!("::set-output name=key::{}", key);
            Ok(())
        }
    }
}

fn append_output(path: &Path, name: &str, value: &str) -> Result<()> {
    debug!(path = %path.display(), name, "Writing step output");
    let to_error = |source| Error::Output {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_error)?;
    writeln!(file, "{}={}", name, value).map_err(to_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_report_key_appends_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_output");
        fs::write(&path, "other=value\n").unwrap();

        report_key("FOO-1", Some(&path)).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "other=value\nkey=FOO-1\n");
    }

    #[test]
    fn test_report_key_creates_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_output");

        report_key("FOO-2", Some(&path)).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "key=FOO-2\n");
    }

    #[test]
    fn test_report_key_unwritable_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("github_output");

        assert!(matches!(
            report_key("FOO-3", Some(&path)),
            Err(Error::Output { .. })
        ));
    }
}
