//! External helper programs (downloader, uploader).
//!
//! Commands are configured as a single line split on whitespace; no shell is
//! involved. `{name}` placeholders in arguments are replaced before running.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{WorkerError, WorkerResult};

/// Maximum stderr kept in error messages.
const STDERR_TAIL: usize = 2000;

#[derive(Debug, Clone, PartialEq)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
}

impl ExternalCommand {
    /// Parse a command line such as `"uploader -filename {video} -metaJSON {metadata}"`.
    pub fn parse(line: &str) -> WorkerResult<Self> {
        let mut parts = line.split_whitespace().map(String::from);
        let program = parts
            .next()
            .ok_or_else(|| WorkerError::config_error("empty command line"))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with every `{key}` replaced by its value.
    pub fn render_args(&self, vars: &[(&str, &str)]) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                vars.iter().fold(arg.clone(), |acc, (key, value)| {
                    acc.replace(&format!("{{{}}}", key), value)
                })
            })
            .collect()
    }

    /// Run to completion; a non-zero exit is an error.
    pub async fn run(&self, vars: &[(&str, &str)]) -> WorkerResult<()> {
        let args = self.render_args(vars);
        debug!(program = %self.program, args = ?args, "Running external command");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| WorkerError::command_failed(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let start = stderr.len().saturating_sub(STDERR_TAIL);
            let tail = stderr.get(start..).unwrap_or(&stderr);
            return Err(WorkerError::command_failed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                tail.trim()
            )));
        }

        info!(program = %self.program, "External command finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_render() {
        let cmd = ExternalCommand::parse("uploader -headlessAuth -filename {video} -metaJSON {metadata}").unwrap();
        assert_eq!(cmd.program(), "uploader");
        assert_eq!(
            cmd.render_args(&[("video", "/w/edit.mp4"), ("metadata", "/w/edit.json")]),
            ["-headlessAuth", "-filename", "/w/edit.mp4", "-metaJSON", "/w/edit.json"]
        );
    }

    #[test]
    fn test_parse_empty_is_error() {
        assert!(matches!(ExternalCommand::parse("   "), Err(WorkerError::ConfigError(_))));
    }

    #[test]
    fn test_render_inside_argument() {
        let cmd = ExternalCommand::parse("fetch --out={path} {id}").unwrap();
        assert_eq!(cmd.render_args(&[("id", "123"), ("path", "/r/123.mp4")]), ["--out=/r/123.mp4", "123"]);
    }

    #[tokio::test]
    async fn test_missing_program_fails() {
        let cmd = ExternalCommand::parse("definitely-not-a-real-program-hlt {id}").unwrap();
        let err = cmd.run(&[("id", "1")]).await.unwrap_err();
        assert!(matches!(err, WorkerError::CommandFailed(_)));
    }
}
