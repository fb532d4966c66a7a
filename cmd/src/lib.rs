use std::fmt::Display;
use std::process::Stdio;
use std::time::Duration;
use std::{ffi::OsStr, process::Output};
use tokio::process::Command as BaseCommand;
use tracing::debug;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to spawn command: {command}")]
    Spawn {
        command: String,
        #[source]
        error: tokio::io::Error,
    },

    #[error("command failed: {command}\n{stderr}")]
    Failure { command: String, stderr: String },

    #[error("command timed out after {limit:?}: {command}")]
    TimedOut { command: String, limit: Duration },
}

#[derive(Debug)]
pub struct Command {
    cmd: BaseCommand,
    limit: Option<Duration>,
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cmd = self.cmd.as_std();
        let program = cmd.get_program().to_string_lossy();
        let args = cmd
            .get_args()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        if args.is_empty() {
            write!(f, "{program}",)
        } else {
            write!(f, "{program} {args}",)
        }
    }
}

impl Command {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            cmd: BaseCommand::new(program),
            limit: None,
        }
    }

    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Self {
        self.cmd.arg(arg);
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.cmd.args(args);
        self
    }

    /// Abort the child and fail with [`CommandError::TimedOut`] if it runs
    /// longer than `limit`.
    pub fn timeout(&mut self, limit: Duration) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub async fn output(&mut self) -> Result<Output, CommandError> {
        let command = self.to_string();
        self.cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // dropping the future on deadline expiry must also reap the child
            .kill_on_drop(true);
        let result = match self.limit {
            Some(limit) => match tokio::time::timeout(limit, self.cmd.output()).await {
                Ok(result) => result,
                Err(_) => return Err(CommandError::TimedOut { command, limit }),
            },
            None => self.cmd.output().await,
        };
        result.map_err(|error| CommandError::Spawn { command, error })
    }

    pub async fn run(&mut self) -> Result<Output, CommandError> {
        debug!("running command: {self}");
        self.output().await.and_then(|out| {
            if out.status.success() {
                Ok(out)
            } else {
                Err(CommandError::Failure {
                    command: self.to_string(),
                    stderr: String::from_utf8_lossy(&out.stderr).to_string(),
                })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_command() {
        assert_eq!(
            Command::new("qemu-system-x86_64").to_string(),
            "qemu-system-x86_64"
        )
    }

    #[test]
    fn test_get_command_with_one_arg() {
        assert_eq!(
            Command::new("qemu-system-x86_64").arg("-nographic").to_string(),
            "qemu-system-x86_64 -nographic"
        )
    }

    #[test]
    fn test_get_command_with_two_args() {
        assert_eq!(
            Command::new("qemu-system-x86_64")
                .args(["-device", "help"])
                .to_string(),
            "qemu-system-x86_64 -device help"
        )
    }

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let out = Command::new("echo").arg("hello").run().await.unwrap();
        assert_eq!(String::from_utf8_lossy(&out.stdout), "hello\n");
    }

    #[tokio::test]
    async fn test_run_failure_carries_stderr() {
        let error = Command::new("sh")
            .args(["-c", "echo oops >&2; exit 3"])
            .run()
            .await
            .unwrap_err();
        match error {
            CommandError::Failure { stderr, .. } => assert!(stderr.contains("oops")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let error = Command::new("sleep")
            .arg("5")
            .timeout(Duration::from_millis(50))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(error, CommandError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn test_spawn_error_for_missing_program() {
        let error = Command::new("skiff-missing-program").run().await.unwrap_err();
        assert!(matches!(error, CommandError::Spawn { .. }));
    }
}
