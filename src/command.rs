use std::path::Path;
use std::process::{Command, Stdio};

/// Where a child process's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Collected; stderr is reported if the command fails.
    Captured,
    /// Streamed straight to this process's stdout/stderr.
    Inherited,
}

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Runs external tools (`git`, `cargo`) on behalf of the scaffolder.
pub trait CommandRunner {
    fn run(&self, dir: Option<&Path>, program: &str, args: &[&str], output: Output) -> Result<(), CommandError>;
}

/// [`CommandRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, dir: Option<&Path>, program: &str, args: &[&str], output: Output) -> Result<(), CommandError> {
        let command = display_command(program, args);
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(%command, "running");

        match output {
            Output::Captured => {
                let out = cmd
                    .stdin(Stdio::null())
                    .output()
                    .map_err(|source| CommandError::Spawn { command: command.clone(), source })?;
                if out.status.success() {
                    Ok(())
                } else {
                    Err(CommandError::Failed {
                        command,
                        status: out.status.to_string(),
                        stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
                    })
                }
            }
            Output::Inherited => {
                let status = cmd
                    .stdin(Stdio::null())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .map_err(|source| CommandError::Spawn { command: command.clone(), source })?;
                if status.success() {
                    Ok(())
                } else {
                    Err(CommandError::Failed {
                        command,
                        status: status.to_string(),
                        stderr: String::new(),
                    })
                }
            }
        }
    }
}

pub fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
