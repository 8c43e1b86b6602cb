use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Number of trailing stderr lines kept when a command fails.
const STDERR_TAIL_LINES: usize = 10;

/// One invocation of an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Short description of a failed run: exit status plus the tail of stderr.
    pub fn failure_message(&self) -> String {
        let status = match self.code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        };

        let lines: Vec<&str> = self
            .stderr
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();
        if lines.is_empty() {
            return status;
        }

        let tail = &lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..];
        format!("{status}\n{}", tail.join("\n"))
    }
}

/// Seam for every external process the installer spawns.
pub trait CommandRunner {
    /// Runs the command to completion. `Err` means it could not be spawned at all.
    fn run(&self, command: &ToolCommand) -> std::io::Result<CommandOutput>;
}

#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> std::io::Result<CommandOutput> {
        tracing::debug!("running: {command}");

        let mut process = Command::new(&command.program);
        process.args(&command.args);
        if let Some(cwd) = command.cwd.as_ref() {
            process.current_dir(cwd);
        }

        let output = process.output()?;
        let result = CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.stdout.is_empty() {
            tracing::debug!("{} stdout:\n{}", command.program, result.stdout.trim_end());
        }
        if !result.success {
            tracing::warn!("{command} failed: {}", result.failure_message());
        }

        Ok(result)
    }
}
