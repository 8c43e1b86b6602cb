use std::io::Write;

use crate::error::DotnetGetError;
use crate::model::candidate::ToolCandidate;
use crate::model::config::InstallConfig;
use crate::model::workspace::CloneWorkspace;
use crate::process::{CommandOutput, CommandRunner, ToolCommand};
use crate::tool::registry::parse_tool_list;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub name: String,
    pub package_id: String,
    /// Package id of a previous installation that was removed first.
    pub replaced: Option<String>,
    /// Best-effort steps that failed without stopping the install.
    pub warnings: Vec<String>,
}

/// Packs a tool project and registers it as a global dotnet tool.
pub struct ToolInstaller<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    dotnet: &'a str,
    config: &'a InstallConfig,
}

impl<'a, R: CommandRunner + ?Sized> ToolInstaller<'a, R> {
    pub fn new(runner: &'a R, dotnet: &'a str, config: &'a InstallConfig) -> Self {
        Self {
            runner,
            dotnet,
            config,
        }
    }

    /// Uninstall prior → pack → install → remove the clone.
    pub fn install<W: Write>(
        &self,
        candidate: &ToolCandidate,
        workspace: &CloneWorkspace,
        out: &mut W,
    ) -> Result<InstallOutcome, DotnetGetError> {
        let mut warnings = Vec::new();

        let replaced = if self.config.remove_existing {
            match self.remove_previous(candidate, out) {
                Ok(replaced) => replaced,
                Err(err) => {
                    tracing::warn!("{err}");
                    writeln!(out, "{err}")?;
                    warnings.push(err.to_string());
                    None
                }
            }
        } else {
            None
        };

        writeln!(out, "Building {}.", candidate.name)?;
        self.build(candidate)?;

        writeln!(out, "Installing {}.", candidate.name)?;
        self.register(candidate)?;
        tracing::info!("installed {} ({})", candidate.name, candidate.package_id);

        writeln!(out, "Removing cloned repository.")?;
        if let Err(err) = workspace.cleanup() {
            tracing::warn!("{err}");
            writeln!(out, "{err}")?;
            warnings.push(err.to_string());
        }

        Ok(InstallOutcome {
            name: candidate.name.clone(),
            package_id: candidate.package_id.clone(),
            replaced,
            warnings,
        })
    }

    fn remove_previous<W: Write>(
        &self,
        candidate: &ToolCandidate,
        out: &mut W,
    ) -> Result<Option<String>, DotnetGetError> {
        let uninstall_error = |message: String| DotnetGetError::Uninstall {
            tool: candidate.name.clone(),
            message,
        };

        let list = ToolCommand::new(self.dotnet).args(["tool", "list", "--global"]);
        let output = self.execute(&list)?;
        if !output.success {
            return Err(uninstall_error(format!(
                "could not list installed tools: {}",
                output.failure_message()
            )));
        }

        let Some(existing) = parse_tool_list(&output.stdout)
            .into_iter()
            .find(|tool| tool.matches(candidate))
        else {
            return Ok(None);
        };

        writeln!(out, "Removing previously installed {}.", candidate.name)?;
        tracing::info!(
            "uninstalling {} {} before reinstall",
            existing.package_id,
            existing.version
        );

        let uninstall = ToolCommand::new(self.dotnet)
            .args(["tool", "uninstall", "--global"])
            .arg(existing.package_id.as_str());
        let output = self.execute(&uninstall)?;
        if !output.success {
            return Err(uninstall_error(output.failure_message()));
        }

        Ok(Some(existing.package_id))
    }

    fn build(&self, candidate: &ToolCandidate) -> Result<(), DotnetGetError> {
        let mut pack = ToolCommand::new(self.dotnet)
            .arg("pack")
            .current_dir(&candidate.source_path);
        if let Some(configuration) = self.config.configuration.as_deref() {
            pack = pack.args(["-c", configuration]);
        }

        let output = self.execute(&pack)?;
        if !output.success {
            return Err(DotnetGetError::Build {
                tool: candidate.name.clone(),
                message: output.failure_message(),
            });
        }

        Ok(())
    }

    fn register(&self, candidate: &ToolCandidate) -> Result<(), DotnetGetError> {
        let install = ToolCommand::new(self.dotnet)
            .args(["tool", "install", "--global", "--add-source"])
            .arg(candidate.package_source().to_string_lossy())
            .arg(candidate.package_id.as_str())
            .current_dir(&candidate.source_path);

        let output = self.execute(&install)?;
        if !output.success {
            return Err(DotnetGetError::Install {
                tool: candidate.name.clone(),
                message: output.failure_message(),
            });
        }

        Ok(())
    }

    fn execute(&self, command: &ToolCommand) -> Result<CommandOutput, DotnetGetError> {
        self.runner
            .run(command)
            .map_err(|source| DotnetGetError::Spawn {
                program: command.program.clone(),
                source,
            })
    }
}
