use std::fs;
use std::io::{BufRead, Write};
use std::sync::Arc;

use crate::error::DotnetGetError;
use crate::model::config::AppConfig;
use crate::model::source::RepoSource;
use crate::model::stage::Stage;
use crate::model::workspace::CloneWorkspace;
use crate::process::{CommandRunner, ToolCommand};
use crate::tool::installer::{InstallOutcome, ToolInstaller};
use crate::tool::manifest::SkipReason;
use crate::tool::scanner::ManifestScanner;
use crate::tool::selector;

/// Drives one clone → scan → select → install run.
pub struct App<R: CommandRunner> {
    config: AppConfig,
    runner: R,
    workspace: Arc<CloneWorkspace>,
    stage: Stage,
}

impl<R: CommandRunner> App<R> {
    pub fn new(config: AppConfig, runner: R) -> Self {
        let workspace = Arc::new(CloneWorkspace::new(&config.work_dir()));

        Self {
            config,
            runner,
            workspace,
            stage: Stage::Start,
        }
    }

    /// Handle for the interrupt hook.
    pub fn workspace(&self) -> Arc<CloneWorkspace> {
        Arc::clone(&self.workspace)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn run<I, W>(
        &mut self,
        source: &RepoSource,
        input: &mut I,
        out: &mut W,
    ) -> Result<InstallOutcome, DotnetGetError>
    where
        I: BufRead,
        W: Write,
    {
        let result = self.run_stages(source, input, out);

        if let Err(err) = &result {
            tracing::error!("aborted during {}: {err}", self.stage.label());
            self.enter(Stage::Aborted);
            self.workspace.cleanup_quietly();
        }

        result
    }

    fn run_stages<I, W>(
        &mut self,
        source: &RepoSource,
        input: &mut I,
        out: &mut W,
    ) -> Result<InstallOutcome, DotnetGetError>
    where
        I: BufRead,
        W: Write,
    {
        self.enter(Stage::Cloning);
        writeln!(out, "Cloning repository.")?;
        self.clone_repository(source)?;

        self.enter(Stage::Scanning);
        let report =
            ManifestScanner::new(&self.config.scan.manifest_extensions).scan(self.workspace.path());
        tracing::info!(
            "{} tool(s), {} skipped manifest(s)",
            report.candidates.len(),
            report.skipped.len()
        );
        if report.candidates.is_empty() {
            let unusable: Vec<_> = report
                .skipped
                .iter()
                .filter(|skipped| skipped.reason != SkipReason::NotATool)
                .collect();
            if !unusable.is_empty() {
                writeln!(out, "Skipped {} project file(s):", unusable.len())?;
                for skipped in unusable {
                    writeln!(out, "\t{}: {}", skipped.path.display(), skipped.reason)?;
                }
            }
            return Err(DotnetGetError::NoToolsFound {
                root: self.workspace.path().to_path_buf(),
            });
        }

        self.enter(Stage::Selecting);
        let candidate = selector::select(&report.candidates, input, out)?.clone();
        tracing::info!("selected {} from {}", candidate.name, candidate.manifest_path.display());

        self.enter(Stage::Installing);
        let outcome = ToolInstaller::new(
            &self.runner,
            &self.config.tools.dotnet,
            &self.config.install,
        )
        .install(&candidate, &self.workspace, out)?;

        self.enter(Stage::Cleanup);
        if !self.workspace.is_cleaned() {
            self.workspace.cleanup_quietly();
        }

        writeln!(
            out,
            "\n{} has been installed. To uninstall:",
            candidate.name
        )?;
        writeln!(out, "\t{}", candidate.uninstall_hint(&self.config.tools.dotnet))?;

        self.enter(Stage::Done);
        Ok(outcome)
    }

    fn clone_repository(&self, source: &RepoSource) -> Result<(), DotnetGetError> {
        let destination = self.workspace.path();
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut clone = ToolCommand::new(self.config.tools.git.as_str()).arg("clone");
        if let Some(depth) = self.config.git_clone.depth {
            clone = clone.args(["--depth".to_string(), depth.to_string()]);
        }
        let clone = clone
            .arg(source.as_str())
            .arg(destination.to_string_lossy());

        let output = self
            .runner
            .run(&clone)
            .map_err(|err| DotnetGetError::Spawn {
                program: clone.program.clone(),
                source: err,
            })?;

        if !output.success {
            return Err(DotnetGetError::Clone {
                url: source.to_string(),
                message: output.failure_message(),
            });
        }

        Ok(())
    }

    fn enter(&mut self, stage: Stage) {
        tracing::debug!("{} -> {}", self.stage.label(), stage.label());
        self.stage = stage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::{FakeRunner, failed, ok};
    use std::io::Cursor;
    use std::path::{Path, PathBuf};

    const FOO: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <PackAsTool>true</PackAsTool>
    <ToolCommandName>foo</ToolCommandName>
    <PackageOutputPath>./nupkg</PackageOutputPath>
  </PropertyGroup>
</Project>"#;

    fn config(work_dir: &Path) -> AppConfig {
        AppConfig::from_layers(Some(&format!(
            "[clone]\nwork_dir = '{}'\n",
            work_dir.display()
        )))
        .unwrap()
    }

    /// Fake `git clone` that writes `files` into the destination.
    fn cloning(files: &'static [(&'static str, &'static str)]) -> FakeRunner {
        FakeRunner::new(move |cmd| {
            if cmd.args.first().map(String::as_str) == Some("clone") {
                let dest = PathBuf::from(cmd.args.last().unwrap());
                fs::create_dir_all(dest.join(".git")).unwrap();
                for (rel, contents) in files {
                    let path = dest.join(rel);
                    fs::create_dir_all(path.parent().unwrap()).unwrap();
                    fs::write(path, contents).unwrap();
                }
            }
            Ok(ok(""))
        })
    }

    fn source() -> RepoSource {
        RepoSource::parse("https://github.com/acme/foo.git").unwrap()
    }

    fn dotnet_calls(runner: &FakeRunner) -> Vec<String> {
        runner
            .calls
            .borrow()
            .iter()
            .filter(|call| call.program == "dotnet")
            .map(|call| call.args.join(" "))
            .collect()
    }

    #[test]
    fn single_tool_is_installed_end_to_end() {
        let parent = tempfile::tempdir().unwrap();
        let mut app = App::new(config(parent.path()), cloning(&[("src/Foo/Foo.csproj", FOO)]));
        let workspace = app.workspace();
        let mut out = Vec::new();

        let outcome = app
            .run(&source(), &mut Cursor::new("1\n"), &mut out)
            .unwrap();

        assert_eq!(outcome.name, "foo");
        assert_eq!(outcome.package_id, "Foo");
        assert_eq!(app.stage(), Stage::Done);
        assert!(!workspace.path().exists());

        let clone_call = app.runner.calls.borrow()[0].clone();
        assert_eq!(clone_call.program, "git");
        assert_eq!(
            clone_call.args,
            [
                "clone".to_string(),
                "https://github.com/acme/foo.git".to_string(),
                workspace.path().to_string_lossy().into_owned(),
            ]
        );

        let calls = dotnet_calls(&app.runner);
        assert_eq!(calls[0], "tool list --global");
        assert_eq!(calls[1], "pack");
        assert!(calls[2].starts_with("tool install --global --add-source "));
        assert!(calls[2].ends_with(" Foo"));

        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("Cloning repository.\nDiscovered 1 tool:\n\tfoo [1]\n"));
        assert!(out.ends_with(
            "\nfoo has been installed. To uninstall:\n\tdotnet tool uninstall Foo --global\n"
        ));
    }

    #[test]
    fn empty_repository_reports_no_tools() {
        let parent = tempfile::tempdir().unwrap();
        let mut app = App::new(config(parent.path()), cloning(&[("README.md", "# foo")]));
        let workspace = app.workspace();

        let err = app
            .run(&source(), &mut Cursor::new("1\n"), &mut std::io::sink())
            .unwrap_err();

        assert!(matches!(err, DotnetGetError::NoToolsFound { .. }));
        assert_eq!(app.stage(), Stage::Aborted);
        assert!(dotnet_calls(&app.runner).is_empty());
        assert!(!workspace.path().exists());
    }

    #[test]
    fn unusable_manifests_are_listed_when_nothing_installs() {
        let parent = tempfile::tempdir().unwrap();
        const BROKEN: &str =
            "<Project><PropertyGroup><PackAsTool>true</PackAsTool></PropertyGroup></Project>";
        let mut app = App::new(
            config(parent.path()),
            cloning(&[("Lib/Lib.csproj", "<Project />"), ("Cli/Cli.csproj", BROKEN)]),
        );
        let mut out = Vec::new();

        let err = app
            .run(&source(), &mut Cursor::new(""), &mut out)
            .unwrap_err();

        assert!(matches!(err, DotnetGetError::NoToolsFound { .. }));
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Skipped 1 project file(s):"));
        assert!(out.contains("Cli.csproj: missing ToolCommandName"));
        assert!(!out.contains("Lib.csproj"));
    }

    #[test]
    fn out_of_range_choice_installs_nothing() {
        for answer in ["0\n", "2\n", "foo\n"] {
            let parent = tempfile::tempdir().unwrap();
            let mut app =
                App::new(config(parent.path()), cloning(&[("src/Foo/Foo.csproj", FOO)]));
            let workspace = app.workspace();

            let err = app
                .run(&source(), &mut Cursor::new(answer), &mut std::io::sink())
                .unwrap_err();

            assert!(matches!(err, DotnetGetError::InvalidSelection(_)), "{answer}");
            assert_eq!(err.exit_code(), 2);
            assert!(dotnet_calls(&app.runner).is_empty());
            assert!(!workspace.path().exists());
        }
    }

    #[test]
    fn clone_failure_aborts() {
        let parent = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new(|_| Ok(failed("fatal: repository not found")));
        let mut app = App::new(config(parent.path()), runner);

        let err = app
            .run(&source(), &mut Cursor::new("1\n"), &mut std::io::sink())
            .unwrap_err();

        assert!(matches!(err, DotnetGetError::Clone { .. }));
        assert!(err.to_string().contains("repository not found"));
        assert_eq!(app.stage(), Stage::Aborted);
        assert_eq!(app.runner.calls.borrow().len(), 1);
    }

    #[test]
    fn clone_depth_is_forwarded() {
        let parent = tempfile::tempdir().unwrap();
        let mut config = config(parent.path());
        config.git_clone.depth = Some(1);
        let mut app = App::new(config, cloning(&[]));

        let _ = app.run(&source(), &mut Cursor::new(""), &mut std::io::sink());

        let calls = app.runner.calls.borrow();
        assert_eq!(calls[0].args[..3], ["clone", "--depth", "1"]);
    }

    #[test]
    fn build_failure_still_removes_clone() {
        let parent = tempfile::tempdir().unwrap();
        let clone = cloning(&[("Foo/Foo.csproj", FOO)]);
        let runner = FakeRunner::new(move |cmd| {
            if cmd.args.first().map(String::as_str) == Some("pack") {
                return Ok(failed("build failed"));
            }
            clone.run(cmd)
        });
        let mut app = App::new(config(parent.path()), runner);
        let workspace = app.workspace();

        let err = app
            .run(&source(), &mut Cursor::new("1\n"), &mut std::io::sink())
            .unwrap_err();

        assert!(matches!(err, DotnetGetError::Build { .. }));
        assert!(!workspace.path().exists());
    }
}
