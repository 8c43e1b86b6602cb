mod app;
mod error;
mod model;
mod process;
mod tool;

use std::future::Future;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use error::DotnetGetError;
use model::config::AppConfig;
use model::source::RepoSource;
use model::workspace::CloneWorkspace;
use process::SystemRunner;

/// Install dotnet tools without hosting on NuGet. Simply point to a git repository.
#[derive(Parser)]
#[command(name = "dotnet-get", version)]
struct Cli {
    /// Git repository URL.
    url: String,

    /// Config file to use instead of the per-user one.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    // Logging goes to a file; stdout is reserved for the prompt.
    let guard = init_logging()?;
    tracing::info!("dotnet-get starting");

    let config = AppConfig::load(cli.config.as_deref())?;

    let source = match RepoSource::parse(&cli.url) {
        Ok(source) => source,
        Err(err) => return Ok(report(&err)),
    };

    // Installed before the clone starts.
    let mut shutdown = ShutdownSignal::install()?;

    let mut app = App::new(config, SystemRunner);
    let workspace = app.workspace();

    let pipeline = tokio::task::spawn_blocking(move || {
        let result = app.run(&source, &mut io::stdin().lock(), &mut io::stdout().lock());
        tracing::debug!("run finished in stage {}", app.stage().label());
        result
    });

    match until_interrupted(pipeline, shutdown.recv()).await {
        Finished::Completed(joined) => match joined? {
            Ok(outcome) => {
                if let Some(previous) = outcome.replaced.as_deref() {
                    tracing::info!("replaced previous install of {previous}");
                }
                for warning in &outcome.warnings {
                    tracing::warn!("{} ({}): {warning}", outcome.name, outcome.package_id);
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(report(&err)),
        },
        Finished::Interrupted => {
            on_interrupt(&workspace, &mut io::stderr().lock());
            drop(guard);
            // The pipeline thread may be blocked on stdin; the runtime would wait for it forever.
            std::process::exit(130);
        }
    }
}

enum Finished<T> {
    Completed(T),
    Interrupted,
}

/// Races `pipeline` against `shutdown`. An interrupt wins when both are ready.
async fn until_interrupted<T>(
    pipeline: impl Future<Output = T>,
    shutdown: impl Future<Output = ()>,
) -> Finished<T> {
    tokio::select! {
        biased;
        () = shutdown => Finished::Interrupted,
        value = pipeline => Finished::Completed(value),
    }
}

fn on_interrupt<W: Write>(workspace: &CloneWorkspace, stderr: &mut W) {
    let _ = writeln!(stderr, "\nInterrupted. Removing cloned repository.");
    workspace.cleanup_quietly();
}

fn report(err: &DotnetGetError) -> ExitCode {
    report_to(err, &mut io::stderr().lock())
}

fn report_to<W: Write>(err: &DotnetGetError, stderr: &mut W) -> ExitCode {
    tracing::error!("{err}");
    let _ = writeln!(stderr, "error: {err}");
    ExitCode::from(err.exit_code())
}

fn init_logging() -> Result<WorkerGuard> {
    let log_dir = directories::ProjectDirs::from("", "", "dotnet-get")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "dotnet-get.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dotnet_get=info"));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();

    Ok(guard)
}

#[cfg(unix)]
struct ShutdownSignal {
    sigterm: tokio::signal::unix::Signal,
    sigint: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignal {
    fn install() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            sigterm: signal(SignalKind::terminate())?,
            sigint: signal(SignalKind::interrupt())?,
        })
    }

    async fn recv(&mut self) {
        tokio::select! {
            _ = self.sigterm.recv() => tracing::info!("received SIGTERM"),
            _ = self.sigint.recv() => tracing::info!("received SIGINT (Ctrl+C)"),
        }
    }
}

#[cfg(not(unix))]
struct ShutdownSignal {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(not(unix))]
impl ShutdownSignal {
    fn install() -> io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    async fn recv(&mut self) {
        self.ctrl_c.recv().await;
        tracing::info!("received Ctrl+C");
    }
}
