use std::path::{Path, PathBuf};

/// A dotnet tool project discovered in a cloned repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCandidate {
    /// Command name registered with `dotnet tool` (`ToolCommandName`).
    pub name: String,
    /// Directory containing the manifest; `dotnet pack` runs here.
    pub source_path: PathBuf,
    /// `PackageOutputPath` as written in the manifest.
    pub package_output_dir: String,
    /// NuGet package id passed to `dotnet tool install`.
    pub package_id: String,
    pub manifest_path: PathBuf,
}

impl ToolCandidate {
    /// Directory handed to `--add-source`, resolved against the project directory.
    pub fn package_source(&self) -> PathBuf {
        // MSBuild paths are often written with Windows separators.
        let normalized = if cfg!(windows) {
            self.package_output_dir.clone()
        } else {
            self.package_output_dir.replace('\\', "/")
        };
        let declared = Path::new(&normalized);
        if declared.is_absolute() {
            declared.to_path_buf()
        } else {
            self.source_path.join(declared)
        }
    }

    pub fn uninstall_hint(&self, dotnet: &str) -> String {
        format!("{dotnet} tool uninstall {} --global", self.package_id)
    }
}
