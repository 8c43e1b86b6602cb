use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::model::candidate::ToolCandidate;
use crate::tool::manifest::{ProjectManifest, SkipReason};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedManifest {
    pub path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub candidates: Vec<ToolCandidate>,
    pub skipped: Vec<SkippedManifest>,
}

/// Finds project manifests under a root and extracts the tool projects.
pub struct ManifestScanner {
    extensions: Vec<String>,
}

impl ManifestScanner {
    pub fn new(extensions: &[String]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn scan(&self, root: &Path) -> ScanReport {
        let mut report = ScanReport::default();

        for path in self.manifest_paths(root) {
            match ProjectManifest::read(&path).and_then(|m| m.into_candidate(&path)) {
                Ok(candidate) => {
                    tracing::info!("found tool {} in {}", candidate.name, path.display());
                    report.candidates.push(candidate);
                }
                Err(reason) => {
                    match &reason {
                        SkipReason::NotATool => {
                            tracing::debug!("skipping {}: {reason}", path.display());
                        }
                        _ => tracing::warn!("skipping {}: {reason}", path.display()),
                    }
                    report.skipped.push(SkippedManifest { path, reason });
                }
            }
        }

        report
    }

    fn manifest_paths(&self, root: &Path) -> Vec<PathBuf> {
        WalkBuilder::new(root)
            .standard_filters(false)
            .filter_entry(|entry| entry.file_name() != ".git")
            .sort_by_file_name(|a, b| a.cmp(b))
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!("walk error under {}: {err}", root.display());
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| self.is_manifest(path))
            .collect()
    }

    fn is_manifest(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.contains(&ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tool_xml(name: &str) -> String {
        format!(
            "<Project Sdk=\"Microsoft.NET.Sdk\"><PropertyGroup>\
             <PackAsTool>true</PackAsTool>\
             <ToolCommandName>{name}</ToolCommandName>\
             <PackageOutputPath>./nupkg</PackageOutputPath>\
             </PropertyGroup></Project>"
        )
    }

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn scanner() -> ManifestScanner {
        ManifestScanner::new(&["csproj".to_string(), ".FSPROJ".to_string()])
    }

    #[test]
    fn empty_tree_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "README.md", "# hi");

        let report = scanner().scan(dir.path());
        assert!(report.candidates.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn finds_nested_tools_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/Zeta/Zeta.csproj", &tool_xml("zeta"));
        write(dir.path(), "src/Alpha/Alpha.fsproj", &tool_xml("alpha"));
        write(dir.path(), "src/Lib/Lib.csproj", "<Project><PropertyGroup /></Project>");

        let report = scanner().scan(dir.path());
        let names: Vec<&str> = report.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["alpha", "zeta"]);
        assert_eq!(report.candidates[0].source_path, dir.path().join("src/Alpha"));

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::NotATool);
        assert_eq!(report.skipped[0].path, dir.path().join("src/Lib/Lib.csproj"));
    }

    #[test]
    fn malformed_and_incomplete_manifests_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/Broken.csproj", "<Project><PropertyGroup>");
        write(
            dir.path(),
            "b/NoName.csproj",
            "<Project><PropertyGroup><PackAsTool>true</PackAsTool>\
             <PackageOutputPath>out</PackageOutputPath></PropertyGroup></Project>",
        );
        write(dir.path(), "c/Good.csproj", &tool_xml("good"));

        let report = scanner().scan(dir.path());
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.candidates[0].name, "good");
        assert!(matches!(report.skipped[0].reason, SkipReason::Malformed(_)));
        assert_eq!(
            report.skipped[1].reason,
            SkipReason::MissingField("ToolCommandName")
        );
    }

    #[test]
    fn git_directory_and_other_extensions_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".git/Hidden.csproj", &tool_xml("hidden"));
        write(dir.path(), "vb/Tool.vbproj", &tool_xml("vb"));
        write(dir.path(), ".config/Dot.csproj", &tool_xml("dot"));

        let report = scanner().scan(dir.path());
        let names: Vec<&str> = report.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["dot"]);
    }

    #[test]
    fn gitignored_manifests_are_still_found() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".gitignore", "tools/\n");
        write(dir.path(), "tools/T/T.csproj", &tool_xml("t"));

        assert_eq!(scanner().scan(dir.path()).candidates.len(), 1);
    }
}
