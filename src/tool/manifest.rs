use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::candidate::ToolCandidate;

/// Why a project file did not produce a [`ToolCandidate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("malformed manifest: {0}")]
    Malformed(String),
    #[error("not packaged as a tool")]
    NotATool,
    #[error("PackAsTool is not a boolean: {0:?}")]
    InvalidFlag(String),
    #[error("missing {0}")]
    MissingField(&'static str),
}

/// The properties of an MSBuild project that matter for tool packaging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectManifest {
    pub pack_as_tool: Option<String>,
    pub tool_command_name: Option<String>,
    pub package_output_path: Option<String>,
    pub package_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectXml {
    #[serde(rename = "PropertyGroup", default)]
    property_groups: Vec<PropertyGroupXml>,
}

/// A property may repeat within one group, usually with differing `Condition`s.
#[derive(Debug, Default, Deserialize)]
struct PropertyGroupXml {
    #[serde(rename = "PackAsTool", default)]
    pack_as_tool: Vec<String>,
    #[serde(rename = "ToolCommandName", default)]
    tool_command_name: Vec<String>,
    #[serde(rename = "PackageOutputPath", default)]
    package_output_path: Vec<String>,
    #[serde(rename = "PackageId", default)]
    package_id: Vec<String>,
}

impl ProjectManifest {
    pub fn parse(raw: &str) -> Result<Self, SkipReason> {
        let raw = raw.trim_start_matches('\u{feff}');
        let project: ProjectXml =
            quick_xml::de::from_str(raw).map_err(|err| SkipReason::Malformed(err.to_string()))?;

        let mut manifest = Self::default();
        for group in project.property_groups {
            fill(&mut manifest.pack_as_tool, group.pack_as_tool);
            fill(&mut manifest.tool_command_name, group.tool_command_name);
            fill(&mut manifest.package_output_path, group.package_output_path);
            fill(&mut manifest.package_id, group.package_id);
        }

        Ok(manifest)
    }

    pub fn read(path: &Path) -> Result<Self, SkipReason> {
        let raw = fs::read_to_string(path).map_err(|err| SkipReason::Malformed(err.to_string()))?;
        Self::parse(&raw)
    }

    /// `PackAsTool` with MSBuild boolean semantics; absent means false.
    pub fn is_tool(&self) -> Result<bool, SkipReason> {
        match self.pack_as_tool.as_deref() {
            None => Ok(false),
            Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
            Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
            Some(value) => Err(SkipReason::InvalidFlag(value.to_string())),
        }
    }

    pub fn into_candidate(self, manifest_path: &Path) -> Result<ToolCandidate, SkipReason> {
        if !self.is_tool()? {
            return Err(SkipReason::NotATool);
        }

        let name = self
            .tool_command_name
            .ok_or(SkipReason::MissingField("ToolCommandName"))?;
        let package_output_dir = self
            .package_output_path
            .ok_or(SkipReason::MissingField("PackageOutputPath"))?;

        let package_id = self.package_id.unwrap_or_else(|| {
            manifest_path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| name.clone())
        });

        let source_path = manifest_path
            .parent()
            .map_or_else(PathBuf::new, Path::to_path_buf);

        Ok(ToolCandidate {
            name,
            source_path,
            package_output_dir,
            package_id,
            manifest_path: manifest_path.to_path_buf(),
        })
    }
}

/// Keeps the first non-empty value in document order.
fn fill(slot: &mut Option<String>, values: Vec<String>) {
    if slot.is_some() {
        return;
    }

    *slot = values
        .into_iter()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty());
}
