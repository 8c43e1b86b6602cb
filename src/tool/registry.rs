use crate::model::candidate::ToolCandidate;

/// One row of `dotnet tool list --global`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledTool {
    pub package_id: String,
    pub version: String,
    pub commands: Vec<String>,
}

impl InstalledTool {
    pub fn matches(&self, candidate: &ToolCandidate) -> bool {
        self.package_id.eq_ignore_ascii_case(&candidate.package_id)
            || self.commands.iter().any(|command| command == &candidate.name)
    }
}

/// Parses the table printed by `dotnet tool list`.
///
/// ```text
/// Package Id      Version      Commands
/// -------------------------------------
/// dotnetsay       2.1.4        dotnetsay
/// ```
pub fn parse_tool_list(output: &str) -> Vec<InstalledTool> {
    output
        .lines()
        .skip_while(|line| !line.trim_start().starts_with('-'))
        .skip(1)
        .filter_map(parse_row)
        .collect()
}

fn parse_row(line: &str) -> Option<InstalledTool> {
    let mut columns = line.split_whitespace();
    let package_id = columns.next()?.to_string();
    let version = columns.next()?.to_string();

    let commands = columns
        .collect::<Vec<_>>()
        .join(" ")
        .split(',')
        .map(|command| command.trim().to_string())
        .filter(|command| !command.is_empty())
        .collect();

    Some(InstalledTool {
        package_id,
        version,
        commands,
    })
}
