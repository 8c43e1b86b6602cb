use std::io::{BufRead, Write};

use crate::error::DotnetGetError;
use crate::model::candidate::ToolCandidate;

/// Prints the numbered list of tools and reads the user's choice.
pub fn select<'a, R, W>(
    candidates: &'a [ToolCandidate],
    input: &mut R,
    out: &mut W,
) -> Result<&'a ToolCandidate, DotnetGetError>
where
    R: BufRead,
    W: Write,
{
    if candidates.is_empty() {
        return Err(DotnetGetError::InvalidSelection(
            "no tools to choose from".to_string(),
        ));
    }

    render(candidates, out)?;

    let mut line = String::new();
    let read = input.read_line(&mut line)?;
    writeln!(out)?;

    if read == 0 {
        return Err(DotnetGetError::InvalidSelection("no input".to_string()));
    }

    resolve(candidates, &line)
}

fn render<W: Write>(candidates: &[ToolCandidate], out: &mut W) -> std::io::Result<()> {
    let noun = if candidates.len() == 1 { "tool" } else { "tools" };
    writeln!(out, "Discovered {} {noun}:", candidates.len())?;

    for (i, candidate) in candidates.iter().enumerate() {
        writeln!(out, "\t{} [{}]", candidate.name, i + 1)?;
    }

    write!(out, "Tool to install: ")?;
    out.flush()
}

/// Maps a 1-based answer onto the candidate list.
pub fn resolve<'a>(
    candidates: &'a [ToolCandidate],
    answer: &str,
) -> Result<&'a ToolCandidate, DotnetGetError> {
    let answer = answer.trim();
    let index: usize = answer
        .parse()
        .map_err(|_| DotnetGetError::InvalidSelection(format!("{answer:?} is not a number")))?;

    if index == 0 || index > candidates.len() {
        return Err(DotnetGetError::InvalidSelection(format!(
            "{index} is not between 1 and {}",
            candidates.len()
        )));
    }

    Ok(&candidates[index - 1])
}
