//! Command implementations.

use std::io::BufRead;

use anyhow::Context;

pub mod info;
pub mod init;
pub mod matching;
pub mod scan;
#[cfg(feature = "mcp")]
pub mod serve;

/// Collect resource paths from arguments, or from `input` when no paths were
/// given or the only argument is `-`.
///
/// Blank lines are skipped and surrounding whitespace is trimmed. Paths given
/// as arguments are taken verbatim.
pub fn collect_paths<R: BufRead>(args: &[String], input: R) -> anyhow::Result<Vec<String>> {
    let from_input = args.is_empty() || (args.len() == 1 && args[0] == "-");
    if !from_input {
        return Ok(args.to_vec());
    }

    let mut paths = Vec::new();
    for line in input.lines() {
        let line = line.context("failed to read paths from stdin")?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            paths.push(trimmed.to_string());
        }
    }
    Ok(paths)
}
