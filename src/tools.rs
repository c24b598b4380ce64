//! External collaborator executables
//!
//! Both tools are run to completion; their output lines are forwarded to the log
//! and any failure to run or non-zero exit is returned to the caller.

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use log::{debug, info};

use crate::error::{Result, ToolError};

fn run_tool<I, S>(tool: &Path, args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(tool);
    command.args(args);
    debug!("Running {command:?}");

    let output = match command.output() {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ToolError::Missing(tool.to_path_buf()).into())
        }
        Err(e) => return Err(e.into()),
    };

    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines() {
        info!("{line}");
    }
    for line in String::from_utf8_lossy(&output.stdout).lines() {
        info!("{line}");
    }

    if output.status.success() {
        return Ok(());
    }
    let name = tool.display().to_string();
    match output.status.code() {
        Some(status) => Err(ToolError::Failed {
            tool: name,
            status,
            stderr: stderr.trim_end().to_string(),
        }
        .into()),
        None => Err(ToolError::Terminated(name).into()),
    }
}

/// Builds the readdb index of `fastq` against the containers in `dir`
///
/// Runs `<tool> index -d <dir> <fastq>` with both paths made absolute.
pub fn call_index_tool(tool: &Path, dir: &Path, fastq: &Path) -> Result<()> {
    let dir = std::path::absolute(dir)?;
    let fastq = std::path::absolute(fastq)?;
    run_tool(
        tool,
        [
            OsStr::new("index"),
            OsStr::new("-d"),
            dir.as_os_str(),
            fastq.as_os_str(),
        ],
    )
}

/// Embeds derived event data for every read of `fastq`
///
/// Runs `<tool> embed -r <fastq>`.
pub fn call_embed_tool(tool: &Path, fastq: &Path) -> Result<()> {
    run_tool(
        tool,
        [OsStr::new("embed"), OsStr::new("-r"), fastq.as_os_str()],
    )
}
