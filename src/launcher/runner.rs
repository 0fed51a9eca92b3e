use crate::error::{PlotrunError, Result};
use std::io::Write as _;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// What a launch produced, per execution mode.
#[derive(Debug, Clone)]
pub enum LaunchOutcome {
    /// The batch script ran locally; carries the child's exit status.
    Completed { status: i32 },
    /// The batch script was handed to sbatch.
    Submitted { job_id: Option<String> },
    /// The batch script was written to a file instead of being executed.
    ScriptWritten { path: PathBuf },
    /// Nothing was executed.
    DryRun,
}

/// Runs the batch script locally through bash and reports the child's exit
/// status. The status is surfaced verbatim so the caller can propagate it as
/// the launcher's own exit code; nothing is retried or cleaned up.
pub fn run_local(script: &str) -> Result<i32> {
    let mut script_file = tempfile::Builder::new()
        .prefix("plotrun-")
        .suffix(".sh")
        .tempfile()?;
    script_file.write_all(script.as_bytes())?;
    script_file.flush()?;

    let status = Command::new("bash")
        .arg(script_file.path())
        .status()
        .map_err(|e| map_spawn_error(e, "bash"))?;

    match status.code() {
        Some(code) => Ok(code),
        None => Err(PlotrunError::EngineTerminated),
    }
}

/// Pipes the batch script to sbatch and returns the job id parsed from its
/// acknowledgement, if any.
pub fn submit(script: &str) -> Result<Option<String>> {
    let mut child = Command::new("sbatch")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| map_spawn_error(e, "sbatch"))?;

    child
        .stdin
        .take()
        .ok_or_else(|| PlotrunError::SubmitFailed {
            message: "Failed to open sbatch stdin".to_string(),
        })?
        .write_all(script.as_bytes())?;

    let output = child.wait_with_output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(PlotrunError::SubmitFailed {
            message: if stderr.is_empty() {
                format!("sbatch exited with status {:?}", output.status.code())
            } else {
                stderr
            },
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_job_id(&stdout))
}

fn map_spawn_error(error: std::io::Error, program: &str) -> PlotrunError {
    if error.kind() == std::io::ErrorKind::NotFound {
        PlotrunError::CommandNotFound {
            program: program.to_string(),
        }
    } else {
        PlotrunError::Io(error)
    }
}

/// sbatch acknowledges with "Submitted batch job <id>"; the id is the last
/// numeric token on that line.
fn parse_job_id(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find(|line| line.starts_with("Submitted batch job"))
        .and_then(|line| line.split_whitespace().last())
        .filter(|token| token.chars().all(|c| c.is_ascii_digit()))
        .map(|token| token.to_string())
}
