//! Child process spawning shared by stage and extractor adapters

use loanflow_domain::RawStageOutput;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Run `program` to completion, capturing both streams.
///
/// With `kill_on_drop` the child is killed if the returned future is dropped,
/// which is how a runner deadline reaches the process.
pub async fn run_to_completion(
    program: &str,
    args: &[String],
    working_dir: Option<&Path>,
    kill_on_drop: bool,
) -> std::io::Result<RawStageOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(kill_on_drop);
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    // Linux: request kernel to send SIGTERM to child when parent dies.
    // This catches cases where Drop doesn't run (SIGKILL, OOM kill).
    #[cfg(target_os = "linux")]
    unsafe {
        cmd.pre_exec(|| {
            libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
            Ok(())
        });
    }

    let output = cmd.spawn()?.wait_with_output().await?;
    Ok(RawStageOutput::new(
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    ))
}
