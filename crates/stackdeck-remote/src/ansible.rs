use stackdeck_core::AppError;
use std::time::Duration;
use tokio::process::Command;

const ANSIBLE_TIMEOUT: Duration = Duration::from_secs(60);

/// `ansible <host> -m shell -a "<command>"`.
pub fn ad_hoc_command(host: &str, command: &str) -> String {
    format!("ansible {host} -m shell -a \"{command}\"")
}

/// Run a shell line through `bash -c` and return stdout. A non-zero exit
/// is an error carrying stderr.
pub async fn run_shell(line: &str) -> Result<String, AppError> {
    tracing::debug!(command = line, "running status command");
    let output = tokio::time::timeout(
        ANSIBLE_TIMEOUT,
        Command::new("bash").arg("-c").arg(line).output(),
    )
    .await
    .map_err(|_| AppError::Timeout(format!("'{line}' to finish")))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let details = if stderr.is_empty() {
            format!("exited with {}", output.status)
        } else {
            stderr
        };
        return Err(AppError::Remote(details));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_ad_hoc_line() {
        assert_eq!(
            ad_hoc_command("local", "docker-compose ps"),
            "ansible local -m shell -a \"docker-compose ps\""
        );
    }

    #[tokio::test]
    async fn captures_stdout() {
        let out = run_shell("printf 'hello'").await.expect("run");
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn failure_carries_stderr() {
        let err = run_shell("echo nope >&2; exit 3").await.expect_err("must fail");
        assert!(matches!(err, AppError::Remote(ref d) if d == "nope"));
    }
}
