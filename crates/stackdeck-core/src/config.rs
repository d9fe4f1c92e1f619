use crate::error::AppError;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ANSIBLE_HOST: &str = "local";
pub const DEFAULT_SSH_USER: &str = "root";
pub const COMPOSE_PS_COMMAND: &str = "docker-compose ps";
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const SETTINGS_FILE: &str = "monitor.conf";
pub const STACK_FILE: &str = "stack.json";

/// Resolve the app data directory: ~/.core/
pub fn app_dir() -> Result<PathBuf, AppError> {
    let home = dirs::home_dir().ok_or(AppError::HomeDirNotFound)?;
    Ok(home.join(".core"))
}

/// ~/.core/monitor.conf
pub fn settings_path() -> Result<PathBuf, AppError> {
    Ok(app_dir()?.join(SETTINGS_FILE))
}

/// ~/.core/stack.json
pub fn stack_path() -> Result<PathBuf, AppError> {
    Ok(app_dir()?.join(STACK_FILE))
}

/// Ensure the app directory exists
pub fn ensure_dirs() -> Result<(), AppError> {
    std::fs::create_dir_all(app_dir()?)?;
    Ok(())
}

/// Where the container status feed comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    /// Fixed demo data, no remote access.
    Demo,
    /// `ansible <host> -m shell -a "docker-compose ps"`, or an override command.
    Ansible {
        host: String,
        command_override: Option<String>,
    },
    /// `docker-compose ps` executed directly over SSH.
    Ssh {
        host: String,
        user: String,
        key_path: PathBuf,
    },
}

impl FeedSource {
    /// Pick a source from the environment-backed flags.
    ///
    /// Demo mode wins when enabled. An SSH host needs a key; without an SSH
    /// host the ansible CLI is used.
    pub fn resolve(
        demo_mode: bool,
        ansible_host: &str,
        ansible_cmd: Option<&str>,
        ssh_host: Option<&str>,
        ssh_user: &str,
        ssh_key: Option<PathBuf>,
    ) -> Result<Self, AppError> {
        if demo_mode {
            return Ok(FeedSource::Demo);
        }
        if let Some(host) = ssh_host.filter(|h| !h.trim().is_empty()) {
            let key_path = ssh_key.ok_or_else(|| AppError::MissingParam("STATUS_SSH_KEY".into()))?;
            return Ok(FeedSource::Ssh {
                host: host.trim().to_string(),
                user: ssh_user.to_string(),
                key_path,
            });
        }
        Ok(FeedSource::Ansible {
            host: ansible_host.to_string(),
            command_override: ansible_cmd
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        })
    }
}

/// Parse the `DEMO_MODE` style boolean flags ("true", "1", "yes").
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_mode_takes_precedence() {
        let source = FeedSource::resolve(true, "web01", None, Some("10.0.0.1"), "root", None)
            .expect("demo source");
        assert_eq!(source, FeedSource::Demo);
    }

    #[test]
    fn ssh_host_without_key_is_rejected() {
        let err = FeedSource::resolve(false, "local", None, Some("10.0.0.1"), "root", None)
            .expect_err("missing key");
        assert!(matches!(err, AppError::MissingParam(p) if p == "STATUS_SSH_KEY"));
    }

    #[test]
    fn blank_override_falls_back_to_default_command() {
        let source = FeedSource::resolve(false, "web01", Some("   "), None, "root", None)
            .expect("ansible source");
        assert_eq!(
            source,
            FeedSource::Ansible {
                host: "web01".into(),
                command_override: None
            }
        );
    }

    #[test]
    fn flag_parsing_accepts_common_truthy_values() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}
