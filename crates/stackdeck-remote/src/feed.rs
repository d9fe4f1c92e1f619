use crate::{ansible, parse, ssh};
use async_trait::async_trait;
use stackdeck_core::config::{FeedSource, COMPOSE_PS_COMMAND};
use stackdeck_core::container::{demo_containers, ContainerInfo};
use stackdeck_core::AppError;
use std::path::PathBuf;
use std::sync::Arc;

/// A source of container status rows, polled by the dashboard.
#[async_trait]
pub trait StatusFeed: Send + Sync {
    async fn containers(&self) -> Result<Vec<ContainerInfo>, AppError>;

    /// Short label shown next to the table.
    fn mode(&self) -> &'static str;
}

pub struct DemoFeed;

#[async_trait]
impl StatusFeed for DemoFeed {
    async fn containers(&self) -> Result<Vec<ContainerInfo>, AppError> {
        tracing::debug!("serving demo containers");
        Ok(demo_containers())
    }

    fn mode(&self) -> &'static str {
        "DEMO"
    }
}

pub struct AnsibleFeed {
    command: String,
}

impl AnsibleFeed {
    pub fn new(host: &str, command_override: Option<String>) -> Self {
        let command =
            command_override.unwrap_or_else(|| ansible::ad_hoc_command(host, COMPOSE_PS_COMMAND));
        Self { command }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl StatusFeed for AnsibleFeed {
    async fn containers(&self) -> Result<Vec<ContainerInfo>, AppError> {
        let stdout = ansible::run_shell(&self.command).await.inspect_err(|e| {
            tracing::warn!(command = %self.command, error = %e, "container status command failed");
        })?;
        Ok(parse::parse_compose_ps(&stdout))
    }

    fn mode(&self) -> &'static str {
        "LIVE"
    }
}

pub struct SshFeed {
    host: String,
    user: String,
    key_path: PathBuf,
}

impl SshFeed {
    pub fn new(host: String, user: String, key_path: PathBuf) -> Self {
        Self {
            host,
            user,
            key_path,
        }
    }
}

#[async_trait]
impl StatusFeed for SshFeed {
    async fn containers(&self) -> Result<Vec<ContainerInfo>, AppError> {
        let stdout = ssh::exec_async(&self.host, &self.user, &self.key_path, COMPOSE_PS_COMMAND)
            .await
            .inspect_err(|e| {
                tracing::warn!(host = %self.host, error = %e, "container status over ssh failed");
            })?;
        Ok(parse::parse_compose_ps(&stdout))
    }

    fn mode(&self) -> &'static str {
        "LIVE"
    }
}

pub fn from_source(source: FeedSource) -> Arc<dyn StatusFeed> {
    match source {
        FeedSource::Demo => Arc::new(DemoFeed),
        FeedSource::Ansible {
            host,
            command_override,
        } => Arc::new(AnsibleFeed::new(&host, command_override)),
        FeedSource::Ssh {
            host,
            user,
            key_path,
        } => Arc::new(SshFeed::new(host, user, key_path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_feed_serves_the_fixed_rows() {
        let feed = from_source(FeedSource::Demo);
        let rows = feed.containers().await.expect("demo");
        assert_eq!(rows.len(), 5);
        assert_eq!(feed.mode(), "DEMO");
    }

    #[test]
    fn ansible_feed_defaults_to_compose_ps() {
        let feed = AnsibleFeed::new("web01", None);
        assert_eq!(feed.command(), "ansible web01 -m shell -a \"docker-compose ps\"");
        let feed = AnsibleFeed::new("web01", Some("cat /tmp/ps.txt".into()));
        assert_eq!(feed.command(), "cat /tmp/ps.txt");
    }

    #[tokio::test]
    async fn override_command_output_is_parsed() {
        let feed = AnsibleFeed::new(
            "ignored",
            Some("printf 'Name   Command   State   Ports\\n-----\\napi   ./run   Up   8080/tcp\\n'".into()),
        );
        let rows = feed.containers().await.expect("rows");
        assert_eq!(rows, [ContainerInfo::new("api", "./run", "Up", "Unknown", "8080/tcp")]);
    }

    #[tokio::test]
    async fn failing_command_is_a_remote_error() {
        let feed = AnsibleFeed::new("ignored", Some("exit 2".into()));
        assert!(matches!(feed.containers().await, Err(AppError::Remote(_))));
    }
}
