use serde::{Deserialize, Serialize};

/// One row of the container status dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub name: String,
    pub command: String,
    pub state: String,
    pub status: String,
    pub ports: String,
}

impl ContainerInfo {
    pub fn new(name: &str, command: &str, state: &str, status: &str, ports: &str) -> Self {
        Self {
            name: name.to_string(),
            command: command.to_string(),
            state: state.to_string(),
            status: status.to_string(),
            ports: ports.to_string(),
        }
    }

    pub fn is_up(&self) -> bool {
        self.state.to_ascii_lowercase().contains("up")
    }
}

/// Fixed data served in demo mode.
pub fn demo_containers() -> Vec<ContainerInfo> {
    vec![
        ContainerInfo::new("zeus_frontend", "npm start", "Up", "Up 2 hours", "0.0.0.0:3000->3000/tcp"),
        ContainerInfo::new("zeus_backend", "python app.py", "Up", "Up 2 hours", "0.0.0.0:5000->5000/tcp"),
        ContainerInfo::new("zeus_db", "postgres", "Up", "Up 2 hours", "5432/tcp"),
        ContainerInfo::new("zeus_redis", "redis-server", "Up", "Up 2 hours", "6379/tcp"),
        ContainerInfo::new("zeus_worker", "celery -A app worker", "Exit", "Exited (0) 5 minutes ago", ""),
    ]
}
