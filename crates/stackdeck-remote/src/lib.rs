//! Collaborators that leave the process: the container status feeds
//! (demo, ansible, ssh) and the HTTP submission sink.

pub mod ansible;
pub mod feed;
pub mod http;
pub mod parse;
pub mod ssh;

pub use feed::{from_source, AnsibleFeed, DemoFeed, SshFeed, StatusFeed};
pub use http::HttpSink;
pub use parse::parse_compose_ps;
