//! Key-file SSH execution against the docker host.

use ssh2::{Channel, Session};
use stackdeck_core::AppError;
use std::io::Read;
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

const SSH_PORT: u16 = 22;
const IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Turn an operator-supplied host into a socket address. Accepts a name
/// or IP, with or without `:port`; IPv6 literals may be bare or
/// bracketed. The port defaults to 22.
pub fn resolve_target(host: &str) -> Result<SocketAddr, AppError> {
    let host = host.trim();
    if let Ok(addr) = host.parse::<SocketAddr>() {
        return Ok(addr);
    }
    let unbracketed = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(host);
    if let Ok(ip) = unbracketed.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, SSH_PORT));
    }

    let (name, port) = match host.rsplit_once(':') {
        Some((name, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| AppError::Ssh(format!("Invalid port in {host}")))?;
            (name, port)
        }
        None => (host, SSH_PORT),
    };
    (name, port)
        .to_socket_addrs()
        .map_err(|e| AppError::Ssh(format!("Cannot resolve {host}: {e}")))?
        .next()
        .ok_or_else(|| AppError::Ssh(format!("No address found for {host}")))
}

fn open_session(addr: SocketAddr, user: &str, private_key_path: &Path) -> Result<Session, AppError> {
    let tcp = TcpStream::connect_timeout(&addr, IO_TIMEOUT)
        .map_err(|e| AppError::Ssh(format!("TCP connect to {addr}: {e}")))?;
    tcp.set_read_timeout(Some(IO_TIMEOUT))?;
    tcp.set_write_timeout(Some(IO_TIMEOUT))?;

    let mut session = Session::new().map_err(|e| AppError::Ssh(format!("Session::new: {e}")))?;
    session.set_timeout(IO_TIMEOUT.as_millis() as u32);
    session.set_tcp_stream(tcp);
    session
        .handshake()
        .map_err(|e| AppError::Ssh(format!("SSH handshake with {addr}: {e}")))?;
    session
        .userauth_pubkey_file(user, None, private_key_path, None)
        .map_err(|e| AppError::Ssh(format!("SSH auth to {user}@{addr}: {e}")))?;
    Ok(session)
}

/// Stdout on a zero exit; stderr in the error otherwise.
fn collect(mut channel: Channel) -> Result<String, AppError> {
    let ssh_err = |what: &str, e: ssh2::Error| AppError::Ssh(format!("{what}: {e}"));

    let mut stdout = String::new();
    channel.read_to_string(&mut stdout)?;
    let mut stderr = String::new();
    channel.stderr().read_to_string(&mut stderr)?;
    channel.wait_close().map_err(|e| ssh_err("Wait close", e))?;

    match channel.exit_status().map_err(|e| ssh_err("Exit status", e))? {
        0 => Ok(stdout),
        code => Err(AppError::Remote(format!(
            "Command exited with status {code}: {}",
            stderr.trim()
        ))),
    }
}

/// Execute a command on the remote host and return stdout.
pub fn exec(host: &str, user: &str, private_key_path: &Path, command: &str) -> Result<String, AppError> {
    let addr = resolve_target(host)?;
    let session = open_session(addr, user, private_key_path)?;
    let mut channel = session
        .channel_session()
        .map_err(|e| AppError::Ssh(format!("Open channel: {e}")))?;
    channel
        .exec(command)
        .map_err(|e| AppError::Ssh(format!("Exec command: {e}")))?;
    tracing::debug!(%addr, command, "ssh command started");
    collect(channel)
}

/// [`exec`] on the blocking pool.
pub async fn exec_async(
    host: &str,
    user: &str,
    private_key_path: &Path,
    command: &str,
) -> Result<String, AppError> {
    let (host, user, command) = (host.to_owned(), user.to_owned(), command.to_owned());
    let key = private_key_path.to_path_buf();
    tokio::task::spawn_blocking(move || exec(&host, &user, &key, &command))
        .await
        .map_err(|e| AppError::Ssh(format!("spawn_blocking join: {e}")))?
}
