//! Local-trust transport
//!
//! The harness authenticates nobody. Instead, like gRPC's local TCP
//! credentials, it only talks to peers on the same machine: any accepted
//! connection whose peer address is not loopback is closed before a byte of
//! RPC traffic is read.
//!
//! Accepting runs in its own task and hands admitted connections to tonic
//! through a channel. Accept errors fall into four groups:
//!
//! - connection-scoped (reset, aborted, interrupted): skipped
//! - resource exhaustion (out of descriptors or memory): back off and retry
//!   for as long as it lasts
//! - broken listener (bad descriptor, not a socket): the listener is
//!   reported unusable at once
//! - anything else: backed off and counted; a run of them ends the stream

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

/// Stream of admitted connections, in the shape tonic's `serve_with_incoming` takes
pub type Incoming = ReceiverStream<Result<TcpStream, io::Error>>;

/// Unclassified accept failures tolerated in a row before giving up
const MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// Pause after an accept failure that is not connection-scoped
const FAILURE_BACKOFF: Duration = Duration::from_millis(100);

/// Admitted connections not yet picked up by the server
const BACKLOG: usize = 64;

/// Source of inbound connections
pub(crate) trait Acceptor: Send + 'static {
    /// Accepted connection
    type Conn: Send + 'static;

    /// Wait for the next connection
    fn accept(&mut self) -> impl Future<Output = io::Result<(Self::Conn, SocketAddr)>> + Send;

    /// Per-connection setup applied to admitted connections
    fn configure(&self, _conn: &Self::Conn, _peer: &SocketAddr) {}
}

impl Acceptor for TcpListener {
    type Conn = TcpStream;

    fn accept(&mut self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send {
        TcpListener::accept(self)
    }

    fn configure(&self, conn: &TcpStream, peer: &SocketAddr) {
        if let Err(e) = conn.set_nodelay(true) {
            debug!(%peer, error = %e, "could not set TCP_NODELAY");
        }
    }
}

/// How an accept error affects the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AcceptFailure {
    /// Only the connection being accepted failed
    Connection,
    /// The process is out of descriptors, buffers or memory
    Exhausted,
    /// The listening socket itself is unusable
    Broken,
    /// Not recognised
    Other,
}

impl AcceptFailure {
    /// Classify an accept error
    pub(crate) fn of(e: &io::Error) -> Self {
        #[cfg(unix)]
        {
            use nix::errno::Errno;
            if let Some(code) = e.raw_os_error() {
                match Errno::from_raw(code) {
                    Errno::EMFILE | Errno::ENFILE | Errno::ENOBUFS | Errno::ENOMEM => {
                        return Self::Exhausted;
                    }
                    Errno::EBADF | Errno::EINVAL | Errno::ENOTSOCK => return Self::Broken,
                    Errno::EPROTO | Errno::EPERM => return Self::Connection,
                    _ => {}
                }
            }
        }

        match e.kind() {
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut => Self::Connection,
            io::ErrorKind::OutOfMemory => Self::Exhausted,
            io::ErrorKind::InvalidInput => Self::Broken,
            _ => Self::Other,
        }
    }
}

/// Whether a peer counts as local
///
/// IPv4-mapped IPv6 addresses are unwrapped first, so a dual-stack listener
/// on `::` sees `::ffff:127.0.0.1` as loopback.
pub fn is_local_peer(peer: &SocketAddr) -> bool {
    peer.ip().to_canonical().is_loopback()
}

/// Start accepting on `listener`
///
/// Returns the stream of admitted connections and the accept task. The task
/// resolves to `Some(error)` if the listener became unusable, or `None` once
/// the receiving side is dropped.
pub fn accept_local(listener: TcpListener) -> (Incoming, JoinHandle<Option<io::Error>>) {
    spawn_accept(listener)
}

fn spawn_accept<A: Acceptor>(
    acceptor: A,
) -> (
    ReceiverStream<Result<A::Conn, io::Error>>,
    JoinHandle<Option<io::Error>>,
) {
    let (tx, rx) = mpsc::channel(BACKLOG);
    let task = tokio::spawn(accept_loop(acceptor, tx));
    (ReceiverStream::new(rx), task)
}

async fn accept_loop<A: Acceptor>(
    mut acceptor: A,
    tx: mpsc::Sender<Result<A::Conn, io::Error>>,
) -> Option<io::Error> {
    let mut failures = 0u32;
    let mut exhausted = false;

    loop {
        let (conn, peer) = match acceptor.accept().await {
            Ok(accepted) => {
                if exhausted {
                    info!("accepting again after resource exhaustion");
                }
                failures = 0;
                exhausted = false;
                accepted
            }
            Err(e) => match AcceptFailure::of(&e) {
                AcceptFailure::Connection => {
                    debug!(error = %e, "connection failed during accept");
                    continue;
                }
                AcceptFailure::Exhausted => {
                    if !exhausted {
                        warn!(error = %e, "out of resources, pausing accepts");
                        exhausted = true;
                    }
                    tokio::time::sleep(FAILURE_BACKOFF).await;
                    continue;
                }
                AcceptFailure::Broken => {
                    error!(error = %e, "listener is unusable");
                    return Some(e);
                }
                AcceptFailure::Other => {
                    failures += 1;
                    if failures >= MAX_CONSECUTIVE_FAILURES {
                        error!(error = %e, failures, "listener keeps failing");
                        return Some(e);
                    }
                    warn!(error = %e, failures, "accept failed, backing off");
                    tokio::time::sleep(FAILURE_BACKOFF).await;
                    continue;
                }
            },
        };

        if !is_local_peer(&peer) {
            warn!(%peer, "refusing non-local peer");
            drop(conn);
            continue;
        }

        acceptor.configure(&conn, &peer);
        debug!(%peer, "accepted connection");

        if tx.send(Ok(conn)).await.is_err() {
            // Server side is gone; stop accepting.
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tokio_stream::StreamExt;

    /// Replays a fixed sequence of accept outcomes, then waits forever
    struct Scripted {
        script: VecDeque<io::Result<(u32, SocketAddr)>>,
    }

    impl Scripted {
        fn new(script: impl IntoIterator<Item = io::Result<(u32, SocketAddr)>>) -> Self {
            Self {
                script: script.into_iter().collect(),
            }
        }
    }

    impl Acceptor for Scripted {
        type Conn = u32;

        fn accept(&mut self) -> impl Future<Output = io::Result<(u32, SocketAddr)>> + Send {
            let next = self.script.pop_front();
            async move {
                match next {
                    Some(outcome) => outcome,
                    None => std::future::pending().await,
                }
            }
        }
    }

    fn local() -> SocketAddr {
        "127.0.0.1:5000".parse().unwrap()
    }

    fn remote() -> SocketAddr {
        "10.0.0.1:5000".parse().unwrap()
    }

    fn errors(n: usize, make: fn() -> io::Error) -> Vec<io::Result<(u32, SocketAddr)>> {
        (0..n).map(|_| Err(make())).collect()
    }

    #[test]
    fn test_is_local_peer() {
        let local: [SocketAddr; 4] = [
            "127.0.0.1:1".parse().unwrap(),
            "127.10.0.3:1".parse().unwrap(),
            "[::1]:1".parse().unwrap(),
            "[::ffff:127.0.0.1]:1".parse().unwrap(),
        ];
        for peer in local {
            assert!(is_local_peer(&peer), "{peer} should be local");
        }

        let remote: [SocketAddr; 3] = [
            "10.0.0.1:1".parse().unwrap(),
            "[2001:db8::1]:1".parse().unwrap(),
            "[::ffff:192.168.1.1]:1".parse().unwrap(),
        ];
        for peer in remote {
            assert!(!is_local_peer(&peer), "{peer} should be refused");
        }
    }

    #[test]
    fn test_classify_by_kind() {
        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert_eq!(AcceptFailure::of(&reset), AcceptFailure::Connection);

        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(AcceptFailure::of(&denied), AcceptFailure::Other);
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_by_errno() {
        use nix::errno::Errno;

        for errno in [Errno::EMFILE, Errno::ENFILE, Errno::ENOBUFS, Errno::ENOMEM] {
            let e = io::Error::from_raw_os_error(errno as i32);
            assert_eq!(AcceptFailure::of(&e), AcceptFailure::Exhausted, "{errno:?}");
        }
        for errno in [Errno::EBADF, Errno::EINVAL, Errno::ENOTSOCK] {
            let e = io::Error::from_raw_os_error(errno as i32);
            assert_eq!(AcceptFailure::of(&e), AcceptFailure::Broken, "{errno:?}");
        }
        let aborted = io::Error::from_raw_os_error(Errno::ECONNABORTED as i32);
        assert_eq!(AcceptFailure::of(&aborted), AcceptFailure::Connection);
    }

    #[cfg(unix)]
    #[tokio::test(start_paused = true)]
    async fn test_descriptor_exhaustion_is_survived() {
        let emfile = || io::Error::from_raw_os_error(nix::errno::Errno::EMFILE as i32);
        let mut script = errors(MAX_CONSECUTIVE_FAILURES as usize * 5, emfile);
        script.push(Ok((7, local())));

        let (mut incoming, task) = spawn_accept(Scripted::new(script));

        assert_eq!(incoming.next().await.unwrap().unwrap(), 7);
        assert!(!task.is_finished());
        task.abort();
    }

    #[cfg(unix)]
    #[tokio::test(start_paused = true)]
    async fn test_broken_listener_ends_stream() {
        let ebadf = || io::Error::from_raw_os_error(nix::errno::Errno::EBADF as i32);
        let (mut incoming, task) = spawn_accept(Scripted::new(errors(1, ebadf)));

        let err = task.await.unwrap().expect("listener error reported");
        assert_eq!(AcceptFailure::of(&err), AcceptFailure::Broken);
        assert!(incoming.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_unknown_failures_end_stream() {
        let denied = || io::Error::from(io::ErrorKind::PermissionDenied);
        let mut script = errors(MAX_CONSECUTIVE_FAILURES as usize - 1, denied);
        script.push(Ok((1, local())));
        script.extend(errors(MAX_CONSECUTIVE_FAILURES as usize, denied));

        let (mut incoming, task) = spawn_accept(Scripted::new(script));

        // The success in the middle resets the count.
        assert_eq!(incoming.next().await.unwrap().unwrap(), 1);
        let err = task.await.unwrap().expect("listener error reported");
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_connection_errors_are_skipped() {
        let reset = || io::Error::from(io::ErrorKind::ConnectionReset);
        let mut script = errors(50, reset);
        script.push(Ok((3, local())));

        let (mut incoming, task) = spawn_accept(Scripted::new(script));
        assert_eq!(incoming.next().await.unwrap().unwrap(), 3);
        task.abort();
    }

    #[tokio::test]
    async fn test_non_local_peer_dropped() {
        let script = vec![Ok((1, remote())), Ok((2, local()))];
        let (mut incoming, task) = spawn_accept(Scripted::new(script));

        assert_eq!(incoming.next().await.unwrap().unwrap(), 2);
        task.abort();
    }

    #[tokio::test]
    async fn test_loopback_connection_admitted() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (mut incoming, task) = accept_local(listener);

        let _client = TcpStream::connect(addr).await.unwrap();
        let admitted = incoming.next().await.unwrap().unwrap();
        assert_eq!(admitted.local_addr().unwrap(), addr);

        drop(incoming);
        task.abort();
    }
}
