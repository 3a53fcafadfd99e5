//! UDP transport workers.
//!
//! Two loops share the command plane: the reader owns the inbound socket
//! bound to the pre-declared D2C port, the writer owns the connected
//! outbound socket dialed to the discovered C2D port.
//!
//! The reader doubles as the liveness watchdog: the drone pings about once
//! a second, so once traffic has been seen, a 3-second silence means the
//! link is gone and the supervisor is told to reconnect. The writer never
//! tears the session down; send failures on a connectionless socket are
//! routine while the drone reboots.

use crate::error::Error;
use crate::session::SessionEvent;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Largest datagram the drone is expected to send
pub const MAX_DATAGRAM: usize = 16384;

/// Inbound silence tolerated once the link has carried traffic
pub const READ_DEADLINE: Duration = Duration::from_secs(3);

const WRITE_POLL: Duration = Duration::from_millis(250);

/// Reader loop: one fresh buffer per datagram, handed to the dispatcher.
///
/// The read deadline is armed only after the first successful read; until
/// then a timeout just means the drone has not started talking yet.
pub fn reader_loop(
    socket: UdpSocket,
    packets_tx: Sender<Vec<u8>>,
    events_tx: Sender<SessionEvent>,
    shutdown: Arc<AtomicBool>,
) {
    if let Err(e) = socket.set_read_timeout(Some(READ_DEADLINE)) {
        log::error!("failed to set read deadline: {}", e);
        return;
    }

    let mut live = false;
    while !shutdown.load(Ordering::Relaxed) {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        match socket.recv_from(&mut buf) {
            Ok((n, _from)) => {
                live = true;
                buf.truncate(n);
                if packets_tx.send(buf).is_err() {
                    break;
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                if live {
                    log::warn!("{}", Error::LivenessLost);
                    events_tx.send(SessionEvent::LivenessLost).ok();
                    break;
                }
            }
            Err(e) => {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                log::error!("{}", Error::Read(e));
            }
        }
    }

    log::info!("UDP reader exiting");
}

/// Writer loop: one datagram per queued payload
pub fn writer_loop(socket: UdpSocket, outbound_rx: Receiver<Vec<u8>>, shutdown: Arc<AtomicBool>) {
    while !shutdown.load(Ordering::Relaxed) {
        match outbound_rx.recv_timeout(WRITE_POLL) {
            Ok(datagram) => match socket.send(&datagram) {
                Ok(n) => log::trace!("sent {} bytes", n),
                Err(e) => log::error!("{}", Error::Write(e)),
            },
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    log::info!("UDP writer exiting");
}
