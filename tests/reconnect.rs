//! Full-session scenario: a quiet link tears the session down, discovery
//! runs again, and the rebuilt session starts from a fresh sequence space.

use bebop_link::protocol::{DataType, FrameCursor};
use bebop_link::session::Session;
use bebop_link::Config;
use crossbeam_channel::unbounded;
use std::io::{Read, Write};
use std::net::{TcpListener, UdpSocket};
use std::thread;
use std::time::Duration;

/// Stub discovery endpoint accepting any number of handshakes, reporting
/// each accepted one on a channel.
fn spawn_discovery_stub(c2d_port: u16) -> (u16, crossbeam_channel::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind discovery stub");
    let port = listener.local_addr().unwrap().port();
    let (accepted_tx, accepted_rx) = unbounded();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let reply = format!(
                r#"{{"status":0,"c2d_port":{},"c2d_update_port":51,"c2d_user_port":21,"qos_mode":0,"arstream2_server_stream_port":5004,"arstream2_server_control_port":5005}}"#,
                c2d_port
            );
            let mut padded = reply.into_bytes();
            padded.extend_from_slice(&[0, 0]);
            let _ = stream.write_all(&padded);
            if accepted_tx.send(()).is_err() {
                break;
            }
        }
    });

    (port, accepted_rx)
}

/// Read datagrams until a pong (Data on buffer 0) echoing `payload`
/// appears, skipping greeting traffic; returns its sequence number.
fn await_pong(drone: &UdpSocket, payload: u8) -> u8 {
    let mut buf = [0u8; 2048];
    loop {
        let (n, _) = drone.recv_from(&mut buf).expect("controller went quiet");
        for frame in FrameCursor::new(&buf[..n]).flatten() {
            if frame.data_type == DataType::Data
                && frame.buffer_id == 0
                && frame.payload == [payload]
            {
                return frame.sequence;
            }
        }
    }
}

#[test]
fn test_liveness_loss_triggers_rediscovery_with_fresh_sequences() {
    let drone = UdpSocket::bind("127.0.0.1:0").expect("bind drone");
    drone
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();
    let (discovery_port, accepted_rx) = spawn_discovery_stub(drone.local_addr().unwrap().port());

    // Reserve a D2C port for the controller
    let probe = UdpSocket::bind("127.0.0.1:0").unwrap();
    let d2c_port = probe.local_addr().unwrap().port();
    drop(probe);

    let mut config = Config::default();
    config.drone.address = "127.0.0.1".to_string();
    config.drone.discovery_port = discovery_port;
    config.drone.d2c_port = d2c_port;

    let (_actions_tx, actions_rx) = unbounded();
    let mut session = Session::new(config, actions_rx, None);
    let control = session.control();
    let runner = thread::spawn(move || session.run());

    // First connection comes up
    accepted_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("discovery never ran");
    thread::sleep(Duration::from_millis(500)); // let the workers spawn

    let d2c_addr = format!("127.0.0.1:{}", d2c_port);

    // Two pings: per-buffer sequence numbers advance 0, 1
    drone
        .send_to(&[0x02, 0x00, 0x10, 0x08, 0x00, 0x00, 0x00, 0xA1], &d2c_addr)
        .unwrap();
    assert_eq!(await_pong(&drone, 0xA1), 0);
    drone
        .send_to(&[0x02, 0x00, 0x11, 0x08, 0x00, 0x00, 0x00, 0xA2], &d2c_addr)
        .unwrap();
    assert_eq!(await_pong(&drone, 0xA2), 1);

    // Go silent: the 3 s read deadline plus the 3 s settle must lead to a
    // second discovery round.
    accepted_rx
        .recv_timeout(Duration::from_secs(15))
        .expect("no rediscovery after liveness loss");
    thread::sleep(Duration::from_millis(500));

    // Fresh session, fresh counters: the first pong is seq 0 again
    drone
        .send_to(&[0x02, 0x00, 0x12, 0x08, 0x00, 0x00, 0x00, 0xA3], &d2c_addr)
        .unwrap();
    assert_eq!(await_pong(&drone, 0xA3), 0);

    control.quit();
    runner
        .join()
        .expect("session thread panicked")
        .expect("session returned an error");
}
