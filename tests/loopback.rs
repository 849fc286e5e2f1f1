//! Loopback integration tests: whole transfers over real UDP sockets.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;

use sft::{
    Ack, Config, ContentKind, Error, FileSource, Fragment, MessageSource, Receiver, Sender,
};

const RECV_WAIT: Duration = Duration::from_secs(5);

/// Loopback-friendly settings with an unbound inbound port
fn test_config(max_datagram: usize) -> Config {
    Config {
        recv_addr: "127.0.0.1:0".parse().unwrap(),
        max_datagram,
        ack_timeout: Duration::from_millis(300),
        max_attempts: 5,
        session_silence: Duration::from_secs(2),
        ..Config::default()
    }
}

/// Start a receiver and a sender pipeline wired to it
async fn start_pair(config: Config) -> (Receiver, sft::TransferReceiver, Sender) {
    let (receiver, completed_rx) = Receiver::start(config.clone()).await.unwrap();

    let sender_config = Config {
        send_addr: receiver.local_addr(),
        ..config
    };
    let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
    let sender = Sender::new(sender_config, socket);

    (receiver, completed_rx, sender)
}

#[tokio::test]
async fn shuffled_message_reassembles_exactly() {
    // 8-byte payloads force several fragments out of a short message
    let (receiver, mut completed_rx, sender) = start_pair(test_config(12)).await;

    let message = "one two three, four five";
    let mut source = MessageSource::new(message);
    let report = sender.send(&mut source).await.unwrap();

    // 24 bytes at capacity 8: three full fragments plus the trailing empty one
    assert_eq!(report.fragments, 4);
    assert_eq!(report.bytes, 24);

    let transfer = timeout(RECV_WAIT, completed_rx.recv())
        .await
        .expect("transfer should complete")
        .unwrap();

    assert_eq!(transfer.data.as_ref(), message.as_bytes());
    assert_eq!(transfer.kind, ContentKind::Text);
    assert_eq!(transfer.fragments, 4);

    receiver.stop();
}

#[tokio::test]
async fn png_file_is_sniffed_and_reassembled() {
    let (receiver, mut completed_rx, sender) = start_pair(test_config(20)).await;

    let mut contents = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    contents.extend((0..100u8).cycle().take(200));

    let path = std::env::temp_dir().join("sft_loopback_png_test.dat");
    std::fs::write(&path, &contents).unwrap();

    let mut source = FileSource::open(&path).unwrap();
    sender.send(&mut source).await.unwrap();

    let transfer = timeout(RECV_WAIT, completed_rx.recv())
        .await
        .expect("transfer should complete")
        .unwrap();

    assert_eq!(transfer.data.as_ref(), &contents[..]);
    assert_eq!(transfer.kind, ContentKind::Png);

    std::fs::remove_file(&path).ok();
    receiver.stop();
}

#[tokio::test]
async fn retry_exhaustion_aborts_the_transfer() {
    // a peer that receives but never acknowledges
    let black_hole = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let config = Config {
        send_addr: black_hole.local_addr().unwrap(),
        ack_timeout: Duration::from_millis(50),
        max_attempts: 2,
        ..Config::default()
    };
    let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
    let sender = Sender::new(config, socket);

    let mut source = MessageSource::new("doomed");
    let err = sender.send(&mut source).await.unwrap_err();

    assert!(matches!(
        err,
        Error::RetryExhausted {
            attempts: 2,
            ..
        }
    ));
}

#[tokio::test]
async fn empty_source_is_rejected() {
    let (receiver, _completed_rx, sender) = start_pair(test_config(12)).await;

    let mut source = MessageSource::new("");
    assert!(matches!(
        sender.send(&mut source).await.unwrap_err(),
        Error::EmptySource
    ));

    receiver.stop();
}

#[tokio::test]
async fn stalled_session_is_discarded_and_the_next_transfer_succeeds() {
    let mut config = test_config(12);
    config.session_silence = Duration::from_millis(300);

    let (receiver, mut completed_rx, sender) = start_pair(config).await;

    // half a transfer from a raw socket: fragment 0 of 2, then silence
    let raw = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let half = Fragment::new(0, 1, bytes::Bytes::from_static(b"orphaned"));
    raw.send_to(&half.to_bytes(), receiver.local_addr())
        .await
        .unwrap();

    // the lone fragment is still acknowledged
    let mut buf = [0u8; 32];
    let (len, _) = timeout(RECV_WAIT, raw.recv_from(&mut buf))
        .await
        .expect("ack should arrive")
        .unwrap();
    assert_eq!(Ack::from_bytes(&buf[..len]), Some(Ack::new(0)));

    // wait out the silence bound so the session is abandoned
    tokio::time::sleep(Duration::from_millis(700)).await;

    // an unrelated fresh transfer must complete with no leaked state
    let message = "a clean second transfer";
    let mut source = MessageSource::new(message);
    sender.send(&mut source).await.unwrap();

    let transfer = timeout(RECV_WAIT, completed_rx.recv())
        .await
        .expect("fresh transfer should complete")
        .unwrap();

    assert_eq!(transfer.data.as_ref(), message.as_bytes());
    // nothing else was emitted: the abandoned session produced no output
    assert!(completed_rx.try_recv().is_err());

    receiver.stop();
}

#[tokio::test]
async fn duplicate_fragments_are_each_acknowledged() {
    let (receiver, mut completed_rx, _sender) = start_pair(test_config(12)).await;

    let raw = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let mut buf = [0u8; 32];

    // deliver [1, 0, 0]: out of order, with a duplicate
    let deliveries = [
        Fragment::new(1, 1, bytes::Bytes::from_static(b"y")),
        Fragment::new(0, 1, bytes::Bytes::from_static(b"he")),
        Fragment::new(0, 1, bytes::Bytes::from_static(b"he")),
    ];

    for fragment in &deliveries {
        raw.send_to(&fragment.to_bytes(), receiver.local_addr())
            .await
            .unwrap();

        let (len, _) = timeout(RECV_WAIT, raw.recv_from(&mut buf))
            .await
            .expect("every delivery is acknowledged")
            .unwrap();
        assert_eq!(
            Ack::from_bytes(&buf[..len]),
            Some(Ack::new(fragment.sequence))
        );
    }

    let transfer = timeout(RECV_WAIT, completed_rx.recv())
        .await
        .expect("transfer should complete")
        .unwrap();
    assert_eq!(transfer.data.as_ref(), b"hey");
    assert_eq!(transfer.fragments, 2);

    receiver.stop();
}
