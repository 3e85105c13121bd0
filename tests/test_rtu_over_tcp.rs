mod common;
use common::*;

use smartgen_bridge::modbus::frame;
use smartgen_bridge::transport::RtuOverTcpTransport;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn converter() -> (TcpListener, Device) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut device = Factory::ats();
    device.port = listener.local_addr().unwrap().port();
    device.timeout = Duration::from_millis(300);
    (listener, device)
}

fn transport(device: &Device) -> RtuOverTcpTransport {
    RtuOverTcpTransport::new(device, &Factory::config().poller())
}

async fn request(socket: &mut TcpStream) -> [u8; 8] {
    let mut buf = [0u8; 8];
    socket.read_exact(&mut buf).await.unwrap();
    buf
}

#[tokio::test]
async fn stale_and_fragmented_replies() {
    common_setup();

    let (listener, device) = converter().await;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        // leftover answer from an earlier transaction
        socket
            .write_all(&frame::build_read_response(1, &[99, 99]))
            .await
            .unwrap();

        let req = request(&mut socket).await;
        assert_eq!(&req[..], &frame::build_read_request(1, 0, 3)[..]);

        let reply = frame::build_read_response(1, &[1, 2, 3]);
        socket.write_all(&[0x01, 0x03]).await.unwrap();
        socket.write_all(&reply[..4]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        socket.write_all(&reply[4..]).await.unwrap();

        // echo a register write, one byte at a time
        let req = request(&mut socket).await;
        for byte in req {
            socket.write_all(&[byte]).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let mut rest = Vec::new();
        let _ = socket.read_to_end(&mut rest).await;
    });

    let mut transport = transport(&device);
    assert!(!transport.is_connected());
    transport.connect().await.unwrap();
    assert!(transport.is_connected());

    assert_eq!(transport.read_registers(0, 3).await.unwrap(), vec![1, 2, 3]);
    transport.write_register(4352, 700).await.unwrap();

    transport.disconnect().await;
    assert!(!transport.is_connected());
    server.await.unwrap();
}

#[tokio::test]
async fn exception_reply() {
    common_setup();

    let (listener, device) = converter().await;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        request(&mut socket).await;
        socket
            .write_all(&frame::build_exception_response(1, 0x03, 0x02))
            .await
            .unwrap();
        let mut rest = Vec::new();
        let _ = socket.read_to_end(&mut rest).await;
    });

    let mut transport = transport(&device);
    transport.connect().await.unwrap();
    assert_eq!(
        transport.read_registers(9000, 2).await,
        Err(Error::Exception {
            function: 0x03,
            code: 0x02
        })
    );

    transport.disconnect().await;
    server.await.unwrap();
}

#[tokio::test]
async fn silent_converter_times_out() {
    common_setup();

    let (listener, device) = converter().await;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        request(&mut socket).await;
        let mut rest = Vec::new();
        let _ = socket.read_to_end(&mut rest).await;
    });

    let mut transport = transport(&device);
    transport.connect().await.unwrap();
    let err = transport.read_registers(0, 1).await.unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
    assert!(err.is_connectivity());

    transport.disconnect().await;
    server.await.unwrap();
}

#[tokio::test]
async fn closed_by_peer() {
    common_setup();

    let (listener, device) = converter().await;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        request(&mut socket).await;
        drop(socket);
    });

    let mut transport = transport(&device);
    transport.connect().await.unwrap();
    let err = transport.read_registers(0, 1).await.unwrap_err();
    assert!(matches!(err, Error::Connectivity(_)));
    assert!(err.aborts_cycle());

    server.await.unwrap();
}

#[tokio::test]
async fn refused_connection() {
    common_setup();

    let (listener, device) = converter().await;
    drop(listener);

    let mut transport = transport(&device);
    let err = transport.connect().await.unwrap_err();
    assert!(err.is_connectivity());
    assert!(!transport.is_connected());
}
