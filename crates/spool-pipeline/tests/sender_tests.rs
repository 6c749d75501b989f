//! TCP syslog 전송기 통합 테스트 -- 실제 로컬 리스너로 와이어 포맷과 에러 분류를 검증합니다.

use std::time::Duration;

use alert_spooler_core::error::DeliveryError;
use alert_spooler_pipeline::{SyslogSender, TcpSyslogSender};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

async fn receive_one(listener: TcpListener) -> String {
    let (mut socket, _) = listener.accept().await.unwrap();
    let mut buf = String::new();
    socket.read_to_string(&mut buf).await.unwrap();
    buf
}

#[tokio::test]
async fn sends_one_rfc5424_line_per_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let server = tokio::spawn(receive_one(listener));

    let sender = TcpSyslogSender::new(addr.clone());
    assert_eq!(sender.addr(), addr);
    sender
        .send(
            "alert-spooler",
            r#"[cndp job="mhdbs"]"#,
            r#"{"source":"/a.warn"}"#,
            Duration::from_secs(3),
        )
        .await
        .unwrap();

    let line = server.await.unwrap();
    assert!(line.starts_with("<134>1 "), "{line}");
    assert!(line.ends_with("\n"));
    assert_eq!(line.matches('\n').count(), 1);
    assert!(line.contains(r#" alert-spooler - - [cndp job="mhdbs"] {"source":"/a.warn"}"#));

    let fields: Vec<&str> = line.splitn(7, ' ').collect();
    assert!(fields[1].ends_with('Z'), "timestamp must be UTC: {}", fields[1]);
}

#[tokio::test]
async fn zero_timeout_sends_without_limit() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let server = tokio::spawn(receive_one(listener));

    TcpSyslogSender::new(addr)
        .send("app", "[cndp]", "m", Duration::ZERO)
        .await
        .unwrap();
    assert!(server.await.unwrap().ends_with("[cndp] m\n"));
}

#[tokio::test]
async fn refused_connection_is_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let err = TcpSyslogSender::new(addr.clone())
        .send("app", "[cndp]", "m", Duration::from_secs(1))
        .await
        .unwrap_err();
    match err {
        DeliveryError::Connect { addr: failed, .. } => assert_eq!(failed, addr),
        other => panic!("expected connect error, got {other:?}"),
    }
}

#[tokio::test]
async fn each_send_opens_a_new_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let server = tokio::spawn(async move {
        let mut lines = Vec::new();
        for _ in 0..2 {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = String::new();
            socket.read_to_string(&mut buf).await.unwrap();
            lines.push(buf);
        }
        lines
    });

    let sender = TcpSyslogSender::new(addr);
    for msg in ["first", "second"] {
        sender
            .send("app", "[cndp]", msg, Duration::from_secs(3))
            .await
            .unwrap();
    }

    let lines = server.await.unwrap();
    assert!(lines[0].ends_with("first\n"));
    assert!(lines[1].ends_with("second\n"));
}
