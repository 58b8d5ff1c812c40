#[path = "common.rs"]
mod common;

use tokio::io::AsyncReadExt;
use tokio::time::timeout;

use common::WAIT;
use stem::config::SinkConfig;
use stem::core::{Hub, Overflow};
use stem::sinks::Console;

#[tokio::test]
async fn console_prints_each_message_on_its_own_line() {
    common::init_logging();
    let hub = Hub::shared();
    let (writer, mut reader) = tokio::io::duplex(1024);
    let mut console = Console::new(hub.clone(), SinkConfig::default(), writer);

    console.start().await.unwrap();
    assert!(console.is_running());
    assert_eq!(hub.len().await, 1);

    for (message, topic) in [("first", "orders"), ("second", "billing")] {
        let report = timeout(WAIT, hub.publish(message, topic)).await.unwrap();
        assert_eq!(report.delivered, 1);
    }
    console.stop().await;

    let mut out = vec![0u8; "first\nsecond\n".len()];
    timeout(WAIT, reader.read_exact(&mut out)).await.unwrap().unwrap();
    assert_eq!(out, b"first\nsecond\n");
}

#[tokio::test]
async fn console_stop_deregisters_and_restart_registers_again() {
    let hub = Hub::shared();
    let (writer, _reader) = tokio::io::duplex(1024);
    let mut console = Console::new(hub.clone(), SinkConfig::default(), writer);

    console.stop().await;
    console.start().await.unwrap();
    console.start().await.unwrap();
    assert_eq!(hub.len().await, 1);

    console.stop().await;
    assert!(!console.is_running());
    assert!(hub.is_empty().await);
    let report = timeout(WAIT, hub.publish("nobody", "t")).await.unwrap();
    assert_eq!(report.matched, 0);

    console.start().await.unwrap();
    assert_eq!(hub.len().await, 1);
    console.stop().await;
}

#[tokio::test]
async fn console_with_queue_uses_its_overflow_policy() {
    let hub = Hub::shared();
    // Tiny duplex buffer: the printer blocks on its second write.
    let (writer, mut reader) = tokio::io::duplex(8);
    let sink = SinkConfig {
        queue_capacity: 1,
        overflow: Overflow::DropNewest,
    };
    let mut console = Console::new(hub.clone(), sink, writer);
    console.start().await.unwrap();

    for i in 0..20 {
        timeout(WAIT, hub.publish(format!("message-{i}"), "t"))
            .await
            .expect("drop policy must never stall publish");
    }

    let mut first = vec![0u8; "message-0\n".len()];
    timeout(WAIT, reader.read_exact(&mut first)).await.unwrap().unwrap();
    assert_eq!(first, b"message-0\n");

    tokio::spawn(async move {
        let mut sink = Vec::new();
        let _ = reader.read_to_end(&mut sink).await;
    });
    timeout(WAIT, console.stop()).await.unwrap();
}
