//! Integration tests for the TCP-backed TIC reader.
//!
//! These tests stand up a mock ser2net bridge on a local socket, stream
//! meter frames through it, and verify that watch subscribers observe the
//! decoded snapshots.

use linky_protocol::{TicMode, checksum};
use linky_reader::{ReaderConfig, TicReader};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

fn historical_record(label: &str, value: &str) -> Vec<u8> {
    let mut record = format!("{label} {value}").into_bytes();
    let ck = checksum::compute(&record);
    record.push(b' ');
    record.push(ck);
    record
}

fn historical_frame(pairs: &[(&str, &str)]) -> Vec<u8> {
    let mut frame = vec![0x02];
    for (label, value) in pairs {
        frame.push(0x0A);
        frame.extend_from_slice(&historical_record(label, value));
        frame.push(0x0D);
    }
    frame.push(0x03);
    frame
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("linky_reader=debug")
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn test_reader_over_tcp_bridge() {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Mock bridge: accept one client, stream two frames, hang up
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream
            .write_all(&historical_frame(&[
                ("ADCO", "031562134895"),
                ("PAPP", "01230"),
            ]))
            .await
            .unwrap();
        stream
            .write_all(&historical_frame(&[("PAPP", "01240")]))
            .await
            .unwrap();
    });

    let (reader, mut updates) = TicReader::connect(addr, ReaderConfig::default())
        .await
        .unwrap();
    let handle = tokio::spawn(reader.run());

    loop {
        let ctx = *updates.borrow_and_update();
        if ctx.nb_frames_parsed >= 2 {
            assert_eq!(ctx.withdrawn_power(), Some(1240));
            assert_eq!(ctx.tic_updates, 2);
            assert_eq!(ctx.lost_tic_bytes, 0);
            assert!(ctx.is_in_sync());
            break;
        }
        updates.changed().await.unwrap();
    }

    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_multiple_subscribers_see_same_snapshots() {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        stream
            .write_all(&historical_frame(&[("PAPP", "00500")]))
            .await
            .unwrap();
    });

    let (reader, mut display_rx) = TicReader::connect(addr, ReaderConfig::default())
        .await
        .unwrap();
    let mut reporting_rx = reader.subscribe();
    let handle = tokio::spawn(reader.run());

    loop {
        let ctx = *display_rx.borrow_and_update();
        if ctx.nb_frames_parsed >= 1 {
            break;
        }
        display_rx.changed().await.unwrap();
    }
    loop {
        let ctx = *reporting_rx.borrow_and_update();
        if ctx.nb_frames_parsed >= 1 {
            assert_eq!(ctx.withdrawn_power(), Some(500));
            break;
        }
        reporting_rx.changed().await.unwrap();
    }

    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_forced_mode_rejects_other_flavour() {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        // Historical frames against a reader locked to standard mode
        stream
            .write_all(&historical_frame(&[("PAPP", "01230")]))
            .await
            .unwrap();
    });

    let config = ReaderConfig {
        mode: Some(TicMode::Standard),
        desync_after: None,
    };
    let (reader, mut updates) = TicReader::connect(addr, config).await.unwrap();
    let handle = tokio::spawn(reader.run());

    loop {
        let ctx = *updates.borrow_and_update();
        if ctx.nb_frames_parsed >= 1 {
            // The record fails standard-mode validation: counted, not applied
            assert_eq!(ctx.withdrawn_power(), None);
            assert!(ctx.lost_tic_bytes > 0);
            break;
        }
        updates.changed().await.unwrap();
    }

    handle.await.unwrap().unwrap();
}
