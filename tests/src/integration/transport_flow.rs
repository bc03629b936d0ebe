//! # Transport Flow
//!
//! Peers exchanging frames over the in-memory network and over real libp2p
//! connections on loopback.

#[cfg(test)]
mod tests {
    use shared_types::RunContext;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use uv_01_transport::{
        Libp2pTransport, MessageHandler, MockNetwork, MockTransport, Transport, TransportConfig,
        TransportError,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    type Inbox = mpsc::UnboundedReceiver<(String, Vec<u8>)>;

    fn inbox(transport: &dyn Transport) -> Inbox {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler: MessageHandler = Arc::new(move |from, payload| {
            let _ = tx.send((from, payload));
        });
        transport.register_handler(handler).unwrap();
        rx
    }

    async fn next(rx: &mut Inbox) -> (String, Vec<u8>) {
        timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("no frame within 10s")
            .expect("handler dropped")
    }

    /// Handler that reports each arrival, then blocks its thread for `hold`.
    fn slow_inbox(transport: &dyn Transport, hold: Duration) -> Inbox {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler: MessageHandler = Arc::new(move |from, payload| {
            let _ = tx.send((from, payload));
            std::thread::sleep(hold);
        });
        transport.register_handler(handler).unwrap();
        rx
    }

    /// Collect `count` frames, failing if they take longer than `within`.
    async fn drain(rx: &mut Inbox, count: usize, within: Duration) -> Vec<Vec<u8>> {
        let mut frames = Vec::with_capacity(count);
        timeout(within, async {
            while frames.len() < count {
                frames.push(rx.recv().await.expect("handler dropped").1);
            }
        })
        .await
        .expect("frames stalled behind blocked handlers");
        frames.sort();
        frames
    }

    async fn libp2p_pair() -> (Libp2pTransport, Libp2pTransport) {
        let a = Libp2pTransport::new(TransportConfig::for_testing())
            .await
            .unwrap();
        let b = Libp2pTransport::new(TransportConfig::for_testing())
            .await
            .unwrap();
        (a, b)
    }

    // =============================================================================
    // MOCK TRANSPORT
    // =============================================================================

    #[tokio::test]
    async fn test_mock_peers_exchange_messages() {
        let a = MockTransport::new("validator-a");
        let b = MockTransport::new("validator-b");
        MockTransport::link(&a, &b);
        let mut a_inbox = inbox(&a);
        let mut b_inbox = inbox(&b);
        let ctx = RunContext::background();

        a.send(&ctx, "validator-b", b"round-1").await.unwrap();
        assert_eq!(
            next(&mut b_inbox).await,
            ("validator-a".to_string(), b"round-1".to_vec())
        );

        b.send(&ctx, "validator-a", b"ack").await.unwrap();
        assert_eq!(next(&mut a_inbox).await.1, b"ack".to_vec());
    }

    #[tokio::test]
    async fn test_mock_network_three_peers() {
        let network = MockNetwork::new();
        let peers: Vec<MockTransport> = ["a", "b", "c"]
            .iter()
            .map(|id| network.transport(*id))
            .collect();
        let mut inboxes: Vec<Inbox> = peers.iter().map(|p| inbox(p)).collect();
        let ctx = RunContext::background();

        for sender in &peers {
            for receiver in &peers {
                if sender.id() == receiver.id() {
                    continue;
                }
                sender
                    .ensure_peer(&receiver.id(), &receiver.listen_addrs())
                    .unwrap();
                sender
                    .send(&ctx, &receiver.id(), sender.id().as_bytes())
                    .await
                    .unwrap();
            }
        }

        for (i, rx) in inboxes.iter_mut().enumerate() {
            let mut senders = vec![next(rx).await.0, next(rx).await.0];
            senders.sort();
            let expected: Vec<String> = ["a", "b", "c"]
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, id)| id.to_string())
                .collect();
            assert_eq!(senders, expected);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_mock_blocking_handler_does_not_stall_sends() {
        let a = MockTransport::new("validator-a");
        let b = MockTransport::new("validator-b");
        MockTransport::link(&a, &b);
        let mut b_inbox = slow_inbox(&b, Duration::from_secs(3));
        let ctx = RunContext::background();

        for i in 0..4u8 {
            a.send(&ctx, "validator-b", &[i]).await.unwrap();
        }
        let frames = drain(&mut b_inbox, 4, Duration::from_secs(2)).await;
        assert_eq!(frames, vec![vec![0], vec![1], vec![2], vec![3]]);
    }

    // =============================================================================
    // LIBP2P TRANSPORT
    // =============================================================================

    #[tokio::test]
    async fn test_libp2p_loopback_exchange() {
        let (a, b) = libp2p_pair().await;
        let mut b_inbox = inbox(&b);
        let mut a_inbox = inbox(&a);
        let ctx = RunContext::background();

        a.ensure_peer(&b.id(), &b.listen_addrs()).unwrap();
        a.send(&ctx, &b.id(), b"hello over libp2p").await.unwrap();
        let (from, payload) = next(&mut b_inbox).await;
        assert_eq!(from, a.id());
        assert_eq!(payload, b"hello over libp2p".to_vec());

        // Second frame reuses the connection, reply goes the other way.
        a.send(&ctx, &b.id(), &[]).await.unwrap();
        assert!(next(&mut b_inbox).await.1.is_empty());

        b.ensure_peer(&a.id(), &a.listen_addrs()).unwrap();
        b.send(&ctx, &a.id(), b"reply").await.unwrap();
        assert_eq!(next(&mut a_inbox).await, (b.id(), b"reply".to_vec()));

        a.close().await.unwrap();
        b.close().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_libp2p_blocking_handler_does_not_stall_listener() {
        let (a, b) = libp2p_pair().await;
        let mut b_inbox = slow_inbox(&b, Duration::from_secs(3));
        let ctx = RunContext::background();
        a.ensure_peer(&b.id(), &b.listen_addrs()).unwrap();

        // More frames than runtime workers; each handler holds its thread
        // longer than the whole exchange is allowed to take.
        for i in 0..4u8 {
            timeout(Duration::from_secs(2), a.send(&ctx, &b.id(), &[i]))
                .await
                .expect("send stalled behind blocked handlers")
                .unwrap();
        }
        let frames = drain(&mut b_inbox, 4, Duration::from_secs(2)).await;
        assert_eq!(frames, vec![vec![0], vec![1], vec![2], vec![3]]);

        a.close().await.unwrap();
        b.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_libp2p_large_frame() {
        let (a, b) = libp2p_pair().await;
        let mut b_inbox = inbox(&b);
        let payload: Vec<u8> = (0..(2 * 1024 * 1024)).map(|i| (i % 251) as u8).collect();

        a.ensure_peer(&b.id(), &b.listen_addrs()).unwrap();
        a.send(&RunContext::background(), &b.id(), &payload)
            .await
            .unwrap();
        assert_eq!(next(&mut b_inbox).await.1, payload);

        a.close().await.unwrap();
        b.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_libp2p_send_to_closed_peer_fails() {
        let (a, b) = libp2p_pair().await;
        let target = b.id();
        a.ensure_peer(&target, &b.listen_addrs()).unwrap();
        b.close().await.unwrap();

        let err = a
            .send(&RunContext::background(), &target, b"anyone?")
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                TransportError::Dial { .. }
                    | TransportError::DialTimeout(_)
                    | TransportError::Stream { .. }
                    | TransportError::Io(_)
                    | TransportError::Interrupted(_)
            ),
            "unexpected error: {err}"
        );
        a.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_libp2p_address_for_wrong_peer_rejected() {
        let (a, b) = libp2p_pair().await;
        let err = a.ensure_peer(&a.id(), &b.listen_addrs()).unwrap_err();
        assert!(matches!(err, TransportError::PeerMismatch { .. }));
        a.close().await.unwrap();
        b.close().await.unwrap();
    }
}
