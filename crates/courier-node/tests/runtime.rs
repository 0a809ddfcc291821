//! Runtime behavior against an in-process fake bundle agent.

use courier_node::{Client, Config, Executor, Node};
use courier_proto::{deserialize, serialize, BundleData, BundleType, FetchReply, Message, Reply};
use courier_types::{Eid, NodeType};
use futures::{SinkExt, StreamExt};
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

fn fast_config(socket: PathBuf) -> Config {
    Config {
        socket,
        announce_interval: Duration::from_millis(20),
        poll_interval: Duration::from_millis(20),
        tick_interval: Duration::from_millis(20),
    }
}

/// Accepts one node connection and plays the agent: acks registration
/// and creations, hands out `inbox` on the first fetch and nothing on
/// later ones.
async fn fake_agent(
    listener: UnixListener,
    inbox: Vec<BundleData>,
    created: mpsc::UnboundedSender<BundleData>,
) {
    let (stream, _) = listener.accept().await.unwrap();
    let mut channel = Framed::new(stream, LengthDelimitedCodec::new());
    let mut inbox = Some(inbox);
    while let Some(frame) = channel.next().await {
        let frame = frame.unwrap();
        let reply = match deserialize(&frame).unwrap() {
            Message::Register(_) => Message::Reply(Reply::new(true, "").unwrap()),
            Message::Fetch(_) => {
                let bundles = inbox.take().unwrap_or_default();
                Message::FetchReply(FetchReply::new(true, "", bundles).unwrap())
            }
            Message::Create(create) => {
                created.send(create.bundle().clone()).unwrap();
                Message::Reply(Reply::new(true, "").unwrap())
            }
            other => panic!("unexpected message from node: {other:?}"),
        };
        let bytes = serialize(&reply).unwrap();
        channel.send(bytes.into()).await.unwrap();
    }
}

async fn next_created(created: &mut mpsc::UnboundedReceiver<BundleData>) -> BundleData {
    tokio::time::timeout(Duration::from_secs(5), created.recv())
        .await
        .expect("node went quiet")
        .expect("agent channel closed")
}

#[tokio::test]
async fn executor_announces_and_requests_registration() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("agent.sock");
    let listener = UnixListener::bind(&socket).unwrap();

    let worker = Eid::dtn("worker", "");
    let broker = Eid::dtn("relay", "");
    let announce = BundleData::build(BundleType::BrokerAnnounce, broker.clone(), Eid::broadcast())
        .node_type(NodeType::Broker)
        .finish()
        .unwrap();

    let (created_tx, mut created_rx) = mpsc::unbounded_channel();
    tokio::spawn(fake_agent(listener, vec![announce], created_tx));

    let node = Node::connect(worker.clone(), Executor, fast_config(socket))
        .await
        .unwrap();
    tokio::spawn(async move { node.run().await });

    let mut seen_announce = false;
    let mut seen_request = false;
    while !(seen_announce && seen_request) {
        let bundle = next_created(&mut created_rx).await;
        match bundle.kind() {
            BundleType::BrokerAnnounce => {
                assert_eq!(bundle.source(), &worker);
                assert_eq!(bundle.destination(), &Eid::broadcast());
                assert_eq!(bundle.node_type(), Some(NodeType::Executor));
                seen_announce = true;
            }
            BundleType::BrokerRequest => {
                assert_eq!(bundle.source(), &worker);
                assert_eq!(bundle.destination(), &broker);
                assert_eq!(bundle.node_type(), Some(NodeType::Executor));
                seen_request = true;
            }
            other => panic!("unexpected bundle from node: {other:?}"),
        }
    }
}

#[tokio::test]
async fn registered_client_queries_the_job_board() {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("agent.sock");
    let listener = UnixListener::bind(&socket).unwrap();

    let client = Eid::dtn("client", "");
    let broker = Eid::dtn("relay", "");
    let ack = BundleData::build(BundleType::BrokerAck, broker.clone(), client.clone())
        .node_type(NodeType::Broker)
        .finish()
        .unwrap();

    let (created_tx, mut created_rx) = mpsc::unbounded_channel();
    tokio::spawn(fake_agent(listener, vec![ack], created_tx));

    let node = Node::connect(client.clone(), Client::new(client.clone()), fast_config(socket))
        .await
        .unwrap();
    tokio::spawn(async move { node.run().await });

    // The ack registers the client; its tick then emits one job query.
    loop {
        let bundle = next_created(&mut created_rx).await;
        match bundle.kind() {
            BundleType::BrokerAnnounce => continue,
            BundleType::JobQuery => {
                assert_eq!(bundle.source(), &client);
                assert_eq!(bundle.destination(), &broker);
                assert_eq!(bundle.submitter(), Some(&client));
                break;
            }
            other => panic!("unexpected bundle from node: {other:?}"),
        }
    }
}
