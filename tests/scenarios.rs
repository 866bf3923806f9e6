// ABOUTME: End-to-end scenario tests (§8) driving the Directory actor through its public
// ABOUTME: event channel and send queues, without a real socket round-trip

use chatrelay::server::directory::{Directory, DirectoryEvent};
use chatrelay::server::send_queue::SendQueue;
use chatrelay::{ConnId, Frame, Opcode};
use tokio::sync::mpsc;

struct Client {
    id: ConnId,
    outbox: std::sync::Arc<SendQueue>,
    events: mpsc::UnboundedSender<DirectoryEvent>,
}

impl Client {
    async fn request(&self, opcode: Opcode, fields: Vec<&str>) -> Frame {
        let frame = Frame::new(opcode, fields.into_iter().map(String::from).collect());
        self.events
            .send(DirectoryEvent::Request { id: self.id, frame })
            .unwrap();
        self.outbox.pop().await
    }

    fn disconnect(&self) {
        self.events
            .send(DirectoryEvent::Disconnected { id: self.id })
            .unwrap();
    }
}

struct Harness {
    events: mpsc::UnboundedSender<DirectoryEvent>,
}

impl Harness {
    fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        tokio::spawn(Directory::new().run(events_rx));
        Harness { events: events_tx }
    }

    fn connect(&self) -> Client {
        let id = ConnId::next();
        let outbox = SendQueue::new(1024);
        self.events
            .send(DirectoryEvent::Connected {
                id,
                outbox: outbox.clone(),
            })
            .unwrap();
        Client {
            id,
            outbox,
            events: self.events.clone(),
        }
    }
}

#[tokio::test]
async fn scenario_rename_collision() {
    let h = Harness::new();
    let a = h.connect();
    let b = h.connect();

    assert_eq!(
        a.request(Opcode::SetName, vec!["alice"]).await,
        Frame::success("Name changed to alice.\n")
    );
    assert_eq!(
        b.request(Opcode::SetName, vec!["alice"]).await,
        Frame::error("Name alice is in use.\n")
    );

    // B's username is unaffected by the rejected rename: a direct message to
    // its still-default name round-trips normally.
    let default_name = b.id.to_string();
    assert_eq!(
        a.request(Opcode::MessageUser, vec![&default_name, "poke"])
            .await,
        Frame::success("Message sent.\n")
    );
}

#[tokio::test]
async fn scenario_direct_message() {
    let h = Harness::new();
    let a = h.connect();
    let b = h.connect();
    a.request(Opcode::SetName, vec!["alice"]).await;

    assert_eq!(
        a.request(Opcode::MessageUser, vec!["alice", "hi"]).await,
        Frame::error("Cannot message yourself.\n")
    );

    assert_eq!(
        b.request(Opcode::MessageUser, vec!["alice", "hi"]).await,
        Frame::success("Message sent.\n")
    );

    let inbox = a.outbox.pop().await;
    assert_eq!(inbox.opcode, Opcode::Inbox as u32);
    assert_eq!(inbox.fields[0], format!("{}: hi\n", b.id));
}

#[tokio::test]
async fn scenario_channel_fanout() {
    let h = Harness::new();
    let a = h.connect();
    let b = h.connect();
    a.request(Opcode::SetName, vec!["alice"]).await;
    a.request(Opcode::CreateChannel, vec!["room"]).await;
    b.request(Opcode::JoinChannels, vec!["room"]).await;

    let reply = a.request(Opcode::MessageChannels, vec!["room", "yo"]).await;
    assert_eq!(reply, Frame::success("Channels Messaged.\n"));

    let inbox = b.outbox.pop().await;
    assert_eq!(inbox, Frame::inbox("room|alice: yo\n"));

    // A sent the message and must not receive its own copy: A's outbox
    // holds only the SUCCESS reply already consumed above, so a further pop
    // has nothing to return and times out rather than yielding an echo.
    let nothing_pending = tokio::time::timeout(std::time::Duration::from_millis(50), a.outbox.pop()).await;
    assert!(nothing_pending.is_err(), "A should not have received its own channel message");
}

#[tokio::test]
async fn scenario_leave_reclaims_empty_channel() {
    let h = Harness::new();
    let a = h.connect();
    a.request(Opcode::CreateChannel, vec!["room"]).await;
    a.request(Opcode::LeaveChannels, vec!["room"]).await;

    let reply = a.request(Opcode::ListChannels, vec![]).await;
    assert_eq!(reply, Frame::error("No channels exist.\n"));
}

#[tokio::test]
async fn scenario_disconnect_cleanup() {
    let h = Harness::new();
    let a = h.connect();
    let b = h.connect();
    a.request(Opcode::CreateChannel, vec!["room"]).await;
    a.disconnect();

    // Give the directory a turn to process the disconnect before the next
    // request triggers its pre-sweep.
    tokio::task::yield_now().await;

    let reply = b.request(Opcode::ListChannelUsers, vec!["room"]).await;
    match Opcode::try_from(reply.opcode) {
        Ok(Opcode::Success) => assert!(!reply.fields[0].contains(&a.id.to_string())),
        Ok(Opcode::Error) => assert_eq!(reply.fields[0], "room does not exist.\n"),
        other => panic!("unexpected opcode {other:?}"),
    }
}

#[tokio::test]
async fn scenario_oversized_request_is_rejected_client_side() {
    let big_text = "x".repeat(2000);
    let frame = Frame::new(
        Opcode::MessageUser,
        vec!["alice".to_string(), big_text],
    );
    let err = frame.encode().unwrap_err();
    assert!(matches!(
        err,
        chatrelay::CodecError::FrameTooLarge { .. }
    ));
}

#[tokio::test]
async fn scenario_unknown_opcode_gets_a_reply_and_the_connection_stays_up() {
    let h = Harness::new();
    let a = h.connect();

    let frame = Frame {
        opcode: 999,
        fields: vec![],
    };
    a.events
        .send(DirectoryEvent::Request { id: a.id, frame })
        .unwrap();
    assert_eq!(a.outbox.pop().await, Frame::error("Unknown request.\n"));

    // The connection is still live: a normal request right after still works.
    assert_eq!(
        a.request(Opcode::SetName, vec!["alice"]).await,
        Frame::success("Name changed to alice.\n")
    );
}
