// ABOUTME: Single-task owner of the users/channels/memberships directory
// ABOUTME: Consumes connection lifecycle and request events, emits replies and inbox pushes

use crate::codec::{Frame, Opcode};
use crate::domain::{ConnId, Name};
use crate::server::send_queue::SendQueue;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Per-connection outbound queue plus a sequence counter so the writer task
/// can be told when to stop.
struct Connected {
    username: Name,
    outbox: Arc<SendQueue>,
}

struct Channel {
    /// Insertion order is member-join order; spec requires deterministic
    /// enumeration over the underlying map's insertion order.
    members: Vec<ConnId>,
}

impl Channel {
    fn new() -> Self {
        Channel { members: Vec::new() }
    }

    fn contains(&self, id: ConnId) -> bool {
        self.members.contains(&id)
    }
}

/// Events crossing from the I/O side into the directory task. Folding
/// connection lifecycle (`Connected`/`Disconnected`) into the same stream as
/// `Request` frames removes the need for a lock over a shared send-queue
/// table: ordering between "this connection closed" and "a request from it"
/// is free because both travel the same channel.
pub enum DirectoryEvent {
    Connected {
        id: ConnId,
        outbox: Arc<SendQueue>,
    },
    Disconnected {
        id: ConnId,
    },
    Request {
        id: ConnId,
        frame: Frame,
    },
}

pub struct Directory {
    usernames: HashMap<ConnId, Connected>,
    connids: HashMap<Name, ConnId>,
    user_order: Vec<ConnId>,
    channels: HashMap<Name, Channel>,
    channel_order: Vec<Name>,
    user_channels: HashMap<ConnId, Vec<Name>>,
}

impl Directory {
    pub fn new() -> Self {
        Directory {
            usernames: HashMap::new(),
            connids: HashMap::new(),
            user_order: Vec::new(),
            channels: HashMap::new(),
            channel_order: Vec::new(),
            user_channels: HashMap::new(),
        }
    }

    /// Runs the directory to completion, consuming events until the channel
    /// closes (all I/O tasks have shut down).
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<DirectoryEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                DirectoryEvent::Connected { id, outbox } => self.connect(id, outbox),
                DirectoryEvent::Disconnected { id } => self.disconnect(id),
                DirectoryEvent::Request { id, frame } => self.process_request(id, frame).await,
            }
        }
    }

    fn connect(&mut self, id: ConnId, outbox: Arc<SendQueue>) {
        let username = Name::default_for(id);
        self.connids.insert(username.clone(), id);
        self.usernames.insert(id, Connected { username, outbox });
        self.user_order.push(id);
        self.user_channels.insert(id, Vec::new());
        tracing::debug!(conn_id = %id, "user registered");
    }

    fn disconnect(&mut self, id: ConnId) {
        if let Some(Connected { username, .. }) = self.usernames.remove(&id) {
            self.connids.remove(&username);
        }
        self.user_order.retain(|&c| c != id);
        if let Some(joined) = self.user_channels.remove(&id) {
            for name in joined {
                if let Some(channel) = self.channels.get_mut(&name) {
                    channel.members.retain(|&m| m != id);
                }
            }
        }
        self.reclaim_empty_channels();
        tracing::debug!(conn_id = %id, "user disconnected");
    }

    fn reclaim_empty_channels(&mut self) {
        let empty: Vec<Name> = self
            .channels
            .iter()
            .filter(|(_, c)| c.members.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        for name in empty {
            self.channels.remove(&name);
            self.channel_order.retain(|n| n != &name);
        }
    }

    async fn process_request(&mut self, id: ConnId, frame: Frame) {
        // A request from a connection we no longer track (raced with its own
        // disconnect event) is dropped silently, matching the
        // sender-no-longer-connected pre-processing step.
        if !self.usernames.contains_key(&id) {
            return;
        }

        let reply = self.dispatch(id, frame).await;
        if let Some(reply) = reply {
            self.send_to(id, reply).await;
        }
    }

    async fn dispatch(&mut self, id: ConnId, frame: Frame) -> Option<Frame> {
        use Opcode::*;
        // The codec hands back the raw wire opcode unvalidated (§4.1); a
        // value outside the closed set falls into the same "Unknown
        // request" reply as a known-but-server-only opcode below, rather
        // than the connection being torn down over it.
        match Opcode::try_from(frame.opcode) {
            Ok(SetName) => Some(self.set_name(id, frame.fields)),
            Ok(MessageUser) => Some(self.message_user(id, frame.fields).await),
            Ok(MessageMyChannels) => Some(self.message_my_channels(id, frame.fields).await),
            Ok(MessageChannels) => Some(self.message_channels(id, frame.fields).await),
            Ok(JoinChannels) => Some(self.join_channels(id, frame.fields)),
            Ok(LeaveChannels) => Some(self.leave_channels(id, frame.fields)),
            Ok(CreateChannel) => Some(self.create_channel(id, frame.fields)),
            Ok(DeleteChannel) => Some(self.delete_channel(id, frame.fields)),
            Ok(ListChannels) => Some(self.list_channels()),
            Ok(ListMyChannels) => Some(self.list_my_channels(id)),
            Ok(ListChannelUsers) => Some(self.list_channel_users(frame.fields)),
            Ok(ListUsers) => Some(self.list_users()),
            Ok(Error) | Ok(Success) | Ok(Inbox) => {
                tracing::warn!(conn_id = %id, "client sent a server-only opcode");
                Some(Frame::error("Unknown request.\n"))
            }
            Err(_) => {
                tracing::warn!(conn_id = %id, opcode = frame.opcode, "client sent an unknown opcode");
                Some(Frame::error("Unknown request.\n"))
            }
        }
    }

    async fn send_to(&self, id: ConnId, frame: Frame) {
        if let Some(conn) = self.usernames.get(&id) {
            conn.outbox.push(frame).await;
        }
    }

    fn username_of(&self, id: ConnId) -> Name {
        self.usernames
            .get(&id)
            .map(|c| c.username.clone())
            .expect("connection must be registered before dispatch")
    }

    fn set_name(&mut self, id: ConnId, mut fields: Vec<String>) -> Frame {
        let raw = take_field(&mut fields, 0);
        let name = match raw.parse::<Name>() {
            Ok(name) => name,
            Err(_) => return Frame::error(format!("Name {raw} is invalid.\n")),
        };
        if self.connids.contains_key(&name) {
            return Frame::error(format!("Name {name} is in use.\n"));
        }
        let old = self.usernames.get_mut(&id).expect("registered");
        self.connids.remove(&old.username);
        self.connids.insert(name.clone(), id);
        old.username = name.clone();
        Frame::success(format!("Name changed to {name}.\n"))
    }

    async fn message_user(&mut self, id: ConnId, mut fields: Vec<String>) -> Frame {
        let raw = take_field(&mut fields, 0);
        let text = take_field(&mut fields, 1);
        let name = match raw.parse::<Name>() {
            Ok(name) => name,
            Err(_) => return Frame::error(format!("Name {raw} is invalid.\n")),
        };
        let Some(&target) = self.connids.get(&name) else {
            return Frame::error(format!("User {name} does not exist.\n"));
        };
        if target == id {
            return Frame::error("Cannot message yourself.\n");
        }
        let sender = self.username_of(id);
        self.send_to(target, Frame::inbox(format!("{sender}: {text}\n")))
            .await;
        Frame::success("Message sent.\n")
    }

    async fn message_my_channels(&mut self, id: ConnId, mut fields: Vec<String>) -> Frame {
        let text = take_field(&mut fields, 0);
        let joined = self.user_channels.get(&id).cloned().unwrap_or_default();
        if joined.is_empty() {
            return Frame::error("You aren't in any channels.\n");
        }
        let sender = self.username_of(id);
        for channel_name in &joined {
            let members = self
                .channels
                .get(channel_name)
                .map(|c| c.members.clone())
                .unwrap_or_default();
            for member in members {
                if member != id {
                    self.send_to(
                        member,
                        Frame::inbox(format!("{channel_name}|{sender}: {text}\n")),
                    )
                    .await;
                }
            }
        }
        Frame::success("Channels messaged.\n")
    }

    async fn message_channels(&mut self, id: ConnId, mut fields: Vec<String>) -> Frame {
        let text = fields.pop().unwrap_or_default();
        let sender = self.username_of(id);
        let mut errors = String::new();
        for raw in fields {
            let name = match raw.parse::<Name>() {
                Ok(name) => name,
                Err(_) => {
                    errors.push_str(&format!("Name {raw} is invalid.\n"));
                    continue;
                }
            };
            let Some(channel) = self.channels.get(&name) else {
                errors.push_str(&format!("{name} does not exist.\n"));
                continue;
            };
            for member in channel.members.clone() {
                if member != id {
                    self.send_to(member, Frame::inbox(format!("{name}|{sender}: {text}\n")))
                        .await;
                }
            }
        }
        if errors.is_empty() {
            Frame::success("Channels Messaged.\n")
        } else {
            Frame::error(errors)
        }
    }

    fn join_channels(&mut self, id: ConnId, fields: Vec<String>) -> Frame {
        let mut errors = String::new();
        for raw in fields {
            let name = match raw.parse::<Name>() {
                Ok(name) => name,
                Err(_) => {
                    errors.push_str(&format!("Name {raw} is invalid.\n"));
                    continue;
                }
            };
            let Some(channel) = self.channels.get_mut(&name) else {
                errors.push_str(&format!("{name} does not exist.\n"));
                continue;
            };
            if channel.contains(id) {
                errors.push_str(&format!("You are already listening to {name}.\n"));
                continue;
            }
            channel.members.push(id);
            self.user_channels.entry(id).or_default().push(name);
        }
        if errors.is_empty() {
            Frame::success("Joined Channel(s).\n")
        } else {
            Frame::error(errors)
        }
    }

    fn leave_channels(&mut self, id: ConnId, fields: Vec<String>) -> Frame {
        let mut errors = String::new();
        for raw in fields {
            let name = match raw.parse::<Name>() {
                Ok(name) => name,
                Err(_) => {
                    errors.push_str(&format!("Name {raw} is invalid.\n"));
                    continue;
                }
            };
            let is_member = self
                .channels
                .get(&name)
                .map(|c| c.contains(id))
                .unwrap_or(false);
            if !is_member {
                errors.push_str(&format!("You are not listening to {name}.\n"));
                continue;
            }
            if let Some(channel) = self.channels.get_mut(&name) {
                channel.members.retain(|&m| m != id);
            }
            if let Some(joined) = self.user_channels.get_mut(&id) {
                joined.retain(|n| n != &name);
            }
        }
        self.reclaim_empty_channels();
        if errors.is_empty() {
            Frame::success("Left Channel(s).\n")
        } else {
            Frame::error(errors)
        }
    }

    fn create_channel(&mut self, id: ConnId, mut fields: Vec<String>) -> Frame {
        let raw = take_field(&mut fields, 0);
        let name = match raw.parse::<Name>() {
            Ok(name) => name,
            Err(_) => return Frame::error(format!("Name {raw} is invalid.\n")),
        };
        if self.channels.contains_key(&name) {
            return Frame::error(format!("{name} is already in use.\n"));
        }
        let mut channel = Channel::new();
        channel.members.push(id);
        self.channels.insert(name.clone(), channel);
        self.channel_order.push(name.clone());
        self.user_channels.entry(id).or_default().push(name);
        Frame::success("Channel created.\n")
    }

    fn delete_channel(&mut self, id: ConnId, mut fields: Vec<String>) -> Frame {
        let raw = take_field(&mut fields, 0);
        let name = match raw.parse::<Name>() {
            Ok(name) => name,
            Err(_) => return Frame::error(format!("Name {raw} is invalid.\n")),
        };
        let Some(channel) = self.channels.get(&name) else {
            return Frame::error(format!("{name} does not exist.\n"));
        };
        if !channel.contains(id) {
            return Frame::error(format!("You are not part of {name}.\n"));
        }
        self.channels.remove(&name);
        self.channel_order.retain(|n| n != &name);
        for joined in self.user_channels.values_mut() {
            joined.retain(|n| n != &name);
        }
        Frame::success("Channel deleted.\n")
    }

    fn list_channels(&self) -> Frame {
        if self.channel_order.is_empty() {
            return Frame::error("No channels exist.\n");
        }
        Frame::success(numbered_listing(self.channel_order.iter().map(Name::as_str)))
    }

    fn list_my_channels(&self, id: ConnId) -> Frame {
        let joined = self.user_channels.get(&id).cloned().unwrap_or_default();
        if joined.is_empty() {
            return Frame::error("You are not listening to any channels.\n");
        }
        Frame::success(numbered_listing(joined.iter().map(Name::as_str)))
    }

    fn list_channel_users(&self, mut fields: Vec<String>) -> Frame {
        let raw = take_field(&mut fields, 0);
        let name = match raw.parse::<Name>() {
            Ok(name) => name,
            Err(_) => return Frame::error(format!("Name {raw} is invalid.\n")),
        };
        let Some(channel) = self.channels.get(&name) else {
            return Frame::error(format!("{name} does not exist.\n"));
        };
        let names: Vec<&str> = channel
            .members
            .iter()
            .filter_map(|id| self.usernames.get(id).map(|c| c.username.as_str()))
            .collect();
        Frame::success(numbered_listing(names.into_iter()))
    }

    fn list_users(&self) -> Frame {
        let names: Vec<&str> = self
            .user_order
            .iter()
            .filter_map(|id| self.usernames.get(id).map(|c| c.username.as_str()))
            .collect();
        Frame::success(numbered_listing(names.into_iter()))
    }
}

fn numbered_listing<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for (i, item) in items.enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, item));
    }
    out
}

fn take_field(fields: &mut Vec<String>, index: usize) -> String {
    fields.get(index).cloned().unwrap_or_default()
}
