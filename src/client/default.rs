// ABOUTME: Default chat client implementation: one TCP connection, a background demux task
// ABOUTME: feeding a single-slot reply queue and an unbounded inbox queue (§4.4, §4.5)

use crate::client::error::{ChatError, ChatResult};
use crate::client::traits::{ChatClient, ChatConnection};
use crate::codec::{CodecError, Frame, Opcode};
use crate::connection::{Connection, FrameWriter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REPLY_TIMEOUT: Duration = Duration::from_secs(3);

/// Default chat client implementation.
///
/// Holds the write half of the connection directly; the read half is owned
/// by a spawned background task that demultiplexes incoming frames into a
/// single-slot reply channel (`SUCCESS`/`ERROR`) and an unbounded inbox
/// channel (`INBOX`), mirroring the reply-router design of §4.5.
pub struct DefaultClient {
    writer: FrameWriter,
    reply_rx: mpsc::Receiver<Frame>,
    inbox_rx: mpsc::UnboundedReceiver<String>,
    reader_task: JoinHandle<()>,
    connected: Arc<AtomicBool>,
}

impl ChatConnection for DefaultClient {
    async fn connect<T: ToSocketAddrs + Send>(addr: T) -> ChatResult<Self> {
        let socket = match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
            Ok(Ok(socket)) => socket,
            Ok(Err(e)) => return Err(ChatError::Connection(e)),
            Err(_) => return Err(ChatError::ConnectFailed("connect timed out".to_string())),
        };

        let (reader, writer) = Connection::new(socket).into_split();
        let (reply_tx, reply_rx) = mpsc::channel(1);
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));

        let reader_task = tokio::spawn(demux(reader, reply_tx, inbox_tx, connected.clone()));

        Ok(DefaultClient {
            writer,
            reply_rx,
            inbox_rx,
            reader_task,
            connected,
        })
    }

    async fn disconnect(&mut self) -> ChatResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        self.reader_task.abort();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Reads frames off the socket until it closes, routing each to the reply
/// slot or the inbox queue. Exits (dropping both senders) on a closed
/// connection or a decode error, which resolves any pending `recv()` to
/// `None`/a closed channel — the client-side observation of liveness.
async fn demux(
    mut reader: crate::connection::FrameReader,
    reply_tx: mpsc::Sender<Frame>,
    inbox_tx: mpsc::UnboundedSender<String>,
    connected: Arc<AtomicBool>,
) {
    loop {
        match reader.read_frame().await {
            Ok(Some(frame)) => match Opcode::try_from(frame.opcode) {
                Ok(Opcode::Success) | Ok(Opcode::Error) => {
                    if reply_tx.send(frame).await.is_err() {
                        break;
                    }
                }
                Ok(Opcode::Inbox) => {
                    let text = frame.fields.into_iter().next().unwrap_or_default();
                    if inbox_tx.send(text).is_err() {
                        break;
                    }
                }
                _ => {
                    tracing::warn!(opcode = frame.opcode, "server sent an unexpected opcode");
                }
            },
            Ok(None) => {
                tracing::debug!("server closed the connection");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "client read failed");
                break;
            }
        }
    }
    connected.store(false, Ordering::SeqCst);
}

impl DefaultClient {
    async fn request(&mut self, frame: Frame) -> ChatResult<String> {
        match frame.encode() {
            Ok(_) => {}
            Err(CodecError::FrameTooLarge { size, max }) => {
                return Err(ChatError::FrameTooLarge { size, max });
            }
            Err(e) => return Err(ChatError::UnexpectedFrame(e.to_string())),
        }

        self.writer
            .write_frame(&frame)
            .await
            .map_err(ChatError::Connection)?;

        let reply = match tokio::time::timeout(REPLY_TIMEOUT, self.reply_rx.recv()).await {
            Ok(Some(reply)) => reply,
            Ok(None) => return Err(ChatError::ConnectionClosed),
            Err(_) => {
                self.connected.store(false, Ordering::SeqCst);
                return Err(ChatError::Timeout);
            }
        };

        match Opcode::try_from(reply.opcode) {
            Ok(Opcode::Success) => Ok(reply.fields.into_iter().next().unwrap_or_default()),
            Ok(Opcode::Error) => Err(ChatError::Protocol(
                reply.fields.into_iter().next().unwrap_or_default(),
            )),
            _ => Err(ChatError::UnexpectedFrame(format!("opcode {}", reply.opcode))),
        }
    }
}

impl ChatClient for DefaultClient {
    async fn set_name(&mut self, name: &str) -> ChatResult<String> {
        self.request(Frame::new(Opcode::SetName, vec![name.to_string()]))
            .await
    }

    async fn message_user(&mut self, name: &str, text: &str) -> ChatResult<String> {
        self.request(Frame::new(
            Opcode::MessageUser,
            vec![name.to_string(), text.to_string()],
        ))
        .await
    }

    async fn message_my_channels(&mut self, text: &str) -> ChatResult<String> {
        self.request(Frame::new(Opcode::MessageMyChannels, vec![text.to_string()]))
            .await
    }

    async fn message_channels(&mut self, names: &[String], text: &str) -> ChatResult<String> {
        let mut fields = names.to_vec();
        fields.push(text.to_string());
        self.request(Frame::new(Opcode::MessageChannels, fields)).await
    }

    async fn join_channels(&mut self, names: &[String]) -> ChatResult<String> {
        self.request(Frame::new(Opcode::JoinChannels, names.to_vec()))
            .await
    }

    async fn leave_channels(&mut self, names: &[String]) -> ChatResult<String> {
        self.request(Frame::new(Opcode::LeaveChannels, names.to_vec()))
            .await
    }

    async fn create_channel(&mut self, name: &str) -> ChatResult<String> {
        self.request(Frame::new(Opcode::CreateChannel, vec![name.to_string()]))
            .await
    }

    async fn delete_channel(&mut self, name: &str) -> ChatResult<String> {
        self.request(Frame::new(Opcode::DeleteChannel, vec![name.to_string()]))
            .await
    }

    async fn list_channels(&mut self) -> ChatResult<String> {
        self.request(Frame::new(Opcode::ListChannels, vec![])).await
    }

    async fn list_my_channels(&mut self) -> ChatResult<String> {
        self.request(Frame::new(Opcode::ListMyChannels, vec![])).await
    }

    async fn list_channel_users(&mut self, name: &str) -> ChatResult<String> {
        self.request(Frame::new(
            Opcode::ListChannelUsers,
            vec![name.to_string()],
        ))
        .await
    }

    async fn list_users(&mut self) -> ChatResult<String> {
        self.request(Frame::new(Opcode::ListUsers, vec![])).await
    }

    fn try_next_inbox(&mut self) -> Option<String> {
        self.inbox_rx.try_recv().ok()
    }

    async fn next_inbox(&mut self) -> Option<String> {
        self.inbox_rx.recv().await
    }
}
