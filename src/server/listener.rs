// ABOUTME: Accept loop and per-connection read/write tasks for the relay server
// ABOUTME: Each connection gets its own send queue and forwards frames into the directory

use crate::config::ServerConfig;
use crate::connection::Connection;
use crate::domain::ConnId;
use crate::server::directory::{Directory, DirectoryEvent};
use crate::server::send_queue::SendQueue;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Runs the relay server until `shutdown` resolves.
///
/// Spawns the directory task, binds the listener, and accepts connections
/// until asked to stop. Each accepted connection gets its own read and write
/// tasks; closing `shutdown` causes the accept loop to exit, and dropping the
/// directory's event sender (once every connection task has ended) lets the
/// directory task finish.
pub async fn serve(
    config: &ServerConfig,
    mut shutdown: tokio::sync::oneshot::Receiver<()>,
) -> crate::Result<()> {
    let listener = TcpListener::bind(config.addr()).await?;
    tracing::info!(addr = %config.addr(), "listening");

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let directory = tokio::spawn(Directory::new().run(events_rx));

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, peer) = accepted?;
                let id = ConnId::next();
                tracing::info!(conn_id = %id, %peer, "accepted connection");
                spawn_connection(socket, id, events_tx.clone());
            }
            _ = &mut shutdown => {
                tracing::info!("shutdown requested, closing listener");
                break;
            }
        }
    }

    drop(events_tx);
    let _ = directory.await;
    Ok(())
}

fn spawn_connection(socket: TcpStream, id: ConnId, events_tx: mpsc::UnboundedSender<DirectoryEvent>) {
    let outbox = SendQueue::new(1024);
    let _ = events_tx.send(DirectoryEvent::Connected {
        id,
        outbox: outbox.clone(),
    });

    let connection = Connection::new(socket);
    tokio::spawn(run_connection(connection, id, events_tx, outbox));
}

async fn run_connection(
    connection: Connection,
    id: ConnId,
    events_tx: mpsc::UnboundedSender<DirectoryEvent>,
    outbox: std::sync::Arc<SendQueue>,
) {
    let (read_half, write_half) = connection.into_split();

    let writer = tokio::spawn(write_loop(write_half, outbox));
    read_loop(read_half, id, &events_tx).await;

    writer.abort();
    let _ = events_tx.send(DirectoryEvent::Disconnected { id });
}

async fn read_loop(
    mut reader: crate::connection::FrameReader,
    id: ConnId,
    events_tx: &mpsc::UnboundedSender<DirectoryEvent>,
) {
    loop {
        match reader.read_frame().await {
            Ok(Some(frame)) => {
                if events_tx.send(DirectoryEvent::Request { id, frame }).is_err() {
                    break;
                }
            }
            Ok(None) => {
                tracing::debug!(conn_id = %id, "peer closed connection");
                break;
            }
            Err(e) => {
                tracing::warn!(conn_id = %id, error = %e, "connection read failed");
                break;
            }
        }
    }
}

async fn write_loop(mut writer: crate::connection::FrameWriter, outbox: std::sync::Arc<SendQueue>) {
    loop {
        let frame = outbox.pop().await;
        if let Err(e) = writer.write_frame(&frame).await {
            tracing::warn!(error = %e, "connection write failed");
            break;
        }
    }
}
