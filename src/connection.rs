// ABOUTME: Buffered frame-at-a-time TCP I/O shared by server and client sides
// ABOUTME: Accumulates bytes until a full frame is decodable, tolerating short reads

use crate::codec::{CodecError, Frame};
use bytes::{Buf, BytesMut};
use std::io::{self, Cursor};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// Wraps one TCP socket with a read-side accumulation buffer and a
/// write-side `BufWriter`, presenting a frame-at-a-time interface that does
/// not assume a single `read` call yields exactly one frame.
#[derive(Debug)]
pub struct Connection {
    stream: BufWriter<TcpStream>,
    buffer: BytesMut,
}

impl Connection {
    pub fn new(socket: TcpStream) -> Connection {
        Connection {
            stream: BufWriter::new(socket),
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Reads the next full frame from the socket, buffering partial reads
    /// until one is available. Returns `Ok(None)` on a clean peer-initiated
    /// close with no partial frame pending.
    pub async fn read_frame(&mut self) -> crate::Result<Option<Frame>> {
        loop {
            if let Some(frame) = parse_frame(&mut self.buffer)? {
                return Ok(Some(frame));
            }

            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err("connection reset by peer".into());
            }
        }
    }

    pub async fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        let bytes = frame
            .encode()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await
    }

    /// Splits a full-duplex connection into independent read and write
    /// halves so each can be owned by its own task, mirroring how the
    /// server drives one read loop and one write loop per accepted socket.
    pub fn into_split(self) -> (FrameReader, FrameWriter) {
        let socket = self.stream.into_inner();
        let (read_half, write_half) = socket.into_split();
        (
            FrameReader {
                stream: read_half,
                buffer: self.buffer,
            },
            FrameWriter {
                stream: BufWriter::new(write_half),
            },
        )
    }
}

/// Read half of a split `Connection`.
#[derive(Debug)]
pub struct FrameReader {
    stream: OwnedReadHalf,
    buffer: BytesMut,
}

impl FrameReader {
    pub async fn read_frame(&mut self) -> crate::Result<Option<Frame>> {
        loop {
            if let Some(frame) = parse_frame(&mut self.buffer)? {
                return Ok(Some(frame));
            }

            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err("connection reset by peer".into());
            }
        }
    }
}

/// Write half of a split `Connection`.
#[derive(Debug)]
pub struct FrameWriter {
    stream: BufWriter<OwnedWriteHalf>,
}

impl FrameWriter {
    pub async fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        let bytes = frame
            .encode()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await
    }
}

fn parse_frame(buffer: &mut BytesMut) -> Result<Option<Frame>, CodecError> {
    let mut buf = Cursor::new(&buffer[..]);

    match Frame::check(&mut buf) {
        Ok(len) => {
            buf.set_position(0);
            let frame = Frame::parse(&mut buf)?;
            buffer.advance(len);
            Ok(Some(frame))
        }
        Err(CodecError::Incomplete) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Opcode;
    use tokio::net::{TcpListener, TcpStream};

    async fn pair() -> (Connection, Connection) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (Connection::new(server), Connection::new(client))
    }

    #[tokio::test]
    async fn round_trips_a_frame_over_a_real_socket() {
        let (mut server, mut client) = pair().await;
        let frame = Frame::success("Message sent.\n");
        client.write_frame(&frame).await.unwrap();
        let received = server.read_frame().await.unwrap().unwrap();
        assert_eq!(received, frame);
    }

    #[tokio::test]
    async fn survives_a_frame_split_across_two_writes() {
        let (mut server, mut client) = pair().await;
        let frame = Frame::new(Opcode::SetName, vec!["alice".to_string()]);
        let bytes = frame.encode().unwrap();
        let (head, tail) = bytes.split_at(3);

        client.stream.write_all(head).await.unwrap();
        client.stream.flush().await.unwrap();
        let pending =
            tokio::time::timeout(std::time::Duration::from_millis(50), server.read_frame()).await;
        assert!(pending.is_err(), "frame should not be ready yet");

        client.stream.write_all(tail).await.unwrap();
        client.stream.flush().await.unwrap();
        let received = server.read_frame().await.unwrap().unwrap();
        assert_eq!(received, frame);
    }

    #[tokio::test]
    async fn returns_none_on_clean_peer_close() {
        let (mut server, client) = pair().await;
        drop(client);
        let result = server.read_frame().await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn split_halves_round_trip_independently() {
        let (server, client) = pair().await;
        let (mut server_reader, _server_writer) = server.into_split();
        let (_client_reader, mut client_writer) = client.into_split();

        let frame = Frame::inbox("room|alice: hi\n");
        client_writer.write_frame(&frame).await.unwrap();
        let received = server_reader.read_frame().await.unwrap().unwrap();
        assert_eq!(received, frame);
    }
}
