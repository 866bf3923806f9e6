// ABOUTME: Wire format for the chat protocol: opcode + string-field list
// ABOUTME: Encode/decode between byte buffers and a flat Frame representation

use bytes::{Buf, BufMut, Bytes, BytesMut};
use num_enum::TryFromPrimitive;
use std::io::Cursor;
use std::string::FromUtf8Error;

/// Upper bound on an encoded frame's total size, enforced by the client at
/// send time and by the server on observed frames.
pub const MAX_FRAME_SIZE: usize = 1024;

/// Closed set of request/reply/push message kinds carried over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u32)]
pub enum Opcode {
    /// Server -> client: a semantic failure, carries one text field.
    Error = 0,
    /// Server -> client: a semantic success, carries one text field.
    Success = 1,
    /// Server -> client: an asynchronously pushed chat line.
    Inbox = 2,
    /// Client -> server: request to change the sender's username.
    SetName = 3,
    /// Client -> server: direct message to a named user.
    MessageUser = 4,
    /// Client -> server: message fanned out to every channel the sender has joined.
    MessageMyChannels = 5,
    /// Client -> server: message fanned out to the named channels.
    MessageChannels = 6,
    /// Client -> server: join the named channels.
    JoinChannels = 7,
    /// Client -> server: leave the named channels.
    LeaveChannels = 8,
    /// Client -> server: create a channel.
    CreateChannel = 9,
    /// Client -> server: delete a channel.
    DeleteChannel = 10,
    /// Client -> server: list every existing channel.
    ListChannels = 11,
    /// Client -> server: list channels the sender has joined.
    ListMyChannels = 12,
    /// Client -> server: list members of a named channel.
    ListChannelUsers = 13,
    /// Client -> server: list every connected user.
    ListUsers = 14,
}

/// A decoded or to-be-encoded frame: an opcode plus its ordered string fields.
///
/// `opcode` is the raw wire value, not `Opcode`: decoding never fails just
/// because the value falls outside the closed 0-14 set (§4.1's codec
/// contract lists exactly three decode failure conditions, and opcode
/// validity isn't one of them). Call sites that need the typed enum convert
/// with `Opcode::try_from(frame.opcode)`; the processor is what decides what
/// to do with a value that doesn't convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub opcode: u32,
    pub fields: Vec<String>,
}

impl Frame {
    pub fn new(opcode: Opcode, fields: Vec<String>) -> Self {
        Frame { opcode: opcode as u32, fields }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Frame::new(Opcode::Error, vec![text.into()])
    }

    pub fn success(text: impl Into<String>) -> Self {
        Frame::new(Opcode::Success, vec![text.into()])
    }

    pub fn inbox(text: impl Into<String>) -> Self {
        Frame::new(Opcode::Inbox, vec![text.into()])
    }

    /// Encodes this frame as `opcode:u32, count:u32, (length:u32, bytes)*`.
    pub fn encode(&self) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::new();
        buf.put_u32(self.opcode);
        buf.put_u32(self.fields.len() as u32);
        for field in &self.fields {
            let bytes = field.as_bytes();
            buf.put_u32(bytes.len() as u32);
            buf.put_slice(bytes);
        }
        if buf.len() > MAX_FRAME_SIZE {
            return Err(CodecError::FrameTooLarge {
                size: buf.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        Ok(buf.freeze())
    }

    /// Checks whether a complete frame is present at the front of `src`,
    /// without consuming it. Returns the total byte length of the frame on
    /// success.
    ///
    /// Does not validate the opcode: any `u32` value is a structurally
    /// complete frame. Only the three conditions named in §4.1 (a length
    /// prefix exceeding remaining input, bad UTF-8, trailing bytes) fail
    /// decoding; opcode validity is the processor's concern.
    pub fn check(src: &mut Cursor<&[u8]>) -> Result<usize, CodecError> {
        let start = src.position();
        let _opcode_raw = get_u32(src)?;
        let count = get_u32(src)?;
        for _ in 0..count {
            let len = get_u32(src)? as usize;
            skip(src, len)?;
        }
        let end = src.position();
        let total = (end - start) as usize;
        if total > MAX_FRAME_SIZE {
            return Err(CodecError::FrameTooLarge {
                size: total,
                max: MAX_FRAME_SIZE,
            });
        }
        Ok(total)
    }

    /// Parses one frame from the front of `src`. Caller must have already
    /// called `check` successfully against the same bytes.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Frame, CodecError> {
        let opcode = get_u32(src)?;
        let count = get_u32(src)?;
        let mut fields = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let len = get_u32(src)? as usize;
            let bytes = get_bytes(src, len)?;
            let text = String::from_utf8(bytes).map_err(CodecError::Utf8)?;
            fields.push(text);
        }
        Ok(Frame { opcode, fields })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("not enough data available to parse a frame")]
    Incomplete,

    #[error("frame exceeds maximum size ({size} > {max} bytes)")]
    FrameTooLarge { size: usize, max: usize },

    #[error("field is not valid UTF-8")]
    Utf8(#[source] FromUtf8Error),

    #[error("frame has trailing bytes after its declared fields")]
    TrailingBytes,
}

fn get_u32(src: &mut Cursor<&[u8]>) -> Result<u32, CodecError> {
    if src.remaining() < 4 {
        return Err(CodecError::Incomplete);
    }
    Ok(src.get_u32())
}

fn skip(src: &mut Cursor<&[u8]>, n: usize) -> Result<(), CodecError> {
    if src.remaining() < n {
        return Err(CodecError::Incomplete);
    }
    src.advance(n);
    Ok(())
}

fn get_bytes(src: &mut Cursor<&[u8]>, n: usize) -> Result<Vec<u8>, CodecError> {
    if src.remaining() < n {
        return Err(CodecError::Incomplete);
    }
    let mut buf = vec![0u8; n];
    src.copy_to_slice(&mut buf);
    Ok(buf)
}

/// Decodes exactly one frame from `bytes`, requiring no trailing data.
///
/// Used by tests and by callers that already hold a byte buffer known to
/// contain precisely one frame. Connection-level readers instead use
/// `Frame::check`/`Frame::parse` against an accumulating buffer (framing
/// hardening against TCP coalescing and short reads).
pub fn decode(bytes: &[u8]) -> Result<Frame, CodecError> {
    let mut cursor = Cursor::new(bytes);
    let len = Frame::check(&mut cursor)?;
    cursor.set_position(0);
    let frame = Frame::parse(&mut cursor)?;
    if len != bytes.len() {
        return Err(CodecError::TrailingBytes);
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip_single_field() {
        let frame = Frame::new(Opcode::SetName, vec!["alice".to_string()]);
        let bytes = frame.encode().unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn encode_decode_round_trip_multi_field() {
        let frame = Frame::new(
            Opcode::MessageChannels,
            vec![
                "room".to_string(),
                "annex".to_string(),
                "hi there".to_string(),
            ],
        );
        let bytes = frame.encode().unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn encode_decode_round_trip_no_fields() {
        let frame = Frame::new(Opcode::ListUsers, vec![]);
        let bytes = frame.encode().unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn decode_rejects_truncated_length_prefix() {
        let mut buf = BytesMut::new();
        buf.put_u32(Opcode::SetName as u32);
        buf.put_u32(1);
        buf.put_u32(100); // claims 100 bytes but none follow
        let err = decode(&buf).unwrap_err();
        assert!(matches!(err, CodecError::Incomplete));
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        let mut buf = BytesMut::new();
        buf.put_u32(Opcode::SetName as u32);
        buf.put_u32(1);
        buf.put_u32(2);
        buf.put_slice(&[0xff, 0xfe]);
        let err = decode(&buf).unwrap_err();
        assert!(matches!(err, CodecError::Utf8(_)));
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let frame = Frame::new(Opcode::ListUsers, vec![]);
        let mut bytes = frame.encode().unwrap().to_vec();
        bytes.push(0);
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::TrailingBytes));
    }

    #[test]
    fn decode_accepts_an_opcode_outside_the_closed_set() {
        // Opcode validity is the processor's concern, not the codec's
        // (§4.1): a structurally well-formed frame decodes regardless of
        // whether its opcode is one of the fourteen known values.
        let mut buf = BytesMut::new();
        buf.put_u32(999);
        buf.put_u32(0);
        let frame = decode(&buf).unwrap();
        assert_eq!(frame.opcode, 999);
        assert!(Opcode::try_from(frame.opcode).is_err());
    }

    #[test]
    fn encode_rejects_oversized_frame() {
        let frame = Frame::new(Opcode::MessageUser, vec!["x".to_string(), "y".repeat(2000)]);
        let err = frame.encode().unwrap_err();
        assert!(matches!(err, CodecError::FrameTooLarge { .. }));
    }

    #[test]
    fn check_reports_incomplete_for_partial_frame() {
        let mut buf = BytesMut::new();
        buf.put_u32(Opcode::ListUsers as u32);
        // count missing entirely
        let cursor_buf = buf.freeze();
        let mut cursor = Cursor::new(&cursor_buf[..]);
        let err = Frame::check(&mut cursor).unwrap_err();
        assert!(matches!(err, CodecError::Incomplete));
    }
}
