//! Length-prefixed message framing
//!
//! Frame = `[u32 length, native byte order][length bytes of UTF-8 JSON]`.
//! There is no resynchronisation marker, so any framing or decoding error
//! leaves the stream in an unknown state and is fatal to the session.

use super::protocol::{Query, Request, Response};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const LENGTH_PREFIX_LEN: usize = 4;

/// Largest message a browser sends to a native host (64 MiB)
pub const MAX_INBOUND_FRAME: usize = 64 * 1024 * 1024;

/// Largest message a browser accepts from a native host (1 MiB)
pub const MAX_OUTBOUND_FRAME: usize = 1024 * 1024;

/// Malformed input or a broken stream.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("stream ended inside a frame: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },

    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("malformed query: {0}")]
    InvalidQuery(#[source] serde_json::Error),

    #[error("write query without text")]
    MissingText,

    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read until `buf` is full or the stream ends; returns the bytes read.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Read the next frame payload.
///
/// Returns `Ok(None)` on a clean end of stream, i.e. when the stream closes
/// before the first byte of a length prefix.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    match read_full(reader, &mut prefix).await? {
        0 => return Ok(None),
        LENGTH_PREFIX_LEN => {}
        got => {
            return Err(ProtocolError::Truncated {
                expected: LENGTH_PREFIX_LEN,
                got,
            })
        }
    }

    let len = u32::from_ne_bytes(prefix) as usize;
    if len > MAX_INBOUND_FRAME {
        return Err(ProtocolError::FrameTooLarge {
            len,
            max: MAX_INBOUND_FRAME,
        });
    }

    let mut payload = vec![0u8; len];
    let got = read_full(reader, &mut payload).await?;
    if got < len {
        return Err(ProtocolError::Truncated { expected: len, got });
    }
    Ok(Some(payload))
}

/// Write one frame and flush it.
///
/// The reader on the other end of the pipe waits for whole messages, so an
/// unflushed frame stalls it indefinitely.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_OUTBOUND_FRAME {
        return Err(ProtocolError::FrameTooLarge {
            len: payload.len(),
            max: MAX_OUTBOUND_FRAME,
        });
    }
    let prefix = (payload.len() as u32).to_ne_bytes();
    writer.write_all(&prefix).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Decode a frame payload into a validated request.
pub fn decode_query(payload: &[u8]) -> Result<Request, ProtocolError> {
    let text = std::str::from_utf8(payload)?;
    let query: Query = serde_json::from_str(text).map_err(ProtocolError::InvalidQuery)?;
    Request::try_from(query)
}

pub fn encode_response(response: &Response) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(response).map_err(ProtocolError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::protocol::Mode;

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut bytes = (payload.len() as u32).to_ne_bytes().to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[tokio::test]
    async fn test_read_frame_clean_eof() {
        let mut input: &[u8] = &[];
        assert!(read_frame(&mut input).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_frame_sequence() {
        let mut bytes = frame(b"first");
        bytes.extend(frame(b"second"));
        let mut input: &[u8] = &bytes;

        assert_eq!(read_frame(&mut input).await.unwrap().unwrap(), b"first");
        assert_eq!(read_frame(&mut input).await.unwrap().unwrap(), b"second");
        assert!(read_frame(&mut input).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_frame_zero_length() {
        let bytes = 0u32.to_ne_bytes();
        let mut input: &[u8] = &bytes;
        assert_eq!(read_frame(&mut input).await.unwrap(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_truncated_prefix() {
        let mut input: &[u8] = &[5, 0];
        let err = read_frame(&mut input).await.unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Truncated {
                expected: 4,
                got: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_truncated_payload() {
        let mut bytes = frame(b"0123456789");
        bytes.truncate(LENGTH_PREFIX_LEN + 3);
        let mut input: &[u8] = &bytes;
        let err = read_frame(&mut input).await.unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Truncated {
                expected: 10,
                got: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_oversized_prefix_rejected_before_reading() {
        let bytes = ((MAX_INBOUND_FRAME + 1) as u32).to_ne_bytes();
        let mut input: &[u8] = &bytes;
        assert!(matches!(
            read_frame(&mut input).await,
            Err(ProtocolError::FrameTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_frame_layout() {
        let mut out = Vec::new();
        write_frame(&mut out, b"{}").await.unwrap();
        assert_eq!(out, frame(b"{}"));
    }

    #[tokio::test]
    async fn test_write_frame_rejects_oversized_payload() {
        let mut out = Vec::new();
        let payload = vec![b'x'; MAX_OUTBOUND_FRAME + 1];
        assert!(matches!(
            write_frame(&mut out, &payload).await,
            Err(ProtocolError::FrameTooLarge { .. })
        ));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_response_frame_round_trip() {
        let response = Response::read(Some("line one\nline two ✓".into()));
        let mut out = Vec::new();
        write_frame(&mut out, &encode_response(&response).unwrap())
            .await
            .unwrap();

        let mut input: &[u8] = &out;
        let payload = read_frame(&mut input).await.unwrap().unwrap();
        let decoded: Response = serde_json::from_slice(&payload).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_decode_query() {
        let request = decode_query(br#"{"profile":"someone","mode":"read"}"#).unwrap();
        assert_eq!(request.mode(), Mode::Read);
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        assert!(matches!(
            decode_query(&[0xff, 0xfe]),
            Err(ProtocolError::InvalidUtf8(_))
        ));
        assert!(matches!(
            decode_query(b"not json"),
            Err(ProtocolError::InvalidQuery(_))
        ));
        assert!(matches!(
            decode_query(br#"{"mode":"read"}"#),
            Err(ProtocolError::InvalidQuery(_))
        ));
        assert!(matches!(
            decode_query(br#"{"profile":"someone","mode":"delete"}"#),
            Err(ProtocolError::InvalidQuery(_))
        ));
        assert!(matches!(
            decode_query(br#"{"profile":"someone","mode":"write"}"#),
            Err(ProtocolError::MissingText)
        ));
    }
}
