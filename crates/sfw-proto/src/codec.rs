use std::convert::TryFrom;

use thiserror::Error as ThisError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Message, MessageType};

/// Size of the frame header: 1 byte type + 2 bytes length
const HEADER_LEN: usize = 3;

/// Largest payload accepted unless the caller asks otherwise
pub const DEFAULT_MAX_MSG_LEN: usize = 8192;

/// Possible framing errors.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Frame carried a type byte that is not a known [MessageType].
    #[error("Unknown message type {0}")]
    InvalidType(u8),
    /// Frame payload does not fit the receive limit.
    #[error("Message of {len} bytes exceeds the limit of {max} bytes")]
    TooLong {
        /// Announced payload length
        len: usize,
        /// Receive limit
        max: usize,
    },
    /// Payload cannot be described by the 16 bit length field.
    #[error("Payload of {0} bytes cannot be framed")]
    Encode(usize),
    /// Underlying stream failed or was closed mid-frame.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reads a control frame from a reader
/// Frame:
/// 0:1 - message type
/// 1:3 - payload length, big endian
/// 3:length+3 - payload
pub async fn read_msg<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_len: usize,
) -> Result<Message, Error> {
    let mut header = [0_u8; HEADER_LEN];
    reader.read_exact(&mut header).await?;

    let kind = MessageType::try_from(header[0]).map_err(|_| Error::InvalidType(header[0]))?;
    let len = u16::from_be_bytes([header[1], header[2]]) as usize;
    if len > max_len {
        return Err(Error::TooLong { len, max: max_len });
    }

    let mut payload = vec![0_u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Message { kind, payload })
}

/// Writes a control frame to a writer
pub async fn write_msg<W: AsyncWrite + Unpin>(
    writer: &mut W,
    kind: MessageType,
    payload: &[u8],
) -> Result<(), Error> {
    let len = u16::try_from(payload.len()).map_err(|_| Error::Encode(payload.len()))?;

    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.push(kind.into());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(payload);
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}
