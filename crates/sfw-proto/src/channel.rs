use std::{io, net::IpAddr};

use sfw_utils::sfw_log_trace;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};

use crate::{read_msg, write_msg, CodecError, Message, MessageType, DEFAULT_MAX_MSG_LEN};

/// Reliable, already established channel between the two diagnostic peers
pub struct ControlChannel<S> {
    stream: S,
    peer: Option<IpAddr>,
    max_msg_len: usize,
}

impl ControlChannel<TcpStream> {
    /// Wraps a connected TCP stream, remembering the peer address
    pub fn from_tcp(stream: TcpStream) -> io::Result<Self> {
        let peer = stream.peer_addr()?.ip();
        Ok(Self::new(stream, Some(peer)))
    }

    /// Underlying TCP stream, used to sample connection statistics
    pub fn tcp_stream(&self) -> &TcpStream {
        &self.stream
    }
}

impl<S> ControlChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an arbitrary byte stream
    pub fn new(stream: S, peer: Option<IpAddr>) -> Self {
        Self {
            stream,
            peer,
            max_msg_len: DEFAULT_MAX_MSG_LEN,
        }
    }

    /// Overrides the largest payload [ControlChannel::recv] accepts
    pub fn with_max_msg_len(mut self, max_msg_len: usize) -> Self {
        self.max_msg_len = max_msg_len;
        self
    }

    /// Address of the peer at the other end of the channel, if known
    pub fn peer_ip(&self) -> Option<IpAddr> {
        self.peer
    }

    /// Sends one framed message
    pub async fn send(&mut self, kind: MessageType, payload: &[u8]) -> Result<(), CodecError> {
        sfw_log_trace!("ctl tx: {} ({} bytes)", kind, payload.len());
        write_msg(&mut self.stream, kind, payload).await
    }

    /// Receives one framed message
    pub async fn recv(&mut self) -> Result<Message, CodecError> {
        let msg = read_msg(&mut self.stream, self.max_msg_len).await?;
        sfw_log_trace!("ctl rx: {} ({} bytes)", msg.kind, msg.payload.len());
        Ok(msg)
    }
}
