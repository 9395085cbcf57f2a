use std::{io, net::SocketAddr};

use sfw_utils::sfw_log_debug;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpSocket, TcpStream};

use crate::TcpParams;

/// Opens an outbound TCP connection with the given socket parameters.
///
/// The returned future does not time out on its own, callers bound it with
/// their own deadline.
pub async fn connect(addr: SocketAddr, params: &TcpParams) -> io::Result<TcpStream> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_nonblocking(true)?;
    params.apply(&socket);

    sfw_log_debug!("Connecting probe socket to {}", addr);
    TcpSocket::from_std_stream(socket.into()).connect(addr).await
}
