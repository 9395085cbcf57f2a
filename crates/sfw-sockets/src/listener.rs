use std::{io, net::SocketAddr};

use sfw_utils::{sfw_log_debug, IpStack};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

use crate::TcpParams;

const LISTEN_BACKLOG: i32 = 5;

/// Listening socket bound to an ephemeral port
#[derive(Debug)]
pub struct ProbeListener {
    pub listener: TcpListener,
    pub port: u16,
}

/// Binds a listening socket to an auto-assigned port on the unspecified
/// address of the given stack.
pub fn bind_listener(stack: IpStack, params: &TcpParams) -> io::Result<ProbeListener> {
    let addr = SocketAddr::new(stack.unspecified(), 0);
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;

    if addr.is_ipv6() {
        socket.set_only_v6(stack == IpStack::IPv6)?;
    }
    socket.set_reuse_address(true)?;
    params.apply(&socket);

    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    socket.set_nonblocking(true)?;

    let listener = TcpListener::from_std(socket.into())?;
    let port = listener.local_addr()?.port();
    sfw_log_debug!("Probe listener bound to {}:{}", addr.ip(), port);

    Ok(ProbeListener { listener, port })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn ephemeral_port_is_reported() {
        let probe = bind_listener(IpStack::IPv4, &TcpParams::default()).unwrap();
        assert_ne!(0, probe.port);
        assert_eq!(probe.port, probe.listener.local_addr().unwrap().port());

        let target = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), probe.port);
        let (accepted, connected) =
            tokio::join!(probe.listener.accept(), TcpStream::connect(target));
        assert!(accepted.is_ok());
        assert!(connected.is_ok());
    }

    #[tokio::test]
    async fn each_listener_gets_own_port() {
        let first = bind_listener(IpStack::IPv4, &TcpParams::default()).unwrap();
        let second = bind_listener(IpStack::IPv4, &TcpParams::default()).unwrap();
        assert_ne!(first.port, second.port);
    }
}
