use std::net::SocketAddr;

use sfw_utils::{sfw_log_debug, IpStack};
use tokio::net::lookup_host;

use crate::Error;

/// Resolves `host` to a single socket address of the wanted family
pub async fn resolve(host: &str, port: u16, stack: IpStack) -> Result<SocketAddr, Error> {
    sfw_log_debug!("Resolving {}", host);
    let addrs = lookup_host((host, port))
        .await
        .map_err(|_| Error::Resolve(host.to_owned()))?
        .map(|addr| addr.ip())
        .collect::<Vec<_>>();
    sfw_log_debug!("Got Addresses: {:?} for {:?}", addrs, host);

    let ip = stack.select(addrs)?;
    Ok(SocketAddr::new(ip, port))
}
