use serde::Deserialize;
use sfw_sockets::{SocketBufSizes, TcpParams};
use sfw_utils::IpStack;
use smart_default::SmartDefault;

use crate::timeout::DEFAULT_TEST_TIME;

/// Settings of the simple firewall test
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, SmartDefault)]
#[serde(default)]
pub struct SfwConfig {
    /// Run the test at all
    #[default(true)]
    pub enabled: bool,
    /// Upper bound for the derived probe deadline (in seconds)
    #[default(DEFAULT_TEST_TIME)]
    pub fallback_test_time_secs: u64,
    /// Extra time granted on top of the announced deadline (in seconds)
    #[default(1)]
    pub grace_secs: u64,
    /// Address family of probe sockets
    pub ip_stack: IpStack,
    /// Disable Nagle on probe sockets
    #[default(true)]
    pub tcp_nodelay: bool,
    /// Kernel receive buffer of probe sockets, system default when unset
    pub tcp_rx_buf_size: Option<usize>,
    /// Kernel send buffer of probe sockets, system default when unset
    pub tcp_tx_buf_size: Option<usize>,
    /// Largest control or probe message accepted (in bytes)
    #[default(sfw_proto::DEFAULT_MAX_MSG_LEN)]
    pub max_message_len: usize,
}

impl SfwConfig {
    /// Socket parameters for probe sockets
    pub fn tcp_params(&self) -> TcpParams {
        TcpParams {
            nodelay_enable: Some(self.tcp_nodelay),
            buf_size: SocketBufSizes {
                rx_buf_size: self.tcp_rx_buf_size,
                tx_buf_size: self.tcp_tx_buf_size,
            },
        }
    }
}
