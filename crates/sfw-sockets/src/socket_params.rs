use sfw_utils::{sfw_log_trace, sfw_log_warn};

use socket2::Socket;

/// Options applied to every probe socket before it is used
#[derive(Clone, Debug, Default)]
pub struct TcpParams {
    pub nodelay_enable: Option<bool>,
    pub buf_size: SocketBufSizes,
}

/// Kernel buffer sizes, `None` keeps the system default
#[derive(Clone, Debug, Default)]
pub struct SocketBufSizes {
    pub tx_buf_size: Option<usize>,
    pub rx_buf_size: Option<usize>,
}

impl TcpParams {
    pub fn apply(&self, socket: &Socket) {
        if let Some(nodelay_enable) = self.nodelay_enable {
            if let Err(e) = socket.set_nodelay(nodelay_enable) {
                sfw_log_warn!(
                    "Cannot set TCP_NODELAY={} for {:?} socket: {}",
                    nodelay_enable,
                    socket.local_addr(),
                    e
                );
            }
        }

        self.buf_size.apply(socket);
    }
}

impl SocketBufSizes {
    pub fn apply(&self, socket: &Socket) {
        if let Some(rx_buf_size) = self.rx_buf_size {
            if let Err(e) = socket.set_recv_buffer_size(rx_buf_size) {
                sfw_log_warn!(
                    "Cannot set Rx buf size {} for {:?} socket: {}",
                    rx_buf_size,
                    socket.local_addr(),
                    e
                );
            }
        }

        if let Some(tx_buf_size) = self.tx_buf_size {
            if let Err(e) = socket.set_send_buffer_size(tx_buf_size) {
                sfw_log_warn!(
                    "Cannot set Tx buf size {} for {:?} socket: {}",
                    tx_buf_size,
                    socket.local_addr(),
                    e
                );
            }
        }

        sfw_log_trace!(
            "recv_buffer_size() = {:?}, send_buffer_size() = {:?} for {:?} socket",
            socket.recv_buffer_size(),
            socket.send_buffer_size(),
            socket.local_addr()
        );
    }
}
