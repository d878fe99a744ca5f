pub mod interface;
pub mod log;
#[cfg(test)]
pub mod mock;
pub mod rpc;
pub mod sender;

pub use interface::Transport;
pub use log::LogTransport;
pub use rpc::JsonRpcTransport;
pub use sender::{SenderStats, TransportSender};
