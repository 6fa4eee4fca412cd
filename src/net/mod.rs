//! Network delivery: wire codec, worker pool and the TCP/UDP collectors

pub mod codec;
pub mod pool;
pub mod server;
pub mod udp;

pub use codec::{
    decode_datagram, encode_datagram, encode_frame, FrameDecoder, Payload, RecordFields,
    DEFAULT_MAX_FRAME_LEN,
};
pub use pool::WorkerPool;
pub use server::{ServerHandle, TcpLogServer, DEFAULT_READ_BUFFER_SIZE};
pub use udp::{UdpLogServer, UdpServerHandle};
