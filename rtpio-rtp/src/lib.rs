#![warn(rust_2018_idioms)]

pub mod codec;
pub mod header;
pub mod packet;
pub mod packetizer;
pub mod sequence;

pub use header::Header;
pub use packet::Packet;
pub use packetizer::{Depacketizer, Packetizer};
