#![warn(rust_2018_idioms)]

pub mod cleaner;
pub mod receiver;
pub mod reorderer;
pub mod sender;
pub mod ticker;
pub mod unwrapper;

pub use cleaner::Cleaner;
pub use receiver::RtcpReceiver;
pub use reorderer::Reorderer;
pub use sender::RtcpSender;
pub use ticker::Ticker;
pub use unwrapper::TimestampUnwrapper;
