pub mod packet;
pub mod wallet;

pub use packet::packet_config;
pub use wallet::wallet_config;
