pub mod ledger_service;
pub mod packet_service;

pub use ledger_service::*;
pub use packet_service::*;
