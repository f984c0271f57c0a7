pub mod common;
pub mod ledger;
pub mod packet;

pub use common::*;
pub use ledger::*;
pub use packet::*;
