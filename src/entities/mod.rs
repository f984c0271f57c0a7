pub mod ledger_entries;
pub mod packet_claims;
pub mod red_packets;
pub mod users;

pub use ledger_entries as ledger_entry_entity;
pub use packet_claims as packet_claim_entity;
pub use red_packets as red_packet_entity;
pub use users as user_entity;
