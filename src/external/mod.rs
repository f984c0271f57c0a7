pub mod notifier;

pub use notifier::{NotifierService, PacketEvent};
