pub mod allocator;

pub use allocator::{next_share, split_amount, validate_split};
