pub mod transitions;
pub mod types;

pub use transitions::decode_payload;
pub use types::*;
