pub mod network;
pub mod serde_util;
pub mod string_util;
