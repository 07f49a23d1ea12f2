#![forbid(unsafe_code)]
#![cfg_attr(not(test), deny(clippy::expect_used, clippy::unwrap_used))]

pub mod decode;
pub mod hexdump;
pub mod numeric;
pub mod outline;
pub mod types;
pub mod view;
