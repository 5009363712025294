pub mod format;
pub mod error;
pub mod layout;
pub mod codec;
pub mod firmware;
pub mod encode;
pub mod decode;
