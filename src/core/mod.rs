pub mod composer;
pub mod phrase_bank;
#[cfg(feature = "reveal")]
pub mod reveal;
pub mod session;
pub mod template;
pub mod text;
