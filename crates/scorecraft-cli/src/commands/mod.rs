pub mod compare;
pub mod init;
pub mod preview;
pub mod score;
pub mod validate;
