pub mod cursor;
pub mod handlers;
pub mod handles;
pub mod session;
pub mod utils;

pub use session::SftpSession;
