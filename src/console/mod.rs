pub mod command;
pub mod session;

pub use command::{Command, CommandError};
pub use session::{ConsoleSession, Response, SessionStats};
