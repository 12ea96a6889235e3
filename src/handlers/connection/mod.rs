//! Per-command handlers for the regular IRC command surface (§4.E).

pub mod away;
pub mod motd;
pub mod nick;
pub mod notice;
pub mod pass;
pub mod ping;
pub mod privmsg;
pub mod quit;
pub mod user;

pub use away::AwayHandler;
pub use motd::MotdHandler;
pub use nick::NickHandler;
pub use notice::NoticeHandler;
pub use pass::PassHandler;
pub use ping::{PingHandler, PongHandler};
pub use privmsg::PrivmsgHandler;
pub use quit::QuitHandler;
pub use user::UserHandler;
