//! Data models for Foxden

mod channel;
mod den;
mod ids;
mod member;
mod message;
mod role;
mod user;

pub use channel::*;
pub use den::*;
pub use ids::*;
pub use member::*;
pub use message::*;
pub use role::*;
pub use user::*;
