//! Database query modules.

pub mod avatars;
pub mod media;
pub mod ratings;
pub mod users;
