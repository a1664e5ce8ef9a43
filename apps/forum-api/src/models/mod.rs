pub mod discussion;
pub mod discussion_user;
pub mod post;
pub mod user;
