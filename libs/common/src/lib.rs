pub mod id;
pub mod resource;
pub mod route;
pub mod snowflake;

pub use resource::{DiscussionResource, PostResource, SaveReadingPosition};
pub use snowflake::SnowflakeGenerator;
