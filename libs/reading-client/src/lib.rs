//! Client side of reading positions: records where the reader is, keeps the
//! view still after a reply, and opens discussions where the reader left off.
//!
//! The host shell feeds [`events::HostEvent`]s into a [`events::HostBus`] and
//! asks it before every jump; nothing here touches the host's rendering.

pub mod api;
pub mod client;
pub mod error;
pub mod events;
pub mod link;
pub mod position;
pub mod prefetch;
pub mod recorder;
pub mod session;
pub mod shortcuts;
pub mod store;
pub mod suppressor;

pub use api::{HttpApi, ReadingPositionApi};
pub use client::ReadingClient;
pub use error::{ClientError, Result};
pub use events::{HostBus, HostEvent, HostHandler, JumpDecision, JumpRequest, JumpTarget};
pub use prefetch::{ClickOutcome, PositionPrefetcher};
pub use recorder::PositionRecorder;
pub use session::Session;
pub use store::{CachedDiscussion, DiscussionStore};
pub use suppressor::ReplyJumpSuppressor;
