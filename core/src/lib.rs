//! Synchronous client for the GroupMe v3 REST API.
//!
//! # Overview
//! Typed operations for groups (list, show, former, create, update, destroy,
//! join, rejoin, change owners) and members (add, poll results, remove,
//! rename). Each operation is one HTTP round-trip.
//!
//! # Design
//! - `GroupMeClient` is stateless: it holds only the immutable
//!   `ClientConfig` (token, base URL, default timeout).
//! - Each operation is split into `build_*` (produces an `HttpRequest`) and
//!   `parse_*` (consumes an `HttpResponse`), so the I/O boundary is explicit.
//! - `GroupMe` pairs the builder with a `Transport` (`UreqTransport` by
//!   default) and exposes `groups()` / `members()` for one-call usage.
//! - The access token travels as the `token` query parameter.
//!
//! ```no_run
//! use groupme_core::GroupMe;
//!
//! let api = GroupMe::new("ACCESS_TOKEN")?;
//! for group in api.groups().list(None)? {
//!     println!("{} {}", group.id, group.name);
//! }
//! # Ok::<(), groupme_core::ApiError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
mod groups;
pub mod http;
mod members;
pub mod service;
pub mod types;

pub use client::GroupMeClient;
pub use config::ClientConfig;
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use service::{GroupMe, GroupsService, MembersService};
pub use types::{
    AddMembersJob, Attachment, ChangeOwnerRequest, ChangeOwnerResult, Group, GroupParams, ListOptions,
    Member, MemberAddState, MessagePreview, MessageSummary,
};
