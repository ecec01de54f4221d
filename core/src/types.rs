//! Domain DTOs for the GroupMe API.
//!
//! # Design
//! Response types are read-only snapshots of server state. The service omits
//! or nulls many fields depending on endpoint and account, so nearly every
//! field tolerates absence or `null` (`null_as_default` or `Option`). IDs stay
//! `String` even though the service renders them as digits.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Reads an explicit `null` as the type's default, like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A group as returned by the group endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub creator_user_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub members: Vec<Member>,
    #[serde(default)]
    pub share_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: MessageSummary,
}

/// Message statistics and a preview of the latest message in a group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
    #[serde(default)]
    pub last_message_id: Option<String>,
    #[serde(default)]
    pub last_message_created_at: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preview: MessagePreview,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessagePreview {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
}

/// A message attachment, tagged by its `type` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Attachment {
    Image {
        url: String,
    },
    LinkedImage {
        url: String,
    },
    Location {
        lat: String,
        lng: String,
        #[serde(default)]
        name: Option<String>,
    },
    Mentions {
        #[serde(default)]
        user_ids: Vec<String>,
        /// `[offset, length]` pairs into the message text.
        #[serde(default)]
        loci: Vec<[u32; 2]>,
    },
    Emoji {
        placeholder: String,
        /// `[pack_id, offset]` pairs, one per placeholder occurrence.
        #[serde(default)]
        charmap: Vec<[u32; 2]>,
    },
    Split {
        token: String,
    },
    /// Any attachment kind this crate does not know about yet.
    ///
    /// The original `type` and fields are dropped; serializing this
    /// variant writes `{"type":"unknown"}`.
    #[serde(other)]
    Unknown,
}

/// A membership in a group, or a prospective member to add.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub nickname: String,
    /// Membership id, distinct from the user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autokicked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_installed: Option<bool>,
    /// Caller-chosen idempotency token for member-add requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Member {
    /// A member to submit to `add`, with a fresh v4 guid.
    ///
    /// Identify the person with one of `user_id`, `phone_number` or `email`.
    pub fn prospective(nickname: &str) -> Self {
        Self {
            nickname: nickname.to_string(),
            guid: Some(Uuid::new_v4().to_string()),
            ..Self::default()
        }
    }

    pub fn with_user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn with_phone_number(mut self, phone_number: &str) -> Self {
        self.phone_number = Some(phone_number.to_string());
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }
}

/// Pagination for the group index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub page: u32,
    pub per_page: u32,
    /// Comma-separated fields to leave out, e.g. `"memberships"`.
    pub omit: String,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
            omit: String::new(),
        }
    }
}

/// Payload for creating or updating a group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupParams {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub share: bool,
    #[serde(default)]
    pub office_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeOwnerRequest {
    pub group_id: String,
    pub owner_id: String,
}

/// Outcome of one ownership change. `status` is a string status code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeOwnerResult {
    pub group_id: String,
    pub owner_id: String,
    pub status: String,
}

impl ChangeOwnerResult {
    pub fn is_success(&self) -> bool {
        self.status == "200"
    }
}

/// Handle to a pending member-add job.
///
/// Only a reference to server-side work: it expires on the server's schedule
/// and owns nothing locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddMembersJob {
    pub group_id: String,
    pub results_id: String,
}

/// Where a member-add job stands after the last poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberAddState {
    /// Submitted, not polled yet.
    Requested,
    /// The server resolved the job; these are the added memberships.
    Ready(Vec<Member>),
    /// Still processing; poll again later.
    NotReady,
    /// The results are gone and cannot be fetched any more.
    Expired,
}

impl MemberAddState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MemberAddState::Ready(_) | MemberAddState::Expired)
    }
}
