use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Permission level. Ordinals are ordered: a higher role holds every
/// permission of the lower ones.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User = 1,
    Admin = 2,
    SuperAdmin = 3,
}

impl Role {
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "super-admin",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            "super-admin" | "super_admin" | "superadmin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    /// Numeric role ids are the ordinals themselves. This is the only
    /// id-to-role table in the crate.
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Role::User),
            2 => Some(Role::Admin),
            3 => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    pub fn includes(self, required: Role) -> bool {
        self.ordinal() >= required.ordinal()
    }
}

/// Role object attached to users by the API.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleRef {
    pub id: i64,
    pub label: String,
}

impl RoleRef {
    pub fn resolve(&self) -> Option<Role> {
        Role::from_label(&self.label).or_else(|| Role::from_id(self.id))
    }
}

/// Menu entries carry their gate either as a role id or as a label.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequiredRole {
    Id(i64),
    Label(String),
}

impl RequiredRole {
    pub fn resolve(&self) -> Option<Role> {
        match self {
            RequiredRole::Id(id) => Role::from_id(*id),
            RequiredRole::Label(label) => Role::from_label(label),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: i64,
    pub label: String,
    pub slug: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub required_role: Option<RequiredRole>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuItem {
    pub label: String,
    pub slug: String,
    pub order: i64,
    pub page_id: i64,
    pub is_public: bool,
    pub required_role: Option<RequiredRole>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockKind {
    Text { html: String },
    Image { url: String },
    Video { url: String },
}

impl BlockKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            BlockKind::Text { .. } => "text",
            BlockKind::Image { .. } => "image",
            BlockKind::Video { .. } => "video",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            BlockKind::Text { html } => html,
            BlockKind::Image { url } | BlockKind::Video { url } => url,
        }
    }

    pub fn from_parts(tag: &str, content: String) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "text" => Some(BlockKind::Text { html: content }),
            "image" => Some(BlockKind::Image { url: content }),
            "video" => Some(BlockKind::Video { url: content }),
            _ => None,
        }
    }

    /// Same content under another block type.
    pub fn retag(&self, tag: &str) -> Option<Self> {
        Self::from_parts(tag, self.content().to_string())
    }

    pub fn with_content(&self, content: String) -> Self {
        match self {
            BlockKind::Text { .. } => BlockKind::Text { html: content },
            BlockKind::Image { .. } => BlockKind::Image { url: content },
            BlockKind::Video { .. } => BlockKind::Video { url: content },
        }
    }
}

/// One renderable unit of a page. `id` is the server-assigned identity and
/// is `None` until the block has been created remotely.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "WireBlock", into = "WireBlock")]
pub struct ContentBlock {
    pub id: Option<i64>,
    pub kind: BlockKind,
    pub order: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct WireBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    order: u32,
}

impl TryFrom<WireBlock> for ContentBlock {
    type Error = String;

    fn try_from(wire: WireBlock) -> Result<Self, Self::Error> {
        let kind = BlockKind::from_parts(&wire.kind, wire.content)
            .ok_or_else(|| format!("unknown block type `{}`", wire.kind))?;
        Ok(ContentBlock {
            id: wire.id,
            kind,
            order: wire.order,
        })
    }
}

impl From<ContentBlock> for WireBlock {
    fn from(block: ContentBlock) -> Self {
        WireBlock {
            id: block.id,
            kind: block.kind.type_tag().to_string(),
            content: block.kind.content().to_string(),
            order: block.order,
        }
    }
}

/// Body for `POST content-blocks` and `PUT content-blocks/:id`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPayload<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub content: &'a str,
    pub order: u32,
    pub page_id: i64,
}

impl<'a> BlockPayload<'a> {
    pub fn new(block: &'a ContentBlock, page_id: i64) -> Self {
        Self {
            kind: block.kind.type_tag(),
            content: block.kind.content(),
            order: block.order,
            page_id,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl Page {
    pub fn sorted_blocks(&self) -> Vec<&ContentBlock> {
        let mut blocks: Vec<&ContentBlock> = self.content.iter().collect();
        blocks.sort_by_key(|b| b.order);
        blocks
    }
}

#[derive(Debug, Serialize)]
pub struct PagePayload<'a> {
    pub title: &'a str,
    pub slug: &'a str,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub label: String,
    pub score: u32,
    pub questionnaire_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload<'a> {
    pub label: &'a str,
    pub score: u32,
    pub questionnaire_id: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Questionnaire {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body for `POST user-responses`. The API stores the selection as a
/// JSON-encoded array string.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSubmission {
    pub user_id: i64,
    pub questionnaire_id: i64,
    #[serde(with = "selected_events")]
    pub selected_events: Vec<i64>,
    pub total_score: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(default)]
    pub id: Option<i64>,
    pub user_id: i64,
    pub questionnaire_id: i64,
    #[serde(default, with = "selected_events")]
    pub selected_events: Vec<i64>,
    pub total_score: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_message: Option<String>,
}

mod selected_events {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ids: &[i64], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = serde_json::to_string(ids).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Encoded(String),
        List(Vec<i64>),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<i64>, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::List(ids) => Ok(ids),
            Raw::Encoded(s) if s.trim().is_empty() => Ok(Vec::new()),
            Raw::Encoded(s) => serde_json::from_str(&s).map_err(de::Error::custom),
        }
    }
}

fn default_active() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    pub email: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub role: RoleRef,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        self.role.resolve()
    }

}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub is_active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub users_count: u64,
    pub content_count: u64,
    pub questionnaire_count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Minimal view of a freshly created resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Created {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub firstname: String,
    pub lastname: String,
    #[serde(default, skip_serializing, rename = "passwordConfirm")]
    pub password_confirm: String,
}
