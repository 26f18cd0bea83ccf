use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

const TEMP_PREFIX: &str = "temp-";

macro_rules! id_type {
    ($($name:ident),*) => {$(
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Ids handed out locally for optimistic entities.
            pub fn is_temp(&self) -> bool {
                self.0.starts_with(TEMP_PREFIX)
            }

            pub fn temp(seq: u64) -> Self {
                Self(format!("{TEMP_PREFIX}{seq}"))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    )*};
}

id_type!(UserId, PostId, ChatId, MessageId);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformRole {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: PlatformRole,
}

impl PlatformRole {
    pub fn label(self) -> &'static str {
        match self {
            PlatformRole::User => "user",
            PlatformRole::Admin => "admin",
        }
    }
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == PlatformRole::Admin
    }

    pub fn initial(&self) -> String {
        initial(&self.name)
    }
}

/// Upper-cased first letter of a display name, for avatars.
pub fn initial(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: PlatformRole,
}

impl From<&Profile> for Author {
    fn from(profile: &Profile) -> Self {
        Author {
            name: profile.name.clone(),
            email: profile.email.clone(),
            role: profile.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id", alias = "id")]
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author: Author,
    #[serde(default)]
    pub likes: BTreeSet<UserId>,
}

impl Post {
    /// Returns whether the user likes the post afterwards.
    pub fn toggle_like(&mut self, user: &UserId) -> bool {
        if self.likes.remove(user) {
            false
        } else {
            self.likes.insert(user.clone());
            true
        }
    }

    pub fn liked_by(&self, user: &UserId) -> bool {
        self.likes.contains(user)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    Admin,
    #[default]
    Member,
}

impl ChatRole {
    pub fn label(self) -> &'static str {
        match self {
            ChatRole::Admin => "admin",
            ChatRole::Member => "member",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ChatRole::Admin => ChatRole::Member,
            ChatRole::Member => ChatRole::Admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user: UserId,
    pub role: ChatRole,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Sent,
    Read,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender: UserId,
    pub text: String,
    pub status: MessageStatus,
    /// Assigned by the server; `None` while the message is pending.
    pub created_at: Option<DateTime<Utc>>,
    pub read_by: BTreeSet<UserId>,
}

impl Message {
    pub fn pending(id: MessageId, sender: UserId, text: String) -> Self {
        Message {
            id,
            sender,
            text,
            status: MessageStatus::Sent,
            created_at: None,
            read_by: BTreeSet::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.id.is_temp()
    }

    pub fn is_unread_for(&self, user: &UserId) -> bool {
        &self.sender != user && !self.read_by.contains(user)
    }

    /// Whether opening the chat should send a read acknowledgement for this message.
    pub fn needs_ack_from(&self, user: &UserId) -> bool {
        self.status == MessageStatus::Sent && !self.is_pending() && self.is_unread_for(user)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: ChatId,
    pub name: Option<String>,
    pub is_group: bool,
    pub members: Vec<Member>,
    pub messages: Vec<Message>,
}

impl Chat {
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.messages.last().and_then(|message| message.created_at)
    }

    pub fn role_of(&self, user: &UserId) -> Option<ChatRole> {
        self.members
            .iter()
            .find(|member| &member.user == user)
            .map(|member| member.role)
    }

    pub fn is_admin(&self, user: &UserId) -> bool {
        self.role_of(user) == Some(ChatRole::Admin)
    }

    pub fn unread_count(&self, user: &UserId) -> usize {
        self.messages
            .iter()
            .filter(|message| message.is_unread_for(user))
            .count()
    }

    /// Explicit name, or the other member's name for a direct chat.
    pub fn title(&self, me: &UserId, directory: &Directory) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let others: Vec<String> = self
            .members
            .iter()
            .filter(|member| &member.user != me)
            .map(|member| directory.name_of(&member.user))
            .collect();
        if others.is_empty() {
            "Chat".to_owned()
        } else {
            others.join(", ")
        }
    }

    pub(crate) fn upsert_message(&mut self, message: Message) {
        match self.messages.iter_mut().find(|m| m.id == message.id) {
            Some(slot) => *slot = message,
            None => self.messages.push(message),
        }
    }
}

/// Group chats have several invitees or an explicit name.
pub fn is_group_chat(invitees: usize, name: Option<&str>) -> bool {
    invitees > 1 || name.is_some_and(|name| !name.trim().is_empty())
}

/// Most recent activity first, chats without messages last, server order on ties.
pub fn sort_chats(chats: &mut [Chat]) {
    chats.sort_by_key(|chat| Reverse(chat.last_activity()));
}

#[derive(Debug, Clone, Default)]
pub struct Directory {
    profiles: HashMap<UserId, Profile>,
}

impl Directory {
    pub fn name_of(&self, id: &UserId) -> String {
        self.profiles
            .get(id)
            .map(|profile| profile.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn insert(&mut self, profile: Profile) {
        self.profiles.insert(profile.id.clone(), profile);
    }

    pub fn extend(&mut self, profiles: impl IntoIterator<Item = Profile>) {
        for profile in profiles {
            self.insert(profile);
        }
    }

    /// Everyone but `me`, sorted by name.
    pub fn others(&self, me: &UserId) -> Vec<Profile> {
        let mut others: Vec<Profile> = self
            .profiles
            .values()
            .filter(|profile| &profile.id != me)
            .cloned()
            .collect();
        others.sort_by(|a, b| a.name.cmp(&b.name));
        others
    }

    pub fn clear(&mut self) {
        self.profiles.clear();
    }
}

/// A server payload together with the profiles embedded in it.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    pub profiles: Vec<Profile>,
}

impl<T> Resolved<T> {
    pub fn bare(value: T) -> Self {
        Resolved {
            value,
            profiles: Vec::new(),
        }
    }
}
