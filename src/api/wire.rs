//! JSON shapes exchanged with the DreamNet server.
//!
//! The server populates user references inconsistently: the same field may hold
//! a bare id or a full profile object. Everything is normalized here into ids,
//! and any embedded profiles are collected so the store can feed its directory.

use crate::state::{
    Chat, ChatId, ChatRole, Member, Message, MessageId, MessageStatus, PlatformRole, Profile,
    Resolved, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct NewPost<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChat {
    pub users: Vec<UserId>,
    pub is_chat_mode: bool,
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TextBody<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct NameBody<'a> {
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RoleBody {
    pub role: ChatRole,
}

#[derive(Debug, Serialize)]
pub struct PasswordBody<'a> {
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

/// Reply of the email verification and password reset endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuthOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub token: Option<String>,
    pub redirect: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(UserId),
    Embedded(EmbeddedUser),
}

#[derive(Debug, Deserialize)]
pub struct EmbeddedUser {
    #[serde(rename = "_id", alias = "id")]
    id: UserId,
    name: Option<String>,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: PlatformRole,
}

impl UserRef {
    fn resolve(self, profiles: &mut Vec<Profile>) -> UserId {
        match self {
            UserRef::Id(id) => id,
            UserRef::Embedded(user) => {
                if let Some(name) = user.name {
                    profiles.push(Profile {
                        id: user.id.clone(),
                        name,
                        email: user.email,
                        role: user.role,
                    });
                }
                user.id
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    #[serde(rename = "_id", alias = "id")]
    id: MessageId,
    sender: UserRef,
    #[serde(default)]
    text: String,
    #[serde(default)]
    status: MessageStatus,
    created_at: DateTime<Utc>,
    #[serde(default)]
    read_by: Vec<UserRef>,
}

impl WireMessage {
    fn resolve(self, profiles: &mut Vec<Profile>) -> Message {
        Message {
            id: self.id,
            sender: self.sender.resolve(profiles),
            text: self.text,
            status: self.status,
            created_at: Some(self.created_at),
            read_by: self
                .read_by
                .into_iter()
                .map(|user| user.resolve(profiles))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireMember {
    user: UserRef,
    #[serde(default)]
    role: ChatRole,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireChat {
    #[serde(rename = "_id", alias = "id")]
    id: ChatId,
    name: Option<String>,
    #[serde(default, alias = "isChatMode")]
    is_group: bool,
    #[serde(default)]
    members: Vec<WireMember>,
    #[serde(default)]
    messages: Vec<WireMessage>,
}

impl WireChat {
    fn resolve(self, profiles: &mut Vec<Profile>) -> Chat {
        Chat {
            id: self.id,
            name: self.name.filter(|name| !name.trim().is_empty()),
            is_group: self.is_group,
            members: self
                .members
                .into_iter()
                .map(|member| Member {
                    user: member.user.resolve(profiles),
                    role: member.role,
                })
                .collect(),
            messages: self
                .messages
                .into_iter()
                .map(|message| message.resolve(profiles))
                .collect(),
        }
    }
}

pub fn chat(wire: WireChat) -> Resolved<Chat> {
    let mut profiles = Vec::new();
    let value = wire.resolve(&mut profiles);
    Resolved { value, profiles }
}

pub fn chats(wire: Vec<WireChat>) -> Resolved<Vec<Chat>> {
    let mut profiles = Vec::new();
    let value = wire
        .into_iter()
        .map(|chat| chat.resolve(&mut profiles))
        .collect();
    Resolved { value, profiles }
}

pub fn message(wire: WireMessage) -> Resolved<Message> {
    let mut profiles = Vec::new();
    let value = wire.resolve(&mut profiles);
    Resolved { value, profiles }
}

pub fn messages(wire: Vec<WireMessage>) -> Resolved<Vec<Message>> {
    let mut profiles = Vec::new();
    let value = wire
        .into_iter()
        .map(|message| message.resolve(&mut profiles))
        .collect();
    Resolved { value, profiles }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_references_are_normalized() {
        let wire: Vec<WireMessage> = serde_json::from_value(json!([
            {
                "_id": "m1",
                "sender": "u1",
                "text": "hi",
                "status": "sent",
                "createdAt": "2024-05-01T10:00:00.000Z",
                "readBy": []
            },
            {
                "_id": "m2",
                "sender": { "_id": "u2", "name": "Boris", "email": "boris@dream.net" },
                "text": "hello",
                "status": "read",
                "createdAt": "2024-05-01T10:01:00.000Z",
                "readBy": ["u1", { "_id": "u3" }]
            }
        ]))
        .unwrap();
        let Resolved { value, profiles } = messages(wire);
        assert_eq!(value[0].sender, UserId::from("u1"));
        assert_eq!(value[1].sender, UserId::from("u2"));
        assert_eq!(value[1].status, MessageStatus::Read);
        assert!(value[1].read_by.contains(&UserId::from("u3")));
        assert!(value.iter().all(|message| message.created_at.is_some()));
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "Boris");
    }

    #[test]
    fn chat_defaults() {
        let wire: WireChat = serde_json::from_value(json!({
            "_id": "c1",
            "name": "",
            "members": [
                { "user": { "_id": "u1", "name": "Ann" }, "role": "admin" },
                { "user": "u2" }
            ]
        }))
        .unwrap();
        let Resolved { value, profiles } = chat(wire);
        assert_eq!(value.name, None);
        assert!(!value.is_group);
        assert!(value.messages.is_empty());
        assert_eq!(value.members[1].role, ChatRole::Member);
        assert!(value.is_admin(&"u1".into()));
        assert_eq!(profiles[0].id, UserId::from("u1"));
    }

    #[test]
    fn new_chat_body() {
        let body = NewChat {
            users: vec!["u2".into(), "u3".into()],
            is_chat_mode: true,
            name: None,
            message: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "users": ["u2", "u3"], "isChatMode": true, "name": null })
        );
    }

    #[test]
    fn login_body_omits_name() {
        let body = Credentials { name: None, email: "a@dream.net", password: "secret" };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "email": "a@dream.net", "password": "secret" })
        );
    }
}
