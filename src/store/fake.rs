//! In-memory DreamNet server used by the store tests.

use crate::api::wire::{AuthOutcome, NewChat};
use crate::api::Remote;
use crate::error::{Error, Result};
use crate::state::{
    Author, Chat, ChatId, ChatRole, Member, Message, MessageId, MessageStatus, PlatformRole, Post,
    PostId, Profile, Resolved, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::cell::RefCell;
use futures::channel::oneshot;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

pub const PASSWORD: &str = "secret";

#[derive(Default)]
pub struct Server {
    pub users: Vec<Profile>,
    pub passwords: HashMap<String, String>,
    pub sessions: HashMap<String, UserId>,
    pub posts: Vec<Post>,
    pub chats: Vec<Chat>,
    pub failing: HashMap<&'static str, Error>,
    pub calls: Vec<&'static str>,
    held: HashMap<&'static str, oneshot::Receiver<()>>,
    clock: i64,
    ids: u64,
}

impl Server {
    fn id(&mut self, prefix: &str) -> String {
        self.ids += 1;
        format!("{prefix}{}", self.ids)
    }

    fn now(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        Utc.timestamp_opt(1_700_000_000 + self.clock, 0).unwrap()
    }

    fn profile(&self, id: &UserId) -> Profile {
        self.users.iter().find(|user| &user.id == id).cloned().unwrap()
    }

    fn chat_mut(&mut self, chat: &ChatId, user: &UserId) -> Result<&mut Chat> {
        self.chats
            .iter_mut()
            .find(|c| &c.id == chat && c.role_of(user).is_some())
            .ok_or_else(|| Error::Server("Chat not found".into()))
    }
}

/// Answer of a held call; dropping it releases the call too.
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    pub fn open(self) {
        let _ = self.0.send(());
    }
}

/// Clones share the same server, so two stores can talk to each other.
#[derive(Clone, Default)]
pub struct FakeRemote {
    pub server: Rc<RefCell<Server>>,
}

impl FakeRemote {
    /// Users `u-<name>` with email `<name>@dream.net`; `admin` gets the admin role.
    pub fn with_users(names: &[&str]) -> Self {
        let remote = FakeRemote::default();
        {
            let mut server = remote.server.borrow_mut();
            for name in names {
                let email = format!("{name}@dream.net");
                server.users.push(Profile {
                    id: UserId::new(format!("u-{name}")),
                    name: name.to_string(),
                    email: email.clone(),
                    role: if *name == "admin" { PlatformRole::Admin } else { PlatformRole::User },
                });
                server.passwords.insert(email, PASSWORD.to_owned());
            }
        }
        remote
    }

    pub fn fail(&self, call: &'static str) {
        self.fail_with(call, Error::Network("connection reset".into()));
    }

    pub fn fail_with(&self, call: &'static str, err: Error) {
        self.server.borrow_mut().failing.insert(call, err);
    }

    pub fn heal(&self, call: &'static str) {
        self.server.borrow_mut().failing.remove(call);
    }

    /// The next `call` does its work on the server at once but only answers
    /// once the returned gate opens.
    pub fn hold(&self, call: &'static str) -> Gate {
        let (open, wait) = oneshot::channel();
        self.server.borrow_mut().held.insert(call, wait);
        Gate(open)
    }

    pub fn calls(&self, call: &str) -> usize {
        self.server.borrow().calls.iter().filter(|c| **c == call).count()
    }

    pub fn add_post(&self, id: &str, author: &str) -> PostId {
        let mut server = self.server.borrow_mut();
        let author = server.profile(&UserId::new(format!("u-{author}")));
        let id = PostId::new(id);
        server.posts.insert(
            0,
            Post {
                id: id.clone(),
                title: format!("title {id}"),
                content: format!("content {id}"),
                author: Author::from(&author),
                likes: BTreeSet::new(),
            },
        );
        id
    }

    pub fn message_status(&self, chat: &ChatId, message: &MessageId) -> MessageStatus {
        let server = self.server.borrow();
        let chat = server.chats.iter().find(|c| &c.id == chat).unwrap();
        chat.messages.iter().find(|m| &m.id == message).unwrap().status
    }

    fn enter(&self, call: &'static str) -> Result<()> {
        let mut server = self.server.borrow_mut();
        server.calls.push(call);
        if let Some(err) = server.failing.get(call) {
            return Err(err.clone());
        }
        Ok(())
    }

    async fn reply<T>(&self, call: &'static str, reply: Result<T>) -> Result<T> {
        let held = self.server.borrow_mut().held.remove(call);
        if let Some(wait) = held {
            let _ = wait.await;
        }
        reply
    }

    fn user(&self, token: &str) -> Result<UserId> {
        self.server
            .borrow()
            .sessions
            .get(token)
            .cloned()
            .ok_or(Error::Unauthorized)
    }

    fn open_session(&self, email: &str) -> String {
        let mut server = self.server.borrow_mut();
        let user = server.users.iter().find(|u| u.email == email).unwrap().id.clone();
        let token = format!("token-{}", server.id(""));
        server.sessions.insert(token.clone(), user);
        token
    }

    fn insert_post(&self, token: &str, title: &str, content: &str) -> Result<Post> {
        let user = self.user(token)?;
        let mut server = self.server.borrow_mut();
        let author = Author::from(&server.profile(&user));
        let post = Post {
            id: PostId::new(server.id("p")),
            title: title.to_owned(),
            content: content.to_owned(),
            author,
            likes: BTreeSet::new(),
        };
        server.posts.insert(0, post.clone());
        Ok(post)
    }

    fn insert_chat(&self, token: &str, request: &NewChat) -> Result<Resolved<Chat>> {
        let user = self.user(token)?;
        let mut server = self.server.borrow_mut();
        let mut members = vec![Member { user: user.clone(), role: ChatRole::Admin }];
        members.extend(request.users.iter().map(|id| Member { user: id.clone(), role: ChatRole::Member }));
        let chat = Chat {
            id: ChatId::new(server.id("c")),
            name: request.name.clone(),
            is_group: request.is_chat_mode,
            members,
            messages: Vec::new(),
        };
        server.chats.push(chat.clone());
        let creator = server.profile(&user);
        Ok(Resolved { value: chat, profiles: vec![creator] })
    }

    fn insert_message(&self, token: &str, chat: &ChatId, text: &str) -> Result<Resolved<Message>> {
        let user = self.user(token)?;
        let mut server = self.server.borrow_mut();
        let id = MessageId::new(server.id("m"));
        let now = server.now();
        let message = Message {
            id,
            sender: user.clone(),
            text: text.to_owned(),
            status: MessageStatus::Sent,
            created_at: Some(now),
            read_by: BTreeSet::new(),
        };
        server.chat_mut(chat, &user)?.messages.push(message.clone());
        Ok(Resolved::bare(message))
    }

    fn replace_text(
        &self,
        token: &str,
        chat: &ChatId,
        message: &MessageId,
        text: &str,
    ) -> Result<Resolved<Message>> {
        let user = self.user(token)?;
        let mut server = self.server.borrow_mut();
        let message = server
            .chat_mut(chat, &user)?
            .messages
            .iter_mut()
            .find(|m| &m.id == message && m.sender == user)
            .ok_or_else(|| Error::Server("Message not found".into()))?;
        message.text = text.to_owned();
        Ok(Resolved::bare(message.clone()))
    }
}

#[async_trait(?Send)]
impl Remote for FakeRemote {
    async fn login(&self, email: &str, password: &str) -> Result<String> {
        self.enter("login")?;
        let known = self.server.borrow().passwords.get(email).cloned();
        match known {
            Some(known) if known == password => Ok(self.open_session(email)),
            _ => Err(Error::Server("Invalid email or password".into())),
        }
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<String> {
        self.enter("register")?;
        {
            let mut server = self.server.borrow_mut();
            if server.passwords.contains_key(email) {
                return Err(Error::Server("User already exists".into()));
            }
            let id = UserId::new(server.id("u-"));
            server.users.push(Profile {
                id,
                name: name.to_owned(),
                email: email.to_owned(),
                role: PlatformRole::User,
            });
            server.passwords.insert(email.to_owned(), password.to_owned());
        }
        Ok(self.open_session(email))
    }

    async fn me(&self, token: &str) -> Result<Profile> {
        self.enter("me")?;
        let user = self.user(token)?;
        Ok(self.server.borrow().profile(&user))
    }

    async fn verify_email(&self, code: &str) -> Result<AuthOutcome> {
        self.enter("verify_email")?;
        let Some(name) = code.strip_prefix("verify-") else {
            return Err(Error::Server("Invalid or expired link".into()));
        };
        let token = self.open_session(&format!("{name}@dream.net"));
        Ok(AuthOutcome {
            success: true,
            message: "Email confirmed".into(),
            token: Some(token),
            redirect: None,
        })
    }

    async fn reset_password(&self, code: &str, password: &str) -> Result<AuthOutcome> {
        self.enter("reset_password")?;
        let Some(name) = code.strip_prefix("reset-") else {
            return Ok(AuthOutcome {
                success: false,
                message: "Link expired".into(),
                ..AuthOutcome::default()
            });
        };
        let email = format!("{name}@dream.net");
        self.server
            .borrow_mut()
            .passwords
            .insert(email.clone(), password.to_owned());
        Ok(AuthOutcome {
            success: true,
            message: "Password changed".into(),
            token: Some(self.open_session(&email)),
            redirect: None,
        })
    }

    async fn posts(&self, _token: Option<&str>) -> Result<Vec<Post>> {
        self.enter("posts")?;
        Ok(self.server.borrow().posts.clone())
    }

    async fn create_post(&self, token: &str, title: &str, content: &str) -> Result<Post> {
        self.enter("create_post")?;
        let post = self.insert_post(token, title, content);
        self.reply("create_post", post).await
    }

    async fn like_post(&self, token: &str, post: &PostId) -> Result<()> {
        self.enter("like_post")?;
        let user = self.user(token)?;
        let mut server = self.server.borrow_mut();
        let post = server
            .posts
            .iter_mut()
            .find(|p| &p.id == post)
            .ok_or_else(|| Error::Server("Post not found".into()))?;
        post.toggle_like(&user);
        Ok(())
    }

    async fn delete_post(&self, token: &str, post: &PostId) -> Result<()> {
        self.enter("delete_post")?;
        let user = self.user(token)?;
        let mut server = self.server.borrow_mut();
        let profile = server.profile(&user);
        let index = server
            .posts
            .iter()
            .position(|p| &p.id == post)
            .ok_or_else(|| Error::Server("Post not found".into()))?;
        if server.posts[index].author.email != profile.email && !profile.is_admin() {
            return Err(Error::Server("You can only delete your own posts".into()));
        }
        server.posts.remove(index);
        Ok(())
    }

    async fn users(&self, token: &str) -> Result<Vec<Profile>> {
        self.enter("users")?;
        self.user(token)?;
        Ok(self.server.borrow().users.clone())
    }

    async fn chats(&self, token: &str) -> Result<Resolved<Vec<Chat>>> {
        self.enter("chats")?;
        let user = self.user(token)?;
        let chats = self
            .server
            .borrow()
            .chats
            .iter()
            .filter(|chat| chat.role_of(&user).is_some())
            .cloned()
            .collect();
        Ok(Resolved::bare(chats))
    }

    async fn create_chat(&self, token: &str, request: &NewChat) -> Result<Resolved<Chat>> {
        self.enter("create_chat")?;
        let chat = self.insert_chat(token, request);
        self.reply("create_chat", chat).await
    }

    async fn rename_chat(&self, token: &str, chat: &ChatId, name: &str) -> Result<Resolved<Chat>> {
        self.enter("rename_chat")?;
        let user = self.user(token)?;
        let mut server = self.server.borrow_mut();
        let chat = server.chat_mut(chat, &user)?;
        chat.name = Some(name.to_owned());
        Ok(Resolved::bare(chat.clone()))
    }

    async fn delete_chat(&self, token: &str, chat: &ChatId) -> Result<()> {
        self.enter("delete_chat")?;
        let user = self.user(token)?;
        let mut server = self.server.borrow_mut();
        server.chat_mut(chat, &user)?;
        server.chats.retain(|c| &c.id != chat);
        Ok(())
    }

    async fn messages(&self, token: &str, chat: &ChatId) -> Result<Resolved<Vec<Message>>> {
        self.enter("messages")?;
        let user = self.user(token)?;
        let mut server = self.server.borrow_mut();
        Ok(Resolved::bare(server.chat_mut(chat, &user)?.messages.clone()))
    }

    async fn send_message(&self, token: &str, chat: &ChatId, text: &str) -> Result<Resolved<Message>> {
        self.enter("send_message")?;
        let message = self.insert_message(token, chat, text);
        self.reply("send_message", message).await
    }

    async fn edit_message(
        &self,
        token: &str,
        chat: &ChatId,
        message: &MessageId,
        text: &str,
    ) -> Result<Resolved<Message>> {
        self.enter("edit_message")?;
        let edited = self.replace_text(token, chat, message, text);
        self.reply("edit_message", edited).await
    }

    async fn delete_message(&self, token: &str, chat: &ChatId, message: &MessageId) -> Result<()> {
        self.enter("delete_message")?;
        let user = self.user(token)?;
        let mut server = self.server.borrow_mut();
        server.chat_mut(chat, &user)?.messages.retain(|m| &m.id != message);
        Ok(())
    }

    async fn mark_read(&self, token: &str, chat: &ChatId, message: &MessageId) -> Result<()> {
        self.enter("mark_read")?;
        let user = self.user(token)?;
        let mut server = self.server.borrow_mut();
        let chat = server.chat_mut(chat, &user)?;
        let recipients: Vec<UserId> = chat.members.iter().map(|m| m.user.clone()).collect();
        let message = chat
            .messages
            .iter_mut()
            .find(|m| &m.id == message)
            .ok_or_else(|| Error::Server("Message not found".into()))?;
        message.read_by.insert(user);
        if recipients
            .iter()
            .filter(|r| **r != message.sender)
            .all(|r| message.read_by.contains(r))
        {
            message.status = MessageStatus::Read;
        }
        Ok(())
    }

    async fn add_member(&self, token: &str, chat: &ChatId, user: &UserId) -> Result<()> {
        self.enter("add_member")?;
        let me = self.user(token)?;
        let mut server = self.server.borrow_mut();
        let chat = server.chat_mut(chat, &me)?;
        if chat.role_of(user).is_none() {
            chat.members.push(Member { user: user.clone(), role: ChatRole::Member });
        }
        Ok(())
    }

    async fn remove_member(&self, token: &str, chat: &ChatId, user: &UserId) -> Result<()> {
        self.enter("remove_member")?;
        let me = self.user(token)?;
        let mut server = self.server.borrow_mut();
        let chat = server.chat_mut(chat, &me)?;
        if !chat.is_admin(&me) {
            return Err(Error::Server("Only admins can remove members".into()));
        }
        chat.members.retain(|m| &m.user != user);
        Ok(())
    }

    async fn change_role(&self, token: &str, chat: &ChatId, user: &UserId, role: ChatRole) -> Result<()> {
        self.enter("change_role")?;
        let me = self.user(token)?;
        let mut server = self.server.borrow_mut();
        let chat = server.chat_mut(chat, &me)?;
        let member = chat
            .members
            .iter_mut()
            .find(|m| &m.user == user)
            .ok_or_else(|| Error::Server("Not a member".into()))?;
        member.role = role;
        Ok(())
    }
}
