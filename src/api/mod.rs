pub mod wire;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::state::{Chat, ChatId, ChatRole, Message, MessageId, Post, PostId, Profile, Resolved, UserId};
use async_trait::async_trait;
use log::debug;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;
use wire::{
    AuthOutcome, Credentials, ErrorBody, NameBody, NewChat, NewPost, PasswordBody, RoleBody,
    TextBody, TokenResponse, WireChat, WireMessage,
};

/// The DreamNet REST service.
///
/// Every authenticated call takes the bearer token explicitly; the store never
/// issues one of these without a stored token.
#[async_trait(?Send)]
pub trait Remote {
    async fn login(&self, email: &str, password: &str) -> Result<String>;
    async fn register(&self, name: &str, email: &str, password: &str) -> Result<String>;
    async fn me(&self, token: &str) -> Result<Profile>;
    async fn verify_email(&self, code: &str) -> Result<AuthOutcome>;
    async fn reset_password(&self, code: &str, password: &str) -> Result<AuthOutcome>;

    async fn posts(&self, token: Option<&str>) -> Result<Vec<Post>>;
    async fn create_post(&self, token: &str, title: &str, content: &str) -> Result<Post>;
    async fn like_post(&self, token: &str, post: &PostId) -> Result<()>;
    async fn delete_post(&self, token: &str, post: &PostId) -> Result<()>;

    async fn users(&self, token: &str) -> Result<Vec<Profile>>;

    async fn chats(&self, token: &str) -> Result<Resolved<Vec<Chat>>>;
    async fn create_chat(&self, token: &str, chat: &NewChat) -> Result<Resolved<Chat>>;
    async fn rename_chat(&self, token: &str, chat: &ChatId, name: &str) -> Result<Resolved<Chat>>;
    async fn delete_chat(&self, token: &str, chat: &ChatId) -> Result<()>;

    async fn messages(&self, token: &str, chat: &ChatId) -> Result<Resolved<Vec<Message>>>;
    async fn send_message(&self, token: &str, chat: &ChatId, text: &str) -> Result<Resolved<Message>>;
    async fn edit_message(
        &self,
        token: &str,
        chat: &ChatId,
        message: &MessageId,
        text: &str,
    ) -> Result<Resolved<Message>>;
    async fn delete_message(&self, token: &str, chat: &ChatId, message: &MessageId) -> Result<()>;
    async fn mark_read(&self, token: &str, chat: &ChatId, message: &MessageId) -> Result<()>;

    async fn add_member(&self, token: &str, chat: &ChatId, user: &UserId) -> Result<()>;
    async fn remove_member(&self, token: &str, chat: &ChatId, user: &UserId) -> Result<()>;
    async fn change_role(&self, token: &str, chat: &ChatId, user: &UserId, role: ChatRole) -> Result<()>;
}

pub struct HttpRemote {
    client: Client,
    base: Url,
    timeout: Duration,
}

impl HttpRemote {
    pub fn new(config: &Config) -> Self {
        HttpRemote {
            client: Client::new(),
            base: config.api_url.clone(),
            timeout: config.request_timeout,
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Config(format!("{} cannot be used as a base url", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str], token: Option<&str>) -> Result<RequestBuilder> {
        let url = self.url(segments)?;
        debug!("{method} {url}");
        let mut request = self.client.request(method, url).timeout(self.timeout);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        Ok(request)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = request.build()?;
        let authenticated = request.headers().contains_key(AUTHORIZATION);
        let res = self.client.execute(request).await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let message = res
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message);
        Err(Error::from_status(status, message, authenticated))
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        Ok(self.send(request).await?.json().await?)
    }

    async fn empty(&self, request: RequestBuilder) -> Result<()> {
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl Remote for HttpRemote {
    async fn login(&self, email: &str, password: &str) -> Result<String> {
        let body = Credentials { name: None, email, password };
        let request = self.request(Method::POST, &["auth", "login"], None)?.json(&body);
        let res: TokenResponse = self.json(request).await?;
        Ok(res.token)
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<String> {
        let body = Credentials { name: Some(name), email, password };
        let request = self.request(Method::POST, &["auth", "register"], None)?.json(&body);
        let res: TokenResponse = self.json(request).await?;
        Ok(res.token)
    }

    async fn me(&self, token: &str) -> Result<Profile> {
        self.json(self.request(Method::GET, &["auth", "me"], Some(token))?).await
    }

    async fn verify_email(&self, code: &str) -> Result<AuthOutcome> {
        self.json(self.request(Method::POST, &["auth", "email-verify", code], None)?).await
    }

    async fn reset_password(&self, code: &str, password: &str) -> Result<AuthOutcome> {
        let request = self
            .request(Method::POST, &["auth", "reset-password", code], None)?
            .json(&PasswordBody { password });
        self.json(request).await
    }

    async fn posts(&self, token: Option<&str>) -> Result<Vec<Post>> {
        self.json(self.request(Method::GET, &["posts"], token)?).await
    }

    async fn create_post(&self, token: &str, title: &str, content: &str) -> Result<Post> {
        let request = self
            .request(Method::POST, &["post", "create"], Some(token))?
            .json(&NewPost { title, content });
        self.json(request).await
    }

    async fn like_post(&self, token: &str, post: &PostId) -> Result<()> {
        self.empty(self.request(Method::PUT, &["post", post.as_str(), "like"], Some(token))?).await
    }

    async fn delete_post(&self, token: &str, post: &PostId) -> Result<()> {
        self.empty(self.request(Method::DELETE, &["post", post.as_str(), "delete"], Some(token))?)
            .await
    }

    async fn users(&self, token: &str) -> Result<Vec<Profile>> {
        self.json(self.request(Method::GET, &["users"], Some(token))?).await
    }

    async fn chats(&self, token: &str) -> Result<Resolved<Vec<Chat>>> {
        let chats: Vec<WireChat> = self.json(self.request(Method::GET, &["chats"], Some(token))?).await?;
        Ok(wire::chats(chats))
    }

    async fn create_chat(&self, token: &str, chat: &NewChat) -> Result<Resolved<Chat>> {
        let request = self.request(Method::POST, &["chats"], Some(token))?.json(chat);
        let chat: WireChat = self.json(request).await?;
        Ok(wire::chat(chat))
    }

    async fn rename_chat(&self, token: &str, chat: &ChatId, name: &str) -> Result<Resolved<Chat>> {
        let request = self
            .request(Method::PATCH, &["chats", chat.as_str()], Some(token))?
            .json(&NameBody { name });
        let chat: WireChat = self.json(request).await?;
        Ok(wire::chat(chat))
    }

    async fn delete_chat(&self, token: &str, chat: &ChatId) -> Result<()> {
        self.empty(self.request(Method::DELETE, &["chats", chat.as_str()], Some(token))?).await
    }

    async fn messages(&self, token: &str, chat: &ChatId) -> Result<Resolved<Vec<Message>>> {
        let request = self.request(Method::GET, &["chats", chat.as_str(), "messages"], Some(token))?;
        let messages: Vec<WireMessage> = self.json(request).await?;
        Ok(wire::messages(messages))
    }

    async fn send_message(&self, token: &str, chat: &ChatId, text: &str) -> Result<Resolved<Message>> {
        let request = self
            .request(Method::POST, &["chats", chat.as_str(), "messages"], Some(token))?
            .json(&TextBody { text });
        let message: WireMessage = self.json(request).await?;
        Ok(wire::message(message))
    }

    async fn edit_message(
        &self,
        token: &str,
        chat: &ChatId,
        message: &MessageId,
        text: &str,
    ) -> Result<Resolved<Message>> {
        let segments = ["chats", chat.as_str(), "messages", message.as_str(), "change"];
        let request = self
            .request(Method::PATCH, &segments, Some(token))?
            .json(&TextBody { text });
        let message: WireMessage = self.json(request).await?;
        Ok(wire::message(message))
    }

    async fn delete_message(&self, token: &str, chat: &ChatId, message: &MessageId) -> Result<()> {
        let segments = ["chats", chat.as_str(), "messages", message.as_str()];
        self.empty(self.request(Method::DELETE, &segments, Some(token))?).await
    }

    async fn mark_read(&self, token: &str, chat: &ChatId, message: &MessageId) -> Result<()> {
        let segments = ["chats", chat.as_str(), "messages", message.as_str(), "read"];
        self.empty(self.request(Method::PATCH, &segments, Some(token))?).await
    }

    async fn add_member(&self, token: &str, chat: &ChatId, user: &UserId) -> Result<()> {
        let segments = ["chats", chat.as_str(), "members", user.as_str()];
        self.empty(self.request(Method::PATCH, &segments, Some(token))?).await
    }

    async fn remove_member(&self, token: &str, chat: &ChatId, user: &UserId) -> Result<()> {
        let segments = ["chats", chat.as_str(), "members", user.as_str()];
        self.empty(self.request(Method::DELETE, &segments, Some(token))?).await
    }

    async fn change_role(&self, token: &str, chat: &ChatId, user: &UserId, role: ChatRole) -> Result<()> {
        let segments = ["chats", chat.as_str(), "members", user.as_str(), "role"];
        let request = self
            .request(Method::PATCH, &segments, Some(token))?
            .json(&RoleBody { role });
        self.empty(request).await
    }
}
