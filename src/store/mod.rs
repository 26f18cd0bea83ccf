//! Client-side state and its synchronization with the server.
//!
//! [`Store`] is a cheap, clonable handle to a single [`ClientState`]. Every
//! operation mutates the state optimistically, issues its request, then either
//! reconciles with the server's answer or runs its compensating action. State is
//! only borrowed between awaits, so other operations may run while a request is
//! outstanding; completions check the session epoch and the active chat before
//! writing anything back.

mod chats;
mod feed;
mod membership;
mod messages;
mod session;

#[cfg(test)]
pub(crate) mod fake;

use crate::api::Remote;
use crate::error::{Error, Result};
use crate::state::{Chat, ChatId, Directory, Message, Post, Profile, UserId};
use crate::storage::TokenStore;
use log::{info, warn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: Level,
    pub text: String,
}

/// Proof that the user explicitly acknowledged a destructive action.
#[derive(Debug, Clone, Copy)]
pub struct Confirmation(());

impl Confirmation {
    pub fn acknowledged() -> Self {
        Confirmation(())
    }
}

#[derive(Debug, Default)]
pub struct ClientState {
    /// Bumped whenever the session starts or ends; stale completions compare against it.
    pub epoch: u64,
    seq: u64,
    pub session: Option<Profile>,
    pub directory: Directory,
    pub posts: Vec<Post>,
    pub chats: Vec<Chat>,
    pub active_chat: Option<ChatId>,
    /// Messages of the active chat.
    pub messages: Vec<Message>,
    pub notices: Vec<Notice>,
}

impl ClientState {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    pub fn me(&self) -> Option<&UserId> {
        self.session.as_ref().map(|profile| &profile.id)
    }

    pub fn chat(&self, id: &ChatId) -> Option<&Chat> {
        self.chats.iter().find(|chat| &chat.id == id)
    }

    pub fn active(&self) -> Option<&Chat> {
        self.active_chat.as_ref().and_then(|id| self.chat(id))
    }

    fn is_viewing(&self, epoch: u64, chat: &ChatId) -> bool {
        self.epoch == epoch && self.active_chat.as_ref() == Some(chat)
    }

    fn push_notice(&mut self, level: Level, text: String) {
        let id = self.next_seq();
        self.notices.push(Notice { id, level, text });
    }

    /// Drops everything tied to the signed in user. The public feed stays.
    fn end_session(&mut self) {
        self.epoch += 1;
        self.session = None;
        self.directory.clear();
        self.chats.clear();
        self.active_chat = None;
        self.messages.clear();
    }
}

pub struct Store<R, T> {
    remote: Rc<R>,
    tokens: Rc<T>,
    state: Rc<RefCell<ClientState>>,
    polling: Rc<Cell<bool>>,
    on_change: Rc<dyn Fn()>,
}

impl<R, T> Clone for Store<R, T> {
    fn clone(&self) -> Self {
        Store {
            remote: self.remote.clone(),
            tokens: self.tokens.clone(),
            state: self.state.clone(),
            polling: self.polling.clone(),
            on_change: self.on_change.clone(),
        }
    }
}

impl<R: Remote, T: TokenStore> Store<R, T> {
    /// `on_change` runs after every state mutation, outside of any borrow.
    pub fn new(remote: R, tokens: T, on_change: impl Fn() + 'static) -> Self {
        Store {
            remote: Rc::new(remote),
            tokens: Rc::new(tokens),
            state: Rc::new(RefCell::new(ClientState::default())),
            polling: Rc::new(Cell::new(false)),
            on_change: Rc::new(on_change),
        }
    }

    pub fn read<O>(&self, f: impl FnOnce(&ClientState) -> O) -> O {
        f(&self.state.borrow())
    }

    fn update<O>(&self, f: impl FnOnce(&mut ClientState) -> O) -> O {
        let out = {
            let mut state = self.state.borrow_mut();
            f(&mut state)
        };
        (self.on_change)();
        out
    }

    pub fn is_signed_in(&self) -> bool {
        self.read(|state| state.session.is_some())
    }

    pub fn me(&self) -> Option<UserId> {
        self.read(|state| state.me().cloned())
    }

    fn epoch(&self) -> u64 {
        self.read(|state| state.epoch)
    }

    fn bearer(&self) -> Result<String> {
        self.tokens.load().ok_or(Error::NotSignedIn)
    }

    /// Signed in user and token, or `NotSignedIn` without touching the network.
    fn credentials(&self) -> Result<(UserId, String)> {
        let me = self.me().ok_or(Error::NotSignedIn)?;
        Ok((me, self.bearer()?))
    }

    pub fn info(&self, text: impl Into<String>) {
        let text = text.into();
        info!("{text}");
        self.update(|state| state.push_notice(Level::Info, text));
    }

    pub fn dismiss(&self, notice: u64) {
        self.update(|state| state.notices.retain(|n| n.id != notice));
    }

    /// Operation boundary: logs the failure and turns it into a notice. A 401
    /// also invalidates the stored credential and tears the session down.
    fn fail(&self, err: Error) -> Error {
        warn!("{err}");
        if err.is_unauthorized() {
            self.tokens.clear();
        }
        self.update(|state| {
            if err.is_unauthorized() {
                state.end_session();
            }
            state.push_notice(Level::Error, err.to_string());
        });
        err
    }

    /// Like [`Store::fail`] for background work: only a 401 reaches the user.
    fn fail_quietly(&self, err: Error) {
        if err.is_unauthorized() {
            self.fail(err);
        } else {
            warn!("Background refresh failed: {err}");
        }
    }
}
