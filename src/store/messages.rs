use super::{ClientState, Store};
use crate::api::Remote;
use crate::error::{Error, Result};
use crate::state::{sort_chats, ChatId, Message, MessageId, UserId};
use crate::storage::TokenStore;
use log::{debug, warn};

impl ClientState {
    fn record_read(&mut self, chat: &ChatId, message: &MessageId, user: &UserId) {
        let mark = |m: &mut Message| {
            if &m.id == message {
                m.read_by.insert(user.clone());
            }
        };
        if let Some(summary) = self.chats.iter_mut().find(|c| &c.id == chat) {
            summary.messages.iter_mut().for_each(mark);
        }
        if self.active_chat.as_ref() == Some(chat) {
            self.messages.iter_mut().for_each(mark);
        }
    }
}

impl<R: Remote, T: TokenStore> Store<R, T> {
    /// Selects `chat`, loads its messages and acknowledges the ones not seen yet.
    pub async fn open_chat(&self, chat: &ChatId) -> Result<()> {
        self.update(|state| {
            if state.active_chat.as_ref() != Some(chat) {
                state.active_chat = Some(chat.clone());
                state.messages.clear();
            }
        });
        self.sync_messages(chat).await.map_err(|err| self.fail(err))
    }

    pub fn close_chat(&self) {
        self.update(|state| {
            state.active_chat = None;
            state.messages.clear();
        });
    }

    /// Replaces the active chat's messages with the server's list, keeping
    /// pending ones, then sends one read acknowledgement per unseen message.
    pub(super) async fn sync_messages(&self, chat: &ChatId) -> Result<()> {
        let (me, token) = self.credentials()?;
        let epoch = self.epoch();
        let fetched = self.remote.messages(&token, chat).await?;
        let unseen: Vec<MessageId> = fetched
            .value
            .iter()
            .filter(|message| message.needs_ack_from(&me))
            .map(|message| message.id.clone())
            .collect();

        let current = self.update(|state| {
            if !state.is_viewing(epoch, chat) {
                return false;
            }
            state.directory.extend(fetched.profiles);
            let pending: Vec<Message> = state
                .messages
                .drain(..)
                .filter(|message| message.is_pending())
                .collect();
            state.messages = fetched.value;
            state.messages.extend(pending);
            true
        });
        if !current {
            debug!("Dropped stale messages of chat {chat}");
            return Ok(());
        }

        for message in unseen {
            match self.remote.mark_read(&token, chat, &message).await {
                Ok(()) => self.update(|state| {
                    if state.epoch == epoch {
                        state.record_read(chat, &message, &me);
                    }
                }),
                Err(err) if err.is_unauthorized() => return Err(err),
                // Acknowledgements are idempotent, the next load retries.
                Err(err) => warn!("Could not mark {message} as read: {err}"),
            }
        }
        Ok(())
    }

    pub async fn send_message(&self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(self.fail(Error::invalid("Message is empty")));
        }
        let chat = self.active_chat().map_err(|err| self.fail(err))?;
        let (me, token) = self.credentials().map_err(|err| self.fail(err))?;
        let epoch = self.epoch();

        let temp = self.update(|state| {
            let id = MessageId::temp(state.next_seq());
            state
                .messages
                .push(Message::pending(id.clone(), me, text.to_owned()));
            id
        });

        match self.remote.send_message(&token, &chat, text).await {
            Ok(sent) => {
                let message = sent.value;
                self.update(|state| {
                    if state.epoch != epoch {
                        return;
                    }
                    state.directory.extend(sent.profiles);
                    if state.active_chat.as_ref() == Some(&chat) {
                        let known = state.messages.iter().any(|m| m.id == message.id);
                        match state.messages.iter().position(|m| m.id == temp) {
                            Some(index) if !known => state.messages[index] = message.clone(),
                            Some(index) => {
                                state.messages.remove(index);
                            }
                            None if !known => state.messages.push(message.clone()),
                            None => {}
                        }
                    }
                    if let Some(summary) = state.chats.iter_mut().find(|c| c.id == chat) {
                        summary.upsert_message(message);
                        sort_chats(&mut state.chats);
                    }
                });
                Ok(())
            }
            Err(err) => {
                self.update(|state| state.messages.retain(|m| m.id != temp));
                Err(self.fail(err))
            }
        }
    }

    /// Applies the new text at once; a failed request restores the previous text.
    pub async fn edit_message(&self, message: &MessageId, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(self.fail(Error::invalid("Message is empty")));
        }
        if message.is_temp() {
            return Err(self.fail(Error::invalid("The message is still being sent")));
        }
        let chat = self.active_chat().map_err(|err| self.fail(err))?;
        let token = self.bearer().map_err(|err| self.fail(err))?;
        let epoch = self.epoch();

        let previous = self.update(|state| {
            state
                .messages
                .iter_mut()
                .find(|m| &m.id == message)
                .map(|m| std::mem::replace(&mut m.text, text.to_owned()))
        });
        let Some(previous) = previous else {
            return Err(self.fail(Error::invalid("Message not found")));
        };

        match self.remote.edit_message(&token, &chat, message, text).await {
            Ok(edited) => {
                self.update(|state| {
                    if !state.is_viewing(epoch, &chat) {
                        return;
                    }
                    state.directory.extend(edited.profiles);
                    if let Some(slot) = state.messages.iter_mut().find(|m| &m.id == message) {
                        *slot = edited.value;
                    }
                });
                Ok(())
            }
            Err(err) => {
                self.update(|state| {
                    if !state.is_viewing(epoch, &chat) {
                        return;
                    }
                    if let Some(m) = state.messages.iter_mut().find(|m| &m.id == message) {
                        m.text = previous;
                    }
                });
                Err(self.fail(err))
            }
        }
    }

    /// Removes at once; a failed request reloads the chat's messages.
    pub async fn delete_message(&self, message: &MessageId) -> Result<()> {
        if message.is_temp() {
            return Err(self.fail(Error::invalid("The message is still being sent")));
        }
        let chat = self.active_chat().map_err(|err| self.fail(err))?;
        let token = self.bearer().map_err(|err| self.fail(err))?;
        self.update(|state| {
            state.messages.retain(|m| &m.id != message);
            if let Some(summary) = state.chats.iter_mut().find(|c| c.id == chat) {
                summary.messages.retain(|m| &m.id != message);
                sort_chats(&mut state.chats);
            }
        });

        if let Err(err) = self.remote.delete_message(&token, &chat, message).await {
            if !err.is_unauthorized() {
                if let Err(reload) = self.sync_messages(&chat).await {
                    self.fail_quietly(reload);
                }
            }
            return Err(self.fail(err));
        }
        Ok(())
    }

    fn active_chat(&self) -> Result<ChatId> {
        self.read(|state| state.active_chat.clone())
            .ok_or_else(|| Error::invalid("No chat selected"))
    }
}
