use super::Store;
use crate::api::Remote;
use crate::error::Result;
use crate::state::{sort_chats, ChatId};
use crate::storage::TokenStore;
use log::debug;

impl<R: Remote, T: TokenStore> Store<R, T> {
    pub async fn list_chats(&self) -> Result<()> {
        self.refresh_chats().await.map_err(|err| self.fail(err))
    }

    pub(super) async fn refresh_chats(&self) -> Result<()> {
        let token = self.bearer()?;
        let epoch = self.epoch();
        let fetched = self.remote.chats(&token).await?;
        let mut chats = fetched.value;
        sort_chats(&mut chats);
        debug!("Fetched {} chats", chats.len());
        self.update(|state| {
            if state.epoch == epoch {
                state.directory.extend(fetched.profiles);
                state.chats = chats;
            }
        });
        Ok(())
    }

    /// Profiles for member selection and name resolution.
    pub async fn load_users(&self) -> Result<()> {
        let token = self.bearer().map_err(|err| self.fail(err))?;
        let epoch = self.epoch();
        let users = self
            .remote
            .users(&token)
            .await
            .map_err(|err| self.fail(err))?;
        self.update(|state| {
            if state.epoch == epoch {
                state.directory.extend(users);
            }
        });
        Ok(())
    }

    pub fn unread_count(&self, chat: &ChatId) -> usize {
        self.read(|state| match (state.me(), state.chat(chat)) {
            (Some(me), Some(chat)) => chat.unread_count(me),
            _ => 0,
        })
    }

    /// One tick of the background refresh: chat summaries, then the open chat.
    ///
    /// A tick is skipped while the previous one is still in flight.
    pub async fn poll(&self) {
        if !self.is_signed_in() || self.polling.replace(true) {
            return;
        }
        if let Err(err) = self.refresh_chats().await {
            self.fail_quietly(err);
        } else if let Some(chat) = self.read(|state| state.active_chat.clone()) {
            if let Err(err) = self.sync_messages(&chat).await {
                self.fail_quietly(err);
            }
        }
        self.polling.set(false);
    }
}
