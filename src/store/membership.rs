use super::{Confirmation, Store};
use crate::api::wire::NewChat;
use crate::api::Remote;
use crate::error::{Error, Result};
use crate::state::{is_group_chat, ChatId, ChatRole, UserId};
use crate::storage::TokenStore;
use log::info;

impl<R: Remote, T: TokenStore> Store<R, T> {
    /// Creates a chat with `members` and selects it. The group flag is derived,
    /// never chosen: several invitees or a name make a group.
    pub async fn create_chat(&self, members: &[UserId], name: Option<&str>) -> Result<ChatId> {
        let (me, token) = self.credentials().map_err(|err| self.fail(err))?;
        let mut users: Vec<UserId> = Vec::with_capacity(members.len());
        for member in members {
            if member != &me && !users.contains(member) {
                users.push(member.clone());
            }
        }
        if users.is_empty() {
            return Err(self.fail(Error::invalid("Select at least one user")));
        }
        let name = name.map(str::trim).filter(|name| !name.is_empty());
        let request = NewChat {
            is_chat_mode: is_group_chat(users.len(), name),
            users,
            name: name.map(str::to_owned),
            message: None,
        };
        let epoch = self.epoch();
        let created = self
            .remote
            .create_chat(&token, &request)
            .await
            .map_err(|err| self.fail(err))?;
        let chat = created.value;
        let id = chat.id.clone();
        info!("Created chat {id} (group: {})", chat.is_group);
        let current = self.update(|state| {
            if state.epoch != epoch {
                return false;
            }
            state.directory.extend(created.profiles);
            state.chats.retain(|c| c.id != chat.id);
            state.chats.insert(0, chat);
            true
        });
        if current {
            // Reported by open_chat itself.
            let _ = self.open_chat(&id).await;
        }
        Ok(id)
    }

    pub async fn add_member(&self, chat: &ChatId, user: &UserId) -> Result<()> {
        let token = self.bearer().map_err(|err| self.fail(err))?;
        self.remote
            .add_member(&token, chat, user)
            .await
            .map_err(|err| self.fail(err))?;
        self.refresh_membership(chat).await;
        Ok(())
    }

    pub async fn remove_member(&self, chat: &ChatId, user: &UserId, _confirmed: Confirmation) -> Result<()> {
        let (me, token) = self.credentials().map_err(|err| self.fail(err))?;
        if user == &me {
            return Err(self.fail(Error::invalid("You cannot remove yourself")));
        }
        self.require_chat_admin(chat, &me).map_err(|err| self.fail(err))?;
        self.remote
            .remove_member(&token, chat, user)
            .await
            .map_err(|err| self.fail(err))?;
        self.refresh_membership(chat).await;
        Ok(())
    }

    /// Only a chat admin may promote or demote; platform admins get no bypass here.
    pub async fn change_role(&self, chat: &ChatId, user: &UserId, role: ChatRole) -> Result<()> {
        let (me, token) = self.credentials().map_err(|err| self.fail(err))?;
        self.require_chat_admin(chat, &me).map_err(|err| self.fail(err))?;
        self.remote
            .change_role(&token, chat, user, role)
            .await
            .map_err(|err| self.fail(err))?;
        self.refresh_membership(chat).await;
        Ok(())
    }

    pub async fn rename_chat(&self, chat: &ChatId, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.fail(Error::invalid("Chat name is empty")));
        }
        let token = self.bearer().map_err(|err| self.fail(err))?;
        let epoch = self.epoch();
        let renamed = self
            .remote
            .rename_chat(&token, chat, name)
            .await
            .map_err(|err| self.fail(err))?;
        self.update(|state| {
            if state.epoch != epoch {
                return;
            }
            state.directory.extend(renamed.profiles);
            if let Some(entry) = state.chats.iter_mut().find(|c| &c.id == chat) {
                entry.name = renamed.value.name.or_else(|| Some(name.to_owned()));
                entry.is_group = renamed.value.is_group;
            }
        });
        Ok(())
    }

    pub async fn delete_chat(&self, chat: &ChatId, _confirmed: Confirmation) -> Result<()> {
        let token = self.bearer().map_err(|err| self.fail(err))?;
        self.remote
            .delete_chat(&token, chat)
            .await
            .map_err(|err| self.fail(err))?;
        self.update(|state| {
            state.chats.retain(|c| &c.id != chat);
            if state.active_chat.as_ref() == Some(chat) {
                state.active_chat = None;
                state.messages.clear();
            }
        });
        let _ = self.list_chats().await;
        Ok(())
    }

    fn require_chat_admin(&self, chat: &ChatId, me: &UserId) -> Result<()> {
        let admin = self.read(|state| state.chat(chat).is_some_and(|c| c.is_admin(me)));
        if admin {
            Ok(())
        } else {
            Err(Error::NotChatAdmin)
        }
    }

    async fn refresh_membership(&self, chat: &ChatId) {
        let _ = self.list_chats().await;
        if self.read(|state| state.active_chat.as_ref() == Some(chat)) {
            if let Err(err) = self.sync_messages(chat).await {
                self.fail_quietly(err);
            }
        }
    }
}
