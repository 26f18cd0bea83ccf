use super::{Confirmation, Store};
use crate::api::Remote;
use crate::error::{Error, Result};
use crate::state::{Author, Post, PostId};
use crate::storage::TokenStore;
use log::debug;
use std::collections::BTreeSet;

impl<R: Remote, T: TokenStore> Store<R, T> {
    /// Public feed; the token is attached when there is one.
    pub async fn list_posts(&self) -> Result<()> {
        self.refresh_posts().await.map_err(|err| self.fail(err))
    }

    async fn refresh_posts(&self) -> Result<()> {
        let epoch = self.epoch();
        let token = self.tokens.load();
        let posts = self.remote.posts(token.as_deref()).await?;
        debug!("Fetched {} posts", posts.len());
        self.update(|state| {
            if state.epoch != epoch {
                return;
            }
            let mut merged: Vec<Post> = state
                .posts
                .drain(..)
                .filter(|post| post.id.is_temp())
                .collect();
            merged.extend(posts);
            state.posts = merged;
        });
        Ok(())
    }

    pub async fn create_post(&self, title: &str, content: &str) -> Result<()> {
        let (title, content) = (title.trim(), content.trim());
        if title.is_empty() || content.is_empty() {
            return Err(self.fail(Error::invalid("Title and content are required")));
        }
        let author = self
            .read(|state| state.session.as_ref().map(Author::from))
            .ok_or(Error::NotSignedIn)
            .map_err(|err| self.fail(err))?;
        let token = self.bearer().map_err(|err| self.fail(err))?;

        let temp = self.update(|state| {
            let id = PostId::temp(state.next_seq());
            state.posts.insert(
                0,
                Post {
                    id: id.clone(),
                    title: title.to_owned(),
                    content: content.to_owned(),
                    author,
                    likes: BTreeSet::new(),
                },
            );
            id
        });

        match self.remote.create_post(&token, title, content).await {
            Ok(post) => {
                self.update(|state| {
                    let known = state.posts.iter().any(|p| p.id == post.id);
                    match state.posts.iter().position(|p| p.id == temp) {
                        Some(index) if !known => state.posts[index] = post,
                        Some(index) => {
                            state.posts.remove(index);
                        }
                        None if !known => state.posts.insert(0, post),
                        None => {}
                    }
                });
                Ok(())
            }
            Err(err) => {
                self.update(|state| state.posts.retain(|p| p.id != temp));
                Err(self.fail(err))
            }
        }
    }

    /// Flips the like locally first; a failed request resynchronizes the whole feed.
    pub async fn toggle_like(&self, post: &PostId) -> Result<()> {
        let (me, token) = self.credentials().map_err(|err| self.fail(err))?;
        if post.is_temp() {
            return Err(self.fail(Error::invalid("The post is still being published")));
        }
        self.update(|state| {
            if let Some(post) = state.posts.iter_mut().find(|p| &p.id == post) {
                post.toggle_like(&me);
            }
        });
        if let Err(err) = self.remote.like_post(&token, post).await {
            if !err.is_unauthorized() {
                self.refetch_posts().await;
            }
            return Err(self.fail(err));
        }
        Ok(())
    }

    /// Whether the delete affordance should be offered for `post`.
    pub fn can_delete(&self, post: &Post) -> bool {
        self.read(|state| match &state.session {
            Some(profile) => profile.is_admin() || profile.email == post.author.email,
            None => false,
        })
    }

    pub async fn delete_post(&self, post: &PostId, _confirmed: Confirmation) -> Result<()> {
        let token = self.bearer().map_err(|err| self.fail(err))?;
        if post.is_temp() {
            return Err(self.fail(Error::invalid("The post is still being published")));
        }
        self.update(|state| state.posts.retain(|p| &p.id != post));
        if let Err(err) = self.remote.delete_post(&token, post).await {
            if !err.is_unauthorized() {
                self.refetch_posts().await;
            }
            return Err(self.fail(err));
        }
        Ok(())
    }

    async fn refetch_posts(&self) {
        if let Err(err) = self.refresh_posts().await {
            self.fail_quietly(err);
        }
    }
}
