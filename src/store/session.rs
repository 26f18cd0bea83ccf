use super::Store;
use crate::api::Remote;
use crate::error::{Error, Result};
use crate::state::Profile;
use crate::storage::TokenStore;
use log::info;

const MIN_PASSWORD_LEN: usize = 6;

/// Successful email verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    pub message: String,
    pub redirect: String,
}

impl<R: Remote, T: TokenStore> Store<R, T> {
    /// Boot sequence: restore the persisted session, then load what it can see.
    pub async fn start(&self) {
        if self.tokens.load().is_some() {
            // Failures are already reported as notices.
            let _ = self.load_profile().await;
        }
        self.load_visible().await;
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(self.fail(Error::invalid("Fill in all fields")));
        }
        let token = self
            .remote
            .login(email, password)
            .await
            .map_err(|err| self.fail(rejected(err, "Invalid email or password")))?;
        self.establish(&token).await
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<()> {
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(self.fail(Error::invalid("Fill in all fields")));
        }
        let token = self
            .remote
            .register(name, email, password)
            .await
            .map_err(|err| self.fail(rejected(err, "Registration was rejected")))?;
        self.establish(&token).await
    }

    /// Fetches the signed in user. A 401 clears the stored token and ends the session.
    pub async fn load_profile(&self) -> Result<Profile> {
        let token = self.bearer().map_err(|err| self.fail(err))?;
        let epoch = self.epoch();
        let profile = self.remote.me(&token).await.map_err(|err| self.fail(err))?;
        info!("Signed in as {} <{}>", profile.name, profile.email);
        self.update(|state| {
            if state.epoch == epoch {
                state.directory.insert(profile.clone());
                state.session = Some(profile.clone());
            }
        });
        Ok(profile)
    }

    /// Local only: the token and all user and chat state are dropped immediately.
    pub fn logout(&self) {
        info!("Signing out");
        self.tokens.clear();
        self.update(|state| state.end_session());
    }

    pub async fn verify_email(&self, code: &str) -> Result<Verified> {
        if code.trim().is_empty() {
            return Err(self.fail(Error::invalid("Verification token is missing")));
        }
        let outcome = self
            .remote
            .verify_email(code)
            .await
            .map_err(|err| self.fail(rejected(err, "Invalid or expired link")))?;
        if !outcome.success {
            return Err(self.fail(Error::Server(or_default(outcome.message, "Verification failed"))));
        }
        if let Some(token) = &outcome.token {
            // The link is proof enough, sign straight in.
            let _ = self.establish(token).await;
        }
        Ok(Verified {
            message: outcome.message,
            redirect: outcome.redirect.unwrap_or_else(|| "/".to_owned()),
        })
    }

    pub async fn reset_password(&self, code: &str, password: &str, confirm: &str) -> Result<String> {
        if password != confirm {
            return Err(self.fail(Error::invalid("Passwords do not match")));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(self.fail(Error::invalid(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            ))));
        }
        let outcome = self
            .remote
            .reset_password(code, password)
            .await
            .map_err(|err| self.fail(rejected(err, "Invalid or expired link")))?;
        if !outcome.success {
            return Err(self.fail(Error::Server(or_default(outcome.message, "Password reset failed"))));
        }
        if let Some(token) = &outcome.token {
            let _ = self.establish(token).await;
        }
        Ok(outcome.message)
    }

    async fn establish(&self, token: &str) -> Result<()> {
        self.tokens.save(token);
        self.update(|state| state.end_session());
        self.load_profile().await?;
        self.load_visible().await;
        Ok(())
    }

    async fn load_visible(&self) {
        let _ = self.list_posts().await;
        if self.is_signed_in() {
            let _ = self.list_chats().await;
            let _ = self.load_users().await;
        }
    }
}

/// Calls made without a token have no session to expire.
fn rejected(err: Error, reason: &str) -> Error {
    match err {
        Error::Unauthorized => Error::Server(reason.to_owned()),
        err => err,
    }
}

fn or_default(message: String, default: &str) -> String {
    if message.trim().is_empty() {
        default.to_owned()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::state::UserId;
    use crate::storage::{MemoryTokens, TokenStore};
    use crate::store::fake::{FakeRemote, PASSWORD};
    use crate::store::Store;
    use futures::executor::block_on;

    fn store(remote: &FakeRemote) -> Store<FakeRemote, MemoryTokens> {
        Store::new(remote.clone(), MemoryTokens::default(), || {})
    }

    #[test]
    fn login_loads_everything() {
        let remote = FakeRemote::with_users(&["ann", "boris"]);
        remote.add_post("p1", "boris");
        let store = store(&remote);
        block_on(store.login("ann@dream.net", PASSWORD)).unwrap();
        assert!(store.tokens.load().is_some());
        store.read(|s| {
            assert_eq!(s.session.as_ref().unwrap().name, "ann");
            assert_eq!(s.posts.len(), 1);
            assert_eq!(s.directory.name_of(&UserId::from("u-boris")), "boris");
            assert!(s.notices.is_empty());
        });
    }

    #[test]
    fn missing_fields_never_reach_the_server() {
        let remote = FakeRemote::with_users(&["ann"]);
        let store = store(&remote);
        assert!(matches!(block_on(store.login(" ", PASSWORD)), Err(Error::Invalid(_))));
        assert!(matches!(
            block_on(store.register("", "new@dream.net", PASSWORD)),
            Err(Error::Invalid(_))
        ));
        assert_eq!(remote.calls("login") + remote.calls("register"), 0);
        assert_eq!(store.read(|s| s.notices.len()), 2);
    }

    #[test]
    fn server_message_is_surfaced() {
        let remote = FakeRemote::with_users(&["ann"]);
        let store = store(&remote);
        let err = block_on(store.register("Ann", "ann@dream.net", PASSWORD)).unwrap_err();
        assert_eq!(err, Error::Server("User already exists".into()));
        assert_eq!(store.read(|s| s.notices[0].text.clone()), "User already exists");
        assert!(!store.is_signed_in());
    }

    #[test]
    fn rejected_login_keeps_current_session() {
        let remote = FakeRemote::with_users(&["ann", "boris"]);
        let store = store(&remote);
        block_on(store.login("ann@dream.net", PASSWORD)).unwrap();
        remote.fail_with("login", Error::Unauthorized);

        let err = block_on(store.login("boris@dream.net", "wrong")).unwrap_err();
        assert_eq!(err, Error::Server("Invalid email or password".into()));
        assert!(store.is_signed_in());
        assert!(store.tokens.load().is_some());
        assert_eq!(
            store.read(|s| s.notices[0].text.clone()),
            "Invalid email or password"
        );

        remote.fail_with("register", Error::Unauthorized);
        let err = block_on(store.register("Cleo", "cleo@dream.net", PASSWORD)).unwrap_err();
        assert_eq!(err, Error::Server("Registration was rejected".into()));
        assert_eq!(store.me(), Some(UserId::from("u-ann")));
    }

    #[test]
    fn expired_token_is_cleared() {
        let remote = FakeRemote::with_users(&["ann"]);
        let store = Store::new(remote.clone(), MemoryTokens::with_token("revoked"), || {});
        block_on(store.start());
        assert!(store.tokens.load().is_none());
        assert!(!store.is_signed_in());
        assert_eq!(
            store.read(|s| s.notices[0].text.clone()),
            "Session expired, please sign in again"
        );
        // The public feed is still fetched anonymously.
        assert_eq!(remote.calls("posts"), 1);
        assert_eq!(remote.calls("chats"), 0);
    }

    #[test]
    fn start_restores_persisted_session() {
        let remote = FakeRemote::with_users(&["ann"]);
        let token = block_on(crate::api::Remote::login(&remote, "ann@dream.net", PASSWORD)).unwrap();
        let store = Store::new(remote.clone(), MemoryTokens::with_token(&token), || {});
        block_on(store.start());
        assert!(store.is_signed_in());
        assert_eq!(remote.calls("chats"), 1);
        assert_eq!(remote.calls("users"), 1);
    }

    #[test]
    fn logout_drops_user_state() {
        let remote = FakeRemote::with_users(&["ann", "boris"]);
        remote.add_post("p1", "boris");
        let store = store(&remote);
        block_on(store.login("ann@dream.net", PASSWORD)).unwrap();
        block_on(store.create_chat(&["u-boris".into()], None)).unwrap();
        let calls = remote.server.borrow().calls.len();
        store.logout();
        assert_eq!(remote.server.borrow().calls.len(), calls);
        assert!(store.tokens.load().is_none());
        store.read(|s| {
            assert!(s.session.is_none());
            assert!(s.chats.is_empty());
            assert!(s.active_chat.is_none());
            assert!(s.messages.is_empty());
            assert_eq!(s.posts.len(), 1);
        });
    }

    #[test]
    fn email_verification_signs_in() {
        let remote = FakeRemote::with_users(&["ann"]);
        let store = store(&remote);
        let verified = block_on(store.verify_email("verify-ann")).unwrap();
        assert_eq!(verified.redirect, "/");
        assert_eq!(verified.message, "Email confirmed");
        assert!(store.is_signed_in());

        let err = block_on(store.verify_email("garbage")).unwrap_err();
        assert_eq!(err, Error::Server("Invalid or expired link".into()));
    }

    #[test]
    fn password_reset_validation() {
        let remote = FakeRemote::with_users(&["ann"]);
        let store = store(&remote);
        assert_eq!(
            block_on(store.reset_password("reset-ann", "abcdef", "abcdeg")),
            Err(Error::invalid("Passwords do not match"))
        );
        assert_eq!(
            block_on(store.reset_password("reset-ann", "abc", "abc")),
            Err(Error::invalid("Password must be at least 6 characters"))
        );
        assert_eq!(remote.calls("reset_password"), 0);

        assert_eq!(
            block_on(store.reset_password("bogus", "abcdef", "abcdef")),
            Err(Error::Server("Link expired".into()))
        );
        assert_eq!(
            block_on(store.reset_password("reset-ann", "abcdef", "abcdef")),
            Ok("Password changed".to_owned())
        );
        assert!(store.is_signed_in());
        assert!(block_on(store.login("ann@dream.net", "abcdef")).is_ok());
    }
}
