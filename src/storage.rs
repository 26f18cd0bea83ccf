use log::warn;
use std::cell::RefCell;

/// Where the bearer token outlives the page.
pub trait TokenStore {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

/// Browser `localStorage`.
pub struct LocalTokens {
    key: &'static str,
}

impl LocalTokens {
    pub fn new(key: &'static str) -> Self {
        LocalTokens { key }
    }

    fn storage(&self) -> Option<web_sys::Storage> {
        match leptos::window().local_storage() {
            Ok(storage) => storage,
            Err(err) => {
                warn!("localStorage unavailable: {err:?}");
                None
            }
        }
    }
}

impl TokenStore for LocalTokens {
    fn load(&self) -> Option<String> {
        self.storage()?
            .get_item(self.key)
            .ok()
            .flatten()
            .filter(|token| !token.is_empty())
    }

    fn save(&self, token: &str) {
        if let Some(storage) = self.storage() {
            if let Err(err) = storage.set_item(self.key, token) {
                warn!("Could not persist token: {err:?}");
            }
        }
    }

    fn clear(&self) {
        if let Some(storage) = self.storage() {
            if let Err(err) = storage.remove_item(self.key) {
                warn!("Could not remove token: {err:?}");
            }
        }
    }
}

/// Token held for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemoryTokens {
    token: RefCell<Option<String>>,
}

impl MemoryTokens {
    pub fn with_token(token: &str) -> Self {
        MemoryTokens {
            token: RefCell::new(Some(token.to_owned())),
        }
    }
}

impl TokenStore for MemoryTokens {
    fn load(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    fn save(&self, token: &str) {
        *self.token.borrow_mut() = Some(token.to_owned());
    }

    fn clear(&self) {
        self.token.borrow_mut().take();
    }
}
