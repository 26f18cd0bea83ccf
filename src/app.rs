use crate::api::HttpRemote;
use crate::config::{Config, DEFAULT_API_URL};
use crate::conversation::Conversation;
use crate::feed::Feed;
use crate::loading::Loading;
use crate::login::Login;
use crate::nav::Nav;
use crate::notices::Notices;
use crate::poll::Poller;
use crate::reset::Reset;
use crate::storage::LocalTokens;
use crate::store::{ClientState, Confirmation, Store};
use crate::verify::Verify;
use leptos::*;
use log::{error, warn};
use std::future::Future;
use std::rc::Rc;

pub type AppStore = Store<HttpRemote, LocalTokens>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Main,
    Verify(String),
    Reset(String),
    Unknown,
}

/// Matches the location path by hand; there is no router.
pub fn route(pathname: &str) -> Page {
    let segments: Vec<&str> = pathname.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [] => Page::Main,
        ["verify", code] => Page::Verify((*code).to_owned()),
        ["reset", code] => Page::Reset((*code).to_owned()),
        _ => Page::Unknown,
    }
}

pub fn navigate(path: &str) {
    if let Err(err) = window().location().replace(path) {
        warn!("Could not navigate to {path}: {err:?}");
    }
}

/// Asks the user before a destructive action.
pub fn confirm(question: &str) -> Option<Confirmation> {
    window()
        .confirm_with_message(question)
        .unwrap_or(false)
        .then(Confirmation::acknowledged)
}

/// Shared by every component. `revision` fires on each store change so reads
/// through [`Ctx::with`] re-run.
#[derive(Clone)]
pub struct Ctx {
    pub store: AppStore,
    pub revision: Trigger,
    pub config: Rc<Config>,
}

impl Ctx {
    pub fn with<O>(&self, f: impl FnOnce(&ClientState) -> O) -> O {
        self.revision.track();
        self.store.read(f)
    }

    pub fn spawn<F, Fut>(&self, action: F)
    where
        F: FnOnce(AppStore) -> Fut,
        Fut: Future<Output = ()> + 'static,
    {
        spawn_local(action(self.store.clone()));
    }
}

#[component]
pub fn App() -> impl IntoView {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}, using {DEFAULT_API_URL}");
            match Config::with_api_url(DEFAULT_API_URL) {
                Ok(config) => config,
                Err(err) => return view! { <p class="m-4 text-red-600">{err.to_string()}</p> }.into_view(),
            }
        }
    };
    let revision = create_trigger();
    let store = Store::new(
        HttpRemote::new(&config),
        LocalTokens::new(config.token_key),
        move || revision.notify(),
    );
    provide_context(Ctx {
        store,
        revision,
        config: Rc::new(config),
    });

    let pathname = window().location().pathname().unwrap_or_default();
    let page = match route(&pathname) {
        Page::Main => view! { <Main /> }.into_view(),
        Page::Verify(code) => view! { <Verify code=code /> }.into_view(),
        Page::Reset(code) => view! { <Reset code=code /> }.into_view(),
        Page::Unknown => {
            navigate("/");
            view! { <Loading /> }.into_view()
        }
    };
    view! {
        {page}
        <Notices />
    }
    .into_view()
}

#[component]
fn Main() -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    ctx.spawn(|store| async move { store.start().await });

    let signed_in = create_memo({
        let ctx = ctx.clone();
        move |_| ctx.with(|state| state.session.is_some())
    });

    let poller = Rc::new(Poller::default());
    create_effect({
        let poller = poller.clone();
        move |_| {
            if signed_in.get() {
                let store = ctx.store.clone();
                poller.start(ctx.config.poll_interval, move || {
                    let store = store.clone();
                    spawn_local(async move { store.poll().await });
                });
            } else {
                poller.stop();
            }
        }
    });
    on_cleanup(move || poller.stop());

    view! {
        <div class="flex lg:flex-row flex-col min-h-dvh dark:bg-gray-900 dark:text-white">
            <Show when=move || signed_in.get() fallback=|| view! { <Login /> }>
                <Nav />
                <Conversation />
            </Show>
            <Feed />
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes() {
        assert_eq!(route("/"), Page::Main);
        assert_eq!(route(""), Page::Main);
        assert_eq!(route("/verify/abc123"), Page::Verify("abc123".into()));
        assert_eq!(route("/reset/xyz/"), Page::Reset("xyz".into()));
        assert_eq!(route("/verify"), Page::Unknown);
        assert_eq!(route("/posts/1"), Page::Unknown);
        assert_eq!(route("/reset/a/b"), Page::Unknown);
    }
}
