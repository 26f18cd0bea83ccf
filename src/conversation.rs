use crate::app::{confirm, Ctx};
use crate::members::Members;
use crate::message::Message;
use crate::state::Message as ChatMessage;
use leptos::ev::SubmitEvent;
use leptos::*;

#[derive(Clone)]
struct Line {
    message: ChatMessage,
    sender: String,
    mine: bool,
}

#[component]
pub fn Conversation() -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let open = move || ctx.with(|state| state.active_chat.is_some());
    view! {
        <div class="h-dvh max-h-dvh flex flex-col lg:w-2/5 w-full border-e-2 dark:border-gray-800">
            <Show
                when=open
                fallback=|| {
                    view! {
                        <p class="m-auto text-gray-500 dark:text-gray-400">
                            "Pick a chat or start a new one"
                        </p>
                    }
                }
            >
                <Header />
                <Members />
                <Lines />
                <Composer />
            </Show>
        </div>
    }
}

#[component]
fn Header() -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let (renaming, set_renaming) = create_signal(false);
    let (draft, set_draft) = create_signal(String::new());

    let title = {
        let ctx = ctx.clone();
        move || {
            ctx.with(|state| match (state.active(), state.me()) {
                (Some(chat), Some(me)) => chat.title(me, &state.directory),
                _ => String::new(),
            })
        }
    };
    let start_rename = {
        let title = title.clone();
        move |_| {
            set_draft.set(title());
            set_renaming.set(true);
        }
    };
    let rename = {
        let ctx = ctx.clone();
        move |ev: SubmitEvent| {
            ev.prevent_default();
            set_renaming.set(false);
            let Some(chat) = ctx.store.read(|state| state.active_chat.clone()) else {
                return;
            };
            let name = draft.get();
            ctx.spawn(move |store| async move {
                let _ = store.rename_chat(&chat, &name).await;
            });
        }
    };
    let delete = {
        let ctx = ctx.clone();
        move |_| {
            let Some(chat) = ctx.store.read(|state| state.active_chat.clone()) else {
                return;
            };
            let Some(confirmed) = confirm("Delete this chat for everyone?") else {
                return;
            };
            ctx.spawn(move |store| async move {
                let _ = store.delete_chat(&chat, confirmed).await;
            });
        }
    };
    let close = move |_| ctx.store.close_chat();

    view! {
        <header class="flex items-center gap-2 px-4 py-3 border-b-2 dark:border-gray-800">
            {move || {
                if renaming.get() {
                    view! {
                        <form class="grow" on:submit=rename.clone()>
                            <input
                                class="p-1.5 text-sm w-full rounded-lg border border-gray-300 dark:bg-gray-700 dark:border-gray-600"
                                on:input=move |ev| set_draft.set(event_target_value(&ev))
                                on:blur=move |_| set_renaming.set(false)
                                prop:value=draft
                            />
                        </form>
                    }
                        .into_view()
                } else {
                    view! {
                        <h2
                            class="grow font-semibold truncate cursor-text"
                            title="Double-click to rename"
                            on:dblclick=start_rename.clone()
                        >
                            {title.clone()}
                        </h2>
                    }
                        .into_view()
                }
            }}
            <button
                type="button"
                class="text-sm text-gray-500 hover:text-red-600 dark:text-gray-400"
                on:click=delete
            >
                "Delete"
            </button>
            <button
                type="button"
                class="text-gray-500 hover:text-gray-900 dark:text-gray-400 dark:hover:text-white p-1"
                on:click=close
            >
                <svg viewBox="0 0 10 10" width="14">
                    <path
                        d="M1 1L9 9M1 9L9 1"
                        stroke="currentColor"
                        fill="currentColor"
                        stroke-width="2"
                        stroke-linecap="round"
                    />
                </svg>
            </button>
        </header>
    }
}

#[component]
fn Lines() -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let lines = move || {
        ctx.with(|state| {
            let me = state.me();
            state
                .messages
                .iter()
                .map(|message| Line {
                    mine: me == Some(&message.sender),
                    sender: state.directory.name_of(&message.sender),
                    message: message.clone(),
                })
                .collect::<Vec<_>>()
        })
    };
    view! {
        <main class="grow flex flex-col-reverse overflow-auto">
            {move || {
                lines()
                    .into_iter()
                    .rev()
                    .map(|line| {
                        view! { <Message message=line.message sender=line.sender mine=line.mine /> }
                    })
                    .collect_view()
            }}
        </main>
    }
}

#[component]
fn Composer() -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let (text, set_text) = create_signal(String::new());

    let send = move |ev: SubmitEvent| {
        ev.prevent_default();
        let body = text.get();
        if body.trim().is_empty() {
            return;
        }
        set_text.set(String::new());
        ctx.spawn(move |store| async move {
            let _ = store.send_message(&body).await;
        });
    };

    view! {
        <form class="w-full" on:submit=send>
            <label for="chat" class="sr-only">
                "Your message"
            </label>
            <div class="flex items-center px-3 py-2 bg-gray-50 dark:bg-gray-700">
                <input
                    id="chat"
                    class="block mx-4 p-2.5 w-full text-sm text-gray-900 bg-white rounded-lg border border-gray-300 focus:ring-blue-500 focus:border-blue-500 dark:bg-gray-800 dark:border-gray-600 dark:placeholder-gray-400 dark:text-white dark:focus:ring-blue-500 dark:focus:border-blue-500"
                    placeholder="Your message..."
                    on:input=move |ev| set_text.set(event_target_value(&ev))
                    prop:value=text
                />
                <button
                    type="submit"
                    class="inline-flex justify-center p-2 text-blue-600 rounded-full cursor-pointer hover:bg-blue-100 dark:text-blue-500 dark:hover:bg-gray-600"
                >
                    <svg
                        class="w-5 h-5 rotate-90 rtl:-rotate-90"
                        aria-hidden="true"
                        xmlns="http://www.w3.org/2000/svg"
                        fill="currentColor"
                        viewBox="0 0 18 20"
                    >
                        <path d="m17.914 18.594-8-18a1 1 0 0 0-1.828 0l-8 18a1 1 0 0 0 1.157 1.376L8 18.281V9a1 1 0 0 1 2 0v9.281l6.758 1.689a1 1 0 0 0 1.156-1.376Z" />
                    </svg>
                    <span class="sr-only">"Send message"</span>
                </button>
            </div>
        </form>
    }
}
