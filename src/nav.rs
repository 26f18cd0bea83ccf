use crate::app::Ctx;
use crate::state::{ChatId, UserId};
use leptos::ev::MouseEvent;
use leptos::*;

#[derive(Debug, Clone, PartialEq)]
struct ChatEntry {
    id: ChatId,
    title: String,
    unread: usize,
    group: bool,
    active: bool,
}

#[component]
pub fn Nav() -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let (show, set_show) = create_signal(true);
    let (picking, set_picking) = create_signal(false);

    let profile = {
        let ctx = ctx.clone();
        move || ctx.with(|state| state.session.clone())
    };
    let entries = {
        let ctx = ctx.clone();
        move || {
            ctx.with(|state| {
                let Some(me) = state.me() else {
                    return Vec::new();
                };
                state
                    .chats
                    .iter()
                    .map(|chat| ChatEntry {
                        id: chat.id.clone(),
                        title: chat.title(me, &state.directory),
                        unread: chat.unread_count(me),
                        group: chat.is_group,
                        active: state.active_chat.as_ref() == Some(&chat.id),
                    })
                    .collect::<Vec<_>>()
            })
        }
    };
    let logout = move |_| ctx.store.logout();

    view! {
        {move || {
            (!show.get())
                .then(|| {
                    view! {
                        <div
                            class="lg:hidden text-gray-500 dark:text-gray-400 p-5"
                            on:click=move |_| set_show.set(true)
                        >
                            <svg viewBox="0 0 10 8" width="20">
                                <path
                                    d="M1 1h8M1 4h 8M1 7h8"
                                    stroke="currentColor"
                                    fill="currentColor"
                                    stroke-width="2"
                                    stroke-linecap="round"
                                />
                            </svg>
                        </div>
                    }
                })
        }}
        <nav
            class="lg:w-1/5 w-full lg:flex border-e-2 dark:border-gray-800 lg:min-h-dvh lg:max-h-dvh overflow-y-auto"
            class:hidden=move || !show.get()
        >
            <div class="w-full flex flex-col">
                <div class="flex flex-row items-center gap-2 m-4">
                    {move || {
                        profile()
                            .map(|profile| {
                                view! {
                                    <div class="w-10 h-10 shrink-0 rounded-full bg-blue-600 text-white flex items-center justify-center font-semibold">
                                        {profile.initial()}
                                    </div>
                                    <div class="grow text-left">
                                        <p class="font-semibold">{profile.name.clone()}</p>
                                        <p class="text-xs text-gray-500 dark:text-gray-400">
                                            {profile.role.label()}
                                        </p>
                                    </div>
                                }
                            })
                    }}
                    <button
                        type="button"
                        class="text-sm text-gray-500 hover:text-gray-900 dark:text-gray-400 dark:hover:text-white"
                        on:click=logout
                    >
                        "Logout"
                    </button>
                    <div
                        class="lg:hidden text-gray-500 dark:text-gray-400 p-2"
                        on:click=move |_| set_show.set(false)
                    >
                        <svg viewBox="0 0 10 10" width="20">
                            <path
                                d="M1 1L9 9M1 9L9 1"
                                stroke="currentColor"
                                fill="currentColor"
                                stroke-width="2"
                                stroke-linecap="round"
                            />
                        </svg>
                    </div>
                </div>
                <ul class="space-y-1 font-medium px-2 grow">
                    {move || {
                        entries()
                            .into_iter()
                            .map(|entry| view! { <ChatItem entry=entry /> })
                            .collect_view()
                    }}
                </ul>
                <div class="p-2">
                    <Show
                        when=move || picking.get()
                        fallback=move || {
                            view! {
                                <button
                                    type="button"
                                    class="w-full text-white bg-gray-800 hover:bg-gray-900 font-medium rounded-lg text-sm px-5 py-2.5 dark:bg-gray-800 dark:hover:bg-gray-700"
                                    on:click=move |_| set_picking.set(true)
                                >
                                    "+ New chat"
                                </button>
                            }
                        }
                    >
                        <NewChat set_open=set_picking />
                    </Show>
                </div>
            </div>
        </nav>
    }
}

#[component]
fn ChatItem(entry: ChatEntry) -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let id = entry.id.clone();
    let open = move |ev: MouseEvent| {
        ev.prevent_default();
        let id = id.clone();
        ctx.spawn(move |store| async move {
            let _ = store.open_chat(&id).await;
        });
    };
    let class = if entry.active {
        "flex items-center p-2 text-gray-900 rounded-lg dark:text-white bg-gray-100 dark:bg-gray-700"
    } else {
        "flex items-center p-2 text-gray-900 rounded-lg dark:text-white hover:bg-gray-100 dark:hover:bg-gray-700"
    };
    view! {
        <li on:click=open>
            <a href="#" class=class>
                <span class="w-8 h-8 shrink-0 rounded-full bg-gray-200 dark:bg-gray-600 flex items-center justify-center text-sm">
                    {if entry.group { "#" } else { "@" }}
                </span>
                <span class="ms-3 grow text-left truncate">{entry.title}</span>
                {(entry.unread > 0)
                    .then(|| {
                        view! {
                            <span class="ms-2 px-2 text-xs font-semibold text-white bg-blue-600 rounded-full">
                                {entry.unread}
                            </span>
                        }
                    })}
            </a>
        </li>
    }
}

#[component]
fn NewChat(set_open: WriteSignal<bool>) -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let selected = create_rw_signal(Vec::<UserId>::new());
    let (name, set_name) = create_signal(String::new());

    let people = {
        let ctx = ctx.clone();
        move || {
            ctx.with(|state| {
                state
                    .me()
                    .map(|me| state.directory.others(me))
                    .unwrap_or_default()
            })
        }
    };
    let toggle = move |id: UserId| {
        selected.update(|chosen| match chosen.iter().position(|c| c == &id) {
            Some(index) => {
                chosen.remove(index);
            }
            None => chosen.push(id),
        })
    };
    let create = move |_| {
        let members = selected.get();
        let name = name.get();
        set_open.set(false);
        ctx.spawn(move |store| async move {
            let _ = store.create_chat(&members, Some(name.as_str())).await;
        });
    };

    view! {
        <div class="flex flex-col gap-2">
            <ul class="max-h-64 overflow-y-auto">
                {move || {
                    people()
                        .into_iter()
                        .map(|profile| {
                            let checked = {
                                let id = profile.id.clone();
                                move || selected.with(|chosen| chosen.contains(&id))
                            };
                            let id = profile.id.clone();
                            view! {
                                <li class="px-3 py-1.5 hover:bg-gray-100 dark:hover:bg-gray-700 rounded-lg">
                                    <label class="flex items-center gap-2 text-sm cursor-pointer">
                                        <input
                                            type="checkbox"
                                            prop:checked=checked
                                            on:change=move |_| toggle(id.clone())
                                        />
                                        {profile.name}
                                    </label>
                                </li>
                            }
                        })
                        .collect_view()
                }}
            </ul>
            <input
                type="text"
                placeholder="Group name (optional)"
                class="p-2 text-sm rounded-lg border border-gray-300 dark:bg-gray-700 dark:border-gray-600"
                on:input=move |ev| set_name.set(event_target_value(&ev))
                prop:value=name
            />
            <div class="flex gap-2">
                <button
                    type="button"
                    class="grow text-white bg-blue-700 hover:bg-blue-800 font-medium rounded-lg text-sm px-5 py-2 dark:bg-blue-600 dark:hover:bg-blue-700"
                    prop:disabled=move || selected.with(Vec::is_empty)
                    on:click=create
                >
                    "Start chat"
                </button>
                <button
                    type="button"
                    class="text-white bg-gray-800 hover:bg-gray-900 font-medium rounded-lg text-sm px-5 py-2 dark:hover:bg-gray-700"
                    on:click=move |_| set_open.set(false)
                >
                    "Close"
                </button>
            </div>
        </div>
    }
}
