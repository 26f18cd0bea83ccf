use crate::app::{confirm, Ctx};
use crate::state::{ChatId, ChatRole, Profile, UserId};
use leptos::*;

#[derive(Debug, Clone, PartialEq)]
struct Row {
    chat: ChatId,
    user: UserId,
    name: String,
    role: ChatRole,
    manageable: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Roster {
    rows: Vec<Row>,
    candidates: Vec<Profile>,
}

/// Member list of the open chat. Role and removal controls only show for
/// chat admins, and never on the viewer's own row.
#[component]
pub fn Members() -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let (expanded, set_expanded) = create_signal(false);

    let roster = {
        let ctx = ctx.clone();
        move || {
            ctx.with(|state| {
                let (Some(chat), Some(me)) = (state.active(), state.me()) else {
                    return Roster::default();
                };
                let admin = chat.is_admin(me);
                let rows = chat
                    .members
                    .iter()
                    .map(|member| Row {
                        chat: chat.id.clone(),
                        user: member.user.clone(),
                        name: state.directory.name_of(&member.user),
                        role: member.role,
                        manageable: admin && &member.user != me,
                    })
                    .collect();
                let candidates = state
                    .directory
                    .others(me)
                    .into_iter()
                    .filter(|profile| chat.role_of(&profile.id).is_none())
                    .collect();
                Roster {
                    rows,
                    candidates,
                }
            })
        }
    };
    let count = {
        let roster = roster.clone();
        move || roster().rows.len()
    };

    let add = move |ev: ev::Event| {
        let user = UserId::new(event_target_value(&ev));
        if user.as_str().is_empty() {
            return;
        }
        let Some(chat) = ctx.store.read(|state| state.active_chat.clone()) else {
            return;
        };
        ctx.spawn(move |store| async move {
            let _ = store.add_member(&chat, &user).await;
        });
    };

    view! {
        <section class="px-4 py-2 border-b dark:border-gray-800 text-sm">
            <button
                type="button"
                class="text-gray-500 hover:text-gray-900 dark:text-gray-400 dark:hover:text-white"
                on:click=move |_| set_expanded.update(|e| *e = !*e)
            >
                {move || format!("{} members", count())}
            </button>
            {move || {
                expanded
                    .get()
                    .then(|| {
                        let roster = roster();
                        let candidates = roster
                            .candidates
                            .into_iter()
                            .map(|profile| {
                                view! { <option value=profile.id.to_string()>{profile.name}</option> }
                            })
                            .collect_view();
                        view! {
                            <ul class="mt-2 space-y-1">
                                {roster
                                    .rows
                                    .into_iter()
                                    .map(|row| view! { <MemberRow row=row /> })
                                    .collect_view()}
                            </ul>
                            <select
                                class="mt-2 p-1.5 w-full rounded-lg border border-gray-300 dark:bg-gray-700 dark:border-gray-600"
                                on:change=add.clone()
                            >
                                <option value="" selected>
                                    "Add someone..."
                                </option>
                                {candidates}
                            </select>
                        }
                    })
            }}
        </section>
    }
}

#[component]
fn MemberRow(row: Row) -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let promote = {
        let ctx = ctx.clone();
        let (chat, user, role) = (row.chat.clone(), row.user.clone(), row.role.toggled());
        move |_| {
            let (chat, user) = (chat.clone(), user.clone());
            ctx.spawn(move |store| async move {
                let _ = store.change_role(&chat, &user, role).await;
            });
        }
    };
    let remove = {
        let (chat, user, name) = (row.chat.clone(), row.user.clone(), row.name.clone());
        move |_| {
            let Some(confirmed) = confirm(&format!("Remove {name} from this chat?")) else {
                return;
            };
            let (chat, user) = (chat.clone(), user.clone());
            ctx.spawn(move |store| async move {
                let _ = store.remove_member(&chat, &user, confirmed).await;
            });
        }
    };
    let toggle_label = match row.role {
        ChatRole::Admin => "Make member",
        ChatRole::Member => "Make admin",
    };

    view! {
        <li class="flex items-center gap-2">
            <span class="grow truncate">{row.name}</span>
            <span class="text-xs text-gray-500 dark:text-gray-400">{row.role.label()}</span>
            {row
                .manageable
                .then(|| {
                    view! {
                        <button type="button" class="text-xs text-blue-600 hover:underline" on:click=promote>
                            {toggle_label}
                        </button>
                        <button type="button" class="text-xs text-red-600 hover:underline" on:click=remove>
                            "Remove"
                        </button>
                    }
                })}
        </li>
    }
}
