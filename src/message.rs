use crate::app::Ctx;
use crate::state::{initial, Message as ChatMessage, MessageStatus};
use chrono::{DateTime, Local};
use leptos::ev::SubmitEvent;
use leptos::*;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

const LINK_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Relative urls and the schemes in [`LINK_SCHEMES`]. Browsers ignore
/// whitespace and control characters inside a scheme, so those are dropped first.
fn is_safe_url(url: &str) -> bool {
    let url: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    match url.find([':', '/', '?', '#']) {
        Some(end) if url[end..].starts_with(':') => LINK_SCHEMES
            .iter()
            .any(|scheme| url[..end].eq_ignore_ascii_case(scheme)),
        _ => true,
    }
}

/// Markdown to HTML with any raw HTML in the source shown as text and
/// script-capable link or image targets removed.
pub fn render_markdown(source: &str) -> String {
    let parser = Parser::new_ext(source, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES)
        .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            Event::Start(Tag::Link { link_type, dest_url, title, id }) if !is_safe_url(&dest_url) => {
                Event::Start(Tag::Link { link_type, dest_url: CowStr::Borrowed("#"), title, id })
            }
            Event::Start(Tag::Image { link_type, dest_url, title, id }) if !is_safe_url(&dest_url) => {
                Event::Start(Tag::Image { link_type, dest_url: CowStr::Borrowed(""), title, id })
            }
            event => event,
        });
    let mut rendered = String::new();
    html::push_html(&mut rendered, parser);
    rendered
}

fn status_label(message: &ChatMessage) -> &'static str {
    if message.is_pending() {
        return "Sending...";
    }
    match message.status {
        MessageStatus::Sent => "Delivered",
        MessageStatus::Read => "Read",
    }
}

#[component]
pub fn Message(message: ChatMessage, sender: String, mine: bool) -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let (editing, set_editing) = create_signal(false);
    let (draft, set_draft) = create_signal(message.text.clone());

    let parsed = render_markdown(&message.text);
    let sent_at = message
        .created_at
        .map(|at| DateTime::<Local>::from(at).format("%H:%M").to_string())
        .unwrap_or_default();
    let status = status_label(&message);
    let initial = initial(&sender);
    let actionable = mine && !message.is_pending();

    let save = {
        let ctx = ctx.clone();
        let id = message.id.clone();
        move |ev: SubmitEvent| {
            ev.prevent_default();
            set_editing.set(false);
            let id = id.clone();
            let text = draft.get();
            ctx.spawn(move |store| async move {
                let _ = store.edit_message(&id, &text).await;
            });
        }
    };
    let delete = {
        let id = message.id.clone();
        move |_| {
            let id = id.clone();
            ctx.spawn(move |store| async move {
                let _ = store.delete_message(&id).await;
            });
        }
    };

    view! {
        <div class="flex items-start m-5 gap-2.5" class:flex-row-reverse=mine>
            <div class="w-8 h-8 shrink-0 rounded-full bg-gray-200 dark:bg-gray-600 flex items-center justify-center text-sm font-semibold">
                {initial}
            </div>
            <div class="flex flex-col gap-1 max-w-[90%]">
                <div class="flex items-center space-x-2 rtl:space-x-reverse">
                    <span class="text-sm font-semibold text-gray-900 dark:text-white">{sender}</span>
                    <span class="text-sm font-normal text-gray-500 dark:text-gray-400">{sent_at}</span>
                </div>
                <div class="flex flex-col leading-1.5 p-4 border-gray-200 bg-gray-100 rounded-e-xl rounded-es-xl dark:bg-gray-700">
                    {move || {
                        if editing.get() {
                            view! {
                                <form on:submit=save.clone()>
                                    <input
                                        class="p-1 text-sm w-full rounded border border-gray-300 dark:bg-gray-800 dark:border-gray-600"
                                        on:input=move |ev| set_draft.set(event_target_value(&ev))
                                        prop:value=draft
                                    />
                                </form>
                            }
                                .into_view()
                        } else {
                            view! {
                                <div
                                    class="text-sm font-normal text-gray-900 dark:text-white"
                                    inner_html=parsed.clone()
                                />
                            }
                                .into_view()
                        }
                    }}
                </div>
                <span class="text-xs font-normal text-gray-500 dark:text-gray-400" class:invisible={!mine}>
                    {status}
                </span>
            </div>
            {actionable
                .then(|| {
                    view! {
                        <div class="flex flex-col self-center text-xs text-gray-500 dark:text-gray-400">
                            <button
                                type="button"
                                class="hover:text-gray-900 dark:hover:text-white"
                                on:click=move |_| set_editing.update(|e| *e = !*e)
                            >
                                "Edit"
                            </button>
                            <button type="button" class="hover:text-red-600" on:click=delete>
                                "Delete"
                            </button>
                        </div>
                    }
                })}
        </div>
    }
}
