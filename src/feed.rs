use crate::app::{confirm, Ctx};
use crate::message::render_markdown;
use crate::state::{initial, Post};
use leptos::ev::SubmitEvent;
use leptos::*;

#[component]
pub fn Feed() -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let signed_in = {
        let ctx = ctx.clone();
        move || ctx.with(|state| state.session.is_some())
    };
    let posts = move || ctx.with(|state| state.posts.clone());

    view! {
        <main class="lg:w-2/5 w-full lg:max-h-dvh overflow-y-auto p-4 flex flex-col gap-4">
            <h1 class="text-3xl font-bold text-center">"DreamNet"</h1>
            <Show when=signed_in>
                <PostForm />
            </Show>
            {move || {
                let posts = posts();
                if posts.is_empty() {
                    view! { <p class="text-center text-gray-500 dark:text-gray-400">"No posts yet"</p> }
                        .into_view()
                } else {
                    posts.into_iter().map(|post| view! { <PostCard post=post /> }).collect_view()
                }
            }}
        </main>
    }
}

#[component]
fn PostForm() -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let (title, set_title) = create_signal(String::new());
    let (content, set_content) = create_signal(String::new());

    let publish = move |ev: SubmitEvent| {
        ev.prevent_default();
        let (draft_title, draft_content) = (title.get(), content.get());
        set_title.set(String::new());
        set_content.set(String::new());
        ctx.spawn(move |store| async move {
            if store.create_post(&draft_title, &draft_content).await.is_err() {
                // Give the draft back.
                set_title.set(draft_title);
                set_content.set(draft_content);
            }
        });
    };

    view! {
        <form
            class="flex flex-col gap-2 p-4 rounded-xl bg-gray-50 dark:bg-gray-800"
            on:submit=publish
        >
            <input
                type="text"
                placeholder="Title"
                class="p-2.5 text-sm rounded-lg border border-gray-300 dark:bg-gray-700 dark:border-gray-600"
                on:input=move |ev| set_title.set(event_target_value(&ev))
                prop:value=title
            />
            <textarea
                rows="3"
                placeholder="What's on your mind? Markdown works."
                class="p-2.5 text-sm rounded-lg border border-gray-300 dark:bg-gray-700 dark:border-gray-600 resize-none"
                on:input=move |ev| set_content.set(event_target_value(&ev))
                prop:value=content
            ></textarea>
            <button
                type="submit"
                class="self-end text-white bg-blue-700 hover:bg-blue-800 font-medium rounded-lg text-sm px-5 py-2 dark:bg-blue-600 dark:hover:bg-blue-700"
            >
                "Publish"
            </button>
        </form>
    }
}

#[component]
fn PostCard(post: Post) -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let liked = ctx.store.me().is_some_and(|me| post.liked_by(&me));
    let likes = post.likes.len();
    let deletable = ctx.store.can_delete(&post);
    let pending = post.id.is_temp();
    let body = render_markdown(&post.content);
    let initial = initial(&post.author.name);

    let like = {
        let ctx = ctx.clone();
        let id = post.id.clone();
        move |_| {
            let id = id.clone();
            ctx.spawn(move |store| async move {
                let _ = store.toggle_like(&id).await;
            });
        }
    };
    let delete = {
        let id = post.id.clone();
        move |_| {
            let Some(confirmed) = confirm("Delete this post?") else {
                return;
            };
            let id = id.clone();
            ctx.spawn(move |store| async move {
                let _ = store.delete_post(&id, confirmed).await;
            });
        }
    };

    view! {
        <article class="p-4 rounded-xl border border-gray-200 dark:border-gray-700" class:opacity-60=pending>
            <header class="flex items-center gap-2.5 mb-2">
                <div class="w-8 h-8 rounded-full bg-gray-200 dark:bg-gray-700 flex items-center justify-center font-semibold">
                    {initial}
                </div>
                <span class="text-sm font-semibold">{post.author.name.clone()}</span>
                <span class="text-xs text-gray-500 dark:text-gray-400">{post.author.role.label()}</span>
            </header>
            <h2 class="text-lg font-bold">{post.title.clone()}</h2>
            <div class="text-sm" inner_html=body />
            <footer class="flex items-center gap-4 mt-3 text-sm">
                <button
                    type="button"
                    class="hover:text-red-600"
                    class:text-red-600=liked
                    prop:disabled=pending
                    on:click=like
                >
                    {if liked { "♥ " } else { "♡ " }}
                    {likes}
                </button>
                {(deletable && !pending)
                    .then(|| {
                        view! {
                            <button
                                type="button"
                                class="text-gray-500 hover:text-red-600 dark:text-gray-400"
                                on:click=delete
                            >
                                "Delete"
                            </button>
                        }
                    })}
            </footer>
        </article>
    }
}
