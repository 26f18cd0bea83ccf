use crate::app::{navigate, Ctx};
use crate::loading::Spinner;
use leptos::ev::SubmitEvent;
use leptos::*;

/// Form behind `/reset/:code`. Redirects home once the new password is accepted.
#[component]
pub fn Reset(code: String) -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let (password, set_password) = create_signal(String::new());
    let (confirmation, set_confirmation) = create_signal(String::new());
    let (busy, set_busy) = create_signal(false);
    let (done, set_done) = create_signal(None::<String>);
    let delay = ctx.config.redirect_delay;

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        if busy.get_untracked() {
            return;
        }
        set_busy.set(true);
        let code = code.clone();
        let (password, confirmation) = (password.get(), confirmation.get());
        ctx.spawn(move |store| async move {
            if let Ok(message) = store.reset_password(&code, &password, &confirmation).await {
                set_done.set(Some(message));
                set_timeout(|| navigate("/"), delay);
            }
            set_busy.set(false);
        });
    };

    view! {
        <div class="min-h-dvh flex items-center justify-center bg-gray-50 dark:bg-gray-900 dark:text-white p-4">
            <div class="w-full max-w-sm p-8 rounded-xl shadow bg-white dark:bg-gray-800">
                {move || match done.get() {
                    Some(message) => {
                        view! {
                            <h1 class="text-2xl font-bold text-green-600 text-center">"Password changed"</h1>
                            <p class="mt-4 text-center">{message}</p>
                            <p class="mt-2 text-sm text-center text-gray-500 dark:text-gray-400">
                                "Redirecting in a few seconds..."
                            </p>
                        }
                            .into_view()
                    }
                    None => {
                        view! {
                            <form class="flex flex-col gap-3" on:submit=submit.clone()>
                                <h1 class="text-xl font-semibold text-center">"Choose a new password"</h1>
                                <input
                                    type="password"
                                    placeholder="New password"
                                    class="p-2.5 text-sm rounded-lg border border-gray-300 dark:bg-gray-700 dark:border-gray-600"
                                    on:input=move |ev| set_password.set(event_target_value(&ev))
                                    prop:value=password
                                />
                                <input
                                    type="password"
                                    placeholder="Repeat password"
                                    class="p-2.5 text-sm rounded-lg border border-gray-300 dark:bg-gray-700 dark:border-gray-600"
                                    on:input=move |ev| set_confirmation.set(event_target_value(&ev))
                                    prop:value=confirmation
                                />
                                <button
                                    type="submit"
                                    class="text-white bg-blue-700 hover:bg-blue-800 font-medium rounded-lg text-sm px-5 py-2.5 inline-flex items-center justify-center"
                                    prop:disabled=busy
                                >
                                    {move || busy.get().then(|| view! { <Spinner /> })}
                                    "Save password"
                                </button>
                            </form>
                        }
                            .into_view()
                    }
                }}
            </div>
        </div>
    }
}
