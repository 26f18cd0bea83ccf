use crate::app::{navigate, Ctx};
use crate::loading::Loading;
use leptos::*;

#[derive(Debug, Clone, PartialEq)]
enum Status {
    Pending,
    Verified(String),
    Failed(String),
}

/// Lands on `/verify/:code`, confirms the address and redirects shortly after.
#[component]
pub fn Verify(code: String) -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let (status, set_status) = create_signal(Status::Pending);
    let delay = ctx.config.redirect_delay;

    ctx.spawn(move |store| async move {
        match store.verify_email(&code).await {
            Ok(verified) => {
                set_status.set(Status::Verified(verified.message));
                let target = verified.redirect;
                set_timeout(move || navigate(&target), delay);
            }
            Err(err) => set_status.set(Status::Failed(err.to_string())),
        }
    });

    view! {
        <div class="min-h-dvh flex items-center justify-center bg-gray-50 dark:bg-gray-900 dark:text-white p-4">
            <div class="w-full max-w-md p-10 text-center rounded-xl shadow bg-white dark:bg-gray-800">
                {move || match status.get() {
                    Status::Pending => {
                        view! {
                            <Loading />
                            <p>"Confirming your email..."</p>
                        }
                            .into_view()
                    }
                    Status::Verified(message) => {
                        view! {
                            <h1 class="text-3xl font-bold text-green-600">"Done!"</h1>
                            <p class="mt-4">{message}</p>
                            <p class="mt-2 text-sm text-gray-500 dark:text-gray-400">
                                "Redirecting in a few seconds..."
                            </p>
                        }
                            .into_view()
                    }
                    Status::Failed(message) => {
                        view! {
                            <h1 class="text-3xl font-bold text-red-600">"Verification failed"</h1>
                            <p class="mt-4">{message}</p>
                            <button
                                type="button"
                                class="mt-6 text-white bg-blue-700 hover:bg-blue-800 font-medium rounded-lg text-sm px-5 py-2.5"
                                on:click=|_| navigate("/")
                            >
                                "Back to DreamNet"
                            </button>
                        }
                            .into_view()
                    }
                }}
            </div>
        </div>
    }
}
