use crate::app::Ctx;
use crate::loading::Spinner;
use leptos::ev::SubmitEvent;
use leptos::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Login,
    Register,
}

#[component]
pub fn Login() -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let (mode, set_mode) = create_signal(Mode::Login);
    let (name, set_name) = create_signal(String::new());
    let (email, set_email) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());
    let (busy, set_busy) = create_signal(false);

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        if busy.get_untracked() {
            return;
        }
        set_busy.set(true);
        let (name, email, password) = (name.get(), email.get(), password.get());
        let mode = mode.get();
        ctx.spawn(move |store| async move {
            // Failures land in the notices.
            let _ = match mode {
                Mode::Login => store.login(&email, &password).await,
                Mode::Register => store.register(&name, &email, &password).await,
            };
            set_busy.set(false);
        });
    };
    let toggle = move |_| {
        set_mode.update(|mode| {
            *mode = match mode {
                Mode::Login => Mode::Register,
                Mode::Register => Mode::Login,
            }
        })
    };

    view! {
        <div class="flex items-center justify-center lg:w-3/5 w-full border-e-2 border-gray-200 bg-gray-50 dark:bg-gray-800 dark:border-gray-700 p-6">
            <form class="flex flex-col gap-3 w-full max-w-sm" on:submit=submit>
                <h2 class="text-xl font-semibold text-center">
                    {move || match mode.get() {
                        Mode::Login => "Sign in to DreamNet",
                        Mode::Register => "Join DreamNet",
                    }}
                </h2>
                <Show when=move || mode.get() == Mode::Register>
                    <input
                        type="text"
                        placeholder="Name"
                        class="p-2.5 text-sm rounded-lg border border-gray-300 dark:bg-gray-700 dark:border-gray-600"
                        on:input=move |ev| set_name.set(event_target_value(&ev))
                        prop:value=name
                    />
                </Show>
                <input
                    type="email"
                    placeholder="Email"
                    class="p-2.5 text-sm rounded-lg border border-gray-300 dark:bg-gray-700 dark:border-gray-600"
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                    prop:value=email
                />
                <input
                    type="password"
                    placeholder="Password"
                    class="p-2.5 text-sm rounded-lg border border-gray-300 dark:bg-gray-700 dark:border-gray-600"
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                    prop:value=password
                />
                <button
                    type="submit"
                    class="text-white bg-blue-700 hover:bg-blue-800 focus:ring-4 focus:ring-blue-300 font-medium rounded-lg text-sm px-5 py-2.5 dark:bg-blue-600 dark:hover:bg-blue-700 focus:outline-none dark:focus:ring-blue-800 inline-flex items-center justify-center"
                    prop:disabled=busy
                >
                    {move || {
                        if busy.get() {
                            view! {
                                <Spinner />
                                "Please wait..."
                            }
                                .into_view()
                        } else {
                            match mode.get() {
                                Mode::Login => "Login",
                                Mode::Register => "Register",
                            }
                                .into_view()
                        }
                    }}
                </button>
                <button
                    type="button"
                    class="text-sm text-blue-600 hover:underline dark:text-blue-400"
                    on:click=toggle
                >
                    {move || match mode.get() {
                        Mode::Login => "No account yet? Register",
                        Mode::Register => "Already registered? Login",
                    }}
                </button>
            </form>
        </div>
    }
}
