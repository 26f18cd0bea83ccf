use crate::app::Ctx;
use crate::store::Level;
use leptos::*;
use std::collections::HashSet;

/// Transient toasts. Each notice dismisses itself after the configured delay
/// or when clicked.
#[component]
pub fn Notices() -> impl IntoView {
    let ctx = expect_context::<Ctx>();
    let scheduled = store_value(HashSet::<u64>::new());
    let notices = {
        let ctx = ctx.clone();
        move || ctx.with(|state| state.notices.clone())
    };

    create_effect({
        let ctx = ctx.clone();
        let notices = notices.clone();
        move |_| {
            for notice in notices() {
                if scheduled.with_value(|ids| ids.contains(&notice.id)) {
                    continue;
                }
                scheduled.update_value(|ids| {
                    ids.insert(notice.id);
                });
                let store = ctx.store.clone();
                set_timeout(move || store.dismiss(notice.id), ctx.config.notice_ttl);
            }
        }
    });

    view! {
        <div class="fixed bottom-4 right-4 z-50 flex flex-col gap-2 max-w-sm">
            {move || {
                notices()
                    .into_iter()
                    .map(|notice| {
                        let store = ctx.store.clone();
                        let class = match notice.level {
                            Level::Info => "px-4 py-3 rounded-lg shadow text-sm text-white bg-green-600 cursor-pointer",
                            Level::Error => "px-4 py-3 rounded-lg shadow text-sm text-white bg-red-600 cursor-pointer",
                        };
                        view! {
                            <div class=class role="alert" on:click=move |_| store.dismiss(notice.id)>
                                {notice.text}
                            </div>
                        }
                    })
                    .collect_view()
            }}
        </div>
    }
}
