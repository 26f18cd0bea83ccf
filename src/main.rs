use dreamnet::config::Config;
use dreamnet::App;
use leptos::*;

fn main() {
    console_error_panic_hook::set_once();
    let level = Config::from_env()
        .map(|config| config.log_level)
        .unwrap_or(log::LevelFilter::Info);
    dreamnet::logging::init(level);
    mount_to_body(|| {
        view! { <App /> }
    })
}
