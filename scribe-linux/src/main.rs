mod editor_webview;
mod theme;
mod window;

use libadwaita as adw;
use libadwaita::prelude::*;

const APP_ID: &str = "dev.scribe.Scribe";

fn main() {
    env_logger::init();

    let app = adw::Application::builder().application_id(APP_ID).build();
    app.connect_startup(window::actions::install_app_actions);

    app.connect_activate(move |app| {
        window::build_window(app);
    });

    app.run();
}
