use std::path::PathBuf;

use gpui::*;
use gpui_component::Root;
use gpui_dnd_tree_core::FileStorage;
use tracing_subscriber::EnvFilter;

mod spaces_tree;

use spaces_tree::SpacesTreeStory;

const STATE_DIR_ENV: &str = "DND_TREE_STATE_DIR";

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn state_dir() -> PathBuf {
    std::env::var_os(STATE_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("gpui-dnd-tree"))
}

fn main() {
    init_logging();
    let storage = FileStorage::new(state_dir());
    tracing::info!(dir = %storage.dir().display(), "collapse state directory");

    let app = Application::new();

    app.run(move |cx| {
        gpui_component::init(cx);
        cx.activate(true);

        cx.spawn(async move |cx| {
            cx.open_window(
                WindowOptions {
                    titlebar: Some(TitlebarOptions {
                        title: Some("DnD Tree".into()),
                        appears_transparent: false,
                        traffic_light_position: None,
                    }),
                    ..Default::default()
                },
                |window, cx| {
                    let view = SpacesTreeStory::view(storage, window, cx);
                    cx.new(|cx| Root::new(view, window, cx))
                },
            )?;

            Ok::<_, anyhow::Error>(())
        })
        .detach();
    });
}
