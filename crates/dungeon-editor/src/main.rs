mod config;
mod console;
mod editor;

use anyhow::{Context, Result};

use dungeon_engine::atlas::TextureAtlas;
use dungeon_engine::device::GpuInit;
use dungeon_engine::logging::{init_logging, LoggingConfig};
use dungeon_engine::window::Runtime;

use config::EditorConfig;
use console::{CommandQueue, Console};
use editor::Editor;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = EditorConfig::from_args(std::env::args().skip(1));
    log::info!("loading atlas from {}", config.atlas_path.display());

    let atlas = TextureAtlas::load(&config.atlas_path)
        .with_context(|| format!("failed to load atlas {}", config.atlas_path.display()))?;

    let commands = CommandQueue::default();
    let console = Console::start(commands.clone()).context("failed to start console thread")?;

    let runtime = config.runtime.clone();
    let editor = Editor::new(config, atlas, commands);
    let result = Runtime::run(runtime, GpuInit::default(), editor);

    console.stop();
    result
}
