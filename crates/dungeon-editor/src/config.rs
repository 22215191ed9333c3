use std::path::PathBuf;

use dungeon_engine::coords::Color;
use dungeon_engine::window::RuntimeConfig;

pub const DEFAULT_ATLAS_PATH: &str = "Assets/atlas.csv";

/// Editor settings. Defaults match the shipped asset layout.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub atlas_path: PathBuf,
    /// Logical resolution the map layers are authored in.
    pub resolution: [u32; 2],
    /// Edge length of one map cell in logical pixels.
    pub tile_size: i32,
    /// Vertex capacity of each numbered layer.
    pub layer_capacity: u32,
    /// Vertex capacity of the screen layer.
    pub screen_capacity: u32,
    pub grid_line_color: Color,
    pub hover_color: Color,
    pub selection_color: Color,
    pub clear_color: Color,
    pub runtime: RuntimeConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            atlas_path: PathBuf::from(DEFAULT_ATLAS_PATH),
            resolution: [320, 240],
            tile_size: 4,
            layer_capacity: 60_000,
            screen_capacity: 60_000,
            grid_line_color: Color::GREEN,
            hover_color: Color::rgba(255, 255, 0, 150),
            selection_color: Color::rgba(255, 255, 255, 90),
            clear_color: Color::BLACK,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Defaults, with the first argument (if any) taken as the atlas path.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();
        if let Some(path) = args.into_iter().next() {
            config.atlas_path = PathBuf::from(path);
        }
        config
    }

    /// Map size in cells.
    pub fn grid_size(&self) -> (i32, i32) {
        if self.tile_size <= 0 {
            return (0, 0);
        }
        (
            self.resolution[0] as i32 / self.tile_size,
            self.resolution[1] as i32 / self.tile_size,
        )
    }
}
