use dungeon_engine::atlas::TextureAtlas;
use dungeon_engine::coords::{Rect, Vec2, Viewport};
use dungeon_engine::core::{App, AppControl, FrameCtx};
use dungeon_engine::grid::Grid;
use dungeon_engine::input::{InputState, Key, MouseButton};
use dungeon_engine::palette::TexturePalette;
use dungeon_engine::render::{
    LayerDesc, RenderManager, TextureStore, Topology, QUAD_VERTEX_COUNT, SCREEN_LAYER,
};
use dungeon_engine::tilemap::TileMap;

use crate::config::EditorConfig;
use crate::console::{Command, CommandQueue};

// Draw order. The screen layer follows all of these.
const BACKGROUND_LAYER: usize = 0;
const GRID_LAYER: usize = 1;
const OVERLAY_LAYER: usize = 2;
const PALETTE_LAYER: usize = 3;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Cursor,
    TileBrush,
}

impl Tool {
    pub fn from_name(name: &str) -> Option<Tool> {
        match name.to_ascii_lowercase().as_str() {
            "cursor" => Some(Tool::Cursor),
            "brush" | "tilebrush" | "tile_brush" => Some(Tool::TileBrush),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tool::Cursor => "cursor",
            Tool::TileBrush => "tile brush",
        }
    }
}

/// The tile-map editor application.
pub struct Editor {
    config: EditorConfig,
    atlas: TextureAtlas,
    tile_map: TileMap,
    palette: TexturePalette,
    renderer: RenderManager,
    commands: CommandQueue,

    tool: Tool,
    show_grid: bool,
    selected_tile: u32,
    hover: Option<i32>,
    /// Background layer must be rewritten from the tile map.
    tiles_dirty: bool,
    /// Cells painted since the last submit.
    painted: Vec<i32>,
    title_dirty: bool,
}

impl Editor {
    pub fn new(config: EditorConfig, atlas: TextureAtlas, commands: CommandQueue) -> Self {
        let mut textures = TextureStore::new();
        let atlas_texture = textures.add(atlas.image().clone());

        let mut palette = TexturePalette::new(atlas.image());
        let palette_texture = palette.refresh_texture(&mut textures);

        let res = config.resolution;
        let cap = config.layer_capacity;
        let layers = [
            LayerDesc::new("background", Topology::Triangles, cap)
                .with_static(true)
                .with_upscale(res)
                .with_texture(atlas_texture),
            LayerDesc::new("grid", Topology::Lines, cap).with_upscale(res),
            LayerDesc::new("overlay", Topology::Triangles, cap).with_upscale(res),
            LayerDesc::new("palette", Topology::Triangles, cap).with_texture(palette_texture),
        ];
        let screen = LayerDesc::new("screen", Topology::Triangles, config.screen_capacity);
        let renderer = RenderManager::new(textures, &layers, &screen);

        let (columns, rows) = config.grid_size();
        let grid = Grid::new(columns, rows, config.tile_size, config.tile_size, Vec2::zero())
            .with_line_color(config.grid_line_color);
        let tile_map = TileMap::new(grid, atlas.tile_set());

        log::info!(
            "editor: {columns}×{rows} cells, {} tiles, {} sprites",
            tile_map.tile_set().len(),
            atlas.sprite_names().count()
        );

        Self {
            config,
            atlas,
            tile_map,
            palette,
            renderer,
            commands,
            tool: Tool::default(),
            show_grid: true,
            selected_tile: 0,
            hover: None,
            tiles_dirty: true,
            painted: Vec::new(),
            title_dirty: true,
        }
    }

    pub fn set_tool(&mut self, tool: Tool) {
        if self.tool != tool {
            log::debug!("tool: {}", tool.label());
            self.tool = tool;
            self.title_dirty = true;
        }
    }

    // ── update ────────────────────────────────────────────────────────────

    /// Applies one console command.
    pub fn apply_command(&mut self, cmd: Command) -> AppControl {
        match cmd {
            Command::Test => log::info!("console: working"),
            Command::Exit => return AppControl::Exit,
            Command::Tool(tool) => self.set_tool(tool),
            Command::Grid => self.show_grid = !self.show_grid,
            Command::Unknown(text) => log::warn!("unknown command: {text}"),
        }
        AppControl::Continue
    }

    /// Reacts to this frame's input. `viewport` is the window size in the
    /// same physical pixels as the pointer.
    pub fn handle_input(&mut self, input: &InputState, viewport: Viewport) {
        if input.key_pressed(Key::Digit1) {
            self.set_tool(Tool::Cursor);
        }
        if input.key_pressed(Key::Digit2) {
            self.set_tool(Tool::TileBrush);
        }
        if input.key_pressed(Key::Q) {
            self.palette.enabled = !self.palette.enabled;
        }
        if input.key_pressed(Key::G) {
            self.show_grid = !self.show_grid;
        }

        let pointer = input.pointer_position(1.0);
        let over_palette = self.palette.enabled && self.palette.bounds().contains(pointer);

        self.hover = if input.pointer_inside() && !over_palette {
            let scale = viewport.upscale_factor(self.config.resolution[0]);
            self.tile_map.grid().cell_index_at(pointer, scale)
        } else {
            None
        };

        if over_palette {
            if input.mouse_pressed(MouseButton::Left) {
                if let Some(tile) = self.palette.tile_at(pointer, self.tile_map.tile_set()) {
                    log::debug!("selected tile {tile}");
                    self.selected_tile = tile;
                    self.title_dirty = true;
                }
            }
            return;
        }

        if self.tool == Tool::TileBrush && input.mouse_down(MouseButton::Left) {
            if let Some(index) = self.hover {
                if self.tile_map.grid().cell(index) != Some(self.selected_tile)
                    && self.tile_map.paint(index, self.selected_tile)
                {
                    self.painted.push(index);
                }
            }
        }
    }

    // ── draw ──────────────────────────────────────────────────────────────

    /// Queues this frame's vertices into the renderer.
    fn submit_layers(&mut self) {
        for index in self.painted.drain(..) {
            let Some(cell) = self.tile_map.cell_vertices(index) else { continue };
            let offset = index as usize * QUAD_VERTEX_COUNT;
            if self.renderer.overwrite(cell, offset, BACKGROUND_LAYER) < cell.len() {
                self.tiles_dirty = true;
            }
        }

        if self.tiles_dirty {
            self.renderer.reset_layer(BACKGROUND_LAYER);
            self.tile_map.submit(&mut self.renderer, BACKGROUND_LAYER);
            self.tiles_dirty = false;
        }

        if self.show_grid {
            let lines = self.tile_map.grid().build_line_geometry(self.config.resolution);
            self.renderer.draw_buffer(&lines, lines.len(), GRID_LAYER);
        }

        if let Some(index) = self.hover {
            let grid = self.tile_map.grid();
            let cell = Rect::from_origin_size(grid.index_to_position(index, 1.0), grid.cell_size());
            self.renderer.draw_rect(cell, self.config.hover_color, OVERLAY_LAYER);
        }

        self.palette.frame_update(&mut self.renderer, PALETTE_LAYER);

        if self.palette.enabled {
            let selected = self.tile_map.tile_set().get(self.selected_tile as usize).copied();
            if let Some(rect) = selected.filter(|r| !r.is_empty()) {
                let rect = rect.translated(self.palette.position);
                self.renderer.draw_rect(rect, self.config.selection_color, SCREEN_LAYER);
            }
        }
    }

    /// Rewinds the per-frame layers when the frame was not drawn, so the next
    /// drawn frame holds only its own vertices.
    fn finish_frame(&mut self, drawn: bool) {
        if !drawn {
            self.renderer.discard_frame();
        }
    }

    fn title(&self) -> String {
        let tile = self.tile_map.tile_set().get(self.selected_tile as usize).copied();
        let sprite = tile.and_then(|rect| {
            self.atlas.sprite_names().find(|name| self.atlas.sprite(name) == Some(rect))
        });
        match (self.tool, sprite) {
            (Tool::TileBrush, Some(name)) => {
                format!("{} | {} | {name}", self.config.runtime.title, self.tool.label())
            }
            _ => format!("{} | {}", self.config.runtime.title, self.tool.label()),
        }
    }
}

impl App for Editor {
    fn update(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        for cmd in self.commands.drain() {
            if self.apply_command(cmd) == AppControl::Exit {
                log::info!("exit requested from console");
                return AppControl::Exit;
            }
        }

        if ctx.input.key_pressed(Key::Escape) {
            return AppControl::Exit;
        }

        self.handle_input(ctx.input, ctx.window.viewport());

        if self.title_dirty {
            ctx.window.set_title(&self.title());
            self.title_dirty = false;
        }

        AppControl::Continue
    }

    fn frame_update(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        self.submit_layers();

        let renderer = &mut self.renderer;
        let mut drawn = false;
        let control = ctx.render(self.config.clear_color, |rctx, target| {
            renderer.frame_update(rctx, target);
            drawn = true;
        });

        self.finish_frame(drawn);
        control
    }
}

#[cfg(test)]
mod tests {
    use dungeon_engine::atlas::{AtlasDesc, TileSetDesc};
    use dungeon_engine::input::{ButtonAction, InputEvent};
    use dungeon_engine::render::LayerId;
    use image::RgbaImage;

    use super::*;

    fn atlas() -> TextureAtlas {
        let desc = AtlasDesc::parse("sprite,floor,0,0,4,4\nsprite,wall,4,0,4,4\n").unwrap();
        TextureAtlas::from_parts(RgbaImage::new(16, 16), desc, Vec::<TileSetDesc>::new())
    }

    fn editor() -> Editor {
        Editor::new(EditorConfig::default(), atlas(), CommandQueue::default())
    }

    // Window at 4× the logical resolution.
    const VIEWPORT: Viewport = Viewport::new(1280.0, 960.0);

    fn press(input: &mut InputState, key: Key) {
        input.apply_event(InputEvent::Key { key, action: ButtonAction::Press, repeat: false });
    }

    fn click_at(input: &mut InputState, x: f32, y: f32) {
        input.apply_event(InputEvent::PointerMoved { x, y });
        input.apply_event(InputEvent::PointerButton {
            button: MouseButton::Left,
            action: ButtonAction::Press,
        });
    }

    // ── tools and toggles ─────────────────────────────────────────────────

    #[test]
    fn number_keys_switch_tools() {
        let mut e = editor();
        let mut input = InputState::default();

        press(&mut input, Key::Digit2);
        e.handle_input(&input, VIEWPORT);
        assert_eq!(e.tool, Tool::TileBrush);

        input.end_frame();
        press(&mut input, Key::Digit1);
        e.handle_input(&input, VIEWPORT);
        assert_eq!(e.tool, Tool::Cursor);
    }

    #[test]
    fn console_commands_apply() {
        let mut e = editor();
        assert_eq!(e.apply_command(Command::Tool(Tool::TileBrush)), AppControl::Continue);
        assert_eq!(e.tool, Tool::TileBrush);

        let grid = e.show_grid;
        e.apply_command(Command::Grid);
        assert_eq!(e.show_grid, !grid);

        assert_eq!(e.apply_command(Command::Exit), AppControl::Exit);
    }

    #[test]
    fn title_names_tool_and_brush_tile() {
        let mut e = editor();
        assert_eq!(e.title(), "Dungeons | cursor");

        e.set_tool(Tool::TileBrush);
        e.selected_tile = 1;
        assert_eq!(e.title(), "Dungeons | tile brush | wall");
    }

    // ── painting ──────────────────────────────────────────────────────────

    #[test]
    fn brush_paints_hovered_cell() {
        let mut e = editor();
        e.set_tool(Tool::TileBrush);
        e.selected_tile = 1;
        e.submit_layers();

        let mut input = InputState::default();
        // 4× upscale: window (20, 20) is logical (5, 5), cell 81.
        click_at(&mut input, 20.0, 20.0);
        e.handle_input(&input, VIEWPORT);

        assert_eq!(e.tile_map.grid().cell(81), Some(1));
        assert_eq!(e.painted, vec![81]);
    }

    #[test]
    fn cursor_tool_does_not_paint() {
        let mut e = editor();
        e.selected_tile = 1;

        let mut input = InputState::default();
        click_at(&mut input, 20.0, 20.0);
        e.handle_input(&input, VIEWPORT);

        assert_eq!(e.hover, Some(81));
        assert_eq!(e.tile_map.grid().cell(81), Some(0));
    }

    #[test]
    fn palette_click_selects_tile_without_painting() {
        let mut e = editor();
        e.set_tool(Tool::TileBrush);

        let mut input = InputState::default();
        press(&mut input, Key::Q);
        // Inside the "wall" sprite on the palette.
        click_at(&mut input, 5.0, 1.0);
        e.handle_input(&input, VIEWPORT);

        assert_eq!(e.selected_tile, 1);
        assert_eq!(e.hover, None);
        assert!(e.tile_map.grid().cells().iter().all(|&c| c == 0));
    }

    // ── layers ────────────────────────────────────────────────────────────

    #[test]
    fn background_is_written_once_until_painted() {
        let mut e = editor();
        e.submit_layers();

        let cells = e.tile_map.grid().cell_count() as u32;
        let count = |e: &Editor, layer: usize| e.renderer.region(LayerId::Index(layer)).unwrap().count;
        assert_eq!(count(&e, BACKGROUND_LAYER), cells * 6);
        assert_eq!(count(&e, GRID_LAYER), 2 * (80 + 60));

        e.submit_layers();
        assert_eq!(count(&e, BACKGROUND_LAYER), cells * 6);

        assert!(e.tile_map.paint(0, 1));
        e.tiles_dirty = true;
        e.submit_layers();
        assert_eq!(count(&e, BACKGROUND_LAYER), cells * 6);
    }

    #[test]
    fn painting_patches_only_the_painted_cell() {
        let mut e = editor();
        e.submit_layers();
        e.finish_frame(false);

        assert!(e.tile_map.paint(81, 1));
        e.painted.push(81);
        e.submit_layers();

        assert!(!e.tiles_dirty);
        let region = e.renderer.layers()[BACKGROUND_LAYER].region_id();
        let background = e.renderer.batcher().arena().contents(region);
        assert_eq!(background.len(), e.tile_map.vertices().len());
        assert_eq!(Some(&background[81 * 6..82 * 6]), e.tile_map.cell_vertices(81));
        assert_eq!(background[..81 * 6], e.tile_map.vertices()[..81 * 6]);
    }

    #[test]
    fn skipped_frames_keep_dynamic_layers_bounded() {
        let mut e = editor();
        let mut input = InputState::default();
        input.apply_event(InputEvent::PointerMoved { x: 20.0, y: 20.0 });
        e.handle_input(&input, VIEWPORT);

        // Minimized window: every frame is produced but none is drawn.
        for _ in 0..300 {
            e.submit_layers();
            e.finish_frame(false);
        }
        e.submit_layers();

        let count = |e: &Editor, layer: usize| e.renderer.region(LayerId::Index(layer)).unwrap().count;
        assert_eq!(count(&e, GRID_LAYER), 280);
        assert_eq!(count(&e, OVERLAY_LAYER), 6);
        assert_eq!(count(&e, BACKGROUND_LAYER), 80 * 60 * 6);
    }

    #[test]
    fn hidden_grid_writes_no_lines() {
        let mut e = editor();
        e.apply_command(Command::Grid);
        e.submit_layers();
        assert_eq!(e.renderer.region(LayerId::Index(GRID_LAYER)).unwrap().count, 0);
    }
}
