//! Texture atlas descriptions.
//!
//! An atlas description is a line-oriented CSV file:
//!
//! ```text
//! atlas,tiles.png
//! tilesets,floor.csv,walls.csv
//! sprite,grass,0,0,4,4
//! sprite,stone,4,0,4,4
//! ```
//!
//! `atlas` selects the backing image, `sprite` registers a named rectangle in
//! texel coordinates and `tilesets` lists tile-set mapping files (`name,id`
//! per line). Paths are relative to the description file. Unknown record kinds
//! and blank lines are ignored.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use image::{Rgba, RgbaImage};

use crate::coords::Rect;

/// Size of the image used when a description names no atlas image.
pub const PLACEHOLDER_SIZE: (u32, u32) = (640, 480);

/// Largest tile id a tile-set file may assign. Tile ids index a dense table.
pub const MAX_TILE_ID: u32 = u16::MAX as u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtlasErrorKind {
    /// A record is shorter than its kind requires.
    MissingField(&'static str),
    /// A numeric field did not parse as an integer.
    BadInteger(String),
    DuplicateSprite(String),
    /// A tile-set id above [`MAX_TILE_ID`].
    TileIdOutOfRange(u32),
}

/// A malformed record in an atlas description or tile-set file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasError {
    /// 1-based line number.
    pub line: usize,
    pub kind: AtlasErrorKind,
}

impl fmt::Display for AtlasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AtlasErrorKind::MissingField(field) => {
                write!(f, "atlas line {}: missing field `{field}`", self.line)
            }
            AtlasErrorKind::BadInteger(s) => {
                write!(f, "atlas line {}: `{s}` is not an integer", self.line)
            }
            AtlasErrorKind::DuplicateSprite(name) => {
                write!(f, "atlas line {}: sprite `{name}` defined twice", self.line)
            }
            AtlasErrorKind::TileIdOutOfRange(id) => {
                write!(f, "atlas line {}: tile id {id} exceeds {MAX_TILE_ID}", self.line)
            }
        }
    }
}

impl std::error::Error for AtlasError {}

/// One `name,id` entry of a tile-set mapping file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMapping {
    pub sprite: String,
    pub id: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileSetDesc {
    pub mappings: Vec<TileMapping>,
}

impl TileSetDesc {
    /// Parses `name,id` lines. Lines with fewer than two fields are skipped.
    pub fn parse(src: &str) -> Result<Self, AtlasError> {
        let mut mappings = Vec::new();
        for (n, line) in src.lines().enumerate() {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() < 2 {
                continue;
            }
            let id = parse_int(fields[1], n + 1)?;
            if id > MAX_TILE_ID {
                return Err(AtlasError {
                    line: n + 1,
                    kind: AtlasErrorKind::TileIdOutOfRange(id),
                });
            }
            mappings.push(TileMapping {
                sprite: fields[0].to_owned(),
                id,
            });
        }
        Ok(Self { mappings })
    }
}

/// Parsed atlas description, before any file is opened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtlasDesc {
    pub image: Option<PathBuf>,
    pub tile_set_files: Vec<PathBuf>,
    /// Sprites in declaration order.
    pub sprites: Vec<(String, Rect)>,
}

impl AtlasDesc {
    pub fn parse(src: &str) -> Result<Self, AtlasError> {
        let mut desc = AtlasDesc::default();

        for (n, line) in src.lines().enumerate() {
            let line_no = n + 1;
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();

            match fields[0] {
                "atlas" => {
                    let path = fields.get(1).ok_or(AtlasError {
                        line: line_no,
                        kind: AtlasErrorKind::MissingField("path"),
                    })?;
                    desc.image = Some(PathBuf::from(path));
                }
                "tilesets" => {
                    desc.tile_set_files
                        .extend(fields[1..].iter().filter(|f| !f.is_empty()).map(PathBuf::from));
                }
                "sprite" => {
                    if fields.len() < 6 {
                        let missing = ["name", "x", "y", "w", "h"][fields.len().saturating_sub(1).min(4)];
                        return Err(AtlasError {
                            line: line_no,
                            kind: AtlasErrorKind::MissingField(missing),
                        });
                    }
                    let name = fields[1];
                    if desc.sprites.iter().any(|(s, _)| s == name) {
                        return Err(AtlasError {
                            line: line_no,
                            kind: AtlasErrorKind::DuplicateSprite(name.to_owned()),
                        });
                    }
                    let rect = Rect::from_px(
                        parse_int(fields[2], line_no)?,
                        parse_int(fields[3], line_no)?,
                        parse_int(fields[4], line_no)?,
                        parse_int(fields[5], line_no)?,
                    );
                    desc.sprites.push((name.to_owned(), rect));
                }
                _ => {}
            }
        }

        Ok(desc)
    }
}

fn parse_int<T: std::str::FromStr>(field: &str, line: usize) -> Result<T, AtlasError> {
    field.parse().map_err(|_| AtlasError {
        line,
        kind: AtlasErrorKind::BadInteger(field.to_owned()),
    })
}

/// An atlas image plus its named sprite rectangles and tile sets.
#[derive(Debug, Clone)]
pub struct TextureAtlas {
    image: RgbaImage,
    sprites: HashMap<String, Rect>,
    order: Vec<String>,
    tile_sets: Vec<TileSetDesc>,
}

impl TextureAtlas {
    /// Reads and parses the description at `path`, then loads the image and
    /// tile-set files it names.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read atlas description {}", path.display()))?;
        let desc = AtlasDesc::parse(&src)
            .with_context(|| format!("malformed atlas description {}", path.display()))?;

        let base = path.parent().unwrap_or(Path::new(""));

        let image = match &desc.image {
            Some(rel) => {
                let img_path = base.join(rel);
                image::open(&img_path)
                    .with_context(|| format!("failed to load atlas image {}", img_path.display()))?
                    .into_rgba8()
            }
            None => {
                log::warn!("atlas {}: no `atlas` record; using placeholder image", path.display());
                placeholder_image(PLACEHOLDER_SIZE.0, PLACEHOLDER_SIZE.1)
            }
        };

        let mut tile_sets = Vec::with_capacity(desc.tile_set_files.len());
        for rel in &desc.tile_set_files {
            let ts_path = base.join(rel);
            let src = std::fs::read_to_string(&ts_path)
                .with_context(|| format!("failed to read tile set {}", ts_path.display()))?;
            tile_sets.push(
                TileSetDesc::parse(&src)
                    .with_context(|| format!("malformed tile set {}", ts_path.display()))?,
            );
        }

        let atlas = Self::from_parts(image, desc, tile_sets);
        log::info!(
            "atlas {}: {}×{} image, {} sprites, {} tile sets",
            path.display(),
            atlas.image.width(),
            atlas.image.height(),
            atlas.order.len(),
            atlas.tile_sets.len()
        );
        Ok(atlas)
    }

    pub fn from_parts(image: RgbaImage, desc: AtlasDesc, tile_sets: Vec<TileSetDesc>) -> Self {
        let order = desc.sprites.iter().map(|(n, _)| n.clone()).collect();
        Self {
            image,
            sprites: desc.sprites.into_iter().collect(),
            order,
            tile_sets,
        }
    }

    #[inline]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn sprite(&self, name: &str) -> Option<Rect> {
        self.sprites.get(name).copied()
    }

    /// Sprite names in declaration order.
    pub fn sprite_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    #[inline]
    pub fn tile_sets(&self) -> &[TileSetDesc] {
        &self.tile_sets
    }

    /// Tile id → texture rectangle table for a tile map.
    ///
    /// Built from the first tile-set file when one exists (ids index the
    /// table, gaps and unknown sprite names become empty rectangles);
    /// otherwise every sprite in declaration order.
    pub fn tile_set(&self) -> Vec<Rect> {
        let Some(first) = self.tile_sets.first() else {
            return self.order.iter().filter_map(|n| self.sprite(n)).collect();
        };

        let mappings = || first.mappings.iter().filter(|m| m.id <= MAX_TILE_ID);
        if mappings().count() < first.mappings.len() {
            log::warn!("tile set has ids above {MAX_TILE_ID}; ignored");
        }

        let len = mappings().map(|m| m.id as usize + 1).max().unwrap_or(0);
        let mut table = vec![Rect::zero(); len];
        for m in mappings() {
            match self.sprite(&m.sprite) {
                Some(rect) => table[m.id as usize] = rect,
                None => log::warn!("tile set refers to unknown sprite `{}`", m.sprite),
            }
        }
        table
    }
}

/// Generated stand-in atlas image.
///
/// Pixels count up in row-major order starting at 1, spread over the red,
/// green and blue bytes; the top-left pixel is white so the default texture
/// rectangle of untextured geometry still samples white.
pub fn placeholder_image(width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::from_fn(width, height, |x, y| {
        let n = (y * width + x + 1) as usize;
        Rgba([n as u8, (n >> 8) as u8, (n >> 16) as u8, 255])
    });
    if width > 0 && height > 0 {
        img.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
    }
    img
}
