#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Isocity workspace.
//!
//! This crate defines the vocabulary that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what changed. Coordinate conversions between tile, isometric
//! and screen space live in [`projection`].

pub mod projection;

use std::time::Duration;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Amount of money held by the city.
pub type Funds = i64;

/// Kinds of structures the player can build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureKind {
    /// Clears whatever occupies the targeted tiles.
    Bulldozer,
    /// Road segment; may overlap other road segments.
    Road,
    /// Residential zone.
    Residential,
    /// Commercial zone.
    Commercial,
    /// Police station.
    PoliceStation,
}

/// Static attributes shared by every structure of a kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructureSpec {
    /// Kind the row describes.
    pub kind: StructureKind,
    /// Funds deducted for every successful build.
    pub cost: Funds,
    /// Label shown in tooltips.
    pub label: &'static str,
    /// Key used to look the template up in the asset manifest.
    pub template_key: &'static str,
    /// Grid layer receiving the template's first layer.
    pub layer_offset: usize,
    /// Whether holding the pointer keeps building on every frame.
    pub multi_use: bool,
}

static STRUCTURE_TABLE: [StructureSpec; 5] = [
    StructureSpec {
        kind: StructureKind::Bulldozer,
        cost: 5,
        label: "Bulldoze",
        template_key: "bulldozer",
        layer_offset: 1,
        multi_use: true,
    },
    StructureSpec {
        kind: StructureKind::Road,
        cost: 25,
        label: "Road",
        template_key: "road",
        layer_offset: 0,
        multi_use: true,
    },
    StructureSpec {
        kind: StructureKind::Residential,
        cost: 100,
        label: "Residential",
        template_key: "house1",
        layer_offset: 1,
        multi_use: true,
    },
    StructureSpec {
        kind: StructureKind::Commercial,
        cost: 150,
        label: "Commercial",
        template_key: "business1",
        layer_offset: 1,
        multi_use: true,
    },
    StructureSpec {
        kind: StructureKind::PoliceStation,
        cost: 500,
        label: "Police station",
        template_key: "policestation",
        layer_offset: 1,
        multi_use: false,
    },
];

impl StructureKind {
    /// Every structure kind in menu order.
    pub const ALL: [StructureKind; 5] = [
        StructureKind::Bulldozer,
        StructureKind::Road,
        StructureKind::Residential,
        StructureKind::Commercial,
        StructureKind::PoliceStation,
    ];

    /// Row of the static lookup table describing the kind.
    #[must_use]
    pub fn spec(self) -> &'static StructureSpec {
        let index = match self {
            Self::Bulldozer => 0,
            Self::Road => 1,
            Self::Residential => 2,
            Self::Commercial => 3,
            Self::PoliceStation => 4,
        };
        &STRUCTURE_TABLE[index]
    }

    /// Funds deducted for each successful build.
    #[must_use]
    pub fn cost(self) -> Funds {
        self.spec().cost
    }

    /// Tooltip label.
    #[must_use]
    pub fn label(self) -> &'static str {
        self.spec().label
    }

    /// Manifest key of the kind's template.
    #[must_use]
    pub fn template_key(self) -> &'static str {
        self.spec().template_key
    }

    /// Grid layer that receives template layer zero.
    ///
    /// Roads are painted onto the ground layer; everything else is raised one
    /// layer so the ground stays reserved for roads.
    #[must_use]
    pub fn layer_offset(self) -> usize {
        self.spec().layer_offset
    }

    /// Whether the kind is a road.
    #[must_use]
    pub const fn is_road(self) -> bool {
        matches!(self, Self::Road)
    }

    /// Whether holding the pointer keeps building on every frame.
    #[must_use]
    pub fn is_multi_use(self) -> bool {
        self.spec().multi_use
    }

    /// Resolves a kind from its manifest key.
    #[must_use]
    pub fn from_template_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.template_key() == key)
    }
}

/// Location of a single tile expressed as cartesian column and row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    x: u32,
    y: u32,
}

impl TilePos {
    /// Creates a new tile position.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column of the tile.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row of the tile.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Resolves the tile containing a fractional cartesian position.
    ///
    /// Returns `None` when the position lies outside a square grid of
    /// `grid_size` tiles.
    #[must_use]
    pub fn from_cartesian(position: DVec2, grid_size: u32) -> Option<Self> {
        let limit = f64::from(grid_size);
        if !(position.x >= 0.0 && position.y >= 0.0 && position.x < limit && position.y < limit) {
            return None;
        }
        Some(Self::new(position.x.floor() as u32, position.y.floor() as u32))
    }

    /// Reports whether `other` is this tile or one of its eight neighbours.
    #[must_use]
    pub fn is_adjacent_or_same(self, other: TilePos) -> bool {
        self.x.abs_diff(other.x) <= 1 && self.y.abs_diff(other.y) <= 1
    }
}

/// Rectangle of tiles covered by a structure.
///
/// The rectangle is anchored at its bottom-right tile and extends towards the
/// grid origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    origin: TilePos,
    width: u32,
    height: u32,
}

impl Footprint {
    /// Computes the footprint of a `width` by `height` template anchored at `anchor`.
    ///
    /// Returns `None` when the rectangle would leave a square grid of
    /// `grid_size` tiles or when the template has no area.
    #[must_use]
    pub fn anchored(anchor: TilePos, width: u32, height: u32, grid_size: u32) -> Option<Self> {
        if width == 0 || height == 0 || anchor.x() >= grid_size || anchor.y() >= grid_size {
            return None;
        }
        let x = anchor.x().checked_sub(width - 1)?;
        let y = anchor.y().checked_sub(height - 1)?;
        Some(Self {
            origin: TilePos::new(x, y),
            width,
            height,
        })
    }

    /// Top-left tile of the rectangle.
    #[must_use]
    pub const fn origin(&self) -> TilePos {
        self.origin
    }

    /// Bottom-right tile of the rectangle.
    #[must_use]
    pub const fn anchor(&self) -> TilePos {
        TilePos::new(
            self.origin.x + self.width - 1,
            self.origin.y + self.height - 1,
        )
    }

    /// Width in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of tiles covered.
    #[must_use]
    pub const fn area(&self) -> u32 {
        self.width * self.height
    }

    /// Template-relative offset and absolute tile of every covered cell, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, TilePos)> {
        let origin = self.origin;
        let width = self.width;
        (0..self.height).flat_map(move |dy| {
            (0..width).map(move |dx| (dx, dy, TilePos::new(origin.x + dx, origin.y + dy)))
        })
    }
}

/// Identifier of an image inside the tileset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpriteId(u32);

impl SpriteId {
    /// Wraps a tileset identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Mirroring applied when drawing a sprite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlipFlags {
    /// Mirror across the vertical axis.
    pub horizontal: bool,
    /// Mirror across the horizontal axis.
    pub vertical: bool,
    /// Swap the x and y axes.
    pub diagonal: bool,
}

/// Tileset image plus the mirroring it is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteRef {
    /// Image inside the tileset.
    pub id: SpriteId,
    /// Mirroring applied when drawing.
    pub flip: FlipFlags,
}

impl SpriteRef {
    /// Creates an unflipped sprite reference.
    #[must_use]
    pub const fn plain(id: SpriteId) -> Self {
        Self {
            id,
            flip: FlipFlags {
                horizontal: false,
                vertical: false,
                diagonal: false,
            },
        }
    }
}

/// Content stored in one of a tile's sprite slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sprite {
    /// A tileset image.
    Image(SpriteRef),
    /// An explicit empty image that hides whatever would otherwise be drawn.
    Blank,
}

impl Sprite {
    /// Unflipped tileset image.
    #[must_use]
    pub const fn image(id: SpriteId) -> Self {
        Self::Image(SpriteRef::plain(id))
    }

    /// Whether the sprite draws the provided tileset image.
    #[must_use]
    pub fn is_image(&self, id: SpriteId) -> bool {
        matches!(self, Self::Image(sprite) if sprite.id == id)
    }
}

/// Unique identifier allocated to a placed structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureId(u32);

impl StructureId {
    /// Creates a structure identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Record of a structure produced by a successful placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Structure {
    /// Kind of structure.
    pub kind: StructureKind,
    /// Bottom-right tile the template was anchored at.
    pub anchor: TilePos,
}

/// Whether a placement paints a preview or mutates committed tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlacementMode {
    /// Paint hover sprites only.
    Preview,
    /// Write committed sprites.
    Commit,
}

/// Progress of a drag-build gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DragState {
    /// No drag in progress.
    #[default]
    Idle,
    /// The pointer went down on `anchor` and has not been released.
    Active {
        /// Tile the drag started on.
        anchor: TilePos,
    },
}

impl DragState {
    /// Tile the active drag started on, if any.
    #[must_use]
    pub const fn anchor(&self) -> Option<TilePos> {
        match self {
            Self::Idle => None,
            Self::Active { anchor } => Some(*anchor),
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Builds a structure, deducting its cost on success.
    PlaceStructure {
        /// Kind to build.
        kind: StructureKind,
        /// Bottom-right tile of the footprint.
        anchor: TilePos,
    },
    /// Builds a run of structures, reporting the total spent once.
    PlaceStructures {
        /// Kind to build.
        kind: StructureKind,
        /// Bottom-right tile of every footprint, in build order.
        anchors: Vec<TilePos>,
    },
    /// Paints a hover preview of a structure without building it.
    PreviewStructure {
        /// Kind to preview.
        kind: StructureKind,
        /// Bottom-right tile of the footprint.
        anchor: TilePos,
    },
    /// Removes every hover preview sprite.
    ClearHover,
    /// Selects a structure kind, or deselects it when already selected.
    SelectStructure {
        /// Kind to toggle; `None` clears the selection.
        kind: Option<StructureKind>,
    },
    /// Records the tile under the pointer.
    SetHoverTile {
        /// Hovered tile, if the pointer is over the grid.
        tile: Option<TilePos>,
    },
    /// Starts a drag-build gesture.
    BeginDrag {
        /// Tile the pointer went down on.
        anchor: TilePos,
    },
    /// Ends the drag-build gesture and forgets the last build position.
    EndDrag,
    /// Moves the camera by a world-space delta.
    PanCamera {
        /// Offset in isometric world pixels.
        delta: DVec2,
    },
    /// Adjusts the camera zoom target.
    ZoomCamera {
        /// Scroll amount; clamped to `-1.0..=1.0`.
        scroll: f64,
    },
    /// Updates the viewport dimensions.
    ResizeViewport {
        /// Width in pixels.
        width: f64,
        /// Height in pixels.
        height: f64,
    },
    /// Advances timers by the provided delta time.
    Tick {
        /// Duration of time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Restores the world to its initial state.
    Reset,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A structure was built.
    StructurePlaced {
        /// Identifier allocated to the structure.
        id: StructureId,
        /// Placement record.
        structure: Structure,
    },
    /// Tiles were bulldozed.
    Bulldozed {
        /// Bottom-right tile of the cleared area.
        anchor: TilePos,
        /// Structures removed because they overlapped the cleared area.
        removed: Vec<StructureId>,
    },
    /// A build request was rejected.
    PlacementRejected {
        /// Kind requested.
        kind: StructureKind,
        /// Anchor requested.
        anchor: TilePos,
        /// Reason the placement failed.
        reason: PlacementError,
    },
    /// A hover preview was painted.
    PreviewUpdated {
        /// Kind previewed.
        kind: StructureKind,
        /// Anchor previewed.
        anchor: TilePos,
        /// Whether committing at this anchor would succeed.
        valid: bool,
    },
    /// The city's balance changed.
    FundsChanged {
        /// Balance after the change.
        funds: Funds,
    },
    /// The selected structure kind changed.
    SelectionChanged {
        /// Newly selected kind.
        kind: Option<StructureKind>,
    },
    /// A message was shown to the player.
    MessageShown {
        /// Text of the message.
        text: String,
    },
    /// The world returned to its initial state.
    WorldReset,
}

/// Reasons a structure template could not be produced.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum TemplateLoadError {
    /// The asset backing the template does not exist.
    #[error("template for {kind:?} is missing")]
    Missing {
        /// Kind whose template was requested.
        kind: StructureKind,
    },
    /// The asset exists but could not be interpreted.
    #[error("template for {kind:?} is corrupt: {reason}")]
    Corrupt {
        /// Kind whose template was requested.
        kind: StructureKind,
        /// Description of the defect.
        reason: String,
    },
}

/// Reasons a placement request may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// The structure template could not be loaded.
    #[error(transparent)]
    TemplateLoad(#[from] TemplateLoadError),
    /// The footprint extends beyond the grid.
    #[error("invalid location: building does not fit")]
    OutOfBounds,
    /// The footprint overlaps something already built.
    #[error("invalid location: space already occupied")]
    Occupied,
    /// Every tile of a road footprint already carries a road.
    #[error("invalid location: space already occupied")]
    Redundant,
    /// The city cannot afford the structure.
    #[error("insufficient funds")]
    InsufficientFunds,
    /// The bulldozer found nothing to remove.
    #[error("nothing to bulldoze")]
    NothingToBulldoze,
}

impl PlacementError {
    /// Whether the error stops the game rather than being reported to the player.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::TemplateLoad(_))
    }

    /// Message shown to the player, or `None` when the failure stays silent.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::TemplateLoad(_) | Self::NothingToBulldoze => None,
            other => Some(capitalize_first(&other.to_string())),
        }
    }
}

/// Upper-cases the first character of `text`.
#[must_use]
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
