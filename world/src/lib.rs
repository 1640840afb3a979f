#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative city state for Isocity.
//!
//! The world owns the layered tile grid, the camera, the treasury and the
//! registry of placed structures. Adapters and systems mutate it only through
//! [`apply`] and read it through the [`query`] module.

pub mod grid;
pub mod placement;
mod structures;
pub mod templates;

use std::time::Duration;

use glam::DVec2;
use isocity_core::{
    capitalize_first,
    projection::{cartesian_to_iso, Camera, Viewport, ZoomLimits},
    Command, DragState, Event, Funds, PlacementError, PlacementMode, Sprite, Structure,
    StructureKind, TemplateLoadError, TilePos,
};
use log::{debug, info, warn};
use serde::Deserialize;

use crate::{
    grid::TileGrid,
    placement::{bulldoze, place_structure},
    structures::StructureRegistry,
    templates::{TemplateCache, TemplateSource},
};

/// Tunable parameters of a fresh world.
///
/// Missing fields fall back to [`WorldConfig::default`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Tiles along each edge of the square grid.
    pub grid_size: u32,
    /// Balance the city starts with.
    pub starting_funds: Funds,
    /// Initial viewport width in pixels.
    pub viewport_width: f64,
    /// Initial viewport height in pixels.
    pub viewport_height: f64,
    /// Smallest camera zoom.
    pub min_zoom: f64,
    /// Largest camera zoom.
    pub max_zoom: f64,
    /// Seconds a player message stays visible.
    pub message_seconds: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid_size: 256,
            starting_funds: 10_000,
            viewport_width: 1280.0,
            viewport_height: 720.0,
            min_zoom: 0.4,
            max_zoom: 4.0,
            message_seconds: 3.0,
        }
    }
}

impl WorldConfig {
    fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits::new(self.min_zoom, self.max_zoom)
    }

    fn message_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.message_seconds).unwrap_or(Duration::ZERO)
    }
}

/// Message displayed to the player until its time runs out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    text: String,
    remaining: Duration,
}

impl Message {
    /// Text shown to the player.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Time left before the message disappears.
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        self.remaining
    }
}

/// Represents the authoritative Isocity world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    pub(crate) grid: TileGrid,
    pub(crate) structures: StructureRegistry,
    camera: Camera,
    viewport: Viewport,
    funds: Funds,
    selection: Option<StructureKind>,
    hover_tile: Option<TilePos>,
    pub(crate) hover_valid: bool,
    drag: DragState,
    last_build: Option<TilePos>,
    hud_dirty: bool,
    message: Option<Message>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl World {
    /// Creates a world from the provided configuration.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        let centre = cartesian_to_iso(DVec2::splat(f64::from(config.grid_size) / 2.0));
        Self {
            grid: TileGrid::new(config.grid_size),
            structures: StructureRegistry::new(),
            camera: Camera::new(centre, 1.0),
            viewport: Viewport::new(config.viewport_width, config.viewport_height),
            funds: config.starting_funds,
            selection: None,
            hover_tile: None,
            hover_valid: true,
            drag: DragState::Idle,
            last_build: None,
            hud_dirty: true,
            message: None,
            config,
        }
    }

    /// Places decoration on a tile, such as a tree, that builds will erase.
    ///
    /// # Panics
    ///
    /// Panics when the layer does not exist or the tile lies outside the grid.
    pub fn decorate(&mut self, layer: usize, tile: TilePos, sprite: Sprite) {
        self.grid.tile_mut(layer, tile).environment = Some(sprite);
    }

    /// Reports whether the HUD needs redrawing and clears the flag.
    pub fn take_hud_refresh(&mut self) -> bool {
        std::mem::take(&mut self.hud_dirty)
    }

    fn show_message(&mut self, text: String, out_events: &mut Vec<Event>) {
        info!("message: {text}");
        self.message = Some(Message {
            text: text.clone(),
            remaining: self.config.message_duration(),
        });
        out_events.push(Event::MessageShown { text });
    }

    /// Builds one structure, returning the amount spent.
    ///
    /// Recoverable failures are reported through events and spend nothing.
    fn build<S: TemplateSource>(
        &mut self,
        templates: &mut TemplateCache<S>,
        kind: StructureKind,
        anchor: TilePos,
        out_events: &mut Vec<Event>,
    ) -> Result<Funds, TemplateLoadError> {
        let cost = kind.cost();
        let outcome = if self.funds < cost {
            Err(PlacementError::InsufficientFunds)
        } else if kind == StructureKind::Bulldozer {
            bulldoze(self, templates, anchor).map(|removed| Event::Bulldozed { anchor, removed })
        } else {
            placement::build(self, templates, kind, anchor).map(|id| Event::StructurePlaced {
                id,
                structure: Structure { kind, anchor },
            })
        };

        match outcome {
            Ok(event) => {
                self.funds -= cost;
                self.hud_dirty = true;
                self.last_build = Some(anchor);
                debug!("built {kind:?} at {anchor:?}, {} left", self.funds);
                out_events.push(event);
                out_events.push(Event::FundsChanged { funds: self.funds });
                Ok(cost)
            }
            Err(PlacementError::TemplateLoad(error)) => {
                warn!("cannot build {kind:?}: {error}");
                Err(error)
            }
            Err(reason) => {
                self.reject(kind, anchor, reason, out_events);
                Ok(0)
            }
        }
    }

    /// Builds a run of structures and reports one total for what was spent.
    ///
    /// The run stops at the first anchor the city can no longer afford; that
    /// anchor is rejected after the total is shown.
    fn build_run<S: TemplateSource>(
        &mut self,
        templates: &mut TemplateCache<S>,
        kind: StructureKind,
        anchors: Vec<TilePos>,
        out_events: &mut Vec<Event>,
    ) -> Result<(), TemplateLoadError> {
        let mut spent = 0;
        let mut unaffordable = None;
        for anchor in anchors {
            if self.funds < kind.cost() {
                unaffordable = Some(anchor);
                break;
            }
            spent += self.build(templates, kind, anchor, out_events)?;
        }
        self.show_build_cost(kind, spent, out_events);
        if let Some(anchor) = unaffordable {
            let _spent = self.build(templates, kind, anchor, out_events)?;
        }
        Ok(())
    }

    fn show_build_cost(&mut self, kind: StructureKind, spent: Funds, out_events: &mut Vec<Event>) {
        if spent > 0 {
            self.show_message(
                capitalize_first(&format!("{}: ${spent}", kind.label())),
                out_events,
            );
        }
    }

    fn reject(
        &mut self,
        kind: StructureKind,
        anchor: TilePos,
        reason: PlacementError,
        out_events: &mut Vec<Event>,
    ) {
        debug!("rejected {kind:?} at {anchor:?}: {reason}");
        let repeated = reason != PlacementError::InsufficientFunds
            && self
                .last_build
                .is_some_and(|last| last.is_adjacent_or_same(anchor));
        if !repeated {
            if let Some(text) = reason.user_message() {
                self.show_message(text, out_events);
            }
        }
        self.last_build = Some(anchor);
        out_events.push(Event::PlacementRejected {
            kind,
            anchor,
            reason,
        });
    }

    fn preview<S: TemplateSource>(
        &mut self,
        templates: &mut TemplateCache<S>,
        kind: StructureKind,
        anchor: TilePos,
        out_events: &mut Vec<Event>,
    ) -> Result<(), TemplateLoadError> {
        match place_structure(self, templates, kind, PlacementMode::Preview, anchor) {
            Ok(_) => out_events.push(Event::PreviewUpdated {
                kind,
                anchor,
                valid: self.hover_valid,
            }),
            Err(PlacementError::TemplateLoad(error)) => return Err(error),
            Err(reason) => {
                debug!("no preview for {kind:?} at {anchor:?}: {reason}");
                self.hover_valid = false;
            }
        }
        Ok(())
    }

    fn tick(&mut self, dt: Duration) {
        self.camera.step_zoom();
        if let Some(message) = self.message.as_mut() {
            message.remaining = message.remaining.saturating_sub(dt);
            if message.remaining.is_zero() {
                self.message = None;
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Placement failures the player can act on are reported through events; the
/// only error returned is a structure template that cannot be loaded.
pub fn apply<S: TemplateSource>(
    world: &mut World,
    templates: &mut TemplateCache<S>,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), TemplateLoadError> {
    match command {
        Command::PlaceStructure { kind, anchor } => {
            let spent = world.build(templates, kind, anchor, out_events)?;
            world.show_build_cost(kind, spent, out_events);
        }
        Command::PlaceStructures { kind, anchors } => {
            world.build_run(templates, kind, anchors, out_events)?;
        }
        Command::PreviewStructure { kind, anchor } => {
            world.preview(templates, kind, anchor, out_events)?;
        }
        Command::ClearHover => world.grid.clear_hover_sprites(),
        Command::SelectStructure { kind } => {
            let next = if kind == world.selection { None } else { kind };
            world.selection = next;
            world.hud_dirty = true;
            out_events.push(Event::SelectionChanged { kind: next });
        }
        Command::SetHoverTile { tile } => world.hover_tile = tile,
        Command::BeginDrag { anchor } => world.drag = DragState::Active { anchor },
        Command::EndDrag => {
            world.drag = DragState::Idle;
            world.last_build = None;
        }
        Command::PanCamera { delta } => {
            world.camera.pan(delta);
            world.camera.clamp_to_grid(world.config.grid_size);
        }
        Command::ZoomCamera { scroll } => {
            let limits = world.config.zoom_limits();
            world.camera.zoom_by(scroll, limits);
        }
        Command::ResizeViewport { width, height } => {
            world.viewport = Viewport::new(width, height);
        }
        Command::Tick { dt } => world.tick(dt),
        Command::Reset => {
            info!("resetting world");
            *world = World::new(world.config.clone());
            out_events.push(Event::WorldReset);
        }
    }
    Ok(())
}

/// Shows a message to the player with its first letter capitalised.
pub fn announce(world: &mut World, text: &str, out_events: &mut Vec<Event>) {
    world.show_message(capitalize_first(text), out_events);
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::DVec2;
    use isocity_core::{
        projection::{Camera, Viewport},
        DragState, Funds, Structure, StructureId, StructureKind, TilePos,
    };

    use super::{grid::TileGrid, Message, World};

    /// Provides read-only access to the layered tile grid.
    #[must_use]
    pub fn grid(world: &World) -> &TileGrid {
        &world.grid
    }

    /// Current balance of the city.
    #[must_use]
    pub fn funds(world: &World) -> Funds {
        world.funds
    }

    /// Camera presenting the world.
    #[must_use]
    pub fn camera(world: &World) -> &Camera {
        &world.camera
    }

    /// Viewport the world is presented in.
    #[must_use]
    pub fn viewport(world: &World) -> Viewport {
        world.viewport
    }

    /// Structure kind selected in the toolbar.
    #[must_use]
    pub fn selection(world: &World) -> Option<StructureKind> {
        world.selection
    }

    /// Tooltip of the selected structure kind.
    #[must_use]
    pub fn tooltip(world: &World) -> Option<&'static str> {
        world.selection.map(StructureKind::label)
    }

    /// Tile under the pointer.
    #[must_use]
    pub fn hover_tile(world: &World) -> Option<TilePos> {
        world.hover_tile
    }

    /// Whether the most recent preview could be committed.
    #[must_use]
    pub fn hover_valid(world: &World) -> bool {
        world.hover_valid
    }

    /// State of the drag-build gesture.
    #[must_use]
    pub fn drag_state(world: &World) -> DragState {
        world.drag
    }

    /// Anchor of the most recent build attempt in the current gesture.
    #[must_use]
    pub fn last_build(world: &World) -> Option<TilePos> {
        world.last_build
    }

    /// Message currently shown to the player.
    #[must_use]
    pub fn message(world: &World) -> Option<&Message> {
        world.message.as_ref()
    }

    /// Whether the HUD must be redrawn.
    #[must_use]
    pub fn hud_dirty(world: &World) -> bool {
        world.hud_dirty
    }

    /// Every registered structure in identifier order.
    #[must_use]
    pub fn structures(world: &World) -> Vec<(StructureId, Structure)> {
        world
            .structures
            .iter()
            .map(|(id, entry)| (id, entry.structure))
            .collect()
    }

    /// Number of registered structures.
    #[must_use]
    pub fn structure_count(world: &World) -> usize {
        world.structures.len()
    }

    /// Structures covering the tile.
    #[must_use]
    pub fn structures_at(world: &World, tile: TilePos) -> Vec<StructureId> {
        world.structures.ids_at(tile)
    }

    /// Resolves the grid tile under a screen position.
    #[must_use]
    pub fn tile_at_screen(world: &World, screen: DVec2) -> Option<TilePos> {
        let cartesian = world.camera.screen_to_cartesian(screen, world.viewport);
        TilePos::from_cartesian(cartesian, world.grid.size())
    }
}
