#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure build-mode system that turns pointer input into placement commands.

use isocity_core::{Command, DragState, Event, StructureKind, TilePos};
use log::debug;

/// Pointer snapshot distilled from adapter-provided frame input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderInput {
    /// Tile under the pointer, or `None` when the pointer is off the grid.
    pub pointer: Option<TilePos>,
    /// Whether the primary button is held on this frame.
    pub pressed: bool,
    /// Whether the primary button went down on this frame.
    pub just_pressed: bool,
}

impl BuilderInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(pointer: Option<TilePos>, pressed: bool, just_pressed: bool) -> Self {
        Self {
            pointer,
            pressed,
            just_pressed,
        }
    }

    /// Pointer resting over `tile` with the button up.
    #[must_use]
    pub const fn hover(tile: TilePos) -> Self {
        Self::new(Some(tile), false, false)
    }

    /// Button going down over `tile`.
    #[must_use]
    pub const fn press(tile: TilePos) -> Self {
        Self::new(Some(tile), true, true)
    }

    /// Button held over `tile`.
    #[must_use]
    pub const fn hold(tile: TilePos) -> Self {
        Self::new(Some(tile), true, false)
    }
}

/// Tiles visited by a straight road run from `from` to `to`, both inclusive.
///
/// The direction is halved until both components lie within one tile, then
/// walked from `from` until `to` is reached exactly. Positions are truncated
/// to tiles and repeated tiles from sub-tile steps are collapsed.
#[must_use]
pub fn road_tiles(from: TilePos, to: TilePos) -> Vec<TilePos> {
    let (mut x, mut y) = (f64::from(from.x()), f64::from(from.y()));
    let (end_x, end_y) = (f64::from(to.x()), f64::from(to.y()));
    let (mut dx, mut dy) = (end_x - x, end_y - y);
    while dx.abs() > 1.0 || dy.abs() > 1.0 {
        dx /= 2.0;
        dy /= 2.0;
    }

    let mut tiles = vec![from];
    while x != end_x || y != end_y {
        x += dx;
        y += dy;
        let tile = TilePos::new(x as u32, y as u32);
        if tiles.last() != Some(&tile) {
            tiles.push(tile);
        }
    }
    tiles
}

/// Build-mode system that translates selection and pointer input into commands.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    selection: Option<StructureKind>,
}

impl Builder {
    /// Creates a new builder system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self { selection: None }
    }

    /// Structure kind the builder believes is selected.
    #[must_use]
    pub const fn selection(&self) -> Option<StructureKind> {
        self.selection
    }

    /// Consumes world events and adapter-derived input to emit build commands.
    ///
    /// `drag` and `last_build` mirror the world's `query::drag_state` and
    /// `query::last_build` helpers.
    pub fn handle(
        &mut self,
        events: &[Event],
        drag: DragState,
        last_build: Option<TilePos>,
        input: BuilderInput,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::SelectionChanged { kind } => self.selection = *kind,
                Event::WorldReset => self.selection = None,
                _ => {}
            }
        }

        let Some(kind) = self.selection else {
            if drag.anchor().is_some() {
                out.push(Command::EndDrag);
            }
            return;
        };

        let Some(pointer) = input.pointer else {
            out.push(Command::ClearHover);
            return;
        };

        let build_now = input.just_pressed || (kind.is_multi_use() && input.pressed);
        let dragging = drag.anchor();

        if build_now || dragging.is_some() {
            let anchor = dragging.unwrap_or(pointer);
            if dragging.is_none() {
                out.push(Command::BeginDrag { anchor });
            }
            let released = dragging.is_some() && !input.pressed;

            if kind.is_road() {
                let tiles = road_tiles(anchor, pointer);
                out.push(Command::ClearHover);
                if released {
                    debug!("road run from {anchor:?} to {pointer:?} over {} tiles", tiles.len());
                    out.push(Command::PlaceStructures {
                        kind,
                        anchors: tiles,
                    });
                    out.push(Command::EndDrag);
                } else {
                    out.extend(
                        tiles
                            .into_iter()
                            .map(|anchor| Command::PreviewStructure { kind, anchor }),
                    );
                }
            } else {
                if released {
                    out.push(Command::EndDrag);
                }
                out.push(Command::ClearHover);
                if build_now {
                    out.push(Command::PlaceStructure {
                        kind,
                        anchor: pointer,
                    });
                }
                out.push(Command::PreviewStructure {
                    kind,
                    anchor: pointer,
                });
            }
        } else {
            if last_build.is_some() {
                out.push(Command::EndDrag);
            }
            out.push(Command::ClearHover);
            out.push(Command::PreviewStructure {
                kind,
                anchor: pointer,
            });
        }

        out.push(Command::SetHoverTile {
            tile: Some(pointer),
        });
    }
}
