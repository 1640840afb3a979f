//! Structure placement against the tile grid.
//!
//! Placement runs in phases. [`survey`] computes the footprint and classifies
//! the tiles beneath it, [`validate`] turns that classification into a
//! verdict, and [`preview`] or [`commit`] composite the template's layers
//! into the hover or committed sprite slots.

use isocity_core::{
    Footprint, PlacementError, PlacementMode, Sprite, Structure, StructureId, StructureKind,
    TilePos,
};
use log::debug;

use crate::{
    grid::{Tile, TileGrid},
    templates::{StructureTemplate, TemplateCache, TemplateSource},
    World,
};

/// Classification of the tiles under a footprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Occupancy {
    /// Every tile is free for the structure.
    Free,
    /// A tile already holds something the structure cannot share.
    Blocked {
        /// First blocking tile found, scanning row by row.
        tile: TilePos,
    },
    /// Every tile of a road footprint already carries the road marker.
    Redundant,
}

/// Result of inspecting the grid beneath a candidate footprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Survey {
    kind: StructureKind,
    footprint: Footprint,
    occupancy: Occupancy,
}

impl Survey {
    /// Tiles the structure would cover.
    #[must_use]
    pub const fn footprint(&self) -> Footprint {
        self.footprint
    }

    /// Classification of the covered tiles.
    #[must_use]
    pub const fn occupancy(&self) -> Occupancy {
        self.occupancy
    }

    /// Whether committing at this footprint would succeed.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self.occupancy, Occupancy::Free)
    }

    /// Converts the survey into a committable placement.
    pub fn into_placement(self) -> Result<Placement, PlacementError> {
        match self.occupancy {
            Occupancy::Free => Ok(Placement {
                kind: self.kind,
                footprint: self.footprint,
            }),
            Occupancy::Blocked { .. } => Err(PlacementError::Occupied),
            Occupancy::Redundant => Err(PlacementError::Redundant),
        }
    }
}

/// Footprint that passed validation and may be committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    kind: StructureKind,
    footprint: Footprint,
}

impl Placement {
    /// Kind to build.
    #[must_use]
    pub const fn kind(&self) -> StructureKind {
        self.kind
    }

    /// Tiles the structure covers.
    #[must_use]
    pub const fn footprint(&self) -> Footprint {
        self.footprint
    }
}

/// Computes the footprint of `template` anchored at `anchor`.
pub fn footprint(
    grid: &TileGrid,
    template: &StructureTemplate,
    anchor: TilePos,
) -> Result<Footprint, PlacementError> {
    Footprint::anchored(anchor, template.width(), template.height(), grid.size())
        .ok_or(PlacementError::OutOfBounds)
}

/// Classifies the tiles a structure of `kind` would cover.
///
/// Only a footprint leaving the grid is an error; occupied footprints are
/// reported through [`Survey::occupancy`] so previews can still be painted.
pub fn survey(
    grid: &TileGrid,
    template: &StructureTemplate,
    kind: StructureKind,
    anchor: TilePos,
) -> Result<Survey, PlacementError> {
    let footprint = footprint(grid, template, anchor)?;
    let mut road_tiles = 0;
    let mut occupancy = Occupancy::Free;

    for (_, _, tile) in footprint.cells() {
        let ground = grid.tile(0, tile).sprite;
        let on_road = ground.is_some_and(|sprite| sprite.is_image(template.marker()));
        if kind.is_road() && on_road {
            road_tiles += 1;
        }

        let ground_blocks = ground.is_some() && !(kind.is_road() && on_road);
        let raised_blocks =
            (1..grid.layer_count()).any(|layer| grid.tile(layer, tile).sprite.is_some());
        if ground_blocks || raised_blocks {
            occupancy = Occupancy::Blocked { tile };
            break;
        }
    }

    if occupancy == Occupancy::Free && kind.is_road() && road_tiles == footprint.area() {
        occupancy = Occupancy::Redundant;
    }

    Ok(Survey {
        kind,
        footprint,
        occupancy,
    })
}

/// Checks whether a structure of `kind` may be committed at `anchor`.
pub fn validate(
    grid: &TileGrid,
    template: &StructureTemplate,
    kind: StructureKind,
    anchor: TilePos,
) -> Result<Placement, PlacementError> {
    survey(grid, template, kind, anchor)?.into_placement()
}

/// Paints the template into the hover slots of the surveyed footprint.
///
/// Every footprint cell shows the road marker on the ground. A valid survey
/// also blanks the raised layers so decoration under the would-be structure
/// is hidden. Committed sprites and other previews are left untouched.
pub fn preview(grid: &mut TileGrid, template: &StructureTemplate, survey: &Survey) {
    let marker = Sprite::image(template.marker());
    for (_, _, tile) in survey.footprint.cells() {
        grid.tile_mut(0, tile).hover = Some(marker);
        if survey.is_valid() {
            for layer in 1..grid.layer_count() {
                grid.tile_mut(layer, tile).hover = Some(Sprite::Blank);
            }
        }
    }
    composite(
        grid,
        template,
        survey.kind,
        survey.footprint,
        PlacementMode::Preview,
    );
}

/// Writes the template into the committed slots of a validated placement.
///
/// Every hover sprite in the grid is cleared first. The ground under the
/// footprint receives the road marker and loses its decoration, as does the
/// first structure layer.
pub fn commit(grid: &mut TileGrid, template: &StructureTemplate, placement: &Placement) {
    let marker = Sprite::image(template.marker());
    grid.clear_hover_sprites();
    for (_, _, tile) in placement.footprint.cells() {
        let ground = grid.tile_mut(0, tile);
        ground.sprite = Some(marker);
        ground.environment = None;
        grid.tile_mut(1, tile).environment = None;
    }
    composite(
        grid,
        template,
        placement.kind,
        placement.footprint,
        PlacementMode::Commit,
    );
}

/// Copies every non-empty template cell into the grid, shifted up by the
/// kind's layer offset. Layers are added when the destination does not exist.
fn composite(
    grid: &mut TileGrid,
    template: &StructureTemplate,
    kind: StructureKind,
    footprint: Footprint,
    mode: PlacementMode,
) {
    let offset = kind.layer_offset();
    for (index, layer) in template.layers().iter().enumerate() {
        let destination = index + offset;
        for (dx, dy, tile) in footprint.cells() {
            let Some(sprite) = layer.cell(template.width(), dx, dy) else {
                continue;
            };
            grid.ensure_layers(destination + 1);
            let slot = grid.tile_mut(destination, tile);
            match mode {
                PlacementMode::Preview => slot.hover = Some(Sprite::Image(sprite)),
                PlacementMode::Commit => slot.sprite = Some(Sprite::Image(sprite)),
            }
        }
    }
}

/// Previews or commits a structure in the world.
///
/// A preview updates the world's hover validity and never fails for an
/// occupied footprint. A commit records the structure in the world's
/// registry; committing the bulldozer clears its footprint instead.
pub fn place_structure<S: TemplateSource>(
    world: &mut World,
    templates: &mut TemplateCache<S>,
    kind: StructureKind,
    mode: PlacementMode,
    anchor: TilePos,
) -> Result<Structure, PlacementError> {
    let structure = Structure { kind, anchor };
    match mode {
        PlacementMode::Preview => {
            let template = templates.get(kind)?;
            let survey = survey(&world.grid, template, kind, anchor)?;
            world.hover_valid = survey.is_valid();
            preview(&mut world.grid, template, &survey);
        }
        PlacementMode::Commit if kind == StructureKind::Bulldozer => {
            let _removed = bulldoze(world, templates, anchor)?;
        }
        PlacementMode::Commit => {
            let _id = build(world, templates, kind, anchor)?;
        }
    }
    Ok(structure)
}

/// Commits a structure and registers it, returning its identifier.
pub(crate) fn build<S: TemplateSource>(
    world: &mut World,
    templates: &mut TemplateCache<S>,
    kind: StructureKind,
    anchor: TilePos,
) -> Result<StructureId, PlacementError> {
    let template = templates.get(kind)?;
    let placement = validate(&world.grid, template, kind, anchor)?;
    commit(&mut world.grid, template, &placement);
    let id = world
        .structures
        .insert(Structure { kind, anchor }, placement.footprint());
    debug!("committed {kind:?} at {anchor:?} as {id:?}");
    Ok(id)
}

/// Clears every layer under the bulldozer's footprint at `anchor`.
///
/// Buildings touching the footprint are demolished across their whole
/// footprint and dropped from the registry. Roads only lose the bulldozed
/// tiles and stay registered until none of their tiles remain. Returns the
/// identifiers dropped from the registry.
pub fn bulldoze<S: TemplateSource>(
    world: &mut World,
    templates: &mut TemplateCache<S>,
    anchor: TilePos,
) -> Result<Vec<StructureId>, PlacementError> {
    let template = templates.get(StructureKind::Bulldozer)?;
    let area = footprint(&world.grid, template, anchor)?;

    let occupied = area.cells().any(|(_, _, tile)| {
        (0..world.grid.layer_count()).any(|layer| !world.grid.tile(layer, tile).is_vacant())
    });
    if !occupied {
        return Err(PlacementError::NothingToBulldoze);
    }

    clear_area(&mut world.grid, &area);
    let removed = world.structures.release(&area);
    for (_, entry) in removed
        .iter()
        .filter(|(_, entry)| !entry.structure.kind.is_road())
    {
        clear_area(&mut world.grid, &entry.footprint);
    }
    debug!(
        "bulldozed {anchor:?}, removing {} structures",
        removed.len()
    );
    Ok(removed.into_iter().map(|(id, _)| id).collect())
}

fn clear_area(grid: &mut TileGrid, area: &Footprint) {
    for (_, _, tile) in area.cells() {
        for layer in 0..grid.layer_count() {
            *grid.tile_mut(layer, tile) = Tile::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isocity_core::{SpriteId, SpriteRef};

    use crate::templates::TemplateLayer;

    const MARKER: SpriteId = SpriteId::new(1);

    fn road() -> StructureTemplate {
        let cell = Some(SpriteRef::plain(MARKER));
        StructureTemplate::new(
            StructureKind::Road,
            2,
            2,
            MARKER,
            vec![TemplateLayer::new(vec![cell; 4])],
        )
        .expect("road template")
    }

    fn house() -> StructureTemplate {
        let ground = Some(SpriteRef::plain(MARKER));
        let wall = Some(SpriteRef::plain(SpriteId::new(40)));
        let roof = Some(SpriteRef::plain(SpriteId::new(41)));
        StructureTemplate::new(
            StructureKind::Residential,
            2,
            2,
            MARKER,
            vec![
                TemplateLayer::new(vec![ground; 4]),
                TemplateLayer::new(vec![wall; 4]),
                TemplateLayer::new(vec![None, None, None, roof]),
            ],
        )
        .expect("house template")
    }

    #[test]
    fn survey_rejects_footprints_leaving_the_grid() {
        let grid = TileGrid::new(16);
        let template = house();
        for anchor in [TilePos::new(0, 5), TilePos::new(5, 0), TilePos::new(16, 5)] {
            assert_eq!(
                survey(&grid, &template, StructureKind::Residential, anchor),
                Err(PlacementError::OutOfBounds)
            );
        }
        assert!(survey(&grid, &template, StructureKind::Residential, TilePos::new(1, 1)).is_ok());
    }

    #[test]
    fn commit_grows_layers_for_tall_templates() {
        let mut grid = TileGrid::new(16);
        let template = house();
        let placement = validate(
            &grid,
            &template,
            StructureKind::Residential,
            TilePos::new(5, 5),
        )
        .expect("free");
        commit(&mut grid, &template, &placement);

        assert_eq!(grid.layer_count(), 4);
        assert_eq!(
            grid.tile(0, TilePos::new(5, 5)).sprite,
            Some(Sprite::image(MARKER))
        );
        assert_eq!(
            grid.tile(1, TilePos::new(4, 4)).sprite,
            Some(Sprite::image(MARKER))
        );
        assert_eq!(
            grid.tile(2, TilePos::new(4, 4)).sprite,
            Some(Sprite::image(SpriteId::new(40)))
        );
        assert_eq!(
            grid.tile(3, TilePos::new(5, 5)).sprite,
            Some(Sprite::image(SpriteId::new(41)))
        );
        assert_eq!(grid.tile(3, TilePos::new(4, 4)).sprite, None);
    }

    #[test]
    fn roads_share_marker_tiles_but_not_buildings() {
        let mut grid = TileGrid::new(16);
        let road = road();
        let first = validate(&grid, &road, StructureKind::Road, TilePos::new(5, 5)).expect("free");
        commit(&mut grid, &road, &first);

        let overlap =
            survey(&grid, &road, StructureKind::Road, TilePos::new(6, 5)).expect("inside");
        assert!(overlap.is_valid());

        let same = survey(&grid, &road, StructureKind::Road, TilePos::new(5, 5)).expect("inside");
        assert_eq!(same.occupancy(), Occupancy::Redundant);

        let house = house();
        let blocked = survey(&grid, &house, StructureKind::Residential, TilePos::new(6, 6))
            .expect("inside");
        assert_eq!(
            blocked.occupancy(),
            Occupancy::Blocked {
                tile: TilePos::new(5, 5)
            }
        );
    }

    #[test]
    fn flipped_road_markers_still_join_other_roads() {
        let mut grid = TileGrid::new(16);
        let mut mirrored = SpriteRef::plain(MARKER);
        mirrored.flip.horizontal = true;
        let road = StructureTemplate::new(
            StructureKind::Road,
            2,
            2,
            MARKER,
            vec![TemplateLayer::new(vec![Some(mirrored); 4])],
        )
        .expect("road template");
        let first =
            validate(&grid, &road, StructureKind::Road, TilePos::new(10, 10)).expect("free");
        commit(&mut grid, &road, &first);
        assert_eq!(
            grid.tile(0, TilePos::new(10, 10)).sprite,
            Some(Sprite::Image(mirrored))
        );

        assert!(validate(&grid, &road, StructureKind::Road, TilePos::new(11, 10)).is_ok());
        assert_eq!(
            validate(&grid, &road, StructureKind::Road, TilePos::new(10, 10)),
            Err(PlacementError::Redundant)
        );
    }

    #[test]
    fn invalid_preview_marks_ground_without_blanking() {
        let mut grid = TileGrid::new(16);
        let road = road();
        let placement =
            validate(&grid, &road, StructureKind::Road, TilePos::new(5, 5)).expect("free");
        commit(&mut grid, &road, &placement);
        let committed: Vec<Option<Sprite>> = grid.tiles().map(|(_, _, tile)| tile.sprite).collect();

        let house = house();
        let survey = survey(&grid, &house, StructureKind::Residential, TilePos::new(6, 6))
            .expect("inside");
        preview(&mut grid, &house, &survey);

        assert!(!survey.is_valid());
        for tile in [TilePos::new(5, 5), TilePos::new(6, 6)] {
            assert_eq!(grid.tile(0, tile).hover, Some(Sprite::image(MARKER)));
            assert_eq!(grid.tile(1, tile).hover, Some(Sprite::image(MARKER)));
            assert_eq!(
                grid.tile(2, tile).hover,
                Some(Sprite::image(SpriteId::new(40)))
            );
        }
        assert!(grid.tiles().all(|(_, _, tile)| tile.hover != Some(Sprite::Blank)));
        let after: Vec<Option<Sprite>> = grid
            .tiles()
            .take(committed.len())
            .map(|(_, _, tile)| tile.sprite)
            .collect();
        assert_eq!(after, committed);
    }

    #[test]
    fn valid_preview_hides_decoration_on_raised_layers() {
        let mut grid = TileGrid::new(16);
        let tree = Some(Sprite::image(SpriteId::new(90)));
        grid.tile_mut(1, TilePos::new(4, 4)).environment = tree;

        let road = road();
        let survey = survey(&grid, &road, StructureKind::Road, TilePos::new(5, 5)).expect("inside");
        preview(&mut grid, &road, &survey);

        assert_eq!(grid.tile(1, TilePos::new(4, 4)).hover, Some(Sprite::Blank));
        assert_eq!(grid.tile(1, TilePos::new(4, 4)).environment, tree);
        assert_eq!(grid.tile(0, TilePos::new(4, 4)).hover, Some(Sprite::image(MARKER)));
        assert_eq!(grid.tile(1, TilePos::new(6, 6)).hover, None);
    }

    #[test]
    fn valid_preview_leaves_other_previews_in_place() {
        let mut grid = TileGrid::new(16);
        let road = road();
        for anchor in [TilePos::new(3, 3), TilePos::new(4, 3)] {
            let survey = survey(&grid, &road, StructureKind::Road, anchor).expect("inside");
            assert!(survey.is_valid());
            preview(&mut grid, &road, &survey);
        }

        let hovered = grid
            .tiles()
            .filter(|(layer, _, tile)| *layer == 0 && tile.hover.is_some())
            .count();
        assert_eq!(hovered, 6);
        assert!(grid.tiles().all(|(_, _, tile)| tile.sprite.is_none()));
    }

    #[test]
    fn commit_erases_decoration_and_previews() {
        let mut grid = TileGrid::new(16);
        let tree = Some(Sprite::image(SpriteId::new(90)));
        grid.tile_mut(1, TilePos::new(4, 4)).environment = tree;
        grid.tile_mut(1, TilePos::new(9, 9)).environment = tree;
        grid.tile_mut(0, TilePos::new(12, 12)).hover = Some(Sprite::Blank);

        let road = road();
        let placement =
            validate(&grid, &road, StructureKind::Road, TilePos::new(5, 5)).expect("free");
        commit(&mut grid, &road, &placement);

        assert_eq!(grid.tile(1, TilePos::new(4, 4)).environment, None);
        assert_eq!(grid.tile(1, TilePos::new(9, 9)).environment, tree);
        assert!(grid.tiles().all(|(_, _, tile)| tile.hover.is_none()));
    }
}
