//! Layered tile storage for the city.

use isocity_core::{Sprite, TilePos};

/// Number of layers a fresh grid starts with: the ground and the first structure layer.
pub(crate) const BASE_LAYERS: usize = 2;

/// Sprite slots of one grid cell on one layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tile {
    /// Sprite committed by a build.
    pub sprite: Option<Sprite>,
    /// Transient sprite painted by a hover preview.
    pub hover: Option<Sprite>,
    /// Decoration such as trees, erased by committed builds.
    pub environment: Option<Sprite>,
}

impl Tile {
    /// Whether the tile carries neither a committed sprite nor decoration.
    #[must_use]
    pub fn is_vacant(&self) -> bool {
        self.sprite.is_none() && self.environment.is_none()
    }
}

/// Growable stack of square tile layers.
///
/// Layer zero holds ground and roads; higher layers hold structures and
/// decoration. Every layer has the same dimensions and layers are never
/// removed.
#[derive(Clone, Debug)]
pub struct TileGrid {
    size: u32,
    layers: Vec<Vec<Tile>>,
}

impl TileGrid {
    /// Creates a grid of `size` by `size` tiles holding the base layers.
    #[must_use]
    pub fn new(size: u32) -> Self {
        let mut grid = Self {
            size,
            layers: Vec::with_capacity(BASE_LAYERS),
        };
        for _ in 0..BASE_LAYERS {
            grid.add_layer();
        }
        grid
    }

    /// Number of tiles along each edge.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Number of layers currently allocated.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Whether the tile lies inside the grid.
    #[must_use]
    pub const fn contains(&self, tile: TilePos) -> bool {
        tile.x() < self.size && tile.y() < self.size
    }

    /// Appends an empty layer on top of the stack.
    pub fn add_layer(&mut self) {
        let side = self.size as usize;
        self.layers.push(vec![Tile::default(); side * side]);
    }

    /// Adds layers until at least `count` exist.
    pub fn ensure_layers(&mut self, count: usize) {
        while self.layers.len() < count {
            self.add_layer();
        }
    }

    /// Removes every hover sprite on every layer.
    pub fn clear_hover_sprites(&mut self) {
        self.layers
            .iter_mut()
            .flatten()
            .for_each(|tile| tile.hover = None);
    }

    /// Tile stored at `tile` on `layer`.
    ///
    /// # Panics
    ///
    /// Panics when the layer does not exist or the tile lies outside the grid.
    #[must_use]
    pub fn tile(&self, layer: usize, tile: TilePos) -> &Tile {
        let index = self.index(tile);
        &self.layers[layer][index]
    }

    /// Mutable access to the tile stored at `tile` on `layer`.
    ///
    /// # Panics
    ///
    /// Panics when the layer does not exist or the tile lies outside the grid.
    pub fn tile_mut(&mut self, layer: usize, tile: TilePos) -> &mut Tile {
        let index = self.index(tile);
        &mut self.layers[layer][index]
    }

    /// Every tile of every layer, bottom layer first.
    pub fn tiles(&self) -> impl Iterator<Item = (usize, TilePos, &Tile)> {
        let size = self.size;
        self.layers.iter().enumerate().flat_map(move |(layer, tiles)| {
            tiles.iter().enumerate().map(move |(index, tile)| {
                let index = index as u32;
                (layer, TilePos::new(index % size, index / size), tile)
            })
        })
    }

    fn index(&self, tile: TilePos) -> usize {
        assert!(
            self.contains(tile),
            "tile {tile:?} lies outside a {size}x{size} grid",
            size = self.size
        );
        tile.y() as usize * self.size as usize + tile.x() as usize
    }
}
