//! Structure templates and the load-once cache in front of their source.

use std::collections::HashMap;

use isocity_core::{SpriteId, SpriteRef, StructureKind, TemplateLoadError};
use log::info;

/// One z-layer of a template: `width * height` optional cells stored row by row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateLayer {
    cells: Vec<Option<SpriteRef>>,
}

impl TemplateLayer {
    /// Wraps row-major cells.
    #[must_use]
    pub fn new(cells: Vec<Option<SpriteRef>>) -> Self {
        Self { cells }
    }

    /// Sprite at the template-relative cell, if any.
    #[must_use]
    pub fn cell(&self, width: u32, x: u32, y: u32) -> Option<SpriteRef> {
        let index = y as usize * width as usize + x as usize;
        self.cells.get(index).copied().flatten()
    }

    /// Number of cells stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the layer stores no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Multi-layer tile template describing how a structure is drawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructureTemplate {
    width: u32,
    height: u32,
    marker: SpriteId,
    layers: Vec<TemplateLayer>,
}

impl StructureTemplate {
    /// Assembles a template, checking that every layer covers the full area.
    pub fn new(
        kind: StructureKind,
        width: u32,
        height: u32,
        marker: SpriteId,
        layers: Vec<TemplateLayer>,
    ) -> Result<Self, TemplateLoadError> {
        if width == 0 || height == 0 {
            return Err(TemplateLoadError::Corrupt {
                kind,
                reason: format!("template has no area ({width}x{height})"),
            });
        }
        let area = width as usize * height as usize;
        if let Some((index, layer)) = layers
            .iter()
            .enumerate()
            .find(|(_, layer)| layer.len() != area)
        {
            return Err(TemplateLoadError::Corrupt {
                kind,
                reason: format!(
                    "layer {index} holds {} cells, expected {area}",
                    layer.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            marker,
            layers,
        })
    }

    /// Width of the template in tiles.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the template in tiles.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Road marker sprite of the template's tileset.
    #[must_use]
    pub const fn marker(&self) -> SpriteId {
        self.marker
    }

    /// Layers from bottom to top.
    #[must_use]
    pub fn layers(&self) -> &[TemplateLayer] {
        &self.layers
    }
}

/// External collaborator producing structure templates.
pub trait TemplateSource {
    /// Loads the template describing `kind`.
    fn load(&mut self, kind: StructureKind) -> Result<StructureTemplate, TemplateLoadError>;
}

/// In-memory set of templates keyed by structure kind.
#[derive(Clone, Debug, Default)]
pub struct TemplateSet {
    templates: HashMap<StructureKind, StructureTemplate>,
}

impl TemplateSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the template of `kind`.
    #[must_use]
    pub fn with(mut self, kind: StructureKind, template: StructureTemplate) -> Self {
        let _ = self.templates.insert(kind, template);
        self
    }
}

impl TemplateSource for TemplateSet {
    fn load(&mut self, kind: StructureKind) -> Result<StructureTemplate, TemplateLoadError> {
        self.templates
            .get(&kind)
            .cloned()
            .ok_or(TemplateLoadError::Missing { kind })
    }
}

/// Caches templates per kind after their first successful load.
///
/// Templates are static assets, so entries are never invalidated. Failed
/// loads are not cached.
#[derive(Debug)]
pub struct TemplateCache<S> {
    source: S,
    loaded: HashMap<StructureKind, StructureTemplate>,
}

impl<S: TemplateSource> TemplateCache<S> {
    /// Wraps a template source.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            loaded: HashMap::new(),
        }
    }

    /// Returns the template of `kind`, loading it on first request.
    pub fn get(&mut self, kind: StructureKind) -> Result<&StructureTemplate, TemplateLoadError> {
        if !self.loaded.contains_key(&kind) {
            let template = self.source.load(kind)?;
            info!(
                "loaded {kind:?} template ({}x{}, {} layers)",
                template.width(),
                template.height(),
                template.layers().len()
            );
            let _ = self.loaded.insert(kind, template);
        }
        self.loaded
            .get(&kind)
            .ok_or(TemplateLoadError::Missing { kind })
    }

    /// Number of templates loaded so far.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }
}
