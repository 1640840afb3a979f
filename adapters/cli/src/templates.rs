//! Structure templates read from a directory of TOML files.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use isocity_core::{FlipFlags, SpriteId, SpriteRef, StructureKind, TemplateLoadError};
use isocity_world::templates::{StructureTemplate, TemplateLayer, TemplateSource};
use log::debug;
use serde::Deserialize;

/// Directory holding one `<template key>.toml` file per structure kind.
#[derive(Clone, Debug)]
pub(crate) struct TemplateDirectory {
    root: PathBuf,
}

impl TemplateDirectory {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, kind: StructureKind) -> PathBuf {
        self.root.join(format!("{}.toml", kind.template_key()))
    }
}

impl TemplateSource for TemplateDirectory {
    fn load(&mut self, kind: StructureKind) -> Result<StructureTemplate, TemplateLoadError> {
        let path = self.path_for(kind);
        debug!("reading {kind:?} template from {}", path.display());
        let contents = read(&path, kind)?;
        parse_template(kind, &contents)
    }
}

fn read(path: &Path, kind: StructureKind) -> Result<String, TemplateLoadError> {
    fs::read_to_string(path).map_err(|error| match error.kind() {
        io::ErrorKind::NotFound => TemplateLoadError::Missing { kind },
        _ => TemplateLoadError::Corrupt {
            kind,
            reason: format!("failed to read {}: {error}", path.display()),
        },
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateFile {
    marker: u32,
    width: u32,
    height: u32,
    #[serde(default)]
    layers: Vec<LayerFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayerFile {
    cells: Vec<u32>,
    #[serde(default)]
    flips: Vec<String>,
}

fn parse_template(
    kind: StructureKind,
    contents: &str,
) -> Result<StructureTemplate, TemplateLoadError> {
    let corrupt = |reason: String| TemplateLoadError::Corrupt { kind, reason };
    let file: TemplateFile =
        toml::from_str(contents).map_err(|error| corrupt(error.to_string()))?;
    if file.marker == 0 {
        return Err(corrupt("marker sprite id must not be 0".to_owned()));
    }

    let mut layers = Vec::with_capacity(file.layers.len());
    for (index, layer) in file.layers.into_iter().enumerate() {
        if !layer.flips.is_empty() && layer.flips.len() != layer.cells.len() {
            return Err(corrupt(format!(
                "layer {index} has {} flips for {} cells",
                layer.flips.len(),
                layer.cells.len()
            )));
        }
        let mut cells = Vec::with_capacity(layer.cells.len());
        for (position, id) in layer.cells.into_iter().enumerate() {
            if id == 0 {
                cells.push(None);
                continue;
            }
            let flip = match layer.flips.get(position) {
                Some(text) => parse_flip(text).map_err(|reason| {
                    corrupt(format!("layer {index} cell {position}: {reason}"))
                })?,
                None => FlipFlags::default(),
            };
            cells.push(Some(SpriteRef {
                id: SpriteId::new(id),
                flip,
            }));
        }
        layers.push(TemplateLayer::new(cells));
    }

    StructureTemplate::new(
        kind,
        file.width,
        file.height,
        SpriteId::new(file.marker),
        layers,
    )
}

fn parse_flip(text: &str) -> Result<FlipFlags, String> {
    let mut flip = FlipFlags::default();
    for flag in text.chars() {
        match flag {
            'h' => flip.horizontal = true,
            'v' => flip.vertical = true,
            'd' => flip.diagonal = true,
            other => return Err(format!("unknown flip flag `{other}`")),
        }
    }
    Ok(flip)
}
