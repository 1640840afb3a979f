//! Text reports printed once a session finishes.

use std::{collections::BTreeMap, fmt::Write as _};

use isocity_core::{StructureId, StructureKind, TilePos};
use isocity_world::{query, World};

use crate::session::Tally;

/// Plain-text account of the session's outcome.
pub(crate) fn summary(world: &World, tally: &Tally) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "funds: {}", query::funds(world));
    let _ = writeln!(text, "structures: {}", query::structure_count(world));
    let _ = writeln!(
        text,
        "placed: {}, bulldozed: {}, rejected: {}",
        tally.placed, tally.bulldozed, tally.rejected
    );
    for message in &tally.messages {
        let _ = writeln!(text, "message: {message}");
    }
    text
}

fn glyph(kind: StructureKind) -> char {
    match kind {
        StructureKind::Road => '=',
        StructureKind::Residential => 'R',
        StructureKind::Commercial => 'C',
        StructureKind::PoliceStation => 'P',
        StructureKind::Bulldozer => '?',
    }
}

/// ASCII map of the smallest rectangle holding every structure.
///
/// Returns `None` when nothing has been built.
pub(crate) fn map(world: &World) -> Option<String> {
    let kinds: BTreeMap<StructureId, StructureKind> = query::structures(world)
        .into_iter()
        .map(|(id, structure)| (id, structure.kind))
        .collect();
    let size = query::grid(world).size();

    let mut covered = BTreeMap::new();
    for y in 0..size {
        for x in 0..size {
            let tile = TilePos::new(x, y);
            if let Some(kind) = query::structures_at(world, tile)
                .last()
                .and_then(|id| kinds.get(id))
            {
                let _ = covered.insert((y, x), glyph(*kind));
            }
        }
    }

    let min_x = covered.keys().map(|&(_, x)| x).min()?;
    let max_x = covered.keys().map(|&(_, x)| x).max()?;
    let min_y = covered.keys().map(|&(y, _)| y).min()?;
    let max_y = covered.keys().map(|&(y, _)| y).max()?;

    let mut text = String::new();
    let _ = writeln!(text, "map from ({min_x}, {min_y}) to ({max_x}, {max_y}):");
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            text.push(covered.get(&(y, x)).copied().unwrap_or('.'));
        }
        text.push('\n');
    }
    Some(text)
}
