//! Scripted build orders replayed through the builder system frame by frame.

use std::{str::FromStr, time::Duration};

use anyhow::{Context, Result};
use isocity_core::{Command, Event, StructureKind, TilePos};
use isocity_system_builder::{road_tiles, Builder, BuilderInput};
use isocity_world::{
    apply, query,
    templates::{TemplateCache, TemplateSource},
    World, WorldConfig,
};
use log::debug;

const FRAME: Duration = Duration::from_millis(16);

/// Scripted build request replayed as pointer frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BuildOrder {
    pub(crate) kind: StructureKind,
    pub(crate) from: TilePos,
    pub(crate) to: Option<TilePos>,
}

impl FromStr for BuildOrder {
    type Err = String;

    /// Parses `KIND@X,Y` or `KIND@X,Y:X,Y`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, tiles) = value
            .split_once('@')
            .ok_or_else(|| format!("expected KIND@X,Y in `{value}`"))?;
        let kind = parse_kind(kind)?;
        let (from, to) = match tiles.split_once(':') {
            Some((from, to)) => (parse_tile(from)?, Some(parse_tile(to)?)),
            None => (parse_tile(tiles)?, None),
        };
        Ok(Self { kind, from, to })
    }
}

fn parse_kind(name: &str) -> Result<StructureKind, String> {
    let name = name.trim().to_ascii_lowercase();
    StructureKind::from_template_key(&name)
        .or_else(|| {
            StructureKind::ALL
                .into_iter()
                .find(|kind| format!("{kind:?}").to_ascii_lowercase() == name)
        })
        .ok_or_else(|| format!("unknown structure `{name}`"))
}

fn parse_tile(text: &str) -> Result<TilePos, String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y in `{text}`"))?;
    let coordinate = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|error| format!("invalid coordinate `{part}`: {error}"))
    };
    Ok(TilePos::new(coordinate(x)?, coordinate(y)?))
}

/// Running totals of what a session produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Tally {
    pub(crate) placed: usize,
    pub(crate) bulldozed: usize,
    pub(crate) rejected: usize,
    pub(crate) messages: Vec<String>,
}

impl Tally {
    fn record(&mut self, event: &Event) {
        match event {
            Event::StructurePlaced { .. } => self.placed += 1,
            Event::Bulldozed { .. } => self.bulldozed += 1,
            Event::PlacementRejected { .. } => self.rejected += 1,
            Event::MessageShown { text } => self.messages.push(text.clone()),
            _ => {}
        }
    }
}

/// World, templates and builder system driven frame by frame.
#[derive(Debug)]
pub(crate) struct Session<S> {
    world: World,
    templates: TemplateCache<S>,
    builder: Builder,
    events: Vec<Event>,
    tally: Tally,
}

impl<S: TemplateSource> Session<S> {
    pub(crate) fn new(config: WorldConfig, source: S) -> Self {
        Self {
            world: World::new(config),
            templates: TemplateCache::new(source),
            builder: Builder::new(),
            events: Vec::new(),
            tally: Tally::default(),
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn tally(&self) -> &Tally {
        &self.tally
    }

    /// Selects the order's kind, presses at its start, drags to its end and releases.
    pub(crate) fn run(&mut self, order: &BuildOrder) -> Result<()> {
        debug!("running {order:?}");
        if query::selection(&self.world) != Some(order.kind) {
            self.apply(Command::SelectStructure {
                kind: Some(order.kind),
            })?;
        }
        let to = order.to.unwrap_or(order.from);
        self.frame(BuilderInput::press(order.from))?;
        for tile in road_tiles(order.from, to).into_iter().skip(1) {
            self.frame(BuilderInput::hold(tile))?;
        }
        self.frame(BuilderInput::hover(to))
    }

    fn frame(&mut self, input: BuilderInput) -> Result<()> {
        let events = std::mem::take(&mut self.events);
        let mut commands = Vec::new();
        self.builder.handle(
            &events,
            query::drag_state(&self.world),
            query::last_build(&self.world),
            input,
            &mut commands,
        );
        commands.push(Command::Tick { dt: FRAME });
        for command in commands {
            self.apply(command)?;
        }
        Ok(())
    }

    fn apply(&mut self, command: Command) -> Result<()> {
        let start = self.events.len();
        apply(&mut self.world, &mut self.templates, command, &mut self.events)
            .context("structure template could not be loaded")?;
        for event in &self.events[start..] {
            self.tally.record(event);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isocity_core::{SpriteId, SpriteRef};
    use isocity_world::templates::{StructureTemplate, TemplateLayer, TemplateSet};

    fn session(funds: i64) -> Session<TemplateSet> {
        let marker = SpriteId::new(1);
        let cell = Some(SpriteRef::plain(marker));
        let square = |kind, size: u32, layers: usize| {
            let area = (size * size) as usize;
            StructureTemplate::new(
                kind,
                size,
                size,
                marker,
                vec![TemplateLayer::new(vec![cell; area]); layers],
            )
            .expect("template")
        };
        let set = TemplateSet::new()
            .with(StructureKind::Bulldozer, square(StructureKind::Bulldozer, 1, 1))
            .with(StructureKind::Road, square(StructureKind::Road, 2, 1))
            .with(StructureKind::PoliceStation, square(StructureKind::PoliceStation, 3, 2));
        Session::new(
            WorldConfig {
                grid_size: 48,
                starting_funds: funds,
                ..WorldConfig::default()
            },
            set,
        )
    }

    #[test]
    fn orders_parse_single_tiles_and_drags() {
        assert_eq!(
            "road@3,4:9,4".parse::<BuildOrder>(),
            Ok(BuildOrder {
                kind: StructureKind::Road,
                from: TilePos::new(3, 4),
                to: Some(TilePos::new(9, 4)),
            })
        );
        assert_eq!(
            "house1@ 5, 6".parse::<BuildOrder>().map(|order| order.kind),
            Ok(StructureKind::Residential)
        );
        assert_eq!(
            "PoliceStation@5,6".parse::<BuildOrder>().map(|order| order.to),
            Ok(None)
        );
        for bad in ["road", "castle@1,1", "road@1", "road@-1,2", "road@1,2:3"] {
            assert!(bad.parse::<BuildOrder>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn road_drag_builds_every_tile_of_the_run() {
        let mut session = session(10_000);
        session
            .run(&"road@5,5:9,5".parse().expect("order"))
            .expect("session runs");

        assert_eq!(session.tally().placed, 5);
        assert_eq!(session.tally().messages, vec!["Road: $125".to_owned()]);
        assert_eq!(query::structure_count(session.world()), 5);
        assert_eq!(query::drag_state(session.world()).anchor(), None);
    }

    #[test]
    fn single_use_orders_build_once() {
        let mut session = session(10_000);
        session
            .run(&"policestation@10,10:14,10".parse().expect("order"))
            .expect("session runs");

        assert_eq!(session.tally().placed, 1);
        assert_eq!(session.tally().messages, vec!["Police station: $500".to_owned()]);
        assert_eq!(
            query::funds(session.world()),
            10_000 - StructureKind::PoliceStation.cost()
        );
    }

    #[test]
    fn failures_surface_as_player_messages() {
        let mut session = session(10_000);
        for order in ["policestation@10,10", "policestation@10,10"] {
            session.run(&order.parse().expect("order")).expect("session runs");
        }

        assert_eq!(session.tally().rejected, 1);
        assert_eq!(
            session.tally().messages,
            vec![
                "Police station: $500".to_owned(),
                "Invalid location: space already occupied".to_owned(),
            ]
        );
    }

    #[test]
    fn bulldozer_drag_clears_a_road() {
        let mut session = session(10_000);
        for order in ["road@5,5:9,5", "bulldozer@4,5:9,5", "bulldozer@4,4:9,4"] {
            session.run(&order.parse().expect("order")).expect("session runs");
        }

        assert_eq!(session.tally().bulldozed, 12);
        assert_eq!(query::structure_count(session.world()), 0);
        assert!(query::grid(session.world())
            .tiles()
            .all(|(_, _, tile)| tile.sprite.is_none()));
    }

    #[test]
    fn missing_templates_stop_the_session() {
        let mut session = session(10_000);
        let result = session.run(&"commercial@10,10".parse().expect("order"));
        assert!(result.is_err());
    }
}
