use super::Point;
use book_model::{CharacterId, FactionId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Initial placement strategy for nodes without a previous position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Uniformly random inside a square centred on the origin.
    #[default]
    Scatter,
    /// One column per primary faction, members stacked with jitter.
    ClusterByFaction,
}

/// A value uniformly distributed in `[-extent / 2, extent / 2)`.
fn spread<R: Rng + ?Sized>(rng: &mut R, extent: f64) -> f64 {
    (rng.gen::<f64>() - 0.5) * extent
}

pub(crate) fn scatter<R: Rng + ?Sized>(rng: &mut R, extent: f64) -> Point {
    let x = spread(rng, extent);
    let y = spread(rng, extent);
    Point { x, y }
}

/// Cluster centres for every character with a primary faction.
pub(crate) struct Clusters {
    slots: HashMap<CharacterId, Point>,
}

impl Clusters {
    /// Group characters by primary faction in order of first occurrence.
    pub(crate) fn new<'a>(
        members: impl IntoIterator<Item = (&'a CharacterId, Option<&'a FactionId>)>,
        cluster_spacing: f64,
        member_spacing: f64,
    ) -> Self {
        let mut groups: Vec<(&FactionId, Vec<&CharacterId>)> = Vec::new();
        for (character, faction) in members {
            let Some(faction) = faction else { continue };
            match groups.iter_mut().find(|(f, _)| *f == faction) {
                Some((_, group)) => group.push(character),
                None => groups.push((faction, vec![character])),
            }
        }

        let columns = groups.len() as f64;
        let mut slots = HashMap::new();
        for (column, (_, group)) in groups.iter().enumerate() {
            let x = (column as f64 - (columns - 1.0) / 2.0) * cluster_spacing;
            let rows = group.len() as f64;
            for (row, character) in group.iter().enumerate() {
                let y = (row as f64 - (rows - 1.0) / 2.0) * member_spacing;
                slots.insert((*character).clone(), Point { x, y });
            }
        }
        Self { slots }
    }

    /// Jittered slot for a clustered character, `None` for the unaffiliated.
    pub(crate) fn place<R: Rng + ?Sized>(&self, character: &CharacterId, jitter: f64, rng: &mut R) -> Option<Point> {
        let centre = self.slots.get(character)?;
        let dx = spread(rng, jitter);
        let dy = spread(rng, jitter);
        Some(Point {
            x: centre.x + dx,
            y: centre.y + dy,
        })
    }
}
