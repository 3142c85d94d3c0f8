// Split a decoded layer into features that stay inside the tile (emitted now)
// and features that cross its edges (kept for cross-tile stitching).

use tracing::info;

use crate::error::Result;
use crate::feature::{Feature, Layer};

/// Destination for features that lie fully inside their tile.
pub trait FeatureSink {
    fn emit(&mut self, feature: &Feature) -> Result<()>;
}

impl FeatureSink for Vec<Feature> {
    fn emit(&mut self, feature: &Feature) -> Result<()> {
        self.push(feature.clone());
        Ok(())
    }
}

/// Outcome of partitioning one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    pub layer: String,
    /// Number of features written to the sink.
    pub emitted: usize,
    /// Features crossing at least one tile edge, in input order.
    pub remainder: Vec<Feature>,
}

/// Emit every inside-tile feature of `layer` to `sink`, in order, and return
/// the boundary-crossing rest.
pub fn partition<S: FeatureSink + ?Sized>(layer: Layer, sink: &mut S) -> Result<Partition> {
    let total = layer.features.len();
    let mut emitted = 0;
    let mut remainder = Vec::new();

    for feature in layer.features {
        if feature.is_within_tile() {
            sink.emit(&feature)?;
            emitted += 1;
        } else {
            remainder.push(feature);
        }
    }

    info!(
        "Extracted {} {} features, left with {} that spanned the tile",
        total,
        layer.name,
        remainder.len()
    );

    Ok(Partition {
        layer: layer.name,
        emitted,
        remainder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InvalidFeaturePolicy;
    use crate::feature::{assemble_layer, RawFeature, RawLayer};
    use crate::geometry::{GeomKind, Operation};
    use proptest::prelude::*;

    fn raw_layer(points: &[(i64, i64)]) -> RawLayer {
        RawLayer {
            name: "places".to_string(),
            extent: 256,
            version: 2,
            keys: vec![],
            values: vec![],
            features: points
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| RawFeature {
                    id: Some(i as u64),
                    kind: GeomKind::Point,
                    ops: vec![Operation::move_to(x, y)],
                    tags: vec![],
                })
                .collect(),
        }
    }

    #[test]
    fn splits_inside_from_crossing() {
        let layer = assemble_layer(
            &raw_layer(&[(1, 1), (-1, 5), (200, 200), (300, 10)]),
            InvalidFeaturePolicy::Abort,
        )
        .unwrap();

        let mut sink: Vec<Feature> = Vec::new();
        let part = partition(layer, &mut sink).unwrap();

        assert_eq!(part.layer, "places");
        assert_eq!(part.emitted, 2);
        assert_eq!(sink.iter().map(|f| f.id).collect::<Vec<_>>(), vec![Some(0), Some(2)]);
        assert_eq!(
            part.remainder.iter().map(|f| f.id).collect::<Vec<_>>(),
            vec![Some(1), Some(3)]
        );
    }

    proptest! {
        #[test]
        fn partition_is_complete_and_disjoint(
            points in prop::collection::vec((-50i64..300, -50i64..300), 0..40)
        ) {
            let layer = assemble_layer(&raw_layer(&points), InvalidFeaturePolicy::Abort).unwrap();
            let total = layer.features.len();

            let mut sink: Vec<Feature> = Vec::new();
            let part = partition(layer, &mut sink).unwrap();

            prop_assert_eq!(part.emitted, sink.len());
            prop_assert_eq!(sink.len() + part.remainder.len(), total);

            let mut ids: Vec<u64> = sink
                .iter()
                .chain(part.remainder.iter())
                .filter_map(|f| f.id)
                .collect();
            ids.sort_unstable();
            prop_assert_eq!(ids, (0..total as u64).collect::<Vec<_>>());
        }
    }
}
