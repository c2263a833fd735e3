use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{JmsModel, Marker, Triangle};

/// Triangles whose region is in `region_ids`, in their original order.
///
/// An empty set selects nothing; "all regions" has to be spelled out by the
/// caller (see [`Selection::resolve`]).
pub fn filter_by_region(triangles: &[Triangle], region_ids: &BTreeSet<usize>) -> Vec<Triangle> {
    triangles
        .iter()
        .filter(|triangle| region_ids.contains(&triangle.region))
        .copied()
        .collect()
}

/// Triangles whose permutation is in `permutation_ids`, in their original order.
pub fn filter_by_permutation(
    triangles: &[Triangle],
    permutation_ids: &BTreeSet<usize>,
) -> Vec<Triangle> {
    triangles
        .iter()
        .filter(|triangle| permutation_ids.contains(&triangle.permutation))
        .copied()
        .collect()
}

/// Regions and permutations requested by the caller.
///
/// Empty lists mean "everything"; [`Selection::resolve`] expands them against
/// a concrete model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub regions: Vec<usize>,
    #[serde(default)]
    pub permutations: Vec<usize>,
}

/// A selection with the "empty means all" default already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub regions: BTreeSet<usize>,
    pub permutations: BTreeSet<usize>,
}

impl Selection {
    pub fn resolve(&self, model: &JmsModel) -> ResolvedSelection {
        let regions = if self.regions.is_empty() {
            // Ids referenced past the end of the name list are selected too.
            let referenced = model
                .triangles
                .iter()
                .map(|triangle| triangle.region)
                .chain(model.markers.iter().map(|marker| marker.region));
            (0..model.regions.len()).chain(referenced).collect()
        } else {
            self.regions.iter().copied().collect()
        };

        let permutations = if self.permutations.is_empty() {
            let referenced = model
                .triangles
                .iter()
                .map(|triangle| triangle.permutation)
                .chain(model.markers.iter().map(|marker| marker.permutation));
            (0..model.permutations.len()).chain(referenced).collect()
        } else {
            self.permutations.iter().copied().collect()
        };

        ResolvedSelection {
            regions,
            permutations,
        }
    }
}

impl ResolvedSelection {
    /// Triangles of one region that also belong to a selected permutation.
    pub fn triangles_for_region(&self, triangles: &[Triangle], region: usize) -> Vec<Triangle> {
        let region_ids = BTreeSet::from([region]);
        filter_by_permutation(&filter_by_region(triangles, &region_ids), &self.permutations)
    }
}

/// Markers inside the selection, paired with their position in `markers`.
pub fn filter_markers<'a>(
    markers: &'a [Marker],
    selection: &ResolvedSelection,
) -> Vec<(usize, &'a Marker)> {
    markers
        .iter()
        .enumerate()
        .filter(|(_, marker)| {
            selection.regions.contains(&marker.region)
                && selection.permutations.contains(&marker.permutation)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::RawRotation;
    use crate::model::NO_PARENT;

    fn triangle(first: usize, region: usize, permutation: usize) -> Triangle {
        Triangle {
            vertices: [first, first + 1, first + 2],
            region,
            permutation,
        }
    }

    fn marker(name: &str, region: usize, permutation: usize) -> Marker {
        Marker {
            name: name.to_string(),
            parent_index: NO_PARENT,
            region,
            permutation,
            translation: [0.0; 3],
            rotation: RawRotation::default(),
            radius: 1.0,
        }
    }

    #[test]
    fn given_region_set_when_filtering_then_order_is_preserved() {
        let triangles = vec![
            triangle(0, 1, 0),
            triangle(3, 0, 0),
            triangle(6, 1, 0),
            triangle(9, 2, 0),
        ];

        let filtered = filter_by_region(&triangles, &BTreeSet::from([1, 2]));

        assert_eq!(filtered, vec![triangles[0], triangles[2], triangles[3]]);
    }

    #[test]
    fn given_empty_region_set_when_filtering_then_nothing_is_selected() {
        let triangles = vec![triangle(0, 0, 0)];

        assert!(filter_by_region(&triangles, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn given_empty_selection_when_resolving_then_all_regions_and_permutations_are_selected() {
        let model = JmsModel {
            version: "8200".to_string(),
            regions: vec!["body".to_string(), "head".to_string()],
            permutations: vec!["base".to_string()],
            triangles: vec![triangle(0, 3, 2)],
            ..JmsModel::default()
        };

        let resolved = Selection::default().resolve(&model);

        assert_eq!(resolved.regions, BTreeSet::from([0, 1, 3]));
        assert_eq!(resolved.permutations, BTreeSet::from([0, 2]));
    }

    #[test]
    fn given_explicit_selection_when_filtering_region_triangles_then_permutation_is_applied() {
        let triangles = vec![triangle(0, 0, 0), triangle(3, 0, 1), triangle(6, 1, 1)];
        let model = JmsModel {
            triangles: triangles.clone(),
            ..JmsModel::default()
        };
        let selection = Selection {
            regions: vec![0],
            permutations: vec![1],
        }
        .resolve(&model);

        assert_eq!(selection.triangles_for_region(&triangles, 0), vec![triangles[1]]);
    }

    #[test]
    fn given_markers_when_filtering_then_region_and_permutation_must_both_match() {
        let markers = vec![
            marker("head", 0, 0),
            marker("primary trigger", 1, 0),
            marker("lights", 0, 1),
        ];
        let selection = ResolvedSelection {
            regions: BTreeSet::from([0]),
            permutations: BTreeSet::from([0]),
        };

        let filtered = filter_markers(&markers, &selection);

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].0, 0);
        assert_eq!(filtered[0].1.name, "head");
    }
}
