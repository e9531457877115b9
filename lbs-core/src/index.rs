//! Bounding-box index keyed by entity id.
//!
//! [`SpatialIndex`] wraps an [`rstar`] R\*-tree of `(box, id)` entries and a
//! side table mapping ids to their current box so removals are exact. The
//! index never holds entity data; callers resolve ids against their own
//! collections and re-check candidates with exact geometry.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use geo::Rect;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::geometry::Location;

/// One indexed bounding box and the id it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexEntry<K> {
    id: K,
    lower: [f64; 2],
    upper: [f64; 2],
}

impl<K: Copy> IndexEntry<K> {
    fn new(id: K, bbox: Rect<f64>) -> Self {
        Self {
            id,
            lower: [bbox.min().x, bbox.min().y],
            upper: [bbox.max().x, bbox.max().y],
        }
    }

    /// Identifier the box belongs to.
    pub const fn id(&self) -> K {
        self.id
    }
}

impl<K> RTreeObject for IndexEntry<K> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.lower, self.upper)
    }
}

impl<K> PointDistance for IndexEntry<K> {
    // Squared planar distance from the point to the box; zero inside it.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.envelope().distance_2(point)
    }
}

/// R\*-tree over entity bounding boxes.
///
/// # Examples
/// ```
/// use geo::{Coord, Rect};
/// use lbs_core::SpatialIndex;
///
/// let mut index = SpatialIndex::new();
/// index.insert(7_u64, Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }));
/// let hits = index.query_box(&Rect::new(Coord { x: 0.5, y: 0.5 }, Coord { x: 2.0, y: 2.0 }));
/// assert_eq!(hits, vec![7]);
/// ```
#[derive(Clone)]
pub struct SpatialIndex<K> {
    tree: RTree<IndexEntry<K>>,
    boxes: HashMap<K, Rect<f64>>,
}

impl<K> fmt::Debug for SpatialIndex<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("entries", &self.tree.size())
            .finish_non_exhaustive()
    }
}

impl<K> Default for SpatialIndex<K> {
    fn default() -> Self {
        Self {
            tree: RTree::new(),
            boxes: HashMap::new(),
        }
    }
}

impl<K> SpatialIndex<K>
where
    K: Copy + Eq + Ord + Hash,
{
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index in one pass. A repeated id keeps its last box.
    pub fn bulk_load<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Rect<f64>)>,
    {
        let boxes: HashMap<K, Rect<f64>> = entries.into_iter().collect();
        let tree = RTree::bulk_load(
            boxes
                .iter()
                .map(|(id, bbox)| IndexEntry::new(*id, *bbox))
                .collect(),
        );
        Self { tree, boxes }
    }

    /// Replace every entry with `entries`.
    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, Rect<f64>)>,
    {
        *self = Self::bulk_load(entries);
    }

    /// Index `bbox` under `id`, replacing any previous box for that id.
    pub fn insert(&mut self, id: K, bbox: Rect<f64>) {
        if let Some(previous) = self.boxes.insert(id, bbox) {
            self.tree.remove(&IndexEntry::new(id, previous));
        }
        self.tree.insert(IndexEntry::new(id, bbox));
    }

    /// Drop the entry for `id`. Returns `false` when it was not indexed.
    pub fn remove(&mut self, id: K) -> bool {
        self.boxes
            .remove(&id)
            .is_some_and(|bbox| self.tree.remove(&IndexEntry::new(id, bbox)).is_some())
    }

    /// Ids whose boxes intersect `bbox`, edges included, ascending.
    #[must_use]
    pub fn query_box(&self, bbox: &Rect<f64>) -> Vec<K> {
        let envelope =
            AABB::from_corners([bbox.min().x, bbox.min().y], [bbox.max().x, bbox.max().y]);
        let mut ids: Vec<K> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(IndexEntry::id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Up to `k` ids in non-decreasing order of planar distance from `point`
    /// to their boxes. Callers re-rank with true distances.
    #[must_use]
    pub fn query_nearest(&self, point: Location, k: usize) -> Vec<K> {
        self.tree
            .nearest_neighbor_iter(&[point.x, point.y])
            .take(k)
            .map(IndexEntry::id)
            .collect()
    }

    /// Box currently indexed for `id`.
    #[must_use]
    pub fn bounding_box(&self, id: K) -> Option<Rect<f64>> {
        self.boxes.get(&id).copied()
    }

    /// Whether `id` is indexed.
    #[must_use]
    pub fn contains(&self, id: K) -> bool {
        self.boxes.contains_key(&id)
    }

    /// Number of indexed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}
