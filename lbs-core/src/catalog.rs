//! Published, per-kind spatial layers.
//!
//! A [`Layer`] couples a [`SpatialIndex`] with the entities it indexes. A
//! [`SharedLayer`] publishes one layer at a time behind an `Arc`; readers take
//! a snapshot and never observe a half-applied mutation. Writers build the
//! next layer from the current snapshot and swap it in under a per-kind
//! writer lock.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use geo::Rect;
use log::debug;
use parking_lot::{Mutex, RwLock};

use crate::geometry::Location;
use crate::index::SpatialIndex;
use crate::store::GeoStore;
use crate::{Amenity, AmenityId, Area, AreaId, Entity, Route, RouteId};

/// Entities of one kind plus the index over their bounding boxes.
#[derive(Clone)]
pub struct Layer<E: Entity> {
    index: SpatialIndex<E::Id>,
    entities: BTreeMap<E::Id, E>,
}

impl<E: Entity> fmt::Debug for Layer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("kind", &E::KIND)
            .field("entities", &self.entities.len())
            .finish_non_exhaustive()
    }
}

impl<E: Entity> Default for Layer<E> {
    fn default() -> Self {
        Self {
            index: SpatialIndex::default(),
            entities: BTreeMap::new(),
        }
    }
}

impl<E: Entity> Layer<E> {
    /// Bulk-build a layer. A repeated id keeps its last entity.
    pub fn from_entities<I>(entities: I) -> Self
    where
        I: IntoIterator<Item = E>,
    {
        let entities: BTreeMap<E::Id, E> = entities
            .into_iter()
            .map(|entity| (entity.id(), entity))
            .collect();
        let index = SpatialIndex::bulk_load(
            entities
                .values()
                .map(|entity| (entity.id(), entity.bounding_box())),
        );
        Self { index, entities }
    }

    /// Copy of this layer with `entity` inserted or replaced.
    #[must_use]
    pub fn with_upserted(&self, entity: E) -> Self {
        let mut next = self.clone();
        next.index.insert(entity.id(), entity.bounding_box());
        next.entities.insert(entity.id(), entity);
        next
    }

    /// Copy of this layer without `id`.
    #[must_use]
    pub fn without(&self, id: E::Id) -> Self {
        let mut next = self.clone();
        next.index.remove(id);
        next.entities.remove(&id);
        next
    }

    /// Look up one entity.
    #[must_use]
    pub fn get(&self, id: E::Id) -> Option<&E> {
        self.entities.get(&id)
    }

    /// Entities whose boxes intersect `bbox`, ascending by id.
    ///
    /// The result over-approximates; callers apply exact predicates.
    #[must_use]
    pub fn candidates(&self, bbox: &Rect<f64>) -> Vec<&E> {
        self.index
            .query_box(bbox)
            .into_iter()
            .filter_map(|id| self.entities.get(&id))
            .collect()
    }

    /// Up to `k` entities ordered by planar box distance to `point`.
    #[must_use]
    pub fn nearest_candidates(&self, point: Location, k: usize) -> Vec<&E> {
        self.index
            .query_nearest(point, k)
            .into_iter()
            .filter_map(|id| self.entities.get(&id))
            .collect()
    }

    /// Every entity, ascending by id.
    pub fn iter(&self) -> impl Iterator<Item = &E> + '_ {
        self.entities.values()
    }

    /// The underlying index.
    #[must_use]
    pub const fn index(&self) -> &SpatialIndex<E::Id> {
        &self.index
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the layer holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// A layer published for concurrent readers with copy-on-write updates.
pub struct SharedLayer<E: Entity> {
    current: RwLock<Arc<Layer<E>>>,
    writer: Mutex<()>,
}

impl<E: Entity> fmt::Debug for SharedLayer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedLayer")
            .field(&*self.current.read())
            .finish()
    }
}

impl<E: Entity> Default for SharedLayer<E> {
    fn default() -> Self {
        Self::new(Layer::default())
    }
}

impl<E: Entity> SharedLayer<E> {
    /// Publish `layer`.
    #[must_use]
    pub fn new(layer: Layer<E>) -> Self {
        Self {
            current: RwLock::new(Arc::new(layer)),
            writer: Mutex::new(()),
        }
    }

    /// Current layer. Holding the snapshot does not block writers.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Layer<E>> {
        Arc::clone(&self.current.read())
    }

    /// Replace the published layer wholesale.
    pub fn replace(&self, layer: Layer<E>) {
        let _writer = self.writer.lock();
        debug!("rebuilt {} layer with {} entries", E::KIND, layer.len());
        *self.current.write() = Arc::new(layer);
    }

    /// Derive the next layer from the current one and publish it.
    ///
    /// Writers to the same layer are serialised; readers keep whichever
    /// snapshot they already hold.
    pub fn update<F>(&self, derive: F)
    where
        F: FnOnce(&Layer<E>) -> Layer<E>,
    {
        let _writer = self.writer.lock();
        let base = self.snapshot();
        let next = derive(&base);
        *self.current.write() = Arc::new(next);
    }
}

/// A consistent view of all three layers taken at one moment.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    /// Amenity layer.
    pub amenities: Arc<Layer<Amenity>>,
    /// Area layer.
    pub areas: Arc<Layer<Area>>,
    /// Route layer.
    pub routes: Arc<Layer<Route>>,
}

/// One shared layer per entity kind, kept in step with the durable store.
#[derive(Debug, Default)]
pub struct Catalog {
    amenities: SharedLayer<Amenity>,
    areas: SharedLayer<Area>,
    routes: SharedLayer<Route>,
}

impl Catalog {
    /// Build every layer from the store's current contents.
    pub fn load<S: GeoStore>(store: &S) -> Result<Self, S::Error> {
        let catalog = Self::default();
        catalog.reload(store)?;
        Ok(catalog)
    }

    /// Rebuild every layer from the store.
    pub fn reload<S: GeoStore>(&self, store: &S) -> Result<(), S::Error> {
        self.reload_amenities(store)?;
        self.reload_areas(store)?;
        self.reload_routes(store)
    }

    /// Rebuild the amenity layer from the store.
    pub fn reload_amenities<S: GeoStore>(&self, store: &S) -> Result<(), S::Error> {
        self.amenities
            .replace(Layer::from_entities(store.list_amenities()?));
        Ok(())
    }

    /// Rebuild the area layer from the store.
    pub fn reload_areas<S: GeoStore>(&self, store: &S) -> Result<(), S::Error> {
        self.areas.replace(Layer::from_entities(store.list_areas()?));
        Ok(())
    }

    /// Rebuild the route layer from the store.
    pub fn reload_routes<S: GeoStore>(&self, store: &S) -> Result<(), S::Error> {
        self.routes.replace(Layer::from_entities(store.list_routes()?));
        Ok(())
    }

    /// Publish a new or changed amenity.
    pub fn upsert_amenity(&self, amenity: Amenity) {
        self.amenities.update(|layer| layer.with_upserted(amenity));
    }

    /// Publish a new or changed area.
    pub fn upsert_area(&self, area: Area) {
        self.areas.update(|layer| layer.with_upserted(area));
    }

    /// Publish a new or changed route.
    pub fn upsert_route(&self, route: Route) {
        self.routes.update(|layer| layer.with_upserted(route));
    }

    /// Withdraw an amenity.
    pub fn remove_amenity(&self, id: AmenityId) {
        self.amenities.update(|layer| layer.without(id));
    }

    /// Withdraw an area.
    pub fn remove_area(&self, id: AreaId) {
        self.areas.update(|layer| layer.without(id));
    }

    /// Withdraw a route.
    pub fn remove_route(&self, id: RouteId) {
        self.routes.update(|layer| layer.without(id));
    }

    /// Snapshot all layers for one query.
    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            amenities: self.amenities.snapshot(),
            areas: self.areas.snapshot(),
            routes: self.routes.snapshot(),
        }
    }
}
