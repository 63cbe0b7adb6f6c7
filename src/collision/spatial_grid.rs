// Sparse uniform grid used as the broad phase: it turns collider AABBs into
// a sorted stream of pair begin/end events for the contact registry.

use std::collections::{BTreeSet, HashMap};

use tracing::trace;

use crate::collision::AABB;
use crate::math::vec2::Vec2;
use crate::objects::ColliderHandle;

/// Canonical unordered pair of colliders: `a` always has the lower index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub a: ColliderHandle,
    pub b: ColliderHandle,
}

impl PairKey {
    pub fn new(x: ColliderHandle, y: ColliderHandle) -> Self {
        if x <= y {
            PairKey { a: x, b: y }
        } else {
            PairKey { a: y, b: x }
        }
    }

    pub fn contains(&self, collider: ColliderHandle) -> bool {
        self.a == collider || self.b == collider
    }
}

/// A change in the set of overlapping proxy pairs since the previous update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairEvent {
    Begin(PairKey),
    End(PairKey),
}

/// Grid cells overlapped by at least one proxy.
#[derive(Debug, Default, Clone)]
struct GridCell {
    proxy_ids: Vec<usize>,
}

/// A sparse uniform grid over fattened collider AABBs.
///
/// Proxies are stored with a margin so small motions do not churn the grid.
/// [`SpatialGrid::update_pairs`] reports only the pairs that started or
/// stopped overlapping, ends first, each group in ascending key order.
#[derive(Debug)]
pub struct SpatialGrid {
    inv_cell_size: f64,
    margin: f64,
    proxies: Vec<Option<AABB>>,
    cells: HashMap<(i64, i64), GridCell>,
    pairs: BTreeSet<PairKey>,
}

impl SpatialGrid {
    /// Creates an empty grid.
    ///
    /// # Arguments
    /// * `cell_size` - The width/height of each grid cell.
    /// * `margin` - How far proxy AABBs are fattened beyond the tight bounds.
    pub fn new(cell_size: f64, margin: f64) -> Self {
        assert!(cell_size > 0.0, "Cell size must be positive");
        SpatialGrid {
            inv_cell_size: 1.0 / cell_size,
            margin: margin.max(0.0),
            proxies: Vec::new(),
            cells: HashMap::new(),
            pairs: BTreeSet::new(),
        }
    }

    /// Inserts or refreshes the proxy for `collider` from its tight AABB.
    /// Returns true when the stored fat AABB had to be enlarged or moved.
    pub fn update_proxy(&mut self, collider: ColliderHandle, tight: &AABB) -> bool {
        let id = collider.0;
        if id >= self.proxies.len() {
            self.proxies.resize(id + 1, None);
        }
        match &self.proxies[id] {
            Some(fat) if fat.contains(tight) => false,
            _ => {
                self.proxies[id] = Some(tight.expanded(self.margin));
                true
            }
        }
    }

    /// Removes a proxy. Its pairs end on the next update.
    pub fn remove_proxy(&mut self, collider: ColliderHandle) {
        if let Some(slot) = self.proxies.get_mut(collider.0) {
            *slot = None;
        }
    }

    /// Forgets every reported pair involving `collider`, so any that still
    /// overlap are reported as beginning again on the next update.
    pub fn touch_proxy(&mut self, collider: ColliderHandle) {
        self.pairs.retain(|pair| !pair.contains(collider));
    }

    pub fn fat_aabb(&self, collider: ColliderHandle) -> Option<&AABB> {
        self.proxies.get(collider.0).and_then(Option::as_ref)
    }

    pub fn proxy_count(&self) -> usize {
        self.proxies.iter().filter(|p| p.is_some()).count()
    }

    /// Pairs currently overlapping, as of the last update.
    pub fn pairs(&self) -> impl Iterator<Item = &PairKey> {
        self.pairs.iter()
    }

    /// Converts world coordinates to grid cell indices (col, row).
    #[inline]
    fn get_cell_indices(&self, point: Vec2) -> (i64, i64) {
        let col = (point.x * self.inv_cell_size).floor() as i64;
        let row = (point.y * self.inv_cell_size).floor() as i64;
        (col, row)
    }

    fn rebuild_cells(&mut self) {
        self.cells.clear();
        for (id, proxy) in self.proxies.iter().enumerate() {
            let Some(aabb) = proxy else { continue };
            let (min_col, min_row) = self.get_cell_indices(aabb.min);
            let (max_col, max_row) = self.get_cell_indices(aabb.max);
            for row in min_row..=max_row {
                for col in min_col..=max_col {
                    self.cells.entry((col, row)).or_default().proxy_ids.push(id);
                }
            }
        }
    }

    /// Every pair of proxies whose fat AABBs overlap.
    pub fn query_potential_pairs(&mut self) -> BTreeSet<PairKey> {
        self.rebuild_cells();

        let mut potential_pairs = BTreeSet::new();
        for cell in self.cells.values() {
            let ids = &cell.proxy_ids;
            for (i, &id_a) in ids.iter().enumerate() {
                for &id_b in &ids[i + 1..] {
                    let key = PairKey::new(ColliderHandle(id_a), ColliderHandle(id_b));
                    if potential_pairs.contains(&key) {
                        continue;
                    }
                    if let (Some(a), Some(b)) = (&self.proxies[id_a], &self.proxies[id_b]) {
                        if a.overlaps(b) {
                            potential_pairs.insert(key);
                        }
                    }
                }
            }
        }
        potential_pairs
    }

    /// Recomputes overlapping pairs and returns the difference from the
    /// previous update: all `End` events (ascending), then all `Begin` events
    /// (ascending).
    pub fn update_pairs(&mut self) -> Vec<PairEvent> {
        let current = self.query_potential_pairs();

        let mut events: Vec<PairEvent> = self
            .pairs
            .difference(&current)
            .map(|&key| PairEvent::End(key))
            .collect();
        events.extend(current.difference(&self.pairs).map(|&key| PairEvent::Begin(key)));

        trace!(
            pairs = current.len(),
            events = events.len(),
            cells = self.cells.len(),
            "broad phase updated"
        );
        self.pairs = current;
        events
    }
}
