//! Arena of region tiles refined on demand.
//!
//! Tiles live in a flat `Vec` and refer to each other by [`TileId`]. A
//! child records its parent's id; a parent records its children's ids. A
//! [`TileKey`] (face plus corners) identifies a region independently of the
//! arena, so refining the same region twice returns the existing tile.

use std::hash::{Hash, Hasher};

use glam::{DVec2, DVec3};
use rustc_hash::{FxHashMap, FxHasher};
use tracing::debug;

use crate::cube_face::CubeFace;
use crate::error::{MapError, Result};
use crate::region_tile::RegionTile;
use crate::texel::Texel;

/// Index of a tile inside a [`TileTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(u32);

impl TileId {
    /// Position in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identity of a tile region: face plus face-local corners.
///
/// Equality and hashing use the exact bit patterns of the corners, with
/// `-0.0` folded into `0.0`.
#[derive(Clone, Copy, Debug)]
pub struct TileKey {
    face: CubeFace,
    lo: DVec2,
    hi: DVec2,
}

impl TileKey {
    /// Key of the region `[lo, hi]` on `face`, corners taken as given.
    pub fn new(face: CubeFace, lo: DVec2, hi: DVec2) -> Self {
        Self { face, lo, hi }
    }

    /// Face the region lies on.
    #[must_use]
    pub fn face(&self) -> CubeFace {
        self.face
    }

    /// Lower and upper face-local corners.
    #[must_use]
    pub fn corners(&self) -> (DVec2, DVec2) {
        (self.lo, self.hi)
    }

    fn bits(&self) -> [u64; 4] {
        // Adding 0.0 turns -0.0 into +0.0 and leaves everything else alone.
        [self.lo.x, self.lo.y, self.hi.x, self.hi.y].map(|v| (v + 0.0).to_bits())
    }

    /// Stable 64-bit hash of the key.
    ///
    /// Depends only on the face and corners, so the same region hashes the
    /// same across bodies, arenas and runs; usable as a cache file name.
    #[must_use]
    pub fn pos_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for TileKey {
    fn eq(&self, other: &Self) -> bool {
        self.face == other.face && self.bits() == other.bits()
    }
}

impl Eq for TileKey {}

impl Hash for TileKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.face as u8).hash(state);
        self.bits().hash(state);
    }
}

#[derive(Clone, Debug)]
struct TileNode<T> {
    tile: RegionTile<T>,
    children: Vec<TileId>,
    filled: bool,
}

/// Flat store of [`RegionTile`]s linked parent to child by [`TileId`].
#[derive(Clone, Debug)]
pub struct TileTree<T> {
    nodes: Vec<TileNode<T>>,
    index: FxHashMap<TileKey, TileId>,
}

impl<T> Default for TileTree<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

/// Quadrants of a tile in its own `[-1, 1]²` frame, ordered bottom-left,
/// bottom-right, top-left, top-right.
const QUADRANTS: [(DVec2, DVec2); 4] = [
    (DVec2::new(-1.0, -1.0), DVec2::new(0.0, 0.0)),
    (DVec2::new(0.0, -1.0), DVec2::new(1.0, 0.0)),
    (DVec2::new(-1.0, 0.0), DVec2::new(0.0, 1.0)),
    (DVec2::new(0.0, 0.0), DVec2::new(1.0, 1.0)),
];

impl<T: Texel> TileTree<T> {
    /// An empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tiles in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: TileId) -> Result<&TileNode<T>> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| MapError::InvalidRegion(format!("no tile with id {}", id.0)))
    }

    fn insert(&mut self, tile: RegionTile<T>) -> Result<TileId> {
        let raw = u32::try_from(self.nodes.len())
            .map_err(|_| MapError::InvalidRegion("tile arena is full".into()))?;
        let id = TileId(raw);
        self.index.insert(tile.key(), id);
        self.nodes.push(TileNode {
            tile,
            children: Vec::new(),
            filled: false,
        });
        Ok(id)
    }

    /// The tile covering all of `face`, created on first use.
    pub fn root(&mut self, face: CubeFace, width: usize, height: usize) -> Result<TileId> {
        let key = TileKey::new(face, DVec2::NEG_ONE, DVec2::ONE);
        if let Some(id) = self.find(&key) {
            return Ok(id);
        }
        self.insert(RegionTile::full_face(face, width, height)?)
    }

    /// The child of `parent` over the sub-rectangle `[sub_lo, sub_hi]` of the
    /// parent's own `[-1, 1]²` frame, created on first use.
    pub fn refine(&mut self, parent: TileId, sub_lo: DVec2, sub_hi: DVec2) -> Result<TileId> {
        let parent_tile = &self.node(parent)?.tile;
        let (lo, hi) = parent_tile.refine_corners(sub_lo, sub_hi)?;
        if let Some(id) = self.find(&TileKey::new(parent_tile.face(), lo, hi)) {
            return Ok(id);
        }
        let mut child = parent_tile.refine(sub_lo, sub_hi)?;
        child.set_parent(parent);
        let id = self.insert(child)?;
        self.nodes[parent.index()].children.push(id);
        debug!(parent = parent.0, child = id.0, tiles = self.len(), "tile refined");
        Ok(id)
    }

    /// Split `parent` into its four quadrants (bottom-left, bottom-right,
    /// top-left, top-right).
    pub fn subdivide(&mut self, parent: TileId) -> Result<[TileId; 4]> {
        let mut ids = [parent; 4];
        for (slot, (lo, hi)) in ids.iter_mut().zip(QUADRANTS) {
            *slot = self.refine(parent, lo, hi)?;
        }
        Ok(ids)
    }

    /// The tile behind `id`, if the id belongs to this arena.
    #[must_use]
    pub fn get(&self, id: TileId) -> Option<&RegionTile<T>> {
        self.nodes.get(id.index()).map(|n| &n.tile)
    }

    pub fn get_mut(&mut self, id: TileId) -> Option<&mut RegionTile<T>> {
        self.nodes.get_mut(id.index()).map(|n| &mut n.tile)
    }

    /// Whether [`TileTree::mark_filled`] has been called for `id`.
    ///
    /// Tiles start out holding zeroes; the arena does not know what data
    /// belongs in them.
    #[must_use]
    pub fn is_filled(&self, id: TileId) -> bool {
        self.nodes.get(id.index()).is_some_and(|n| n.filled)
    }

    /// Record that the pixels of `id` now hold real data.
    pub fn mark_filled(&mut self, id: TileId) -> Result<()> {
        let raw = id.0;
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or_else(|| MapError::InvalidRegion(format!("no tile with id {raw}")))?;
        node.filled = true;
        Ok(())
    }

    #[must_use]
    pub fn parent(&self, id: TileId) -> Option<TileId> {
        self.get(id).and_then(RegionTile::parent)
    }

    /// Children in creation order; empty for leaves and unknown ids.
    #[must_use]
    pub fn children(&self, id: TileId) -> &[TileId] {
        self.nodes
            .get(id.index())
            .map_or(&[], |n| n.children.as_slice())
    }

    /// `id` followed by its ancestors up to the root.
    #[must_use]
    pub fn lineage(&self, id: TileId) -> Vec<TileId> {
        let mut chain = Vec::new();
        let mut current = self.get(id).map(|_| id);
        while let Some(next) = current {
            chain.push(next);
            current = self.parent(next);
        }
        chain
    }

    /// Id of the tile stored under `key`.
    #[must_use]
    pub fn find(&self, key: &TileKey) -> Option<TileId> {
        self.index.get(key).copied()
    }

    /// Deepest existing tile below `root` whose region contains `dir`.
    #[must_use]
    pub fn deepest_containing(&self, root: TileId, dir: DVec3) -> Option<TileId> {
        let mut current = root;
        if !self.get(current)?.contains_direction(dir) {
            return None;
        }
        'descend: loop {
            for &child in self.children(current) {
                if self.get(child).is_some_and(|t| t.contains_direction(dir)) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }
}
