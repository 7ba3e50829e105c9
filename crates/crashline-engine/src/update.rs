//! Per-frame batch of pending integrator runs.
//!
//! Each frame the engine collects [`PendingUpdate`] tags into an
//! [`UpdateSet`], runs every tagged integrator once in declaration order,
//! redraws, and clears the set. An empty set means nothing changed and the
//! frame skips both integration and drawing.

use serde::{Deserialize, Serialize};

/// One unit of per-frame work.
///
/// Declaration order is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PendingUpdate {
    /// Put the background back at the bottom of its parallax range.
    InitBackground,
    /// Put the plane back at the bottom-left corner.
    InitPlane,
    /// Grow the multiplier.
    Multiplier,
    /// Advance the climbing plane.
    TakeOff,
    /// Shake the flying plane and scroll the background.
    Fly,
    /// Move clouds and mark the ones that dropped below the midline.
    MoveClouds,
    /// Rescale spatial state to the new canvas size.
    Resize,
    /// A bitmap changed. Redraw only.
    AssetLoaded,
    /// The round is finished. Redraw only.
    Finish,
}

impl PendingUpdate {
    /// All tags in execution order.
    pub const ALL: [PendingUpdate; 9] = [
        PendingUpdate::InitBackground,
        PendingUpdate::InitPlane,
        PendingUpdate::Multiplier,
        PendingUpdate::TakeOff,
        PendingUpdate::Fly,
        PendingUpdate::MoveClouds,
        PendingUpdate::Resize,
        PendingUpdate::AssetLoaded,
        PendingUpdate::Finish,
    ];

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// A set of [`PendingUpdate`] tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSet(u16);

impl UpdateSet {
    /// An empty set.
    pub fn new() -> Self {
        Self(0)
    }

    /// Add a tag. Adding a tag twice has no further effect.
    pub fn insert(&mut self, update: PendingUpdate) {
        self.0 |= update.bit();
    }

    /// Whether the tag is pending.
    pub fn contains(&self, update: PendingUpdate) -> bool {
        self.0 & update.bit() != 0
    }

    /// Whether no work is pending.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of pending tags.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Remove every tag.
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Pending tags in execution order.
    pub fn iter(&self) -> impl Iterator<Item = PendingUpdate> + '_ {
        PendingUpdate::ALL
            .into_iter()
            .filter(move |update| self.contains(*update))
    }
}

impl FromIterator<PendingUpdate> for UpdateSet {
    fn from_iter<T: IntoIterator<Item = PendingUpdate>>(iter: T) -> Self {
        let mut set = UpdateSet::new();
        for update in iter {
            set.insert(update);
        }
        set
    }
}
