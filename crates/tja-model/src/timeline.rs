use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::beat::Beat;

/// Keyed access for anything stored on a beat-sorted timeline.
pub trait HasBeat {
    fn beat(&self) -> Beat;
}

/// Ordered event container with unique beat keys.
///
/// Array-backed on purpose: per-chart event counts are small (hundreds), so
/// O(n) insert shifts are cheap and linear scans stay cache-friendly for
/// playback/render consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortedTimeline<T> {
    items: Vec<T>,
}

impl<T> Default for SortedTimeline<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: HasBeat> SortedTimeline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Mutable iteration; mutating an item's beat is allowed but leaves
    /// re-sorting to the caller, same as [`Self::get_mut`].
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.items.last_mut()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Insert preserving order; an entry already at that beat is overwritten
    /// in place, never duplicated.
    pub fn insert_or_update(&mut self, item: T) {
        let beat = item.beat();
        let index = self.items.partition_point(|e| e.beat() < beat);
        if let Some(existing) = self.items.get_mut(index)
            && existing.beat() == beat
        {
            *existing = item;
        } else {
            self.items.insert(index, item);
        }
    }

    /// Erase the unique entry at `beat`. Absence is a no-op, not an error.
    pub fn remove_at_beat(&mut self, beat: Beat) -> bool {
        let index = self.items.partition_point(|e| e.beat() < beat);
        if self.items.get(index).is_some_and(|e| e.beat() == beat) {
            self.items.remove(index);
            true
        } else {
            false
        }
    }

    /// Most recent entry at or before `beat` — the "effective value here"
    /// query (current tempo, current scroll speed, ...).
    pub fn try_find_last_at_beat(&self, beat: Beat) -> Option<&T> {
        let index = self.items.partition_point(|e| e.beat() <= beat);
        if index > 0 { self.items.get(index - 1) } else { None }
    }

    /// Entry exactly at `beat`, if any.
    pub fn try_find_exact_at_beat(&self, beat: Beat) -> Option<&T> {
        self.try_find_last_at_beat(beat).filter(|e| e.beat() == beat)
    }
}

impl<T> Index<usize> for SortedTimeline<T> {
    type Output = T;
    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T> IndexMut<usize> for SortedTimeline<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a SortedTimeline<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: HasBeat> From<Vec<T>> for SortedTimeline<T> {
    /// Sort and dedup; on duplicate beats the later element wins.
    fn from(mut items: Vec<T>) -> Self {
        items.sort_by_key(|e| e.beat());
        items.dedup_by(|b, a| {
            if a.beat() == b.beat() {
                std::mem::swap(a, b);
                true
            } else {
                false
            }
        });
        Self { items }
    }
}

/// Monotonic lookup cursor over a [`SortedTimeline`].
///
/// Resolves "last entry at or before" queries in amortized O(1), valid only
/// while query beats are non-decreasing (the import pass visits notes in
/// beat order, which is exactly that).
#[derive(Debug, Default, Clone, Copy)]
pub struct BeatForwardIterator {
    next_index: usize,
}

impl BeatForwardIterator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next<'a, T: HasBeat>(
        &mut self,
        timeline: &'a SortedTimeline<T>,
        beat: Beat,
    ) -> Option<&'a T> {
        while self.next_index < timeline.len() && timeline[self.next_index].beat() <= beat {
            self.next_index += 1;
        }
        if self.next_index > 0 {
            timeline.get(self.next_index - 1)
        } else {
            None
        }
    }
}
