//! # Engine Pool
//!
//! Fixed array of engine slots addressed by small integer ids.
//!
//! Every slot is allocated up front; nothing is allocated or freed while
//! rendering. A slot's ownership changes only through its engine state and
//! its work tag, never through pointer reassignment.

use crate::engine::{Engine, EscapeResult};
use crate::fixed_point::Coord;

/// Index of an engine slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EngineId(pub usize);

/// One engine plus the work item it was launched with.
#[derive(Clone, Debug)]
pub struct EngineSlot<W> {
    /// The worker.
    pub engine: Engine,
    /// Tag of the last launch; kept until the completion is harvested.
    pub work: Option<W>,
}

/// A pool of engines with per-slot work tags of type `W`.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. It is owned by the scheduler and stepped
/// from the single tick loop.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool: EnginePool<u32> = EnginePool::new(8);
///
/// let id = pool.first_available().unwrap();
/// pool.launch(id, 7, c_re, c_im, 256);
///
/// pool.step_all(|id, tag, result| println!("{id:?} {tag} {result:?}"));
/// ```
pub struct EnginePool<W> {
    /// Slot storage.
    slots: Box<[EngineSlot<W>]>,
}

impl<W: Copy> EnginePool<W> {
    /// Creates a pool with `count` idle engines.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    #[must_use]
    pub fn new(count: usize) -> Self {
        assert!(count > 0, "Engine count must be greater than zero");

        let slots: Vec<EngineSlot<W>> = (0..count)
            .map(|_| EngineSlot {
                engine: Engine::new(),
                work: None,
            })
            .collect();

        Self {
            slots: slots.into_boxed_slice(),
        }
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; a pool has at least one slot.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Gets a slot.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EngineId) -> Option<&EngineSlot<W>> {
        self.slots.get(id.0)
    }

    /// Lowest-indexed slot whose engine is not running and whose last
    /// completion has been harvested.
    #[must_use]
    pub fn first_available(&self) -> Option<EngineId> {
        self.first_available_where(|_| true)
    }

    /// Like [`Self::first_available`], with an extra per-slot filter.
    #[must_use]
    pub fn first_available_where(&self, mut accept: impl FnMut(EngineId) -> bool) -> Option<EngineId> {
        self.slots
            .iter()
            .enumerate()
            .find(|(index, slot)| {
                slot.engine.is_available() && slot.work.is_none() && accept(EngineId(*index))
            })
            .map(|(index, _)| EngineId(index))
    }

    /// Launches a point on a slot.
    ///
    /// Returns `false` (and changes nothing) when the slot is out of range,
    /// still running, or holds an unharvested completion.
    pub fn launch(&mut self, id: EngineId, work: W, c_re: Coord, c_im: Coord, max_iters: u16) -> bool {
        let Some(slot) = self.slots.get_mut(id.0) else {
            return false;
        };
        if slot.work.is_some() || !slot.engine.start(c_re, c_im, max_iters) {
            return false;
        }
        slot.work = Some(work);
        true
    }

    /// Steps every running engine once.
    ///
    /// `on_done` is called, in slot order, for each engine that finished this
    /// tick, with the work tag it was launched with. The tag is released.
    pub fn step_all(&mut self, mut on_done: impl FnMut(EngineId, W, EscapeResult)) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(result) = slot.engine.step() {
                if let Some(work) = slot.work.take() {
                    on_done(EngineId(index), work, result);
                }
            }
        }
    }

    /// Number of engines mid-computation (any generation).
    #[must_use]
    pub fn running_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.engine.is_running()).count()
    }

    /// True when any engine is mid-computation.
    #[must_use]
    pub fn any_running(&self) -> bool {
        self.slots.iter().any(|slot| slot.engine.is_running())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_launch_and_harvest() {
        let mut pool: EnginePool<u32> = EnginePool::new(4);
        assert_eq!(pool.len(), 4);

        let id = pool.first_available().unwrap();
        assert_eq!(id, EngineId(0));
        assert!(pool.launch(id, 42, Coord::from_int(3), Coord::ZERO, 16));
        assert_eq!(pool.first_available(), Some(EngineId(1)));
        assert_eq!(pool.running_count(), 1);

        let mut done = Vec::new();
        pool.step_all(|id, tag, result| done.push((id, tag, result)));
        assert!(done.is_empty());
        pool.step_all(|id, tag, result| done.push((id, tag, result)));
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].0, EngineId(0));
        assert_eq!(done[0].1, 42);
        assert!(!done[0].2.inside);

        assert!(!pool.any_running());
        assert_eq!(pool.first_available(), Some(EngineId(0)));
    }

    #[test]
    fn test_busy_slot_rejects_launch() {
        let mut pool: EnginePool<u8> = EnginePool::new(1);
        assert!(pool.launch(EngineId(0), 1, Coord::ZERO, Coord::ZERO, 16));
        assert!(!pool.launch(EngineId(0), 2, Coord::ZERO, Coord::ZERO, 16));
        assert!(!pool.launch(EngineId(5), 2, Coord::ZERO, Coord::ZERO, 16));
        assert_eq!(pool.first_available(), None);
        assert_eq!(pool.get(EngineId(0)).unwrap().work, Some(1));
    }

    #[test]
    fn test_simultaneous_completions_report_in_slot_order() {
        let mut pool: EnginePool<usize> = EnginePool::new(3);
        for i in 0..3 {
            assert!(pool.launch(EngineId(i), i * 10, Coord::from_int(3), Coord::ZERO, 16));
        }
        pool.step_all(|_, _, _| {});
        let mut order = Vec::new();
        pool.step_all(|id, tag, _| order.push((id.0, tag)));
        assert_eq!(order, vec![(0, 0), (1, 10), (2, 20)]);
    }

    #[test]
    fn test_filtered_availability() {
        let pool: EnginePool<u8> = EnginePool::new(3);
        assert_eq!(pool.first_available_where(|id| id.0 >= 2), Some(EngineId(2)));
    }
}
