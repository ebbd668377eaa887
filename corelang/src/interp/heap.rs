//! Reference-counted array storage
//!
//! Arrays live in a slot vector addressed by [`ArrayId`]. A slot is freed the
//! moment its refcount reaches zero and its index is recycled by the next
//! allocation. The heap never decides *when* to retain or release; that is
//! the memory store's job, which knows which bindings point where.

/// Handle to a heap array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayId(u32);

impl ArrayId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
struct HeapArray {
    data: Vec<i64>,
    refcount: u32,
}

/// Array objects with their refcounts and the live-object counter.
#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<Option<HeapArray>>,
    free: Vec<ArrayId>,
    live: usize,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate `len` zeroed slots with a refcount of one.
    ///
    /// Returns `None` when the host cannot reserve the storage or every
    /// handle is in use.
    pub fn alloc(&mut self, len: usize) -> Option<ArrayId> {
        let mut data = Vec::new();
        data.try_reserve_exact(len).ok()?;
        data.resize(len, 0);
        let array = HeapArray { data, refcount: 1 };

        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(array);
                id
            }
            None => {
                let id = ArrayId(u32::try_from(self.slots.len()).ok()?);
                self.slots.push(Some(array));
                id
            }
        };
        self.live += 1;
        Some(id)
    }

    /// Record one more binding pointing at `id`.
    pub fn retain(&mut self, id: ArrayId) {
        if let Some(array) = self.slot_mut(id) {
            array.refcount += 1;
        } else {
            debug_assert!(false, "retain of reclaimed array {id:?}");
        }
    }

    /// Drop one binding's reference to `id`.
    ///
    /// Returns the live-object count after reclamation when this was the last
    /// reference, `None` while other bindings still hold the array.
    pub fn release(&mut self, id: ArrayId) -> Option<usize> {
        let Some(array) = self.slot_mut(id) else {
            debug_assert!(false, "release of reclaimed array {id:?}");
            return None;
        };
        array.refcount -= 1;
        if array.refcount > 0 {
            return None;
        }
        self.slots[id.index()] = None;
        self.free.push(id);
        self.live -= 1;
        Some(self.live)
    }

    pub fn get(&self, id: ArrayId) -> Option<&[i64]> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .map(|array| array.data.as_slice())
    }

    pub fn get_mut(&mut self, id: ArrayId) -> Option<&mut [i64]> {
        self.slot_mut(id).map(|array| array.data.as_mut_slice())
    }

    /// Current refcount, 0 for a reclaimed slot.
    pub fn refcount(&self, id: ArrayId) -> u32 {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .map_or(0, |array| array.refcount)
    }

    /// Number of arrays not yet reclaimed.
    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }

    fn slot_mut(&mut self, id: ArrayId) -> Option<&mut HeapArray> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }
}
