//! Motion handles
//!
//! A handle is an opaque `(index, version, storage)` triple. The index and
//! version come from the slot arena that owns the record; the storage id picks
//! the typed storage the record lives in. Once a slot is freed its version is
//! bumped, so handles captured before the slot was reused are rejected instead
//! of silently aliasing the new motion.

use slotmap::{new_key_type, Key, KeyData};

new_key_type! {
    /// Arena key of a motion record inside its storage
    pub struct MotionKey;
    /// Arena key of a sequence inside the manager
    pub struct SequenceKey;
}

/// Identifies one typed record storage inside a manager
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageId(pub u32);

/// Handle to a scheduled motion
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MotionHandle {
    storage: StorageId,
    key: MotionKey,
}

impl MotionHandle {
    pub fn new(storage: StorageId, key: MotionKey) -> Self {
        Self { storage, key }
    }

    pub fn storage(&self) -> StorageId {
        self.storage
    }

    pub fn key(&self) -> MotionKey {
        self.key
    }

    /// Slot index inside the storage's arena
    pub fn index(&self) -> u32 {
        self.key.data().as_ffi() as u32
    }

    /// Slot version the handle was issued for
    pub fn version(&self) -> u32 {
        (self.key.data().as_ffi() >> 32) as u32
    }

    /// A handle that never refers to a live motion
    pub fn is_null(&self) -> bool {
        self.key.is_null()
    }

    /// Pack into raw parts for storage outside the motion system
    ///
    /// Use with `from_raw()` to reconstruct the handle.
    pub fn to_raw(self) -> (u32, u64) {
        (self.storage.0, self.key.data().as_ffi())
    }

    /// Reconstruct from raw parts produced by `to_raw()`
    pub fn from_raw(storage: u32, key: u64) -> Self {
        Self {
            storage: StorageId(storage),
            key: MotionKey::from(KeyData::from_ffi(key)),
        }
    }
}

/// Handle to a scheduled sequence
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SequenceHandle {
    key: SequenceKey,
}

impl SequenceHandle {
    pub fn new(key: SequenceKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> SequenceKey {
        self.key
    }
}
