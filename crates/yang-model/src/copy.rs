//! Copy provenance
//!
//! Statements reach their final place in the schema tree either where they
//! were written or by being copied there by `uses` or `augment`. Each
//! statement records the full set of copy operations that produced it and
//! which one came last, as a [`CopyHistory`].
//!
//! # Interning
//!
//! There are only `2^4 * 4` possible histories, so every value is
//! canonicalised through a process-wide table and handed out as
//! `&'static CopyHistory`. Two histories with equal content are always the
//! same instance; `std::ptr::eq` is a valid equality test.

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// A single copy operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum CopyType {
    /// Declared in place.
    Original = 0,
    /// Instantiated from a grouping by `uses`.
    AddedByUses = 1,
    /// Added by an `augment` nested under `uses`.
    AddedByUsesAugmentation = 2,
    /// Added by a top-level `augment`.
    AddedByAugmentation = 3,
}

impl CopyType {
    pub const COUNT: usize = 4;

    pub const ALL: [CopyType; Self::COUNT] = [
        Self::Original,
        Self::AddedByUses,
        Self::AddedByUsesAugmentation,
        Self::AddedByAugmentation,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of copy operations applied to a statement plus the last one.
///
/// Obtain instances through [`CopyHistory::original`] and
/// [`CopyHistory::of`]; they are interned.
#[derive(PartialEq, Eq, Hash)]
pub struct CopyHistory {
    operations: u8,
    last_operation: CopyType,
}

const OPERATION_SETS: usize = 1 << CopyType::COUNT;

static CACHE: [[OnceLock<CopyHistory>; CopyType::COUNT]; OPERATION_SETS] =
    [const { [const { OnceLock::new() }; CopyType::COUNT] }; OPERATION_SETS];

impl CopyHistory {
    /// History of a statement declared in place.
    pub fn original() -> &'static CopyHistory {
        Self::intern(CopyType::Original.bit(), CopyType::Original)
    }

    /// Extend `previous` with one more copy operation.
    ///
    /// The result contains every operation of `previous` plus `copy_type`,
    /// and `copy_type` becomes the last operation.
    pub fn of(copy_type: CopyType, previous: &CopyHistory) -> &'static CopyHistory {
        Self::intern(previous.operations | copy_type.bit(), copy_type)
    }

    fn intern(operations: u8, last_operation: CopyType) -> &'static CopyHistory {
        CACHE[operations as usize][last_operation as usize].get_or_init(|| CopyHistory {
            operations,
            last_operation,
        })
    }

    pub fn contains(&self, copy_type: CopyType) -> bool {
        self.operations & copy_type.bit() != 0
    }

    pub fn last_operation(&self) -> CopyType {
        self.last_operation
    }

    /// Every operation in the history, in enum order.
    pub fn operations(&self) -> impl Iterator<Item = CopyType> + '_ {
        CopyType::ALL.into_iter().filter(move |t| self.contains(*t))
    }

    pub fn is_added_by_uses(&self) -> bool {
        self.contains(CopyType::AddedByUses)
    }

    pub fn is_augmenting(&self) -> bool {
        self.contains(CopyType::AddedByAugmentation)
            || self.contains(CopyType::AddedByUsesAugmentation)
    }
}

impl fmt::Debug for CopyHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyHistory")
            .field("operations", &self.operations().collect::<Vec<_>>())
            .field("last_operation", &self.last_operation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_is_canonical() {
        assert!(std::ptr::eq(CopyHistory::original(), CopyHistory::original()));
        assert_eq!(CopyHistory::original().last_operation(), CopyType::Original);
        assert!(CopyHistory::original().contains(CopyType::Original));
    }

    #[test]
    fn test_of_accumulates_operations() {
        let uses = CopyHistory::of(CopyType::AddedByUses, CopyHistory::original());
        let augmented = CopyHistory::of(CopyType::AddedByAugmentation, uses);

        assert!(augmented.contains(CopyType::Original));
        assert!(augmented.contains(CopyType::AddedByUses));
        assert!(augmented.contains(CopyType::AddedByAugmentation));
        assert!(!augmented.contains(CopyType::AddedByUsesAugmentation));
        assert_eq!(augmented.last_operation(), CopyType::AddedByAugmentation);
        assert!(augmented.is_augmenting());
    }

    #[test]
    fn test_equal_histories_share_instance() {
        // Same operation set reached by two different orders.
        let a = CopyHistory::of(
            CopyType::AddedByAugmentation,
            CopyHistory::of(CopyType::AddedByUses, CopyHistory::original()),
        );
        let b = CopyHistory::of(
            CopyType::AddedByAugmentation,
            CopyHistory::of(CopyType::AddedByUses, CopyHistory::of(CopyType::AddedByUses, CopyHistory::original())),
        );
        assert!(std::ptr::eq(a, b));

        // Same set, different last operation: distinct instances.
        let c = CopyHistory::of(
            CopyType::AddedByUses,
            CopyHistory::of(CopyType::AddedByAugmentation, CopyHistory::original()),
        );
        assert!(!std::ptr::eq(a, c));
        assert_ne!(a, c);
    }

    #[test]
    fn test_interning_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    CopyHistory::of(CopyType::AddedByUsesAugmentation, CopyHistory::original())
                        as *const CopyHistory as usize
                })
            })
            .collect();
        let addrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
    }
}
