//! Index element types usable by sphere meshes.

use bytemuck::Pod;

/// An integer type that can be stored in a triangle index buffer.
///
/// Implemented for `u16` and `u32`, matching the two index formats GPUs accept.
pub trait MeshIndex: Pod + Copy + Eq + Ord + std::fmt::Debug + Send + Sync + 'static {
    /// Largest vertex slot representable by this index type.
    const MAX_INDEX: u64;
    /// Human-readable name used in diagnostics.
    const TYPE_NAME: &'static str;

    /// Convert a vertex slot that has already been range-checked against
    /// [`MAX_INDEX`](Self::MAX_INDEX).
    fn from_slot(slot: u32) -> Self;

    /// Widen back to a vertex slot.
    fn to_slot(self) -> u32;
}

impl MeshIndex for u16 {
    const MAX_INDEX: u64 = u16::MAX as u64;
    const TYPE_NAME: &'static str = "u16";

    fn from_slot(slot: u32) -> Self {
        debug_assert!(u64::from(slot) <= Self::MAX_INDEX);
        slot as u16
    }

    fn to_slot(self) -> u32 {
        u32::from(self)
    }
}

impl MeshIndex for u32 {
    const MAX_INDEX: u64 = u32::MAX as u64;
    const TYPE_NAME: &'static str = "u32";

    fn from_slot(slot: u32) -> Self {
        slot
    }

    fn to_slot(self) -> u32 {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u16_limits() {
        assert_eq!(<u16 as MeshIndex>::MAX_INDEX, 65_535);
        assert_eq!(u16::from_slot(65_535), u16::MAX);
        assert_eq!(u16::MAX.to_slot(), 65_535);
    }

    #[test]
    fn test_u32_roundtrips_large_slots() {
        assert_eq!(u32::from_slot(1_000_000).to_slot(), 1_000_000);
        assert_eq!(<u32 as MeshIndex>::TYPE_NAME, "u32");
    }
}
