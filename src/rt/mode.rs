//! Ray query mode and bit-flag types.

/// The three query modes of spec §3: `mode ∈ {shadow, mirror, shadow-transparent}`.
///
/// Only `Shadow` is permitted to return as soon as any blocking intersection is
/// found (§3: "a ray with mode = shadow may terminate on the first hit; other
/// modes must find the nearest"). `Mirror` is the ordinary nearest-hit visibility
/// query (reflection/refraction rays, camera rays). `ShadowTransparent` names a
/// shadow ray that must keep searching past a hit to let a caller accumulate
/// transparency along the path instead of stopping at the first intersection --
/// this core has no material/transparency model of its own (that lives in the
/// renderer this crate's §1 excludes), so it is traversed exactly like `Mirror`:
/// always nearest-hit, never short-circuited, leaving transparency accumulation
/// to the caller re-casting past each reported hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayMode {
    Shadow,
    Mirror,
    ShadowTransparent,
}

/// Caller-requested suppressions, checked by [`crate::primitive::Primitive::intersect`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipFlags(u8);

impl SkipFlags {
    pub const NONE: Self = Self(0);
    pub const CULLFACE: Self = Self(1 << 0);
    pub const VLR_RENDER_CHECK: Self = Self(1 << 1);
    pub const VLR_NON_SOLID_MATERIAL: Self = Self(1 << 2);
    pub const VLR_NEIGHBOUR: Self = Self(1 << 3);

    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl std::ops::BitOr for SkipFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Caller-requested extra validity checks, evaluated alongside [`SkipFlags`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckFlags(u8);

impl CheckFlags {
    pub const NONE: Self = Self(0);
    /// Require the hit face to belong to a solid (non-wire) material.
    pub const SOLID_MATERIAL: Self = Self(1 << 0);

    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}
