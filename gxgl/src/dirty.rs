//! Dirty flags and the fixed order in which their routines are applied.

use bitflags::bitflags;

bitflags! {
    /// Hardware configuration categories whose inputs changed since they were
    /// last applied.
    pub struct DirtyFlags: u32 {
        /// Vertex attribute wiring and texture coordinate sources.
        const ATTRIBUTES = 1 << 0;
        /// Position, normal and projection matrices.
        const MATRICES = 1 << 1;
        const VIEWPORT = 1 << 2;
        const SCISSOR = 1 << 3;
        /// The lighting channels and the TEV combiner network.
        const TEV = 1 << 4;
        /// Depth test and depth writes.
        const Z = 1 << 5;
        const COLOR_UPDATE = 1 << 6;
        const BLEND = 1 << 7;
        const ALPHA_TEST = 1 << 8;
        const CULL = 1 << 9;
        const FOG = 1 << 10;
    }
}

impl Default for DirtyFlags {
    fn default() -> Self {
        DirtyFlags::all()
    }
}

/// The order in which dirty categories are applied before a draw.
pub const APPLY_ORDER: [DirtyFlags; 11] = [
    DirtyFlags::ATTRIBUTES,
    DirtyFlags::MATRICES,
    DirtyFlags::VIEWPORT,
    DirtyFlags::SCISSOR,
    DirtyFlags::TEV,
    DirtyFlags::Z,
    DirtyFlags::COLOR_UPDATE,
    DirtyFlags::BLEND,
    DirtyFlags::ALPHA_TEST,
    DirtyFlags::CULL,
    DirtyFlags::FOG,
];

impl DirtyFlags {
    /// Categories whose routines must have run before this one's.
    pub fn dependencies(self) -> DirtyFlags {
        match self {
            DirtyFlags::SCISSOR => DirtyFlags::VIEWPORT,
            DirtyFlags::TEV => DirtyFlags::ATTRIBUTES | DirtyFlags::VIEWPORT | DirtyFlags::SCISSOR,
            DirtyFlags::ALPHA_TEST => DirtyFlags::TEV,
            DirtyFlags::FOG => DirtyFlags::MATRICES,
            _ => DirtyFlags::empty(),
        }
    }
}
