//! The resource ledger: counters for every scarce hardware slot.
//!
//! Slots are handed out in increasing order and are only given back by
//! [GpuResources::pop], which restores the counters saved by the matching
//! [GpuResources::push]. Sub-passes bracket their allocations this way so the
//! outer pass keeps its own numbering.

use core::fmt;

use crate::{config::HardwareLimits, gx::*};

/// A category of hardware slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ResourceKind {
    TevStage,
    TexCoord,
    TexMap,
    TexMatrix,
    DttMatrix,
    TevRegister,
    KonstRegister,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::TevStage => "TEV stages",
            ResourceKind::TexCoord => "texture coordinate generators",
            ResourceKind::TexMap => "texture maps",
            ResourceKind::TexMatrix => "texture matrices",
            ResourceKind::DttMatrix => "post-transform matrices",
            ResourceKind::TevRegister => "TEV color registers",
            ResourceKind::KonstRegister => "konstant color registers",
        };
        f.write_str(name)
    }
}

/// Number of slots of each kind in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub struct ResourceCounters {
    pub tev_stages: u8,
    pub tex_coords: u8,
    pub tex_maps: u8,
    pub tex_matrices: u8,
    pub dtt_matrices: u8,
    pub tev_registers: u8,
    pub konst_registers: u8,
}

impl ResourceCounters {
    fn slot(&mut self, kind: ResourceKind) -> &mut u8 {
        match kind {
            ResourceKind::TevStage => &mut self.tev_stages,
            ResourceKind::TexCoord => &mut self.tex_coords,
            ResourceKind::TexMap => &mut self.tex_maps,
            ResourceKind::TexMatrix => &mut self.tex_matrices,
            ResourceKind::DttMatrix => &mut self.dtt_matrices,
            ResourceKind::TevRegister => &mut self.tev_registers,
            ResourceKind::KonstRegister => &mut self.konst_registers,
        }
    }

    fn get(&self, kind: ResourceKind) -> u8 {
        let mut copy = *self;
        *copy.slot(kind)
    }
}

fn limit(limits: &HardwareLimits, kind: ResourceKind) -> u8 {
    match kind {
        ResourceKind::TevStage => limits.tev_stages,
        ResourceKind::TexCoord => limits.tex_coords,
        ResourceKind::TexMap => limits.tex_maps,
        ResourceKind::TexMatrix => limits.tex_matrices,
        ResourceKind::DttMatrix => limits.dtt_matrices,
        ResourceKind::TevRegister => limits.tev_registers,
        ResourceKind::KonstRegister => limits.konst_registers,
    }
}

/// A set of slots requested together by [GpuResources::reserve].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceRequest {
    /// Slots needed per kind, in [ResourceKind] order.
    counts: [u8; 7],
}

const KINDS: [ResourceKind; 7] = [
    ResourceKind::TevStage,
    ResourceKind::TexCoord,
    ResourceKind::TexMap,
    ResourceKind::TexMatrix,
    ResourceKind::DttMatrix,
    ResourceKind::TevRegister,
    ResourceKind::KonstRegister,
];

impl ResourceRequest {
    /// Adds one slot of `kind` to the request.
    pub fn with(mut self, kind: ResourceKind) -> Self {
        self.counts[kind as usize] += 1;
        self
    }

    /// Adds one slot of `kind` if `needed`.
    pub fn with_if(self, needed: bool, kind: ResourceKind) -> Self {
        if needed {
            self.with(kind)
        } else {
            self
        }
    }

    fn count(&self, kind: ResourceKind) -> u8 {
        self.counts[kind as usize]
    }
}

/// First slot of each kind granted by [GpuResources::reserve]. Consecutive
/// slots of the same kind follow the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub struct ResourceGrant {
    pub tev_stage: Option<TevStageId>,
    pub tex_coord: Option<TexCoordId>,
    pub tex_map: Option<TexMapId>,
    pub tex_matrix: Option<TexMtxId>,
    pub dtt_matrix: Option<DttMtxId>,
    pub tev_register: Option<TevReg>,
    pub konst_register: Option<KonstReg>,
}

/// The ledger of allocated hardware slots.
#[derive(Debug, Clone)]
pub struct GpuResources {
    limits: HardwareLimits,
    counters: ResourceCounters,
    saved: Vec<ResourceCounters>,
}

impl GpuResources {
    /// Creates an empty ledger for hardware with the given limits.
    pub fn new(limits: HardwareLimits) -> Self {
        Self {
            limits,
            counters: ResourceCounters::default(),
            saved: Vec::new(),
        }
    }

    /// The counters as they are now.
    pub fn counters(&self) -> ResourceCounters {
        self.counters
    }

    /// Frees every slot. Saved snapshots are kept.
    pub fn reset(&mut self) {
        self.counters = ResourceCounters::default();
    }

    /// Nesting depth of [GpuResources::push].
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Saves the counters.
    pub fn push(&mut self) {
        self.saved.push(self.counters);
    }

    /// Restores the counters saved by the last [GpuResources::push].
    ///
    /// Returns false if there was nothing to restore.
    #[must_use]
    pub fn pop(&mut self) -> bool {
        match self.saved.pop() {
            Some(counters) => {
                self.counters = counters;
                true
            }
            None => false,
        }
    }

    /// Number of free slots of a kind.
    pub fn available(&self, kind: ResourceKind) -> u8 {
        limit(&self.limits, kind).saturating_sub(self.counters.get(kind))
    }

    fn allocate(&mut self, kind: ResourceKind) -> Option<u8> {
        let limit = limit(&self.limits, kind);
        let slot = self.counters.slot(kind);
        if *slot >= limit {
            return None;
        }
        let index = *slot;
        *slot += 1;
        Some(index)
    }

    /// Allocates the next combiner stage.
    pub fn allocate_stage(&mut self) -> Option<TevStageId> {
        self.allocate(ResourceKind::TevStage).map(TevStageId)
    }

    /// Allocates the next texture coordinate generator.
    pub fn allocate_tex_coord(&mut self) -> Option<TexCoordId> {
        self.allocate(ResourceKind::TexCoord).map(TexCoordId)
    }

    /// Allocates the next texture map unit.
    pub fn allocate_tex_map(&mut self) -> Option<TexMapId> {
        self.allocate(ResourceKind::TexMap).map(TexMapId)
    }

    /// Allocates the next texture matrix.
    pub fn allocate_tex_matrix(&mut self) -> Option<TexMtxId> {
        self.allocate(ResourceKind::TexMatrix).map(TexMtxId)
    }

    /// Allocates the next post-transform matrix.
    pub fn allocate_dtt_matrix(&mut self) -> Option<DttMtxId> {
        self.allocate(ResourceKind::DttMatrix).map(DttMtxId)
    }

    /// Allocates the next general purpose color register.
    pub fn allocate_color_register(&mut self) -> Option<TevReg> {
        self.allocate(ResourceKind::TevRegister).map(TevReg::general)
    }

    /// Allocates the next konstant color register.
    pub fn allocate_konst_register(&mut self) -> Option<KonstReg> {
        self.allocate(ResourceKind::KonstRegister).map(KonstReg)
    }

    /// The first kind in `request` that does not fit.
    fn check(&self, request: &ResourceRequest) -> Result<(), ResourceKind> {
        match KINDS
            .iter()
            .find(|&&kind| request.count(kind) > self.available(kind))
        {
            Some(&kind) => Err(kind),
            None => Ok(()),
        }
    }

    /// Takes `count` slots without checking the limit, returning the first.
    fn take(&mut self, kind: ResourceKind, count: u8) -> u8 {
        let slot = self.counters.slot(kind);
        let first = *slot;
        *slot += count;
        first
    }

    /// Allocates every slot of a request, or nothing.
    ///
    /// On failure the first kind that does not fit is returned.
    pub fn reserve(&mut self, request: &ResourceRequest) -> Result<ResourceGrant, ResourceKind> {
        self.check(request)?;

        let mut grant = ResourceGrant::default();
        for kind in KINDS {
            let count = request.count(kind);
            if count == 0 {
                continue;
            }
            let first = self.take(kind, count);
            match kind {
                ResourceKind::TevStage => grant.tev_stage = Some(TevStageId(first)),
                ResourceKind::TexCoord => grant.tex_coord = Some(TexCoordId(first)),
                ResourceKind::TexMap => grant.tex_map = Some(TexMapId(first)),
                ResourceKind::TexMatrix => grant.tex_matrix = Some(TexMtxId(first)),
                ResourceKind::DttMatrix => grant.dtt_matrix = Some(DttMtxId(first)),
                ResourceKind::TevRegister => grant.tev_register = Some(TevReg::general(first)),
                ResourceKind::KonstRegister => grant.konst_register = Some(KonstReg(first)),
            }
        }
        Ok(grant)
    }

    /// Allocates the slots of one texture stage, or nothing.
    ///
    /// A texture matrix is included for hardware texgen and a konstant register
    /// when the stage reads the environment color.
    pub fn reserve_texture_stage(
        &mut self,
        tex_matrix: bool,
        konst: bool,
    ) -> Result<TextureSlots, ResourceKind> {
        let request = ResourceRequest::default()
            .with(ResourceKind::TevStage)
            .with(ResourceKind::TexCoord)
            .with(ResourceKind::TexMap)
            .with(ResourceKind::DttMatrix)
            .with_if(tex_matrix, ResourceKind::TexMatrix)
            .with_if(konst, ResourceKind::KonstRegister);
        self.check(&request)?;

        Ok(TextureSlots {
            stage: TevStageId(self.take(ResourceKind::TevStage, 1)),
            coord: TexCoordId(self.take(ResourceKind::TexCoord, 1)),
            map: TexMapId(self.take(ResourceKind::TexMap, 1)),
            dtt_matrix: DttMtxId(self.take(ResourceKind::DttMatrix, 1)),
            tex_matrix: tex_matrix.then(|| TexMtxId(self.take(ResourceKind::TexMatrix, 1))),
            konst: konst.then(|| KonstReg(self.take(ResourceKind::KonstRegister, 1))),
        })
    }
}

/// The slots of one texture stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct TextureSlots {
    pub stage: TevStageId,
    pub coord: TexCoordId,
    pub map: TexMapId,
    pub dtt_matrix: DttMtxId,
    pub tex_matrix: Option<TexMtxId>,
    pub konst: Option<KonstReg>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_allocation_is_sequential() {
        let mut resources = GpuResources::new(HardwareLimits::default());
        assert_eq!(resources.allocate_stage(), Some(TevStageId(0)));
        assert_eq!(resources.allocate_stage(), Some(TevStageId(1)));
        assert_eq!(resources.allocate_color_register(), Some(TevReg::Reg0));
        assert_eq!(resources.allocate_color_register(), Some(TevReg::Reg1));
        assert_eq!(resources.counters().tev_stages, 2);
    }

    #[test]
    fn test_exhaustion_does_not_overflow() {
        let mut resources = GpuResources::new(HardwareLimits::default());
        for _ in 0..3 {
            assert!(resources.allocate_color_register().is_some());
        }
        assert_eq!(resources.allocate_color_register(), None);
        assert_eq!(resources.counters().tev_registers, 3);
        assert_eq!(resources.available(ResourceKind::TevRegister), 0);
    }

    #[test]
    fn test_balanced_push_pop_restores_counters() {
        let mut resources = GpuResources::new(HardwareLimits::default());
        resources.allocate_stage();
        resources.allocate_tex_coord();
        let before = resources.counters();

        resources.push();
        resources.allocate_stage();
        resources.allocate_tex_map();
        resources.push();
        resources.allocate_dtt_matrix();
        assert!(resources.pop());
        resources.allocate_konst_register();
        assert!(resources.pop());

        assert_eq!(resources.counters(), before);
        assert_eq!(resources.depth(), 0);
        assert!(!resources.pop());
        assert_eq!(resources.counters(), before);
    }

    #[test]
    fn test_reserve_is_all_or_nothing() {
        let limits = HardwareLimits {
            tex_maps: 1,
            ..HardwareLimits::default()
        };
        let mut resources = GpuResources::new(limits);
        let request = ResourceRequest::default()
            .with(ResourceKind::TevStage)
            .with(ResourceKind::TexCoord)
            .with(ResourceKind::TexMap)
            .with(ResourceKind::DttMatrix);

        let grant = resources.reserve(&request).unwrap();
        assert_eq!(grant.tev_stage, Some(TevStageId(0)));
        assert_eq!(grant.tex_map, Some(TexMapId(0)));
        assert_eq!(grant.tex_matrix, None);

        let before = resources.counters();
        assert_eq!(resources.reserve(&request), Err(ResourceKind::TexMap));
        assert_eq!(resources.counters(), before);
    }

    #[test]
    fn test_texture_stage_needs_konst_register() {
        let mut resources = GpuResources::new(HardwareLimits {
            konst_registers: 1,
            ..HardwareLimits::default()
        });
        let first = resources.reserve_texture_stage(true, true).unwrap();
        assert_eq!(first.stage, TevStageId(0));
        assert_eq!(first.tex_matrix, Some(TexMtxId(0)));
        assert_eq!(first.konst, Some(KonstReg(0)));

        let before = resources.counters();
        assert_eq!(
            resources.reserve_texture_stage(false, true),
            Err(ResourceKind::KonstRegister)
        );
        assert_eq!(resources.counters(), before);

        let second = resources.reserve_texture_stage(false, false).unwrap();
        assert_eq!(second.stage, TevStageId(1));
        assert_eq!(second.konst, None);
    }

    #[test]
    fn test_reset_keeps_saved_snapshots() {
        let mut resources = GpuResources::new(HardwareLimits::default());
        resources.allocate_stage();
        resources.push();
        resources.allocate_stage();
        assert_eq!(resources.depth(), 1);

        resources.reset();
        assert_eq!(resources.counters().tev_stages, 0);
        assert_eq!(resources.depth(), 1);
        assert!(resources.pop());
        assert_eq!(resources.counters().tev_stages, 1);
    }
}
