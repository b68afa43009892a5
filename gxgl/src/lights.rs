//! Assignment of abstract lights to hardware light objects.
//!
//! GX computes ambient, diffuse and specular contributions in separate
//! channels, so a GL light may need up to three light objects. Requests are
//! served first-come-first-served in light index order.

use crate::{
    gx::{GxLightId, LightMask},
    state::{Light, Material},
};

/// Hardware light objects assigned to one GL light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightSlots {
    /// Light object carrying the ambient term, added in the first channel.
    pub ambient: Option<GxLightId>,
    /// Light object carrying the diffuse term, in the second channel.
    pub diffuse: Option<GxLightId>,
    /// Light object carrying the specular term, in the first channel.
    pub specular: Option<GxLightId>,
}

impl LightSlots {
    /// True if the light got no light object at all.
    pub fn is_empty(&self) -> bool {
        self.ambient.is_none() && self.diffuse.is_none() && self.specular.is_none()
    }
}

/// The result of [allocate_lights].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LightAllocation {
    /// One entry per GL light.
    pub slots: Vec<LightSlots>,
    #[allow(missing_docs)]
    pub ambient_mask: LightMask,
    #[allow(missing_docs)]
    pub diffuse_mask: LightMask,
    #[allow(missing_docs)]
    pub specular_mask: LightMask,
    /// Number of light objects the enabled lights asked for.
    pub requested: usize,
    /// Number of requests that did not fit.
    pub excluded: usize,
}

impl LightAllocation {
    /// Number of light objects handed out.
    pub fn allocated(&self) -> usize {
        self.requested - self.excluded
    }
}

pub(crate) fn is_black(color: &[f32; 4]) -> bool {
    color[0] == 0.0 && color[1] == 0.0 && color[2] == 0.0
}

struct Pool {
    next: u8,
    capacity: u8,
    requested: usize,
}

impl Pool {
    fn take(&mut self) -> Option<GxLightId> {
        self.requested += 1;
        if self.next >= self.capacity {
            return None;
        }
        let id = GxLightId(self.next);
        self.next += 1;
        Some(id)
    }
}

/// Assigns light objects to the enabled lights.
///
/// `capacity` is clamped to the eight lights a channel mask can address.
pub fn allocate_lights(
    lights: &[Light],
    material: &Material,
    global_ambient: &[f32; 4],
    capacity: u8,
) -> LightAllocation {
    let mut pool = Pool {
        next: 0,
        capacity: capacity.min(8),
        requested: 0,
    };
    let mut allocation = LightAllocation::default();
    let material_specular = !is_black(&material.specular) && material.shininess > 0.0;

    for light in lights {
        let mut slots = LightSlots::default();
        if light.enabled {
            if !is_black(&light.ambient) && !is_black(global_ambient) {
                slots.ambient = pool.take();
            }
            if !is_black(&light.diffuse) {
                slots.diffuse = pool.take();
            }
            if !is_black(&light.specular) && material_specular && light.is_directional() {
                slots.specular = pool.take();
            }
        }
        if let Some(id) = slots.ambient {
            allocation.ambient_mask |= LightMask::of(id);
        }
        if let Some(id) = slots.diffuse {
            allocation.diffuse_mask |= LightMask::of(id);
        }
        if let Some(id) = slots.specular {
            allocation.specular_mask |= LightMask::of(id);
        }
        allocation.slots.push(slots);
    }

    allocation.requested = pool.requested;
    allocation.excluded = pool.requested.saturating_sub(pool.capacity as usize);
    allocation
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::LightingState;

    fn lit_scene(count: usize) -> LightingState {
        let mut lighting = LightingState::default();
        for light in lighting.lights.iter_mut().take(count) {
            light.enabled = true;
            light.ambient = [0.1, 0.1, 0.1, 1.0];
            light.diffuse = [1.0, 1.0, 1.0, 1.0];
            light.specular = [0.0, 0.0, 0.0, 1.0];
        }
        lighting
    }

    #[test]
    fn test_nine_lights_on_eight_slots() {
        let lighting = lit_scene(9);
        let alloc = allocate_lights(
            &lighting.lights,
            &lighting.material,
            &lighting.global_ambient,
            8,
        );
        assert_eq!(alloc.requested, 18);
        assert_eq!(alloc.excluded, 10);
        for (i, slots) in alloc.slots.iter().take(4).enumerate() {
            assert_eq!(slots.ambient, Some(GxLightId(2 * i as u8)));
            assert_eq!(slots.diffuse, Some(GxLightId(2 * i as u8 + 1)));
        }
        assert!(alloc.slots[4..].iter().all(LightSlots::is_empty));
        assert_eq!(alloc.ambient_mask.bits(), 0b0101_0101);
        assert_eq!(alloc.diffuse_mask.bits(), 0b1010_1010);
    }

    #[test]
    fn test_allocation_count_is_bounded() {
        let mut lighting = lit_scene(5);
        lighting.material.specular = [1.0; 4];
        lighting.material.shininess = 10.0;
        for light in lighting.lights.iter_mut() {
            light.specular = [1.0; 4];
        }
        for capacity in [0u8, 3, 8] {
            let alloc = allocate_lights(
                &lighting.lights,
                &lighting.material,
                &lighting.global_ambient,
                capacity,
            );
            assert_eq!(alloc.requested, 15);
            assert_eq!(alloc.allocated(), (capacity as usize).min(15));
        }

        let alloc = allocate_lights(
            &lighting.lights,
            &lighting.material,
            &lighting.global_ambient,
            8,
        );
        // ambient, diffuse, specular for light 0 come first
        assert_eq!(
            alloc.slots[0],
            LightSlots {
                ambient: Some(GxLightId(0)),
                diffuse: Some(GxLightId(1)),
                specular: Some(GxLightId(2)),
            }
        );
        assert_eq!(alloc.slots[2].diffuse, Some(GxLightId(7)));
        assert_eq!(alloc.slots[2].specular, None);
    }

    #[test]
    fn test_black_global_ambient_skips_ambient() {
        let mut lighting = lit_scene(2);
        lighting.global_ambient = [0.0, 0.0, 0.0, 1.0];
        let alloc = allocate_lights(
            &lighting.lights,
            &lighting.material,
            &lighting.global_ambient,
            8,
        );
        assert!(alloc.slots.iter().all(|slots| slots.ambient.is_none()));
        assert!(alloc.ambient_mask.is_empty());
        assert_eq!(alloc.requested, 2);
    }

    #[test]
    fn test_specular_needs_directional_light_and_shiny_material() {
        let mut lighting = lit_scene(2);
        lighting.lights[0].specular = [1.0; 4];
        lighting.lights[1].specular = [1.0; 4];
        lighting.lights[1].position = [0.0, 5.0, 0.0, 1.0];
        lighting.material.specular = [1.0; 4];

        let alloc = allocate_lights(
            &lighting.lights,
            &lighting.material,
            &lighting.global_ambient,
            8,
        );
        assert!(alloc.specular_mask.is_empty());

        lighting.material.shininess = 20.0;
        let alloc = allocate_lights(
            &lighting.lights,
            &lighting.material,
            &lighting.global_ambient,
            8,
        );
        assert!(alloc.slots[0].specular.is_some());
        assert!(alloc.slots[1].specular.is_none());
    }

    #[test]
    fn test_disabled_lights_request_nothing() {
        let lighting = LightingState::default();
        let alloc = allocate_lights(
            &lighting.lights,
            &lighting.material,
            &lighting.global_ambient,
            8,
        );
        assert_eq!(alloc.requested, 0);
        assert_eq!(alloc.slots.len(), lighting.lights.len());
    }
}
