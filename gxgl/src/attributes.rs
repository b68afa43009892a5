//! The attribute plan: which vertex attributes the streaming side sends, and
//! where every texture unit gets its coordinates from.

use crate::{
    config::Hints,
    gl::{TexGenMode, MAX_TEXTURE_UNITS},
    state::{RenderState, TextureUnit},
};

/// Where a texture unit's coordinates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TexCoordSource {
    /// The unit has no coordinates and cannot be used.
    #[default]
    None,
    /// Streamed from the client array, as texture attribute `n`.
    Array(u8),
    /// Computed on the CPU and streamed as texture attribute `n`.
    Software(u8),
    /// Computed by the texgen hardware from position or normal.
    Hardware,
}

impl TexCoordSource {
    /// The streamed attribute index, if the coordinates are streamed.
    pub fn stream(self) -> Option<u8> {
        match self {
            TexCoordSource::Array(n) | TexCoordSource::Software(n) => Some(n),
            TexCoordSource::None | TexCoordSource::Hardware => None,
        }
    }
}

/// The vertex format negotiated for the next draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttributePlan {
    /// Positions are streamed from the vertex array.
    pub position: bool,
    /// Normals are streamed from the normal array.
    pub normal: bool,
    /// Number of per-vertex color channels consumed by the lighting setup.
    pub color_channels: u8,
    /// Where each texture unit reads its coordinates from.
    pub tex_coords: [TexCoordSource; MAX_TEXTURE_UNITS],
}

impl AttributePlan {
    /// Number of streamed texture coordinate attributes.
    pub fn streamed_tex_coords(&self) -> usize {
        self.tex_coords
            .iter()
            .filter(|source| source.stream().is_some())
            .count()
    }
}

fn generated_in_software(unit: &TextureUnit, hints: &Hints) -> bool {
    unit.gen_mode == TexGenMode::SphereMap && !hints.fast_sphere_map
}

fn color_channels(state: &RenderState) -> u8 {
    if !state.client.color {
        0
    } else if !state.lighting.enabled {
        1
    } else if state.lighting.color_material {
        2
    } else {
        0
    }
}

/// Derives the attribute plan from the client array state.
pub fn plan_attributes(state: &RenderState, hints: &Hints) -> AttributePlan {
    let mut plan = AttributePlan {
        position: state.client.vertex,
        normal: state.client.normal,
        color_channels: color_channels(state),
        ..AttributePlan::default()
    };

    let mut next = 0;
    for (i, unit) in state.texture_units.iter().enumerate() {
        if !unit.enabled {
            continue;
        }
        plan.tex_coords[i] = if unit.gen_active() {
            if generated_in_software(unit, hints) {
                next += 1;
                TexCoordSource::Software(next - 1)
            } else {
                TexCoordSource::Hardware
            }
        } else if state.client.tex_coord[i] {
            next += 1;
            TexCoordSource::Array(next - 1)
        } else {
            TexCoordSource::None
        };
    }
    plan
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_streamed_units_are_numbered_in_order() {
        let mut state = RenderState::default();
        state.client.vertex = true;
        for i in [0, 2, 3] {
            state.texture_units[i].enabled = true;
        }
        state.client.tex_coord[0] = true;
        state.client.tex_coord[1] = true;
        state.texture_units[2].gen_enabled = [true, true, false, false];
        state.texture_units[3].gen_enabled = [true, true, false, false];
        state.texture_units[3].gen_mode = TexGenMode::SphereMap;

        let plan = plan_attributes(&state, &Hints::default());
        assert!(plan.position);
        assert_eq!(plan.tex_coords[0], TexCoordSource::Array(0));
        // unit 1 is disabled, so its array is not streamed
        assert_eq!(plan.tex_coords[1], TexCoordSource::None);
        assert_eq!(plan.tex_coords[2], TexCoordSource::Hardware);
        assert_eq!(plan.tex_coords[3], TexCoordSource::Software(1));
        assert_eq!(plan.streamed_tex_coords(), 2);

        let fast = Hints {
            fast_sphere_map: true,
        };
        let plan = plan_attributes(&state, &fast);
        assert_eq!(plan.tex_coords[3], TexCoordSource::Hardware);
    }

    #[test]
    fn test_color_channels() {
        let mut state = RenderState::default();
        assert_eq!(plan_attributes(&state, &Hints::default()).color_channels, 0);
        state.client.color = true;
        assert_eq!(plan_attributes(&state, &Hints::default()).color_channels, 1);
        state.lighting.enabled = true;
        assert_eq!(plan_attributes(&state, &Hints::default()).color_channels, 0);
        state.lighting.color_material = true;
        assert_eq!(plan_attributes(&state, &Hints::default()).color_channels, 2);
    }
}
