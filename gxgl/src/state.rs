//! The abstract render state, initialized to the GL defaults.

#![allow(missing_docs)]

use crate::{
    dirty::DirtyFlags,
    gl::*,
    lights::LightSlots,
    matrix::{Matrixf, MatrixStack},
};

pub const MODELVIEW_STACK_DEPTH: usize = 32;
pub const PROJECTION_STACK_DEPTH: usize = 4;
pub const TEXTURE_STACK_DEPTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub enabled: bool,
    /// Eye space position. `w == 0` is a directional light.
    pub position: [f32; 4],
    pub spot_direction: [f32; 3],
    pub spot_exponent: f32,
    pub spot_cutoff: f32,
    /// Constant, linear and quadratic attenuation.
    pub attenuation: [f32; 3],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// Hardware light objects used in the last compilation.
    pub slots: LightSlots,
}

impl Light {
    fn new(index: usize) -> Self {
        // GL_LIGHT0 starts out white, the others black.
        let (diffuse, specular) = if index == 0 {
            ([1.0; 4], [1.0; 4])
        } else {
            ([0.0, 0.0, 0.0, 1.0], [0.0, 0.0, 0.0, 1.0])
        };
        Self {
            enabled: false,
            position: [0.0, 0.0, 1.0, 0.0],
            spot_direction: [0.0, 0.0, -1.0],
            spot_exponent: 0.0,
            spot_cutoff: 180.0,
            attenuation: [1.0, 0.0, 0.0],
            ambient: [0.0, 0.0, 0.0, 1.0],
            diffuse,
            specular,
            slots: LightSlots::default(),
        }
    }

    pub fn is_directional(&self) -> bool {
        self.position[3] == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub emission: [f32; 4],
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: [0.2, 0.2, 0.2, 1.0],
            diffuse: [0.8, 0.8, 0.8, 1.0],
            specular: [0.0, 0.0, 0.0, 1.0],
            emission: [0.0, 0.0, 0.0, 1.0],
            shininess: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LightingState {
    pub enabled: bool,
    pub lights: [Light; MAX_LIGHTS],
    pub global_ambient: [f32; 4],
    pub material: Material,
    pub color_material: bool,
    pub color_material_mode: ColorMaterialMode,
}

impl Default for LightingState {
    fn default() -> Self {
        Self {
            enabled: false,
            lights: std::array::from_fn(Light::new),
            global_ambient: [0.2, 0.2, 0.2, 1.0],
            material: Material::default(),
            color_material: false,
            color_material_mode: ColorMaterialMode::AmbientAndDiffuse,
        }
    }
}

/// The GL texture environment and coordinate generation of one texture unit.
#[derive(Debug, Clone)]
pub struct TextureUnit {
    pub enabled: bool,
    pub bound_texture: u32,
    pub mode: TexEnvMode,
    pub color: [f32; 4],
    pub combine_rgb: CombineFunc,
    pub combine_alpha: CombineFunc,
    pub source_rgb: [CombineSource; 3],
    pub source_alpha: [CombineSource; 3],
    pub operand_rgb: [CombineOperand; 3],
    pub operand_alpha: [CombineOperand; 3],
    /// 1, 2 or 4.
    pub rgb_scale: f32,
    pub alpha_scale: f32,
    /// Generation enabled for S, T, R, Q.
    pub gen_enabled: [bool; 4],
    pub gen_mode: TexGenMode,
    pub object_plane: [[f32; 4]; 2],
    pub eye_plane: [[f32; 4]; 2],
    pub matrix: MatrixStack,
}

impl Default for TextureUnit {
    fn default() -> Self {
        let planes = [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]];
        Self {
            enabled: false,
            bound_texture: 0,
            mode: TexEnvMode::Modulate,
            color: [0.0; 4],
            combine_rgb: CombineFunc::Modulate,
            combine_alpha: CombineFunc::Modulate,
            source_rgb: [
                CombineSource::Texture,
                CombineSource::Previous,
                CombineSource::Constant,
            ],
            source_alpha: [
                CombineSource::Texture,
                CombineSource::Previous,
                CombineSource::Constant,
            ],
            operand_rgb: [
                CombineOperand::SrcColor,
                CombineOperand::SrcColor,
                CombineOperand::SrcAlpha,
            ],
            operand_alpha: [CombineOperand::SrcAlpha; 3],
            rgb_scale: 1.0,
            alpha_scale: 1.0,
            gen_enabled: [false; 4],
            gen_mode: TexGenMode::EyeLinear,
            object_plane: planes,
            eye_plane: planes,
            matrix: MatrixStack::new(TEXTURE_STACK_DEPTH),
        }
    }
}

impl TextureUnit {
    pub fn gen_active(&self) -> bool {
        self.gen_enabled.iter().any(|&on| on)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogState {
    pub enabled: bool,
    pub mode: FogMode,
    pub density: f32,
    pub start: f32,
    pub end: f32,
    pub color: [f32; 4],
}

impl Default for FogState {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: FogMode::Exp,
            density: 1.0,
            start: 0.0,
            end: 1.0,
            color: [0.0; 4],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    pub test: bool,
    pub write: bool,
    pub func: CompareFunc,
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            test: false,
            write: true,
            func: CompareFunc::Less,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendState {
    pub enabled: bool,
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            enabled: false,
            src: BlendFactor::One,
            dst: BlendFactor::Zero,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaTestState {
    pub enabled: bool,
    pub func: CompareFunc,
    pub reference: f32,
}

impl Default for AlphaTestState {
    fn default() -> Self {
        Self {
            enabled: false,
            func: CompareFunc::Always,
            reference: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CullState {
    pub enabled: bool,
    pub face: CullFace,
    pub front: FrontFace,
}

impl Default for CullState {
    fn default() -> Self {
        Self {
            enabled: false,
            face: CullFace::Back,
            front: FrontFace::Ccw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScissorState {
    pub enabled: bool,
    /// x, y, width, height. None until set or until the first viewport.
    pub rect: Option<[i32; 4]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PolygonOffset {
    pub fill: bool,
    pub factor: f32,
    pub units: f32,
}

#[derive(Debug, Clone)]
pub struct MatrixState {
    pub mode: MatrixMode,
    pub modelview: MatrixStack,
    pub projection: MatrixStack,
}

impl Default for MatrixState {
    fn default() -> Self {
        Self {
            mode: MatrixMode::ModelView,
            modelview: MatrixStack::new(MODELVIEW_STACK_DEPTH),
            projection: MatrixStack::new(PROJECTION_STACK_DEPTH),
        }
    }
}

/// Which client arrays are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientArrays {
    pub vertex: bool,
    pub normal: bool,
    pub color: bool,
    pub tex_coord: [bool; MAX_TEXTURE_UNITS],
}

#[derive(Debug, Clone)]
pub struct RenderState {
    pub lighting: LightingState,
    pub texture_units: [TextureUnit; MAX_TEXTURE_UNITS],
    pub active_texture: usize,
    pub client_active_texture: usize,
    pub fog: FogState,
    pub depth: DepthState,
    pub blend: BlendState,
    pub alpha_test: AlphaTestState,
    pub cull: CullState,
    pub viewport: [i32; 4],
    pub scissor: ScissorState,
    pub polygon_offset: PolygonOffset,
    pub color_update: bool,
    pub alpha_update: bool,
    pub matrices: MatrixState,
    pub client: ClientArrays,
    pub current_color: [f32; 4],
    pub dirty: DirtyFlags,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            lighting: LightingState::default(),
            texture_units: Default::default(),
            active_texture: 0,
            client_active_texture: 0,
            fog: FogState::default(),
            depth: DepthState::default(),
            blend: BlendState::default(),
            alpha_test: AlphaTestState::default(),
            cull: CullState::default(),
            viewport: [0; 4],
            scissor: ScissorState::default(),
            polygon_offset: PolygonOffset::default(),
            color_update: true,
            alpha_update: true,
            matrices: MatrixState::default(),
            client: ClientArrays::default(),
            current_color: [1.0; 4],
            dirty: DirtyFlags::all(),
        }
    }
}

impl RenderState {
    pub fn mark_dirty(&mut self, flags: DirtyFlags) {
        self.dirty |= flags;
    }

    pub fn modelview(&self) -> &Matrixf {
        &self.matrices.modelview.cur
    }

    pub fn projection(&self) -> &Matrixf {
        &self.matrices.projection.cur
    }

    pub fn texture_enabled(&self) -> bool {
        self.texture_units.iter().any(|unit| unit.enabled)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = RenderState::default();
        assert_eq!(state.dirty, DirtyFlags::all());
        assert_eq!(state.lighting.lights[0].diffuse, [1.0; 4]);
        assert_eq!(state.lighting.lights[1].diffuse, [0.0, 0.0, 0.0, 1.0]);
        assert!(state.lighting.lights[0].is_directional());
        assert_eq!(state.texture_units[3].mode, TexEnvMode::Modulate);
        assert!(!state.texture_enabled());
    }
}
