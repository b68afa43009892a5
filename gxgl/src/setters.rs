//! Typed state setters. Each records state and marks the categories whose
//! hardware configuration depends on it.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::{
    backend::GxBackend,
    context::Context,
    dirty::DirtyFlags,
    error::GlError,
    gl::*,
    matrix::{normalize3, Matrixf, MatrixStack},
    state::TextureUnit,
};

/// Distance at which directional lights are placed.
const DIRECTIONAL_DISTANCE: f32 = 100000.0;

/// A texture environment parameter with its value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum TexEnv {
    Mode(TexEnvMode),
    Color([f32; 4]),
    CombineRgb(CombineFunc),
    CombineAlpha(CombineFunc),
    RgbScale(f32),
    AlphaScale(f32),
    SourceRgb(usize, CombineSource),
    SourceAlpha(usize, CombineSource),
    OperandRgb(usize, CombineOperand),
    OperandAlpha(usize, CombineOperand),
}

/// A fog parameter with its value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Fog {
    Mode(FogMode),
    Density(f32),
    Start(f32),
    End(f32),
    Color([f32; 4]),
}

fn rgba(values: &[f32]) -> Result<[f32; 4], GlError> {
    match values {
        [r, g, b, a, ..] => Ok([*r, *g, *b, *a]),
        _ => Err(GlError::InvalidValue),
    }
}

fn scalar(values: &[f32]) -> Result<f32, GlError> {
    values.first().copied().ok_or(GlError::InvalidValue)
}

fn in_range(value: f32, min: f32, max: f32) -> Result<f32, GlError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(GlError::InvalidValue)
    }
}

fn combine_index(index: usize) -> Result<usize, GlError> {
    if index < 3 {
        Ok(index)
    } else {
        Err(GlError::InvalidValue)
    }
}

fn combine_scale(scale: f32) -> Result<f32, GlError> {
    if [1.0, 2.0, 4.0].contains(&scale) {
        Ok(scale)
    } else {
        Err(GlError::InvalidValue)
    }
}

impl<B: GxBackend> Context<B> {
    /// Records the error of a failed call, which then has no effect.
    pub(crate) fn check(&mut self, result: Result<(), GlError>) {
        if let Err(error) = result {
            self.record_error(error);
        }
    }

    fn active_unit(&mut self) -> &mut TextureUnit {
        &mut self.state.texture_units[self.state.active_texture]
    }

    pub fn enable(&mut self, cap: impl Into<EnableCap>) {
        self.set_enabled(cap.into(), true);
    }

    pub fn disable(&mut self, cap: impl Into<EnableCap>) {
        self.set_enabled(cap.into(), false);
    }

    fn set_enabled(&mut self, cap: EnableCap, on: bool) {
        let cap = match cap {
            EnableCap::Light(index) => {
                if index >= MAX_LIGHTS {
                    self.record_error(GlError::InvalidEnum(GL_LIGHT0 + index as GLenum));
                    return;
                }
                self.state.lighting.lights[index].enabled = on;
                self.state.mark_dirty(DirtyFlags::TEV);
                return;
            }
            EnableCap::Cap(cap) => cap,
        };
        let dirty = match cap {
            Capability::Fog => {
                self.state.fog.enabled = on;
                DirtyFlags::FOG
            }
            Capability::Lighting => {
                self.state.lighting.enabled = on;
                DirtyFlags::ATTRIBUTES | DirtyFlags::TEV
            }
            Capability::ColorMaterial => {
                self.state.lighting.color_material = on;
                DirtyFlags::ATTRIBUTES | DirtyFlags::TEV
            }
            Capability::Texture2D => {
                self.active_unit().enabled = on;
                DirtyFlags::ATTRIBUTES | DirtyFlags::TEV
            }
            Capability::TextureGenS
            | Capability::TextureGenT
            | Capability::TextureGenR
            | Capability::TextureGenQ => {
                let coord = u32::from(cap) - u32::from(Capability::TextureGenS);
                self.active_unit().gen_enabled[coord as usize] = on;
                DirtyFlags::ATTRIBUTES | DirtyFlags::TEV
            }
            Capability::CullFace => {
                self.state.cull.enabled = on;
                DirtyFlags::CULL
            }
            Capability::AlphaTest => {
                self.state.alpha_test.enabled = on;
                DirtyFlags::ALPHA_TEST
            }
            Capability::Blend => {
                self.state.blend.enabled = on;
                DirtyFlags::BLEND
            }
            Capability::DepthTest => {
                self.state.depth.test = on;
                DirtyFlags::Z
            }
            Capability::ScissorTest => {
                self.state.scissor.enabled = on;
                DirtyFlags::SCISSOR
            }
            Capability::PolygonOffsetFill => {
                self.state.polygon_offset.fill = on;
                DirtyFlags::MATRICES
            }
        };
        self.state.mark_dirty(dirty);
    }

    pub fn is_enabled(&self, cap: impl Into<EnableCap>) -> bool {
        let state = &self.state;
        let unit = &state.texture_units[state.active_texture];
        match cap.into() {
            EnableCap::Light(index) => state
                .lighting
                .lights
                .get(index)
                .map_or(false, |light| light.enabled),
            EnableCap::Cap(cap) => match cap {
                Capability::Fog => state.fog.enabled,
                Capability::Lighting => state.lighting.enabled,
                Capability::ColorMaterial => state.lighting.color_material,
                Capability::Texture2D => unit.enabled,
                Capability::TextureGenS => unit.gen_enabled[0],
                Capability::TextureGenT => unit.gen_enabled[1],
                Capability::TextureGenR => unit.gen_enabled[2],
                Capability::TextureGenQ => unit.gen_enabled[3],
                Capability::CullFace => state.cull.enabled,
                Capability::AlphaTest => state.alpha_test.enabled,
                Capability::Blend => state.blend.enabled,
                Capability::DepthTest => state.depth.test,
                Capability::ScissorTest => state.scissor.enabled,
                Capability::PolygonOffsetFill => state.polygon_offset.fill,
            },
        }
    }

    pub fn enable_client_state(&mut self, array: ClientArray) {
        self.set_client_state(array, true);
    }

    pub fn disable_client_state(&mut self, array: ClientArray) {
        self.set_client_state(array, false);
    }

    fn set_client_state(&mut self, array: ClientArray, on: bool) {
        let client = &mut self.state.client;
        match array {
            ClientArray::VertexArray => client.vertex = on,
            ClientArray::NormalArray => client.normal = on,
            ClientArray::ColorArray => client.color = on,
            ClientArray::TextureCoordArray => {
                client.tex_coord[self.state.client_active_texture] = on
            }
        }
        self.state.mark_dirty(DirtyFlags::ATTRIBUTES);
    }

    /// Sets a parameter of light `index`. Positions and spot directions are
    /// transformed by the current modelview matrix.
    pub fn light(&mut self, index: usize, param: LightParam, values: &[f32]) {
        let result = self.set_light(index, param, values);
        self.check(result);
    }

    fn set_light(&mut self, index: usize, param: LightParam, values: &[f32]) -> Result<(), GlError> {
        if index >= MAX_LIGHTS {
            return Err(GlError::InvalidEnum(GL_LIGHT0 + index as GLenum));
        }
        let modelview = *self.state.modelview();
        let light = &mut self.state.lighting.lights[index];
        match param {
            LightParam::Ambient => light.ambient = rgba(values)?,
            LightParam::Diffuse => light.diffuse = rgba(values)?,
            LightParam::Specular => light.specular = rgba(values)?,
            LightParam::Position => {
                let mut position = &modelview * rgba(values)?;
                if position[3] == 0.0 {
                    for c in &mut position[..3] {
                        *c *= DIRECTIONAL_DISTANCE;
                    }
                }
                light.position = position;
            }
            LightParam::SpotDirection => {
                let [x, y, z] = match values {
                    [x, y, z, ..] => [*x, *y, *z],
                    _ => return Err(GlError::InvalidValue),
                };
                let dir = &modelview * [x, y, z, 0.0];
                light.spot_direction = normalize3([dir[0], dir[1], dir[2]]);
            }
            LightParam::SpotExponent => light.spot_exponent = in_range(scalar(values)?, 0.0, 128.0)?,
            LightParam::SpotCutoff => {
                let cutoff = scalar(values)?;
                if cutoff != 180.0 {
                    in_range(cutoff, 0.0, 90.0)?;
                }
                light.spot_cutoff = cutoff;
            }
            LightParam::ConstantAttenuation => {
                light.attenuation[0] = in_range(scalar(values)?, 0.0, f32::INFINITY)?
            }
            LightParam::LinearAttenuation => {
                light.attenuation[1] = in_range(scalar(values)?, 0.0, f32::INFINITY)?
            }
            LightParam::QuadraticAttenuation => {
                light.attenuation[2] = in_range(scalar(values)?, 0.0, f32::INFINITY)?
            }
        }
        self.state.mark_dirty(DirtyFlags::TEV);
        Ok(())
    }

    pub fn material(&mut self, param: MaterialParam, values: &[f32]) {
        let result = self.set_material(param, values);
        self.check(result);
    }

    fn set_material(&mut self, param: MaterialParam, values: &[f32]) -> Result<(), GlError> {
        let material = &mut self.state.lighting.material;
        match param {
            MaterialParam::Ambient => material.ambient = rgba(values)?,
            MaterialParam::Diffuse => material.diffuse = rgba(values)?,
            MaterialParam::Specular => material.specular = rgba(values)?,
            MaterialParam::Emission => material.emission = rgba(values)?,
            MaterialParam::Shininess => material.shininess = in_range(scalar(values)?, 0.0, 128.0)?,
            MaterialParam::AmbientAndDiffuse => {
                let color = rgba(values)?;
                material.ambient = color;
                material.diffuse = color;
            }
        }
        self.state.mark_dirty(DirtyFlags::TEV);
        Ok(())
    }

    pub fn light_model_ambient(&mut self, color: [f32; 4]) {
        self.state.lighting.global_ambient = color;
        self.state.mark_dirty(DirtyFlags::TEV);
    }

    pub fn color_material(&mut self, mode: ColorMaterialMode) {
        self.state.lighting.color_material_mode = mode;
        self.state.mark_dirty(DirtyFlags::TEV);
    }

    /// Sets the current color, used when no color array is enabled.
    pub fn color(&mut self, color: [f32; 4]) {
        self.state.current_color = color;
        self.state.mark_dirty(DirtyFlags::TEV);
    }

    pub fn tex_env(&mut self, env: TexEnv) {
        let result = self.set_tex_env(env);
        self.check(result);
    }

    fn set_tex_env(&mut self, env: TexEnv) -> Result<(), GlError> {
        let unit = self.active_unit();
        match env {
            TexEnv::Mode(mode) => unit.mode = mode,
            TexEnv::Color(color) => unit.color = color,
            TexEnv::CombineRgb(func) => unit.combine_rgb = func,
            TexEnv::CombineAlpha(func) => unit.combine_alpha = func,
            TexEnv::RgbScale(scale) => unit.rgb_scale = combine_scale(scale)?,
            TexEnv::AlphaScale(scale) => unit.alpha_scale = combine_scale(scale)?,
            TexEnv::SourceRgb(i, source) => unit.source_rgb[combine_index(i)?] = source,
            TexEnv::SourceAlpha(i, source) => unit.source_alpha[combine_index(i)?] = source,
            TexEnv::OperandRgb(i, operand) => unit.operand_rgb[combine_index(i)?] = operand,
            TexEnv::OperandAlpha(i, operand) => {
                if !operand.is_alpha() {
                    return Err(GlError::InvalidEnum(operand.into()));
                }
                unit.operand_alpha[combine_index(i)?] = operand
            }
        }
        self.state.mark_dirty(DirtyFlags::TEV);
        Ok(())
    }

    pub fn tex_gen_mode(&mut self, mode: TexGenMode) {
        self.active_unit().gen_mode = mode;
        self.state.mark_dirty(DirtyFlags::ATTRIBUTES | DirtyFlags::TEV);
    }

    /// Sets an object or eye plane. Eye planes are stored as given and
    /// combined with the modelview matrix when applied.
    pub fn tex_gen_plane(&mut self, coord: TexGenCoord, param: TexGenParam, plane: [f32; 4]) {
        let row = match coord {
            TexGenCoord::S => 0,
            TexGenCoord::T => 1,
            // Only two-component coordinates are generated.
            TexGenCoord::R | TexGenCoord::Q => return,
        };
        let unit = self.active_unit();
        match param {
            TexGenParam::ObjectPlane => unit.object_plane[row] = plane,
            TexGenParam::EyePlane => unit.eye_plane[row] = plane,
            TexGenParam::Mode => {
                self.record_error(GlError::InvalidEnum(param.into()));
                return;
            }
        }
        self.state.mark_dirty(DirtyFlags::TEV);
    }

    pub fn active_texture(&mut self, unit: usize) {
        if unit >= MAX_TEXTURE_UNITS {
            self.record_error(GlError::InvalidEnum(GL_TEXTURE0 + unit as GLenum));
            return;
        }
        self.state.active_texture = unit;
    }

    pub fn client_active_texture(&mut self, unit: usize) {
        if unit >= MAX_TEXTURE_UNITS {
            self.record_error(GlError::InvalidEnum(GL_TEXTURE0 + unit as GLenum));
            return;
        }
        self.state.client_active_texture = unit;
    }

    /// Binds texture `id` to the active unit.
    pub fn bind_texture(&mut self, id: u32) {
        self.active_unit().bound_texture = id;
        self.state.mark_dirty(DirtyFlags::TEV);
    }

    pub fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.state.blend.src = src;
        self.state.blend.dst = dst;
        self.state.mark_dirty(DirtyFlags::BLEND);
    }

    pub fn depth_func(&mut self, func: CompareFunc) {
        self.state.depth.func = func;
        self.state.mark_dirty(DirtyFlags::Z);
    }

    pub fn depth_mask(&mut self, write: bool) {
        self.state.depth.write = write;
        self.state.mark_dirty(DirtyFlags::Z);
    }

    pub fn alpha_func(&mut self, func: CompareFunc, reference: f32) {
        self.state.alpha_test.func = func;
        self.state.alpha_test.reference = reference.clamp(0.0, 1.0);
        self.state.mark_dirty(DirtyFlags::ALPHA_TEST);
    }

    pub fn cull_face(&mut self, face: CullFace) {
        self.state.cull.face = face;
        self.state.mark_dirty(DirtyFlags::CULL);
    }

    pub fn front_face(&mut self, front: FrontFace) {
        self.state.cull.front = front;
        self.state.mark_dirty(DirtyFlags::CULL);
    }

    pub fn fog(&mut self, fog: Fog) {
        let state = &mut self.state.fog;
        match fog {
            Fog::Mode(mode) => state.mode = mode,
            Fog::Density(density) if density < 0.0 => {
                self.record_error(GlError::InvalidValue);
                return;
            }
            Fog::Density(density) => state.density = density,
            Fog::Start(start) => state.start = start,
            Fog::End(end) => state.end = end,
            Fog::Color(color) => state.color = color,
        }
        self.state.mark_dirty(DirtyFlags::FOG);
    }

    /// Sets the viewport. The width is limited to the frame buffer width, and
    /// the first viewport also initializes the scissor rectangle.
    pub fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if width < 0 || height < 0 {
            self.record_error(GlError::InvalidValue);
            return;
        }
        let width = width.min(self.config.efb_width as i32);
        self.state.viewport = [x, y, width, height];
        self.state.scissor.rect.get_or_insert([x, y, width, height]);
        self.state
            .mark_dirty(DirtyFlags::VIEWPORT | DirtyFlags::SCISSOR);
    }

    pub fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if width < 0 || height < 0 {
            self.record_error(GlError::InvalidValue);
            return;
        }
        let width = width.min(self.config.efb_width as i32);
        self.state.scissor.rect = Some([x, y, width, height]);
        self.state.mark_dirty(DirtyFlags::SCISSOR);
    }

    pub fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.state.polygon_offset.factor = factor;
        self.state.polygon_offset.units = units;
        self.state.mark_dirty(DirtyFlags::MATRICES);
    }

    /// The hardware can only mask color as a whole, so any of red, green or
    /// blue enables color updates.
    pub fn color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool) {
        self.state.color_update = red || green || blue;
        self.state.alpha_update = alpha;
        self.state.mark_dirty(DirtyFlags::COLOR_UPDATE);
    }

    pub fn matrix_mode(&mut self, mode: MatrixMode) {
        self.state.matrices.mode = mode;
    }

    /// Runs `f` on the current matrix stack and marks what depends on it.
    fn with_matrix<T>(&mut self, f: impl FnOnce(&mut MatrixStack) -> T) -> T {
        let state = &mut self.state;
        let (stack, dirty) = match state.matrices.mode {
            MatrixMode::ModelView => {
                // Eye-linear and sphere-map texgen read the modelview matrix.
                let texgen = state.texture_units.iter().any(|unit| unit.gen_active());
                let dirty = if texgen {
                    DirtyFlags::MATRICES | DirtyFlags::TEV
                } else {
                    DirtyFlags::MATRICES
                };
                (&mut state.matrices.modelview, dirty)
            }
            MatrixMode::Projection => (
                &mut state.matrices.projection,
                DirtyFlags::MATRICES | DirtyFlags::FOG,
            ),
            MatrixMode::Texture => (
                &mut state.texture_units[state.active_texture].matrix,
                DirtyFlags::TEV,
            ),
        };
        let result = f(stack);
        state.mark_dirty(dirty);
        result
    }

    pub fn load_matrix(&mut self, m: &Matrixf) {
        self.with_matrix(|stack| stack.load(*m));
    }

    pub fn mult_matrix(&mut self, m: &Matrixf) {
        self.with_matrix(|stack| stack.mul(m));
    }

    pub fn load_identity(&mut self) {
        self.load_matrix(&Matrixf::identity());
    }

    pub fn push_matrix(&mut self) {
        let result = self.with_matrix(MatrixStack::push);
        self.check(result);
    }

    pub fn pop_matrix(&mut self) {
        let result = self.with_matrix(MatrixStack::pop);
        self.check(result);
    }

    pub fn frustum(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        if near <= 0.0 || far <= 0.0 || left == right || bottom == top || near == far {
            self.record_error(GlError::InvalidValue);
            return;
        }
        self.mult_matrix(&Matrixf::frustum(left, right, bottom, top, near, far));
    }

    pub fn ortho(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        if left == right || bottom == top || near == far {
            self.record_error(GlError::InvalidValue);
            return;
        }
        self.mult_matrix(&Matrixf::ortho(left, right, bottom, top, near, far));
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;
    use crate::{gx::TexObjHandle, Context};

    fn no_textures() -> HashMap<u32, TexObjHandle> {
        HashMap::new()
    }

    fn applied() -> Context {
        let mut ctx = Context::new();
        ctx.compile_and_apply(&no_textures());
        ctx.backend_mut().finish();
        ctx
    }

    #[test]
    fn test_setters_mark_their_category() {
        let mut ctx = applied();
        ctx.enable(Capability::Fog);
        assert_eq!(ctx.state().dirty, DirtyFlags::FOG);

        let mut ctx = applied();
        ctx.enable(Capability::Texture2D);
        assert_eq!(ctx.state().dirty, DirtyFlags::ATTRIBUTES | DirtyFlags::TEV);

        let mut ctx = applied();
        ctx.matrix_mode(MatrixMode::Projection);
        ctx.load_identity();
        assert_eq!(ctx.state().dirty, DirtyFlags::MATRICES | DirtyFlags::FOG);

        let mut ctx = applied();
        ctx.polygon_offset(1.0, 1.0);
        assert_eq!(ctx.state().dirty, DirtyFlags::MATRICES);
    }

    #[test]
    fn test_modelview_marks_tev_with_texgen() {
        let mut ctx = applied();
        ctx.load_identity();
        assert_eq!(ctx.state().dirty, DirtyFlags::MATRICES);

        ctx.enable(Capability::TextureGenS);
        ctx.compile_and_apply(&no_textures());
        ctx.load_identity();
        assert_eq!(ctx.state().dirty, DirtyFlags::MATRICES | DirtyFlags::TEV);
    }

    #[test]
    fn test_light_position_follows_modelview() {
        let mut ctx = Context::new();
        ctx.load_matrix(&Matrixf::translate(0.0, 0.0, -5.0));
        ctx.light(1, LightParam::Position, &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(ctx.state().lighting.lights[1].position, [1.0, 0.0, -5.0, 1.0]);

        ctx.light(2, LightParam::Position, &[0.0, 1.0, 0.0, 0.0]);
        assert_eq!(
            ctx.state().lighting.lights[2].position,
            [0.0, DIRECTIONAL_DISTANCE, 0.0, 0.0]
        );
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let mut ctx = Context::new();
        ctx.light(0, LightParam::SpotCutoff, &[120.0]);
        assert_eq!(ctx.take_error(), Some(GlError::InvalidValue));
        assert_eq!(ctx.state().lighting.lights[0].spot_cutoff, 180.0);

        ctx.material(MaterialParam::Diffuse, &[1.0, 0.0]);
        assert_eq!(ctx.take_error(), Some(GlError::InvalidValue));
        assert_eq!(ctx.state().lighting.material.diffuse, [0.8, 0.8, 0.8, 1.0]);

        ctx.tex_env(TexEnv::RgbScale(3.0));
        assert_eq!(ctx.take_error(), Some(GlError::InvalidValue));
        assert_eq!(ctx.state().texture_units[0].rgb_scale, 1.0);

        ctx.active_texture(8);
        assert_eq!(ctx.take_error(), Some(GlError::InvalidEnum(GL_TEXTURE0 + 8)));
        assert_eq!(ctx.state().active_texture, 0);
    }

    #[test]
    fn test_matrix_stack_errors() {
        let mut ctx = Context::new();
        ctx.matrix_mode(MatrixMode::Projection);
        ctx.pop_matrix();
        assert_eq!(ctx.take_error(), Some(GlError::StackUnderflow));
        for _ in 0..8 {
            ctx.push_matrix();
        }
        assert_eq!(ctx.take_error(), Some(GlError::StackOverflow));
    }

    #[test]
    fn test_viewport_initializes_scissor() {
        let mut ctx = Context::new();
        ctx.viewport(0, 0, 800, 480);
        assert_eq!(ctx.state().viewport, [0, 0, 640, 480]);
        assert_eq!(ctx.state().scissor.rect, Some([0, 0, 640, 480]));
        ctx.viewport(10, 10, 100, 100);
        assert_eq!(ctx.state().scissor.rect, Some([0, 0, 640, 480]));
    }

    #[test]
    fn test_tex_env_targets_active_unit() {
        let mut ctx = Context::new();
        ctx.active_texture(2);
        ctx.tex_env(TexEnv::Mode(TexEnvMode::Replace));
        ctx.tex_env(TexEnv::SourceRgb(1, CombineSource::Constant));
        assert_eq!(ctx.state().texture_units[2].mode, TexEnvMode::Replace);
        assert_eq!(
            ctx.state().texture_units[2].source_rgb[1],
            CombineSource::Constant
        );
        assert_eq!(ctx.state().texture_units[0].mode, TexEnvMode::Modulate);
    }
}
