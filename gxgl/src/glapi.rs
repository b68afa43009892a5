//! Entry points taking raw GL enum values, for callers that forward GL calls
//! unchanged. Values that fail to decode record [GlError::InvalidEnum] and the
//! call has no effect.

#![allow(missing_docs)]

use num_enum::TryFromPrimitive;

use crate::{
    backend::GxBackend,
    context::Context,
    error::GlError,
    gl::*,
    matrix::Matrixf,
    setters::{Fog, TexEnv},
};

pub const GL_NO_ERROR: GLenum = 0;
pub const GL_TEXTURE_ENV: GLenum = 0x2300;
pub const GL_TEXTURE_2D: GLenum = 0x0DE1;
pub const GL_LIGHT_MODEL_LOCAL_VIEWER: GLenum = 0x0B51;
pub const GL_LIGHT_MODEL_TWO_SIDE: GLenum = 0x0B52;
pub const GL_LIGHT_MODEL_AMBIENT: GLenum = 0x0B53;

impl GlError {
    /// The value `glGetError` reports for this error.
    pub fn code(self) -> GLenum {
        match self {
            GlError::InvalidEnum(_) => 0x0500,
            GlError::InvalidValue => 0x0501,
            GlError::InvalidOperation => 0x0502,
            GlError::StackOverflow => 0x0503,
            GlError::StackUnderflow => 0x0504,
        }
    }
}

fn index_from(value: GLenum, base: GLenum, count: usize) -> Result<usize, GlError> {
    match value.checked_sub(base) {
        Some(index) if (index as usize) < count => Ok(index as usize),
        _ => Err(GlError::InvalidEnum(value)),
    }
}

fn matrix(m: &[f32]) -> Result<Matrixf, GlError> {
    let m: &[f32; 16] = m.try_into().map_err(|_| GlError::InvalidValue)?;
    Ok(Matrixf::from_gl(m))
}

impl<B: GxBackend> Context<B> {
    fn decode<T>(&mut self, value: GLenum) -> Option<T>
    where
        T: TryFromPrimitive<Primitive = GLenum>,
    {
        match T::try_from_primitive(value) {
            Ok(value) => Some(value),
            Err(error) => {
                self.record_error(error.into());
                None
            }
        }
    }

    fn require(&mut self, value: GLenum, expected: GLenum) -> bool {
        if value != expected {
            self.record_error(GlError::InvalidEnum(value));
        }
        value == expected
    }

    /// Returns and clears the recorded error code.
    pub fn gl_get_error(&mut self) -> GLenum {
        self.take_error().map_or(GL_NO_ERROR, GlError::code)
    }

    pub fn gl_enable(&mut self, cap: GLenum) {
        match EnableCap::try_from(cap) {
            Ok(cap) => self.enable(cap),
            Err(error) => self.record_error(error),
        }
    }

    pub fn gl_disable(&mut self, cap: GLenum) {
        match EnableCap::try_from(cap) {
            Ok(cap) => self.disable(cap),
            Err(error) => self.record_error(error),
        }
    }

    pub fn gl_enable_client_state(&mut self, array: GLenum) {
        if let Some(array) = self.decode(array) {
            self.enable_client_state(array);
        }
    }

    pub fn gl_disable_client_state(&mut self, array: GLenum) {
        if let Some(array) = self.decode(array) {
            self.disable_client_state(array);
        }
    }

    pub fn gl_lightfv(&mut self, light: GLenum, pname: GLenum, params: &[f32]) {
        let index = match index_from(light, GL_LIGHT0, MAX_LIGHTS) {
            Ok(index) => index,
            Err(error) => return self.record_error(error),
        };
        if let Some(param) = self.decode(pname) {
            self.light(index, param, params);
        }
    }

    /// Only for the scalar light parameters.
    pub fn gl_lightf(&mut self, light: GLenum, pname: GLenum, param: f32) {
        match LightParam::try_from_primitive(pname) {
            Ok(
                LightParam::SpotExponent
                | LightParam::SpotCutoff
                | LightParam::ConstantAttenuation
                | LightParam::LinearAttenuation
                | LightParam::QuadraticAttenuation,
            ) => self.gl_lightfv(light, pname, &[param]),
            _ => self.record_error(GlError::InvalidEnum(pname)),
        }
    }

    /// Both faces share one material.
    pub fn gl_materialfv(&mut self, face: GLenum, pname: GLenum, params: &[f32]) {
        if self.decode::<CullFace>(face).is_none() {
            return;
        }
        if let Some(param) = self.decode(pname) {
            self.material(param, params);
        }
    }

    pub fn gl_materialf(&mut self, face: GLenum, pname: GLenum, param: f32) {
        if matches!(
            MaterialParam::try_from_primitive(pname),
            Ok(MaterialParam::Shininess)
        ) {
            self.gl_materialfv(face, pname, &[param]);
        } else {
            self.record_error(GlError::InvalidEnum(pname));
        }
    }

    pub fn gl_light_modelfv(&mut self, pname: GLenum, params: &[f32]) {
        match pname {
            GL_LIGHT_MODEL_AMBIENT => match params {
                [r, g, b, a, ..] => self.light_model_ambient([*r, *g, *b, *a]),
                _ => self.record_error(GlError::InvalidValue),
            },
            GL_LIGHT_MODEL_LOCAL_VIEWER | GL_LIGHT_MODEL_TWO_SIDE => {
                tracing::debug!("ignoring light model parameter {:#06X}", pname);
            }
            _ => self.record_error(GlError::InvalidEnum(pname)),
        }
    }

    pub fn gl_color_material(&mut self, face: GLenum, mode: GLenum) {
        if self.decode::<CullFace>(face).is_none() {
            return;
        }
        if let Some(mode) = self.decode(mode) {
            self.color_material(mode);
        }
    }

    pub fn gl_tex_envi(&mut self, target: GLenum, pname: GLenum, param: i32) {
        if !self.require(target, GL_TEXTURE_ENV) {
            return;
        }
        let pname = match self.decode::<TexEnvParam>(pname) {
            Some(pname) => pname,
            None => return,
        };
        let value = param as GLenum;
        let env = match pname {
            TexEnvParam::Mode => self.decode(value).map(TexEnv::Mode),
            TexEnvParam::CombineRgb => self.decode(value).map(TexEnv::CombineRgb),
            TexEnvParam::CombineAlpha => self.decode(value).map(TexEnv::CombineAlpha),
            TexEnvParam::RgbScale => Some(TexEnv::RgbScale(param as f32)),
            TexEnvParam::AlphaScale => Some(TexEnv::AlphaScale(param as f32)),
            TexEnvParam::Source0Rgb | TexEnvParam::Source1Rgb | TexEnvParam::Source2Rgb => {
                let i = (u32::from(pname) - u32::from(TexEnvParam::Source0Rgb)) as usize;
                self.decode(value).map(|source| TexEnv::SourceRgb(i, source))
            }
            TexEnvParam::Source0Alpha | TexEnvParam::Source1Alpha | TexEnvParam::Source2Alpha => {
                let i = (u32::from(pname) - u32::from(TexEnvParam::Source0Alpha)) as usize;
                self.decode(value).map(|source| TexEnv::SourceAlpha(i, source))
            }
            TexEnvParam::Operand0Rgb | TexEnvParam::Operand1Rgb | TexEnvParam::Operand2Rgb => {
                let i = (u32::from(pname) - u32::from(TexEnvParam::Operand0Rgb)) as usize;
                self.decode(value).map(|operand| TexEnv::OperandRgb(i, operand))
            }
            TexEnvParam::Operand0Alpha
            | TexEnvParam::Operand1Alpha
            | TexEnvParam::Operand2Alpha => {
                let i = (u32::from(pname) - u32::from(TexEnvParam::Operand0Alpha)) as usize;
                self.decode(value).map(|operand| TexEnv::OperandAlpha(i, operand))
            }
            TexEnvParam::Color => {
                self.record_error(GlError::InvalidEnum(pname.into()));
                None
            }
        };
        if let Some(env) = env {
            self.tex_env(env);
        }
    }

    pub fn gl_tex_envf(&mut self, target: GLenum, pname: GLenum, param: f32) {
        match TexEnvParam::try_from_primitive(pname) {
            Ok(TexEnvParam::RgbScale) if target == GL_TEXTURE_ENV => {
                self.tex_env(TexEnv::RgbScale(param))
            }
            Ok(TexEnvParam::AlphaScale) if target == GL_TEXTURE_ENV => {
                self.tex_env(TexEnv::AlphaScale(param))
            }
            _ => self.gl_tex_envi(target, pname, param as i32),
        }
    }

    pub fn gl_tex_envfv(&mut self, target: GLenum, pname: GLenum, params: &[f32]) {
        match TexEnvParam::try_from_primitive(pname) {
            Ok(TexEnvParam::Color) if target == GL_TEXTURE_ENV => match params {
                [r, g, b, a, ..] => self.tex_env(TexEnv::Color([*r, *g, *b, *a])),
                _ => self.record_error(GlError::InvalidValue),
            },
            _ => match params.first() {
                Some(&param) => self.gl_tex_envf(target, pname, param),
                None => self.record_error(GlError::InvalidValue),
            },
        }
    }

    pub fn gl_tex_geni(&mut self, coord: GLenum, pname: GLenum, param: i32) {
        if self.decode::<TexGenCoord>(coord).is_none() {
            return;
        }
        if !self.require(pname, TexGenParam::Mode.into()) {
            return;
        }
        if let Some(mode) = self.decode(param as GLenum) {
            self.tex_gen_mode(mode);
        }
    }

    pub fn gl_tex_genfv(&mut self, coord: GLenum, pname: GLenum, params: &[f32]) {
        let (gen_coord, param): (TexGenCoord, TexGenParam) =
            match (self.decode(coord), self.decode(pname)) {
                (Some(gen_coord), Some(param)) => (gen_coord, param),
                _ => return,
            };
        match (param, params) {
            (TexGenParam::Mode, [mode, ..]) => self.gl_tex_geni(coord, pname, *mode as i32),
            (TexGenParam::ObjectPlane | TexGenParam::EyePlane, [a, b, c, d, ..]) => {
                self.tex_gen_plane(gen_coord, param, [*a, *b, *c, *d])
            }
            _ => self.record_error(GlError::InvalidValue),
        }
    }

    pub fn gl_active_texture(&mut self, texture: GLenum) {
        match index_from(texture, GL_TEXTURE0, MAX_TEXTURE_UNITS) {
            Ok(unit) => self.active_texture(unit),
            Err(error) => self.record_error(error),
        }
    }

    pub fn gl_client_active_texture(&mut self, texture: GLenum) {
        match index_from(texture, GL_TEXTURE0, MAX_TEXTURE_UNITS) {
            Ok(unit) => self.client_active_texture(unit),
            Err(error) => self.record_error(error),
        }
    }

    pub fn gl_bind_texture(&mut self, target: GLenum, texture: u32) {
        if self.require(target, GL_TEXTURE_2D) {
            self.bind_texture(texture);
        }
    }

    pub fn gl_blend_func(&mut self, src: GLenum, dst: GLenum) {
        if let (Some(src), Some(dst)) = (self.decode(src), self.decode(dst)) {
            self.blend_func(src, dst);
        }
    }

    pub fn gl_depth_func(&mut self, func: GLenum) {
        if let Some(func) = self.decode(func) {
            self.depth_func(func);
        }
    }

    pub fn gl_alpha_func(&mut self, func: GLenum, reference: f32) {
        if let Some(func) = self.decode(func) {
            self.alpha_func(func, reference);
        }
    }

    pub fn gl_cull_face(&mut self, face: GLenum) {
        if let Some(face) = self.decode(face) {
            self.cull_face(face);
        }
    }

    pub fn gl_front_face(&mut self, front: GLenum) {
        if let Some(front) = self.decode(front) {
            self.front_face(front);
        }
    }

    pub fn gl_fogi(&mut self, pname: GLenum, param: i32) {
        match FogParam::try_from_primitive(pname) {
            Ok(FogParam::Mode) => {
                if let Some(mode) = self.decode(param as GLenum) {
                    self.fog(Fog::Mode(mode));
                }
            }
            _ => self.gl_fogf(pname, param as f32),
        }
    }

    pub fn gl_fogf(&mut self, pname: GLenum, param: f32) {
        let pname = match self.decode::<FogParam>(pname) {
            Some(pname) => pname,
            None => return,
        };
        match pname {
            FogParam::Mode => self.gl_fogi(pname.into(), param as i32),
            FogParam::Density => self.fog(Fog::Density(param)),
            FogParam::Start => self.fog(Fog::Start(param)),
            FogParam::End => self.fog(Fog::End(param)),
            FogParam::Color => self.record_error(GlError::InvalidEnum(pname.into())),
        }
    }

    pub fn gl_fogfv(&mut self, pname: GLenum, params: &[f32]) {
        match (FogParam::try_from_primitive(pname), params) {
            (Ok(FogParam::Color), [r, g, b, a, ..]) => self.fog(Fog::Color([*r, *g, *b, *a])),
            (_, [param, ..]) => self.gl_fogf(pname, *param),
            (_, []) => self.record_error(GlError::InvalidValue),
        }
    }

    pub fn gl_matrix_mode(&mut self, mode: GLenum) {
        if let Some(mode) = self.decode(mode) {
            self.matrix_mode(mode);
        }
    }

    /// Loads a column-major matrix.
    pub fn gl_load_matrixf(&mut self, m: &[f32]) {
        match matrix(m) {
            Ok(m) => self.load_matrix(&m),
            Err(error) => self.record_error(error),
        }
    }

    /// Multiplies by a column-major matrix.
    pub fn gl_mult_matrixf(&mut self, m: &[f32]) {
        match matrix(m) {
            Ok(m) => self.mult_matrix(&m),
            Err(error) => self.record_error(error),
        }
    }
}
