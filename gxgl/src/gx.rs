//! The hardware-side vocabulary: slot identifiers, combiner inputs and the
//! parameter records carried by [GxCommand](crate::backend::GxCommand).

#![allow(missing_docs)]

use bitflags::bitflags;
use serde::Serialize;

/// An 8-bit RGBA color as held by the GX color registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct GxColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl GxColor {
    pub const BLACK: GxColor = GxColor::new(0, 0, 0, 255);
    pub const WHITE: GxColor = GxColor::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Converts a GL float color, clamping each component to [0, 1].
    pub fn from_rgba(c: [f32; 4]) -> Self {
        let quantize = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(quantize(c[0]), quantize(c[1]), quantize(c[2]), quantize(c[3]))
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

macro_rules! slot_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        pub struct $name(pub u8);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

slot_id!(
    /// A TEV combiner stage.
    TevStageId
);
slot_id!(
    /// A texture coordinate generator output.
    TexCoordId
);
slot_id!(
    /// A texture map unit.
    TexMapId
);
slot_id!(
    /// One of the texture matrices applied before the post-transform.
    TexMtxId
);
slot_id!(
    /// A dual-texture-transform (post-transform) matrix.
    DttMtxId
);
slot_id!(
    /// A konstant color register.
    KonstReg
);
slot_id!(
    /// A hardware light object slot.
    GxLightId
);

/// A handle to a hardware texture object owned by the texture collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TexObjHandle(pub u32);

/// TEV output and input registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TevReg {
    Prev,
    Reg0,
    Reg1,
    Reg2,
}

impl TevReg {
    /// The general purpose register for an index handed out by the ledger.
    pub fn general(index: u8) -> Self {
        match index {
            0 => TevReg::Reg0,
            1 => TevReg::Reg1,
            _ => TevReg::Reg2,
        }
    }

    pub fn color_arg(self) -> TevColorArg {
        match self {
            TevReg::Prev => TevColorArg::CPrev,
            TevReg::Reg0 => TevColorArg::C0,
            TevReg::Reg1 => TevColorArg::C1,
            TevReg::Reg2 => TevColorArg::C2,
        }
    }

    pub fn alpha_as_color_arg(self) -> TevColorArg {
        match self {
            TevReg::Prev => TevColorArg::APrev,
            TevReg::Reg0 => TevColorArg::A0,
            TevReg::Reg1 => TevColorArg::A1,
            TevReg::Reg2 => TevColorArg::A2,
        }
    }

    pub fn alpha_arg(self) -> TevAlphaArg {
        match self {
            TevReg::Prev => TevAlphaArg::APrev,
            TevReg::Reg0 => TevAlphaArg::A0,
            TevReg::Reg1 => TevAlphaArg::A1,
            TevReg::Reg2 => TevAlphaArg::A2,
        }
    }
}

/// Color combiner inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TevColorArg {
    CPrev,
    APrev,
    C0,
    A0,
    C1,
    A1,
    C2,
    A2,
    TexC,
    TexA,
    RasC,
    RasA,
    One,
    Half,
    Konst,
    Zero,
}

/// Alpha combiner inputs. There is no constant one; it is expressed through
/// the konstant input with [KAlphaSel::One].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TevAlphaArg {
    APrev,
    A0,
    A1,
    A2,
    TexA,
    RasA,
    Konst,
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TevOp {
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TevBias {
    Zero,
    AddHalf,
    SubHalf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TevScale {
    Scale1,
    Scale2,
    Scale4,
    Divide2,
}

/// The operation half of a combiner stage: `dest = d op (a*(1-c) + b*c + bias)) * scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TevOpConfig {
    pub op: TevOp,
    pub bias: TevBias,
    pub scale: TevScale,
    pub clamp: bool,
    pub dest: TevReg,
}

impl Default for TevOpConfig {
    fn default() -> Self {
        Self {
            op: TevOp::Add,
            bias: TevBias::Zero,
            scale: TevScale::Scale1,
            clamp: true,
            dest: TevReg::Prev,
        }
    }
}

impl TevOpConfig {
    pub fn to(dest: TevReg) -> Self {
        Self {
            dest,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KColorSel {
    One,
    K(KonstReg),
    /// The register's alpha broadcast to RGB.
    KAlpha(KonstReg),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KAlphaSel {
    One,
    KAlpha(KonstReg),
}

/// Rasterized color channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChannelId {
    Color0A0,
    Color1A1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColorSrc {
    Register,
    Vertex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiffuseFn {
    None,
    Sign,
    Clamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AttnFn {
    None,
    Spec,
    Spot,
}

bitflags! {
    /// Hardware lights feeding a channel.
    #[derive(Default, Serialize)]
    #[serde(transparent)]
    pub struct LightMask: u8 {
        const LIGHT0 = 1 << 0;
        const LIGHT1 = 1 << 1;
        const LIGHT2 = 1 << 2;
        const LIGHT3 = 1 << 3;
        const LIGHT4 = 1 << 4;
        const LIGHT5 = 1 << 5;
        const LIGHT6 = 1 << 6;
        const LIGHT7 = 1 << 7;
    }
}

impl LightMask {
    pub fn of(light: GxLightId) -> Self {
        LightMask::from_bits_truncate(1u8.checked_shl(light.0 as u32).unwrap_or(0))
    }
}

/// Lighting channel control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChanCtrl {
    pub enable: bool,
    pub ambient_src: ColorSrc,
    pub material_src: ColorSrc,
    pub lights: LightMask,
    pub diffuse_fn: DiffuseFn,
    pub attn_fn: AttnFn,
}

impl ChanCtrl {
    pub fn unlit(material_src: ColorSrc) -> Self {
        Self {
            enable: false,
            ambient_src: ColorSrc::Register,
            material_src,
            lights: LightMask::empty(),
            diffuse_fn: DiffuseFn::None,
            attn_fn: AttnFn::None,
        }
    }
}

/// Contents of a hardware light object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LightObj {
    pub color: GxColor,
    pub position: [f32; 3],
    pub direction: [f32; 3],
    /// Angular attenuation `a0 + a1*cos + a2*cos^2`.
    pub angle_attn: [f32; 3],
    /// Distance attenuation `k0 + k1*d + k2*d^2`.
    pub dist_attn: [f32; 3],
}

/// Distance used to push the light position out for specular lights.
const LARGE_NUMBER: f32 = 1048576.0;

impl LightObj {
    pub fn new(color: GxColor) -> Self {
        Self {
            color,
            position: [0.0; 3],
            direction: [0.0, -1.0, 0.0],
            angle_attn: [1.0, 0.0, 0.0],
            dist_attn: [1.0, 0.0, 0.0],
        }
    }

    /// Configures a specular light shining along `dir` (normalized), storing the
    /// half-angle vector for an infinite viewer.
    pub fn set_specular_dir(&mut self, dir: [f32; 3]) {
        let half = crate::matrix::normalize3([-dir[0], -dir[1], -dir[2] + 1.0]);
        self.position = [
            -dir[0] * LARGE_NUMBER,
            -dir[1] * LARGE_NUMBER,
            -dir[2] * LARGE_NUMBER,
        ];
        self.direction = half;
    }

    /// Expresses the specular exponent through the angular attenuation.
    pub fn set_shininess(&mut self, shininess: f32) {
        self.angle_attn = [0.0, 0.0, 1.0];
        self.dist_attn = [shininess / 2.0, 0.0, 1.0 - shininess / 2.0];
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TexGenType {
    Mtx2x4,
    Mtx3x4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TexGenSrc {
    Position,
    Normal,
    /// A streamed texture coordinate attribute.
    Tex(u8),
}

/// Configuration of one texture coordinate generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TexCoordGen {
    pub kind: TexGenType,
    pub src: TexGenSrc,
    /// None is the identity matrix.
    pub matrix: Option<TexMtxId>,
    pub normalize: bool,
    pub post_matrix: DttMtxId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProjectionType {
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompareFn {
    Never,
    Less,
    Equal,
    Lequal,
    Greater,
    NotEqual,
    Gequal,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AlphaOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AlphaCompare {
    pub comp0: CompareFn,
    pub ref0: u8,
    pub op: AlphaOp,
    pub comp1: CompareFn,
    pub ref1: u8,
}

impl AlphaCompare {
    pub const ALWAYS: AlphaCompare = AlphaCompare {
        comp0: CompareFn::Always,
        ref0: 0,
        op: AlphaOp::And,
        comp1: CompareFn::Always,
        ref1: 0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BlendMode {
    None,
    Blend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GxBlendFactor {
    Zero,
    One,
    SrcColor,
    InvSrcColor,
    DstColor,
    InvDstColor,
    SrcAlpha,
    InvSrcAlpha,
    DstAlpha,
    InvDstAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CullMode {
    None,
    Front,
    Back,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FogType {
    None,
    PerspLin,
    PerspExp,
    PerspExp2,
    OrthoLin,
    OrthoExp,
    OrthoExp2,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FogConfig {
    pub kind: FogType,
    pub start: f32,
    pub end: f32,
    pub near: f32,
    pub far: f32,
    pub color: GxColor,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_color_from_rgba_clamps() {
        assert_eq!(
            GxColor::from_rgba([1.5, 0.5, -1.0, 1.0]),
            GxColor::new(255, 128, 0, 255)
        );
    }

    #[test]
    fn test_light_mask_of() {
        assert_eq!(LightMask::of(GxLightId(0)), LightMask::LIGHT0);
        assert_eq!(LightMask::of(GxLightId(7)), LightMask::LIGHT7);
        assert_eq!(LightMask::of(GxLightId(8)), LightMask::empty());
    }

    #[test]
    fn test_specular_dir_half_angle() {
        let mut light = LightObj::new(GxColor::WHITE);
        light.set_specular_dir([0.0, 0.0, -1.0]);
        assert_eq!(light.direction, [0.0, 0.0, 1.0]);
        assert_eq!(light.position[2], LARGE_NUMBER);
    }
}
