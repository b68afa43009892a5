//! The GL-side vocabulary accepted by the state setters.
//!
//! Discriminants are the GL enum values, so raw values can be decoded with
//! `try_from`.

#![allow(missing_docs)]

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

/// A raw GL enum value.
pub type GLenum = u32;

/// Maximum number of abstract lights (`GL_LIGHT0 + i`).
pub const MAX_LIGHTS: usize = 16;
/// Number of texture units, equal to the hardware texture map count.
pub const MAX_TEXTURE_UNITS: usize = 8;

pub const GL_LIGHT0: GLenum = 0x4000;
pub const GL_TEXTURE0: GLenum = 0x84C0;

macro_rules! gl_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:expr,)* }) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            TryFromPrimitive,
            IntoPrimitive,
            Serialize,
            Deserialize,
        )]
        #[repr(u32)]
        pub enum $name {
            $($variant = $value,)*
        }
    };
}

gl_enum!(
    /// Capabilities toggled with `glEnable`/`glDisable`, other than lights.
    Capability {
        Fog = 0x0B60,
        Lighting = 0x0B50,
        Texture2D = 0x0DE1,
        CullFace = 0x0B44,
        AlphaTest = 0x0BC0,
        Blend = 0x0BE2,
        DepthTest = 0x0B71,
        ScissorTest = 0x0C11,
        ColorMaterial = 0x0B57,
        PolygonOffsetFill = 0x8037,
        TextureGenS = 0x0C60,
        TextureGenT = 0x0C61,
        TextureGenR = 0x0C62,
        TextureGenQ = 0x0C63,
    }
);

gl_enum!(
    /// Client-side vertex arrays.
    ClientArray {
        VertexArray = 0x8074,
        NormalArray = 0x8075,
        ColorArray = 0x8076,
        TextureCoordArray = 0x8078,
    }
);

gl_enum!(
    TexEnvMode {
        Modulate = 0x2100,
        Decal = 0x2101,
        Blend = 0x0BE2,
        Replace = 0x1E01,
        Add = 0x0104,
        Combine = 0x8570,
    }
);

gl_enum!(
    /// `GL_COMBINE_RGB` / `GL_COMBINE_ALPHA` functions.
    CombineFunc {
        Replace = 0x1E01,
        Modulate = 0x2100,
        Add = 0x0104,
        AddSigned = 0x8574,
        Interpolate = 0x8575,
        Subtract = 0x84E7,
    }
);

gl_enum!(
    CombineSource {
        Texture = 0x1702,
        Constant = 0x8576,
        PrimaryColor = 0x8577,
        Previous = 0x8578,
    }
);

gl_enum!(
    CombineOperand {
        SrcColor = 0x0300,
        OneMinusSrcColor = 0x0301,
        SrcAlpha = 0x0302,
        OneMinusSrcAlpha = 0x0303,
    }
);

impl CombineOperand {
    pub fn is_complement(self) -> bool {
        matches!(self, Self::OneMinusSrcColor | Self::OneMinusSrcAlpha)
    }

    pub fn is_alpha(self) -> bool {
        matches!(self, Self::SrcAlpha | Self::OneMinusSrcAlpha)
    }
}

gl_enum!(
    /// Parameter names for `glTexEnv`.
    TexEnvParam {
        Mode = 0x2200,
        Color = 0x2201,
        CombineRgb = 0x8571,
        CombineAlpha = 0x8572,
        RgbScale = 0x8573,
        AlphaScale = 0x0D1C,
        Source0Rgb = 0x8580,
        Source1Rgb = 0x8581,
        Source2Rgb = 0x8582,
        Source0Alpha = 0x8588,
        Source1Alpha = 0x8589,
        Source2Alpha = 0x858A,
        Operand0Rgb = 0x8590,
        Operand1Rgb = 0x8591,
        Operand2Rgb = 0x8592,
        Operand0Alpha = 0x8598,
        Operand1Alpha = 0x8599,
        Operand2Alpha = 0x859A,
    }
);

gl_enum!(
    TexGenMode {
        EyeLinear = 0x2400,
        ObjectLinear = 0x2401,
        SphereMap = 0x2402,
        NormalMap = 0x8511,
        ReflectionMap = 0x8512,
    }
);

gl_enum!(
    TexGenCoord {
        S = 0x2000,
        T = 0x2001,
        R = 0x2002,
        Q = 0x2003,
    }
);

gl_enum!(
    TexGenParam {
        Mode = 0x2500,
        ObjectPlane = 0x2501,
        EyePlane = 0x2502,
    }
);

gl_enum!(
    LightParam {
        Ambient = 0x1200,
        Diffuse = 0x1201,
        Specular = 0x1202,
        Position = 0x1203,
        SpotDirection = 0x1204,
        SpotExponent = 0x1205,
        SpotCutoff = 0x1206,
        ConstantAttenuation = 0x1207,
        LinearAttenuation = 0x1208,
        QuadraticAttenuation = 0x1209,
    }
);

gl_enum!(
    MaterialParam {
        Ambient = 0x1200,
        Diffuse = 0x1201,
        Specular = 0x1202,
        Emission = 0x1600,
        Shininess = 0x1601,
        AmbientAndDiffuse = 0x1602,
    }
);

gl_enum!(
    /// Which material terms track the current color under `GL_COLOR_MATERIAL`.
    ColorMaterialMode {
        Ambient = 0x1200,
        Diffuse = 0x1201,
        Specular = 0x1202,
        Emission = 0x1600,
        AmbientAndDiffuse = 0x1602,
    }
);

gl_enum!(
    FogMode {
        Linear = 0x2601,
        Exp = 0x0800,
        Exp2 = 0x0801,
    }
);

gl_enum!(
    CompareFunc {
        Never = 0x0200,
        Less = 0x0201,
        Equal = 0x0202,
        Lequal = 0x0203,
        Greater = 0x0204,
        NotEqual = 0x0205,
        Gequal = 0x0206,
        Always = 0x0207,
    }
);

gl_enum!(
    BlendFactor {
        Zero = 0,
        One = 1,
        SrcColor = 0x0300,
        OneMinusSrcColor = 0x0301,
        SrcAlpha = 0x0302,
        OneMinusSrcAlpha = 0x0303,
        DstAlpha = 0x0304,
        OneMinusDstAlpha = 0x0305,
        DstColor = 0x0306,
        OneMinusDstColor = 0x0307,
        SrcAlphaSaturate = 0x0308,
        ConstantColor = 0x8001,
        OneMinusConstantColor = 0x8002,
        ConstantAlpha = 0x8003,
        OneMinusConstantAlpha = 0x8004,
    }
);

gl_enum!(
    CullFace {
        Front = 0x0404,
        Back = 0x0405,
        FrontAndBack = 0x0408,
    }
);

gl_enum!(
    FrontFace {
        Cw = 0x0900,
        Ccw = 0x0901,
    }
);

gl_enum!(
    MatrixMode {
        ModelView = 0x1700,
        Projection = 0x1701,
        Texture = 0x1702,
    }
);

gl_enum!(
    /// Parameter names for `glFog`.
    FogParam {
        Mode = 0x0B65,
        Density = 0x0B62,
        Start = 0x0B63,
        End = 0x0B64,
        Color = 0x0B66,
    }
);

/// A light or capability passed to `glEnable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnableCap {
    Cap(Capability),
    Light(usize),
}

impl TryFrom<GLenum> for EnableCap {
    type Error = crate::GlError;

    fn try_from(value: GLenum) -> Result<Self, Self::Error> {
        if (GL_LIGHT0..GL_LIGHT0 + MAX_LIGHTS as GLenum).contains(&value) {
            return Ok(EnableCap::Light((value - GL_LIGHT0) as usize));
        }
        Ok(EnableCap::Cap(Capability::try_from(value)?))
    }
}

impl From<Capability> for EnableCap {
    fn from(cap: Capability) -> Self {
        EnableCap::Cap(cap)
    }
}
