//! Scene scripts: a sequence of state-setting calls and draws, read from JSON.

use std::{collections::HashMap, error, fmt, fs, io, path::Path};

use gxgl::{
    backend::GxCommand,
    config::CompilerConfig,
    gl::*,
    gx::TexObjHandle,
    matrix::Matrixf,
    Context, Fog, TexEnv,
};
use serde::{Deserialize, Serialize};

/// A scene script.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Script {
    /// Overrides the configuration taken from the environment.
    #[serde(default)]
    pub(crate) config: Option<CompilerConfig>,
    /// Ids of the texture objects that are considered loaded.
    #[serde(default)]
    pub(crate) textures: Vec<u32>,
    pub(crate) calls: Vec<Call>,
}

/// One call in a script.
#[derive(Debug, Clone, Deserialize)]
pub(crate) enum Call {
    Enable(EnableCap),
    Disable(EnableCap),
    EnableClientState(ClientArray),
    DisableClientState(ClientArray),
    Light(usize, LightParam, Vec<f32>),
    Material(MaterialParam, Vec<f32>),
    LightModelAmbient([f32; 4]),
    ColorMaterial(ColorMaterialMode),
    Color([f32; 4]),
    TexEnv(TexEnv),
    TexGenMode(TexGenMode),
    TexGenPlane(TexGenCoord, TexGenParam, [f32; 4]),
    ActiveTexture(usize),
    ClientActiveTexture(usize),
    BindTexture(u32),
    BlendFunc(BlendFactor, BlendFactor),
    DepthFunc(CompareFunc),
    DepthMask(bool),
    AlphaFunc(CompareFunc, f32),
    CullFace(CullFace),
    FrontFace(FrontFace),
    Fog(Fog),
    Viewport(i32, i32, i32, i32),
    Scissor(i32, i32, i32, i32),
    PolygonOffset(f32, f32),
    ColorMask(bool, bool, bool, bool),
    MatrixMode(MatrixMode),
    /// Column-major, as passed to `glLoadMatrixf`.
    LoadMatrix([f32; 16]),
    MultMatrix([f32; 16]),
    LoadIdentity,
    PushMatrix,
    PopMatrix,
    Frustum(f32, f32, f32, f32, f32, f32),
    Ortho(f32, f32, f32, f32, f32, f32),
    /// Runs the nested calls with their own resource scope.
    SubPass(Vec<Call>),
    Draw,
}

/// The result of one draw.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DrawTrace {
    pub(crate) draw: usize,
    pub(crate) applied: bool,
    pub(crate) commands: Vec<GxCommand>,
    pub(crate) diagnostics: Vec<String>,
}

/// The result of running a script.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Trace {
    pub(crate) draws: Vec<DrawTrace>,
    /// The first rejected call, if any.
    pub(crate) error: Option<String>,
}

#[derive(Debug)]
pub(crate) enum ScriptError {
    Io(io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Io(error) => write!(f, "{}", error),
            ScriptError::Parse(error) => write!(f, "invalid script: {}", error),
        }
    }
}

impl error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ScriptError::Io(error) => Some(error),
            ScriptError::Parse(error) => Some(error),
        }
    }
}

impl From<io::Error> for ScriptError {
    fn from(v: io::Error) -> Self {
        Self::Io(v)
    }
}

impl From<serde_json::Error> for ScriptError {
    fn from(v: serde_json::Error) -> Self {
        Self::Parse(v)
    }
}

impl Script {
    pub(crate) fn read(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub(crate) fn parse(text: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Runs every call against a fresh context.
    pub(crate) fn run(&self) -> Trace {
        let config = self.config.clone().unwrap_or_else(CompilerConfig::from_env);
        let mut context = Context::with_backend(Default::default(), config);
        let mut runner = Runner {
            textures: self
                .textures
                .iter()
                .map(|&id| (id, TexObjHandle(id)))
                .collect(),
            draws: Vec::new(),
        };
        runner.run_all(&mut context, &self.calls);

        let error = context.take_error().map(|error| error.to_string());
        Trace {
            draws: runner.draws,
            error,
        }
    }
}

struct Runner {
    textures: HashMap<u32, TexObjHandle>,
    draws: Vec<DrawTrace>,
}

impl Runner {
    fn run_all(&mut self, ctx: &mut Context, calls: &[Call]) {
        for call in calls {
            self.run(ctx, call);
        }
    }

    fn run(&mut self, ctx: &mut Context, call: &Call) {
        match call {
            Call::Enable(cap) => ctx.enable(*cap),
            Call::Disable(cap) => ctx.disable(*cap),
            Call::EnableClientState(array) => ctx.enable_client_state(*array),
            Call::DisableClientState(array) => ctx.disable_client_state(*array),
            Call::Light(index, param, values) => ctx.light(*index, *param, values),
            Call::Material(param, values) => ctx.material(*param, values),
            Call::LightModelAmbient(color) => ctx.light_model_ambient(*color),
            Call::ColorMaterial(mode) => ctx.color_material(*mode),
            Call::Color(color) => ctx.color(*color),
            Call::TexEnv(env) => ctx.tex_env(*env),
            Call::TexGenMode(mode) => ctx.tex_gen_mode(*mode),
            Call::TexGenPlane(coord, param, plane) => ctx.tex_gen_plane(*coord, *param, *plane),
            Call::ActiveTexture(unit) => ctx.active_texture(*unit),
            Call::ClientActiveTexture(unit) => ctx.client_active_texture(*unit),
            Call::BindTexture(id) => ctx.bind_texture(*id),
            Call::BlendFunc(src, dst) => ctx.blend_func(*src, *dst),
            Call::DepthFunc(func) => ctx.depth_func(*func),
            Call::DepthMask(write) => ctx.depth_mask(*write),
            Call::AlphaFunc(func, reference) => ctx.alpha_func(*func, *reference),
            Call::CullFace(face) => ctx.cull_face(*face),
            Call::FrontFace(front) => ctx.front_face(*front),
            Call::Fog(fog) => ctx.fog(*fog),
            Call::Viewport(x, y, w, h) => ctx.viewport(*x, *y, *w, *h),
            Call::Scissor(x, y, w, h) => ctx.scissor(*x, *y, *w, *h),
            Call::PolygonOffset(factor, units) => ctx.polygon_offset(*factor, *units),
            Call::ColorMask(r, g, b, a) => ctx.color_mask(*r, *g, *b, *a),
            Call::MatrixMode(mode) => ctx.matrix_mode(*mode),
            Call::LoadMatrix(m) => ctx.load_matrix(&Matrixf::from_gl(m)),
            Call::MultMatrix(m) => ctx.mult_matrix(&Matrixf::from_gl(m)),
            Call::LoadIdentity => ctx.load_identity(),
            Call::PushMatrix => ctx.push_matrix(),
            Call::PopMatrix => ctx.pop_matrix(),
            Call::Frustum(l, r, b, t, n, f) => ctx.frustum(*l, *r, *b, *t, *n, *f),
            Call::Ortho(l, r, b, t, n, f) => ctx.ortho(*l, *r, *b, *t, *n, *f),
            Call::SubPass(calls) => ctx.sub_pass(|ctx| self.run_all(ctx, calls)),
            Call::Draw => self.draw(ctx),
        }
    }

    fn draw(&mut self, ctx: &mut Context) {
        let applied = ctx.compile_and_apply(&self.textures);
        let commands = ctx.backend_mut().finish();
        let diagnostics = ctx
            .take_diagnostics()
            .iter()
            .map(|diagnostic| diagnostic.to_string())
            .collect();
        log::debug!("draw {}: {} commands", self.draws.len(), commands.len());
        self.draws.push(DrawTrace {
            draw: self.draws.len(),
            applied,
            commands,
            diagnostics,
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_calls() {
        let script = Script::parse(
            r#"{
                "textures": [3],
                "calls": [
                    {"Enable": {"Cap": "Lighting"}},
                    {"Enable": {"Light": 0}},
                    {"Light": [0, "Diffuse", [1.0, 0.5, 0.5, 1.0]]},
                    {"TexEnv": {"Mode": "Replace"}},
                    "LoadIdentity",
                    "Draw"
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(script.textures, vec![3]);
        assert_eq!(script.calls.len(), 6);
        assert!(script.config.is_none());
        assert!(matches!(script.calls[5], Call::Draw));
    }

    #[test]
    fn test_parse_error() {
        let error = Script::parse(r#"{"calls": [{"Enable": "Lighting"}]}"#).unwrap_err();
        assert!(matches!(error, ScriptError::Parse(_)));
    }

    #[test]
    fn test_run_records_draws() {
        let script = Script::parse(
            r#"{
                "config": {},
                "calls": ["Draw", "Draw", {"DepthMask": false}, "Draw"]
            }"#,
        )
        .unwrap();
        let trace = script.run();
        assert_eq!(trace.draws.len(), 3);
        assert!(trace.draws.iter().all(|draw| draw.applied));
        assert!(!trace.draws[0].commands.is_empty());
        assert!(trace.draws[1].commands.is_empty());
        assert!(trace.draws[2]
            .commands
            .iter()
            .any(|cmd| matches!(cmd, GxCommand::SetZMode { .. })));
        assert!(trace.error.is_none());
    }

    #[test]
    fn test_run_reports_first_error() {
        let script = Script::parse(
            r#"{
                "calls": [{"ActiveTexture": 99}, "PopMatrix", "Draw"]
            }"#,
        )
        .unwrap();
        let trace = script.run();
        assert!(trace.error.is_some());
        assert_eq!(trace.draws.len(), 1);
    }

    #[test]
    fn test_missing_texture_is_reported() {
        let script = Script::parse(
            r#"{
                "calls": [
                    {"Enable": {"Cap": "Texture2D"}},
                    {"EnableClientState": "TextureCoordArray"},
                    {"BindTexture": 7},
                    "Draw"
                ]
            }"#,
        )
        .unwrap();
        let trace = script.run();
        assert_eq!(trace.draws[0].diagnostics.len(), 1);
        assert!(trace.draws[0].diagnostics[0].contains("not loaded"));
    }

    #[test]
    fn test_bundled_scenes() {
        let lit = Script::parse(include_str!("../scenes/lit_textured.json")).unwrap();
        assert_eq!(lit.run().draws.len(), 1);

        let combine = Script::parse(include_str!("../scenes/combine.json")).unwrap();
        let trace = combine.run();
        assert_eq!(trace.draws.len(), 3);
        assert!(trace.error.is_none());
        // the sub-pass binds a texture that is not loaded
        assert!(!trace.draws[1].diagnostics.is_empty());
    }
}
