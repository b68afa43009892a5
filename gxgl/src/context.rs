use derivative::Derivative;

use crate::{
    apply,
    attributes::{plan_attributes, AttributePlan},
    backend::{GxBackend, GxCommand, RecordingBackend},
    config::CompilerConfig,
    diag::{Diagnostic, Diagnostics},
    dirty::{DirtyFlags, APPLY_ORDER},
    error::GlError,
    resources::GpuResources,
    stages::{setup_render_stages, ExtraStages, NoExtraStages},
    state::RenderState,
    texture::TextureObjects,
};

/// The mutable parts of a context that a configuration routine writes to.
pub(crate) struct Pass<'a> {
    pub gx: &'a mut dyn GxBackend,
    pub resources: &'a mut GpuResources,
    pub diagnostics: &'a mut Diagnostics,
    pub config: &'a CompilerConfig,
}

impl Pass<'_> {
    pub fn submit(&mut self, cmd: GxCommand) {
        self.gx.submit(cmd);
    }
}

/// Owns what a [Pass] borrows, for exercising configuration routines alone.
#[cfg(test)]
pub(crate) struct PassOwner {
    pub config: CompilerConfig,
    pub resources: GpuResources,
    pub diagnostics: Diagnostics,
}

#[cfg(test)]
impl PassOwner {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            resources: GpuResources::new(config.limits),
            diagnostics: Diagnostics::default(),
            config,
        }
    }

    pub fn pass<'a>(&'a mut self, gx: &'a mut dyn GxBackend) -> Pass<'a> {
        Pass {
            gx,
            resources: &mut self.resources,
            diagnostics: &mut self.diagnostics,
            config: &self.config,
        }
    }
}

/// A fixed-function render state and the hardware it is compiled for.
///
/// State setters only record state and mark the affected categories dirty.
/// [compile_and_apply](Context::compile_and_apply) is called once per draw and
/// reprograms the categories that changed, in a fixed order.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Context<B = RecordingBackend> {
    pub(crate) state: RenderState,
    pub(crate) config: CompilerConfig,
    pub(crate) resources: GpuResources,
    #[derivative(Debug = "ignore")]
    pub(crate) backend: B,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) error: Option<GlError>,
    attributes: AttributePlan,
    extra_alpha_compare: bool,
}

impl Context<RecordingBackend> {
    /// A context with the default configuration that records its commands.
    pub fn new() -> Self {
        Self::with_backend(RecordingBackend::new(), CompilerConfig::default())
    }
}

impl Default for Context<RecordingBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: GxBackend> Context<B> {
    /// A context in the initial GL state, submitting to `backend`.
    pub fn with_backend(backend: B, config: CompilerConfig) -> Self {
        Self {
            state: RenderState::default(),
            resources: GpuResources::new(config.limits),
            config,
            backend,
            diagnostics: Diagnostics::default(),
            error: None,
            attributes: AttributePlan::default(),
            extra_alpha_compare: false,
        }
    }

    #[allow(missing_docs)]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    #[allow(missing_docs)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[allow(missing_docs)]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The slots used by the last compilation.
    pub fn resources(&self) -> &GpuResources {
        &self.resources
    }

    /// The vertex format chosen by the last ATTRIBUTES step.
    pub fn attribute_plan(&self) -> &AttributePlan {
        &self.attributes
    }

    /// Degradations reported since the last [take_diagnostics](Context::take_diagnostics).
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.entries()
    }

    #[allow(missing_docs)]
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    /// Returns and clears the first error recorded since the last call.
    pub fn take_error(&mut self) -> Option<GlError> {
        self.error.take()
    }

    pub(crate) fn record_error(&mut self, error: GlError) {
        self.diagnostics.push(Diagnostic::InvalidState(error));
        self.error.get_or_insert(error);
    }

    /// Saves the resource counters.
    pub fn push_resources(&mut self) {
        self.resources.push();
    }

    /// Restores the counters saved by the matching
    /// [push_resources](Context::push_resources).
    pub fn pop_resources(&mut self) {
        if !self.resources.pop() {
            self.diagnostics.push(Diagnostic::UnbalancedPop);
        }
    }

    /// Runs `f` with its own resource snapshot.
    ///
    /// Slots allocated inside are released afterwards, and the combiner network
    /// is rebuilt on the next draw since `f` may have reprogrammed it.
    pub fn sub_pass<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push_resources();
        let result = f(self);
        self.pop_resources();
        self.state.mark_dirty(DirtyFlags::TEV);
        result
    }

    fn split(&mut self) -> (&mut RenderState, Pass<'_>) {
        (
            &mut self.state,
            Pass {
                gx: &mut self.backend,
                resources: &mut self.resources,
                diagnostics: &mut self.diagnostics,
                config: &self.config,
            },
        )
    }

    /// Brings the hardware up to date with the render state before a draw.
    ///
    /// Returns false if the draw should be skipped. Categories that were not
    /// applied stay dirty.
    pub fn compile_and_apply(&mut self, textures: &dyn TextureObjects) -> bool {
        self.compile_and_apply_with(textures, &mut NoExtraStages)
    }

    /// Like [compile_and_apply](Context::compile_and_apply), with stages
    /// appended after the texture stages.
    pub fn compile_and_apply_with(
        &mut self,
        textures: &dyn TextureObjects,
        extra: &mut dyn ExtraStages,
    ) -> bool {
        if self.resources.depth() == 0 {
            self.resources.reset();
        }
        for step in APPLY_ORDER {
            if !self.state.dirty.contains(step) {
                continue;
            }
            tracing::trace!("applying {:?}", step);
            if !self.apply_step(step, textures, extra) {
                tracing::debug!("draw skipped by {:?}", step);
                return false;
            }
            self.state.dirty.remove(step);
        }
        true
    }

    fn apply_step(
        &mut self,
        step: DirtyFlags,
        textures: &dyn TextureObjects,
        extra: &mut dyn ExtraStages,
    ) -> bool {
        let extra_alpha_compare = self.extra_alpha_compare;
        let plan = self.attributes;
        let (state, mut pass) = self.split();
        match step {
            DirtyFlags::ATTRIBUTES => {
                let plan = plan_attributes(state, &pass.config.hints);
                if plan != self.attributes {
                    self.attributes = plan;
                    self.state.mark_dirty(DirtyFlags::TEV);
                }
            }
            DirtyFlags::MATRICES => apply::apply_matrices(state, &mut pass),
            DirtyFlags::VIEWPORT => apply::apply_viewport(state, &mut pass),
            DirtyFlags::SCISSOR => apply::apply_scissor(state, &mut pass),
            DirtyFlags::TEV => {
                if !setup_render_stages(state, &plan, textures, extra, &mut pass) {
                    return false;
                }
                let needs = extra.needs_alpha_compare();
                if needs != extra_alpha_compare {
                    self.extra_alpha_compare = needs;
                    self.state.mark_dirty(DirtyFlags::ALPHA_TEST);
                }
            }
            DirtyFlags::Z => apply::apply_z(state, &mut pass),
            DirtyFlags::COLOR_UPDATE => apply::apply_color_update(state, &mut pass),
            DirtyFlags::BLEND => apply::apply_blend(state, &mut pass),
            DirtyFlags::ALPHA_TEST => {
                apply::apply_alpha_test(state, extra_alpha_compare, &mut pass)
            }
            DirtyFlags::CULL => apply::apply_cull(state, &mut pass),
            DirtyFlags::FOG => apply::apply_fog(state, &mut pass),
            _ => {}
        }
        true
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        gl::Capability,
        gx::{AlphaCompare, CompareFn, TevStageId, TexObjHandle},
        resources::ResourceKind,
    };

    fn textures() -> HashMap<u32, TexObjHandle> {
        HashMap::from([(1, TexObjHandle(7))])
    }

    #[test]
    fn test_first_draw_applies_everything() {
        let mut ctx = Context::new();
        assert!(ctx.compile_and_apply(&textures()));
        assert!(ctx.state().dirty.is_empty());
        let gx = ctx.backend();
        assert_eq!(gx.count(|cmd| matches!(cmd, GxCommand::LoadPosMtx(_))), 1);
        assert_eq!(gx.count(|cmd| matches!(cmd, GxCommand::SetFog(_))), 1);
        assert_eq!(gx.count(|cmd| matches!(cmd, GxCommand::SetNumTevStages(1))), 1);
    }

    #[test]
    fn test_replayed_draw_runs_nothing() {
        let mut ctx = Context::new();
        assert!(ctx.compile_and_apply(&textures()));
        ctx.backend_mut().finish();
        assert!(ctx.compile_and_apply(&textures()));
        assert!(ctx.backend().commands().is_empty());
    }

    #[test]
    fn test_touched_category_runs_once() {
        let mut ctx = Context::new();
        ctx.compile_and_apply(&textures());
        ctx.backend_mut().finish();

        ctx.cull_face(crate::gl::CullFace::Front);
        ctx.cull_face(crate::gl::CullFace::Back);
        assert_eq!(ctx.state().dirty, DirtyFlags::CULL);
        assert!(ctx.compile_and_apply(&textures()));
        assert!(ctx.compile_and_apply(&textures()));
        let commands = ctx.backend_mut().finish();
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], GxCommand::SetCullMode(_)));
        assert!(!ctx.state().dirty.contains(DirtyFlags::CULL));
    }

    struct Veto;

    impl ExtraStages for Veto {
        fn setup_stages(&mut self, _: &mut GpuResources, _: &mut dyn GxBackend) -> bool {
            false
        }
    }

    #[test]
    fn test_vetoed_draw_keeps_flags() {
        let mut ctx = Context::new();
        assert!(!ctx.compile_and_apply_with(&textures(), &mut Veto));
        let dirty = ctx.state().dirty;
        assert!(dirty.contains(DirtyFlags::TEV | DirtyFlags::Z | DirtyFlags::FOG));
        assert!(!dirty.contains(DirtyFlags::MATRICES));
        assert!(ctx.compile_and_apply(&textures()));
        assert!(ctx.state().dirty.is_empty());
    }

    struct Clip;

    impl ExtraStages for Clip {
        fn setup_stages(&mut self, resources: &mut GpuResources, _: &mut dyn GxBackend) -> bool {
            resources.allocate_stage().is_some()
        }

        fn needs_alpha_compare(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_extra_stages_request_alpha_compare() {
        let mut ctx = Context::new();
        assert!(ctx.compile_and_apply_with(&textures(), &mut Clip));
        let compare = ctx.backend().last(|cmd| match cmd {
            GxCommand::SetAlphaCompare(compare) => Some(*compare),
            _ => None,
        });
        let compare = compare.unwrap();
        assert_eq!(compare.comp1, CompareFn::Greater);
        assert_eq!(compare.ref1, 0);
        assert_eq!(ctx.backend().last(|cmd| match cmd {
            GxCommand::SetZCompLoc(before) => Some(*before),
            _ => None,
        }), Some(false));
        assert_eq!(ctx.resources().counters().tev_stages, 2);

        // dropping the clip restores the plain comparison
        ctx.state.mark_dirty(DirtyFlags::TEV);
        assert!(ctx.compile_and_apply(&textures()));
        assert_eq!(
            ctx.backend().last(|cmd| match cmd {
                GxCommand::SetAlphaCompare(compare) => Some(*compare),
                _ => None,
            }),
            Some(AlphaCompare::ALWAYS)
        );
    }

    #[test]
    fn test_attribute_change_rebuilds_stages() {
        let mut ctx = Context::new();
        ctx.compile_and_apply(&textures());
        ctx.backend_mut().finish();

        ctx.enable_client_state(crate::gl::ClientArray::TextureCoordArray);
        ctx.bind_texture(1);
        ctx.enable(Capability::Texture2D);
        assert!(ctx.compile_and_apply(&textures()));
        assert!(ctx.attribute_plan().tex_coords[0].stream().is_some());
        assert!(ctx
            .backend()
            .commands()
            .contains(&GxCommand::LoadTexObj(TexObjHandle(7), crate::gx::TexMapId(0))));
        assert!(ctx.backend().color_in(TevStageId(0)).is_some());
    }

    #[test]
    fn test_sub_pass_restores_ledger() {
        let mut ctx = Context::new();
        ctx.compile_and_apply(&textures());
        let before = ctx.resources().counters();
        let allocated = ctx.sub_pass(|ctx| {
            ctx.resources.allocate_stage();
            ctx.resources.available(ResourceKind::TevStage)
        });
        assert_eq!(allocated, 14);
        assert_eq!(ctx.resources().counters(), before);
        assert!(ctx.state().dirty.contains(DirtyFlags::TEV));

        ctx.pop_resources();
        assert_eq!(ctx.take_diagnostics(), vec![Diagnostic::UnbalancedPop]);
    }

    #[test]
    fn test_first_error_wins() {
        let mut ctx = Context::new();
        ctx.record_error(GlError::InvalidValue);
        ctx.record_error(GlError::StackOverflow);
        assert_eq!(ctx.take_error(), Some(GlError::InvalidValue));
        assert_eq!(ctx.take_error(), None);
        assert_eq!(ctx.diagnostics().len(), 2);
    }
}
