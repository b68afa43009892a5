//! Assembly of the complete TEV network for a draw: lighting or the unlit
//! channel, then the texture stages, then any stages a caller appends.

use crate::{
    attributes::AttributePlan,
    backend::{GxBackend, GxCommand},
    combine::Feed,
    context::Pass,
    diag::Diagnostic,
    gx::*,
    lighting::{setup_lit_stages, setup_unlit_channel},
    resources::{GpuResources, ResourceKind},
    state::RenderState,
    texture::{setup_texture_stages, TextureObjects},
};

/// Stages appended after the texture stages, e.g. for stencil or clip
/// emulation.
pub trait ExtraStages {
    /// Allocates and configures the stages. Returning false skips the draw.
    fn setup_stages(&mut self, resources: &mut GpuResources, gx: &mut dyn GxBackend) -> bool;

    /// The appended stages discard fragments through a second alpha comparison
    /// (`alpha > 0`).
    fn needs_alpha_compare(&self) -> bool {
        false
    }
}

/// No extra stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtraStages;

impl ExtraStages for NoExtraStages {
    fn setup_stages(&mut self, _resources: &mut GpuResources, _gx: &mut dyn GxBackend) -> bool {
        true
    }
}

/// A stage that outputs the rasterized color of the first channel.
fn setup_passthrough_stage(pass: &mut Pass<'_>) {
    let stage = match pass.resources.allocate_stage() {
        Some(stage) => stage,
        None => {
            pass.diagnostics.push(Diagnostic::LightingDegraded {
                resource: ResourceKind::TevStage,
            });
            return;
        }
    };
    pass.submit(GxCommand::SetTevOrder {
        stage,
        coord: None,
        map: None,
        channel: Some(ChannelId::Color0A0),
    });
    pass.submit(GxCommand::SetTevColorIn(
        stage,
        [TevColorArg::Zero, TevColorArg::Zero, TevColorArg::Zero, TevColorArg::RasC],
    ));
    pass.submit(GxCommand::SetTevAlphaIn(
        stage,
        [TevAlphaArg::Zero, TevAlphaArg::Zero, TevAlphaArg::Zero, TevAlphaArg::RasA],
    ));
    pass.submit(GxCommand::SetTevColorOp(stage, TevOpConfig::default()));
    pass.submit(GxCommand::SetTevAlphaOp(stage, TevOpConfig::default()));
}

/// Emits the whole combiner network and the stage, channel and texgen counts.
///
/// Returns false if `extra` vetoed the draw.
pub(crate) fn setup_render_stages(
    state: &mut RenderState,
    plan: &AttributePlan,
    textures: &dyn TextureObjects,
    extra: &mut dyn ExtraStages,
    pass: &mut Pass<'_>,
) -> bool {
    let textured = state.texture_enabled();
    let vertex_colors = plan.color_channels > 0;
    let current_color = state.current_color;

    if state.lighting.enabled {
        // The lit color has to survive the texture stages writing to PREV.
        let output = if textured {
            pass.resources.allocate_color_register().unwrap_or_else(|| {
                pass.diagnostics.push(Diagnostic::LightingDegraded {
                    resource: ResourceKind::TevRegister,
                });
                TevReg::Prev
            })
        } else {
            TevReg::Prev
        };
        let lit = setup_lit_stages(
            &mut state.lighting,
            current_color,
            vertex_colors,
            output,
            pass,
        );
        if lit && textured {
            let primary = match output {
                TevReg::Prev => Feed::Prev,
                reg => Feed::Register(reg),
            };
            setup_texture_stages(state, plan, textures, primary, None, pass);
        } else if !lit {
            setup_unlit_channel(current_color, vertex_colors, pass);
            setup_texture_stages(
                state,
                plan,
                textures,
                Feed::Raster,
                Some(ChannelId::Color0A0),
                pass,
            );
        }
    } else {
        setup_unlit_channel(current_color, vertex_colors, pass);
        if textured {
            setup_texture_stages(
                state,
                plan,
                textures,
                Feed::Raster,
                Some(ChannelId::Color0A0),
                pass,
            );
        }
    }

    if pass.resources.counters().tev_stages == 0 {
        setup_passthrough_stage(pass);
    }

    if !extra.setup_stages(pass.resources, pass.gx) {
        return false;
    }

    let counters = pass.resources.counters();
    tracing::debug!(
        target: "gxgl::stages",
        "{} stages, {} texgens",
        counters.tev_stages,
        counters.tex_coords
    );
    pass.submit(GxCommand::SetNumTevStages(counters.tev_stages));
    pass.submit(GxCommand::SetNumTexGens(counters.tex_coords));
    true
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        attributes::plan_attributes, backend::RecordingBackend, config::CompilerConfig,
        context::PassOwner,
    };

    fn run(state: &mut RenderState, owner: &mut PassOwner) -> (bool, RecordingBackend) {
        let mut gx = RecordingBackend::new();
        let plan = plan_attributes(state, &owner.config.hints);
        let textures = HashMap::from([(0u32, TexObjHandle(1))]);
        let mut pass = owner.pass(&mut gx);
        let ok = setup_render_stages(state, &plan, &textures, &mut NoExtraStages, &mut pass);
        (ok, gx)
    }

    fn textured_state() -> RenderState {
        let mut state = RenderState::default();
        state.texture_units[0].enabled = true;
        state.client.tex_coord[0] = true;
        state
    }

    #[test]
    fn test_unlit_untextured_passes_raster_color() {
        let mut state = RenderState::default();
        let mut owner = PassOwner::new(CompilerConfig::default());
        let (ok, gx) = run(&mut state, &mut owner);
        assert!(ok);
        assert_eq!(
            gx.color_in(TevStageId(0)),
            Some([TevColorArg::Zero, TevColorArg::Zero, TevColorArg::Zero, TevColorArg::RasC])
        );
        assert!(gx.commands().contains(&GxCommand::SetNumChans(1)));
        assert_eq!(gx.commands().last(), Some(&GxCommand::SetNumTexGens(0)));
        assert!(gx.commands().contains(&GxCommand::SetNumTevStages(1)));
        // the current color is the material color without a color array
        assert!(gx.commands().contains(&GxCommand::SetChanMatColor(
            ChannelId::Color0A0,
            GxColor::WHITE
        )));
    }

    #[test]
    fn test_lit_and_textured_reads_lit_register() {
        let mut state = textured_state();
        state.lighting.enabled = true;
        state.lighting.lights[0].enabled = true;
        let mut owner = PassOwner::new(CompilerConfig::default());
        let (ok, gx) = run(&mut state, &mut owner);
        assert!(ok);

        // lighting writes register 0, the texture stage modulates it
        assert_eq!(gx.color_op(TevStageId(1)).unwrap().dest, TevReg::Reg0);
        assert_eq!(
            gx.color_in(TevStageId(2)),
            Some([TevColorArg::Zero, TevColorArg::C0, TevColorArg::TexC, TevColorArg::Zero])
        );
        let order = gx.last(|cmd| match cmd {
            GxCommand::SetTevOrder { stage, channel, .. } if *stage == TevStageId(2) => {
                Some(*channel)
            }
            _ => None,
        });
        assert_eq!(order, Some(None));
        assert!(gx.commands().contains(&GxCommand::SetNumTevStages(3)));
        assert!(gx.commands().contains(&GxCommand::SetNumTexGens(1)));
    }

    #[test]
    fn test_lit_without_textures_writes_prev() {
        let mut state = RenderState::default();
        state.lighting.enabled = true;
        let mut owner = PassOwner::new(CompilerConfig::default());
        let (_, gx) = run(&mut state, &mut owner);
        assert_eq!(gx.color_op(TevStageId(1)).unwrap().dest, TevReg::Prev);
        assert_eq!(owner.resources.counters().tev_registers, 0);
        assert!(gx.commands().contains(&GxCommand::SetNumChans(2)));
    }

    #[test]
    fn test_skipped_texture_falls_back_to_passthrough() {
        let mut state = textured_state();
        state.client.tex_coord[0] = false;
        let mut owner = PassOwner::new(CompilerConfig::default());
        let (_, gx) = run(&mut state, &mut owner);
        assert_eq!(owner.resources.counters().tev_stages, 1);
        assert_eq!(gx.color_in(TevStageId(0)).unwrap()[3], TevColorArg::RasC);
        assert_eq!(owner.diagnostics.entries().len(), 1);
    }

    struct Veto;

    impl ExtraStages for Veto {
        fn setup_stages(&mut self, resources: &mut GpuResources, _: &mut dyn GxBackend) -> bool {
            resources.allocate_stage();
            false
        }
    }

    #[test]
    fn test_veto_skips_counts() {
        let mut state = RenderState::default();
        let mut owner = PassOwner::new(CompilerConfig::default());
        let mut gx = RecordingBackend::new();
        let plan = plan_attributes(&state, &owner.config.hints);
        let textures: HashMap<u32, TexObjHandle> = HashMap::new();
        let mut pass = owner.pass(&mut gx);
        assert!(!setup_render_stages(&mut state, &plan, &textures, &mut Veto, &mut pass));
        assert_eq!(
            gx.count(|cmd| matches!(cmd, GxCommand::SetNumTevStages(_))),
            0
        );
    }

    #[test]
    fn test_lighting_without_stages_falls_back_to_unlit() {
        let mut state = RenderState::default();
        state.lighting.enabled = true;
        state.lighting.lights[0].enabled = true;
        let mut config = CompilerConfig::default();
        config.limits.tev_stages = 1;
        let mut owner = PassOwner::new(config);
        let (ok, gx) = run(&mut state, &mut owner);
        assert!(ok);

        assert!(gx.commands().contains(&GxCommand::SetNumChans(1)));
        assert!(!gx.commands().contains(&GxCommand::SetNumChans(2)));
        assert_eq!(gx.count(|cmd| matches!(cmd, GxCommand::LoadLightObj(..))), 0);
        assert_eq!(
            gx.color_in(TevStageId(0)),
            Some([TevColorArg::Zero, TevColorArg::Zero, TevColorArg::Zero, TevColorArg::RasC])
        );
        assert!(gx.commands().contains(&GxCommand::SetNumTevStages(1)));
        assert_eq!(
            owner.diagnostics.entries(),
            &[Diagnostic::LightingDegraded {
                resource: ResourceKind::TevStage
            }]
        );
    }

    #[test]
    fn test_lit_register_shortage_is_reported() {
        let mut state = textured_state();
        state.lighting.enabled = true;
        state.lighting.lights[0].enabled = true;
        let mut config = CompilerConfig::default();
        config.limits.tev_registers = 0;
        let mut owner = PassOwner::new(config);
        let (ok, gx) = run(&mut state, &mut owner);
        assert!(ok);

        assert_eq!(gx.color_op(TevStageId(1)).unwrap().dest, TevReg::Prev);
        assert_eq!(
            gx.color_in(TevStageId(2)),
            Some([TevColorArg::Zero, TevColorArg::CPrev, TevColorArg::TexC, TevColorArg::Zero])
        );
        assert_eq!(
            owner.diagnostics.entries(),
            &[Diagnostic::LightingDegraded {
                resource: ResourceKind::TevRegister
            }]
        );
    }
}
