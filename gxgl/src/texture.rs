//! Texture stages: one TEV stage per enabled texture unit, fed by its own
//! coordinate generator, texture map and post-transform matrix.

use std::collections::HashMap;

use crate::{
    attributes::{AttributePlan, TexCoordSource},
    backend::GxCommand,
    combine::*,
    context::Pass,
    diag::{Diagnostic, SkipReason},
    gl::{TexEnvMode, TexGenMode},
    gx::*,
    matrix::Matrixf,
    state::{RenderState, TextureUnit},
};

/// Looks up the hardware texture object for a GL texture name.
pub trait TextureObjects {
    /// Returns None if the texture has no image loaded.
    fn texture_object(&self, id: u32) -> Option<TexObjHandle>;
}

impl TextureObjects for HashMap<u32, TexObjHandle> {
    fn texture_object(&self, id: u32) -> Option<TexObjHandle> {
        self.get(&id).copied()
    }
}

/// Both halves of a texture stage, before register selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageEquations {
    /// The color combiner.
    pub rgb: TevEquation,
    /// The alpha combiner.
    pub alpha: TevEquation,
    /// Output scale of the color combiner, from `RGB_SCALE`.
    pub rgb_scale: TevScale,
    /// Output scale of the alpha combiner, from `ALPHA_SCALE`.
    pub alpha_scale: TevScale,
}

fn tev_scale(scale: f32) -> TevScale {
    if scale >= 4.0 {
        TevScale::Scale4
    } else if scale >= 2.0 {
        TevScale::Scale2
    } else {
        TevScale::Scale1
    }
}

/// The stage equations for a unit's texture environment.
pub fn env_equations(unit: &TextureUnit) -> StageEquations {
    use TevInput::*;

    let modulate_alpha = TevEquation::lerp(Zero, PrevAlpha, TexAlpha, Zero);
    let (rgb, alpha) = match unit.mode {
        TexEnvMode::Replace => (TevEquation::pass(TexColor), TevEquation::pass(TexAlpha)),
        TexEnvMode::Modulate | TexEnvMode::Decal => (
            TevEquation::lerp(Zero, PrevColor, TexColor, Zero),
            modulate_alpha,
        ),
        TexEnvMode::Add => (
            TevEquation::lerp(TexColor, Zero, Zero, PrevColor),
            modulate_alpha,
        ),
        TexEnvMode::Blend => (
            TevEquation::lerp(PrevColor, Konst, TexColor, Zero),
            modulate_alpha,
        ),
        TexEnvMode::Combine => {
            let rgb_args = [0, 1, 2].map(|i| {
                CombineArg::from_gl(unit.source_rgb[i], unit.operand_rgb[i], Channel::Rgb)
            });
            let alpha_args = [0, 1, 2].map(|i| {
                CombineArg::from_gl(unit.source_alpha[i], unit.operand_alpha[i], Channel::Alpha)
            });
            return StageEquations {
                rgb: solve_combine(unit.combine_rgb, &rgb_args, Channel::Rgb),
                alpha: solve_combine(unit.combine_alpha, &alpha_args, Channel::Alpha),
                rgb_scale: tev_scale(unit.rgb_scale),
                alpha_scale: tev_scale(unit.alpha_scale),
            };
        }
    };
    StageEquations {
        rgb,
        alpha,
        rgb_scale: TevScale::Scale1,
        alpha_scale: TevScale::Scale1,
    }
}

/// The 2x4 matrix producing generated coordinates, and the attribute it reads.
fn texgen_matrix(unit: &TextureUnit, modelview: &Matrixf) -> Option<(Matrixf, TexGenSrc)> {
    let planes = |planes: &[[f32; 4]; 2]| {
        let mut m = Matrixf::zero();
        m.0[0] = planes[0];
        m.0[1] = planes[1];
        m
    };
    match unit.gen_mode {
        TexGenMode::ObjectLinear => Some((planes(&unit.object_plane), TexGenSrc::Position)),
        TexGenMode::EyeLinear => Some((
            &planes(&unit.eye_plane) * modelview,
            TexGenSrc::Position,
        )),
        TexGenMode::SphereMap | TexGenMode::ReflectionMap => {
            let bias = &Matrixf::translate(0.5, 0.5, 1.0) * &Matrixf::scale(0.5, 0.5, 0.0);
            Some((&bias * modelview, TexGenSrc::Normal))
        }
        TexGenMode::NormalMap => None,
    }
}

/// The post-transform matrix: the unit's texture matrix with an identity third row.
fn post_matrix(unit: &TextureUnit) -> [[f32; 4]; 3] {
    let m = unit.matrix.cur;
    [m.0[0], m.0[1], [0.0, 0.0, 1.0, 0.0]]
}

/// Emits the texture stages for every enabled unit.
///
/// `primary` is where the untextured fragment color is read from, and
/// `channel` the rasterized channel ordered into each stage (None when the
/// color comes from a register).
pub(crate) fn setup_texture_stages(
    state: &RenderState,
    plan: &AttributePlan,
    textures: &dyn TextureObjects,
    primary: Feed,
    channel: Option<ChannelId>,
    pass: &mut Pass<'_>,
) {
    let mut previous = primary;
    for (index, unit) in state.texture_units.iter().enumerate() {
        if !unit.enabled {
            continue;
        }
        let feeds = StageFeeds { previous, primary };
        let emitted = setup_texture_stage(index, unit, state, plan, textures, feeds, channel, pass);
        if let Err(reason) = emitted {
            pass.diagnostics
                .push(Diagnostic::TextureUnitSkipped { unit: index, reason });
            continue;
        }
        previous = Feed::Prev;
    }
}

#[allow(clippy::too_many_arguments)]
fn setup_texture_stage(
    index: usize,
    unit: &TextureUnit,
    state: &RenderState,
    plan: &AttributePlan,
    textures: &dyn TextureObjects,
    feeds: StageFeeds,
    channel: Option<ChannelId>,
    pass: &mut Pass<'_>,
) -> Result<(), SkipReason> {
    let source = plan.tex_coords[index];
    if source == TexCoordSource::None {
        return Err(SkipReason::NoCoordinates);
    }
    let handle = textures
        .texture_object(unit.bound_texture)
        .ok_or(SkipReason::MissingTexture(unit.bound_texture))?;
    let generator = match source {
        TexCoordSource::Hardware => Some(
            texgen_matrix(unit, state.modelview())
                .ok_or(SkipReason::UnsupportedTexGen(unit.gen_mode))?,
        ),
        _ => None,
    };

    let eqs = env_equations(unit);
    let slots = pass
        .resources
        .reserve_texture_stage(generator.is_some(), needs_env_konst(&eqs.rgb, &eqs.alpha))
        .map_err(SkipReason::Exhausted)?;
    let (stage, coord, map, dtt) = (slots.stage, slots.coord, slots.map, slots.dtt_matrix);

    pass.submit(GxCommand::LoadTexObj(handle, map));
    pass.submit(GxCommand::LoadDttMtx3x4(dtt, post_matrix(unit)));
    let gen = match (generator, slots.tex_matrix, source.stream()) {
        (Some((matrix, src)), Some(mtx), _) => {
            pass.submit(GxCommand::LoadTexMtx2x4(mtx, matrix.rows_2x4()));
            TexCoordGen {
                kind: TexGenType::Mtx2x4,
                src,
                matrix: Some(mtx),
                normalize: false,
                post_matrix: dtt,
            }
        }
        (_, _, stream) => TexCoordGen {
            kind: TexGenType::Mtx2x4,
            src: TexGenSrc::Tex(stream.unwrap_or(0)),
            matrix: None,
            normalize: false,
            post_matrix: dtt,
        },
    };
    pass.submit(GxCommand::SetTexCoordGen(coord, gen));
    pass.submit(GxCommand::SetTevOrder {
        stage,
        coord: Some(coord),
        map: Some(map),
        channel,
    });

    emit_stage_equations(index, unit, stage, slots.konst, &eqs, &feeds, pass);
    tracing::debug!(target: "gxgl::texture", "unit {} -> stage {}: {:?}", index, stage.0, eqs);
    Ok(())
}

fn emit_stage_equations(
    index: usize,
    unit: &TextureUnit,
    stage: TevStageId,
    konst: Option<KonstReg>,
    eqs: &StageEquations,
    feeds: &StageFeeds,
    pass: &mut Pass<'_>,
) {
    for (channel, eq) in [(Channel::Rgb, &eqs.rgb), (Channel::Alpha, &eqs.alpha)] {
        if eq.dropped_complement {
            let func = match channel {
                Channel::Rgb => unit.combine_rgb,
                Channel::Alpha => unit.combine_alpha,
            };
            pass.diagnostics.push(Diagnostic::ComplementDropped {
                unit: index,
                channel,
                func,
            });
        }
    }

    let (color_sel, color_conflict) = color_konst_sel(&eqs.rgb, konst);
    let (alpha_sel, alpha_conflict) = alpha_konst_sel(&eqs.alpha, konst);
    // RGB reading the environment alpha needs it unfolded.
    let fold_conflict = eqs.alpha.complement_konst && eqs.rgb.uses(&[TevInput::KonstAlpha]);
    if color_conflict || alpha_conflict || fold_conflict {
        pass.diagnostics
            .push(Diagnostic::ConstantConflict { unit: index });
    }

    if let Some(reg) = konst {
        let mut color = GxColor::from_rgba(unit.color);
        if eqs.alpha.complement_konst && !fold_conflict {
            color.a = 255 - color.a;
        }
        pass.submit(GxCommand::SetTevKColor(reg, color));
    }
    if let Some(sel) = color_sel {
        pass.submit(GxCommand::SetTevKColorSel(stage, sel));
    }
    if let Some(sel) = alpha_sel {
        pass.submit(GxCommand::SetTevKAlphaSel(stage, sel));
    }

    pass.submit(GxCommand::SetTevColorIn(stage, lower_color(&eqs.rgb, feeds)));
    pass.submit(GxCommand::SetTevAlphaIn(stage, lower_alpha(&eqs.alpha, feeds)));
    pass.submit(GxCommand::SetTevColorOp(
        stage,
        TevOpConfig {
            op: eqs.rgb.op,
            bias: eqs.rgb.bias,
            scale: eqs.rgb_scale,
            ..TevOpConfig::default()
        },
    ));
    pass.submit(GxCommand::SetTevAlphaOp(
        stage,
        TevOpConfig {
            op: eqs.alpha.op,
            bias: eqs.alpha.bias,
            scale: eqs.alpha_scale,
            ..TevOpConfig::default()
        },
    ));
}
