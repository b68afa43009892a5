//! Routines for the dirty categories other than the combiner network.

use crate::{
    backend::GxCommand,
    context::Pass,
    diag::Diagnostic,
    gl::{BlendFactor, CompareFunc, CullFace, FogMode, FrontFace},
    gx::*,
    projection::{gx_projection, projection_info, projection_kind, ProjectionInfo},
    state::RenderState,
};

pub(crate) fn compare_fn(func: CompareFunc) -> CompareFn {
    match func {
        CompareFunc::Never => CompareFn::Never,
        CompareFunc::Less => CompareFn::Less,
        CompareFunc::Equal => CompareFn::Equal,
        CompareFunc::Lequal => CompareFn::Lequal,
        CompareFunc::Greater => CompareFn::Greater,
        CompareFunc::NotEqual => CompareFn::NotEqual,
        CompareFunc::Gequal => CompareFn::Gequal,
        CompareFunc::Always => CompareFn::Always,
    }
}

fn blend_factor(factor: BlendFactor) -> Option<GxBlendFactor> {
    let factor = match factor {
        BlendFactor::Zero => GxBlendFactor::Zero,
        BlendFactor::One => GxBlendFactor::One,
        BlendFactor::SrcColor => GxBlendFactor::SrcColor,
        BlendFactor::OneMinusSrcColor => GxBlendFactor::InvSrcColor,
        BlendFactor::SrcAlpha => GxBlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => GxBlendFactor::InvSrcAlpha,
        BlendFactor::DstAlpha => GxBlendFactor::DstAlpha,
        BlendFactor::OneMinusDstAlpha => GxBlendFactor::InvDstAlpha,
        BlendFactor::DstColor => GxBlendFactor::DstColor,
        BlendFactor::OneMinusDstColor => GxBlendFactor::InvDstColor,
        BlendFactor::SrcAlphaSaturate
        | BlendFactor::ConstantColor
        | BlendFactor::OneMinusConstantColor
        | BlendFactor::ConstantAlpha
        | BlendFactor::OneMinusConstantAlpha => return None,
    };
    Some(factor)
}

pub(crate) fn apply_matrices(state: &RenderState, pass: &mut Pass<'_>) {
    let modelview = *state.modelview();
    pass.submit(GxCommand::LoadPosMtx(modelview));
    pass.submit(GxCommand::LoadNrmMtx(modelview.normal_matrix()));

    let offset = &state.polygon_offset;
    let depth_offset = if offset.fill {
        offset.units * pass.config.depth_offset_scale
    } else {
        0.0
    };
    let projection = state.projection();
    match gx_projection(projection, depth_offset) {
        Some((proj, info)) => pass.submit(GxCommand::LoadProjectionMtx(proj, info.kind)),
        None => {
            pass.diagnostics.push(Diagnostic::DegenerateProjection);
            pass.submit(GxCommand::LoadProjectionMtx(
                *projection,
                projection_kind(projection),
            ));
        }
    }
}

pub(crate) fn apply_viewport(state: &RenderState, pass: &mut Pass<'_>) {
    let [x, y, width, height] = state.viewport;
    pass.submit(GxCommand::SetViewport {
        x: x as f32,
        y: y as f32,
        width: width as f32,
        height: height as f32,
        near: 0.0,
        far: 1.0,
    });
}

/// GL scissor rectangles start at the bottom of the viewport, hardware ones at
/// the top.
pub(crate) fn apply_scissor(state: &RenderState, pass: &mut Pass<'_>) {
    let viewport = state.viewport;
    let [x, y, width, height] = match state.scissor.rect {
        Some([x, y, width, height]) if state.scissor.enabled => {
            [x, viewport[3] - (height + y), width, height]
        }
        _ => viewport,
    };
    pass.submit(GxCommand::SetScissor {
        x: x.max(0) as u32,
        y: y.max(0) as u32,
        width: width.max(0) as u32,
        height: height.max(0) as u32,
    });
}

pub(crate) fn apply_z(state: &RenderState, pass: &mut Pass<'_>) {
    let depth = &state.depth;
    pass.submit(GxCommand::SetZMode {
        enable: depth.test,
        func: compare_fn(depth.func),
        // GL never writes depth with the test disabled.
        update: depth.write && depth.test,
    });
}

pub(crate) fn apply_color_update(state: &RenderState, pass: &mut Pass<'_>) {
    pass.submit(GxCommand::SetColorUpdate(state.color_update));
    pass.submit(GxCommand::SetAlphaUpdate(state.alpha_update));
}

pub(crate) fn apply_blend(state: &RenderState, pass: &mut Pass<'_>) {
    let blend = &state.blend;
    if !blend.enabled {
        pass.submit(GxCommand::SetBlendMode(
            BlendMode::None,
            GxBlendFactor::One,
            GxBlendFactor::Zero,
        ));
        return;
    }
    let mut factor = |gl: BlendFactor, fallback: GxBlendFactor| {
        blend_factor(gl).unwrap_or_else(|| {
            pass.diagnostics.push(Diagnostic::UnsupportedBlendFactor(gl));
            fallback
        })
    };
    let src = factor(blend.src, GxBlendFactor::One);
    let dst = factor(blend.dst, GxBlendFactor::Zero);
    pass.submit(GxCommand::SetBlendMode(BlendMode::Blend, src, dst));
}

pub(crate) fn apply_alpha_test(state: &RenderState, extra_compare: bool, pass: &mut Pass<'_>) {
    let test = &state.alpha_test;
    let mut compare = AlphaCompare::ALWAYS;
    if test.enabled {
        compare.comp0 = compare_fn(test.func);
        compare.ref0 = (test.reference.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    if extra_compare {
        compare.comp1 = CompareFn::Greater;
        compare.ref1 = 0;
    }
    pass.submit(GxCommand::SetAlphaCompare(compare));
    // Fragments discarded by the alpha test must not write depth, so the
    // depth test moves after texturing.
    pass.submit(GxCommand::SetZCompLoc(!(test.enabled || extra_compare)));
}

/// The hardware culls by the opposite winding to GL.
pub(crate) fn apply_cull(state: &RenderState, pass: &mut Pass<'_>) {
    let cull = &state.cull;
    let clockwise = cull.front == FrontFace::Cw;
    let mode = if !cull.enabled {
        CullMode::None
    } else {
        match cull.face {
            CullFace::Front if clockwise => CullMode::Front,
            CullFace::Front => CullMode::Back,
            CullFace::Back if clockwise => CullMode::Back,
            CullFace::Back => CullMode::Front,
            CullFace::FrontAndBack => CullMode::All,
        }
    };
    pass.submit(GxCommand::SetCullMode(mode));
}

pub(crate) fn apply_fog(state: &RenderState, pass: &mut Pass<'_>) {
    let fog = &state.fog;
    let projection = state.projection();
    let info = projection_info(projection).unwrap_or(ProjectionInfo {
        kind: projection_kind(projection),
        near: 0.0,
        far: 1.0,
    });
    let color = GxColor::from_rgba(fog.color);
    if !fog.enabled {
        pass.submit(GxCommand::SetFog(FogConfig {
            kind: FogType::None,
            start: 0.0,
            end: 0.0,
            near: info.near,
            far: info.far,
            color,
        }));
        return;
    }

    let ortho = info.kind == ProjectionType::Orthographic;
    let exp_end = |scale: f32| {
        if fog.density <= 0.0 {
            info.far
        } else {
            scale / fog.density
        }
    };
    let (kind, start, end) = match (fog.mode, ortho) {
        (FogMode::Linear, false) => (FogType::PerspLin, fog.start, fog.end),
        (FogMode::Linear, true) => (FogType::OrthoLin, fog.start, fog.end),
        (FogMode::Exp, false) => (FogType::PerspExp, info.near, exp_end(5.0)),
        (FogMode::Exp, true) => (FogType::OrthoExp, info.near, exp_end(5.0)),
        (FogMode::Exp2, false) => (FogType::PerspExp2, info.near, exp_end(2.0)),
        (FogMode::Exp2, true) => (FogType::OrthoExp2, info.near, exp_end(2.0)),
    };
    pass.submit(GxCommand::SetFog(FogConfig {
        kind,
        start,
        end,
        near: info.near,
        far: info.far,
        color,
    }));
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        backend::RecordingBackend, config::CompilerConfig, context::PassOwner, matrix::Matrixf,
    };

    fn run(state: &RenderState, f: impl FnOnce(&RenderState, &mut Pass<'_>)) -> (PassOwner, Vec<GxCommand>) {
        let mut owner = PassOwner::new(CompilerConfig::default());
        let mut gx = RecordingBackend::new();
        f(state, &mut owner.pass(&mut gx));
        (owner, gx.finish())
    }

    #[test]
    fn test_scissor_is_flipped() {
        let mut state = RenderState::default();
        state.viewport = [0, 0, 640, 480];
        state.scissor.enabled = true;
        state.scissor.rect = Some([10, 20, 100, 50]);
        let (_, commands) = run(&state, apply_scissor);
        assert_eq!(
            commands,
            vec![GxCommand::SetScissor {
                x: 10,
                y: 410,
                width: 100,
                height: 50
            }]
        );

        state.scissor.enabled = false;
        let (_, commands) = run(&state, apply_scissor);
        assert_eq!(
            commands,
            vec![GxCommand::SetScissor {
                x: 0,
                y: 0,
                width: 640,
                height: 480
            }]
        );
    }

    #[test]
    fn test_cull_winding_is_reversed() {
        let mut state = RenderState::default();
        state.cull.enabled = true;
        state.cull.face = CullFace::Back;
        let (_, commands) = run(&state, apply_cull);
        assert_eq!(commands, vec![GxCommand::SetCullMode(CullMode::Front)]);

        state.cull.front = FrontFace::Cw;
        let (_, commands) = run(&state, apply_cull);
        assert_eq!(commands, vec![GxCommand::SetCullMode(CullMode::Back)]);

        state.cull.enabled = false;
        let (_, commands) = run(&state, apply_cull);
        assert_eq!(commands, vec![GxCommand::SetCullMode(CullMode::None)]);
    }

    #[test]
    fn test_depth_writes_need_depth_test() {
        let mut state = RenderState::default();
        state.depth.write = true;
        state.depth.test = false;
        let (_, commands) = run(&state, apply_z);
        assert!(matches!(
            commands[0],
            GxCommand::SetZMode { enable: false, update: false, .. }
        ));
    }

    #[test]
    fn test_unsupported_blend_factor() {
        let mut state = RenderState::default();
        state.blend.enabled = true;
        state.blend.src = BlendFactor::ConstantAlpha;
        state.blend.dst = BlendFactor::OneMinusSrcAlpha;
        let (owner, commands) = run(&state, apply_blend);
        assert_eq!(
            commands,
            vec![GxCommand::SetBlendMode(
                BlendMode::Blend,
                GxBlendFactor::One,
                GxBlendFactor::InvSrcAlpha
            )]
        );
        assert_eq!(
            owner.diagnostics.entries(),
            &[Diagnostic::UnsupportedBlendFactor(BlendFactor::ConstantAlpha)]
        );
    }

    #[test]
    fn test_alpha_test_reference() {
        let mut state = RenderState::default();
        state.alpha_test.enabled = true;
        state.alpha_test.func = CompareFunc::Gequal;
        state.alpha_test.reference = 0.5;
        let (_, commands) = run(&state, |state, pass| apply_alpha_test(state, false, pass));
        let mut expected = AlphaCompare::ALWAYS;
        expected.comp0 = CompareFn::Gequal;
        expected.ref0 = 128;
        assert_eq!(
            commands,
            vec![
                GxCommand::SetAlphaCompare(expected),
                GxCommand::SetZCompLoc(false)
            ]
        );
    }

    #[test]
    fn test_exp_fog_uses_projection_planes() {
        let mut state = RenderState::default();
        state
            .matrices
            .projection
            .load(Matrixf::frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 100.0));
        state.fog.enabled = true;
        state.fog.mode = FogMode::Exp;
        state.fog.density = 0.5;
        let (_, commands) = run(&state, apply_fog);
        match &commands[0] {
            GxCommand::SetFog(fog) => {
                assert_eq!(fog.kind, FogType::PerspExp);
                assert!((fog.start - 1.0).abs() < 1e-4);
                assert!((fog.end - 10.0).abs() < 1e-4);
            }
            cmd => panic!("unexpected {:?}", cmd),
        }

        state.fog.density = 0.0;
        state
            .matrices
            .projection
            .load(Matrixf::ortho(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0));
        let (_, commands) = run(&state, apply_fog);
        match &commands[0] {
            GxCommand::SetFog(fog) => {
                assert_eq!(fog.kind, FogType::OrthoExp);
                assert!((fog.end - 10.0).abs() < 1e-4);
            }
            cmd => panic!("unexpected {:?}", cmd),
        }
    }

    #[test]
    fn test_polygon_offset_biases_projection() {
        let mut state = RenderState::default();
        state.polygon_offset.fill = true;
        state.polygon_offset.units = 2.0;
        let (_, commands) = run(&state, apply_matrices);
        let (plain, _) = gx_projection(&Matrixf::identity(), 0.0).unwrap();
        match &commands[2] {
            GxCommand::LoadProjectionMtx(proj, ProjectionType::Orthographic) => {
                assert!((proj.0[2][3] - plain.0[2][3] - 2.0e-5).abs() < 1e-6);
            }
            cmd => panic!("unexpected {:?}", cmd),
        }
    }

    #[test]
    fn test_degenerate_projection_is_loaded_unchanged() {
        let mut state = RenderState::default();
        let mut flat = Matrixf::identity();
        flat.0[2][2] = 0.0;
        state.matrices.projection.load(flat);
        let (owner, commands) = run(&state, apply_matrices);
        assert_eq!(
            commands[2],
            GxCommand::LoadProjectionMtx(flat, ProjectionType::Orthographic)
        );
        assert_eq!(
            owner.diagnostics.entries(),
            &[Diagnostic::DegenerateProjection]
        );

        let (_, commands) = run(&state, apply_fog);
        match &commands[0] {
            GxCommand::SetFog(fog) => assert_eq!((fog.near, fog.far), (0.0, 1.0)),
            cmd => panic!("unexpected {:?}", cmd),
        }
    }
}
