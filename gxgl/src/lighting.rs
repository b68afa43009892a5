//! Emulation of GL vertex lighting with the two GX color channels.
//!
//! The first channel accumulates ambient and specular terms with diffuse
//! shading disabled, so an "ambient light" contributes its full color. The
//! second channel carries the diffuse terms. Two TEV stages then add the
//! emission color and sum the channels.

use crate::{
    backend::GxCommand,
    context::Pass,
    diag::Diagnostic,
    gl::ColorMaterialMode,
    gx::*,
    lights::{allocate_lights, is_black, LightAllocation, LightSlots},
    resources::{ResourceGrant, ResourceKind, ResourceRequest},
    state::{Light, LightingState},
};

/// Light objects loaded for one GL light.
fn light_objects(light: &Light, slots: &LightSlots, shininess: f32) -> Vec<(GxLightId, LightObj)> {
    let position = [light.position[0], light.position[1], light.position[2]];
    let positioned = |color: &[f32; 4]| {
        let mut obj = LightObj::new(GxColor::from_rgba(*color));
        obj.position = position;
        if !light.is_directional() {
            obj.dist_attn = light.attenuation;
        }
        obj
    };

    let mut objects = Vec::new();
    if let Some(id) = slots.ambient {
        objects.push((id, positioned(&light.ambient)));
    }
    if let Some(id) = slots.diffuse {
        objects.push((id, positioned(&light.diffuse)));
    }
    if let Some(id) = slots.specular {
        let mut obj = LightObj::new(GxColor::from_rgba(light.specular));
        let dir = crate::matrix::normalize3([-position[0], -position[1], -position[2]]);
        obj.set_specular_dir(dir);
        obj.set_shininess(shininess);
        objects.push((id, obj));
    }
    objects
}

/// Allocates light objects to the enabled lights and loads them.
pub(crate) fn load_lights(lighting: &mut LightingState, pass: &mut Pass<'_>) -> LightAllocation {
    let allocation = allocate_lights(
        &lighting.lights,
        &lighting.material,
        &lighting.global_ambient,
        pass.config.limits.lights,
    );
    if allocation.excluded > 0 {
        pass.diagnostics.push(Diagnostic::LightsExcluded {
            excluded: allocation.excluded,
            capacity: pass.config.limits.lights.min(8),
        });
    }

    let shininess = lighting.material.shininess;
    for (light, slots) in lighting.lights.iter_mut().zip(&allocation.slots) {
        light.slots = *slots;
        for (id, obj) in light_objects(light, slots, shininess) {
            tracing::debug!(target: "gxgl::lighting", "light object {}: {:?}", id.0, obj);
            pass.submit(GxCommand::LoadLightObj(id, obj));
        }
    }
    allocation
}

/// Which material terms come from the current color or the vertex color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ColorMaterial {
    ambient: bool,
    diffuse: bool,
    specular: bool,
    emission: bool,
}

impl ColorMaterial {
    fn of(lighting: &LightingState) -> Self {
        if !lighting.color_material {
            return Self::default();
        }
        let mode = lighting.color_material_mode;
        Self {
            ambient: matches!(
                mode,
                ColorMaterialMode::Ambient | ColorMaterialMode::AmbientAndDiffuse
            ),
            diffuse: matches!(
                mode,
                ColorMaterialMode::Diffuse | ColorMaterialMode::AmbientAndDiffuse
            ),
            specular: mode == ColorMaterialMode::Specular,
            emission: mode == ColorMaterialMode::Emission,
        }
    }
}

/// Configures both lighting channels and emits the two lighting stages.
///
/// The lit color is written to `output`. Returns false, without touching the
/// channels or light objects, if the stages could not be allocated.
pub(crate) fn setup_lit_stages(
    lighting: &mut LightingState,
    current_color: [f32; 4],
    vertex_colors: bool,
    output: TevReg,
    pass: &mut Pass<'_>,
) -> bool {
    let stages = ResourceRequest::default()
        .with(ResourceKind::TevStage)
        .with(ResourceKind::TevStage);
    let ambient_stage = match pass.resources.reserve(&stages) {
        Ok(ResourceGrant {
            tev_stage: Some(stage),
            ..
        }) => stage,
        _ => {
            pass.diagnostics.push(Diagnostic::LightingDegraded {
                resource: ResourceKind::TevStage,
            });
            return false;
        }
    };
    let diffuse_stage = TevStageId(ambient_stage.0 + 1);

    let allocation = load_lights(lighting, pass);
    let tracked = ColorMaterial::of(lighting);
    let material = lighting.material;
    let pick = |tracks: bool, value: [f32; 4]| if tracks { current_color } else { value };

    // The first channel multiplies both ambient and specular lights by one
    // material register.
    let carries_ambient = !allocation.ambient_mask.is_empty() || allocation.specular_mask.is_empty();
    let (chan0_material, chan0_tracks) = if carries_ambient {
        (pick(tracked.ambient, material.ambient), tracked.ambient)
    } else {
        (pick(tracked.specular, material.specular), tracked.specular)
    };
    let chan1_material = pick(tracked.diffuse, material.diffuse);
    let source = |tracks: bool| {
        if tracks && vertex_colors {
            ColorSrc::Vertex
        } else {
            ColorSrc::Register
        }
    };

    pass.submit(GxCommand::SetNumChans(2));
    pass.submit(GxCommand::SetChanAmbColor(
        ChannelId::Color0A0,
        GxColor::from_rgba(lighting.global_ambient),
    ));
    pass.submit(GxCommand::SetChanAmbColor(ChannelId::Color1A1, GxColor::new(0, 0, 0, 0)));
    pass.submit(GxCommand::SetChanMatColor(
        ChannelId::Color0A0,
        GxColor::from_rgba(chan0_material),
    ));
    pass.submit(GxCommand::SetChanMatColor(
        ChannelId::Color1A1,
        GxColor::from_rgba(chan1_material),
    ));
    pass.submit(GxCommand::SetChanCtrl(
        ChannelId::Color0A0,
        ChanCtrl {
            enable: true,
            ambient_src: ColorSrc::Register,
            material_src: source(chan0_tracks),
            lights: allocation.ambient_mask | allocation.specular_mask,
            diffuse_fn: DiffuseFn::None,
            attn_fn: AttnFn::Spec,
        },
    ));
    pass.submit(GxCommand::SetChanCtrl(
        ChannelId::Color1A1,
        ChanCtrl {
            enable: true,
            ambient_src: ColorSrc::Register,
            material_src: source(tracked.diffuse),
            lights: allocation.diffuse_mask,
            diffuse_fn: DiffuseFn::Clamp,
            attn_fn: AttnFn::Spot,
        },
    ));

    let emission_color = pick(tracked.emission, material.emission);
    let emission = if is_black(&emission_color) {
        TevColorArg::Zero
    } else {
        match pass.resources.allocate_color_register() {
            Some(reg) => {
                pass.submit(GxCommand::SetTevColor(reg, GxColor::from_rgba(emission_color)));
                reg.color_arg()
            }
            None => {
                pass.diagnostics.push(Diagnostic::LightingDegraded {
                    resource: ResourceKind::TevRegister,
                });
                TevColorArg::Zero
            }
        }
    };

    // ambient + specular + emission
    pass.submit(GxCommand::SetTevOrder {
        stage: ambient_stage,
        coord: None,
        map: None,
        channel: Some(ChannelId::Color0A0),
    });
    pass.submit(GxCommand::SetTevColorIn(
        ambient_stage,
        [emission, TevColorArg::Zero, TevColorArg::Zero, TevColorArg::RasC],
    ));
    pass.submit(GxCommand::SetTevAlphaIn(
        ambient_stage,
        [TevAlphaArg::Zero, TevAlphaArg::Zero, TevAlphaArg::Zero, TevAlphaArg::RasA],
    ));
    pass.submit(GxCommand::SetTevColorOp(ambient_stage, TevOpConfig::default()));
    pass.submit(GxCommand::SetTevAlphaOp(ambient_stage, TevOpConfig::default()));

    // + diffuse, with the diffuse material alpha
    pass.submit(GxCommand::SetTevOrder {
        stage: diffuse_stage,
        coord: None,
        map: None,
        channel: Some(ChannelId::Color1A1),
    });
    pass.submit(GxCommand::SetTevColorIn(
        diffuse_stage,
        [TevColorArg::CPrev, TevColorArg::Zero, TevColorArg::Zero, TevColorArg::RasC],
    ));
    pass.submit(GxCommand::SetTevAlphaIn(
        diffuse_stage,
        [TevAlphaArg::RasA, TevAlphaArg::Zero, TevAlphaArg::Zero, TevAlphaArg::Zero],
    ));
    pass.submit(GxCommand::SetTevColorOp(diffuse_stage, TevOpConfig::to(output)));
    pass.submit(GxCommand::SetTevAlphaOp(diffuse_stage, TevOpConfig::to(output)));
    true
}

/// Configures the single unlit channel.
pub(crate) fn setup_unlit_channel(current_color: [f32; 4], vertex_colors: bool, pass: &mut Pass<'_>) {
    let material_src = if vertex_colors {
        ColorSrc::Vertex
    } else {
        pass.submit(GxCommand::SetChanMatColor(
            ChannelId::Color0A0,
            GxColor::from_rgba(current_color),
        ));
        ColorSrc::Register
    };
    pass.submit(GxCommand::SetNumChans(1));
    pass.submit(GxCommand::SetChanCtrl(
        ChannelId::Color0A0,
        ChanCtrl::unlit(material_src),
    ));
}
