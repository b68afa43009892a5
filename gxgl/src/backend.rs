//! The hardware command stream produced by the compiler.

use serde::Serialize;

use crate::{gx::*, matrix::Matrixf};

/// A single GX register write.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(missing_docs)]
pub enum GxCommand {
    SetNumChans(u8),
    SetNumTevStages(u8),
    SetNumTexGens(u8),
    SetChanCtrl(ChannelId, ChanCtrl),
    SetChanAmbColor(ChannelId, GxColor),
    SetChanMatColor(ChannelId, GxColor),
    LoadLightObj(GxLightId, LightObj),
    SetTevColor(TevReg, GxColor),
    SetTevKColor(KonstReg, GxColor),
    SetTevKColorSel(TevStageId, KColorSel),
    SetTevKAlphaSel(TevStageId, KAlphaSel),
    SetTevColorIn(TevStageId, [TevColorArg; 4]),
    SetTevAlphaIn(TevStageId, [TevAlphaArg; 4]),
    SetTevColorOp(TevStageId, TevOpConfig),
    SetTevAlphaOp(TevStageId, TevOpConfig),
    SetTevOrder {
        stage: TevStageId,
        coord: Option<TexCoordId>,
        map: Option<TexMapId>,
        channel: Option<ChannelId>,
    },
    SetTexCoordGen(TexCoordId, TexCoordGen),
    LoadTexMtx2x4(TexMtxId, [[f32; 4]; 2]),
    LoadDttMtx3x4(DttMtxId, [[f32; 4]; 3]),
    LoadTexObj(TexObjHandle, TexMapId),
    LoadPosMtx(Matrixf),
    LoadNrmMtx(Matrixf),
    LoadProjectionMtx(Matrixf, ProjectionType),
    SetViewport {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        near: f32,
        far: f32,
    },
    SetScissor {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    SetZMode {
        enable: bool,
        func: CompareFn,
        update: bool,
    },
    SetColorUpdate(bool),
    SetAlphaUpdate(bool),
    SetBlendMode(BlendMode, GxBlendFactor, GxBlendFactor),
    SetAlphaCompare(AlphaCompare),
    /// True places the depth test before texturing.
    SetZCompLoc(bool),
    SetCullMode(CullMode),
    SetFog(FogConfig),
}

impl GxCommand {
    /// The stage a combiner command configures, if any.
    pub fn tev_stage(&self) -> Option<TevStageId> {
        match self {
            GxCommand::SetTevKColorSel(stage, _)
            | GxCommand::SetTevKAlphaSel(stage, _)
            | GxCommand::SetTevColorIn(stage, _)
            | GxCommand::SetTevAlphaIn(stage, _)
            | GxCommand::SetTevColorOp(stage, _)
            | GxCommand::SetTevAlphaOp(stage, _)
            | GxCommand::SetTevOrder { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// The GPU command interface the compiler writes to.
pub trait GxBackend {
    /// Issues one register write.
    fn submit(&mut self, cmd: GxCommand);
}

impl GxBackend for Vec<GxCommand> {
    fn submit(&mut self, cmd: GxCommand) {
        self.push(cmd);
    }
}

/// A backend that records every command, used for tracing and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    commands: Vec<GxCommand>,
}

impl RecordingBackend {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands recorded since the last [RecordingBackend::finish].
    pub fn commands(&self) -> &[GxCommand] {
        &self.commands
    }

    /// Takes the recorded commands, leaving the recorder empty.
    pub fn finish(&mut self) -> Vec<GxCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Commands configuring the given combiner stage, in issue order.
    pub fn stage_commands(&self, stage: TevStageId) -> impl DoubleEndedIterator<Item = &GxCommand> {
        self.commands
            .iter()
            .filter(move |cmd| cmd.tev_stage() == Some(stage))
    }

    /// The last color input selection issued for a stage.
    pub fn color_in(&self, stage: TevStageId) -> Option<[TevColorArg; 4]> {
        self.stage_commands(stage).rev().find_map(|cmd| match cmd {
            GxCommand::SetTevColorIn(_, args) => Some(*args),
            _ => None,
        })
    }

    /// The last alpha input selection issued for a stage.
    pub fn alpha_in(&self, stage: TevStageId) -> Option<[TevAlphaArg; 4]> {
        self.stage_commands(stage).rev().find_map(|cmd| match cmd {
            GxCommand::SetTevAlphaIn(_, args) => Some(*args),
            _ => None,
        })
    }

    /// The last color op issued for a stage.
    pub fn color_op(&self, stage: TevStageId) -> Option<TevOpConfig> {
        self.stage_commands(stage).rev().find_map(|cmd| match cmd {
            GxCommand::SetTevColorOp(_, op) => Some(*op),
            _ => None,
        })
    }

    /// Returns the last command matching `f`.
    pub fn last<T>(&self, f: impl FnMut(&GxCommand) -> Option<T>) -> Option<T> {
        self.commands.iter().rev().find_map(f)
    }

    /// Counts commands matching a predicate.
    pub fn count(&self, f: impl Fn(&GxCommand) -> bool) -> usize {
        self.commands.iter().filter(|cmd| f(cmd)).count()
    }
}

impl GxBackend for RecordingBackend {
    fn submit(&mut self, cmd: GxCommand) {
        self.commands.push(cmd);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_recording_backend_queries() {
        let mut gx = RecordingBackend::new();
        let stage = TevStageId(1);
        gx.submit(GxCommand::SetNumChans(1));
        gx.submit(GxCommand::SetTevColorIn(stage, [TevColorArg::Zero; 4]));
        gx.submit(GxCommand::SetTevColorIn(
            stage,
            [
                TevColorArg::Zero,
                TevColorArg::CPrev,
                TevColorArg::TexC,
                TevColorArg::Zero,
            ],
        ));
        assert_eq!(gx.stage_commands(stage).count(), 2);
        assert_eq!(gx.color_in(stage).unwrap()[1], TevColorArg::CPrev);
        assert_eq!(gx.color_in(TevStageId(0)), None);
        assert_eq!(gx.finish().len(), 3);
        assert!(gx.commands().is_empty());
    }
}
