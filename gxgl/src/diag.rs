//! Warnings about features that were dropped or approximated.
//!
//! Every diagnostic is logged through `tracing` and kept until the caller
//! takes it, so degradations are observable without a subscriber.

#![allow(missing_docs)]

use core::fmt;

use crate::{
    combine::Channel,
    error::GlError,
    gl::{BlendFactor, CombineFunc, TexGenMode},
    resources::ResourceKind,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// More light contributions were requested than there are light objects.
    LightsExcluded { excluded: usize, capacity: u8 },
    /// A texture unit was left out of the combiner chain.
    TextureUnitSkipped { unit: usize, reason: SkipReason },
    /// A combine function needed more complemented operands than one stage can express.
    ComplementDropped {
        unit: usize,
        channel: Channel,
        func: CombineFunc,
    },
    /// A stage needed two different constants through its single konstant
    /// input. One of them was dropped.
    ConstantConflict { unit: usize },
    /// Lighting needs more color registers than are available.
    LightingDegraded { resource: ResourceKind },
    UnsupportedBlendFactor(BlendFactor),
    /// The projection matrix maps every depth to the same value. It is loaded
    /// unchanged.
    DegenerateProjection,
    /// A state-setting call was rejected.
    InvalidState(GlError),
    UnbalancedPop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoCoordinates,
    MissingTexture(u32),
    UnsupportedTexGen(TexGenMode),
    Exhausted(ResourceKind),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::LightsExcluded { excluded, capacity } => {
                write!(f, "Excluded {} lights since max is {}", excluded, capacity)
            }
            Diagnostic::TextureUnitSkipped { unit, reason } => {
                write!(f, "skipping texture unit {}: ", unit)?;
                match reason {
                    SkipReason::NoCoordinates => write!(f, "no texture coordinates"),
                    SkipReason::MissingTexture(id) => write!(f, "texture {} is not loaded", id),
                    SkipReason::UnsupportedTexGen(mode) => {
                        write!(f, "unsupported texgen mode {:?}", mode)
                    }
                    SkipReason::Exhausted(kind) => write!(f, "out of {}", kind),
                }
            }
            Diagnostic::ComplementDropped {
                unit,
                channel,
                func,
            } => write!(
                f,
                "texture unit {}: {:?} {:?} with these complemented operands is not supported",
                unit, channel, func
            ),
            Diagnostic::ConstantConflict { unit } => write!(
                f,
                "texture unit {}: more than one constant needed in one stage",
                unit
            ),
            Diagnostic::LightingDegraded { resource } => {
                write!(f, "lighting: out of {}", resource)
            }
            Diagnostic::UnsupportedBlendFactor(factor) => {
                write!(f, "unsupported blend factor {:?}", factor)
            }
            Diagnostic::DegenerateProjection => {
                write!(f, "projection matrix has no depth range")
            }
            Diagnostic::InvalidState(error) => write!(f, "{}", error),
            Diagnostic::UnbalancedPop => write!(f, "resource pop without push"),
        }
    }
}

/// Collected diagnostics for a context.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_exclusion_message() {
        let diag = Diagnostic::LightsExcluded {
            excluded: 10,
            capacity: 8,
        };
        assert_eq!(diag.to_string(), "Excluded 10 lights since max is 8");
    }

    #[test]
    fn test_take_drains() {
        let mut diags = Diagnostics::default();
        diags.push(Diagnostic::UnbalancedPop);
        assert_eq!(diags.entries().len(), 1);
        assert_eq!(diags.take(), vec![Diagnostic::UnbalancedPop]);
        assert!(diags.entries().is_empty());
    }
}
