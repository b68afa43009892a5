//! Rewriting GL texture combine functions into the TEV stage equation.
//!
//! A TEV stage computes `d op (a*(1-c) + b*c + bias)`. GL combine functions
//! take up to three arguments, each optionally complemented (`1 - x`). Most
//! functions have an exact rewrite as long as at most one argument is
//! complemented; the remaining cases are approximated by dropping a complement.
//!
//! Everything here is pure: [solve_combine] works on symbolic inputs, and the
//! lowering functions turn them into register selections once the previous and
//! primary color sources of the stage are known.

use serde::Serialize;

use crate::{
    gl::{CombineFunc, CombineOperand, CombineSource},
    gx::*,
};

/// One half of a combiner stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Channel {
    Rgb,
    Alpha,
}

/// A symbolic combiner input, independent of the stage it ends up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum TevInput {
    Zero,
    One,
    /// The environment color (its alpha in the alpha channel).
    Konst,
    /// The environment alpha broadcast to RGB.
    KonstAlpha,
    TexColor,
    TexAlpha,
    PrevColor,
    PrevAlpha,
    PrimaryColor,
    PrimaryAlpha,
}

/// A combine argument after applying its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CombineArg {
    #[allow(missing_docs)]
    pub input: TevInput,
    /// The operand asks for `1 - input`.
    pub complement: bool,
}

impl CombineArg {
    /// An uncomplemented argument.
    pub fn plain(input: TevInput) -> Self {
        Self {
            input,
            complement: false,
        }
    }

    /// Resolves a GL source/operand pair for a channel.
    pub fn from_gl(source: CombineSource, operand: CombineOperand, channel: Channel) -> Self {
        let alpha = channel == Channel::Alpha || operand.is_alpha();
        let input = match (source, alpha) {
            (CombineSource::Texture, false) => TevInput::TexColor,
            (CombineSource::Texture, true) => TevInput::TexAlpha,
            (CombineSource::Constant, false) => TevInput::Konst,
            (CombineSource::Constant, true) if channel == Channel::Alpha => TevInput::Konst,
            (CombineSource::Constant, true) => TevInput::KonstAlpha,
            (CombineSource::PrimaryColor, false) => TevInput::PrimaryColor,
            (CombineSource::PrimaryColor, true) => TevInput::PrimaryAlpha,
            (CombineSource::Previous, false) => TevInput::PrevColor,
            (CombineSource::Previous, true) => TevInput::PrevAlpha,
        };
        Self {
            input,
            complement: operand.is_complement(),
        }
    }
}

/// The symbolic configuration of one half of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TevEquation {
    /// Inputs a, b, c and d.
    pub inputs: [TevInput; 4],
    #[allow(missing_docs)]
    pub op: TevOp,
    #[allow(missing_docs)]
    pub bias: TevBias,
    /// The konstant input must be loaded as `1 - constant`.
    pub complement_konst: bool,
    /// A complemented operand could not be expressed and was treated as plain.
    pub dropped_complement: bool,
}

impl TevEquation {
    fn new(inputs: [TevInput; 4]) -> Self {
        Self {
            inputs,
            op: TevOp::Add,
            bias: TevBias::Zero,
            complement_konst: false,
            dropped_complement: false,
        }
    }

    /// Passes one input through unchanged.
    pub fn pass(input: TevInput) -> Self {
        use TevInput::Zero;
        Self::new([Zero, Zero, Zero, input])
    }

    /// `a*(1-c) + b*c + d` with the default op and bias.
    pub fn lerp(a: TevInput, b: TevInput, c: TevInput, d: TevInput) -> Self {
        Self::new([a, b, c, d])
    }

    fn degraded(mut self) -> Self {
        self.dropped_complement = true;
        self
    }

    /// True if any input is one of `inputs`.
    pub fn uses(&self, inputs: &[TevInput]) -> bool {
        self.inputs.iter().any(|input| inputs.contains(input))
    }
}

/// Rewrites a GL combine function into a stage equation.
pub fn solve_combine(func: CombineFunc, args: &[CombineArg; 3], channel: Channel) -> TevEquation {
    use TevInput::{One, Zero};

    let [arg0, arg1, arg2] = *args;
    let (x0, x1, x2) = (arg0.input, arg1.input, arg2.input);

    match func {
        CombineFunc::Replace => {
            if channel == Channel::Alpha && x0 == TevInput::Konst {
                // A literal one would need the konstant input too, so fold the
                // complement into the loaded constant instead.
                let mut eq = TevEquation::pass(Zero);
                eq.inputs[0] = TevInput::Konst;
                eq.complement_konst = arg0.complement;
                eq
            } else if arg0.complement {
                TevEquation::lerp(One, Zero, x0, Zero)
            } else {
                TevEquation::lerp(Zero, One, x0, Zero)
            }
        }
        CombineFunc::Modulate => match (arg0.complement, arg1.complement) {
            (false, false) => TevEquation::lerp(Zero, x0, x1, Zero),
            (false, true) => TevEquation::lerp(x0, Zero, x1, Zero),
            (true, false) => TevEquation::lerp(x1, Zero, x0, Zero),
            (true, true) => TevEquation::lerp(x1, Zero, x0, Zero).degraded(),
        },
        CombineFunc::Add | CombineFunc::AddSigned => {
            let mut eq = match (arg0.complement, arg1.complement) {
                (false, false) => TevEquation::lerp(x0, Zero, Zero, x1),
                (true, false) => TevEquation::lerp(One, Zero, x0, x1),
                (false, true) => TevEquation::lerp(One, Zero, x1, x0),
                (true, true) => TevEquation::lerp(One, Zero, x0, x1).degraded(),
            };
            if func == CombineFunc::AddSigned {
                eq.bias = TevBias::SubHalf;
            }
            eq
        }
        CombineFunc::Subtract => {
            // d - (a*(1-c) + b*c): arg0 can only sit in d, where it cannot be
            // complemented.
            let mut eq = if arg1.complement {
                TevEquation::lerp(One, Zero, x1, x0)
            } else {
                TevEquation::lerp(x1, Zero, Zero, x0)
            };
            eq.op = TevOp::Sub;
            if arg0.complement {
                eq = eq.degraded();
            }
            eq
        }
        CombineFunc::Interpolate => {
            let eq = if arg2.complement {
                TevEquation::lerp(x0, x1, x2, Zero)
            } else {
                TevEquation::lerp(x1, x0, x2, Zero)
            };
            if arg0.complement || arg1.complement {
                eq.degraded()
            } else {
                eq
            }
        }
    }
}

/// Where a stage reads "previous" and "primary" colors from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// The output of the previous stage.
    Prev,
    /// The rasterized color of the stage's channel.
    Raster,
    /// A color register written by an earlier stage.
    Register(TevReg),
}

/// The color feeds of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageFeeds {
    #[allow(missing_docs)]
    pub previous: Feed,
    #[allow(missing_docs)]
    pub primary: Feed,
}

fn feed_color(feed: Feed) -> TevColorArg {
    match feed {
        Feed::Prev => TevColorArg::CPrev,
        Feed::Raster => TevColorArg::RasC,
        Feed::Register(reg) => reg.color_arg(),
    }
}

fn feed_alpha_as_color(feed: Feed) -> TevColorArg {
    match feed {
        Feed::Prev => TevColorArg::APrev,
        Feed::Raster => TevColorArg::RasA,
        Feed::Register(reg) => reg.alpha_as_color_arg(),
    }
}

fn feed_alpha(feed: Feed) -> TevAlphaArg {
    match feed {
        Feed::Prev => TevAlphaArg::APrev,
        Feed::Raster => TevAlphaArg::RasA,
        Feed::Register(reg) => reg.alpha_arg(),
    }
}

/// Selects the color register for a symbolic input.
pub fn color_arg(input: TevInput, feeds: &StageFeeds) -> TevColorArg {
    match input {
        TevInput::Zero => TevColorArg::Zero,
        TevInput::One => TevColorArg::One,
        TevInput::Konst | TevInput::KonstAlpha => TevColorArg::Konst,
        TevInput::TexColor => TevColorArg::TexC,
        TevInput::TexAlpha => TevColorArg::TexA,
        TevInput::PrevColor => feed_color(feeds.previous),
        TevInput::PrevAlpha => feed_alpha_as_color(feeds.previous),
        TevInput::PrimaryColor => feed_color(feeds.primary),
        TevInput::PrimaryAlpha => feed_alpha_as_color(feeds.primary),
    }
}

/// Selects the alpha register for a symbolic input. One is expressed through
/// the konstant input, see [alpha_konst_sel].
pub fn alpha_arg(input: TevInput, feeds: &StageFeeds) -> TevAlphaArg {
    match input {
        TevInput::Zero => TevAlphaArg::Zero,
        TevInput::One | TevInput::Konst | TevInput::KonstAlpha => TevAlphaArg::Konst,
        TevInput::TexColor | TevInput::TexAlpha => TevAlphaArg::TexA,
        TevInput::PrevColor | TevInput::PrevAlpha => feed_alpha(feeds.previous),
        TevInput::PrimaryColor | TevInput::PrimaryAlpha => feed_alpha(feeds.primary),
    }
}

/// Lowers an RGB equation to register selections.
pub fn lower_color(eq: &TevEquation, feeds: &StageFeeds) -> [TevColorArg; 4] {
    eq.inputs.map(|input| color_arg(input, feeds))
}

/// Lowers an alpha equation to register selections.
pub fn lower_alpha(eq: &TevEquation, feeds: &StageFeeds) -> [TevAlphaArg; 4] {
    eq.inputs.map(|input| alpha_arg(input, feeds))
}

/// True if either half of the stage reads the environment color.
pub fn needs_env_konst(rgb: &TevEquation, alpha: &TevEquation) -> bool {
    rgb.uses(&[TevInput::Konst, TevInput::KonstAlpha]) || alpha.uses(&[TevInput::Konst])
}

/// The konstant color selection for an RGB equation, and whether the
/// environment color and its alpha collided. A stage has one color selection,
/// so the color wins and the alpha input reads the color too. Without a
/// register the constant reads as one.
pub fn color_konst_sel(eq: &TevEquation, reg: Option<KonstReg>) -> (Option<KColorSel>, bool) {
    let needs_color = eq.uses(&[TevInput::Konst]);
    let needs_alpha = eq.uses(&[TevInput::KonstAlpha]);
    match (needs_color, needs_alpha) {
        (true, conflict) => (Some(reg.map_or(KColorSel::One, KColorSel::K)), conflict),
        (false, true) => (Some(reg.map_or(KColorSel::One, KColorSel::KAlpha)), false),
        (false, false) => (None, false),
    }
}

/// The konstant alpha selection for an alpha equation, and whether a literal
/// one and the environment alpha collided. The literal one wins.
pub fn alpha_konst_sel(eq: &TevEquation, reg: Option<KonstReg>) -> (Option<KAlphaSel>, bool) {
    let needs_one = eq.uses(&[TevInput::One]);
    let needs_env = eq.uses(&[TevInput::Konst, TevInput::KonstAlpha]);
    match (needs_one, needs_env) {
        (true, conflict) => (Some(KAlphaSel::One), conflict),
        (false, true) => (Some(reg.map_or(KAlphaSel::One, KAlphaSel::KAlpha)), false),
        (false, false) => (None, false),
    }
}
