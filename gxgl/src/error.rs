#![allow(missing_docs)]

use core::fmt;
use std::error;

use num_enum::{TryFromPrimitive, TryFromPrimitiveError};

use crate::gl::GLenum;

/// An error recorded by a state-setting call, in the GL error model.
///
/// The call that produced it has no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlError {
    InvalidEnum(GLenum),
    InvalidValue,
    InvalidOperation,
    StackOverflow,
    StackUnderflow,
}

impl fmt::Display for GlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlError::InvalidEnum(value) => write!(f, "invalid enum: {:#06X}", value),
            GlError::InvalidValue => write!(f, "invalid value"),
            GlError::InvalidOperation => write!(f, "invalid operation"),
            GlError::StackOverflow => write!(f, "matrix stack overflow"),
            GlError::StackUnderflow => write!(f, "matrix stack underflow"),
        }
    }
}

impl error::Error for GlError {}

impl<E> From<TryFromPrimitiveError<E>> for GlError
where
    E: TryFromPrimitive<Primitive = GLenum>,
{
    fn from(error: TryFromPrimitiveError<E>) -> Self {
        GlError::InvalidEnum(error.number)
    }
}
