//! Recovering near/far planes from a GL projection matrix and re-expressing it
//! in the GX depth convention.
//!
//! GL maps eye depth to clip z in [-w, w]; GX expects [-w, 0]. Only the third
//! row differs, so it is rebuilt from the recovered planes.

use crate::{gx::ProjectionType, matrix::Matrixf};

/// Planes recovered from a projection matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionInfo {
    #[allow(missing_docs)]
    pub kind: ProjectionType,
    /// Eye-space distance of the near plane.
    pub near: f32,
    /// Infinite for a perspective matrix without a far plane.
    pub far: f32,
}

const EPSILON: f32 = 1e-6;

/// Perspective iff the bottom right entry is zero.
pub fn projection_kind(m: &Matrixf) -> ProjectionType {
    if m.0[3][3] == 0.0 {
        ProjectionType::Perspective
    } else {
        ProjectionType::Orthographic
    }
}

/// Classifies a projection matrix and recovers its depth planes.
///
/// Returns None if the depth row does not determine a near plane.
pub fn projection_info(m: &Matrixf) -> Option<ProjectionInfo> {
    let a = m.0[2][2];
    let b = m.0[2][3];

    let kind = projection_kind(m);
    let (near, far) = match kind {
        ProjectionType::Perspective => {
            if (a - 1.0).abs() < EPSILON {
                return None;
            }
            let far = if (a + 1.0).abs() < EPSILON {
                f32::INFINITY
            } else {
                b / (a + 1.0)
            };
            (b / (a - 1.0), far)
        }
        ProjectionType::Orthographic => {
            if a.abs() < EPSILON {
                return None;
            }
            ((b + 1.0) / a, (b - 1.0) / a)
        }
    };
    Some(ProjectionInfo { kind, near, far })
}

/// Builds the hardware projection matrix, with `depth_offset` added to the
/// depth translation.
pub fn gx_projection(m: &Matrixf, depth_offset: f32) -> Option<(Matrixf, ProjectionInfo)> {
    let info = projection_info(m)?;
    let mut proj = *m;
    let (near, far) = (info.near, info.far);

    match info.kind {
        ProjectionType::Orthographic => {
            let tmp = 1.0 / (far - near);
            proj.0[2][2] = -tmp;
            proj.0[2][3] = -far * tmp + depth_offset;
        }
        ProjectionType::Perspective if far.is_infinite() => {
            proj.0[2][2] = 0.0;
            proj.0[2][3] = -near + depth_offset;
        }
        ProjectionType::Perspective => {
            let tmp = 1.0 / (far - near);
            proj.0[2][2] = -near * tmp;
            proj.0[2][3] = -near * far * tmp + depth_offset;
        }
    }
    Some((proj, info))
}

#[cfg(test)]
mod test {
    use super::*;

    // Relative for large values: the far plane is recovered from a difference
    // of nearly equal f32 entries.
    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-4 * b.abs().max(1.0), "{} != {}", a, b);
    }

    #[test]
    fn test_perspective_planes() {
        let m = Matrixf::frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 100.0);
        let info = projection_info(&m).unwrap();
        assert_eq!(info.kind, ProjectionType::Perspective);
        assert_close(info.near, 1.0);
        assert_close(info.far, 100.0);

        // off-center and narrow
        let m = Matrixf::frustum(-0.2, 0.6, -0.1, 0.3, 1.0, 100.0);
        let info = projection_info(&m).unwrap();
        assert_close(info.near, 1.0);
        assert_close(info.far, 100.0);
    }

    #[test]
    fn test_orthographic_planes() {
        let m = Matrixf::ortho(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0);
        let info = projection_info(&m).unwrap();
        assert_eq!(info.kind, ProjectionType::Orthographic);
        assert_close(info.near, 0.0);
        assert_close(info.far, 10.0);
    }

    #[test]
    fn test_gx_depth_range() {
        // Eye depth -near maps to -w and -far maps to 0.
        let m = Matrixf::frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 100.0);
        let (proj, _) = gx_projection(&m, 0.0).unwrap();
        for (z, expected) in [(-1.0, -1.0), (-100.0, 0.0)] {
            let clip = &proj * [0.0, 0.0, z, 1.0];
            assert_close(clip[2] / clip[3], expected);
        }

        let m = Matrixf::ortho(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0);
        let (proj, _) = gx_projection(&m, 0.0).unwrap();
        assert_close((&proj * [0.0, 0.0, 0.0, 1.0])[2], -1.0);
        assert_close((&proj * [0.0, 0.0, -10.0, 1.0])[2], 0.0);
    }

    #[test]
    fn test_depth_offset() {
        let m = Matrixf::ortho(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0);
        let (plain, _) = gx_projection(&m, 0.0).unwrap();
        let (offset, _) = gx_projection(&m, 0.5).unwrap();
        assert_close(offset.0[2][3] - plain.0[2][3], 0.5);
        assert_eq!(offset.0[2][2], plain.0[2][2]);
    }

    #[test]
    fn test_infinite_far_plane() {
        let mut m = Matrixf::frustum(-1.0, 1.0, -1.0, 1.0, 2.0, 100.0);
        m.0[2][2] = -1.0;
        m.0[2][3] = -4.0;
        let (proj, info) = gx_projection(&m, 0.0).unwrap();
        assert!(info.far.is_infinite());
        assert_close(info.near, 2.0);
        assert!(proj.0[2][3].is_finite());
        assert_close(proj.0[2][3], -2.0);
    }

    #[test]
    fn test_degenerate_depth_row() {
        let mut m = Matrixf::identity();
        m.0[2][2] = 0.0;
        assert_eq!(projection_info(&m), None);
        assert_eq!(gx_projection(&m, 0.0), None);

        let mut m = Matrixf::frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 100.0);
        m.0[2][2] = 1.0;
        assert_eq!(projection_info(&m), None);
        assert_eq!(projection_kind(&m), ProjectionType::Perspective);
    }
}
