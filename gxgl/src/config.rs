//! Compiler configuration: hardware limits and quality hints.

use serde::{Deserialize, Serialize};

/// Environment variable listing the enabled fast (lower quality) operations.
pub const FAST_OPS_ENV: &str = "GXGL_FAST_OPS";

/// Settings for a [Context](crate::Context).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Physical slot counts.
    pub limits: HardwareLimits,
    /// Quality/speed trade-offs.
    pub hints: Hints,
    /// Width of the embedded frame buffer. Viewport and scissor widths are clamped to it.
    pub efb_width: u32,
    /// Depth offset per polygon offset unit.
    pub depth_offset_scale: f32,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            limits: HardwareLimits::default(),
            hints: Hints::default(),
            efb_width: 640,
            depth_offset_scale: 0.00001,
        }
    }
}

impl CompilerConfig {
    /// The default configuration with hints taken from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(FAST_OPS_ENV) {
            config.hints.apply_fast_ops(&value);
        }
        config
    }
}

/// Number of hardware slots of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct HardwareLimits {
    pub tev_stages: u8,
    pub tex_coords: u8,
    pub tex_maps: u8,
    pub tex_matrices: u8,
    pub dtt_matrices: u8,
    pub tev_registers: u8,
    pub konst_registers: u8,
    pub lights: u8,
}

impl Default for HardwareLimits {
    fn default() -> Self {
        Self {
            tev_stages: 16,
            tex_coords: 8,
            tex_maps: 8,
            tex_matrices: 10,
            dtt_matrices: 20,
            tev_registers: 3,
            konst_registers: 4,
            lights: 8,
        }
    }
}

/// Optional shortcuts that trade accuracy for speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Hints {
    /// Generate sphere-map coordinates with the texgen hardware instead of in
    /// software. The hardware path only approximates the GL formula.
    pub fast_sphere_map: bool,
}

impl Hints {
    /// Enables the operations named in a comma separated list.
    pub fn apply_fast_ops(&mut self, list: &str) {
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match name {
                "sphere_map" => self.fast_sphere_map = true,
                "all" => *self = Hints { fast_sphere_map: true },
                _ => tracing::warn!("unknown fast operation: {}", name),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_apply_fast_ops() {
        let mut hints = Hints::default();
        hints.apply_fast_ops(" bogus , sphere_map");
        assert!(hints.fast_sphere_map);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: CompilerConfig = serde_json::from_str(r#"{"limits": {"lights": 4}}"#).unwrap();
        assert_eq!(config.limits.lights, 4);
        assert_eq!(config.limits.tev_stages, 16);
        assert_eq!(config.efb_width, 640);
    }
}
