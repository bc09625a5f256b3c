use crate::config::ThemeConfig;
use palette::{Srgb, Srgba};
use std::str::FromStr;

const FALLBACK_SURFACE: Srgb<f64> = Srgb::new(1.0, 0.984, 0.996);

/// Resolved colors and metrics for painting a menu.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuTheme {
    pub surface: Srgba<f64>,
    pub hover_bar: Srgba<f64>,
    pub corner_radius: f32,
    pub elevation: f32,
    pub hover_bar_elevation: f32,
    /// How far the hover bar reaches past the content box on each side.
    pub hover_bar_inset: f32,
}

impl MenuTheme {
    pub fn from_config(config: &ThemeConfig) -> Self {
        let surface = Self::parse_color(&config.surface, FALLBACK_SURFACE);
        let alpha = config.surface_alpha.clamp(0.0, 1.0) as f64;
        let tint = config.hover_bar_tint.clamp(0.0, 1.0) as f64;

        Self {
            surface: Self::with_alpha(surface, alpha),
            hover_bar: Self::with_alpha(Self::tint_white(surface, tint), alpha),
            corner_radius: config.corner_radius.max(0.0),
            elevation: config.elevation.max(0.0),
            hover_bar_elevation: config.hover_bar_elevation.max(0.0),
            hover_bar_inset: config.hover_bar_inset,
        }
    }

    fn parse_color(hex: &str, fallback: Srgb<f64>) -> Srgb<f64> {
        Srgb::<u8>::from_str(hex.trim())
            .map(|c| c.into_format())
            .unwrap_or_else(|e| {
                log::warn!("Invalid theme color {:?}: {}", hex, e);
                fallback
            })
    }

    fn with_alpha(color: Srgb<f64>, alpha: f64) -> Srgba<f64> {
        let (r, g, b) = color.into_components();
        Srgba::new(r, g, b, alpha)
    }

    /// A white layer of opacity `tint` laid over `base`.
    fn tint_white(base: Srgb<f64>, tint: f64) -> Srgb<f64> {
        let over = |c: f64| c * (1.0 - tint) + tint;
        Srgb::new(over(base.red), over(base.green), over(base.blue))
    }
}

impl Default for MenuTheme {
    fn default() -> Self {
        Self::from_config(&ThemeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme() {
        let theme = MenuTheme::default();
        let (r, g, b, a) = theme.surface.into_components();
        assert_eq!(r, 1.0);
        assert!((g - 251.0 / 255.0).abs() < 1e-9);
        assert!((b - 254.0 / 255.0).abs() < 1e-9);
        assert!((a - 0.8).abs() < 1e-6);
        assert_eq!(theme.corner_radius, 16.0);
    }

    #[test]
    fn test_hover_bar_is_lighter_than_surface() {
        let theme = MenuTheme::from_config(&ThemeConfig {
            surface: "#202020".to_string(),
            hover_bar_tint: 0.5,
            ..ThemeConfig::default()
        });
        let base = 32.0 / 255.0;
        assert!((theme.hover_bar.red - (base * 0.5 + 0.5)).abs() < 1e-9);
        assert!(theme.hover_bar.red > theme.surface.red);
        assert_eq!(theme.hover_bar.alpha, theme.surface.alpha);
    }

    #[test]
    fn test_bad_color_falls_back() {
        let theme = MenuTheme::from_config(&ThemeConfig {
            surface: "not a color".to_string(),
            ..ThemeConfig::default()
        });
        assert_eq!(theme.surface.color, FALLBACK_SURFACE);
    }
}
