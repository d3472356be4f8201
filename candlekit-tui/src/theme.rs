//! Colour tokens for the distribution viewer.
//!
//! Dark background with neon accents, matching the rest of the terminal
//! tooling.

use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    /// Near-black background
    pub background: Color,
    /// Histogram bars
    pub bars: Color,
    /// Density curve
    pub curve: Color,
    /// Borders and axes
    pub border: Color,
    /// Secondary text
    pub muted: Color,
    pub text: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::neon()
    }
}

impl Theme {
    pub fn neon() -> Self {
        Self {
            background: Color::Rgb(18, 18, 20),
            bars: Color::Rgb(0, 255, 255),
            curve: Color::Rgb(255, 20, 147),
            border: Color::Rgb(147, 112, 219),
            muted: Color::Rgb(100, 149, 237),
            text: Color::White,
        }
    }
}
