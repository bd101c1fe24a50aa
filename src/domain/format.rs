//! Presentation hints and colored rendering
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically in `Auto` mode.

use std::fmt;
use std::str::FromStr;

use colored::{Color, ColoredString, Colorize};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// When to emit ANSI color codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Let `colored` decide (tty detection and env vars)
    #[default]
    Auto,
    /// Force colors on; takes effect process-wide via `Settings::apply`
    Always,
    /// Plain text
    Never,
}

/// Font weight of a styled domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Weight {
    #[default]
    Normal,
    Bold,
    Dim,
}

/// Display hint carried by a domain. Never affects sequence content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub color: Option<Color>,
    pub weight: Weight,
}

impl Style {
    pub fn new(color: Color) -> Self {
        Self {
            color: Some(color),
            weight: Weight::Normal,
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = Weight::Bold;
        self
    }

    pub fn dim(mut self) -> Self {
        self.weight = Weight::Dim;
        self
    }

    pub fn is_plain(&self) -> bool {
        self.color.is_none() && self.weight == Weight::Normal
    }
}

/// Parses `"red"`, `"red bold"`, `"bold"`, or `"normal"`.
impl FromStr for Style {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut style = Style::default();
        for token in s.split_whitespace() {
            match token.to_ascii_lowercase().as_str() {
                "normal" => {}
                "bold" => style.weight = Weight::Bold,
                "dim" => style.weight = Weight::Dim,
                other => {
                    let color = Color::from_str(other)
                        .map_err(|_| DomainError::InvalidStyle(s.to_string()))?;
                    if style.color.replace(color).is_some() {
                        return Err(DomainError::InvalidStyle(s.to_string()));
                    }
                }
            }
        }
        Ok(style)
    }
}

/// Which per-character field of a domain to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Seq,
    Dna,
    Rna,
}

impl View {
    pub fn apply(&self, seq: &str) -> String {
        match self {
            View::Seq => seq.to_string(),
            View::Dna => crate::domain::sequence::to_dna(seq),
            View::Rna => crate::domain::sequence::to_rna(seq),
        }
    }
}

/// Rendering options for `ConstructView::format`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatOptions {
    pub view: View,
    /// Global start of the window, inclusive
    pub start: Option<usize>,
    /// Global end of the window, exclusive
    pub end: Option<usize>,
    /// Left-pad with `start` spaces so windows line up
    pub pad: bool,
    /// Wrap as `5'-...-3'`
    pub labels: bool,
    pub color: ColorMode,
}

impl FormatOptions {
    pub fn plain() -> Self {
        Self {
            color: ColorMode::Never,
            ..Self::default()
        }
    }

    pub fn with_view(mut self, view: View) -> Self {
        self.view = view;
        self
    }

    pub fn with_window(mut self, start: usize, end: usize) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn with_labels(mut self, labels: bool) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_pad(mut self, pad: bool) -> Self {
        self.pad = pad;
        self
    }

    pub fn with_color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }
}

/// Apply `style` to `text` unless colors are off.
pub fn paint(text: &str, style: &Style, mode: ColorMode) -> String {
    if mode == ColorMode::Never || text.is_empty() || style.is_plain() {
        return text.to_string();
    }
    let painted: ColoredString = match style.color {
        Some(color) => text.color(color),
        None => text.normal(),
    };
    let painted = match style.weight {
        Weight::Normal => painted,
        Weight::Bold => painted.bold(),
        Weight::Dim => painted.dimmed(),
    };
    painted.to_string()
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weight::Normal => write!(f, "normal"),
            Weight::Bold => write!(f, "bold"),
            Weight::Dim => write!(f, "dim"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_color_and_weight_when_parsing_style_then_sets_both() {
        let style: Style = "magenta bold".parse().unwrap();
        assert_eq!(style.color, Some(Color::Magenta));
        assert_eq!(style.weight, Weight::Bold);
    }

    #[test]
    fn given_normal_when_parsing_style_then_is_plain() {
        let style: Style = "normal".parse().unwrap();
        assert!(style.is_plain());
    }

    #[test]
    fn given_two_colors_when_parsing_style_then_errors() {
        assert!("red blue".parse::<Style>().is_err());
        assert!("chartreuse-ish".parse::<Style>().is_err());
    }

    #[test]
    fn given_never_mode_when_painting_then_returns_plain_text() {
        let style = Style::new(Color::Red).bold();
        assert_eq!(paint("ACGU", &style, ColorMode::Never), "ACGU");
    }

    #[test]
    fn given_forced_colors_when_painting_then_wraps_in_escape_codes() {
        colored::control::set_override(true);
        let painted = paint("ACGU", &Style::new(Color::Green), ColorMode::Always);
        colored::control::unset_override();
        assert!(painted.contains("ACGU"));
        assert!(painted.starts_with("\u{1b}["));
    }

    #[test]
    fn given_rna_view_when_applying_then_substitutes_thymine() {
        assert_eq!(View::Rna.apply("TTAG"), "UUAG");
        assert_eq!(View::Dna.apply("UUAG"), "TTAG");
        assert_eq!(View::Seq.apply("UTAG"), "UTAG");
    }
}
