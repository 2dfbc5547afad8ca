use std::io::IsTerminal;

use clap::{
  ValueEnum,
  builder::styling::{Ansi256Color, AnsiColor, Color as ClapColor, RgbColor, Style, Styles},
};
use comfy_table::Color as ComfyColor;
use crossterm::style::Color;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
  Always,
  Auto,
  Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ThemeMode {
  Dark,
  Light,
  Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
  Dark,
  Light,
}

/// Role colors of one theme.
#[derive(Debug, Clone, Copy)]
struct Palette {
  timestamp: Color,
  primary: Color,
  accent: Color,
  info: Color,
  success: Color,
  label: Color,
  value: Color,
  warning: Color,
  error: Color,
}

const fn rgb(r: u8, g: u8, b: u8) -> Color {
  Color::Rgb { r, g, b }
}

const DARK: Palette = Palette {
  timestamp: rgb(118, 166, 166),
  primary: rgb(191, 126, 4),
  accent: rgb(166, 84, 55),
  info: rgb(118, 166, 166),
  success: rgb(118, 166, 166),
  label: rgb(217, 164, 4),
  value: rgb(242, 211, 56),
  warning: rgb(230, 170, 60),
  error: rgb(214, 84, 70),
};

const LIGHT: Palette = Palette {
  timestamp: rgb(92, 62, 38),
  primary: rgb(70, 42, 25),
  accent: rgb(211, 99, 70),
  info: rgb(40, 111, 170),
  success: rgb(34, 142, 90),
  label: rgb(176, 103, 66),
  value: rgb(199, 146, 76),
  warning: rgb(168, 110, 20),
  error: rgb(178, 34, 34),
};

pub struct Colors {
  enabled: bool,
  palette: Palette,
}

pub trait IntoComfyColor {
  fn into(self) -> ComfyColor;
}

impl IntoComfyColor for Color {
  fn into(self) -> ComfyColor {
    match self {
      Color::Rgb { r, g, b } => ComfyColor::Rgb { r, g, b },
      Color::AnsiValue(val) => ComfyColor::AnsiValue(val),
      Color::Black => ComfyColor::Black,
      Color::DarkGrey => ComfyColor::DarkGrey,
      Color::Red => ComfyColor::Red,
      Color::DarkRed => ComfyColor::DarkRed,
      Color::Green => ComfyColor::Green,
      Color::DarkGreen => ComfyColor::DarkGreen,
      Color::Yellow => ComfyColor::Yellow,
      Color::DarkYellow => ComfyColor::DarkYellow,
      Color::Blue => ComfyColor::Blue,
      Color::DarkBlue => ComfyColor::DarkBlue,
      Color::Magenta => ComfyColor::Magenta,
      Color::DarkMagenta => ComfyColor::DarkMagenta,
      Color::Cyan => ComfyColor::Cyan,
      Color::DarkCyan => ComfyColor::DarkCyan,
      Color::White => ComfyColor::White,
      Color::Grey => ComfyColor::Grey,
      Color::Reset => ComfyColor::Reset,
    }
  }
}

impl Colors {
  pub const fn new(enabled: bool, theme: Theme) -> Self {
    let palette = match theme {
      Theme::Dark => DARK,
      Theme::Light => LIGHT,
    };
    Self { enabled, palette }
  }

  const fn pick(&self, color: Color) -> Color {
    if self.enabled { color } else { Color::Reset }
  }

  pub const fn timestamp(&self) -> Color {
    self.pick(self.palette.timestamp)
  }

  pub const fn primary(&self) -> Color {
    self.pick(self.palette.primary)
  }

  pub const fn accent(&self) -> Color {
    self.pick(self.palette.accent)
  }

  pub const fn info(&self) -> Color {
    self.pick(self.palette.info)
  }

  pub const fn success(&self) -> Color {
    self.pick(self.palette.success)
  }

  pub const fn label(&self) -> Color {
    self.pick(self.palette.label)
  }

  pub const fn value(&self) -> Color {
    self.pick(self.palette.value)
  }

  pub const fn warning(&self) -> Color {
    self.pick(self.palette.warning)
  }

  pub const fn error(&self) -> Color {
    self.pick(self.palette.error)
  }

  const fn to_clap(color: Color) -> Option<ClapColor> {
    match color {
      Color::Rgb { r, g, b } => Some(ClapColor::Rgb(RgbColor(r, g, b))),
      Color::AnsiValue(val) => Some(ClapColor::Ansi256(Ansi256Color(val))),
      Color::Black => Some(ClapColor::Ansi(AnsiColor::Black)),
      Color::Blue | Color::DarkBlue => Some(ClapColor::Ansi(AnsiColor::Blue)),
      Color::Cyan | Color::DarkCyan => Some(ClapColor::Ansi(AnsiColor::Cyan)),
      Color::DarkGreen | Color::Green => Some(ClapColor::Ansi(AnsiColor::Green)),
      Color::DarkGrey | Color::Grey => Some(ClapColor::Ansi(AnsiColor::BrightBlack)),
      Color::DarkMagenta | Color::Magenta => Some(ClapColor::Ansi(AnsiColor::Magenta)),
      Color::DarkRed | Color::Red => Some(ClapColor::Ansi(AnsiColor::Red)),
      Color::DarkYellow | Color::Yellow => Some(ClapColor::Ansi(AnsiColor::Yellow)),
      Color::White => Some(ClapColor::Ansi(AnsiColor::White)),
      Color::Reset => None,
    }
  }

  /// Help output styles, always drawn with the dark palette.
  pub const fn clap_styles() -> Styles {
    let colors = Self::new(true, Theme::Dark);

    Styles::styled()
      .header(Style::new().bold().underline().fg_color(Self::to_clap(colors.label())))
      .usage(Style::new().bold().fg_color(Self::to_clap(colors.label())))
      .literal(Style::new().fg_color(Self::to_clap(colors.success())))
      .placeholder(Style::new().fg_color(Self::to_clap(colors.info())))
      .error(Style::new().bold().fg_color(Self::to_clap(colors.error())))
      .valid(Style::new().fg_color(Self::to_clap(colors.success())))
      .invalid(Style::new().bold().fg_color(Self::to_clap(colors.accent())))
  }
}

pub fn colors_enabled(mode: ColorMode) -> bool {
  match mode {
    ColorMode::Always => true,
    ColorMode::Never => false,
    ColorMode::Auto => std::io::stdout().is_terminal(),
  }
}

pub fn detect_theme(mode: ThemeMode) -> Theme {
  match mode {
    ThemeMode::Dark => Theme::Dark,
    ThemeMode::Light => Theme::Light,
    ThemeMode::Auto => theme_from_env(std::env::var("COLORFGBG").ok().as_deref()),
  }
}

/// Reads the background index from a `COLORFGBG` value such as `15;0`.
fn theme_from_env(colorfgbg: Option<&str>) -> Theme {
  colorfgbg
    .and_then(|value| value.split(';').next_back())
    .and_then(|bg| bg.parse::<u8>().ok())
    .map_or(Theme::Dark, |bg| if bg >= 8 { Theme::Light } else { Theme::Dark })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_theme_from_colorfgbg() {
    let cases = [
      (Some("15;0"), Theme::Dark),
      (Some("0;15"), Theme::Light),
      (Some("0;default;15"), Theme::Light),
      (Some("garbage"), Theme::Dark),
      (None, Theme::Dark),
    ];
    for (value, expected) in cases {
      assert_eq!(theme_from_env(value), expected, "COLORFGBG={value:?}");
    }
  }

  #[test]
  fn test_disabled_colors_reset() {
    let colors = Colors::new(false, Theme::Light);
    assert_eq!(colors.primary(), Color::Reset);
    assert_eq!(colors.error(), Color::Reset);
  }
}
