use std::io::IsTerminal;

use clap::builder::styling::{Ansi256Color, AnsiColor, Color as ClapColor, RgbColor, Style, Styles};
use comfy_table::Color as ComfyColor;
use crossterm::style::Color;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ColorMode {
  Always,
  Auto,
  Never,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
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

/// Foreground colors for each kind of output text.
#[derive(Debug, Clone, Copy)]
struct Palette {
  timestamp: Color,
  primary: Color,
  accent: Color,
  label: Color,
  value: Color,
  success: Color,
}

const DARK: Palette = Palette {
  timestamp: Color::Rgb { r: 118, g: 166, b: 166 },
  primary: Color::Rgb { r: 191, g: 126, b: 4 },
  accent: Color::Rgb { r: 166, g: 84, b: 55 },
  label: Color::Rgb { r: 217, g: 164, b: 4 },
  value: Color::Rgb { r: 242, g: 211, b: 56 },
  success: Color::Rgb { r: 118, g: 166, b: 166 },
};

const LIGHT: Palette = Palette {
  timestamp: Color::Rgb { r: 92, g: 62, b: 38 },
  primary: Color::Rgb { r: 70, g: 42, b: 25 },
  accent: Color::Rgb { r: 211, g: 99, b: 70 },
  label: Color::Rgb { r: 176, g: 103, b: 66 },
  value: Color::Rgb { r: 199, g: 146, b: 76 },
  success: Color::Rgb { r: 34, g: 142, b: 90 },
};

#[derive(Debug, Clone, Copy)]
pub struct Colors {
  palette: Option<Palette>,
}

pub trait IntoComfyColor {
  fn into(self) -> ComfyColor;
}

impl IntoComfyColor for Color {
  fn into(self) -> ComfyColor {
    match self {
      Color::Reset => ComfyColor::Reset,
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
      Color::Rgb { r, g, b } => ComfyColor::Rgb { r, g, b },
      Color::AnsiValue(val) => ComfyColor::AnsiValue(val),
    }
  }
}

macro_rules! palette_accessors {
  ($($name:ident),* $(,)?) => {
    $(
      pub const fn $name(&self) -> Color {
        match &self.palette {
          Some(palette) => palette.$name,
          None => Color::Reset,
        }
      }
    )*
  };
}

impl Colors {
  pub const fn new(enabled: bool, theme: Theme) -> Self {
    let palette = match theme {
      Theme::Dark => DARK,
      Theme::Light => LIGHT,
    };
    Self {
      palette: if enabled { Some(palette) } else { None },
    }
  }

  palette_accessors!(timestamp, primary, accent, label, value, success);

  const fn clap(color: Color) -> Option<ClapColor> {
    match color {
      Color::Rgb { r, g, b } => Some(ClapColor::Rgb(RgbColor(r, g, b))),
      Color::AnsiValue(val) => Some(ClapColor::Ansi256(Ansi256Color(val))),
      Color::Red | Color::DarkRed => Some(ClapColor::Ansi(AnsiColor::Red)),
      Color::Reset => None,
      _ => Some(ClapColor::Ansi(AnsiColor::White)),
    }
  }

  /// Help output styling, always in the dark palette.
  pub const fn clap_styles() -> Styles {
    let colors = Self::new(true, Theme::Dark);

    Styles::styled()
      .header(Style::new().bold().underline().fg_color(Self::clap(colors.label())))
      .usage(Style::new().bold().fg_color(Self::clap(colors.label())))
      .literal(Style::new().fg_color(Self::clap(colors.success())))
      .placeholder(Style::new().fg_color(Self::clap(colors.timestamp())))
      .error(Style::new().bold().fg_color(Self::clap(colors.accent())))
      .valid(Style::new().fg_color(Self::clap(colors.success())))
      .invalid(Style::new().bold().fg_color(Self::clap(colors.accent())))
  }
}

pub fn colors_enabled(mode: ColorMode) -> bool {
  match mode {
    ColorMode::Always => true,
    ColorMode::Never => false,
    ColorMode::Auto => std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
  }
}

pub fn detect_theme(mode: ThemeMode) -> Theme {
  match mode {
    ThemeMode::Dark => Theme::Dark,
    ThemeMode::Light => Theme::Light,
    ThemeMode::Auto => theme_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref()),
  }
}

/// Reads the background slot of `COLORFGBG` (`"15;0"`); 8 and above are
/// light backgrounds.
fn theme_from_colorfgbg(value: Option<&str>) -> Theme {
  match value
    .and_then(|value| value.split(';').next_back())
    .and_then(|bg| bg.parse::<u8>().ok())
  {
    Some(bg) if bg >= 8 => Theme::Light,
    _ => Theme::Dark,
  }
}
