use std::fmt;
use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dark" => Ok(ThemeMode::Dark),
            "light" => Ok(ThemeMode::Light),
            other => Err(format!("unknown theme {other:?}, expected \"dark\" or \"light\"")),
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeMode::Dark => f.write_str("Dark"),
            ThemeMode::Light => f.write_str("Light"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub base: Style,
    pub today: Style,
    pub selected: Style,
    pub header: Style,
    pub dim: Style,
    pub border: Style,
    pub status: Style,
    pub highlight: Style,
    pub accent: Style,
    pub error: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "dark".to_string(),
            base: Style::default(),
            today: Style::default().fg(Color::Black).bg(Color::Yellow),
            selected: Style::default().fg(Color::Black).bg(Color::Cyan),
            header: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::DarkGray),
            border: Style::default().fg(Color::Gray),
            status: Style::default().fg(Color::White).bg(Color::DarkGray),
            highlight: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            accent: Style::default().fg(Color::Green),
            error: Style::default().fg(Color::LightRed),
        }
    }
}

impl Theme {
    /// Palette for `mode`. Dark mode may use a named preset.
    pub fn for_mode(mode: ThemeMode, dark_preset: Option<&str>) -> Self {
        match mode {
            ThemeMode::Light => Self::light(),
            ThemeMode::Dark => dark_preset.map(Self::preset).unwrap_or_default(),
        }
    }

    /// Get a built-in dark preset by name.
    pub fn preset(name: &str) -> Self {
        match name {
            "dracula" => Self::dracula(),
            "gruvbox" => Self::gruvbox(),
            "nord" => Self::nord(),
            _ => Self::default(),
        }
    }

    fn light() -> Self {
        let paper = Color::Rgb(250, 250, 250);
        let ink = Color::Rgb(40, 42, 54);
        Self {
            name: "light".to_string(),
            base: Style::default().fg(ink).bg(paper),
            today: Style::default().fg(ink).bg(Color::Rgb(255, 214, 102)),
            selected: Style::default().fg(paper).bg(Color::Rgb(55, 136, 216)), // event blue
            header: Style::default().fg(ink).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(130, 130, 140)),
            border: Style::default().fg(Color::Rgb(180, 180, 190)),
            status: Style::default().fg(ink).bg(Color::Rgb(225, 225, 232)),
            highlight: Style::default()
                .bg(Color::Rgb(225, 225, 232))
                .add_modifier(Modifier::BOLD),
            accent: Style::default().fg(Color::Rgb(30, 130, 76)),
            error: Style::default().fg(Color::Rgb(192, 57, 43)),
        }
    }

    fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            base: Style::default(),
            today: Style::default().fg(Color::Black).bg(Color::Rgb(189, 147, 249)), // purple
            selected: Style::default().fg(Color::Black).bg(Color::Rgb(139, 233, 253)), // cyan
            header: Style::default().fg(Color::Rgb(248, 248, 242)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(98, 114, 164)),
            border: Style::default().fg(Color::Rgb(68, 71, 90)),
            status: Style::default()
                .fg(Color::Rgb(248, 248, 242))
                .bg(Color::Rgb(68, 71, 90)),
            highlight: Style::default()
                .bg(Color::Rgb(68, 71, 90))
                .add_modifier(Modifier::BOLD),
            accent: Style::default().fg(Color::Rgb(80, 250, 123)),
            error: Style::default().fg(Color::Rgb(255, 85, 85)),
        }
    }

    fn gruvbox() -> Self {
        Self {
            name: "gruvbox".to_string(),
            base: Style::default(),
            today: Style::default().fg(Color::Black).bg(Color::Rgb(250, 189, 47)), // yellow
            selected: Style::default().fg(Color::Black).bg(Color::Rgb(131, 165, 152)), // aqua
            header: Style::default().fg(Color::Rgb(235, 219, 178)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(146, 131, 116)),
            border: Style::default().fg(Color::Rgb(102, 92, 84)),
            status: Style::default()
                .fg(Color::Rgb(235, 219, 178))
                .bg(Color::Rgb(80, 73, 69)),
            highlight: Style::default()
                .bg(Color::Rgb(80, 73, 69))
                .add_modifier(Modifier::BOLD),
            accent: Style::default().fg(Color::Rgb(184, 187, 38)),
            error: Style::default().fg(Color::Rgb(251, 73, 52)),
        }
    }

    fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            base: Style::default(),
            today: Style::default().fg(Color::Black).bg(Color::Rgb(235, 203, 139)), // yellow
            selected: Style::default().fg(Color::Black).bg(Color::Rgb(136, 192, 208)), // frost
            header: Style::default().fg(Color::Rgb(229, 233, 240)).add_modifier(Modifier::BOLD),
            dim: Style::default().fg(Color::Rgb(76, 86, 106)),
            border: Style::default().fg(Color::Rgb(67, 76, 94)),
            status: Style::default()
                .fg(Color::Rgb(229, 233, 240))
                .bg(Color::Rgb(67, 76, 94)),
            highlight: Style::default()
                .bg(Color::Rgb(67, 76, 94))
                .add_modifier(Modifier::BOLD),
            accent: Style::default().fg(Color::Rgb(163, 190, 140)),
            error: Style::default().fg(Color::Rgb(191, 97, 106)),
        }
    }

    /// Today's cell when it is also the selected one.
    pub fn today_selected(&self) -> Style {
        self.today.add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    }
}
