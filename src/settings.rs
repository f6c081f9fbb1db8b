//! `key=value` settings file and the typed settings built on top of it.

use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use crossterm::style::Color;
use log::{debug, info};

use crate::error::SettingsError;

type Result<T> = std::result::Result<T, SettingsError>;

const HEADER: &str = "WARNING! Changing any of these strings manually can break things. \
                      Edit this file only if you know what you are doing.";

pub const DELAY_KEY: &str = "simulation_update_delay";
pub const ALIVE_KEY: &str = "alive_cell_color";
pub const DEAD_KEY: &str = "dead_cell_color";
pub const BORDER_KEY: &str = "cell_border_color";

pub const MIN_DELAY: u64 = 10;
pub const MAX_DELAY: u64 = 500;
pub const DELAY_STEP: u64 = 10;

/// Ordered string store backed by a file.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
    entries: Vec<(String, String)>,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SettingsFile {
            path: path.into(),
            entries: vec![],
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Merges the file contents into the store.
    pub fn read(&mut self) -> Result<()> {
        let s = fs::read_to_string(&self.path).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.parse(&s)
    }

    pub fn parse(&mut self, s: &str) -> Result<()> {
        for (i, line) in s.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else {
                return Err(SettingsError::WrongFormatting { line: i + 1 });
            };
            if line.contains(' ') || key.is_empty() || val.contains('=') {
                return Err(SettingsError::WrongFormatting { line: i + 1 });
            }
            self.set(key, val);
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| SettingsError::NotFound(key.to_string()))
    }

    #[inline]
    pub fn has(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn set(&mut self, key: &str, val: impl ToString) {
        let val = val.to_string();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(e) => e.1 = val,
            None => self.entries.push((key.to_string(), val)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        let i = self
            .entries
            .iter()
            .position(|(k, _)| k == key)
            .ok_or_else(|| SettingsError::NotFound(key.to_string()))?;
        self.entries.remove(i);
        Ok(())
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn render(&self) -> String {
        let mut s = format!("# {HEADER}\n\n");
        for (k, v) in &self.entries {
            let _ = writeln!(s, "{k}={v}");
        }
        s
    }

    pub fn write(&self) -> Result<()> {
        fs::write(&self.path, self.render()).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!("settings written to {}", self.path.display());
        Ok(())
    }
}

/// `#rrggbb` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let c = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb(c(0)?, c(2)?, c(4)?))
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl From<Rgb> for Color {
    #[inline]
    fn from(c: Rgb) -> Self {
        Color::Rgb {
            r: c.0,
            g: c.1,
            b: c.2,
        }
    }
}

/// The settings the front-end reads and persists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Milliseconds between generations while running.
    pub delay: u64,
    pub alive: Rgb,
    pub dead: Rgb,
    pub border: Rgb,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            delay: 50,
            alive: Rgb(0xff, 0xff, 0xff),
            dead: Rgb(0x00, 0x00, 0x00),
            border: Rgb(0x32, 0x32, 0x32),
        }
    }
}

impl Settings {
    /// Reads the settings file if it exists, fills missing keys with the
    /// defaults and writes the result back.
    pub fn load_or_init(path: impl Into<PathBuf>) -> Result<(Self, SettingsFile)> {
        let mut file = SettingsFile::new(path);
        if file.path().is_file() {
            file.read()?;
        } else {
            info!("creating settings file {}", file.path().display());
        }

        let defaults = Settings::default();
        for (key, val) in defaults.entries() {
            if !file.has(key) {
                file.set(key, val);
            }
        }
        file.write()?;

        let settings = Settings::from_file(&file)?;
        Ok((settings, file))
    }

    pub fn from_file(file: &SettingsFile) -> Result<Self> {
        let color = |key: &str| -> Result<Rgb> {
            let v = file.get(key)?;
            Rgb::parse(v).ok_or_else(|| invalid(key, v))
        };

        let raw = file.get(DELAY_KEY)?;
        let delay: u64 = raw.parse().map_err(|_| invalid(DELAY_KEY, raw))?;

        Ok(Settings {
            delay: clamp_delay(delay),
            alive: color(ALIVE_KEY)?,
            dead: color(DEAD_KEY)?,
            border: color(BORDER_KEY)?,
        })
    }

    pub fn entries(&self) -> [(&'static str, String); 4] {
        [
            (DELAY_KEY, self.delay.to_string()),
            (ALIVE_KEY, self.alive.to_string()),
            (DEAD_KEY, self.dead.to_string()),
            (BORDER_KEY, self.border.to_string()),
        ]
    }

    /// Copies every value into `file` and writes it.
    pub fn store(&self, file: &mut SettingsFile) -> Result<()> {
        for (key, val) in self.entries() {
            file.set(key, val);
        }
        file.write()
    }
}

/// Snaps a delay to the 10 ms grid inside `MIN_DELAY..=MAX_DELAY`.
#[inline]
pub fn clamp_delay(ms: u64) -> u64 {
    (ms.clamp(MIN_DELAY, MAX_DELAY) / DELAY_STEP) * DELAY_STEP
}

fn invalid(key: &str, value: &str) -> SettingsError {
    SettingsError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
