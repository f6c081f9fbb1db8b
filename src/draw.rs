use std::io::Write;

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::{proc::Field, settings::Settings};

type Result<T> = std::io::Result<T>;

/// Zoom multiplier applied per zoom step.
pub const ZOOM_FACTOR: f32 = 1.2;
pub const MAX_ZOOM: f32 = 3.0;

#[derive(Debug, PartialEq, Eq, PartialOrd, Clone, Copy)]
pub struct Rect {
    w: u16, // columns
    h: u16, // rows
}

impl Rect {
    #[inline]
    pub fn new(width: u16, height: u16) -> Self {
        Rect { w: width, h: height }
    }

    #[inline]
    pub fn term_size() -> Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Rect { w: width, h: height })
    }

    #[inline]
    pub fn w(&self) -> u16 {
        self.w
    }

    #[inline]
    pub fn h(&self) -> u16 {
        self.h
    }

    /// The area left for the field once the status line is taken off the bottom.
    #[inline]
    pub fn field_area(&self) -> Self {
        Rect::new(self.w, self.h.saturating_sub(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub alive: Color,
    pub dead: Color,
    pub border: Color,
}

impl From<&Settings> for Palette {
    fn from(s: &Settings) -> Self {
        Palette {
            alive: s.alive.into(),
            dead: s.dead.into(),
            border: s.border.into(),
        }
    }
}

/// Which part of the field is on screen and how large each cell is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Number of zoom-in steps taken, the scale is `ZOOM_FACTOR^zoom`.
    zoom: i32,
    offset_x: usize,
    offset_y: usize,
}

impl Viewport {
    #[inline]
    pub fn scale(&self) -> f32 {
        ZOOM_FACTOR.powi(self.zoom)
    }

    #[inline]
    pub fn offset(&self) -> (usize, usize) {
        (self.offset_x, self.offset_y)
    }

    /// Terminal rows per cell.
    #[inline]
    pub fn cell_rows(&self) -> u16 {
        (self.scale().floor() as u16).max(1)
    }

    /// Terminal columns per cell. Glyphs are about twice as tall as wide.
    #[inline]
    pub fn cell_cols(&self) -> u16 {
        self.cell_rows() * 2
    }

    /// Returns false when already at the largest zoom.
    pub fn zoom_in(&mut self) -> bool {
        if ZOOM_FACTOR.powi(self.zoom + 1) < MAX_ZOOM {
            self.zoom += 1;
            true
        } else {
            false
        }
    }

    /// Returns false when already at the smallest zoom.
    pub fn zoom_out(&mut self) -> bool {
        if self.zoom > 0 {
            self.zoom -= 1;
            true
        } else {
            false
        }
    }

    /// Moves the view by whole cells, wrapping around the torus.
    pub fn pan(&mut self, dx: isize, dy: isize, field_size: (usize, usize)) {
        let wrap = |o: usize, d: isize, n: usize| -> usize {
            (o as isize + d).rem_euclid(n as isize) as usize
        };
        self.offset_x = wrap(self.offset_x, dx, field_size.0);
        self.offset_y = wrap(self.offset_y, dy, field_size.1);
    }

    /// How many cells fit on each axis, never more than the field has.
    pub fn visible(&self, field_size: (usize, usize), area: Rect) -> (usize, usize) {
        let cols = (area.w() / self.cell_cols()) as usize;
        let rows = (area.h() / self.cell_rows()) as usize;
        (cols.min(field_size.0), rows.min(field_size.1))
    }

    /// Maps a terminal position to the field cell drawn there.
    pub fn hit_test(
        &self,
        column: u16,
        row: u16,
        field_size: (usize, usize),
        area: Rect,
    ) -> Option<(usize, usize)> {
        let (vx, vy) = self.visible(field_size, area);
        let cx = (column / self.cell_cols()) as usize;
        let cy = (row / self.cell_rows()) as usize;
        if cx >= vx || cy >= vy {
            return None;
        }
        Some((
            (cx + self.offset_x) % field_size.0,
            (cy + self.offset_y) % field_size.1,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

/// A composed screen: one glyph per terminal cell of the area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    area: Rect,
    glyphs: Vec<Glyph>,
}

impl Frame {
    #[inline]
    pub fn area(&self) -> Rect {
        self.area
    }

    #[inline]
    pub fn get(&self, column: u16, row: u16) -> Option<&Glyph> {
        if column >= self.area.w() || row >= self.area.h() {
            return None;
        }
        self.glyphs.get(row as usize * self.area.w() as usize + column as usize)
    }

    pub fn row(&self, row: u16) -> Option<&[Glyph]> {
        if row >= self.area.h() {
            return None;
        }
        let w = self.area.w() as usize;
        let start = row as usize * w;
        self.glyphs.get(start..start + w)
    }
}

/// Lays the visible part of `field` out on `area`.
///
/// Cells are separated by thin border glyphs on their left and top edges once
/// the zoom leaves room for them. With `counts` set each cell wide enough shows
/// its live neighbour count.
pub fn compose(field: &Field, view: &Viewport, area: Rect, palette: &Palette, counts: bool) -> Frame {
    let blank = Glyph {
        ch: ' ',
        fg: palette.border,
        bg: palette.dead,
    };
    let mut glyphs = vec![blank; area.w() as usize * area.h() as usize];

    let (cols, rows) = (view.cell_cols(), view.cell_rows());
    let (vx, vy) = view.visible(field.size(), area);
    let (ox, oy) = view.offset();

    for cy in 0..vy {
        for cx in 0..vx {
            let x = (cx + ox) % field.size_x();
            let y = (cy + oy) % field.size_y();
            let cell = &field.rows()[y][x];
            let bg = if cell.is_alive() {
                palette.alive
            } else {
                palette.dead
            };

            let label = if counts {
                field
                    .alive_neighbor_count(x, y)
                    .ok()
                    .and_then(|n| char::from_digit(n.into(), 10))
            } else {
                None
            };

            for dr in 0..rows {
                for dc in 0..cols {
                    let mut g = Glyph {
                        ch: cell_glyph(dr, dc, rows, cols),
                        fg: palette.border,
                        bg,
                    };
                    if let Some(d) = label {
                        if dr == rows / 2 && dc == cols - 1 {
                            g.ch = d;
                            g.fg = if cell.is_alive() {
                                palette.dead
                            } else {
                                palette.alive
                            };
                        }
                    }
                    let col = cx * cols as usize + dc as usize;
                    let row = cy * rows as usize + dr as usize;
                    glyphs[row * area.w() as usize + col] = g;
                }
            }
        }
    }

    Frame { area, glyphs }
}

/// Border glyph for position `(dr, dc)` inside a cell of `rows` by `cols`.
fn cell_glyph(dr: u16, dc: u16, rows: u16, cols: u16) -> char {
    let left = dc == 0 && cols > 1;
    let top = dr == 0 && rows > 1;
    match (left, top) {
        (true, true) => '▛',
        (true, false) => '▏',
        (false, true) => '▔',
        (false, false) => ' ',
    }
}

/// Queues the frame and a status line below it.
pub fn paint(out: &mut impl Write, frame: &Frame, status: &str) -> Result<()> {
    let area = frame.area();
    for row in 0..area.h() {
        queue!(out, MoveTo(0, row))?;

        let mut last: Option<(Color, Color)> = None;
        let mut run = String::new();
        for g in frame.row(row).unwrap_or_default() {
            if last != Some((g.fg, g.bg)) {
                if let Some((fg, bg)) = last {
                    queue!(out, SetForegroundColor(fg), SetBackgroundColor(bg), Print(&run))?;
                    run.clear();
                }
                last = Some((g.fg, g.bg));
            }
            run.push(g.ch);
        }
        if let Some((fg, bg)) = last {
            queue!(out, SetForegroundColor(fg), SetBackgroundColor(bg), Print(&run))?;
        }
    }

    queue!(
        out,
        ResetColor,
        MoveTo(0, area.h()),
        Clear(ClearType::CurrentLine),
        Print(status)
    )?;
    out.flush()
}
