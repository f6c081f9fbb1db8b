use std::{
    any::Any,
    io::{stdout, Write},
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, RecvTimeoutError},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use crossterm::{
    cursor::{Hide, Show},
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, MouseButton, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{
        self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
        SetTitle,
    },
};
use log::{error, info, warn};

use crate::{
    draw::{self, Palette, Rect, Viewport},
    error::Result,
    input::{Command, Stroke},
    save,
    session::Session,
    settings::{Rgb, Settings, SettingsFile},
};

const POLL: Duration = Duration::from_millis(150);

/// Colors the `1`/`2`/`3` keys cycle through.
const PRESETS: [Rgb; 8] = [
    Rgb(0xff, 0xff, 0xff),
    Rgb(0x00, 0x00, 0x00),
    Rgb(0x32, 0x32, 0x32),
    Rgb(0x4c, 0xaf, 0x50),
    Rgb(0xe5, 0x39, 0x35),
    Rgb(0x1e, 0x88, 0xe5),
    Rgb(0xfd, 0xd8, 0x35),
    Rgb(0x00, 0xac, 0xc1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Redraw,
    Exit,
}

pub struct App {
    session: Session,
    settings: Settings,
    settings_file: Option<SettingsFile>,
    save_path: PathBuf,
    view: Viewport,
    stroke: Stroke,
    counts: bool,
    message: Option<String>,
}

impl App {
    pub fn new(session: Session, settings: Settings, save_path: PathBuf) -> Self {
        App {
            session,
            settings,
            settings_file: None,
            save_path,
            view: Viewport::default(),
            stroke: Stroke::default(),
            counts: false,
            message: None,
        }
    }

    /// Persist setting changes made from the keyboard into `file`.
    pub fn with_settings_file(mut self, file: SettingsFile) -> Self {
        self.settings_file = Some(file);
        self
    }

    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[inline]
    pub fn view(&self) -> &Viewport {
        &self.view
    }

    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn status(&self) -> String {
        let s = &self.session;
        let (w, h) = s.field().size();
        let mut line = format!(
            " {} | gen {} | delay {} ms | alive {} | {}x{} | zoom x{:.2} (cell {}x{})",
            s.state(),
            s.generation(),
            s.delay_ms(),
            s.field().population(),
            w,
            h,
            self.view.scale(),
            self.view.cell_cols(),
            self.view.cell_rows(),
        );
        if let Some(m) = &self.message {
            line.push_str(" | ");
            line.push_str(m);
        }
        line
    }

    pub fn command(&mut self, c: Command) -> Flow {
        self.message = None;
        match c {
            Command::Quit => return Flow::Exit,
            Command::ToggleRun => {
                self.stroke.release();
                self.session.toggle_run();
            }
            Command::Step => {
                if !self.session.step_once() {
                    return Flow::Continue;
                }
            }
            Command::Reset => {
                self.stroke.release();
                self.session.reset();
            }
            Command::Slower => {
                self.session.slower();
                self.settings.delay = self.session.delay_ms();
                self.persist();
            }
            Command::Faster => {
                self.session.faster();
                self.settings.delay = self.session.delay_ms();
                self.persist();
            }
            Command::ZoomIn => {
                if !self.view.zoom_in() {
                    return Flow::Continue;
                }
            }
            Command::ZoomOut => {
                if !self.view.zoom_out() {
                    return Flow::Continue;
                }
            }
            Command::Pan(dx, dy) => self.view.pan(dx, dy, self.session.field().size()),
            Command::Save => match save::save(&self.save_path, self.session.field()) {
                Ok(()) => self.message = Some(format!("saved {}", self.save_path.display())),
                Err(e) => {
                    warn!("{e}");
                    self.message = Some(e.to_string());
                }
            },
            Command::Load => match save::load(&self.save_path) {
                Ok(f) => {
                    self.stroke.release();
                    self.session.replace(f);
                    self.view = Viewport::default();
                    self.message = Some(format!("loaded {}", self.save_path.display()));
                }
                Err(e) => {
                    warn!("{e}");
                    self.message = Some(e.to_string());
                }
            },
            Command::CycleAlive => {
                self.settings.alive = next_preset(self.settings.alive);
                self.persist();
            }
            Command::CycleDead => {
                self.settings.dead = next_preset(self.settings.dead);
                self.persist();
            }
            Command::CycleBorder => {
                self.settings.border = next_preset(self.settings.border);
                self.persist();
            }
            Command::ToggleCounts => self.counts = !self.counts,
        }
        Flow::Redraw
    }

    /// Painting with the left button. `area` is the region the field is drawn in.
    pub fn mouse(&mut self, m: &MouseEvent, area: Rect) -> Flow {
        let size = self.session.field().size();
        let hit = self.view.hit_test(m.column, m.row, size, area);

        match m.kind {
            MouseEventKind::Up(MouseButton::Left) => {
                self.stroke.release();
                Flow::Continue
            }
            MouseEventKind::Down(MouseButton::Left) => {
                let (Some((x, y)), Some(field)) = (hit, self.session.field_mut()) else {
                    return Flow::Continue;
                };
                match self.stroke.press(field, x, y) {
                    Ok(_) => Flow::Redraw,
                    Err(e) => {
                        error!("{e}");
                        Flow::Continue
                    }
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let (Some((x, y)), Some(field)) = (hit, self.session.field_mut()) else {
                    return Flow::Continue;
                };
                match self.stroke.drag(field, x, y) {
                    Ok(true) => Flow::Redraw,
                    Ok(false) => Flow::Continue,
                    Err(e) => {
                        error!("{e}");
                        Flow::Continue
                    }
                }
            }
            _ => Flow::Continue,
        }
    }

    fn persist(&mut self) {
        let Some(file) = self.settings_file.as_mut() else {
            return;
        };
        if let Err(e) = self.settings.store(file) {
            warn!("{e}");
            self.message = Some(e.to_string());
        }
    }

    fn redraw(&self, out: &mut impl Write) -> std::io::Result<()> {
        let area = Rect::term_size()?.field_area();
        let palette = Palette::from(&self.settings);
        let frame = draw::compose(self.session.field(), &self.view, area, &palette, self.counts);
        draw::paint(out, &frame, &self.status())
    }
}

fn next_preset(current: Rgb) -> Rgb {
    let i = PRESETS.iter().position(|c| *c == current).map_or(0, |i| i + 1);
    PRESETS[i % PRESETS.len()]
}

pub fn run(a: App) -> Result<()> {
    runup(&mut stdout(), enable_raw_mode)?;
    let d = event_loop(a);
    shutdown()?;
    d?;
    Ok(())
}

/// Switches the terminal into full-screen mode. Whatever was switched on is
/// switched back off if a later step fails.
fn runup(out: &mut impl Write, raw_mode: impl FnOnce() -> std::io::Result<()>) -> Result<()> {
    let r = enter(out, raw_mode);
    if r.is_err() {
        let _ = leave(out);
        let _ = disable_raw_mode();
    }
    r
}

fn enter(out: &mut impl Write, raw_mode: impl FnOnce() -> std::io::Result<()>) -> Result<()> {
    execute!(
        out,
        EnterAlternateScreen,
        SetTitle("Life on a torus"),
        Hide,
        EnableMouseCapture
    )?;
    raw_mode()?;
    execute!(out, terminal::Clear(terminal::ClearType::All))?;
    Ok(())
}

fn leave(out: &mut impl Write) -> std::io::Result<()> {
    execute!(out, DisableMouseCapture, LeaveAlternateScreen, Show)
}

fn shutdown() -> Result<()> {
    leave(&mut stdout())?;
    disable_raw_mode()?;
    Ok(())
}

fn panic_message(e: &(dyn Any + Send)) -> &str {
    if let Some(s) = e.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = e.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

fn event_loop(mut a: App) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let should_exit = Arc::new(AtomicBool::new(false));

    let exit_keys = Arc::clone(&should_exit);
    let keys = thread::Builder::new()
        .name("Terminal input".into())
        .spawn(move || {
            while !exit_keys.load(Ordering::Relaxed) {
                let ev = match event::poll(POLL) {
                    Ok(true) => event::read(),
                    Ok(false) => continue,
                    Err(e) => Err(e),
                };
                match ev {
                    Ok(ev) => {
                        if tx.send(ev).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("terminal input failed: {e}");
                        break;
                    }
                }
            }
        })?;

    info!("terminal session started");
    let mut out = stdout();
    a.redraw(&mut out)?;
    let mut next_tick = Instant::now() + a.session.delay();

    let result = loop {
        let timeout = if a.session.is_running() {
            next_tick.saturating_duration_since(Instant::now())
        } else {
            POLL
        };

        let mut flow = match rx.recv_timeout(timeout) {
            Ok(Event::Key(key)) => match Command::from_key(&key) {
                Some(c) => {
                    let f = a.command(c);
                    if c == Command::ToggleRun {
                        next_tick = Instant::now() + a.session.delay();
                    }
                    f
                }
                None => Flow::Continue,
            },
            Ok(Event::Mouse(m)) => match Rect::term_size() {
                Ok(area) => a.mouse(&m, area.field_area()),
                Err(e) => break Err(e.into()),
            },
            Ok(Event::Resize(..)) => Flow::Redraw,
            Ok(_) => Flow::Continue,
            Err(RecvTimeoutError::Timeout) => Flow::Continue,
            Err(RecvTimeoutError::Disconnected) => Flow::Exit,
        };

        if flow == Flow::Exit {
            break Ok(());
        }

        if a.session.is_running() && Instant::now() >= next_tick {
            a.session.tick();
            next_tick = Instant::now() + a.session.delay();
            flow = Flow::Redraw;
        }

        if flow == Flow::Redraw {
            if let Err(e) = a.redraw(&mut out) {
                break Err(e.into());
            }
        }
    };

    should_exit.store(true, Ordering::Relaxed);
    if let Err(e) = keys.join() {
        error!("terminal input thread panicked: {}", panic_message(e.as_ref()));
    }
    info!(
        "terminal session ended at generation {}",
        a.session.generation()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proc::{CellState, Field};
    use crossterm::event::KeyModifiers;

    fn app(save_path: PathBuf) -> App {
        let session = Session::new(Field::new(10, 10).unwrap(), 50);
        App::new(session, Settings::default(), save_path)
    }

    fn click(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn painting_follows_the_mouse() {
        let mut a = app(PathBuf::from("unused"));
        let area = Rect::new(80, 23);

        assert_eq!(
            a.mouse(&click(MouseEventKind::Down(MouseButton::Left), 2, 1), area),
            Flow::Redraw
        );
        a.mouse(&click(MouseEventKind::Drag(MouseButton::Left), 4, 1), area);
        a.mouse(&click(MouseEventKind::Up(MouseButton::Left), 4, 1), area);
        // not pressed anymore
        a.mouse(&click(MouseEventKind::Drag(MouseButton::Left), 6, 1), area);

        assert_eq!(a.session().field().alive_cells(), vec![(1, 1), (2, 1)]);
    }

    #[test]
    fn painting_is_ignored_while_running() {
        let mut a = app(PathBuf::from("unused"));
        a.command(Command::ToggleRun);
        let area = Rect::new(80, 23);
        assert_eq!(
            a.mouse(&click(MouseEventKind::Down(MouseButton::Left), 0, 0), area),
            Flow::Continue
        );
        assert_eq!(a.session().field().population(), 0);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(dir.path().join("field.txt"));

        let area = Rect::new(80, 23);
        a.mouse(&click(MouseEventKind::Down(MouseButton::Left), 0, 0), area);
        assert_eq!(a.command(Command::Save), Flow::Redraw);
        assert!(a.message().unwrap().starts_with("saved"));

        a.command(Command::Reset);
        assert_eq!(a.session().field().population(), 0);

        a.command(Command::Load);
        assert_eq!(
            a.session().field().state(0, 0).unwrap(),
            CellState::Alive
        );
    }

    #[test]
    fn failed_load_keeps_field() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = app(dir.path().join("missing.txt"));
        a.command(Command::Load);
        assert!(a.message().is_some());
        assert_eq!(a.session().field().size(), (10, 10));
    }

    #[test]
    fn speed_and_colors_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let (settings, file) = Settings::load_or_init(dir.path().join("settings.txt")).unwrap();
        let session = Session::new(Field::new(3, 3).unwrap(), settings.delay);
        let mut a = App::new(session, settings, dir.path().join("f.txt")).with_settings_file(file);

        a.command(Command::Slower);
        a.command(Command::CycleAlive);
        assert_eq!(a.settings().delay, 60);
        // white is the first preset, so the next one is black
        assert_eq!(a.settings().alive, Rgb(0, 0, 0));

        let (reread, _) = Settings::load_or_init(dir.path().join("settings.txt")).unwrap();
        assert_eq!(&reread, a.settings());
    }

    #[test]
    fn step_is_refused_while_running() {
        let mut a = app(PathBuf::from("unused"));
        a.command(Command::ToggleRun);
        assert_eq!(a.command(Command::Step), Flow::Continue);
        assert_eq!(a.session().generation(), 0);
        assert!(a.status().contains("RUNNING"));
        assert_eq!(a.command(Command::Quit), Flow::Exit);
    }

    #[test]
    fn zoom_and_pan() {
        let mut a = app(PathBuf::from("unused"));
        assert_eq!(a.command(Command::ZoomOut), Flow::Continue);
        assert_eq!(a.command(Command::ZoomIn), Flow::Redraw);
        a.command(Command::Pan(-1, 0));
        assert_eq!(a.view().offset(), (9, 0));
    }

    #[test]
    fn status_shows_drawn_cell_size() {
        let mut a = app(PathBuf::from("unused"));
        assert!(a.status().contains("zoom x1.00 (cell 2x1)"));
        for _ in 0..3 {
            a.command(Command::ZoomIn);
        }
        // cells only grow once the scale passes a whole number
        assert!(a.status().contains("zoom x1.73 (cell 2x1)"));
        a.command(Command::ZoomIn);
        assert!(a.status().contains("zoom x2.07 (cell 4x2)"));
    }

    #[test]
    fn failed_raw_mode_restores_the_screen() {
        let mut out: Vec<u8> = vec![];
        let r = runup(&mut out, || {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "not a tty"))
        });
        assert!(r.is_err());

        let s = String::from_utf8(out).unwrap();
        let entered = s.find("\x1b[?1049h").unwrap();
        let left = s.find("\x1b[?1049l").unwrap();
        assert!(entered < left);
        assert!(s.contains("\x1b[?25h"));
        assert!(s.contains("\x1b[?1000l"));
    }

    #[test]
    fn runup_leaves_screen_alone_on_success() {
        let mut out: Vec<u8> = vec![];
        runup(&mut out, || Ok(())).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("\x1b[?1049h"));
        assert!(!s.contains("\x1b[?1049l"));
    }

    #[test]
    fn panics_in_threads_are_readable() {
        let h = thread::spawn(|| panic!("input gone"));
        let e = h.join().unwrap_err();
        assert_eq!(panic_message(e.as_ref()), "input gone");

        let h = thread::spawn(|| std::panic::panic_any(7u8));
        let e = h.join().unwrap_err();
        assert_eq!(panic_message(e.as_ref()), "unknown panic");
    }
}
