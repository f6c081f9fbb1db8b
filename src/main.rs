use torus_life::{
    app::{self, App},
    proc::Field,
    save,
    session::Session,
    settings::Settings,
};

use clap::Parser;
use log::info;
use std::{
    fs::File,
    io::{stdin, Read},
    path::PathBuf,
};

#[derive(Parser)]
#[command(name = "torus_life")]
#[command(version)]
#[command(about = "Conway's Game of Life on a toroidal field, in the terminal")]
struct Cli {
    /// Field width in cells
    #[arg(long, default_value_t = 100)]
    width: usize,

    /// Field height in cells
    #[arg(long, default_value_t = 100)]
    height: usize,

    /// Start from a save file instead of an empty field ("-" reads stdin)
    #[arg(short, long)]
    load: Option<PathBuf>,

    /// File the `w` and `l` keys save to and load from
    #[arg(short, long, default_value = "field.txt")]
    save_path: PathBuf,

    /// Settings file, created with defaults on first launch
    #[arg(long, default_value = "settings.txt")]
    settings: PathBuf,

    /// Write log output to this file
    #[arg(long)]
    log: Option<PathBuf>,

    /// Run this many generations without a terminal UI and print the result
    #[arg(long)]
    headless: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if let Some(mut builder) = logger(&cli)? {
        builder.init();
    }

    let field = match &cli.load {
        Some(p) if p.as_os_str() == "-" => save::decode(&readall()?)?,
        Some(p) => save::load(p)?,
        None => Field::new(cli.width, cli.height)?,
    };
    info!("field {}x{}", field.size_x(), field.size_y());

    if let Some(n) = cli.headless {
        let mut s = Session::new(field, 0);
        for _ in 0..n {
            s.tick();
        }
        println!("{}", save::encode(s.field()));
        return Ok(());
    }

    let (settings, file) = Settings::load_or_init(&cli.settings)?;
    let session = Session::new(field, settings.delay);
    let a = App::new(session, settings, cli.save_path).with_settings_file(file);
    app::run(a)?;
    Ok(())
}

/// Log lines would garble the alternate screen, so the interactive UI gets no
/// logger at all unless `--log` names a file. `RUST_LOG` alone cannot turn
/// stderr output back on.
fn logger(cli: &Cli) -> std::io::Result<Option<env_logger::Builder>> {
    if cli.log.is_none() && cli.headless.is_none() {
        return Ok(None);
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(path) = &cli.log {
        builder.target(env_logger::Target::Pipe(Box::new(File::create(path)?)));
    }
    Ok(Some(builder))
}

fn readall() -> std::io::Result<String> {
    let mut s = String::new();
    stdin().read_to_string(&mut s)?;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interactive_without_log_file_has_no_logger() {
        let cli = Cli::parse_from(["torus_life", "--width", "3", "--height", "3"]);
        assert!(logger(&cli).unwrap().is_none());
    }

    #[test]
    fn headless_and_log_file_get_a_logger() {
        let cli = Cli::parse_from(["torus_life", "--headless", "2"]);
        assert!(logger(&cli).unwrap().is_some());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let cli = Cli::parse_from(["torus_life", "--log", path.to_str().unwrap()]);
        assert!(logger(&cli).unwrap().is_some());
        assert!(path.is_file());
    }
}
