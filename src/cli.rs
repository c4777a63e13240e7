use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::core::engine::{EngineConfig, DEFAULT_FPS, DEFAULT_TPS};
use crate::display::{DEFAULT_HEIGHT, DEFAULT_TITLE, DEFAULT_WIDTH};
use crate::logging::{LogConfig, DEFAULT_LOG_FILE};

/// Settings for the demo binary, read from the command line.
#[derive(Debug, Clone)]
pub struct DemoOptions {
    pub engine: EngineConfig,
    /// Font used for the debug overlay and scene text.
    pub font: Option<PathBuf>,
    pub log: LogConfig,
}

fn parse_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|_| format!("`{}` is not a number", s))?;
    if rate > 0.0 && rate.is_finite() {
        Ok(rate)
    } else {
        Err(format!("rate must be positive, got {}", rate))
    }
}

pub fn create_clap_command() -> Command {
    Command::new("simple2d")
        .about("Minimal 2D game framework demo")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("tps")
                .long("tps")
                .value_name("HZ")
                .help("Target update ticks per second")
                .default_value("60")
                .value_parser(parse_rate),
        )
        .arg(
            Arg::new("fps")
                .long("fps")
                .value_name("HZ")
                .help("Target frames per second")
                .default_value("60")
                .value_parser(parse_rate),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Draw the TPS/FPS overlay")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_name("PIXELS")
                .default_value("800")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_name("PIXELS")
                .default_value("600")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("title")
                .short('t')
                .long("title")
                .default_value(DEFAULT_TITLE),
        )
        .arg(
            Arg::new("font")
                .short('f')
                .long("font")
                .value_name("FILE")
                .help("TrueType/OpenType font for text and the debug overlay")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("resizable")
                .long("resizable")
                .help("Let the user resize the window")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("FILE")
                .default_value(DEFAULT_LOG_FILE)
                .value_parser(value_parser!(PathBuf)),
        )
}

pub fn handle_clap_matches(matches: &ArgMatches) -> DemoOptions {
    let tps = matches.get_one::<f64>("tps").copied().unwrap_or(DEFAULT_TPS);
    let fps = matches.get_one::<f64>("fps").copied().unwrap_or(DEFAULT_FPS);
    let width = matches
        .get_one::<usize>("width")
        .copied()
        .unwrap_or(DEFAULT_WIDTH);
    let height = matches
        .get_one::<usize>("height")
        .copied()
        .unwrap_or(DEFAULT_HEIGHT);
    let title = matches
        .get_one::<String>("title")
        .cloned()
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let engine = EngineConfig::new()
        .with_tps(tps)
        .with_fps(fps)
        .with_debug_overlay(matches.get_flag("debug"))
        .with_title(title)
        .with_size(width, height)
        .with_resizable(matches.get_flag("resizable"));

    let log = LogConfig::default().with_file(matches.get_one::<PathBuf>("log-file").cloned());

    DemoOptions {
        engine,
        font: matches.get_one::<PathBuf>("font").cloned(),
        log,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> DemoOptions {
        let matches = create_clap_command()
            .try_get_matches_from(std::iter::once("simple2d").chain(args.iter().copied()))
            .unwrap();
        handle_clap_matches(&matches)
    }

    #[test]
    fn defaults_match_engine_defaults() {
        let options = parse(&[]);
        assert_eq!(options.engine.target_tps, 60.0);
        assert_eq!(options.engine.target_fps, 60.0);
        assert!(!options.engine.debug_overlay);
        assert_eq!(options.engine.window.title, "simple2d");
        assert_eq!((options.engine.window.width, options.engine.window.height), (800, 600));
        assert!(!options.engine.window.resizable);
        assert!(options.font.is_none());
        assert_eq!(options.log.file, Some(PathBuf::from("game.log")));
    }

    #[test]
    fn flags_are_applied() {
        let options = parse(&[
            "--tps", "120", "--fps", "30", "--debug", "--width", "640", "--height", "480",
            "--title", "demo", "--resizable", "--font", "mono.ttf",
        ]);
        assert_eq!(options.engine.target_tps, 120.0);
        assert_eq!(options.engine.target_fps, 30.0);
        assert!(options.engine.debug_overlay);
        assert_eq!(options.engine.window.title, "demo");
        assert_eq!((options.engine.window.width, options.engine.window.height), (640, 480));
        assert!(options.engine.window.resizable);
        assert_eq!(options.font, Some(PathBuf::from("mono.ttf")));
    }

    #[test]
    fn non_positive_rates_are_rejected() {
        assert!(create_clap_command()
            .try_get_matches_from(["simple2d", "--tps", "0"])
            .is_err());
        assert!(create_clap_command()
            .try_get_matches_from(["simple2d", "--fps", "-5"])
            .is_err());
    }
}
