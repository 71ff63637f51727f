//! Interactive command shell
//!
//! Lines starting with `.` are commands; anything else is an equation to
//! graph. A new graph replaces the one playing.

mod commands;

use crate::config::{AudiographConfig, GraphSettings};
use crate::engine::Sonifier;
use crate::expr::Expression;
use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Samples used to look for gaps in a function before playing it
const COVERAGE_SAMPLES: usize = 512;

pub const PROMPT: &str = "y = ";

pub const WELCOME: &str = "Welcome to audiograph.

Enter equations on a line by themselves to hear them graphed. Commands start with \".\". For a list of commands, type .help.

Type .quit to quit.";

/// Where graphs entered at the prompt are played
pub trait Output {
    fn start(&mut self, sonifier: &mut Sonifier) -> Result<()>;
}

/// Plays on the default sound card
#[derive(Debug, Default)]
pub struct DeviceOutput;

impl Output for DeviceOutput {
    fn start(&mut self, sonifier: &mut Sonifier) -> Result<()> {
        sonifier.to_device()
    }
}

/// The interactive session: settings plus the graph currently playing
pub struct Shell {
    config: AudiographConfig,
    output: Box<dyn Output>,
    current: Option<Sonifier>,
    last: Option<Expression>,
    running: bool,
}

impl Shell {
    pub fn new(config: AudiographConfig, output: Box<dyn Output>) -> Self {
        Self {
            config,
            output,
            current: None,
            last: None,
            running: true,
        }
    }

    pub fn config(&self) -> &AudiographConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn last_expression(&self) -> Option<&Expression> {
        self.last.as_ref()
    }

    /// The graph playing or most recently played, if not stopped
    pub fn current(&self) -> Option<&Sonifier> {
        self.current.as_ref()
    }

    /// Read and handle lines until `.quit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        writeln!(out, "{}", WELCOME)?;
        let mut lines = input.lines();
        while self.running {
            write!(out, "{}", PROMPT)?;
            out.flush()?;
            let line = match lines.next() {
                Some(line) => line?,
                None => break,
            };
            if let Err(err) = self.handle_line(&line, out) {
                writeln!(out, "Error: {:#}", err)?;
            }
        }
        self.stop();
        Ok(())
    }

    /// Dispatch one line of input
    pub fn handle_line(&mut self, line: &str, out: &mut dyn Write) -> Result<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        match line.strip_prefix('.') {
            Some(command) => {
                let (word, rest) = command.split_once(' ').unwrap_or((command, ""));
                match commands::find(word) {
                    Some(command) => (command.run)(self, rest.trim(), out),
                    None => {
                        writeln!(out, ".{} is not a valid command. Use .help for help.", word)?;
                        Ok(())
                    }
                }
            }
            None => {
                let expression = Expression::parse(line)?;
                self.graph(expression, out)
            }
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Stop the current graph. Returns whether one was playing.
    pub fn stop(&mut self) -> bool {
        match self.current.take() {
            Some(mut sonifier) => {
                sonifier.shutdown();
                true
            }
            None => false,
        }
    }

    /// Apply a change to the graph settings, keeping the old ones if the
    /// result is invalid. Takes effect from the next graph.
    pub fn update_graph(&mut self, change: impl FnOnce(&mut GraphSettings)) -> Result<()> {
        let mut graph = self.config.graph.clone();
        change(&mut graph);
        graph.mapping()?;
        debug!(?graph, "graph settings changed");
        self.config.graph = graph;
        Ok(())
    }

    /// Replace whatever is playing with `expression`
    pub fn graph(&mut self, expression: Expression, out: &mut dyn Write) -> Result<()> {
        self.stop();
        writeln!(out, "Graphing {}", expression)?;
        self.warn_gaps(&expression, out)?;

        let mut sonifier = self.sonifier(&expression)?;
        self.output.start(&mut sonifier)?;
        self.current = Some(sonifier);
        self.last = Some(expression);
        Ok(())
    }

    /// Render `expression` to a WAV file with the current settings
    pub fn write_file(&mut self, expression: Expression, path: &Path, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "Writing {} to {}", expression, path.display())?;
        self.warn_gaps(&expression, out)?;
        let mut sonifier = self.sonifier(&expression)?;
        sonifier.to_file(path)?;
        writeln!(out, "Done.")?;
        Ok(())
    }

    fn sonifier(&self, expression: &Expression) -> Result<Sonifier> {
        let mapping = self.config.graph.mapping()?;
        let function = expression.clone();
        let sonifier = Sonifier::new(
            Box::new(move |x| function.eval(x)),
            mapping,
            &self.config.voice,
            &self.config.audio,
        )?;
        Ok(sonifier)
    }

    fn warn_gaps(&self, expression: &Expression, out: &mut dyn Write) -> Result<()> {
        let g = &self.config.graph;
        let coverage = expression.coverage(g.min_x, g.max_x, COVERAGE_SAMPLES);
        if coverage < 1.0 {
            warn!(equation = expression.source(), coverage, "function has gaps");
            writeln!(
                out,
                "Note: {} is undefined over about {:.0}% of the x range; those parts are silent.",
                expression,
                (1.0 - coverage) * 100.0
            )?;
        }
        Ok(())
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpatialMode;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    /// Counts graphs started without touching a device
    #[derive(Clone, Default)]
    struct CountingOutput {
        started: Arc<Mutex<usize>>,
    }

    impl Output for CountingOutput {
        fn start(&mut self, _sonifier: &mut Sonifier) -> Result<()> {
            *self.started.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn shell() -> (Shell, CountingOutput) {
        let output = CountingOutput::default();
        let shell = Shell::new(AudiographConfig::default(), Box::new(output.clone()));
        (shell, output)
    }

    fn run(shell: &mut Shell, line: &str) -> (Result<()>, String) {
        let mut out = Vec::new();
        let result = shell.handle_line(line, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_equation_starts_graph() {
        let (mut shell, output) = shell();
        let (result, text) = run(&mut shell, "x^2 / 10");
        result.unwrap();
        assert!(text.starts_with("Graphing x^2 / 10"));
        assert_eq!(*output.started.lock().unwrap(), 1);
        assert!(shell.current().is_some());
        assert_eq!(shell.last_expression().unwrap().source(), "x^2 / 10");
    }

    #[test]
    fn test_new_graph_replaces_old() {
        let (mut shell, output) = shell();
        run(&mut shell, "x").0.unwrap();
        let first = shell.current().unwrap().server();
        run(&mut shell, "10 - x").0.unwrap();
        assert!(!first.lock().unwrap().has_callback());
        assert_eq!(*output.started.lock().unwrap(), 2);
    }

    #[test]
    fn test_bad_equation_is_an_error() {
        let (mut shell, output) = shell();
        let (result, _) = run(&mut shell, "x + wobble");
        assert!(result.is_err());
        assert_eq!(*output.started.lock().unwrap(), 0);
    }

    #[test]
    fn test_unknown_command() {
        let (mut shell, _) = shell();
        let (result, text) = run(&mut shell, ".frobnicate");
        result.unwrap();
        assert_eq!(text, ".frobnicate is not a valid command. Use .help for help.\n");
    }

    #[test]
    fn test_help_lists_commands() {
        let (mut shell, _) = shell();
        let (_, text) = run(&mut shell, ".help");
        assert!(text.contains(".xrange: Set the range of the x axis."));
        assert_eq!(text.lines().count(), commands::COMMANDS.len());

        let (_, text) = run(&mut shell, ".help duration");
        assert!(text.contains("Syntax: .duration <seconds>"));
    }

    #[test]
    fn test_settings_commands() {
        let (mut shell, _) = shell();
        run(&mut shell, ".xrange -5 5").0.unwrap();
        run(&mut shell, ".yrange -1 1").0.unwrap();
        run(&mut shell, ".duration 3").0.unwrap();
        run(&mut shell, ".xticks 1").0.unwrap();
        run(&mut shell, ".zeroticks on").0.unwrap();
        run(&mut shell, ".hrtf on").0.unwrap();

        let g = &shell.config().graph;
        assert_eq!((g.min_x, g.max_x), (-5.0, 5.0));
        assert_eq!((g.min_y, g.max_y), (-1.0, 1.0));
        assert_eq!(g.duration, 3.0);
        assert_eq!(g.x_ticks, Some(1.0));
        assert!(g.zero_ticks);
        assert_eq!(g.spatial_mode, SpatialMode::Spatial3D);

        run(&mut shell, ".xticks off").0.unwrap();
        assert_eq!(shell.config().graph.x_ticks, None);

        let (_, text) = run(&mut shell, ".settings");
        assert!(text.contains("x range: -5 to 5"));
        assert!(text.contains("3-D positioning: on"));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let (mut shell, _) = shell();
        assert!(run(&mut shell, ".xrange 5 1").0.is_err());
        assert!(run(&mut shell, ".duration 0.5").0.is_err());
        assert!(run(&mut shell, ".yticks -2").0.is_err());
        assert!(run(&mut shell, ".xticks 0").0.is_err());
        assert!(run(&mut shell, ".hrtf sideways").0.is_err());
        assert_eq!(shell.config().graph, GraphSettings::default());
    }

    #[test]
    fn test_replay_and_stop() {
        let (mut shell, output) = shell();
        assert!(run(&mut shell, ".replay").0.is_err());
        run(&mut shell, "x").0.unwrap();
        run(&mut shell, ".replay").0.unwrap();
        assert_eq!(*output.started.lock().unwrap(), 2);

        let (_, text) = run(&mut shell, ".stop");
        assert_eq!(text, "Stopped.\n");
        assert!(shell.current().is_none());
        let (_, text) = run(&mut shell, ".stop");
        assert!(text.is_empty());
    }

    #[test]
    fn test_write_renders_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("line.wav");
        let (mut shell, output) = shell();
        run(&mut shell, ".duration 1").0.unwrap();
        let (result, text) = run(&mut shell, &format!(".write {} y = x", path.display()));
        result.unwrap();
        assert!(text.ends_with("Done.\n"));
        assert_eq!(*output.started.lock().unwrap(), 0);

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.duration(), 66150);
    }

    #[test]
    fn test_gap_warning() {
        let (mut shell, _) = shell();
        run(&mut shell, ".xrange -10 10").0.unwrap();
        let (_, text) = run(&mut shell, "sqrt x");
        assert!(text.contains("undefined over about 50%"));
    }

    #[test]
    fn test_run_loop() {
        let (mut shell, output) = shell();
        let input = Cursor::new("x\n.bogus\nfoo(x)\n.quit\nx\n");
        let mut out = Vec::new();
        shell.run(input, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Welcome to audiograph."));
        assert!(text.contains(".bogus is not a valid command."));
        assert!(text.contains("Error: unknown name `foo`"));
        assert!(!shell.is_running());
        // The line after .quit is never read
        assert_eq!(*output.started.lock().unwrap(), 1);
        assert!(shell.current().is_none());
    }
}
