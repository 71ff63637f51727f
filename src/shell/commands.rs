//! The `.command` table

use super::Shell;
use crate::config::{SpatialMode, MIN_DURATION};
use crate::expr::Expression;
use anyhow::{anyhow, bail, Context, Result};
use std::io::Write;
use std::path::Path;

pub(crate) type Handler = fn(&mut Shell, &str, &mut dyn Write) -> Result<()>;

/// One shell command
pub(crate) struct Command {
    pub name: &'static str,
    pub summary: &'static str,
    pub usage: &'static str,
    pub run: Handler,
}

/// Sorted by name, which is the order `.help` lists them in
pub(crate) const COMMANDS: &[Command] = &[
    Command {
        name: "duration",
        summary: "Set how long one sweep of the graph takes.",
        usage: "Syntax: .duration <seconds>\n\nThe duration must be at least 1 second.",
        run: duration,
    },
    Command {
        name: "help",
        summary: "Get help on a command.",
        usage: "Syntax: .help or .help <command>\n\nUse .help for a list of commands. Use .help <command> for info on a command.",
        run: help,
    },
    Command {
        name: "hrtf",
        summary: "Switch 3-D headphone positioning on or off.",
        usage: "Syntax: .hrtf on|off\n\nWhen on, the graph moves around your head instead of panning left to right.",
        run: hrtf,
    },
    Command {
        name: "quit",
        summary: "Quit the program.",
        usage: "Syntax: .quit",
        run: quit,
    },
    Command {
        name: "replay",
        summary: "Play the last graph again.",
        usage: "Syntax: .replay",
        run: replay,
    },
    Command {
        name: "settings",
        summary: "Show the current graph settings.",
        usage: "Syntax: .settings",
        run: settings,
    },
    Command {
        name: "stop",
        summary: "Stop the graph that is playing.",
        usage: "Syntax: .stop",
        run: stop,
    },
    Command {
        name: "write",
        summary: "Write a graph to a WAV file instead of playing it.",
        usage: "Syntax: .write <path> <equation>\n\nThe file holds the whole sweep plus a short silent tail.",
        run: write_wav,
    },
    Command {
        name: "xrange",
        summary: "Set the range of the x axis.",
        usage: "Syntax: .xrange <min> <max>",
        run: xrange,
    },
    Command {
        name: "xticks",
        summary: "Tick every time x crosses a multiple of a value.",
        usage: "Syntax: .xticks <interval> or .xticks off",
        run: xticks,
    },
    Command {
        name: "yrange",
        summary: "Set the range of the y axis.",
        usage: "Syntax: .yrange <min> <max>\n\nThe tone is silent while the graph is outside this range.",
        run: yrange,
    },
    Command {
        name: "yticks",
        summary: "Tick every time y crosses a multiple of a value.",
        usage: "Syntax: .yticks <interval> or .yticks off",
        run: yticks,
    },
    Command {
        name: "zeroticks",
        summary: "Tick when the graph crosses zero.",
        usage: "Syntax: .zeroticks on|off",
        run: zeroticks,
    },
];

pub(crate) fn find(name: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|c| c.name == name)
}

fn help(_shell: &mut Shell, arg: &str, out: &mut dyn Write) -> Result<()> {
    if arg.is_empty() {
        for command in COMMANDS {
            writeln!(out, ".{}: {}", command.name, command.summary)?;
        }
        return Ok(());
    }
    match find(arg.trim_start_matches('.')) {
        Some(command) => writeln!(out, "{}\n\n{}", command.summary, command.usage)?,
        None => writeln!(out, ".{} is not a valid command.", arg.trim_start_matches('.'))?,
    }
    Ok(())
}

fn quit(shell: &mut Shell, _arg: &str, _out: &mut dyn Write) -> Result<()> {
    shell.quit();
    Ok(())
}

fn numbers<const N: usize>(arg: &str, usage: &str) -> Result<[f64; N]> {
    let parts: Vec<&str> = arg.split_whitespace().collect();
    if parts.len() != N {
        bail!("{}", usage);
    }
    let mut values = [0.0; N];
    for (value, part) in values.iter_mut().zip(parts) {
        *value = part
            .parse()
            .with_context(|| format!("`{}` is not a number", part))?;
    }
    Ok(values)
}

fn toggle(arg: &str) -> Result<bool> {
    match arg.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" | "1" => Ok(true),
        "off" | "no" | "false" | "0" => Ok(false),
        other => Err(anyhow!("expected on or off, got `{}`", other)),
    }
}

fn interval(arg: &str) -> Result<Option<f64>> {
    if matches!(arg.to_ascii_lowercase().as_str(), "off" | "no" | "false") {
        return Ok(None);
    }
    let [value] = numbers::<1>(arg, "expected an interval or off")?;
    Ok(Some(value))
}

fn xrange(shell: &mut Shell, arg: &str, out: &mut dyn Write) -> Result<()> {
    let [min, max] = numbers::<2>(arg, "Syntax: .xrange <min> <max>")?;
    shell.update_graph(|g| {
        g.min_x = min;
        g.max_x = max;
    })?;
    writeln!(out, "x range is now {} to {}", min, max)?;
    Ok(())
}

fn yrange(shell: &mut Shell, arg: &str, out: &mut dyn Write) -> Result<()> {
    let [min, max] = numbers::<2>(arg, "Syntax: .yrange <min> <max>")?;
    shell.update_graph(|g| {
        g.min_y = min;
        g.max_y = max;
    })?;
    writeln!(out, "y range is now {} to {}", min, max)?;
    Ok(())
}

fn duration(shell: &mut Shell, arg: &str, out: &mut dyn Write) -> Result<()> {
    let [seconds] = numbers::<1>(arg, "Syntax: .duration <seconds>")?;
    if seconds < MIN_DURATION {
        bail!("duration must be at least {} second", MIN_DURATION);
    }
    shell.update_graph(|g| g.duration = seconds)?;
    writeln!(out, "duration is now {} seconds", seconds)?;
    Ok(())
}

fn xticks(shell: &mut Shell, arg: &str, out: &mut dyn Write) -> Result<()> {
    let ticks = interval(arg)?;
    shell.update_graph(|g| g.x_ticks = ticks)?;
    match ticks {
        Some(v) => writeln!(out, "x ticks every {}", v)?,
        None => writeln!(out, "x ticks off")?,
    }
    Ok(())
}

fn yticks(shell: &mut Shell, arg: &str, out: &mut dyn Write) -> Result<()> {
    let ticks = interval(arg)?;
    shell.update_graph(|g| g.y_ticks = ticks)?;
    match ticks {
        Some(v) => writeln!(out, "y ticks every {}", v)?,
        None => writeln!(out, "y ticks off")?,
    }
    Ok(())
}

fn zeroticks(shell: &mut Shell, arg: &str, out: &mut dyn Write) -> Result<()> {
    let on = toggle(arg)?;
    shell.update_graph(|g| g.zero_ticks = on)?;
    writeln!(out, "zero ticks {}", if on { "on" } else { "off" })?;
    Ok(())
}

fn hrtf(shell: &mut Shell, arg: &str, out: &mut dyn Write) -> Result<()> {
    let on = toggle(arg)?;
    let mode = if on { SpatialMode::Spatial3D } else { SpatialMode::Planar };
    shell.update_graph(|g| g.spatial_mode = mode)?;
    writeln!(out, "3-D positioning {}", if on { "on" } else { "off" })?;
    Ok(())
}

fn write_wav(shell: &mut Shell, arg: &str, out: &mut dyn Write) -> Result<()> {
    let (path, equation) = arg
        .split_once(char::is_whitespace)
        .ok_or_else(|| anyhow!("Syntax: .write <path> <equation>"))?;
    let expression = Expression::parse(equation.trim())?;
    shell.write_file(expression, Path::new(path), out)
}

fn replay(shell: &mut Shell, _arg: &str, out: &mut dyn Write) -> Result<()> {
    let expression = shell
        .last_expression()
        .cloned()
        .ok_or_else(|| anyhow!("nothing has been graphed yet"))?;
    shell.graph(expression, out)
}

fn stop(shell: &mut Shell, _arg: &str, out: &mut dyn Write) -> Result<()> {
    if shell.stop() {
        writeln!(out, "Stopped.")?;
    }
    Ok(())
}

fn settings(shell: &mut Shell, _arg: &str, out: &mut dyn Write) -> Result<()> {
    let g = &shell.config().graph;
    let show = |ticks: Option<f64>| ticks.map_or_else(|| "off".to_string(), |v| v.to_string());
    writeln!(out, "x range: {} to {}", g.min_x, g.max_x)?;
    writeln!(out, "y range: {} to {}", g.min_y, g.max_y)?;
    writeln!(out, "duration: {} seconds", g.duration)?;
    writeln!(out, "x ticks: {}", show(g.x_ticks))?;
    writeln!(out, "y ticks: {}", show(g.y_ticks))?;
    writeln!(out, "zero ticks: {}", if g.zero_ticks { "on" } else { "off" })?;
    writeln!(
        out,
        "3-D positioning: {}",
        if g.spatial_mode == SpatialMode::Spatial3D { "on" } else { "off" }
    )?;
    Ok(())
}
