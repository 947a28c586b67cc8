//! Terminal output for progress and results.
//!
//! Success lines are green, warnings yellow and section titles bold. Color
//! is only used when the stream is a terminal.

use cyrup_termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use std::io::{self, IsTerminal, Write};

/// Writes progress to stdout and warnings to stderr, honoring quiet mode.
#[derive(Debug, Clone, Copy)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
}

impl OutputManager {
    /// Creates an output manager.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose: verbose && !quiet,
            quiet,
        }
    }

    /// Detail line, only shown in verbose mode.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if self.verbose {
            write_line(&mut stdout(), None, &format!("  {message}"))?;
        }
        Ok(())
    }

    /// Green check-marked line, suppressed in quiet mode.
    pub fn success(&self, message: &str) -> io::Result<()> {
        if !self.quiet {
            write_success(&mut stdout(), message)?;
        }
        Ok(())
    }

    /// Warnings go to stderr even in quiet mode.
    pub fn warn(&self, message: &str) -> io::Result<()> {
        write_warning(&mut stderr(), message)
    }

    /// Bold, underlined title preceded by a blank line.
    pub fn section(&self, title: &str) -> io::Result<()> {
        if !self.quiet {
            write_section(&mut stdout(), title)?;
        }
        Ok(())
    }

    /// Indented detail line under a section.
    pub fn indent(&self, message: &str) -> io::Result<()> {
        if !self.quiet {
            write_line(&mut stdout(), None, &format!("    {message}"))?;
        }
        Ok(())
    }
}

fn color_choice(is_terminal: bool) -> ColorChoice {
    if is_terminal {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn stdout() -> StandardStream {
    StandardStream::stdout(color_choice(io::stdout().is_terminal()))
}

fn stderr() -> StandardStream {
    StandardStream::stderr(color_choice(io::stderr().is_terminal()))
}

fn write_line<W: WriteColor>(
    out: &mut W,
    spec: Option<&ColorSpec>,
    message: &str,
) -> io::Result<()> {
    match spec {
        Some(spec) => {
            out.set_color(spec)?;
            write!(out, "{message}")?;
            out.reset()?;
            writeln!(out)
        }
        None => writeln!(out, "{message}"),
    }
}

fn write_success<W: WriteColor>(out: &mut W, message: &str) -> io::Result<()> {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(Color::Green)).set_bold(true);
    write_line(out, Some(&spec), &format!("✓ {message}"))
}

fn write_warning<W: WriteColor>(out: &mut W, message: &str) -> io::Result<()> {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(Color::Yellow)).set_bold(true);
    write_line(out, Some(&spec), &format!("warning: {message}"))
}

fn write_section<W: WriteColor>(out: &mut W, title: &str) -> io::Result<()> {
    let mut spec = ColorSpec::new();
    spec.set_bold(true);
    writeln!(out)?;
    write_line(out, Some(&spec), title)?;
    writeln!(out, "{}", "-".repeat(title.chars().count()))
}
