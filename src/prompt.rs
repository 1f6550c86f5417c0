//! Colored, segmented prompt and redrawing of the line being edited.

use crate::line::Line;
use crossterm::cursor::{MoveLeft, MoveToColumn};
use crossterm::style::{self, Print, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::queue;
use std::io::{self, Write};

pub const DEFAULT_END: &str = "\u{25b6}";
pub const DEFAULT_MID: &str = " ";

/// Colors used when reporting a failed command.
pub const ALERT_COLORS: (&str, &str) = ("black", "red");

/// Colors a prompt segment can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Red,
    Green,
    Black,
    Blue,
}

impl Color {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "white" => Some(Self::White),
            "red" => Some(Self::Red),
            "green" => Some(Self::Green),
            "black" => Some(Self::Black),
            "blue" => Some(Self::Blue),
            _ => None,
        }
    }
}

impl From<Color> for style::Color {
    fn from(color: Color) -> Self {
        match color {
            Color::White => style::Color::White,
            Color::Red => style::Color::Red,
            Color::Green => style::Color::Green,
            Color::Black => style::Color::Black,
            Color::Blue => style::Color::Blue,
        }
    }
}

/// Wrap `text` in ANSI colors. Unknown color names leave that channel untouched.
pub fn colorize(text: &str, fg: &str, bg: &str) -> String {
    let mut styled = style::style(text);
    if let Some(color) = Color::from_name(fg) {
        styled = styled.with(style::Color::from(color));
    }
    if let Some(color) = Color::from_name(bg) {
        styled = styled.on(style::Color::from(color));
    }
    styled.to_string()
}

/// One colored chunk of the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSegment {
    pub text: String,
    pub fg: String,
    pub bg: String,
}

impl PromptSegment {
    pub fn new(text: impl Into<String>, fg: impl Into<String>, bg: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fg: fg.into(),
            bg: bg.into(),
        }
    }
}

/// Ordered prompt segments plus the glyphs drawn between and after them.
#[derive(Debug, Clone)]
pub struct Prompt {
    segments: Vec<PromptSegment>,
    mid: String,
    end: String,
}

impl Default for Prompt {
    fn default() -> Self {
        Self::new(DEFAULT_MID, DEFAULT_END)
    }
}

impl Prompt {
    pub fn new(mid: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            segments: Vec::new(),
            mid: mid.into(),
            end: end.into(),
        }
    }

    pub fn push_segment(&mut self, segment: PromptSegment) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[PromptSegment] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut Vec<PromptSegment> {
        &mut self.segments
    }

    /// The prompt in each segment's own colors.
    pub fn render(&self) -> String {
        self.render_with(None)
    }

    /// The prompt with every segment forced into [`ALERT_COLORS`].
    pub fn render_alert(&self) -> String {
        self.render_with(Some(ALERT_COLORS))
    }

    /// Render all segments, optionally overriding their colors.
    ///
    /// Interior segments are followed by the mid separator; the last one gets
    /// a space and the end cap in swapped colors, pointing into the input.
    pub fn render_with(&self, colors: Option<(&str, &str)>) -> String {
        let mut rendered = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            let (fg, bg) = colors.unwrap_or((segment.fg.as_str(), segment.bg.as_str()));
            if i + 1 == self.segments.len() {
                rendered.push_str(&colorize(&format!("{} ", segment.text), fg, bg));
                rendered.push_str(&colorize(&self.end, bg, fg));
            } else {
                rendered.push_str(&colorize(&format!("{}{}", segment.text, self.mid), fg, bg));
            }
        }
        rendered.push(' ');
        rendered
    }

    /// Repaint the current terminal row with the prompt and `line`, leaving
    /// the terminal cursor at the line's cursor.
    pub fn redraw(&self, out: &mut impl Write, line: &Line) -> io::Result<()> {
        queue!(
            out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(self.render()),
            Print(line.content())
        )?;
        let behind = line.len().saturating_sub(line.cursor());
        if behind > 0 {
            queue!(out, MoveLeft(u16::try_from(behind).unwrap_or(u16::MAX)))?;
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::History;
    use crate::registry::no_completion;

    // NO_COLOR would otherwise turn every colorize call into a no-op.
    fn colors_on() {
        crossterm::style::force_color_output(true);
    }

    fn two_segment_prompt() -> Prompt {
        colors_on();
        let mut prompt = Prompt::new("|", ">");
        prompt.push_segment(PromptSegment::new("10.0.0.1", "white", "blue"));
        prompt.push_segment(PromptSegment::new("barshell", "black", "white"));
        prompt
    }

    #[test]
    fn test_colorize_unknown_names_pass_through() {
        assert_eq!(colorize("plain", "purple", "mauve"), "plain");
        assert_eq!(colorize("plain", "", ""), "plain");
    }

    #[test]
    fn test_colorize_wraps_text() {
        colors_on();
        let red = colorize("err", "red", "");
        assert_ne!(red, "err");
        assert!(red.contains("err"));
        assert_ne!(colorize("err", "red", "black"), red);
    }

    #[test]
    fn test_render_separates_and_caps_segments() {
        let prompt = two_segment_prompt();
        let expected = format!(
            "{}{}{} ",
            colorize("10.0.0.1|", "white", "blue"),
            colorize("barshell ", "black", "white"),
            colorize(">", "white", "black"),
        );
        assert_eq!(prompt.render(), expected);
    }

    #[test]
    fn test_alert_override_leaves_segments_alone() {
        let prompt = two_segment_prompt();
        let expected = format!(
            "{}{}{} ",
            colorize("10.0.0.1|", "black", "red"),
            colorize("barshell ", "black", "red"),
            colorize(">", "red", "black"),
        );
        assert_eq!(prompt.render_alert(), expected);
        assert_eq!(prompt.segments()[0].fg, "white");
        assert_ne!(prompt.render(), prompt.render_alert());
    }

    #[test]
    fn test_empty_prompt_renders_space() {
        assert_eq!(Prompt::default().render(), " ");
    }

    #[test]
    fn test_redraw_repositions_cursor() {
        let prompt = two_segment_prompt();
        let mut line = Line::new();
        let mut history = History::default();
        for b in b"abc\x1b[D\x1b[D" {
            line.handle_byte(*b, &mut history, &no_completion);
        }

        let mut out = Vec::new();
        prompt.redraw(&mut out, &line).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(&prompt.render()));
        assert!(out.ends_with("abc\x1b[2D"), "{:?}", out);
    }

    #[test]
    fn test_redraw_after_edits_behind_cursor() {
        let prompt = two_segment_prompt();
        let mut line = Line::new();
        line.set_content("abc");
        line.delete_at(0);
        line.insert_at(0, b'x');
        line.delete_at(2);

        let mut out = Vec::new();
        prompt.redraw(&mut out, &line).unwrap();
        assert_eq!(line.cursor(), line.len());
        assert!(String::from_utf8(out).unwrap().ends_with("xb"));

        line.move_home();
        line.insert_at(2, b'y');
        let mut out = Vec::new();
        prompt.redraw(&mut out, &line).unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("xby\x1b[3D"));
    }

    #[test]
    fn test_redraw_at_end_does_not_move() {
        let prompt = two_segment_prompt();
        let mut line = Line::new();
        line.set_content("ls");
        let mut out = Vec::new();
        prompt.redraw(&mut out, &line).unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("ls"));
    }
}
