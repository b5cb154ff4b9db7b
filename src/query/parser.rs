//! Path query string parser.
//!
//! Grammar:
//!
//! ```text
//! query  := switch
//! switch := path ('|' path)*
//! path   := step ('.' step)*
//! step   := literal-chars | '[' switch ']'
//! ```
//!
//! The scan is a single left-to-right pass over a stack of frames. Each frame
//! accumulates one step, one path and one switch; `[` pushes a fresh frame and
//! `]` pops it, handing the finished switch to the enclosing frame as the
//! content of its current step.

use std::str::FromStr;

use super::ast::{Path, PathComponent, Step, Switch};
use super::error::SyntaxError;

/// The step currently being accumulated.
#[derive(Debug)]
enum Pending {
    Empty,
    Text(String),
    Group(Switch),
}

#[derive(Debug)]
struct Frame {
    step: Pending,
    path: Path,
    switch: Switch,
    /// Character index of the `[` that opened this frame.
    open: usize,
}

impl Frame {
    fn new(open: usize) -> Self {
        Self {
            step: Pending::Empty,
            path: Path::default(),
            switch: Switch::default(),
            open,
        }
    }

    /// Consecutive delimiters are not collapsed: an empty step becomes a
    /// step with an empty id.
    fn close_step(&mut self) {
        let component: PathComponent = match std::mem::replace(&mut self.step, Pending::Empty) {
            Pending::Empty => Step::new("").into(),
            Pending::Text(id) => Step::new(id).into(),
            Pending::Group(switch) => switch.into(),
        };
        self.path.push(component);
    }

    fn close_path(&mut self) {
        self.close_step();
        let path = std::mem::take(&mut self.path);
        self.switch.push(path);
    }

    fn is_blank(&self) -> bool {
        matches!(self.step, Pending::Empty) && self.path.is_empty() && self.switch.is_empty()
    }

    fn finish(mut self) -> Switch {
        self.close_path();
        self.switch
    }
}

/// Parser for path query strings.
pub struct Parser {
    frames: Vec<Frame>,
}

impl Parser {
    fn new() -> Self {
        Self {
            frames: vec![Frame::new(0)],
        }
    }

    /// Parses the query string into a [`Switch`].
    ///
    /// # Examples
    ///
    /// ```
    /// use confquill::query::Parser;
    ///
    /// let query = Parser::parse("server.[host|address]").unwrap();
    /// assert_eq!(query.to_string(), "server.[host|address]");
    /// ```
    pub fn parse(query: &str) -> Result<Switch, SyntaxError> {
        if query.is_empty() {
            return Err(SyntaxError::EmptyQuery);
        }

        let mut parser = Parser::new();
        for (position, ch) in query.chars().enumerate() {
            parser.feed(position, ch)?;
        }
        parser.finish()
    }

    fn top(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn feed(&mut self, position: usize, ch: char) -> Result<(), SyntaxError> {
        match ch {
            '.' => self.top().close_step(),
            '|' => self.top().close_path(),
            '[' => {
                let frame = self.top();
                if !matches!(frame.step, Pending::Empty) {
                    frame.close_step();
                }
                self.frames.push(Frame::new(position));
            }
            ']' => {
                // The outermost frame has no `[` to close.
                let frame = match self.frames.pop() {
                    Some(frame) if !self.frames.is_empty() => frame,
                    _ => return Err(SyntaxError::UnmatchedClose { position }),
                };
                if frame.is_blank() {
                    return Err(SyntaxError::EmptyGroup {
                        position: frame.open,
                    });
                }
                self.top().step = Pending::Group(frame.finish());
            }
            _ => match &mut self.top().step {
                Pending::Group(_) => {
                    return Err(SyntaxError::MissingDelimiter {
                        position,
                        found: ch,
                    })
                }
                step @ Pending::Empty => *step = Pending::Text(ch.to_string()),
                Pending::Text(text) => text.push(ch),
            },
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Switch, SyntaxError> {
        if self.frames.len() > 1 {
            return Err(SyntaxError::Unterminated {
                position: self.top().open,
            });
        }
        match self.frames.pop() {
            Some(frame) => Ok(frame.finish()),
            None => Err(SyntaxError::EmptyQuery),
        }
    }
}

impl FromStr for Switch {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parser::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: &str) -> PathComponent {
        Step::new(id).into()
    }

    fn path(components: Vec<PathComponent>) -> Path {
        Path::new(components)
    }

    #[test]
    fn test_parse_single_step() {
        let query = Parser::parse("name").unwrap();
        assert_eq!(query, Switch::new(vec![path(vec![step("name")])]));
    }

    #[test]
    fn test_parse_dotted_path() {
        let query = Parser::parse("a.b.c").unwrap();
        assert_eq!(
            query,
            Switch::new(vec![path(vec![step("a"), step("b"), step("c")])])
        );
    }

    #[test]
    fn test_parse_top_level_alternatives() {
        let query = Parser::parse("a|b.c").unwrap();
        assert_eq!(query.len(), 2);
        assert_eq!(query.paths()[0], path(vec![step("a")]));
        assert_eq!(query.paths()[1], path(vec![step("b"), step("c")]));
    }

    #[test]
    fn test_parse_bracketed_group_without_dot() {
        let query = Parser::parse("a[b|c].d").unwrap();
        let group = Switch::new(vec![path(vec![step("b")]), path(vec![step("c")])]);
        assert_eq!(
            query,
            Switch::new(vec![path(vec![step("a"), group.into(), step("d")])])
        );
    }

    #[test]
    fn test_parse_bracketed_group_with_dot() {
        assert_eq!(
            Parser::parse("a.[b|c].d").unwrap(),
            Parser::parse("a[b|c].d").unwrap()
        );
    }

    #[test]
    fn test_parse_leading_group() {
        let query = Parser::parse("[a|b].x").unwrap();
        let group = Switch::new(vec![path(vec![step("a")]), path(vec![step("b")])]);
        assert_eq!(query, Switch::new(vec![path(vec![group.into(), step("x")])]));
    }

    #[test]
    fn test_parse_nested_groups() {
        let query = Parser::parse("[a.[b|c]|d]").unwrap();
        assert_eq!(query.to_string(), "[a.[b|c]|d]");
        let PathComponent::Switch(outer) = &query.paths()[0].components()[0] else {
            panic!("Expected switch");
        };
        assert_eq!(outer.len(), 2);
        assert_eq!(outer.paths()[0].len(), 2);
    }

    #[test]
    fn test_parse_consecutive_delimiters_not_collapsed() {
        let query = Parser::parse("a..b").unwrap();
        assert_eq!(
            query,
            Switch::new(vec![path(vec![step("a"), step(""), step("b")])])
        );
    }

    #[test]
    fn test_parse_only_delimiters() {
        let query = Parser::parse(".").unwrap();
        assert_eq!(query, Switch::new(vec![path(vec![step(""), step("")])]));
    }

    #[test]
    fn test_parse_empty_fails() {
        assert_eq!(Parser::parse(""), Err(SyntaxError::EmptyQuery));
    }

    #[test]
    fn test_parse_unterminated_brace_reports_open_position() {
        assert_eq!(
            Parser::parse("a[b"),
            Err(SyntaxError::Unterminated { position: 1 })
        );
    }

    #[test]
    fn test_parse_unterminated_reports_innermost_open() {
        assert_eq!(
            Parser::parse("a[b.[c]"),
            Err(SyntaxError::Unterminated { position: 1 })
        );
        assert_eq!(
            Parser::parse("a[b.[c"),
            Err(SyntaxError::Unterminated { position: 4 })
        );
    }

    #[test]
    fn test_parse_unmatched_close() {
        assert_eq!(
            Parser::parse("a]b"),
            Err(SyntaxError::UnmatchedClose { position: 1 })
        );
        assert_eq!(Parser::parse("]"), Err(SyntaxError::UnmatchedClose { position: 0 }));
        assert_eq!(
            Parser::parse("a.[b]]"),
            Err(SyntaxError::UnmatchedClose { position: 5 })
        );
    }

    #[test]
    fn test_parse_empty_group() {
        assert_eq!(
            Parser::parse("a.[]"),
            Err(SyntaxError::EmptyGroup { position: 2 })
        );
    }

    #[test]
    fn test_parse_text_after_group_fails() {
        assert_eq!(
            Parser::parse("[a|b]x"),
            Err(SyntaxError::MissingDelimiter {
                position: 5,
                found: 'x'
            })
        );
    }

    #[test]
    fn test_positions_count_characters() {
        let err = Parser::parse("é]").unwrap_err();
        assert_eq!(err.position(), Some(1));
    }

    #[test]
    fn test_from_str() {
        let query: Switch = "a.b".parse().unwrap();
        assert_eq!(query.to_string(), "a.b");
    }
}
