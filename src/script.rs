//! Line-oriented command scripts driving a map, as read by the `search-trees` binary.

use std::io::{BufRead, Write};

use log::{debug, info};
use regex::Regex;

use crate::error::ScriptError;
use crate::strategy::Strategy;
use crate::tree::SearchTree;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Insert(i64, String),
    Erase(i64),
    Find(i64),
    Min,
    Max,
    Size,
    Height,
    Clear,
    Dump,
    Check,
}

impl Command {
    fn mutates(&self) -> bool {
        matches!(self, Command::Insert(..) | Command::Erase(_) | Command::Clear)
    }
}

pub struct Parser {
    re_command: Regex,
}

impl Parser {
    pub fn new() -> Self {
        let re_command = Regex::new(r"(?x)
                                    ^\s*(?:
                                     (?P<INSERT>insert)\s+(?P<IKEY>\S+)(?:\s+(?P<VALUE>.*?))?|
                                     (?P<KEYED>erase|find)\s+(?P<KEY>\S+)|
                                     (?P<BARE>min|max|size|height|clear|dump|check)
                                    )\s*$").unwrap();
        Self{re_command}
    }

    /// Parses one script line. Blank lines and `#` comments yield `Ok(None)`.
    pub fn parse_line(&self, line_no: usize, line: &str) -> Result<Option<Command>, ScriptError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let captures = match self.re_command.captures(trimmed) {
            Some(captures) => captures,
            None => return Err(ScriptError::Parse{line: line_no, text: trimmed.to_string()}),
        };

        let parse_key = |text: &str| {
            text.parse::<i64>().map_err(|_| ScriptError::BadKey{line: line_no, text: text.to_string()})
        };

        let command = if captures.name("INSERT").is_some() {
            let key_text = &captures["IKEY"];
            let key = parse_key(key_text)?;
            let value = match captures.name("VALUE") {
                Some(value) if !value.as_str().is_empty() => value.as_str().to_string(),
                _ => key_text.to_string(),
            };
            Command::Insert(key, value)
        } else if let Some(keyed) = captures.name("KEYED") {
            let key = parse_key(&captures["KEY"])?;
            match keyed.as_str() {
                "erase" => Command::Erase(key),
                _ => Command::Find(key),
            }
        } else {
            match &captures["BARE"] {
                "min" => Command::Min,
                "max" => Command::Max,
                "size" => Command::Size,
                "height" => Command::Height,
                "clear" => Command::Clear,
                "dump" => Command::Dump,
                _ => Command::Check,
            }
        };
        Ok(Some(command))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// A map under scripted control, optionally validating after every mutation.
pub struct Session<S: Strategy> {
    tree: SearchTree<i64, String, S>,
    check_each_step: bool,
}

impl<S: Strategy> Session<S> {
    pub fn new(check_each_step: bool) -> Self {
        Self{tree: SearchTree::new(), check_each_step}
    }

    pub fn tree(&self) -> &SearchTree<i64, String, S> {
        &self.tree
    }

    pub fn execute<W: Write>(&mut self, line_no: usize, command: &Command, out: &mut W) -> Result<(), ScriptError> {
        debug!("{}: line {}: {:?}", S::NAME, line_no, command);
        let t = &mut self.tree;
        match command {
            Command::Insert(key, value) => {
                if t.insert(*key, value.clone()) {
                    writeln!(out, "inserted {}", key)?;
                } else {
                    writeln!(out, "exists {}", key)?;
                }
            },
            Command::Erase(key) => writeln!(out, "erased {}", t.erase(key))?,
            Command::Find(key) => match t.find(key) {
                Some(value) => writeln!(out, "{} => {}", key, value)?,
                None => writeln!(out, "{} not found", key)?,
            },
            Command::Min => match t.first_key_value() {
                Some((k, v)) => writeln!(out, "{} => {}", k, v)?,
                None => writeln!(out, "empty")?,
            },
            Command::Max => match t.last_key_value() {
                Some((k, v)) => writeln!(out, "{} => {}", k, v)?,
                None => writeln!(out, "empty")?,
            },
            Command::Size => writeln!(out, "size {}", t.size())?,
            Command::Height => writeln!(out, "height {}", t.height())?,
            Command::Clear => {
                t.clear();
                writeln!(out, "cleared")?;
            },
            Command::Dump => {
                let mut x = t.minimum();
                while let Some(id) = x {
                    writeln!(out, "{} => {} [{}]", t.key(id), t.value(id), t.meta(id))?;
                    x = t.successor(id);
                }
            },
            Command::Check => {
                t.validate().map_err(|source| ScriptError::Invariant{line: line_no, source})?;
                writeln!(out, "ok")?;
            },
        }

        if self.check_each_step && command.mutates() {
            self.tree.validate().map_err(|source| ScriptError::Invariant{line: line_no, source})?;
        }
        Ok(())
    }

    /// Runs every command in `input`, stopping at the first failure.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<(), ScriptError> {
        let parser = Parser::new();
        let mut executed = 0;
        for (i, line) in input.lines().enumerate() {
            let line = line?;
            if let Some(command) = parser.parse_line(i + 1, &line)? {
                self.execute(i + 1, &command, out)?;
                executed += 1;
            }
        }
        info!("{}: ran {} commands, final size {}", S::NAME, executed, self.tree.size());
        Ok(())
    }
}

#[cfg(test)]
use crate::{ColorBalanced, HeightBalanced, LevelBalanced, Unbalanced};

#[cfg(test)]
fn test_run<S: Strategy>(script: &str) -> (Result<(), ScriptError>, String) {
    let mut session: Session<S> = Session::new(true);
    let mut out = Vec::new();
    let res = session.run(script.as_bytes(), &mut out);
    (res, String::from_utf8(out).unwrap())
}

#[test]
fn test_parse_commands() {
    let p = Parser::new();

    assert_eq!(p.parse_line(1, "insert 5").unwrap(), Some(Command::Insert(5, "5".to_string())));
    assert_eq!(p.parse_line(1, "  insert -7 seven and a half  ").unwrap(),
               Some(Command::Insert(-7, "seven and a half".to_string())));
    assert_eq!(p.parse_line(1, "erase 12").unwrap(), Some(Command::Erase(12)));
    assert_eq!(p.parse_line(1, "find 0").unwrap(), Some(Command::Find(0)));
    assert_eq!(p.parse_line(1, "dump").unwrap(), Some(Command::Dump));
    assert_eq!(p.parse_line(1, "height").unwrap(), Some(Command::Height));
    assert_eq!(p.parse_line(1, "").unwrap(), None);
    assert_eq!(p.parse_line(1, "   # a comment").unwrap(), None);
}

#[test]
fn test_parse_errors_carry_line_numbers() {
    let p = Parser::new();

    match p.parse_line(3, "frobnicate 4") {
        Err(ScriptError::Parse{line, text}) => {
            assert_eq!(line, 3);
            assert_eq!(text, "frobnicate 4");
        },
        other => panic!("unexpected {:?}", other),
    }
    match p.parse_line(9, "erase twelve") {
        Err(ScriptError::BadKey{line, text}) => {
            assert_eq!(line, 9);
            assert_eq!(text, "twelve");
        },
        other => panic!("unexpected {:?}", other),
    }
    assert!(p.parse_line(1, "size 3").is_err());
}

#[test]
fn test_run_script_on_every_strategy() {
    let script = "\
# fill
insert 10 ten
insert 20
insert 30
insert 10 again
find 10
find 11
erase 20
erase 20
min
max
size
check
clear
min
size
";
    let expected = "\
inserted 10
inserted 20
inserted 30
exists 10
10 => ten
11 not found
erased 1
erased 0
10 => ten
30 => 30
size 2
ok
cleared
empty
size 0
";
    for (res, out) in [test_run::<Unbalanced>(script), test_run::<HeightBalanced>(script),
                       test_run::<ColorBalanced>(script), test_run::<LevelBalanced>(script)] {
        assert!(res.is_ok());
        assert_eq!(out, expected);
    }
}

#[test]
fn test_session_exposes_tree() {
    let mut session: Session<ColorBalanced> = Session::new(false);
    let mut out = Vec::new();
    session.run("insert 3 three\ninsert 1\nerase 3\ninsert 2 two\n".as_bytes(), &mut out).unwrap();

    let t = session.tree();
    assert_eq!(t.size(), 2);
    assert_eq!(t.find(&2).map(String::as_str), Some("two"));
    assert_eq!(t.find(&3), None);
    assert_eq!(t.validate(), Ok(()));
}

#[test]
fn test_dump_shows_metadata() {
    let script = "insert 1\ninsert 2\ninsert 3\ndump\nheight\n";

    let (res, out) = test_run::<HeightBalanced>(script);
    assert!(res.is_ok());
    assert!(out.ends_with("1 => 1 [bf=+0]\n2 => 2 [bf=+0]\n3 => 3 [bf=+0]\nheight 1\n"));

    let (res, out) = test_run::<ColorBalanced>(script);
    assert!(res.is_ok());
    assert!(out.ends_with("1 => 1 [red]\n2 => 2 [black]\n3 => 3 [red]\nheight 1\n"));

    let (res, out) = test_run::<LevelBalanced>(script);
    assert!(res.is_ok());
    assert!(out.ends_with("1 => 1 [level=1]\n2 => 2 [level=2]\n3 => 3 [level=1]\nheight 1\n"));

    let (res, out) = test_run::<Unbalanced>(script);
    assert!(res.is_ok());
    assert!(out.ends_with("1 => 1 [-]\n2 => 2 [-]\n3 => 3 [-]\nheight 2\n"));
}

#[test]
fn test_run_stops_at_bad_line() {
    let (res, out) = test_run::<HeightBalanced>("insert 1\nbogus\ninsert 2\n");
    assert!(matches!(res, Err(ScriptError::Parse{line: 2, ..})));
    assert_eq!(out, "inserted 1\n");
}
