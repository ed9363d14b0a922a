//! Line-oriented section parsing shared by every text reader.
//!
//! A [`SectionGrammar`] decides for each line whether it opens a section,
//! sets the column layout of the current one, is dropped, or is plain data.
//! [`SectionReader`] buffers the lines of the current section and hands the
//! finished [`Section`] to the grammar whenever a different section opens and
//! once more at end of input.

use super::{Format, error::Error};
use crate::model::molecule::Molecule;
use log::debug;
use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
}

/// A Fortran-style column descriptor such as `10I8`, `5E16.8` or `20a4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnFormat {
    pub count: usize,
    pub kind: ColumnKind,
    pub width: usize,
}

impl ColumnFormat {
    /// Parses a descriptor, with or without surrounding parentheses.
    pub fn parse(descriptor: &str) -> Option<Self> {
        let d = descriptor
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .trim();

        let kind_at = d.find(|c: char| c.is_ascii_alphabetic())?;
        let count = match &d[..kind_at] {
            "" => 1,
            digits => digits.parse().ok()?,
        };
        let kind = match d[kind_at..].chars().next()?.to_ascii_uppercase() {
            'I' => ColumnKind::Integer,
            'E' | 'F' | 'D' | 'G' => ColumnKind::Real,
            'A' => ColumnKind::Text,
            _ => return None,
        };
        let rest = &d[kind_at + 1..];
        let width: usize = rest.split('.').next()?.parse().ok()?;
        if width == 0 || count == 0 {
            return None;
        }
        Some(Self { count, kind, width })
    }

    /// Splits a line into trimmed fields of `width` characters, dropping
    /// empty fields.
    pub fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        split_fixed(line, self.width)
    }
}

pub fn split_fixed(line: &str, width: usize) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut start = 0;
    while start < line.len() {
        let end = (start + width).min(line.len());
        match line.get(start..end) {
            Some(field) => {
                let field = field.trim();
                if !field.is_empty() {
                    fields.push(field);
                }
            }
            None => return line.split_whitespace().collect(),
        }
        start = end;
    }
    fields
}

/// What a classified line means to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    /// Opens (or continues) a section; the line itself belongs to it.
    Open(String),
    /// Opens a section; the line is only a header and is not buffered.
    Header(String),
    /// Sets the column layout of the current section.
    Format(ColumnFormat),
    /// Drops the line.
    Skip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub no: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub start: usize,
    pub lines: Vec<Line>,
    pub format: Option<ColumnFormat>,
}

impl Section {
    fn new(name: String, start: usize) -> Self {
        Self {
            name,
            start,
            lines: Vec::new(),
            format: None,
        }
    }

    /// All data fields of the section with their line numbers: fixed-width
    /// when a numeric descriptor is set, whitespace separated otherwise.
    pub fn fields(&self) -> Vec<(usize, &str)> {
        self.lines
            .iter()
            .flat_map(|l| {
                let fields = match self.format {
                    Some(f) if f.kind != ColumnKind::Text => f.split(&l.text),
                    _ => l.text.split_whitespace().collect(),
                };
                fields.into_iter().map(move |field| (l.no, field))
            })
            .collect()
    }

    /// Line number to report for problems that cannot be tied to one line.
    pub fn line_no(&self) -> usize {
        self.lines.first().map_or(self.start, |l| l.no)
    }
}

pub trait SectionGrammar {
    const FORMAT: Format;

    /// Classifies one non-blank line. `next` is the following raw line, if
    /// any, and `current` the name of the open section.
    fn classify(
        &mut self,
        line_no: usize,
        line: &str,
        next: Option<&str>,
        current: Option<&str>,
    ) -> Result<Option<Marker>, Error>;

    /// Consumes a finished section.
    fn process(&mut self, mol: &mut Molecule, section: &Section) -> Result<(), Error>;

    /// Called once after the last section has been processed.
    fn finish(&mut self, _mol: &mut Molecule) -> Result<(), Error> {
        Ok(())
    }
}

pub struct SectionReader<'g, G: SectionGrammar> {
    grammar: &'g mut G,
    current: Option<Section>,
}

impl<'g, G: SectionGrammar> SectionReader<'g, G> {
    pub fn new(grammar: &'g mut G) -> Self {
        Self {
            grammar,
            current: None,
        }
    }

    /// Reads every line of `reader` into `mol`.
    pub fn read_into(mut self, reader: &mut dyn BufRead, mol: &mut Molecule) -> Result<(), Error> {
        let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;

        for (i, raw) in lines.iter().enumerate() {
            let line = raw.trim_end();
            if line.trim_start().is_empty() {
                continue;
            }
            let line_no = i + 1;
            let next = lines.get(i + 1).map(|l| l.trim_end());
            let current = self.current.as_ref().map(|s| s.name.as_str());

            match self.grammar.classify(line_no, line, next, current)? {
                None => self.push(line_no, line),
                Some(Marker::Open(name)) => {
                    self.open(mol, name, line_no)?;
                    self.push(line_no, line);
                }
                Some(Marker::Header(name)) => self.open(mol, name, line_no)?,
                Some(Marker::Format(format)) => match self.current.as_mut() {
                    Some(section) => section.format = Some(format),
                    None => debug!("{}: column format at line {line_no} outside any section", G::FORMAT),
                },
                Some(Marker::Skip) => {}
            }
        }

        self.flush(mol)?;
        self.grammar.finish(mol)
    }

    fn push(&mut self, no: usize, text: &str) {
        if let Some(section) = self.current.as_mut() {
            section.lines.push(Line {
                no,
                text: text.to_string(),
            });
        }
    }

    fn open(&mut self, mol: &mut Molecule, name: String, line_no: usize) -> Result<(), Error> {
        if self.current.as_ref().is_some_and(|s| s.name == name) {
            return Ok(());
        }
        self.flush(mol)?;
        debug!("{}: section {name} at line {line_no}", G::FORMAT);
        self.current = Some(Section::new(name, line_no));
        Ok(())
    }

    fn flush(&mut self, mol: &mut Molecule) -> Result<(), Error> {
        match self.current.take() {
            Some(section) => self.grammar.process(mol, &section),
            None => Ok(()),
        }
    }
}

/// Parses one numeric field, reporting the offending line on failure.
pub fn number<T: std::str::FromStr>(
    format: Format,
    line: usize,
    field: &str,
    what: &str,
) -> Result<T, Error> {
    field
        .trim()
        .parse()
        .map_err(|_| Error::parse(format, line, format!("invalid {what} '{field}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<(String, Vec<String>, Option<ColumnFormat>)>,
        finished: bool,
    }

    impl SectionGrammar for Recorder {
        const FORMAT: Format = Format::Parm7;

        fn classify(
            &mut self,
            line_no: usize,
            line: &str,
            _next: Option<&str>,
            _current: Option<&str>,
        ) -> Result<Option<Marker>, Error> {
            if let Some(name) = line.strip_prefix("%FLAG ") {
                return Ok(Some(Marker::Header(name.trim().to_string())));
            }
            if let Some(desc) = line.strip_prefix("%FORMAT") {
                return ColumnFormat::parse(desc)
                    .map(|f| Some(Marker::Format(f)))
                    .ok_or_else(|| Error::parse(Self::FORMAT, line_no, "bad format"));
            }
            if line.starts_with("%OPEN") {
                return Ok(Some(Marker::Open("OPEN".into())));
            }
            if line.starts_with('!') {
                return Ok(Some(Marker::Skip));
            }
            Ok(None)
        }

        fn process(&mut self, _mol: &mut Molecule, section: &Section) -> Result<(), Error> {
            self.seen.push((
                section.name.clone(),
                section.lines.iter().map(|l| l.text.clone()).collect(),
                section.format,
            ));
            Ok(())
        }

        fn finish(&mut self, _mol: &mut Molecule) -> Result<(), Error> {
            self.finished = true;
            Ok(())
        }
    }

    fn run(text: &str) -> Result<Recorder, Error> {
        let mut grammar = Recorder::default();
        let mut mol = Molecule::new();
        SectionReader::new(&mut grammar).read_into(&mut Cursor::new(text), &mut mol)?;
        Ok(grammar)
    }

    #[test]
    fn column_format_parses_fortran_descriptors() {
        let f = ColumnFormat::parse("10I8").unwrap();
        assert_eq!((f.count, f.kind, f.width), (10, ColumnKind::Integer, 8));
        let f = ColumnFormat::parse("(5E16.8)").unwrap();
        assert_eq!((f.count, f.kind, f.width), (5, ColumnKind::Real, 16));
        let f = ColumnFormat::parse("20a4").unwrap();
        assert_eq!((f.count, f.kind, f.width), (20, ColumnKind::Text, 4));
        let f = ColumnFormat::parse("a80").unwrap();
        assert_eq!((f.count, f.kind, f.width), (1, ColumnKind::Text, 80));
        assert!(ColumnFormat::parse("10X8").is_none());
        assert!(ColumnFormat::parse("").is_none());
    }

    #[test]
    fn fixed_width_split_handles_touching_fields() {
        let f = ColumnFormat::parse("10I8").unwrap();
        assert_eq!(f.split("       1  123456-1234567"), vec!["1", "123456", "-1234567"]);
        assert_eq!(split_fixed("C1  H1  O   ", 4), vec!["C1", "H1", "O"]);
    }

    #[test]
    fn sections_flush_in_order_and_finish_runs() {
        let text = "preamble\n%FLAG A\n%FORMAT(10I8)\n  1  2\n\n   3\n%FLAG B\nx y\n";
        let g = run(text).unwrap();
        assert!(g.finished);
        assert_eq!(g.seen.len(), 2);
        assert_eq!(g.seen[0].0, "A");
        assert_eq!(g.seen[0].1, vec!["  1  2", "   3"]);
        assert_eq!(g.seen[0].2.map(|f| f.width), Some(8));
        assert_eq!(g.seen[1].0, "B");
        assert_eq!(g.seen[1].2, None);
    }

    #[test]
    fn open_markers_buffer_their_line_and_reopen_is_noop() {
        let text = "%OPEN one\ndata\n%OPEN two\n! dropped\nmore\n";
        let g = run(text).unwrap();
        assert_eq!(g.seen.len(), 1);
        assert_eq!(g.seen[0].1, vec!["%OPEN one", "data", "%OPEN two", "more"]);
    }

    #[test]
    fn empty_input_only_finishes() {
        let g = run("").unwrap();
        assert!(g.seen.is_empty());
        assert!(g.finished);
    }

    #[test]
    fn classifier_errors_carry_the_line() {
        let err = run("%FLAG A\n%FORMAT(bogus)\n").err().unwrap();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn section_fields_use_the_descriptor() {
        let section = Section {
            name: "X".into(),
            start: 1,
            lines: vec![Line {
                no: 2,
                text: "  1.00000000E+00 -2.50000000E-01".into(),
            }],
            format: ColumnFormat::parse("5E16.8"),
        };
        assert_eq!(
            section.fields(),
            vec![(2, "1.00000000E+00"), (2, "-2.50000000E-01")]
        );
        assert_eq!(section.line_no(), 2);
    }
}
