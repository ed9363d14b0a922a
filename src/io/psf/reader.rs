use log::warn;

use crate::io::section::{Marker, Section, SectionGrammar, number};
use crate::io::{Format, error::Error};
use crate::model::molecule::Molecule;

const FORMAT: Format = Format::Psf;

/// Reads CHARMM/X-PLOR PSF files. Only the title and atom sections are
/// interpreted; connectivity sections are skipped.
#[derive(Debug, Default)]
pub struct PsfGrammar;

/// Count and section keyword of a `N !KEYWORD` line, if it is one.
fn section_header(line: &str) -> Option<(&str, &str)> {
    let mut words = line.split_whitespace();
    let count = words.next()?;
    let keyword = words.next()?.strip_prefix('!')?;
    Some((count, keyword.trim_end_matches(':')))
}

fn declared(section: &Section) -> Result<usize, Error> {
    let header = section.lines.first().map_or("", |l| l.text.as_str());
    let count = section_header(header).map_or("", |(count, _)| count);
    number(FORMAT, section.start, count, "section count")
}

impl SectionGrammar for PsfGrammar {
    const FORMAT: Format = Format::Psf;

    fn classify(
        &mut self,
        _line_no: usize,
        line: &str,
        _next: Option<&str>,
        _current: Option<&str>,
    ) -> Result<Option<Marker>, Error> {
        if line.trim_start().starts_with("REMARK ") {
            return Ok(Some(Marker::Skip));
        }
        Ok(section_header(line).map(|(_, keyword)| Marker::Open(keyword.to_string())))
    }

    fn process(&mut self, mol: &mut Molecule, section: &Section) -> Result<(), Error> {
        match section.name.as_str() {
            "NTITLE" => {
                let remarks: Vec<&str> = section
                    .lines
                    .iter()
                    .skip(1)
                    .map(|l| {
                        let text = l.text.trim();
                        text.strip_prefix("REMARKS")
                            .or_else(|| text.strip_prefix('*'))
                            .unwrap_or(text)
                            .trim()
                    })
                    .collect();
                if let Some(first) = remarks.iter().find(|r| !r.is_empty()) {
                    mol.title = Some(first.to_string());
                }
                for remark in remarks {
                    mol.description.push_str(remark);
                    mol.description.push('\n');
                }
            }
            "NATOM" => {
                let expected = declared(section)?;
                let rows = &section.lines[1..];
                for l in rows {
                    let f: Vec<&str> = l.text.split_whitespace().collect();
                    if f.len() < 8 {
                        return Err(Error::parse(
                            FORMAT,
                            l.no,
                            format!("atom record needs 8 fields, found {}", f.len()),
                        ));
                    }
                    let resid: i32 = number(FORMAT, l.no, f[2], "residue id")?;
                    mol.atom_segment.push(f[1].to_string());
                    mol.atom_resid.push(resid - 1);
                    mol.atom_resname.push(f[3].to_string());
                    mol.atom_name.push(f[4].to_string());
                    mol.atom_type.push(f[5].to_string());
                    mol.atom_q.push(number(FORMAT, l.no, f[6], "charge")?);
                    mol.atom_mass.push(number(FORMAT, l.no, f[7], "mass")?);
                }
                if rows.len() != expected {
                    return Err(Error::count_mismatch(FORMAT, "NATOM", expected, rows.len()));
                }
            }
            other => warn!(
                "PSF section {other} at line {} is not read, skipping",
                section.start
            ),
        }
        Ok(())
    }
}
