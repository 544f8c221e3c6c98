//! Streaming reader for MDL molfiles and SD files (V2000).
//!
//! Each record becomes one [`Molecule`]. Placeholder atoms are recognised from
//! `A  ` alias lines (the alias text is the label) and from `M  RGP` entries
//! (labelled `R<n>`). Data items after `M  END` are skipped.

use std::{io::BufRead, ops::Range};

use crate::{
    error::ParseError,
    format::Format,
    molecule::{Atom, AtomId, Bond, Element, Molecule},
};

/// Reads molecules one record at a time from an SD stream.
pub struct MolReader<R> {
    reader: R,
    line: usize,
}

impl<R: BufRead> MolReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line: 0 }
    }

    /// Read the next record. Returns `Ok(None)` once the stream is exhausted.
    ///
    /// A record that fails to parse is consumed up to its `$$$$` terminator,
    /// so the following call starts cleanly at the next record.
    pub fn read_next(&mut self) -> Result<Option<Molecule>, ParseError> {
        match self.next_block()? {
            Some(block) => parse_block(&block).map(Some),
            None => Ok(None),
        }
    }

    fn next_block(&mut self) -> Result<Option<Vec<(usize, String)>>, ParseError> {
        let mut lines = Vec::new();
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.reader.read_line(&mut buf)? == 0 {
                break;
            }
            self.line += 1;
            let content = buf.trim_end_matches(['\n', '\r']);
            if content.trim() == "$$$$" {
                if lines.is_empty() {
                    continue;
                }
                return Ok(Some(lines));
            }
            lines.push((self.line, content.to_string()));
        }

        if lines.iter().all(|(_, l)| l.trim().is_empty()) {
            Ok(None)
        } else {
            Ok(Some(lines))
        }
    }
}

impl<R: BufRead> Iterator for MolReader<R> {
    type Item = Result<Molecule, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

/// Parse the first molecule of a `.mol` / SD text.
pub fn parse_molfile_str(input: &str) -> Result<Molecule, ParseError> {
    MolReader::new(input.as_bytes())
        .read_next()?
        .ok_or_else(|| ParseError::syntax(Format::Sdf, 1, "no molecule found"))
}

fn err(line: usize, details: impl Into<String>) -> ParseError {
    ParseError::syntax(Format::Sdf, line, details)
}

fn field(raw: &str, range: Range<usize>) -> &str {
    let end = range.end.min(raw.len());
    let start = range.start.min(end);
    raw.get(start..end).unwrap_or("").trim()
}

fn parse_block(lines: &[(usize, String)]) -> Result<Molecule, ParseError> {
    let last_line = lines.last().map(|(ln, _)| *ln).unwrap_or(1);
    if lines.len() < 4 {
        return Err(err(
            last_line,
            "record must contain a three-line header and a counts line",
        ));
    }

    let mut mol = Molecule::new(lines[0].1.trim());

    let (counts_no, counts_line) = (lines[3].0, &lines[3].1);
    if counts_line.contains("V3000") {
        return Err(err(counts_no, "V3000 is not supported"));
    }
    let (num_atoms, num_bonds) = parse_counts_line(counts_line, counts_no)?;

    let atom_start = 4;
    let bond_start = atom_start + num_atoms;
    let props_start = bond_start + num_bonds;
    if lines.len() < props_start {
        return Err(err(
            last_line,
            "record ended before atoms/bonds were fully specified",
        ));
    }

    let mut ids = Vec::with_capacity(num_atoms);
    for (ln, raw) in &lines[atom_start..bond_start] {
        ids.push(mol.add_atom(parse_atom_line(raw, *ln)?));
    }

    for (ln, raw) in &lines[bond_start..props_start] {
        let (a, b, bond) = parse_bond_line(raw, *ln, num_atoms)?;
        if !mol.add_bond(ids[a - 1], ids[b - 1], bond) {
            return Err(err(*ln, "self-loop or duplicate bond"));
        }
    }

    parse_properties(&mut mol, &ids, &lines[props_start..])?;
    Ok(mol)
}

fn parse_counts_line(line: &str, ln: usize) -> Result<(usize, usize), ParseError> {
    let atoms = field(line, 0..3)
        .parse()
        .map_err(|_| err(ln, "invalid atom count"))?;
    let bonds = field(line, 3..6)
        .parse()
        .map_err(|_| err(ln, "invalid bond count"))?;
    Ok((atoms, bonds))
}

fn parse_atom_line(raw: &str, ln: usize) -> Result<Atom, ParseError> {
    let coord = |range: Range<usize>, axis: &str| {
        field(raw, range)
            .parse::<f64>()
            .map_err(|_| err(ln, format!("invalid {axis} coordinate in atom line")))
    };
    let position = [coord(0..10, "x")?, coord(10..20, "y")?, coord(20..30, "z")?];

    let symbol = field(raw, 31..34);
    let element: Element = symbol
        .parse()
        .map_err(|_| err(ln, format!("unknown element symbol '{symbol}'")))?;

    let charge = match field(raw, 36..39) {
        "" => 0,
        code => charge_from_code(
            code.parse()
                .map_err(|_| err(ln, "invalid charge code in atom line"))?,
        ),
    };

    Ok(Atom::new(element, position).with_charge(charge))
}

fn charge_from_code(code: u8) -> i8 {
    match code {
        1 => 3,
        2 => 2,
        3 => 1,
        5 => -1,
        6 => -2,
        7 => -3,
        _ => 0,
    }
}

fn parse_bond_line(raw: &str, ln: usize, num_atoms: usize) -> Result<(usize, usize, Bond), ParseError> {
    let index = |range: Range<usize>| {
        field(raw, range)
            .parse::<usize>()
            .map_err(|_| err(ln, "invalid atom number in bond line"))
    };
    let (a, b) = (index(0..3)?, index(3..6)?);
    if a == 0 || b == 0 || a > num_atoms || b > num_atoms {
        return Err(err(ln, "bond references atom outside declared range"));
    }

    let bond = index(6..9)
        .ok()
        .and_then(|code| Bond::try_from(code).ok())
        .ok_or_else(|| err(ln, "unsupported bond type in bond line"))?;
    Ok((a, b, bond))
}

/// Read `(atom number, value)` pairs from an `M  CHG`-style property line.
fn property_pairs(raw: &str, ln: usize, num_atoms: usize) -> Result<Vec<(usize, i32)>, ParseError> {
    let tokens: Vec<&str> = raw.get(6..).unwrap_or("").split_whitespace().collect();
    let Some((count, rest)) = tokens.split_first() else {
        return Err(err(ln, "property line without entry count"));
    };
    let count: usize = count
        .parse()
        .map_err(|_| err(ln, "invalid entry count in property line"))?;
    if rest.len() < 2 * count {
        return Err(err(ln, "property line has fewer entries than declared"));
    }

    rest.chunks(2)
        .take(count)
        .map(|pair| {
            let atom: usize = pair[0]
                .parse()
                .map_err(|_| err(ln, "invalid atom number in property line"))?;
            let value: i32 = pair[1]
                .parse()
                .map_err(|_| err(ln, "invalid value in property line"))?;
            if atom == 0 || atom > num_atoms {
                return Err(err(ln, "property references atom outside declared range"));
            }
            Ok((atom, value))
        })
        .collect()
}

fn parse_properties(mol: &mut Molecule, ids: &[AtomId], lines: &[(usize, String)]) -> Result<(), ParseError> {
    let mut charges_reset = false;
    let mut iter = lines.iter();
    while let Some((ln, raw)) = iter.next() {
        if raw.starts_with("M  END") {
            break;
        } else if raw.starts_with("M  CHG") {
            // Any CHG line supersedes every charge given in the atom block.
            if !charges_reset {
                for id in ids {
                    if let Some(atom) = mol.atom_mut(*id) {
                        atom.set_charge(0);
                    }
                }
                charges_reset = true;
            }
            for (atom, value) in property_pairs(raw, *ln, ids.len())? {
                let charge = i8::try_from(value).map_err(|_| err(*ln, "charge out of range"))?;
                if let Some(a) = mol.atom_mut(ids[atom - 1]) {
                    a.set_charge(charge);
                }
            }
        } else if raw.starts_with("M  RGP") {
            for (atom, rgroup) in property_pairs(raw, *ln, ids.len())? {
                mol.set_alias(ids[atom - 1], format!("R{rgroup}"));
            }
        } else if raw.starts_with("A  ") {
            let atom: usize = field(raw, 3..6)
                .parse()
                .map_err(|_| err(*ln, "invalid atom number in alias line"))?;
            if atom == 0 || atom > ids.len() {
                return Err(err(*ln, "alias references atom outside declared range"));
            }
            let Some((_, text)) = iter.next() else {
                return Err(err(*ln, "alias line without alias text"));
            };
            let text = text.trim();
            if !text.is_empty() {
                mol.set_alias(ids[atom - 1], text);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELLED: &str = "\
methylamine-R
  test

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5000    0.0000    0.0000 N   0  3  0  0  0  0  0  0  0  0  0  0
   -0.7500    1.2990    0.0000 R#  0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  1  3  1  0
M  CHG  1   2   1
M  RGP  1   3   2
M  END
> <ID>
42

$$$$
";

    #[test]
    fn parses_atoms_bonds_and_properties() {
        let mol = parse_molfile_str(LABELLED).unwrap();
        assert_eq!(mol.title(), "methylamine-R");
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);

        let atoms: Vec<_> = mol.atoms().map(|(_, a)| (a.element(), a.charge())).collect();
        assert_eq!(
            atoms,
            vec![
                (Element::Carbon, 0),
                (Element::Nitrogen, 1),
                (Element::Dummy, 0),
            ]
        );

        let placeholders: Vec<_> = mol.placeholders().map(|(_, l)| l.to_string()).collect();
        assert_eq!(placeholders, vec!["R2"]);
    }

    #[test]
    fn reads_alias_lines() {
        let text = "\
scaffold


  2  1  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
A    2
R7
M  END
";
        let mol = parse_molfile_str(text).unwrap();
        let labels: Vec<_> = mol.placeholders().map(|(_, l)| l.to_string()).collect();
        assert_eq!(labels, vec!["R7"]);
    }

    #[test]
    fn streams_records_until_exhausted() {
        let two = format!("{LABELLED}{LABELLED}\n");
        let mut reader = MolReader::new(two.as_bytes());
        assert!(reader.read_next().unwrap().is_some());
        assert!(reader.read_next().unwrap().is_some());
        assert!(reader.read_next().unwrap().is_none());
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn rejects_v3000() {
        let text = "x\n\n\n  0  0  0     0  0            999 V3000\nM  END\n";
        let e = parse_molfile_str(text).unwrap_err();
        assert!(matches!(e, ParseError::Syntax { line: 4, .. }), "{e}");
    }

    #[test]
    fn resynchronises_after_bad_record() {
        let bad = LABELLED.replace("  1  3  1  0", "  1  9  1  0");
        let stream = format!("{bad}{LABELLED}");
        let mut reader = MolReader::new(stream.as_bytes());

        match reader.read_next() {
            Err(ParseError::Syntax { line, .. }) => assert_eq!(line, 9),
            other => panic!("expected syntax error, got {other:?}"),
        }
        let good = reader.read_next().unwrap().unwrap();
        assert_eq!(good.atom_count(), 3);
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn truncated_record_is_an_error() {
        let text = "t\n\n\n  3  0  0  0  0  0  0  0  0  0999 V2000\n    0.0000    0.0000    0.0000 C   0  0\n";
        assert!(parse_molfile_str(text).is_err());
    }
}
