//! Streaming SD (V2000) writer.

use std::{collections::HashMap, io::Write};

use crate::molecule::{AtomId, Molecule};

/// Writes molecules as consecutive SD records.
pub struct MolWriter<W: Write> {
    writer: W,
}

impl<W: Write> MolWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write `mol` as one record terminated by `$$$$`.
    ///
    /// Atoms are numbered from 1 in handle order, so holes left by removed
    /// atoms never reach the output.
    pub fn write(&mut self, mol: &Molecule) -> std::io::Result<()> {
        let serial: HashMap<AtomId, usize> = mol
            .atoms()
            .enumerate()
            .map(|(i, (id, _))| (id, i + 1))
            .collect();
        let w = &mut self.writer;

        writeln!(w, "{}", mol.title())?;
        writeln!(w, "  {:<8}{:<10}2D", "rgenum", "")?;
        writeln!(w)?;
        writeln!(
            w,
            "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000",
            mol.atom_count(),
            mol.bond_count()
        )?;

        for (_, atom) in mol.atoms() {
            let [x, y, z] = atom.position();
            writeln!(
                w,
                "{x:>10.4}{y:>10.4}{z:>10.4} {:<3} 0  0  0  0  0  0  0  0  0  0  0  0",
                atom.element().to_string()
            )?;
        }

        for (a, b, bond) in mol.bonds() {
            writeln!(w, "{:>3}{:>3}{:>3}  0", serial[&a], serial[&b], bond.code())?;
        }

        let charged: Vec<(usize, i8)> = mol
            .atoms()
            .filter(|(_, a)| a.charge() != 0)
            .map(|(id, a)| (serial[&id], a.charge()))
            .collect();
        for chunk in charged.chunks(8) {
            write!(w, "M  CHG{:>3}", chunk.len())?;
            for (atom, charge) in chunk {
                write!(w, " {atom:>3} {charge:>3}")?;
            }
            writeln!(w)?;
        }

        for (id, label) in mol.placeholders() {
            writeln!(w, "A  {:>3}", serial[&id])?;
            writeln!(w, "{label}")?;
        }

        writeln!(w, "M  END")?;
        writeln!(w, "$$$$")?;
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        loader::{parse_molfile_str, MolReader},
        molecule::{Atom, Bond, Element},
    };

    fn acetate_with_hole() -> Molecule {
        let mut mol = Molecule::new("acetate");
        let c1 = mol.add_atom(Atom::new(Element::Carbon, [0.0, 0.0, 0.0]));
        let gone = mol.add_atom(Atom::new(Element::Dummy, [-1.0, 0.0, 0.0]));
        let c2 = mol.add_atom(Atom::new(Element::Carbon, [1.5, 0.0, 0.0]));
        let o1 = mol.add_atom(Atom::new(Element::Oxygen, [2.25, 1.3, 0.0]));
        let o2 = mol.add_atom(Atom::new(Element::Oxygen, [2.25, -1.3, 0.0]).with_charge(-1));
        mol.add_bond(c1, gone, Bond::Single);
        mol.add_bond(c1, c2, Bond::Single);
        mol.add_bond(c2, o1, Bond::Double);
        mol.add_bond(c2, o2, Bond::Single);
        mol.remove_atom(gone);
        mol
    }

    #[test]
    fn compacts_atom_numbers() {
        let mut writer = MolWriter::new(Vec::new());
        writer.write(&acetate_with_hole()).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();

        assert!(text.contains("\n  4  3  0  0  0  0  0  0  0  0999 V2000\n"));
        assert!(text.contains("\n  1  2  1  0\n"));
        assert!(text.contains("\n  2  3  2  0\n"));
        assert!(text.contains("\nM  CHG  1   4  -1\n"));
        assert!(text.ends_with("M  END\n$$$$\n"));
    }

    #[test]
    fn output_reads_back() {
        let mut mol = acetate_with_hole();
        let first = mol.atoms().next().map(|(id, _)| id).unwrap();
        mol.set_alias(first, "R3");

        let mut writer = MolWriter::new(Vec::new());
        writer.write(&mol).unwrap();
        writer.write(&mol).unwrap();
        let bytes = writer.into_inner();

        let text = String::from_utf8(bytes.clone()).unwrap();
        let back = parse_molfile_str(&text).unwrap();
        assert_eq!(back.title(), "acetate");
        assert_eq!(back.atom_count(), 4);
        assert_eq!(back.bond_count(), 3);
        assert_eq!(back.placeholders().map(|(_, l)| l).collect::<Vec<_>>(), vec!["R3"]);
        let charges: Vec<i8> = back.atoms().map(|(_, a)| a.charge()).collect();
        assert_eq!(charges, vec![0, 0, 0, -1]);

        assert_eq!(MolReader::new(bytes.as_slice()).count(), 2);
    }
}
