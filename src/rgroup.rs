//! Label map, substituent registry, and the loader that fills them.
//!
//! The first record of the input is the scaffold; every labelled placeholder
//! atom on it marks an attachment site. Every later record is a candidate
//! substituent and must carry exactly one labelled placeholder, which names
//! the label it is registered under and marks its own attachment atom (the
//! "stub"). Placeholders are deleted once their site has been recorded.

use std::io::BufRead;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::{
    enumerate::Enumerator,
    error::{LoadError, ParseError},
    loader::MolReader,
    molecule::{AtomId, Bond, Molecule},
};

/// An attachment site on the scaffold.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Site {
    /// The real atom that was bonded to the placeholder.
    pub atom: AtomId,
    /// xy offset from `atom` to the removed placeholder.
    pub bond_vector: [f64; 2],
}

impl Site {
    pub fn new(atom: AtomId) -> Self {
        Self {
            atom,
            bond_vector: [0.0, 0.0],
        }
    }
}

/// Attachment sites of the scaffold by label, in order of discovery.
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    sites: IndexMap<String, Site>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `site` under `label`, returning the site it replaces.
    pub fn insert(&mut self, label: impl Into<String>, site: Site) -> Option<Site> {
        self.sites.insert(label.into(), site)
    }

    pub fn get(&self, label: &str) -> Option<&Site> {
        self.sites.get(label)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Site)> {
        self.sites.iter().map(|(l, s)| (l.as_str(), s))
    }
}

/// One candidate substituent.
#[derive(Debug, Clone)]
pub struct RGroup {
    pub label: String,
    /// The fragment with its placeholder already removed.
    pub molecule: Molecule,
    /// The atom of `molecule` that bonds to the scaffold site.
    pub stub: AtomId,
    /// xy offset from `stub` to the removed placeholder.
    pub bond_vector: [f64; 2],
    /// Order of the bond formed with the scaffold.
    pub order: Bond,
}

impl RGroup {
    pub fn new(label: impl Into<String>, molecule: Molecule, stub: AtomId) -> Self {
        Self {
            label: label.into(),
            molecule,
            stub,
            bond_vector: [0.0, 0.0],
            order: Bond::Single,
        }
    }

    pub fn with_order(mut self, order: Bond) -> Self {
        self.order = order;
        self
    }

    pub fn name(&self) -> &str {
        self.molecule.title()
    }
}

/// Candidate substituents by label. Labels keep the order in which they were
/// first seen; candidates keep registration order.
#[derive(Debug, Clone, Default)]
pub struct RGroupRegistry {
    groups: IndexMap<String, Vec<RGroup>>,
}

impl RGroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, rgroup: RGroup) {
        self.groups
            .entry(rgroup.label.clone())
            .or_default()
            .push(rgroup);
    }

    pub fn candidates(&self, label: &str) -> &[RGroup] {
        self.groups.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Return the `depth`-th label together with its candidates.
    pub fn get_index(&self, depth: usize) -> Option<(&str, &[RGroup])> {
        self.groups
            .get_index(depth)
            .map(|(l, c)| (l.as_str(), c.as_slice()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Counts of how the substituent records of an input were classified.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records registered as substituents.
    pub accepted: usize,
    /// Records without a labelled placeholder.
    pub unlabelled: usize,
    /// Records with several placeholders or a badly bonded one.
    pub rejected: usize,
    /// Records that could not be parsed.
    pub unreadable: usize,
}

/// A labelled placeholder and the real atom it is bonded to.
#[derive(Debug)]
struct Anchor {
    placeholder: AtomId,
    label: String,
    atom: AtomId,
    order: Bond,
    bond_vector: [f64; 2],
}

/// Resolve the single real neighbour of `placeholder`, or return how many
/// usable neighbours it has.
fn anchor_of(mol: &Molecule, placeholder: AtomId, label: &str) -> Result<Anchor, usize> {
    let neighbors: Vec<AtomId> = mol
        .neighbors(placeholder)
        .filter(|n| mol.alias(*n).is_none())
        .collect();
    let [atom] = neighbors[..] else {
        return Err(neighbors.len());
    };

    let order = mol.bond_between(placeholder, atom).unwrap_or(Bond::Single);
    let bond_vector = match (mol.atom(placeholder), mol.atom(atom)) {
        (Some(p), Some(a)) => {
            let (p, a) = (p.position(), a.position());
            [p[0] - a[0], p[1] - a[1]]
        }
        _ => [0.0, 0.0],
    };

    Ok(Anchor {
        placeholder,
        label: label.to_string(),
        atom,
        order,
        bond_vector,
    })
}

fn placeholders_of(mol: &Molecule) -> Vec<(AtomId, String)> {
    mol.placeholders()
        .map(|(id, label)| (id, label.to_string()))
        .collect()
}

/// Record every labelled site of `scaffold` and remove its placeholders.
///
/// The scaffold is compacted afterwards, so atoms grafted onto it later are
/// numbered after its own.
pub fn clean_scaffold(scaffold: &mut Molecule) -> LabelMap {
    let mut sites = LabelMap::new();
    let placeholders = placeholders_of(scaffold);

    for (id, label) in &placeholders {
        match anchor_of(scaffold, *id, label) {
            Ok(anchor) => {
                info!("{} -> {}", anchor.label, anchor.atom.index() + 1);
                let site = Site {
                    atom: anchor.atom,
                    bond_vector: anchor.bond_vector,
                };
                if sites.insert(anchor.label, site).is_some() {
                    warn!("Scaffold label {label} appears more than once; using the last site");
                }
            }
            Err(n) => warn!(
                "Scaffold placeholder {label} (atom {}) has {n} neighbours instead of 1; ignored",
                id.index() + 1
            ),
        }
    }

    for (id, _) in placeholders {
        scaffold.remove_atom(id);
    }
    let io_map = scaffold.compact();
    for site in sites.sites.values_mut() {
        if let Some(&atom) = io_map.get(&site.atom) {
            site.atom = atom;
        }
    }
    sites
}

/// Outcome of classifying one substituent record.
#[derive(Debug)]
pub enum Classified {
    Accepted(RGroup),
    Unlabelled,
    Rejected,
}

/// Turn one substituent record into an [`RGroup`].
pub fn classify_substituent(mut mol: Molecule) -> Classified {
    let placeholders = placeholders_of(&mol);
    let (id, label) = match placeholders.as_slice() {
        [] => return Classified::Unlabelled,
        [only] => only,
        _ => {
            warn!(
                "Error: substituent '{}' has more than one R# ({}); ignored",
                mol.title(),
                placeholders.len()
            );
            return Classified::Rejected;
        }
    };

    let anchor = match anchor_of(&mol, *id, label) {
        Ok(anchor) => anchor,
        Err(n) => {
            warn!(
                "Substituent '{}' placeholder {label} has {n} neighbours instead of 1; ignored",
                mol.title()
            );
            return Classified::Rejected;
        }
    };
    info!("{} -> {}", anchor.label, anchor.atom.index() + 1);

    mol.remove_atom(anchor.placeholder);
    let Some(&stub) = mol.compact().get(&anchor.atom) else {
        return Classified::Rejected;
    };
    let order = match anchor.order {
        Bond::Aromatic => Bond::Single,
        order => order,
    };
    let mut rgroup = RGroup::new(anchor.label, mol, stub).with_order(order);
    rgroup.bond_vector = anchor.bond_vector;
    Classified::Accepted(rgroup)
}

/// A scaffold with its attachment sites and candidate substituents.
#[derive(Debug, Clone)]
pub struct Library {
    /// The scaffold with its placeholders removed.
    pub scaffold: Molecule,
    pub sites: LabelMap,
    pub rgroups: RGroupRegistry,
    pub report: LoadReport,
}

impl Library {
    /// Read a scaffold followed by its substituents from `reader`.
    ///
    /// Only a missing or unreadable scaffold (or an I/O failure) is an error;
    /// bad substituent records are logged and skipped.
    pub fn load<R: BufRead>(reader: &mut MolReader<R>) -> Result<Self, LoadError> {
        let mut scaffold = reader
            .read_next()
            .map_err(LoadError::Scaffold)?
            .ok_or(LoadError::MissingScaffold)?;
        let sites = clean_scaffold(&mut scaffold);

        info!("Searching for R# substituents...");
        let mut rgroups = RGroupRegistry::new();
        let mut report = LoadReport::default();
        let mut record = 1;
        loop {
            record += 1;
            let mol = match reader.read_next() {
                Ok(Some(mol)) => mol,
                Ok(None) => break,
                Err(ParseError::Io { source }) => return Err(LoadError::Io(source)),
                Err(e) => {
                    warn!("Skipping unreadable record {record}: {e}");
                    report.unreadable += 1;
                    continue;
                }
            };

            match classify_substituent(mol) {
                Classified::Accepted(rgroup) => {
                    rgroups.register(rgroup);
                    report.accepted += 1;
                }
                Classified::Unlabelled => {
                    debug!("Record {record} has no R# placeholder; not a substituent");
                    report.unlabelled += 1;
                }
                Classified::Rejected => report.rejected += 1,
            }
        }

        Ok(Self {
            scaffold,
            sites,
            rgroups,
            report,
        })
    }

    /// Return an enumerator over this library's products.
    pub fn enumerator(&self) -> Enumerator<'_> {
        Enumerator::new(&self.sites, &self.rgroups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        molecule::{Atom, Element},
        writer::MolWriter,
    };

    /// A chain of `n` carbons along x with placeholders hanging off the given
    /// atoms.
    fn chain(title: &str, n: usize, labels: &[(usize, &str)]) -> Molecule {
        let mut mol = Molecule::new(title);
        let ids: Vec<_> = (0..n)
            .map(|i| mol.add_atom(Atom::new(Element::Carbon, [1.5 * i as f64, 0.0, 0.0])))
            .collect();
        for pair in ids.windows(2) {
            mol.add_bond(pair[0], pair[1], Bond::Single);
        }
        for (at, label) in labels {
            let x = 1.5 * *at as f64;
            let p = mol.add_atom(Atom::new(Element::Dummy, [x, 1.5, 0.0]));
            mol.add_bond(ids[*at], p, Bond::Single);
            mol.set_alias(p, *label);
        }
        mol
    }

    fn load(mols: &[Molecule]) -> Library {
        let mut writer = MolWriter::new(Vec::new());
        for mol in mols {
            writer.write(mol).unwrap();
        }
        let bytes = writer.into_inner();
        Library::load(&mut MolReader::new(bytes.as_slice())).unwrap()
    }

    #[test]
    fn scaffold_sites_are_recorded_and_placeholders_removed() {
        let mut scaffold = chain("core", 4, &[(0, "R1"), (3, "R2")]);
        let sites = clean_scaffold(&mut scaffold);

        assert_eq!(scaffold.atom_count(), 4);
        assert_eq!(scaffold.bond_count(), 3);
        assert_eq!(scaffold.placeholders().count(), 0);

        let labels: Vec<_> = sites.iter().map(|(l, s)| (l.to_string(), s.atom.index())).collect();
        assert_eq!(labels, vec![("R1".to_string(), 0), ("R2".to_string(), 3)]);
        assert_eq!(sites.get("R1").unwrap().bond_vector, [0.0, 1.5]);
    }

    #[test]
    fn duplicate_scaffold_label_keeps_last_site() {
        let mut scaffold = chain("core", 4, &[(0, "R1"), (3, "R1")]);
        let sites = clean_scaffold(&mut scaffold);

        assert_eq!(sites.len(), 1);
        assert_eq!(sites.get("R1").unwrap().atom.index(), 3);
        assert_eq!(scaffold.atom_count(), 4);
        assert_eq!(scaffold.placeholders().count(), 0);
    }

    #[test]
    fn leading_placeholder_leaves_no_hole() {
        let mut mol = Molecule::new("methyl");
        let p = mol.add_atom(Atom::new(Element::Dummy, [-1.5, 0.0, 0.0]));
        let c = mol.add_atom(Atom::new(Element::Carbon, [0.0, 0.0, 0.0]));
        mol.add_bond(p, c, Bond::Single);
        mol.set_alias(p, "R1");

        let Classified::Accepted(rgroup) = classify_substituent(mol) else {
            panic!("expected an accepted substituent");
        };
        assert_eq!(rgroup.stub.index(), 0);
        assert_eq!(rgroup.bond_vector, [-1.5, 0.0]);

        let mut core = chain("core", 2, &[]);
        let io_map = core.append(&rgroup.molecule);
        assert_eq!(io_map[&rgroup.stub].index(), 2);
    }

    #[test]
    fn substituent_with_two_placeholders_is_rejected() {
        let mol = chain("bad", 2, &[(0, "R1"), (1, "R2")]);
        assert!(matches!(classify_substituent(mol), Classified::Rejected));
    }

    #[test]
    fn substituent_without_placeholder_is_skipped() {
        let mol = chain("plain", 2, &[]);
        assert!(matches!(classify_substituent(mol), Classified::Unlabelled));
    }

    #[test]
    fn isolated_placeholder_is_rejected() {
        let mut mol = chain("floating", 2, &[]);
        let p = mol.add_atom(Atom::new(Element::Dummy, [5.0, 5.0, 0.0]));
        mol.set_alias(p, "R1");
        assert!(matches!(classify_substituent(mol), Classified::Rejected));
    }

    #[test]
    fn placeholder_bond_order_is_kept() {
        let mut mol = chain("ylidene", 2, &[]);
        let stub = mol.atoms().next().map(|(id, _)| id).unwrap();
        let p = mol.add_atom(Atom::new(Element::Dummy, [0.0, 1.5, 0.0]));
        mol.add_bond(stub, p, Bond::Double);
        mol.set_alias(p, "R1");

        let Classified::Accepted(rgroup) = classify_substituent(mol) else {
            panic!("expected an accepted substituent");
        };
        assert_eq!(rgroup.order, Bond::Double);
        assert_eq!(rgroup.stub, stub);
        assert_eq!(rgroup.molecule.atom_count(), 2);
    }

    #[test]
    fn registry_keeps_first_seen_label_order() {
        let lib = load(&[
            chain("core", 3, &[(0, "R1"), (2, "R2")]),
            chain("b1", 1, &[(0, "R2")]),
            chain("a1", 1, &[(0, "R1")]),
            chain("b2", 2, &[(0, "R2")]),
            chain("none", 2, &[]),
            chain("two", 2, &[(0, "R1"), (1, "R1")]),
        ]);

        assert_eq!(lib.rgroups.labels().collect::<Vec<_>>(), vec!["R2", "R1"]);
        let names: Vec<_> = lib.rgroups.candidates("R2").iter().map(RGroup::name).collect();
        assert_eq!(names, vec!["b1", "b2"]);
        assert_eq!(
            lib.report,
            LoadReport {
                accepted: 3,
                unlabelled: 1,
                rejected: 1,
                unreadable: 0,
            }
        );
    }

    #[test]
    fn empty_input_has_no_scaffold() {
        let result = Library::load(&mut MolReader::new(&b""[..]));
        assert!(matches!(result, Err(LoadError::MissingScaffold)));
    }
}
