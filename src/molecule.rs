//! Graph representation of a molecule.
//!
//! Atoms live in a [`StableGraph`], so an [`AtomId`] handed out for an atom
//! stays valid after other atoms are removed and in every clone of the
//! molecule. Placeholder labels (`R1`, `R2`, ...) are attached to atoms as
//! aliases and are looked up with [`Molecule::alias`].

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
    str::FromStr,
};

use petgraph::{
    stable_graph::{NodeIndex, StableGraph},
    visit::{EdgeRef, IntoEdgeReferences},
    Undirected,
};

pub(crate) type Index = u32;
pub(crate) type MGraph = StableGraph<Atom, Bond, Undirected, Index>;

/// Handle of an atom inside a [`Molecule`].
///
/// Handles are not renumbered by [`Molecule::remove_atom`], and a clone of a
/// molecule answers to the same handles as the original. The slot of a
/// removed atom is handed out again by the next [`Molecule::add_atom`] or
/// [`Molecule::append`]; use [`Molecule::compact`] after removals to keep new
/// atoms at the end.
pub type AtomId = NodeIndex<Index>;

/// Thrown by [`Element::from_str`] if the string does not represent a valid
/// chemical element.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ParseElementError;

macro_rules! periodic_table {
    ( $(($element:ident, $name:literal),)* ) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        /// Represents a chemical element.
        pub enum Element {
            $( $element, )*
            /// Query or placeholder atom (`R#`, `R`, `*`, `A`, `Q`).
            Dummy,
        }

        impl Display for Element {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match &self {
                    $( Element::$element => write!(f, "{}", $name), )*
                    Element::Dummy => write!(f, "R#"),
                }
            }
        }

        impl FromStr for Element {
            type Err = ParseElementError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $name => Ok(Element::$element), )*
                    "R#" | "R" | "*" | "A" | "Q" => Ok(Element::Dummy),
                    _ => Err(ParseElementError),
                }
            }
        }
    };
}

periodic_table!(
    (Hydrogen, "H"),
    (Helium, "He"),
    (Lithium, "Li"),
    (Beryllium, "Be"),
    (Boron, "B"),
    (Carbon, "C"),
    (Nitrogen, "N"),
    (Oxygen, "O"),
    (Fluorine, "F"),
    (Neon, "Ne"),
    (Sodium, "Na"),
    (Magnesium, "Mg"),
    (Aluminum, "Al"),
    (Silicon, "Si"),
    (Phosphorus, "P"),
    (Sulfur, "S"),
    (Chlorine, "Cl"),
    (Argon, "Ar"),
    (Potassium, "K"),
    (Calcium, "Ca"),
    (Scandium, "Sc"),
    (Titanium, "Ti"),
    (Vanadium, "V"),
    (Chromium, "Cr"),
    (Manganese, "Mn"),
    (Iron, "Fe"),
    (Cobalt, "Co"),
    (Nickel, "Ni"),
    (Copper, "Cu"),
    (Zinc, "Zn"),
    (Gallium, "Ga"),
    (Germanium, "Ge"),
    (Arsenic, "As"),
    (Selenium, "Se"),
    (Bromine, "Br"),
    (Krypton, "Kr"),
    (Rubidium, "Rb"),
    (Strontium, "Sr"),
    (Yttrium, "Y"),
    (Zirconium, "Zr"),
    (Niobium, "Nb"),
    (Molybdenum, "Mo"),
    (Technetium, "Tc"),
    (Ruthenium, "Ru"),
    (Rhodium, "Rh"),
    (Palladium, "Pd"),
    (Silver, "Ag"),
    (Cadmium, "Cd"),
    (Indium, "In"),
    (Tin, "Sn"),
    (Antimony, "Sb"),
    (Tellurium, "Te"),
    (Iodine, "I"),
    (Xenon, "Xe"),
    (Cesium, "Cs"),
    (Barium, "Ba"),
    (Lanthanum, "La"),
    (Cerium, "Ce"),
    (Praseodymium, "Pr"),
    (Neodymium, "Nd"),
    (Promethium, "Pm"),
    (Samarium, "Sm"),
    (Europium, "Eu"),
    (Gadolinium, "Gd"),
    (Terbium, "Tb"),
    (Dysprosium, "Dy"),
    (Holmium, "Ho"),
    (Erbium, "Er"),
    (Thulium, "Tm"),
    (Ytterbium, "Yb"),
    (Lutetium, "Lu"),
    (Hafnium, "Hf"),
    (Tantalum, "Ta"),
    (Wolfram, "W"),
    (Rhenium, "Re"),
    (Osmium, "Os"),
    (Iridium, "Ir"),
    (Platinum, "Pt"),
    (Gold, "Au"),
    (Mercury, "Hg"),
    (Thallium, "Tl"),
    (Lead, "Pb"),
    (Bismuth, "Bi"),
    (Polonium, "Po"),
    (Astatine, "At"),
    (Radon, "Rn"),
    (Francium, "Fr"),
    (Radium, "Ra"),
    (Actinium, "Ac"),
    (Thorium, "Th"),
    (Protactinium, "Pa"),
    (Uranium, "U"),
    (Neptunium, "Np"),
    (Plutonium, "Pu"),
    (Americium, "Am"),
    (Curium, "Cm"),
    (Berkelium, "Bk"),
    (Californium, "Cf"),
    (Einsteinium, "Es"),
    (Fermium, "Fm"),
    (Mendelevium, "Md"),
    (Nobelium, "No"),
    (Lawrencium, "Lr"),
    (Rutherfordium, "Rf"),
    (Dubnium, "Db"),
    (Seaborgium, "Sg"),
    (Bohrium, "Bh"),
    (Hassium, "Hs"),
    (Meitnerium, "Mt"),
    (Darmstadtium, "Ds"),
    (Roentgenium, "Rg"),
    (Copernicium, "Cn"),
    (Nihonium, "Nh"),
    (Flerovium, "Fl"),
    (Moscovium, "Mc"),
    (Livermorium, "Lv"),
    (Tennessine, "Ts"),
    (Oganesson, "Og"),
);

/// The nodes of a [`Molecule`] graph.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Atom {
    element: Element,
    charge: i8,
    position: [f64; 3],
}

impl Atom {
    /// Construct a neutral [`Atom`] of type `element` at `position`.
    pub fn new(element: Element, position: [f64; 3]) -> Self {
        Self {
            element,
            charge: 0,
            position,
        }
    }

    /// Return this atom with its formal charge set to `charge`.
    pub fn with_charge(mut self, charge: i8) -> Self {
        self.charge = charge;
        self
    }

    /// Return this [`Atom`]'s element.
    pub fn element(&self) -> Element {
        self.element
    }

    pub fn charge(&self) -> i8 {
        self.charge
    }

    pub fn set_charge(&mut self, charge: i8) {
        self.charge = charge;
    }

    pub fn position(&self) -> [f64; 3] {
        self.position
    }

    pub fn set_position(&mut self, position: [f64; 3]) {
        self.position = position;
    }
}

/// The edges of a [`Molecule`] graph, named after the bond types of the
/// `.mol` file bond block (codes 1 to 4).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bond {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl Bond {
    /// Return the `.mol` file bond type code of this bond.
    pub fn code(&self) -> usize {
        match self {
            Bond::Single => 1,
            Bond::Double => 2,
            Bond::Triple => 3,
            Bond::Aromatic => 4,
        }
    }
}

/// Thrown by [`Bond::try_from`] when given anything other than 1, 2, 3 or 4.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ParseBondError;

impl TryFrom<usize> for Bond {
    type Error = ParseBondError;
    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Bond::Single),
            2 => Ok(Bond::Double),
            3 => Ok(Bond::Triple),
            4 => Ok(Bond::Aromatic),
            _ => Err(ParseBondError),
        }
    }
}

/// An undirected graph with [`Atom`]s as nodes and [`Bond`]s as edges, plus
/// the title line it was read with.
///
/// Cloning a molecule is a full value copy. Enumeration relies on this: every
/// working structure is an independent clone, and no two branches ever share
/// a graph.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    title: String,
    graph: MGraph,
    aliases: BTreeMap<AtomId, String>,
}

impl Molecule {
    /// Construct an empty molecule titled `title`.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: AtomId) -> bool {
        self.graph.contains_node(id)
    }

    pub fn add_atom(&mut self, atom: Atom) -> AtomId {
        self.graph.add_node(atom)
    }

    /// Bond `a` to `b`. Returns `false` (and leaves the molecule untouched)
    /// if either atom is missing, `a == b`, or the two are already bonded.
    pub fn add_bond(&mut self, a: AtomId, b: AtomId, bond: Bond) -> bool {
        if a == b
            || !self.contains(a)
            || !self.contains(b)
            || self.graph.find_edge(a, b).is_some()
        {
            return false;
        }
        self.graph.add_edge(a, b, bond);
        true
    }

    /// Remove atom `id` together with its bonds and alias. Handles of all
    /// other atoms are unaffected.
    pub fn remove_atom(&mut self, id: AtomId) -> Option<Atom> {
        self.aliases.remove(&id);
        self.graph.remove_node(id)
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.graph.node_weight(id)
    }

    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.graph.node_weight_mut(id)
    }

    /// Iterate over atoms in handle order. This is insertion order as long as
    /// no slot freed by [`Molecule::remove_atom`] has been refilled.
    pub fn atoms(&self) -> impl Iterator<Item = (AtomId, &Atom)> + '_ {
        self.graph
            .node_indices()
            .filter_map(|ix| self.graph.node_weight(ix).map(|a| (ix, a)))
    }

    /// Iterate over bonds in insertion order.
    pub fn bonds(&self) -> impl Iterator<Item = (AtomId, AtomId, Bond)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), *e.weight()))
    }

    pub fn neighbors(&self, id: AtomId) -> impl Iterator<Item = AtomId> + '_ {
        self.graph.neighbors(id)
    }

    pub fn bond_between(&self, a: AtomId, b: AtomId) -> Option<Bond> {
        let ix = self.graph.find_edge(a, b)?;
        self.graph.edge_weight(ix).copied()
    }

    /// Return the placeholder label attached to atom `id`, if any.
    pub fn alias(&self, id: AtomId) -> Option<&str> {
        self.aliases.get(&id).map(String::as_str)
    }

    /// Attach placeholder label `label` to atom `id`. Ignored if the atom does
    /// not exist.
    pub fn set_alias(&mut self, id: AtomId, label: impl Into<String>) {
        if self.contains(id) {
            self.aliases.insert(id, label.into());
        }
    }

    /// Iterate over labelled placeholder atoms in atom order.
    pub fn placeholders(&self) -> impl Iterator<Item = (AtomId, &str)> + '_ {
        self.aliases.iter().map(|(id, label)| (*id, label.as_str()))
    }

    /// Copy every atom, bond and alias of `other` into this molecule and
    /// return the translation from `other`'s handles to the new ones.
    pub fn append(&mut self, other: &Molecule) -> HashMap<AtomId, AtomId> {
        let mut io_map = HashMap::with_capacity(other.atom_count());
        for (ix, atom) in other.atoms() {
            io_map.insert(ix, self.graph.add_node(*atom));
        }

        for (u, v, bond) in other.bonds() {
            self.graph.add_edge(io_map[&u], io_map[&v], bond);
        }

        for (ix, label) in other.placeholders() {
            self.aliases.insert(io_map[&ix], label.to_string());
        }

        io_map
    }

    /// Renumber atoms densely in their current order, dropping the holes left
    /// by removed atoms, and return the translation from old handles to new.
    pub fn compact(&mut self) -> HashMap<AtomId, AtomId> {
        let mut fresh = Molecule::new(std::mem::take(&mut self.title));
        let io_map = fresh.append(self);
        *self = fresh;
        io_map
    }
}
