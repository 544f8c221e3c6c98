//! Enumerate every product of a scaffold and its labelled substituents.
//!
//! The walk is a depth-first recursion over labels (in first-seen order) and,
//! within a label, over candidates (in registration order). Each candidate is
//! grafted onto a fresh clone of the working structure of the enclosing
//! frame, so no two branches ever share a graph. Products are handed to a
//! [`ProductSink`] the moment they are complete, in this order:
//!
//! ```text
//! (R1a, R2a), (R1a, R2b), (R1a, R2c), (R1b, R2a), ...
//! ```

use tracing::{debug, info, warn};

use crate::{
    error::EmitError,
    molecule::{AtomId, Molecule},
    rgroup::{LabelMap, RGroup, RGroupRegistry},
};

/// The candidate chosen for one label of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    /// Position of the candidate within its label, from 0.
    pub candidate: usize,
    /// Title of the candidate, or `<label>#<n>` (from 1) if it has none.
    pub name: String,
}

/// Where one substituent was grafted, in the product's handles.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub site: AtomId,
    pub stub: AtomId,
    /// Site-to-placeholder offset recorded on the scaffold.
    pub site_vector: [f64; 2],
    /// Stub-to-placeholder offset recorded on the substituent.
    pub stub_vector: [f64; 2],
    /// Every atom that came from the substituent.
    pub atoms: Vec<AtomId>,
}

/// One fully assembled structure.
#[derive(Debug, Clone)]
pub struct Product {
    /// Position of this product in enumeration order, from 0.
    pub index: usize,
    pub molecule: Molecule,
    pub choices: Vec<Choice>,
    pub placements: Vec<Placement>,
}

/// Destination of enumerated products.
pub trait ProductSink {
    fn emit(&mut self, product: Product) -> Result<(), EmitError>;
}

impl ProductSink for Vec<Product> {
    fn emit(&mut self, product: Product) -> Result<(), EmitError> {
        self.push(product);
        Ok(())
    }
}

/// Summary of one enumeration run.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct EnumerationReport {
    pub products: usize,
    /// Branches given up because a label or atom could not be resolved.
    pub abandoned: usize,
}

/// Per-run state threaded through the recursion.
#[derive(Default)]
struct Walk {
    choices: Vec<Choice>,
    placements: Vec<Placement>,
    report: EnumerationReport,
}

/// Read-only view of the label tables driving an enumeration.
#[derive(Debug, Copy, Clone)]
pub struct Enumerator<'a> {
    sites: &'a LabelMap,
    rgroups: &'a RGroupRegistry,
}

impl<'a> Enumerator<'a> {
    pub fn new(sites: &'a LabelMap, rgroups: &'a RGroupRegistry) -> Self {
        Self { sites, rgroups }
    }

    /// Return the number of products a full run would emit if every label
    /// resolves. Saturates instead of overflowing.
    pub fn count(&self) -> u128 {
        (0..self.rgroups.len())
            .filter_map(|depth| self.rgroups.get_index(depth))
            .fold(1u128, |acc, (_, candidates)| {
                acc.saturating_mul(candidates.len() as u128)
            })
    }

    /// Emit every product of `scaffold` into `sink`.
    ///
    /// Only a failing sink aborts the run. A label without a site on the
    /// scaffold abandons the branch it is met in, with a warning.
    pub fn run<S>(&self, scaffold: &Molecule, sink: &mut S) -> Result<EnumerationReport, EmitError>
    where
        S: ProductSink + ?Sized,
    {
        info!("Enumerating products...");
        let mut walk = Walk::default();
        self.recurse(scaffold.clone(), 0, &mut walk, sink)?;
        debug!(
            products = walk.report.products,
            abandoned = walk.report.abandoned,
            "Enumeration finished"
        );
        Ok(walk.report)
    }

    fn recurse<S>(
        &self,
        current: Molecule,
        depth: usize,
        walk: &mut Walk,
        sink: &mut S,
    ) -> Result<(), EmitError>
    where
        S: ProductSink + ?Sized,
    {
        let Some((label, candidates)) = self.rgroups.get_index(depth) else {
            let product = Product {
                index: walk.report.products,
                molecule: current,
                choices: walk.choices.clone(),
                placements: walk.placements.clone(),
            };
            walk.report.products += 1;
            return sink.emit(product);
        };

        let site = match self.sites.get(label) {
            Some(site) if current.contains(site.atom) => *site,
            Some(_) => {
                warn!("Warning: site of {label} is missing from the working structure; branch abandoned");
                walk.report.abandoned += 1;
                return Ok(());
            }
            None => {
                warn!("Warning: Could not find substituent {label} in scaffold. Ignoring substituent.");
                walk.report.abandoned += 1;
                return Ok(());
            }
        };

        for (n, rgroup) in candidates.iter().enumerate() {
            let mut copy = current.clone();
            let Some((stub, atoms)) = graft(&mut copy, site.atom, rgroup) else {
                warn!("Warning: could not bond {label} candidate {} to the scaffold; skipped", n + 1);
                walk.report.abandoned += 1;
                continue;
            };

            let name = if rgroup.name().is_empty() {
                format!("{label}#{}", n + 1)
            } else {
                rgroup.name().to_string()
            };
            walk.choices.push(Choice {
                label: label.to_string(),
                candidate: n,
                name,
            });
            walk.placements.push(Placement {
                site: site.atom,
                stub,
                site_vector: site.bond_vector,
                stub_vector: rgroup.bond_vector,
                atoms,
            });

            self.recurse(copy, depth + 1, walk, sink)?;

            walk.choices.pop();
            walk.placements.pop();
        }
        Ok(())
    }
}

/// Append `rgroup` to `mol` and bond its stub to `site`. Returns the new stub
/// handle and every appended atom, or `None` if the bond could not be made.
fn graft(mol: &mut Molecule, site: AtomId, rgroup: &RGroup) -> Option<(AtomId, Vec<AtomId>)> {
    let io_map = mol.append(&rgroup.molecule);
    let stub = *io_map.get(&rgroup.stub)?;
    if !mol.add_bond(site, stub, rgroup.order) {
        return None;
    }
    let mut atoms: Vec<AtomId> = io_map.into_values().collect();
    atoms.sort();
    Some((stub, atoms))
}
