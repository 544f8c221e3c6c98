//! Best-effort 2-D placement of grafted substituents.
//!
//! Scaffold coordinates are left alone. Each substituent is rotated in the xy
//! plane and translated so that its stub sits one bond length from the
//! scaffold site, on the side where the scaffold placeholder was drawn, with
//! the rest of the fragment pointing away from the scaffold.

use nalgebra::{Point2, Rotation2, Vector2};

use crate::{
    enumerate::Placement,
    error::LayoutError,
    molecule::{AtomId, Molecule},
};

/// Bond length used when the input does not give a usable one.
pub const DEFAULT_BOND_LENGTH: f64 = 1.5;

/// Lay out every placement of a product, in order.
pub fn place(mol: &mut Molecule, placements: &[Placement]) -> Result<(), LayoutError> {
    for placement in placements {
        place_one(mol, placement)?;
    }
    Ok(())
}

type Vec2 = Vector2<f64>;

/// Return `v` normalised together with its length, unless it is degenerate.
fn direction(v: Vec2) -> Option<(Vec2, f64)> {
    let len = v.norm();
    if !len.is_finite() {
        return None;
    }
    v.try_normalize(1e-6).map(|u| (u, len))
}

fn xy(p: [f64; 3]) -> Point2<f64> {
    Point2::new(p[0], p[1])
}

fn position(mol: &Molecule, id: AtomId) -> Result<[f64; 3], LayoutError> {
    mol.atom(id)
        .map(|a| a.position())
        .ok_or(LayoutError::MissingAtom(id.index() + 1))
}

fn centroid(mol: &Molecule, ids: impl Iterator<Item = AtomId>) -> Option<Point2<f64>> {
    let points: Vec<Vec2> = ids
        .filter_map(|id| mol.atom(id))
        .map(|a| xy(a.position()).coords)
        .collect();
    if points.is_empty() {
        return None;
    }
    let sum: Vec2 = points.iter().sum();
    Some(Point2::from(sum / points.len() as f64))
}

/// Direction pointing from the site away from its scaffold neighbours.
fn away_from_neighbors(mol: &Molecule, placement: &Placement, site: Point2<f64>) -> Vec2 {
    let others = mol
        .neighbors(placement.site)
        .filter(|n| !placement.atoms.contains(n));
    centroid(mol, others)
        .and_then(|c| direction(site - c))
        .map_or_else(Vec2::x, |(u, _)| u)
}

fn place_one(mol: &mut Molecule, placement: &Placement) -> Result<(), LayoutError> {
    let site = position(mol, placement.site)?;
    let stub = position(mol, placement.stub)?;
    let (site_xy, stub_xy) = (xy(site), xy(stub));

    let (out, length) = direction(Vec2::from(placement.site_vector)).unwrap_or_else(|| {
        (
            away_from_neighbors(mol, placement, site_xy),
            DEFAULT_BOND_LENGTH,
        )
    });

    // Direction from the stub back towards the scaffold.
    let inward = direction(Vec2::from(placement.stub_vector))
        .or_else(|| {
            let rest = placement
                .atoms
                .iter()
                .copied()
                .filter(|id| *id != placement.stub);
            let c = centroid(mol, rest)?;
            direction(stub_xy - c)
        })
        .map_or(-out, |(u, _)| u);

    let rotation = Rotation2::rotation_between(&inward, &-out);
    let target = site_xy + out * length;

    // Nothing is moved unless every new position is usable.
    let moved = placement
        .atoms
        .iter()
        .map(|&id| {
            let p = position(mol, id)?;
            let q = target + rotation * (xy(p) - stub_xy);
            let z = site[2] + (p[2] - stub[2]);
            if q.x.is_finite() && q.y.is_finite() && z.is_finite() {
                Ok((id, [q.x, q.y, z]))
            } else {
                Err(LayoutError::NonFinite(id.index() + 1))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (id, p) in moved {
        if let Some(atom) = mol.atom_mut(id) {
            atom.set_position(p);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::{Atom, Bond, Element};

    fn close(a: [f64; 3], b: [f64; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9
    }

    /// Scaffold C-C along x with a two-carbon fragment far away, already
    /// bonded to the scaffold's second atom.
    fn grafted(site_vector: [f64; 2], stub_vector: [f64; 2]) -> (Molecule, Placement, [AtomId; 2]) {
        let mut mol = Molecule::new("p");
        let anchor = mol.add_atom(Atom::new(Element::Carbon, [-1.5, 0.0, 0.0]));
        let site = mol.add_atom(Atom::new(Element::Carbon, [0.0, 0.0, 0.0]));
        let stub = mol.add_atom(Atom::new(Element::Carbon, [10.0, 10.0, 0.0]));
        let tail = mol.add_atom(Atom::new(Element::Carbon, [10.0, 11.5, 0.0]));
        mol.add_bond(anchor, site, Bond::Single);
        mol.add_bond(stub, tail, Bond::Single);
        mol.add_bond(site, stub, Bond::Single);
        let placement = Placement {
            site,
            stub,
            site_vector,
            stub_vector,
            atoms: vec![stub, tail],
        };
        (mol, placement, [stub, tail])
    }

    fn pos(mol: &Molecule, id: AtomId) -> [f64; 3] {
        mol.atom(id).unwrap().position()
    }

    #[test]
    fn fragment_follows_placeholder_directions() {
        let (mut mol, placement, [stub, tail]) = grafted([1.5, 0.0], [0.0, -1.5]);
        place(&mut mol, std::slice::from_ref(&placement)).unwrap();

        assert!(close(pos(&mol, stub), [1.5, 0.0]), "{:?}", pos(&mol, stub));
        assert!(close(pos(&mol, tail), [3.0, 0.0]), "{:?}", pos(&mol, tail));
        assert!(close(pos(&mol, placement.site), [0.0, 0.0]));
    }

    #[test]
    fn degenerate_vectors_point_away_from_scaffold() {
        let (mut mol, placement, [stub, tail]) = grafted([0.0, 0.0], [0.0, 0.0]);
        place(&mut mol, std::slice::from_ref(&placement)).unwrap();

        assert!(close(pos(&mol, stub), [DEFAULT_BOND_LENGTH, 0.0]));
        assert!(close(pos(&mol, tail), [DEFAULT_BOND_LENGTH + 1.5, 0.0]));
    }

    #[test]
    fn missing_atom_is_reported() {
        let (mut mol, mut placement, [_, tail]) = grafted([1.5, 0.0], [0.0, -1.5]);
        mol.remove_atom(tail);
        placement.atoms = vec![placement.stub, tail];
        assert_eq!(
            place(&mut mol, &[placement]),
            Err(LayoutError::MissingAtom(tail.index() + 1))
        );
    }

    #[test]
    fn failed_placement_moves_nothing() {
        let (mut mol, placement, [stub, tail]) = grafted([1.5, 0.0], [0.0, -1.5]);
        mol.atom_mut(tail)
            .unwrap()
            .set_position([10.0, f64::INFINITY, 0.0]);

        assert_eq!(
            place(&mut mol, std::slice::from_ref(&placement)),
            Err(LayoutError::NonFinite(tail.index() + 1))
        );
        assert_eq!(pos(&mol, stub), [10.0, 10.0, 0.0]);
    }

    #[test]
    fn non_finite_input_is_reported() {
        let (mut mol, placement, _) = grafted([1.5, 0.0], [0.0, -1.5]);
        mol.atom_mut(placement.site)
            .unwrap()
            .set_position([f64::NAN, 0.0, 0.0]);
        assert!(matches!(
            place(&mut mol, &[placement]),
            Err(LayoutError::NonFinite(_))
        ));
    }
}
