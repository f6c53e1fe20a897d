use molsig::*;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use proptest::prelude::*;

const MOLECULES: &[&str] = &[
    "CCO",
    "OCC(=O)N",
    "c1ccccc1O",
    "CC(C)Cl",
    "C1CCCCC1",
    "N#CC=C",
    "[NH4+].[Cl-]",
    "CC(=O)[O-]",
    "c1ccncc1",
    "OC1CC1C#N",
    "C1CCC2(CC1)CCC1(CC2)CCCCC1",
    "C1=CC=C2C=CC=CC2=C1",
];

fn options(radius: u32, nbits: usize) -> SignatureOptions {
    SignatureOptions {
        radius: Radius::Hops(radius),
        nbits,
        ..Default::default()
    }
}

/// A copy of `mol` with its atoms stored in the order given by `order`.
fn permuted(mol: &MoleculeGraph, order: &[usize]) -> MoleculeGraph {
    let mut position = vec![0; order.len()];
    for (new, old) in order.iter().enumerate() {
        position[*old] = new;
    }
    let mut graph = MoleculeGraph::default();
    for old in order {
        graph.add_node(mol[NodeIndex::new(*old)].clone());
    }
    for edge in mol.edge_indices() {
        if let Some((a, b)) = mol.edge_endpoints(edge) {
            graph.add_edge(
                NodeIndex::new(position[a.index()]),
                NodeIndex::new(position[b.index()]),
                mol[edge],
            );
        }
    }
    graph
}

fn molecule_and_order() -> impl Strategy<Value = (&'static str, Vec<usize>)> {
    prop::sample::select(MOLECULES).prop_flat_map(|smiles| {
        let n = parse_smiles(smiles).map(|mol| mol.node_count()).unwrap_or(0);
        (Just(smiles), Just((0..n).collect::<Vec<_>>()).prop_shuffle())
    })
}

proptest! {
    #[test]
    fn atom_order_does_not_change_the_signature((smiles, order) in molecule_and_order(), radius in 0u32..4) {
        let mol = parse_smiles(smiles).expect("Failed to parse SMILES");
        let shuffled = permuted(&mol, &order);
        let a = MoleculeSignature::new(&mol, &options(radius, 2048)).expect("Failed to compute signature");
        let b = MoleculeSignature::new(&shuffled, &options(radius, 2048)).expect("Failed to compute signature");
        prop_assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn signatures_are_deterministic(smiles in prop::sample::select(MOLECULES), radius in 0u32..4) {
        let a = MoleculeSignature::from_smiles(smiles, &options(radius, 2048)).expect("Failed to compute signature");
        let b = MoleculeSignature::from_smiles(smiles, &options(radius, 2048)).expect("Failed to compute signature");
        prop_assert_eq!(a, b);
    }

    #[test]
    fn strings_round_trip(smiles in prop::sample::select(MOLECULES), radius in 1u32..4) {
        let mut signature = MoleculeSignature::from_smiles(smiles, &options(radius, 2048)).expect("Failed to compute signature");
        let text = signature.to_string();
        let parsed = MoleculeSignature::from_string(&text).expect("Failed to parse signature");
        prop_assert_eq!(&parsed, &signature);

        signature.post_compute_neighbors(Radius::Hops(radius)).expect("Failed to decompose");
        let list = signature.to_list(true, true).expect("neighbor view");
        let parsed = MoleculeSignature::from_list(&list).expect("Failed to parse list");
        prop_assert_eq!(parsed.to_list(true, true).expect("neighbor view"), list);
    }

    #[test]
    fn every_atom_gets_a_signature(smiles in prop::sample::select(MOLECULES), radius in 0u32..4) {
        let mol = parse_smiles(smiles).expect("Failed to parse SMILES");
        let signature = MoleculeSignature::new(&mol, &options(radius, 0)).expect("Failed to compute signature");
        prop_assert_eq!(signature.len(), mol.node_count());
        prop_assert!(signature.roots().iter().all(|root| root.is_some_and(|root| !root.is_empty())));
    }

    #[test]
    fn environments_grow_with_the_radius(smiles in prop::sample::select(MOLECULES), radius in 0u32..3) {
        let mol = parse_smiles(smiles).expect("Failed to parse SMILES");
        let defaults = SignatureOptions::default();
        let signature = |atom, radius| atom_signature(&mol, atom, radius, &defaults).expect("Failed to compute signature");
        let whole = (mol.node_count() - 1) as u32;
        for atom in mol.node_indices() {
            let smaller = signature(atom, Radius::Hops(radius));
            let larger = signature(atom, Radius::Hops(radius + 1));
            prop_assert!(larger.matches('[').count() >= smaller.matches('[').count(), "{} vs {}", larger, smaller);

            let unbounded = signature(atom, Radius::Unbounded);
            prop_assert_eq!(&signature(atom, Radius::Hops(whole)), &unbounded);
            prop_assert_eq!(&signature(atom, Radius::Hops(whole + 1)), &unbounded);
        }
    }

    #[test]
    fn bonded_atoms_list_each_other(smiles in prop::sample::select(MOLECULES), radius in 0u32..3) {
        let mol = parse_smiles(smiles).expect("Failed to parse SMILES");
        let defaults = SignatureOptions::default();
        let radius = Radius::Hops(radius);
        for edge in mol.edge_references() {
            let bond = bond_type_name(edge.weight()).to_string();
            for (from, to) in [(edge.source(), edge.target()), (edge.target(), edge.source())] {
                let expected = Neighbor {
                    bond: bond.clone(),
                    signature: atom_signature(&mol, to, radius, &defaults).expect("Failed to compute signature"),
                };
                let neighbors = neighbor_signatures(&mol, from, radius, &defaults).expect("Failed to compute neighbors");
                prop_assert!(neighbors.contains(&expected), "{:?} not in {:?}", expected, neighbors);
            }
        }
    }

    #[test]
    fn neighbor_entries_pair_up_with_bonds(smiles in prop::sample::select(MOLECULES), radius in 1u32..4) {
        let mol = parse_smiles(smiles).expect("Failed to parse SMILES");
        let mut signature = MoleculeSignature::new(&mol, &options(radius, 0)).expect("Failed to compute signature");
        signature.post_compute_neighbors(Radius::Hops(radius)).expect("Failed to decompose");
        let entries: usize = signature.neighbors().iter().map(|neighbors| neighbors.len()).sum();
        prop_assert_eq!(entries, 2 * mol.edge_count());
    }
}

#[test]
fn unbounded_radius_covers_the_molecule() {
    let signature = MoleculeSignature::from_smiles("OCC(=O)N", &SignatureOptions {
        radius: Radius::Unbounded,
        nbits: 0,
        ..Default::default()
    })
    .expect("Failed to compute signature");
    for root in signature.roots().into_iter().flatten() {
        assert_eq!(root.matches('[').count(), 5);
    }
}

#[test]
fn bad_input_is_reported() {
    init_logging("warn");
    let err = MoleculeSignature::from_smiles("C1CC", &SignatureOptions::default()).expect_err("unclosed ring");
    assert_eq!(err.downcast_ref::<SmilesError>(), Some(&SmilesError::UnclosedRing(1)));
}

#[test]
fn spiro_centres_are_order_independent() {
    let mol = parse_smiles("C1CCC2(CC1)CCC1(CC2)CCCCC1").expect("Failed to parse SMILES");
    let shuffled = permuted(&mol, &[3, 5, 15, 7, 8, 12, 14, 4, 1, 10, 6, 11, 9, 13, 0, 2]);
    let options = SignatureOptions {
        radius: Radius::Hops(8),
        ..Default::default()
    };
    let a = MoleculeSignature::new(&mol, &options).expect("Failed to compute signature");
    let b = MoleculeSignature::new(&shuffled, &options).expect("Failed to compute signature");
    assert_eq!(a, b);
    assert_eq!(a.to_string(), b.to_string());
}

#[test]
fn kekule_and_aromatic_naphthalene_agree() {
    for (kekule, aromatic) in [("C1=CC=C2C=CC=CC2=C1", "c1ccc2ccccc2c1"), ("C1=CC2=CC=CC=C2N1", "c1cc2ccccc2[nH]1")] {
        let a = MoleculeSignature::from_smiles(kekule, &options(2, 2048)).expect("Failed to compute signature");
        let b = MoleculeSignature::from_smiles(aromatic, &options(2, 2048)).expect("Failed to compute signature");
        assert_eq!(a, b, "{kekule} vs {aromatic}");
    }
}
