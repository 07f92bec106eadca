use rand::{seq::index, seq::SliceRandom, Rng};

/// The 20 standard amino acids.
pub const AMINO_ACIDS: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";

/// A protein sequence, one ASCII residue per byte.
pub type Sequence = Vec<u8>;

/// A subject, its mutated query, and the query as DNA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialPair {
    pub subject: Sequence,
    pub query: Sequence,
    pub query_dna: Vec<u8>,
    pub substitutions: usize,
}

/// Generate a random protein sequence of length `n`.
pub fn random_sequence<R: Rng>(n: usize, rng: &mut R) -> Sequence {
    (0..n)
        .map(|_| AMINO_ACIDS[rng.gen_range(0..AMINO_ACIDS.len())])
        .collect()
}

/// Given a sequence, generate a sequence with exactly `e` substitutions.
///
/// Each of the `e` positions is distinct and receives a residue different from the original one.
pub fn random_mutate<R: Rng>(sequence: &[u8], e: usize, rng: &mut R) -> Sequence {
    assert!(
        e <= sequence.len(),
        "Cannot make {e} substitutions in a sequence of length {}.",
        sequence.len()
    );
    let mut mutated = sequence.to_vec();
    for i in index::sample(rng, sequence.len(), e) {
        mutated[i] = different_residue(sequence[i], rng);
    }
    mutated
}

/// A uniformly random amino acid other than `old`.
fn different_residue<R: Rng>(old: u8, rng: &mut R) -> u8 {
    // Draw from the 19 other letters: skip over `old` if it is part of the alphabet.
    let last = AMINO_ACIDS.len() - 1;
    let c = AMINO_ACIDS[rng.gen_range(0..last)];
    if c == old {
        AMINO_ACIDS[last]
    } else {
        c
    }
}

/// The codons of the standard genetic code for each amino acid.
pub fn codons(aa: u8) -> &'static [&'static [u8; 3]] {
    match aa {
        b'A' => &[b"GCT", b"GCC", b"GCA", b"GCG"],
        b'C' => &[b"TGT", b"TGC"],
        b'D' => &[b"GAT", b"GAC"],
        b'E' => &[b"GAA", b"GAG"],
        b'F' => &[b"TTT", b"TTC"],
        b'G' => &[b"GGT", b"GGC", b"GGA", b"GGG"],
        b'H' => &[b"CAT", b"CAC"],
        b'I' => &[b"ATT", b"ATC", b"ATA"],
        b'K' => &[b"AAA", b"AAG"],
        b'L' => &[b"TTA", b"TTG", b"CTT", b"CTC", b"CTA", b"CTG"],
        b'M' => &[b"ATG"],
        b'N' => &[b"AAT", b"AAC"],
        b'P' => &[b"CCT", b"CCC", b"CCA", b"CCG"],
        b'Q' => &[b"CAA", b"CAG"],
        b'R' => &[b"CGT", b"CGC", b"CGA", b"CGG", b"AGA", b"AGG"],
        b'S' => &[b"TCT", b"TCC", b"TCA", b"TCG", b"AGT", b"AGC"],
        b'T' => &[b"ACT", b"ACC", b"ACA", b"ACG"],
        b'V' => &[b"GTT", b"GTC", b"GTA", b"GTG"],
        b'W' => &[b"TGG"],
        b'Y' => &[b"TAT", b"TAC"],
        _ => unreachable!("Not an amino acid: {:?}", aa as char),
    }
}

/// Encode a protein as DNA, picking a random codon for each residue.
pub fn reverse_translate<R: Rng>(protein: &[u8], rng: &mut R) -> Vec<u8> {
    let mut dna = Vec::with_capacity(3 * protein.len());
    for &aa in protein {
        // `codons` never returns an empty slice.
        if let Some(codon) = codons(aa).choose(rng) {
            dna.extend_from_slice(*codon);
        }
    }
    dna
}

/// A random subject of length `n` and a query at `e` substitutions from it.
pub fn generate_pair<R: Rng>(n: usize, e: usize, rng: &mut R) -> TrialPair {
    let subject = random_sequence(n, rng);
    let query = random_mutate(&subject, e, rng);
    let query_dna = reverse_translate(&query, rng);
    TrialPair {
        subject,
        query,
        query_dna,
        substitutions: e,
    }
}
