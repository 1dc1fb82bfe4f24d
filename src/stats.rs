//! # Haplotype-pair counting and LD statistics
//!
//! For a pair of loci, the genotype sequences are merge-joined on person_id
//! and the nine observable diploid genotype pairs are tallied in a 16-slot
//! table addressed by the four-bit joint index. The double-heterozygote count
//! is phased with a single-parameter EM fixed point, after which the usual
//! linkage-disequilibrium statistics (D, r², D′) follow from the phased
//! haplotype counts and the marginal allele frequencies.
use std::cmp::Ordering;

use log::warn;

use crate::genotype;
use crate::locus::Locus;

/// Minimum number of unambiguously phased haplotype observations required
/// before any statistics are reported for a pair.
pub const MIN_HAPLOTYPES: i32 = 40;

const EM_TOLERANCE: f64 = 1e-4;
const EM_MAX_ITERATIONS: usize = 1000;

// Counter-table slots for the nine observable genotype pairs. Uppercase is
// the reference allele, so e.g. `AaBb` is the double heterozygote.
#[allow(non_upper_case_globals)]
mod slot {
    pub const AABB: usize = 0x0;
    pub const AABb: usize = 0x1;
    pub const AAbb: usize = 0x3;
    pub const AaBB: usize = 0x4;
    pub const AaBb: usize = 0x5;
    pub const Aabb: usize = 0x7;
    pub const aaBB: usize = 0xc;
    pub const aaBb: usize = 0xd;
    pub const aabb: usize = 0xf;
}

/// Pairwise LD statistics between two loci. `n` counts haplotype
/// observations (two per shared sample), `people` the shared samples.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Stats {
    pub d: f64,
    pub r2: f64,
    pub theta: f64,
    pub d_prime: f64,
    pub n: i32,
    pub people: i32,
}

/// Joint genotype counts for one pair of loci, plus the per-sample joint
/// indices needed for the marginal allele frequencies.
#[derive(Debug)]
pub struct PairCounts {
    counters: [i32; 16],
    haplotypes: Vec<u8>,
}

impl PairCounts {
    /// Merge-join two person_id-sorted loci in O(m + n). Samples present in
    /// only one locus are ignored.
    pub fn from_loci(first: &Locus, second: &Locus) -> PairCounts {
        let mut counters = [0i32; 16];
        let mut haplotypes = Vec::new();

        let (a, b) = (&first.genotypes, &second.genotypes);
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].person_id.cmp(&b[j].person_id) {
                Ordering::Equal => {
                    let h = genotype::haplotype_pair(a[i].genotype, b[j].genotype);
                    counters[h as usize] += 1;
                    haplotypes.push(h);
                    i += 1;
                    j += 1;
                }
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
            }
        }

        PairCounts {
            counters,
            haplotypes,
        }
    }

    pub fn shared_samples(&self) -> usize {
        self.haplotypes.len()
    }

    /// Derive the LD statistics. Pairs with fewer than [`MIN_HAPLOTYPES`]
    /// observations get a `Stats` carrying only `n`; callers suppress those.
    #[allow(non_snake_case)]
    pub fn stats(&self) -> Stats {
        let c = &self.counters;

        let nAB = 2 * c[slot::AABB] + c[slot::AaBB] + c[slot::AABb];
        let nab = 2 * c[slot::aabb] + c[slot::Aabb] + c[slot::aaBb];
        let nAb = 2 * c[slot::AAbb] + c[slot::Aabb] + c[slot::AABb];
        let naB = 2 * c[slot::aaBB] + c[slot::AaBB] + c[slot::aaBb];
        let het = c[slot::AaBb];

        let n = nAB + nab + nAb + naB + 2 * het;
        if n < MIN_HAPLOTYPES {
            return Stats {
                n,
                ..Stats::default()
            };
        }

        let theta = phase_theta(nAB, nab, nAb, naB, het);

        let (f_A, f_B) = allele_frequencies(&self.haplotypes);
        let het = f64::from(het);
        let D = (f64::from(nAB) + (1.0 - theta) * het) / f64::from(n) - f_A * f_B;

        let denominator = f_A * f_B * (1.0 - f_A) * (1.0 - f_B);
        let r2 = if denominator == 0.0 {
            0.0
        } else {
            D * D / denominator
        };

        let mut Dmax = 0.0;
        if D < 0.0 {
            Dmax = (f_A * f_B).min((1.0 - f_A) * (1.0 - f_B));
        }
        if D > 0.0 {
            Dmax = (f_A * (1.0 - f_B)).min((1.0 - f_A) * f_B);
        }

        Stats {
            d: D,
            r2,
            theta,
            d_prime: if Dmax == 0.0 { 0.0 } else { D / Dmax },
            n,
            people: self.haplotypes.len() as i32,
        }
    }
}

/// Convenience wrapper joining two loci and deriving their statistics.
pub fn pairwise_stats(first: &Locus, second: &Locus) -> Stats {
    PairCounts::from_loci(first, second).stats()
}

/// EM fixed point assigning the double-heterozygote count to the `Ab/aB`
/// phase (θ) versus the `AB/ab` phase (1 − θ). A zero denominator forces
/// θ = 0.5 for that step; exhausting the iteration bound keeps the last θ.
#[allow(non_snake_case)]
fn phase_theta(nAB: i32, nab: i32, nAb: i32, naB: i32, het: i32) -> f64 {
    let (nAB, nab, nAb, naB, het) = (
        f64::from(nAB),
        f64::from(nab),
        f64::from(nAb),
        f64::from(naB),
        f64::from(het),
    );

    let mut theta: f64 = 0.5;
    let mut theta_prev: f64 = 2.0;
    let mut iterations = 0;
    while (theta - theta_prev).abs() > EM_TOLERANCE {
        if iterations == EM_MAX_ITERATIONS {
            warn!("EM phasing did not converge after {EM_MAX_ITERATIONS} iterations, keeping theta = {theta}");
            break;
        }
        iterations += 1;
        theta_prev = theta;
        let denominator = (nAB + (1.0 - theta) * het) * (nab + (1.0 - theta) * het)
            + (nAb + theta * het) * (naB + theta * het);
        theta = if denominator == 0.0 {
            0.5
        } else {
            (nAb + theta * het) * (naB + theta * het) / denominator
        };
    }

    theta
}

/// Reference-allele frequencies at both loci, counted over the shared-sample
/// joint indices (two bits per locus per sample). Empty input yields (0, 0).
fn allele_frequencies(haplotypes: &[u8]) -> (f64, f64) {
    let mut ref_first = 0i64;
    let mut ref_second = 0i64;
    for &h in haplotypes {
        let alt = i64::from((h & 0x8) >> 3) + i64::from((h & 0x4) >> 2);
        ref_first += 2 - alt;
        let alt = i64::from((h & 0x2) >> 1) + i64::from(h & 0x1);
        ref_second += 2 - alt;
    }

    let total = 2 * haplotypes.len() as i64;
    if total == 0 {
        return (0.0, 0.0);
    }
    (
        ref_first as f64 / total as f64,
        ref_second as f64 / total as f64,
    )
}
