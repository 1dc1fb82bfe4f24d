//! # Streaming LD engine
//!
//! The [`LdEngine`] accepts coordinate-sorted site records, keeps the loci
//! that can still pair with future sites in a [`LocusQueue`], and emits one
//! output record per admissible pair whenever the head locus falls out of the
//! window. Pair records for a given head are written in the order their
//! partners entered the queue; heads are drained in position order.
use std::io::Write;

use anyhow::{Context, Result};
use log::debug;

use crate::error::LdError;
use crate::genotype::GenotypeCode;
use crate::io::SiteRecord;
use crate::locus::{GenotypeEntry, LocusQueue};
use crate::stats::{self, MIN_HAPLOTYPES};

/// Default window size in base pairs.
pub const DEFAULT_WINDOW: i32 = 100_000;

/// Window size larger than any genomic coordinate; makes the window filter
/// inert so that every pair across two inputs is considered.
pub const UNBOUNDED_WINDOW: i32 = 1_000_000_000;

/// Pairs below this r² are not reported.
const MIN_R2: f64 = 0.05;

pub struct LdEngine<W: Write> {
    queue: LocusQueue,
    windowsize: i32,
    target_variant: Option<String>,
    out: W,
    sites_streamed: u64,
    pairs_emitted: u64,
}

impl<W: Write> LdEngine<W> {
    pub fn new(windowsize: i32, target_variant: Option<String>, out: W) -> LdEngine<W> {
        LdEngine {
            queue: LocusQueue::new(),
            windowsize,
            target_variant,
            out,
            sites_streamed: 0,
            pairs_emitted: 0,
        }
    }

    /// Feed one site into the window. Loci that can no longer pair with the
    /// incoming position are flushed and evicted before the site is
    /// enqueued, so an emitted head never pairs beyond the window.
    pub fn push_site(&mut self, mut site: SiteRecord) -> Result<()> {
        self.sites_streamed += 1;
        if site.samples.is_empty() {
            debug!("Site {} at {} carries no genotypes", site.var_id, site.position);
            return Ok(());
        }

        while self
            .queue
            .peek_head()
            .map_or(false, |head| (head.position - site.position).abs() > self.windowsize)
        {
            self.emit_pairs(self.windowsize)?;
            self.queue.dequeue();
        }
        self.queue.reset_if_drained();

        // The plumbing yields samples in person_id order already; sort and
        // dedup defensively so the merge join downstream stays correct.
        if !site
            .samples
            .windows(2)
            .all(|pair| pair[0].person_id < pair[1].person_id)
        {
            site.samples.sort_unstable_by_key(|sample| sample.person_id);
            site.samples.dedup_by_key(|sample| sample.person_id);
        }

        for (index, sample) in site.samples.iter().enumerate() {
            let genotype = GenotypeCode::from_allele_chars(sample.alleles).ok_or(
                LdError::InvalidGenotype {
                    position: site.position,
                    person_id: sample.person_id,
                },
            )?;
            let entry = GenotypeEntry {
                person_id: sample.person_id,
                genotype,
            };
            if index == 0 {
                self.queue
                    .enqueue(site.position, std::mem::take(&mut site.var_id), entry);
            } else {
                self.queue.append_to_tail(entry)?;
            }
        }

        Ok(())
    }

    /// Drain the queue at end of stream. The zero window disables the
    /// distance filter, so every remaining pair is considered.
    pub fn finish(&mut self) -> Result<()> {
        while !self.queue.is_empty() {
            self.emit_pairs(0)?;
            self.queue.dequeue();
        }
        self.queue.reset_if_drained();
        self.out.flush().context("Failed to flush output")
    }

    pub fn sites_streamed(&self) -> u64 {
        self.sites_streamed
    }

    pub fn pairs_emitted(&self) -> u64 {
        self.pairs_emitted
    }

    /// Walk every later locus for the current head, compute the pair
    /// statistics and write the records that pass the output gates.
    fn emit_pairs(&mut self, windowsize: i32) -> Result<()> {
        let Some((head, rest)) = self.queue.head_split() else {
            return Ok(());
        };

        for other in rest {
            if windowsize > 0 && (head.position - other.position).abs() > windowsize {
                continue;
            }
            if let Some(target) = &self.target_variant {
                if head.var_id != *target && other.var_id != *target {
                    continue;
                }
            }

            let stats = stats::pairwise_stats(head, other);
            if stats.r2 < MIN_R2
                || stats.r2 > 1.0
                || stats.d_prime.abs() > 1.0
                || stats.n < MIN_HAPLOTYPES
            {
                continue;
            }

            // The two leading fields are legacy placeholders kept for
            // output-format compatibility.
            writeln!(
                self.out,
                "1\t1\t{}\t{}\t{}\t{}\t{:.6}\t{:.6}\t{}",
                head.position,
                head.var_id,
                other.position,
                other.var_id,
                stats.r2,
                stats.d_prime.abs(),
                stats.n
            )
            .context("Failed to write LD record")?;
            self.pairs_emitted += 1;
        }

        Ok(())
    }
}
