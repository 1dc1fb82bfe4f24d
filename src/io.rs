//! # Input plumbing
//!
//! Home of the record types and the [`SiteSource`] seam the LD engine
//! consumes, genomic region parsing, and loaders for the sample-subset and
//! variant-ID list files.
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::str::FromStr;

use anyhow::{bail, Context, Result};

pub mod vcf;

/// One decoded variant site ready for the LD engine. Samples carry the raw
/// allele character pairs ('A' = REF, 'a' = ALT); packing into the two-bit
/// code happens downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRecord {
    pub position: i32,
    pub var_id: String,
    pub samples: Vec<SampleGenotype>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleGenotype {
    pub person_id: i32,
    pub alleles: [u8; 2],
}

/// A coordinate-sorted stream of variant sites.
pub trait SiteSource {
    fn next_site(&mut self) -> Result<Option<SiteRecord>>;
}

/// Genomic region in 1-based inclusive coordinates: `chr` or `chr:start-end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub contig: String,
    pub interval: Option<(u64, u64)>,
}

impl FromStr for Region {
    type Err = anyhow::Error;

    fn from_str(region: &str) -> Result<Region> {
        let (contig, range) = match region.split_once(':') {
            None => (region, None),
            Some((contig, range)) => (contig, Some(range)),
        };
        if contig.is_empty() {
            bail!("Region '{region}' is missing a contig name");
        }

        let interval = match range {
            None => None,
            Some(range) => {
                let (start, end) = range
                    .split_once('-')
                    .with_context(|| format!("Expected chr:start-end, got '{region}'"))?;
                let start: u64 = start
                    .parse()
                    .with_context(|| format!("Could not parse region start in '{region}'"))?;
                let end: u64 = end
                    .parse()
                    .with_context(|| format!("Could not parse region end in '{region}'"))?;
                if start == 0 || end < start {
                    bail!("Region '{region}' does not describe a valid 1-based interval");
                }
                Some((start, end))
            }
        };

        Ok(Region {
            contig: contig.to_string(),
            interval,
        })
    }
}

/// Resolve the `--samples` argument: a comma-separated inline list, or the
/// path of a file with one sample name per line.
pub fn load_sample_names(arg: &str) -> Result<Vec<String>> {
    if arg.contains(',') {
        return Ok(arg
            .split(',')
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect());
    }
    read_id_lines(arg)
}

/// Load the `--include-variants` ID set. The file must exist; a missing file
/// is an error rather than an empty filter.
pub fn read_variant_ids(path: &str) -> Result<HashSet<String>> {
    Ok(read_id_lines(path)?.into_iter().collect())
}

fn read_id_lines(path: &str) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("Failed to open list file {path}"))?;

    let mut ids = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("Failed to read list file {path}"))?;
        let id = line.trim();
        if !id.is_empty() {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}
