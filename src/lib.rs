//! # ldpair
//!
//! Streaming estimation of pairwise linkage disequilibrium between biallelic
//! variants in indexed VCF/BCF files. Sites are read in coordinate order,
//! held in a sliding window, and every pair within the window is phased with
//! a single-parameter EM before its D, r² and |D′| are reported.
pub mod cli;
pub mod engine;
pub mod error;
pub mod genotype;
pub mod io;
pub mod locus;
pub mod stats;

use std::io::Write;

use anyhow::Result;
use log::info;

use crate::cli::Cli;
use crate::engine::{LdEngine, UNBOUNDED_WINDOW};
use crate::io::vcf::VcfSiteSource;
use crate::io::{Region, SiteSource};

/// Stream every site from `source` into `engine`.
pub fn stream_sites<S: SiteSource, W: Write>(
    source: &mut S,
    engine: &mut LdEngine<W>,
) -> Result<()> {
    while let Some(site) = source.next_site()? {
        engine.push_site(site)?;
    }
    Ok(())
}

/// Run the full LD computation for a parsed command line, writing output
/// records to `out`. The queue is carried across both inputs in two-file
/// mode, so cross-file pairs surface during the final drain.
pub fn run<W: Write>(args: &Cli, out: W) -> Result<()> {
    let include_variants = args
        .include_variants
        .as_deref()
        .map(io::read_variant_ids)
        .transpose()?;
    let sample_names = args.samples.as_deref().map(io::load_sample_names).transpose()?;

    // with two inputs the window must not suppress any cross-file pair
    let windowsize = if args.is_two_file() {
        UNBOUNDED_WINDOW
    } else {
        args.window
    };

    let mut engine = LdEngine::new(windowsize, args.variant.clone(), out);
    for (path, region) in args.inputs() {
        info!("Processing {path} ({region})");
        let region: Region = region.parse()?;
        let mut source = VcfSiteSource::open(
            path,
            &region,
            sample_names.as_deref(),
            include_variants.as_ref(),
            args.variant.as_deref(),
        )?;
        stream_sites(&mut source, &mut engine)?;
    }
    engine.finish()?;
    info!(
        "Streamed {} sites, wrote {} LD records",
        engine.sites_streamed(),
        engine.pairs_emitted()
    );

    Ok(())
}
