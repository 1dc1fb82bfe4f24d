//! # VCF/BCF site source
//!
//! Decodes records from an indexed VCF/BCF into [`SiteRecord`]s for the LD
//! engine. Only biallelic diploid sites survive: records with a missing or
//! ALT2+ allele in any retained sample, a ploidy other than 2, or no ALT
//! allele at all are dropped here. Variants excluded by the include set are
//! skipped before their genotypes are touched.
use std::collections::HashSet;

use anyhow::{Context, Result};
use log::{debug, warn};
use rust_htslib::bcf::{self, Read};

use super::{Region, SampleGenotype, SiteRecord, SiteSource};

pub struct VcfSiteSource<'a> {
    reader: bcf::IndexedReader,
    record: bcf::Record,
    sample_indices: Vec<usize>,
    include_variants: Option<&'a HashSet<String>>,
    target_variant: Option<&'a str>,
    exhausted: bool,
}

impl<'a> VcfSiteSource<'a> {
    /// Open an indexed VCF/BCF, restrict it to `region` and optionally to a
    /// sample subset. An unknown contig yields an empty source rather than an
    /// error, matching the empty-query behaviour of tabix.
    pub fn open(
        path: &str,
        region: &Region,
        samples: Option<&[String]>,
        include_variants: Option<&'a HashSet<String>>,
        target_variant: Option<&'a str>,
    ) -> Result<VcfSiteSource<'a>> {
        let mut reader = bcf::IndexedReader::from_path(path)
            .with_context(|| format!("Failed to open indexed VCF/BCF at {path}"))?;
        let header = reader.header().to_owned();

        let sample_indices = match samples {
            Some(names) => names
                .iter()
                .map(|name| {
                    header
                        .sample_id(name.as_bytes())
                        .with_context(|| format!("Sample {name} not found in {path}"))
                })
                .collect::<Result<Vec<_>>>()?,
            None => (0..header.sample_count() as usize).collect(),
        };

        let mut exhausted = false;
        match header.name2rid(region.contig.as_bytes()) {
            Ok(rid) => {
                // fetch takes 0-based half-open coordinates
                let (start, end) = match region.interval {
                    Some((start, end)) => (start - 1, Some(end)),
                    None => (0, None),
                };
                reader.fetch(rid, start, end).with_context(|| {
                    format!("Failed to query region {} in {path}", region.contig)
                })?;
            }
            Err(_) => {
                warn!(
                    "Contig {} not found in {path}, nothing to process",
                    region.contig
                );
                exhausted = true;
            }
        }

        let record = reader.empty_record();
        Ok(VcfSiteSource {
            reader,
            record,
            sample_indices,
            include_variants,
            target_variant,
            exhausted,
        })
    }

    /// Decode the current record, or `None` when a filter drops it.
    fn decode_record(&self) -> Result<Option<SiteRecord>> {
        let record = &self.record;

        let var_id = String::from_utf8(record.id())
            .context("Variant ID is not valid UTF-8")?;
        if let Some(include) = self.include_variants {
            if !include.contains(&var_id) && self.target_variant != Some(var_id.as_str()) {
                return Ok(None);
            }
        }

        let Ok(genotypes) = record.genotypes() else {
            debug!("Skipping {var_id}: record carries no genotypes");
            return Ok(None);
        };

        let mut samples = Vec::with_capacity(self.sample_indices.len());
        let mut has_alt = false;
        for (rank, &sample_index) in self.sample_indices.iter().enumerate() {
            let genotype = genotypes.get(sample_index);
            if genotype.len() != 2 {
                debug!("Skipping {var_id}: ploidy {} is not supported", genotype.len());
                return Ok(None);
            }

            let mut alleles = [0u8; 2];
            for (side, allele) in genotype.iter().enumerate() {
                alleles[side] = match allele.index() {
                    Some(0) => b'A',
                    Some(1) => {
                        has_alt = true;
                        b'a'
                    }
                    Some(_) => {
                        debug!("Skipping {var_id}: ALT2+ allele");
                        return Ok(None);
                    }
                    None => {
                        debug!("Skipping {var_id}: missing allele");
                        return Ok(None);
                    }
                };
            }
            samples.push(SampleGenotype {
                person_id: rank as i32 + 1,
                alleles,
            });
        }
        if samples.is_empty() || !has_alt {
            return Ok(None);
        }

        // htslib positions are 0-based; non-SNPs are additionally shifted by
        // one to account for the reference base included in REF/ALT
        let is_snp = record.alleles().iter().all(|allele| allele.len() == 1);
        let position = i32::try_from(record.pos())
            .with_context(|| format!("Position of {var_id} out of supported range"))?
            + 2
            - i32::from(is_snp);

        Ok(Some(SiteRecord {
            position,
            var_id,
            samples,
        }))
    }
}

impl SiteSource for VcfSiteSource<'_> {
    fn next_site(&mut self) -> Result<Option<SiteRecord>> {
        if self.exhausted {
            return Ok(None);
        }
        loop {
            match self.reader.read(&mut self.record) {
                None => {
                    self.exhausted = true;
                    return Ok(None);
                }
                Some(result) => result.context("Failed to read VCF/BCF record")?,
            }
            if let Some(site) = self.decode_record()? {
                return Ok(Some(site));
            }
        }
    }
}
