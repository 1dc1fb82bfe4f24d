//! # Command line interface for `ldpair`
use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::engine::DEFAULT_WINDOW;

#[derive(Parser)]
#[command(
    name = "ldpair",
    author,
    version,
    about = "Pairwise linkage disequilibrium between variants in indexed VCF/BCF files",
    long_about = None
)]
pub struct Cli {
    /// Input file, VCF (bgzipped + tabix indexed) or BCF (CSI indexed)
    #[arg(short = 'f', long)]
    pub file: String,

    /// Optional second input file; every cross-file pair is considered
    #[arg(short = 'g', long, requires = "region2")]
    pub file2: Option<String>,

    /// Region to query in the first file, `chr` or `chr:start-end`
    #[arg(short = 'r', long)]
    pub region: String,

    /// Region to query in the second file
    #[arg(short = 's', long, requires = "file2")]
    pub region2: Option<String>,

    /// Sample subset: a file with one sample name per line, or a comma-separated list
    #[arg(short = 'l', long)]
    pub samples: Option<String>,

    /// Window size in bp; pairs farther apart are not reported. Ignored in two-file mode
    #[arg(short = 'w', long, default_value_t = DEFAULT_WINDOW, value_parser = window_in_range)]
    pub window: i32,

    /// Only report pairs involving this variant ID
    #[arg(short = 'v', long)]
    pub variant: Option<String>,

    /// File of variant IDs to retain; all other records are dropped before decoding
    #[arg(short = 'n', long)]
    pub include_variants: Option<String>,
}

impl Cli {
    /// The (file, region) pairs to stream, in command line order.
    pub fn inputs(&self) -> Vec<(&str, &str)> {
        let mut inputs = vec![(self.file.as_str(), self.region.as_str())];
        if let (Some(file2), Some(region2)) = (&self.file2, &self.region2) {
            inputs.push((file2.as_str(), region2.as_str()));
        }
        inputs
    }

    pub fn is_two_file(&self) -> bool {
        self.file2.is_some()
    }
}

fn window_in_range(s: &str) -> Result<i32> {
    let window = s
        .parse()
        .context("Could not parse value passed to --window to integer")?;
    if window < 0 {
        bail!("--window must be non-negative");
    }
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_file_invocation() {
        let cli = Cli::parse_from(["ldpair", "-f", "a.vcf.gz", "-r", "chr1:1-1000"]);
        assert_eq!(vec![("a.vcf.gz", "chr1:1-1000")], cli.inputs());
        assert_eq!(DEFAULT_WINDOW, cli.window);
        assert!(!cli.is_two_file());
    }

    #[test]
    fn two_file_invocation() {
        let cli = Cli::parse_from([
            "ldpair", "-f", "a.vcf.gz", "-r", "chr1", "-g", "b.bcf", "-s", "chr2",
        ]);
        assert_eq!(
            vec![("a.vcf.gz", "chr1"), ("b.bcf", "chr2")],
            cli.inputs()
        );
        assert!(cli.is_two_file());
    }

    #[test]
    fn second_file_requires_second_region() {
        let result = Cli::try_parse_from(["ldpair", "-f", "a.vcf.gz", "-r", "chr1", "-g", "b.bcf"]);
        assert!(result.is_err());
    }

    #[test]
    fn negative_window_is_rejected() {
        let result =
            Cli::try_parse_from(["ldpair", "-f", "a.vcf.gz", "-r", "chr1", "-w", "-5"]);
        assert!(result.is_err());
    }
}
