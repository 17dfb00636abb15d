use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fmd_merge_mapper::fmd::{
    BwtBackend, ContigTable, FMDIndex, GenomeMask, InMemoryBwt, RangeBases, RangeVector,
    ReferenceBase, Strand, TextPosition,
};
use fmd_merge_mapper::io::{load_contigs, load_mask, load_sequences};
use fmd_merge_mapper::merge::{MergeApplier, MergeConfig, MergeDriver, PinchSink};
use fmd_merge_mapper::BitVectorBuilder;

#[derive(Parser, Debug)]
#[command(name = "fmd-merge-mapper", about = "Bidirectional FM-index merge mapper for pangenome construction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Map every contig of a genome collection against a target genome and
    /// emit the resulting pinch-graph merges.
    Merge {
        /// Basename shared by `<basename>.contigs`, `<basename>.fasta`,
        /// and the optional `<basename>.msk` mask file.
        basename: PathBuf,
        /// Genome number (0-based, in contigs-file order) to map every
        /// other contig against.
        #[arg(long)]
        genome: usize,
        /// Minimum context length a mapping must achieve to be trusted.
        #[arg(long, default_value_t = 20)]
        min_context: usize,
        /// Use the two-sided credit map instead of the one-sided map.
        #[arg(long)]
        credit: bool,
        /// Mismatch budget per mapped position (0 disables mismatch-tolerant mapping).
        #[arg(long, default_value_t = 0)]
        mismatches: u32,
        /// Emit merges generated from a one-sided match, tagged non-reversible.
        #[arg(long)]
        include_non_reversible: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Merge {
            basename,
            genome,
            min_context,
            credit,
            mismatches,
            include_non_reversible,
        } => run_merge(
            basename,
            genome,
            min_context,
            credit,
            mismatches,
            include_non_reversible,
        ),
    }
}

fn run_merge(
    basename: PathBuf,
    genome: usize,
    min_context: usize,
    credit: bool,
    mismatches: u32,
    include_non_reversible: bool,
) -> Result<()> {
    let contigs_path = with_extension(&basename, "contigs");
    let fasta_path = with_extension(&basename, "fasta");
    let mask_path = with_extension(&basename, "msk");

    let contigs = load_contigs(&contigs_path)
        .with_context(|| format!("failed to load contigs from {}", contigs_path.display()))?;
    let sequences = load_sequences(&fasta_path, contigs.num_contigs())
        .with_context(|| format!("failed to load sequences from {}", fasta_path.display()))?;

    let mask: Option<GenomeMask> = if mask_path.exists() {
        Some(
            load_mask(&mask_path)
                .with_context(|| format!("failed to load mask from {}", mask_path.display()))?,
        )
    } else {
        None
    };

    let mut texts = Vec::with_capacity(sequences.len() * 2);
    for seq in &sequences {
        texts.push(seq.clone());
        texts.push(fmd_merge_mapper::alphabet::reverse_complement(seq));
    }
    let bwt = InMemoryBwt::build(&texts).context("failed to build in-memory BWT")?;

    let (ranges, range_bases) = build_reference_ranges(&bwt, &contigs, genome)
        .context("failed to build reference range table")?;

    let index = Arc::new(FMDIndex::new(Box::new(bwt), contigs, mask, Some(ranges)));
    let range_bases = Arc::new(range_bases);

    let config = MergeConfig {
        genome,
        min_context,
        credit,
        mismatches,
        include_non_reversible,
    };

    let mut driver = MergeDriver::new();
    let receiver = driver
        .run(config, index, range_bases)
        .context("failed to start merge driver")?;

    let sink = NullPinchSink;
    let applier = MergeApplier::new(sink);
    let applied = applier
        .run(receiver.queue())
        .context("merge applier failed")?;

    println!("applied {applied} merges");
    Ok(())
}

fn with_extension(basename: &PathBuf, ext: &str) -> PathBuf {
    let mut path = basename.clone();
    path.set_extension(ext);
    path
}

/// Build a one-row-per-reference-base range table for `genome`, so the
/// merge generator can test whether a mapped interval collapses onto a
/// single reference base.
fn build_reference_ranges(
    bwt: &InMemoryBwt,
    contigs: &ContigTable,
    genome: usize,
) -> Result<(RangeVector, RangeBases)> {
    let mut rows_and_bases: Vec<(usize, ReferenceBase)> = Vec::new();
    for contig in contigs.genome_contigs(genome)? {
        let length = contigs.contig_length(contig)?;
        for strand in [Strand::Forward, Strand::Reverse] {
            let text = TextPosition::for_contig(contig, strand, 0).text();
            for offset in 0..length {
                if let Some(row) = bwt.row_of(text, offset) {
                    let base = match strand {
                        Strand::Forward => offset + 1,
                        Strand::Reverse => length - offset,
                    };
                    rows_and_bases.push((
                        row,
                        ReferenceBase {
                            contig,
                            base,
                            orientation: strand == Strand::Reverse,
                        },
                    ));
                }
            }
        }
    }
    rows_and_bases.sort_by_key(|(row, _)| *row);

    let mut builder = BitVectorBuilder::new(bwt.len());
    let mut bases = Vec::with_capacity(rows_and_bases.len());
    for (row, base) in rows_and_bases {
        builder.add_bit(row).context("range row out of bounds")?;
        bases.push(base);
    }

    Ok((RangeVector::new(builder.finish()), RangeBases::new(bases)))
}

/// A [`PinchSink`] that just logs every merge; there is no production
/// pinch-graph library available to this crate (`spec.md` §1 scopes the
/// pinch graph itself out as a Non-goal).
struct NullPinchSink;

impl PinchSink for NullPinchSink {
    fn pinch(&self, first: TextPosition, second: TextPosition, same_orientation: bool) {
        tracing::info!(?first, ?second, same_orientation, "pinch");
    }
}
