//! On-disk artifact loaders: contig tables and genome masks.
//!
//! `spec.md` §6 lists the BWT/sampled-SA pair, a contigs file, and a
//! genome-mask file as external collaborators this crate consumes rather
//! than produces. The BWT/SSA loader is the `BwtBackend` trait boundary
//! (see [`crate::fmd::BwtBackend`]); this module covers the other two,
//! parsed as plain text so the crate stays runnable without a fabricated
//! binary format.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::bitvector::BitVectorBuilder;
use crate::fmd::{ContigEntry, ContigTable, GenomeMask};

/// Errors raised while loading on-disk artifacts.
#[derive(Debug, Error)]
pub enum IoError {
    /// The underlying file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that failed to open or read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A line did not match the expected format.
    #[error("malformed line {line} in {path}: {detail}")]
    Malformed {
        /// Path being parsed.
        path: String,
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        detail: String,
    },
}

fn open(path: &Path) -> Result<BufReader<File>, IoError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| IoError::Read {
            path: path.display().to_string(),
            source,
        })
}

/// Load a `{basename}.contigs` file: a header line with the number of
/// genomes, then for each genome a count line followed by that many
/// `<name> <length>` lines.
pub fn load_contigs(path: &Path) -> Result<ContigTable, IoError> {
    let reader = open(path)?;
    let path_str = path.display().to_string();
    let mut lines = reader.lines();

    let malformed = |line_no: usize, detail: &str| IoError::Malformed {
        path: path_str.clone(),
        line: line_no,
        detail: detail.to_string(),
    };

    let read_line = |lines: &mut std::io::Lines<BufReader<File>>, line_no: usize| -> Result<String, IoError> {
        lines
            .next()
            .ok_or_else(|| malformed(line_no, "unexpected end of file"))?
            .map_err(|source| IoError::Read {
                path: path_str.clone(),
                source,
            })
    };

    let mut line_no = 1;
    let genome_count: usize = read_line(&mut lines, line_no)?
        .trim()
        .parse()
        .map_err(|_| malformed(line_no, "expected genome count"))?;

    let mut contigs = Vec::new();
    let mut genome_contig_counts = Vec::with_capacity(genome_count);

    for _ in 0..genome_count {
        line_no += 1;
        let count: usize = read_line(&mut lines, line_no)?
            .trim()
            .parse()
            .map_err(|_| malformed(line_no, "expected contig count for genome"))?;
        genome_contig_counts.push(count);

        for _ in 0..count {
            line_no += 1;
            let raw = read_line(&mut lines, line_no)?;
            let mut parts = raw.split_whitespace();
            let name = parts
                .next()
                .ok_or_else(|| malformed(line_no, "expected contig name"))?
                .to_string();
            let length: usize = parts
                .next()
                .ok_or_else(|| malformed(line_no, "expected contig length"))?
                .parse()
                .map_err(|_| malformed(line_no, "contig length must be a number"))?;
            contigs.push(ContigEntry { name, length });
        }
    }

    Ok(ContigTable::new(contigs, genome_contig_counts))
}

/// Load a `{basename}.fasta` file: one line of raw `ACGTN` sequence per
/// contig, in the same order as the contigs file. This is the
/// demonstration counterpart of the on-disk BWT/SSA loader `spec.md` §6
/// scopes out of this crate — production loaders would read a prebuilt
/// BWT directly rather than raw sequence.
pub fn load_sequences(path: &Path, expected_contigs: usize) -> Result<Vec<Vec<u8>>, IoError> {
    let reader = open(path)?;
    let mut sequences = Vec::with_capacity(expected_contigs);
    for line in reader.lines() {
        let line = line.map_err(|source| IoError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        sequences.push(trimmed.to_ascii_uppercase().into_bytes());
    }
    if sequences.len() != expected_contigs {
        return Err(IoError::Malformed {
            path: path.display().to_string(),
            line: sequences.len() + 1,
            detail: format!(
                "expected {expected_contigs} contig sequences, found {}",
                sequences.len()
            ),
        });
    }
    Ok(sequences)
}

/// Load a `{basename}.msk` file: one line, a string of `0`/`1` characters,
/// one per BWT row, marking which rows are included in the mask.
pub fn load_mask(path: &Path) -> Result<GenomeMask, IoError> {
    let mut reader = open(path)?;
    let mut line = String::new();
    reader.read_line(&mut line).map_err(|source| IoError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let trimmed = line.trim_end();

    let mut builder = BitVectorBuilder::new(trimmed.len());
    for (i, ch) in trimmed.chars().enumerate() {
        match ch {
            '1' => {
                builder
                    .add_bit(i)
                    .map_err(|_| IoError::Malformed {
                        path: path.display().to_string(),
                        line: 1,
                        detail: format!("bit {i} out of range"),
                    })?;
            }
            '0' => {}
            other => {
                return Err(IoError::Malformed {
                    path: path.display().to_string(),
                    line: 1,
                    detail: format!("unexpected mask character '{other}'"),
                })
            }
        }
    }
    Ok(GenomeMask::new(builder.finish()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_well_formed_contigs_file() {
        let mut file = tempfile_with_content(
            "2\n1\nrefA 10\n2\nqueryA 5\nqueryB 7\n",
        );
        let table = load_contigs(file.path()).unwrap();
        assert_eq!(table.num_contigs(), 3);
        assert_eq!(table.genome_contigs(0).unwrap(), 0..1);
        assert_eq!(table.genome_contigs(1).unwrap(), 1..3);
        file.close();
    }

    #[test]
    fn loads_mask_file() {
        let mut file = tempfile_with_content("10110\n");
        let mask = load_mask(file.path()).unwrap();
        assert!(mask.is_included(0));
        assert!(!mask.is_included(1));
        assert!(mask.is_included(2));
        assert!(mask.is_included(3));
        assert!(!mask.is_included(4));
        file.close();
    }

    struct TempFile {
        path: std::path::PathBuf,
    }

    impl TempFile {
        fn path(&self) -> &Path {
            &self.path
        }

        fn close(self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    fn tempfile_with_content(content: &str) -> TempFile {
        let mut path = std::env::temp_dir();
        path.push(format!("fmd_merge_mapper_test_{}_{}", std::process::id(), content.len()));
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        TempFile { path }
    }
}
