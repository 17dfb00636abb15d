//! Contig/genome bookkeeping shared by the BWT backend and the index.
//!
//! A BWT built over a pangenome collection concatenates, for every contig,
//! its forward strand immediately followed by its reverse complement. A
//! "text" in the sense of [`TextPosition`] is therefore `contig * 2 +
//! strand`, matching `TextPosition`/`getContigNumber`/`getStrand` in the
//! original source.

use thiserror::Error;

/// Forward or reverse-complement strand of a contig's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    /// The contig as stored in its input orientation.
    Forward,
    /// The reverse complement of the contig.
    Reverse,
}

impl Strand {
    /// Numeric encoding used in `TextPosition::text = contig * 2 + strand`.
    pub fn as_usize(self) -> usize {
        match self {
            Strand::Forward => 0,
            Strand::Reverse => 1,
        }
    }

    /// The other strand.
    pub fn flip(self) -> Strand {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
        }
    }

    fn from_usize(v: usize) -> Strand {
        if v % 2 == 0 {
            Strand::Forward
        } else {
            Strand::Reverse
        }
    }
}

/// A single base position within a specific contig and strand.
///
/// `offset` is 0-based from the start of that strand's text, matching the
/// source's `TextPosition(contigNumber * 2 + strand, offset)` convention
/// rather than the 1-based external base numbers used at the merge-scheme
/// boundary (see [`crate::merge::generator`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextPosition {
    text: usize,
    offset: usize,
}

impl TextPosition {
    /// Construct directly from a text index and offset.
    pub fn new(text: usize, offset: usize) -> Self {
        Self { text, offset }
    }

    /// Construct from a contig number, strand, and offset.
    pub fn for_contig(contig: usize, strand: Strand, offset: usize) -> Self {
        Self {
            text: contig * 2 + strand.as_usize(),
            offset,
        }
    }

    /// The combined text index (`contig * 2 + strand`).
    pub fn text(self) -> usize {
        self.text
    }

    /// The contig this position belongs to.
    pub fn contig(self) -> usize {
        self.text / 2
    }

    /// The strand this position is on.
    pub fn strand(self) -> Strand {
        Strand::from_usize(self.text)
    }

    /// 0-based offset within the strand's text.
    pub fn offset(self) -> usize {
        self.offset
    }

    /// Shift the offset by `delta` positions, staying on the same text.
    pub fn shifted(self, delta: usize) -> Self {
        Self {
            text: self.text,
            offset: self.offset + delta,
        }
    }
}

/// Length and name metadata for one contig.
#[derive(Debug, Clone)]
pub struct ContigEntry {
    /// Contig name as it appeared in the source sequence file.
    pub name: String,
    /// Length of the contig in bases.
    pub length: usize,
}

/// Errors raised while resolving contig or genome identifiers.
#[derive(Debug, Error)]
pub enum ContigTableError {
    /// A contig index was not present in the table.
    #[error("no contig numbered {0}")]
    UnknownContig(usize),
    /// A genome id was not present in the table.
    #[error("no genome numbered {0}")]
    UnknownGenome(usize),
}

/// Maps contig numbers to lengths/names and groups contiguous contig ranges
/// into genomes, mirroring `FMDIndex::getGenomeContigs`.
#[derive(Debug, Clone)]
pub struct ContigTable {
    contigs: Vec<ContigEntry>,
    genomes: Vec<(usize, usize)>,
}

impl ContigTable {
    /// Build a table from contig entries and, for each genome in order, the
    /// number of contigs it contributes (contiguous ranges, matching the
    /// on-disk contig file's genome grouping, §6).
    pub fn new(contigs: Vec<ContigEntry>, genome_contig_counts: Vec<usize>) -> Self {
        let mut genomes = Vec::with_capacity(genome_contig_counts.len());
        let mut cursor = 0;
        for count in genome_contig_counts {
            genomes.push((cursor, count));
            cursor += count;
        }
        Self { contigs, genomes }
    }

    /// Number of contigs across all genomes.
    pub fn num_contigs(&self) -> usize {
        self.contigs.len()
    }

    /// Number of distinct texts (`2 * num_contigs`, forward + reverse).
    pub fn num_texts(&self) -> usize {
        self.contigs.len() * 2
    }

    /// Length of `contig` in bases.
    pub fn contig_length(&self, contig: usize) -> Result<usize, ContigTableError> {
        self.contigs
            .get(contig)
            .map(|c| c.length)
            .ok_or(ContigTableError::UnknownContig(contig))
    }

    /// Name of `contig`.
    pub fn contig_name(&self, contig: usize) -> Result<&str, ContigTableError> {
        self.contigs
            .get(contig)
            .map(|c| c.name.as_str())
            .ok_or(ContigTableError::UnknownContig(contig))
    }

    /// The half-open range of contig numbers belonging to `genome`,
    /// mirroring `FMDIndex::getGenomeContigs`.
    pub fn genome_contigs(&self, genome: usize) -> Result<std::ops::Range<usize>, ContigTableError> {
        let (first, count) = self
            .genomes
            .get(genome)
            .copied()
            .ok_or(ContigTableError::UnknownGenome(genome))?;
        Ok(first..first + count)
    }

    /// Iterate the `(contig, length)` pairs of every contig in `genome`.
    pub fn genome_contig_lengths(
        &self,
        genome: usize,
    ) -> Result<Vec<(usize, usize)>, ContigTableError> {
        self.genome_contigs(genome)?
            .map(|contig| self.contig_length(contig).map(|len| (contig, len)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ContigTable {
        ContigTable::new(
            vec![
                ContigEntry { name: "g0c0".into(), length: 10 },
                ContigEntry { name: "g0c1".into(), length: 20 },
                ContigEntry { name: "g1c0".into(), length: 5 },
            ],
            vec![2, 1],
        )
    }

    #[test]
    fn genome_contig_ranges_are_contiguous() {
        let t = table();
        assert_eq!(t.genome_contigs(0).unwrap(), 0..2);
        assert_eq!(t.genome_contigs(1).unwrap(), 2..3);
        assert!(t.genome_contigs(2).is_err());
    }

    #[test]
    fn text_position_round_trips_contig_and_strand() {
        let pos = TextPosition::for_contig(3, Strand::Reverse, 7);
        assert_eq!(pos.contig(), 3);
        assert_eq!(pos.strand(), Strand::Reverse);
        assert_eq!(pos.offset(), 7);
        assert_eq!(pos.text(), 7);
    }

    #[test]
    fn num_texts_is_twice_num_contigs() {
        let t = table();
        assert_eq!(t.num_texts(), 6);
    }
}
