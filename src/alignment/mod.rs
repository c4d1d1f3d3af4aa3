use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::bail;
use bio::io::fasta::Record;
use log::info;

use crate::errors::DataError;
use crate::io::{phylip_string, read_phylip};
use crate::sequences::{get_sequence_type, SequenceType, POSSIBLE_GAPS};
use crate::Result;

/// Map from the generic labels used in files handed to raxmlHPC back to the original ids.
pub type IdMap = HashMap<String, String>;

/// A multiple sequence alignment: equally long, uniquely named sequences of one molecule type.
#[derive(Clone, Debug)]
pub struct Alignment {
    records: Vec<Record>,
    seq_type: SequenceType,
}

impl Alignment {
    /// Creates an alignment, guessing the molecule type from the sequences.
    /// Bails if there are no sequences, they differ in length or the ids are not unique.
    ///
    /// # Example
    /// ```
    /// use bio::io::fasta::Record;
    /// use phylo_raxml::alignment::Alignment;
    /// use phylo_raxml::sequences::SequenceType;
    /// let aln = Alignment::new(vec![
    ///     Record::with_attrs("a", None, b"ACGU"),
    ///     Record::with_attrs("b", None, b"AC-U"),
    /// ]).unwrap();
    /// assert_eq!(aln.seq_count(), 2);
    /// assert_eq!(aln.len(), 4);
    /// assert_eq!(aln.seq_type(), SequenceType::RNA);
    /// ```
    pub fn new(records: Vec<Record>) -> Result<Alignment> {
        let seq_type = get_sequence_type(&records);
        Self::with_type(records, seq_type)
    }

    /// Creates an alignment of the given molecule type. Characters outside the type's
    /// alphabet, apart from the gap symbols `-.?`, are rejected.
    pub fn with_type(records: Vec<Record>, seq_type: SequenceType) -> Result<Alignment> {
        let aln_len = match records.first() {
            Some(rec) => rec.seq().len(),
            None => bail!(DataError::new("Alignment contains no sequences")),
        };
        if aln_len == 0 {
            bail!(DataError::new("Alignment contains only empty sequences"));
        }
        let alphabet = seq_type.alphabet();
        let mut ids = HashSet::with_capacity(records.len());
        for rec in &records {
            if rec.seq().len() != aln_len {
                bail!(DataError::new(format!(
                    "Sequences are not aligned, {} has length {} instead of {}",
                    rec.id(),
                    rec.seq().len(),
                    aln_len
                )));
            }
            if let Some(residue) = rec
                .seq()
                .iter()
                .copied()
                .find(|c| !POSSIBLE_GAPS.contains(c) && !alphabet.is_word([*c]))
            {
                bail!(DataError::new(format!(
                    "Sequence {} contains '{}', which is not a {} character",
                    rec.id(),
                    residue as char,
                    seq_type
                )));
            }
            if !ids.insert(rec.id()) {
                bail!(DataError::new(format!(
                    "Duplicate sequence id {} in alignment",
                    rec.id()
                )));
            }
        }
        Ok(Alignment { records, seq_type })
    }

    /// Reads an alignment from a PHYLIP file.
    pub fn from_phylip_file(path: &Path) -> Result<Alignment> {
        Self::new(read_phylip(path)?)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn ids(&self) -> Vec<String> {
        self.records.iter().map(|rec| rec.id().to_string()).collect()
    }

    pub fn seq_type(&self) -> SequenceType {
        self.seq_type
    }

    pub fn seq_count(&self) -> usize {
        self.records.len()
    }

    /// Number of alignment columns.
    pub fn len(&self) -> usize {
        self.records[0].seq().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Renders the alignment as PHYLIP text with the generic labels `seq0000001`,
    /// `seq0000002`, ... and returns the map from generic label to original id.
    /// Generic labels keep arbitrary ids out of raxmlHPC, which truncates and rejects some names.
    ///
    /// # Example
    /// ```
    /// use bio::io::fasta::Record;
    /// use phylo_raxml::alignment::Alignment;
    /// let aln = Alignment::new(vec![
    ///     Record::with_attrs("first sequence", None, b"ACGT"),
    ///     Record::with_attrs("second", None, b"AC-T"),
    /// ]).unwrap();
    /// let (phylip, id_map) = aln.to_phylip().unwrap();
    /// assert_eq!(phylip, "2 4\nseq0000001 ACGT\nseq0000002 AC-T\n");
    /// assert_eq!(id_map["seq0000001"], "first sequence");
    /// ```
    pub fn to_phylip(&self) -> Result<(String, IdMap)> {
        info!(
            "Converting alignment of {} sequences to PHYLIP with generic labels",
            self.seq_count()
        );
        let mut id_map = IdMap::with_capacity(self.records.len());
        let relabelled: Vec<Record> = self
            .records
            .iter()
            .enumerate()
            .map(|(i, rec)| {
                let label = generic_label(i + 1);
                id_map.insert(label.clone(), rec.id().to_string());
                Record::with_attrs(&label, None, rec.seq())
            })
            .collect();
        Ok((phylip_string(&relabelled)?, id_map))
    }
}

fn generic_label(number: usize) -> String {
    format!("seq{number:07}")
}
