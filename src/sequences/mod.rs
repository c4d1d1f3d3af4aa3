use std::fmt::Display;
use std::str::FromStr;

use anyhow::bail;
use bio::alphabets::Alphabet;
use bio::io::fasta::Record;

use crate::errors::DataError;
use crate::Result;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum SequenceType {
    DNA,
    RNA,
    Protein,
}

impl SequenceType {
    /// Model passed to raxmlHPC with `-m` when the caller does not choose one.
    pub fn default_model(&self) -> &'static str {
        match self {
            SequenceType::DNA | SequenceType::RNA => "GTRGAMMA",
            SequenceType::Protein => "PROTGAMMAWAG",
        }
    }

    pub fn alphabet(&self) -> Alphabet {
        match self {
            SequenceType::DNA => dna_alphabet(),
            SequenceType::RNA => rna_alphabet(),
            SequenceType::Protein => protein_alphabet(),
        }
    }
}

impl Display for SequenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SequenceType::DNA => write!(f, "DNA"),
            SequenceType::RNA => write!(f, "RNA"),
            SequenceType::Protein => write!(f, "protein"),
        }
    }
}

impl FromStr for SequenceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DNA" => Ok(SequenceType::DNA),
            "RNA" => Ok(SequenceType::RNA),
            "PROTEIN" | "AA" => Ok(SequenceType::Protein),
            _ => bail!(DataError::new(format!(
                "Unknown molecule type: {s}, expected one of DNA, RNA or protein"
            ))),
        }
    }
}

pub fn charify(chars: &str) -> Vec<u8> {
    chars.chars().map(|c| c as u8).collect()
}

pub static AMINOACIDS_STR: &str = "ARNDCQEGHILKMFPSTWYV";
pub static AMB_AMINOACIDS_STR: &str = "BJZX";

pub static NUCLEOTIDES_STR: &str = "TCAG";
pub static RNA_NUCLEOTIDES_STR: &str = "UCAG";
pub static AMB_NUCLEOTIDES_STR: &str = "RYSWKMBDHVNZX";

pub static GAP: u8 = b'-';
pub static POSSIBLE_GAPS: &[u8] = b"-.?";

fn nucleotide_alphabet(nucleotides: &str) -> Alphabet {
    let mut nucleotides = charify(nucleotides);
    nucleotides.append(&mut (charify(AMB_NUCLEOTIDES_STR)));
    nucleotides.append(&mut nucleotides.clone().to_ascii_lowercase());
    nucleotides.push(GAP);
    Alphabet::new(nucleotides)
}

pub fn dna_alphabet() -> Alphabet {
    nucleotide_alphabet(NUCLEOTIDES_STR)
}

pub fn rna_alphabet() -> Alphabet {
    nucleotide_alphabet(RNA_NUCLEOTIDES_STR)
}

pub fn protein_alphabet() -> Alphabet {
    let mut aminoacids = charify(AMINOACIDS_STR);
    aminoacids.append(&mut (charify(AMB_AMINOACIDS_STR)));
    aminoacids.append(&mut aminoacids.clone().to_ascii_lowercase());
    aminoacids.push(GAP);
    Alphabet::new(aminoacids)
}

/// Guesses the molecule type of the sequences, trying DNA first, then RNA. Gap symbols are ignored.
/// Anything that is neither is treated as protein.
pub fn get_sequence_type(sequences: &[Record]) -> SequenceType {
    let dna = dna_alphabet();
    if sequences.iter().all(|rec| is_word_ignoring_gaps(&dna, rec.seq())) {
        return SequenceType::DNA;
    }
    let rna = rna_alphabet();
    if sequences.iter().all(|rec| is_word_ignoring_gaps(&rna, rec.seq())) {
        return SequenceType::RNA;
    }
    SequenceType::Protein
}

fn is_word_ignoring_gaps(alphabet: &Alphabet, seq: &[u8]) -> bool {
    alphabet.is_word(seq.iter().filter(|c| !POSSIBLE_GAPS.contains(c)))
}
