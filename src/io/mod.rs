use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::bail;
use bio::io::fasta::Record;
use log::{debug, info, warn};
use rand::distributions::{Alphanumeric, DistString};

use crate::errors::DataError;
use crate::tree::{tree_parser, Tree};
use crate::Result;

/// Reads a PHYLIP alignment file, returning one record per sequence.
///
/// Both sequential and interleaved layouts are read. A third token on the header line
/// (e.g. `7 50 I`) marks the file as interleaved; without it the layout is inferred from
/// the first block of lines. Labels are taken as the first
/// whitespace-delimited word of a line, sequences may be split into space-separated blocks.
///
/// # Arguments
/// * `path` - Path to the PHYLIP file.
///
/// # Example
/// ```
/// use phylo_raxml::io::read_phylip;
/// use std::path::PathBuf;
/// let records = read_phylip(&PathBuf::from("./data/species_rna.phy")).unwrap();
/// # assert_eq!(records.len(), 7);
/// # for rec in records {
/// #    assert_eq!(rec.seq().len(), 50);
/// # }
/// ```
pub fn read_phylip(path: &Path) -> Result<Vec<Record>> {
    info!("Reading PHYLIP alignment from file {}", path.display());
    let content = fs::read_to_string(path)?;
    let records = parse_phylip(&content)?;
    info!("Read {} sequences successfully", records.len());
    Ok(records)
}

/// Parses a PHYLIP alignment from a string, see [`read_phylip`] for the accepted layouts.
pub fn parse_phylip(content: &str) -> Result<Vec<Record>> {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let header = match lines.next() {
        Some(header) => header,
        None => bail!(DataError::new("Empty PHYLIP input")),
    };
    let (num_seqs, seq_len, marked_interleaved) = parse_phylip_header(header)?;
    let lines: Vec<&str> = lines.collect();

    let (ids, seqs) = if marked_interleaved || looks_interleaved(&lines, num_seqs, seq_len) {
        debug!("Reading PHYLIP input as interleaved");
        split_interleaved(&lines, num_seqs)
    } else {
        split_sequential(&lines, seq_len)
    };

    if ids.len() != num_seqs {
        bail!(DataError::new(format!(
            "PHYLIP header declares {} sequences, found {}",
            num_seqs,
            ids.len()
        )));
    }
    let mut records = Vec::with_capacity(num_seqs);
    for (id, seq) in ids.into_iter().zip(seqs) {
        if seq.len() != seq_len {
            bail!(DataError::new(format!(
                "Sequence {} has length {}, PHYLIP header declares {}",
                id,
                seq.len(),
                seq_len
            )));
        }
        records.push(Record::with_attrs(&id, None, &seq));
    }
    Ok(records)
}

/// An unmarked file is interleaved if the first block holds one labelled, equally long and
/// incomplete line per sequence and the remaining lines form whole blocks.
fn looks_interleaved(lines: &[&str], num_seqs: usize, seq_len: usize) -> bool {
    if num_seqs == 0 || lines.len() <= num_seqs || lines.len() % num_seqs != 0 {
        return false;
    }
    let block_lens: Vec<usize> = lines[..num_seqs]
        .iter()
        .map(|line| split_labelled_line(line).1.len())
        .collect();
    block_lens[0] > 0 && block_lens[0] < seq_len && block_lens.iter().all(|&l| l == block_lens[0])
}

fn split_interleaved(lines: &[&str], num_seqs: usize) -> (Vec<String>, Vec<Vec<u8>>) {
    let mut ids = Vec::with_capacity(num_seqs);
    let mut seqs: Vec<Vec<u8>> = Vec::with_capacity(num_seqs);
    for (i, line) in lines.iter().enumerate() {
        if i < num_seqs {
            let (id, seq) = split_labelled_line(line);
            ids.push(id.to_string());
            seqs.push(seq);
        } else {
            seqs[i % num_seqs].extend(strip_whitespace(line));
        }
    }
    (ids, seqs)
}

fn split_sequential(lines: &[&str], seq_len: usize) -> (Vec<String>, Vec<Vec<u8>>) {
    let mut ids = Vec::new();
    let mut seqs: Vec<Vec<u8>> = Vec::new();
    for line in lines {
        match seqs.last_mut() {
            Some(seq) if seq.len() < seq_len => seq.extend(strip_whitespace(line)),
            _ => {
                let (id, seq) = split_labelled_line(line);
                ids.push(id.to_string());
                seqs.push(seq);
            }
        }
    }
    (ids, seqs)
}

fn parse_phylip_header(header: &str) -> Result<(usize, usize, bool)> {
    let parts: Vec<&str> = header.split_whitespace().collect();
    if parts.len() < 2 {
        bail!(DataError::new(format!("Malformed PHYLIP header: {header}")));
    }
    match (parts[0].parse::<usize>(), parts[1].parse::<usize>()) {
        (Ok(num_seqs), Ok(seq_len)) if num_seqs > 0 && seq_len > 0 => {
            Ok((num_seqs, seq_len, parts.len() > 2))
        }
        _ => bail!(DataError::new(format!("Malformed PHYLIP header: {header}"))),
    }
}

fn split_labelled_line(line: &str) -> (&str, Vec<u8>) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((id, rest)) => (id, strip_whitespace(rest)),
        None => (line, Vec::new()),
    }
}

fn strip_whitespace(line: &str) -> Vec<u8> {
    line.bytes().filter(|b| !b.is_ascii_whitespace()).collect()
}

/// Formats records as a sequential PHYLIP alignment. Labels are padded to ten characters.
/// Bails if there are no sequences or they differ in length.
///
/// # Example
/// ```
/// use bio::io::fasta::Record;
/// use phylo_raxml::io::phylip_string;
/// let sequences = vec![
///    Record::with_attrs("seq0000001", None, b"ATGC"),
///    Record::with_attrs("seq0000002", None, b"CGTA"),
/// ];
/// assert_eq!(phylip_string(&sequences).unwrap(), "2 4\nseq0000001 ATGC\nseq0000002 CGTA\n");
/// ```
pub fn phylip_string(sequences: &[Record]) -> Result<String> {
    let seq_len = match sequences.first() {
        Some(rec) => rec.seq().len(),
        None => bail!(DataError::new("Alignment contains no sequences")),
    };
    let mut out = format!("{} {}\n", sequences.len(), seq_len);
    for rec in sequences {
        if rec.seq().len() != seq_len {
            bail!(DataError::new(format!(
                "Sequences are not aligned, {} has length {} instead of {}",
                rec.id(),
                rec.seq().len(),
                seq_len
            )));
        }
        out.push_str(&format!(
            "{:<10} {}\n",
            rec.id(),
            String::from_utf8_lossy(rec.seq())
        ));
    }
    Ok(out)
}

/// Writes records as a PHYLIP alignment to the given path. Will return an error if the file
/// already exists.
pub fn write_phylip_to_file(sequences: &[Record], path: &Path) -> Result<()> {
    info!("Writing PHYLIP alignment to file {}", path.display());
    if path.exists() {
        bail!(DataError::new("File already exists"));
    }
    let content = phylip_string(sequences)?;
    let mut writer = File::create(path)?;
    writer.write_all(content.as_bytes())?;
    info!("Finished writing successfully");
    Ok(())
}

/// Reads newick trees from a file, returning a vector of trees.
///
/// # Example
/// ```
/// use phylo_raxml::io::read_newick_from_file;
/// use std::path::PathBuf;
/// let trees = read_newick_from_file(&PathBuf::from("./data/ref_tree.newick")).unwrap();
/// # assert_eq!(trees.len(), 1);
/// # assert_eq!(trees[0].tips().len(), 5);
/// ```
pub fn read_newick_from_file(path: &Path) -> Result<Vec<Tree>> {
    info!("Reading newick trees from file {}", path.display());
    let newick = fs::read_to_string(path)?;
    info!("Read file successfully");
    let trees = tree_parser::from_newick(&newick)?;
    if trees.len() > 1 {
        warn!(
            "{} trees found in {}, callers expecting one tree will use the first",
            trees.len(),
            path.display()
        );
    }
    Ok(trees)
}

/// Writes newick trees to the given file path, one per line.
/// Will return an error if the file already exists.
pub fn write_newick_to_file(trees: &[Tree], path: &Path) -> Result<()> {
    info!("Writing newick trees to file {}", path.display());
    if path.exists() {
        bail!(DataError::new("File already exists"));
    }
    let mut writer = File::create(path)?;
    for tree in trees {
        writer.write_all(tree.to_newick().as_bytes())?;
        writer.write_all(b"\n")?;
    }
    info!("Finished writing successfully");
    Ok(())
}

/// Returns a fresh path `<dir>/<prefix><20 random alphanumerics><suffix>`.
/// The file is not created.
pub fn get_tmp_filename(dir: &Path, prefix: &str, suffix: &str) -> PathBuf {
    let stem = Alphanumeric.sample_string(&mut rand::thread_rng(), 20);
    dir.join(format!("{prefix}{stem}{suffix}"))
}
