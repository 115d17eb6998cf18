use crate::error::PlotError;
use crate::loader::CorrelationRecord;
use crate::logger::Logger;
use crate::output::write_atomic;
use bio::io::fasta;
use clap::Args;
use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct FastaToCtArgs {
    /// Input FASTA file (first record is used)
    pub fasta: String,
    /// Output positional file (default: input path with a .ct extension)
    #[arg(short = 'o', long = "output")]
    pub output: Option<String>,
    /// Log file path (default: <output>.log)
    #[arg(short = 'l', long = "log")]
    pub log: Option<String>,
}

impl FastaToCtArgs {
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => PathBuf::from(path),
            None => Path::new(&self.fasta).with_extension("ct"),
        }
    }
}

#[derive(Args, Debug)]
pub struct ReformatArgs {
    /// Raw cross-correlation dump ('#' comment lines)
    pub input: String,
    /// Output correlation file
    pub output: String,
    /// Log file path (default: <output>.log)
    #[arg(short = 'l', long = "log")]
    pub log: Option<String>,
}

/// Validate fasta2ct command arguments
pub fn validate_fasta_args(args: &FastaToCtArgs) -> Result<(), Box<dyn Error>> {
    if !Path::new(&args.fasta).exists() {
        return Err(format!("Error: FASTA file does not exist: {}", args.fasta).into());
    }
    if args.output_path() == Path::new(&args.fasta) {
        return Err(format!(
            "Error: Output path would overwrite the FASTA input: {}",
            args.fasta
        )
        .into());
    }
    Ok(())
}

/// Validate reformat command arguments
pub fn validate_reformat_args(args: &ReformatArgs) -> Result<(), Box<dyn Error>> {
    if !Path::new(&args.input).exists() {
        return Err(format!("Error: Input file does not exist: {}", args.input).into());
    }
    if args.output.trim().is_empty() {
        return Err("Error: Output file path cannot be empty".into());
    }
    Ok(())
}

/// Read the first record of a FASTA file as one whitespace-free sequence
pub fn read_fasta_sequence(path: &Path) -> Result<String, PlotError> {
    let file = File::open(path).map_err(|e| PlotError::io(path, e))?;
    let reader = fasta::Reader::new(file);
    let record = reader
        .records()
        .next()
        .ok_or_else(|| PlotError::format(&path.display().to_string(), 1, "no FASTA record found"))?
        .map_err(|e| PlotError::io(path, e))?;

    Ok(record
        .seq()
        .iter()
        .filter(|b| !b.is_ascii_whitespace())
        .map(|&b| b as char)
        .collect())
}

/// Positional file for an unpaired sequence: header, then `i base i-1 i+1 0 i`
pub fn format_positions(name: &str, sequence: &str) -> String {
    let mut out = format!("{} {} file #\n", sequence.chars().count(), name);
    for (k, base) in sequence.chars().enumerate() {
        let index = k + 1;
        out.push_str(&format!(
            "{} {} {} {} 0 {}\n",
            index,
            base,
            index - 1,
            index + 1,
            index
        ));
    }
    out
}

/// Parse a raw cross-correlation dump: residues from the first two fields, value from the last
pub fn parse_raw_correlations(
    content: &str,
    source: &str,
) -> Result<Vec<CorrelationRecord>, PlotError> {
    let mut records = Vec::new();
    for (n, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(PlotError::format(
                source,
                n + 1,
                format!("expected two residues and a correlation, found {} field(s)", fields.len()),
            ));
        }
        let residue = |token: &str| {
            token.parse::<usize>().map_err(|_| {
                PlotError::format(source, n + 1, format!("residue is not an integer: '{}'", token))
            })
        };
        let last = fields[fields.len() - 1];
        let value = last.parse::<f64>().map_err(|_| {
            PlotError::format(source, n + 1, format!("correlation is not a number: '{}'", last))
        })?;
        records.push(CorrelationRecord {
            i: residue(fields[0])?,
            j: residue(fields[1])?,
            value,
        });
    }
    Ok(records)
}

/// Correlation file with a header line, as read back by the plot loader
pub fn format_correlation_table(records: &[CorrelationRecord]) -> String {
    let mut out = String::from("i\tj\tcorr\n");
    for record in records {
        out.push_str(&format!("{}\t{}\t{:.6}\n", record.i, record.j, record.value));
    }
    out
}

pub fn fasta_to_ct_main(args: &FastaToCtArgs, logger: &mut Logger) -> Result<(), Box<dyn Error>> {
    let fasta_path = Path::new(&args.fasta);
    let output = args.output_path();
    let name = fasta_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sequence")
        .to_string();

    logger.param("FASTA File", &args.fasta)?;

    let sequence = read_fasta_sequence(fasta_path)?;
    logger.step(&format!("Read {} residues for {}", sequence.chars().count(), name))?;

    write_atomic(&output, &format_positions(&name, &sequence))?;
    logger.finish(&format!("Positional file written: {}", output.display()))?;
    Ok(())
}

pub fn reformat_main(args: &ReformatArgs, logger: &mut Logger) -> Result<(), Box<dyn Error>> {
    logger.param("Input File", &args.input)?;

    let content =
        std::fs::read_to_string(&args.input).map_err(|e| PlotError::io(&args.input, e))?;
    let records = parse_raw_correlations(&content, &args.input)?;
    logger.step(&format!("Parsed {} correlation pairs", records.len()))?;

    write_atomic(Path::new(&args.output), &format_correlation_table(&records))?;
    logger.finish(&format!("Correlation file written: {}", args.output))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{correlations_from_str, positions_from_str};

    #[test]
    fn positions_use_neighbour_placeholders() {
        let text = format_positions("apoe", "KVE");
        assert_eq!(
            text,
            "3 apoe file #\n1 K 0 2 0 1\n2 V 1 3 0 2\n3 E 2 4 0 3\n"
        );
    }

    #[test]
    fn generated_positions_load_unpaired() {
        let bases = positions_from_str(&format_positions("p", "MKT"), "p.ct").unwrap();
        assert_eq!(bases.len(), 3);
        assert!(bases.iter().all(|b| b.pair_partner.is_none()));
        assert_eq!(bases[2].symbol, 'T');
    }

    #[test]
    fn fasta_lines_are_joined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apoe.fasta");
        std::fs::write(&path, ">apoe human\nKVEQ AV\nETEP\n").unwrap();
        assert_eq!(read_fasta_sequence(&path).unwrap(), "KVEQAVETEP");
    }

    #[test]
    fn empty_fasta_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.fasta");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            read_fasta_sequence(&path),
            Err(PlotError::Format { .. })
        ));
    }

    #[test]
    fn raw_dump_skips_comments_and_keeps_last_column() {
        let raw = "# wordom cross-correlation\n# res1 res2 ...\n1 2 0.5 0.1234\n\n3   7 x -0.250\n";
        let records = parse_raw_correlations(raw, "raw.wordom").unwrap();
        assert_eq!(
            records,
            vec![
                CorrelationRecord { i: 1, j: 2, value: 0.1234 },
                CorrelationRecord { i: 3, j: 7, value: -0.25 },
            ]
        );
    }

    #[test]
    fn raw_dump_with_bad_residue_fails() {
        let err = parse_raw_correlations("A 2 0.3\n", "raw").unwrap_err();
        assert!(matches!(err, PlotError::Format { line: 1, .. }));
    }

    #[test]
    fn reformatted_table_reads_back() {
        let records = vec![
            CorrelationRecord { i: 1, j: 3, value: 0.2 },
            CorrelationRecord { i: 2, j: 4, value: -0.5 },
        ];
        let table = format_correlation_table(&records);
        assert!(table.contains("1\t3\t0.200000\n"));
        assert_eq!(correlations_from_str(&table, "t").unwrap(), records);
    }

    #[test]
    fn default_output_swaps_extension() {
        let args = FastaToCtArgs {
            fasta: "data/apoe.fasta".to_string(),
            output: None,
            log: None,
        };
        assert_eq!(args.output_path(), PathBuf::from("data/apoe.ct"));
    }
}
