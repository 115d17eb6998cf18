use crate::error::PlotError;
use std::fs;
use std::path::Path;

/// One residue/monomer position of the plotted sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Base {
    pub index: usize,
    pub symbol: char,
    pub pair_partner: Option<usize>, // None when column 5 is absent or 0
}

/// Correlation between two base indices, +1 perfectly correlated, -1 anti-correlated
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationRecord {
    pub i: usize,
    pub j: usize,
    pub value: f64,
}

fn read_input(path: &Path) -> Result<String, PlotError> {
    fs::read_to_string(path).map_err(|e| PlotError::io(path, e))
}

/// Parse a positional (connectivity table) file
pub fn parse_positions(path: &Path) -> Result<Vec<Base>, PlotError> {
    let content = read_input(path)?;
    positions_from_str(&content, &path.display().to_string())
}

/// Parse the correlation-pairs file, discarding its header line
pub fn parse_correlations(path: &Path) -> Result<Vec<CorrelationRecord>, PlotError> {
    let content = read_input(path)?;
    correlations_from_str(&content, &path.display().to_string())
}

fn parse_field<T: std::str::FromStr>(
    token: &str,
    name: &str,
    source: &str,
    line_no: usize,
) -> Result<T, PlotError> {
    token.parse::<T>().map_err(|_| {
        PlotError::format(source, line_no, format!("{} field is not a number: '{}'", name, token))
    })
}

pub fn positions_from_str(content: &str, source: &str) -> Result<Vec<Base>, PlotError> {
    let mut lines = content.lines();
    let header = lines
        .next()
        .ok_or_else(|| PlotError::format(source, 1, "file is empty, expected a base count header"))?;
    let count_token = header
        .split_whitespace()
        .next()
        .ok_or_else(|| PlotError::format(source, 1, "header has no base count"))?;
    let count: usize = parse_field(count_token, "base count", source, 1)?;

    let mut bases = Vec::new();
    for n in 0..count {
        let line_no = n + 2;
        let line = lines.next().ok_or_else(|| {
            PlotError::format(
                source,
                line_no,
                format!("header declares {} bases but only {} lines follow", count, n),
            )
        })?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(PlotError::format(
                source,
                line_no,
                format!("expected at least index and symbol, found {} field(s)", fields.len()),
            ));
        }

        let index: usize = parse_field(fields[0], "index", source, line_no)?;
        let mut chars = fields[1].chars();
        let symbol = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(PlotError::format(
                    source,
                    line_no,
                    format!("symbol must be a single character: '{}'", fields[1]),
                ))
            }
        };
        let pair_partner = match fields.get(4) {
            Some(token) => match parse_field::<usize>(token, "pair partner", source, line_no)? {
                0 => None,
                partner => Some(partner),
            },
            None => None,
        };

        bases.push(Base {
            index,
            symbol,
            pair_partner,
        });
    }

    Ok(bases)
}

pub fn correlations_from_str(
    content: &str,
    source: &str,
) -> Result<Vec<CorrelationRecord>, PlotError> {
    let mut records = Vec::new();
    // trailing blank lines end the file; blank lines inside it are malformed
    for (n, line) in content.trim_end().lines().enumerate().skip(1) {
        let line_no = n + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(PlotError::format(
                source,
                line_no,
                format!("expected 'i j value', found {} field(s)", fields.len()),
            ));
        }
        records.push(CorrelationRecord {
            i: parse_field(fields[0], "i", source, line_no)?,
            j: parse_field(fields[1], "j", source, line_no)?,
            value: parse_field(fields[2], "value", source, line_no)?,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGCU_CT: &str = "4 agcu file #\n\
        1 A 0 2 0 1\n\
        2 G 1 3 4 2\n\
        3 C 2 4 0 3\n\
        4 U 3 5 2 4\n";

    #[test]
    fn positions_follow_file_order() {
        let bases = positions_from_str(AGCU_CT, "agcu.ct").unwrap();
        let symbols: String = bases.iter().map(|b| b.symbol).collect();
        assert_eq!(symbols, "AGCU");
        assert_eq!(bases[0].pair_partner, None);
        assert_eq!(bases[1].pair_partner, Some(4));
        assert_eq!(bases[3].index, 4);
    }

    #[test]
    fn only_the_declared_number_of_lines_is_read() {
        let content = "2 trailing data\n1 A 0 2 0 1\n2 G 1 3 0 2\n3 C 2 4 0 3\n";
        let bases = positions_from_str(content, "x.ct").unwrap();
        assert_eq!(bases.len(), 2);
    }

    #[test]
    fn partner_column_is_optional() {
        let bases = positions_from_str("1 seq\n1 M\n", "x.ct").unwrap();
        assert_eq!(bases[0].pair_partner, None);
    }

    #[test]
    fn non_numeric_count_is_a_format_error() {
        let err = positions_from_str("four bases\n1 A 0 2 0 1\n", "bad.ct").unwrap_err();
        match err {
            PlotError::Format { path, line, .. } => {
                assert_eq!(path, "bad.ct");
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn truncated_positions_file_fails_on_missing_line() {
        let err = positions_from_str("3 short\n1 A 0 2 0 1\n", "short.ct").unwrap_err();
        assert!(matches!(err, PlotError::Format { line: 3, .. }));
    }

    #[test]
    fn multi_character_symbol_is_rejected() {
        let err = positions_from_str("1 x\n1 ALA 0 2 0 1\n", "x.ct").unwrap_err();
        assert!(err.to_string().contains("single character"));
    }

    #[test]
    fn correlations_skip_header_and_ignore_extra_fields() {
        let content = "i j corr\n1 3 0.20 extra\n2\t4\t-0.50\n1 2 0.05\n\n\n";
        let records = correlations_from_str(content, "corr.dat").unwrap();
        assert_eq!(
            records,
            vec![
                CorrelationRecord { i: 1, j: 3, value: 0.20 },
                CorrelationRecord { i: 2, j: 4, value: -0.50 },
                CorrelationRecord { i: 1, j: 2, value: 0.05 },
            ]
        );
    }

    #[test]
    fn short_correlation_line_reports_its_line_number() {
        let err = correlations_from_str("header\n1 3 0.2\n2 4\n", "corr.dat").unwrap_err();
        assert!(matches!(err, PlotError::Format { line: 3, .. }));
        assert!(err.to_string().contains("corr.dat"));
    }

    #[test]
    fn blank_line_inside_correlations_is_rejected() {
        let err = correlations_from_str("header\n1 3 0.2\n\n2 4 0.1\n", "corr.dat").unwrap_err();
        assert!(matches!(err, PlotError::Format { line: 3, .. }));
    }

    #[test]
    fn oversized_base_count_fails_on_the_first_missing_line() {
        let err = positions_from_str("100000000000 x\n1 A 0 2 0 1\n", "big.ct").unwrap_err();
        assert!(matches!(err, PlotError::Format { line: 3, .. }));
        let err = positions_from_str("18446744073709551615 x\n", "big.ct").unwrap_err();
        assert!(matches!(err, PlotError::Format { line: 2, .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = parse_correlations(Path::new("/nonexistent/corr.dat")).unwrap_err();
        assert!(matches!(err, PlotError::Io { .. }));
    }
}
