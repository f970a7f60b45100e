//! CSV drawing files (std only).
//!
//! One `x,y,e` record per line. No header is required; a first line whose
//! `x` field is not a number is taken as a header and skipped. Lines
//! starting with `#` and blank lines are ignored, fields are trimmed and
//! columns past the third are ignored. `e` may be a number or
//! `true`/`false`.

use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::{truncated, DrawingError, Error, Result};

use super::{Command, Drawing};

/// Load a drawing from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, a record is malformed or
/// a coordinate is not finite.
pub fn load_drawing<P: AsRef<Path>>(path: P) -> Result<Drawing> {
    let file = File::open(path.as_ref()).map_err(|e| {
        Error::Drawing(DrawingError::Io(truncated(&e.to_string())))
    })?;
    parse_drawing(file)
}

/// Parse a drawing from any CSV reader.
pub fn parse_drawing<R: io::Read>(reader: R) -> Result<Drawing> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut commands = Vec::new();
    let mut record = csv::StringRecord::new();
    let mut first = true;

    loop {
        let more = csv.read_record(&mut record).map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            parse_error(line, &e.to_string())
        })?;
        if !more {
            break;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.iter().all(str::is_empty) {
            continue;
        }

        if first {
            first = false;
            if record.get(0).is_some_and(|x| x.parse::<f32>().is_err()) {
                debug!("Skipping header on line {}", line);
                continue;
            }
        }

        commands.push(parse_record(&record, line)?);
    }

    info!("Loaded drawing with {} commands", commands.len());
    Ok(Drawing::new(commands)?)
}

fn parse_record(record: &csv::StringRecord, line: u64) -> Result<Command> {
    if record.len() < 3 {
        return Err(parse_error(line, "expected x,y,e"));
    }

    let x = parse_coordinate(&record[0], line, "x")?;
    let y = parse_coordinate(&record[1], line, "y")?;
    let extrude = parse_extrude(&record[2], line)?;

    Ok(Command::new(x, y, extrude))
}

fn parse_coordinate(field: &str, line: u64, name: &str) -> Result<f32> {
    let value: f32 = field.parse().map_err(|_| {
        let mut reason: heapless::String<64> = heapless::String::new();
        let _ = reason.push_str("invalid ");
        let _ = reason.push_str(name);
        let _ = reason.push_str(" value");
        Error::Drawing(DrawingError::Parse { line, reason })
    })?;
    Ok(value)
}

fn parse_extrude(field: &str, line: u64) -> Result<f32> {
    if field.eq_ignore_ascii_case("true") {
        return Ok(1.0);
    }
    if field.eq_ignore_ascii_case("false") {
        return Ok(0.0);
    }
    field
        .parse()
        .map_err(|_| parse_error(line, "invalid e value"))
}

fn parse_error(line: u64, msg: &str) -> Error {
    Error::Drawing(DrawingError::Parse {
        line,
        reason: truncated(msg),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Drawing> {
        parse_drawing(text.as_bytes())
    }

    #[test]
    fn test_plain_records() {
        let drawing = parse("0,0,0\n10,0,1\n10,10,0\n0,0,0.7\n").unwrap();
        assert_eq!(drawing.len(), 4);
        assert_eq!(drawing.commands()[1], Command::new(10.0, 0.0, 1.0));
        assert_eq!(drawing.commands()[3].extrude, 0.7);
    }

    #[test]
    fn test_scientific_notation() {
        // As written by numpy's savetxt
        let drawing = parse("1.000000000000000000e+01,2.500000000000000000e+00,1.000000000000000000e+00\n")
            .unwrap();
        assert_eq!(drawing.commands()[0], Command::new(10.0, 2.5, 1.0));
    }

    #[test]
    fn test_header_comments_and_booleans() {
        let text = "x, y, e\n# outline\n\n 1.5 , 2 , true, ignored\n3,4,False\n";
        let drawing = parse(text).unwrap();
        assert_eq!(
            drawing.commands(),
            &[Command::new(1.5, 2.0, 1.0), Command::new(3.0, 4.0, 0.0)]
        );
    }

    #[test]
    fn test_header_only_skipped_on_first_line() {
        let result = parse("1,2,0\nx,y,e\n");
        assert!(matches!(
            result,
            Err(Error::Drawing(DrawingError::Parse { line: 2, .. }))
        ));
    }

    #[test]
    fn test_short_record() {
        let result = parse("1,2\n");
        assert!(matches!(
            result,
            Err(Error::Drawing(DrawingError::Parse { line: 1, .. }))
        ));
    }

    #[test]
    fn test_non_finite_coordinate() {
        let result = parse("0,0,0\nNaN,1,1\n");
        assert!(matches!(
            result,
            Err(Error::Drawing(DrawingError::NonFiniteCoordinate { index: 1 }))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = load_drawing("/nonexistent/drawing.csv");
        assert!(matches!(result, Err(Error::Drawing(DrawingError::Io(_)))));
    }
}
