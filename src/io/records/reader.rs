use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use super::{Record, RecordError, delimiter_byte};
use crate::core::params::RecordIoOptions;
use crate::types::{InputFormat, SDF_SEPARATOR};

#[derive(Debug, Clone, PartialEq)]
enum IdColumn {
    None,
    Index(usize),
    Property(String),
}

enum Source<R: BufRead> {
    /// Quoted, single-byte delimited SMILES columns.
    Delimited(csv::Reader<R>),
    /// SDF text, or SMILES columns separated by runs of whitespace.
    Lines(R),
}

/// Pull-based reader yielding one [`Record`] at a time.
///
/// The first `sniff_records` records are read ahead at construction so the
/// extra field names are known before the first record is handed out.
pub struct RecordReader<R: BufRead> {
    source: Source<R>,
    format: InputFormat,
    header: Option<Vec<String>>,
    id_column: IdColumn,
    field_names: Vec<String>,
    pending: VecDeque<Result<Record, RecordError>>,
    line: usize,
    done: bool,
}

impl RecordReader<BufReader<File>> {
    pub fn open(
        path: &Path,
        format: InputFormat,
        options: &RecordIoOptions,
    ) -> Result<Self, RecordError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file), format, options)
    }
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(
        inner: R,
        format: InputFormat,
        options: &RecordIoOptions,
    ) -> Result<Self, RecordError> {
        let source = if format == InputFormat::Smiles && options.delimiter != ' ' {
            Source::Delimited(
                ReaderBuilder::new()
                    .delimiter(delimiter_byte(options.delimiter)?)
                    .has_headers(options.read_header)
                    .flexible(true)
                    .from_reader(inner),
            )
        } else {
            Source::Lines(inner)
        };

        let mut reader = Self {
            source,
            format,
            header: None,
            id_column: IdColumn::None,
            field_names: Vec::new(),
            pending: VecDeque::new(),
            line: 0,
            done: false,
        };

        if format == InputFormat::Smiles && options.read_header {
            reader.header = reader.read_header()?;
        }

        reader.id_column = resolve_id_column(
            options.id_column.as_deref(),
            format,
            reader.header.as_deref(),
        )?;
        reader.sniff(options.sniff_records);
        Ok(reader)
    }

    /// Next record, `Ok(None)` at end of input. A `RecordError::Shape` only
    /// concerns the record just read; calling again continues with the next one.
    pub fn read_record(&mut self) -> Result<Option<Record>, RecordError> {
        if let Some(pending) = self.pending.pop_front() {
            return pending.map(Some);
        }
        match self.read_raw() {
            Some(result) => result.map(Some),
            None => Ok(None),
        }
    }

    /// Names of the properties carried besides structure and identity.
    pub fn extra_field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn format(&self) -> InputFormat {
        self.format
    }

    pub fn close(self) {}

    fn read_header(&mut self) -> Result<Option<Vec<String>>, RecordError> {
        let format = self.format;
        let names: Vec<String> = if let Source::Delimited(reader) = &mut self.source {
            let headers = reader.headers().map_err(|e| csv_error(format, 1, e))?;
            headers.iter().map(|s| s.trim().to_string()).collect()
        } else {
            match self.next_line()? {
                Some(line) => line.split_whitespace().map(str::to_string).collect(),
                None => Vec::new(),
            }
        };
        Ok((!names.is_empty()).then_some(names))
    }

    fn sniff(&mut self, count: usize) {
        for _ in 0..count {
            match self.read_raw() {
                Some(result) => self.pending.push_back(result),
                None => break,
            }
        }

        self.field_names = match (&self.format, &self.header) {
            (InputFormat::Smiles, Some(header)) => (1..header.len())
                .filter(|i| self.id_column != IdColumn::Index(*i))
                .map(|i| header[i].clone())
                .collect(),
            _ => {
                let mut names: Vec<String> = Vec::new();
                for record in self.pending.iter().flatten() {
                    for (name, _) in &record.properties {
                        if !names.contains(name) {
                            names.push(name.clone());
                        }
                    }
                }
                names
            }
        };
    }

    fn next_line(&mut self) -> Result<Option<String>, RecordError> {
        let Source::Lines(inner) = &mut self.source else {
            return Ok(None);
        };
        if self.done {
            return Ok(None);
        }
        let mut buf = String::new();
        if inner.read_line(&mut buf)? == 0 {
            self.done = true;
            return Ok(None);
        }
        self.line += 1;
        Ok(Some(buf))
    }

    fn read_raw(&mut self) -> Option<Result<Record, RecordError>> {
        match self.format {
            InputFormat::Smiles if matches!(self.source, Source::Delimited(_)) => {
                self.read_delimited()
            }
            InputFormat::Smiles => loop {
                match self.next_line() {
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                    Ok(None) => return None,
                    Ok(Some(line)) => {
                        let fields: Vec<&str> = line.split_whitespace().collect();
                        if fields.is_empty() {
                            continue;
                        }
                        return Some(self.parse_smiles(&fields, self.line));
                    }
                }
            },
            InputFormat::Sdf => {
                let start = self.line + 1;
                let mut lines: Vec<String> = Vec::new();
                loop {
                    match self.next_line() {
                        Err(e) => {
                            self.done = true;
                            return Some(Err(e));
                        }
                        Ok(None) => {
                            if lines.iter().all(|l| l.trim().is_empty()) {
                                return None;
                            }
                            break;
                        }
                        Ok(Some(line)) => {
                            if line.trim() == SDF_SEPARATOR {
                                break;
                            }
                            lines.push(trim_eol(&line).to_string());
                        }
                    }
                }
                Some(self.parse_sdf(&lines, start))
            }
        }
    }

    fn read_delimited(&mut self) -> Option<Result<Record, RecordError>> {
        let mut row = StringRecord::new();
        loop {
            let Source::Delimited(reader) = &mut self.source else {
                return None;
            };
            if self.done {
                return None;
            }
            match reader.read_record(&mut row) {
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Ok(true) => {
                    self.line = row
                        .position()
                        .map_or(self.line + 1, |p| p.line() as usize);
                    if row.iter().all(|f| f.trim().is_empty()) {
                        continue;
                    }
                    let fields: Vec<&str> = row.iter().collect();
                    return Some(self.parse_smiles(&fields, self.line));
                }
                Err(e) => {
                    let err = csv_error(self.format, self.line + 1, e);
                    if !err.is_recoverable() {
                        self.done = true;
                    }
                    return Some(Err(err));
                }
            }
        }
    }

    fn parse_smiles(&self, fields: &[&str], line_no: usize) -> Result<Record, RecordError> {
        let structure = fields.first().map_or("", |s| s.trim());
        if structure.is_empty() {
            return Err(RecordError::shape(
                self.format,
                line_no,
                "empty structure field",
            ));
        }
        if let Some(header) = &self.header {
            if fields.len() > header.len() {
                return Err(RecordError::shape(
                    self.format,
                    line_no,
                    format!(
                        "expected at most {} fields, found {}",
                        header.len(),
                        fields.len()
                    ),
                ));
            }
        }

        let id_idx = match self.id_column {
            IdColumn::Index(i) => Some(i),
            _ => None,
        };
        let identity = match id_idx {
            Some(i) => Some(
                fields
                    .get(i)
                    .ok_or_else(|| {
                        RecordError::shape(self.format, line_no, format!("missing id column {}", i))
                    })?
                    .trim()
                    .to_string(),
            ),
            None => None,
        };

        let properties = fields
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(i, _)| Some(*i) != id_idx)
            .map(|(i, value)| (self.column_name(i), value.trim().to_string()))
            .collect();

        Ok(Record {
            structure: structure.to_string(),
            identity,
            properties,
        })
    }

    fn column_name(&self, index: usize) -> String {
        self.header
            .as_ref()
            .and_then(|h| h.get(index).cloned())
            .unwrap_or_else(|| format!("field{}", index))
    }

    fn parse_sdf(&self, lines: &[String], start: usize) -> Result<Record, RecordError> {
        let end = lines
            .iter()
            .position(|l| l.trim_end() == "M  END")
            .ok_or_else(|| RecordError::shape(self.format, start, "missing M  END line"))?;
        if end < 3 {
            return Err(RecordError::shape(
                self.format,
                start,
                "molblock must contain a header block and counts line",
            ));
        }
        let counts = &lines[3];
        let atoms = counts.get(0..3).and_then(|s| s.trim().parse::<usize>().ok());
        let bonds = counts.get(3..6).and_then(|s| s.trim().parse::<usize>().ok());
        if atoms.is_none() || bonds.is_none() {
            return Err(RecordError::shape(
                self.format,
                start + 3,
                "invalid counts line",
            ));
        }

        let mut properties = Vec::new();
        let mut i = end + 1;
        while i < lines.len() {
            if lines[i].starts_with('>') {
                let name = parse_data_header(&lines[i]).ok_or_else(|| {
                    RecordError::shape(self.format, start + i, "malformed data item header")
                })?;
                i += 1;
                let mut values = Vec::new();
                while i < lines.len() && !lines[i].trim().is_empty() {
                    values.push(lines[i].as_str());
                    i += 1;
                }
                properties.push((name, values.join("\n")));
            } else {
                i += 1;
            }
        }

        let title = lines[0].trim();
        let title = (!title.is_empty()).then(|| title.to_string());
        let identity = match &self.id_column {
            IdColumn::Property(name) => properties
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v): &(String, String)| v.clone())
                .or(title),
            _ => title,
        };

        let mut structure = lines[..=end].join("\n");
        structure.push('\n');

        Ok(Record {
            structure,
            identity,
            properties,
        })
    }
}

fn resolve_id_column(
    spec: Option<&str>,
    format: InputFormat,
    header: Option<&[String]>,
) -> Result<IdColumn, RecordError> {
    let Some(spec) = spec else {
        return Ok(IdColumn::None);
    };
    match format {
        InputFormat::Sdf => Ok(IdColumn::Property(spec.to_string())),
        InputFormat::Smiles => {
            if let Ok(index) = spec.parse::<usize>() {
                // column 0 is the structure itself
                return if index == 0 {
                    Err(RecordError::UnknownIdColumn(spec.to_string()))
                } else {
                    Ok(IdColumn::Index(index))
                };
            }
            header
                .and_then(|h| h.iter().position(|name| name == spec))
                .filter(|&i| i > 0)
                .map(IdColumn::Index)
                .ok_or_else(|| RecordError::UnknownIdColumn(spec.to_string()))
        }
    }
}

/// Map a `csv` failure onto a record error. Anything but an I/O failure is
/// local to the row being read.
fn csv_error(format: InputFormat, line: usize, e: csv::Error) -> RecordError {
    if e.is_io_error() {
        return RecordError::Io { source: e.into() };
    }
    let line = e.position().map_or(line, |p| p.line() as usize);
    RecordError::shape(format, line, e.to_string())
}

fn trim_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn parse_data_header(line: &str) -> Option<String> {
    let open = line.find('<')? + 1;
    let close = open + line[open..].find('>')?;
    Some(line[open..close].to_string())
}
