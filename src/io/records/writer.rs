use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use super::{Record, RecordError, delimiter_byte};
use crate::types::{InputFormat, SDF_SEPARATOR};

/// Writes [`Record`]s back out in SMILES or SDF form.
pub struct RecordWriter<W: Write> {
    inner: W,
    format: InputFormat,
    delimiter: char,
    field_names: Option<Vec<String>>,
}

impl RecordWriter<BufWriter<File>> {
    pub fn create(path: &Path, format: InputFormat, delimiter: char) -> Result<Self, RecordError> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), format, delimiter))
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W, format: InputFormat, delimiter: char) -> Self {
        Self {
            inner,
            format,
            delimiter,
            field_names: None,
        }
    }

    /// Emit a field-name header line. SDF carries names per data item, so there
    /// this only fixes the column order used by later writes.
    pub fn write_header(&mut self, field_names: &[String]) -> Result<(), RecordError> {
        if self.format == InputFormat::Smiles {
            let mut row = vec!["smiles", "id"];
            row.extend(field_names.iter().map(String::as_str));
            write_row(&mut self.inner, self.delimiter, &row)?;
        }
        self.field_names = Some(field_names.to_vec());
        Ok(())
    }

    pub fn write(&mut self, record: &Record) -> Result<(), RecordError> {
        let properties: Vec<(&str, &str)> = match &self.field_names {
            Some(names) => names
                .iter()
                .map(|n| (n.as_str(), record.property(n).unwrap_or_default()))
                .collect(),
            None => record
                .properties
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
        };

        match self.format {
            InputFormat::Smiles => {
                let mut row = vec![record.structure.as_str()];
                if self.field_names.is_some() || record.identity.is_some() {
                    row.push(record.identity.as_deref().unwrap_or_default());
                }
                row.extend(properties.iter().map(|(_, value)| *value));
                write_row(&mut self.inner, self.delimiter, &row)?;
            }
            InputFormat::Sdf => {
                let mut lines = record.structure.lines();
                let title = lines.next().unwrap_or_default();
                writeln!(
                    self.inner,
                    "{}",
                    record.identity.as_deref().unwrap_or(title)
                )?;
                for line in lines {
                    writeln!(self.inner, "{}", line)?;
                }
                for (name, value) in properties {
                    writeln!(self.inner, "> <{}>", name)?;
                    writeln!(self.inner, "{}", value)?;
                    writeln!(self.inner)?;
                }
                writeln!(self.inner, "{}", SDF_SEPARATOR)?;
            }
        }
        Ok(())
    }

    pub fn close(mut self) -> Result<(), RecordError> {
        self.inner.flush()?;
        Ok(())
    }
}

/// One SMILES line. Fields holding the delimiter, a quote or a line break are
/// quoted; the space delimiter writes fields as they are.
fn write_row<W: Write>(out: &mut W, delimiter: char, fields: &[&str]) -> Result<(), RecordError> {
    if delimiter == ' ' {
        writeln!(out, "{}", fields.join(" "))?;
        return Ok(());
    }

    let mut buf = Vec::new();
    {
        let mut row = WriterBuilder::new()
            .delimiter(delimiter_byte(delimiter)?)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(&mut buf);
        row.write_record(fields)
            .map_err(|e| RecordError::Io { source: e.into() })?;
        row.flush()?;
    }
    out.write_all(&buf)?;
    Ok(())
}
