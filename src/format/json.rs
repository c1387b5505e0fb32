//! JSON format implementation.

use std::io::Write;

use super::{DecodeContext, Format, FormatError, FormatKind};
use crate::config::ProcessingMode;
use crate::tree::TreeValue;

/// JSON documents and JSON Lines using serde_json.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn kind(&self) -> FormatKind {
        FormatKind::Json
    }

    fn decode(&self, bytes: &[u8], ctx: &DecodeContext<'_>) -> Result<TreeValue, FormatError> {
        let text = ctx.text(bytes)?;
        serde_json::from_str(text).map_err(|e| FormatError::Serde(Box::new(e)))
    }

    fn encode(
        &self,
        value: &TreeValue,
        _mode: ProcessingMode,
        writer: &mut dyn Write,
    ) -> Result<(), FormatError> {
        serde_json::to_writer_pretty(&mut *writer, value)
            .map_err(|e| FormatError::Serde(Box::new(e)))?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn encode_lines(&self, records: &[TreeValue], writer: &mut dyn Write) -> Result<(), FormatError> {
        for record in records {
            serde_json::to_writer(&mut *writer, record)
                .map_err(|e| FormatError::Serde(Box::new(e)))?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}
