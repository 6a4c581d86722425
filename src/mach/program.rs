use super::PROGRAM_TAIL;
use crate::error;
use crate::lang::token::{Command, T_LABEL, T_NEWLINE};
use crate::lang::{detokenize, Error};

type Result<T> = std::result::Result<T, Error>;

/// Start of the attribution comment appended to every stored line.
pub const ATTRIBUTION: &[u8] = b"'|";

/// ## Tokenized program memory
///
/// Lines are appended until the footer is written by [`finish`]. The
/// footer is an `END` line, two NULs, `0xFF`, then zero padding to an
/// 8 byte boundary where the native blob region begins.
///
/// [`finish`]: ProgramStore::finish

#[derive(Debug, Clone)]
pub struct ProgramStore {
    bytes: Vec<u8>,
    capacity: usize,
    blobs: Vec<u8>,
    footer: Option<usize>,
    blob_base: Option<usize>,
}

impl ProgramStore {
    pub fn new(capacity: usize) -> ProgramStore {
        debug_assert!(capacity > PROGRAM_TAIL);
        ProgramStore {
            bytes: vec![],
            capacity,
            blobs: vec![],
            footer: None,
            blob_base: None,
        }
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.blobs.clear();
        self.footer = None;
        self.blob_base = None;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_finished(&self) -> bool {
        self.blob_base.is_some()
    }

    pub fn append(&mut self, line: &[u8]) -> Result<()> {
        if self.is_finished() {
            return Err(error!(InternalError; "PROGRAM ALREADY FINISHED"));
        }
        if self.bytes.len() + line.len() > self.capacity - PROGRAM_TAIL {
            return Err(error!(ProgramTooLong));
        }
        self.bytes.extend_from_slice(line);
        Ok(())
    }

    /// Write the footer and return the offset of the blob region.
    pub fn finish(&mut self) -> usize {
        if let Some(base) = self.blob_base {
            return base;
        }
        self.footer = Some(self.bytes.len());
        self.bytes
            .extend_from_slice(&[T_NEWLINE, Command::End.byte(), 0]);
        self.bytes.extend_from_slice(&[0, 0, 0xFF]);
        while self.bytes.len() % 8 != 0 {
            self.bytes.push(0);
        }
        debug_assert!(self.bytes.len() <= self.capacity);
        self.blob_base = Some(self.bytes.len());
        self.bytes.len()
    }

    /// Offset of the synthesized `END` line.
    pub fn footer(&self) -> Option<usize> {
        self.footer
    }

    pub fn blob_base(&self) -> Option<usize> {
        self.blob_base
    }

    /// Room left for the blob region.
    pub fn blob_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.bytes.len())
    }

    pub fn blob_region(&self) -> &[u8] {
        &self.blobs
    }

    pub fn set_blobs(&mut self, blobs: Vec<u8>) -> Result<()> {
        if !self.is_finished() {
            return Err(error!(InternalError; "PROGRAM NOT FINISHED"));
        }
        if blobs.len() > self.blob_capacity() {
            return Err(error!(OutOfMemory));
        }
        self.blobs = blobs;
        Ok(())
    }

    /// Program and blob region as one contiguous image.
    pub fn image(&self) -> Vec<u8> {
        let mut image = Vec::with_capacity(self.bytes.len() + self.blobs.len());
        image.extend_from_slice(&self.bytes);
        image.extend_from_slice(&self.blobs);
        image
    }

    pub fn checksum(&self) -> u32 {
        crc::crc32::checksum_ieee(&self.image())
    }

    pub fn lines(&self) -> Lines<'_> {
        Lines {
            bytes: &self.bytes,
            pos: 0,
        }
    }

    pub fn listing(&self) -> Vec<String> {
        self.lines().map(|(_, line)| detokenize(line)).collect()
    }

    /// The file and line that produced the byte at `offset`. A file of
    /// `None` means the top level program.
    pub fn locate(&self, offset: usize) -> Option<(Option<String>, u32)> {
        let (_, line) = self
            .lines()
            .find(|(start, line)| offset >= *start && offset < start + line.len())?;
        parse_attribution(line)
    }
}

fn parse_attribution(line: &[u8]) -> Option<(Option<String>, u32)> {
    let at = line
        .windows(ATTRIBUTION.len())
        .rposition(|w| w == ATTRIBUTION)?;
    let rest = &line[at + ATTRIBUTION.len()..];
    let end = rest.iter().position(|b| *b == 0).unwrap_or_else(|| rest.len());
    let text = String::from_utf8_lossy(&rest[..end]);
    match text.rfind(',') {
        Some(comma) => {
            let number = text[comma + 1..].trim().parse().ok()?;
            Some((Some(text[..comma].to_string()), number))
        }
        None => Some((None, text.trim().parse().ok()?)),
    }
}

/// Offset one past the NUL that ends the line starting at `start`.
pub(crate) fn line_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    if bytes.get(i) == Some(&T_LABEL) {
        let len = bytes.get(i + 1).copied().unwrap_or(0) as usize;
        i += 2 + len;
    }
    loop {
        match bytes[i.min(bytes.len())..].iter().position(|b| *b == 0) {
            Some(nul) => i += nul + 1,
            None => return bytes.len(),
        }
        match bytes.get(i) {
            Some(&b) if b != T_NEWLINE && b != 0 => continue,
            _ => return i,
        }
    }
}

/// Stored lines with their offsets, each ending in its NUL.
pub struct Lines<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for Lines<'a> {
    type Item = (usize, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.bytes.get(self.pos) != Some(&T_NEWLINE) {
            return None;
        }
        let start = self.pos;
        self.pos = line_end(self.bytes, start);
        Some((start, &self.bytes[start..self.pos]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{tokenize, ErrorCode};

    #[test]
    fn test_footer_layout() {
        let mut p = ProgramStore::new(1024);
        let line = tokenize("PRINT 1 '|1").unwrap();
        p.append(&line).unwrap();
        let base = p.finish();
        assert_eq!(base % 8, 0);
        assert_eq!(p.blob_base(), Some(base));
        let footer = &p.bytes()[line.len()..];
        assert_eq!(
            &footer[..6],
            &[T_NEWLINE, Command::End.byte(), 0, 0, 0, 0xFF]
        );
        assert!(footer[6..].iter().all(|b| *b == 0));
        assert_eq!(p.listing(), vec!["PRINT 1 '|1", "END"]);
    }

    #[test]
    fn test_program_too_long() {
        let mut p = ProgramStore::new(PROGRAM_TAIL + 8);
        let line = tokenize("A=1").unwrap();
        p.append(&line).unwrap();
        let e = p.append(&line).unwrap_err();
        assert_eq!(e.code(), ErrorCode::ProgramTooLong);
        assert_eq!(p.len(), line.len());
    }

    #[test]
    fn test_locate() {
        let mut p = ProgramStore::new(1024);
        p.append(&tokenize("LAB: PRINT 1:PRINT 2 '|7").unwrap())
            .unwrap();
        let second = p.len();
        p.append(&tokenize("A=1 '|sub,dir/one.inc,12").unwrap())
            .unwrap();
        p.finish();
        assert_eq!(p.locate(0), Some((None, 7)));
        assert_eq!(p.locate(second - 1), Some((None, 7)));
        assert_eq!(
            p.locate(second + 2),
            Some((Some("sub,dir/one.inc".to_string()), 12))
        );
        let end_line = p.lines().last().map(|(start, _)| start).unwrap();
        assert_eq!(p.locate(end_line), None);
    }
}
