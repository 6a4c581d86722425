use super::program::line_end;
use super::{ProgramStore, FONT_TABLE_SIZE};
use crate::error;
use crate::lang::token::{
    is_name_char, is_name_start, is_type_suffix, Command, T_LABEL, T_NEWLINE,
};
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// Ends the blob table.
pub const BLOB_SENTINEL: u64 = u64::max_value();

/// One packed `CSUB` or `DEFINEFONT`.
///
/// `owner` is the program offset of the `CSUB` token or the font slot.
/// For a `CSUB` the first payload word is the entry offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub owner: u64,
    pub words: Vec<u32>,
}

/// Pack every `CSUB` and `DEFINEFONT` of a finished program into its
/// blob region. `top_name` names the top level file in errors.
pub fn pack(program: &mut ProgramStore, top_name: &str) -> Result<()> {
    let limit = program.blob_capacity();
    let blobs = {
        let mut packer = Packer {
            program: &*program,
            top_name,
            out: vec![],
            limit,
        };
        packer.scan()?;
        packer.out
    };
    program.set_blobs(blobs)
}

/// Decode a blob region back into its entries.
pub fn read_blobs(region: &[u8]) -> Result<Vec<Blob>> {
    let mut blobs = vec![];
    let mut pos = 0;
    loop {
        let owner = read_u64(region, pos)?;
        if owner == BLOB_SENTINEL {
            return Ok(blobs);
        }
        let len = read_u32(region, pos + 8)? as usize;
        let mut words = Vec::with_capacity(len / 4);
        for i in 0..len / 4 {
            words.push(read_u32(region, pos + 12 + i * 4)?);
        }
        blobs.push(Blob { owner, words });
        pos = align8(pos + 12 + len);
    }
}

fn read_u64(region: &[u8], pos: usize) -> Result<u64> {
    let mut b = [0; 8];
    match region.get(pos..pos + 8) {
        Some(s) => b.copy_from_slice(s),
        None => return Err(error!(InternalError; "TRUNCATED BLOB")),
    }
    Ok(u64::from_le_bytes(b))
}

fn read_u32(region: &[u8], pos: usize) -> Result<u32> {
    let mut b = [0; 4];
    match region.get(pos..pos + 4) {
        Some(s) => b.copy_from_slice(s),
        None => return Err(error!(InternalError; "TRUNCATED BLOB")),
    }
    Ok(u32::from_le_bytes(b))
}

fn align8(n: usize) -> usize {
    (n + 7) & !7
}

struct Packer<'a> {
    program: &'a ProgramStore,
    top_name: &'a str,
    out: Vec<u8>,
    limit: usize,
}

impl<'a> Packer<'a> {
    fn bytes(&self) -> &'a [u8] {
        self.program.bytes()
    }

    fn located(&self, error: Error, offset: usize) -> Error {
        match self.program.locate(offset) {
            Some((Some(file), line)) => error.in_file(&file, line),
            Some((None, line)) => error.in_file(self.top_name, line),
            None => error,
        }
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        if self.out.len() + bytes.len() > self.limit {
            return Err(error!(OutOfMemory));
        }
        self.out.extend_from_slice(bytes);
        Ok(())
    }

    fn scan(&mut self) -> Result<()> {
        let bytes = self.bytes();
        let mut pos = 0;
        'lines: while bytes.get(pos) == Some(&T_NEWLINE) {
            let end = line_end(bytes, pos);
            let mut stmt = first_statement(bytes, pos);
            while stmt < end {
                match Command::from_byte(bytes[stmt]) {
                    Some(command @ Command::Csub) | Some(command @ Command::DefineFont) => {
                        pos = match self.block(command, pos, stmt) {
                            Ok(next) => next,
                            Err(e) => return Err(self.located(e, pos)),
                        };
                        continue 'lines;
                    }
                    _ => stmt = statement_end(bytes, stmt) + 1,
                }
            }
            pos = end;
        }
        self.emit(&BLOB_SENTINEL.to_le_bytes())
    }

    /// Pack one block declared at `decl` and return the offset of the
    /// line after its end command.
    fn block(&mut self, command: Command, line: usize, decl: usize) -> Result<usize> {
        let bytes = self.bytes();
        let decl_end = statement_end(bytes, decl);
        let mut p = decl + 1;
        while bytes.get(p) == Some(&b' ') {
            p += 1;
        }
        let mut words: Vec<u32> = vec![];
        let (owner, end_command) = match command {
            Command::Csub => {
                if !bytes.get(p).map_or(false, |b| is_name_start(*b)) {
                    return Err(error!(InvalidFunctionName));
                }
                while p < decl_end && (is_name_char(bytes[p]) || is_type_suffix(bytes[p])) {
                    p += 1;
                }
                if let Some(entry) = inline_entry(&bytes[p..decl_end]) {
                    words.push(entry);
                }
                (decl as u64, Command::EndCsub)
            }
            _ => (font_slot(&bytes[p..decl_end])?, Command::EndDefineFont),
        };
        let footer = self.program.footer().unwrap_or_else(|| bytes.len());
        let mut pos = line_end(bytes, line);
        loop {
            if pos >= footer || bytes.get(pos) != Some(&T_NEWLINE) {
                return Err(error!(MissingEndCommand; end_command.name()));
            }
            let end = line_end(bytes, pos);
            let first = first_statement(bytes, pos);
            if Command::from_byte(bytes[first]) == Some(end_command) {
                pos = end;
                break;
            }
            match hex_words(&bytes[first..end]) {
                Ok(mut w) => words.append(&mut w),
                Err(e) => return Err(self.located(e, pos)),
            }
            pos = end;
        }
        self.emit(&owner.to_le_bytes())?;
        self.emit(&(words.len() as u32 * 4).to_le_bytes())?;
        for word in words {
            self.emit(&word.to_le_bytes())?;
        }
        while self.out.len() % 8 != 0 {
            self.emit(&[0])?;
        }
        Ok(pos)
    }
}

fn first_statement(bytes: &[u8], line: usize) -> usize {
    let stmt = line + 1;
    if bytes.get(stmt) == Some(&T_LABEL) {
        stmt + 2 + bytes.get(stmt + 1).copied().unwrap_or(0) as usize
    } else {
        stmt
    }
}

fn statement_end(bytes: &[u8], stmt: usize) -> usize {
    bytes[stmt..]
        .iter()
        .position(|b| *b == 0)
        .map_or(bytes.len(), |nul| stmt + nul)
}

fn is_hex_word(token: &[u8]) -> bool {
    token.len() == 8 && token.iter().all(|b| b.is_ascii_hexdigit())
}

fn parse_hex(token: &[u8]) -> Option<u32> {
    if !is_hex_word(token) {
        return None;
    }
    u32::from_str_radix(std::str::from_utf8(token).ok()?, 16).ok()
}

/// Text before the attribution comment, NULs read as spaces.
fn uncommented(s: &[u8]) -> &[u8] {
    let end = s.iter().position(|b| *b == b'\'').unwrap_or_else(|| s.len());
    &s[..end]
}

// A declaration may end with the entry offset, `CSUB NAME 00000010`.
fn inline_entry(s: &[u8]) -> Option<u32> {
    uncommented(s)
        .split(|b| *b == b' ' || *b == b',' || *b == b'(' || *b == b')' || *b >= 0x80)
        .filter(|token| !token.is_empty())
        .last()
        .and_then(parse_hex)
}

fn hex_words(s: &[u8]) -> Result<Vec<u32>> {
    uncommented(s)
        .split(|b| *b == b' ' || *b == 0)
        .filter(|token| !token.is_empty())
        .map(|token| {
            parse_hex(token).ok_or_else(|| {
                error!(InvalidHexWord; &String::from_utf8_lossy(token).into_owned())
            })
        })
        .collect()
}

fn font_slot(s: &[u8]) -> Result<u64> {
    let s = uncommented(s);
    let s = match s.first() {
        Some(b'#') => &s[1..],
        _ => s,
    };
    let digits: Vec<u8> = s.iter().copied().take_while(u8::is_ascii_digit).collect();
    let number: usize = std::str::from_utf8(&digits)
        .ok()
        .and_then(|d| d.parse().ok())
        .unwrap_or(0);
    if number < 1 || number > FONT_TABLE_SIZE {
        return Err(error!(SyntaxError; "INVALID FONT NUMBER"));
    }
    Ok(number as u64 - 1)
}
