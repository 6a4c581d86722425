//! Byte encoding of stored program lines.

/// Start of a stored line.
pub const T_NEWLINE: u8 = 0x01;
/// Label definition: `T_LABEL, len, name bytes`.
pub const T_LABEL: u8 = 0x03;
/// First command byte.
pub const C_BASETOKEN: u8 = 0x80;
/// First keyword byte.
pub const T_BASETOKEN: u8 = 0xC0;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Command {
    Const,
    Csub,
    Data,
    DefineFont,
    Dim,
    Do,
    Else,
    ElseIf,
    End,
    EndCsub,
    EndDefineFont,
    EndFunction,
    EndIf,
    EndSub,
    Exit,
    For,
    Function,
    Gosub,
    Goto,
    If,
    Inc,
    Input,
    Let,
    Local,
    Loop,
    MmDebug,
    Next,
    On,
    OptionCmd,
    Print,
    Read,
    Rem,
    Restore,
    Return,
    Static,
    Sub,
}

const COMMANDS: [Command; 36] = [
    Command::Const,
    Command::Csub,
    Command::Data,
    Command::DefineFont,
    Command::Dim,
    Command::Do,
    Command::Else,
    Command::ElseIf,
    Command::End,
    Command::EndCsub,
    Command::EndDefineFont,
    Command::EndFunction,
    Command::EndIf,
    Command::EndSub,
    Command::Exit,
    Command::For,
    Command::Function,
    Command::Gosub,
    Command::Goto,
    Command::If,
    Command::Inc,
    Command::Input,
    Command::Let,
    Command::Local,
    Command::Loop,
    Command::MmDebug,
    Command::Next,
    Command::On,
    Command::OptionCmd,
    Command::Print,
    Command::Read,
    Command::Rem,
    Command::Restore,
    Command::Return,
    Command::Static,
    Command::Sub,
];

impl Command {
    pub fn name(&self) -> &'static str {
        use Command::*;
        match self {
            Const => "CONST",
            Csub => "CSUB",
            Data => "DATA",
            DefineFont => "DEFINEFONT",
            Dim => "DIM",
            Do => "DO",
            Else => "ELSE",
            ElseIf => "ELSE IF",
            End => "END",
            EndCsub => "END CSUB",
            EndDefineFont => "END DEFINEFONT",
            EndFunction => "END FUNCTION",
            EndIf => "END IF",
            EndSub => "END SUB",
            Exit => "EXIT",
            For => "FOR",
            Function => "FUNCTION",
            Gosub => "GOSUB",
            Goto => "GOTO",
            If => "IF",
            Inc => "INC",
            Input => "INPUT",
            Let => "LET",
            Local => "LOCAL",
            Loop => "LOOP",
            MmDebug => "MMDEBUG",
            Next => "NEXT",
            On => "ON",
            OptionCmd => "OPTION",
            Print => "PRINT",
            Read => "READ",
            Rem => "REM",
            Restore => "RESTORE",
            Return => "RETURN",
            Static => "STATIC",
            Sub => "SUB",
        }
    }

    pub fn byte(&self) -> u8 {
        let index = COMMANDS.iter().position(|c| c == self).unwrap_or(0);
        C_BASETOKEN + index as u8
    }

    pub fn from_byte(byte: u8) -> Option<Command> {
        if byte < C_BASETOKEN || byte >= T_BASETOKEN {
            return None;
        }
        COMMANDS.get((byte - C_BASETOKEN) as usize).copied()
    }

    /// Longest command name at the start of `s` that ends on a word boundary.
    pub fn match_prefix(s: &[u8]) -> Option<(Command, usize)> {
        COMMANDS
            .iter()
            .filter_map(|c| {
                let len = word_prefix(s, c.name())?;
                Some((*c, len))
            })
            .max_by_key(|(_, len)| *len)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Keyword {
    And,
    As,
    Else,
    Float,
    Integer,
    Mod,
    Not,
    Or,
    Step,
    String,
    Then,
    To,
    Xor,
}

const KEYWORDS: [Keyword; 13] = [
    Keyword::And,
    Keyword::As,
    Keyword::Else,
    Keyword::Float,
    Keyword::Integer,
    Keyword::Mod,
    Keyword::Not,
    Keyword::Or,
    Keyword::Step,
    Keyword::String,
    Keyword::Then,
    Keyword::To,
    Keyword::Xor,
];

impl Keyword {
    pub fn name(&self) -> &'static str {
        use Keyword::*;
        match self {
            And => "AND",
            As => "AS",
            Else => "ELSE",
            Float => "FLOAT",
            Integer => "INTEGER",
            Mod => "MOD",
            Not => "NOT",
            Or => "OR",
            Step => "STEP",
            String => "STRING",
            Then => "THEN",
            To => "TO",
            Xor => "XOR",
        }
    }

    pub fn byte(&self) -> u8 {
        let index = KEYWORDS.iter().position(|k| k == self).unwrap_or(0);
        T_BASETOKEN + index as u8
    }

    pub fn from_byte(byte: u8) -> Option<Keyword> {
        if byte < T_BASETOKEN {
            return None;
        }
        KEYWORDS.get((byte - T_BASETOKEN) as usize).copied()
    }

    pub fn from_word(word: &[u8]) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find(|k| k.name().as_bytes().eq_ignore_ascii_case(word))
            .copied()
    }

    /// A new statement follows this keyword.
    pub fn starts_statement(&self) -> bool {
        matches!(self, Keyword::Then | Keyword::Else)
    }
}

pub fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

pub fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// Characters that end a variable name and declare its type.
pub fn is_type_suffix(b: u8) -> bool {
    b == b'$' || b == b'%' || b == b'!'
}

/// Length of `word` at the start of `s` when followed by a word boundary.
pub fn word_prefix(s: &[u8], word: &str) -> Option<usize> {
    let len = word.len();
    if s.len() < len || !s[..len].eq_ignore_ascii_case(word.as_bytes()) {
        return None;
    }
    match s.get(len) {
        Some(b) if is_name_char(*b) || is_type_suffix(*b) => None,
        _ => Some(len),
    }
}
