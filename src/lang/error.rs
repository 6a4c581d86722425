#[derive(Clone, PartialEq)]
pub struct Error {
    code: ErrorCode,
    location: Option<(String, u32)>,
    message: String,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, $file:expr, $line:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_file($file, $line)
    };
    ($err:ident, $file:expr, $line:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_file($file, $line)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code,
            location: None,
            message: String::new(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn location(&self) -> Option<(&str, u32)> {
        self.location
            .as_ref()
            .map(|(file, line)| (file.as_str(), *line))
    }

    pub fn is_located(&self) -> bool {
        self.location.is_some()
    }

    /// Attach the source position. An error that already knows where it
    /// happened keeps its original position.
    pub fn in_file(self, file: &str, line: u32) -> Error {
        if self.location.is_some() {
            return self;
        }
        Error {
            location: Some((file.to_string(), line)),
            ..self
        }
    }

    pub fn message(self, message: &str) -> Error {
        debug_assert_eq!(self.message.len(), 0);
        Error {
            message: message.to_string(),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    SyntaxError = 2,
    OutOfMemory = 7,
    DimensionError = 9,
    StringTooLong = 15,
    LineTooLong = 23,
    InternalError = 51,
    FileNotFound = 53,
    TooManyFiles = 67,
    ProgramTooLong = 70,
    UnterminatedComment = 71,
    NoCommentToTerminate = 72,
    TooManyDefines = 73,
    InvalidFunctionName = 74,
    InvalidHexWord = 75,
    MissingEndCommand = 76,
    CapacityExceeded = 77,
    HashIndexFull = 78,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        use ErrorCode::*;
        match self {
            SyntaxError => "SYNTAX ERROR",
            OutOfMemory => "OUT OF MEMORY",
            DimensionError => "DIMENSIONS",
            StringTooLong => "STRING TOO LONG",
            LineTooLong => "LINE TOO LONG",
            InternalError => "INTERNAL ERROR",
            FileNotFound => "FILE NOT FOUND",
            TooManyFiles => "TOO MANY FILES",
            ProgramTooLong => "PROGRAM TOO LONG",
            UnterminatedComment => "UNTERMINATED COMMENT",
            NoCommentToTerminate => "NO COMMENT TO TERMINATE",
            TooManyDefines => "TOO MANY DEFINES",
            InvalidFunctionName => "INVALID FUNCTION NAME",
            InvalidHexWord => "INVALID HEX WORD",
            MissingEndCommand => "MISSING END COMMAND",
            CapacityExceeded => "TOO MANY VARIABLES",
            HashIndexFull => "VARIABLE INDEX FULL",
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.code.as_str())?;
        if let Some((file, line)) = &self.location {
            write!(f, " IN {} LINE {}", file, line)?;
        }
        if !self.message.is_empty() {
            write!(f, "; {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}
