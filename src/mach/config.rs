use super::PROGRAM_SIZE;

/// Settings that shape how a program is loaded.
#[derive(Debug, Clone)]
pub struct Config {
    /// Columns per tab stop when expanding source tabs.
    pub tab_width: usize,
    /// Initial state of the `#MMDEBUG` gate.
    pub debug: bool,
    /// Lowest array index, `OPTION BASE 0` or `OPTION BASE 1`.
    pub base: i16,
    pub program_size: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            tab_width: 4,
            debug: false,
            base: 0,
            program_size: PROGRAM_SIZE,
        }
    }
}
