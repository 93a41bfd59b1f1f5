
/// Postgres data transmission format.
///
/// For specific information, see its variant documentation.
///
/// <https://www.postgresql.org/docs/current/protocol-overview.html#PROTOCOL-FORMAT-CODES>
///
/// [t]: Format::Text
/// [b]: Format::Binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Text has format code zero.
    ///
    /// In the [`Text`][t] transmitted representation, there is no trailing null character.
    /// (The [`Text`][t] format does not allow embedded nulls, by the way.)
    ///
    /// [t]: Format::Text
    #[default]
    Text,
    /// Binary has format code one.
    ///
    /// [`Binary`][b] representations for integers use network byte order (most significant byte first).
    /// For other data types consult the documentation or source code to learn about the binary representation.
    ///
    /// [b]: Format::Binary
    Binary,
}

impl Format {
    /// Return format code for current format.
    pub const fn format_code(&self) -> u16 {
        match self {
            Format::Text => 0,
            Format::Binary => 1,
        }
    }

    /// Returns format from the `RowDescription` format code.
    pub const fn from_code(code: u16) -> Option<Format> {
        match code {
            0 => Some(Format::Text),
            1 => Some(Format::Binary),
            _ => None,
        }
    }
}
