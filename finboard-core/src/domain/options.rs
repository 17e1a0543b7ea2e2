//! Import options selectable by the user: separator, date pattern, quoting

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::Error;

/// Column separator of a delimited file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Separator {
    #[default]
    #[serde(rename = ";")]
    Semicolon,
    #[serde(rename = ",")]
    Comma,
    #[serde(rename = "|")]
    Pipe,
}

impl Separator {
    pub const ALL: [Separator; 3] = [Separator::Semicolon, Separator::Comma, Separator::Pipe];

    pub fn as_char(&self) -> char {
        match self {
            Separator::Semicolon => ';',
            Separator::Comma => ',',
            Separator::Pipe => '|',
        }
    }

    pub fn as_byte(&self) -> u8 {
        self.as_char() as u8
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Separator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ";" | "semicolon" => Ok(Separator::Semicolon),
            "," | "comma" => Ok(Separator::Comma),
            "|" | "pipe" => Ok(Separator::Pipe),
            other => Err(Error::validation(format!(
                "Unsupported separator '{}' (expected ';', ',' or '|')",
                other
            ))),
        }
    }
}

/// Date pattern used to read the transaction date column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "yyyy-MM-dd")]
    YearMonthDayDash,
    #[serde(rename = "dd-MM-yyyy")]
    DayMonthYearDash,
    #[serde(rename = "MM/dd/yyyy")]
    MonthDayYearSlash,
    #[serde(rename = "dd/MM/yyyy")]
    DayMonthYearSlash,
    #[serde(rename = "yyyy/MM/dd")]
    YearMonthDaySlash,
    #[serde(rename = "dd.MM.yyyy")]
    DayMonthYearDot,
    #[serde(rename = "yyyy.MM.dd")]
    YearMonthDayDot,
}

impl DateFormat {
    pub const ALL: [DateFormat; 7] = [
        DateFormat::YearMonthDayDash,
        DateFormat::DayMonthYearDash,
        DateFormat::MonthDayYearSlash,
        DateFormat::DayMonthYearSlash,
        DateFormat::YearMonthDaySlash,
        DateFormat::DayMonthYearDot,
        DateFormat::YearMonthDayDot,
    ];

    /// The pattern as shown to users
    pub fn pattern(&self) -> &'static str {
        match self {
            DateFormat::YearMonthDayDash => "yyyy-MM-dd",
            DateFormat::DayMonthYearDash => "dd-MM-yyyy",
            DateFormat::MonthDayYearSlash => "MM/dd/yyyy",
            DateFormat::DayMonthYearSlash => "dd/MM/yyyy",
            DateFormat::YearMonthDaySlash => "yyyy/MM/dd",
            DateFormat::DayMonthYearDot => "dd.MM.yyyy",
            DateFormat::YearMonthDayDot => "yyyy.MM.dd",
        }
    }

    /// Equivalent chrono format string
    pub fn chrono_format(&self) -> &'static str {
        match self {
            DateFormat::YearMonthDayDash => "%Y-%m-%d",
            DateFormat::DayMonthYearDash => "%d-%m-%Y",
            DateFormat::MonthDayYearSlash => "%m/%d/%Y",
            DateFormat::DayMonthYearSlash => "%d/%m/%Y",
            DateFormat::YearMonthDaySlash => "%Y/%m/%d",
            DateFormat::DayMonthYearDot => "%d.%m.%Y",
            DateFormat::YearMonthDayDot => "%Y.%m.%d",
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}

impl FromStr for DateFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateFormat::ALL
            .iter()
            .find(|f| f.pattern() == s)
            .copied()
            .ok_or_else(|| {
                let supported: Vec<&str> = DateFormat::ALL.iter().map(|f| f.pattern()).collect();
                Error::validation(format!(
                    "Unsupported date format '{}' (expected one of: {})",
                    s,
                    supported.join(", ")
                ))
            })
    }
}

/// How separators inside values are treated
///
/// `None` splits every line on the separator with no escaping. `Rfc4180`
/// honours double-quoted fields, so a quoted value may contain the separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteMode {
    #[default]
    None,
    Rfc4180,
}
