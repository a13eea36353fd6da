// SPDX-License-Identifier: MIT

//! Structure description registry.
//!
//! The registry holds the per-field interpretation metadata of a binary
//! layout (byte size, type keyword, endianness) together with the logging
//! level of the tool. It is loaded once from an INI file and never changed
//! afterwards:
//!
//! ```ini
//! [data_type_size]
//! uint32 = 4
//!
//! [data_type_keyword]
//! uint32 = I
//!
//! [endiannes]
//! little-endian = 1
//!
//! [logging]
//! level = DEV ; or PROD
//! ```
use crate::error::{DumpError, Result};
use ini::{Ini, ParseOption};
use log::LevelFilter;
use serde::Serialize;
use std::{collections::BTreeMap, fmt, path::Path, str::FromStr};

/// Section mapping field names to their size in bytes
pub const DATA_TYPE_SIZE: &str = "data_type_size";
/// Section mapping field names to their type keyword
pub const DATA_TYPE_KEYWORD: &str = "data_type_keyword";
/// Section holding the byte order of the described data
pub const ENDIANNESS: &str = "endiannes";
/// Key within the byte order section
pub const LITTLE_ENDIAN: &str = "little-endian";
/// Section holding the logging configuration
pub const LOGGING: &str = "logging";
/// Key within the logging section
pub const LOGGING_LEVEL: &str = "level";

/// Byte order of the described data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    Little,
    Big,
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Little => write!(f, "little-endian"),
            Self::Big => write!(f, "big-endian"),
        }
    }
}

/// Logging profile of the tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum LogLevel {
    /// Log everything down to debug messages.
    #[serde(rename = "DEV")]
    Dev,
    /// Log errors only.
    #[serde(rename = "PROD")]
    Prod,
}

impl LogLevel {
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            Self::Dev => LevelFilter::Debug,
            Self::Prod => LevelFilter::Error,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(level: &str) -> std::result::Result<Self, Self::Err> {
        match level {
            "DEV" => Ok(Self::Dev),
            "PROD" => Ok(Self::Prod),
            _ => Err(()),
        }
    }
}

/// Interpretation metadata of a single structure field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    /// Size of the field in bytes
    pub size: usize,
    /// Type keyword of the field
    pub keyword: String,
    pub endianness: Endianness,
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {} bytes, keyword '{}', {}",
            self.name, self.size, self.keyword, self.endianness
        )
    }
}

type Section = BTreeMap<String, String>;

/// Read-only lookup table of the structure description.
///
/// Section names are case sensitive, keys are stored in lower case.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigRegistry {
    sections: BTreeMap<String, Section>,
}

impl ConfigRegistry {
    /// Loads the registry from the given INI file.
    ///
    /// # Error
    ///
    /// Returns `ConfigMissing` if the file does not exist and
    /// `InvalidConfig` if it cannot be parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(DumpError::ConfigMissing(path.to_path_buf()));
        }

        let ini = Ini::load_from_file_opt(path, raw_values()).map_err(|err| {
            DumpError::InvalidConfig {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
        })?;

        let registry = Self::from_ini(&ini);
        log::info!(
            "Loaded {} config sections from {}.",
            registry.sections.len(),
            path.display()
        );

        Ok(registry)
    }

    fn from_ini(ini: &Ini) -> Self {
        let mut sections = BTreeMap::new();

        for (name, properties) in ini.iter() {
            // Keys in front of the first section header are ignored.
            let name = match name {
                Some(name) => name,
                None => continue,
            };

            let section: &mut Section = sections.entry(name.to_string()).or_default();
            for (key, value) in properties.iter() {
                section.insert(key.to_lowercase(), strip_inline_comment(value).to_string());
            }
        }

        Self { sections }
    }

    /// Names of all sections.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn section(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.sections.get(name)
    }

    /// Raw value of a key, if present.
    pub fn value(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|values| values.get(&key.to_lowercase()))
            .map(String::as_str)
    }

    fn require(&self, section: &str, key: &str) -> Result<&str> {
        self.value(section, key)
            .ok_or_else(|| DumpError::MissingConfigValue {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    /// Size in bytes of the given field.
    pub fn data_type_size(&self, field: &str) -> Result<usize> {
        let value = self.require(DATA_TYPE_SIZE, field)?;

        value
            .parse::<usize>()
            .map_err(|_| invalid_value(DATA_TYPE_SIZE, field, value))
    }

    /// Type keyword of the given field.
    pub fn data_type_keyword(&self, field: &str) -> Result<&str> {
        self.require(DATA_TYPE_KEYWORD, field)
    }

    pub fn little_endian(&self) -> Result<bool> {
        let value = self.require(ENDIANNESS, LITTLE_ENDIAN)?;

        parse_bool(value).ok_or_else(|| invalid_value(ENDIANNESS, LITTLE_ENDIAN, value))
    }

    pub fn endianness(&self) -> Result<Endianness> {
        Ok(if self.little_endian()? {
            Endianness::Little
        } else {
            Endianness::Big
        })
    }

    /// Logging profile, `DEV` or `PROD`.
    pub fn log_level(&self) -> Result<LogLevel> {
        let value = self.require(LOGGING, LOGGING_LEVEL)?;

        value
            .parse::<LogLevel>()
            .map_err(|_| invalid_value(LOGGING, LOGGING_LEVEL, value))
    }

    /// Resolves size, keyword and byte order of a single field.
    pub fn field(&self, name: &str) -> Result<FieldSpec> {
        Ok(FieldSpec {
            name: name.to_string(),
            size: self.data_type_size(name)?,
            keyword: self.data_type_keyword(name)?.to_string(),
            endianness: self.endianness()?,
        })
    }
}

impl FromStr for ConfigRegistry {
    type Err = DumpError;

    /// Parses a registry from INI text.
    fn from_str(text: &str) -> Result<Self> {
        let ini = Ini::load_from_str_opt(text, raw_values()).map_err(|err| {
            DumpError::InvalidConfig {
                path: "<memory>".into(),
                message: err.to_string(),
            }
        })?;

        Ok(Self::from_ini(&ini))
    }
}

/// Values are taken verbatim: backslashes and quotes have no special meaning.
fn raw_values() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    }
}

fn invalid_value(section: &str, key: &str, value: &str) -> DumpError {
    DumpError::InvalidConfigValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Cuts off a trailing `; comment` from a value.
fn strip_inline_comment(value: &str) -> &str {
    let bytes = value.as_bytes();
    let end = (1..bytes.len())
        .find(|&i| bytes[i] == b';' && bytes[i - 1].is_ascii_whitespace())
        .unwrap_or(bytes.len());

    value[..end].trim()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}
