//! Target boards and per-block board compatibility.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator};

use crate::error::TypeError;

/// Hardware target the generated sketch is built for.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BoardId {
    /// Arduino Uno (ATmega328P).
    Uno,
    /// Arduino Nano (ATmega328P).
    Nano,
    /// Arduino Mega 2560.
    Mega,
    /// ESP32 DevKit.
    #[strum(serialize = "esp32", serialize = "esp32dev")]
    Esp32,
    /// ESP32-C3 SuperMini.
    #[strum(serialize = "supermini", serialize = "esp32-c3-supermini", serialize = "esp32c3")]
    SuperMini,
}

/// Board family, which decides toolchain and peripheral availability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardFamily {
    Arduino,
    Esp32,
}

/// Static facts about a board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BoardInfo {
    pub id: BoardId,
    pub name: &'static str,
    pub family: BoardFamily,
    /// PlatformIO `board` value.
    pub pio_board: &'static str,
    /// PlatformIO `platform` value.
    pub pio_platform: &'static str,
    /// analogRead range is `0..2^adc_bits`.
    pub adc_bits: u8,
    pub digital_pins: u8,
    /// Caveats worth telling an agent before it picks pins.
    pub notes: &'static str,
}

impl BoardId {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s.trim()).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BoardId::Uno => "uno",
            BoardId::Nano => "nano",
            BoardId::Mega => "mega",
            BoardId::Esp32 => "esp32",
            BoardId::SuperMini => "supermini",
        }
    }

    pub fn family(&self) -> BoardFamily {
        match self {
            BoardId::Uno | BoardId::Nano | BoardId::Mega => BoardFamily::Arduino,
            BoardId::Esp32 | BoardId::SuperMini => BoardFamily::Esp32,
        }
    }

    pub fn info(&self) -> BoardInfo {
        match self {
            BoardId::Uno => BoardInfo {
                id: *self,
                name: "Arduino Uno",
                family: BoardFamily::Arduino,
                pio_board: "uno",
                pio_platform: "atmelavr",
                adc_bits: 10,
                digital_pins: 14,
                notes: "PWM on pins 3, 5, 6, 9, 10, 11. Pins 0/1 are shared with Serial.",
            },
            BoardId::Nano => BoardInfo {
                id: *self,
                name: "Arduino Nano",
                family: BoardFamily::Arduino,
                pio_board: "nanoatmega328",
                pio_platform: "atmelavr",
                adc_bits: 10,
                digital_pins: 14,
                notes: "A6 and A7 are analog input only.",
            },
            BoardId::Mega => BoardInfo {
                id: *self,
                name: "Arduino Mega 2560",
                family: BoardFamily::Arduino,
                pio_board: "megaatmega2560",
                pio_platform: "atmelavr",
                adc_bits: 10,
                digital_pins: 54,
                notes: "Four hardware serial ports (Serial..Serial3).",
            },
            BoardId::Esp32 => BoardInfo {
                id: *self,
                name: "ESP32 DevKit",
                family: BoardFamily::Esp32,
                pio_board: "esp32dev",
                pio_platform: "espressif32",
                adc_bits: 12,
                digital_pins: 34,
                notes: "ADC2 pins are unusable while WiFi is active. GPIO 34-39 are input only.",
            },
            BoardId::SuperMini => BoardInfo {
                id: *self,
                name: "ESP32-C3 SuperMini",
                family: BoardFamily::Esp32,
                pio_board: "esp32-c3-devkitm-1",
                pio_platform: "espressif32",
                adc_bits: 12,
                digital_pins: 13,
                notes: "Onboard LED on GPIO 8 is active low. No capacitive touch pins.",
            },
        }
    }

    /// All boards in declaration order.
    pub fn all() -> impl Iterator<Item = BoardId> {
        Self::iter()
    }
}

/// Deserialization accepts everything [`BoardId::from_str`] does.
impl TryFrom<String> for BoardId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_str(&s).ok_or(TypeError::UnknownBoard(s))
    }
}

impl std::fmt::Display for BoardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Boards a block can be used on.
///
/// Never empty: `Only` is built through [`BoardCompatibility::only`], which
/// rejects an empty set. Serialized as `"all"` or a list of board ids.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCompatibility", into = "RawCompatibility")]
pub enum BoardCompatibility {
    #[default]
    All,
    Only(BTreeSet<BoardId>),
}

impl BoardCompatibility {
    pub fn only(boards: impl IntoIterator<Item = BoardId>) -> Result<Self, TypeError> {
        let set: BTreeSet<BoardId> = boards.into_iter().collect();
        if set.is_empty() {
            return Err(TypeError::EmptyBoardCompatibility);
        }
        Ok(Self::Only(set))
    }

    pub fn supports(&self, board: BoardId) -> bool {
        match self {
            BoardCompatibility::All => true,
            BoardCompatibility::Only(set) => set.contains(&board),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, BoardCompatibility::All)
    }

    /// Supported boards, expanding `All`.
    pub fn boards(&self) -> Vec<BoardId> {
        match self {
            BoardCompatibility::All => BoardId::all().collect(),
            BoardCompatibility::Only(set) => set.iter().copied().collect(),
        }
    }

    /// Compact label: `all` or a comma-separated list.
    pub fn label(&self) -> String {
        match self {
            BoardCompatibility::All => "all".to_string(),
            BoardCompatibility::Only(set) => set
                .iter()
                .map(BoardId::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawCompatibility {
    Keyword(String),
    Boards(Vec<BoardId>),
}

impl TryFrom<RawCompatibility> for BoardCompatibility {
    type Error = TypeError;

    fn try_from(raw: RawCompatibility) -> Result<Self, Self::Error> {
        match raw {
            RawCompatibility::Keyword(k) if k.eq_ignore_ascii_case("all") => Ok(Self::All),
            RawCompatibility::Keyword(k) => match BoardId::from_str(&k) {
                Some(board) => Self::only([board]),
                None => Err(TypeError::UnknownBoard(k)),
            },
            RawCompatibility::Boards(list) => Self::only(list),
        }
    }
}

impl From<BoardCompatibility> for RawCompatibility {
    fn from(compat: BoardCompatibility) -> Self {
        match compat {
            BoardCompatibility::All => RawCompatibility::Keyword("all".to_string()),
            BoardCompatibility::Only(set) => RawCompatibility::Boards(set.into_iter().collect()),
        }
    }
}
