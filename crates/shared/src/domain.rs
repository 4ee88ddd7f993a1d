use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownKey {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! keyed_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $key:literal),+ $(,)? }) => {
        impl $name {
            pub fn key(self) -> &'static str {
                match self {
                    $(Self::$variant => $key,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }

        impl FromStr for $name {
            type Err = UnknownKey;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim() {
                    $($key => Ok(Self::$variant),)+
                    other => Err(UnknownKey {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        /// Unknown keys decode as the default variant.
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let key = String::deserialize(deserializer)?;
                Ok(key.parse().unwrap_or_default())
            }
        }
    };
}

/// Content-generation intent. Unknown keys on the wire fall back to `Referat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Referat,
    Conspect,
    Doklad,
    Question,
    Retell,
    Essay,
}

keyed_enum!(Mode, "mode", {
    Referat => "referat",
    Conspect => "conspect",
    Doklad => "doklad",
    Question => "question",
    Retell => "retell",
    Essay => "essay",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeDescriptor {
    pub mode: Mode,
    pub menu_label: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub input_label: &'static str,
    pub show_author: bool,
}

const MODE_DESCRIPTORS: [ModeDescriptor; 6] = [
    ModeDescriptor {
        mode: Mode::Referat,
        menu_label: "📄 Реферат",
        title: "📄 Генератор рефератов",
        subtitle: "Данные из Википедии → AI создаёт реферат",
        input_label: "📝 Тема реферата:",
        show_author: true,
    },
    ModeDescriptor {
        mode: Mode::Conspect,
        menu_label: "📝 Конспект",
        title: "📝 Генератор конспектов",
        subtitle: "Структурированный конспект на основе Википедии",
        input_label: "📝 Тема конспекта:",
        show_author: false,
    },
    ModeDescriptor {
        mode: Mode::Doklad,
        menu_label: "📊 Доклад",
        title: "📊 Генератор докладов",
        subtitle: "Текст для выступления с фактами из Википедии",
        input_label: "📝 Тема доклада:",
        show_author: true,
    },
    ModeDescriptor {
        mode: Mode::Question,
        menu_label: "❓ Вопрос",
        title: "❓ Ответ на вопрос",
        subtitle: "Развёрнутый ответ на основе Википедии",
        input_label: "📝 Ваш вопрос:",
        show_author: false,
    },
    ModeDescriptor {
        mode: Mode::Retell,
        menu_label: "📖 Пересказ",
        title: "📖 Пересказ",
        subtitle: "Пересказ материала из Википедии",
        input_label: "📝 Тема для пересказа:",
        show_author: false,
    },
    ModeDescriptor {
        mode: Mode::Essay,
        menu_label: "✍️ Эссе",
        title: "✍️ Генератор эссе",
        subtitle: "Эссе с опорой на факты из Википедии",
        input_label: "📝 Тема эссе:",
        show_author: true,
    },
];

impl Mode {
    /// Menu order.
    pub const ALL: [Mode; 6] = [
        Mode::Referat,
        Mode::Conspect,
        Mode::Doklad,
        Mode::Question,
        Mode::Retell,
        Mode::Essay,
    ];

    pub fn descriptor(self) -> &'static ModeDescriptor {
        let index = Self::ALL
            .iter()
            .position(|mode| *mode == self)
            .unwrap_or_default();
        &MODE_DESCRIPTORS[index]
    }

    /// Modes whose output may be prefixed with a title page.
    pub fn supports_title_page(self) -> bool {
        matches!(self, Mode::Referat | Mode::Doklad | Mode::Essay)
    }

    /// Heading used for the work type on the title page.
    pub fn work_type(self) -> &'static str {
        match self {
            Mode::Doklad => "ДОКЛАД",
            Mode::Essay => "ЭССЕ",
            _ => "РЕФЕРАТ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Volume {
    Short,
    #[default]
    Medium,
    Long,
    VeryLong,
}

keyed_enum!(Volume, "volume", {
    Short => "short",
    Medium => "medium",
    Long => "long",
    VeryLong => "very_long",
});

impl Volume {
    pub const ALL: [Volume; 4] = [Volume::Short, Volume::Medium, Volume::Long, Volume::VeryLong];

    pub fn label(self) -> &'static str {
        match self {
            Volume::Short => "Кратко (1-2 стр.)",
            Volume::Medium => "Средне (3-5 стр.)",
            Volume::Long => "Подробно (6-10 стр.)",
            Volume::VeryLong => "Очень подробно (10-15 стр.)",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Volume::Short => "Напиши кратко, 1-2 страницы.",
            Volume::Medium => "Напиши средний объём, 3-5 страниц.",
            Volume::Long => "Напиши подробно, 6-10 страниц.",
            Volume::VeryLong => "Напиши очень подробно, 10-15 страниц.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    #[default]
    Scientific,
    Simple,
    School,
    University,
}

keyed_enum!(Style, "style", {
    Scientific => "scientific",
    Simple => "simple",
    School => "school",
    University => "university",
});

impl Style {
    pub const ALL: [Style; 4] = [Style::Scientific, Style::Simple, Style::School, Style::University];

    pub fn label(self) -> &'static str {
        match self {
            Style::Scientific => "Научный",
            Style::Simple => "Простой",
            Style::School => "Для школьника",
            Style::University => "Для студента",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Style::Scientific => "Научный академический стиль.",
            Style::Simple => "Простой понятный язык.",
            Style::School => "Язык для школьника.",
            Style::University => "Язык для студента.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum EduType {
    #[default]
    #[serde(rename = "Студент")]
    Student,
    #[serde(rename = "Ученик")]
    Pupil,
}

keyed_enum!(EduType, "edu type", {
    Student => "Студент",
    Pupil => "Ученик",
});

impl EduType {
    pub const ALL: [EduType; 2] = [EduType::Student, EduType::Pupil];

    pub fn label(self) -> &'static str {
        match self {
            EduType::Student => "Студент",
            EduType::Pupil => "Ученик",
        }
    }

    /// "класса" for school pupils, "курса" for students.
    pub fn grade_unit(self) -> &'static str {
        match self {
            EduType::Student => "курса",
            EduType::Pupil => "класса",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mode_has_its_own_descriptor() {
        for mode in Mode::ALL {
            assert_eq!(mode.descriptor().mode, mode);
        }
        assert!(Mode::Referat.descriptor().show_author);
        assert!(!Mode::Question.descriptor().show_author);
    }

    #[test]
    fn unknown_wire_keys_fall_back_to_defaults() {
        let mode: Mode = serde_json::from_str("\"presentation\"").expect("mode");
        let volume: Volume = serde_json::from_str("\"huge\"").expect("volume");
        let style: Style = serde_json::from_str("\"poetic\"").expect("style");
        let edu: EduType = serde_json::from_str("\"Аспирант\"").expect("edu");
        assert_eq!(mode, Mode::Referat);
        assert_eq!(volume, Volume::Medium);
        assert_eq!(style, Style::Scientific);
        assert_eq!(edu, EduType::Student);
    }

    #[test]
    fn keys_round_trip_through_from_str() {
        assert_eq!("very_long".parse::<Volume>(), Ok(Volume::VeryLong));
        assert_eq!(Mode::Retell.to_string(), "retell");
        let err = "poem".parse::<Mode>().expect_err("unknown");
        assert_eq!(err.to_string(), "unknown mode 'poem'");
    }

    #[test]
    fn wire_keys_match_serialized_form() {
        for mode in Mode::ALL {
            let json = serde_json::to_string(&mode).expect("serialize");
            assert_eq!(json, format!("\"{}\"", mode.key()));
            assert_eq!(serde_json::from_str::<Mode>(&json).expect("mode"), mode);
        }
        assert_eq!(serde_json::to_string(&Volume::VeryLong).expect("volume"), "\"very_long\"");
        let pupil: EduType = serde_json::from_str("\"Ученик\"").expect("edu");
        assert_eq!(pupil, EduType::Pupil);
        assert!(serde_json::from_str::<Style>("1").is_err());
    }
}
