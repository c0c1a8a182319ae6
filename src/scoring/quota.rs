// src/scoring/quota.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{
    breakdown::{DilBreakdown, MfBreakdown, TmBreakdown, TsBreakdown, TytBreakdown},
    error::{ConfigurationError, ScoringError, ValidationError},
};

/// Version of the quota table below.
/// Bump whenever the national exam format changes a subject or a quota.
pub const QUOTA_TABLE_VERSION: u32 = 1;

/// First (TYT) or second (AYT) stage of the university entrance exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExamType {
    #[serde(rename = "TYT")]
    Tyt,
    #[serde(rename = "AYT")]
    Ayt,
}

impl ExamType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExamType::Tyt => "TYT",
            ExamType::Ayt => "AYT",
        }
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamType {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TYT" => Ok(ExamType::Tyt),
            "AYT" => Ok(ExamType::Ayt),
            _ => Err(ConfigurationError::UnknownExamType(s.to_string()).into()),
        }
    }
}

/// AYT score field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AytField {
    #[serde(rename = "MF")]
    Mf,
    #[serde(rename = "TM")]
    Tm,
    #[serde(rename = "TS")]
    Ts,
    #[serde(rename = "DİL", alias = "DIL")]
    Dil,
}

impl AytField {
    pub fn as_str(self) -> &'static str {
        match self {
            AytField::Mf => "MF",
            AytField::Tm => "TM",
            AytField::Ts => "TS",
            AytField::Dil => "DİL",
        }
    }
}

impl fmt::Display for AytField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AytField {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "DİL" is stored with a dotted capital I; accept the ASCII spelling too.
        match s.trim() {
            "MF" | "mf" => Ok(AytField::Mf),
            "TM" | "tm" => Ok(AytField::Tm),
            "TS" | "ts" => Ok(AytField::Ts),
            "DİL" | "DIL" | "dil" | "Dil" => Ok(AytField::Dil),
            _ => Err(ConfigurationError::UnknownField(s.to_string()).into()),
        }
    }
}

/// Every subject that appears in some quota table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Turkce,
    Matematik,
    Fizik,
    Kimya,
    Biyoloji,
    Tarih,
    Cografya,
    Felsefe,
    Din,
    Edebiyat,
    Tarih1,
    Cografya1,
    Tarih2,
    Cografya2,
    FelsefeGrubu,
    YabanciDil,
}

impl Subject {
    pub const ALL: [Subject; 16] = [
        Subject::Turkce,
        Subject::Matematik,
        Subject::Fizik,
        Subject::Kimya,
        Subject::Biyoloji,
        Subject::Tarih,
        Subject::Cografya,
        Subject::Felsefe,
        Subject::Din,
        Subject::Edebiyat,
        Subject::Tarih1,
        Subject::Cografya1,
        Subject::Tarih2,
        Subject::Cografya2,
        Subject::FelsefeGrubu,
        Subject::YabanciDil,
    ];

    /// Storage and wire key.
    pub fn key(self) -> &'static str {
        match self {
            Subject::Turkce => "turkce",
            Subject::Matematik => "matematik",
            Subject::Fizik => "fizik",
            Subject::Kimya => "kimya",
            Subject::Biyoloji => "biyoloji",
            Subject::Tarih => "tarih",
            Subject::Cografya => "cografya",
            Subject::Felsefe => "felsefe",
            Subject::Din => "din",
            Subject::Edebiyat => "edebiyat",
            Subject::Tarih1 => "tarih1",
            Subject::Cografya1 => "cografya1",
            Subject::Tarih2 => "tarih2",
            Subject::Cografya2 => "cografya2",
            Subject::FelsefeGrubu => "felsefe_grubu",
            Subject::YabanciDil => "yabanci_dil",
        }
    }

    /// Human readable Turkish name.
    pub fn label(self) -> &'static str {
        match self {
            Subject::Turkce => "Türkçe",
            Subject::Matematik => "Matematik",
            Subject::Fizik => "Fizik",
            Subject::Kimya => "Kimya",
            Subject::Biyoloji => "Biyoloji",
            Subject::Tarih => "Tarih",
            Subject::Cografya => "Coğrafya",
            Subject::Felsefe => "Felsefe",
            Subject::Din => "Din Kültürü",
            Subject::Edebiyat => "Türk Dili ve Edebiyatı",
            Subject::Tarih1 => "Tarih-1",
            Subject::Cografya1 => "Coğrafya-1",
            Subject::Tarih2 => "Tarih-2",
            Subject::Cografya2 => "Coğrafya-2",
            Subject::FelsefeGrubu => "Felsefe Grubu",
            Subject::YabanciDil => "Yabancı Dil",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Subject {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subject::ALL
            .into_iter()
            .find(|subject| subject.key() == s)
            .ok_or_else(|| ValidationError::UnknownSubject(s.to_string()).into())
    }
}

/// A valid (examType, field) pair, i.e. one row of the quota table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExamKind {
    Tyt,
    Ayt(AytField),
}

impl ExamKind {
    pub const ALL: [ExamKind; 5] = [
        ExamKind::Tyt,
        ExamKind::Ayt(AytField::Mf),
        ExamKind::Ayt(AytField::Tm),
        ExamKind::Ayt(AytField::Ts),
        ExamKind::Ayt(AytField::Dil),
    ];

    /// Resolves an (examType, field) pair against the quota table.
    ///
    /// TYT takes no field and AYT requires one.
    pub fn new(exam_type: ExamType, field: Option<AytField>) -> Result<Self, ScoringError> {
        match (exam_type, field) {
            (ExamType::Tyt, None) => Ok(ExamKind::Tyt),
            (ExamType::Tyt, Some(field)) => Err(ConfigurationError::FieldNotAllowed(field).into()),
            (ExamType::Ayt, Some(field)) => Ok(ExamKind::Ayt(field)),
            (ExamType::Ayt, None) => Err(ConfigurationError::FieldRequired.into()),
        }
    }

    /// Same as [`ExamKind::new`] for raw strings coming off the wire or out of storage.
    /// An empty field string counts as absent.
    pub fn parse(exam_type: &str, field: Option<&str>) -> Result<Self, ScoringError> {
        let exam_type = exam_type.parse::<ExamType>()?;
        let field = match field.map(str::trim).filter(|f| !f.is_empty()) {
            Some(raw) => Some(raw.parse::<AytField>()?),
            None => None,
        };
        Self::new(exam_type, field)
    }

    pub fn exam_type(self) -> ExamType {
        match self {
            ExamKind::Tyt => ExamType::Tyt,
            ExamKind::Ayt(_) => ExamType::Ayt,
        }
    }

    pub fn field(self) -> Option<AytField> {
        match self {
            ExamKind::Tyt => None,
            ExamKind::Ayt(field) => Some(field),
        }
    }

    /// Subjects and their fixed quotas, in display order.
    pub fn quotas(self) -> &'static [(Subject, u32)] {
        match self {
            ExamKind::Tyt => TytBreakdown::QUOTAS,
            ExamKind::Ayt(AytField::Mf) => MfBreakdown::QUOTAS,
            ExamKind::Ayt(AytField::Tm) => TmBreakdown::QUOTAS,
            ExamKind::Ayt(AytField::Ts) => TsBreakdown::QUOTAS,
            ExamKind::Ayt(AytField::Dil) => DilBreakdown::QUOTAS,
        }
    }

    pub fn quota(self, subject: Subject) -> Option<u32> {
        self.quotas()
            .iter()
            .find(|(s, _)| *s == subject)
            .map(|(_, quota)| *quota)
    }

    /// Question count of the whole exam, read from the table and never from user input.
    pub fn total_questions(self) -> u32 {
        self.quotas().iter().map(|(_, quota)| quota).sum()
    }
}

impl fmt::Display for ExamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamKind::Tyt => f.write_str("TYT"),
            ExamKind::Ayt(field) => write!(f, "AYT/{}", field),
        }
    }
}
