// src/scoring/breakdown.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    error::{ScoringError, ValidationError},
    quota::{AytField, ExamKind, Subject},
};

/// Raw answer counts for one subject, as entered by the student.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectScore {
    #[serde(default)]
    pub correct: u32,
    #[serde(default)]
    pub wrong: u32,
}

impl SubjectScore {
    pub fn new(correct: u32, wrong: u32) -> Self {
        Self { correct, wrong }
    }

    /// Unanswered questions against `quota`. Over-entered counts clamp to zero.
    pub fn blank(&self, quota: u32) -> u32 {
        quota.saturating_sub(self.correct.saturating_add(self.wrong))
    }
}

/// Loosely keyed breakdown as it travels over the wire and in storage.
pub type RawSubjects = BTreeMap<String, SubjectScore>;

/// One concrete record type per quota table row.
/// The quota list doubles as the table entry so fields and quotas cannot drift apart.
macro_rules! breakdown {
    ($(#[$meta:meta])* $name:ident { $($field:ident: $subject:ident = $quota:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name {
            $(pub $field: SubjectScore,)+
        }

        impl $name {
            pub const QUOTAS: &'static [(Subject, u32)] = &[$((Subject::$subject, $quota)),+];

            pub fn entries(&self) -> Vec<(Subject, SubjectScore)> {
                vec![$((Subject::$subject, self.$field)),+]
            }

            fn from_map(
                map: &BTreeMap<Subject, SubjectScore>,
                kind: ExamKind,
            ) -> Result<Self, ScoringError> {
                Ok(Self {
                    $($field: *map.get(&Subject::$subject).ok_or(
                        ValidationError::MissingSubject { subject: Subject::$subject, kind },
                    )?,)+
                })
            }
        }
    };
}

breakdown! {
    /// TYT: Türkçe, Temel Matematik, Fen Bilimleri and Sosyal Bilimler.
    TytBreakdown {
        turkce: Turkce = 40,
        matematik: Matematik = 40,
        fizik: Fizik = 7,
        kimya: Kimya = 7,
        biyoloji: Biyoloji = 6,
        tarih: Tarih = 5,
        cografya: Cografya = 5,
        felsefe: Felsefe = 5,
        din: Din = 5,
    }
}

breakdown! {
    /// AYT, sayısal (MF).
    MfBreakdown {
        matematik: Matematik = 40,
        fizik: Fizik = 14,
        kimya: Kimya = 13,
        biyoloji: Biyoloji = 13,
    }
}

breakdown! {
    /// AYT, eşit ağırlık (TM).
    TmBreakdown {
        matematik: Matematik = 40,
        edebiyat: Edebiyat = 24,
        tarih1: Tarih1 = 10,
        cografya1: Cografya1 = 6,
    }
}

breakdown! {
    /// AYT, sözel (TS).
    TsBreakdown {
        edebiyat: Edebiyat = 24,
        tarih1: Tarih1 = 10,
        cografya1: Cografya1 = 6,
        tarih2: Tarih2 = 11,
        cografya2: Cografya2 = 11,
        felsefe_grubu: FelsefeGrubu = 12,
        din: Din = 6,
    }
}

breakdown! {
    /// AYT, yabancı dil (DİL).
    DilBreakdown {
        yabanci_dil: YabanciDil = 80,
    }
}

/// Per-subject breakdown tagged by exam kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamBreakdown {
    Tyt(TytBreakdown),
    Mf(MfBreakdown),
    Tm(TmBreakdown),
    Ts(TsBreakdown),
    Dil(DilBreakdown),
}

impl ExamBreakdown {
    /// Checks `raw` against the quota table for `kind`.
    ///
    /// Every subject of the kind must be present exactly once and no other key is accepted.
    /// Nothing is zero-filled.
    pub fn parse(kind: ExamKind, raw: &RawSubjects) -> Result<Self, ScoringError> {
        let mut typed = BTreeMap::new();
        for (key, score) in raw {
            let subject = key.trim().parse::<Subject>()?;
            if kind.quota(subject).is_none() {
                return Err(ValidationError::UnexpectedSubject { subject, kind }.into());
            }
            if typed.insert(subject, *score).is_some() {
                return Err(ValidationError::DuplicateSubject(subject).into());
            }
        }

        Ok(match kind {
            ExamKind::Tyt => ExamBreakdown::Tyt(TytBreakdown::from_map(&typed, kind)?),
            ExamKind::Ayt(AytField::Mf) => ExamBreakdown::Mf(MfBreakdown::from_map(&typed, kind)?),
            ExamKind::Ayt(AytField::Tm) => ExamBreakdown::Tm(TmBreakdown::from_map(&typed, kind)?),
            ExamKind::Ayt(AytField::Ts) => ExamBreakdown::Ts(TsBreakdown::from_map(&typed, kind)?),
            ExamKind::Ayt(AytField::Dil) => {
                ExamBreakdown::Dil(DilBreakdown::from_map(&typed, kind)?)
            }
        })
    }

    pub fn kind(&self) -> ExamKind {
        match self {
            ExamBreakdown::Tyt(_) => ExamKind::Tyt,
            ExamBreakdown::Mf(_) => ExamKind::Ayt(AytField::Mf),
            ExamBreakdown::Tm(_) => ExamKind::Ayt(AytField::Tm),
            ExamBreakdown::Ts(_) => ExamKind::Ayt(AytField::Ts),
            ExamBreakdown::Dil(_) => ExamKind::Ayt(AytField::Dil),
        }
    }

    /// Subjects with their counts and quotas, in table order.
    pub fn subjects(&self) -> Vec<SubjectLine> {
        let entries = match self {
            ExamBreakdown::Tyt(b) => b.entries(),
            ExamBreakdown::Mf(b) => b.entries(),
            ExamBreakdown::Tm(b) => b.entries(),
            ExamBreakdown::Ts(b) => b.entries(),
            ExamBreakdown::Dil(b) => b.entries(),
        };
        let kind = self.kind();

        entries
            .into_iter()
            .map(|(subject, score)| {
                let total = kind.quota(subject).unwrap_or_default();
                SubjectLine {
                    subject,
                    correct: score.correct,
                    wrong: score.wrong,
                    total,
                    blank: score.blank(total),
                }
            })
            .collect()
    }

    /// Back to the storage shape. Only raw counts are kept.
    pub fn to_raw(&self) -> RawSubjects {
        self.subjects()
            .into_iter()
            .map(|line| {
                (
                    line.subject.key().to_string(),
                    SubjectScore::new(line.correct, line.wrong),
                )
            })
            .collect()
    }
}

/// A subject row with its quota and clamped blank count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubjectLine {
    pub subject: Subject,
    pub correct: u32,
    pub wrong: u32,
    pub total: u32,
    pub blank: u32,
}
