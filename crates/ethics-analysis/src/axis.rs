//! 評価軸の定義
//!
//! 8 つの基本軸と 2 つの派生値（合計・平均）を一箇所で定義する。
//! 順位付け・CSV 列・表の描画はすべてここの並び順を参照する。

use serde::{Serialize, Serializer};

/// 基本軸（宣言順が正規順序で、同点時のタイブレークにも使う）
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    HarmCare,
    FairnessJustice,
    AutonomyRespect,
    AuthorityLegitimacy,
    LoyaltyTrust,
    IntegrityTruth,
    SanctityPurity,
    UtilityConsequences,
}

/// 正規順序の基本軸一覧
pub const AXES: [Axis; 8] = [
    Axis::HarmCare,
    Axis::FairnessJustice,
    Axis::AutonomyRespect,
    Axis::AuthorityLegitimacy,
    Axis::LoyaltyTrust,
    Axis::IntegrityTruth,
    Axis::SanctityPurity,
    Axis::UtilityConsequences,
];

/// 平均値の分母。存在する軸の数に関わらず常に 8 で割る。
pub const AVERAGE_DENOMINATOR: f64 = 8.0;

impl Axis {
    pub const fn code(self) -> &'static str {
        match self {
            Axis::HarmCare => "hc",
            Axis::FairnessJustice => "fj",
            Axis::AutonomyRespect => "ar",
            Axis::AuthorityLegitimacy => "al",
            Axis::LoyaltyTrust => "lt",
            Axis::IntegrityTruth => "it",
            Axis::SanctityPurity => "sp",
            Axis::UtilityConsequences => "uc",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Axis::HarmCare => "Harm/Care",
            Axis::FairnessJustice => "Fairness/Justice",
            Axis::AutonomyRespect => "Autonomy/Respect",
            Axis::AuthorityLegitimacy => "Authority/Legitimacy",
            Axis::LoyaltyTrust => "Loyalty/Trust",
            Axis::IntegrityTruth => "Integrity/Truth",
            Axis::SanctityPurity => "Sanctity/Purity",
            Axis::UtilityConsequences => "Utility/Consequences",
        }
    }

    /// 正規順序でのインデックス（0..8）
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_code(code: &str) -> Option<Self> {
        AXES.iter().copied().find(|axis| axis.code() == code)
    }
}

impl Serialize for Axis {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// スコア集合のフィールド（基本軸 8 + 合計 + 平均）
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScoreField {
    Axis(Axis),
    Total,
    Average,
}

/// 正規順序の全フィールド一覧（CSV 列順と一致）
pub const SCORE_FIELDS: [ScoreField; 10] = [
    ScoreField::Axis(Axis::HarmCare),
    ScoreField::Axis(Axis::FairnessJustice),
    ScoreField::Axis(Axis::AutonomyRespect),
    ScoreField::Axis(Axis::AuthorityLegitimacy),
    ScoreField::Axis(Axis::LoyaltyTrust),
    ScoreField::Axis(Axis::IntegrityTruth),
    ScoreField::Axis(Axis::SanctityPurity),
    ScoreField::Axis(Axis::UtilityConsequences),
    ScoreField::Total,
    ScoreField::Average,
];

impl ScoreField {
    pub const fn code(self) -> &'static str {
        match self {
            ScoreField::Axis(axis) => axis.code(),
            ScoreField::Total => "total",
            ScoreField::Average => "average",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            ScoreField::Axis(axis) => axis.display_name(),
            ScoreField::Total => "Total Score",
            ScoreField::Average => "Average Score",
        }
    }

    pub const fn index(self) -> usize {
        match self {
            ScoreField::Axis(axis) => axis.index(),
            ScoreField::Total => 8,
            ScoreField::Average => 9,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        SCORE_FIELDS.iter().copied().find(|field| field.code() == code)
    }
}

impl From<Axis> for ScoreField {
    fn from(axis: Axis) -> Self {
        ScoreField::Axis(axis)
    }
}

impl Serialize for ScoreField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}
