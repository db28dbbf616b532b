//! Variable types, token kinds and function classification for UDQs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::UdqError;

// ---------------------------------------------------------------------------
// Variable types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UdqVarType {
    None,
    Scalar,
    ConnectionVar,
    FieldVar,
    RegionVar,
    SegmentVar,
    AquiferVar,
    BlockVar,
    WellVar,
    GroupVar,
    TableLookup,
}

impl UdqVarType {
    pub fn name(self) -> &'static str {
        match self {
            UdqVarType::None => "NONE",
            UdqVarType::Scalar => "SCALAR",
            UdqVarType::ConnectionVar => "CONNECTION_VAR",
            UdqVarType::FieldVar => "FIELD_VAR",
            UdqVarType::RegionVar => "REGION_VAR",
            UdqVarType::SegmentVar => "SEGMENT_VAR",
            UdqVarType::AquiferVar => "AQUIFER_VAR",
            UdqVarType::BlockVar => "BLOCK_VAR",
            UdqVarType::WellVar => "WELL_VAR",
            UdqVarType::GroupVar => "GROUP_VAR",
            UdqVarType::TableLookup => "TABLE_LOOKUP",
        }
    }

    /// Entity-indexed types that never mix with one another.
    fn is_restricted(self) -> bool {
        matches!(
            self,
            UdqVarType::ConnectionVar
                | UdqVarType::RegionVar
                | UdqVarType::SegmentVar
                | UdqVarType::AquiferVar
                | UdqVarType::BlockVar
                | UdqVarType::WellVar
                | UdqVarType::GroupVar
        )
    }

    /// Whether a single value represents the whole quantity.
    pub fn is_scalar_like(self) -> bool {
        matches!(self, UdqVarType::Scalar | UdqVarType::FieldVar)
    }
}

impl fmt::Display for UdqVarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type of a summary or UDQ keyword from its leading character.
pub fn target_type(keyword: &str) -> UdqVarType {
    match keyword.chars().next() {
        Some('C') => UdqVarType::ConnectionVar,
        Some('R') => UdqVarType::RegionVar,
        Some('F') => UdqVarType::FieldVar,
        Some('S') => UdqVarType::SegmentVar,
        Some('A') => UdqVarType::AquiferVar,
        Some('B') => UdqVarType::BlockVar,
        Some('W') => UdqVarType::WellVar,
        Some('G') => UdqVarType::GroupVar,
        _ if keyword.parse::<f64>().is_ok() => UdqVarType::Scalar,
        _ => UdqVarType::None,
    }
}

/// As [`target_type`], but a well or group keyword qualified by a single
/// non-wildcard name denotes one value.
pub fn target_type_with_selector(keyword: &str, selector: &[String]) -> UdqVarType {
    let kind = target_type(keyword);
    if !matches!(kind, UdqVarType::WellVar | UdqVarType::GroupVar) {
        return kind;
    }
    match selector.first() {
        None => kind,
        Some(first) if first.contains('*') => kind,
        Some(_) => UdqVarType::Scalar,
    }
}

/// UDQ keywords carry `U` as their second character: `WUOPR`, `FUX`.
pub fn is_udq(keyword: &str) -> bool {
    keyword.as_bytes().get(1) == Some(&b'U')
}

/// Type of a UDQ keyword; fails for keywords that are not UDQs.
pub fn var_type(keyword: &str) -> Result<UdqVarType, UdqError> {
    if !is_udq(keyword) {
        return Err(UdqError::NotUdqType(keyword.to_string()));
    }
    Ok(target_type(keyword))
}

/// Result type of combining two operands.
///
/// Identical types are kept. A restricted (entity-indexed) type wins over a
/// scalar-like one; two different restricted types cannot be combined.
pub fn coerce(t1: UdqVarType, t2: UdqVarType) -> Result<UdqVarType, UdqError> {
    if t1 == t2 {
        return Ok(t1);
    }
    if t1.is_restricted() && t2.is_restricted() {
        return Err(UdqError::CannotCoerce(t1.name(), t2.name()));
    }
    if t2.is_restricted() || t1 == UdqVarType::None {
        return Ok(t2);
    }
    Ok(t1)
}

// ---------------------------------------------------------------------------
// Functions and tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryFunc {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
    UAdd,
    UMul,
    UMin,
    UMax,
}

impl BinaryFunc {
    pub fn is_cmp(self) -> bool {
        matches!(
            self,
            BinaryFunc::Eq | BinaryFunc::Ne | BinaryFunc::Le | BinaryFunc::Ge | BinaryFunc::Lt | BinaryFunc::Gt
        )
    }

    pub fn is_union(self) -> bool {
        matches!(
            self,
            BinaryFunc::UAdd | BinaryFunc::UMul | BinaryFunc::UMin | BinaryFunc::UMax
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryFunc::Add => "+",
            BinaryFunc::Sub => "-",
            BinaryFunc::Mul => "*",
            BinaryFunc::Div => "/",
            BinaryFunc::Pow => "^",
            BinaryFunc::Eq => "==",
            BinaryFunc::Ne => "!=",
            BinaryFunc::Le => "<=",
            BinaryFunc::Ge => ">=",
            BinaryFunc::Lt => "<",
            BinaryFunc::Gt => ">",
            BinaryFunc::UAdd => "UADD",
            BinaryFunc::UMul => "UMUL",
            BinaryFunc::UMin => "UMIN",
            BinaryFunc::UMax => "UMAX",
        }
    }
}

/// Functions applied element by element; the result keeps the argument's
/// shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementalFunc {
    Abs,
    Def,
    Exp,
    Idv,
    Ln,
    Log,
    Nint,
    SortA,
    SortD,
    Undef,
    RandN,
    RandU,
    RrndN,
    RrndU,
}

impl ElementalFunc {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementalFunc::Abs => "ABS",
            ElementalFunc::Def => "DEF",
            ElementalFunc::Exp => "EXP",
            ElementalFunc::Idv => "IDV",
            ElementalFunc::Ln => "LN",
            ElementalFunc::Log => "LOG",
            ElementalFunc::Nint => "NINT",
            ElementalFunc::SortA => "SORTA",
            ElementalFunc::SortD => "SORTD",
            ElementalFunc::Undef => "UNDEF",
            ElementalFunc::RandN => "RANDN",
            ElementalFunc::RandU => "RANDU",
            ElementalFunc::RrndN => "RRNDN",
            ElementalFunc::RrndU => "RRNDU",
        }
    }
}

/// Reductions producing a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarFunc {
    Sum,
    AveA,
    AveG,
    AveH,
    Max,
    Min,
    Norm1,
    Norm2,
    NormI,
    Prod,
}

impl ScalarFunc {
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarFunc::Sum => "SUM",
            ScalarFunc::AveA => "AVEA",
            ScalarFunc::AveG => "AVEG",
            ScalarFunc::AveH => "AVEH",
            ScalarFunc::Max => "MAX",
            ScalarFunc::Min => "MIN",
            ScalarFunc::Norm1 => "NORM1",
            ScalarFunc::Norm2 => "NORM2",
            ScalarFunc::NormI => "NORMI",
            ScalarFunc::Prod => "PROD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UdqTokenType {
    Error,
    Number,
    OpenParen,
    CloseParen,
    EclExpr,
    Binary(BinaryFunc),
    Elemental(ElementalFunc),
    Scalar(ScalarFunc),
    TableLookup,
    End,
}

impl UdqTokenType {
    /// Classify one raw token.
    pub fn of(raw: &str) -> Self {
        if raw.parse::<f64>().is_ok() {
            return UdqTokenType::Number;
        }
        if let Some(kind) = function_token(raw) {
            return kind;
        }
        match raw {
            "(" => UdqTokenType::OpenParen,
            ")" => UdqTokenType::CloseParen,
            _ if raw.starts_with("TU") => UdqTokenType::TableLookup,
            _ => UdqTokenType::EclExpr,
        }
    }

    /// Function tokens that must be followed by a parenthesised argument.
    pub fn is_call(self) -> bool {
        matches!(
            self,
            UdqTokenType::Elemental(_) | UdqTokenType::Scalar(_) | UdqTokenType::TableLookup
        )
    }

    pub fn is_cmp(self) -> bool {
        matches!(self, UdqTokenType::Binary(func) if func.is_cmp())
    }

    pub fn is_union(self) -> bool {
        matches!(self, UdqTokenType::Binary(func) if func.is_union())
    }
}

fn function_token(raw: &str) -> Option<UdqTokenType> {
    use BinaryFunc as B;
    use ElementalFunc as E;
    use ScalarFunc as S;

    let kind = match raw {
        "+" => UdqTokenType::Binary(B::Add),
        "-" => UdqTokenType::Binary(B::Sub),
        "*" => UdqTokenType::Binary(B::Mul),
        "/" | "DIV" => UdqTokenType::Binary(B::Div),
        "^" => UdqTokenType::Binary(B::Pow),
        "==" => UdqTokenType::Binary(B::Eq),
        "!=" => UdqTokenType::Binary(B::Ne),
        "<=" => UdqTokenType::Binary(B::Le),
        ">=" => UdqTokenType::Binary(B::Ge),
        "<" => UdqTokenType::Binary(B::Lt),
        ">" => UdqTokenType::Binary(B::Gt),
        "UADD" => UdqTokenType::Binary(B::UAdd),
        "UMUL" => UdqTokenType::Binary(B::UMul),
        "UMIN" => UdqTokenType::Binary(B::UMin),
        "UMAX" => UdqTokenType::Binary(B::UMax),
        "ABS" => UdqTokenType::Elemental(E::Abs),
        "DEF" => UdqTokenType::Elemental(E::Def),
        "EXP" => UdqTokenType::Elemental(E::Exp),
        "IDV" => UdqTokenType::Elemental(E::Idv),
        "LN" => UdqTokenType::Elemental(E::Ln),
        "LOG" => UdqTokenType::Elemental(E::Log),
        "NINT" => UdqTokenType::Elemental(E::Nint),
        "SORTA" => UdqTokenType::Elemental(E::SortA),
        "SORTD" => UdqTokenType::Elemental(E::SortD),
        "UNDEF" => UdqTokenType::Elemental(E::Undef),
        "RANDN" => UdqTokenType::Elemental(E::RandN),
        "RANDU" => UdqTokenType::Elemental(E::RandU),
        "RRNDN" => UdqTokenType::Elemental(E::RrndN),
        "RRNDU" => UdqTokenType::Elemental(E::RrndU),
        "SUM" => UdqTokenType::Scalar(S::Sum),
        "AVEA" => UdqTokenType::Scalar(S::AveA),
        "AVEG" => UdqTokenType::Scalar(S::AveG),
        "AVEH" => UdqTokenType::Scalar(S::AveH),
        "MAX" => UdqTokenType::Scalar(S::Max),
        "MIN" => UdqTokenType::Scalar(S::Min),
        "NORM1" => UdqTokenType::Scalar(S::Norm1),
        "NORM2" => UdqTokenType::Scalar(S::Norm2),
        "NORMI" => UdqTokenType::Scalar(S::NormI),
        "PROD" => UdqTokenType::Scalar(S::Prod),
        _ => return None,
    };
    Some(kind)
}

// ---------------------------------------------------------------------------
// Record kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UdqAction {
    Assign,
    Define,
    Units,
    Update,
}

impl FromStr for UdqAction {
    type Err = UdqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASSIGN" => Ok(UdqAction::Assign),
            "DEFINE" => Ok(UdqAction::Define),
            "UNITS" => Ok(UdqAction::Units),
            "UPDATE" => Ok(UdqAction::Update),
            other => Err(UdqError::InvalidItem(other.to_string())),
        }
    }
}

/// When a DEFINE is re-evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UdqUpdate {
    On,
    Off,
    /// Evaluate once at the next opportunity, then behave as `Off`.
    Next,
}

impl UdqUpdate {
    /// Restart encoding: 0 = OFF, 1 = NEXT, 2 = ON.
    pub fn from_code(code: i32) -> Result<Self, UdqError> {
        match code {
            0 => Ok(UdqUpdate::Off),
            1 => Ok(UdqUpdate::Next),
            2 => Ok(UdqUpdate::On),
            other => Err(UdqError::InvalidItem(other.to_string())),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            UdqUpdate::Off => 0,
            UdqUpdate::Next => 1,
            UdqUpdate::On => 2,
        }
    }
}

impl FromStr for UdqUpdate {
    type Err = UdqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ON" => Ok(UdqUpdate::On),
            "OFF" => Ok(UdqUpdate::Off),
            "NEXT" => Ok(UdqUpdate::Next),
            other => Err(UdqError::InvalidItem(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_from_keyword_prefix() {
        assert_eq!(target_type("WOPR"), UdqVarType::WellVar);
        assert_eq!(target_type("GUX"), UdqVarType::GroupVar);
        assert_eq!(target_type("FOPT"), UdqVarType::FieldVar);
        assert_eq!(target_type("SOFR"), UdqVarType::SegmentVar);
        assert_eq!(target_type("1.5"), UdqVarType::Scalar);
        assert_eq!(target_type("TIME"), UdqVarType::None);
    }

    #[test]
    fn named_selector_makes_a_scalar() {
        let one = vec!["P1".to_string()];
        let glob = vec!["P*".to_string()];
        assert_eq!(target_type_with_selector("WOPR", &one), UdqVarType::Scalar);
        assert_eq!(target_type_with_selector("WOPR", &glob), UdqVarType::WellVar);
        assert_eq!(target_type_with_selector("WOPR", &[]), UdqVarType::WellVar);
        assert_eq!(target_type_with_selector("FOPR", &one), UdqVarType::FieldVar);
    }

    #[test]
    fn udq_keywords_need_u_in_second_position() {
        assert_eq!(var_type("WUOPR"), Ok(UdqVarType::WellVar));
        assert!(is_udq("FUX"));
        assert_eq!(var_type("WOPR"), Err(UdqError::NotUdqType("WOPR".into())));
    }

    #[test]
    fn coercion_lattice() {
        use UdqVarType::*;
        assert_eq!(coerce(Scalar, WellVar), Ok(WellVar));
        assert_eq!(coerce(GroupVar, FieldVar), Ok(GroupVar));
        assert_eq!(coerce(None, FieldVar), Ok(FieldVar));
        assert_eq!(coerce(WellVar, WellVar), Ok(WellVar));
        assert!(coerce(WellVar, GroupVar).is_err());
        assert!(coerce(SegmentVar, WellVar).is_err());
    }

    #[test]
    fn token_classification() {
        assert_eq!(UdqTokenType::of("1E-3"), UdqTokenType::Number);
        assert_eq!(UdqTokenType::of("SUM"), UdqTokenType::Scalar(ScalarFunc::Sum));
        assert_eq!(UdqTokenType::of("UMAX"), UdqTokenType::Binary(BinaryFunc::UMax));
        assert_eq!(UdqTokenType::of("TUPLE1"), UdqTokenType::TableLookup);
        assert_eq!(UdqTokenType::of("WOPR"), UdqTokenType::EclExpr);
        assert!(UdqTokenType::of("<=").is_cmp());
        assert!(UdqTokenType::of("LN").is_call());
    }

    #[test]
    fn update_codes() {
        assert_eq!(UdqUpdate::from_code(1), Ok(UdqUpdate::Next));
        assert_eq!("ON".parse::<UdqUpdate>(), Ok(UdqUpdate::On));
        assert_eq!(UdqUpdate::Off.code(), 0);
        assert!("SOMETIMES".parse::<UdqUpdate>().is_err());
    }
}
