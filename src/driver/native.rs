use crate::error::Db2MiddlewareError;
use crate::types::{DataType, TransactionIsolationLevel};

/// DB2 native parameter type used for explicit binding.
///
/// The mapping from [`DataType`] is a static table resolved before any
/// driver call, so an unresolvable declared type fails fast instead of
/// inside the execution path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    BigInt,
    Binary,
    Char,
    Date,
    DateTime,
    Decimal,
    Float,
    Integer,
    Money,
    NChar,
    NVarChar,
    Real,
    SmallInt,
    Text,
    Time,
    Timestamp,
    VarBinary,
    VarChar,
    Xml,
}

impl NativeType {
    /// Resolve a declared type to its native counterpart.
    ///
    /// # Errors
    /// Returns `Db2MiddlewareError::TypeResolution` for
    /// [`DataType::Auto`], which has no native counterpart by definition —
    /// the binder must handle inference before reaching this table.
    pub fn resolve(declared: DataType) -> Result<Self, Db2MiddlewareError> {
        match declared {
            DataType::Auto => Err(Db2MiddlewareError::TypeResolution(
                "Auto has no native type; bind by inference instead".to_string(),
            )),
            DataType::BigInt => Ok(NativeType::BigInt),
            DataType::Binary => Ok(NativeType::Binary),
            DataType::Char => Ok(NativeType::Char),
            DataType::Date => Ok(NativeType::Date),
            DataType::DateTime => Ok(NativeType::DateTime),
            DataType::Decimal => Ok(NativeType::Decimal),
            DataType::Float => Ok(NativeType::Float),
            DataType::Integer => Ok(NativeType::Integer),
            DataType::Money => Ok(NativeType::Money),
            DataType::NChar => Ok(NativeType::NChar),
            DataType::NVarChar => Ok(NativeType::NVarChar),
            DataType::Real => Ok(NativeType::Real),
            DataType::SmallInt => Ok(NativeType::SmallInt),
            DataType::Text => Ok(NativeType::Text),
            DataType::Time => Ok(NativeType::Time),
            DataType::Timestamp => Ok(NativeType::Timestamp),
            DataType::VarBinary => Ok(NativeType::VarBinary),
            DataType::VarChar => Ok(NativeType::VarChar),
            DataType::Xml => Ok(NativeType::Xml),
        }
    }

    /// Whether textual values of this type coerce to a signed integer.
    #[must_use]
    pub fn is_integer_kind(self) -> bool {
        matches!(
            self,
            NativeType::BigInt | NativeType::Integer | NativeType::SmallInt
        )
    }

    /// Whether textual values of this type coerce to a double.
    #[must_use]
    pub fn is_float_kind(self) -> bool {
        matches!(self, NativeType::Float | NativeType::Real)
    }

    /// Whether values of this type bind as raw bytes.
    #[must_use]
    pub fn is_binary_kind(self) -> bool {
        matches!(self, NativeType::Binary | NativeType::VarBinary)
    }
}

/// Isolation level in the driver's own terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeIsolationLevel {
    Unspecified,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
    Snapshot,
}

/// Map the abstract isolation level onto the driver's levels.
///
/// Total: six levels map 1:1; `Default` falls through to read committed,
/// and `None` (which never reaches a driver because it suppresses the
/// transaction entirely) falls through the same way.
impl From<TransactionIsolationLevel> for NativeIsolationLevel {
    fn from(level: TransactionIsolationLevel) -> Self {
        match level {
            TransactionIsolationLevel::Unspecified => NativeIsolationLevel::Unspecified,
            TransactionIsolationLevel::ReadUncommitted => NativeIsolationLevel::ReadUncommitted,
            TransactionIsolationLevel::ReadCommitted => NativeIsolationLevel::ReadCommitted,
            TransactionIsolationLevel::RepeatableRead => NativeIsolationLevel::RepeatableRead,
            TransactionIsolationLevel::Serializable => NativeIsolationLevel::Serializable,
            TransactionIsolationLevel::Snapshot => NativeIsolationLevel::Snapshot,
            TransactionIsolationLevel::Default | TransactionIsolationLevel::None => {
                NativeIsolationLevel::ReadCommitted
            }
        }
    }
}
