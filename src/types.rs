use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Db2MiddlewareError;

/// Values that can appear in a result-set cell or come back from a scalar
/// execution.
///
/// Reuse the same enum everywhere so shaping code does not need to branch on
/// driver types:
/// ```rust
/// use db2_middleware::prelude::*;
///
/// let cells = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Null,
/// ];
/// # let _ = cells;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Try "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // Try "YYYY-MM-DD HH:MM:SS.SSS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S.%3f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

/// Declared type of a query parameter.
///
/// `Auto` leaves type inference to the driver; every other variant names a
/// DB2 column type and forces an explicitly typed binding. The numeric
/// conversions use the wire values the orchestration platform serializes
/// (sparse on purpose, the gaps belong to types DB2 does not expose).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Let the driver infer the native type from the textual value.
    Auto,
    BigInt,
    Binary,
    Char,
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
    Timestamp,
    VarBinary,
    VarChar,
    Xml,
    Date,
    Time,
}

impl TryFrom<i32> for DataType {
    type Error = Db2MiddlewareError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(DataType::Auto),
            0 => Ok(DataType::BigInt),
            1 => Ok(DataType::Binary),
            3 => Ok(DataType::Char),
            4 => Ok(DataType::DateTime),
            5 => Ok(DataType::Decimal),
            6 => Ok(DataType::Float),
            8 => Ok(DataType::Integer),
            9 => Ok(DataType::Money),
            10 => Ok(DataType::NChar),
            12 => Ok(DataType::NVarChar),
            13 => Ok(DataType::Real),
            16 => Ok(DataType::SmallInt),
            18 => Ok(DataType::Text),
            19 => Ok(DataType::Timestamp),
            21 => Ok(DataType::VarBinary),
            22 => Ok(DataType::VarChar),
            25 => Ok(DataType::Xml),
            31 => Ok(DataType::Date),
            32 => Ok(DataType::Time),
            other => Err(Db2MiddlewareError::TypeResolution(format!(
                "unknown data type value {other}"
            ))),
        }
    }
}

/// How the SQL text is interpreted by the execution dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecuteType {
    /// Reader execution for statements starting with `select`, non-query
    /// execution for everything else. The prefix test is case-insensitive
    /// and does not skip leading whitespace or comments.
    Auto,
    /// Execute without returning a result set; yields the affected-row
    /// count (`-1` for statements with no meaningful count, e.g. DDL).
    NonQuery,
    /// Execute and return the value of the first column of the first row.
    Scalar,
    /// Always execute as a reader and return the materialized result set.
    ExecuteReader,
}

impl TryFrom<i32> for ExecuteType {
    type Error = Db2MiddlewareError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ExecuteType::Auto),
            1 => Ok(ExecuteType::NonQuery),
            2 => Ok(ExecuteType::Scalar),
            3 => Ok(ExecuteType::ExecuteReader),
            other => Err(Db2MiddlewareError::UnsupportedExecuteType(format!(
                "execute type value {other} is out of range"
            ))),
        }
    }
}

impl std::str::FromStr for ExecuteType {
    type Err = Db2MiddlewareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("auto") {
            Ok(ExecuteType::Auto)
        } else if name.eq_ignore_ascii_case("nonquery") {
            Ok(ExecuteType::NonQuery)
        } else if name.eq_ignore_ascii_case("scalar") {
            Ok(ExecuteType::Scalar)
        } else if name.eq_ignore_ascii_case("executereader") {
            Ok(ExecuteType::ExecuteReader)
        } else {
            Err(Db2MiddlewareError::UnsupportedExecuteType(format!(
                "unrecognized execute type '{s}'"
            )))
        }
    }
}

/// Transaction isolation requested for one invocation.
///
/// `None` is not the weakest level; it suppresses the transaction entirely,
/// so a failing statement has nothing to roll back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionIsolationLevel {
    /// A different isolation level than the one specified is in use, but it
    /// cannot be determined.
    Unspecified,
    /// No transaction.
    None,
    /// Whatever the server is configured with, usually read committed.
    Default,
    /// Shared locks while reading; data can still change before the end of
    /// the transaction.
    ReadCommitted,
    /// Dirty reads are possible.
    ReadUncommitted,
    /// Locks on all data used in the query; phantom rows remain possible.
    RepeatableRead,
    /// Range locks until the transaction completes.
    Serializable,
    /// Versioned reads instead of blocking.
    Snapshot,
}

impl TransactionIsolationLevel {
    /// Whether this level opens a transaction at all.
    #[must_use]
    pub fn is_transactional(self) -> bool {
        !matches!(self, TransactionIsolationLevel::None)
    }
}

impl TryFrom<i32> for TransactionIsolationLevel {
    type Error = Db2MiddlewareError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TransactionIsolationLevel::Unspecified),
            1 => Ok(TransactionIsolationLevel::None),
            2 => Ok(TransactionIsolationLevel::Default),
            3 => Ok(TransactionIsolationLevel::ReadCommitted),
            4 => Ok(TransactionIsolationLevel::ReadUncommitted),
            5 => Ok(TransactionIsolationLevel::RepeatableRead),
            6 => Ok(TransactionIsolationLevel::Serializable),
            7 => Ok(TransactionIsolationLevel::Snapshot),
            other => Err(Db2MiddlewareError::ConfigError(format!(
                "unknown isolation level value {other}"
            ))),
        }
    }
}

/// A named query parameter as declared by the caller.
///
/// The value is always textual; numeric and date coercion is delegated to
/// the driver, either through inference (`Auto`) or an explicit native type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParameter {
    /// Name of the parameter.
    pub name: String,
    /// Value for the parameter.
    pub value: String,
    /// Declared data type of the parameter.
    pub data_type: DataType,
}

impl QueryParameter {
    /// Create a new parameter with the given name, textual value, and
    /// declared type.
    pub fn new(name: impl Into<String>, value: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            data_type,
        }
    }

    /// Create a parameter whose native type the driver infers.
    pub fn auto(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, value, DataType::Auto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_type_wire_values_round_trip() {
        for (value, expected) in [
            (0, ExecuteType::Auto),
            (1, ExecuteType::NonQuery),
            (2, ExecuteType::Scalar),
            (3, ExecuteType::ExecuteReader),
        ] {
            assert_eq!(ExecuteType::try_from(value).unwrap(), expected);
        }
        assert!(matches!(
            ExecuteType::try_from(99),
            Err(Db2MiddlewareError::UnsupportedExecuteType(_))
        ));
    }

    #[test]
    fn execute_type_parses_names_case_insensitively() {
        assert_eq!(
            "executereader".parse::<ExecuteType>().unwrap(),
            ExecuteType::ExecuteReader
        );
        assert_eq!("NonQuery".parse::<ExecuteType>().unwrap(), ExecuteType::NonQuery);
        assert!("batch".parse::<ExecuteType>().is_err());
    }

    #[test]
    fn data_type_wire_values_are_sparse() {
        assert_eq!(DataType::try_from(-1).unwrap(), DataType::Auto);
        assert_eq!(DataType::try_from(22).unwrap(), DataType::VarChar);
        assert_eq!(DataType::try_from(32).unwrap(), DataType::Time);
        // 2 is one of the gaps in the platform's numbering
        assert!(DataType::try_from(2).is_err());
    }

    #[test]
    fn isolation_none_is_not_transactional() {
        assert!(!TransactionIsolationLevel::None.is_transactional());
        assert!(TransactionIsolationLevel::Unspecified.is_transactional());
        assert!(TransactionIsolationLevel::Snapshot.is_transactional());
    }
}
