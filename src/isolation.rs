//! Transaction isolation levels.
//!
//! See <https://www.postgresql.org/docs/current/sql-set-transaction.html>.

use std::fmt;

use crate::error::{Error, Result};

/// Isolation level applied to transactions when they begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i8)]
pub enum IsolationLevel {
    /// Issues no directive; the connection's own setting applies.
    #[default]
    Default = 0,
    /// A statement can only see rows committed before it began.
    ReadCommitted = 1,
    /// All statements see rows committed before the first statement of the transaction.
    RepeatableRead = 2,
    /// Like `RepeatableRead`, and the store aborts one of any set of concurrent
    /// transactions whose interleaving could not have happened serially.
    Serializable = 3,
}

impl IsolationLevel {
    /// All levels, in code order.
    pub const ALL: [IsolationLevel; 4] = [
        IsolationLevel::Default,
        IsolationLevel::ReadCommitted,
        IsolationLevel::RepeatableRead,
        IsolationLevel::Serializable,
    ];

    /// Numeric code of the level.
    pub fn code(self) -> i8 {
        self as i8
    }

    /// Level text as sent to the store, `None` for [`IsolationLevel::Default`].
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlx_unit_of_work::IsolationLevel;
    ///
    /// assert_eq!(IsolationLevel::RepeatableRead.level_text(), Some("REPEATABLE READ"));
    /// assert_eq!(IsolationLevel::Default.level_text(), None);
    /// ```
    pub fn level_text(self) -> Option<&'static str> {
        match self {
            IsolationLevel::Default => None,
            IsolationLevel::ReadCommitted => Some("READ COMMITTED"),
            IsolationLevel::RepeatableRead => Some("REPEATABLE READ"),
            IsolationLevel::Serializable => Some("SERIALIZABLE"),
        }
    }

    /// The statement that applies this level to an open transaction.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlx_unit_of_work::IsolationLevel;
    ///
    /// assert_eq!(
    ///     IsolationLevel::Serializable.directive().as_deref(),
    ///     Some("set transaction isolation level SERIALIZABLE")
    /// );
    /// assert!(IsolationLevel::Default.directive().is_none());
    /// ```
    pub fn directive(self) -> Option<String> {
        self.level_text()
            .map(|text| format!("set transaction isolation level {text}"))
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.level_text().unwrap_or("DEFAULT"))
    }
}

/// Conversion of caller-supplied values into an [`IsolationLevel`].
///
/// Values outside the enumeration fail with [`Error::InvalidIsolationLevel`].
pub trait IntoIsolationLevel {
    fn into_isolation_level(self) -> Result<IsolationLevel>;
}

impl IntoIsolationLevel for IsolationLevel {
    fn into_isolation_level(self) -> Result<IsolationLevel> {
        Ok(self)
    }
}

impl IntoIsolationLevel for i64 {
    fn into_isolation_level(self) -> Result<IsolationLevel> {
        IsolationLevel::ALL
            .into_iter()
            .find(|level| i64::from(level.code()) == self)
            .ok_or_else(|| Error::InvalidIsolationLevel(self.to_string()))
    }
}

impl IntoIsolationLevel for i32 {
    fn into_isolation_level(self) -> Result<IsolationLevel> {
        i64::from(self).into_isolation_level()
    }
}

impl IntoIsolationLevel for i8 {
    fn into_isolation_level(self) -> Result<IsolationLevel> {
        i64::from(self).into_isolation_level()
    }
}

impl IntoIsolationLevel for &str {
    fn into_isolation_level(self) -> Result<IsolationLevel> {
        let normalized = self.trim().to_uppercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "DEFAULT" | "" => Ok(IsolationLevel::Default),
            "READ COMMITTED" | "READCOMMITTED" => Ok(IsolationLevel::ReadCommitted),
            "REPEATABLE READ" | "REPEATABLEREAD" => Ok(IsolationLevel::RepeatableRead),
            "SERIALIZABLE" => Ok(IsolationLevel::Serializable),
            _ => Err(Error::InvalidIsolationLevel(format!("{self:?}"))),
        }
    }
}

impl std::str::FromStr for IsolationLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.into_isolation_level()
    }
}

impl TryFrom<i64> for IsolationLevel {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        code.into_isolation_level()
    }
}
