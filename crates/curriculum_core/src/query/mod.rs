//! Dynamic query options and per-entity sort whitelists.
//!
//! # Responsibility
//! - Carry client sort/pagination input into the core unchanged.
//! - Resolve client column names against a closed set of sortable columns.
//!
//! # Invariants
//! - Only a [`SortColumn`] value is ever interpolated into SQL; every data
//!   value is bound as a statement parameter.
//! - An unknown `order_by` resolves to "no sort", never to an error.

use serde::Deserialize;

mod builder;

pub use builder::{BuiltQuery, QueryBuilder, UNBOUNDED_LIMIT};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Parses wire input leniently: only `desc` (any case) selects descending.
    pub fn parse_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

/// Sort and pagination input for list/find operations.
///
/// `limit <= 0` means "no cap" and `offset <= 0` means "start at the first row".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QueryOptions {
    /// Raw client column name; resolved against the entity whitelist.
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl QueryOptions {
    /// Options sorting by `column` with no pagination.
    pub fn sorted_by(column: impl Into<String>, order: SortOrder) -> Self {
        Self {
            order_by: Some(column.into()),
            order,
            ..Self::default()
        }
    }

    /// Returns a copy with the given page window.
    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

/// Closed set of columns an entity may be sorted by.
pub trait SortColumn: Copy + 'static {
    /// Every sortable column, in declaration order.
    const ALL: &'static [Self];

    /// SQL identifier for this column.
    fn column(self) -> &'static str;

    /// Resolves a client-supplied name. Matching is exact and case-sensitive.
    fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|column| column.column() == name)
    }
}

macro_rules! sort_columns {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $column:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl SortColumn for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn column(self) -> &'static str {
                match self {
                    $(Self::$variant => $column),+
                }
            }
        }
    };
}

sort_columns! {
    /// Sortable `course` columns.
    CourseColumn {
        CourseId => "course_id",
        Name => "name",
        Kind => "type",
        TotalHours => "total_hours",
        LectureHours => "lecture_hours",
        LabHours => "lab_hours",
        Credit => "credit",
        Semester => "semester",
    }
}

sort_columns! {
    /// Sortable `student` columns.
    StudentColumn {
        StudentId => "student_id",
        Name => "name",
        Email => "email",
        Credits => "credits",
    }
}

sort_columns! {
    /// Sortable `enrollment` columns.
    EnrollmentColumn {
        StudentId => "student_id",
        CourseId => "course_id",
    }
}
