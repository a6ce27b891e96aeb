//! Sort specifications for list endpoints.
//!
//! Sorting is requested as `field:direction` (e.g. `name:asc`). The field is
//! parsed into a caller-supplied enum so only allow-listed columns can ever
//! reach a query; anything else is treated as "no sort".

use std::str::FromStr;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// Returns the SQL keyword for this direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(()),
        }
    }
}

/// A validated sort request over the allow-listed field enum `F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortSpec<F> {
    /// Field to sort by.
    pub field: F,
    /// Direction.
    pub direction: SortDirection,
}

impl<F: FromStr> SortSpec<F> {
    /// Parse `field:direction`. Returns `None` for unknown fields, unknown
    /// directions, or a missing separator.
    ///
    /// ```
    /// use store_rating_core::{SortDirection, SortSpec, Role};
    ///
    /// let spec = SortSpec::<Role>::parse("owner:desc").unwrap();
    /// assert_eq!(spec.field, Role::Owner);
    /// assert_eq!(spec.direction, SortDirection::Desc);
    /// assert!(SortSpec::<Role>::parse("owner").is_none());
    /// ```
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (field, direction) = s.split_once(':')?;
        Some(Self {
            field: field.parse().ok()?,
            direction: direction.parse().ok()?,
        })
    }
}
