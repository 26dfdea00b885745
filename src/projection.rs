//! Reduce a tabular result into scalar, list or nested map shapes.
//!
//! Shapes that index by column position (`row[0]`, `row[1]`, ...) check every row's width
//! first and fail with [`PgWrapError::ProjectionError`] instead of reading past the end.
//! Map keys are the text form of the key value (see [`RowValues::to_key`]); maps keep the
//! position where a key first appeared and a later duplicate replaces the value.

use indexmap::IndexMap;

use crate::error::PgWrapError;
use crate::results::{CustomDbRow, ResultSet};
use crate::types::RowValues;

pub type IndexedColumn = IndexMap<String, RowValues>;
pub type IndexedColumnArrays = IndexMap<String, Vec<RowValues>>;
pub type IndexedTable = IndexMap<String, CustomDbRow>;
pub type TwoLevelIndexedColumn = IndexMap<String, IndexedColumn>;
pub type TwoLevelIndexedTable = IndexMap<String, IndexedTable>;
pub type ThreeLevelIndexedColumn = IndexMap<String, TwoLevelIndexedColumn>;
pub type ThreeLevelIndexedTable = IndexMap<String, TwoLevelIndexedTable>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionShape {
    /// Every row, in order.
    Table,
    /// The first row.
    Record,
    /// First column of the first row.
    Field,
    /// First column of every row.
    Column,
    /// `row[0] => row[1]`
    IndexedColumn,
    /// `row[0] => [row[1], ...]`
    IndexedColumnArrays,
    /// `row[0] => row`
    IndexedTable,
    /// `row[0] => row[1] => row[2]`
    TwoLevelIndexedColumn,
    /// `row[0] => row[1] => row`
    TwoLevelIndexedTable,
    /// `row[0] => row[1] => row[2] => row[3]`
    ThreeLevelIndexedColumn,
    /// `row[0] => row[1] => row[2] => row`
    ThreeLevelIndexedTable,
}

impl ProjectionShape {
    pub const ALL: [ProjectionShape; 11] = [
        ProjectionShape::Table,
        ProjectionShape::Record,
        ProjectionShape::Field,
        ProjectionShape::Column,
        ProjectionShape::IndexedColumn,
        ProjectionShape::IndexedColumnArrays,
        ProjectionShape::IndexedTable,
        ProjectionShape::TwoLevelIndexedColumn,
        ProjectionShape::TwoLevelIndexedTable,
        ProjectionShape::ThreeLevelIndexedColumn,
        ProjectionShape::ThreeLevelIndexedTable,
    ];

    /// Minimum number of columns every row must carry.
    #[must_use]
    pub fn required_columns(self) -> usize {
        match self {
            ProjectionShape::Table | ProjectionShape::Record => 0,
            ProjectionShape::Field | ProjectionShape::Column | ProjectionShape::IndexedTable => 1,
            ProjectionShape::IndexedColumn
            | ProjectionShape::IndexedColumnArrays
            | ProjectionShape::TwoLevelIndexedTable => 2,
            ProjectionShape::TwoLevelIndexedColumn | ProjectionShape::ThreeLevelIndexedTable => 3,
            ProjectionShape::ThreeLevelIndexedColumn => 4,
        }
    }
}

/// A projected result; the variant matches the requested [`ProjectionShape`].
#[derive(Debug, Clone)]
pub enum Projection {
    Table(Vec<CustomDbRow>),
    Record(Option<CustomDbRow>),
    Field(Option<RowValues>),
    Column(Vec<RowValues>),
    IndexedColumn(IndexedColumn),
    IndexedColumnArrays(IndexedColumnArrays),
    IndexedTable(IndexedTable),
    TwoLevelIndexedColumn(TwoLevelIndexedColumn),
    TwoLevelIndexedTable(TwoLevelIndexedTable),
    ThreeLevelIndexedColumn(ThreeLevelIndexedColumn),
    ThreeLevelIndexedTable(ThreeLevelIndexedTable),
}

impl Projection {
    #[must_use]
    pub fn shape(&self) -> ProjectionShape {
        match self {
            Projection::Table(_) => ProjectionShape::Table,
            Projection::Record(_) => ProjectionShape::Record,
            Projection::Field(_) => ProjectionShape::Field,
            Projection::Column(_) => ProjectionShape::Column,
            Projection::IndexedColumn(_) => ProjectionShape::IndexedColumn,
            Projection::IndexedColumnArrays(_) => ProjectionShape::IndexedColumnArrays,
            Projection::IndexedTable(_) => ProjectionShape::IndexedTable,
            Projection::TwoLevelIndexedColumn(_) => ProjectionShape::TwoLevelIndexedColumn,
            Projection::TwoLevelIndexedTable(_) => ProjectionShape::TwoLevelIndexedTable,
            Projection::ThreeLevelIndexedColumn(_) => ProjectionShape::ThreeLevelIndexedColumn,
            Projection::ThreeLevelIndexedTable(_) => ProjectionShape::ThreeLevelIndexedTable,
        }
    }

    /// `true` for an empty sequence or map, a missing record or a missing field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Projection::Table(v) => v.is_empty(),
            Projection::Record(r) => r.is_none(),
            Projection::Field(f) => f.is_none(),
            Projection::Column(v) => v.is_empty(),
            Projection::IndexedColumn(m) => m.is_empty(),
            Projection::IndexedColumnArrays(m) => m.is_empty(),
            Projection::IndexedTable(m) => m.is_empty(),
            Projection::TwoLevelIndexedColumn(m) => m.is_empty(),
            Projection::TwoLevelIndexedTable(m) => m.is_empty(),
            Projection::ThreeLevelIndexedColumn(m) => m.is_empty(),
            Projection::ThreeLevelIndexedTable(m) => m.is_empty(),
        }
    }
}

/// Project `result` into `shape`.
///
/// # Errors
/// Returns `PgWrapError::ProjectionError` if any row is narrower than the shape requires.
pub fn project(result: ResultSet, shape: ProjectionShape) -> Result<Projection, PgWrapError> {
    Ok(match shape {
        ProjectionShape::Table => Projection::Table(table(result)),
        ProjectionShape::Record => Projection::Record(record(result)),
        ProjectionShape::Field => Projection::Field(field(result)?),
        ProjectionShape::Column => Projection::Column(column(result)?),
        ProjectionShape::IndexedColumn => Projection::IndexedColumn(indexed_column(result)?),
        ProjectionShape::IndexedColumnArrays => {
            Projection::IndexedColumnArrays(indexed_column_arrays(result)?)
        }
        ProjectionShape::IndexedTable => Projection::IndexedTable(indexed_table(result)?),
        ProjectionShape::TwoLevelIndexedColumn => {
            Projection::TwoLevelIndexedColumn(two_level_indexed_column(result)?)
        }
        ProjectionShape::TwoLevelIndexedTable => {
            Projection::TwoLevelIndexedTable(two_level_indexed_table(result)?)
        }
        ProjectionShape::ThreeLevelIndexedColumn => {
            Projection::ThreeLevelIndexedColumn(three_level_indexed_column(result)?)
        }
        ProjectionShape::ThreeLevelIndexedTable => {
            Projection::ThreeLevelIndexedTable(three_level_indexed_table(result)?)
        }
    })
}

fn check_width(result: &ResultSet, shape: ProjectionShape) -> Result<(), PgWrapError> {
    let required = shape.required_columns();
    match result.results.iter().find(|row| row.len() < required) {
        Some(row) => Err(PgWrapError::ProjectionError {
            shape,
            required,
            available: row.len(),
        }),
        None => Ok(()),
    }
}

fn key(row: &CustomDbRow, index: usize) -> String {
    row.rows[index].to_key()
}

/// Take the leading `N` values of a row that is known to be at least `N` wide.
fn leading<const N: usize>(row: CustomDbRow) -> [RowValues; N] {
    let mut values = row.rows.into_iter();
    std::array::from_fn(|_| values.next().unwrap_or(RowValues::Null))
}

#[must_use]
pub fn table(result: ResultSet) -> Vec<CustomDbRow> {
    result.results
}

#[must_use]
pub fn record(result: ResultSet) -> Option<CustomDbRow> {
    result.results.into_iter().next()
}

/// # Errors
/// Returns `PgWrapError::ProjectionError` if the first row has no columns.
pub fn field(result: ResultSet) -> Result<Option<RowValues>, PgWrapError> {
    let Some(row) = record(result) else {
        return Ok(None);
    };
    if row.is_empty() {
        return Err(PgWrapError::ProjectionError {
            shape: ProjectionShape::Field,
            required: 1,
            available: 0,
        });
    }
    let [value] = leading::<1>(row);
    Ok(Some(value))
}

/// # Errors
/// Returns `PgWrapError::ProjectionError` if a row has no columns.
pub fn column(result: ResultSet) -> Result<Vec<RowValues>, PgWrapError> {
    check_width(&result, ProjectionShape::Column)?;
    Ok(result
        .results
        .into_iter()
        .map(|row| {
            let [value] = leading::<1>(row);
            value
        })
        .collect())
}

/// # Errors
/// Returns `PgWrapError::ProjectionError` if a row has fewer than two columns.
pub fn indexed_column(result: ResultSet) -> Result<IndexedColumn, PgWrapError> {
    check_width(&result, ProjectionShape::IndexedColumn)?;
    let mut out = IndexMap::with_capacity(result.len());
    for row in result.results {
        let [k, v] = leading::<2>(row);
        out.insert(k.to_key(), v);
    }
    Ok(out)
}

/// # Errors
/// Returns `PgWrapError::ProjectionError` if a row has fewer than two columns.
pub fn indexed_column_arrays(result: ResultSet) -> Result<IndexedColumnArrays, PgWrapError> {
    check_width(&result, ProjectionShape::IndexedColumnArrays)?;
    let mut out: IndexedColumnArrays = IndexMap::new();
    for row in result.results {
        let [k, v] = leading::<2>(row);
        out.entry(k.to_key()).or_default().push(v);
    }
    Ok(out)
}

/// # Errors
/// Returns `PgWrapError::ProjectionError` if a row has no columns.
pub fn indexed_table(result: ResultSet) -> Result<IndexedTable, PgWrapError> {
    check_width(&result, ProjectionShape::IndexedTable)?;
    let mut out = IndexMap::with_capacity(result.len());
    for row in result.results {
        out.insert(key(&row, 0), row);
    }
    Ok(out)
}

/// # Errors
/// Returns `PgWrapError::ProjectionError` if a row has fewer than three columns.
pub fn two_level_indexed_column(result: ResultSet) -> Result<TwoLevelIndexedColumn, PgWrapError> {
    check_width(&result, ProjectionShape::TwoLevelIndexedColumn)?;
    let mut out: TwoLevelIndexedColumn = IndexMap::new();
    for row in result.results {
        let [k1, k2, v] = leading::<3>(row);
        out.entry(k1.to_key())
            .or_default()
            .insert(k2.to_key(), v);
    }
    Ok(out)
}

/// # Errors
/// Returns `PgWrapError::ProjectionError` if a row has fewer than two columns.
pub fn two_level_indexed_table(result: ResultSet) -> Result<TwoLevelIndexedTable, PgWrapError> {
    check_width(&result, ProjectionShape::TwoLevelIndexedTable)?;
    let mut out: TwoLevelIndexedTable = IndexMap::new();
    for row in result.results {
        let (k1, k2) = (key(&row, 0), key(&row, 1));
        out.entry(k1).or_default().insert(k2, row);
    }
    Ok(out)
}

/// # Errors
/// Returns `PgWrapError::ProjectionError` if a row has fewer than four columns.
pub fn three_level_indexed_column(
    result: ResultSet,
) -> Result<ThreeLevelIndexedColumn, PgWrapError> {
    check_width(&result, ProjectionShape::ThreeLevelIndexedColumn)?;
    let mut out: ThreeLevelIndexedColumn = IndexMap::new();
    for row in result.results {
        let [k1, k2, k3, v] = leading::<4>(row);
        out.entry(k1.to_key())
            .or_default()
            .entry(k2.to_key())
            .or_default()
            .insert(k3.to_key(), v);
    }
    Ok(out)
}

/// # Errors
/// Returns `PgWrapError::ProjectionError` if a row has fewer than three columns.
pub fn three_level_indexed_table(
    result: ResultSet,
) -> Result<ThreeLevelIndexedTable, PgWrapError> {
    check_width(&result, ProjectionShape::ThreeLevelIndexedTable)?;
    let mut out: ThreeLevelIndexedTable = IndexMap::new();
    for row in result.results {
        let (k1, k2, k3) = (key(&row, 0), key(&row, 1), key(&row, 2));
        out.entry(k1)
            .or_default()
            .entry(k2)
            .or_default()
            .insert(k3, row);
    }
    Ok(out)
}
