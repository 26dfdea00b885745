use crate::args::BoundArg;
use crate::error::PgWrapError;
use crate::projection::{
    self, IndexedColumn, IndexedColumnArrays, IndexedTable, Projection, ProjectionShape,
    ThreeLevelIndexedColumn, ThreeLevelIndexedTable, TwoLevelIndexedColumn, TwoLevelIndexedTable,
};
use crate::results::{CustomDbRow, ResultSet};
use crate::transport::Transport;
use crate::types::RowValues;

use super::{Database, TUPLES};

// Selects need no open transaction; a failure inside one still rolls it back.
impl<T: Transport> Database<T> {
    fn select(&mut self, template: &str, args: &[BoundArg]) -> Result<ResultSet, PgWrapError> {
        self.render_and_run(template, args, TUPLES)
    }

    /// Run a row-returning statement and project it into `shape`.
    ///
    /// # Errors
    /// Returns `PgWrapError::ExecutionError` if the statement fails or returns no row set, and
    /// `PgWrapError::ProjectionError` if the rows are too narrow for `shape`.
    pub fn select_as(
        &mut self,
        shape: ProjectionShape,
        template: &str,
        args: &[BoundArg],
    ) -> Result<Projection, PgWrapError> {
        let result = self.select(template, args)?;
        projection::project(result, shape)
    }

    /// Every row, in order.
    ///
    /// # Errors
    /// See [`Database::select_as`].
    pub fn select_table(
        &mut self,
        template: &str,
        args: &[BoundArg],
    ) -> Result<Vec<CustomDbRow>, PgWrapError> {
        Ok(projection::table(self.select(template, args)?))
    }

    /// The first row, or `None`.
    ///
    /// # Errors
    /// See [`Database::select_as`].
    pub fn select_record(
        &mut self,
        template: &str,
        args: &[BoundArg],
    ) -> Result<Option<CustomDbRow>, PgWrapError> {
        Ok(projection::record(self.select(template, args)?))
    }

    /// First column of the first row, or `None` for an empty result.
    ///
    /// # Errors
    /// See [`Database::select_as`].
    pub fn select_field(
        &mut self,
        template: &str,
        args: &[BoundArg],
    ) -> Result<Option<RowValues>, PgWrapError> {
        projection::field(self.select(template, args)?)
    }

    /// # Errors
    /// See [`Database::select_as`].
    pub fn select_column(
        &mut self,
        template: &str,
        args: &[BoundArg],
    ) -> Result<Vec<RowValues>, PgWrapError> {
        projection::column(self.select(template, args)?)
    }

    /// # Errors
    /// See [`Database::select_as`].
    pub fn select_indexed_column(
        &mut self,
        template: &str,
        args: &[BoundArg],
    ) -> Result<IndexedColumn, PgWrapError> {
        projection::indexed_column(self.select(template, args)?)
    }

    /// # Errors
    /// See [`Database::select_as`].
    pub fn select_indexed_column_arrays(
        &mut self,
        template: &str,
        args: &[BoundArg],
    ) -> Result<IndexedColumnArrays, PgWrapError> {
        projection::indexed_column_arrays(self.select(template, args)?)
    }

    /// # Errors
    /// See [`Database::select_as`].
    pub fn select_indexed_table(
        &mut self,
        template: &str,
        args: &[BoundArg],
    ) -> Result<IndexedTable, PgWrapError> {
        projection::indexed_table(self.select(template, args)?)
    }

    /// # Errors
    /// See [`Database::select_as`].
    pub fn select_2_indexed_column(
        &mut self,
        template: &str,
        args: &[BoundArg],
    ) -> Result<TwoLevelIndexedColumn, PgWrapError> {
        projection::two_level_indexed_column(self.select(template, args)?)
    }

    /// # Errors
    /// See [`Database::select_as`].
    pub fn select_2_indexed_table(
        &mut self,
        template: &str,
        args: &[BoundArg],
    ) -> Result<TwoLevelIndexedTable, PgWrapError> {
        projection::two_level_indexed_table(self.select(template, args)?)
    }

    /// # Errors
    /// See [`Database::select_as`].
    pub fn select_3_indexed_column(
        &mut self,
        template: &str,
        args: &[BoundArg],
    ) -> Result<ThreeLevelIndexedColumn, PgWrapError> {
        projection::three_level_indexed_column(self.select(template, args)?)
    }

    /// # Errors
    /// See [`Database::select_as`].
    pub fn select_3_indexed_table(
        &mut self,
        template: &str,
        args: &[BoundArg],
    ) -> Result<ThreeLevelIndexedTable, PgWrapError> {
        projection::three_level_indexed_table(self.select(template, args)?)
    }
}
