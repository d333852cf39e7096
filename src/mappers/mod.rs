//! Record-to-statement mapping, one mapper per dataset.
//!
//! Mappers only build a `StatementTemplate`; rendering and writing belong to
//! the pipeline. Identity tables are passed in explicitly: owners receive
//! `&mut`, dependents `&`.

pub mod locations;
pub mod reference;
pub mod users;

use crate::capability::Capabilities;
use crate::dataset::Dataset;
use crate::decoder::Record;
use crate::error::PipelineResult;
use crate::identity::IdentityTables;
use crate::statement::{Param, StatementTemplate};

/// Business-id value marking a row that must not be emitted
pub const NULL_MARKER: &str = "NULL";

/// Map one record of `dataset`.
///
/// Returns `Ok(None)` when the record is skipped. Skipped records never touch
/// the identity tables.
pub async fn map_record(
    dataset: Dataset,
    record: &Record,
    tables: &mut IdentityTables,
    caps: &Capabilities,
) -> PipelineResult<Option<StatementTemplate>> {
    let ids = caps.ids.as_ref();

    match dataset {
        Dataset::Users => users::map_user(record, caps).await.map(Some),
        Dataset::Categories => reference::map_category(record, ids).map(Some),
        Dataset::Segments => reference::map_segment(record, ids).map(Some),
        Dataset::AgeGroups => reference::map_age_group(record, ids).map(Some),
        Dataset::IncomeRanges => reference::map_income_range(record, ids).map(Some),
        Dataset::States => locations::map_state(record, &mut tables.states, ids).map(Some),
        Dataset::Cities => locations::map_city(record, &mut tables.cities, &tables.states, ids),
        Dataset::Neighborhoods => locations::map_neighborhood(record, &tables.cities, ids),
    }
}

pub(crate) fn string_field(record: &Record, field: &str) -> PipelineResult<Param> {
    Ok(Param::string(record.require(field)?))
}

pub(crate) fn number_field(record: &Record, field: &str) -> PipelineResult<Param> {
    Ok(Param::number(record.require(field)?))
}
