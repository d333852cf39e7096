//! Reference-data mappers: categories, segments, age groups, income ranges.
//!
//! Each emitted row gets a fresh id, even when the input repeats a row.

use crate::capability::IdGenerator;
use crate::decoder::Record;
use crate::error::PipelineResult;
use crate::mappers::{number_field, string_field};
use crate::statement::{Param, StatementTemplate};

const INSERT_CATEGORY: &str =
    "INSERT IGNORE INTO categories (id, name, description) VALUES (:id, :name, :description);";

const INSERT_SEGMENT: &str = "INSERT IGNORE INTO segments (id, big_id, name, description) \
     VALUES (:id, :bigId, :name, :description);";

const INSERT_AGE_GROUP: &str = "INSERT IGNORE INTO age_groups (id, big_id, name, age_min, age_max) \
     VALUES (:id, :bigId, :name, :ageMin, :ageMax);";

const INSERT_INCOME_RANGE: &str =
    "INSERT IGNORE INTO income_ranges (id, big_id, name, income_min, income_max) \
     VALUES (:id, :bigId, :name, :incomeMin, :incomeMax);";

pub fn map_category(record: &Record, ids: &dyn IdGenerator) -> PipelineResult<StatementTemplate> {
    Ok(StatementTemplate::new(INSERT_CATEGORY)
        .bind("id", Param::string(ids.new_id()?))
        .bind("name", string_field(record, "nome")?)
        .bind("description", string_field(record, "descricao")?))
}

/// `big_id` carries the source system's own segment id.
pub fn map_segment(record: &Record, ids: &dyn IdGenerator) -> PipelineResult<StatementTemplate> {
    Ok(StatementTemplate::new(INSERT_SEGMENT)
        .bind("id", Param::string(ids.new_id()?))
        .bind("bigId", number_field(record, "id")?)
        .bind("name", string_field(record, "nome")?)
        .bind("description", string_field(record, "descricao")?))
}

pub fn map_age_group(record: &Record, ids: &dyn IdGenerator) -> PipelineResult<StatementTemplate> {
    Ok(StatementTemplate::new(INSERT_AGE_GROUP)
        .bind("id", Param::string(ids.new_id()?))
        .bind("bigId", number_field(record, "id")?)
        .bind("name", string_field(record, "nome")?)
        .bind("ageMin", number_field(record, "min")?)
        .bind("ageMax", number_field(record, "max")?))
}

pub fn map_income_range(
    record: &Record,
    ids: &dyn IdGenerator,
) -> PipelineResult<StatementTemplate> {
    Ok(StatementTemplate::new(INSERT_INCOME_RANGE)
        .bind("id", Param::string(ids.new_id()?))
        .bind("bigId", number_field(record, "id")?)
        .bind("name", string_field(record, "nome")?)
        .bind("incomeMin", number_field(record, "min")?)
        .bind("incomeMax", number_field(record, "max")?))
}
