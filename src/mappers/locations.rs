//! Location mappers: states, cities, neighborhoods.
//!
//! These are the only mappers that touch identity tables. States own the
//! state table, cities own the city table and read states, neighborhoods read
//! cities.

use crate::capability::IdGenerator;
use crate::decoder::Record;
use crate::error::PipelineResult;
use crate::identity::IdentityTable;
use crate::mappers::{number_field, string_field, NULL_MARKER};
use crate::statement::{Param, StatementTemplate};

const INSERT_STATE: &str =
    "INSERT IGNORE INTO states (id, name, abbreviation) VALUES (:id, :name, :abbreviation);";

const INSERT_CITY: &str =
    "INSERT IGNORE INTO cities (id, big_id, state_id, name) VALUES (:id, :bigId, :stateId, :name);";

const INSERT_NEIGHBORHOOD: &str = "INSERT IGNORE INTO neighborhoods (id, big_id, city_id, name) \
     VALUES (:id, :bigId, :cityId, :name);";

/// Repeated abbreviations reuse the id assigned on first sighting.
pub fn map_state(
    record: &Record,
    states: &mut IdentityTable,
    ids: &dyn IdGenerator,
) -> PipelineResult<StatementTemplate> {
    let uf = record.require("uf")?;
    let name = string_field(record, "estado")?;
    let id = states.ensure(uf, ids)?;

    Ok(StatementTemplate::new(INSERT_STATE)
        .bind("id", Param::string(id))
        .bind("name", name)
        .bind("abbreviation", Param::string(uf)))
}

pub fn map_city(
    record: &Record,
    cities: &mut IdentityTable,
    states: &IdentityTable,
    ids: &dyn IdGenerator,
) -> PipelineResult<Option<StatementTemplate>> {
    let city_key = record.require("cidade_id")?;
    if city_key == NULL_MARKER {
        tracing::debug!(line = record.line(), "Skipping city without id");
        return Ok(None);
    }

    // Resolve and validate everything before the city table is touched.
    let state_id = Param::string(states.lookup(record.require("uf")?)?);
    let big_id = number_field(record, "cidade_id")?;
    let name = string_field(record, "cidade")?;
    let id = cities.ensure(city_key, ids)?;

    Ok(Some(
        StatementTemplate::new(INSERT_CITY)
            .bind("id", Param::string(id))
            .bind("bigId", big_id)
            .bind("stateId", state_id)
            .bind("name", name),
    ))
}

pub fn map_neighborhood(
    record: &Record,
    cities: &IdentityTable,
    ids: &dyn IdGenerator,
) -> PipelineResult<Option<StatementTemplate>> {
    if record.require("bairro_id")? == NULL_MARKER {
        tracing::debug!(line = record.line(), "Skipping neighborhood without id");
        return Ok(None);
    }

    let city_id = Param::string(cities.lookup(record.require("cidade_id")?)?);

    Ok(Some(
        StatementTemplate::new(INSERT_NEIGHBORHOOD)
            .bind("id", Param::string(ids.new_id()?))
            .bind("bigId", number_field(record, "bairro_id")?)
            .bind("cityId", city_id)
            .bind("name", string_field(record, "bairro")?),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::testing::SequentialIds;
    use crate::error::PipelineError;
    use crate::identity::{EntityKind, IdentityTables};
    use crate::mappers::testing::record;

    fn load_states(tables: &mut IdentityTables, ids: &SequentialIds) -> Vec<String> {
        [("São Paulo", "SP"), ("Rio de Janeiro", "RJ"), ("São Paulo", "SP")]
            .into_iter()
            .map(|(estado, uf)| {
                let rec = record(&[("estado", estado), ("uf", uf)]);
                map_state(&rec, &mut tables.states, ids).unwrap().render().unwrap()
            })
            .collect()
    }

    #[test]
    fn test_repeated_state_reuses_id() {
        let ids = SequentialIds::default();
        let mut tables = IdentityTables::new();

        let statements = load_states(&mut tables, &ids);

        assert_eq!(
            statements[0],
            "INSERT IGNORE INTO states (id, name, abbreviation) VALUES ('id-1', 'São Paulo', 'SP');"
        );
        assert_eq!(
            statements[1],
            "INSERT IGNORE INTO states (id, name, abbreviation) VALUES ('id-2', 'Rio de Janeiro', 'RJ');"
        );
        assert_eq!(statements[0], statements[2]);
        assert_eq!(tables.states.len(), 2);
    }

    #[test]
    fn test_city_resolves_state_id() {
        let ids = SequentialIds::default();
        let mut tables = IdentityTables::new();
        load_states(&mut tables, &ids);
        let sp = tables.states.lookup("SP").unwrap().to_string();

        let rec = record(&[("cidade_id", "3550308"), ("uf", "SP"), ("cidade", "São Paulo")]);
        let sql = map_city(&rec, &mut tables.cities, &tables.states, &ids)
            .unwrap()
            .unwrap()
            .render()
            .unwrap();

        assert_eq!(
            sql,
            format!(
                "INSERT IGNORE INTO cities (id, big_id, state_id, name) \
                 VALUES ('id-3', 3550308, '{}', 'São Paulo');",
                sp
            )
        );
        assert_eq!(tables.cities.lookup("3550308").unwrap(), "id-3");
    }

    #[test]
    fn test_null_city_is_skipped_without_mutation() {
        let ids = SequentialIds::default();
        let mut tables = IdentityTables::new();
        load_states(&mut tables, &ids);

        let rec = record(&[("cidade_id", "NULL"), ("uf", "SP"), ("cidade", "Desconhecida")]);
        let mapped = map_city(&rec, &mut tables.cities, &tables.states, &ids).unwrap();

        assert!(mapped.is_none());
        assert!(tables.cities.is_empty());
    }

    #[test]
    fn test_city_with_unknown_state_fails_without_mutation() {
        let ids = SequentialIds::default();
        let mut tables = IdentityTables::new();

        let rec = record(&[("cidade_id", "1"), ("uf", "SP"), ("cidade", "São Paulo")]);
        let err = map_city(&rec, &mut tables.cities, &tables.states, &ids).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::ReferentialLookup { kind: EntityKind::State, ref key } if key == "SP"
        ));
        assert!(tables.cities.is_empty());
    }

    #[test]
    fn test_neighborhood_resolves_city_id() {
        let ids = SequentialIds::default();
        let mut tables = IdentityTables::new();
        load_states(&mut tables, &ids);
        let city = record(&[("cidade_id", "10"), ("uf", "RJ"), ("cidade", "Niterói")]);
        map_city(&city, &mut tables.cities, &tables.states, &ids).unwrap();

        let rec = record(&[("bairro_id", "55"), ("cidade_id", "10"), ("bairro", "Icaraí")]);
        let sql = map_neighborhood(&rec, &tables.cities, &ids)
            .unwrap()
            .unwrap()
            .render()
            .unwrap();

        assert_eq!(
            sql,
            "INSERT IGNORE INTO neighborhoods (id, big_id, city_id, name) \
             VALUES ('id-4', 55, 'id-3', 'Icaraí');"
        );
    }

    #[test]
    fn test_neighborhood_skip_and_unknown_city() {
        let ids = SequentialIds::default();
        let tables = IdentityTables::new();

        let skipped = record(&[("bairro_id", "NULL"), ("cidade_id", "99"), ("bairro", "X")]);
        assert!(map_neighborhood(&skipped, &tables.cities, &ids).unwrap().is_none());

        let orphan = record(&[("bairro_id", "1"), ("cidade_id", "99"), ("bairro", "X")]);
        let err = map_neighborhood(&orphan, &tables.cities, &ids).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ReferentialLookup { kind: EntityKind::City, ref key } if key == "99"
        ));
    }
}
