//! Users mapper: hashes the plaintext password before binding it.

use crate::capability::Capabilities;
use crate::decoder::Record;
use crate::error::PipelineResult;
use crate::mappers::string_field;
use crate::statement::{Param, StatementTemplate};

const INSERT_USER: &str = "INSERT IGNORE INTO users (id, name, email, password, role) \
     VALUES (:id, :name, :email, :password, :role);";

/// The plaintext `senha` column never reaches the output; only its hash does.
pub async fn map_user(record: &Record, caps: &Capabilities) -> PipelineResult<StatementTemplate> {
    let password = caps.hash_password(record.require("senha")?).await?;

    Ok(StatementTemplate::new(INSERT_USER)
        .bind("id", Param::string(caps.ids.new_id()?))
        .bind("name", string_field(record, "nome")?)
        .bind("email", string_field(record, "email")?)
        .bind("password", Param::string(password))
        .bind("role", string_field(record, "tipo")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::testing::capabilities;
    use crate::error::{CapabilityError, PipelineError};
    use crate::mappers::testing::record;
    use std::sync::Arc;

    fn user_record() -> Record {
        record(&[
            ("nome", "Ana"),
            ("email", "ana@example.com"),
            ("senha", "segredo"),
            ("tipo", "ADMIN"),
        ])
    }

    #[tokio::test]
    async fn test_password_is_hashed() {
        let sql = map_user(&user_record(), &capabilities())
            .await
            .unwrap()
            .render()
            .unwrap();

        assert_eq!(
            sql,
            "INSERT IGNORE INTO users (id, name, email, password, role) \
             VALUES ('id-1', 'Ana', 'ana@example.com', 'hashed:segredo', 'ADMIN');"
        );
        assert!(!sql.contains("'segredo'"));
    }

    #[tokio::test]
    async fn test_hashing_failure_aborts() {
        let caps = Capabilities {
            hasher: Arc::new(|_: &str| -> Result<String, CapabilityError> {
                Err(CapabilityError::Hashing("no entropy".to_string()))
            }),
            ..capabilities()
        };

        let err = map_user(&user_record(), &caps).await.unwrap_err();
        assert!(matches!(err, PipelineError::Capability(CapabilityError::Hashing(_))));
    }
}
