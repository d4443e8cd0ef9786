use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::MailStore;
use super::attributes::{Item, from_item, s, to_item};
use crate::core::config::AppConfig;
use crate::core::keys::{
    INBOX_PK, USER_EMAIL_INDEX, connection_key, email_sk_prefix, inbox_mapping_sk, user_pk,
};
use crate::core::models::{Connection, Document, Email, Inbox, Typename, User};
use crate::errors::MailError;

/// Upper bound on rows returned by a mailbox listing.
pub const QUERY_LIMIT: usize = 1000;
const PAGE_SIZE: i32 = 100;

/// A key condition plus optional filter for [`DynamoMailStore::query`].
#[derive(Debug, Clone, Default)]
pub struct QueryExpression {
    pub condition: String,
    pub values: Vec<(String, AttributeValue)>,
    pub filter: Option<String>,
    pub names: Vec<(String, String)>,
    pub index: Option<String>,
}

#[derive(Clone)]
pub struct DynamoMailStore {
    client: Client,
    core_table: Option<String>,
    websocket_table: Option<String>,
}

impl DynamoMailStore {
    #[must_use]
    pub fn new(client: Client, core_table: Option<String>, websocket_table: Option<String>) -> Self {
        Self {
            client,
            core_table,
            websocket_table,
        }
    }

    /// Builds a client, honouring `CORE_TABLE_REGION` when the table lives
    /// outside the Lambda's region.
    pub async fn from_config(config: &AppConfig) -> Self {
        let shared = aws_config::from_env().load().await;
        let mut builder = aws_sdk_dynamodb::config::Builder::from(&shared);
        if let Some(region) = &config.core_table_region {
            builder = builder.region(aws_sdk_dynamodb::config::Region::new(region.clone()));
        }
        Self::new(
            Client::from_conf(builder.build()),
            config.core_table_name.clone(),
            config.websocket_table_name.clone(),
        )
    }

    fn core_table(&self) -> Result<&str, MailError> {
        self.core_table
            .as_deref()
            .ok_or_else(|| MailError::ConfigError("CORE_TABLE_NAME is not set".to_string()))
    }

    fn websocket_table(&self) -> Result<&str, MailError> {
        self.websocket_table
            .as_deref()
            .ok_or_else(|| MailError::ConfigError("WEBSOCKET_TABLE_NAME is not set".to_string()))
    }

    async fn put_row<T: Serialize + Sync>(&self, table: &str, row: &T) -> Result<(), MailError> {
        let item = to_item(row)?;
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| store_error("put_item", e))?;
        Ok(())
    }

    async fn get_row<T: DeserializeOwned>(
        &self,
        table: &str,
        key: Item,
    ) -> Result<Option<T>, MailError> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| store_error("get_item", e))?;

        output.item().map(from_item).transpose()
    }

    /// Runs a query, following `LastEvaluatedKey` until `limit` rows are read.
    ///
    /// # Errors
    ///
    /// Returns an error if a page fails or a row cannot be decoded.
    pub async fn query<T: DeserializeOwned>(
        &self,
        expression: &QueryExpression,
        limit: usize,
    ) -> Result<Vec<T>, MailError> {
        let table = self.core_table()?;
        let mut rows: Vec<T> = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let mut request = self
                .client
                .query()
                .table_name(table)
                .key_condition_expression(&expression.condition)
                .limit(PAGE_SIZE)
                .set_exclusive_start_key(start_key.take());

            for (name, value) in &expression.values {
                request = request.expression_attribute_values(name, value.clone());
            }
            for (placeholder, name) in &expression.names {
                request = request.expression_attribute_names(placeholder, name);
            }
            if let Some(filter) = &expression.filter {
                request = request.filter_expression(filter);
            }
            if let Some(index) = &expression.index {
                request = request.index_name(index);
            }

            let output = request
                .send()
                .await
                .map_err(|e| store_error("query", e))?;

            for item in output.items() {
                rows.push(from_item(item)?);
            }

            if rows.len() >= limit {
                rows.truncate(limit);
                break;
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        debug!(rows = rows.len(), condition = %expression.condition, "Query completed");
        Ok(rows)
    }

    fn core_key(pk: &str, sk: &str) -> Item {
        Item::from([("pk".to_string(), s(pk)), ("sk".to_string(), s(sk))])
    }

    fn connection_item_key(inbox_id: &str) -> Item {
        Item::from([("connectionId".to_string(), s(connection_key(inbox_id)))])
    }
}

fn store_error(operation: &str, error: impl std::error::Error + 'static) -> MailError {
    MailError::StoreError(format!(
        "{operation}: {}",
        aws_sdk_dynamodb::error::DisplayErrorContext(error)
    ))
}

#[async_trait]
impl MailStore for DynamoMailStore {
    async fn put_user(&self, user: &User) -> Result<(), MailError> {
        self.put_row(self.core_table()?, user).await
    }

    async fn put_inbox(&self, inbox: &Inbox) -> Result<(), MailError> {
        self.put_row(self.core_table()?, inbox).await
    }

    async fn put_email(&self, email: &Email) -> Result<(), MailError> {
        self.put_row(self.core_table()?, email).await?;
        info!(pk = %email.pk, sk = %email.sk, "Email row saved");
        Ok(())
    }

    async fn put_document(&self, document: &Document) -> Result<(), MailError> {
        self.put_row(self.core_table()?, document).await
    }

    async fn get_inbox(&self, inbox_id: &str) -> Result<Option<Inbox>, MailError> {
        self.get_row(
            self.core_table()?,
            Self::core_key(INBOX_PK, &inbox_mapping_sk(inbox_id)),
        )
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, MailError> {
        let expression = QueryExpression {
            condition: "email = :email".to_string(),
            values: vec![
                (":email".to_string(), s(email)),
                (":typename".to_string(), s("User")),
            ],
            filter: Some("typename = :typename".to_string()),
            index: Some(USER_EMAIL_INDEX.to_string()),
            ..QueryExpression::default()
        };
        let users: Vec<User> = self.query(&expression, 1).await?;
        Ok(users.into_iter().find(|u| u.typename == Typename::User))
    }

    async fn list_emails(&self, inbox_id: &str) -> Result<Vec<Email>, MailError> {
        let expression = QueryExpression {
            condition: "pk = :pk AND begins_with(sk, :sk)".to_string(),
            values: vec![
                (":pk".to_string(), s(user_pk(inbox_id))),
                (":sk".to_string(), s(email_sk_prefix(None))),
            ],
            ..QueryExpression::default()
        };
        self.query(&expression, QUERY_LIMIT).await
    }

    async fn set_read(&self, inbox_id: &str, sk: &str, read: bool) -> Result<(), MailError> {
        self.client
            .update_item()
            .table_name(self.core_table()?)
            .set_key(Some(Self::core_key(&user_pk(inbox_id), sk)))
            .update_expression("SET #read = :read, #updatedAt = :updatedAt")
            .condition_expression("attribute_exists(pk)")
            .expression_attribute_names("#read", "read")
            .expression_attribute_names("#updatedAt", "updatedAt")
            .expression_attribute_values(":read", AttributeValue::Bool(read))
            .expression_attribute_values(":updatedAt", s(Utc::now().to_rfc3339()))
            .send()
            .await
            .map_err(|e| store_error("update_item", e))?;
        Ok(())
    }

    async fn delete_email(&self, inbox_id: &str, sk: &str) -> Result<(), MailError> {
        self.client
            .delete_item()
            .table_name(self.core_table()?)
            .set_key(Some(Self::core_key(&user_pk(inbox_id), sk)))
            .send()
            .await
            .map_err(|e| store_error("delete_item", e))?;
        Ok(())
    }

    async fn get_connection(&self, inbox_id: &str) -> Result<Option<Connection>, MailError> {
        self.get_row(self.websocket_table()?, Self::connection_item_key(inbox_id))
            .await
    }

    async fn put_connection(&self, connection: &Connection) -> Result<(), MailError> {
        self.put_row(self.websocket_table()?, connection).await
    }

    async fn delete_connection(&self, inbox_id: &str) -> Result<(), MailError> {
        self.client
            .delete_item()
            .table_name(self.websocket_table()?)
            .set_key(Some(Self::connection_item_key(inbox_id)))
            .send()
            .await
            .map_err(|e| store_error("delete_item", e))?;
        Ok(())
    }
}
