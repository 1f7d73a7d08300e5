use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySql, MySqlConnection};
use sqlx::{Connection, QueryBuilder};
use tracing::{info, instrument};

use crate::config::DatabaseConfig;
use crate::db::{self, bind_value, frame_rows, SqlValue, MAX_PLACEHOLDERS};
use crate::error::{PipelineError, Result};
use crate::identifiers::{ServiceCode, SqlIdentifier};
use crate::schema::ColumnTypeMap;
use crate::status::StatusLog;

const ROUTE_NAME: &str = "route_name";
const ROUTE_LINK: &str = "route_link";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Table that receives every combined row.
    pub generic_table: String,
    /// Rows per multi-row `INSERT`, capped by the placeholder limit.
    pub insert_batch_rows: usize,
    pub route_name_column: String,
    pub route_link_column: String,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            generic_table: "bus_routes".to_string(),
            insert_batch_rows: 500,
            route_name_column: ROUTE_NAME.to_string(),
            route_link_column: ROUTE_LINK.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Skipped,
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub status: LoadStatus,
    pub generic_table: String,
    pub routes_table: Option<String>,
    pub routes_table_created: bool,
    pub generic_rows_committed: usize,
    pub route_rows_committed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoadSummary {
    pub fn skipped(generic_table: &str) -> Self {
        Self {
            status: LoadStatus::Skipped,
            generic_table: generic_table.to_string(),
            routes_table: None,
            routes_table_created: false,
            generic_rows_committed: 0,
            route_rows_committed: 0,
            error: None,
        }
    }
}

/// Writes the combined table into the generic table and its route projection
/// into `{code}_routes`, committing after each table. A failure in the second
/// insert leaves the first commit in place.
#[derive(Debug, Clone)]
pub struct Loader {
    database: DatabaseConfig,
    settings: LoaderSettings,
}

impl Loader {
    pub fn new(database: DatabaseConfig, settings: LoaderSettings) -> Self {
        Self { database, settings }
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    #[instrument(skip_all, fields(service = %service))]
    pub async fn load(
        &self,
        service: &ServiceCode,
        df: &DataFrame,
        mapping: &ColumnTypeMap,
        log: &mut StatusLog,
    ) -> LoadSummary {
        let mut summary = LoadSummary {
            routes_table: Some(service.routes_table().to_string()),
            ..LoadSummary::skipped(&self.settings.generic_table)
        };

        match self.load_tables(service, df, mapping, &mut summary, log).await {
            Ok(()) => {
                summary.status = LoadStatus::Success;
                log.success("Data inserted successfully into MySQL database");
            }
            Err(err) => {
                summary.status = LoadStatus::Failed;
                log.error(format!("Error with MySQL: {err}"));
                summary.error = Some(err.to_string());
            }
        }

        summary
    }

    async fn load_tables(
        &self,
        service: &ServiceCode,
        df: &DataFrame,
        mapping: &ColumnTypeMap,
        summary: &mut LoadSummary,
        log: &mut StatusLog,
    ) -> Result<()> {
        let generic_table = SqlIdentifier::new(&self.settings.generic_table)?;
        let routes_table = service.routes_table();

        let create_generic = mapping.create_table_sql(&generic_table)?;
        let generic_columns = df
            .get_column_names()
            .into_iter()
            .map(|name| SqlIdentifier::new(name.as_str()))
            .collect::<Result<Vec<_>>>()?;
        let route_columns = vec![
            SqlIdentifier::new(ROUTE_NAME)?,
            SqlIdentifier::new(ROUTE_LINK)?,
        ];

        let routes = self.route_projection(df)?;
        let generic_rows = frame_rows(df)?;
        let route_rows = frame_rows(&routes)?;

        let mut conn = db::connect(&self.database).await?;

        summary.routes_table_created = ensure_routes_table(&mut conn, &routes_table, log).await?;

        sqlx::query(&create_generic)
            .execute(&mut conn)
            .await
            .map_err(|source| PipelineError::CreateTable {
                table: generic_table.to_string(),
                source,
            })?;

        summary.generic_rows_committed = insert_rows(
            &mut conn,
            &generic_table,
            &generic_columns,
            generic_rows,
            self.settings.insert_batch_rows,
        )
        .await?;
        info!(
            table = %generic_table,
            rows = summary.generic_rows_committed,
            "committed combined rows"
        );

        summary.route_rows_committed = insert_rows(
            &mut conn,
            &routes_table,
            &route_columns,
            route_rows,
            self.settings.insert_batch_rows,
        )
        .await?;
        info!(
            table = %routes_table,
            rows = summary.route_rows_committed,
            "committed route rows"
        );

        conn.close().await?;
        Ok(())
    }

    /// The `(route_name, route_link)` columns destined for the service table.
    pub fn route_projection(&self, df: &DataFrame) -> Result<DataFrame> {
        for column in [
            &self.settings.route_name_column,
            &self.settings.route_link_column,
        ] {
            if df.column(column).is_err() {
                return Err(PipelineError::MissingColumn(column.clone()));
            }
        }

        Ok(df.select([
            self.settings.route_name_column.as_str(),
            self.settings.route_link_column.as_str(),
        ])?)
    }
}

pub fn routes_table_sql(table: &SqlIdentifier) -> String {
    format!(
        "CREATE TABLE {} (route_id INT AUTO_INCREMENT PRIMARY KEY, {ROUTE_NAME} VARCHAR(255), {ROUTE_LINK} VARCHAR(255))",
        table.quoted()
    )
}

pub fn insert_prefix(table: &SqlIdentifier, columns: &[SqlIdentifier]) -> String {
    let column_list = columns
        .iter()
        .map(SqlIdentifier::quoted)
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {} ({}) ", table.quoted(), column_list)
}

/// Rows per statement: the configured batch size, kept under the bind limit.
pub fn rows_per_statement(batch_rows: usize, column_count: usize) -> usize {
    let limit = (MAX_PLACEHOLDERS / column_count.max(1)).max(1);
    batch_rows.clamp(1, limit)
}

/// Probes the service table and creates it when MySQL reports it missing.
/// Returns whether the table was created.
async fn ensure_routes_table(
    conn: &mut MySqlConnection,
    table: &SqlIdentifier,
    log: &mut StatusLog,
) -> Result<bool> {
    let probe = format!("SELECT 1 FROM {} LIMIT 1", table.quoted());

    match sqlx::query(&probe).fetch_optional(&mut *conn).await {
        Ok(_) => Ok(false),
        Err(err) if db::is_missing_table(&err) => {
            log.info(format!("Table {table} does not exist. Creating it..."));
            sqlx::query(&routes_table_sql(table))
                .execute(&mut *conn)
                .await
                .map_err(|source| PipelineError::CreateTable {
                    table: table.to_string(),
                    source,
                })?;
            log.success(format!("Table {table} created successfully."));
            Ok(true)
        }
        Err(source) => Err(PipelineError::SchemaProbe {
            table: table.to_string(),
            source,
        }),
    }
}

/// Inserts all rows inside one transaction and commits it.
async fn insert_rows(
    conn: &mut MySqlConnection,
    table: &SqlIdentifier,
    columns: &[SqlIdentifier],
    rows: Vec<Vec<SqlValue>>,
    batch_rows: usize,
) -> Result<usize> {
    let insert_error = |source: sqlx::Error| PipelineError::Insert {
        table: table.to_string(),
        source,
    };

    let total = rows.len();
    if total == 0 {
        return Ok(0);
    }

    let prefix = insert_prefix(table, columns);
    let chunk_len = rows_per_statement(batch_rows, columns.len());

    let mut tx = conn.begin().await.map_err(insert_error)?;
    let mut rows = rows.into_iter().peekable();
    while rows.peek().is_some() {
        let chunk: Vec<Vec<SqlValue>> = rows.by_ref().take(chunk_len).collect();
        let mut builder: QueryBuilder<'_, MySql> = QueryBuilder::new(prefix.as_str());
        builder.push_values(chunk, |mut row, values| {
            for value in values {
                bind_value(&mut row, value);
            }
        });
        builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(insert_error)?;
    }
    tx.commit().await.map_err(insert_error)?;

    Ok(total)
}
