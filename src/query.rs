//! Fluent query builder for WowSQL tables.
//!
//! A builder accumulates filters, projection, ordering and pagination through
//! chained calls, then `execute()` consumes it, sends a single request and
//! maps the response into a [`ResultSet`]. Builders are single-owner values:
//! `execute()` takes `self`, so a builder cannot be reused after execution.

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::transport::{Transport, TransportResponse};

/// Endpoint accepting serialized query requests.
pub const QUERY_PATH: &str = "/api/v1/query";

/// Comparison operator of a single filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    In,
    IsNull,
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Like => "like",
            FilterOp::In => "in",
            FilterOp::IsNull => "is_null",
        };
        write!(f, "{}", s)
    }
}

/// One column comparison contributing to a query's filter set.
///
/// Multiple predicates on a builder are implicitly conjunctive; there is no
/// OR combinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

/// Sort specification. A builder carries at most one; the last `order_by`
/// call wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub column: String,
    pub desc: bool,
}

/// Which of insert/update/delete a builder represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MutationKind::Insert => "insert",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub kind: MutationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Wire shape of one query request. Field names are stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub table: String,
    /// `None` means all columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    pub filters: Vec<Predicate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation: Option<Mutation>,
}

/// Rows returned by a query, plus how many were returned (or affected, for
/// mutations). `count` says nothing about total server-side matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet {
    pub data: Vec<Map<String, Value>>,
    pub count: u64,
}

impl ResultSet {
    fn from_response(resp: TransportResponse) -> Result<Self> {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            data: Vec<Map<String, Value>>,
            count: Option<u64>,
        }

        let raw: Raw = serde_json::from_value(resp.body)?;
        let count = raw.count.unwrap_or(raw.data.len() as u64);
        Ok(Self {
            data: raw.data,
            count,
        })
    }
}

/// Chainable query builder scoped to one table.
///
/// # Example
/// ```no_run
/// # use wowsql::WowClient;
/// # async fn run(client: &WowClient) -> wowsql::Result<()> {
/// let active = client
///     .table("users")?
///     .select(["id", "name", "email"])
///     .eq("status", "active")
///     .limit(5)
///     .execute()
///     .await?;
/// println!("{} active users", active.count);
/// # Ok(())
/// # }
/// ```
///
/// Builders are not meant to be shared: chain on one owner, then hand the
/// builder to `execute()`.
pub struct QueryBuilder {
    transport: Arc<dyn Transport>,
    table: String,
    columns: Option<Vec<String>>,
    filters: Vec<Predicate>,
    order: Option<OrderSpec>,
    limit: Option<u32>,
    offset: Option<u32>,
    mutation: Option<Mutation>,
    full_table_override: bool,
}

impl std::fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.table)
            .field("columns", &self.columns)
            .field("filters", &self.filters)
            .field("order", &self.order)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("mutation", &self.mutation)
            .field("full_table_override", &self.full_table_override)
            .finish_non_exhaustive()
    }
}

impl QueryBuilder {
    pub(crate) fn new(transport: Arc<dyn Transport>, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        if table.trim().is_empty() {
            return Err(Error::InvalidQueryState(
                "table name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            transport,
            table,
            columns: None,
            filters: Vec::new(),
            order: None,
            limit: None,
            offset: None,
            mutation: None,
            full_table_override: false,
        })
    }

    /// Set the projected columns. Calling again replaces the previous
    /// projection (last call wins). `select(["*"])` or no call at all means
    /// all columns.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cols: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.columns = if cols.len() == 1 && cols[0] == "*" {
            None
        } else {
            Some(cols)
        };
        self
    }

    fn filter(mut self, column: &str, op: FilterOp, value: Value) -> Self {
        self.filters.push(Predicate {
            column: column.to_string(),
            op,
            value,
        });
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Eq, value.into())
    }

    pub fn neq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Neq, value.into())
    }

    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Gt, value.into())
    }

    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Gte, value.into())
    }

    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Lt, value.into())
    }

    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, FilterOp::Lte, value.into())
    }

    /// Pattern match using the backend's `%` wildcard convention. The pattern
    /// is passed through verbatim, never escaped or rewritten client-side.
    pub fn like(self, column: &str, pattern: &str) -> Self {
        self.filter(column, FilterOp::Like, Value::String(pattern.to_string()))
    }

    /// Membership filter. An empty value list is rejected rather than
    /// silently matching nothing.
    pub fn in_list(self, column: &str, values: Vec<Value>) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::InvalidPredicate(format!(
                "in filter on '{}' requires a non-empty value list",
                column
            )));
        }
        Ok(self.filter(column, FilterOp::In, Value::Array(values)))
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(column, FilterOp::IsNull, Value::Null)
    }

    /// Sort by one column. Only one order key is kept; the last call wins.
    pub fn order_by(mut self, column: &str, desc: bool) -> Self {
        self.order = Some(OrderSpec {
            column: column.to_string(),
            desc,
        });
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u32) -> Self {
        self.offset = Some(n);
        self
    }

    fn set_mutation(mut self, kind: MutationKind, payload: Option<Value>) -> Result<Self> {
        if let Some(existing) = &self.mutation {
            return Err(Error::InvalidQueryState(format!(
                "mutation kind already set to {}, cannot also set {}",
                existing.kind, kind
            )));
        }
        self.mutation = Some(Mutation { kind, payload });
        Ok(self)
    }

    /// Insert one record (a map of column to value) or a list of records.
    pub fn insert(self, record: impl Serialize) -> Result<Self> {
        let payload = serde_json::to_value(record)?;
        self.set_mutation(MutationKind::Insert, Some(payload))
    }

    /// Insert several records in one request. The payload reaches the wire
    /// as an array, one element per record.
    pub fn insert_many<T: Serialize>(self, records: Vec<T>) -> Result<Self> {
        let payload = serde_json::to_value(records)?;
        self.set_mutation(MutationKind::Insert, Some(payload))
    }

    /// Update matching rows with the given partial record. Requires at least
    /// one predicate at execution time unless [`allow_full_table`] was called.
    ///
    /// [`allow_full_table`]: QueryBuilder::allow_full_table
    pub fn update(self, partial: impl Serialize) -> Result<Self> {
        let payload = serde_json::to_value(partial)?;
        self.set_mutation(MutationKind::Update, Some(payload))
    }

    /// Delete matching rows. Requires at least one predicate at execution
    /// time unless [`allow_full_table`] was called.
    ///
    /// [`allow_full_table`]: QueryBuilder::allow_full_table
    pub fn delete(self) -> Result<Self> {
        self.set_mutation(MutationKind::Delete, None)
    }

    /// Explicitly permit an update or delete with no predicates, affecting
    /// every row in the table.
    pub fn allow_full_table(mut self) -> Self {
        self.full_table_override = true;
        self
    }

    /// Serialize the accumulated state into the wire request, validating the
    /// unsafe-mutation rule. Performs no network I/O.
    pub fn compile(&self) -> Result<QueryRequest> {
        if let Some(mutation) = &self.mutation {
            let needs_predicate = matches!(
                mutation.kind,
                MutationKind::Update | MutationKind::Delete
            );
            if needs_predicate && self.filters.is_empty() && !self.full_table_override {
                return Err(Error::UnsafeMutation(format!(
                    "{} on '{}' has no predicates; add a filter or call allow_full_table()",
                    mutation.kind, self.table
                )));
            }
        }

        Ok(QueryRequest {
            table: self.table.clone(),
            columns: self.columns.clone(),
            filters: self.filters.clone(),
            order_by: self.order.clone(),
            limit: self.limit,
            offset: self.offset,
            mutation: self.mutation.clone(),
        })
    }

    /// Execute the query. Consumes the builder; reads are idempotent, inserts
    /// are not (each execution creates new rows).
    pub async fn execute(self) -> Result<ResultSet> {
        let request = self.compile()?;
        debug!(table = %request.table, filters = request.filters.len(), "executing query");

        let body = serde_json::to_value(&request)?;
        let resp = self
            .transport
            .send(Method::POST, QUERY_PATH, &[], Some(body))
            .await?;
        ResultSet::from_response(resp)
    }
}
