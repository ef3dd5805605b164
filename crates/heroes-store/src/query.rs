//! Query builder
//!
//! `Select<E>` reads one entity type; `JoinSelect<E, R>` adds the declared
//! relation. Building performs no I/O. Every terminal (`all`, `first`,
//! `one`, `count`) executes afresh, so one query value can be re-run.
//!
//! ```no_run
//! # use heroes_store::{db::{Engine, EngineOptions}, query::Select, record::hero};
//! # use heroes_core::Hero;
//! # fn main() -> heroes_store::Result<()> {
//! let engine = Engine::open_in_memory(EngineOptions::default())?;
//! engine.ensure_schema()?;
//! let session = engine.session()?;
//! let heroes = Select::<Hero>::new()
//!     .filter(hero::AGE.in_range(35..40))
//!     .all(&session)?;
//! # Ok(()) }
//! ```

#![allow(clippy::result_large_err)]

use crate::errors::{invalid_query, sqlite_op, Result};
use crate::record::{Column, Record, Related};
use crate::session::Session;
use heroes_core::errors::{ExError, ExErrorKind};
use rusqlite::types::Value;
use std::marker::PhantomData;
use std::ops::Range;

/// Comparison operator of a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    IsNull,
    IsNotNull,
    /// Null-safe inequality (`IS NOT`)
    IsDistinct,
}

impl CmpOp {
    fn sql(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::IsNull => "IS NULL",
            CmpOp::IsNotNull => "IS NOT NULL",
            CmpOp::IsDistinct => "IS NOT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// How unmatched left rows are treated by a join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Keep left rows without a match (`LEFT OUTER JOIN`)
    LeftOuter,
    /// Drop left rows without a match
    Inner,
}

/// Values usable on either side of `=`/`<>`, including `None`
pub trait IntoSqlValue {
    fn into_sql_value(self) -> Value;
}

/// Non-null values usable in ordering comparisons
pub trait SqlScalar: IntoSqlValue {}

impl IntoSqlValue for i64 {
    fn into_sql_value(self) -> Value {
        Value::Integer(self)
    }
}

impl IntoSqlValue for i32 {
    fn into_sql_value(self) -> Value {
        Value::Integer(i64::from(self))
    }
}

impl IntoSqlValue for &str {
    fn into_sql_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl IntoSqlValue for String {
    fn into_sql_value(self) -> Value {
        Value::Text(self)
    }
}

impl<T: SqlScalar> IntoSqlValue for Option<T> {
    fn into_sql_value(self) -> Value {
        self.map_or(Value::Null, IntoSqlValue::into_sql_value)
    }
}

impl SqlScalar for i64 {}
impl SqlScalar for i32 {}
impl SqlScalar for &str {}
impl SqlScalar for String {}

/// One bound comparison against a column
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    table: &'static str,
    column: &'static str,
    op: CmpOp,
    value: Option<Value>,
}

impl Predicate {
    pub fn op(&self) -> CmpOp {
        self.op
    }

    pub fn and(self, other: impl Into<Condition>) -> Condition {
        Condition::from(self).and(other)
    }

    fn render(&self, params: &mut Vec<Value>) -> String {
        match &self.value {
            Some(value) => {
                params.push(value.clone());
                format!(
                    "{}.{} {} ?{}",
                    self.table,
                    self.column,
                    self.op.sql(),
                    params.len()
                )
            }
            None => format!("{}.{} {}", self.table, self.column, self.op.sql()),
        }
    }
}

/// Conjunction of predicates
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Condition {
    predicates: Vec<Predicate>,
}

impl Condition {
    pub fn and(mut self, other: impl Into<Condition>) -> Condition {
        self.predicates.extend(other.into().predicates);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }
}

impl From<Predicate> for Condition {
    fn from(predicate: Predicate) -> Self {
        Self {
            predicates: vec![predicate],
        }
    }
}

impl<E> Column<E> {
    fn compare(self, op: CmpOp, value: Value) -> Predicate {
        Predicate {
            table: self.table(),
            column: self.name(),
            op,
            value: Some(value),
        }
    }

    fn unary(self, op: CmpOp) -> Predicate {
        Predicate {
            table: self.table(),
            column: self.name(),
            op,
            value: None,
        }
    }

    /// Equality; comparing with `None` becomes `IS NULL`
    pub fn eq(self, value: impl IntoSqlValue) -> Predicate {
        match value.into_sql_value() {
            Value::Null => self.unary(CmpOp::IsNull),
            v => self.compare(CmpOp::Eq, v),
        }
    }

    /// Inequality; comparing with `None` becomes `IS NOT NULL`
    ///
    /// Like SQL, `ne(x)` does not match rows where the column is null.
    /// Use `distinct_from` to keep them.
    pub fn ne(self, value: impl IntoSqlValue) -> Predicate {
        match value.into_sql_value() {
            Value::Null => self.unary(CmpOp::IsNotNull),
            v => self.compare(CmpOp::Ne, v),
        }
    }

    /// Inequality that treats null as a distinct value, so null rows match
    pub fn distinct_from(self, value: impl IntoSqlValue) -> Predicate {
        match value.into_sql_value() {
            Value::Null => self.unary(CmpOp::IsNotNull),
            v => self.compare(CmpOp::IsDistinct, v),
        }
    }

    pub fn lt(self, value: impl SqlScalar) -> Predicate {
        self.compare(CmpOp::Lt, value.into_sql_value())
    }

    pub fn le(self, value: impl SqlScalar) -> Predicate {
        self.compare(CmpOp::Le, value.into_sql_value())
    }

    pub fn gt(self, value: impl SqlScalar) -> Predicate {
        self.compare(CmpOp::Gt, value.into_sql_value())
    }

    pub fn ge(self, value: impl SqlScalar) -> Predicate {
        self.compare(CmpOp::Ge, value.into_sql_value())
    }

    pub fn is_null(self) -> Predicate {
        self.unary(CmpOp::IsNull)
    }

    pub fn is_not_null(self) -> Predicate {
        self.unary(CmpOp::IsNotNull)
    }

    /// Half-open range `[start, end)`; null never matches
    pub fn in_range(self, range: Range<i64>) -> Condition {
        self.ge(range.start).and(self.lt(range.end))
    }
}

#[derive(Debug, Clone)]
struct OrderTerm {
    table: &'static str,
    column: &'static str,
    order: Order,
}

/// Clauses shared by single-table and joined selects
#[derive(Debug, Clone, Default)]
struct Clauses {
    condition: Condition,
    order: Vec<OrderTerm>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl Clauses {
    fn order_by<T>(&mut self, column: Column<T>, order: Order) {
        self.order.push(OrderTerm {
            table: column.table(),
            column: column.name(),
            order,
        });
    }

    fn check_tables(&self, tables: &[&'static str]) -> Result<()> {
        let unknown = self
            .condition
            .predicates
            .iter()
            .map(|p| p.table)
            .chain(self.order.iter().map(|o| o.table))
            .find(|t| !tables.contains(t));
        match unknown {
            Some(table) => Err(invalid_query(format!(
                "table '{}' is not part of this query (selecting from {})",
                table,
                tables.join(", ")
            ))),
            None => Ok(()),
        }
    }

    /// Render `SELECT <list> FROM <from> WHERE ... ORDER BY ... LIMIT ... OFFSET ...`
    fn render(&self, select_list: &str, from: &str, primary_key: &str) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let mut sql = format!("SELECT {} FROM {}", select_list, from);

        if !self.condition.predicates.is_empty() {
            let clauses = self
                .condition
                .predicates
                .iter()
                .map(|p| p.render(&mut params))
                .collect::<Vec<_>>();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let paginated = self.limit.is_some() || self.offset.is_some();
        if !self.order.is_empty() {
            let terms = self
                .order
                .iter()
                .map(|o| {
                    let dir = match o.order {
                        Order::Asc => "ASC",
                        Order::Desc => "DESC",
                    };
                    format!("{}.{} {}", o.table, o.column, dir)
                })
                .collect::<Vec<_>>();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        } else if paginated {
            sql.push_str(&format!(" ORDER BY {} ASC", primary_key));
        }

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset))
            }
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        (sql, params)
    }
}

/// Query over one entity type
pub struct Select<E: Record> {
    clauses: Clauses,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Record> Clone for Select<E> {
    fn clone(&self) -> Self {
        Self {
            clauses: self.clauses.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Record> std::fmt::Debug for Select<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Select").field("sql", &self.to_sql()).finish()
    }
}

impl<E: Record> Default for Select<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Record> Select<E> {
    pub fn new() -> Self {
        Self {
            clauses: Clauses::default(),
            _entity: PhantomData,
        }
    }

    /// Add predicates; repeated calls combine with AND
    pub fn filter(mut self, condition: impl Into<Condition>) -> Self {
        self.clauses.condition = std::mem::take(&mut self.clauses.condition).and(condition);
        self
    }

    /// Add every predicate of an iterator, combined with AND
    pub fn filter_all<I>(self, conditions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Condition>,
    {
        conditions.into_iter().fold(self, |query, c| query.filter(c))
    }

    pub fn order_by(mut self, column: Column<E>, order: Order) -> Self {
        self.clauses.order_by(column, order);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.clauses.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.clauses.offset = Some(offset);
        self
    }

    /// Join the related entity through its foreign key
    pub fn join<R: Record>(self, kind: JoinKind) -> JoinSelect<E, R>
    where
        E: Related<R>,
    {
        JoinSelect {
            clauses: self.clauses,
            kind,
            _entities: PhantomData,
        }
    }

    pub fn to_sql(&self) -> String {
        self.render().0
    }

    fn render(&self) -> (String, Vec<Value>) {
        self.clauses.render(
            &E::select_list(),
            E::TABLE,
            &E::primary_key().qualified(),
        )
    }

    fn fetch(&self, session: &Session<'_>) -> Result<Vec<E>> {
        self.clauses.check_tables(&[E::TABLE])?;
        let (sql, params) = self.render();
        session.log_sql(&sql);
        let mut stmt = session
            .connection()
            .prepare(&sql)
            .map_err(sqlite_op("select"))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                E::from_row(row, 0)
            })
            .map_err(sqlite_op("select"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(sqlite_op("select"))?;
        Ok(rows)
    }

    /// Materialize every matching row in storage order
    pub fn all(&self, session: &Session<'_>) -> Result<Vec<E>> {
        self.fetch(session)
    }

    /// First matching row, if any
    pub fn first(&self, session: &Session<'_>) -> Result<Option<E>> {
        Ok(self.clone().limit(1).fetch(session)?.into_iter().next())
    }

    /// Exactly one matching row
    ///
    /// Zero rows is `NotFound`; more than one is `ConstraintViolation`.
    pub fn one(&self, session: &Session<'_>) -> Result<E> {
        let cap = self.clauses.limit.map_or(2, |l| l.min(2));
        let mut rows = self.clone().limit(cap).fetch(session)?;
        match rows.len() {
            0 => Err(ExError::new(ExErrorKind::NotFound)
                .with_op("select_one")
                .with_entity(E::TABLE)
                .with_message("No row matched the query")),
            1 => Ok(rows.remove(0)),
            _ => Err(ExError::new(ExErrorKind::ConstraintViolation)
                .with_op("select_one")
                .with_entity(E::TABLE)
                .with_message("Multiple rows matched a query expecting one")),
        }
    }

    pub fn count(&self, session: &Session<'_>) -> Result<u64> {
        self.clauses.check_tables(&[E::TABLE])?;
        let (inner, params) = self.render();
        count_rows(session, &inner, &params)
    }
}

/// Query over an entity joined with its related entity
pub struct JoinSelect<E: Record, R: Record> {
    clauses: Clauses,
    kind: JoinKind,
    _entities: PhantomData<fn() -> (E, R)>,
}

impl<E: Related<R>, R: Record> Clone for JoinSelect<E, R> {
    fn clone(&self) -> Self {
        Self {
            clauses: self.clauses.clone(),
            kind: self.kind,
            _entities: PhantomData,
        }
    }
}

impl<E: Related<R>, R: Record> JoinSelect<E, R> {
    /// Predicates may reference either table
    pub fn filter(mut self, condition: impl Into<Condition>) -> Self {
        self.clauses.condition = std::mem::take(&mut self.clauses.condition).and(condition);
        self
    }

    /// Add every predicate of an iterator, combined with AND
    pub fn filter_all<I>(self, conditions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Condition>,
    {
        conditions.into_iter().fold(self, |query, c| query.filter(c))
    }

    pub fn order_by<T>(mut self, column: Column<T>, order: Order) -> Self {
        self.clauses.order_by(column, order);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.clauses.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.clauses.offset = Some(offset);
        self
    }

    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    pub fn to_sql(&self) -> String {
        self.render().0
    }

    fn from_clause(&self) -> String {
        let join = match self.kind {
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
            JoinKind::Inner => "INNER JOIN",
        };
        format!(
            "{} {} {} ON {} = {}",
            E::TABLE,
            join,
            R::TABLE,
            E::foreign_key().qualified(),
            R::primary_key().qualified()
        )
    }

    fn render(&self) -> (String, Vec<Value>) {
        let select_list = format!("{}, {}", E::select_list(), R::select_list());
        self.clauses.render(
            &select_list,
            &self.from_clause(),
            &E::primary_key().qualified(),
        )
    }

    fn fetch(&self, session: &Session<'_>) -> Result<Vec<(E, Option<R>)>> {
        self.clauses.check_tables(&[E::TABLE, R::TABLE])?;
        let (sql, params) = self.render();
        session.log_sql(&sql);
        let mut stmt = session
            .connection()
            .prepare(&sql)
            .map_err(sqlite_op("select_join"))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), |row| {
                let left = E::from_row(row, 0)?;
                let right_id: Option<i64> = row.get(E::width())?;
                let right = match right_id {
                    Some(_) => Some(R::from_row(row, E::width())?),
                    None => None,
                };
                Ok((left, right))
            })
            .map_err(sqlite_op("select_join"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(sqlite_op("select_join"))?;
        Ok(rows)
    }

    /// Rows of `(left, right)`; `right` is `None` only for outer joins
    pub fn all(&self, session: &Session<'_>) -> Result<Vec<(E, Option<R>)>> {
        self.fetch(session)
    }

    pub fn first(&self, session: &Session<'_>) -> Result<Option<(E, Option<R>)>> {
        Ok(self.clone().limit(1).fetch(session)?.into_iter().next())
    }

    pub fn count(&self, session: &Session<'_>) -> Result<u64> {
        self.clauses.check_tables(&[E::TABLE, R::TABLE])?;
        let (inner, params) = self.render();
        count_rows(session, &inner, &params)
    }
}

fn count_rows(session: &Session<'_>, inner: &str, params: &[Value]) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM ({})", inner);
    session.log_sql(&sql);
    let count: i64 = session
        .connection()
        .query_row(&sql, rusqlite::params_from_iter(params.iter()), |row| {
            row.get(0)
        })
        .map_err(sqlite_op("count"))?;
    Ok(u64::try_from(count).unwrap_or_default())
}
