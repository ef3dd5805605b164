//! Storage metadata for table-backed entities
//!
//! `Record` ties a core entity to its table: column order, row decoding and
//! parameter values. Typed `Column` constants drive the query builder.

use heroes_core::model::{Hero, Team};
use heroes_core_types::Sensitive;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};
use std::marker::PhantomData;

/// A column of entity `E`'s table
pub struct Column<E> {
    table: &'static str,
    name: &'static str,
    nullable: bool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Column<E> {
    pub const fn new(table: &'static str, name: &'static str, nullable: bool) -> Self {
        Self {
            table,
            name,
            nullable,
            _entity: PhantomData,
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// `table.column`
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.table, self.name)
    }
}

impl<E> Clone for Column<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Column<E> {}

impl<E> std::fmt::Debug for Column<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Column({}.{})", self.table, self.name)
    }
}

/// Any tracked entity, type-erased for the session's identity map
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Hero(Hero),
    Team(Team),
}

/// A persisted entity type
pub trait Record: Clone + Sized + 'static {
    const TABLE: &'static str;
    /// Non-key columns in insert/update order
    const COLUMNS: &'static [&'static str];

    fn primary_key() -> Column<Self>;

    fn id(&self) -> Option<i64>;

    /// Assign the storage-generated identity; only the session calls this
    fn set_id(&mut self, id: i64);

    /// Parameter values aligned with `COLUMNS`
    fn values(&self) -> Vec<Value>;

    /// Decode `id` at `offset` followed by `COLUMNS`
    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self>;

    /// Fill loaded collections after the row itself was read
    fn load_related(&mut self, _conn: &Connection) -> rusqlite::Result<()> {
        Ok(())
    }

    fn into_entity(self) -> Entity;
    fn from_entity(entity: &Entity) -> Option<&Self>;
    fn from_entity_mut(entity: &mut Entity) -> Option<&mut Self>;

    /// `table.id, table.col1, ...` for a SELECT list
    fn select_list() -> String {
        std::iter::once("id")
            .chain(Self::COLUMNS.iter().copied())
            .map(|c| format!("{}.{}", Self::TABLE, c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Number of columns `from_row` consumes
    fn width() -> usize {
        Self::COLUMNS.len() + 1
    }
}

/// Declares the foreign key from `Self` to `R`
pub trait Related<R: Record>: Record {
    fn foreign_key() -> Column<Self>;
}

pub mod hero {
    //! Columns of the `hero` table
    use super::Column;
    use heroes_core::model::Hero;

    pub const ID: Column<Hero> = Column::new("hero", "id", false);
    pub const NAME: Column<Hero> = Column::new("hero", "name", false);
    pub const SECRET_NAME: Column<Hero> = Column::new("hero", "secret_name", false);
    pub const AGE: Column<Hero> = Column::new("hero", "age", true);
    pub const TEAM_ID: Column<Hero> = Column::new("hero", "team_id", true);
}

pub mod team {
    //! Columns of the `team` table
    use super::Column;
    use heroes_core::model::Team;

    pub const ID: Column<Team> = Column::new("team", "id", false);
    pub const NAME: Column<Team> = Column::new("team", "name", false);
    pub const HEADQUARTERS: Column<Team> = Column::new("team", "headquarters", false);
}

impl Record for Hero {
    const TABLE: &'static str = "hero";
    const COLUMNS: &'static [&'static str] =
        &["name", "secret_name", "age", "team_id", "hashed_password"];

    fn primary_key() -> Column<Self> {
        hero::ID
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.secret_name.clone()),
            self.age.map_or(Value::Null, Value::Integer),
            self.team_id.map_or(Value::Null, Value::Integer),
            self.hashed_password
                .as_ref()
                .map_or(Value::Null, |h| Value::Text(h.expose().clone())),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        let hashed_password: Option<String> = row.get(offset + 5)?;
        Ok(Hero {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            secret_name: row.get(offset + 2)?,
            age: row.get(offset + 3)?,
            team_id: row.get(offset + 4)?,
            hashed_password: hashed_password.map(Sensitive::new),
        })
    }

    fn into_entity(self) -> Entity {
        Entity::Hero(self)
    }

    fn from_entity(entity: &Entity) -> Option<&Self> {
        match entity {
            Entity::Hero(h) => Some(h),
            Entity::Team(_) => None,
        }
    }

    fn from_entity_mut(entity: &mut Entity) -> Option<&mut Self> {
        match entity {
            Entity::Hero(h) => Some(h),
            Entity::Team(_) => None,
        }
    }
}

impl Record for Team {
    const TABLE: &'static str = "team";
    const COLUMNS: &'static [&'static str] = &["name", "headquarters"];

    fn primary_key() -> Column<Self> {
        team::ID
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.headquarters.clone()),
        ]
    }

    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Team {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            headquarters: row.get(offset + 2)?,
            heroes: Vec::new(),
        })
    }

    fn load_related(&mut self, conn: &Connection) -> rusqlite::Result<()> {
        let Some(id) = self.id else {
            self.heroes.clear();
            return Ok(());
        };
        let sql = format!(
            "SELECT {} FROM hero WHERE hero.team_id = ?1 ORDER BY hero.id",
            Hero::select_list()
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let heroes = stmt
            .query_map([id], |row| Hero::from_row(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        self.heroes = heroes;
        Ok(())
    }

    fn into_entity(self) -> Entity {
        Entity::Team(self)
    }

    fn from_entity(entity: &Entity) -> Option<&Self> {
        match entity {
            Entity::Team(t) => Some(t),
            Entity::Hero(_) => None,
        }
    }

    fn from_entity_mut(entity: &mut Entity) -> Option<&mut Self> {
        match entity {
            Entity::Team(t) => Some(t),
            Entity::Hero(_) => None,
        }
    }
}

impl Related<Team> for Hero {
    fn foreign_key() -> Column<Self> {
        hero::TEAM_ID
    }
}

/// `INSERT INTO t (c1, c2) VALUES (?1, ?2)`
pub(crate) fn insert_sql<E: Record>() -> String {
    let placeholders = (1..=E::COLUMNS.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        E::TABLE,
        E::COLUMNS.join(", "),
        placeholders
    )
}

/// `UPDATE t SET c1 = ?1, c2 = ?2 WHERE id = ?3`
pub(crate) fn update_sql<E: Record>() -> String {
    let assignments = E::COLUMNS
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ?{}", c, i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        E::TABLE,
        assignments,
        E::COLUMNS.len() + 1
    )
}

pub(crate) fn delete_sql<E: Record>() -> String {
    format!("DELETE FROM {} WHERE id = ?1", E::TABLE)
}

pub(crate) fn select_by_id_sql<E: Record>() -> String {
    format!(
        "SELECT {} FROM {} WHERE {}.id = ?1",
        E::select_list(),
        E::TABLE,
        E::TABLE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sql() {
        assert_eq!(
            insert_sql::<Team>(),
            "INSERT INTO team (name, headquarters) VALUES (?1, ?2)"
        );
    }

    #[test]
    fn test_update_sql_binds_id_last() {
        assert_eq!(
            update_sql::<Team>(),
            "UPDATE team SET name = ?1, headquarters = ?2 WHERE id = ?3"
        );
    }

    #[test]
    fn test_select_list_is_qualified() {
        assert_eq!(Team::select_list(), "team.id, team.name, team.headquarters");
        assert_eq!(Hero::width(), 6);
    }

    #[test]
    fn test_values_align_with_columns() {
        let hero = Hero::new("Deadpond", "Dive Wilson");
        assert_eq!(hero.values().len(), Hero::COLUMNS.len());
        assert_eq!(hero.values()[2], Value::Null);
    }

    #[test]
    fn test_entity_downcast() {
        let entity = Team::new("Z-Force", "Sister Margaret's Bar").into_entity();
        assert!(Team::from_entity(&entity).is_some());
        assert!(Hero::from_entity(&entity).is_none());
    }

    #[test]
    fn test_column_metadata() {
        assert_eq!(hero::AGE.qualified(), "hero.age");
        assert!(hero::AGE.is_nullable());
        assert!(!hero::NAME.is_nullable());
    }
}
