//! SQLite store adapter.
//!
//! Every unit of work runs inside an `IMMEDIATE` transaction, so the write
//! lock is taken up front and two buyers of the same listing are serialized
//! by the database. Money is stored as decimal text, timestamps as RFC 3339.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params, params_from_iter};
use rust_decimal::Decimal;

use crate::domain::category::Category;
use crate::domain::error::{Entity, MarketError};
use crate::domain::history::{HistoryFilter, TransferRecord};
use crate::domain::listing::{Listing, ListingCriteria};
use crate::domain::player::Player;
use crate::domain::team::{RosterCounts, Team};
use crate::domain::{ListingId, PlayerId, TeamId, TransferId, UserId};
use crate::ports::config_port::ConfigPort;
use crate::ports::search_port::ListingSearchPort;
use crate::ports::store_port::{StorePort, UnitOfWork};

const TEAM_COLUMNS: &str =
    "id, name, country, owner_id, budget, value, goalkeepers, defenders, midfielders, forwards";
const PLAYER_COLUMNS: &str = "id, first_name, last_name, country, age, category, price, team_id";
const LISTING_COLUMNS: &str = "id, player_id, asking_price, listed_at";
const HISTORY_COLUMNS: &str =
    "id, player_id, sell_price, selling_team_id, buying_team_id, transferred_at";

#[derive(Clone)]
pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, MarketError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| MarketError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = positive(config, "pool_size", 4)?;
        let busy_timeout = positive(config, "busy_timeout_ms", 5_000)?;
        let connection_timeout = positive(config, "connection_timeout_ms", 5_000)?;

        Self::open(
            &db_path,
            pool_size,
            Duration::from_millis(u64::from(busy_timeout)),
            Duration::from_millis(u64::from(connection_timeout)),
        )
    }

    pub fn open(
        db_path: &str,
        pool_size: u32,
        busy_timeout: Duration,
        connection_timeout: Duration,
    ) -> Result<Self, MarketError> {
        let manager = SqliteConnectionManager::file(db_path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        });
        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_timeout(connection_timeout)
            .build(manager)
            .map_err(|e: r2d2::Error| MarketError::storage(e))?;

        tracing::debug!(db_path, pool_size, "sqlite pool opened");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, MarketError> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| MarketError::storage(e))?;

        Ok(Self { pool })
    }

    fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, MarketError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| MarketError::storage(e))
    }

    pub fn initialize_schema(&self) -> Result<(), MarketError> {
        let conn = self.connection()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                country TEXT NOT NULL,
                owner_id INTEGER UNIQUE,
                budget TEXT NOT NULL,
                value TEXT NOT NULL,
                goalkeepers INTEGER NOT NULL DEFAULT 0,
                defenders INTEGER NOT NULL DEFAULT 0,
                midfielders INTEGER NOT NULL DEFAULT 0,
                forwards INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS players (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                country TEXT NOT NULL,
                age INTEGER NOT NULL,
                category TEXT NOT NULL,
                price TEXT NOT NULL,
                team_id INTEGER REFERENCES teams(id)
            );
            CREATE INDEX IF NOT EXISTS idx_players_team ON players(team_id);
            CREATE TABLE IF NOT EXISTS listings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player_id INTEGER NOT NULL UNIQUE REFERENCES players(id),
                asking_price TEXT NOT NULL,
                listed_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS transfer_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player_id INTEGER NOT NULL,
                sell_price TEXT NOT NULL,
                selling_team_id INTEGER,
                buying_team_id INTEGER NOT NULL,
                transferred_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_history_player ON transfer_history(player_id);",
        )
        .map_err(storage_err)?;

        Ok(())
    }
}

fn positive(config: &dyn ConfigPort, key: &str, default: u32) -> Result<u32, MarketError> {
    let value = config.get_int("sqlite", key, i64::from(default));
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| MarketError::ConfigInvalid {
            section: "sqlite".into(),
            key: key.into(),
            reason: format!("{key} must be a positive integer"),
        })
}

fn storage_err(e: rusqlite::Error) -> MarketError {
    MarketError::storage(e)
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn money_text(amount: Decimal) -> String {
    amount.to_string()
}

fn timestamp_text(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        country: row.get(2)?,
        owner: row.get(3)?,
        budget: decimal_at(row, 4)?,
        value: decimal_at(row, 5)?,
        roster: RosterCounts {
            goalkeepers: row.get(6)?,
            defenders: row.get(7)?,
            midfielders: row.get(8)?,
            forwards: row.get(9)?,
        },
    })
}

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    let code: String = row.get(5)?;
    let category = Category::from_str(&code)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
    Ok(Player {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        country: row.get(3)?,
        age: row.get(4)?,
        category,
        price: decimal_at(row, 6)?,
        team_id: row.get(7)?,
    })
}

fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<Listing> {
    Ok(Listing {
        id: row.get(0)?,
        player_id: row.get(1)?,
        asking_price: decimal_at(row, 2)?,
        listed_at: timestamp_at(row, 3)?,
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<TransferRecord> {
    Ok(TransferRecord {
        id: row.get(0)?,
        player_id: row.get(1)?,
        sell_price: decimal_at(row, 2)?,
        selling_team: row.get(3)?,
        buying_team: row.get(4)?,
        transferred_at: timestamp_at(row, 5)?,
    })
}

impl StorePort for SqliteAdapter {
    fn transaction<T, F>(&self, work: F) -> Result<T, MarketError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, MarketError>,
    {
        let mut conn = self.connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(storage_err)?;

        let outcome = {
            let mut uow = SqliteUnitOfWork { conn: &tx };
            work(&mut uow)
        };

        match outcome {
            Ok(value) => {
                tx.commit().map_err(storage_err)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback() {
                    tracing::warn!(error = %rollback, "sqlite rollback failed");
                }
                Err(err)
            }
        }
    }
}

struct SqliteUnitOfWork<'c> {
    conn: &'c Connection,
}

impl SqliteUnitOfWork<'_> {
    fn require_team(&mut self, team_id: Option<TeamId>) -> Result<(), MarketError> {
        if let Some(id) = team_id {
            self.team(id)?;
        }
        Ok(())
    }
}

impl UnitOfWork for SqliteUnitOfWork<'_> {
    fn team(&mut self, id: TeamId) -> Result<Team, MarketError> {
        self.conn
            .query_row(
                &format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = ?1"),
                params![id],
                team_from_row,
            )
            .optional()
            .map_err(storage_err)?
            .ok_or(MarketError::not_found(Entity::Team, id))
    }

    fn team_for_owner(&mut self, owner: UserId) -> Result<Option<Team>, MarketError> {
        self.conn
            .query_row(
                &format!("SELECT {TEAM_COLUMNS} FROM teams WHERE owner_id = ?1"),
                params![owner],
                team_from_row,
            )
            .optional()
            .map_err(storage_err)
    }

    fn teams(&mut self) -> Result<Vec<Team>, MarketError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TEAM_COLUMNS} FROM teams ORDER BY id"))
            .map_err(storage_err)?;
        let rows = stmt.query_map([], team_from_row).map_err(storage_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(storage_err)
    }

    fn insert_team(&mut self, team: &Team) -> Result<TeamId, MarketError> {
        self.conn
            .execute(
                "INSERT INTO teams (name, country, owner_id, budget, value,
                                    goalkeepers, defenders, midfielders, forwards)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    team.name,
                    team.country,
                    team.owner,
                    money_text(team.budget),
                    money_text(team.value),
                    team.roster.goalkeepers,
                    team.roster.defenders,
                    team.roster.midfielders,
                    team.roster.forwards
                ],
            )
            .map_err(storage_err)?;
        Ok(self.conn.last_insert_rowid())
    }

    fn save_team(&mut self, team: &Team) -> Result<(), MarketError> {
        let changed = self
            .conn
            .execute(
                "UPDATE teams SET name = ?2, country = ?3, owner_id = ?4, budget = ?5, value = ?6,
                        goalkeepers = ?7, defenders = ?8, midfielders = ?9, forwards = ?10
                 WHERE id = ?1",
                params![
                    team.id,
                    team.name,
                    team.country,
                    team.owner,
                    money_text(team.budget),
                    money_text(team.value),
                    team.roster.goalkeepers,
                    team.roster.defenders,
                    team.roster.midfielders,
                    team.roster.forwards
                ],
            )
            .map_err(storage_err)?;
        if changed == 0 {
            return Err(MarketError::not_found(Entity::Team, team.id));
        }
        Ok(())
    }

    fn delete_team(&mut self, id: TeamId) -> Result<(), MarketError> {
        let changed = self
            .conn
            .execute("DELETE FROM teams WHERE id = ?1", params![id])
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    MarketError::storage(format!("team {id} still has players"))
                } else {
                    storage_err(e)
                }
            })?;
        if changed == 0 {
            return Err(MarketError::not_found(Entity::Team, id));
        }
        Ok(())
    }

    fn player(&mut self, id: PlayerId) -> Result<Player, MarketError> {
        self.conn
            .query_row(
                &format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = ?1"),
                params![id],
                player_from_row,
            )
            .optional()
            .map_err(storage_err)?
            .ok_or(MarketError::not_found(Entity::Player, id))
    }

    fn players_of(&mut self, team_id: TeamId) -> Result<Vec<Player>, MarketError> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {PLAYER_COLUMNS} FROM players WHERE team_id = ?1 ORDER BY id"
            ))
            .map_err(storage_err)?;
        let rows = stmt
            .query_map(params![team_id], player_from_row)
            .map_err(storage_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(storage_err)
    }

    fn insert_player(&mut self, player: &Player) -> Result<PlayerId, MarketError> {
        self.require_team(player.team_id)?;
        self.conn
            .execute(
                "INSERT INTO players (first_name, last_name, country, age, category, price, team_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    player.first_name,
                    player.last_name,
                    player.country,
                    player.age,
                    player.category.code(),
                    money_text(player.price),
                    player.team_id
                ],
            )
            .map_err(storage_err)?;
        Ok(self.conn.last_insert_rowid())
    }

    fn save_player(&mut self, player: &Player) -> Result<(), MarketError> {
        self.require_team(player.team_id)?;
        let changed = self
            .conn
            .execute(
                "UPDATE players SET first_name = ?2, last_name = ?3, country = ?4, age = ?5,
                        category = ?6, price = ?7, team_id = ?8
                 WHERE id = ?1",
                params![
                    player.id,
                    player.first_name,
                    player.last_name,
                    player.country,
                    player.age,
                    player.category.code(),
                    money_text(player.price),
                    player.team_id
                ],
            )
            .map_err(storage_err)?;
        if changed == 0 {
            return Err(MarketError::not_found(Entity::Player, player.id));
        }
        Ok(())
    }

    fn delete_player(&mut self, id: PlayerId) -> Result<(), MarketError> {
        let changed = self
            .conn
            .execute("DELETE FROM players WHERE id = ?1", params![id])
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    MarketError::storage(format!("player {id} is still listed"))
                } else {
                    storage_err(e)
                }
            })?;
        if changed == 0 {
            return Err(MarketError::not_found(Entity::Player, id));
        }
        Ok(())
    }

    fn listing(&mut self, id: ListingId) -> Result<Listing, MarketError> {
        self.conn
            .query_row(
                &format!("SELECT {LISTING_COLUMNS} FROM listings WHERE id = ?1"),
                params![id],
                listing_from_row,
            )
            .optional()
            .map_err(storage_err)?
            .ok_or(MarketError::not_found(Entity::Listing, id))
    }

    fn listing_for_player(&mut self, player_id: PlayerId) -> Result<Option<Listing>, MarketError> {
        self.conn
            .query_row(
                &format!("SELECT {LISTING_COLUMNS} FROM listings WHERE player_id = ?1"),
                params![player_id],
                listing_from_row,
            )
            .optional()
            .map_err(storage_err)
    }

    fn insert_listing(&mut self, listing: &Listing) -> Result<ListingId, MarketError> {
        self.player(listing.player_id)?;
        self.conn
            .execute(
                "INSERT INTO listings (player_id, asking_price, listed_at) VALUES (?1, ?2, ?3)",
                params![
                    listing.player_id,
                    money_text(listing.asking_price),
                    timestamp_text(listing.listed_at)
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    MarketError::AlreadyListed {
                        player_id: listing.player_id,
                    }
                } else {
                    storage_err(e)
                }
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    fn delete_listing(&mut self, id: ListingId) -> Result<(), MarketError> {
        let changed = self
            .conn
            .execute("DELETE FROM listings WHERE id = ?1", params![id])
            .map_err(storage_err)?;
        if changed == 0 {
            return Err(MarketError::not_found(Entity::Listing, id));
        }
        Ok(())
    }

    fn append_history(&mut self, record: &TransferRecord) -> Result<TransferId, MarketError> {
        self.conn
            .execute(
                "INSERT INTO transfer_history
                    (player_id, sell_price, selling_team_id, buying_team_id, transferred_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.player_id,
                    money_text(record.sell_price),
                    record.selling_team,
                    record.buying_team,
                    timestamp_text(record.transferred_at)
                ],
            )
            .map_err(storage_err)?;
        Ok(self.conn.last_insert_rowid())
    }

    fn history(&mut self, filter: &HistoryFilter) -> Result<Vec<TransferRecord>, MarketError> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {HISTORY_COLUMNS} FROM transfer_history
                 WHERE (?1 IS NULL OR player_id = ?1)
                   AND (?2 IS NULL OR buying_team_id = ?2 OR selling_team_id = ?2)
                 ORDER BY transferred_at, id"
            ))
            .map_err(storage_err)?;
        let rows = stmt
            .query_map(params![filter.player_id, filter.team_id], record_from_row)
            .map_err(storage_err)?;

        let mut records = Vec::new();
        for row in rows {
            let record = row.map_err(storage_err)?;
            if filter.matches(&record) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

impl ListingSearchPort for SqliteAdapter {
    fn search_listings(&self, criteria: &ListingCriteria) -> Result<Vec<ListingId>, MarketError> {
        let conn = self.connection()?;

        // SQLite's lower() folds ASCII only, so price and name filters run in Rust.
        let mut sql = String::from(
            "SELECT l.id, l.asking_price, p.first_name, p.last_name, t.name FROM listings l
             JOIN players p ON p.id = l.player_id
             LEFT JOIN teams t ON t.id = p.team_id
             WHERE 1 = 1",
        );
        let mut values: Vec<Value> = Vec::new();

        if let Some(country) = &criteria.country {
            values.push(Value::Text(country.trim().to_ascii_uppercase()));
            sql.push_str(&format!(" AND p.country = ?{}", values.len()));
        }
        if let Some(age) = criteria.age {
            values.push(Value::Integer(i64::from(age)));
            sql.push_str(&format!(" AND p.age = ?{}", values.len()));
        }
        if let Some(category) = criteria.category {
            values.push(Value::Text(category.code().to_string()));
            sql.push_str(&format!(" AND p.category = ?{}", values.len()));
        }
        sql.push_str(" ORDER BY l.id");

        let mut stmt = conn.prepare(&sql).map_err(storage_err)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok((
                    row.get::<_, ListingId>(0)?,
                    decimal_at(row, 1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })
            .map_err(storage_err)?;

        let mut ids = Vec::new();
        for row in rows {
            let (id, asking_price, first_name, last_name, team_name) =
                row.map_err(storage_err)?;
            if criteria.asking_price.is_none_or(|price| price == asking_price)
                && criteria.matches_names(&first_name, &last_name, team_name.as_deref())
            {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    fn adapter() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
    }

    fn player(last_name: &str, team_id: Option<TeamId>) -> Player {
        let mut p =
            Player::validated("Ana", last_name, "PT", 27, Category::Forward, dec!(1000000)).unwrap();
        p.team_id = team_id;
        p
    }

    #[test]
    fn from_config_missing_path() {
        let config = EmptyConfig;
        let result = SqliteAdapter::from_config(&config);
        match result {
            Err(MarketError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn in_memory_initialization() {
        let adapter = adapter();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn team_round_trips_money_and_counters() {
        let adapter = adapter();
        let mut team = Team::new("Porto Azul", "PT", dec!(5000000));
        team.owner = Some(7);
        team.value = dec!(1500000.50);
        team.roster.forwards = 2;

        let id = adapter.transaction(|uow| uow.insert_team(&team)).unwrap();
        let loaded = adapter.transaction(|uow| uow.team(id)).unwrap();
        assert_eq!(loaded.name, "Porto Azul");
        assert_eq!(loaded.owner, Some(7));
        assert_eq!(loaded.budget, dec!(5000000));
        assert_eq!(loaded.value, dec!(1500000.50));
        assert_eq!(loaded.roster.forwards, 2);

        let owned = adapter.transaction(|uow| uow.team_for_owner(7)).unwrap();
        assert_eq!(owned.map(|t| t.id), Some(id));
    }

    #[test]
    fn missing_rows_are_not_found() {
        let adapter = adapter();
        let err = adapter.transaction(|uow| uow.player(42)).unwrap_err();
        assert!(matches!(err, MarketError::NotFound { entity: Entity::Player, id: 42 }));
        let err = adapter.transaction(|uow| uow.delete_listing(3)).unwrap_err();
        assert!(matches!(err, MarketError::NotFound { entity: Entity::Listing, id: 3 }));
    }

    #[test]
    fn duplicate_listing_is_already_listed() {
        let adapter = adapter();
        let player_id = adapter
            .transaction(|uow| uow.insert_player(&player("Duarte", None)))
            .unwrap();
        let listing = Listing::new(player_id, dec!(250000), Utc::now()).unwrap();

        adapter.transaction(|uow| uow.insert_listing(&listing)).unwrap();
        let err = adapter
            .transaction(|uow| uow.insert_listing(&listing))
            .unwrap_err();
        assert!(matches!(err, MarketError::AlreadyListed { player_id: id } if id == player_id));
    }

    #[test]
    fn error_in_unit_of_work_rolls_back() {
        let adapter = adapter();
        let result: Result<(), MarketError> = adapter.transaction(|uow| {
            uow.insert_team(&Team::new("Gone", "FR", dec!(10)))?;
            Err(MarketError::storage("injected"))
        });
        assert!(result.is_err());
        assert!(adapter.transaction(|uow| uow.teams()).unwrap().is_empty());
    }

    #[test]
    fn team_with_players_cannot_be_deleted() {
        let adapter = adapter();
        let team_id = adapter
            .transaction(|uow| {
                let team_id = uow.insert_team(&Team::new("Lyon", "FR", dec!(10)))?;
                uow.insert_player(&player("Held", Some(team_id)))?;
                Ok(team_id)
            })
            .unwrap();
        let err = adapter.transaction(|uow| uow.delete_team(team_id)).unwrap_err();
        assert!(matches!(err, MarketError::Storage { .. }));
    }

    #[test]
    fn history_filters_by_either_side() {
        let adapter = adapter();
        let record = |player_id, selling_team, buying_team| TransferRecord {
            id: 0,
            player_id,
            sell_price: dec!(100),
            selling_team,
            buying_team,
            transferred_at: Utc::now(),
        };
        adapter
            .transaction(|uow| {
                uow.append_history(&record(1, None, 10))?;
                uow.append_history(&record(2, Some(10), 11))?;
                uow.append_history(&record(3, Some(12), 13))?;
                Ok(())
            })
            .unwrap();

        let for_team = adapter
            .transaction(|uow| uow.history(&HistoryFilter::for_team(10)))
            .unwrap();
        assert_eq!(
            for_team.iter().map(|r| r.player_id).collect::<Vec<_>>(),
            vec![1, 2]
        );

        let for_player = adapter
            .transaction(|uow| uow.history(&HistoryFilter::for_player(3)))
            .unwrap();
        assert_eq!(for_player.len(), 1);
        assert_eq!(for_player[0].selling_team, Some(12));
    }

    #[test]
    fn search_combines_criteria() {
        let adapter = adapter();
        let (wanted, _) = adapter
            .transaction(|uow| {
                let team_id = uow.insert_team(&Team::new("Benfica Norte", "PT", dec!(10)))?;
                let a = uow.insert_player(&player("Moreira", Some(team_id)))?;
                let b = uow.insert_player(&player("Santos", None))?;
                let wanted = uow.insert_listing(&Listing::new(a, dec!(300), Utc::now())?)?;
                let other = uow.insert_listing(&Listing::new(b, dec!(400), Utc::now())?)?;
                Ok((wanted, other))
            })
            .unwrap();

        let by_team = ListingCriteria {
            team_name: Some("benfica".into()),
            ..Default::default()
        };
        assert_eq!(adapter.search_listings(&by_team).unwrap(), vec![wanted]);

        let by_name_and_price = ListingCriteria {
            name: Some("MOREIRA".into()),
            asking_price: Some(dec!(300.00)),
            ..Default::default()
        };
        assert_eq!(
            adapter.search_listings(&by_name_and_price).unwrap(),
            vec![wanted]
        );

        let everything = adapter.search_listings(&ListingCriteria::default()).unwrap();
        assert_eq!(everything.len(), 2);

        let nobody = ListingCriteria {
            category: Some(Category::Goalkeeper),
            ..Default::default()
        };
        assert!(adapter.search_listings(&nobody).unwrap().is_empty());
    }

    #[test]
    fn name_search_folds_non_ascii_case() {
        let adapter = adapter();
        let listed = adapter
            .transaction(|uow| {
                let team_id = uow.insert_team(&Team::new("Åsane Ørn", "NO", dec!(10)))?;
                let p = uow.insert_player(&player("Ødegaard", Some(team_id)))?;
                uow.insert_listing(&Listing::new(p, dec!(300), Utc::now())?)
            })
            .unwrap();

        let by_name = ListingCriteria {
            name: Some("ødegaard".into()),
            ..Default::default()
        };
        assert_eq!(adapter.search_listings(&by_name).unwrap(), vec![listed]);

        let by_team = ListingCriteria {
            team_name: Some("ÅSANE".into()),
            ..Default::default()
        };
        assert_eq!(adapter.search_listings(&by_team).unwrap(), vec![listed]);
    }
}
