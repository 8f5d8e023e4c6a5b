//! Room Repository Implementation
//!
//! PostgreSQL implementation of the RoomRepository trait.
//! Rooms live in `chat_rooms`, membership in `chat_room_members`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{ChatRoom, PrivateRoomKey, RoomChanges, RoomRepository, RoomType};
use crate::shared::error::AppError;

const NAME_TAKEN: &str = "Room name already exists";

/// Room columns with the aggregated member list.
const SELECT_ROOM: &str = r#"
    SELECT r.id, r.name, r.room_type, r.avatar_url, r.is_public, r.created_at,
           COALESCE(ARRAY_AGG(m.user_id ORDER BY m.user_id)
                    FILTER (WHERE m.user_id IS NOT NULL), '{}') AS members
    FROM chat_rooms r
    LEFT JOIN chat_room_members m ON m.room_id = r.id
"#;

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Outcome of a private-room insert that hit a unique index: the room that
/// now owns the pair, or `Conflict` when the name itself is taken.
fn settle_private_conflict(existing: Option<ChatRoom>) -> Result<ChatRoom, AppError> {
    existing.ok_or_else(|| AppError::Conflict(NAME_TAKEN.to_string()))
}

/// Database row representation of a room with its members.
#[derive(Debug, sqlx::FromRow)]
struct RoomRow {
    id: i64,
    name: String,
    room_type: String,
    avatar_url: Option<String>,
    is_public: bool,
    created_at: DateTime<Utc>,
    members: Vec<i64>,
}

impl RoomRow {
    /// Convert database row to domain ChatRoom entity.
    fn into_room(self) -> Result<ChatRoom, AppError> {
        let room_type = RoomType::from_str(&self.room_type)
            .ok_or_else(|| AppError::Internal(format!("Unknown room type '{}'", self.room_type)))?;

        Ok(ChatRoom {
            id: self.id,
            name: self.name,
            room_type,
            created_at: self.created_at,
            avatar_url: self.avatar_url,
            is_public: self.is_public,
            members: self.members.into_iter().collect(),
        })
    }
}

/// PostgreSQL room repository implementation.
#[derive(Clone)]
pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    /// Create a new PgRoomRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_room(
        tx: &mut Transaction<'static, Postgres>,
        room: &ChatRoom,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO chat_rooms (id, name, room_type, private_key, avatar_url, is_public, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(room.id)
        .bind(&room.name)
        .bind(room.room_type.as_str())
        .bind(room.private_key().map(|k| k.encode()))
        .bind(&room.avatar_url)
        .bind(room.is_public)
        .bind(room.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::from_db(e, NAME_TAKEN))?;

        Ok(())
    }

    async fn insert_members(
        tx: &mut Transaction<'static, Postgres>,
        room_id: i64,
        user_ids: &[i64],
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO chat_room_members (room_id, user_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT (room_id, user_id) DO NOTHING
            "#,
        )
        .bind(room_id)
        .bind(user_ids)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<ChatRoom>, AppError> {
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            "{} WHERE r.id = $1 GROUP BY r.id",
            SELECT_ROOM
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RoomRow::into_room).transpose()
    }

    async fn find_all(&self) -> Result<Vec<ChatRoom>, AppError> {
        let rows = sqlx::query_as::<_, RoomRow>(&format!(
            "{} GROUP BY r.id ORDER BY r.created_at ASC, r.id ASC",
            SELECT_ROOM
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RoomRow::into_room).collect()
    }

    async fn find_private(&self, key: PrivateRoomKey) -> Result<Option<ChatRoom>, AppError> {
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            "{} WHERE r.private_key = $1 GROUP BY r.id",
            SELECT_ROOM
        ))
        .bind(key.encode())
        .fetch_optional(&self.pool)
        .await?;

        row.map(RoomRow::into_room).transpose()
    }

    async fn name_exists(&self, name: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM chat_rooms WHERE name = $1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_group(&self, room: &ChatRoom) -> Result<ChatRoom, AppError> {
        let members: Vec<i64> = room.members.iter().copied().collect();

        let mut tx = self.pool.begin().await?;
        Self::insert_room(&mut tx, room).await?;
        Self::insert_members(&mut tx, room.id, &members).await?;
        tx.commit().await?;

        Ok(room.clone())
    }

    /// Inserts with `ON CONFLICT (private_key) DO NOTHING`; when another
    /// transaction won the race the committed room is returned instead.
    async fn create_private_or_get(&self, room: &ChatRoom) -> Result<ChatRoom, AppError> {
        let key = room
            .private_key()
            .ok_or_else(|| AppError::Internal("Private room without a valid member pair".into()))?;
        let members: Vec<i64> = room.members.iter().copied().collect();

        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO chat_rooms (id, name, room_type, private_key, avatar_url, is_public, created_at)
            VALUES ($1, $2, $3, $4, NULL, FALSE, $5)
            ON CONFLICT (private_key) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(room.id)
        .bind(&room.name)
        .bind(RoomType::Private.as_str())
        .bind(key.encode())
        .bind(room.created_at)
        .fetch_optional(&mut *tx)
        .await;

        // A unique violation here is either the name index or a creator for
        // the same pair racing past ON CONFLICT; only the latter has a room.
        let inserted = match inserted {
            Ok(inserted) => inserted,
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                return settle_private_conflict(self.find_private(key).await?);
            }
            Err(e) => return Err(AppError::Database(e)),
        };

        if inserted.is_some() {
            Self::insert_members(&mut tx, room.id, &members).await?;
            tx.commit().await?;
            return Ok(room.clone());
        }

        tx.rollback().await?;
        self.find_private(key)
            .await?
            .ok_or_else(|| AppError::Internal("Private room vanished after conflict".into()))
    }

    async fn update(&self, id: i64, changes: &RoomChanges) -> Result<Option<ChatRoom>, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE chat_rooms
            SET name = COALESCE($2, name),
                avatar_url = COALESCE($3, avatar_url),
                is_public = COALESCE($4, is_public)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.avatar_url)
        .bind(changes.is_public)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::from_db(e, NAME_TAKEN))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn add_members(&self, id: i64, user_ids: &[i64]) -> Result<Option<ChatRoom>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Lock the room row so a concurrent delete cannot interleave.
        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM chat_rooms WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        Self::insert_members(&mut tx, id, user_ids).await?;
        tx.commit().await?;

        self.find_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM chat_rooms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
