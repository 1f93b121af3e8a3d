/// SQLite persistence for conversation analytics
///
/// A single `rusqlite::Connection` lives on a dedicated worker thread; async
/// callers submit closures over a channel and await the reply on a oneshot.
/// Every concern table keys one logical row per conversation, upserted on
/// conflict.
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::scoring::{ContactInfo, CtaTrackingData, ProductInterestData, VideoShowcaseData};

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| anyhow!("invalid datetime '{value}': {err}"))
}

fn parse_optional_datetime(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.map(|s| parse_datetime(&s)).transpose()
}

fn run_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS conversations (
            conversation_id  TEXT PRIMARY KEY,
            conversation_url TEXT,
            status           TEXT NOT NULL DEFAULT 'active',
            created_at       TEXT NOT NULL,
            ended_at         TEXT
        );

        CREATE TABLE IF NOT EXISTS qualification_data (
            id              TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL UNIQUE,
            first_name      TEXT,
            last_name       TEXT,
            email           TEXT,
            position        TEXT,
            objective_name  TEXT,
            event_type      TEXT,
            raw_payload     TEXT,
            received_at     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS product_interest_data (
            id               TEXT PRIMARY KEY,
            conversation_id  TEXT NOT NULL UNIQUE,
            objective_name   TEXT,
            primary_interest TEXT,
            pain_points      TEXT,
            event_type       TEXT,
            raw_payload      TEXT,
            received_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS video_showcase_data (
            id              TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL UNIQUE,
            objective_name  TEXT,
            videos_shown    TEXT NOT NULL DEFAULT '[]',
            event_type      TEXT,
            received_at     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS cta_tracking (
            id              TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL UNIQUE,
            demo_id         TEXT,
            cta_url         TEXT,
            cta_shown_at    TEXT,
            cta_clicked_at  TEXT
        );

        CREATE TABLE IF NOT EXISTS perception_analysis (
            id              TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL UNIQUE,
            analysis        TEXT NOT NULL,
            event_type      TEXT,
            raw_payload     TEXT,
            received_at     TEXT NOT NULL
        );",
    )
    .context("failed to create schema")?;

    Ok(())
}

/// A conversation row as stored
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConversationRecord {
    pub conversation_id: String,
    pub conversation_url: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Fields written by the qualification capture handler
#[derive(Debug, Clone)]
pub struct NewQualification {
    pub conversation_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    pub objective_name: Option<String>,
    pub event_type: Option<String>,
    pub raw_payload: Value,
    pub received_at: DateTime<Utc>,
}

/// Fields written by the product-interest capture handler
#[derive(Debug, Clone)]
pub struct NewProductInterest {
    pub conversation_id: String,
    pub primary_interest: Option<String>,
    pub pain_points: Option<Vec<String>>,
    pub objective_name: Option<String>,
    pub event_type: Option<String>,
    pub raw_payload: Value,
    pub received_at: DateTime<Utc>,
}

/// Handle to the SQLite worker thread
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create database directory {}", parent.display())
                })?;
            }
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("domo-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }
                if let Err(err) = conn.pragma_update(None, "foreign_keys", "ON") {
                    error!("Failed to enable foreign keys: {err}");
                }

                let init_result = run_migrations(&mut conn);
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => task(&mut conn),
                        DbCommand::Shutdown => break,
                    }
                }
            })
            .context("failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("💾 Database initialized at {}", db_path.display());

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Run `task` on the database thread and await its result.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to DB thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }

    // --- conversations -----------------------------------------------------

    pub async fn upsert_conversation(
        &self,
        conversation_id: &str,
        conversation_url: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        let conversation_id = conversation_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO conversations (conversation_id, conversation_url, status, created_at)
                 VALUES (?1, ?2, 'active', ?3)
                 ON CONFLICT(conversation_id) DO UPDATE SET
                     conversation_url = COALESCE(excluded.conversation_url, conversation_url),
                     status = 'active'",
                params![conversation_id, conversation_url, created_at.to_rfc3339()],
            )
            .context("failed to upsert conversation")?;
            Ok(())
        })
        .await
    }

    pub async fn mark_conversation_ended(
        &self,
        conversation_id: &str,
        ended_at: DateTime<Utc>,
    ) -> Result<()> {
        let conversation_id = conversation_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO conversations (conversation_id, status, created_at, ended_at)
                 VALUES (?1, 'ended', ?2, ?2)
                 ON CONFLICT(conversation_id) DO UPDATE SET
                     status = 'ended',
                     ended_at = excluded.ended_at",
                params![conversation_id, ended_at.to_rfc3339()],
            )
            .context("failed to mark conversation ended")?;
            Ok(())
        })
        .await
    }

    pub async fn get_conversation(&self, conversation_id: &str) -> Result<Option<ConversationRecord>> {
        let conversation_id = conversation_id.to_string();
        self.execute(move |conn| {
            let record = conn
                .query_row(
                    "SELECT conversation_id, conversation_url, status, created_at, ended_at
                     FROM conversations WHERE conversation_id = ?1",
                    params![conversation_id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, Option<String>>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, Option<String>>(4)?,
                        ))
                    },
                )
                .optional()?;

            record
                .map(|(conversation_id, conversation_url, status, created_at, ended_at)| {
                    Ok(ConversationRecord {
                        conversation_id,
                        conversation_url,
                        status,
                        created_at: parse_datetime(&created_at)?,
                        ended_at: parse_optional_datetime(ended_at)?,
                    })
                })
                .transpose()
        })
        .await
    }

    pub async fn list_conversations(&self) -> Result<Vec<ConversationRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT conversation_id, conversation_url, status, created_at, ended_at
                 FROM conversations ORDER BY created_at DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut conversations = Vec::new();
            while let Some(row) = rows.next()? {
                conversations.push(ConversationRecord {
                    conversation_id: row.get(0)?,
                    conversation_url: row.get(1)?,
                    status: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?)?,
                    ended_at: parse_optional_datetime(row.get::<_, Option<String>>(4)?)?,
                });
            }

            Ok(conversations)
        })
        .await
    }

    // --- qualification -----------------------------------------------------

    pub async fn upsert_qualification(&self, record: NewQualification) -> Result<()> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO qualification_data
                     (id, conversation_id, first_name, last_name, email, position,
                      objective_name, event_type, raw_payload, received_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(conversation_id) DO UPDATE SET
                     first_name = COALESCE(excluded.first_name, first_name),
                     last_name = COALESCE(excluded.last_name, last_name),
                     email = COALESCE(excluded.email, email),
                     position = COALESCE(excluded.position, position),
                     objective_name = excluded.objective_name,
                     event_type = excluded.event_type,
                     raw_payload = excluded.raw_payload,
                     received_at = excluded.received_at",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    record.conversation_id,
                    record.first_name,
                    record.last_name,
                    record.email,
                    record.position,
                    record.objective_name,
                    record.event_type,
                    record.raw_payload.to_string(),
                    record.received_at.to_rfc3339(),
                ],
            )
            .context("failed to upsert qualification data")?;
            Ok(())
        })
        .await
    }

    pub async fn get_contact_info(&self, conversation_id: &str) -> Result<Option<ContactInfo>> {
        let conversation_id = conversation_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, first_name, last_name, email, position, received_at
                 FROM qualification_data WHERE conversation_id = ?1",
            )?;

            let mut rows = stmt.query(params![conversation_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(ContactInfo {
                    id: row.get(0)?,
                    conversation_id: row.get(1)?,
                    first_name: row.get(2)?,
                    last_name: row.get(3)?,
                    email: row.get(4)?,
                    position: row.get(5)?,
                    received_at: parse_datetime(&row.get::<_, String>(6)?)?,
                })),
                None => Ok(None),
            }
        })
        .await
    }

    // --- product interest --------------------------------------------------

    pub async fn upsert_product_interest(&self, record: NewProductInterest) -> Result<()> {
        let pain_points_json = record
            .pain_points
            .as_ref()
            .map(|points| serde_json::to_string(points))
            .transpose()
            .context("failed to encode pain points")?;

        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO product_interest_data
                     (id, conversation_id, objective_name, primary_interest, pain_points,
                      event_type, raw_payload, received_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(conversation_id) DO UPDATE SET
                     objective_name = excluded.objective_name,
                     primary_interest = COALESCE(excluded.primary_interest, primary_interest),
                     pain_points = COALESCE(excluded.pain_points, pain_points),
                     event_type = excluded.event_type,
                     raw_payload = excluded.raw_payload,
                     received_at = excluded.received_at",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    record.conversation_id,
                    record.objective_name,
                    record.primary_interest,
                    pain_points_json,
                    record.event_type,
                    record.raw_payload.to_string(),
                    record.received_at.to_rfc3339(),
                ],
            )
            .context("failed to upsert product interest data")?;
            Ok(())
        })
        .await
    }

    pub async fn get_product_interest(&self, conversation_id: &str) -> Result<Option<ProductInterestData>> {
        let conversation_id = conversation_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, primary_interest, pain_points, received_at
                 FROM product_interest_data WHERE conversation_id = ?1",
            )?;

            let mut rows = stmt.query(params![conversation_id])?;
            match rows.next()? {
                Some(row) => {
                    let pain_points = row
                        .get::<_, Option<String>>(3)?
                        .map(|json| serde_json::from_str::<Vec<String>>(&json))
                        .transpose()
                        .context("stored pain_points is not a JSON string array")?;

                    Ok(Some(ProductInterestData {
                        id: row.get(0)?,
                        conversation_id: row.get(1)?,
                        primary_interest: row.get(2)?,
                        pain_points,
                        received_at: parse_datetime(&row.get::<_, String>(4)?)?,
                    }))
                }
                None => Ok(None),
            }
        })
        .await
    }

    // --- video showcase ----------------------------------------------------

    /// Append a shown video title to the conversation's showcase row.
    ///
    /// Read-merge-write with set semantics: duplicates collapse. Concurrent
    /// deliveries resolve last-writer-wins, which is acceptable here because
    /// a missed union member self-corrects on the next delivery of the same
    /// title (webhook re-delivery is common).
    pub async fn append_showcase_video(
        &self,
        conversation_id: &str,
        objective_name: Option<String>,
        video_title: &str,
        event_type: Option<String>,
        received_at: DateTime<Utc>,
    ) -> Result<()> {
        let conversation_id = conversation_id.to_string();
        let video_title = video_title.to_string();
        self.execute(move |conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT videos_shown FROM video_showcase_data WHERE conversation_id = ?1",
                    params![conversation_id],
                    |row| row.get(0),
                )
                .optional()?;

            let mut videos: Vec<String> = existing
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .context("stored videos_shown is not a JSON string array")?
                .unwrap_or_default();

            if !videos.contains(&video_title) {
                videos.push(video_title);
            }

            let videos_json = serde_json::to_string(&videos)?;

            conn.execute(
                "INSERT INTO video_showcase_data
                     (id, conversation_id, objective_name, videos_shown, event_type, received_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(conversation_id) DO UPDATE SET
                     objective_name = excluded.objective_name,
                     videos_shown = excluded.videos_shown,
                     event_type = excluded.event_type,
                     received_at = excluded.received_at",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    conversation_id,
                    objective_name,
                    videos_json,
                    event_type,
                    received_at.to_rfc3339(),
                ],
            )
            .context("failed to upsert video showcase data")?;
            Ok(())
        })
        .await
    }

    pub async fn get_video_showcase(&self, conversation_id: &str) -> Result<Option<VideoShowcaseData>> {
        let conversation_id = conversation_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, objective_name, videos_shown, received_at
                 FROM video_showcase_data WHERE conversation_id = ?1",
            )?;

            let mut rows = stmt.query(params![conversation_id])?;
            match rows.next()? {
                Some(row) => {
                    let videos_shown: Vec<String> =
                        serde_json::from_str(&row.get::<_, String>(3)?)
                            .context("stored videos_shown is not a JSON string array")?;

                    Ok(Some(VideoShowcaseData {
                        id: row.get(0)?,
                        conversation_id: row.get(1)?,
                        objective_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        videos_shown,
                        received_at: parse_datetime(&row.get::<_, String>(4)?)?,
                    }))
                }
                None => Ok(None),
            }
        })
        .await
    }

    // --- CTA tracking ------------------------------------------------------

    /// Record that the CTA was presented. `cta_shown_at` is set once; a later
    /// delivery does not move the original timestamp.
    pub async fn record_cta_shown(
        &self,
        conversation_id: &str,
        demo_id: Option<String>,
        cta_url: Option<String>,
        shown_at: DateTime<Utc>,
    ) -> Result<()> {
        let conversation_id = conversation_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO cta_tracking (id, conversation_id, demo_id, cta_url, cta_shown_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(conversation_id) DO UPDATE SET
                     demo_id = COALESCE(excluded.demo_id, demo_id),
                     cta_url = COALESCE(excluded.cta_url, cta_url),
                     cta_shown_at = COALESCE(cta_shown_at, excluded.cta_shown_at)",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    conversation_id,
                    demo_id,
                    cta_url,
                    shown_at.to_rfc3339(),
                ],
            )
            .context("failed to record CTA shown")?;
            Ok(())
        })
        .await
    }

    /// Record a CTA click; this is the sole determinant of "CTA executed".
    pub async fn record_cta_clicked(
        &self,
        conversation_id: &str,
        clicked_at: DateTime<Utc>,
    ) -> Result<()> {
        let conversation_id = conversation_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO cta_tracking (id, conversation_id, cta_clicked_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(conversation_id) DO UPDATE SET
                     cta_clicked_at = COALESCE(cta_clicked_at, excluded.cta_clicked_at)",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    conversation_id,
                    clicked_at.to_rfc3339(),
                ],
            )
            .context("failed to record CTA click")?;
            Ok(())
        })
        .await
    }

    pub async fn get_cta_tracking(&self, conversation_id: &str) -> Result<Option<CtaTrackingData>> {
        let conversation_id = conversation_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, demo_id, cta_url, cta_shown_at, cta_clicked_at
                 FROM cta_tracking WHERE conversation_id = ?1",
            )?;

            let mut rows = stmt.query(params![conversation_id])?;
            match rows.next()? {
                Some(row) => Ok(Some(CtaTrackingData {
                    id: row.get(0)?,
                    conversation_id: row.get(1)?,
                    demo_id: row.get(2)?,
                    cta_url: row.get(3)?,
                    cta_shown_at: parse_optional_datetime(row.get::<_, Option<String>>(4)?)?,
                    cta_clicked_at: parse_optional_datetime(row.get::<_, Option<String>>(5)?)?,
                })),
                None => Ok(None),
            }
        })
        .await
    }

    // --- perception analysis -----------------------------------------------

    pub async fn upsert_perception_analysis(
        &self,
        conversation_id: &str,
        analysis: Value,
        event_type: Option<String>,
        raw_payload: Value,
        received_at: DateTime<Utc>,
    ) -> Result<()> {
        let conversation_id = conversation_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO perception_analysis
                     (id, conversation_id, analysis, event_type, raw_payload, received_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(conversation_id) DO UPDATE SET
                     analysis = excluded.analysis,
                     event_type = excluded.event_type,
                     raw_payload = excluded.raw_payload,
                     received_at = excluded.received_at",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    conversation_id,
                    analysis.to_string(),
                    event_type,
                    raw_payload.to_string(),
                    received_at.to_rfc3339(),
                ],
            )
            .context("failed to upsert perception analysis")?;
            Ok(())
        })
        .await
    }

    pub async fn get_perception_analysis(&self, conversation_id: &str) -> Result<Option<Value>> {
        let conversation_id = conversation_id.to_string();
        self.execute(move |conn| {
            let stored: Option<String> = conn
                .query_row(
                    "SELECT analysis FROM perception_analysis WHERE conversation_id = ?1",
                    params![conversation_id],
                    |row| row.get(0),
                )
                .optional()?;

            stored
                .map(|json| {
                    serde_json::from_str(&json).context("stored perception analysis is not valid JSON")
                })
                .transpose()
        })
        .await
    }
}
