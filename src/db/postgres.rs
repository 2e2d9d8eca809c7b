use std::collections::{BTreeMap, HashMap};

use sqlx::{postgres::PgPoolOptions, PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    db::ArtistStore,
    error::AppResult,
    models::{ArtistKind, ArtistNode, RankedArtist, UserId, UserProfile},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the bundled schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct SeedIdRow {
    user_id: Uuid,
    spotify_artist_id: String,
}

#[derive(sqlx::FromRow)]
struct SelectedRow {
    spotify_artist_id: String,
    artist_name: String,
    image_url: Option<String>,
}

impl From<SelectedRow> for ArtistNode {
    fn from(row: SelectedRow) -> Self {
        ArtistNode {
            artist_id: row.spotify_artist_id,
            display_name: row.artist_name,
            image_url: row.image_url,
            kind: ArtistKind::Seed,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CalculatedRow {
    spotify_artist_id: String,
    artist_name: String,
    image_url: Option<String>,
    score: f64,
}

impl From<CalculatedRow> for RankedArtist {
    fn from(row: CalculatedRow) -> Self {
        RankedArtist {
            artist_id: row.spotify_artist_id,
            display_name: row.artist_name,
            image_url: row.image_url,
            score: row.score,
        }
    }
}

/// `ArtistStore` backed by PostgreSQL
#[derive(Clone)]
pub struct PgArtistStore {
    pool: PgPool,
}

impl PgArtistStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write_seed_set(
        conn: &mut PgConnection,
        user_id: UserId,
        seeds: &[ArtistNode],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM selected_artists WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        for (position, seed) in seeds.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO selected_artists (user_id, position, spotify_artist_id, artist_name, image_url)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(user_id)
            .bind(position as i16)
            .bind(&seed.artist_id)
            .bind(&seed.display_name)
            .bind(&seed.image_url)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    async fn write_computed_set(
        conn: &mut PgConnection,
        user_id: UserId,
        computed: &[RankedArtist],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM calculated_artists WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        for (rank, artist) in computed.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO calculated_artists (user_id, rank, spotify_artist_id, artist_name, image_url, score)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(user_id)
            .bind(rank as i16)
            .bind(&artist.artist_id)
            .bind(&artist.display_name)
            .bind(&artist.image_url)
            .bind(artist.score)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl ArtistStore for PgArtistStore {
    async fn find_user_id(&self, spotify_user_id: &str) -> AppResult<Option<UserId>> {
        let id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE spotify_user_id = $1")
            .bind(spotify_user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(id)
    }

    async fn load_seed_sets_for_all_users(&self) -> AppResult<BTreeMap<UserId, Vec<String>>> {
        let rows: Vec<SeedIdRow> = sqlx::query_as(
            r#"
            SELECT user_id, spotify_artist_id
            FROM selected_artists
            ORDER BY user_id, position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut seed_sets: BTreeMap<UserId, Vec<String>> = BTreeMap::new();
        for row in rows {
            seed_sets
                .entry(row.user_id)
                .or_default()
                .push(row.spotify_artist_id);
        }

        Ok(seed_sets)
    }

    async fn load_seed_set(&self, user_id: UserId) -> AppResult<Vec<ArtistNode>> {
        let rows: Vec<SelectedRow> = sqlx::query_as(
            r#"
            SELECT spotify_artist_id, artist_name, image_url
            FROM selected_artists
            WHERE user_id = $1
            ORDER BY position
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ArtistNode::from).collect())
    }

    async fn load_computed_set(&self, user_id: UserId) -> AppResult<Vec<RankedArtist>> {
        let rows: Vec<CalculatedRow> = sqlx::query_as(
            r#"
            SELECT spotify_artist_id, artist_name, image_url, score
            FROM calculated_artists
            WHERE user_id = $1
            ORDER BY score DESC, rank
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RankedArtist::from).collect())
    }

    async fn load_profiles(&self) -> AppResult<HashMap<UserId, UserProfile>> {
        let rows: Vec<UserProfile> = sqlx::query_as(
            "SELECT id AS user_id, nickname, profile_image_url, bio FROM users",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|p| (p.user_id, p)).collect())
    }

    async fn replace_seed_set(&self, user_id: UserId, seeds: &[ArtistNode]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::write_seed_set(&mut tx, user_id, seeds).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_computed_set(
        &self,
        user_id: UserId,
        computed: &[RankedArtist],
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::write_computed_set(&mut tx, user_id, computed).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_selection(
        &self,
        user_id: UserId,
        seeds: &[ArtistNode],
        computed: &[RankedArtist],
    ) -> AppResult<()> {
        // Dropping `tx` on an early return rolls everything back
        let mut tx = self.pool.begin().await?;
        Self::write_seed_set(&mut tx, user_id, seeds).await?;
        Self::write_computed_set(&mut tx, user_id, computed).await?;
        tx.commit().await?;

        tracing::debug!(
            user_id = %user_id,
            seeds = seeds.len(),
            computed = computed.len(),
            "Selection replaced"
        );

        Ok(())
    }
}
