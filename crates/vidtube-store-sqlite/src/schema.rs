//! SQL schema for the vidtube SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Every user is also a channel.
CREATE TABLE IF NOT EXISTS users (
    user_id          TEXT PRIMARY KEY,
    username         TEXT NOT NULL UNIQUE,   -- always lowercase
    email            TEXT NOT NULL UNIQUE,
    full_name        TEXT NOT NULL,
    avatar_url       TEXT NOT NULL,
    cover_image_url  TEXT,
    password_hash    TEXT NOT NULL,
    subscriber_count INTEGER NOT NULL DEFAULT 0 CHECK (subscriber_count >= 0),
    -- JSON array of channel ids; cache of this user's channel memberships.
    subscribed_to    TEXT NOT NULL DEFAULT '[]',
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS videos (
    video_id      TEXT PRIMARY KEY,
    owner_id      TEXT NOT NULL REFERENCES users(user_id),
    title         TEXT NOT NULL,
    description   TEXT NOT NULL,
    video_url     TEXT NOT NULL,
    thumbnail_url TEXT NOT NULL,
    duration_secs REAL NOT NULL DEFAULT 0,
    views         INTEGER NOT NULL DEFAULT 0 CHECK (views >= 0),
    likes         INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
    is_published  INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id TEXT PRIMARY KEY,
    video_id   TEXT NOT NULL REFERENCES videos(video_id),
    owner_id   TEXT NOT NULL REFERENCES users(user_id),
    content    TEXT NOT NULL,
    likes      INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
    history    TEXT NOT NULL DEFAULT '[]',   -- JSON array of revisions
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tweets (
    tweet_id   TEXT PRIMARY KEY,
    owner_id   TEXT NOT NULL REFERENCES users(user_id),
    content    TEXT NOT NULL,
    likes      INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
    history    TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS playlists (
    playlist_id TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL REFERENCES users(user_id),
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS playlist_videos (
    playlist_id TEXT NOT NULL REFERENCES playlists(playlist_id) ON DELETE CASCADE,
    video_id    TEXT NOT NULL REFERENCES videos(video_id) ON DELETE CASCADE,
    position    INTEGER NOT NULL,
    PRIMARY KEY (playlist_id, video_id)
);

CREATE TABLE IF NOT EXISTS watch_history (
    entry_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    video_id   TEXT NOT NULL REFERENCES videos(video_id) ON DELETE CASCADE,
    watched_at TEXT NOT NULL
);

-- Membership edges: likes and subscriptions. Written only by the toggle
-- commit path; the UNIQUE constraint is the race guard for concurrent
-- toggles from the same actor.
CREATE TABLE IF NOT EXISTS memberships (
    edge_id     TEXT PRIMARY KEY,
    actor_id    TEXT NOT NULL REFERENCES users(user_id),
    target_kind TEXT NOT NULL,   -- 'video' | 'comment' | 'tweet' | 'channel'
    target_id   TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (actor_id, target_kind, target_id)
);

CREATE INDEX IF NOT EXISTS videos_owner_idx         ON videos(owner_id);
CREATE INDEX IF NOT EXISTS comments_video_idx       ON comments(video_id);
CREATE INDEX IF NOT EXISTS tweets_owner_idx         ON tweets(owner_id);
CREATE INDEX IF NOT EXISTS playlists_owner_idx      ON playlists(owner_id);
CREATE INDEX IF NOT EXISTS watch_history_user_idx   ON watch_history(user_id, watched_at);
CREATE INDEX IF NOT EXISTS memberships_target_idx   ON memberships(target_kind, target_id);

PRAGMA user_version = 1;
";
