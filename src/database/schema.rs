// Column names are read by external tooling; keep them stable.
pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS files (
        id INTEGER PRIMARY KEY,
        filename TEXT NOT NULL,
        path TEXT NOT NULL,
        sha256 TEXT NOT NULL,
        created_timestamp TEXT,
        modified_timestamp TEXT,
        type TEXT
    );

    CREATE TABLE IF NOT EXISTS duplicates (
        id INTEGER PRIMARY KEY,
        sha256 TEXT NOT NULL,
        filename TEXT NOT NULL,
        path TEXT NOT NULL,
        created_timestamp TEXT,
        modified_timestamp TEXT,
        FOREIGN KEY (sha256) REFERENCES files (sha256)
    );

    CREATE INDEX IF NOT EXISTS idx_files_sha256 ON files (sha256);
    CREATE INDEX IF NOT EXISTS idx_files_filename ON files (filename);
    CREATE INDEX IF NOT EXISTS idx_duplicates_sha256 ON duplicates (sha256);
";

/// ISO-8601 text as stored in the timestamp columns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
