pub const SCHEMA_VERSION: i32 = 1;

pub const SCHEMA_V1: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS app_settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Legacy assignees (admin accounts)
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT
);

CREATE TABLE IF NOT EXISTS team_members (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT,
    role TEXT,
    avatar TEXT
);

-- Storefront accounts leads convert into (imported, never edited here)
CREATE TABLE IF NOT EXISTS businesses (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    email TEXT,
    plan TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS leads (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT,
    phone TEXT,
    company TEXT,
    country TEXT,
    source TEXT NOT NULL DEFAULT 'OTHER',
    source_detail TEXT,
    status TEXT NOT NULL DEFAULT 'NEW',
    priority TEXT NOT NULL DEFAULT 'MEDIUM',
    score INTEGER NOT NULL DEFAULT 0,
    assigned_to_id TEXT,
    team_member_id TEXT,
    business_type TEXT,
    expected_plan TEXT,
    estimated_value REAL,
    last_contacted_at TEXT,
    next_follow_up_at TEXT,
    contact_count INTEGER NOT NULL DEFAULT 0,
    converted_at TEXT,
    converted_to_id TEXT,
    converted_name TEXT,
    converted_slug TEXT,
    converted_plan TEXT,
    converted_created_at TEXT,
    pending_conversion_id TEXT,
    notes TEXT,
    tags TEXT NOT NULL DEFAULT '[]',
    version INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (assigned_to_id) REFERENCES users(id) ON DELETE SET NULL,
    FOREIGN KEY (team_member_id) REFERENCES team_members(id) ON DELETE SET NULL,
    FOREIGN KEY (converted_to_id) REFERENCES businesses(id) ON DELETE SET NULL,
    FOREIGN KEY (pending_conversion_id) REFERENCES businesses(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS lead_activities (
    id TEXT PRIMARY KEY,
    lead_id TEXT NOT NULL,
    activity_type TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    performed_by TEXT,
    metadata TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (lead_id) REFERENCES leads(id) ON DELETE CASCADE
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_lead_status ON leads(status);
CREATE INDEX IF NOT EXISTS idx_lead_created ON leads(created_at);
CREATE INDEX IF NOT EXISTS idx_lead_team_member ON leads(team_member_id);
CREATE INDEX IF NOT EXISTS idx_lead_assigned_to ON leads(assigned_to_id);
CREATE INDEX IF NOT EXISTS idx_lead_follow_up ON leads(next_follow_up_at);
CREATE INDEX IF NOT EXISTS idx_activity_lead ON lead_activities(lead_id);
CREATE INDEX IF NOT EXISTS idx_activity_created ON lead_activities(created_at);
CREATE INDEX IF NOT EXISTS idx_business_email ON businesses(email COLLATE NOCASE);
"#;
