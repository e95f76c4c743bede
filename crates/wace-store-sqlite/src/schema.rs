//! SQL schema for the course store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS programmes (
    programme_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT    NOT NULL UNIQUE,  -- ProgrammeName discriminant
    description     TEXT    NOT NULL,
    price_pesewas   INTEGER NOT NULL,
    duration_months INTEGER NOT NULL DEFAULT 12,
    created_at      TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS subjects (
    subject_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT    NOT NULL,
    code         TEXT    NOT NULL UNIQUE,
    description  TEXT    NOT NULL,
    subject_type TEXT    NOT NULL DEFAULT 'elective',  -- 'core' | 'elective'
    is_active    INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS programme_subjects (
    programme_id INTEGER NOT NULL REFERENCES programmes(programme_id) ON DELETE CASCADE,
    subject_id   INTEGER NOT NULL REFERENCES subjects(subject_id)     ON DELETE CASCADE,
    is_required  INTEGER NOT NULL DEFAULT 1,
    sort_order   INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (programme_id, subject_id)
);

CREATE TABLE IF NOT EXISTS topics (
    topic_id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id               INTEGER NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    title                    TEXT    NOT NULL,
    description              TEXT    NOT NULL DEFAULT '',
    sort_order               INTEGER NOT NULL DEFAULT 0,
    estimated_duration_hours INTEGER NOT NULL DEFAULT 1,
    is_published             INTEGER NOT NULL DEFAULT 0,
    created_at               TEXT    NOT NULL,
    updated_at               TEXT    NOT NULL,
    UNIQUE (subject_id, sort_order)
);

CREATE TABLE IF NOT EXISTS lessons (
    lesson_id              INTEGER PRIMARY KEY AUTOINCREMENT,
    topic_id               INTEGER NOT NULL REFERENCES topics(topic_id) ON DELETE CASCADE,
    title                  TEXT    NOT NULL,
    lesson_type            TEXT    NOT NULL,  -- LessonType discriminant
    content                TEXT    NOT NULL DEFAULT '',
    notes                  TEXT    NOT NULL DEFAULT '',
    video_url              TEXT,              -- NULL when the lesson has no video
    video_duration_minutes INTEGER,
    sort_order             INTEGER NOT NULL DEFAULT 0,
    is_free                INTEGER NOT NULL DEFAULT 0,
    created_at             TEXT    NOT NULL,
    UNIQUE (topic_id, sort_order)
);

CREATE TABLE IF NOT EXISTS users (
    user_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT    NOT NULL UNIQUE,
    email         TEXT    NOT NULL UNIQUE,   -- stored lowercase
    first_name    TEXT    NOT NULL,
    last_name     TEXT    NOT NULL,
    password_hash TEXT    NOT NULL,
    is_active     INTEGER NOT NULL DEFAULT 1,
    is_staff      INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS students (
    user_id                     INTEGER PRIMARY KEY REFERENCES users(user_id) ON DELETE CASCADE,
    programme_id                INTEGER NOT NULL REFERENCES programmes(programme_id),
    phone_number                TEXT    NOT NULL,
    date_of_birth               TEXT    NOT NULL,  -- YYYY-MM-DD
    previous_school             TEXT    NOT NULL,
    wassce_year                 INTEGER NOT NULL,
    index_number                TEXT    NOT NULL UNIQUE,
    enrolled_at                 TEXT    NOT NULL,
    is_active                   INTEGER NOT NULL DEFAULT 1,
    notify_course_updates       INTEGER NOT NULL DEFAULT 1,
    notify_assignment_reminders INTEGER NOT NULL DEFAULT 1,
    notify_announcements        INTEGER NOT NULL DEFAULT 1,
    notify_weekly_summary       INTEGER NOT NULL DEFAULT 1
);

-- Only the SHA-256 digest of each issued token is kept.
CREATE TABLE IF NOT EXISTS auth_tokens (
    digest     TEXT    PRIMARY KEY,
    user_id    INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at TEXT    NOT NULL
);

-- At most one row per (user, lesson); mark-complete is INSERT OR IGNORE.
CREATE TABLE IF NOT EXISTS lesson_completions (
    user_id      INTEGER NOT NULL REFERENCES users(user_id)     ON DELETE CASCADE,
    lesson_id    INTEGER NOT NULL REFERENCES lessons(lesson_id) ON DELETE CASCADE,
    completed_at TEXT    NOT NULL,
    PRIMARY KEY (user_id, lesson_id)
);

CREATE TABLE IF NOT EXISTS announcements (
    announcement_id INTEGER PRIMARY KEY AUTOINCREMENT,
    title           TEXT    NOT NULL,
    message         TEXT    NOT NULL,
    priority        TEXT    NOT NULL DEFAULT 'normal',
    is_active       INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT    NOT NULL,
    expires_at      TEXT
);

CREATE TABLE IF NOT EXISTS instructors (
    instructor_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    title            TEXT    NOT NULL,
    first_name       TEXT    NOT NULL,
    last_name        TEXT    NOT NULL,
    role             TEXT    NOT NULL,
    position_title   TEXT    NOT NULL,
    highest_degree   TEXT    NOT NULL,
    institution      TEXT    NOT NULL,
    years_experience INTEGER NOT NULL,
    bio              TEXT    NOT NULL DEFAULT '',
    photo            TEXT    NOT NULL DEFAULT '',
    email            TEXT    NOT NULL DEFAULT '',
    display_order    INTEGER NOT NULL DEFAULT 0,
    is_active        INTEGER NOT NULL DEFAULT 1,
    is_featured      INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS question_topics (
    question_topic_id INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id        INTEGER NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    name              TEXT    NOT NULL,
    description       TEXT    NOT NULL DEFAULT '',
    sort_order        INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT    NOT NULL,
    UNIQUE (subject_id, name)
);

CREATE TABLE IF NOT EXISTS past_papers (
    paper_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id       INTEGER NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    year             INTEGER NOT NULL,
    paper_number     INTEGER NOT NULL DEFAULT 1,
    paper_type       TEXT    NOT NULL,  -- PaperType discriminant
    title            TEXT    NOT NULL,
    instructions     TEXT    NOT NULL DEFAULT '',
    duration_minutes INTEGER NOT NULL DEFAULT 180,
    total_marks      INTEGER NOT NULL DEFAULT 100,
    is_published     INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT    NOT NULL,
    updated_at       TEXT    NOT NULL,
    UNIQUE (subject_id, year, paper_number)
);

CREATE TABLE IF NOT EXISTS mcq_questions (
    question_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    paper_id        INTEGER NOT NULL REFERENCES past_papers(paper_id) ON DELETE CASCADE,
    topic_id        INTEGER REFERENCES question_topics(question_topic_id) ON DELETE SET NULL,
    question_number INTEGER NOT NULL,
    question_text   TEXT    NOT NULL,
    option_a        TEXT    NOT NULL,
    option_b        TEXT    NOT NULL,
    option_c        TEXT    NOT NULL,
    option_d        TEXT    NOT NULL,
    option_e        TEXT,               -- NULL for four-option questions
    correct_answer  TEXT    NOT NULL,   -- 'A'..'E'
    explanation     TEXT    NOT NULL DEFAULT '',
    marks           INTEGER NOT NULL DEFAULT 1,
    difficulty      TEXT    NOT NULL DEFAULT 'medium',
    created_at      TEXT    NOT NULL,
    UNIQUE (paper_id, question_number)
);

CREATE TABLE IF NOT EXISTS essay_questions (
    question_id            INTEGER PRIMARY KEY AUTOINCREMENT,
    paper_id               INTEGER NOT NULL REFERENCES past_papers(paper_id) ON DELETE CASCADE,
    topic_id               INTEGER REFERENCES question_topics(question_topic_id) ON DELETE SET NULL,
    question_number        INTEGER NOT NULL,
    section                TEXT    NOT NULL DEFAULT '',
    question_text          TEXT    NOT NULL,
    marks                  INTEGER NOT NULL DEFAULT 10,
    suggested_time_minutes INTEGER NOT NULL DEFAULT 15,
    marking_scheme         TEXT    NOT NULL DEFAULT '',
    sample_answer          TEXT    NOT NULL DEFAULT '',
    difficulty             TEXT    NOT NULL DEFAULT 'medium',
    created_at             TEXT    NOT NULL,
    UNIQUE (paper_id, question_number)
);

CREATE TABLE IF NOT EXISTS essay_sub_questions (
    question_id    INTEGER NOT NULL REFERENCES essay_questions(question_id) ON DELETE CASCADE,
    sub_number     TEXT    NOT NULL,
    question_text  TEXT    NOT NULL,
    marks          INTEGER NOT NULL DEFAULT 5,
    marking_scheme TEXT    NOT NULL DEFAULT '',
    PRIMARY KEY (question_id, sub_number)
);

CREATE INDEX IF NOT EXISTS topics_subject_idx      ON topics(subject_id);
CREATE INDEX IF NOT EXISTS lessons_topic_idx       ON lessons(topic_id);
CREATE INDEX IF NOT EXISTS completions_lesson_idx  ON lesson_completions(lesson_id);
CREATE INDEX IF NOT EXISTS auth_tokens_user_idx    ON auth_tokens(user_id);
CREATE INDEX IF NOT EXISTS question_topics_subject ON question_topics(subject_id);
CREATE INDEX IF NOT EXISTS past_papers_year_idx    ON past_papers(year);

PRAGMA user_version = 1;
";
