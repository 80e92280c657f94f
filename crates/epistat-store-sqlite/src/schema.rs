//! SQL schema for the epistat SQLite store.
//!
//! Executed once at connection startup. The count columns of the imported
//! tables are declared without a type so SQLite applies no affinity and
//! stores each imported cell exactly as the loader typed it.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS covid_deaths (
    location     TEXT    NOT NULL,
    continent    TEXT,              -- NULL for aggregate rows ('World', 'Asia', ...)
    date         TEXT    NOT NULL,  -- ISO 8601 calendar date
    population   INTEGER NOT NULL DEFAULT 0,
    total_cases,
    new_cases,
    total_deaths,
    new_deaths,
    PRIMARY KEY (location, date)
);

CREATE TABLE IF NOT EXISTS covid_vaccinations (
    location         TEXT NOT NULL,
    date             TEXT NOT NULL,
    new_vaccinations,
    PRIMARY KEY (location, date)
);

-- Rewritten wholesale by every materialisation run.
CREATE TABLE IF NOT EXISTS percent_population_vaccinated (
    continent          TEXT,
    location           TEXT    NOT NULL,
    date               TEXT    NOT NULL,
    population         INTEGER NOT NULL,
    new_vaccinations   INTEGER,
    rolling_vaccinated INTEGER NOT NULL
);

CREATE VIEW IF NOT EXISTS v_percent_population_vaccinated AS
SELECT
    continent,
    location,
    date,
    population,
    new_vaccinations,
    rolling_vaccinated,
    CASE
        WHEN population = 0 THEN NULL
        ELSE rolling_vaccinated * 100.0 / population
    END AS percent_population_vaccinated
FROM percent_population_vaccinated;

PRAGMA user_version = 1;
";
