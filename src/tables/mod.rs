pub mod catalog;
pub mod duplicates;
pub mod merge;

pub use catalog::{read_list_file, scan_plot_dbs, write_list_file};
pub use duplicates::{extract_all_duplicates, DuplicateReport};
pub use merge::{merge_databases, MergeReport};

use crate::error::Result;
use rusqlite::Connection;

/// Payload columns of `credible_set_table` — every column except the
/// synthetic `id`. Two rows with identical payloads are duplicates.
pub const PAYLOAD_COLUMNS: [&str; 17] = [
    "study_id",
    "study_label",
    "dataset_id",
    "molecular_trait_id",
    "gene_id",
    "gene_name",
    "variant",
    "rsid",
    "quantification_method",
    "credible_set",
    "credible_set_size",
    "pip",
    "pvalue",
    "beta",
    "se",
    "dataset_label",
    "plot_variant",
];

pub(crate) fn payload_column_list() -> String {
    PAYLOAD_COLUMNS.join(", ")
}

/// Creates `credible_set_table` in the given schema ("main", "outdb", ...).
pub(crate) fn create_plot_table(conn: &Connection, schema: &str) -> Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE {schema}.credible_set_table (
            id INTEGER PRIMARY KEY NOT NULL,
            study_id TEXT,
            study_label TEXT,
            dataset_id TEXT,
            molecular_trait_id TEXT,
            gene_id TEXT,
            gene_name TEXT,
            variant TEXT,
            rsid TEXT,
            quantification_method TEXT,
            credible_set TEXT,
            credible_set_size INTEGER,
            pip FLOAT,
            pvalue FLOAT,
            beta FLOAT,
            se FLOAT,
            dataset_label TEXT,
            plot_variant TEXT
        );"
    ))?;
    Ok(())
}
