use crate::error::Result;
use crate::tables::{create_plot_table, payload_column_list, PAYLOAD_COLUMNS};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct MergeReport {
    pub output: PathBuf,
    pub per_file: Vec<(PathBuf, u64)>,
    pub merged_rows: u64,
}

impl MergeReport {
    pub fn total_input_rows(&self) -> u64 {
        self.per_file.iter().map(|(_, count)| count).sum()
    }

    pub fn duplicates_removed(&self) -> u64 {
        self.total_input_rows().saturating_sub(self.merged_rows)
    }
}

/// Merges the listed databases into one deduplicated output database and
/// builds the plotting indexes. An existing output file is replaced.
///
/// Deduplication treats two rows as equal when every payload column matches,
/// with NULLs folded to a sentinel so they compare equal too. Source ids are
/// discarded; the output assigns fresh sequential ids in input order.
pub fn merge_databases(
    inputs: &[PathBuf],
    output: &Path,
    progress: Option<&dyn Fn(usize, &Path)>,
) -> Result<MergeReport> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    if output.exists() {
        std::fs::remove_file(output)?;
    }

    let conn = Connection::open(output)?;
    conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;

    create_plot_table(&conn, "main")?;

    // Payload-wide unique index used only while merging; INSERT OR IGNORE
    // against it drops exact duplicates across all inputs.
    let dedup_expr = PAYLOAD_COLUMNS
        .iter()
        .map(|column| format!("ifnull(CAST({} AS TEXT), '__NULL__')", column))
        .collect::<Vec<_>>()
        .join(", ");
    conn.execute_batch(&format!(
        "CREATE UNIQUE INDEX uq_full_row_tmp ON credible_set_table({dedup_expr});"
    ))?;

    let mut per_file = Vec::with_capacity(inputs.len());
    for (source_order, source_path) in inputs.iter().enumerate() {
        if let Some(callback) = progress {
            callback(source_order, source_path);
        }

        let alias = format!("src_{}", source_order);
        conn.execute(
            &format!("ATTACH DATABASE ?1 AS {alias};"),
            [source_path.display().to_string()],
        )?;

        let attach_result = (|| -> Result<u64> {
            let row_count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {alias}.credible_set_table;"),
                [],
                |row| row.get(0),
            )?;

            let columns = payload_column_list();
            conn.execute(
                &format!(
                    "INSERT OR IGNORE INTO credible_set_table ({columns})
                     SELECT {columns} FROM {alias}.credible_set_table ORDER BY id;"
                ),
                [],
            )?;

            Ok(row_count as u64)
        })();

        // The source stays attached only for the duration of its insert.
        conn.execute_batch(&format!("DETACH DATABASE {alias};"))?;
        per_file.push((source_path.clone(), attach_result?));
    }

    create_final_indexes(&conn)?;

    let merged_rows: i64 =
        conn.query_row("SELECT COUNT(*) FROM credible_set_table;", [], |row| {
            row.get(0)
        })?;

    Ok(MergeReport {
        output: output.to_path_buf(),
        per_file,
        merged_rows: merged_rows as u64,
    })
}

fn create_final_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DROP INDEX uq_full_row_tmp;
         CREATE INDEX idx_molecular_trait_id ON credible_set_table(molecular_trait_id);
         CREATE INDEX idx_gene_name ON credible_set_table(gene_name);
         CREATE INDEX idx_credible_set ON credible_set_table(credible_set);
         CREATE INDEX idx_variant ON credible_set_table(variant);
         CREATE INDEX idx_rsid ON credible_set_table(rsid);
         CREATE INDEX idx_dataset ON credible_set_table(study_label);
         CREATE INDEX idx_for_plotting ON credible_set_table(dataset_id, gene_id, molecular_trait_id, variant);",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::create_plot_table;
    use tempfile::TempDir;

    fn make_source_db(path: &Path, rows: &[(&str, Option<&str>, f64)]) {
        let conn = Connection::open(path).unwrap();
        create_plot_table(&conn, "main").unwrap();
        for (gene_id, rsid, pip) in rows {
            conn.execute(
                "INSERT INTO credible_set_table (study_id, gene_id, rsid, pip)
                 VALUES ('QTS000001', ?1, ?2, ?3)",
                rusqlite::params![gene_id, rsid, pip],
            )
            .unwrap();
        }
    }

    #[test]
    fn test_merge_deduplicates_across_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("QTS000001.sqlite");
        let b = temp_dir.path().join("QTS000002.sqlite");
        make_source_db(&a, &[("ENSG1", Some("rs1"), 0.9), ("ENSG2", Some("rs2"), 0.5)]);
        make_source_db(&b, &[("ENSG1", Some("rs1"), 0.9), ("ENSG3", Some("rs3"), 0.1)]);

        let output = temp_dir.path().join("merged.sqlite");
        let report = merge_databases(&[a, b], &output, None).unwrap();

        assert_eq!(report.total_input_rows(), 4);
        assert_eq!(report.merged_rows, 3);
        assert_eq!(report.duplicates_removed(), 1);
    }

    #[test]
    fn test_merge_treats_nulls_as_equal() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("QTS000001.sqlite");
        make_source_db(&a, &[("ENSG1", None, 0.9), ("ENSG1", None, 0.9)]);

        let output = temp_dir.path().join("merged.sqlite");
        let report = merge_databases(&[a], &output, None).unwrap();

        assert_eq!(report.merged_rows, 1);
    }

    #[test]
    fn test_merge_replaces_existing_output() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("QTS000001.sqlite");
        make_source_db(&a, &[("ENSG1", Some("rs1"), 0.9)]);

        let output = temp_dir.path().join("merged.sqlite");
        std::fs::write(&output, b"stale").unwrap();

        let report = merge_databases(&[a], &output, None).unwrap();
        assert_eq!(report.merged_rows, 1);
    }

    #[test]
    fn test_merge_builds_plotting_indexes() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("QTS000001.sqlite");
        make_source_db(&a, &[("ENSG1", Some("rs1"), 0.9)]);

        let output = temp_dir.path().join("merged.sqlite");
        merge_databases(&[a], &output, None).unwrap();

        let conn = Connection::open(&output).unwrap();
        let index_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(index_count, 7);

        // The merge-time dedup index must be gone from the final output.
        let tmp_index: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'uq_full_row_tmp'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tmp_index, 0);
    }

    #[test]
    fn test_merge_reports_progress_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("QTS000001.sqlite");
        let b = temp_dir.path().join("QTS000002.sqlite");
        make_source_db(&a, &[("ENSG1", Some("rs1"), 0.9)]);
        make_source_db(&b, &[("ENSG2", Some("rs2"), 0.5)]);

        let seen = std::cell::RefCell::new(Vec::new());
        let callback = |index: usize, _path: &Path| {
            seen.borrow_mut().push(index);
        };

        let output = temp_dir.path().join("merged.sqlite");
        merge_databases(&[a, b], &output, Some(&callback)).unwrap();
        assert_eq!(*seen.borrow(), vec![0, 1]);
    }
}
