use crate::error::Result;
use crate::tables::{create_plot_table, payload_column_list};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DuplicateReport {
    pub per_file: Vec<(PathBuf, u64)>,
    pub total_rows: u64,
}

/// Extracts duplicated payload rows from each input database into its own
/// output database under `output_dir`. For every duplicated payload group,
/// exactly the two lowest-id rows are written, keeping their source ids.
pub fn extract_all_duplicates(
    inputs: &[PathBuf],
    output_dir: &Path,
    progress: Option<&dyn Fn(usize, &Path)>,
) -> Result<DuplicateReport> {
    std::fs::create_dir_all(output_dir)?;

    let mut per_file = Vec::with_capacity(inputs.len());
    let mut total_rows = 0;

    for (index, source_path) in inputs.iter().enumerate() {
        if let Some(callback) = progress {
            callback(index, source_path);
        }

        let output_db = output_dir.join(output_name_for(source_path, index + 1));
        let rows = extract_duplicates_for_file(source_path, &output_db)?;
        total_rows += rows;
        per_file.push((output_db, rows));
    }

    Ok(DuplicateReport {
        per_file,
        total_rows,
    })
}

/// Output name `NN_<grandparent>__<parent>__duplicates.sqlite`, so per-input
/// outputs from nested study/dataset directories stay distinguishable.
pub fn output_name_for(source_path: &Path, index: usize) -> String {
    let parent_name = directory_name(source_path.parent());
    let grandparent_name = directory_name(source_path.parent().and_then(|p| p.parent()));
    format!("{index:02}_{grandparent_name}__{parent_name}__duplicates.sqlite")
}

fn directory_name(path: Option<&Path>) -> String {
    path.and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("root")
        .to_string()
}

fn extract_duplicates_for_file(source_db: &Path, output_db: &Path) -> Result<u64> {
    if output_db.exists() {
        std::fs::remove_file(output_db)?;
    }

    let conn = Connection::open(source_db)?;
    conn.execute(
        "ATTACH DATABASE ?1 AS outdb;",
        [output_db.display().to_string()],
    )?;

    let result = extract_into_attached(&conn);
    conn.execute_batch("DETACH DATABASE outdb;")?;
    result
}

fn extract_into_attached(conn: &Connection) -> Result<u64> {
    create_plot_table(conn, "outdb")?;

    let columns = payload_column_list();
    conn.execute(
        &format!(
            "INSERT INTO outdb.credible_set_table (id, {columns})
             SELECT id, {columns}
             FROM (
                 SELECT
                     id,
                     {columns},
                     ROW_NUMBER() OVER (
                         PARTITION BY {columns}
                         ORDER BY id
                     ) AS rn,
                     COUNT(*) OVER (
                         PARTITION BY {columns}
                     ) AS grp_count
                 FROM credible_set_table
             ) ranked
             WHERE grp_count > 1
               AND rn <= 2
             ORDER BY id;"
        ),
        [],
    )?;

    let row_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM outdb.credible_set_table;",
        [],
        |row| row.get(0),
    )?;
    Ok(row_count as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::create_plot_table;
    use tempfile::TempDir;

    fn make_source_db(path: &Path, genes: &[&str]) {
        let conn = Connection::open(path).unwrap();
        create_plot_table(&conn, "main").unwrap();
        for gene_id in genes {
            conn.execute(
                "INSERT INTO credible_set_table (study_id, gene_id, rsid)
                 VALUES ('QTS000001', ?1, 'rs1')",
                [gene_id],
            )
            .unwrap();
        }
    }

    #[test]
    fn test_output_name_for() {
        let source = Path::new("/gpfs/coverage_plots/GTEx_V10/QTS000001/QTS000001.sqlite");
        assert_eq!(
            output_name_for(source, 3),
            "03_GTEx_V10__QTS000001__duplicates.sqlite"
        );
    }

    #[test]
    fn test_output_name_for_shallow_path() {
        let source = Path::new("/QTS000001.sqlite");
        assert_eq!(
            output_name_for(source, 1),
            "01_root__root__duplicates.sqlite"
        );
    }

    #[test]
    fn test_extracts_two_lowest_ids_per_group() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("QTS000001.sqlite");
        // Three identical payload rows (ids 1..3) and one unique row (id 4).
        make_source_db(&source, &["ENSG1", "ENSG1", "ENSG1", "ENSG2"]);

        let report =
            extract_all_duplicates(&[source], &temp_dir.path().join("dups"), None).unwrap();
        assert_eq!(report.total_rows, 2);

        let (output_db, rows) = &report.per_file[0];
        assert_eq!(*rows, 2);

        let conn = Connection::open(output_db).unwrap();
        let ids: Vec<i64> = conn
            .prepare("SELECT id FROM credible_set_table ORDER BY id")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_no_duplicates_yields_empty_output() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("QTS000001.sqlite");
        make_source_db(&source, &["ENSG1", "ENSG2"]);

        let report =
            extract_all_duplicates(&[source], &temp_dir.path().join("dups"), None).unwrap();
        assert_eq!(report.total_rows, 0);
        assert!(report.per_file[0].0.exists());
    }

    #[test]
    fn test_per_input_outputs_are_separate() {
        let temp_dir = TempDir::new().unwrap();
        let dir_a = temp_dir.path().join("study/QTS000001");
        let dir_b = temp_dir.path().join("study/QTS000002");
        std::fs::create_dir_all(&dir_a).unwrap();
        std::fs::create_dir_all(&dir_b).unwrap();

        let a = dir_a.join("QTS000001.sqlite");
        let b = dir_b.join("QTS000002.sqlite");
        make_source_db(&a, &["ENSG1", "ENSG1"]);
        make_source_db(&b, &["ENSG2", "ENSG2"]);

        let report =
            extract_all_duplicates(&[a, b], &temp_dir.path().join("dups"), None).unwrap();
        assert_eq!(report.per_file.len(), 2);
        assert_eq!(report.total_rows, 4);
        assert_ne!(report.per_file[0].0, report.per_file[1].0);
    }
}
