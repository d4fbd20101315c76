//! Account statement workbook rendering.

use async_trait::async_trait;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, XlsxError};
use stmtbot_core::{DocumentExporter, ExportError, TabularArtifact, XLSX_MIME};
use tracing::info;

use crate::{NAME_COLUMN, Row, RowSource};

/// Headers of the delivered statement, paired with `SOURCE_COLUMNS`.
pub const HEADERS: [&str; 7] = [
    "Name 1",
    "Invoice number",
    "CO E-Invoice No.",
    "Outstanding balance",
    "Billing Date",
    "Due date",
    "Days overdue",
];

/// Sheet columns projected into the statement.
pub const SOURCE_COLUMNS: [usize; 7] = [NAME_COLUMN, 3, 4, 9, 10, 11, 12];

const WORKSHEET_NAME: &str = "Estado de Cuenta";
const HEADER_COLOR: u32 = 0x00D0_1E26;
const MIN_COLUMN_WIDTH: usize = 15;
const MAX_COLUMN_WIDTH: usize = 255;

/// `DocumentExporter` producing an `.xlsx` statement in memory.
pub struct SheetExporter<S> {
    source: S,
}

impl<S: RowSource> SheetExporter<S> {
    pub const fn new(source: S) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S: RowSource> DocumentExporter for SheetExporter<S> {
    async fn export(
        &self,
        primary_key: &str,
        verification_key: &str,
    ) -> Result<Option<TabularArtifact>, ExportError> {
        let rows: Vec<Row> = self
            .source
            .fetch_rows()
            .await?
            .into_iter()
            .filter(|row| row.matches_pair(primary_key, verification_key))
            .collect();

        let Some(first) = rows.first() else {
            return Ok(None);
        };

        let file_name = format!("estado_cuenta_{}.xlsx", file_stem(first.cell(NAME_COLUMN)));
        let table = project(&rows);
        let bytes = render(&table).map_err(|e| ExportError::Render(e.to_string()))?;

        info!("Rendered statement {file_name} with {} rows", rows.len());
        Ok(Some(TabularArtifact {
            file_name,
            mime_type: XLSX_MIME.to_string(),
            bytes,
        }))
    }
}

/// Replace everything outside `[A-Za-z0-9_-]` so the name is safe as a file name.
fn file_stem(name: &str) -> String {
    if name.is_empty() {
        return "usuario".to_string();
    }
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn project(rows: &[Row]) -> Vec<[&str; 7]> {
    rows.iter()
        .map(|row| SOURCE_COLUMNS.map(|column| row.cell(column)))
        .collect()
}

/// Width per column: longest cell (header included) plus padding, at least 15.
fn column_widths(table: &[[&str; 7]]) -> [usize; 7] {
    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in table {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths.map(|longest| {
        if longest < MIN_COLUMN_WIDTH {
            MIN_COLUMN_WIDTH
        } else {
            (longest + 2).min(MAX_COLUMN_WIDTH)
        }
    })
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_COLOR))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Thin)
}

fn render(table: &[[&str; 7]]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(WORKSHEET_NAME)?;

    let header = header_format();
    for (col, title) in (0u16..).zip(HEADERS) {
        worksheet.write_string_with_format(0, col, title, &header)?;
    }

    for (row_index, row) in (1u32..).zip(table) {
        for (col, cell) in (0u16..).zip(row) {
            worksheet.write_string(row_index, col, *cell)?;
        }
    }

    for (col, width) in (0u16..).zip(column_widths(table)) {
        let width = u32::try_from(width).unwrap_or(u32::MAX);
        worksheet.set_column_width(col, f64::from(width))?;
    }

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement_row(pk: &str, vk: &str, name: &str, invoice: &str) -> Row {
        let mut cells = vec![String::new(); 13];
        cells[0] = pk.to_string();
        cells[1] = vk.to_string();
        cells[2] = name.to_string();
        cells[3] = invoice.to_string();
        cells[4] = format!("FE-{invoice}");
        cells[9] = "1.250.000".to_string();
        cells[10] = "2024-01-05".to_string();
        cells[11] = "2024-02-04".to_string();
        cells[12] = "12".to_string();
        Row::new(cells)
    }

    #[test]
    fn test_file_stem_sanitizes() {
        assert_eq!(file_stem("Andina S.A.S. Ñ"), "Andina_S_A_S___");
        assert_eq!(file_stem("ok_name-1"), "ok_name-1");
        assert_eq!(file_stem(""), "usuario");
    }

    #[test]
    fn test_projection_picks_fixed_columns() {
        let rows = vec![statement_row("1", "2", "Andina", "F100")];
        let table = project(&rows);
        assert_eq!(
            table[0],
            ["Andina", "F100", "FE-F100", "1.250.000", "2024-01-05", "2024-02-04", "12"]
        );
    }

    #[test]
    fn test_short_rows_project_empty_cells() {
        let rows = vec![Row::new(["1", "2", "Andina"])];
        let table = project(&rows);
        assert_eq!(table[0], ["Andina", "", "", "", "", "", ""]);
    }

    #[test]
    fn test_column_widths() {
        let long_name = "Comercializadora Internacional Andina";
        let rows = vec![statement_row("1", "2", long_name, "F1")];
        let widths = column_widths(&project(&rows));
        assert_eq!(widths[0], long_name.chars().count() + 2);
        assert_eq!(widths[1], "Invoice number".len().max(MIN_COLUMN_WIDTH));
        assert_eq!(widths[3], "Outstanding balance".len() + 2);
        assert_eq!(widths[6], MIN_COLUMN_WIDTH);
    }

    #[tokio::test]
    async fn test_export_filters_by_both_keys() {
        let exporter = SheetExporter::new(vec![
            statement_row("900111222", "4455", "Andina SAS", "F1"),
            statement_row("900111222", "4455", "Andina SAS", "F2"),
            statement_row("900111222", "9999", "Andina SAS", "F3"),
            statement_row("800000000", "4455", "Otra", "F4"),
        ]);

        let artifact = exporter.export("900111222", "4455").await.ok().flatten();
        let Some(artifact) = artifact else {
            panic!("expected an artifact");
        };
        assert_eq!(artifact.file_name, "estado_cuenta_Andina_SAS.xlsx");
        assert_eq!(artifact.mime_type, XLSX_MIME);
        assert!(artifact.bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_export_without_rows_is_empty() {
        let exporter = SheetExporter::new(vec![statement_row("1", "2", "x", "F1")]);
        assert!(matches!(exporter.export("1", "3").await, Ok(None)));
    }

    #[tokio::test]
    async fn test_export_ignores_blank_rows() {
        let exporter = SheetExporter::new(vec![Row::new(Vec::<String>::new()), Row::default()]);
        assert!(matches!(exporter.export(" ", "").await, Ok(None)));
    }
}
