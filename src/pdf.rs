use std::collections::BTreeSet;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use printpdf::*;
use tracing::{debug, info};

use crate::error::{Result, TallyError};
use crate::fmt::{currency, hours, long_date, money, short_date};
use crate::reports::{DetailRow, ReportFilters, ReportSummary};

// A4 dimensions (mm)
const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 20.0;
const MARGIN_LEFT: f32 = 20.0;
const CELL_PAD: f32 = 1.5;
const TITLE_SIZE: f32 = 24.0;
const SUBTITLE_SIZE: f32 = 12.0;
const HEADING_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 10.0;
const DETAIL_SIZE: f32 = 9.0;
const FOOTER_SIZE: f32 = 8.0;

const PRIMARY: (f32, f32, f32) = (139.0, 92.0, 246.0);
const GRAY: (f32, f32, f32) = (107.0, 114.0, 128.0);
const LIGHT_GRAY: (f32, f32, f32) = (243.0, 244.0, 246.0);
const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);
const WHITE: (f32, f32, f32) = (255.0, 255.0, 255.0);
const GRID: (f32, f32, f32) = (200.0, 200.0, 200.0);

pub const REPORT_TITLE: &str = "Time Tracking Report";

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.18
}

fn line_height(size: f32) -> f32 {
    size * 0.45
}

fn rgb((r, g, b): (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(r / 255.0, g / 255.0, b / 255.0, None))
}

// ---------------------------------------------------------------------------
// Layout plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Col {
    pub width: f32,
    pub align: Align,
    pub bold: bool,
}

const fn col(width: f32, align: Align) -> Col {
    Col { width, align, bold: false }
}

const SUMMARY_COLS: &[Col] = &[
    Col { width: 60.0, align: Align::Left, bold: true },
    col(60.0, Align::Left),
];
const CLIENT_COLS: &[Col] = &[
    col(70.0, Align::Left),
    col(30.0, Align::Center),
    col(40.0, Align::Right),
    col(30.0, Align::Center),
];
const MONTHLY_COLS: &[Col] = &[
    col(50.0, Align::Left),
    col(30.0, Align::Center),
    col(40.0, Align::Right),
    col(30.0, Align::Center),
];
const DETAIL_COLS: &[Col] = &[
    col(25.0, Align::Center),
    col(35.0, Align::Left),
    col(65.0, Align::Left),
    col(20.0, Align::Center),
    col(25.0, Align::Right),
];

#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    pub title: &'static str,
    pub headers: &'static [&'static str],
    pub cols: &'static [Col],
    pub rows: Vec<Vec<String>>,
    pub font_size: f32,
    pub striped: bool,
}

/// Everything the renderer draws, in order. Pure data so layout rules can be
/// checked without parsing PDF output.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPlan {
    pub title: &'static str,
    pub period_line: String,
    pub generated_line: String,
    /// Summary, then the optional client and monthly breakdowns.
    pub front: Vec<TableSpec>,
    /// Always starts on a fresh page; its pages carry "Page X of Y".
    pub details: TableSpec,
    pub file_name: String,
}

impl ReportPlan {
    pub fn has_table(&self, title: &str) -> bool {
        self.front.iter().any(|t| t.title == title)
    }
}

pub fn plan_report(
    summary: &ReportSummary,
    filters: &ReportFilters,
    rows: &[DetailRow],
    generated_on: NaiveDate,
) -> ReportPlan {
    let selected: BTreeSet<i64> = filters.client_ids.iter().copied().collect();
    let clients_label = if selected.is_empty() {
        "All Clients".to_string()
    } else {
        format!("{} Selected", selected.len())
    };

    let mut front = vec![TableSpec {
        title: "Summary",
        headers: &["Metric", "Value"],
        cols: SUMMARY_COLS,
        rows: vec![
            vec!["Total Hours".into(), hours(summary.total_hours)],
            vec!["Total Amount".into(), money(summary.total_amount)],
            vec!["Number of Entries".into(), summary.entries_count.to_string()],
            vec!["Clients".into(), clients_label],
        ],
        font_size: BODY_SIZE,
        striped: false,
    }];

    if summary.client_reports.len() > 1 {
        front.push(TableSpec {
            title: "Client Breakdown",
            headers: &["Client", "Hours", "Amount", "Entries"],
            cols: CLIENT_COLS,
            rows: summary
                .client_reports
                .iter()
                .map(|c| {
                    vec![
                        c.client_name.clone(),
                        hours(c.total_hours),
                        currency(c.total_amount, &c.currency),
                        c.entries_count.to_string(),
                    ]
                })
                .collect(),
            font_size: BODY_SIZE,
            striped: false,
        });
    }

    let active_months: Vec<_> = summary
        .monthly_reports
        .iter()
        .filter(|m| m.total_hours > 0.0)
        .collect();
    if filters.month.is_none() && !active_months.is_empty() {
        front.push(TableSpec {
            title: "Monthly Breakdown",
            headers: &["Month", "Hours", "Amount", "Entries"],
            cols: MONTHLY_COLS,
            rows: active_months
                .iter()
                .map(|m| {
                    vec![
                        m.month_name.clone(),
                        hours(m.total_hours),
                        money(m.total_amount),
                        m.entries_count.to_string(),
                    ]
                })
                .collect(),
            font_size: BODY_SIZE,
            striped: false,
        });
    }

    let mut sorted: Vec<&DetailRow> = rows.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    let details = TableSpec {
        title: "Detailed Time Entries",
        headers: &["Date", "Client", "Description", "Hours", "Amount"],
        cols: DETAIL_COLS,
        rows: sorted
            .into_iter()
            .map(|r| {
                vec![
                    short_date(r.date),
                    r.client_name.clone(),
                    r.description.clone(),
                    hours(r.hours),
                    currency(r.amount, &r.currency),
                ]
            })
            .collect(),
        font_size: DETAIL_SIZE,
        striped: true,
    };

    ReportPlan {
        title: REPORT_TITLE,
        period_line: format!("Report Period: {}", filters.period_label()),
        generated_line: format!("Generated: {}", long_date(generated_on)),
        front,
        details,
        file_name: filters.file_name(),
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| TallyError::RenderFailed(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| TallyError::RenderFailed(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            pages: vec![(page, layer)],
            y: MARGIN_TOP,
        })
    }

    fn pdf_y(&self, y: f32) -> f32 {
        PAGE_H - y
    }

    fn layer(&self) -> PdfLayerReference {
        let (page, layer) = self.pages[self.pages.len() - 1];
        self.doc.get_page(page).get_layer(layer)
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
        self.pages.push((page, layer));
        self.y = MARGIN_TOP;
    }

    fn page_number(&self) -> usize {
        self.pages.len()
    }

    fn text(&self, s: &str, x: f32, baseline: f32, size: f32, bold: bool, color: (f32, f32, f32)) {
        let font = if bold { &self.font_bold } else { &self.font };
        let layer = self.layer();
        layer.set_fill_color(rgb(color));
        layer.use_text(s, size, Mm(x), Mm(self.pdf_y(baseline)), font);
    }

    fn fill_rect(&self, x: f32, top: f32, w: f32, h: f32, color: (f32, f32, f32)) {
        let layer = self.layer();
        layer.set_fill_color(rgb(color));
        let rect = Rect::new(
            Mm(x),
            Mm(self.pdf_y(top + h)),
            Mm(x + w),
            Mm(self.pdf_y(top)),
        );
        layer.add_rect(rect);
    }

    fn line(&self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let layer = self.layer();
        layer.set_outline_color(rgb(GRID));
        layer.set_outline_thickness(0.3);
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(self.pdf_y(y1))), false),
                (Point::new(Mm(x2), Mm(self.pdf_y(y2))), false),
            ],
            is_closed: false,
        });
    }

    fn title_block(&mut self, plan: &ReportPlan) {
        self.y += 5.0;
        self.text(plan.title, MARGIN_LEFT, self.y, TITLE_SIZE, true, PRIMARY);
        self.y += 10.0;
        self.text(&plan.period_line, MARGIN_LEFT, self.y, SUBTITLE_SIZE, false, GRAY);
        self.y += 7.0;
        self.text(&plan.generated_line, MARGIN_LEFT, self.y, SUBTITLE_SIZE, false, GRAY);
        self.y += 8.0;
    }

    fn heading(&mut self, label: &str) {
        let needed = 10.0 + 4.0 * line_height(BODY_SIZE);
        if self.y + needed > PAGE_H - MARGIN_BOTTOM {
            self.new_page();
        }
        self.y += 10.0;
        self.text(label, MARGIN_LEFT, self.y, HEADING_SIZE, false, BLACK);
        self.y += 5.0;
    }

    /// Wrap each cell to its column; returns lines per cell and the row height.
    fn layout_row(cols: &[Col], values: &[String], size: f32) -> (Vec<Vec<String>>, f32) {
        let per_char = size * 0.18;
        let cells: Vec<Vec<String>> = cols
            .iter()
            .zip(values)
            .map(|(col, value)| {
                let max_chars = (((col.width - 2.0 * CELL_PAD) / per_char).floor() as usize).max(1);
                textwrap::wrap(value, max_chars)
                    .into_iter()
                    .map(|l| l.into_owned())
                    .collect()
            })
            .collect();
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let height = lines as f32 * line_height(size) + 2.0 * CELL_PAD;
        (cells, height)
    }

    fn draw_cells(&self, cols: &[Col], cells: &[Vec<String>], height: f32, size: f32, header: bool) {
        let mut x = MARGIN_LEFT;
        for (col, lines) in cols.iter().zip(cells) {
            let bold = header || col.bold;
            let color = if header { WHITE } else { BLACK };
            for (i, line) in lines.iter().enumerate() {
                let baseline = self.y + CELL_PAD + line_height(size) * (i as f32 + 0.75);
                let tw = approx_text_width(line, size);
                let tx = match col.align {
                    Align::Left => x + CELL_PAD,
                    Align::Center => x + (col.width - tw) / 2.0,
                    Align::Right => x + col.width - CELL_PAD - tw,
                };
                self.text(line, tx, baseline, size, bold, color);
            }
            x += col.width;
        }
        if !header {
            let width: f32 = cols.iter().map(|c| c.width).sum();
            let bottom = self.y + height;
            self.line(MARGIN_LEFT, self.y, MARGIN_LEFT + width, self.y);
            self.line(MARGIN_LEFT, bottom, MARGIN_LEFT + width, bottom);
            let mut gx = MARGIN_LEFT;
            self.line(gx, self.y, gx, bottom);
            for col in cols {
                gx += col.width;
                self.line(gx, self.y, gx, bottom);
            }
        }
    }

    fn table_header(&mut self, table: &TableSpec) {
        let headers: Vec<String> = table.headers.iter().map(|h| h.to_string()).collect();
        let size = table.font_size + 1.0;
        let (cells, height) = Self::layout_row(table.cols, &headers, size);
        let width: f32 = table.cols.iter().map(|c| c.width).sum();
        self.fill_rect(MARGIN_LEFT, self.y, width, height, PRIMARY);
        self.draw_cells(table.cols, &cells, height, size, true);
        self.y += height;
    }

    fn table(&mut self, table: &TableSpec) {
        self.table_header(table);
        let width: f32 = table.cols.iter().map(|c| c.width).sum();
        for (i, row) in table.rows.iter().enumerate() {
            let (cells, height) = Self::layout_row(table.cols, row, table.font_size);
            if self.y + height > PAGE_H - MARGIN_BOTTOM {
                self.new_page();
                self.table_header(table);
            }
            if table.striped && i % 2 == 1 {
                self.fill_rect(MARGIN_LEFT, self.y, width, height, LIGHT_GRAY);
            }
            self.draw_cells(table.cols, &cells, height, table.font_size, false);
            self.y += height;
        }
    }

    /// Stamp "Page X of Y" on every page from `first` (1-based) onward.
    /// Returns the stamped labels in page order.
    fn number_pages(&self, first: usize) -> Vec<String> {
        let total = self.pages.len();
        let mut labels = Vec::new();
        for (i, (page, layer)) in self.pages.iter().enumerate().skip(first - 1) {
            let label = format!("Page {} of {total}", i + 1);
            let layer = self.doc.get_page(*page).get_layer(*layer);
            layer.set_fill_color(rgb(GRAY));
            layer.use_text(label.as_str(), FOOTER_SIZE, Mm(PAGE_W - 40.0), Mm(10.0), &self.font);
            labels.push(label);
        }
        labels
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| TallyError::RenderFailed(format!("{e:?}")))?;
        buf.into_inner()
            .map_err(|e| TallyError::RenderFailed(e.to_string()))
    }
}

struct Rendered {
    bytes: Vec<u8>,
    page_count: usize,
    first_detail_page: usize,
    /// Footer labels of the detail pages, first detail page first.
    page_labels: Vec<String>,
}

/// Draw a plan into PDF bytes.
pub fn render_plan(plan: &ReportPlan) -> Result<Vec<u8>> {
    draw_plan(plan).map(|r| r.bytes)
}

fn draw_plan(plan: &ReportPlan) -> Result<Rendered> {
    let mut pdf = PdfWriter::new(plan.title)?;
    pdf.title_block(plan);
    for table in &plan.front {
        pdf.heading(table.title);
        pdf.table(table);
    }

    pdf.new_page();
    let first_detail_page = pdf.page_number();
    pdf.y += 5.0;
    pdf.text(plan.details.title, MARGIN_LEFT, pdf.y, HEADING_SIZE, false, BLACK);
    pdf.y += 5.0;
    pdf.table(&plan.details);
    let page_labels = pdf.number_pages(first_detail_page);

    let page_count = pdf.page_number();
    debug!(pages = page_count, first_detail_page, "rendered report pages");
    Ok(Rendered {
        bytes: pdf.to_bytes()?,
        page_count,
        first_detail_page,
        page_labels,
    })
}

/// Render a report as PDF bytes, dated today.
pub fn render_report(
    summary: &ReportSummary,
    filters: &ReportFilters,
    rows: &[DetailRow],
) -> Result<Vec<u8>> {
    let today = chrono::Local::now().date_naive();
    render_plan(&plan_report(summary, filters, rows, today))
}

/// Render and write `<dir>/<file_name>`. The file only appears once fully
/// written; a failure leaves nothing behind.
pub fn export_report(
    summary: &ReportSummary,
    filters: &ReportFilters,
    rows: &[DetailRow],
    dir: &Path,
) -> Result<PathBuf> {
    let write_failed = |e: std::io::Error| {
        TallyError::RenderFailed(format!("cannot write to {}: {e}", dir.display()))
    };
    std::fs::create_dir_all(dir).map_err(write_failed)?;
    let bytes = render_report(summary, filters, rows)?;
    let path = dir.join(filters.file_name());

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_failed)?;
    tmp.write_all(&bytes).map_err(write_failed)?;
    tmp.as_file().sync_all().map_err(write_failed)?;
    tmp.persist(&path).map_err(|e| write_failed(e.error))?;

    info!(path = %path.display(), bytes = bytes.len(), "exported report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::tests::{client, entry, sample_entries, FakeStore};
    use crate::reports::{detail_rows, generate_report, get_detailed_entries, summarize};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 4).unwrap()
    }

    fn yearly() -> ReportFilters {
        ReportFilters::for_year(2024)
    }

    fn plan_for(filters: &ReportFilters) -> ReportPlan {
        let store = FakeStore::new(sample_entries());
        let summary = generate_report(&store, filters).unwrap();
        let rows = detail_rows(&get_detailed_entries(&store, filters).unwrap());
        plan_report(&summary, filters, &rows, today())
    }

    #[test]
    fn test_plan_title_block() {
        let plan = plan_for(&yearly());
        assert_eq!(plan.title, "Time Tracking Report");
        assert_eq!(plan.period_line, "Report Period: 2024");
        assert_eq!(plan.generated_line, "Generated: July 4, 2024");

        let june = ReportFilters { month: Some(6), ..yearly() };
        assert_eq!(plan_for(&june).period_line, "Report Period: June 2024");
    }

    #[test]
    fn test_summary_rows_in_fixed_order() {
        let plan = plan_for(&yearly());
        let summary = &plan.front[0];
        assert_eq!(summary.title, "Summary");
        assert_eq!(summary.headers, &["Metric", "Value"]);
        assert_eq!(
            summary.rows,
            vec![
                vec!["Total Hours".to_string(), "18".to_string()],
                vec!["Total Amount".to_string(), "$1,560.00".to_string()],
                vec!["Number of Entries".to_string(), "3".to_string()],
                vec!["Clients".to_string(), "All Clients".to_string()],
            ]
        );

        let selected = ReportFilters { client_ids: vec![1, 2], ..yearly() };
        assert_eq!(plan_for(&selected).front[0].rows[3][1], "2 Selected");
    }

    #[test]
    fn test_repeated_client_id_selects_one_client() {
        let repeated = ReportFilters { client_ids: vec![1, 1], ..yearly() };
        assert_eq!(plan_for(&repeated).front[0].rows[3][1], "1 Selected");
    }

    #[test]
    fn test_client_breakdown_needs_more_than_one_client() {
        let plan = plan_for(&yearly());
        assert!(plan.has_table("Client Breakdown"));
        let clients = plan.front.iter().find(|t| t.title == "Client Breakdown").unwrap();
        assert_eq!(clients.rows[0][0], "TechCorp");
        assert_eq!(clients.rows[0][2], "$1,020.00");

        let one_client = ReportFilters { client_ids: vec![1], ..yearly() };
        assert!(!plan_for(&one_client).has_table("Client Breakdown"));
    }

    #[test]
    fn test_monthly_breakdown_only_active_months_for_yearly() {
        let plan = plan_for(&yearly());
        let monthly = plan.front.iter().find(|t| t.title == "Monthly Breakdown").unwrap();
        let months: Vec<&str> = monthly.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(months, vec!["January", "February"]);

        let january = ReportFilters { month: Some(1), ..yearly() };
        assert!(!plan_for(&january).has_table("Monthly Breakdown"));
    }

    #[test]
    fn test_monthly_breakdown_omitted_when_year_is_empty() {
        let filters = ReportFilters::for_year(2020);
        let summary = summarize(&[], &filters);
        let plan = plan_report(&summary, &filters, &[], today());
        assert!(!plan.has_table("Monthly Breakdown"));
        assert!(plan.details.rows.is_empty());
    }

    #[test]
    fn test_details_sorted_newest_first() {
        let plan = plan_for(&yearly());
        let dates: Vec<&str> = plan.details.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(dates, vec!["Feb 14, 2024", "Jan 20, 2024", "Jan 15, 2024"]);
        assert_eq!(
            plan.details.headers,
            &["Date", "Client", "Description", "Hours", "Amount"]
        );
    }

    #[test]
    fn test_detail_amount_uses_row_currency() {
        let mut euro = client(5, "Berlin GmbH", 100.0);
        euro.currency = "EUR".into();
        let entries = vec![entry(1, "2024-04-01", 1.5, Some(euro), 5)];
        let filters = yearly();
        let summary = summarize(&entries, &filters);
        let plan = plan_report(&summary, &filters, &detail_rows(&entries), today());
        assert_eq!(plan.details.rows[0][4], "\u{20ac}150.00");
    }

    #[test]
    fn test_file_name_follows_filters() {
        let june = ReportFilters { month: Some(6), ..yearly() };
        assert_eq!(plan_for(&june).file_name, "time-report-2024-06.pdf");
        assert_eq!(plan_for(&yearly()).file_name, "time-report-2024.pdf");
    }

    #[test]
    fn test_render_produces_pdf() {
        let plan = plan_for(&yearly());
        let bytes = render_plan(&plan).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_empty_report_produces_pdf() {
        let filters = yearly();
        let summary = summarize(&[], &filters);
        let bytes = render_report(&summary, &filters, &[]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    fn long_plan() -> ReportPlan {
        let c = client(1, "TechCorp", 85.0);
        let entries: Vec<_> = (0..150)
            .map(|i| {
                let mut e = entry(i, "2024-03-01", 0.5, Some(c.clone()), 1);
                e.description = "Frontend development - React components with a long description that wraps".into();
                e
            })
            .collect();
        let filters = yearly();
        let summary = summarize(&entries, &filters);
        plan_report(&summary, &filters, &detail_rows(&entries), today())
    }

    #[test]
    fn test_render_many_rows_spans_pages() {
        let rendered = draw_plan(&long_plan()).unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert!(rendered.page_count > rendered.first_detail_page);
    }

    #[test]
    fn test_details_start_on_fresh_numbered_page() {
        let rendered = draw_plan(&long_plan()).unwrap();
        let first = rendered.first_detail_page;
        let total = rendered.page_count;
        assert!(first > 1);
        assert_eq!(rendered.page_labels.len(), total - first + 1);
        for (k, label) in rendered.page_labels.iter().enumerate() {
            assert_eq!(label, &format!("Page {} of {total}", first + k));
        }
    }

    #[test]
    fn test_short_report_numbers_only_detail_page() {
        let rendered = draw_plan(&plan_for(&yearly())).unwrap();
        assert_eq!(rendered.first_detail_page, 2);
        assert_eq!(rendered.page_count, 2);
        assert_eq!(rendered.page_labels, vec!["Page 2 of 2".to_string()]);
    }

    #[test]
    fn test_export_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let filters = ReportFilters { month: Some(1), ..yearly() };
        let store = FakeStore::new(sample_entries());
        let summary = generate_report(&store, &filters).unwrap();
        let rows = detail_rows(&get_detailed_entries(&store, &filters).unwrap());
        let path = export_report(&summary, &filters, &rows, dir.path()).unwrap();

        assert_eq!(path, dir.path().join("time-report-2024-01.pdf"));
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_export_into_unwritable_dir_is_render_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let filters = yearly();
        let summary = summarize(&[], &filters);
        let err = export_report(&summary, &filters, &[], &blocker.join("out")).unwrap_err();
        assert!(matches!(err, TallyError::RenderFailed(_)), "got {err:?}");
    }
}
