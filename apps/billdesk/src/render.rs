//! # Receipt Rendering
//!
//! Turns a stored bill plus the shop header into printable bytes, and
//! archives them under the bills directory.
//!
//! ## Receipt Layout
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    ASHA GENERAL STORE                      │  shop name
//! │                      12 market road                        │  address
//! │                  Email: asha@shop.in                       │
//! │                                                            │
//! │  Bill No:  48213            Date:  2026-10-15 10:20:30     │
//! │  Customer: Ravi             Phone: 98765                   │
//! │                                                            │
//! │  Sr.  Product Name              Price   Qty      Total     │
//! │  1    Hand Sanitizer           ₹20.00     2     ₹40.00     │
//! │  ...                                                       │
//! │                                                            │
//! │  Medical Items Total:                           ₹40.00     │  non-zero
//! │  Medical Tax (5%):                               ₹2.00     │  lines only
//! │  Total Bill Amount:                             ₹77.35     │
//! │                                                            │
//! │             Thank you for shopping with us!                │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both renderers share [`receipt_lines`]. The PDF sets the lines on A4
//! pages in Courier, which has no rupee glyph, so amounts read `Rs.77.35`.
//!
//! Tax percentages come from the `TaxTable` passed in, not from the bill.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use billdesk_core::{Bill, Category, Money, ShopDetails, TaxTable};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

const WIDTH: usize = 60;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to build PDF: {0}")]
    Pdf(String),

    #[error("Failed to write receipt: {0}")]
    Io(#[from] std::io::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Produces the bytes of a receipt.
pub trait Renderer: Send + Sync {
    fn render(&self, bill: &Bill, shop: &ShopDetails, taxes: &TaxTable) -> RenderResult<Vec<u8>>;

    /// File extension for archived receipts, without the dot.
    fn extension(&self) -> &'static str;
}

/// Archived receipt format, `[receipts] format` in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptFormat {
    #[default]
    Pdf,
    Text,
}

impl ReceiptFormat {
    pub fn renderer(self) -> Arc<dyn Renderer> {
        match self {
            ReceiptFormat::Pdf => Arc::new(PdfReceiptRenderer),
            ReceiptFormat::Text => Arc::new(TextReceiptRenderer),
        }
    }
}

impl std::str::FromStr for ReceiptFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(ReceiptFormat::Pdf),
            "text" | "txt" => Ok(ReceiptFormat::Text),
            other => Err(format!("unknown receipt format '{}'", other)),
        }
    }
}

// =============================================================================
// Layout
// =============================================================================

/// The receipt as fixed-width lines, amounts prefixed with `currency`.
pub fn receipt_lines(
    bill: &Bill,
    shop: &ShopDetails,
    taxes: &TaxTable,
    currency: &str,
) -> Vec<String> {
    let money = |amount: Money| format!("{}{}", currency, amount);
    let summary = |label: &str, amount: Money| format!("{:<40}{:>20}", label, money(amount));
    let rule = "-".repeat(WIDTH);
    let mut lines = Vec::new();

    // Header
    lines.push(centered(&shop.shop_name.to_uppercase()));
    lines.push(centered(&capitalize(&shop.shop_address)));
    lines.push(centered(&format!("Email: {}", shop.email)));
    lines.push(String::new());

    let date = bill.created_at().format("%Y-%m-%d %H:%M:%S").to_string();
    lines.push(format!(
        "{:<10}{:<20}{:<7}{}",
        "Bill No:",
        bill.bill_no(),
        "Date:",
        date
    ));
    lines.push(format!(
        "{:<10}{:<20}{:<7}{}",
        "Customer:",
        bill.customer_name(),
        "Phone:",
        bill.customer_phone()
    ));
    lines.push(String::new());

    // Items
    lines.push(format!(
        "{:<5}{:<26}{:>10}{:>6}{:>13}",
        "Sr.", "Product Name", "Price", "Qty", "Total"
    ));
    lines.push(rule.clone());
    for (i, item) in bill.items().iter().enumerate() {
        lines.push(format!(
            "{:<5}{:<26}{:>10}{:>6}{:>13}",
            i + 1,
            truncate(item.product_name(), 25),
            money(item.unit_price()),
            item.quantity(),
            money(item.line_total())
        ));
    }
    lines.push(rule);

    // Summary
    let breakdown = bill.breakdown();
    for (category, totals) in breakdown.iter() {
        if totals.subtotal.is_positive() {
            lines.push(summary(subtotal_label(category), totals.subtotal));
        }
    }
    for (category, totals) in breakdown.iter() {
        if totals.tax.is_positive() {
            let label = format!("{} ({}):", tax_label(category), taxes.rate_for(category));
            lines.push(summary(&label, totals.tax));
        }
    }
    lines.push(String::new());
    lines.push(summary("Total Bill Amount:", bill.total_amount()));
    lines.push(String::new());
    lines.push(centered("Thank you for shopping with us!"));

    lines
}

fn subtotal_label(category: Category) -> &'static str {
    match category {
        Category::Medical => "Medical Items Total:",
        Category::Grocery => "Grocery Items Total:",
        Category::Drinks => "Cold Drinks Total:",
    }
}

fn tax_label(category: Category) -> &'static str {
    match category {
        Category::Medical => "Medical Tax",
        Category::Grocery => "Grocery Tax",
        Category::Drinks => "Drinks Tax",
    }
}

fn centered(text: &str) -> String {
    format!("{:^width$}", text, width = WIDTH).trim_end().to_string()
}

/// First letter upper-cased, the rest lower-cased.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max - 1).chain(std::iter::once('~')).collect()
    }
}

// =============================================================================
// Text
// =============================================================================

/// Plain-text receipt for terminals and line printers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReceiptRenderer;

impl TextReceiptRenderer {
    pub fn text(&self, bill: &Bill, shop: &ShopDetails, taxes: &TaxTable) -> String {
        let mut out = receipt_lines(bill, shop, taxes, "₹").join("\n");
        out.push('\n');
        out
    }
}

impl Renderer for TextReceiptRenderer {
    fn render(&self, bill: &Bill, shop: &ShopDetails, taxes: &TaxTable) -> RenderResult<Vec<u8>> {
        Ok(self.text(bill, shop, taxes).into_bytes())
    }

    fn extension(&self) -> &'static str {
        "txt"
    }
}

// =============================================================================
// PDF
// =============================================================================

/// A4 page in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN_LEFT: i64 = 60;
const MARGIN_TOP: i64 = 60;
const FONT_SIZE: i64 = 10;
const LEADING: i64 = 12;
const LINES_PER_PAGE: usize = 60;

/// Monospaced PDF receipt, one or more A4 pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfReceiptRenderer;

impl PdfReceiptRenderer {
    fn page_content(lines: &[String]) -> RenderResult<Vec<u8>> {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), Object::Integer(FONT_SIZE)]),
            Operation::new("TL", vec![Object::Integer(LEADING)]),
            Operation::new(
                "Td",
                vec![
                    Object::Integer(MARGIN_LEFT),
                    Object::Integer(PAGE_HEIGHT - MARGIN_TOP),
                ],
            ),
        ];
        for line in lines {
            operations.push(Operation::new("Tj", vec![Object::string_literal(win_ansi(line))]));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));

        Content { operations }
            .encode()
            .map_err(|e| RenderError::Pdf(e.to_string()))
    }
}

impl Renderer for PdfReceiptRenderer {
    fn render(&self, bill: &Bill, shop: &ShopDetails, taxes: &TaxTable) -> RenderResult<Vec<u8>> {
        let lines = receipt_lines(bill, shop, taxes, "Rs.");

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for chunk in lines.chunks(LINES_PER_PAGE) {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Self::page_content(chunk)?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;

        debug!(bill_no = %bill.bill_no(), pages = count, bytes = bytes.len(), "Rendered PDF receipt");
        Ok(bytes)
    }

    fn extension(&self) -> &'static str {
        "pdf"
    }
}

/// Latin-1 characters map to their WinAnsi bytes; anything else prints `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7e | 0xa0..=0xff => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

// =============================================================================
// Archive
// =============================================================================

/// Directory of rendered receipts.
#[derive(Debug, Clone)]
pub struct ReceiptArchive {
    dir: PathBuf,
}

impl ReceiptArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ReceiptArchive { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `Bill_<no>_<YYYYmmddHHMMSS>.<ext>`, stamped with the bill's creation time.
    pub fn file_name(bill: &Bill, extension: &str) -> String {
        format!(
            "Bill_{}_{}.{}",
            bill.bill_no(),
            bill.created_at().format("%Y%m%d%H%M%S"),
            extension
        )
    }

    /// Renders and writes a receipt, creating the directory if needed.
    pub fn save(
        &self,
        renderer: &dyn Renderer,
        bill: &Bill,
        shop: &ShopDetails,
        taxes: &TaxTable,
    ) -> RenderResult<PathBuf> {
        let bytes = renderer.render(bill, shop, taxes)?;
        std::fs::create_dir_all(&self.dir)?;

        let path = self.dir.join(Self::file_name(bill, renderer.extension()));
        std::fs::write(&path, bytes)?;

        info!(bill_no = %bill.bill_no(), ?path, "Receipt archived");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billdesk_core::{compose_at, Product, Selection};
    use chrono::{TimeZone, Utc};

    fn bill_of(catalog: &[Product], selection: &Selection) -> Bill {
        compose_at(
            selection,
            catalog,
            "Ravi",
            "98765",
            "48213",
            &TaxTable::default(),
            Utc.with_ymd_and_hms(2026, 10, 15, 10, 20, 30).unwrap(),
        )
        .unwrap()
        .bill
    }

    fn bill() -> Bill {
        let catalog = vec![
            Product::new("med_1", "Hand Sanitizer", Money::from_major(20), Category::Medical),
            Product::new("gro_1", "Rice (1kg)", Money::from_major(35), Category::Grocery),
        ];
        bill_of(&catalog, &Selection::new().add("med_1", 2).add("gro_1", 1))
    }

    fn shop() -> ShopDetails {
        ShopDetails {
            shop_name: "Asha General Store".to_string(),
            shop_address: "12 MARKET ROAD".to_string(),
            email: "asha@shop.in".to_string(),
        }
    }

    fn render() -> String {
        TextReceiptRenderer.text(&bill(), &shop(), &TaxTable::default())
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    }

    #[test]
    fn test_header_and_footer() {
        let text = render();
        assert!(text.contains("ASHA GENERAL STORE"));
        assert!(text.contains("12 market road"));
        assert!(text.contains("Email: asha@shop.in"));
        assert!(text.contains("48213"));
        assert!(text.contains("2026-10-15 10:20:30"));
        assert!(text.trim_end().ends_with("Thank you for shopping with us!"));
    }

    #[test]
    fn test_items_and_summary() {
        let text = render();
        assert!(text.contains("Hand Sanitizer"));
        assert!(text.contains("₹40.00"));
        assert!(text.contains("Medical Items Total:"));
        assert!(text.contains("Grocery Tax (1%):"));
        assert!(text.contains("₹0.35"));
        assert!(text.contains("Total Bill Amount:"));
        assert!(text.contains("₹77.35"));
    }

    #[test]
    fn test_zero_categories_are_omitted() {
        let text = render();
        assert!(!text.contains("Cold Drinks Total:"));
        assert!(!text.contains("Drinks Tax"));
    }

    #[test]
    fn test_pdf_receipt_is_a_one_page_document() {
        let bytes = PdfReceiptRenderer
            .render(&bill(), &shop(), &TaxTable::default())
            .unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        assert!(contains(&bytes, "ASHA GENERAL STORE"));
        assert!(contains(&bytes, "Total Bill Amount:"));
        assert!(contains(&bytes, "Rs.77.35"));
        assert!(contains(&bytes, "Thank you for shopping with us!"));
    }

    #[test]
    fn test_pdf_receipt_breaks_long_bills_across_pages() {
        let catalog: Vec<Product> = (0..70)
            .map(|i| {
                Product::new(format!("gro_{}", i), format!("Item {}", i), Money::from_major(1), Category::Grocery)
            })
            .collect();
        let selection: Selection = catalog.iter().map(|p| (p.product_id.clone(), 1)).collect();

        let bytes = PdfReceiptRenderer
            .render(&bill_of(&catalog, &selection), &shop(), &TaxTable::default())
            .unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_win_ansi_replaces_unmappable_characters() {
        assert_eq!(win_ansi("Café ₹5"), vec![b'C', b'a', b'f', 0xe9, b' ', b'?', b'5']);
    }

    #[test]
    fn test_receipt_format_parsing() {
        assert_eq!("PDF".parse::<ReceiptFormat>(), Ok(ReceiptFormat::Pdf));
        assert_eq!("txt".parse::<ReceiptFormat>(), Ok(ReceiptFormat::Text));
        assert!("docx".parse::<ReceiptFormat>().is_err());
        assert_eq!(ReceiptFormat::default().renderer().extension(), "pdf");
    }

    #[test]
    fn test_archive_writes_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let archive = ReceiptArchive::new(dir.path().join("bills"));

        let path = archive
            .save(&TextReceiptRenderer, &bill(), &shop(), &TaxTable::default())
            .unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "Bill_48213_20261015102030.txt"
        );
        assert!(std::fs::read_to_string(&path).unwrap().contains("₹77.35"));

        let pdf = archive
            .save(&PdfReceiptRenderer, &bill(), &shop(), &TaxTable::default())
            .unwrap();
        assert_eq!(
            pdf.file_name().unwrap().to_str().unwrap(),
            "Bill_48213_20261015102030.pdf"
        );
    }
}
