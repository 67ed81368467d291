//! Example: stream a large sheet to an xlsx file
//!
//! ```text
//! cargo run --example create_xlsx -- /tmp/large.xlsx 1000000
//! ```

use std::time::Instant;

use sheetstream::prelude::*;

fn main() -> XlsxResult<()> {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "/tmp/large.xlsx".to_string());
    let rows: u32 = args.next().and_then(|n| n.parse().ok()).unwrap_or(100_000);

    let started = Instant::now();
    let workbook = sheetstream::create(&path)?;

    let header = workbook.register_style(
        &Style::new()
            .bold(true)
            .fill_color(Color::rgb(0xDD, 0xEB, 0xF7))
            .border(BorderStyle::new().with_bottom(BorderLineStyle::Thin, Color::BLACK)),
    )?;
    let money = workbook.register_style(&Style::new().number_format("#,##0.00"))?;
    let date = workbook.register_style(&Style::new().number_format("yyyy-mm-dd"))?;

    let mut sheet = workbook.add_worksheet("Orders")?;
    sheet.write_styled_row([
        ("Order", header),
        ("Region", header),
        ("Date", header),
        ("Amount", header),
    ])?;

    let regions = ["North", "South", "East", "West"];
    for i in 0..rows {
        let mut row = sheet.begin_row()?;
        row.append_cell(i + 1, StyleCode::DEFAULT)?;
        row.append_cell(regions[i as usize % regions.len()], StyleCode::DEFAULT)?;
        row.append_cell(45_000 + i % 365, date)?;
        row.append_cell(f64::from(i % 10_000) * 1.25, money)?;
        row.end_row()?;
    }

    let mut totals = sheet.begin_row()?;
    totals.append_cell("Total", header)?;
    totals.append_cell_at(3, CellValue::formula(format!("SUM(D2:D{})", rows + 1)), money)?;
    totals.end_row()?;

    let dimension = sheet.dimension();
    sheet.finish()?;
    workbook.close()?;

    println!(
        "Wrote {} ({} rows, range {}) in {:.2?}",
        path,
        rows,
        dimension,
        started.elapsed()
    );
    Ok(())
}
