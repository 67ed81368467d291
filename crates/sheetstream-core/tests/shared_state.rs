//! Several sheet streams sharing one string table and style registry

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use sheetstream_core::{
    CellValue, Error, RowBlock, SharedStringTable, SheetLimits, SheetStream, SstOptions, Style,
    StyleCode, StyleRegistry,
};

fn shared() -> (Arc<SharedStringTable>, Arc<StyleRegistry>) {
    let sst = SharedStringTable::new(SstOptions::default()).unwrap();
    (Arc::new(sst), Arc::new(StyleRegistry::new()))
}

#[test]
fn concurrent_sheets_agree_on_string_ids() {
    let (sst, styles) = shared();

    let handles: Vec<_> = (0..4)
        .map(|sheet| {
            let sst = Arc::clone(&sst);
            let styles = Arc::clone(&styles);
            thread::spawn(move || {
                let bold = styles.register_style(&Style::new().bold(true)).unwrap();
                let mut stream = SheetStream::new(
                    format!("Sheet{}", sheet + 1),
                    Vec::<RowBlock>::new(),
                    sst,
                    SheetLimits::default(),
                    32,
                );
                for i in 0..100u32 {
                    let mut row = stream.begin_row().unwrap();
                    row.append_cell(format!("key-{}", i % 25), bold).unwrap();
                    row.append_cell(i, StyleCode::DEFAULT).unwrap();
                    row.end_row().unwrap();
                }
                stream.finish().unwrap();
                (bold, stream.into_sink())
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(sst.len(), 25);
    let bold = results[0].0;
    for (code, blocks) in &results {
        assert_eq!(*code, bold);
        assert_eq!(blocks.len(), 4);
        for block in blocks {
            for row in block.rows() {
                let cell = &row.cells[0];
                let id = cell.sst_id.unwrap();
                assert_eq!(CellValue::String(sst.get(id).unwrap()), cell.value);
            }
        }
    }
    assert_eq!(styles.len(), 2);
}

#[test]
fn aborted_sheet_leaves_other_sheets_untouched() {
    let (sst, _styles) = shared();
    let limits = SheetLimits::default().with_max_cols(3);

    let mut good = SheetStream::new("Good", Vec::<RowBlock>::new(), Arc::clone(&sst), limits, 32);
    let mut bad = SheetStream::new("Bad", Vec::<RowBlock>::new(), Arc::clone(&sst), limits, 32);

    for i in 0..3u32 {
        let mut row = good.begin_row().unwrap();
        row.append_cell("shared", StyleCode::DEFAULT).unwrap();
        row.append_cell(i, StyleCode::DEFAULT).unwrap();
        row.end_row().unwrap();
    }

    let mut row = bad.begin_row().unwrap();
    for col in 0..3u32 {
        row.append_cell(col, StyleCode::DEFAULT).unwrap();
    }
    let err = row.append_cell("overflow", StyleCode::DEFAULT).unwrap_err();
    assert!(err.is_capacity_violation());
    drop(row);
    assert!(bad.is_aborted());
    assert!(matches!(bad.finish(), Err(Error::SheetAborted(_))));

    good.finish().unwrap();
    assert_eq!(good.rows_written(), 3);
    assert_eq!(good.dimension().to_string(), "A1:B3");
    // The rejected cell was never interned.
    assert_eq!(sst.lookup("overflow").unwrap(), None);
}

#[test]
fn strings_survive_commit_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let ids = {
        let sst = Arc::new(SharedStringTable::create_in(dir.path(), SstOptions::default()).unwrap());
        let mut stream = SheetStream::new("S", Vec::<RowBlock>::new(), Arc::clone(&sst), SheetLimits::default(), 8);
        for word in ["north", "south", "north", "east"] {
            let mut row = stream.begin_row().unwrap();
            row.append_cell(word, StyleCode::DEFAULT).unwrap();
            row.end_row().unwrap();
        }
        stream.finish().unwrap();
        sst.close().unwrap();

        stream
            .into_sink()
            .iter()
            .flat_map(|b| b.rows().iter().map(|r| r.cells[0].sst_id.unwrap()))
            .collect::<Vec<_>>()
    };
    assert_eq!(ids, vec![0, 1, 0, 2]);

    let reopened = SharedStringTable::open(dir.path(), SstOptions::default()).unwrap();
    assert_eq!(reopened.len(), 3);
    assert_eq!(reopened.intern("south").unwrap(), 1);
    assert_eq!(reopened.intern("west").unwrap(), 3);

    let mut out = Vec::with_capacity(10);
    assert_eq!(reopened.batch(0, &mut out).unwrap(), 4);
    assert_eq!(out, vec!["north", "south", "east", "west"]);
}
