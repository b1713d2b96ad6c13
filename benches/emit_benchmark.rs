use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use excelemitter::content::*;
use excelemitter::{EmitterConfig, ExcelEmitter, OutputDestination, OutputFormat};

/// Emit a three-column table of `rows` rows into memory
fn emit_table(format: OutputFormat, rows: usize) {
    let config = EmitterConfig::builder().with_format(format).build();
    let destination = OutputDestination::Writer(Box::new(std::io::sink()));
    let mut emitter = ExcelEmitter::initialize(config, Some(destination)).unwrap();

    let report = ReportContent::default();
    let page = PageContent::default();
    let table = TableContent::with_columns(3);
    let row = RowContent::default();
    let cell = CellContent::default();

    emitter.start_report(&report).unwrap();
    emitter.start_page(&page).unwrap();
    emitter.start_table(&table).unwrap();
    for i in 0..rows {
        emitter.start_row(&row).unwrap();

        emitter.start_cell(&cell).unwrap();
        emitter
            .start_data(&DataContent::new(DataValue::Integer(i as i64)))
            .unwrap();
        emitter.end_cell(&cell).unwrap();

        emitter.start_cell(&cell).unwrap();
        emitter
            .start_text(&TextContent::new(format!("Name_{}", i)))
            .unwrap();
        emitter.end_cell(&cell).unwrap();

        emitter.start_cell(&cell).unwrap();
        emitter
            .start_data(&DataContent::new(DataValue::Number(i as f64 * 1.5)))
            .unwrap();
        emitter.end_cell(&cell).unwrap();

        emitter.end_row(&row).unwrap();
    }
    emitter.end_table(&table).unwrap();
    emitter.end_page(&page).unwrap();
    black_box(emitter.end_report(&report).unwrap());
}

fn benchmark_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");
    group.sample_size(10);

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::new("xlsx", size), size, |b, &size| {
            b.iter(|| emit_table(OutputFormat::Xlsx, size));
        });
        group.bench_with_input(BenchmarkId::new("xls", size), size, |b, &size| {
            b.iter(|| emit_table(OutputFormat::Xls, size));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_emit);
criterion_main!(benches);
