use criterion::{Criterion, criterion_group, criterion_main};
use tja_model::{TjaDecoder, TjaEncoder, chart_project_from_tja, chart_project_to_tja};

/// Builds a chart with `measures` sixteenth-note measures plus periodic tempo,
/// scroll and gogo commands, roughly the shape of a full-length Oni chart.
fn synthetic_chart(measures: usize) -> String {
    let mut out = String::from(
        "TITLE:Benchmark\nBPM:160\nWAVE:bench.ogg\nOFFSET:-1.0\nCOURSE:Oni\nLEVEL:10\n#START\n",
    );
    for i in 0..measures {
        match i % 8 {
            0 => out.push_str("#BPMCHANGE 180\n"),
            2 => out.push_str("#SCROLL 1.2\n"),
            4 => out.push_str("#GOGOSTART\n"),
            6 => out.push_str("#GOGOEND\n"),
            _ => {}
        }
        out.push_str("1020112010201120,\n");
    }
    out.push_str("#END\n");
    out
}

fn bench_decode(c: &mut Criterion) {
    for measures in [64, 512] {
        let content = synthetic_chart(measures);
        c.bench_function(&format!("decode_{measures}_measures"), |b| {
            b.iter(|| TjaDecoder::decode_str(&content));
        });
    }
}

fn bench_import(c: &mut Criterion) {
    let document = TjaDecoder::decode_str(&synthetic_chart(512));
    c.bench_function("import_512_measures", |b| {
        b.iter(|| chart_project_from_tja(&document));
    });
}

fn bench_export(c: &mut Criterion) {
    let project = chart_project_from_tja(&TjaDecoder::decode_str(&synthetic_chart(512)));
    c.bench_function("export_512_measures", |b| {
        b.iter(|| TjaEncoder::encode(&chart_project_to_tja(&project)));
    });
}

fn bench_round_trip(c: &mut Criterion) {
    let content = synthetic_chart(512);
    c.bench_function("round_trip_512_measures", |b| {
        b.iter(|| {
            let project = chart_project_from_tja(&TjaDecoder::decode_str(&content));
            TjaEncoder::encode(&chart_project_to_tja(&project))
        });
    });
}

criterion_group!(benches, bench_decode, bench_import, bench_export, bench_round_trip);
criterion_main!(benches);
