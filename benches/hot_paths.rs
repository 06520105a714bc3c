use criterion::{black_box, criterion_group, criterion_main, Criterion};
use geo::{LineString, MultiPolygon, Polygon};
use quake_map::data::{parse_events, CountryPolygon, Delimiter, Event};
use quake_map::join::{self, top_n, JoinOptions};

/// A grid of 10°x10° "countries" covering lon -180..180, lat -60..80.
fn grid_countries() -> Vec<CountryPolygon> {
    let mut out = Vec::new();
    for i in 0..36 {
        for j in 0..14 {
            let (x, y) = (-180.0 + i as f64 * 10.0, -60.0 + j as f64 * 10.0);
            let ring = LineString::from(vec![
                (x, y),
                (x + 10.0, y),
                (x + 10.0, y + 10.0),
                (x, y + 10.0),
                (x, y),
            ]);
            out.push(CountryPolygon::new(
                format!("C{i}-{j}"),
                MultiPolygon::new(vec![Polygon::new(ring, vec![])]),
            ));
        }
    }
    out
}

fn synthetic_events(n: usize) -> Vec<Event> {
    (0..n)
        .map(|i| Event {
            timestamp_raw: String::new(),
            year: 2000 + (i % 26) as i32,
            latitude: ((i * 37) % 150) as f64 - 70.0 + 0.5,
            longitude: ((i * 91) % 360) as f64 - 180.0 + 0.5,
            magnitude: Some(6.0 + (i % 30) as f64 / 10.0),
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let countries = grid_countries();
    let events = synthetic_events(5_000);
    let serial = JoinOptions {
        parallel: false,
        ..JoinOptions::default()
    };

    c.bench_function("build_parallel_5k", |b| {
        b.iter(|| join::build(black_box(&events), black_box(&countries), &JoinOptions::default()))
    });
    c.bench_function("build_serial_5k", |b| {
        b.iter(|| join::build(black_box(&events), black_box(&countries), &serial))
    });

    let table = join::build(&events, &countries, &JoinOptions::default());
    c.bench_function("top_n", |b| b.iter(|| top_n(black_box(&table), 2011, 5)));
}

fn bench_parse(c: &mut Criterion) {
    let mut text = String::from("time,latitude,longitude,mag\n");
    for e in synthetic_events(5_000) {
        text.push_str(&format!(
            "{}-03-11T05:46:24.120Z,{},{},{}\n",
            e.year,
            e.latitude,
            e.longitude,
            e.magnitude.unwrap_or_default()
        ));
    }
    c.bench_function("parse_events_5k", |b| {
        b.iter(|| parse_events(black_box(&text), Delimiter::Auto))
    });
}

criterion_group!(benches, bench_build, bench_parse);
criterion_main!(benches);
