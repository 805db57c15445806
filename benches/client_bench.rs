use std::io::Cursor;

use criterion::{criterion_group, criterion_main, Criterion};

use websnap::{MemorySurface, SnapshotClient, SnapshotConfig, SnapshotRequest};

fn bench_image_templates(c: &mut Criterion) {
    let client = SnapshotClient::new(SnapshotConfig::new("1a2b3c")).expect("failed to create client");

    c.bench_function("placeholder_image", |b| {
        b.iter(|| {
            let _ = client.placeholder_image(300, 0);
        })
    });

    c.bench_function("error_image", |b| {
        b.iter(|| {
            let _ = client.error_image(300, 225, Some(40));
        })
    });

    c.bench_function("log_line", |b| {
        b.iter(|| {
            let _ = client.log_line("Error generating snapshot for: http://example.com", Some(40));
        })
    });
}

fn bench_snapshot_round_trip(c: &mut Criterion) {
    // Use a tiny server to stand in for the API, answering every request
    // with the same pre-encoded snapshot payload
    let img = image::RgbaImage::new(300, 225);
    let mut payload = Vec::new();
    img.write_to(&mut Cursor::new(&mut payload), image::ImageOutputFormat::Png)
        .expect("failed to encode payload");

    let server = tiny_http::Server::http("0.0.0.0:0").unwrap();
    let addr = server.server_addr();
    std::thread::spawn(move || {
        for req in server.incoming_requests() {
            let _ = req.respond(tiny_http::Response::from_data(payload.clone()));
        }
    });

    let mut config = SnapshotConfig::new("1a2b3c");
    config.api_entry_point = format!("http://{}", addr);
    config.timeout_ms = 5000;
    let client = SnapshotClient::new(config).expect("failed to create client");

    let request = SnapshotRequest {
        width: 300,
        ..SnapshotRequest::new("http://example.com")
    };

    c.bench_function("request_snapshot_round_trip", |b| {
        b.iter(|| {
            let mut surface = MemorySurface::new(0, 0);
            assert!(client.request_snapshot(&request, Some(&mut surface)));
        })
    });
}

criterion_group!(benches, bench_image_templates, bench_snapshot_round_trip);
criterion_main!(benches);
