use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use nowlink::protocol::{encode, parse};
use nowlink::{Frame, MacAddress};

fn peer() -> MacAddress {
    MacAddress::from_bytes([0x24, 0x6f, 0x28, 0x01, 0x02, 0x03])
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    // Small frame (16-byte payload)
    let small = Frame::new(peer(), 0x42, 1, vec![0u8; 16]).unwrap();
    group.throughput(Throughput::Bytes(16));
    group.bench_function("encode_16b", |b| {
        b.iter(|| {
            black_box(encode(&small));
        });
    });

    // Full frame (240-byte payload, the wire maximum)
    let full = Frame::new(peer(), 0x42, 1, vec![0u8; 240]).unwrap();
    group.throughput(Throughput::Bytes(240));
    group.bench_function("encode_240b", |b| {
        b.iter(|| {
            black_box(encode(&full));
        });
    });

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    let small = encode(&Frame::new(peer(), 0x42, 1, vec![0u8; 16]).unwrap());
    group.throughput(Throughput::Bytes(16));
    group.bench_function("parse_16b", |b| {
        b.iter(|| {
            black_box(parse(peer(), &small, 0).unwrap());
        });
    });

    let full = encode(&Frame::new(peer(), 0x42, 1, vec![0u8; 240]).unwrap());
    group.throughput(Throughput::Bytes(240));
    group.bench_function("parse_240b", |b| {
        b.iter(|| {
            black_box(parse(peer(), &full, 0).unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_parse);
criterion_main!(benches);
